//! Shepherding of the bot's open pull requests
//!
//! A PR whose CI passed and that was opened for automerge gets merged; every
//! other PR is labelled for a human and gets a single, refreshed comment.

use crate::error::Result;
use crate::forge::{Forge, MergeOptions, OpenPr};
use crate::output;

pub const MERGING_COMMENT: &str = "CI passed! I'm merging";
pub const NEEDS_HELP_COMMENT: &str =
    "Either the CI is failing, or the recipe is not tested. I need help from a human.";
pub const DEFAULT_REVIEW_LABEL: &str = "Needs Human Review";

/// How a comment ended up on the PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOutcome {
    /// The last comment was rewritten.
    Edited,
    /// A new comment was posted, either because none existed or the edit failed.
    Created,
}

/// What [`process_pr`] did to a PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrAction {
    Merged,
    NeedsReview { comment: CommentOutcome },
}

const MERGE: MergeOptions = MergeOptions {
    delete_branch: true,
    admin: true,
};

/// Merge `pr` if CI passed and automerge is on, otherwise flag it for review.
pub fn process_pr(forge: &dyn Forge, pr: &OpenPr, review_label: &str) -> Result<PrAction> {
    let passed = forge.checks_passed(pr.number)?;
    let labels = forge.pr_labels(pr.number)?;
    tracing::debug!(pr = pr.number, passed, ?labels, "pr status");

    if passed && forge.automerge_enabled(pr.number)? {
        output::step(&format!("#{} {}: merging", pr.number, pr.title));
        forge.comment(pr.number, MERGING_COMMENT)?;
        forge.merge(pr.number, MERGE)?;
        return Ok(PrAction::Merged);
    }

    output::step(&format!("#{} {}: needs human review", pr.number, pr.title));
    forge.add_label(pr.number, review_label)?;
    let comment = upsert_comment(forge, pr.number, NEEDS_HELP_COMMENT)?;
    Ok(PrAction::NeedsReview { comment })
}

/// Edit the last comment on `pr`, or post a new one.
///
/// Any failure to edit falls back to a new comment; only a failure to post
/// that comment is an error.
pub fn upsert_comment(forge: &dyn Forge, pr: u64, body: &str) -> Result<CommentOutcome> {
    match forge.edit_last_comment(pr, body) {
        Ok(true) => return Ok(CommentOutcome::Edited),
        Ok(false) => {}
        Err(e) => tracing::debug!(pr, error = %e, "editing last comment failed, posting a new one"),
    }
    forge.comment(pr, body)?;
    Ok(CommentOutcome::Created)
}
