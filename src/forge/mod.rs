//! Hosting platform operations
//!
//! The [`Forge`] trait covers everything the bot asks of the hosting platform
//! and the local git checkout: listing and shepherding pull requests, and
//! opening new ones from a freshly edited recipe. [`GhCli`] implements it by
//! shelling out to `gh` and `git`.

mod gh;

pub use gh::GhCli;

use crate::error::Result;
use crate::output;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// An open pull request authored by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPr {
    pub number: u64,
    pub title: String,
    /// Package the PR bumps, derived from its title or branch.
    pub package: Option<String>,
}

/// Flags for a rebase merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub delete_branch: bool,
    /// Bypass branch protection.
    pub admin: bool,
}

/// A pull request to open for an edited recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPr<'a> {
    pub recipe_dir: &'a Path,
    pub title: &'a str,
    pub body: &'a str,
    pub branch: &'a str,
    pub automerge: bool,
}

/// Platform service for PR operations
pub trait Forge {
    /// Open PRs authored by `author`.
    fn list_open_prs(&self, author: &str) -> Result<Vec<OpenPr>>;

    /// Label names on a PR.
    fn pr_labels(&self, pr: u64) -> Result<Vec<String>>;

    /// True if every CI check on the PR passed.
    fn checks_passed(&self, pr: u64) -> Result<bool>;

    /// True if the PR was opened as eligible for automatic merging.
    fn automerge_enabled(&self, pr: u64) -> Result<bool>;

    fn comment(&self, pr: u64, body: &str) -> Result<()>;

    /// Replace the body of the identity's last comment on the PR.
    ///
    /// Returns `Ok(false)` when there is no earlier comment to edit.
    fn edit_last_comment(&self, pr: u64, body: &str) -> Result<bool>;

    fn add_label(&self, pr: u64, label: &str) -> Result<()>;

    fn merge(&self, pr: u64, options: MergeOptions) -> Result<()>;

    /// Name of the checked-out branch.
    fn current_branch(&self) -> Result<String>;

    /// Create `branch` from the current head and check it out.
    fn create_branch(&self, branch: &str) -> Result<()>;

    fn checkout(&self, branch: &str) -> Result<()>;

    /// Commit the recipe directory, push the branch and open the PR.
    fn open_pr(&self, pr: &NewPr<'_>) -> Result<()>;
}

/// Checked-out work branch. Dropping it checks the previous branch out again.
pub struct BranchScope<'a> {
    forge: &'a dyn Forge,
    previous: String,
    branch: String,
}

impl<'a> BranchScope<'a> {
    pub fn enter(forge: &'a dyn Forge, branch: &str) -> Result<Self> {
        let previous = forge.current_branch()?;
        forge.create_branch(branch)?;
        tracing::debug!(branch, previous = %previous, "entered branch");
        Ok(Self {
            forge,
            previous,
            branch: branch.to_string(),
        })
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl Drop for BranchScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.forge.checkout(&self.previous) {
            output::warning(&format!(
                "could not switch back to {} from {}: {}",
                self.previous, self.branch, e
            ));
        }
    }
}

/// Credentials the hosting CLI and git run under.
///
/// Applied to each spawned command's environment, never to the bot's own
/// process environment.
#[derive(Clone, Default)]
pub struct Identity {
    /// Login whose PRs the bot manages.
    pub login: String,
    token: Option<String>,
    git_name: Option<String>,
    git_email: Option<String>,
}

impl Identity {
    /// Run as the bot account.
    pub fn bot(
        login: impl Into<String>,
        token: Option<String>,
        git_name: Option<String>,
        git_email: Option<String>,
    ) -> Self {
        Self {
            login: login.into(),
            token,
            git_name,
            git_email,
        }
    }

    /// Run with whatever credentials `gh` and `git` already have. PRs are
    /// still looked up by `login`.
    pub fn invoking_user(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Self::default()
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn apply(&self, cmd: &mut Command) {
        if let Some(token) = &self.token {
            cmd.env("GH_TOKEN", token);
        }
        if let Some(name) = &self.git_name {
            cmd.env("GIT_AUTHOR_NAME", name).env("GIT_COMMITTER_NAME", name);
        }
        if let Some(email) = &self.git_email {
            cmd.env("GIT_AUTHOR_EMAIL", email)
                .env("GIT_COMMITTER_EMAIL", email);
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("login", &self.login)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("git_name", &self.git_name)
            .field("git_email", &self.git_email)
            .finish()
    }
}

/// Package a bot PR bumps: `Update <pkg> from …` titles first, then
/// `bump-<pkg>_<old>_to_<new>` branches.
pub fn package_from_pr(title: &str, head_ref: &str) -> Option<String> {
    let from_title = title.strip_prefix("Update ").and_then(|rest| {
        let mut words = rest.split_whitespace();
        let package = words.next()?;
        (words.next() == Some("from")).then(|| package.to_string())
    });

    from_title.or_else(|| {
        let rest = head_ref.strip_prefix("bump-")?;
        let (before_to, _) = rest.rsplit_once("_to_")?;
        let (package, _) = before_to.rsplit_once('_')?;
        (!package.is_empty()).then(|| package.to_string())
    })
}
