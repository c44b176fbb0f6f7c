//! One run of the bot over a recipes checkout
//!
//! First every open bot PR is processed (merge or flag for review), then the
//! recipe directories without an open PR are bumped, up to a limit. Failures
//! of single PRs or recipes are reported and do not stop the run.

use crate::error::Result;
use crate::forge::{Forge, OpenPr};
use crate::http::SourceProbe;
use crate::lifecycle::{self, DEFAULT_REVIEW_LABEL, PrAction};
use crate::output;
use crate::update::{self, BumpOutcome};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_BUMP_LIMIT: usize = 5;

/// Packages never bumped automatically.
pub const DEFAULT_SKIP: &[&str] = &[
    "python",
    "python_abi",
    "libpython",
    "sqlite",
    "robotics-toolbox-python",
    "xvega",
    "xvega-bindings",
];

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory whose immediate subdirectories are recipes.
    pub recipes_path: PathBuf,
    /// Author of the PRs to manage.
    pub bot_login: String,
    /// Stop after this many bumps; `None` is unbounded.
    pub bump_limit: Option<usize>,
    pub skip: Vec<String>,
    pub review_label: String,
}

impl BatchOptions {
    pub fn new(recipes_path: impl Into<PathBuf>, bot_login: impl Into<String>) -> Self {
        Self {
            recipes_path: recipes_path.into(),
            bot_login: bot_login.into(),
            bump_limit: Some(DEFAULT_BUMP_LIMIT),
            skip: DEFAULT_SKIP.iter().map(|s| s.to_string()).collect(),
            review_label: DEFAULT_REVIEW_LABEL.to_string(),
        }
    }
}

/// A recipe or PR that failed, with the error rendered for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub subject: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub prs_checked: usize,
    pub prs_merged: usize,
    pub prs_flagged: usize,
    pub pr_failures: Vec<Failure>,
    /// Recipe directories examined for a bump.
    pub recipes_checked: usize,
    pub bumped: Vec<BumpOutcome>,
    pub recipe_failures: Vec<Failure>,
}

impl BatchReport {
    pub fn bump_count(&self) -> usize {
        self.bumped.len()
    }

    pub fn print_summary(&self) {
        output::info(&format!(
            "PRs: {} checked, {} merged, {} need review, {} failed",
            self.prs_checked,
            self.prs_merged,
            self.prs_flagged,
            self.pr_failures.len()
        ));
        output::info(&format!(
            "Recipes: {} checked, {} bumped, {} failed",
            self.recipes_checked,
            self.bumped.len(),
            self.recipe_failures.len()
        ));
        for failure in self.pr_failures.iter().chain(&self.recipe_failures) {
            output::error(&format!("{}: {}", failure.subject, failure.error));
        }
    }
}

/// Process every open PR by `options.bot_login`.
///
/// Returns the PRs that were listed, whatever happened to each of them.
pub fn manage_open_prs(
    forge: &dyn Forge,
    options: &BatchOptions,
    report: &mut BatchReport,
) -> Result<Vec<OpenPr>> {
    let prs = forge.list_open_prs(&options.bot_login)?;
    output::action(&format!("Checking {} open PR(s) by {}", prs.len(), options.bot_login));

    for pr in &prs {
        report.prs_checked += 1;
        match lifecycle::process_pr(forge, pr, &options.review_label) {
            Ok(PrAction::Merged) => report.prs_merged += 1,
            Ok(PrAction::NeedsReview { .. }) => report.prs_flagged += 1,
            Err(e) => {
                output::warning(&format!("PR #{} failed: {}", pr.number, e));
                report.pr_failures.push(Failure {
                    subject: format!("#{}", pr.number),
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(prs)
}

/// Immediate subdirectories of `recipes_path`, sorted by name, minus `exclude`.
pub fn select_recipes(recipes_path: &Path, exclude: &BTreeSet<String>) -> Result<Vec<PathBuf>> {
    let mut selected = Vec::new();
    for entry in WalkDir::new(recipes_path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if exclude.contains(name.as_ref()) {
            tracing::debug!(package = %name, "excluded");
            continue;
        }
        selected.push(entry.into_path());
    }
    Ok(selected)
}

/// Bump recipes in order until `limit` bumps succeeded.
pub fn bump_recipes(
    recipes: &[PathBuf],
    forge: &dyn Forge,
    probe: &dyn SourceProbe,
    limit: Option<usize>,
    report: &mut BatchReport,
) {
    let total = recipes.len();
    for (i, dir) in recipes.iter().enumerate() {
        if limit.is_some_and(|limit| report.bumped.len() >= limit) {
            output::info(&format!("Reached the limit of {} bump(s)", report.bumped.len()));
            break;
        }

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        output::recipe_header(i + 1, total, &name);
        report.recipes_checked += 1;

        match update::bump_recipe(dir, forge, probe) {
            Ok(Some(outcome)) => report.bumped.push(outcome),
            Ok(None) => output::step(&format!("{name} is up to date")),
            Err(e) => {
                output::error(&format!("{name}: {e}"));
                report.recipe_failures.push(Failure {
                    subject: name,
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Full run: manage open PRs, then bump recipes without an open PR.
pub fn run_batch(
    forge: &dyn Forge,
    probe: &dyn SourceProbe,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    let prs = manage_open_prs(forge, options, &mut report)?;

    let mut exclude: BTreeSet<String> = options.skip.iter().cloned().collect();
    exclude.extend(prs.into_iter().filter_map(|pr| pr.package));

    let recipes = select_recipes(&options.recipes_path, &exclude)?;
    output::action(&format!("Looking for updates in {} recipe(s)", recipes.len()));
    bump_recipes(&recipes, forge, probe, options.bump_limit, &mut report);

    output::success(&format!("Opened {} PR(s)", report.bump_count()));
    Ok(report)
}
