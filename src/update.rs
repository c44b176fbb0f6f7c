//! Bumping one recipe directory end to end: decide, edit, open a PR.

use crate::bump::{self, VersionBump};
use crate::error::Result;
use crate::forge::{BranchScope, Forge, NewPr};
use crate::http::SourceProbe;
use crate::output;
use crate::recipe::{self, RecipeDialect};
use std::path::Path;

/// Test scripts that make a recipe eligible for automerge.
const TEST_FILE_PATTERN: &str = "test_*.py";

/// A bump that was committed and proposed as a PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOutcome {
    pub package: String,
    pub old_version: String,
    pub new_version: String,
    pub automerge: bool,
    pub branch: String,
}

/// True if `recipe_dir` has at least one `test_*.py` file.
pub fn automerge_eligible(recipe_dir: &Path) -> Result<bool> {
    let pattern = glob::Pattern::new(TEST_FILE_PATTERN).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    for entry in std::fs::read_dir(recipe_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if pattern.matches(&entry.file_name().to_string_lossy()) {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn branch_name(package: &str, old: &str, new: &str) -> String {
    format!("bump-{package}_{old}_to_{new}")
}

pub fn pr_title(package: &str, old: &str, new: &str) -> String {
    format!("Update {package} from {old} to {new}")
}

pub fn pr_body(package: &str, bump: &VersionBump, automerge: bool) -> String {
    let mut body = format!(
        "New upstream version of `{package}`: {} → {}\n\nSource: {}\nsha256: `{}`\n",
        bump.old_version, bump.new_version, bump.url, bump.sha256
    );
    if automerge {
        body.push_str("\nThe recipe has tests; this PR will be merged once CI passes.\n");
    } else {
        body.push_str("\nThe recipe has no tests; a human needs to review this PR.\n");
    }
    body
}

/// Bump the recipe in `recipe_dir` if a newer version exists upstream.
///
/// `Ok(None)` means there is no recipe file or no newer version. The edit
/// happens on a fresh branch; the previously checked-out branch is restored
/// afterwards, also when opening the PR fails.
pub fn bump_recipe(
    recipe_dir: &Path,
    forge: &dyn Forge,
    probe: &dyn SourceProbe,
) -> Result<Option<BumpOutcome>> {
    let Some((recipe_file, dialect)) = recipe::find_recipe_file(recipe_dir) else {
        tracing::debug!(dir = %recipe_dir.display(), "no recipe file");
        return Ok(None);
    };

    let Some(bump) = bump::find_new_version(&recipe_file, dialect, probe)? else {
        return Ok(None);
    };

    open_bump_pr(recipe_dir, &recipe_file, dialect, &bump, forge).map(Some)
}

fn open_bump_pr(
    recipe_dir: &Path,
    recipe_file: &Path,
    dialect: RecipeDialect,
    bump: &VersionBump,
    forge: &dyn Forge,
) -> Result<BumpOutcome> {
    let package = package_name(recipe_dir);
    let automerge = automerge_eligible(recipe_dir)?;
    let branch = branch_name(&package, &bump.old_version, &bump.new_version);
    let title = pr_title(&package, &bump.old_version, &bump.new_version);
    let body = pr_body(&package, bump, automerge);

    let scope = BranchScope::enter(forge, &branch)?;
    recipe::update_recipe(recipe_file, &bump.new_version, &bump.sha256)?;
    tracing::debug!(file = %recipe_file.display(), ?dialect, "recipe rewritten");

    forge.open_pr(&NewPr {
        recipe_dir,
        title: &title,
        body: &body,
        branch: scope.branch(),
        automerge,
    })?;
    drop(scope);

    output::success(&format!(
        "{}: {} → {}{}",
        package,
        bump.old_version,
        bump.new_version,
        if automerge { " (automerge)" } else { "" }
    ));

    Ok(BumpOutcome {
        package,
        old_version: bump.old_version.clone(),
        new_version: bump.new_version.clone(),
        automerge,
        branch,
    })
}

fn package_name(recipe_dir: &Path) -> String {
    recipe_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
