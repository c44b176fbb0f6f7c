//! Version bump decision: find the first newer upstream version of a recipe.

use crate::error::{Error, Result};
use crate::http::SourceProbe;
use crate::output;
use crate::recipe::{Recipe, RecipeDialect};
use crate::template::TemplateRenderer;
use crate::version;
use std::path::Path;

/// A confirmed upstream update for one recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    pub old_version: String,
    pub new_version: String,
    pub sha256: String,
    /// Source URL rendered for the new version.
    pub url: String,
}

/// Look for a newer version using the default candidate sequence.
pub fn find_new_version(
    recipe_file: &Path,
    dialect: RecipeDialect,
    probe: &dyn SourceProbe,
) -> Result<Option<VersionBump>> {
    find_new_version_with(recipe_file, dialect, probe, |current| {
        version::candidates(current)
    })
}

/// Look for a newer version, probing the candidates `candidates` yields for
/// the recipe's current version.
///
/// Candidates are tried in order and the first whose source URL exists wins.
/// `Ok(None)` means no candidate exists upstream. The recipe file is never
/// written.
pub fn find_new_version_with<I>(
    recipe_file: &Path,
    dialect: RecipeDialect,
    probe: &dyn SourceProbe,
    candidates: impl FnOnce(&str) -> I,
) -> Result<Option<VersionBump>>
where
    I: IntoIterator<Item = String>,
{
    let recipe = Recipe::load(recipe_file)?;

    if !dialect.is_template(&recipe.url_template) {
        return Err(Error::shape(recipe_file, "url is not a template"));
    }

    let renderer = TemplateRenderer::new(dialect)?;
    let name = recipe.package_name();
    output::info(&format!("{} current version: {}", name, recipe.version));

    for candidate in candidates(&recipe.version) {
        let context = recipe.context_with_version(&candidate);
        let url = renderer.render(&recipe.url_template, &context)?;
        tracing::debug!(package = %name, candidate = %candidate, url = %url, "probing");

        if !probe.url_exists(&url)? {
            continue;
        }

        output::step(&format!("found new version: {}", candidate));
        let sha256 = probe.hash_url(&url)?;
        output::step(&format!("new sha256: {}", sha256));

        return Ok(Some(VersionBump {
            old_version: recipe.version,
            new_version: candidate,
            sha256,
            url,
        }));
    }

    Ok(None)
}
