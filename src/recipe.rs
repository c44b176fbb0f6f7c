//! Recipe documents: locating, loading and rewriting `recipe.yaml` files.
//!
//! A recipe is a YAML mapping with a `context` block holding the `version` and
//! a single `source` entry whose `url` is templated on that version:
//!
//! ```yaml
//! context:
//!   name: zlib
//!   version: "1.3.0"
//! source:
//!   url: https://zlib.net/zlib-${{ version }}.tar.gz
//!   sha256: 8a9ba2898e1d0d774eca6ba5b4627a11e5588ba85c8851336eb38de4683050a7
//! ```

pub mod edit;

use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Templating dialect of a recipe, implied by its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeDialect {
    /// `recipe.yaml`, variables written as `{{ version }}`
    Jinja,
    /// `rattler_recipe.yaml`, variables written as `${{ version }}`
    Rattler,
}

impl RecipeDialect {
    /// Recipe file names in lookup priority order.
    pub const ALL: [RecipeDialect; 2] = [RecipeDialect::Jinja, RecipeDialect::Rattler];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Jinja => "recipe.yaml",
            Self::Rattler => "rattler_recipe.yaml",
        }
    }

    /// Opening variable delimiter.
    pub fn variable_start(self) -> &'static str {
        match self {
            Self::Jinja => "{{",
            Self::Rattler => "${{",
        }
    }

    pub fn variable_end(self) -> &'static str {
        "}}"
    }

    /// True if `template` contains this dialect's delimiter pair.
    pub fn is_template(self, template: &str) -> bool {
        template.contains(self.variable_start()) && template.contains(self.variable_end())
    }
}

/// Find the recipe file to use in `recipe_dir`.
///
/// Only the first existing file in [`RecipeDialect::ALL`] order is returned.
pub fn find_recipe_file(recipe_dir: &Path) -> Option<(PathBuf, RecipeDialect)> {
    RecipeDialect::ALL.into_iter().find_map(|dialect| {
        let path = recipe_dir.join(dialect.file_name());
        path.is_file().then_some((path, dialect))
    })
}

/// A recipe whose shape has been validated for version bumping.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub path: PathBuf,
    /// The `context` mapping, used as the template context.
    pub context: Mapping,
    pub version: String,
    pub url_template: String,
    pub sha256: String,
}

impl Recipe {
    /// Read and validate a recipe file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    /// Validate recipe text. `path` is only used for error reporting.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(text)
            .map_err(|e| Error::shape(path, format!("invalid YAML: {e}")))?;

        let context = document
            .get("context")
            .and_then(Value::as_mapping)
            .ok_or_else(|| Error::shape(path, "No context in recipe"))?
            .clone();

        let version = context
            .get("version")
            .and_then(|value| match value {
                Value::Number(_) => edit::plain_scalar(text, "context", "version")
                    .or_else(|| scalar_string(value)),
                _ => scalar_string(value),
            })
            .ok_or_else(|| Error::shape(path, "No version in context"))?;

        let source = single_source(path, &document)?;

        let url_template = source
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::shape(path, "No url in source"))?
            .to_string();

        let sha256 = source
            .get("sha256")
            .map(|v| scalar_string(v).unwrap_or_default())
            .ok_or_else(|| Error::shape(path, "No sha256 in source"))?;

        Ok(Self {
            path: path.to_path_buf(),
            context,
            version,
            url_template,
            sha256,
        })
    }

    /// Package name: the name of the directory holding the recipe.
    pub fn package_name(&self) -> String {
        self.path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Template context with `version` replaced by `version`.
    pub fn context_with_version(&self, version: &str) -> Mapping {
        let mut context = self.context.clone();
        context.insert(Value::from("version"), Value::from(version));
        context
    }
}

/// The single source mapping of a recipe. A one-element list is accepted.
fn single_source<'a>(path: &Path, document: &'a Value) -> Result<&'a Mapping> {
    let source = document
        .get("source")
        .ok_or_else(|| Error::shape(path, "No source in recipe"))?;

    let source = match source {
        Value::Sequence(items) if items.len() > 1 => {
            return Err(Error::shape(path, "Multiple sources"));
        }
        Value::Sequence(items) => items
            .first()
            .ok_or_else(|| Error::shape(path, "No source in recipe"))?,
        other => other,
    };

    source
        .as_mapping()
        .ok_or_else(|| Error::shape(path, "source is not a mapping"))
}

/// Strings, numbers and booleans as text.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Rewrite `context.version` and `source.sha256` of the recipe at `path`.
///
/// All other text is preserved. The file is replaced atomically.
pub fn update_recipe(path: &Path, new_version: &str, new_sha256: &str) -> Result<()> {
    let original = std::fs::read_to_string(path)?;
    // Shape check before touching the file.
    Recipe::parse(path, &original)?;

    let updated = edit::update_version_and_sha(&original, new_version, new_sha256)
        .map_err(|reason| Error::shape(path, reason))?;

    write_atomic(path, &updated)
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
