//! Error types for recipe-bump.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while bumping recipes or driving the hosting CLI.
#[derive(Error, Debug)]
pub enum Error {
    /// The recipe is missing a field or has a shape the bot cannot handle.
    #[error("cannot handle recipe {}: {reason}", path.display())]
    RecipeShape { path: PathBuf, reason: String },

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("HTTP request for {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("command failed: {cmd} (exit code: {code:?})\nstderr: {stderr}")]
    Command {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to run {cmd}: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn shape(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::RecipeShape {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True when the error describes a recipe the bot cannot handle, as
    /// opposed to a transient network or CLI failure.
    pub fn is_recipe_shape(&self) -> bool {
        matches!(self, Self::RecipeShape { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
