//! Configuration file for the bot
//!
//! Read from `$XDG_CONFIG_HOME/recipe-bump/config.toml` unless a path is given.
//! Every key is optional:
//!
//! ```toml
//! recipes_path = "recipes/recipes_emscripten"
//! bot_login = "emscripten-forge-bot"
//! bump_limit = 5          # 0 = unbounded
//! skip = ["python", "sqlite"]
//! automerge_label = "Automerge"
//! review_label = "Needs Human Review"
//! base_branch = "main"
//! remote = "origin"
//! http_timeout_secs = 30
//! git_name = "emscripten-forge-bot"
//! git_email = "bot@example.org"
//! ```

use crate::batch::{DEFAULT_BUMP_LIMIT, DEFAULT_SKIP};
use crate::error::{Error, Result};
use crate::http;
use crate::lifecycle::DEFAULT_REVIEW_LABEL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BOT_LOGIN: &str = "emscripten-forge-bot";
pub const DEFAULT_AUTOMERGE_LABEL: &str = "Automerge";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub recipes_path: Option<PathBuf>,
    pub bot_login: Option<String>,
    pub bump_limit: Option<usize>,
    pub skip: Option<Vec<String>>,
    pub automerge_label: Option<String>,
    pub review_label: Option<String>,
    pub base_branch: Option<String>,
    pub remote: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub git_name: Option<String>,
    pub git_email: Option<String>,
}

fn xdg_config_home() -> PathBuf {
    if let Ok(raw) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".").join(".config"))
}

pub fn default_config_path() -> PathBuf {
    xdg_config_home().join("recipe-bump").join("config.toml")
}

impl ConfigFile {
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `path`, or the default location when `None`.
    ///
    /// A missing default file yields an empty config; a missing explicit one
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path(), false),
        };
        if !explicit && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| Error::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Self::parse(&path, &text)
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub recipes_path: Option<PathBuf>,
    pub bump_limit: Option<usize>,
    pub unbounded: bool,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub recipes_path: PathBuf,
    pub bot_login: String,
    pub bump_limit: Option<usize>,
    pub skip: Vec<String>,
    pub automerge_label: String,
    pub review_label: String,
    pub base_branch: String,
    pub remote: String,
    pub http_timeout: Duration,
    pub git_name: Option<String>,
    pub git_email: Option<String>,
}

impl Settings {
    /// Combine CLI overrides, environment, the config file and defaults, in
    /// that order of precedence.
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Self {
        let recipes_path = overrides
            .recipes_path
            .or_else(|| std::env::var_os("RECIPE_BUMP_PATH").map(PathBuf::from))
            .or(file.recipes_path)
            .unwrap_or_else(|| PathBuf::from("recipes"));

        let bump_limit = if overrides.unbounded {
            None
        } else {
            match overrides.bump_limit.or(file.bump_limit) {
                Some(0) => None,
                Some(n) => Some(n),
                None => Some(DEFAULT_BUMP_LIMIT),
            }
        };

        let http_timeout = http::http_timeout_from_env()
            .or_else(|| file.http_timeout_secs.map(http::clamp_timeout))
            .unwrap_or_else(|| Duration::from_secs(http::DEFAULT_HTTP_TIMEOUT_SECS));

        Self {
            recipes_path,
            bot_login: file.bot_login.unwrap_or_else(|| DEFAULT_BOT_LOGIN.to_string()),
            bump_limit,
            skip: file
                .skip
                .unwrap_or_else(|| DEFAULT_SKIP.iter().map(|s| s.to_string()).collect()),
            automerge_label: file
                .automerge_label
                .unwrap_or_else(|| DEFAULT_AUTOMERGE_LABEL.to_string()),
            review_label: file
                .review_label
                .unwrap_or_else(|| DEFAULT_REVIEW_LABEL.to_string()),
            base_branch: file.base_branch.unwrap_or_else(|| "main".to_string()),
            remote: file.remote.unwrap_or_else(|| "origin".to_string()),
            http_timeout,
            git_name: file.git_name,
            git_email: file.git_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_file() {
        let cfg = ConfigFile::parse(
            Path::new("c.toml"),
            r#"
recipes_path = "recipes/recipes_emscripten"
bot_login = "my-bot"
bump_limit = 3
skip = ["numpy"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.bot_login.as_deref(), Some("my-bot"));
        assert_eq!(cfg.bump_limit, Some(3));
        assert_eq!(cfg.skip, Some(vec!["numpy".to_string()]));
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = ConfigFile::parse(Path::new("c.toml"), "bump_limt = 3").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigFile::load(Some(&dir.path().join("none.toml"))).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "review_label = \"help\"\n").unwrap();
        let cfg = ConfigFile::load(Some(&path)).unwrap();
        assert_eq!(cfg.review_label.as_deref(), Some("help"));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(
            ConfigFile::default(),
            Overrides {
                recipes_path: Some("r".into()),
                ..Default::default()
            },
        );
        assert_eq!(settings.recipes_path, PathBuf::from("r"));
        assert_eq!(settings.bump_limit, Some(5));
        assert_eq!(settings.bot_login, "emscripten-forge-bot");
        assert_eq!(settings.skip.len(), DEFAULT_SKIP.len());
        assert_eq!(settings.review_label, "Needs Human Review");
    }

    #[test]
    fn test_limit_precedence() {
        let file = ConfigFile {
            bump_limit: Some(2),
            ..Default::default()
        };
        let from_file = Settings::resolve(file.clone(), Overrides::default());
        assert_eq!(from_file.bump_limit, Some(2));

        let cli = Settings::resolve(
            file.clone(),
            Overrides {
                bump_limit: Some(9),
                ..Default::default()
            },
        );
        assert_eq!(cli.bump_limit, Some(9));

        let unbounded = Settings::resolve(
            file,
            Overrides {
                unbounded: true,
                ..Default::default()
            },
        );
        assert_eq!(unbounded.bump_limit, None);

        let zero = ConfigFile {
            bump_limit: Some(0),
            ..Default::default()
        };
        assert_eq!(Settings::resolve(zero, Overrides::default()).bump_limit, None);
    }
}
