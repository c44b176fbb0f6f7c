//! Remote source probing: existence checks and download hashing
//!
//! The [`SourceProbe`] trait is the seam the bump logic talks to; [`HttpProbe`]
//! is the real implementation on top of a blocking `ureq` agent.

use crate::error::{Error, Result};
use crate::hash;
use crate::output;
use std::time::Duration;

/// Default HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// HTTP timeout from `RECIPE_BUMP_HTTP_TIMEOUT`, clamped to 5-300 seconds.
pub fn http_timeout_from_env() -> Option<Duration> {
    std::env::var("RECIPE_BUMP_HTTP_TIMEOUT")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(clamp_timeout)
}

pub fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(5, 300))
}

/// Checks whether source URLs exist and computes their digests.
pub trait SourceProbe {
    /// True if `url` resolves successfully.
    fn url_exists(&self, url: &str) -> Result<bool>;

    /// Download `url` and return its hex SHA256.
    fn hash_url(&self, url: &str) -> Result<String>;
}

/// [`SourceProbe`] backed by HTTP requests.
pub struct HttpProbe {
    agent: ureq::Agent,
    show_progress: bool,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(10)
            .user_agent(concat!("recipe-bump/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            show_progress: true,
        }
    }

    /// Disable download progress bars.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn http_error(url: &str, e: impl std::fmt::Display) -> Error {
        Error::Http {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

impl SourceProbe for HttpProbe {
    fn url_exists(&self, url: &str) -> Result<bool> {
        match self.agent.head(url).call() {
            Ok(_) => Ok(true),
            // Some servers refuse HEAD; ask for the first byte instead.
            Err(ureq::Error::Status(403 | 405 | 501, _)) => {
                match self.agent.get(url).set("Range", "bytes=0-0").call() {
                    Ok(_) => Ok(true),
                    Err(ureq::Error::Status(code, _)) => {
                        tracing::debug!(url, code, "source does not exist");
                        Ok(false)
                    }
                    Err(e) => Err(Self::http_error(url, e)),
                }
            }
            Err(ureq::Error::Status(code, _)) => {
                tracing::debug!(url, code, "source does not exist");
                Ok(false)
            }
            Err(e) => Err(Self::http_error(url, e)),
        }
    }

    fn hash_url(&self, url: &str) -> Result<String> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| Self::http_error(url, e))?;

        let total = response
            .header("Content-Length")
            .and_then(|v| v.parse::<u64>().ok());
        let mut reader = response.into_reader();

        let pb = self.show_progress.then(|| output::download_progress(total));
        let digest = hash::sha256_reader(&mut reader, |n| {
            if let Some(pb) = &pb {
                pb.inc(n);
            }
        })
        .map_err(|e| Self::http_error(url, e))?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        tracing::debug!(url, digest, "hashed source");
        Ok(digest)
    }
}
