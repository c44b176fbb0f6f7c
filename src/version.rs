//! Version parsing and next-version candidates.
//!
//! Recipes carry free-form upstream versions. The bot only understands the
//! common dotted-numeric shape (`1.2.3`, `v2.0`, `2024.01`) and derives a short,
//! ordered list of plausible successors from it: patch bumps first, then minor,
//! then major.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// How far a single component is bumped when generating candidates.
const MAX_STEP: u64 = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VersionError {
    #[error("invalid version format: {0}")]
    InvalidFormat(String),
}

/// One numeric component of a dotted version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Component {
    value: u64,
    /// Zero-padded width (`01` has width 2). Unpadded components have width 1.
    width: usize,
}

impl Component {
    fn with_value(self, value: u64) -> Self {
        Self { value, ..self }
    }
}

/// A dotted numeric version such as `1.2.3` or `v0.9`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    v_prefix: bool,
    components: Vec<Component>,
}

impl Version {
    /// Number of dotted components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Numeric values of each component.
    pub fn values(&self) -> Vec<u64> {
        self.components.iter().map(|c| c.value).collect()
    }

    /// Return a copy with component `index` increased by `step` and every
    /// later component reset to zero.
    pub fn bumped(&self, index: usize, step: u64) -> Option<Version> {
        let target = self.components.get(index)?;
        let value = target.value.checked_add(step)?;

        let components = self
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| match i.cmp(&index) {
                std::cmp::Ordering::Less => *c,
                std::cmp::Ordering::Equal => c.with_value(value),
                std::cmp::Ordering::Greater => c.with_value(0),
            })
            .collect();

        Some(Version {
            v_prefix: self.v_prefix,
            components,
        })
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionError::InvalidFormat("empty version".to_string()));
        }

        let (v_prefix, rest) = match s.strip_prefix('v') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let components = rest
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionError::InvalidFormat(s.to_string()));
                }
                let value = part
                    .parse()
                    .map_err(|_| VersionError::InvalidFormat(s.to_string()))?;
                let width = if part.len() > 1 && part.starts_with('0') {
                    part.len()
                } else {
                    1
                };
                Ok(Component { value, width })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Version {
            v_prefix,
            components,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.v_prefix {
            write!(f, "v")?;
        }
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{:0width$}", c.value, width = c.width)?;
        }
        Ok(())
    }
}

/// Lazy, finite sequence of next-version candidates.
///
/// Walks components from last to first, bumping each by `1..=MAX_STEP`.
/// For `1.2.3` this yields `1.2.4, 1.2.5, 1.3.0, 1.4.0, 2.0.0, 3.0.0`.
#[derive(Debug, Clone)]
pub struct Candidates {
    base: Option<Version>,
    current: String,
    /// Offset from the last component (0 = last).
    position: usize,
    step: u64,
    seen: HashSet<String>,
}

impl Iterator for Candidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let base = self.base.as_ref()?;

        while self.position < base.len() {
            let index = base.len() - 1 - self.position;
            let step = self.step;

            if self.step >= MAX_STEP {
                self.step = 1;
                self.position += 1;
            } else {
                self.step += 1;
            }

            let Some(candidate) = base.bumped(index, step) else {
                continue;
            };
            let candidate = candidate.to_string();
            if candidate != self.current && self.seen.insert(candidate.clone()) {
                return Some(candidate);
            }
        }

        None
    }
}

/// Candidate next versions for `current`, most likely first.
///
/// Versions that are not dotted-numeric yield an empty sequence.
pub fn candidates(current: &str) -> Candidates {
    let base = match current.parse::<Version>() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(version = current, error = %e, "no candidates for version");
            None
        }
    };

    Candidates {
        base,
        current: current.trim().to_string(),
        position: 0,
        step: 1,
        seen: HashSet::new(),
    }
}
