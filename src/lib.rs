//! Version-bump bot for package recipe repositories
//!
//! Scans a directory of recipes, looks for newer upstream releases by probing
//! the recipe's templated source URL with plausible next versions, rewrites the
//! recipe with the new version and digest, and opens a pull request. It also
//! looks after the pull requests it opened earlier: merging them when CI passed
//! and the recipe is tested, asking a human for help otherwise.
//!
//! # Recipes
//!
//! Each package lives in its own directory holding `recipe.yaml` (variables as
//! `{{ version }}`) or `rattler_recipe.yaml` (variables as `${{ version }}`):
//!
//! ```yaml
//! context:
//!   version: "1.3.0"
//! source:
//!   url: https://zlib.net/zlib-${{ version }}.tar.gz
//!   sha256: 8a9ba2898e1d0d774eca6ba5b4627a11e5588ba85c8851336eb38de4683050a7
//! ```
//!
//! A directory containing `test_*.py` files is considered tested, and its
//! bump PRs are opened with the automerge label.
//!
//! # Layers
//!
//! - [`version`] generates candidate versions
//! - [`recipe`] reads and rewrites recipe files, [`template`] renders URLs
//! - [`http`] and [`hash`] probe and digest upstream sources
//! - [`bump`] decides on a new version, [`update`] turns it into a PR
//! - [`forge`] talks to `gh` and `git`, [`lifecycle`] manages open PRs
//! - [`batch`] runs everything over a recipes checkout

pub mod batch;
pub mod bump;
pub mod config;
pub mod error;
pub mod forge;
pub mod hash;
pub mod http;
pub mod lifecycle;
pub mod output;
pub mod recipe;
pub mod template;
pub mod update;
pub mod version;

pub use error::{Error, Result};
