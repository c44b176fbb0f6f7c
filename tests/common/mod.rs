//! Test doubles and recipe fixtures shared by the integration tests.

#![allow(dead_code)]

use recipe_bump::error::{Error, Result};
use recipe_bump::forge::{Forge, MergeOptions, NewPr, OpenPr};
use recipe_bump::http::SourceProbe;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const AUTOMERGE_LABEL: &str = "Automerge";

/// Everything a [`MockForge`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Comment { pr: u64, body: String },
    EditLastComment { pr: u64, body: String },
    AddLabel { pr: u64, label: String },
    Merge { pr: u64, options: MergeOptions },
    CreateBranch(String),
    Checkout(String),
    OpenPr(OpenPrCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPrCall {
    pub recipe_dir: PathBuf,
    pub title: String,
    pub branch: String,
    pub automerge: bool,
    /// Branch checked out when the PR was opened.
    pub on_branch: String,
    /// Recipe file contents when the PR was opened.
    pub recipe_text: Option<String>,
}

/// In-memory forge with call tracking and error injection.
pub struct MockForge {
    open_prs: Vec<OpenPr>,
    checks: HashMap<u64, bool>,
    labels: HashMap<u64, Vec<String>>,
    commented: Mutex<HashSet<u64>>,
    branch: Mutex<String>,
    calls: Mutex<Vec<Call>>,
    // Error injection
    fail_list: Option<String>,
    fail_checks: HashSet<u64>,
    fail_edit: HashSet<u64>,
    fail_open_pr: HashSet<String>,
}

fn injected(what: &str, msg: &str) -> Error {
    Error::Command {
        cmd: what.to_string(),
        code: Some(1),
        stderr: msg.to_string(),
    }
}

impl MockForge {
    pub fn new() -> Self {
        Self {
            open_prs: Vec::new(),
            checks: HashMap::new(),
            labels: HashMap::new(),
            commented: Mutex::new(HashSet::new()),
            branch: Mutex::new("main".to_string()),
            calls: Mutex::new(Vec::new()),
            fail_list: None,
            fail_checks: HashSet::new(),
            fail_edit: HashSet::new(),
            fail_open_pr: HashSet::new(),
        }
    }

    /// Add an open PR for `package` with the given CI result and labels.
    pub fn with_pr(mut self, number: u64, package: &str, ci_passed: bool, labels: &[&str]) -> Self {
        self.open_prs.push(OpenPr {
            number,
            title: format!("Update {package} from 1.0 to 1.1"),
            package: Some(package.to_string()),
        });
        self.checks.insert(number, ci_passed);
        self.labels
            .insert(number, labels.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Pretend the bot already commented on `pr`.
    pub fn with_existing_comment(self, pr: u64) -> Self {
        self.commented.lock().unwrap().insert(pr);
        self
    }

    pub fn fail_list(mut self, msg: &str) -> Self {
        self.fail_list = Some(msg.to_string());
        self
    }

    pub fn fail_checks(mut self, pr: u64) -> Self {
        self.fail_checks.insert(pr);
        self
    }

    /// Make editing the last comment on `pr` fail, as a token without
    /// comment-edit permission does.
    pub fn fail_edit(mut self, pr: u64) -> Self {
        self.fail_edit.insert(pr);
        self
    }

    /// Make `open_pr` fail for the PR on `branch`.
    pub fn fail_open_pr(mut self, branch: &str) -> Self {
        self.fail_open_pr.insert(branch.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<OpenPrCall> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::OpenPr(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn current(&self) -> String {
        self.branch.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Forge for MockForge {
    fn list_open_prs(&self, _author: &str) -> Result<Vec<OpenPr>> {
        if let Some(msg) = &self.fail_list {
            return Err(injected("gh pr list", msg));
        }
        Ok(self.open_prs.clone())
    }

    fn pr_labels(&self, pr: u64) -> Result<Vec<String>> {
        Ok(self.labels.get(&pr).cloned().unwrap_or_default())
    }

    fn checks_passed(&self, pr: u64) -> Result<bool> {
        if self.fail_checks.contains(&pr) {
            return Err(injected("gh pr checks", "network down"));
        }
        Ok(self.checks.get(&pr).copied().unwrap_or(false))
    }

    fn automerge_enabled(&self, pr: u64) -> Result<bool> {
        Ok(self
            .pr_labels(pr)?
            .iter()
            .any(|l| l == AUTOMERGE_LABEL))
    }

    fn comment(&self, pr: u64, body: &str) -> Result<()> {
        self.commented.lock().unwrap().insert(pr);
        self.record(Call::Comment {
            pr,
            body: body.to_string(),
        });
        Ok(())
    }

    fn edit_last_comment(&self, pr: u64, body: &str) -> Result<bool> {
        if self.fail_edit.contains(&pr) {
            return Err(injected(
                "gh pr comment --edit-last",
                "GraphQL: Resource not accessible by integration (updateIssueComment)",
            ));
        }
        if !self.commented.lock().unwrap().contains(&pr) {
            return Ok(false);
        }
        self.record(Call::EditLastComment {
            pr,
            body: body.to_string(),
        });
        Ok(true)
    }

    fn add_label(&self, pr: u64, label: &str) -> Result<()> {
        self.record(Call::AddLabel {
            pr,
            label: label.to_string(),
        });
        Ok(())
    }

    fn merge(&self, pr: u64, options: MergeOptions) -> Result<()> {
        self.record(Call::Merge { pr, options });
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.current())
    }

    fn create_branch(&self, branch: &str) -> Result<()> {
        *self.branch.lock().unwrap() = branch.to_string();
        self.record(Call::CreateBranch(branch.to_string()));
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        *self.branch.lock().unwrap() = branch.to_string();
        self.record(Call::Checkout(branch.to_string()));
        Ok(())
    }

    fn open_pr(&self, pr: &NewPr<'_>) -> Result<()> {
        let recipe_text = recipe_bump::recipe::find_recipe_file(pr.recipe_dir)
            .and_then(|(path, _)| std::fs::read_to_string(path).ok());
        self.record(Call::OpenPr(OpenPrCall {
            recipe_dir: pr.recipe_dir.to_path_buf(),
            title: pr.title.to_string(),
            branch: pr.branch.to_string(),
            automerge: pr.automerge,
            on_branch: self.current(),
            recipe_text,
        }));
        if self.fail_open_pr.contains(pr.branch) {
            return Err(injected("gh pr create", "push rejected"));
        }
        Ok(())
    }
}

/// Probe over a fixed set of existing URLs.
#[derive(Default)]
pub struct MockProbe {
    existing: HashSet<String>,
    failing: HashSet<String>,
    probed: Mutex<Vec<String>>,
    hashed: Mutex<Vec<String>>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.existing.insert(url.to_string());
        self
    }

    /// Make probing `url` fail with a transport error.
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }

    pub fn hashed(&self) -> Vec<String> {
        self.hashed.lock().unwrap().clone()
    }
}

/// Digest [`MockProbe`] reports for `url`.
pub fn fake_sha(url: &str) -> String {
    let digits: String = url
        .bytes()
        .map(|b| format!("{:02x}", b))
        .collect();
    format!("{:0<64}", &digits[..digits.len().min(64)])
}

impl SourceProbe for MockProbe {
    fn url_exists(&self, url: &str) -> Result<bool> {
        self.probed.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(Error::Http {
                url: url.to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(self.existing.contains(url))
    }

    fn hash_url(&self, url: &str) -> Result<String> {
        self.hashed.lock().unwrap().push(url.to_string());
        Ok(fake_sha(url))
    }
}

/// Source URL template used by [`write_recipe`].
pub fn source_url(package: &str, version: &str) -> String {
    format!("https://downloads.example.org/{package}/{package}-{version}.tar.gz")
}

/// Write `<root>/<package>/rattler_recipe.yaml` at `version`.
pub fn write_recipe(root: &Path, package: &str, version: &str) -> PathBuf {
    let dir = root.join(package);
    std::fs::create_dir_all(&dir).unwrap();
    let text = format!(
        "\
context:
  name: {package}
  version: \"{version}\"

package:
  name: ${{{{ name }}}}
  version: ${{{{ version }}}}

source:
  # upstream release tarball
  url: https://downloads.example.org/${{{{ name }}}}/${{{{ name }}}}-${{{{ version }}}}.tar.gz
  sha256: e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855

build:
  number: 0
"
    );
    std::fs::write(dir.join("rattler_recipe.yaml"), text).unwrap();
    dir
}

/// Add a `test_*.py` file so the recipe is eligible for automerge.
pub fn add_test_file(recipe_dir: &Path) {
    std::fs::write(recipe_dir.join("test_import.py"), "def test_import():\n    pass\n").unwrap();
}
