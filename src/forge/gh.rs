//! GitHub via the `gh` CLI, plus the local `git` checkout

use super::{Forge, Identity, MergeOptions, NewPr, OpenPr, package_from_pr};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Upper bound on PRs fetched by `gh pr list`.
const PR_LIST_LIMIT: &str = "200";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPr {
    number: u64,
    title: String,
    head_ref_name: String,
}

#[derive(Deserialize)]
struct GhLabel {
    name: String,
}

#[derive(Deserialize)]
struct GhLabels {
    #[serde(default)]
    labels: Vec<GhLabel>,
}

/// [`Forge`] implementation that shells out to `gh` and `git`.
#[derive(Debug, Clone)]
pub struct GhCli {
    identity: Identity,
    /// Working directory for every command (the recipes checkout).
    workdir: PathBuf,
    remote: String,
    base_branch: String,
    automerge_label: String,
    gh_bin: String,
    git_bin: String,
}

impl GhCli {
    pub fn new(identity: Identity, workdir: impl Into<PathBuf>) -> Self {
        Self {
            identity,
            workdir: workdir.into(),
            remote: "origin".to_string(),
            base_branch: "main".to_string(),
            automerge_label: "Automerge".to_string(),
            gh_bin: "gh".to_string(),
            git_bin: "git".to_string(),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_base_branch(mut self, base: impl Into<String>) -> Self {
        self.base_branch = base.into();
        self
    }

    pub fn with_automerge_label(mut self, label: impl Into<String>) -> Self {
        self.automerge_label = label.into();
        self
    }

    /// Override the `gh` and `git` executables.
    pub fn with_binaries(mut self, gh: impl Into<String>, git: impl Into<String>) -> Self {
        self.gh_bin = gh.into();
        self.git_bin = git.into();
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    fn command(&self, bin: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(bin);
        cmd.args(args).current_dir(&self.workdir);
        self.identity.apply(&mut cmd);
        cmd
    }

    fn output(&self, bin: &str, args: &[&str]) -> Result<Output> {
        tracing::debug!(cmd = %display_cmd(bin, args), "running");
        self.command(bin, args).output().map_err(|source| Error::Spawn {
            cmd: display_cmd(bin, args),
            source,
        })
    }

    /// Run a command, returning stdout or an error carrying stderr.
    fn run(&self, bin: &str, args: &[&str]) -> Result<String> {
        let output = self.output(bin, args)?;
        if !output.status.success() {
            return Err(Error::Command {
                cmd: display_cmd(bin, args),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn gh(&self, args: &[&str]) -> Result<String> {
        self.run(&self.gh_bin, args)
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        self.run(&self.git_bin, args)
    }
}

fn display_cmd(bin: &str, args: &[&str]) -> String {
    std::iter::once(bin)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Parse `gh pr list --json number,title,headRefName` output.
fn parse_pr_list(json: &str) -> Result<Vec<OpenPr>> {
    let prs: Vec<GhPr> = serde_json::from_str(json)?;
    Ok(prs
        .into_iter()
        .map(|pr| OpenPr {
            package: package_from_pr(&pr.title, &pr.head_ref_name),
            number: pr.number,
            title: pr.title,
        })
        .collect())
}

/// Parse `gh pr view --json labels` output.
fn parse_labels(json: &str) -> Result<Vec<String>> {
    let labels: GhLabels = serde_json::from_str(json)?;
    Ok(labels.labels.into_iter().map(|l| l.name).collect())
}

impl Forge for GhCli {
    fn list_open_prs(&self, author: &str) -> Result<Vec<OpenPr>> {
        let json = self.gh(&[
            "pr",
            "list",
            "--author",
            author,
            "--state",
            "open",
            "--limit",
            PR_LIST_LIMIT,
            "--json",
            "number,title,headRefName",
        ])?;
        parse_pr_list(&json)
    }

    fn pr_labels(&self, pr: u64) -> Result<Vec<String>> {
        let json = self.gh(&["pr", "view", &pr.to_string(), "--json", "labels"])?;
        parse_labels(&json)
    }

    fn checks_passed(&self, pr: u64) -> Result<bool> {
        // Exit code 0 only when every check passed; pending and failing are non-zero.
        let output = self.output(&self.gh_bin, &["pr", "checks", &pr.to_string()])?;
        Ok(output.status.success())
    }

    fn automerge_enabled(&self, pr: u64) -> Result<bool> {
        let labels = self.pr_labels(pr)?;
        Ok(labels.iter().any(|l| l.eq_ignore_ascii_case(&self.automerge_label)))
    }

    fn comment(&self, pr: u64, body: &str) -> Result<()> {
        self.gh(&["pr", "comment", &pr.to_string(), "--body", body])?;
        Ok(())
    }

    fn edit_last_comment(&self, pr: u64, body: &str) -> Result<bool> {
        let number = pr.to_string();
        match self.gh(&["pr", "comment", &number, "--body", body, "--edit-last"]) {
            Ok(_) => Ok(true),
            Err(Error::Command { stderr, .. }) if stderr.contains("no comments found") => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn add_label(&self, pr: u64, label: &str) -> Result<()> {
        self.gh(&["pr", "edit", &pr.to_string(), "--add-label", label])?;
        Ok(())
    }

    fn merge(&self, pr: u64, options: MergeOptions) -> Result<()> {
        let number = pr.to_string();
        let mut args = vec!["pr", "merge", number.as_str(), "--rebase"];
        if options.delete_branch {
            args.push("--delete-branch");
        }
        if options.admin {
            args.push("--admin");
        }
        self.gh(&args)?;
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self
            .git(&["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string())
    }

    fn create_branch(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", "-b", branch])?;
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", branch])?;
        Ok(())
    }

    fn open_pr(&self, pr: &NewPr<'_>) -> Result<()> {
        let recipe_dir = path_arg(pr.recipe_dir);
        self.git(&["add", "--", &recipe_dir])?;
        self.git(&["commit", "-m", pr.title])?;
        self.git(&["push", "--set-upstream", &self.remote, pr.branch])?;

        let mut args = vec![
            "pr",
            "create",
            "--title",
            pr.title,
            "--body",
            pr.body,
            "--head",
            pr.branch,
            "--base",
            self.base_branch.as_str(),
        ];
        if pr.automerge {
            args.push("--label");
            args.push(self.automerge_label.as_str());
        }
        self.gh(&args)?;
        Ok(())
    }
}
