//! GitHub releases via the gh CLI

use super::{Credential, ReleaseHost, ReleaseRecord, ReleaseRequest};
use crate::core::error::{ReleaseError, ShipError, ShipResult, ToolError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// `ReleaseHost` backed by `gh release ...`
pub struct GhCli {
  workdir: PathBuf,
  credential: Credential,
  /// Optional `owner/repo`; defaults to the repository of `workdir`
  repo: Option<String>,
}

impl GhCli {
  pub fn new(workdir: &Path, credential: Credential, repo: Option<String>) -> Self {
    Self {
      workdir: workdir.to_path_buf(),
      credential,
      repo,
    }
  }

  /// gh command with the token handed over through its environment only
  fn gh_cmd(&self) -> Command {
    let mut cmd = Command::new("gh");
    cmd.current_dir(&self.workdir);
    cmd.env("GH_TOKEN", self.credential.expose());
    cmd.env("GH_PROMPT_DISABLED", "1");
    cmd.env("NO_COLOR", "1");
    if let Some(repo) = &self.repo {
      cmd.env("GH_REPO", repo);
    }
    cmd
  }

  fn run(&self, args: &[String]) -> ShipResult<Output> {
    self.gh_cmd().args(args).output().map_err(|_| {
      ShipError::Tool(ToolError::NotInstalled {
        tool: "gh".to_string(),
      })
    })
  }

  fn release_exists(&self, tag: &str) -> ShipResult<bool> {
    let output = self.run(&view_args(tag))?;
    Ok(output.status.success())
  }
}

impl ReleaseHost for GhCli {
  fn create_release(&self, request: &ReleaseRequest) -> ShipResult<ReleaseRecord> {
    if self.release_exists(&request.tag)? {
      return Err(ShipError::Release(ReleaseError::AlreadyExists {
        tag: request.tag.clone(),
      }));
    }

    let output = self.run(&create_args(request))?;
    if !output.status.success() {
      return Err(ShipError::Release(ReleaseError::HostFailed {
        command: format!("gh release create {}", request.tag),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }

    // gh prints the release URL on success
    let url = String::from_utf8_lossy(&output.stdout)
      .lines()
      .map(str::trim)
      .find(|l| l.starts_with("https://"))
      .map(String::from);

    Ok(ReleaseRecord {
      tag: request.tag.clone(),
      url,
    })
  }

  fn upload_asset(&self, release: &ReleaseRecord, path: &Path) -> ShipResult<()> {
    let output = self.run(&upload_args(&release.tag, path))?;
    if !output.status.success() {
      return Err(ShipError::Release(ReleaseError::HostFailed {
        command: format!("gh release upload {} {}", release.tag, path.display()),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }
    Ok(())
  }
}

/// `gh release view`: succeeds only when a release exists for `tag`
fn view_args(tag: &str) -> Vec<String> {
  ["release", "view", tag, "--json", "tagName"].map(String::from).to_vec()
}

/// `gh release create`. Arguments bypass the shell, so multi-line markdown
/// notes pass through unchanged.
fn create_args(request: &ReleaseRequest) -> Vec<String> {
  let mut args: Vec<String> = [
    "release",
    "create",
    request.tag.as_str(),
    "--verify-tag",
    "--title",
    request.title.as_str(),
    "--notes",
    request.notes.as_str(),
  ]
  .map(String::from)
  .to_vec();
  if request.draft {
    args.push("--draft".to_string());
  }
  if request.prerelease {
    args.push("--prerelease".to_string());
  }
  args
}

/// `gh release upload`; `--clobber` lets a re-run leg replace its own asset
fn upload_args(tag: &str, path: &Path) -> Vec<String> {
  vec![
    "release".to_string(),
    "upload".to_string(),
    tag.to_string(),
    path.to_string_lossy().into_owned(),
    "--clobber".to_string(),
  ]
}
