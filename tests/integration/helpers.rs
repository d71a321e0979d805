//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// CI variables that would change trigger evaluation or credentials
const CI_ENV: [&str; 4] = ["GITHUB_EVENT_NAME", "GITHUB_REF", "GITHUB_TOKEN", "GH_TOKEN"];

/// A git repository holding a single binary crate
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a workspace with one committed binary crate named `demo-tool`
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(
      path.join("Cargo.toml"),
      r#"[package]
name = "demo-tool"
version = "0.1.0"
edition = "2021"
license = "MIT"

[[bin]]
name = "demo-tool"
path = "src/main.rs"
"#,
    )?;
    std::fs::create_dir_all(path.join("src"))?;
    std::fs::write(path.join("src/main.rs"), "fn main() {\n    println!(\"demo\");\n}\n")?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial commit"])?;

    Ok(Self { _root: root, path })
  }

  /// Create a workspace and run `init` in it
  pub fn initialized() -> Result<Self> {
    let ws = Self::new()?;
    run_shipmatrix(&ws.path, &["shipmatrix", "init"])?;
    Ok(ws)
  }

  /// Tag HEAD
  pub fn tag(&self, name: &str) -> Result<()> {
    git(&self.path, &["tag", name])?;
    Ok(())
  }

  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("shipmatrix.toml"), content)?;
    Ok(())
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run cargo-shipmatrix and return its output whatever the exit status
pub fn shipmatrix_output(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_cargo-shipmatrix");

  let mut cmd = Command::new(bin);
  cmd.current_dir(cwd).args(args);
  for var in CI_ENV {
    cmd.env_remove(var);
  }
  cmd.output().context("Failed to run cargo-shipmatrix")
}

/// Run cargo-shipmatrix, failing on a non-zero exit
pub fn run_shipmatrix(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = shipmatrix_output(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "cargo-shipmatrix command failed: cargo {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run cargo-shipmatrix and parse stdout as JSON
pub fn run_json(cwd: &Path, args: &[&str]) -> Result<serde_json::Value> {
  let output = run_shipmatrix(cwd, args)?;
  serde_json::from_slice(&output.stdout).context("stdout is not valid JSON")
}
