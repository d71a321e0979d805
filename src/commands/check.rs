//! Check command: validate shipmatrix.toml before a tag is pushed
//!
//! Reads the config without the load-time validation so every problem is
//! reported at once instead of stopping at the first.

use crate::cargo::WorkspaceMetadata;
use crate::core::config::ShipConfig;
use crate::core::context::ShipContext;
use crate::core::error::{ConfigError, ResultExt, ShipError, ShipResult, ValidationError};
use crate::matrix::{self, MatrixEntry};
use crate::pipeline::trigger::TriggerRule;
use serde::Serialize;
use std::collections::HashSet;
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
  Pass,
  Warn,
  Fail,
}

/// Outcome of one check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
  pub name: String,
  pub status: CheckStatus,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub suggestion: Option<String>,
}

impl CheckResult {
  fn pass(name: &str, message: impl Into<String>) -> Self {
    Self {
      name: name.to_string(),
      status: CheckStatus::Pass,
      message: message.into(),
      suggestion: None,
    }
  }

  fn warn(name: &str, message: impl Into<String>, suggestion: impl Into<String>) -> Self {
    Self {
      name: name.to_string(),
      status: CheckStatus::Warn,
      message: message.into(),
      suggestion: Some(suggestion.into()),
    }
  }

  fn fail(name: &str, message: impl Into<String>, suggestion: Option<String>) -> Self {
    Self {
      name: name.to_string(),
      status: CheckStatus::Fail,
      message: message.into(),
      suggestion,
    }
  }
}

/// Run the check command
pub fn run_check(ctx: &ShipContext, thorough: bool, json: bool) -> ShipResult<()> {
  let root = ctx.workspace_root();
  let path = ShipConfig::find_config_path(root).ok_or_else(|| {
    ShipError::Config(ConfigError::NotFound {
      workspace_root: root.to_path_buf(),
    })
  })?;

  let content =
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read config from {}", path.display()))?;
  let config: ShipConfig = toml_edit::de::from_str(&content)?;
  let entries = config.matrix();

  let mut results = vec![CheckResult::pass("config", format!("{}", path.display()))];
  results.push(check_tag_patterns(&config));
  results.push(check_binary(ctx, &config));
  results.push(check_matrix(&entries));
  if let Some(result) = check_changelog(ctx, &config) {
    results.push(result);
  }
  results.push(check_repository(ctx));

  if thorough {
    results.push(check_known_targets(&entries));
    results.push(check_tool("gh", "Install the GitHub CLI: https://cli.github.com"));
  }

  if json {
    println!("{}", serde_json::to_string_pretty(&results)?);
  } else {
    print_results(&results, entries.len());
  }

  let failures: Vec<String> = results
    .iter()
    .filter(|r| r.status == CheckStatus::Fail)
    .map(|r| format!("{}: {}", r.name, r.message))
    .collect();

  if failures.is_empty() {
    Ok(())
  } else {
    Err(ShipError::Validation(ValidationError::MatrixInvalid { issues: failures }))
  }
}

fn check_tag_patterns(config: &ShipConfig) -> CheckResult {
  if config.release.tag_patterns.is_empty() {
    return CheckResult::fail(
      "tag-patterns",
      "no tag patterns configured",
      Some("Add tag_patterns = [\"v*\"] under [release].".to_string()),
    );
  }
  match TriggerRule::new(config.release.tag_patterns.as_slice()) {
    Ok(_) => CheckResult::pass("tag-patterns", config.release.tag_patterns.join(", ")),
    Err(e) => CheckResult::fail("tag-patterns", e.to_string(), e.help_message()),
  }
}

fn check_binary(ctx: &ShipContext, config: &ShipConfig) -> CheckResult {
  let detected = WorkspaceMetadata::load(ctx.workspace_root()).ok();
  let binaries = detected.as_ref().map(|m| m.binary_names()).unwrap_or_default();

  match &config.release.bin {
    Some(bin) if detected.is_none() || binaries.contains(bin) => CheckResult::pass("binary", bin.clone()),
    Some(bin) => CheckResult::fail(
      "binary",
      format!("'{}' is not a binary target of this workspace", bin),
      Some(format!("Available binaries: {}", binaries.join(", "))),
    ),
    None => match binaries.first() {
      Some(bin) => CheckResult::pass("binary", format!("{} (detected)", bin)),
      None => {
        let err = ConfigError::MissingBinary;
        CheckResult::fail("binary", err.to_string(), ShipError::Config(err).help_message())
      }
    },
  }
}

fn check_matrix(entries: &[MatrixEntry]) -> CheckResult {
  let issues = matrix::validate_matrix(entries);
  if issues.is_empty() {
    let cross = entries.iter().filter(|e| e.needs_cross()).count();
    let arches: HashSet<&str> = entries.iter().map(|e| e.target.arch()).collect();
    CheckResult::pass(
      "matrix",
      format!(
        "{} entries, {} architectures, {} via cross",
        entries.len(),
        arches.len(),
        cross
      ),
    )
  } else {
    let message = issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; ");
    CheckResult::fail(
      "matrix",
      message,
      Some("Each [[targets]] entry needs a unique (target, host) pair the host can build.".to_string()),
    )
  }
}

fn check_changelog(ctx: &ShipContext, config: &ShipConfig) -> Option<CheckResult> {
  let changelog = config.release.changelog.as_ref()?;
  let path = ctx.workspace_root().join(changelog);
  Some(if path.exists() {
    CheckResult::pass("changelog", changelog.display().to_string())
  } else {
    CheckResult::warn(
      "changelog",
      format!("{} does not exist", changelog.display()),
      "Releases will be created with empty notes.",
    )
  })
}

fn check_repository(ctx: &ShipContext) -> CheckResult {
  match &ctx.git {
    Some(git) => CheckResult::pass("repository", git.work_tree().display().to_string()),
    None => CheckResult::warn(
      "repository",
      "not inside a git repository",
      "Tags cannot be resolved from HEAD; pass --tag explicitly.",
    ),
  }
}

/// Every configured triple must be one rustc knows about
fn check_known_targets(entries: &[MatrixEntry]) -> CheckResult {
  let output = match Command::new("rustc").args(["--print", "target-list"]).output() {
    Ok(output) if output.status.success() => output,
    _ => {
      return CheckResult::warn(
        "known-targets",
        "could not run rustc --print target-list",
        "Install a Rust toolchain to verify target triples.",
      );
    }
  };

  let stdout = String::from_utf8_lossy(&output.stdout);
  let known: HashSet<&str> = stdout.lines().map(str::trim).collect();
  let unknown: Vec<&str> = entries
    .iter()
    .map(|e| e.target.as_str())
    .filter(|t| !known.contains(t))
    .collect();

  if unknown.is_empty() {
    CheckResult::pass("known-targets", format!("all {} targets known to rustc", entries.len()))
  } else {
    CheckResult::fail(
      "known-targets",
      format!("unknown to rustc: {}", unknown.join(", ")),
      Some("Check the spelling, or update the toolchain (rustup update).".to_string()),
    )
  }
}

fn check_tool(tool: &str, suggestion: &str) -> CheckResult {
  let found = Command::new(tool)
    .arg("--version")
    .output()
    .is_ok_and(|o| o.status.success());
  if found {
    CheckResult::pass(tool, "installed")
  } else {
    CheckResult::warn(tool, "not found on PATH", suggestion)
  }
}

fn print_results(results: &[CheckResult], entries: usize) {
  println!("🩺 Checking release configuration ({} matrix entries)", entries);
  println!();
  for result in results {
    let icon = match result.status {
      CheckStatus::Pass => "✅",
      CheckStatus::Warn => "⚠️ ",
      CheckStatus::Fail => "❌",
    };
    println!("  {} {}: {}", icon, result.name, result.message);
    if let Some(suggestion) = &result.suggestion
      && result.status != CheckStatus::Pass
    {
      println!("     💡 {}", suggestion);
    }
  }
  println!();

  let failed = results.iter().filter(|r| r.status == CheckStatus::Fail).count();
  if failed == 0 {
    println!("✅ All checks passed");
  } else {
    println!("❌ {} check(s) failed", failed);
  }
}
