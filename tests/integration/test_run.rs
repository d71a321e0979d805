//! Tests for `run`, `release` and `job` that never reach the release host

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_dry_run_plans_every_job() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let report = run_json(
    &ws.path,
    &[
      "shipmatrix",
      "run",
      "--ref",
      "refs/tags/v1.2.3",
      "--dry-run",
      "--all-hosts",
      "--json",
    ],
  )?;
  assert_eq!(report["status"], "planned");
  assert_eq!(report["tag"], "v1.2.3");

  let jobs = report["jobs"].as_array().expect("jobs array");
  assert_eq!(jobs.len(), 35);
  assert!(jobs.iter().all(|j| j["outcome"]["status"] == "planned"));
  assert!(!ws.file_exists("target/shipmatrix"));

  Ok(())
}

#[test]
fn test_dry_run_writes_report() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  run_shipmatrix(
    &ws.path,
    &[
      "shipmatrix",
      "run",
      "--ref",
      "refs/tags/v1.2.3",
      "--dry-run",
      "--report",
      "report.json",
    ],
  )?;

  let report: serde_json::Value = serde_json::from_str(&ws.read_file("report.json")?)?;
  assert_eq!(report["status"], "planned");
  assert_eq!(report["jobs"].as_array().map(|j| j.len()), Some(35));

  Ok(())
}

#[test]
fn test_branch_push_run_is_a_silent_skip() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let output = run_shipmatrix(&ws.path, &["shipmatrix", "run", "--ref", "refs/heads/main"])?;
  assert!(output.status.success());
  assert!(String::from_utf8_lossy(&output.stdout).contains("Skipped"));

  Ok(())
}

#[test]
fn test_release_requires_credential() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let output = shipmatrix_output(&ws.path, &["shipmatrix", "release", "--ref", "refs/tags/v1.2.3"])?;
  assert_eq!(output.status.code(), Some(2));
  assert!(String::from_utf8_lossy(&output.stderr).contains("GITHUB_TOKEN"));

  Ok(())
}

#[test]
fn test_job_dry_run_selects_one_leg() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let report = run_json(
    &ws.path,
    &[
      "shipmatrix",
      "job",
      "aarch64-unknown-linux-musl",
      "--ref",
      "refs/tags/v1.2.3",
      "--dry-run",
      "--json",
    ],
  )?;
  let jobs = report["jobs"].as_array().expect("jobs array");
  assert_eq!(jobs.len(), 1);
  assert_eq!(jobs[0]["target"], "aarch64-unknown-linux-musl");
  assert_eq!(
    jobs[0]["outcome"]["steps"],
    serde_json::json!(["checkout", "install-cross", "build-and-upload"])
  );

  Ok(())
}

#[test]
fn test_job_for_unknown_target() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let output = shipmatrix_output(
    &ws.path,
    &["shipmatrix", "job", "sparc64-unknown-linux-gnu", "--ref", "refs/tags/v1.2.3"],
  )?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("sparc64-unknown-linux-gnu"));

  Ok(())
}

#[test]
fn test_release_and_job_skips_emit_json_reports() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let release = run_json(
    &ws.path,
    &["shipmatrix", "release", "--ref", "refs/heads/main", "--json"],
  )?;
  assert_eq!(release["status"], "skipped");
  assert_eq!(release["jobs"].as_array().map(|j| j.len()), Some(0));

  let job = run_json(
    &ws.path,
    &[
      "shipmatrix",
      "job",
      "x86_64-unknown-linux-gnu",
      "--ref",
      "refs/tags/v1/hotfix",
      "--json",
    ],
  )?;
  assert_eq!(job["status"], "skipped");
  assert!(job["reason"].as_str().is_some_and(|r| r.contains("v1/hotfix")));

  Ok(())
}
