//! Tests for trigger evaluation and plan expansion through the CLI

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_tag_push_plans_release_plus_every_target() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let plan = run_json(
    &ws.path,
    &["shipmatrix", "plan", "--ref", "refs/tags/v1.2.3", "--json"],
  )?;
  assert_eq!(plan["decision"]["proceed"], true);
  assert_eq!(plan["tag"], "v1.2.3");
  assert_eq!(plan["version"], "1.2.3");

  let jobs = plan["jobs"].as_array().expect("jobs array");
  assert_eq!(jobs.len(), 35);
  assert_eq!(jobs[0]["id"], "release");
  assert_eq!(jobs[0]["continue_on_error"], false);
  for job in &jobs[1..] {
    assert_eq!(job["needs"], serde_json::json!(["release"]));
    assert_eq!(job["continue_on_error"], true);
  }

  Ok(())
}

#[test]
fn test_branch_push_is_skipped() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let plan = run_json(
    &ws.path,
    &["shipmatrix", "plan", "--ref", "refs/heads/main", "--json"],
  )?;
  assert_eq!(plan["decision"]["proceed"], false);
  assert_eq!(plan["jobs"].as_array().map(|j| j.len()), Some(0));

  Ok(())
}

#[test]
fn test_non_matching_tag_is_skipped() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let output = run_shipmatrix(&ws.path, &["shipmatrix", "plan", "--ref", "refs/tags/nightly"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Skipped"));
  assert!(stdout.contains("nightly"));

  Ok(())
}

#[test]
fn test_other_events_are_skipped() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let plan = run_json(
    &ws.path,
    &["shipmatrix", "plan", "--event", "pull_request", "--json"],
  )?;
  assert_eq!(plan["decision"]["proceed"], false);

  Ok(())
}

#[test]
fn test_dispatch_takes_tag_from_head() -> Result<()> {
  let ws = TestWorkspace::initialized()?;
  ws.tag("v0.3.0")?;

  let plan = run_json(
    &ws.path,
    &["shipmatrix", "plan", "--event", "workflow_dispatch", "--json"],
  )?;
  assert_eq!(plan["decision"]["proceed"], true);
  assert_eq!(plan["tag"], "v0.3.0");

  Ok(())
}

#[test]
fn test_custom_tag_patterns() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_config(
    r#"[release]
bin = "demo-tool"
tag_patterns = ["release-*"]
"#,
  )?;

  let matched = run_json(
    &ws.path,
    &["shipmatrix", "plan", "--ref", "refs/tags/release-7", "--json"],
  )?;
  assert_eq!(matched["decision"]["proceed"], true);

  let skipped = run_json(
    &ws.path,
    &["shipmatrix", "plan", "--ref", "refs/tags/v1.0.0", "--json"],
  )?;
  assert_eq!(skipped["decision"]["proceed"], false);

  Ok(())
}
