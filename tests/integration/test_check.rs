//! Tests for the `check` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_check_passes_on_generated_config() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let results = run_json(&ws.path, &["shipmatrix", "check", "--json"])?;
  let results = results.as_array().expect("check --json prints an array");
  assert!(results.iter().all(|r| r["status"] != "fail"));
  assert!(
    results
      .iter()
      .any(|r| r["name"] == "matrix" && r["message"].as_str().unwrap_or("").starts_with("34 entries"))
  );

  Ok(())
}

#[test]
fn test_check_reports_impossible_pair() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_config(
    r#"[release]
bin = "demo-tool"

[[targets]]
target = "aarch64-apple-darwin"
host = "windows"
"#,
  )?;

  let output = shipmatrix_output(&ws.path, &["shipmatrix", "check"])?;
  assert_eq!(output.status.code(), Some(3));
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("windows host cannot build aarch64-apple-darwin"));

  Ok(())
}

#[test]
fn test_check_without_config() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = shipmatrix_output(&ws.path, &["shipmatrix", "check"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("cargo shipmatrix init"));

  Ok(())
}
