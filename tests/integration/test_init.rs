//! Tests for the `init` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_creates_config() -> Result<()> {
  let ws = TestWorkspace::new()?;

  run_shipmatrix(&ws.path, &["shipmatrix", "init"])?;

  assert!(ws.file_exists("shipmatrix.toml"));
  let config = ws.read_file("shipmatrix.toml")?;
  assert!(config.contains("bin = \"demo-tool\""));
  assert!(config.contains("v*"));
  assert_eq!(config.matches("[[targets]]").count(), 34);
  assert!(config.contains("x86_64-pc-windows-msvc"));

  Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
  let ws = TestWorkspace::initialized()?;
  ws.write_config("[release]\nbin = \"custom\"\n")?;

  let output = shipmatrix_output(&ws.path, &["shipmatrix", "init"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));
  assert!(ws.read_file("shipmatrix.toml")?.contains("custom"));

  run_shipmatrix(&ws.path, &["shipmatrix", "init", "--force"])?;
  assert!(ws.read_file("shipmatrix.toml")?.contains("demo-tool"));

  Ok(())
}

#[test]
fn test_generated_config_plans_cleanly() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let plan = run_json(
    &ws.path,
    &["shipmatrix", "plan", "--ref", "refs/tags/v0.1.0", "--json"],
  )?;
  assert_eq!(plan["bin"], "demo-tool");
  assert_eq!(plan["jobs"].as_array().map(|j| j.len()), Some(35));

  Ok(())
}
