//! Tests for the `matrix` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_matrix_prints_include_list() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let matrix = run_json(&ws.path, &["shipmatrix", "matrix"])?;
  let include = matrix["include"].as_array().expect("include array");
  assert_eq!(include.len(), 34);
  assert!(
    include
      .iter()
      .any(|e| e["target"] == "aarch64-apple-darwin" && e["os"] == "macos-latest" && e["cross"] == false)
  );
  assert!(
    include
      .iter()
      .any(|e| e["target"] == "aarch64-unknown-linux-musl" && e["os"] == "ubuntu-latest" && e["cross"] == true)
  );

  Ok(())
}

#[test]
fn test_matrix_host_filter() -> Result<()> {
  let ws = TestWorkspace::initialized()?;

  let matrix = run_json(&ws.path, &["shipmatrix", "matrix", "--host", "macos"])?;
  let include = matrix["include"].as_array().expect("include array");
  assert_eq!(include.len(), 4);
  assert!(include.iter().all(|e| e["os"] == "macos-latest"));

  Ok(())
}

#[test]
fn test_matrix_uses_declared_targets() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_config(
    r#"[release]
bin = "demo-tool"

[[targets]]
target = "x86_64-unknown-linux-musl"
host = "ubuntu-latest"
"#,
  )?;

  let matrix = run_json(&ws.path, &["shipmatrix", "matrix"])?;
  assert_eq!(matrix["include"].as_array().map(|i| i.len()), Some(1));

  Ok(())
}
