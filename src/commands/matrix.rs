//! Matrix command: emit the matrix as a CI `strategy.matrix` include list

use crate::core::context::ShipContext;
use crate::core::error::ShipResult;
use crate::matrix::{self, HostOs, MatrixEntry};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct IncludeEntry<'a> {
  target: &'a str,
  os: &'static str,
  cross: bool,
}

#[derive(Debug, Serialize)]
struct CiMatrix<'a> {
  include: Vec<IncludeEntry<'a>>,
}

fn ci_matrix(entries: &[MatrixEntry], host: Option<HostOs>) -> CiMatrix<'_> {
  CiMatrix {
    include: entries
      .iter()
      .filter(|e| host.is_none_or(|h| h == e.host))
      .map(|e| IncludeEntry {
        target: e.target.as_str(),
        os: e.host.runner_label(),
        cross: e.needs_cross(),
      })
      .collect(),
  }
}

/// Run the matrix command. Works without a config (default matrix).
pub fn run_matrix(ctx: &ShipContext, host: Option<HostOs>) -> ShipResult<()> {
  let entries = match &ctx.config {
    Some(config) => config.matrix(),
    None => matrix::default_matrix(),
  };
  // Single line so it can go straight into $GITHUB_OUTPUT
  println!("{}", serde_json::to_string(&ci_matrix(&entries, host))?);
  Ok(())
}
