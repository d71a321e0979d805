//! CLI commands for cargo-shipmatrix
//!
//! ## Setup & Inspection
//! - **init**: write shipmatrix.toml with the default matrix
//! - **check**: validate config, tag patterns and the matrix
//! - **matrix**: print the matrix as CI `include` JSON
//! - **plan**: evaluate the trigger and show the job plan
//!
//! ## Execution
//! - **run**: the whole pipeline (release, then every target)
//! - **release**: only the release-creation job
//! - **job**: one per-target job (one CI leg)
//!
//! All commands accept `&ShipContext` to avoid reloading config per step.

pub mod check;
pub mod init;
pub mod job;
pub mod matrix;
pub mod plan;
pub mod release;
pub mod run;

pub use check::run_check;
pub use init::run_init;
pub use job::run_job;
pub use matrix::run_matrix;
pub use plan::run_plan;
pub use release::run_release;
pub use run::run_pipeline;

use crate::core::context::ShipContext;
use crate::core::error::{ReleaseError, ShipError, ShipResult, ValidationError};
use crate::pipeline::executor::{ExecOptions, Executor};
use crate::pipeline::plan::PipelinePlan;
use crate::pipeline::report::{RunReport, RunStatus};
use crate::release::{Credential, GhCli};
use crate::toolchain::CargoToolchain;
use std::io::IsTerminal;

/// Where the run happens and how loudly
pub(crate) struct RunSettings {
  pub jobs: Option<usize>,
  pub all_hosts: bool,
  pub dry_run: bool,
  pub json: bool,
}

/// Build executor options from config and flags
pub(crate) fn exec_options(ctx: &ShipContext, settings: &RunSettings) -> ShipResult<ExecOptions> {
  let config = ctx.require_config()?;
  let root = ctx.workspace_root().to_path_buf();
  let defaults = ExecOptions::new(root.clone());

  Ok(ExecOptions {
    jobs: settings.jobs.unwrap_or(defaults.jobs),
    host_filter: if settings.all_hosts { None } else { defaults.host_filter },
    dry_run: settings.dry_run,
    staging_dir: root.join(&config.release.staging_dir),
    checksum: config.release.checksum,
    features: config.release.features.clone(),
    changelog: config.release.changelog.clone(),
    show_progress: !settings.json && std::io::stdout().is_terminal(),
    workspace_root: root,
  })
}

/// Wire the real collaborators (gh, cargo/cross) and run `f` with an executor
pub(crate) fn with_executor<T>(
  ctx: &ShipContext,
  options: ExecOptions,
  f: impl FnOnce(&Executor<'_>) -> ShipResult<T>,
) -> ShipResult<T> {
  let config = ctx.require_config()?;

  // Dry runs never reach the host, so they work without a token
  let credential = if options.dry_run {
    Credential::new("")
  } else {
    Credential::from_env()?
  };

  let host = GhCli::new(ctx.workspace_root(), credential, config.release.repository.clone());
  let toolchain = CargoToolchain::new(ctx.workspace_root());
  let executor = Executor::new(&host, &toolchain, ctx.git.as_ref(), config.permissions.clone(), options);
  f(&executor)
}

/// Print a report (text or JSON) and optionally persist it
pub(crate) fn emit_report(report: &RunReport, json: bool, path: Option<&std::path::Path>) -> ShipResult<()> {
  if let Some(path) = path {
    report.write_json(path)?;
  }

  if json {
    println!("{}", serde_json::to_string_pretty(report)?);
  } else {
    print!("{}", report.render_text());
    if let Some(path) = path {
      println!("📝 Report written to {}", path.display());
    }
  }
  Ok(())
}

/// Report a run the trigger skipped. Skips never need credentials or tools.
pub(crate) fn emit_skipped(plan: &PipelinePlan, dry_run: bool, json: bool) -> ShipResult<()> {
  emit_skipped_to(plan, dry_run, json, None)
}

pub(crate) fn emit_skipped_to(
  plan: &PipelinePlan,
  dry_run: bool,
  json: bool,
  path: Option<&std::path::Path>,
) -> ShipResult<()> {
  let mut report = RunReport::start(plan);
  report.finish(false, dry_run);
  emit_report(&report, json, path)
}

/// Map the run status to the process outcome
pub(crate) fn check_status(report: &RunReport, strict: bool) -> ShipResult<()> {
  match report.status {
    RunStatus::Failed => {
      let jobs = report
        .jobs
        .iter()
        .filter(|j| !j.satisfies_dependents() && !j.continue_on_error)
        .map(|j| j.id.clone())
        .collect();
      Err(ShipError::Release(ReleaseError::RunFailed { jobs }))
    }
    RunStatus::CompletedWithFailures if strict => Err(ShipError::Validation(ValidationError::JobsFailed {
      failed: report
        .failed_jobs()
        .iter()
        .map(|j| j.target.clone().unwrap_or_else(|| j.id.clone()))
        .collect(),
    })),
    _ => Ok(()),
  }
}
