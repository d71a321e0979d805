//! Job command: one per-target job, i.e. one CI matrix leg
//!
//! The release is assumed to exist already (created by `cargo shipmatrix
//! release` in an earlier job). A failing leg exits non-zero; the CI
//! definition marks legs continue-on-error so siblings are unaffected.

use super::plan::{EventArgs, build_plan};
use super::{RunSettings, check_status, emit_report, emit_skipped, exec_options, with_executor};
use crate::core::context::ShipContext;
use crate::core::error::{ShipError, ShipResult};
use crate::matrix::HostOs;
use crate::pipeline::executor::Selection;

/// Run the per-target job(s) for `target`
pub fn run_job(
  ctx: &ShipContext,
  target: &str,
  host: Option<HostOs>,
  args: EventArgs,
  dry_run: bool,
  json: bool,
) -> ShipResult<()> {
  let plan = build_plan(ctx, &args)?;
  if !plan.decision.proceed {
    return emit_skipped(&plan, dry_run, json);
  }

  // Prefer the entry for this machine when a target is declared on several hosts
  let mut jobs = plan.jobs_for_target(target, host.or_else(HostOs::current));
  if jobs.is_empty() && host.is_none() {
    jobs = plan.jobs_for_target(target, None);
  }
  if jobs.is_empty() {
    return Err(ShipError::with_help(
      format!("No job builds '{}'", target),
      "Run 'cargo shipmatrix matrix' to list the configured targets.",
    ));
  }

  let ids = jobs.iter().map(|j| j.id.clone()).collect();
  let settings = RunSettings {
    jobs: Some(1),
    all_hosts: true,
    dry_run,
    json,
  };
  let options = exec_options(ctx, &settings)?;
  let report = with_executor(ctx, options, |executor| {
    executor.run_selected(&plan, &Selection::Only(ids))
  })?;

  emit_report(&report, json, None)?;
  check_status(&report, true)
}
