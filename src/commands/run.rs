//! Run command: the whole pipeline on this machine
//!
//! Per-target jobs for other hosts are deferred to their own runners unless
//! `--all-hosts` is given (useful with `--dry-run` to see every job).

use super::plan::{EventArgs, build_plan};
use super::{RunSettings, check_status, emit_report, emit_skipped_to, exec_options, with_executor};
use crate::core::context::ShipContext;
use crate::core::error::ShipResult;
use std::path::PathBuf;

/// Run the full pipeline
pub fn run_pipeline(
  ctx: &ShipContext,
  args: EventArgs,
  settings: RunSettings,
  report_path: Option<PathBuf>,
  strict: bool,
) -> ShipResult<()> {
  let plan = build_plan(ctx, &args)?;

  if !plan.decision.proceed {
    return emit_skipped_to(&plan, settings.dry_run, settings.json, report_path.as_deref());
  }

  if !settings.json {
    let mode = if settings.dry_run { " (dry run)" } else { "" };
    println!(
      "🚀 Releasing {} with {} job(s){}",
      plan.tag.as_deref().unwrap_or("<no tag>"),
      plan.jobs.len(),
      mode
    );
  }
  let options = exec_options(ctx, &settings)?;
  let report = with_executor(ctx, options, |executor| executor.run(&plan))?;

  emit_report(&report, settings.json, report_path.as_deref())?;
  check_status(&report, strict)
}
