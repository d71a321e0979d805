//! Release command: create the release for a tag and nothing else
//!
//! The first job of a CI run; the per-target legs (`cargo shipmatrix job`)
//! attach their assets to the release it creates.

use super::plan::{EventArgs, build_plan};
use super::{RunSettings, check_status, emit_report, emit_skipped, exec_options, with_executor};
use crate::core::context::ShipContext;
use crate::core::error::ShipResult;

/// Run only the release-creation job
pub fn run_release(ctx: &ShipContext, args: EventArgs, dry_run: bool, json: bool) -> ShipResult<()> {
  let plan = build_plan(ctx, &args)?;
  if !plan.decision.proceed {
    return emit_skipped(&plan, dry_run, json);
  }

  if !dry_run {
    ctx.require_git()?;
  }

  let settings = RunSettings {
    jobs: Some(1),
    all_hosts: true,
    dry_run,
    json,
  };
  let options = exec_options(ctx, &settings)?;
  let report = with_executor(ctx, options, |executor| executor.run_release(&plan))?;

  emit_report(&report, json, None)?;
  check_status(&report, true)
}
