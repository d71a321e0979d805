//! Plan command: evaluate the trigger and show what a run would do

use crate::core::context::ShipContext;
use crate::core::error::ShipResult;
use crate::pipeline::graph::JobGraph;
use crate::pipeline::plan::{PipelinePlan, Step};
use crate::pipeline::trigger::Event;

/// Event selection shared by plan/run/release/job
#[derive(Debug, Clone, Default)]
pub struct EventArgs {
  /// Event name (`push`, `workflow_dispatch`, ...); CI environment when absent
  pub event: Option<String>,
  /// Git ref of a push (`refs/tags/v1.2.3`)
  pub git_ref: Option<String>,
  /// Explicit release tag
  pub tag: Option<String>,
}

impl EventArgs {
  /// `--event` wins; a bare `--ref` means a push; otherwise read the CI environment
  pub fn resolve_event(&self) -> Event {
    match (&self.event, &self.git_ref) {
      (Some(name), git_ref) => Event::from_parts(name, git_ref.as_deref()),
      (None, Some(git_ref)) => Event::Push {
        git_ref: git_ref.clone(),
      },
      (None, None) => Event::from_env(),
    }
  }
}

/// Evaluate the trigger and expand the matrix
pub(crate) fn build_plan(ctx: &ShipContext, args: &EventArgs) -> ShipResult<PipelinePlan> {
  let config = ctx.require_config()?;
  let rule = config.trigger_rule()?;
  let event = args.resolve_event();
  let decision = rule.evaluate(&event);

  let tag = if decision.proceed {
    ctx.resolve_tag(args.tag.as_deref(), &decision, &rule)
  } else {
    None
  };

  PipelinePlan::build(config, event, decision, tag)
}

/// Run the plan command
pub fn run_plan(ctx: &ShipContext, args: EventArgs, json: bool) -> ShipResult<()> {
  let plan = build_plan(ctx, &args)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&plan)?);
    return Ok(());
  }

  println!("📋 Plan {} for {}", plan.id, plan.event);
  if !plan.decision.proceed {
    println!("⚪ Skipped: {}", plan.decision.reason);
    return Ok(());
  }

  println!("   Trigger: {}", plan.decision.reason);
  println!("   Tag:     {}", plan.tag.as_deref().unwrap_or("<none>"));
  if let Some(version) = &plan.version {
    println!("   Version: {}", version);
  }
  if let Some(bin) = &plan.bin {
    println!("   Binary:  {}", bin);
  }
  if let Some(head) = ctx.git.as_ref().and_then(|git| git.head_commit().ok()) {
    println!("   Commit:  {}", &head[..12.min(head.len())]);
  }
  println!();

  let graph = JobGraph::from_jobs(&plan.jobs)?;
  for job in &plan.jobs {
    let needs = if job.needs.is_empty() {
      format!(" (gates {} job(s))", graph.dependents(&job.id).len())
    } else {
      format!(" (needs {})", job.needs.join(", "))
    };
    println!("  📦 {} on {}{}", job.id, job.runner, needs);
    for step in &job.steps {
      let detail = match step {
        Step::BuildAndUpload { asset, .. } => format!(" → {}", asset),
        Step::CreateRelease { draft: true, .. } => " (draft)".to_string(),
        _ => String::new(),
      };
      println!("     • {}{}", step.name(), detail);
    }
  }

  let cross = plan.target_jobs().filter(|j| j.uses_cross()).count();
  println!();
  println!(
    "✅ {} job(s): 1 release + {} target(s), {} via cross",
    plan.jobs.len(),
    plan.jobs.len() - 1,
    cross
  );

  Ok(())
}
