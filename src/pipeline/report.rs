//! Run reports: what happened to every job of a pipeline run

use crate::core::error::{ResultExt, ShipResult};
use crate::matrix::HostOs;
use crate::pipeline::plan::{JobSpec, PipelinePlan};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  /// Trigger did not match; nothing ran
  Skipped,
  /// Dry run; nothing executed
  Planned,
  Succeeded,
  /// Only continue-on-error jobs failed
  CompletedWithFailures,
  /// A hard job failed or was blocked
  Failed,
}

/// What happened to a single job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
  Succeeded { assets: Vec<String> },
  Failed { step: String, error: String },
  /// Never started because a prerequisite failed
  Blocked { by: String },
  /// Belongs to a runner on another host
  Deferred { host: HostOs },
  /// Dry run: the steps that would run
  Planned { steps: Vec<String> },
}

impl JobOutcome {
  pub fn is_failure(&self) -> bool {
    matches!(self, JobOutcome::Failed { .. })
  }

  pub fn was_attempted(&self) -> bool {
    matches!(self, JobOutcome::Succeeded { .. } | JobOutcome::Failed { .. })
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
  pub id: String,
  pub host: HostOs,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target: Option<String>,
  pub continue_on_error: bool,
  pub outcome: JobOutcome,
  pub duration_ms: u64,
}

impl JobReport {
  pub fn new(job: &JobSpec, outcome: JobOutcome, duration_ms: u64) -> Self {
    Self {
      id: job.id.clone(),
      host: job.host,
      target: job.target.as_ref().map(|t| t.to_string()),
      continue_on_error: job.continue_on_error,
      outcome,
      duration_ms,
    }
  }

  /// Whether jobs that need this one may start
  pub fn satisfies_dependents(&self) -> bool {
    match &self.outcome {
      JobOutcome::Succeeded { .. } | JobOutcome::Planned { .. } => true,
      JobOutcome::Failed { .. } => self.continue_on_error,
      JobOutcome::Blocked { .. } | JobOutcome::Deferred { .. } => false,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub plan_id: String,
  pub tag: Option<String>,
  pub reason: String,
  pub status: RunStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub release_url: Option<String>,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub jobs: Vec<JobReport>,
}

impl RunReport {
  pub fn start(plan: &PipelinePlan) -> Self {
    let now = Utc::now();
    Self {
      plan_id: plan.id.short().to_string(),
      tag: plan.tag.clone(),
      reason: plan.decision.reason.clone(),
      status: RunStatus::Skipped,
      release_url: None,
      started_at: now,
      finished_at: now,
      jobs: Vec::new(),
    }
  }

  /// Stamp the finish time and derive the run status
  pub fn finish(&mut self, proceeded: bool, dry_run: bool) {
    self.finished_at = Utc::now();
    self.status = if !proceeded {
      RunStatus::Skipped
    } else if dry_run {
      RunStatus::Planned
    } else if self
      .jobs
      .iter()
      .any(|j| matches!(j.outcome, JobOutcome::Blocked { .. }) || (j.outcome.is_failure() && !j.continue_on_error))
    {
      RunStatus::Failed
    } else if self.jobs.iter().any(|j| j.outcome.is_failure()) {
      RunStatus::CompletedWithFailures
    } else {
      RunStatus::Succeeded
    };
  }

  pub fn failed_jobs(&self) -> Vec<&JobReport> {
    self.jobs.iter().filter(|j| j.outcome.is_failure()).collect()
  }

  pub fn attempted(&self) -> usize {
    self.jobs.iter().filter(|j| j.outcome.was_attempted()).count()
  }

  pub fn job(&self, id: &str) -> Option<&JobReport> {
    self.jobs.iter().find(|j| j.id == id)
  }

  pub fn write_json(&self, path: &Path) -> ShipResult<()> {
    let json = serde_json::to_string_pretty(self)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report to {}", path.display()))
  }

  /// Human-readable summary, one line per job
  pub fn render_text(&self) -> String {
    let mut out = String::new();
    let tag = self.tag.as_deref().unwrap_or("<no tag>");
    out.push_str(&format!("📋 Run {} for {} ({})\n", self.plan_id, tag, self.reason));

    for job in &self.jobs {
      let label = job.target.as_deref().unwrap_or(&job.id);
      let line = match &job.outcome {
        JobOutcome::Succeeded { assets } if assets.is_empty() => format!("  ✅ {}", label),
        JobOutcome::Succeeded { assets } => format!("  ✅ {} → {}", label, assets.join(", ")),
        JobOutcome::Failed { step, error } => {
          let first = error.lines().next().unwrap_or("");
          format!("  ❌ {} [{}] {}", label, step, first)
        }
        JobOutcome::Blocked { by } => format!("  ⛔ {} (blocked by {})", label, by),
        JobOutcome::Deferred { host } => format!("  ⏭️  {} (runs on {})", label, host),
        JobOutcome::Planned { steps } => format!("  🔍 {} ({}) : {}", label, job.host, steps.join(" → ")),
      };
      out.push_str(&line);
      out.push('\n');
    }

    if let Some(url) = &self.release_url {
      out.push_str(&format!("\n🔗 {}\n", url));
    }

    let summary = match self.status {
      RunStatus::Skipped => format!("⚪ Skipped: {}", self.reason),
      RunStatus::Planned => format!("🔍 Dry run: {} job(s) planned", self.jobs.len()),
      RunStatus::Succeeded => format!("✅ All {} attempted job(s) succeeded", self.attempted()),
      RunStatus::CompletedWithFailures => format!(
        "⚠️  Completed with {} failed target job(s) out of {} attempted",
        self.failed_jobs().len(),
        self.attempted()
      ),
      RunStatus::Failed => "❌ Run failed".to_string(),
    };
    out.push('\n');
    out.push_str(&summary);
    out.push('\n');
    out
  }
}
