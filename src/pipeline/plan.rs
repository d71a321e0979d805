//! Pipeline planning: expand the matrix into a reviewable job plan
//!
//! Every run produces a `PipelinePlan` before anything executes, enabling:
//!
//! - **Dry-run mode**: show the jobs and steps without running them
//! - **Auditability**: plans are JSON-serializable for logging/review
//! - **Identity**: plans are content-hashed, so identical inputs give identical IDs
//!
//! # Shape
//!
//! ```text
//! release (checkout, create-release)
//!   ├─► upload-aarch64-unknown-linux-gnu-linux (checkout, install-cross, build-and-upload)
//!   ├─► upload-x86_64-apple-darwin-macos      (checkout, build-and-upload)
//!   └─► ...one job per matrix entry
//! ```

use crate::core::config::{Permissions, ShipConfig};
use crate::core::error::ShipResult;
use crate::matrix::{HostOs, MatrixEntry, TargetTriple};
use crate::pipeline::graph::JobGraph;
use crate::pipeline::trigger::{Event, TriggerDecision};
use crate::release::asset::asset_name;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// ID of the release-creation job every target job depends on
pub const RELEASE_JOB_ID: &str = "release";

/// Plan identifier (SHA256 hash of the job list)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// A single step inside a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum Step {
  /// Resolve the source at the release tag
  Checkout,

  /// Create the published release for the tag
  CreateRelease {
    tag: Option<String>,
    draft: bool,
    prerelease: bool,
  },

  /// Install the cross-compilation toolchain
  InstallCross { target: TargetTriple },

  /// Build the binary for the target and attach it to the release
  BuildAndUpload {
    bin: String,
    target: TargetTriple,
    asset: String,
  },
}

impl Step {
  pub fn name(&self) -> &'static str {
    match self {
      Step::Checkout => "checkout",
      Step::CreateRelease { .. } => "create-release",
      Step::InstallCross { .. } => "install-cross",
      Step::BuildAndUpload { .. } => "build-and-upload",
    }
  }
}

/// One job of the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
  pub id: String,
  pub name: String,
  pub runner: String,
  pub host: HostOs,
  /// Target triple (per-target jobs only)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target: Option<TargetTriple>,
  pub needs: Vec<String>,
  pub continue_on_error: bool,
  pub steps: Vec<Step>,
}

impl JobSpec {
  /// Job id for a matrix entry
  pub fn target_job_id(entry: &MatrixEntry) -> String {
    format!("upload-{}-{}", entry.target, entry.host)
  }

  fn release(tag: Option<String>, draft: bool, prerelease: bool) -> Self {
    Self {
      id: RELEASE_JOB_ID.to_string(),
      name: "create-release".to_string(),
      runner: HostOs::Linux.runner_label().to_string(),
      host: HostOs::Linux,
      target: None,
      needs: Vec::new(),
      continue_on_error: false,
      steps: vec![Step::Checkout, Step::CreateRelease { tag, draft, prerelease }],
    }
  }

  fn for_entry(entry: &MatrixEntry, bin: &str) -> Self {
    let mut steps = vec![Step::Checkout];
    if entry.needs_cross() {
      steps.push(Step::InstallCross {
        target: entry.target.clone(),
      });
    }
    steps.push(Step::BuildAndUpload {
      bin: bin.to_string(),
      target: entry.target.clone(),
      asset: asset_name(bin, &entry.target),
    });

    Self {
      id: Self::target_job_id(entry),
      name: format!("upload-assets ({}, {})", entry.target, entry.host.runner_label()),
      runner: entry.host.runner_label().to_string(),
      host: entry.host,
      target: Some(entry.target.clone()),
      needs: vec![RELEASE_JOB_ID.to_string()],
      continue_on_error: true,
      steps,
    }
  }

  pub fn is_release(&self) -> bool {
    self.id == RELEASE_JOB_ID
  }

  pub fn uses_cross(&self) -> bool {
    self.steps.iter().any(|s| matches!(s, Step::InstallCross { .. }))
  }
}

/// Full plan for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePlan {
  pub id: PlanId,
  pub event: Event,
  pub decision: TriggerDecision,
  pub tag: Option<String>,
  /// Semver parsed from the tag (leading `v` stripped), when it parses
  pub version: Option<String>,
  pub bin: Option<String>,
  pub permissions: Permissions,
  pub jobs: Vec<JobSpec>,
}

impl PipelinePlan {
  /// Expand the matrix into jobs. A skip decision yields a plan with no jobs.
  pub fn build(config: &ShipConfig, event: Event, decision: TriggerDecision, tag: Option<String>) -> ShipResult<Self> {
    let version = tag.as_deref().and_then(parse_tag_version);

    let (bin, jobs) = if decision.proceed {
      let bin = config.require_bin()?.to_string();
      let prerelease = version.as_ref().is_some_and(|v| !v.pre.is_empty());

      let mut jobs = vec![JobSpec::release(tag.clone(), config.release.draft, prerelease)];
      jobs.extend(config.matrix().iter().map(|entry| JobSpec::for_entry(entry, &bin)));

      // Reject malformed graphs before anyone sees the plan
      JobGraph::from_jobs(&jobs)?;
      (Some(bin), jobs)
    } else {
      (config.release.bin.clone(), Vec::new())
    };

    let id = PlanId::from_contents(&serde_json::to_vec(&jobs)?);

    Ok(Self {
      id,
      event,
      decision,
      tag,
      version: version.map(|v| v.to_string()),
      bin,
      permissions: config.permissions.clone(),
      jobs,
    })
  }

  pub fn release_job(&self) -> Option<&JobSpec> {
    self.jobs.iter().find(|j| j.is_release())
  }

  pub fn target_jobs(&self) -> impl Iterator<Item = &JobSpec> {
    self.jobs.iter().filter(|j| !j.is_release())
  }

  pub fn find_job(&self, id: &str) -> Option<&JobSpec> {
    self.jobs.iter().find(|j| j.id == id)
  }

  /// Per-target jobs building `target`, optionally restricted to one host
  pub fn jobs_for_target(&self, target: &str, host: Option<HostOs>) -> Vec<&JobSpec> {
    self
      .target_jobs()
      .filter(|j| j.target.as_ref().is_some_and(|t| t.as_str() == target))
      .filter(|j| host.is_none_or(|h| h == j.host))
      .collect()
  }
}

/// `v1.2.3` / `1.2.3` → semver; other tag shapes have no version
pub fn parse_tag_version(tag: &str) -> Option<semver::Version> {
  let trimmed = tag.strip_prefix('v').unwrap_or(tag);
  semver::Version::parse(trimmed).ok()
}
