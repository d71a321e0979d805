//! Plan execution
//!
//! Jobs run phase by phase in topological order of the job graph. Inside a
//! phase jobs run concurrently on a rayon pool and are isolated from each
//! other: a failing job records its failure and never cancels siblings.
//! A job only starts when every job it needs succeeded (a continue-on-error
//! failure counts as satisfied); otherwise it is reported as blocked.

use crate::core::config::Permissions;
use crate::core::error::{ReleaseError, ShipError, ShipResult};
use crate::core::vcs::SystemGit;
use crate::matrix::HostOs;
use crate::pipeline::graph::JobGraph;
use crate::pipeline::plan::{JobSpec, PipelinePlan, Step};
use crate::pipeline::report::{JobOutcome, JobReport, RunReport};
use crate::release::{self, ReleaseHost, ReleaseRecord, asset};
use crate::toolchain::{BuildRequest, Toolchain};
use crate::ui::JobProgress;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

/// Execution settings
#[derive(Debug, Clone)]
pub struct ExecOptions {
  /// Maximum concurrent jobs
  pub jobs: usize,
  /// Only run per-target jobs for this host; others are deferred
  pub host_filter: Option<HostOs>,
  pub dry_run: bool,
  pub workspace_root: PathBuf,
  /// Absolute staging directory for built assets
  pub staging_dir: PathBuf,
  pub checksum: bool,
  pub features: Vec<String>,
  pub changelog: Option<PathBuf>,
  pub show_progress: bool,
}

impl ExecOptions {
  pub fn new(workspace_root: PathBuf) -> Self {
    Self {
      jobs: rayon::current_num_threads(),
      host_filter: HostOs::current(),
      dry_run: false,
      staging_dir: workspace_root.join("target").join("shipmatrix"),
      workspace_root,
      checksum: true,
      features: Vec::new(),
      changelog: None,
      show_progress: false,
    }
  }
}

/// Which jobs of the plan this invocation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
  All,
  /// Only these job ids; needs outside the selection ran elsewhere
  Only(Vec<String>),
}

impl Selection {
  fn includes(&self, id: &str) -> bool {
    match self {
      Selection::All => true,
      Selection::Only(ids) => ids.iter().any(|i| i == id),
    }
  }
}

pub struct Executor<'a> {
  host: &'a dyn ReleaseHost,
  toolchain: &'a dyn Toolchain,
  /// Repository used to verify checkouts; None uses the working tree as-is
  git: Option<&'a SystemGit>,
  permissions: Permissions,
  options: ExecOptions,
}

/// Why a job stopped
struct StepFailure {
  step: &'static str,
  error: ShipError,
}

impl<'a> Executor<'a> {
  pub fn new(
    host: &'a dyn ReleaseHost,
    toolchain: &'a dyn Toolchain,
    git: Option<&'a SystemGit>,
    permissions: Permissions,
    options: ExecOptions,
  ) -> Self {
    Self {
      host,
      toolchain,
      git,
      permissions,
      options,
    }
  }

  /// Run the whole plan
  pub fn run(&self, plan: &PipelinePlan) -> ShipResult<RunReport> {
    self.run_selected(plan, &Selection::All)
  }

  /// Run only the release-creation job
  pub fn run_release(&self, plan: &PipelinePlan) -> ShipResult<RunReport> {
    let ids = plan.release_job().map(|j| j.id.clone()).into_iter().collect();
    self.run_selected(plan, &Selection::Only(ids))
  }

  /// Run a subset of jobs (one CI leg); their prerequisites are assumed done
  pub fn run_selected(&self, plan: &PipelinePlan, selection: &Selection) -> ShipResult<RunReport> {
    let mut report = RunReport::start(plan);
    if !plan.decision.proceed {
      report.finish(false, false);
      return Ok(report);
    }

    let graph = JobGraph::from_jobs(&plan.jobs)?;
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(self.options.jobs.max(1))
      .build()?;

    let selected: HashSet<&str> = plan
      .jobs
      .iter()
      .filter(|j| selection.includes(&j.id))
      .map(|j| j.id.as_str())
      .collect();

    let progress = (self.options.show_progress && !self.options.dry_run)
      .then(|| JobProgress::new(selected.len(), format!("Releasing {}", plan.tag.as_deref().unwrap_or(""))));

    // A release created elsewhere (CI legs) is addressed by tag alone
    let mut release: Option<ReleaseRecord> = plan.tag.as_ref().map(|tag| ReleaseRecord {
      tag: tag.clone(),
      url: None,
    });
    let mut finished: HashMap<String, JobReport> = HashMap::new();

    for phase in graph.phases() {
      let mut runnable = Vec::new();
      for id in phase.iter().filter(|id| selected.contains(id.as_str())) {
        let Some(job) = plan.find_job(id) else { continue };

        let unmet = graph
          .needs(id)
          .into_iter()
          .find(|need| finished.get(need).is_some_and(|r| !r.satisfies_dependents()));
        if let Some(by) = unmet {
          finished.insert(id.clone(), JobReport::new(job, JobOutcome::Blocked { by }, 0));
          continue;
        }

        if let Some(host) = self.deferred_host(job) {
          finished.insert(id.clone(), JobReport::new(job, JobOutcome::Deferred { host }, 0));
          continue;
        }
        runnable.push(job);
      }

      let current_release = release.clone();
      let results: Vec<(JobReport, Option<ReleaseRecord>)> = pool.install(|| {
        runnable
          .par_iter()
          .map(|job| {
            let result = self.run_job(job, current_release.as_ref());
            if let Some(progress) = &progress {
              progress.inc();
            }
            result
          })
          .collect()
      });

      for (job_report, created) in results {
        if let Some(record) = created {
          report.release_url = record.url.clone();
          release = Some(record);
        }
        finished.insert(job_report.id.clone(), job_report);
      }
    }

    // Report in declaration order
    report.jobs = plan.jobs.iter().filter_map(|j| finished.remove(&j.id)).collect();
    report.finish(true, self.options.dry_run);
    Ok(report)
  }

  fn deferred_host(&self, job: &JobSpec) -> Option<HostOs> {
    // The release job only talks to the hosting service; it runs anywhere
    if job.is_release() {
      return None;
    }
    match self.options.host_filter {
      Some(filter) if filter != job.host => Some(job.host),
      _ => None,
    }
  }

  /// Run one job's steps in order, stopping at the first failure
  fn run_job(&self, job: &JobSpec, release: Option<&ReleaseRecord>) -> (JobReport, Option<ReleaseRecord>) {
    let started = Instant::now();

    if self.options.dry_run {
      let steps = job.steps.iter().map(|s| s.name().to_string()).collect();
      return (JobReport::new(job, JobOutcome::Planned { steps }, 0), None);
    }

    let mut created = None;
    let mut assets = Vec::new();
    let mut failure = None;

    for step in &job.steps {
      let result = match step {
        Step::Checkout => self.checkout(release.map(|r| r.tag.as_str())),
        Step::CreateRelease { tag, draft, prerelease } => {
          self.create_release(tag.as_deref(), *draft, *prerelease).map(|record| {
            created = Some(record);
          })
        }
        Step::InstallCross { target } => self.toolchain.install_cross(target),
        Step::BuildAndUpload { bin, target, asset } => {
          let build = BuildRequest {
            bin: bin.clone(),
            target: target.clone(),
            features: self.options.features.clone(),
            use_cross: job.uses_cross(),
          };
          self
            .build_and_upload(&build, asset, release)
            .map(|mut uploaded| assets.append(&mut uploaded))
        }
      };

      if let Err(error) = result {
        failure = Some(StepFailure {
          step: step.name(),
          error,
        });
        break;
      }
    }

    let elapsed = started.elapsed().as_millis() as u64;
    let outcome = match failure {
      Some(StepFailure { step, error }) => JobOutcome::Failed {
        step: step.to_string(),
        error: error.to_string(),
      },
      None => JobOutcome::Succeeded { assets },
    };
    (JobReport::new(job, outcome, elapsed), created)
  }

  fn checkout(&self, tag: Option<&str>) -> ShipResult<()> {
    match (self.git, tag) {
      (Some(git), Some(tag)) => git.tag_commit(tag).map(|_| ()),
      _ => Ok(()),
    }
  }

  fn create_release(&self, tag: Option<&str>, draft: bool, prerelease: bool) -> ShipResult<ReleaseRecord> {
    let tag = tag.ok_or(ShipError::Release(ReleaseError::NoTag))?;
    release::require_write_access(&self.permissions)?;
    let request = release::build_request(
      &self.options.workspace_root,
      tag,
      self.options.changelog.as_ref(),
      draft,
      prerelease,
    )?;
    self.host.create_release(&request)
  }

  fn build_and_upload(
    &self,
    build: &BuildRequest,
    asset_name: &str,
    release: Option<&ReleaseRecord>,
  ) -> ShipResult<Vec<String>> {
    let release = release.ok_or(ShipError::Release(ReleaseError::NoTag))?;
    release::require_write_access(&self.permissions)?;

    let built = self.toolchain.build(build)?;
    let staged = asset::stage_asset(&built, &self.options.staging_dir, asset_name, self.options.checksum)?;

    let mut uploaded = Vec::new();
    for file in staged.files() {
      self.host.upload_asset(release, file)?;
      if let Some(name) = file.file_name() {
        uploaded.push(name.to_string_lossy().to_string());
      }
    }
    Ok(uploaded)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::{Access, ShipConfig};
  use crate::matrix::TargetTriple;
  use crate::pipeline::report::RunStatus;
  use crate::pipeline::trigger::{Event, TriggerRule};
  use std::path::Path;
  use std::sync::Mutex;

  /// In-memory release host recording every call
  #[derive(Default)]
  struct FakeHost {
    fail_create: bool,
    created: Mutex<Vec<String>>,
    uploads: Mutex<Vec<String>>,
  }

  impl ReleaseHost for FakeHost {
    fn create_release(&self, request: &release::ReleaseRequest) -> ShipResult<ReleaseRecord> {
      if self.fail_create {
        return Err(ShipError::Release(ReleaseError::AlreadyExists {
          tag: request.tag.clone(),
        }));
      }
      self.created.lock().unwrap().push(request.tag.clone());
      Ok(ReleaseRecord {
        tag: request.tag.clone(),
        url: Some(format!("https://example.invalid/releases/{}", request.tag)),
      })
    }

    fn upload_asset(&self, _release: &ReleaseRecord, path: &Path) -> ShipResult<()> {
      let name = path.file_name().unwrap().to_string_lossy().to_string();
      self.uploads.lock().unwrap().push(name);
      Ok(())
    }
  }

  /// Toolchain that writes a fake binary, failing for chosen targets
  struct FakeToolchain {
    out_dir: PathBuf,
    failing: Vec<String>,
    builds: Mutex<Vec<String>>,
    cross_installs: Mutex<Vec<String>>,
  }

  impl FakeToolchain {
    fn new(out_dir: &Path, failing: &[&str]) -> Self {
      Self {
        out_dir: out_dir.to_path_buf(),
        failing: failing.iter().map(|s| s.to_string()).collect(),
        builds: Mutex::new(Vec::new()),
        cross_installs: Mutex::new(Vec::new()),
      }
    }
  }

  impl Toolchain for FakeToolchain {
    fn install_cross(&self, target: &TargetTriple) -> ShipResult<()> {
      self.cross_installs.lock().unwrap().push(target.to_string());
      Ok(())
    }

    fn build(&self, request: &BuildRequest) -> ShipResult<PathBuf> {
      self.builds.lock().unwrap().push(request.target.to_string());
      if self.failing.iter().any(|t| t == request.target.as_str()) {
        return Err(ShipError::message(format!("linker failed for {}", request.target)));
      }
      let path = self.out_dir.join(format!("{}-{}", request.bin, request.target));
      std::fs::write(&path, request.target.as_str())?;
      Ok(path)
    }
  }

  fn plan(git_ref: &str) -> PipelinePlan {
    let config = ShipConfig::new(Some("tool".to_string()));
    let event = Event::Push {
      git_ref: git_ref.to_string(),
    };
    let decision = TriggerRule::new(&["v*"]).unwrap().evaluate(&event);
    let tag = decision.tag.clone();
    PipelinePlan::build(&config, event, decision, tag).unwrap()
  }

  fn options(root: &Path) -> ExecOptions {
    ExecOptions {
      jobs: 4,
      host_filter: None,
      ..ExecOptions::new(root.to_path_buf())
    }
  }

  #[test]
  fn test_tag_push_runs_release_then_every_target() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let toolchain = FakeToolchain::new(dir.path(), &[]);
    let executor = Executor::new(&host, &toolchain, None, Permissions::default(), options(dir.path()));

    let report = executor.run(&plan("refs/tags/v1.2.3")).unwrap();
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.jobs.len(), 35);
    assert_eq!(report.attempted(), 35);
    assert_eq!(*host.created.lock().unwrap(), vec!["v1.2.3"]);
    assert_eq!(toolchain.builds.lock().unwrap().len(), 34);
    // binary + checksum per target
    assert_eq!(host.uploads.lock().unwrap().len(), 68);
    assert_eq!(report.release_url.as_deref(), Some("https://example.invalid/releases/v1.2.3"));
  }

  #[test]
  fn test_cross_installed_only_where_planned() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let toolchain = FakeToolchain::new(dir.path(), &[]);
    let executor = Executor::new(&host, &toolchain, None, Permissions::default(), options(dir.path()));
    let plan = plan("refs/tags/v1.2.3");

    executor.run(&plan).unwrap();
    let installs = toolchain.cross_installs.lock().unwrap();
    assert_eq!(installs.len(), plan.target_jobs().filter(|j| j.uses_cross()).count());
    assert!(!installs.iter().any(|t| t.contains("apple") || t.contains("windows-msvc")));
  }

  #[test]
  fn test_failed_target_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let toolchain = FakeToolchain::new(dir.path(), &["s390x-unknown-linux-gnu"]);
    let executor = Executor::new(&host, &toolchain, None, Permissions::default(), options(dir.path()));

    let report = executor.run(&plan("refs/tags/v1.2.3")).unwrap();
    assert_eq!(report.status, RunStatus::CompletedWithFailures);
    assert_eq!(report.attempted(), 35);

    let failed = report.failed_jobs();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].target.as_deref(), Some("s390x-unknown-linux-gnu"));
    assert!(matches!(&failed[0].outcome, JobOutcome::Failed { step, .. } if step == "build-and-upload"));
    assert_eq!(toolchain.builds.lock().unwrap().len(), 34);
  }

  #[test]
  fn test_release_failure_blocks_every_target() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost {
      fail_create: true,
      ..Default::default()
    };
    let toolchain = FakeToolchain::new(dir.path(), &[]);
    let executor = Executor::new(&host, &toolchain, None, Permissions::default(), options(dir.path()));

    let report = executor.run(&plan("refs/tags/v1.2.3")).unwrap();
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.attempted(), 1);
    assert!(
      report
        .jobs
        .iter()
        .filter(|j| j.target.is_some())
        .all(|j| j.outcome == JobOutcome::Blocked { by: "release".to_string() })
    );
    assert!(toolchain.builds.lock().unwrap().is_empty());
    assert!(host.uploads.lock().unwrap().is_empty());
  }

  #[test]
  fn test_skip_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let toolchain = FakeToolchain::new(dir.path(), &[]);
    let executor = Executor::new(&host, &toolchain, None, Permissions::default(), options(dir.path()));

    let report = executor.run(&plan("refs/heads/main")).unwrap();
    assert_eq!(report.status, RunStatus::Skipped);
    assert!(report.jobs.is_empty());
    assert!(host.created.lock().unwrap().is_empty());
  }

  #[test]
  fn test_host_filter_defers_other_hosts() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let toolchain = FakeToolchain::new(dir.path(), &[]);
    let opts = ExecOptions {
      host_filter: Some(HostOs::MacOs),
      ..options(dir.path())
    };
    let executor = Executor::new(&host, &toolchain, None, Permissions::default(), opts);

    let report = executor.run(&plan("refs/tags/v1.2.3")).unwrap();
    assert_eq!(report.status, RunStatus::Succeeded);
    // release + 4 macOS targets
    assert_eq!(report.attempted(), 5);
    assert!(
      report
        .jobs
        .iter()
        .filter(|j| j.host != HostOs::MacOs && j.target.is_some())
        .all(|j| matches!(j.outcome, JobOutcome::Deferred { .. }))
    );
  }

  #[test]
  fn test_dry_run_calls_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let toolchain = FakeToolchain::new(dir.path(), &[]);
    let opts = ExecOptions {
      dry_run: true,
      ..options(dir.path())
    };
    let executor = Executor::new(&host, &toolchain, None, Permissions::default(), opts);

    let report = executor.run(&plan("refs/tags/v1.2.3")).unwrap();
    assert_eq!(report.status, RunStatus::Planned);
    assert_eq!(report.jobs.len(), 35);
    assert!(host.created.lock().unwrap().is_empty());
    assert!(toolchain.builds.lock().unwrap().is_empty());
  }

  #[test]
  fn test_single_leg_uses_existing_release() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let toolchain = FakeToolchain::new(dir.path(), &[]);
    let executor = Executor::new(&host, &toolchain, None, Permissions::default(), options(dir.path()));
    let plan = plan("refs/tags/v1.2.3");

    let leg = plan.jobs_for_target("aarch64-unknown-linux-musl", None)[0].id.clone();
    let report = executor.run_selected(&plan, &Selection::Only(vec![leg])).unwrap();
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.jobs.len(), 1);
    assert!(host.created.lock().unwrap().is_empty());
    assert_eq!(
      *host.uploads.lock().unwrap(),
      vec![
        "tool-aarch64-unknown-linux-musl".to_string(),
        "tool-aarch64-unknown-linux-musl.sha256".to_string()
      ]
    );
  }

  #[test]
  fn test_read_only_permissions_fail_release() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let toolchain = FakeToolchain::new(dir.path(), &[]);
    let permissions = Permissions {
      contents: Access::Read,
      ..Permissions::default()
    };
    let executor = Executor::new(&host, &toolchain, None, permissions, options(dir.path()));

    let report = executor.run_release(&plan("refs/tags/v1.2.3")).unwrap();
    assert_eq!(report.status, RunStatus::Failed);
    assert!(host.created.lock().unwrap().is_empty());
  }

  #[test]
  fn test_manual_dispatch_without_tag_fails_release() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::default();
    let toolchain = FakeToolchain::new(dir.path(), &[]);
    let executor = Executor::new(&host, &toolchain, None, Permissions::default(), options(dir.path()));

    let config = ShipConfig::new(Some("tool".to_string()));
    let decision = TriggerRule::new(&["v*"]).unwrap().evaluate(&Event::WorkflowDispatch);
    let plan = PipelinePlan::build(&config, Event::WorkflowDispatch, decision, None).unwrap();

    let report = executor.run(&plan).unwrap();
    assert_eq!(report.status, RunStatus::Failed);
    assert!(matches!(
      &report.job("release").unwrap().outcome,
      JobOutcome::Failed { step, .. } if step == "create-release"
    ));
  }
}
