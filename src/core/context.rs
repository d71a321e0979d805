//! Unified run context - build once, pass everywhere
//!
//! `ShipContext` loads shipmatrix.toml and opens the repository once in
//! main.rs; commands take it by reference.
//!
//! ```text
//! main.rs:
//!   ShipContext::build() -> &ShipContext
//!   |
//!   v
//! commands/plan.rs, run.rs, etc:
//!   fn run_*(ctx: &ShipContext, ...)
//! ```

use crate::cargo::WorkspaceMetadata;
use crate::core::config::ShipConfig;
use crate::core::error::{ShipError, ShipResult};
use crate::core::vcs::SystemGit;
use crate::pipeline::trigger::{TriggerDecision, TriggerRule};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ShipContext {
  /// Workspace root directory
  pub root: PathBuf,

  /// shipmatrix.toml, when present
  pub config: Option<Arc<ShipConfig>>,

  /// Repository handle (None outside a git checkout)
  pub git: Option<SystemGit>,
}

impl ShipContext {
  /// Build the context from a directory.
  ///
  /// A missing config is fine (init runs before one exists); a config that
  /// exists but fails to parse is an error.
  pub fn build(workspace_root: &Path) -> ShipResult<Self> {
    let git = SystemGit::open(workspace_root).ok();
    let root = workspace_root.to_path_buf();

    let config = if ShipConfig::exists(&root) {
      let mut config = ShipConfig::load(&root)?;
      if config.release.bin.is_none() {
        config.release.bin = WorkspaceMetadata::load(&root).ok().and_then(|m| m.default_binary());
      }
      Some(Arc::new(config))
    } else {
      None
    };

    Ok(Self { root, config, git })
  }

  /// Context without config, for commands that run before a valid config exists
  pub fn minimal(workspace_root: &Path) -> Self {
    Self {
      root: workspace_root.to_path_buf(),
      config: None,
      git: SystemGit::open(workspace_root).ok(),
    }
  }

  /// Get config or error if not found.
  pub fn require_config(&self) -> ShipResult<&Arc<ShipConfig>> {
    self.config.as_ref().ok_or_else(|| {
      ShipError::with_help(
        "No shipmatrix.toml found",
        "Run 'cargo shipmatrix init' to create one.",
      )
    })
  }

  pub fn require_git(&self) -> ShipResult<&SystemGit> {
    self.git.as_ref().ok_or_else(|| {
      ShipError::with_help(
        format!("{} is not inside a git repository", self.root.display()),
        "Run cargo shipmatrix from a checkout of the project being released.",
      )
    })
  }

  /// Release tag for this run, in priority order:
  /// `--tag`, the tag of the triggering push, then a matching tag at HEAD.
  pub fn resolve_tag(&self, explicit: Option<&str>, decision: &TriggerDecision, rule: &TriggerRule) -> Option<String> {
    if let Some(tag) = explicit {
      return Some(tag.to_string());
    }
    if let Some(tag) = &decision.tag {
      return Some(tag.clone());
    }
    self
      .git
      .as_ref()
      .and_then(|git| git.tags_at_head().ok())
      .and_then(|tags| tags.into_iter().find(|t| rule.matches_tag(t)))
  }

  pub fn workspace_root(&self) -> &Path {
    &self.root
  }
}
