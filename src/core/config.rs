use crate::core::error::{ConfigError, ResultExt, ShipError, ShipResult, ValidationError};
use crate::matrix::{self, MatrixEntry};
use crate::pipeline::trigger::TriggerRule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for cargo-shipmatrix
/// Searched in order: shipmatrix.toml, .shipmatrix.toml, .cargo/shipmatrix.toml, .config/shipmatrix.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipConfig {
  #[serde(default)]
  pub release: ReleaseSettings,
  #[serde(default)]
  pub permissions: Permissions,
  /// Explicit matrix. Empty means the built-in default matrix.
  #[serde(default)]
  pub targets: Vec<MatrixEntry>,
}

/// What gets released and how
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSettings {
  /// Binary target to build and upload (default: first binary in the workspace)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bin: Option<String>,

  /// `owner/repo` of the release host (default: the repository of the checkout)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repository: Option<String>,

  /// Tag globs that trigger a release on push (default: ["v*"])
  #[serde(default = "default_tag_patterns")]
  pub tag_patterns: Vec<String>,

  /// Create the release as a draft
  #[serde(default)]
  pub draft: bool,

  /// Changelog to pull release notes from (Keep-a-Changelog style)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub changelog: Option<PathBuf>,

  /// Upload a `<asset>.sha256` file next to every binary
  #[serde(default = "default_true")]
  pub checksum: bool,

  /// Cargo features to enable for release builds
  #[serde(default)]
  pub features: Vec<String>,

  /// Where built assets are staged before upload (relative to the workspace root)
  #[serde(default = "default_staging_dir")]
  pub staging_dir: PathBuf,
}

fn default_tag_patterns() -> Vec<String> {
  vec!["v*".to_string()]
}

fn default_true() -> bool {
  true
}

fn default_staging_dir() -> PathBuf {
  PathBuf::from("target").join("shipmatrix")
}

impl Default for ReleaseSettings {
  fn default() -> Self {
    Self {
      bin: None,
      repository: None,
      tag_patterns: default_tag_patterns(),
      draft: false,
      changelog: None,
      checksum: true,
      features: Vec::new(),
      staging_dir: default_staging_dir(),
    }
  }
}

/// Access level for a token scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
  None,
  Read,
  #[default]
  Write,
}

/// Token scopes every job requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Permissions {
  #[serde(default)]
  pub contents: Access,
  #[serde(default)]
  pub pull_requests: Access,
  #[serde(default)]
  pub repository_projects: Access,
}

impl Default for Permissions {
  fn default() -> Self {
    Self {
      contents: Access::Write,
      pull_requests: Access::Write,
      repository_projects: Access::Write,
    }
  }
}

impl ShipConfig {
  /// Find config file in search order: shipmatrix.toml, .shipmatrix.toml, .cargo/shipmatrix.toml, .config/shipmatrix.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("shipmatrix.toml"),
      path.join(".shipmatrix.toml"),
      path.join(".cargo").join("shipmatrix.toml"),
      path.join(".config").join("shipmatrix.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from shipmatrix.toml (searches multiple locations)
  pub fn load(path: &Path) -> ShipResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      ShipError::Config(ConfigError::NotFound {
        workspace_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    Self::parse(&content).with_context(|| format!("Invalid configuration in {}", config_path.display()))
  }

  /// Parse and validate config text
  pub fn parse(content: &str) -> ShipResult<Self> {
    let config: ShipConfig = toml_edit::de::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Save config to shipmatrix.toml (default location)
  pub fn save(&self, path: &Path) -> ShipResult<PathBuf> {
    let config_path = path.join("shipmatrix.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(config_path)
  }

  /// Check if config exists at the given path
  pub fn exists(path: &Path) -> bool {
    Self::find_config_path(path).is_some()
  }

  /// Create a config for `bin` with the default matrix written out explicitly
  pub fn new(bin: Option<String>) -> Self {
    Self {
      release: ReleaseSettings {
        bin,
        ..Default::default()
      },
      permissions: Permissions::default(),
      targets: matrix::default_matrix(),
    }
  }

  /// Effective matrix: declared targets, or the default when none are declared
  pub fn matrix(&self) -> Vec<MatrixEntry> {
    if self.targets.is_empty() {
      matrix::default_matrix()
    } else {
      self.targets.clone()
    }
  }

  /// Compile the configured tag patterns
  pub fn trigger_rule(&self) -> ShipResult<TriggerRule> {
    TriggerRule::new(self.release.tag_patterns.as_slice())
  }

  /// Binary name, or an error when neither configured nor detected
  pub fn require_bin(&self) -> ShipResult<&str> {
    self
      .release
      .bin
      .as_deref()
      .ok_or(ShipError::Config(ConfigError::MissingBinary))
  }

  /// Validate tag patterns and the effective matrix
  pub fn validate(&self) -> ShipResult<()> {
    if self.release.tag_patterns.is_empty() {
      return Err(ShipError::Config(ConfigError::InvalidTagPattern {
        reason: "at least one tag pattern is required".to_string(),
      }));
    }
    self.trigger_rule()?;

    let issues = matrix::validate_matrix(&self.matrix());
    if !issues.is_empty() {
      return Err(ShipError::Validation(ValidationError::MatrixInvalid {
        issues: issues.iter().map(|i| i.to_string()).collect(),
      }));
    }
    Ok(())
  }
}
