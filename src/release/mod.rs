//! Release creation and asset upload
//!
//! The hosting service is an opaque collaborator behind [`ReleaseHost`]:
//!
//! 1. **One release per tag**
//!    - Created once, before any asset is built
//!    - An existing release for the tag is a hard failure
//!
//! 2. **Many concurrent uploads**
//!    - Every per-target job appends its asset to the same record
//!    - The host is trusted to handle concurrent uploads; no locking here
//!
//! 3. **One credential**
//!    - A write-scoped token from the environment, handed to each call,
//!      never serialized or written to disk

pub mod asset;
pub mod github;
pub mod notes;

pub use github::GhCli;

use crate::core::config::{Access, Permissions};
use crate::core::error::{ReleaseError, ShipError, ShipResult};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// What to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
  pub tag: String,
  pub title: String,
  pub notes: String,
  pub draft: bool,
  pub prerelease: bool,
}

/// A created release that assets get attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRecord {
  pub tag: String,
  pub url: Option<String>,
}

/// Release hosting service
pub trait ReleaseHost: Send + Sync {
  /// Create a published release for `request.tag`
  fn create_release(&self, request: &ReleaseRequest) -> ShipResult<ReleaseRecord>;

  /// Attach a file to an existing release
  fn upload_asset(&self, release: &ReleaseRecord, path: &Path) -> ShipResult<()>;
}

/// Write-scoped token for the hosting service
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
  /// Environment variables checked in order
  pub const ENV_VARS: [&'static str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  pub fn from_env() -> ShipResult<Self> {
    Self::ENV_VARS
      .iter()
      .filter_map(|var| std::env::var(var).ok())
      .find(|value| !value.trim().is_empty())
      .map(Self)
      .ok_or(ShipError::Release(ReleaseError::MissingCredential))
  }

  pub(crate) fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Credential(***)")
  }
}

/// Creating releases and uploading assets both need `contents: write`
pub fn require_write_access(permissions: &Permissions) -> ShipResult<()> {
  if permissions.contents != Access::Write {
    return Err(ShipError::Release(ReleaseError::InsufficientPermissions {
      scope: "contents".to_string(),
    }));
  }
  Ok(())
}

/// Release notes for `tag`, from the configured changelog when present
pub fn build_request(
  workspace_root: &Path,
  tag: &str,
  changelog: Option<&PathBuf>,
  draft: bool,
  prerelease: bool,
) -> ShipResult<ReleaseRequest> {
  let notes = match changelog {
    Some(path) => notes::notes_for_tag(&workspace_root.join(path), tag)?,
    None => String::new(),
  };

  Ok(ReleaseRequest {
    tag: tag.to_string(),
    title: tag.to_string(),
    notes,
    draft,
    prerelease,
  })
}
