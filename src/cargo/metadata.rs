use crate::core::error::ShipResult;
use cargo_metadata::{MetadataCommand, Package};
use std::path::Path;

/// Workspace introspection using cargo_metadata
#[derive(Clone)]
pub struct WorkspaceMetadata {
  metadata: cargo_metadata::Metadata,
}

impl WorkspaceMetadata {
  pub fn load(workspace_root: &Path) -> ShipResult<Self> {
    let metadata = MetadataCommand::new()
      .manifest_path(workspace_root.join("Cargo.toml"))
      .no_deps()
      .exec()?;
    Ok(Self { metadata })
  }

  pub fn list_crates(&self) -> Vec<&Package> {
    self.metadata.workspace_packages()
  }

  /// Binary targets across workspace members, root package first
  pub fn binary_names(&self) -> Vec<String> {
    let root_id = self.metadata.root_package().map(|p| p.id.clone());
    let mut packages = self.list_crates();
    packages.sort_by_key(|p| Some(&p.id) != root_id.as_ref());

    packages
      .iter()
      .flat_map(|pkg| pkg.targets.iter())
      .filter(|t| t.is_bin())
      .map(|t| t.name.clone())
      .collect()
  }

  /// Default binary to release
  pub fn default_binary(&self) -> Option<String> {
    self.binary_names().into_iter().next()
  }
}
