//! Release asset naming, staging and checksums

use crate::core::error::{ResultExt, ShipResult};
use crate::matrix::TargetTriple;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// `<bin>-<target><ext>`, e.g. `tool-x86_64-pc-windows-msvc.exe`
pub fn asset_name(bin: &str, target: &TargetTriple) -> String {
  format!("{}-{}{}", bin, target, target.exe_suffix())
}

/// Files staged for upload for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
  pub binary: PathBuf,
  pub checksum: Option<PathBuf>,
}

impl StagedAsset {
  /// Upload order: binary first, then its checksum
  pub fn files(&self) -> Vec<&Path> {
    let mut files = vec![self.binary.as_path()];
    if let Some(checksum) = &self.checksum {
      files.push(checksum.as_path());
    }
    files
  }
}

/// Copy `built` into `staging_dir` under its asset name, optionally writing `<asset>.sha256`
pub fn stage_asset(built: &Path, staging_dir: &Path, asset: &str, checksum: bool) -> ShipResult<StagedAsset> {
  fs::create_dir_all(staging_dir)
    .with_context(|| format!("Failed to create staging dir {}", staging_dir.display()))?;

  let binary = staging_dir.join(asset);
  fs::copy(built, &binary).with_context(|| format!("Failed to stage {} as {}", built.display(), binary.display()))?;

  let checksum = if checksum {
    let digest = sha256_file(&binary)?;
    let path = staging_dir.join(format!("{}.sha256", asset));
    // sha256sum format: "<hex>  <name>"
    fs::write(&path, format!("{}  {}\n", digest, asset))
      .with_context(|| format!("Failed to write checksum {}", path.display()))?;
    Some(path)
  } else {
    None
  };

  Ok(StagedAsset { binary, checksum })
}

/// Hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> ShipResult<String> {
  let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let mut hasher = Sha256::new();
  hasher.update(&bytes);
  Ok(format!("{:x}", hasher.finalize()))
}
