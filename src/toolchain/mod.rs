//! Build toolchain for per-target jobs
//!
//! Builds go through [`Toolchain`] so the executor never shells out directly.
//! [`CargoToolchain`] drives cargo / rustup / cross as system processes.

pub mod cargo;

pub use cargo::CargoToolchain;

use crate::core::error::ShipResult;
use crate::matrix::TargetTriple;
use std::path::PathBuf;

/// One binary build for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
  pub bin: String,
  pub target: TargetTriple,
  pub features: Vec<String>,
  /// Build with `cross` instead of `cargo`
  pub use_cross: bool,
}

pub trait Toolchain: Send + Sync {
  /// Make the cross-compilation toolchain available
  fn install_cross(&self, target: &TargetTriple) -> ShipResult<()>;

  /// Build the binary and return the path of the produced executable
  fn build(&self, request: &BuildRequest) -> ShipResult<PathBuf>;
}
