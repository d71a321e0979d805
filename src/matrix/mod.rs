//! Release matrix: which target triples get built, and on which host
//!
//! A matrix is a static list of (target, host) pairs defined in
//! shipmatrix.toml (or the built-in default). Each pair becomes exactly one
//! per-target job in the pipeline plan.

pub mod host;
pub mod triple;

pub use host::HostOs;
pub use triple::{TargetOs, TargetTriple};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One (target, host) pair of the release matrix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatrixEntry {
  pub target: TargetTriple,
  pub host: HostOs,
}

impl MatrixEntry {
  pub fn new(target: TargetTriple, host: HostOs) -> Self {
    Self { target, host }
  }

  /// Cross tooling is installed only on Linux-family hosts, and only when the
  /// target differs from what the host builds natively.
  pub fn needs_cross(&self) -> bool {
    self.host.is_linux_family() && self.target.as_str() != self.host.native_triple()
  }
}

/// A problem found while validating a matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatrixIssue {
  Empty,
  Duplicate { target: String, host: HostOs },
  HostCannotBuild { target: String, host: HostOs },
}

impl std::fmt::Display for MatrixIssue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      MatrixIssue::Empty => write!(f, "matrix has no entries"),
      MatrixIssue::Duplicate { target, host } => write!(f, "duplicate entry {} on {}", target, host),
      MatrixIssue::HostCannotBuild { target, host } => write!(f, "{} host cannot build {}", host, target),
    }
  }
}

/// Check a matrix for duplicates and impossible (target, host) pairs
pub fn validate_matrix(entries: &[MatrixEntry]) -> Vec<MatrixIssue> {
  let mut issues = Vec::new();
  if entries.is_empty() {
    issues.push(MatrixIssue::Empty);
    return issues;
  }

  let mut seen = HashSet::new();
  for entry in entries {
    if !seen.insert((entry.target.as_str(), entry.host)) {
      issues.push(MatrixIssue::Duplicate {
        target: entry.target.to_string(),
        host: entry.host,
      });
    }
    if !entry.host.can_build(&entry.target) {
      issues.push(MatrixIssue::HostCannotBuild {
        target: entry.target.to_string(),
        host: entry.host,
      });
    }
  }
  issues
}

/// Declared default matrix (34 entries)
const DEFAULT_MATRIX: &[(&str, HostOs)] = &[
  // Linux: glibc
  ("aarch64-unknown-linux-gnu", HostOs::Linux),
  ("arm-unknown-linux-gnueabi", HostOs::Linux),
  ("arm-unknown-linux-gnueabihf", HostOs::Linux),
  ("armv5te-unknown-linux-gnueabi", HostOs::Linux),
  ("armv7-unknown-linux-gnueabi", HostOs::Linux),
  ("armv7-unknown-linux-gnueabihf", HostOs::Linux),
  ("i586-unknown-linux-gnu", HostOs::Linux),
  ("i686-unknown-linux-gnu", HostOs::Linux),
  ("riscv64gc-unknown-linux-gnu", HostOs::Linux),
  ("s390x-unknown-linux-gnu", HostOs::Linux),
  ("x86_64-unknown-linux-gnu", HostOs::Linux),
  // Linux: musl
  ("aarch64-unknown-linux-musl", HostOs::Linux),
  ("arm-unknown-linux-musleabi", HostOs::Linux),
  ("arm-unknown-linux-musleabihf", HostOs::Linux),
  ("armv5te-unknown-linux-musleabi", HostOs::Linux),
  ("armv7-unknown-linux-musleabi", HostOs::Linux),
  ("armv7-unknown-linux-musleabihf", HostOs::Linux),
  ("i686-unknown-linux-musl", HostOs::Linux),
  ("x86_64-unknown-linux-musl", HostOs::Linux),
  // Linux: uClibc
  ("armv5te-unknown-linux-uclibceabi", HostOs::Linux),
  // Android
  ("aarch64-linux-android", HostOs::Linux),
  ("x86_64-linux-android", HostOs::Linux),
  // BSD, illumos, WASI
  ("x86_64-unknown-freebsd", HostOs::Linux),
  ("x86_64-unknown-netbsd", HostOs::Linux),
  ("x86_64-unknown-illumos", HostOs::Linux),
  ("wasm32-wasip1", HostOs::Linux),
  // macOS
  ("aarch64-apple-darwin", HostOs::MacOs),
  ("x86_64-apple-darwin", HostOs::MacOs),
  ("aarch64-apple-ios-macabi", HostOs::MacOs),
  ("x86_64-apple-ios-macabi", HostOs::MacOs),
  // Windows
  ("aarch64-pc-windows-msvc", HostOs::Windows),
  ("x86_64-pc-windows-msvc", HostOs::Windows),
  ("x86_64-pc-windows-gnu", HostOs::Windows),
  ("x86_64-pc-windows-gnullvm", HostOs::Windows),
];

/// The built-in matrix used when shipmatrix.toml declares no `[[targets]]`
pub fn default_matrix() -> Vec<MatrixEntry> {
  DEFAULT_MATRIX
    .iter()
    .filter_map(|(target, host)| TargetTriple::parse(target).ok().map(|t| MatrixEntry::new(t, *host)))
    .collect()
}
