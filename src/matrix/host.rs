//! Runner host operating systems and what they can build

use super::triple::{TargetOs, TargetTriple};
use crate::core::error::{ShipError, ShipResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host operating system a job runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostOs {
  #[serde(rename = "linux", alias = "ubuntu-latest")]
  Linux,
  #[serde(rename = "macos", alias = "macos-latest")]
  MacOs,
  #[serde(rename = "windows", alias = "windows-latest")]
  Windows,
}

impl HostOs {
  pub const ALL: [HostOs; 3] = [HostOs::Linux, HostOs::MacOs, HostOs::Windows];

  /// Host of the running process, if it is one we can build on
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(HostOs::Linux),
      "macos" => Some(HostOs::MacOs),
      "windows" => Some(HostOs::Windows),
      _ => None,
    }
  }

  /// CI runner label for this host
  pub fn runner_label(&self) -> &'static str {
    match self {
      HostOs::Linux => "ubuntu-latest",
      HostOs::MacOs => "macos-latest",
      HostOs::Windows => "windows-latest",
    }
  }

  /// Triple the host toolchain produces without cross tooling
  pub fn native_triple(&self) -> &'static str {
    match self {
      HostOs::Linux => "x86_64-unknown-linux-gnu",
      HostOs::MacOs => "aarch64-apple-darwin",
      HostOs::Windows => "x86_64-pc-windows-msvc",
    }
  }

  pub fn is_linux_family(&self) -> bool {
    matches!(self, HostOs::Linux)
  }

  /// Whether this host can produce a binary for `target`, natively or via cross tooling
  pub fn can_build(&self, target: &TargetTriple) -> bool {
    let os = target.os();
    match self {
      HostOs::Linux => {
        matches!(
          os,
          TargetOs::Linux
            | TargetOs::Android
            | TargetOs::FreeBsd
            | TargetOs::NetBsd
            | TargetOs::OpenBsd
            | TargetOs::Illumos
            | TargetOs::Solaris
            | TargetOs::Wasi
        ) || target.is_windows_gnu()
      }
      HostOs::MacOs => target.vendor() == "apple" || os == TargetOs::Wasi,
      HostOs::Windows => matches!(os, TargetOs::Windows | TargetOs::Wasi),
    }
  }
}

impl fmt::Display for HostOs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      HostOs::Linux => "linux",
      HostOs::MacOs => "macos",
      HostOs::Windows => "windows",
    };
    f.write_str(name)
  }
}

impl FromStr for HostOs {
  type Err = ShipError;

  fn from_str(s: &str) -> ShipResult<Self> {
    match s.to_ascii_lowercase().as_str() {
      "linux" | "ubuntu" | "ubuntu-latest" => Ok(HostOs::Linux),
      "macos" | "macos-latest" | "darwin" => Ok(HostOs::MacOs),
      "windows" | "windows-latest" => Ok(HostOs::Windows),
      _ => Err(ShipError::Validation(ValidationError::UnknownHost { name: s.to_string() })),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn t(s: &str) -> TargetTriple {
    TargetTriple::parse(s).unwrap()
  }

  #[test]
  fn test_linux_builds_unix_like_and_mingw() {
    assert!(HostOs::Linux.can_build(&t("aarch64-unknown-linux-musl")));
    assert!(HostOs::Linux.can_build(&t("aarch64-linux-android")));
    assert!(HostOs::Linux.can_build(&t("x86_64-unknown-illumos")));
    assert!(HostOs::Linux.can_build(&t("x86_64-pc-windows-gnu")));
    assert!(!HostOs::Linux.can_build(&t("x86_64-pc-windows-msvc")));
    assert!(!HostOs::Linux.can_build(&t("aarch64-apple-darwin")));
  }

  #[test]
  fn test_macos_and_windows_build_their_own() {
    assert!(HostOs::MacOs.can_build(&t("x86_64-apple-ios-macabi")));
    assert!(!HostOs::MacOs.can_build(&t("x86_64-unknown-linux-gnu")));
    assert!(HostOs::Windows.can_build(&t("aarch64-pc-windows-msvc")));
    assert!(HostOs::Windows.can_build(&t("x86_64-pc-windows-gnullvm")));
    assert!(!HostOs::Windows.can_build(&t("x86_64-unknown-freebsd")));
  }

  #[test]
  fn test_host_names() {
    assert_eq!("ubuntu-latest".parse::<HostOs>().unwrap(), HostOs::Linux);
    assert_eq!("MacOS".parse::<HostOs>().unwrap(), HostOs::MacOs);
    assert!("haiku".parse::<HostOs>().is_err());

    let from_label: HostOs = serde_json::from_str("\"windows-latest\"").unwrap();
    assert_eq!(from_label, HostOs::Windows);
    assert_eq!(serde_json::to_string(&HostOs::MacOs).unwrap(), "\"macos\"");
  }
}
