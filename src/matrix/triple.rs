//! Target triple parsing and classification

use crate::core::error::{ShipError, ShipResult, ValidationError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Vendors that may appear in the second position of a triple.
/// Anything else in that slot is an OS (`aarch64-linux-android`, `wasm32-wasip1`).
const KNOWN_VENDORS: &[&str] = &[
  "unknown", "pc", "apple", "sun", "nvidia", "fortanix", "uwp", "wrs", "sony", "nintendo", "kmc", "esp", "ibm",
  "openwrt", "none",
];

/// Operating system family of a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
  Linux,
  Android,
  FreeBsd,
  NetBsd,
  OpenBsd,
  Illumos,
  Solaris,
  MacOs,
  Ios,
  Windows,
  Wasi,
  Other(String),
}

/// A parsed `<arch>-<vendor>-<os>[-<env>]` target triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetTriple {
  raw: String,
  arch: String,
  vendor: String,
  os: String,
  env: Option<String>,
}

impl TargetTriple {
  pub fn parse(raw: &str) -> ShipResult<Self> {
    let invalid = |reason: &str| {
      ShipError::Validation(ValidationError::InvalidTriple {
        triple: raw.to_string(),
        reason: reason.to_string(),
      })
    };

    if raw.is_empty() {
      return Err(invalid("empty"));
    }
    if let Some(bad) = raw
      .chars()
      .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '.' || *c == '-'))
    {
      return Err(invalid(&format!("unexpected character '{}'", bad)));
    }

    let parts: Vec<&str> = raw.split('-').collect();
    if parts.iter().any(|p| p.is_empty()) {
      return Err(invalid("empty component"));
    }
    if parts.len() < 2 {
      return Err(invalid("expected at least <arch>-<os>"));
    }
    if parts.len() > 4 {
      return Err(invalid("too many components"));
    }

    let has_vendor = parts.len() >= 3 && KNOWN_VENDORS.contains(&parts[1]);
    let (vendor, rest) = if has_vendor {
      (parts[1].to_string(), &parts[2..])
    } else {
      ("unknown".to_string(), &parts[1..])
    };

    // arch-vendor-os-env-extra or arch-os-env-extra
    if rest.len() > 2 {
      return Err(invalid("too many components after vendor"));
    }

    Ok(Self {
      raw: raw.to_string(),
      arch: parts[0].to_string(),
      vendor,
      os: rest[0].to_string(),
      env: rest.get(1).map(|e| e.to_string()),
    })
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }

  pub fn arch(&self) -> &str {
    &self.arch
  }

  pub fn vendor(&self) -> &str {
    &self.vendor
  }

  pub fn env(&self) -> Option<&str> {
    self.env.as_deref()
  }

  /// Classify the operating system family
  pub fn os(&self) -> TargetOs {
    let env = self.env.as_deref().unwrap_or("");
    match self.os.as_str() {
      "linux" if env.starts_with("android") => TargetOs::Android,
      "android" | "androideabi" => TargetOs::Android,
      "linux" => TargetOs::Linux,
      "freebsd" => TargetOs::FreeBsd,
      "netbsd" => TargetOs::NetBsd,
      "openbsd" => TargetOs::OpenBsd,
      "illumos" => TargetOs::Illumos,
      "solaris" => TargetOs::Solaris,
      "darwin" => TargetOs::MacOs,
      "ios" => TargetOs::Ios,
      "windows" => TargetOs::Windows,
      os if os.starts_with("wasi") => TargetOs::Wasi,
      other => TargetOs::Other(other.to_string()),
    }
  }

  /// Windows targets built with a GNU-style toolchain (MinGW / LLVM-MinGW)
  pub fn is_windows_gnu(&self) -> bool {
    self.os() == TargetOs::Windows && self.env().is_some_and(|e| e.starts_with("gnu"))
  }

  /// File extension of the produced executable
  pub fn exe_suffix(&self) -> &'static str {
    match self.os() {
      TargetOs::Windows => ".exe",
      TargetOs::Wasi => ".wasm",
      _ => "",
    }
  }
}

impl fmt::Display for TargetTriple {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

impl FromStr for TargetTriple {
  type Err = ShipError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl Serialize for TargetTriple {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.raw)
  }
}

impl<'de> Deserialize<'de> for TargetTriple {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    TargetTriple::parse(&raw).map_err(serde::de::Error::custom)
  }
}
