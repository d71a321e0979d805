//! cargo / rustup / cross backed toolchain

use super::{BuildRequest, Toolchain};
use crate::core::error::{ShipError, ShipResult, ToolError};
use crate::matrix::TargetTriple;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Mutex;

pub struct CargoToolchain {
  workspace_root: PathBuf,
  target_dir: PathBuf,
  /// Serializes `cargo install cross` across concurrent jobs
  install_lock: Mutex<()>,
  /// rustup does not tolerate concurrent component installs into one toolchain
  rustup_lock: Mutex<()>,
}

impl CargoToolchain {
  pub fn new(workspace_root: &Path) -> Self {
    Self {
      workspace_root: workspace_root.to_path_buf(),
      target_dir: workspace_root.join("target"),
      install_lock: Mutex::new(()),
      rustup_lock: Mutex::new(()),
    }
  }

  /// Location of the built executable for `bin` on `target`
  pub fn output_path(&self, bin: &str, target: &TargetTriple) -> PathBuf {
    self
      .target_dir
      .join(target.as_str())
      .join("release")
      .join(format!("{}{}", bin, target.exe_suffix()))
  }

  fn run(&self, program: &str, args: &[&str]) -> ShipResult<Output> {
    let output = Command::new(program)
      .current_dir(&self.workspace_root)
      .args(args)
      .output()
      .map_err(|_| {
        ShipError::Tool(ToolError::NotInstalled {
          tool: program.to_string(),
        })
      })?;

    if !output.status.success() {
      return Err(ShipError::Tool(ToolError::CommandFailed {
        command: format!("{} {}", program, args.join(" ")),
        stderr: tail(&String::from_utf8_lossy(&output.stderr), 40),
      }));
    }
    Ok(output)
  }

  /// Install the standard library for `target`, one rustup at a time
  fn add_target(&self, target: &str) -> ShipResult<()> {
    serialized(&self.rustup_lock, "rustup", || self.run("rustup", &["target", "add", target]))?;
    Ok(())
  }

  fn cross_available(&self) -> bool {
    Command::new("cross")
      .arg("--version")
      .output()
      .is_ok_and(|o| o.status.success())
  }
}

impl Toolchain for CargoToolchain {
  fn install_cross(&self, _target: &TargetTriple) -> ShipResult<()> {
    serialized(&self.install_lock, "cross install", || {
      if self.cross_available() {
        return Ok(());
      }
      self.run("cargo", &["install", "cross", "--locked"])?;
      Ok(())
    })
  }

  fn build(&self, request: &BuildRequest) -> ShipResult<PathBuf> {
    let target = request.target.as_str();

    // cross ships its own sysroots; native builds need the std for the target
    if !request.use_cross {
      self.add_target(target)?;
    }

    let features = request.features.join(",");
    let mut args = vec!["build", "--release", "--locked", "--bin", request.bin.as_str(), "--target", target];
    if !features.is_empty() {
      args.push("--features");
      args.push(&features);
    }

    let program = if request.use_cross { "cross" } else { "cargo" };
    self.run(program, &args)?;

    let output = self.output_path(&request.bin, &request.target);
    if !output.exists() {
      return Err(ShipError::Tool(ToolError::MissingOutput { path: output }));
    }
    Ok(output)
  }
}

/// Run `f` while holding `lock`
fn serialized<T>(lock: &Mutex<()>, what: &str, f: impl FnOnce() -> ShipResult<T>) -> ShipResult<T> {
  let _guard = lock
    .lock()
    .map_err(|_| ShipError::message(format!("{} lock poisoned", what)))?;
  f()
}

/// Last `n` lines of tool output (build logs get long)
fn tail(text: &str, n: usize) -> String {
  let lines: Vec<&str> = text.trim_end().lines().collect();
  let start = lines.len().saturating_sub(n);
  lines[start..].join("\n")
}
