//! Init command: write a starter shipmatrix.toml

use crate::cargo::WorkspaceMetadata;
use crate::core::config::ShipConfig;
use crate::core::context::ShipContext;
use crate::core::error::{ConfigError, ShipError, ShipResult};

/// Run the init command
pub fn run_init(ctx: &ShipContext, force: bool) -> ShipResult<()> {
  let root = ctx.workspace_root();

  if let Some(existing) = ShipConfig::find_config_path(root)
    && !force
  {
    return Err(ShipError::Config(ConfigError::AlreadyExists { path: existing }));
  }

  let bin = match WorkspaceMetadata::load(root) {
    Ok(metadata) => metadata.default_binary(),
    Err(e) => {
      eprintln!("⚠️  Could not read workspace metadata: {}", e);
      None
    }
  };

  let config = ShipConfig::new(bin.clone());
  let path = config.save(root)?;

  println!("✅ Created {}", path.display());
  match bin {
    Some(bin) => println!("   Binary:  {}", bin),
    None => println!("   Binary:  <not detected> (set [release] bin)"),
  }
  println!("   Targets: {}", config.targets.len());
  println!("   Tags:    {}", config.release.tag_patterns.join(", "));
  println!();
  println!("Next: cargo shipmatrix plan --ref refs/tags/v0.1.0");

  Ok(())
}
