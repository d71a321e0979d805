mod cargo;
mod commands;
mod core;
mod matrix;
mod pipeline;
mod release;
mod toolchain;
mod ui;

use clap::{Args, Parser, Subcommand};
use commands::RunSettings;
use commands::plan::EventArgs;
use core::error::{ShipError, print_error};
use matrix::HostOs;
use std::path::PathBuf;

/// Tag-driven release pipeline: one release, one binary per target triple
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  Shipmatrix(ShipCli),
}

#[derive(Parser)]
#[command(name = "shipmatrix")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct ShipCli {
  #[command(subcommand)]
  command: Commands,
}

/// Which event to evaluate (defaults to the CI environment)
#[derive(Args)]
struct EventFlags {
  /// Event name: push, workflow_dispatch, workflow_call, ...
  #[arg(long)]
  event: Option<String>,
  /// Git ref of the push, e.g. refs/tags/v1.2.3
  #[arg(long = "ref")]
  git_ref: Option<String>,
  /// Release tag (overrides the tag taken from the ref or HEAD)
  #[arg(long)]
  tag: Option<String>,
}

impl From<EventFlags> for EventArgs {
  fn from(flags: EventFlags) -> Self {
    EventArgs {
      event: flags.event,
      git_ref: flags.git_ref,
      tag: flags.tag,
    }
  }
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Setup & Inspection
  // ============================================================================
  /// Create shipmatrix.toml with the default matrix
  Init {
    /// Overwrite an existing configuration
    #[arg(long)]
    force: bool,
  },

  /// Validate configuration, tag patterns and the matrix
  Check {
    /// Also verify triples against rustc and look for gh
    #[arg(long)]
    thorough: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Print the matrix as CI include JSON
  Matrix {
    /// Only entries for this host (linux, macos, windows)
    #[arg(long)]
    host: Option<HostOs>,
  },

  /// Evaluate the trigger and show the job plan
  Plan {
    #[command(flatten)]
    event: EventFlags,
    /// Output plan in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Execution
  // ============================================================================
  /// Run the pipeline: create the release, then build and upload every target
  Run {
    #[command(flatten)]
    event: EventFlags,
    /// Maximum concurrent jobs (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,
    /// Run jobs of every host here instead of deferring them
    #[arg(long)]
    all_hosts: bool,
    /// Show what would run without creating or uploading anything
    #[arg(long)]
    dry_run: bool,
    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
    /// Exit non-zero when any target job fails
    #[arg(long)]
    strict: bool,
    /// Output the run report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Create the release only (first CI job)
  Release {
    #[command(flatten)]
    event: EventFlags,
    /// Show what would run without creating anything
    #[arg(long)]
    dry_run: bool,
    /// Output the run report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Build and upload one target (one CI matrix leg)
  Job {
    /// Target triple, e.g. aarch64-unknown-linux-musl
    target: String,
    /// Host entry to run when the target is declared on several hosts
    #[arg(long)]
    host: Option<HostOs>,
    #[command(flatten)]
    event: EventFlags,
    /// Show what would run without building or uploading
    #[arg(long)]
    dry_run: bool,
    /// Output the run report in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let CargoCli::Shipmatrix(cli) = CargoCli::parse();

  let workspace_root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  let ctx = match core::context::ShipContext::build(&workspace_root) {
    Ok(ctx) => ctx,
    // init and check have to work with a broken config; they report it themselves
    Err(_) if matches!(cli.command, Commands::Init { .. } | Commands::Check { .. }) => {
      core::context::ShipContext::minimal(&workspace_root)
    }
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    // Setup & Inspection
    Commands::Init { force } => commands::run_init(&ctx, force),
    Commands::Check { thorough, json } => commands::run_check(&ctx, thorough, json),
    Commands::Matrix { host } => commands::run_matrix(&ctx, host),
    Commands::Plan { event, json } => commands::run_plan(&ctx, event.into(), json),

    // Execution
    Commands::Run {
      event,
      jobs,
      all_hosts,
      dry_run,
      report,
      strict,
      json,
    } => commands::run_pipeline(
      &ctx,
      event.into(),
      RunSettings {
        jobs,
        all_hosts,
        dry_run,
        json,
      },
      report,
      strict,
    ),
    Commands::Release { event, dry_run, json } => commands::run_release(&ctx, event.into(), dry_run, json),
    Commands::Job {
      target,
      host,
      event,
      dry_run,
      json,
    } => commands::run_job(&ctx, &target, host, event.into(), dry_run, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ShipError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
