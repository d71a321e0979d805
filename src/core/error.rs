//! Error types for cargo-shipmatrix with contextual messages and exit codes
//!
//! Every error maps to an exit code and, where we know something useful,
//! a help line that points the operator at the fix.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cargo-shipmatrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, gh, cargo, I/O)
  System = 2,
  /// Validation failure (matrix checks, permissions)
  Validation = 3,
  /// Per-target jobs failed and `--strict` was requested
  JobFailures = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cargo-shipmatrix
#[derive(Debug)]
pub enum ShipError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Release creation / asset upload errors
  Release(ReleaseError),

  /// External tool errors (cargo, cross, rustup)
  Tool(ToolError),

  /// Validation errors (triples, matrix, permissions)
  Validation(ValidationError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ShipError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ShipError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ShipError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ShipError::Message { message, context, help } => ShipError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ShipError::Config(_) => ExitCode::User,
      ShipError::Git(_) => ExitCode::System,
      ShipError::Release(_) => ExitCode::System,
      ShipError::Tool(_) => ExitCode::System,
      ShipError::Validation(ValidationError::JobsFailed { .. }) => ExitCode::JobFailures,
      ShipError::Validation(_) => ExitCode::Validation,
      ShipError::Io(_) => ExitCode::System,
      ShipError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ShipError::Config(e) => e.help_message(),
      ShipError::Git(e) => e.help_message(),
      ShipError::Release(e) => e.help_message(),
      ShipError::Tool(e) => e.help_message(),
      ShipError::Validation(e) => e.help_message(),
      ShipError::Message { help, .. } => help.clone(),
      ShipError::Io(_) => None,
    }
  }
}

impl fmt::Display for ShipError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ShipError::Config(e) => write!(f, "{}", e),
      ShipError::Git(e) => write!(f, "{}", e),
      ShipError::Release(e) => write!(f, "{}", e),
      ShipError::Tool(e) => write!(f, "{}", e),
      ShipError::Validation(e) => write!(f, "{}", e),
      ShipError::Io(e) => write!(f, "I/O error: {}", e),
      ShipError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ShipError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ShipError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ShipError {
  fn from(err: io::Error) -> Self {
    ShipError::Io(err)
  }
}

impl From<String> for ShipError {
  fn from(msg: String) -> Self {
    ShipError::message(msg)
  }
}

impl From<&str> for ShipError {
  fn from(msg: &str) -> Self {
    ShipError::message(msg)
  }
}

impl From<toml_edit::TomlError> for ShipError {
  fn from(err: toml_edit::TomlError) -> Self {
    ShipError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ShipError {
  fn from(err: toml_edit::de::Error) -> Self {
    ShipError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for ShipError {
  fn from(err: toml_edit::ser::Error) -> Self {
    ShipError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<cargo_metadata::Error> for ShipError {
  fn from(err: cargo_metadata::Error) -> Self {
    ShipError::message(format!("Cargo metadata error: {}", err))
  }
}

impl From<serde_json::Error> for ShipError {
  fn from(err: serde_json::Error) -> Self {
    ShipError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for ShipError {
  fn from(err: semver::Error) -> Self {
    ShipError::message(format!("Version parse error: {}", err))
  }
}

impl From<glob::PatternError> for ShipError {
  fn from(err: glob::PatternError) -> Self {
    ShipError::Config(ConfigError::InvalidTagPattern {
      reason: err.msg.to_string(),
    })
  }
}

impl From<rayon::ThreadPoolBuildError> for ShipError {
  fn from(err: rayon::ThreadPoolBuildError) -> Self {
    ShipError::message(format!("Failed to start job pool: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// shipmatrix.toml not found
  NotFound { workspace_root: PathBuf },

  /// Config already exists and `--force` was not given
  AlreadyExists { path: PathBuf },

  /// No binary name configured and none could be detected
  MissingBinary,

  /// A tag pattern failed to compile
  InvalidTagPattern { reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `cargo shipmatrix init` to create a configuration file.".to_string()),
      ConfigError::AlreadyExists { .. } => Some("Pass --force to overwrite the existing configuration.".to_string()),
      ConfigError::MissingBinary => Some("Set `bin = \"<name>\"` under [release] in shipmatrix.toml.".to_string()),
      ConfigError::InvalidTagPattern { .. } => {
        Some("Tag patterns are shell globs, e.g. \"v*\" or \"release-[0-9]*\".".to_string())
      }
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { workspace_root } => {
        write!(
          f,
          "No cargo-shipmatrix configuration found.\nExpected file: {}/shipmatrix.toml",
          workspace_root.display()
        )
      }
      ConfigError::AlreadyExists { path } => {
        write!(f, "Configuration already exists: {}", path.display())
      }
      ConfigError::MissingBinary => write!(f, "No binary to release: [release].bin is not set"),
      ConfigError::InvalidTagPattern { reason } => write!(f, "Invalid tag pattern: {}", reason),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Tag does not exist locally
  TagNotFound { tag: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Initialize the repository first or check the path: {}",
        path.display()
      )),
      GitError::TagNotFound { tag } => Some(format!("Create and push the tag first: git tag {0} && git push origin {0}", tag)),
      GitError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::TagNotFound { tag } => write!(f, "Tag not found: {}", tag),
    }
  }
}

/// Release creation and upload errors
#[derive(Debug)]
pub enum ReleaseError {
  /// No tag to release (manual dispatch outside a tag)
  NoTag,

  /// No write credential in the environment
  MissingCredential,

  /// The configured permissions do not grant `contents: write`
  InsufficientPermissions { scope: String },

  /// A release for this tag already exists
  AlreadyExists { tag: String },

  /// The hosting CLI reported a failure
  HostFailed { command: String, stderr: String },

  /// A job that others depend on failed or never ran
  RunFailed { jobs: Vec<String> },
}

impl ReleaseError {
  fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::NoTag => Some("Pass --tag <tag> or run from a tag push (refs/tags/...).".to_string()),
      ReleaseError::MissingCredential => Some("Export GITHUB_TOKEN (or GH_TOKEN) with contents: write.".to_string()),
      ReleaseError::InsufficientPermissions { scope } => {
        Some(format!("Set `{} = \"write\"` under [permissions] in shipmatrix.toml.", scope))
      }
      ReleaseError::AlreadyExists { tag } => Some(format!(
        "Delete the existing release (gh release delete {}) or push a new tag.",
        tag
      )),
      ReleaseError::HostFailed { stderr, .. } => {
        if stderr.contains("401") || stderr.contains("Bad credentials") {
          Some("The token was rejected. Check GITHUB_TOKEN.".to_string())
        } else {
          None
        }
      }
      ReleaseError::RunFailed { .. } => {
        Some("Target jobs only start after the release job succeeds; see the report above.".to_string())
      }
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::NoTag => write!(f, "No release tag: the triggering ref is not a tag"),
      ReleaseError::MissingCredential => write!(f, "No write credential found (GITHUB_TOKEN / GH_TOKEN)"),
      ReleaseError::InsufficientPermissions { scope } => {
        write!(f, "Permission '{}' must be 'write' to create releases", scope)
      }
      ReleaseError::AlreadyExists { tag } => write!(f, "A release for tag '{}' already exists", tag),
      ReleaseError::HostFailed { command, stderr } => write!(f, "Release host command failed: {}\n{}", command, stderr),
      ReleaseError::RunFailed { jobs } => write!(f, "Release run failed: {}", jobs.join(", ")),
    }
  }
}

/// External tool errors
#[derive(Debug)]
pub enum ToolError {
  /// Tool could not be started
  NotInstalled { tool: String },

  /// Tool exited unsuccessfully
  CommandFailed { command: String, stderr: String },

  /// Build succeeded but the expected binary is missing
  MissingOutput { path: PathBuf },
}

impl ToolError {
  fn help_message(&self) -> Option<String> {
    match self {
      ToolError::NotInstalled { tool } => Some(format!("Install `{}` and make sure it is on PATH.", tool)),
      ToolError::MissingOutput { .. } => Some("Check that [release].bin names a binary target of this package.".to_string()),
      ToolError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ToolError::NotInstalled { tool } => write!(f, "Failed to run '{}'", tool),
      ToolError::CommandFailed { command, stderr } => write!(f, "Command failed: {}\n{}", command, stderr),
      ToolError::MissingOutput { path } => write!(f, "Build output not found: {}", path.display()),
    }
  }
}

/// Validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// Target triple failed to parse
  InvalidTriple { triple: String, reason: String },

  /// Unknown host OS name
  UnknownHost { name: String },

  /// Matrix failed validation
  MatrixInvalid { issues: Vec<String> },

  /// Job graph is malformed (unknown dependency or cycle)
  GraphInvalid { reason: String },

  /// One or more per-target jobs failed (only surfaced with --strict)
  JobsFailed { failed: Vec<String> },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::InvalidTriple { .. } => {
        Some("Target triples look like <arch>-<vendor>-<os>[-<env>], e.g. aarch64-unknown-linux-musl.".to_string())
      }
      ValidationError::UnknownHost { .. } => Some("Valid hosts: linux, macos, windows.".to_string()),
      ValidationError::MatrixInvalid { .. } => Some("Run `cargo shipmatrix check` for details.".to_string()),
      ValidationError::GraphInvalid { .. } => None,
      ValidationError::JobsFailed { .. } => Some("Drop --strict to treat per-target failures as non-fatal.".to_string()),
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::InvalidTriple { triple, reason } => {
        write!(f, "Invalid target triple '{}': {}", triple, reason)
      }
      ValidationError::UnknownHost { name } => write!(f, "Unknown host OS '{}'", name),
      ValidationError::MatrixInvalid { issues } => {
        write!(f, "Validation failed:")?;
        for issue in issues {
          write!(f, "\n  - {}", issue)?;
        }
        Ok(())
      }
      ValidationError::GraphInvalid { reason } => write!(f, "Invalid job graph: {}", reason),
      ValidationError::JobsFailed { failed } => {
        write!(f, "{} target job(s) failed: {}", failed.len(), failed.join(", "))
      }
    }
  }
}

/// Result type alias for cargo-shipmatrix
pub type ShipResult<T> = Result<T, ShipError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ShipResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ShipResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ShipError>,
{
  fn context(self, ctx: impl Into<String>) -> ShipResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ShipResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ShipError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
