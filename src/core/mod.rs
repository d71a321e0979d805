//! Core building blocks shared by every command
//!
//! - **config**: shipmatrix.toml parsing and validation
//! - **context**: config and repository loaded once per invocation
//! - **error**: error types with contextual help messages and exit codes
//! - **vcs**: read-only git queries (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
