//! Cargo workspace introspection

pub mod metadata;

pub use metadata::WorkspaceMetadata;
