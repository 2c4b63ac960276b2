//! # Tabledrop - Uploaded-dataset query service
//!
//! Upload tabular data, query it later over HTTP.
//!
//! Tabledrop provides:
//! - Upload endpoint accepting SQLite database files or CSV files
//! - CSV-to-SQLite conversion with column type inference
//! - Read-only SQL execution against uploaded artifacts
//! - Schema introspection with per-table example rows
//! - Age-based retention sweep over the artifact directory

pub mod config;
pub mod convert;
pub mod query;
pub mod server;
pub mod store;
pub mod sweeper;

// Re-exports for convenient access
pub use config::ServerConfig;
pub use store::{ArtifactKind, ArtifactStore};

/// Result type alias for Tabledrop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Tabledrop operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),
}
