use std::path::PathBuf;

/// Errors that can occur across the migrascope crates.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use migrascope_core::MigError;
///
/// let err = MigError::Config("unknown series".into());
/// assert!(err.to_string().contains("unknown series"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum MigError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Diff text parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// Artifact emission failure.
    #[error("report error: {0}")]
    Report(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
