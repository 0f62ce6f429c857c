use std::path::PathBuf;
use thiserror::Error;

/// Conditions callers may want to match on. Everything else travels as
/// plain `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum PenworkError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid version '{0}': expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    #[error("Input not found: {}", .0.display())]
    MissingInput(PathBuf),
}
