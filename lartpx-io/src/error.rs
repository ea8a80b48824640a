//! I/O error types.

use thiserror::Error;

/// Result type for lartpx-io operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML descriptor parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed record in a text-format input file.
    #[error("invalid record at line {line}: {reason}")]
    InvalidRecord {
        /// 1-based line number within the source file.
        line: usize,
        /// Human-readable explanation.
        reason: String,
    },

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] lartpx_core::Error),
}
