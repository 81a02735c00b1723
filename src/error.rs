//! Error types for `ralph_gate`.

use std::path::PathBuf;

/// Errors that can occur in the gate hooks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regex error occurred.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A command timed out.
    #[error("Command '{command}' timed out after {timeout_secs} seconds")]
    CommandTimeout {
        /// The command that was run.
        command: String,
        /// The timeout in seconds.
        timeout_secs: u64,
    },

    /// A file was not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The project config contains a value that cannot be used.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A template error occurred.
    #[error("Template error: {0}")]
    Template(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
