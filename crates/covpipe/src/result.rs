//! Result and error types for covpipe.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for covpipe operations
pub type CovResult<T> = Result<T, CovError>;

/// Errors that can occur while driving the coverage pipeline.
///
/// Only configuration problems and failures to start a process are errors.
/// A tool that runs and exits non-zero is logged, not returned.
#[derive(Debug, Error)]
pub enum CovError {
    /// Required tool could not be resolved on `PATH`
    #[error("{name} not found. Install it or point the configuration at its path")]
    ToolNotFound {
        /// Tool name or path as configured
        name: String,
    },

    /// Configured data directory is unusable
    #[error("Invalid coverage data directory {}: {message}", path.display())]
    InvalidDataDir {
        /// Configured path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Base URL could not be parsed
    #[error("Invalid base URL {url}: {message}")]
    InvalidBaseUrl {
        /// URL as given
        url: String,
        /// Error message
        message: String,
    },

    /// A process could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CovError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error should stop the session before any step runs
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound { .. }
                | Self::InvalidDataDir { .. }
                | Self::InvalidBaseUrl { .. }
                | Self::Config { .. }
        )
    }
}
