//! Error handling for the `stamp` CLI.
//!
//! `CliError` is the top-level type returned by commands. Core failures keep
//! their `StampError` so the miette conversion can attach hints per variant.
//!
//! # Example
//!
//! ```rust,no_run
//! use stamp_cli::error::{CliError, Result, ResultExt};
//!
//! fn parse_depth(raw: &str) -> Result<usize> {
//!     raw.parse::<usize>()
//!         .map_err(|e| CliError::InvalidArgument(e.to_string()))
//!         .with_hint("Depth must be a non-negative integer")
//! }
//! ```

mod miette;

use std::path::PathBuf;

use stamp_core::StampError;
use thiserror::Error;

pub use self::miette::{cli_error_to_miette, install_hook};

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration loading or validation failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A core operation failed (I/O, manifest schema, strict mode, ...)
    #[error(transparent)]
    Core(#[from] StampError),

    /// Invalid command-line arguments or argument combinations
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Project scanning failed
    #[error("Failed to scan {}: {message}", .root.display())]
    Scan { root: PathBuf, message: String },

    /// JSON serialization of a report failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {}\n\nHint: Create a stamp.config.json file or pass an existing file to --config", .0.display())]
    NotFound(PathBuf),

    /// A configuration value is out of range or malformed
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Append a `Hint:` line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{err}\n\nHint: {hint}"))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{msg}: {err}"))
        })
    }
}
