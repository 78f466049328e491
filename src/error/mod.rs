//! Error types and handling for `engage_report`.
//!
//! # Design
//!
//! - `thiserror` derive for the primary error enum
//! - `anyhow` integration through the `Other` variant
//! - Recovery hints for user-facing errors
//! - Structured JSON output via [`StructuredError`]
//!
//! Row-level problems (unmapped statuses, malformed timestamps) are not
//! errors at this level: they are logged and the row is skipped or kept with
//! an `UNKNOWN` category. Only whole-run failures surface here.

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `engage_report` operations.
#[derive(Error, Debug)]
pub enum ReportError {
    // === Input Errors ===
    /// A required input file is absent.
    #[error("Input file not found: '{path}'")]
    MissingInput { path: PathBuf, hint: Option<String> },

    /// A tabular input is missing a required column.
    #[error("Missing column '{column}' in {path}")]
    MissingColumn {
        path: PathBuf,
        column: String,
        available: Vec<String>,
    },

    /// A CSV line could not be parsed.
    #[error("CSV parse error at line {line}: {reason}")]
    CsvParse { line: usize, reason: String },

    // === Tracker Errors ===
    /// The tracker rejected the request or returned an unexpected payload.
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials could not be obtained.
    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    // === Validation / Configuration ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReportError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. }
                | Self::MissingColumn { .. }
                | Self::Credentials(_)
                | Self::Validation { .. }
                | Self::Config(_)
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::MissingInput { hint: Some(hint), .. } => Some(hint),
            Self::MissingInput { hint: None, .. } => Some("Check the path or pass it explicitly"),
            Self::MissingColumn { .. } => {
                Some("Re-export the table with the expected header row")
            }
            Self::Credentials(_) => {
                Some("Set ENGAGE_TRACKER_USER and ENGAGE_TRACKER_TOKEN, or run interactively")
            }
            Self::Config(_) => Some("Run: engage config to inspect the merged configuration"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-input error with a recovery hint.
    #[must_use]
    pub fn missing_input(path: impl Into<PathBuf>, hint: impl Into<String>) -> Self {
        Self::MissingInput {
            path: path.into(),
            hint: Some(hint.into()),
        }
    }
}

/// Result type using `ReportError`.
pub type Result<T> = std::result::Result<T, ReportError>;
