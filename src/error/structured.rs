//! Structured error output.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Context for debugging
//!
//! `--json` runs (or runs with a non-terminal stdout) emit the JSON form on
//! stderr; interactive runs get the human form.

#![allow(clippy::option_if_let_else)]

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Input Errors (exit code 2) ===
    /// Required input file absent
    MissingInput,
    /// Tabular input missing a column
    MissingColumn,
    /// CSV line could not be parsed
    CsvParseError,

    // === Tracker Errors (exit code 3) ===
    /// Tracker returned an error or unexpected payload
    TrackerError,
    /// HTTP transport failed
    HttpError,
    /// Credentials unavailable
    CredentialsUnavailable,

    // === Validation Errors (exit code 4) ===
    /// Field validation failed
    ValidationFailed,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInput => "MISSING_INPUT",
            Self::MissingColumn => "MISSING_COLUMN",
            Self::CsvParseError => "CSV_PARSE_ERROR",
            Self::TrackerError => "TRACKER_ERROR",
            Self::HttpError => "HTTP_ERROR",
            Self::CredentialsUnavailable => "CREDENTIALS_UNAVAILABLE",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether re-running after fixing input could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpError | Self::CredentialsUnavailable | Self::ValidationFailed
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Input errors
    /// - 3: Tracker errors
    /// - 4: Validation errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingInput | Self::MissingColumn | Self::CsvParseError => 2,
            Self::TrackerError | Self::HttpError | Self::CredentialsUnavailable => 3,
            Self::ValidationFailed => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `ReportError`.
    #[must_use]
    pub fn from_error(err: &ReportError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &ReportError) -> (ErrorCode, Option<Value>) {
        match err {
            ReportError::MissingInput { path, .. } => (
                ErrorCode::MissingInput,
                Some(json!({"path": path.display().to_string()})),
            ),
            ReportError::MissingColumn {
                path,
                column,
                available,
            } => (
                ErrorCode::MissingColumn,
                Some(json!({
                    "path": path.display().to_string(),
                    "column": column,
                    "available": available,
                })),
            ),
            ReportError::CsvParse { line, reason } => (
                ErrorCode::CsvParseError,
                Some(json!({"line": line, "reason": reason})),
            ),
            ReportError::Tracker(_) => (ErrorCode::TrackerError, None),
            ReportError::Http(err) => (
                ErrorCode::HttpError,
                err.status()
                    .map(|status| json!({"status": status.as_u16()})),
            ),
            ReportError::Credentials(_) => (ErrorCode::CredentialsUnavailable, None),
            ReportError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            ReportError::Config(_) => (ErrorCode::ConfigError, None),
            ReportError::Io(_) => (ErrorCode::IoError, None),
            ReportError::Json(_) => (ErrorCode::JsonError, None),
            ReportError::Yaml(_) => (ErrorCode::YamlError, None),
            ReportError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    fn generate_hint(err: &ReportError) -> Option<String> {
        // A near-miss header beats the generic suggestion.
        if let ReportError::MissingColumn {
            column, available, ..
        } = err
        {
            let similar = find_similar_names(column, available, 1);
            if let Some(candidate) = similar.first() {
                return Some(format!("Did you mean column '{candidate}'?"));
            }
        }

        if let Some(suggestion) = err.suggestion() {
            return Some(suggestion.to_string());
        }

        match err {
            ReportError::CsvParse { line, .. } => {
                Some(format!("Check line {line} of the file for unbalanced quotes."))
            }
            ReportError::Http(err) if err.status().is_some_and(|s| s.as_u16() == 401) => {
                Some("The tracker rejected the credentials; regenerate the API token.".to_string())
            }
            _ => None,
        }
    }
}

/// Levenshtein distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Find names within a small edit distance of `target`, closest first.
#[must_use]
pub fn find_similar_names(target: &str, candidates: &[String], max: usize) -> Vec<String> {
    let target = target.to_lowercase();
    let threshold = (target.len() / 3).max(2);

    let mut scored: Vec<(usize, &String)> = candidates
        .iter()
        .map(|candidate| (levenshtein_distance(&target, &candidate.to_lowercase()), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    scored
        .into_iter()
        .take(max)
        .map(|(_, name)| name.clone())
        .collect()
}
