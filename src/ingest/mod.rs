//! Code-host table ingestion.
//!
//! Raw CSV columns become typed [`PullRequestRecord`] / [`ReviewComment`]
//! values here, once. Header names are checked before any row is read; rows
//! with unusable timestamps or counts are dropped and counted.

use crate::error::{ReportError, Result};
use crate::format::csv::{CsvTable, parse_csv};
use crate::model::{PullRequestRecord, ReviewComment};
use crate::util::time::parse_record_timestamp;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column names of the merged pull request export.
pub mod pr_columns {
    pub const AUTHOR: &str = "author";
    pub const MERGED_AT: &str = "merged_at";
    pub const NUMBER: &str = "pr_number";
    pub const LINES_CHANGED: &str = "total_lines_changed";
}

/// Column names of the review comment export.
pub mod comment_columns {
    pub const AUTHOR: &str = "comment_author";
    pub const CREATED_AT: &str = "comment_created_at";
    pub const TYPE: &str = "comment_type";
    pub const ID: &str = "comment_id";
}

/// Typed records plus the number of rows that could not be typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub malformed: usize,
}

/// Fail with [`ReportError::MissingInput`] unless `path` exists.
///
/// # Errors
///
/// Returns `MissingInput` carrying `hint` when the file is absent.
pub fn require_file(path: &Path, hint: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ReportError::missing_input(path, hint))
    }
}

fn read_table(path: &Path, hint: &str) -> Result<CsvTable> {
    require_file(path, hint)?;
    let contents = fs::read_to_string(path)?;
    let table = parse_csv(&contents)?;
    debug!(path = %path.display(), rows = table.rows.len(), "Read CSV");
    Ok(table)
}

fn resolve_columns<const N: usize>(
    table: &CsvTable,
    path: &Path,
    names: [&str; N],
) -> Result<[usize; N]> {
    let mut indexes = [0; N];
    for (slot, name) in indexes.iter_mut().zip(names) {
        *slot = table.column(name).ok_or_else(|| ReportError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
            available: table.header.clone(),
        })?;
    }
    Ok(indexes)
}

fn cell<'a>(fields: &'a [String], index: usize) -> &'a str {
    fields.get(index).map_or("", |value| value.trim())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(value: &str) -> Option<u64> {
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n.round() as u64)
    })
}

/// Load the merged pull request export.
///
/// # Errors
///
/// Returns an error if the file is absent, unparsable, or lacks a required
/// column.
pub fn load_pull_requests(path: &Path) -> Result<Loaded<PullRequestRecord>> {
    let table = read_table(path, "Export merged pull requests to CSV first")?;
    let [author, merged_at, number, lines] = resolve_columns(
        &table,
        path,
        [
            pr_columns::AUTHOR,
            pr_columns::MERGED_AT,
            pr_columns::NUMBER,
            pr_columns::LINES_CHANGED,
        ],
    )?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut malformed = 0;
    for row in &table.rows {
        let fields = &row.fields;
        let author_value = cell(fields, author);
        let parsed = parse_record_timestamp(cell(fields, merged_at))
            .zip(parse_count(cell(fields, lines)));
        match parsed {
            Some((merged, lines_changed)) if !author_value.is_empty() => {
                records.push(PullRequestRecord {
                    author: author_value.to_string(),
                    merged_at: merged,
                    number: cell(fields, number).to_string(),
                    lines_changed,
                });
            }
            _ => {
                debug!(line = row.line, "Dropping malformed pull request row");
                malformed += 1;
            }
        }
    }

    if malformed > 0 {
        warn!(path = %path.display(), malformed, "Removed pull request rows with invalid values");
    }
    info!(path = %path.display(), count = records.len(), "Loaded pull requests");
    Ok(Loaded { records, malformed })
}

/// Load the review comment export.
///
/// # Errors
///
/// Returns an error if the file is absent, unparsable, or lacks a required
/// column.
pub fn load_comments(path: &Path) -> Result<Loaded<ReviewComment>> {
    let table = read_table(path, "Export pull request comments to CSV first")?;
    let [author, created_at, comment_type, id] = resolve_columns(
        &table,
        path,
        [
            comment_columns::AUTHOR,
            comment_columns::CREATED_AT,
            comment_columns::TYPE,
            comment_columns::ID,
        ],
    )?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut malformed = 0;
    for row in &table.rows {
        let fields = &row.fields;
        let author_value = cell(fields, author);
        match parse_record_timestamp(cell(fields, created_at)) {
            Some(created) if !author_value.is_empty() => records.push(ReviewComment {
                author: author_value.to_string(),
                created_at: created,
                comment_type: cell(fields, comment_type).to_string(),
                id: cell(fields, id).to_string(),
            }),
            _ => {
                debug!(line = row.line, "Dropping malformed comment row");
                malformed += 1;
            }
        }
    }

    if malformed > 0 {
        warn!(path = %path.display(), malformed, "Removed comment rows with invalid timestamps");
    }
    info!(path = %path.display(), count = records.len(), "Loaded comments");
    Ok(Loaded { records, malformed })
}
