//! Offline tracker source backed by a saved search response.

use super::TrackerSource;
use super::jira::{CustomFields, IssueRecord, SearchPage, convert_issues};
use crate::error::{ReportError, Result};
use crate::model::RawTicket;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Deserialize)]
#[serde(untagged)]
enum SavedIssues {
    Page(SearchPage),
    Issues(Vec<IssueRecord>),
}

/// Reads issues from a JSON file: either a search response object or a bare
/// array of issues.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    fields: CustomFields,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, fields: CustomFields) -> Self {
        Self {
            path: path.into(),
            fields,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackerSource for JsonFileSource {
    fn fetch(&self, query: &str) -> Result<Vec<RawTicket>> {
        if !query.is_empty() {
            debug!(query, "Query is ignored for file sources");
        }
        let contents = fs::read_to_string(&self.path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ReportError::missing_input(&self.path, "Pass a saved search response to --from-file")
            } else {
                ReportError::Io(err)
            }
        })?;

        let issues = match serde_json::from_str::<SavedIssues>(&contents)? {
            SavedIssues::Page(page) => page.issues,
            SavedIssues::Issues(issues) => issues,
        };
        info!(count = issues.len(), path = %self.path.display(), "Loaded issues from file");
        Ok(convert_issues(issues, &self.fields))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
