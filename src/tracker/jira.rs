//! Jira REST search client and wire schema.
//!
//! The search endpoint is paged with `startAt` / `maxResults`; the client
//! keeps requesting until `total` issues have been seen or a page comes back
//! empty. Issues are typed into [`RawTicket`] here and nowhere else.

use super::credentials::Credentials;
use super::TrackerSource;
use crate::config::TrackerSettings;
use crate::error::{ReportError, Result};
use crate::model::{ChangeEvent, RawTicket, ReleaseVersion};
use crate::util::progress::ProgressTracker;
use crate::util::time::parse_tracker_timestamp;
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEARCH_PATH: &str = "/rest/api/2/search";
const BASE_FIELDS: &str =
    "key,summary,status,assignee,resolution,created,resolutiondate,issuetype,parent,fixVersions";

/// Custom field ids that vary per Jira site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFields {
    pub story_points: String,
    pub incident_count: String,
}

impl Default for CustomFields {
    fn default() -> Self {
        Self {
            story_points: "customfield_10022".to_string(),
            incident_count: "customfield_10272".to_string(),
        }
    }
}

// === Wire schema ===

/// One page of `/rest/api/2/search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub start_at: usize,
    #[serde(default)]
    pub max_results: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
}

#[derive(Debug, Deserialize)]
pub struct IssueRecord {
    pub key: String,
    pub fields: IssueFields,
    #[serde(default)]
    pub changelog: Option<Changelog>,
}

#[derive(Debug, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<Named>,
    #[serde(default)]
    pub assignee: Option<Assignee>,
    #[serde(default)]
    pub resolution: Option<Named>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub resolutiondate: Option<String>,
    #[serde(default)]
    pub issuetype: Option<Named>,
    #[serde(default)]
    pub parent: Option<KeyRef>,
    #[serde(default, rename = "fixVersions")]
    pub fix_versions: Vec<FixVersion>,
    /// Site-specific custom fields.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KeyRef {
    pub key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixVersion {
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    pub histories: Vec<History>,
}

#[derive(Debug, Deserialize)]
pub struct History {
    pub created: String,
    #[serde(default)]
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryItem {
    pub field: String,
    #[serde(default, rename = "toString")]
    pub to_string: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
}

/// Issues dropped or trimmed while typing a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Issues without a parsable creation timestamp.
    pub dropped_issues: usize,
    /// History entries without a parsable timestamp.
    pub dropped_events: usize,
}

impl IssueRecord {
    /// Type this issue. `None` when the creation timestamp is unusable.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn into_raw(self, fields: &CustomFields, stats: &mut ConversionStats) -> Option<RawTicket> {
        let Some(created) = self
            .fields
            .created
            .as_deref()
            .and_then(parse_tracker_timestamp)
        else {
            warn!(key = %self.key, created = ?self.fields.created, "Dropping issue with unusable created timestamp");
            stats.dropped_issues += 1;
            return None;
        };

        let mut changelog = Vec::new();
        for history in self.changelog.unwrap_or_default().histories {
            let Some(at) = parse_tracker_timestamp(&history.created) else {
                debug!(key = %self.key, created = %history.created, "Dropping history entry");
                stats.dropped_events += 1;
                continue;
            };
            changelog.extend(history.items.into_iter().map(|item| ChangeEvent {
                field: item.field,
                new_value: item.to_string,
                at,
            }));
        }

        let story_points = self
            .fields
            .extra
            .get(&fields.story_points)
            .and_then(Value::as_f64);
        let incident_count = self
            .fields
            .extra
            .get(&fields.incident_count)
            .and_then(Value::as_f64)
            .map_or(0, |count| count.max(0.0).round() as u32);

        let fix_versions = self
            .fields
            .fix_versions
            .into_iter()
            .map(|version| ReleaseVersion {
                release_date: version
                    .release_date
                    .as_deref()
                    .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()),
                name: version.name,
            })
            .collect();

        Some(RawTicket {
            summary: self.fields.summary.unwrap_or_default(),
            status: self.fields.status.map(|s| s.name).unwrap_or_default(),
            assignee_email: self.fields.assignee.and_then(|a| a.email_address),
            resolution: self.fields.resolution.map(|r| r.name),
            story_points,
            created,
            resolved: self
                .fields
                .resolutiondate
                .as_deref()
                .and_then(parse_tracker_timestamp),
            issue_type: self.fields.issuetype.map(|t| t.name).unwrap_or_default(),
            parent_key: self.fields.parent.map(|p| p.key),
            incident_count,
            fix_versions,
            changelog,
            key: self.key,
        })
    }
}

/// Type a batch of issues, logging anything dropped.
#[must_use]
pub fn convert_issues(issues: Vec<IssueRecord>, fields: &CustomFields) -> Vec<RawTicket> {
    let mut stats = ConversionStats::default();
    let tickets: Vec<RawTicket> = issues
        .into_iter()
        .filter_map(|issue| issue.into_raw(fields, &mut stats))
        .collect();
    if stats.dropped_issues > 0 || stats.dropped_events > 0 {
        warn!(
            dropped_issues = stats.dropped_issues,
            dropped_events = stats.dropped_events,
            "Skipped records with malformed timestamps"
        );
    }
    tickets
}

// === Client ===

/// Blocking Jira search client.
pub struct JiraClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    fields: CustomFields,
    page_size: usize,
}

impl JiraClient {
    /// Build a client for the configured site.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or the HTTP client cannot be
    /// constructed.
    pub fn new(settings: &TrackerSettings, credentials: Credentials) -> Result<Self> {
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ReportError::Config(
                "tracker.base-url is not set".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("engage/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            credentials,
            fields: settings.custom_fields.clone(),
            page_size: settings.page_size.max(1),
        })
    }

    fn field_list(&self) -> String {
        format!(
            "{BASE_FIELDS},{},{}",
            self.fields.story_points, self.fields.incident_count
        )
    }

    fn fetch_page(&self, query: &str, start_at: usize) -> Result<SearchPage> {
        let url = format!("{}{SEARCH_PATH}", self.base_url);
        let start = start_at.to_string();
        let max = self.page_size.to_string();
        let fields = self.field_list();

        debug!(start_at, page_size = self.page_size, "Requesting search page");
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.credentials.user, Some(self.credentials.token()))
            .query(&[
                ("jql", query),
                ("startAt", start.as_str()),
                ("maxResults", max.as_str()),
                ("expand", "changelog"),
                ("fields", fields.as_str()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let messages = serde_json::from_str::<ErrorBody>(&body)
                .map(|parsed| parsed.error_messages.join("; "))
                .unwrap_or_default();
            let detail = if messages.is_empty() {
                body.chars().take(200).collect()
            } else {
                messages
            };
            return Err(ReportError::Tracker(format!(
                "search returned HTTP {}: {detail}",
                status.as_u16()
            )));
        }

        Ok(response.json::<SearchPage>()?)
    }
}

impl TrackerSource for JiraClient {
    fn fetch(&self, query: &str) -> Result<Vec<RawTicket>> {
        let progress = ProgressTracker::new_spinner("Fetching issues");
        let mut issues: Vec<IssueRecord> = Vec::new();

        loop {
            let page = self.fetch_page(query, issues.len())?;
            let received = page.issues.len();
            let total = page.total;
            issues.extend(page.issues);
            progress.set_message(format!("Fetched {}/{total} issues", issues.len()));

            if received == 0 || issues.len() >= total {
                break;
            }
        }
        progress.finish_and_clear();

        info!(count = issues.len(), "Fetched issues from tracker");
        Ok(convert_issues(issues, &self.fields))
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
