//! Core data types for `engage_report`.
//!
//! - `Phase` - the five ordered lifecycle stages a ticket moves through
//! - `IssueCategory` - canonical issue-type grouping
//! - `RawTicket` / `ChangeEvent` - tracker records as fetched
//! - `Ticket` - one extracted row with derived dates and hierarchy
//! - `PullRequestRecord` / `ReviewComment` - code-host records
//! - `DailyAggregate` - per-author-per-day counts used for reporting

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used wherever a category could not be derived.
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// Ticket lifecycle phase, ordered from earliest to latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "PM Backlog")]
    PmBacklog,
    #[serde(rename = "Eng Backlog")]
    EngBacklog,
    #[serde(rename = "Development")]
    Development,
    #[serde(rename = "Validation")]
    Validation,
    #[serde(rename = "Done")]
    Done,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::PmBacklog,
        Self::EngBacklog,
        Self::Development,
        Self::Validation,
        Self::Done,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PmBacklog => "PM Backlog",
            Self::EngBacklog => "Eng Backlog",
            Self::Development => "Development",
            Self::Validation => "Validation",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical issue-type grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCategory {
    Planning,
    Epic,
    Standard,
    Testing,
    Subtask,
}

impl IssueCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "PLANNING",
            Self::Epic => "EPIC",
            Self::Standard => "STANDARD",
            Self::Testing => "TESTING",
            Self::Subtask => "SUBTASK",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a ticket's change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Name of the changed field (`status`, `assignee`, ...).
    pub field: String,
    /// Display value after the change.
    pub new_value: Option<String>,
    /// When the change happened.
    pub at: NaiveDateTime,
}

impl ChangeEvent {
    #[must_use]
    pub fn status(new_value: impl Into<String>, at: NaiveDateTime) -> Self {
        Self {
            field: "status".to_string(),
            new_value: Some(new_value.into()),
            at,
        }
    }

    #[must_use]
    pub fn is_status_change(&self) -> bool {
        self.field == "status"
    }
}

/// A release (fix version) attached to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseVersion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

/// A ticket exactly as the tracker reported it, typed once at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTicket {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee_email: Option<String>,
    pub resolution: Option<String>,
    pub story_points: Option<f64>,
    pub created: NaiveDateTime,
    pub resolved: Option<NaiveDateTime>,
    pub issue_type: String,
    pub parent_key: Option<String>,
    /// Escaped-incident count (customer tickets linked to this issue).
    pub incident_count: u32,
    pub fix_versions: Vec<ReleaseVersion>,
    pub changelog: Vec<ChangeEvent>,
}

/// Lifecycle phase-entry dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDates {
    pub pm_backlog: Option<NaiveDateTime>,
    pub eng_backlog: Option<NaiveDateTime>,
    pub development: Option<NaiveDateTime>,
    pub validation: Option<NaiveDateTime>,
    pub done: Option<NaiveDateTime>,
}

impl PhaseDates {
    #[must_use]
    pub const fn get(&self, phase: Phase) -> Option<NaiveDateTime> {
        match phase {
            Phase::PmBacklog => self.pm_backlog,
            Phase::EngBacklog => self.eng_backlog,
            Phase::Development => self.development,
            Phase::Validation => self.validation,
            Phase::Done => self.done,
        }
    }

    pub fn set(&mut self, phase: Phase, value: Option<NaiveDateTime>) {
        let slot = match phase {
            Phase::PmBacklog => &mut self.pm_backlog,
            Phase::EngBacklog => &mut self.eng_backlog,
            Phase::Development => &mut self.development,
            Phase::Validation => &mut self.validation,
            Phase::Done => &mut self.done,
        };
        *slot = value;
    }

    /// Present dates in phase order.
    #[must_use]
    pub fn present(&self) -> Vec<(Phase, NaiveDateTime)> {
        Phase::ALL
            .iter()
            .filter_map(|&phase| self.get(phase).map(|at| (phase, at)))
            .collect()
    }
}

/// One extracted ticket row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub key: String,
    pub summary: String,
    pub assignee: Option<String>,
    pub status: String,
    /// Phase the current status maps to; `None` when the status is unmapped.
    pub status_category: Option<Phase>,
    pub story_points: Option<f64>,
    pub resolution: Option<String>,
    pub created: NaiveDateTime,
    pub created_week: NaiveDate,
    #[serde(flatten)]
    pub phases: PhaseDates,
    pub release_date: Option<NaiveDate>,
    pub release_version: Option<String>,
    pub resolution_date: Option<NaiveDateTime>,
    pub resolution_week: Option<NaiveDate>,
    pub issue_type: String,
    pub incident_count: u32,
    /// `None` when the issue type is unmapped.
    pub category: Option<IssueCategory>,
    pub defect_category: String,
    #[serde(flatten)]
    pub links: ParentLinks,
}

impl Ticket {
    #[must_use]
    pub fn status_category_label(&self) -> &'static str {
        self.status_category.map_or(UNKNOWN_LABEL, |phase| phase.as_str())
    }

    #[must_use]
    pub fn category_label(&self) -> &'static str {
        self.category.map_or(UNKNOWN_LABEL, |category| category.as_str())
    }
}

/// Hierarchy references and resolved ancestor names.
///
/// Keys are lookups into the same ticket table, never owned referents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLinks {
    pub parent_story: Option<String>,
    pub parent_story_name: Option<String>,
    pub parent_epic: Option<String>,
    pub parent_epic_name: Option<String>,
    pub parent_initiative: Option<String>,
    pub parent_initiative_name: Option<String>,
    pub parent_theme: Option<String>,
}

impl ParentLinks {
    /// Place a direct parent key according to the child's category.
    #[must_use]
    pub fn direct(category: Option<IssueCategory>, parent: Option<String>) -> Self {
        let mut links = Self::default();
        match category {
            Some(IssueCategory::Planning) => links.parent_theme = parent,
            Some(IssueCategory::Epic) => links.parent_initiative = parent,
            Some(IssueCategory::Standard) => links.parent_epic = parent,
            Some(IssueCategory::Subtask) => links.parent_story = parent,
            Some(IssueCategory::Testing) | None => {}
        }
        links
    }
}

/// A merged pull request from the code host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub author: String,
    pub merged_at: NaiveDateTime,
    pub number: String,
    pub lines_changed: u64,
}

/// A review comment from the code host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub author: String,
    pub created_at: NaiveDateTime,
    pub comment_type: String,
    pub id: String,
}

/// Anything attributable to an author at a point in time.
pub trait Authored {
    fn author(&self) -> &str;
    fn timestamp(&self) -> NaiveDateTime;
}

impl Authored for PullRequestRecord {
    fn author(&self) -> &str {
        &self.author
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.merged_at
    }
}

impl Authored for ReviewComment {
    fn author(&self) -> &str {
        &self.author
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.created_at
    }
}

/// Per-author, per-day activity row. Gap-filled rows carry zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub author: String,
    pub date: NaiveDate,
    pub count: u32,
    /// Summed size metric (lines changed for PRs; zero for comments).
    pub total_size: u64,
    /// Mean size per record that day; zero when `count` is zero.
    pub mean_size: f64,
}

impl DailyAggregate {
    #[must_use]
    pub fn empty(author: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            author: author.into(),
            date,
            count: 0,
            total_size: 0,
            mean_size: 0.0,
        }
    }
}
