//! Ticket extraction: raw tracker records to report rows.
//!
//! For each [`RawTicket`] the extractor classifies the issue type and status,
//! reconstructs the phase timeline, picks the release, derives the defect
//! category and places the direct parent key. Once every row is built the
//! hierarchy passes fill in ancestor names.

use crate::hierarchy;
use crate::model::{ParentLinks, RawTicket, ReleaseVersion, Ticket};
use crate::rules::CategoryRules;
use crate::timeline::{Reconstruction, TimelineInput, TimelineReconstructor};
use crate::util::progress::ProgressTracker;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Counters collected during one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub fetched: usize,
    pub kept: usize,
    /// Abandoned tickets without a resolution.
    pub excluded: usize,
    /// Unmapped status string → occurrences (current status or history).
    pub unmapped_statuses: BTreeMap<String, usize>,
    pub unmapped_issue_types: BTreeMap<String, usize>,
}

/// Result of an extraction run.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub tickets: Vec<Ticket>,
    pub stats: ExtractStats,
}

/// Created / resolved counts for one Sunday-based week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeeklyRollup {
    pub week: NaiveDate,
    pub created: usize,
    pub resolved: usize,
}

/// Builds ticket rows against a fixed rule set.
#[derive(Debug, Clone, Copy)]
pub struct TicketExtractor<'r> {
    rules: &'r CategoryRules,
    show_progress: bool,
}

impl<'r> TicketExtractor<'r> {
    #[must_use]
    pub const fn new(rules: &'r CategoryRules) -> Self {
        Self {
            rules,
            show_progress: false,
        }
    }

    #[must_use]
    pub const fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Extract every ticket and resolve the hierarchy.
    #[must_use]
    pub fn extract(&self, raws: Vec<RawTicket>) -> Extraction {
        let mut stats = ExtractStats {
            fetched: raws.len(),
            ..ExtractStats::default()
        };

        let progress =
            ProgressTracker::with_visibility(raws.len() as u64, "Processing issues", self.show_progress);

        let mut rows = Vec::with_capacity(raws.len());
        for raw in raws {
            if let Some(ticket) = self.extract_one(raw, &mut stats) {
                rows.push(ticket);
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        for (status, count) in &stats.unmapped_statuses {
            warn!(status = %status, count, "Unable to map status to a phase");
        }
        for (issue_type, count) in &stats.unmapped_issue_types {
            warn!(issue_type = %issue_type, count, "Unable to map issue type to a category");
        }

        stats.kept = rows.len();
        info!(
            fetched = stats.fetched,
            kept = stats.kept,
            excluded = stats.excluded,
            "Extracted tickets"
        );

        Extraction {
            tickets: hierarchy::resolve(rows),
            stats,
        }
    }

    /// Build one row without hierarchy names. `None` when the ticket is
    /// excluded.
    pub fn extract_one(&self, raw: RawTicket, stats: &mut ExtractStats) -> Option<Ticket> {
        let category = self.rules.category_of(&raw.issue_type);
        if category.is_none() {
            *stats
                .unmapped_issue_types
                .entry(raw.issue_type.clone())
                .or_default() += 1;
            debug!(key = %raw.key, issue_type = %raw.issue_type, "No hierarchy mapping");
        }

        let input = TimelineInput {
            key: &raw.key,
            status: &raw.status,
            created: raw.created,
            resolution: raw.resolution.as_deref(),
            resolved: raw.resolved,
            events: &raw.changelog,
        };
        let timeline = match TimelineReconstructor::new(self.rules).reconstruct(&input) {
            Reconstruction::Kept(timeline) => timeline,
            Reconstruction::Excluded { .. } => {
                stats.excluded += 1;
                return None;
            }
        };

        if timeline.current_phase.is_none() {
            *stats.unmapped_statuses.entry(raw.status.clone()).or_default() += 1;
        }
        for status in &timeline.unmapped_statuses {
            *stats.unmapped_statuses.entry(status.clone()).or_default() += 1;
        }

        let release = earliest_release(&raw.fix_versions);
        let defect_category = self
            .rules
            .defect_category_of(&raw.issue_type, raw.incident_count);

        Some(Ticket {
            summary: raw.summary,
            assignee: raw.assignee_email,
            status_category: timeline.current_phase,
            story_points: raw.story_points,
            resolution: timeline.resolution,
            created: raw.created,
            created_week: timeline.created_week,
            phases: timeline.phases,
            release_date: release.and_then(|version| version.release_date),
            release_version: release.map(|version| version.name.clone()),
            resolution_date: timeline.resolution_date,
            resolution_week: timeline.resolution_week,
            incident_count: raw.incident_count,
            category,
            defect_category,
            links: ParentLinks::direct(category, raw.parent_key),
            key: raw.key,
            status: raw.status,
            issue_type: raw.issue_type,
        })
    }
}

/// The fix version with the earliest release date; undated versions are
/// ignored and ties keep the first listed.
#[must_use]
pub fn earliest_release(versions: &[ReleaseVersion]) -> Option<&ReleaseVersion> {
    versions
        .iter()
        .filter(|version| version.release_date.is_some())
        .fold(None, |best: Option<&ReleaseVersion>, version| match best {
            Some(current) if current.release_date <= version.release_date => Some(current),
            _ => Some(version),
        })
}

/// Count created and resolved tickets per week, oldest week first.
#[must_use]
pub fn weekly_rollup(tickets: &[Ticket]) -> Vec<WeeklyRollup> {
    let mut weeks: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for ticket in tickets {
        weeks.entry(ticket.created_week).or_default().0 += 1;
        if let Some(week) = ticket.resolution_week {
            weeks.entry(week).or_default().1 += 1;
        }
    }
    weeks
        .into_iter()
        .map(|(week, (created, resolved))| WeeklyRollup {
            week,
            created,
            resolved,
        })
        .collect()
}
