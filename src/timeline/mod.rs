//! Timeline reconstruction.
//!
//! Turns a ticket's unordered status-change history into the date it
//! entered each lifecycle phase:
//!
//! 1. every event's new status is classified into a [`Phase`]; unmapped
//!    statuses are recorded and skipped
//! 2. one scan keeps, per phase: the latest Done entry, the earliest
//!    Validation / Development / Eng Backlog entry; PM Backlog is always the
//!    creation time
//! 3. dates for phases after the ticket's current phase are dropped, so a
//!    reopened ticket does not report stale progress
//! 4. remaining dates are clamped so they never decrease in phase order
//! 5. a missing resolution is backfilled for resolved tickets; abandoned
//!    tickets without a resolution are excluded from the output
//!
//! Finally the created and resolution timestamps are bucketed into Sunday
//! weeks.

use crate::model::{ChangeEvent, Phase, PhaseDates};
use crate::rules::CategoryRules;
use crate::util::time::week_start;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, trace};

/// Everything the reconstructor needs to know about one ticket.
#[derive(Debug, Clone, Copy)]
pub struct TimelineInput<'a> {
    /// Ticket key, used for diagnostics only.
    pub key: &'a str,
    pub status: &'a str,
    pub created: NaiveDateTime,
    pub resolution: Option<&'a str>,
    pub resolved: Option<NaiveDateTime>,
    pub events: &'a [ChangeEvent],
}

/// Reconstructed lifecycle for a kept ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub current_phase: Option<Phase>,
    pub phases: PhaseDates,
    pub resolution: Option<String>,
    pub resolution_date: Option<NaiveDateTime>,
    pub created_week: NaiveDate,
    pub resolution_week: Option<NaiveDate>,
    /// Distinct event statuses that matched no phase, in first-seen order.
    pub unmapped_statuses: Vec<String>,
}

/// Outcome of reconstructing one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconstruction {
    Kept(Timeline),
    /// Abandoned without a disposition; not reported.
    Excluded { status: String },
}

impl Reconstruction {
    #[must_use]
    pub fn kept(self) -> Option<Timeline> {
        match self {
            Self::Kept(timeline) => Some(timeline),
            Self::Excluded { .. } => None,
        }
    }
}

/// Reconstructs ticket timelines against a fixed rule set.
#[derive(Debug, Clone, Copy)]
pub struct TimelineReconstructor<'r> {
    rules: &'r CategoryRules,
}

impl<'r> TimelineReconstructor<'r> {
    #[must_use]
    pub const fn new(rules: &'r CategoryRules) -> Self {
        Self { rules }
    }

    /// Reconstruct the lifecycle of one ticket.
    #[must_use]
    pub fn reconstruct(&self, input: &TimelineInput<'_>) -> Reconstruction {
        let current_phase = self.rules.phase_of(input.status);
        let (mut phases, unmapped_statuses) = self.scan_events(input);

        if let Some(current) = current_phase {
            drop_later_phases(&mut phases, current);
        }
        enforce_phase_order(&mut phases);

        let mut resolution = input.resolution.map(str::to_string);
        let mut resolution_date = input.resolved;

        if resolution.is_none() {
            if input.status == self.rules.resolved_status {
                resolution = Some(self.rules.resolved_status.clone());
                resolution_date = phases.done;
            } else if input.status == self.rules.abandoned_status {
                debug!(key = input.key, status = input.status, "Excluding abandoned ticket");
                return Reconstruction::Excluded {
                    status: input.status.to_string(),
                };
            }
        }

        Reconstruction::Kept(Timeline {
            current_phase,
            phases,
            resolution,
            resolution_date,
            created_week: week_start(input.created.date()),
            resolution_week: resolution_date.map(|at| week_start(at.date())),
            unmapped_statuses,
        })
    }

    fn scan_events(&self, input: &TimelineInput<'_>) -> (PhaseDates, Vec<String>) {
        let mut phases = PhaseDates {
            pm_backlog: Some(input.created),
            ..PhaseDates::default()
        };
        let mut unmapped: Vec<String> = Vec::new();

        for event in input.events.iter().filter(|e| e.is_status_change()) {
            let Some(value) = event.new_value.as_deref() else {
                continue;
            };
            let Some(phase) = self.rules.phase_of(value) else {
                if !unmapped.iter().any(|seen| seen == value) {
                    unmapped.push(value.to_string());
                }
                continue;
            };

            // History from imports can predate the ticket itself.
            let at = event.at.max(input.created);
            trace!(key = input.key, %phase, %at, "Status event");

            match phase {
                Phase::Done => {
                    if phases.done.is_none_or(|current| at > current) {
                        phases.done = Some(at);
                    }
                }
                Phase::Validation => {
                    if phases.validation.is_none_or(|current| at < current) {
                        phases.validation = Some(at);
                    }
                }
                Phase::Development => {
                    if phases.development.is_none_or(|current| at <= current) {
                        phases.development = Some(at);
                    }
                }
                Phase::EngBacklog => {
                    if phases.eng_backlog.is_none_or(|current| at < current) {
                        phases.eng_backlog = Some(at);
                    }
                }
                Phase::PmBacklog => {}
            }
        }

        (phases, unmapped)
    }
}

/// Clear every phase date strictly later than `current`.
pub fn drop_later_phases(phases: &mut PhaseDates, current: Phase) {
    for phase in Phase::ALL.into_iter().filter(|phase| *phase > current) {
        phases.set(phase, None);
    }
}

/// Clamp present dates so they are non-decreasing in phase order.
///
/// Walking from Done backwards, an entry later than the nearest later entry
/// is pulled down to it: reaching a later phase implies the earlier one had
/// been entered by then. Absent dates stay absent.
pub fn enforce_phase_order(phases: &mut PhaseDates) {
    let mut ceiling: Option<NaiveDateTime> = None;
    for phase in Phase::ALL.into_iter().rev() {
        let Some(at) = phases.get(phase) else {
            continue;
        };
        let clamped = ceiling.map_or(at, |limit| at.min(limit));
        phases.set(phase, Some(clamped));
        ceiling = Some(clamped);
    }
}
