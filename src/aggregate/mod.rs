//! Per-developer activity aggregation.
//!
//! - [`AuthorFilter`] drops retired and automated identities
//! - [`daily_pr_aggregates`] / [`daily_comment_aggregates`] group by
//!   (author, calendar date)
//! - [`gap_fill`] expands to every author × every date with zero rows
//! - [`rolling_mean`] smooths a daily series with a centered window
//! - [`summarize`] and [`comment_type_breakdown`] produce the console totals
//!
//! [`trends`] assembles these into the chart-ready [`DeveloperReport`].

pub mod trends;

pub use trends::{DeveloperReport, DeveloperTrend, FilterCounts, TeamTrend, TrendOptions, build_report};

use crate::error::{ReportError, Result};
use crate::model::{Authored, DailyAggregate, PullRequestRecord, ReviewComment};
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// Identities excluded from every aggregate.
#[derive(Debug, Clone)]
pub struct AuthorFilter {
    denylist: HashSet<String>,
    automation: Option<Regex>,
}

/// Records that survived filtering and how many were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome<T> {
    pub kept: Vec<T>,
    pub denylisted: usize,
    pub automated: usize,
}

impl AuthorFilter {
    /// Build a filter from exact denylisted identities and case-insensitive
    /// automation markers.
    ///
    /// # Errors
    ///
    /// Returns a config error if the markers cannot be compiled.
    pub fn new(denylist: &[String], automation_markers: &[String]) -> Result<Self> {
        let markers: Vec<String> = automation_markers
            .iter()
            .map(|marker| marker.trim())
            .filter(|marker| !marker.is_empty())
            .map(regex::escape)
            .collect();
        let automation = if markers.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&markers.join("|"))
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| ReportError::Config(format!("bad automation marker: {err}")))?,
            )
        };
        Ok(Self {
            denylist: denylist.iter().map(|name| name.trim().to_string()).collect(),
            automation,
        })
    }

    #[must_use]
    pub fn is_denylisted(&self, author: &str) -> bool {
        self.denylist.contains(author)
    }

    #[must_use]
    pub fn is_automated(&self, author: &str) -> bool {
        self.automation
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(author))
    }

    /// Drop denylisted and automated authors. `label` names the record kind
    /// in logs.
    pub fn apply<T: Authored>(&self, records: Vec<T>, label: &str) -> FilterOutcome<T> {
        let total = records.len();
        let mut outcome = FilterOutcome {
            kept: Vec::with_capacity(total),
            denylisted: 0,
            automated: 0,
        };
        for record in records {
            if self.is_automated(record.author()) {
                outcome.automated += 1;
            } else if self.is_denylisted(record.author()) {
                outcome.denylisted += 1;
            } else {
                outcome.kept.push(record);
            }
        }
        info!(
            records = label,
            total,
            automated = outcome.automated,
            denylisted = outcome.denylisted,
            kept = outcome.kept.len(),
            "Filtered authors"
        );
        outcome
    }
}

/// Keep records whose calendar date falls in `[start, end]`.
#[must_use]
pub fn within_range<T: Authored>(records: Vec<T>, start: NaiveDate, end: NaiveDate) -> Vec<T> {
    let before = records.len();
    let kept: Vec<T> = records
        .into_iter()
        .filter(|record| {
            let day = record.timestamp().date();
            day >= start && day <= end
        })
        .collect();
    debug!(dropped = before - kept.len(), %start, %end, "Applied date range");
    kept
}

/// Group pull requests by (author, date): count, total and mean lines.
#[must_use]
pub fn daily_pr_aggregates(prs: &[PullRequestRecord]) -> Vec<DailyAggregate> {
    let mut groups: BTreeMap<(&str, NaiveDate), (u32, u64)> = BTreeMap::new();
    for pr in prs {
        let entry = groups.entry((pr.author.as_str(), pr.merged_at.date())).or_default();
        entry.0 += 1;
        entry.1 += pr.lines_changed;
    }
    groups
        .into_iter()
        .map(|((author, date), (count, total))| DailyAggregate {
            author: author.to_string(),
            date,
            count,
            total_size: total,
            mean_size: total as f64 / f64::from(count),
        })
        .collect()
}

/// Group review comments by (author, date): count only.
#[must_use]
pub fn daily_comment_aggregates(comments: &[ReviewComment]) -> Vec<DailyAggregate> {
    let mut groups: BTreeMap<(&str, NaiveDate), u32> = BTreeMap::new();
    for comment in comments {
        *groups
            .entry((comment.author.as_str(), comment.created_at.date()))
            .or_default() += 1;
    }
    groups
        .into_iter()
        .map(|((author, date), count)| DailyAggregate {
            count,
            ..DailyAggregate::empty(author, date)
        })
        .collect()
}

/// One row per author × date, author-major; cells without activity are zero.
/// Aggregates for other authors or dates are ignored.
#[must_use]
pub fn gap_fill(
    aggregates: &[DailyAggregate],
    authors: &[String],
    dates: &[NaiveDate],
) -> Vec<DailyAggregate> {
    let index: HashMap<(&str, NaiveDate), &DailyAggregate> = aggregates
        .iter()
        .map(|row| ((row.author.as_str(), row.date), row))
        .collect();

    let mut filled = Vec::with_capacity(authors.len() * dates.len());
    for author in authors {
        for &date in dates {
            filled.push(
                index
                    .get(&(author.as_str(), date))
                    .map_or_else(|| DailyAggregate::empty(author.clone(), date), |row| (*row).clone()),
            );
        }
    }
    filled
}

/// Centered rolling mean.
///
/// The window around index `i` spans `[i - before, i + after]` with
/// `after = (window - 1) / 2` and `before = window - 1 - after`, clipped to
/// the series. Fewer than `min_periods` defined values yield `None`.
#[must_use]
pub fn rolling_mean(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let after = (window - 1) / 2;
    let before = window - 1 - after;
    let min_periods = min_periods.max(1);

    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(values.len().saturating_sub(1));
            let (sum, defined) = values[lo..=hi]
                .iter()
                .flatten()
                .fold((0.0, 0_usize), |(sum, n), value| (sum + value, n + 1));
            (defined >= min_periods).then(|| sum / defined as f64)
        })
        .collect()
}

/// The `n` authors with the most pull requests; ties go to the name that
/// sorts first.
#[must_use]
pub fn top_authors(pr_daily: &[DailyAggregate], n: usize) -> Vec<String> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for row in pr_daily {
        *totals.entry(row.author.as_str()).or_default() += u64::from(row.count);
    }
    let mut ranked: Vec<(&str, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(n)
        .map(|(author, _)| author.to_string())
        .collect()
}

/// Per-author totals for the console summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSummary {
    pub author: String,
    pub pr_count: usize,
    pub total_lines: u64,
    pub avg_lines_per_pr: f64,
    pub comment_count: usize,
}

/// Summary table plus overall totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Authors with at least one pull request, most pull requests first.
    pub authors: Vec<AuthorSummary>,
    pub total_prs: usize,
    pub total_lines: u64,
    pub total_comments: usize,
    /// `None` when there are no pull requests.
    pub avg_lines_per_pr: Option<f64>,
}

/// Summarize pull requests per author, joined with comment counts.
#[must_use]
pub fn summarize(prs: &[PullRequestRecord], comments: &[ReviewComment]) -> SummaryStats {
    let mut per_author: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
    for pr in prs {
        let entry = per_author.entry(pr.author.as_str()).or_default();
        entry.0 += 1;
        entry.1 += pr.lines_changed;
    }
    let mut comment_counts: HashMap<&str, usize> = HashMap::new();
    for comment in comments {
        *comment_counts.entry(comment.author.as_str()).or_default() += 1;
    }

    let mut authors: Vec<AuthorSummary> = per_author
        .into_iter()
        .map(|(author, (pr_count, total_lines))| AuthorSummary {
            author: author.to_string(),
            pr_count,
            total_lines,
            avg_lines_per_pr: total_lines as f64 / pr_count as f64,
            comment_count: comment_counts.get(author).copied().unwrap_or(0),
        })
        .collect();
    authors.sort_by(|a, b| b.pr_count.cmp(&a.pr_count));

    let total_prs = authors.iter().map(|a| a.pr_count).sum();
    let total_lines = authors.iter().map(|a| a.total_lines).sum();
    let total_comments = authors.iter().map(|a| a.comment_count).sum();

    SummaryStats {
        authors,
        total_prs,
        total_lines,
        total_comments,
        avg_lines_per_pr: (total_prs > 0).then(|| total_lines as f64 / total_prs as f64),
    }
}

/// Occurrences of one comment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub comment_type: String,
    pub count: usize,
}

/// Comment counts per type, most frequent first.
#[must_use]
pub fn comment_type_breakdown(comments: &[ReviewComment]) -> Vec<TypeCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for comment in comments {
        *counts.entry(comment.comment_type.as_str()).or_default() += 1;
    }
    let mut breakdown: Vec<TypeCount> = counts
        .into_iter()
        .map(|(comment_type, count)| TypeCount {
            comment_type: comment_type.to_string(),
            count,
        })
        .collect();
    breakdown.sort_by(|a, b| b.count.cmp(&a.count));
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> NaiveDateTime {
        day(d).and_hms_opt(hour, 0, 0).unwrap()
    }

    fn pr(author: &str, d: u32, lines: u64) -> PullRequestRecord {
        PullRequestRecord {
            author: author.to_string(),
            merged_at: at(d, 12),
            number: format!("{author}-{d}-{lines}"),
            lines_changed: lines,
        }
    }

    fn comment(author: &str, d: u32, kind: &str) -> ReviewComment {
        ReviewComment {
            author: author.to_string(),
            created_at: at(d, 9),
            comment_type: kind.to_string(),
            id: format!("{author}-{d}"),
        }
    }

    fn default_filter() -> AuthorFilter {
        AuthorFilter::new(
            &["retired-dev".to_string()],
            &["bot".to_string(), "github-actions".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn bot_comments_are_excluded() {
        let outcome = default_filter().apply(
            vec![
                comment("github-actions[bot]", 2, "review"),
                comment("alice", 2, "review"),
                comment("Dependabot", 3, "issue"),
                comment("retired-dev", 3, "review"),
            ],
            "comments",
        );
        assert_eq!(outcome.automated, 2);
        assert_eq!(outcome.denylisted, 1);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].author, "alice");
    }

    #[test]
    fn denylist_is_exact_match() {
        let filter = default_filter();
        assert!(filter.is_denylisted("retired-dev"));
        assert!(!filter.is_denylisted("retired-dev2"));
        assert!(!filter.is_denylisted("Retired-Dev"));
    }

    #[test]
    fn markers_are_literal() {
        let filter = AuthorFilter::new(&[], &["app/github-actions".to_string(), "a.b".to_string()])
            .unwrap();
        assert!(filter.is_automated("APP/GitHub-Actions"));
        assert!(!filter.is_automated("axb"));
        assert!(!AuthorFilter::new(&[], &[]).unwrap().is_automated("bot"));
    }

    #[test]
    fn pr_aggregates_group_by_author_and_day() {
        let prs = vec![pr("alice", 2, 10), pr("alice", 2, 30), pr("alice", 3, 5), pr("bob", 2, 1)];
        let daily = daily_pr_aggregates(&prs);
        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].author, "alice");
        assert_eq!(daily[0].date, day(2));
        assert_eq!(daily[0].count, 2);
        assert_eq!(daily[0].total_size, 40);
        assert!((daily[0].mean_size - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gap_fill_covers_every_day() {
        let daily = daily_pr_aggregates(&[pr("alice", 2, 10)]);
        let dates = crate::util::date_range(day(1), day(3));
        let filled = gap_fill(&daily, &["alice".to_string()], &dates);

        let counts: Vec<(NaiveDate, u32)> = filled.iter().map(|row| (row.date, row.count)).collect();
        assert_eq!(counts, vec![(day(1), 0), (day(2), 1), (day(3), 0)]);
    }

    #[test]
    fn gap_fill_cardinality_and_out_of_range() {
        let daily = daily_pr_aggregates(&[pr("alice", 9, 10), pr("carol", 2, 3)]);
        let authors = vec!["alice".to_string(), "bob".to_string()];
        let dates = crate::util::date_range(day(1), day(4));
        let filled = gap_fill(&daily, &authors, &dates);
        assert_eq!(filled.len(), authors.len() * dates.len());
        assert!(filled.iter().all(|row| row.count == 0));
    }

    #[test]
    fn rolling_mean_window_bounds() {
        let values: Vec<Option<f64>> = (0..20).map(|i| Some(f64::from(i))).collect();
        let smoothed = rolling_mean(&values, 14, 3);
        // i=10 spans 3..=16.
        assert_eq!(smoothed[10], Some(9.5));
        // i=0 spans 0..=6.
        assert_eq!(smoothed[0], Some(3.0));

        let smoothed = rolling_mean(&values, 21, 3);
        // i=10 spans 0..=19 (clipped from 0..=20).
        assert_eq!(smoothed[10], Some(9.5));
    }

    #[test]
    fn rolling_mean_needs_min_periods() {
        assert_eq!(rolling_mean(&[Some(1.0), Some(2.0)], 14, 3), vec![None, None]);
        let sparse = [None, Some(4.0), None, None, Some(2.0), Some(6.0)];
        let smoothed = rolling_mean(&sparse, 3, 2);
        assert_eq!(smoothed[0], None);
        assert_eq!(smoothed[4], Some(4.0));
        assert!(rolling_mean(&[], 5, 3).is_empty());
    }

    #[test]
    fn top_authors_rank_by_pr_count() {
        let daily = daily_pr_aggregates(&[
            pr("alice", 1, 1),
            pr("bob", 1, 1),
            pr("bob", 2, 1),
            pr("carol", 1, 1),
        ]);
        assert_eq!(top_authors(&daily, 2), vec!["bob", "alice"]);
        assert_eq!(top_authors(&daily, 10).len(), 3);
    }

    #[test]
    fn summary_totals_and_order() {
        let prs = vec![pr("alice", 1, 10), pr("bob", 1, 20), pr("bob", 2, 40)];
        let comments = vec![comment("bob", 1, "review"), comment("zed", 1, "review")];
        let summary = summarize(&prs, &comments);

        assert_eq!(summary.authors[0].author, "bob");
        assert_eq!(summary.authors[0].pr_count, 2);
        assert!((summary.authors[0].avg_lines_per_pr - 30.0).abs() < f64::EPSILON);
        assert_eq!(summary.authors[0].comment_count, 1);
        assert_eq!(summary.total_prs, 3);
        assert_eq!(summary.total_lines, 70);
        assert_eq!(summary.total_comments, 1, "comment-only authors are not listed");
        assert!((summary.avg_lines_per_pr.unwrap() - 70.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_has_no_average() {
        let summary = summarize(&[], &[]);
        assert!(summary.authors.is_empty());
        assert_eq!(summary.avg_lines_per_pr, None);
    }

    #[test]
    fn breakdown_counts_types() {
        let breakdown = comment_type_breakdown(&[
            comment("a", 1, "review"),
            comment("b", 1, "issue"),
            comment("c", 1, "review"),
        ]);
        assert_eq!(breakdown[0].comment_type, "review");
        assert_eq!(breakdown[0].count, 2);
        assert_eq!(breakdown[1].comment_type, "issue");
    }

    #[test]
    fn range_filter_is_inclusive() {
        let kept = within_range(vec![pr("a", 1, 1), pr("a", 2, 1), pr("a", 4, 1)], day(1), day(2));
        assert_eq!(kept.len(), 2);
    }
}
