//! Chart-ready developer trends.
//!
//! Builds everything the combined report needs from filtered records: the
//! selected developers, their gap-filled and smoothed daily series, the team
//! average series, caption statistics and the console summary.

use super::{
    AuthorFilter, SummaryStats, TypeCount, comment_type_breakdown, daily_comment_aggregates,
    daily_pr_aggregates, gap_fill, rolling_mean, summarize, top_authors, within_range,
};
use crate::ingest::Loaded;
use crate::model::{DailyAggregate, PullRequestRecord, ReviewComment};
use crate::util::date_range;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Knobs for trend assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub top_n: usize,
    pub team_window: usize,
    pub developer_window: usize,
    pub min_periods: usize,
}

/// How many input rows were dropped and why.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub malformed_prs: usize,
    pub malformed_comments: usize,
    pub automated_prs: usize,
    pub automated_comments: usize,
    pub denylisted_prs: usize,
    pub denylisted_comments: usize,
    pub out_of_range_prs: usize,
    pub out_of_range_comments: usize,
}

/// One selected developer's series, aligned with [`DeveloperReport::dates`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperTrend {
    pub author: String,
    /// Gap-filled daily pull request counts.
    pub pr_count: Vec<u32>,
    pub pr_count_ma: Vec<Option<f64>>,
    pub lines_ma: Vec<Option<f64>>,
    /// `None` when no human comments survived filtering.
    pub comment_count_ma: Option<Vec<Option<f64>>>,
    pub total_prs: u64,
    /// Mean of this developer's daily mean lines, over days with merges.
    pub avg_lines_per_pr: Option<f64>,
}

/// Team-average series across the selected developers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamTrend {
    /// Mean daily pull request count across developers.
    pub pr_count: Vec<f64>,
    pub pr_count_ma: Vec<Option<f64>>,
    pub lines_ma: Vec<Option<f64>>,
    pub comment_count_ma: Option<Vec<Option<f64>>>,
    /// Mean of per-author pull request totals, over every remaining author.
    pub avg_prs_per_author: f64,
    /// Mean of daily mean lines over every (author, day) with merges.
    pub avg_lines_per_pr: Option<f64>,
}

/// Everything the reporter renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub developers: Vec<DeveloperTrend>,
    pub team: TeamTrend,
    pub has_comments: bool,
    pub summary: SummaryStats,
    pub comment_types: Vec<TypeCount>,
    pub filtered: FilterCounts,
}

impl DeveloperReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.developers.is_empty()
    }
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, n), value| (sum + value, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Split author-major gap-filled rows into one slice per author.
fn per_author<'a>(
    filled: &'a [DailyAggregate],
    days: usize,
) -> impl Iterator<Item = &'a [DailyAggregate]> {
    filled.chunks(days.max(1))
}

/// Column-wise mean of per-author series.
fn team_mean(filled: &[DailyAggregate], days: usize, value: fn(&DailyAggregate) -> f64) -> Vec<f64> {
    let authors = if days == 0 { 0 } else { filled.len() / days };
    if authors == 0 {
        return Vec::new();
    }
    (0..days)
        .map(|day| {
            let total: f64 = (0..authors).map(|a| value(&filled[a * days + day])).sum();
            total / authors as f64
        })
        .collect()
}

fn count(row: &DailyAggregate) -> f64 {
    f64::from(row.count)
}

fn mean_size(row: &DailyAggregate) -> f64 {
    row.mean_size
}

fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

/// Filter, aggregate, gap-fill and smooth into a [`DeveloperReport`].
#[must_use]
pub fn build_report(
    prs: Loaded<PullRequestRecord>,
    comments: Loaded<ReviewComment>,
    filter: &AuthorFilter,
    options: &TrendOptions,
) -> DeveloperReport {
    let mut filtered = FilterCounts {
        malformed_prs: prs.malformed,
        malformed_comments: comments.malformed,
        ..FilterCounts::default()
    };

    let pr_outcome = filter.apply(prs.records, "pull requests");
    filtered.automated_prs = pr_outcome.automated;
    filtered.denylisted_prs = pr_outcome.denylisted;
    let total = pr_outcome.kept.len();
    let prs = within_range(pr_outcome.kept, options.start, options.end);
    filtered.out_of_range_prs = total - prs.len();

    let comment_outcome = filter.apply(comments.records, "comments");
    filtered.automated_comments = comment_outcome.automated;
    filtered.denylisted_comments = comment_outcome.denylisted;
    let total = comment_outcome.kept.len();
    let comments = within_range(comment_outcome.kept, options.start, options.end);
    filtered.out_of_range_comments = total - comments.len();

    let has_comments = !comments.is_empty();
    if !has_comments {
        warn!("No human comments found after filtering");
    }

    let dates = date_range(options.start, options.end);
    let days = dates.len();
    let pr_daily = daily_pr_aggregates(&prs);
    let comment_daily = daily_comment_aggregates(&comments);
    let authors = top_authors(&pr_daily, options.top_n);
    info!(developers = authors.len(), days, "Building developer trends");

    let pr_filled = gap_fill(&pr_daily, &authors, &dates);
    let comment_filled = has_comments.then(|| gap_fill(&comment_daily, &authors, &dates));

    let smooth = |values: &[f64], window: usize| {
        rolling_mean(&defined(values), window, options.min_periods)
    };

    let team_pr_count = team_mean(&pr_filled, days, count);
    let team = TeamTrend {
        pr_count_ma: smooth(&team_pr_count, options.team_window),
        lines_ma: smooth(&team_mean(&pr_filled, days, mean_size), options.team_window),
        comment_count_ma: comment_filled
            .as_deref()
            .map(|filled| smooth(&team_mean(filled, days, count), options.team_window)),
        pr_count: team_pr_count,
        avg_prs_per_author: author_totals_mean(&pr_daily),
        avg_lines_per_pr: mean(pr_daily.iter().map(|row| row.mean_size)),
    };

    let mut comment_rows = comment_filled.as_deref().map(|filled| per_author(filled, days));
    let developers = authors
        .iter()
        .zip(per_author(&pr_filled, days))
        .map(|(author, rows)| {
            let counts: Vec<f64> = rows.iter().map(count).collect();
            let lines: Vec<f64> = rows.iter().map(mean_size).collect();
            let comment_count_ma = comment_rows.as_mut().and_then(|chunks| chunks.next()).map(|rows| {
                let counts: Vec<f64> = rows.iter().map(count).collect();
                smooth(&counts, options.developer_window)
            });
            let own_days = pr_daily.iter().filter(|row| &row.author == author);
            DeveloperTrend {
                author: author.clone(),
                pr_count: rows.iter().map(|row| row.count).collect(),
                pr_count_ma: smooth(&counts, options.developer_window),
                lines_ma: smooth(&lines, options.developer_window),
                comment_count_ma,
                total_prs: own_days.clone().map(|row| u64::from(row.count)).sum(),
                avg_lines_per_pr: mean(own_days.map(|row| row.mean_size)),
            }
        })
        .collect();

    DeveloperReport {
        start: options.start,
        end: options.end,
        dates,
        developers,
        team,
        has_comments,
        summary: summarize(&prs, &comments),
        comment_types: comment_type_breakdown(&comments),
        filtered,
    }
}

fn author_totals_mean(pr_daily: &[DailyAggregate]) -> f64 {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for row in pr_daily {
        *totals.entry(row.author.as_str()).or_default() += u64::from(row.count);
    }
    mean(totals.values().map(|&total| total as f64)).unwrap_or(0.0)
}
