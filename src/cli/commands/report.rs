//! Report command implementation.
//!
//! Loads the pull request and comment exports, filters automated and
//! denylisted authors, builds the smoothed per-developer trends and writes
//! the combined SVG report followed by a console summary.

use crate::aggregate::{AuthorFilter, DeveloperReport, TrendOptions, build_report};
use crate::chart;
use crate::cli::ReportArgs;
use crate::config::{self, CliOverrides, ReportSettings};
use crate::error::Result;
use crate::format::ReportOutput;
use crate::ingest::{self, require_file};
use crate::output::{OutputContext, StatsPanel, SummaryTable};
use std::path::{Path, PathBuf};
use tracing::info;

const PR_HINT: &str = "Export merged pull requests first (github_pr_stats.sh)";
const COMMENT_HINT: &str = "Export pull request comments first (github_pr_comments.sh)";

/// Execute the report command.
///
/// # Errors
///
/// Returns an error if an input file is missing or malformed, settings are
/// invalid, or the chart cannot be written.
pub fn execute(
    args: &ReportArgs,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    ctx: &OutputContext,
) -> Result<()> {
    let layer = config::load_config(config_path, overrides)?;
    let settings = ReportSettings::from_layer(&layer)?;

    // Both inputs must exist before anything is read or written.
    require_file(&settings.prs, PR_HINT)?;
    require_file(&settings.comments, COMMENT_HINT)?;

    let filter = AuthorFilter::new(&settings.denylist, &settings.bot_markers)?;
    let prs = ingest::load_pull_requests(&settings.prs)?;
    let comments = ingest::load_comments(&settings.comments)?;

    let options = TrendOptions {
        start: settings.start,
        end: settings.end,
        top_n: settings.top_n,
        team_window: settings.team_window,
        developer_window: settings.developer_window,
        min_periods: settings.min_periods,
    };
    info!(start = %options.start, end = %options.end, "Generating developer report");
    let report = build_report(prs, comments, &filter, &options);

    let chart = if args.no_chart {
        None
    } else {
        Some(chart::write_report(&report, &settings.output_dir)?)
    };

    if ctx.is_json() {
        ctx.json_pretty(&ReportOutput {
            start: report.start,
            end: report.end,
            chart,
            developers: report
                .developers
                .iter()
                .map(|dev| dev.author.as_str())
                .collect(),
            summary: &report.summary,
            comment_types: &report.comment_types,
            filtered: report.filtered,
            denylist: &settings.denylist,
        });
        return Ok(());
    }

    print_summary(ctx, &report, &settings, chart.as_ref());
    Ok(())
}

fn print_summary(
    ctx: &OutputContext,
    report: &DeveloperReport,
    settings: &ReportSettings,
    chart: Option<&PathBuf>,
) {
    let title = format!(
        "DEVELOPER PRODUCTIVITY SUMMARY {} to {}",
        report.start, report.end
    );
    let table = SummaryTable::new(&report.summary, ctx.theme()).title(title);
    let filtered = StatsPanel::filtered(&report.filtered, ctx.theme());

    if ctx.is_rich() {
        ctx.render(&table.build());
        if !filtered.is_empty() {
            ctx.render(&filtered.build());
        }
    } else {
        for line in table.plain_lines() {
            ctx.print(&line);
        }
        if !filtered.is_empty() {
            ctx.newline();
            for line in filtered.plain_lines() {
                ctx.print(&line);
            }
        }
    }

    ctx.newline();
    match report.summary.avg_lines_per_pr {
        Some(avg) => ctx.info(&format!(
            "Average lines per PR across all developers: {avg:.0}"
        )),
        None => ctx.info("No pull requests in range"),
    }
    if !report.comment_types.is_empty() {
        let types = report
            .comment_types
            .iter()
            .map(|t| format!("{}: {}", t.comment_type, t.count))
            .collect::<Vec<_>>()
            .join(", ");
        ctx.info(&format!("Comment types: {types}"));
    }
    if !settings.denylist.is_empty() {
        ctx.info(&format!(
            "Note: former team members ({}) excluded from analysis",
            settings.denylist.join(", ")
        ));
    }

    match chart {
        Some(path) => ctx.success(&format!("Combined report saved as {}", path.display())),
        None => ctx.info("Chart skipped (--no-chart)"),
    }
}
