//! Static SVG rendering of the combined developer report.
//!
//! One row per developer, three panels per row (PRs per day, comments per
//! day, mean lines per PR). Every panel overlays the dashed team average on
//! the developer's smoothed series. Undefined smoothed values break the
//! line instead of being drawn as zero.

use crate::aggregate::{DeveloperReport, DeveloperTrend};
use crate::error::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the combined report inside the output directory.
pub const REPORT_FILE: &str = "combined_developer_productivity_report.svg";

const PANEL_WIDTH: f64 = 520.0;
const PANEL_HEIGHT: f64 = 260.0;
const PANEL_GAP: f64 = 30.0;
const HEADER_HEIGHT: f64 = 90.0;
const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 34.0;
const MARGIN_BOTTOM: f64 = 48.0;
const TICK_EVERY_DAYS: usize = 14;
const GRID_LINES: usize = 4;

const TEAM_COLOR: &str = "#808080";
const PR_COLOR: &str = "#1f77b4";
const COMMENT_COLOR: &str = "#ff7f0e";
const LINES_COLOR: &str = "#2ca02c";

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// One plotted line: `(day index, value)` pairs in day order.
struct Series<'a> {
    label: &'a str,
    color: &'static str,
    dashed: bool,
    points: Vec<(usize, Option<f64>)>,
}

impl<'a> Series<'a> {
    fn full(label: &'a str, color: &'static str, dashed: bool, values: &[Option<f64>]) -> Self {
        Self {
            label,
            color,
            dashed,
            points: values.iter().copied().enumerate().collect(),
        }
    }

    /// Keep only the days where `keep(day)` holds.
    fn masked(mut self, keep: impl Fn(usize) -> bool) -> Self {
        self.points.retain(|&(day, _)| keep(day));
        self
    }

    fn max(&self) -> Option<f64> {
        self.points
            .iter()
            .filter_map(|&(_, value)| value)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

enum PanelBody<'a> {
    Lines(Vec<Series<'a>>),
    Placeholder(&'static str),
}

struct Panel<'a> {
    title: String,
    y_label: &'static str,
    body: PanelBody<'a>,
    caption: Option<String>,
}

/// Pixel geometry of one panel's plot area.
#[derive(Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    days: usize,
    y_max: f64,
}

impl Frame {
    fn x_of(&self, day: usize) -> f64 {
        if self.days <= 1 {
            return self.x + self.width / 2.0;
        }
        self.x + self.width * day as f64 / (self.days - 1) as f64
    }

    fn y_of(&self, value: f64) -> f64 {
        self.y + self.height - self.height * (value / self.y_max).clamp(0.0, 1.0)
    }
}

fn nice_max(max: Option<f64>) -> f64 {
    match max {
        Some(value) if value > 0.0 => value * 1.1,
        _ => 1.0,
    }
}

fn axis_label(value: f64, y_max: f64) -> String {
    if y_max < 10.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.0}")
    }
}

fn path_data(series: &Series<'_>, frame: &Frame) -> String {
    let mut data = String::new();
    let mut pen_down = false;
    for &(day, value) in &series.points {
        match value {
            Some(v) => {
                let command = if pen_down { 'L' } else { 'M' };
                data.push_str(&format!(
                    "{command}{:.1},{:.1} ",
                    frame.x_of(day),
                    frame.y_of(v)
                ));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    data.trim_end().to_string()
}

fn render_axes(svg: &mut String, frame: &Frame, dates: &[NaiveDate], y_label: &str) {
    for step in 0..=GRID_LINES {
        let value = frame.y_max * step as f64 / GRID_LINES as f64;
        let y = frame.y_of(value);
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#e0e0e0\"/>\n",
            frame.x,
            frame.x + frame.width
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" text-anchor=\"end\">{}</text>\n",
            frame.x - 6.0,
            y + 3.0,
            axis_label(value, frame.y_max)
        ));
    }

    for (day, date) in dates.iter().enumerate().step_by(TICK_EVERY_DAYS) {
        let x = frame.x_of(day);
        let y = frame.y + frame.height;
        svg.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"{y:.1}\" x2=\"{x:.1}\" y2=\"{:.1}\" stroke=\"#333\"/>\n",
            y + 4.0
        ));
        svg.push_str(&format!(
            "<text x=\"{x:.1}\" y=\"{:.1}\" font-size=\"10\" text-anchor=\"end\" \
             transform=\"rotate(-45 {x:.1} {:.1})\">{}</text>\n",
            y + 14.0,
            y + 14.0,
            date.format("%m/%d")
        ));
    }

    svg.push_str(&format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"none\" stroke=\"#333\"/>\n",
        frame.x, frame.y, frame.width, frame.height
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"middle\" \
         transform=\"rotate(-90 {:.1} {:.1})\">{}</text>\n",
        frame.x - 42.0,
        frame.y + frame.height / 2.0,
        frame.x - 42.0,
        frame.y + frame.height / 2.0,
        y_label
    ));
}

fn render_legend(svg: &mut String, frame: &Frame, series: &[Series<'_>]) {
    let mut y = frame.y + 14.0;
    let x = frame.x + frame.width - 150.0;
    for line in series {
        let dash = if line.dashed {
            " stroke-dasharray=\"6 4\""
        } else {
            ""
        };
        svg.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"{}\" stroke-width=\"2\"{dash}/>\n",
            x + 20.0,
            line.color
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\">{}</text>\n",
            x + 26.0,
            y + 3.0,
            escape_xml(line.label)
        ));
        y += 14.0;
    }
}

fn render_panel(svg: &mut String, panel: &Panel<'_>, origin: (f64, f64), dates: &[NaiveDate]) {
    let (left, top) = origin;
    let y_max = match &panel.body {
        PanelBody::Lines(series) => nice_max(
            series
                .iter()
                .filter_map(Series::max)
                .reduce(f64::max),
        ),
        PanelBody::Placeholder(_) => 1.0,
    };
    let frame = Frame {
        x: left + MARGIN_LEFT,
        y: top + MARGIN_TOP,
        width: PANEL_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
        height: PANEL_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
        days: dates.len(),
        y_max,
    };

    svg.push_str("<g>\n");
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"14\" font-weight=\"bold\" text-anchor=\"middle\">{}</text>\n",
        left + PANEL_WIDTH / 2.0,
        top + 20.0,
        escape_xml(&panel.title)
    ));
    render_axes(svg, &frame, dates, panel.y_label);

    match &panel.body {
        PanelBody::Lines(series) => {
            for line in series {
                let data = path_data(line, &frame);
                if data.is_empty() {
                    continue;
                }
                let dash = if line.dashed {
                    " stroke-dasharray=\"6 4\" stroke-opacity=\"0.7\""
                } else {
                    ""
                };
                svg.push_str(&format!(
                    "<path d=\"{data}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"{dash}/>\n",
                    line.color
                ));
            }
            render_legend(svg, &frame, series);
        }
        PanelBody::Placeholder(message) => {
            let cx = frame.x + frame.width / 2.0;
            let cy = frame.y + frame.height / 2.0;
            svg.push_str(&format!(
                "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"150\" height=\"28\" rx=\"6\" fill=\"#d3d3d3\"/>\n",
                cx - 75.0,
                cy - 14.0
            ));
            svg.push_str(&format!(
                "<text x=\"{cx:.1}\" y=\"{:.1}\" font-size=\"12\" text-anchor=\"middle\">{message}</text>\n",
                cy + 4.0
            ));
        }
    }

    if let Some(caption) = &panel.caption {
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"20\" rx=\"4\" fill=\"white\" fill-opacity=\"0.8\" stroke=\"#ccc\"/>\n",
            frame.x + 6.0,
            frame.y + 6.0,
            7.0 * caption.chars().count() as f64 + 12.0
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\">{}</text>\n",
            frame.x + 12.0,
            frame.y + 20.0,
            escape_xml(caption)
        ));
    }
    svg.push_str("</g>\n");
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.0}"))
}

fn developer_panels<'a>(report: &'a DeveloperReport, dev: &'a DeveloperTrend) -> [Panel<'a>; 3] {
    let team = &report.team;

    let prs = Panel {
        title: format!("{} - PRs per Day", dev.author),
        y_label: "PRs per Day",
        body: PanelBody::Lines(vec![
            Series::full("Team Avg", TEAM_COLOR, true, &team.pr_count_ma),
            Series::full(&dev.author, PR_COLOR, false, &dev.pr_count_ma),
        ]),
        caption: Some(format!(
            "Total: {} (Avg: {:.1})",
            dev.total_prs, team.avg_prs_per_author
        )),
    };

    let comments = Panel {
        title: format!("{} - Comments per Day", dev.author),
        y_label: "Comments per Day",
        body: match (&team.comment_count_ma, &dev.comment_count_ma) {
            (Some(team_ma), Some(dev_ma)) if report.has_comments => PanelBody::Lines(vec![
                Series::full("Team Avg", TEAM_COLOR, true, team_ma),
                Series::full(&dev.author, COMMENT_COLOR, false, dev_ma),
            ]),
            _ => PanelBody::Placeholder("No human comments"),
        },
        caption: None,
    };

    let lines = Panel {
        title: format!("{} - Avg Lines per PR", dev.author),
        y_label: "Lines per PR",
        body: PanelBody::Lines(vec![
            Series::full("Team Avg", TEAM_COLOR, true, &team.lines_ma)
                .masked(|day| team.pr_count.get(day).is_some_and(|&n| n > 0.0)),
            Series::full(&dev.author, LINES_COLOR, false, &dev.lines_ma)
                .masked(|day| dev.pr_count.get(day).is_some_and(|&n| n > 0)),
        ]),
        caption: Some(format!(
            "Avg: {} (Team: {})",
            format_optional(dev.avg_lines_per_pr),
            format_optional(team.avg_lines_per_pr)
        )),
    };

    [prs, comments, lines]
}

fn render_header(svg: &mut String, report: &DeveloperReport, width: f64) {
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"36\" font-size=\"22\" font-weight=\"bold\" text-anchor=\"middle\">\
         Developer Productivity Report - All Developers</text>\n",
        width / 2.0
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"64\" font-size=\"15\" text-anchor=\"middle\">\
         {} to {} vs Team Average (Daily Trends with Smoothing)</text>\n",
        width / 2.0,
        report.start,
        report.end
    ));
}

fn no_data_document(report: &DeveloperReport) -> String {
    let width = 3.0 * PANEL_WIDTH + 4.0 * PANEL_GAP;
    let height = HEADER_HEIGHT + PANEL_HEIGHT;
    let mut svg = open_document(width, height);
    render_header(&mut svg, report, width);
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"18\" text-anchor=\"middle\" fill=\"#666\">No data</text>\n",
        width / 2.0,
        HEADER_HEIGHT + PANEL_HEIGHT / 2.0
    ));
    svg.push_str("</svg>\n");
    svg
}

fn open_document(width: f64, height: f64) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" \
         viewBox=\"0 0 {width:.0} {height:.0}\" font-family=\"sans-serif\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n"
    )
}

/// Render the whole report as an SVG document.
#[must_use]
pub fn render_report(report: &DeveloperReport) -> String {
    if report.is_empty() {
        return no_data_document(report);
    }

    let rows = report.developers.len();
    let width = 3.0 * PANEL_WIDTH + 4.0 * PANEL_GAP;
    let height = HEADER_HEIGHT + rows as f64 * (PANEL_HEIGHT + PANEL_GAP);
    let mut svg = open_document(width, height);
    render_header(&mut svg, report, width);

    for (row, dev) in report.developers.iter().enumerate() {
        debug!(author = %dev.author, row, "Rendering developer row");
        let top = HEADER_HEIGHT + row as f64 * (PANEL_HEIGHT + PANEL_GAP);
        for (col, panel) in developer_panels(report, dev).iter().enumerate() {
            let left = PANEL_GAP + col as f64 * (PANEL_WIDTH + PANEL_GAP);
            render_panel(&mut svg, panel, (left, top), &report.dates);
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Write the combined report into `out_dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub fn write_report(report: &DeveloperReport, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(REPORT_FILE);
    fs::write(&path, render_report(report))?;
    info!(path = %path.display(), developers = report.developers.len(), "Combined report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{FilterCounts, SummaryStats, TeamTrend};
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn report(developers: Vec<DeveloperTrend>, has_comments: bool) -> DeveloperReport {
        let dates: Vec<NaiveDate> = (1..=5).map(day).collect();
        DeveloperReport {
            start: day(1),
            end: day(5),
            team: TeamTrend {
                pr_count: vec![1.0, 0.0, 1.0, 0.0, 1.0],
                pr_count_ma: vec![None, Some(0.5), Some(0.6), Some(0.5), None],
                lines_ma: vec![None, Some(10.0), Some(12.0), Some(9.0), None],
                comment_count_ma: has_comments.then(|| vec![Some(1.0); 5]),
                avg_prs_per_author: 3.0,
                avg_lines_per_pr: Some(11.0),
            },
            dates,
            developers,
            has_comments,
            summary: SummaryStats::default(),
            comment_types: Vec::new(),
            filtered: FilterCounts::default(),
        }
    }

    fn developer(name: &str, has_comments: bool) -> DeveloperTrend {
        DeveloperTrend {
            author: name.to_string(),
            pr_count: vec![1, 0, 1, 0, 1],
            pr_count_ma: vec![None, Some(0.6), Some(0.6), Some(0.6), None],
            lines_ma: vec![None, Some(20.0), Some(20.0), Some(20.0), None],
            comment_count_ma: has_comments.then(|| vec![Some(2.0); 5]),
            total_prs: 3,
            avg_lines_per_pr: Some(20.0),
        }
    }

    #[test]
    fn empty_report_renders_no_data() {
        let svg = render_report(&report(Vec::new(), false));
        assert!(svg.contains("No data"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn one_row_of_three_panels_per_developer() {
        let svg = render_report(&report(
            vec![developer("alice", true), developer("bob", true)],
            true,
        ));
        assert_eq!(svg.matches("<g>").count(), 6);
        assert!(svg.contains("alice - PRs per Day"));
        assert!(svg.contains("bob - Avg Lines per PR"));
        assert!(svg.contains("Total: 3 (Avg: 3.0)"));
        assert!(svg.contains("Avg: 20 (Team: 11)"));
        assert!(svg.contains("stroke-dasharray"));
        assert!(!svg.contains("No human comments"));
    }

    #[test]
    fn missing_comments_render_placeholder() {
        let svg = render_report(&report(vec![developer("alice", false)], false));
        assert!(svg.contains("No human comments"));
    }

    #[test]
    fn author_names_are_escaped() {
        let svg = render_report(&report(vec![developer("a<b>&c", false)], false));
        assert!(svg.contains("a&lt;b&gt;&amp;c - PRs per Day"));
        assert!(!svg.contains("a<b>"));
    }

    #[test]
    fn undefined_values_break_the_line() {
        let frame = Frame {
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 10.0,
            days: 5,
            y_max: 1.0,
        };
        let values = [Some(0.5), Some(0.5), None, Some(0.5), Some(0.5)];
        let series = Series::full("x", PR_COLOR, false, &values);
        let data = path_data(&series, &frame);
        assert_eq!(data.matches('M').count(), 2);
        assert_eq!(data.matches('L').count(), 2);
    }

    #[test]
    fn lines_series_masks_days_without_prs() {
        let values = [Some(1.0), Some(2.0), Some(3.0)];
        let counts = [1_u32, 0, 2];
        let series = Series::full("x", LINES_COLOR, false, &values)
            .masked(|day| counts[day] > 0);
        assert_eq!(series.points, vec![(0, Some(1.0)), (2, Some(3.0))]);
    }

    #[test]
    fn x_ticks_every_two_weeks() {
        let mut r = report(vec![developer("alice", false)], false);
        r.dates = (0..30)
            .map(|offset| day(1) + chrono::Duration::days(offset))
            .collect();
        for dev in &mut r.developers {
            dev.pr_count = vec![0; 30];
            dev.pr_count_ma = vec![Some(1.0); 30];
            dev.lines_ma = vec![None; 30];
        }
        let svg = render_report(&r);
        assert!(svg.contains(">01/01</text>"));
        assert!(svg.contains(">01/15</text>"));
        assert!(svg.contains(">01/29</text>"));
        assert!(!svg.contains(">01/08</text>"));
    }

    #[test]
    fn write_report_creates_directory() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("reports");
        let path = write_report(&report(Vec::new(), false), &out).unwrap();
        assert_eq!(path, out.join(REPORT_FILE));
        assert!(path.exists());
    }
}
