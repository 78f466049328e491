use crate::aggregate::{FilterCounts, SummaryStats, TypeCount};
use crate::extract::{ExtractStats, WeeklyRollup};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

/// Result of `engage tickets` for JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct TicketExport {
    pub source: String,
    pub output: PathBuf,
    pub columns: Vec<&'static str>,
    pub stats: ExtractStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly: Option<Vec<WeeklyRollup>>,
}

/// Result of `engage report` for JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<PathBuf>,
    pub developers: Vec<&'a str>,
    pub summary: &'a SummaryStats,
    #[serde(skip_serializing_if = "is_empty")]
    pub comment_types: &'a [TypeCount],
    pub filtered: FilterCounts,
    #[serde(skip_serializing_if = "is_empty")]
    pub denylist: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_output_omits_empty_sections() {
        let summary = SummaryStats::default();
        let output = ReportOutput {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            chart: None,
            developers: vec!["alice"],
            summary: &summary,
            comment_types: &[],
            filtered: FilterCounts::default(),
            denylist: &[],
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["start"], json!("2025-01-01"));
        assert_eq!(value["developers"], json!(["alice"]));
        assert!(value.get("chart").is_none());
        assert!(value.get("comment_types").is_none());
        assert!(value.get("denylist").is_none());
    }

    #[test]
    fn ticket_export_serializes_weekly_when_present() {
        let export = TicketExport {
            source: "file issues.json".into(),
            output: PathBuf::from("jira_tickets.csv"),
            columns: vec!["key"],
            stats: ExtractStats::default(),
            weekly: Some(vec![WeeklyRollup {
                week: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
                created: 2,
                resolved: 1,
            }]),
        };
        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["weekly"][0]["created"], json!(2));
        assert_eq!(value["columns"], json!(["key"]));
    }
}
