//! CSV reading and writing for `engage_report`.
//!
//! Writes the flat ticket export and reads code-host exports. Fields
//! containing commas, quotes, or newlines are quoted with doubled inner
//! quotes, and the reader accepts the same (including newlines inside
//! quoted fields).

use crate::error::{ReportError, Result};
use crate::model::Ticket;
use chrono::{NaiveDate, NaiveDateTime};
use std::io::{self, Write};

/// Default fields for ticket export: every column.
pub const ALL_FIELDS: &[&str] = &[
    "key",
    "summary",
    "assignee",
    "status",
    "status_category",
    "story_points",
    "resolution",
    "created",
    "created_week",
    "pm_backlog_date",
    "eng_backlog_date",
    "development_date",
    "validation_date",
    "done_date",
    "release_date",
    "release_version",
    "resolution_date",
    "resolution_week",
    "issue_type",
    "incident_count",
    "category",
    "defect_category",
    "parent_story",
    "parent_story_name",
    "parent_epic",
    "parent_epic_name",
    "parent_initiative",
    "parent_initiative_name",
    "parent_theme",
];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Escape a CSV field value.
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
/// Doubles any existing quotes within the value.
#[must_use]
pub fn escape_field(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

fn datetime(value: Option<NaiveDateTime>) -> String {
    value.map_or_else(String::new, |dt| dt.format(DATETIME_FORMAT).to_string())
}

fn date(value: Option<NaiveDate>) -> String {
    value.map_or_else(String::new, |d| d.format(DATE_FORMAT).to_string())
}

fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

/// Get a field value from a ticket by field name.
#[must_use]
pub fn get_field_value(ticket: &Ticket, field: &str) -> String {
    let links = &ticket.links;
    match field {
        "key" => ticket.key.clone(),
        "summary" => ticket.summary.clone(),
        "assignee" => text(ticket.assignee.as_ref()),
        "status" => ticket.status.clone(),
        "status_category" => ticket.status_category_label().to_string(),
        "story_points" => ticket
            .story_points
            .map_or_else(String::new, |points| points.to_string()),
        "resolution" => text(ticket.resolution.as_ref()),
        "created" => datetime(Some(ticket.created)),
        "created_week" => date(Some(ticket.created_week)),
        "pm_backlog_date" => datetime(ticket.phases.pm_backlog),
        "eng_backlog_date" => datetime(ticket.phases.eng_backlog),
        "development_date" => datetime(ticket.phases.development),
        "validation_date" => datetime(ticket.phases.validation),
        "done_date" => datetime(ticket.phases.done),
        "release_date" => date(ticket.release_date),
        "release_version" => text(ticket.release_version.as_ref()),
        "resolution_date" => datetime(ticket.resolution_date),
        "resolution_week" => date(ticket.resolution_week),
        "issue_type" => ticket.issue_type.clone(),
        "incident_count" => ticket.incident_count.to_string(),
        "category" => ticket.category_label().to_string(),
        "defect_category" => ticket.defect_category.clone(),
        "parent_story" => text(links.parent_story.as_ref()),
        "parent_story_name" => text(links.parent_story_name.as_ref()),
        "parent_epic" => text(links.parent_epic.as_ref()),
        "parent_epic_name" => text(links.parent_epic_name.as_ref()),
        "parent_initiative" => text(links.parent_initiative.as_ref()),
        "parent_initiative_name" => text(links.parent_initiative_name.as_ref()),
        "parent_theme" => text(links.parent_theme.as_ref()),
        _ => String::new(),
    }
}

/// Parse a comma-separated list of field names.
///
/// Returns every field if the input is empty; unknown names are dropped.
#[must_use]
pub fn parse_fields(fields_arg: Option<&str>) -> Vec<&'static str> {
    match fields_arg {
        Some(arg) if !arg.trim().is_empty() => arg
            .split(',')
            .map(str::trim)
            .filter_map(|f| ALL_FIELDS.iter().find(|&&af| af == f).copied())
            .collect(),
        _ => ALL_FIELDS.to_vec(),
    }
}

/// Write CSV header row to the given writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_header<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    let header = fields.join(",");
    writeln!(writer, "{header}")
}

/// Format a single ticket as a CSV row.
#[must_use]
pub fn format_ticket_row(ticket: &Ticket, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|&field| escape_field(&get_field_value(ticket, field)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Write tickets as CSV to the given writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv<W: Write>(writer: &mut W, tickets: &[Ticket], fields: &[&str]) -> io::Result<()> {
    write_header(writer, fields)?;
    for ticket in tickets {
        let row = format_ticket_row(ticket, fields);
        writeln!(writer, "{row}")?;
    }
    Ok(())
}

/// Format tickets as a complete CSV string.
#[must_use]
pub fn format_csv(tickets: &[Ticket], fields: &[&str]) -> String {
    let mut output = fields.join(",");
    output.push('\n');
    for ticket in tickets {
        output.push_str(&format_ticket_row(ticket, fields));
        output.push('\n');
    }
    output
}

// === Reading ===

/// One parsed data row and the line it started on (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

/// A parsed CSV document: header plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    /// Position of a header column, if present.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }
}

/// Parse CSV text. The first record is the header; blank lines are skipped.
///
/// # Errors
///
/// Returns [`ReportError::CsvParse`] on an unterminated quoted field or a
/// stray character after a closing quote.
pub fn parse_csv(contents: &str) -> Result<CsvTable> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let mut records = parse_records(contents)?;
    if records.is_empty() {
        return Ok(CsvTable::default());
    }
    let header = records
        .remove(0)
        .fields
        .into_iter()
        .map(|column| column.trim().to_string())
        .collect();
    Ok(CsvTable {
        header,
        rows: records,
    })
}

fn parse_records(contents: &str) -> Result<Vec<CsvRow>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut after_quote = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = contents.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    in_quotes = false;
                    after_quote = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            ',' => {
                fields.push(std::mem::take(&mut field));
                after_quote = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut fields), record_line);
                after_quote = false;
                line += 1;
                record_line = line;
            }
            '"' if field.is_empty() && !after_quote => in_quotes = true,
            _ if after_quote => {
                return Err(ReportError::CsvParse {
                    line,
                    reason: format!("unexpected '{c}' after closing quote"),
                });
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ReportError::CsvParse {
            line: record_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !fields.is_empty() || after_quote {
        fields.push(field);
        push_record(&mut records, fields, record_line);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<CsvRow>, fields: Vec<String>, line: usize) {
    let blank = fields.len() == 1 && fields[0].is_empty();
    if !blank {
        records.push(CsvRow { line, fields });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueCategory, ParentLinks, Phase, PhaseDates};

    fn make_test_ticket(key: &str, summary: &str) -> Ticket {
        let created = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Ticket {
            key: key.to_string(),
            summary: summary.to_string(),
            assignee: None,
            status: "In Progress".to_string(),
            status_category: Some(Phase::Development),
            story_points: Some(3.0),
            resolution: None,
            created,
            created_week: NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            phases: PhaseDates {
                pm_backlog: Some(created),
                ..PhaseDates::default()
            },
            release_date: None,
            release_version: None,
            resolution_date: None,
            resolution_week: None,
            issue_type: "Story".to_string(),
            incident_count: 0,
            category: Some(IssueCategory::Standard),
            defect_category: "Feature Work".to_string(),
            links: ParentLinks::default(),
        }
    }

    #[test]
    fn test_escape_field_plain() {
        assert_eq!(escape_field("simple"), "simple");
        assert_eq!(escape_field("hello world"), "hello world");
    }

    #[test]
    fn test_escape_field_with_comma() {
        assert_eq!(escape_field("hello, world"), "\"hello, world\"");
    }

    #[test]
    fn test_escape_field_with_quotes() {
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_escape_field_with_newline() {
        assert_eq!(escape_field("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn test_get_field_value() {
        let mut ticket = make_test_ticket("ENG-123", "Test Ticket");
        ticket.assignee = Some("dev@example.com".to_string());
        ticket.category = None;

        assert_eq!(get_field_value(&ticket, "key"), "ENG-123");
        assert_eq!(get_field_value(&ticket, "status_category"), "Development");
        assert_eq!(get_field_value(&ticket, "category"), "UNKNOWN");
        assert_eq!(get_field_value(&ticket, "assignee"), "dev@example.com");
        assert_eq!(get_field_value(&ticket, "story_points"), "3");
        assert_eq!(get_field_value(&ticket, "pm_backlog_date"), "2025-01-15 12:00:00");
        assert_eq!(get_field_value(&ticket, "done_date"), "");
        assert_eq!(get_field_value(&ticket, "created_week"), "2025-01-12");
        assert_eq!(get_field_value(&ticket, "unknown"), "");
    }

    #[test]
    fn test_parse_fields_default() {
        assert_eq!(parse_fields(None), ALL_FIELDS);
        assert_eq!(parse_fields(Some("  ")), ALL_FIELDS);
    }

    #[test]
    fn test_parse_fields_filters_invalid() {
        let fields = parse_fields(Some("key,invalid, summary"));
        assert_eq!(fields, vec!["key", "summary"]);
    }

    #[test]
    fn test_format_ticket_row_with_comma_in_summary() {
        let ticket = make_test_ticket("ENG-789", "Fix bug, then test");
        let row = format_ticket_row(&ticket, &["key", "summary"]);
        assert_eq!(row, "ENG-789,\"Fix bug, then test\"");
    }

    #[test]
    fn test_format_csv_matches_write_csv() {
        let tickets = vec![
            make_test_ticket("ENG-1", "First"),
            make_test_ticket("ENG-2", "Second"),
        ];
        let fields = &["key", "summary"];
        let csv = format_csv(&tickets, fields);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["key,summary", "ENG-1,First", "ENG-2,Second"]);

        let mut written = Vec::new();
        write_csv(&mut written, &tickets, fields).unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), csv);
    }

    #[test]
    fn test_parse_csv_basic() {
        let table = parse_csv("author,merged_at\nalice,2025-01-02\r\nbob,2025-01-03\n").unwrap();
        assert_eq!(table.header, vec!["author", "merged_at"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].line, 3);
        assert_eq!(table.rows[1].fields, vec!["bob", "2025-01-03"]);
        assert_eq!(table.column("merged_at"), Some(1));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn test_parse_csv_quoted_fields() {
        let table =
            parse_csv("id,body\n1,\"hello, \"\"world\"\"\"\n2,\"multi\nline\"\n3,\n").unwrap();
        assert_eq!(table.rows[0].fields[1], "hello, \"world\"");
        assert_eq!(table.rows[1].fields[1], "multi\nline");
        assert_eq!(table.rows[2].line, 5);
        assert_eq!(table.rows[2].fields, vec!["3", ""]);
    }

    #[test]
    fn test_parse_csv_skips_blank_lines_and_bom() {
        let table = parse_csv("\u{feff}a,b\n\n1,2\n\n").unwrap();
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 1);
        assert!(parse_csv("").unwrap().header.is_empty());
    }

    #[test]
    fn test_parse_csv_unterminated_quote() {
        let err = parse_csv("a,b\n1,\"open\n").unwrap_err();
        assert!(matches!(err, ReportError::CsvParse { line: 2, .. }));
    }

    #[test]
    fn test_written_csv_reads_back() {
        let ticket = make_test_ticket("ENG-5", "Quote \"this\", please");
        let table = parse_csv(&format_csv(&[ticket], &["key", "summary"])).unwrap();
        assert_eq!(table.rows[0].fields[1], "Quote \"this\", please");
    }
}
