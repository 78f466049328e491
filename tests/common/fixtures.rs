//! Input files shaped like the code host and tracker exports.

use serde_json::{Value, json};

pub const PR_HEADER: &str = "author,merged_at,pr_number,total_lines_changed";
pub const COMMENT_HEADER: &str = "comment_author,comment_created_at,comment_type,comment_id";

/// `(author, merged_at, lines)` rows; numbers are assigned in order.
pub fn pr_csv(rows: &[(&str, &str, u64)]) -> String {
    let mut out = String::from(PR_HEADER);
    out.push('\n');
    for (idx, (author, merged_at, lines)) in rows.iter().enumerate() {
        out.push_str(&format!("{author},{merged_at},{},{lines}\n", idx + 1));
    }
    out
}

/// `(author, created_at, type)` rows; ids are assigned in order.
pub fn comment_csv(rows: &[(&str, &str, &str)]) -> String {
    let mut out = String::from(COMMENT_HEADER);
    out.push('\n');
    for (idx, (author, created_at, comment_type)) in rows.iter().enumerate() {
        out.push_str(&format!("{author},{created_at},{comment_type},c{}\n", idx + 1));
    }
    out
}

/// A small January team: two humans, one bot and one denylisted former
/// member.
pub fn team_prs() -> String {
    pr_csv(&[
        ("alice", "2025-01-02T10:00:00Z", 120),
        ("alice", "2025-01-03T11:00:00Z", 30),
        ("alice", "2025-01-10T09:30:00Z", 50),
        ("bob", "2025-01-06T16:00:00Z", 400),
        ("github-actions[bot]", "2025-01-04T00:00:00Z", 2),
        ("github-actions[bot]", "2025-01-05T00:00:00Z", 2),
        ("gypseez22", "2025-01-07T12:00:00Z", 75),
        ("alice", "2024-12-20T12:00:00Z", 10),
    ])
}

pub fn team_comments() -> String {
    comment_csv(&[
        ("alice", "2025-01-02T12:00:00Z", "review"),
        ("bob", "2025-01-03T12:00:00Z", "review"),
        ("bob", "2025-01-03T13:00:00Z", "issue"),
        ("dependabot[bot]", "2025-01-03T14:00:00Z", "issue"),
    ])
}

pub fn issue(key: &str, issue_type: &str, summary: &str, status: &str, created: &str) -> Value {
    json!({
        "key": key,
        "fields": {
            "summary": summary,
            "status": { "name": status },
            "issuetype": { "name": issue_type },
            "created": created,
        }
    })
}

pub fn with_parent(mut issue: Value, parent: &str) -> Value {
    issue["fields"]["parent"] = json!({ "key": parent });
    issue
}

pub fn with_resolution(mut issue: Value, name: &str, at: &str) -> Value {
    issue["fields"]["resolution"] = json!({ "name": name });
    issue["fields"]["resolutiondate"] = json!(at);
    issue
}

/// Attach status transitions as `(timestamp, new status)` pairs.
pub fn with_transitions(mut issue: Value, transitions: &[(&str, &str)]) -> Value {
    let histories: Vec<Value> = transitions
        .iter()
        .map(|(at, status)| {
            json!({
                "created": at,
                "items": [{ "field": "status", "toString": status }]
            })
        })
        .collect();
    issue["changelog"] = json!({ "histories": histories });
    issue
}

/// A saved search response wrapping `issues`.
pub fn search_page(issues: Vec<Value>) -> String {
    let total = issues.len();
    json!({
        "startAt": 0,
        "maxResults": 100,
        "total": total,
        "issues": issues,
    })
    .to_string()
}

/// Theme → initiative → epic → story → sub-task, plus a finished story with
/// a full history and an abandoned one.
pub fn planning_chain() -> String {
    let created = "2025-01-01T09:00:00.000+0000";
    search_page(vec![
        with_parent(issue("ENG-1", "Initiative", "Init A", "In Progress", created), "TH-1"),
        with_parent(issue("ENG-2", "Epic", "Epic A", "In Progress", created), "ENG-1"),
        with_parent(issue("ENG-3", "Story", "Story A", "In Progress", created), "ENG-2"),
        with_parent(issue("ENG-4", "Sub-task", "Task A", "Backlog", created), "ENG-3"),
        with_transitions(
            issue("ENG-5", "Story", "Finished story", "Done", created),
            &[
                ("2025-01-05T09:00:00.000+0000", "In Progress"),
                ("2025-01-10T09:00:00.000+0000", "Done"),
            ],
        ),
        issue("ENG-6", "Story", "Dropped story", "Won't Do", "2025-01-08T09:00:00.000+0000"),
    ])
}
