mod common;

use common::cli::{EngageWorkspace, run_engage};
use common::fixtures::{comment_csv, team_comments, team_prs};
use common::test_log;

#[test]
fn e2e_missing_comment_export_fails_before_writing() {
    let _log = test_log("e2e_missing_comment_export_fails_before_writing");
    let workspace = EngageWorkspace::new();
    workspace.write("merged_prs.csv", &team_prs());

    let run = run_engage(&workspace, ["report", "--start", "2025-01-01", "--end", "2025-01-31"], "missing_comments");
    assert_eq!(run.code(), Some(2), "stderr: {}", run.stderr);

    // stdout is piped, so errors are structured.
    let error = run.error_json();
    assert_eq!(error["error"]["code"], "MISSING_INPUT");
    assert!(
        error["error"]["message"]
            .as_str()
            .is_some_and(|msg| msg.contains("pr_comments.csv"))
    );
    assert!(
        !workspace
            .path("combined_developer_productivity_report.svg")
            .exists()
    );
}

#[test]
fn e2e_missing_column_is_reported() {
    let _log = test_log("e2e_missing_column_is_reported");
    let workspace = EngageWorkspace::new();
    workspace.write("merged_prs.csv", "author,merged_at\nalice,2025-01-02T10:00:00Z\n");
    workspace.write("pr_comments.csv", &team_comments());

    let run = run_engage(&workspace, ["report"], "missing_column");
    assert_eq!(run.code(), Some(2), "stderr: {}", run.stderr);
    let error = run.error_json();
    assert_eq!(error["error"]["code"], "MISSING_COLUMN");
    assert!(run.stderr.contains("total_lines_changed"));
}

#[test]
fn e2e_inverted_range_is_a_validation_error() {
    let _log = test_log("e2e_inverted_range_is_a_validation_error");
    let workspace = EngageWorkspace::new();
    workspace.write("merged_prs.csv", &team_prs());
    workspace.write("pr_comments.csv", &comment_csv(&[]));

    let run = run_engage(
        &workspace,
        ["report", "--start", "2025-02-01", "--end", "2025-01-01"],
        "inverted_range",
    );
    assert_eq!(run.code(), Some(4), "stderr: {}", run.stderr);
    assert_eq!(run.error_json()["error"]["code"], "VALIDATION_FAILED");
}

#[test]
fn e2e_bad_date_argument_is_rejected() {
    let _log = test_log("e2e_bad_date_argument_is_rejected");
    let workspace = EngageWorkspace::new();
    workspace.write("merged_prs.csv", &team_prs());
    workspace.write("pr_comments.csv", &team_comments());

    let run = run_engage(&workspace, ["report", "--start", "last tuesday"], "bad_date");
    assert_eq!(run.code(), Some(4), "stderr: {}", run.stderr);
}

#[test]
fn e2e_relative_date_beyond_calendar_is_rejected() {
    let _log = test_log("e2e_relative_date_beyond_calendar_is_rejected");
    let workspace = EngageWorkspace::new();
    workspace.write("merged_prs.csv", &team_prs());
    workspace.write("pr_comments.csv", &team_comments());

    let run = run_engage(&workspace, ["report", "--start=-99999999d"], "huge_offset");
    assert_eq!(run.code(), Some(4), "stderr: {}", run.stderr);
    let error = run.error_json();
    assert_eq!(error["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(error["error"]["context"]["field"], "report.start");
}

#[test]
fn e2e_missing_explicit_config_file() {
    let _log = test_log("e2e_missing_explicit_config_file");
    let workspace = EngageWorkspace::new();

    let run = run_engage(&workspace, ["--config", "nope.yaml", "config"], "missing_config");
    assert_eq!(run.code(), Some(2), "stderr: {}", run.stderr);
    assert_eq!(run.error_json()["error"]["code"], "MISSING_INPUT");
}

#[test]
fn e2e_malformed_project_config() {
    let _log = test_log("e2e_malformed_project_config");
    let workspace = EngageWorkspace::new();
    workspace.write("engage.yaml", "report: [unterminated\n");

    let run = run_engage(&workspace, ["config"], "bad_yaml");
    assert_eq!(run.code(), Some(8), "stderr: {}", run.stderr);
    assert_eq!(run.error_json()["error"]["code"], "YAML_ERROR");
}

#[test]
fn e2e_unknown_subcommand_is_a_usage_error() {
    let _log = test_log("e2e_unknown_subcommand_is_a_usage_error");
    let workspace = EngageWorkspace::new();

    let run = run_engage(&workspace, ["frobnicate"], "unknown_subcommand");
    assert_eq!(run.code(), Some(2));
    assert!(run.stderr.contains("frobnicate"));
}
