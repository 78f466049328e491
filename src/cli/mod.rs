//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Engineering activity reports from issue-tracker and code-host data
#[derive(Parser, Debug)]
#[command(name = "engage", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file to use instead of ./engage.yaml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Category rules YAML file (statuses, issue types, defect categories)
    #[arg(long, global = true, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract tickets with phase timelines and resolved parents
    Tickets(TicketsArgs),

    /// Build the combined developer productivity report
    Report(ReportArgs),

    /// Show the merged configuration
    Config(ConfigArgs),

    /// Show version information
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TicketsArgs {
    /// JQL query (defaults to tracker.query)
    #[arg(long)]
    pub query: Option<String>,

    /// Read a saved search response instead of calling the tracker
    #[arg(long, value_name = "FILE")]
    pub from_file: Option<PathBuf>,

    /// CSV destination (defaults to tickets.output)
    #[arg(short, long, value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Comma-separated columns to export
    #[arg(long)]
    pub fields: Option<String>,

    /// Print a created/resolved rollup per week
    #[arg(long)]
    pub weekly: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Merged pull request CSV
    #[arg(long, value_name = "CSV")]
    pub prs: Option<PathBuf>,

    /// Review comment CSV
    #[arg(long, value_name = "CSV")]
    pub comments: Option<PathBuf>,

    /// First day of the range (YYYY-MM-DD, today, -30d)
    #[arg(long)]
    pub start: Option<String>,

    /// Last day of the range (defaults to today)
    #[arg(long)]
    pub end: Option<String>,

    /// Number of developers to chart, by PR count
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Directory for the SVG report
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the summary without writing the chart
    #[arg(long)]
    pub no_chart: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Show which layer each value came from
    #[arg(long)]
    pub sources: bool,
}
