//! `engage_report` - engineering activity reports.
//!
//! Pulls tickets from an issue tracker and pre-extracted pull request and
//! review comment tables from a code host, then turns them into:
//! - a flat ticket table with reconstructed lifecycle dates and a resolved
//!   story → epic → initiative → theme hierarchy
//! - per-developer daily aggregates with rolling averages
//! - SVG charts and console summaries

pub mod aggregate;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod hierarchy;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod output;
pub mod rules;
pub mod timeline;
pub mod tracker;
pub mod util;

pub use error::{ErrorCode, ReportError, Result, StructuredError};
