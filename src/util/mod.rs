//! Shared utilities for `engage_report`.
//!
//! - Time parsing, week bucketing and date ranges
//! - Progress indicators (for long-running operations)

pub mod progress;
pub mod time;

pub use time::{date_range, parse_date_arg, week_start};
