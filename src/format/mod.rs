//! Output formatting for `engage`.
//!
//! - [`csv`]: flat ticket export and the CSV reader used by ingestion
//! - [`TicketExport`] / [`ReportOutput`]: JSON schemas for `--json`

pub mod csv;
mod output;

pub use output::{ReportOutput, TicketExport};
