//! Reusable renderables for console summaries.

pub mod stats;
pub mod summary_table;
pub mod weekly_table;

pub use stats::StatsPanel;
pub use summary_table::SummaryTable;
pub use weekly_table::WeeklyTable;
