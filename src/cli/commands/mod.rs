//! Subcommand implementations.

pub mod config;
pub mod report;
pub mod tickets;
pub mod version;
