//! Issue-tracker access.
//!
//! [`TrackerSource`] is the seam between extraction and the outside world:
//! the live [`JiraClient`] and the offline [`JsonFileSource`] both yield
//! [`RawTicket`]s with timestamps already normalised.

pub mod credentials;
pub mod file;
pub mod jira;

pub use credentials::{
    ChainCredentials, CredentialProvider, Credentials, EnvCredentials, PromptCredentials,
    StaticCredentials,
};
pub use file::JsonFileSource;
pub use jira::{CustomFields, JiraClient};

use crate::error::Result;
use crate::model::RawTicket;

/// Anything that can answer a tracker query with raw tickets.
pub trait TrackerSource {
    /// Fetch every ticket matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unreachable or returns data that
    /// cannot be decoded.
    fn fetch(&self, query: &str) -> Result<Vec<RawTicket>>;

    /// Where the tickets come from, for logs.
    fn describe(&self) -> String;
}
