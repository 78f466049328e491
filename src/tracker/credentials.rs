//! Tracker credential providers.
//!
//! A provider is asked once per run, before the first tracker request.
//! [`ChainCredentials`] tries providers in order and returns the first
//! success.

use crate::error::{ReportError, Result};
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::debug;

pub const USER_ENV: &str = "ENGAGE_TRACKER_USER";
pub const TOKEN_ENV: &str = "ENGAGE_TRACKER_TOKEN";

/// Username and API token for basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    token: String,
}

impl Credentials {
    #[must_use]
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("token", &"***")
            .finish()
    }
}

/// Source of tracker credentials.
pub trait CredentialProvider {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Obtain credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Credentials`] when this provider has none.
    fn credentials(&self) -> Result<Credentials>;
}

/// Reads `ENGAGE_TRACKER_USER` / `ENGAGE_TRACKER_TOKEN`.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    user_var: String,
    token_var: String,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(USER_ENV, TOKEN_ENV)
    }
}

impl EnvCredentials {
    #[must_use]
    pub fn new(user_var: impl Into<String>, token_var: impl Into<String>) -> Self {
        Self {
            user_var: user_var.into(),
            token_var: token_var.into(),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn credentials(&self) -> Result<Credentials> {
        let read = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|value| !value.trim().is_empty())
        };
        match (read(&self.user_var), read(&self.token_var)) {
            (Some(user), Some(token)) => Ok(Credentials::new(user, token)),
            _ => Err(ReportError::Credentials(format!(
                "{} and {} must both be set",
                self.user_var, self.token_var
            ))),
        }
    }
}

/// Fixed credentials, typically from a config file.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    user: Option<String>,
    token: Option<String>,
}

impl StaticCredentials {
    #[must_use]
    pub const fn new(user: Option<String>, token: Option<String>) -> Self {
        Self { user, token }
    }
}

impl CredentialProvider for StaticCredentials {
    fn name(&self) -> &'static str {
        "config"
    }

    fn credentials(&self) -> Result<Credentials> {
        match (&self.user, &self.token) {
            (Some(user), Some(token)) if !user.is_empty() && !token.is_empty() => {
                Ok(Credentials::new(user.clone(), token.clone()))
            }
            _ => Err(ReportError::Credentials(
                "tracker.user and tracker.token are not configured".to_string(),
            )),
        }
    }
}

/// Interactive prompt: username on stdin, token hidden.
#[derive(Debug, Clone, Default)]
pub struct PromptCredentials {
    token_help: Option<String>,
}

impl PromptCredentials {
    /// Show `help` (e.g. where to generate a token) above the token prompt.
    #[must_use]
    pub fn with_token_help(help: impl Into<String>) -> Self {
        Self {
            token_help: Some(help.into()),
        }
    }
}

impl CredentialProvider for PromptCredentials {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn credentials(&self) -> Result<Credentials> {
        if !io::stdin().is_terminal() {
            return Err(ReportError::Credentials(
                "stdin is not a terminal; cannot prompt".to_string(),
            ));
        }

        let mut stderr = io::stderr();
        write!(stderr, "Tracker username: ")?;
        stderr.flush()?;
        let mut user = String::new();
        io::stdin().lock().read_line(&mut user)?;
        let user = user.trim().to_string();

        if let Some(help) = &self.token_help {
            writeln!(stderr, "{help}")?;
        }
        let token = rpassword::prompt_password("Tracker API token: ")?;

        if user.is_empty() || token.is_empty() {
            return Err(ReportError::Credentials(
                "username and token are required".to_string(),
            ));
        }
        Ok(Credentials::new(user, token))
    }
}

/// Tries providers in order.
#[derive(Default)]
pub struct ChainCredentials {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainCredentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl CredentialProvider for ChainCredentials {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn credentials(&self) -> Result<Credentials> {
        let mut failures = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match provider.credentials() {
                Ok(credentials) => {
                    debug!(provider = provider.name(), "Using tracker credentials");
                    return Ok(credentials);
                }
                Err(err) => failures.push(format!("{}: {err}", provider.name())),
            }
        }
        Err(ReportError::Credentials(if failures.is_empty() {
            "no credential providers configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}
