//! Credentials, session snapshots and the execution mode.
//!
//! # Design
//! `Credentials` are fixed at construction. A `Session` is an immutable
//! snapshot of the tokens; the client swaps in a whole new snapshot on
//! (re)authentication and never edits one in place, so a reader sees either
//! the old token pair or the new one.

use std::fmt;

use crate::error::ConfigError;

/// Environment variable selecting the execution mode.
pub const MODE_ENV: &str = "CHRANILKA_ENV";

/// Login credentials and the service location.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_url: String,
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(api_url: &str, username: &str, password: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Read `API_URL`, `API_USER` and `API_PASSWORD`.
    pub fn from_env() -> Result<Self, ConfigError> {
        fn var(name: &'static str) -> Result<String, ConfigError> {
            std::env::var(name).map_err(|_| ConfigError::Missing(name))
        }
        Ok(Self::new(
            &var("API_URL")?,
            &var("API_USER")?,
            &var("API_PASSWORD")?,
        ))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Current access token and, for refreshable variants, the refresh token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    refresh_token: Option<String>,
}

impl Session {
    pub fn new(access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Whether authentication talks to the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Live,
    /// `initialize()` succeeds without a network call and leaves the session
    /// empty.
    Test,
}

impl ExecutionMode {
    /// `CHRANILKA_ENV=test` (any case) selects `Test`; anything else is `Live`.
    pub fn from_env() -> Self {
        std::env::var(MODE_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("test") {
            ExecutionMode::Test
        } else {
            ExecutionMode::Live
        }
    }
}
