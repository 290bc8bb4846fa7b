//! Client configuration.

use crate::error::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

/// Default backend root, matching the development server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Storage key holding the serialized session.
pub const DEFAULT_SESSION_KEY: &str = "user";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How `login` establishes who the user is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoginMode {
    /// `POST /auth/login`: the backend checks the password and issues a token.
    #[default]
    Verified,

    /// `GET /users/email/{email}`: any account with that email is accepted.
    ///
    /// Only for backends without a login endpoint. The password is never
    /// checked; every login in this mode is logged as a warning.
    EmailLookup,
}

impl FromStr for LoginMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verified" => Ok(LoginMode::Verified),
            "email_lookup" | "email-lookup" | "lookup" => Ok(LoginMode::EmailLookup),
            other => Err(Error::Config(format!("unknown login mode: {}", other))),
        }
    }
}

/// Configuration for the appointment client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub login_mode: LoginMode,
    pub session_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            login_mode: LoginMode::default(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by environment variables:
    ///
    /// - `APPOINTMENT_API_URL`
    /// - `APPOINTMENT_API_TIMEOUT_SECS`
    /// - `APPOINTMENT_LOGIN_MODE` (`verified` | `email_lookup`)
    /// - `APPOINTMENT_SESSION_KEY`
    ///
    /// # Errors
    /// Returns `Error::Config` if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self> {
        let mut config = ClientConfig::default();

        if let Ok(url) = std::env::var("APPOINTMENT_API_URL") {
            config.base_url = url;
        }

        if let Ok(secs) = std::env::var("APPOINTMENT_API_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|e| {
                Error::Config(format!("APPOINTMENT_API_TIMEOUT_SECS={}: {}", secs, e))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Ok(mode) = std::env::var("APPOINTMENT_LOGIN_MODE") {
            config.login_mode = mode.parse()?;
        }

        if let Ok(key) = std::env::var("APPOINTMENT_SESSION_KEY") {
            config.session_key = key;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_login_mode(mut self, mode: LoginMode) -> Self {
        self.login_mode = mode;
        self
    }

    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    /// # Errors
    /// Returns `Error::Config` for an empty base URL or session key, a
    /// non-HTTP base URL, or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be non-zero".to_string()));
        }
        if self.session_key.trim().is_empty() {
            return Err(Error::Config("session_key must not be empty".to_string()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
