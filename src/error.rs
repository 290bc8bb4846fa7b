//! Error types for the appointment client.

use std::fmt;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Generic message shown to users when the backend could not be reached.
pub const TRANSPORT_USER_MESSAGE: &str = "Unable to reach the server. Please try again.";

/// Error types for the appointment client.
///
/// Every failure is scoped to the action that triggered it. Variants fall in
/// three groups:
/// - validation errors, raised before any request is issued
/// - transport errors, where the backend was never heard from
/// - server-reported errors, where the backend answered `success: false`
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Form or argument validation failed; no network call was made.
    Validation(String),

    /// The request never produced a usable response.
    ///
    /// Common causes:
    /// - Connection refused or reset
    /// - DNS failure
    /// - Non-envelope error body (proxy error page, etc)
    Transport(String),

    /// The request exceeded the configured timeout.
    Timeout(String),

    /// The backend answered with `success: false`.
    ///
    /// The message is shown to the user verbatim.
    Server {
        /// HTTP status, when the response came over HTTP
        status: Option<u16>,
        /// Message reported by the backend
        message: String,
    },

    /// Login failed: no account matches the supplied credentials.
    InvalidCredentials,

    /// The action requires an authenticated, active identity.
    Unauthorized(String),

    /// The current identity's role does not permit the action.
    Forbidden(String),

    /// Resource missing (in-memory backend, or a 404 without an envelope).
    NotFound(String),

    /// Encoding a request body or session record failed.
    Serialization(String),

    /// A response payload or persisted session could not be decoded.
    Deserialization(String),

    /// The session storage slot could not be read or written.
    Storage(String),

    /// Invalid client configuration.
    Config(String),
}

impl Error {
    /// Build a server error without an HTTP status.
    pub fn server(message: impl Into<String>) -> Self {
        Error::Server {
            status: None,
            message: message.into(),
        }
    }

    /// True for failures where the backend was never heard from.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }

    /// Message suitable for an error banner.
    ///
    /// Server and validation messages pass through verbatim, transport
    /// failures collapse to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::Server { message, .. } => message.clone(),
            Error::Transport(_) | Error::Timeout(_) => TRANSPORT_USER_MESSAGE.to_string(),
            Error::InvalidCredentials => "Invalid credentials".to_string(),
            Error::Unauthorized(msg) | Error::Forbidden(msg) | Error::NotFound(msg) => msg.clone(),
            _ => "An error occurred. Please try again.".to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::Transport(msg) => write!(f, "Transport error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::Server {
                status: Some(code),
                message,
            } => write!(f, "Server error ({}): {}", code, message),
            Error::Server {
                status: None,
                message,
            } => write!(f, "Server error: {}", message),
            Error::InvalidCredentials => write!(f, "Invalid credentials"),
            Error::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Error::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::Storage(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::Deserialization(e.to_string())
        } else {
            Error::Serialization(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else if e.is_decode() {
            Error::Deserialization(e.to_string())
        } else {
            Error::Transport(e.to_string())
        }
    }
}
