//! Transport implementations carrying REST requests to the backend.

use crate::error::Result;
use serde_json::Value;
use std::fmt;

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "http")]
pub use http::HttpTransport;
#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryTransport;

/// HTTP verb of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

/// One REST call, path relative to the API root (e.g. `/appointments/3`).
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    /// Query parameter by name.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and decoded JSON body of a response.
#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// `None` when the body was empty.
    pub body: Option<Value>,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        RawResponse {
            status,
            body: Some(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for transport implementations.
///
/// Abstracts how a request reaches the backend, allowing the reqwest client
/// to be swapped for the in-memory backend in tests.
///
/// **IMPORTANT:** Methods take `&self`; implementations are cheap to clone and
/// share their connection or state internally.
///
/// Transports never interpret the envelope: a `success: false` answer is still
/// `Ok(RawResponse)`. Only failures to obtain a response are `Err`.
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync + Clone {
    /// Send one request and return the raw response.
    ///
    /// # Errors
    /// Returns `Error::Transport` or `Error::Timeout` if no response arrived,
    /// and `Error::Deserialization` if a 2xx body is not JSON.
    async fn send(&self, request: ApiRequest) -> Result<RawResponse>;

    /// Health check - verify the backend is reachable.
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be reached
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::new(Method::Patch, "/appointments/4/status")
            .with_query("status", "CONFIRMED")
            .with_bearer(Some("abc".to_string()));

        assert_eq!(request.query_param("status"), Some("CONFIRMED"));
        assert_eq!(request.query_param("keyword"), None);
        assert_eq!(request.bearer.as_deref(), Some("abc"));
        assert_eq!(request.method.to_string(), "PATCH");
    }

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::new(201, json!({})).is_success());
        assert!(!RawResponse::new(404, json!({})).is_success());
    }
}
