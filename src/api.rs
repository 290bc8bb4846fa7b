//! The single configured REST client.
//!
//! Wraps a [`Transport`] with the response envelope, bearer credentials and
//! request metrics. Cheap to clone; clones share credentials and metrics.

use crate::error::{Error, Result};
use crate::observability::{NoOpMetrics, RequestMetrics};
use crate::transport::{ApiRequest, Method, RawResponse, Transport};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Response envelope every endpoint answers with.
///
/// Extra fields the backend adds (`timestamp`, `statusCode`, `errors`) are
/// ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Split into payload or server error.
    ///
    /// # Errors
    /// Returns `Error::Server` carrying the backend's message when
    /// `success` is false.
    pub fn into_result(self, status: Option<u16>) -> Result<Option<T>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(Error::Server {
                status,
                message: self
                    .message
                    .unwrap_or_else(|| "Request failed".to_string()),
            })
        }
    }
}

/// Percent-encode one path segment.
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// REST client shared by the session store and the resource clients.
///
/// # Example
///
/// ```ignore
/// use appointment_client::{ApiClient, transport::InMemoryTransport};
///
/// let api = ApiClient::new(InMemoryTransport::new());
/// let appointments: Vec<Appointment> = api.get("/appointments").await?;
/// ```
#[derive(Clone)]
pub struct ApiClient<T: Transport> {
    transport: T,
    credentials: Arc<RwLock<Option<String>>>,
    metrics: Arc<dyn RequestMetrics>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        ApiClient {
            transport,
            credentials: Arc::new(RwLock::new(None)),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn RequestMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether a bearer token is attached to outgoing requests.
    pub fn has_credentials(&self) -> bool {
        self.credentials.read().is_some()
    }

    /// Only the session store changes credentials.
    pub(crate) fn set_credentials(&self, token: Option<String>) {
        *self.credentials.write() = token;
    }

    /// Issue a request and decode the envelope's `data` into `R`.
    ///
    /// A missing `data` field decodes as JSON `null`, so `R = ()` and
    /// `R = Option<_>` work for endpoints that return nothing.
    ///
    /// # Errors
    ///
    /// - `Error::Transport` / `Error::Timeout`: no response
    /// - `Error::Server`: the backend answered `success: false`
    /// - `Error::NotFound`: 404 without an envelope
    /// - `Error::Deserialization`: payload does not match `R`
    pub async fn call<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let endpoint = format!("{} {}", request.method, request.path);
        let request = request.with_bearer(self.credentials.read().clone());
        let timer = Instant::now();

        debug!("» API {}", endpoint);

        let result = match self.transport.send(request).await {
            Ok(response) => Self::decode(&endpoint, response),
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => self.metrics.record_success(&endpoint, timer.elapsed()),
            Err(Error::Server { message, .. }) => self.metrics.record_rejected(&endpoint, message),
            Err(e) => {
                error!("✗ API {} failed: {}", endpoint, e);
                self.metrics.record_failure(&endpoint, e)
            }
        }

        result
    }

    fn decode<R: DeserializeOwned>(endpoint: &str, response: RawResponse) -> Result<R> {
        let status = response.status;

        let envelope = match response.body {
            Some(body) => serde_json::from_value::<ApiEnvelope<Value>>(body).ok(),
            None => None,
        };

        let data = match envelope {
            Some(envelope) => envelope.into_result(Some(status))?,
            None if response_ok(status) => None,
            None if status == 404 => return Err(Error::NotFound(endpoint.to_string())),
            None => {
                return Err(Error::Transport(format!(
                    "{} answered HTTP {} without an envelope",
                    endpoint, status
                )))
            }
        };

        serde_json::from_value(data.unwrap_or(Value::Null)).map_err(|e| {
            Error::Deserialization(format!("{}: unexpected payload: {}", endpoint, e))
        })
    }

    pub async fn get<R: DeserializeOwned>(&self, path: impl Into<String>) -> Result<R> {
        self.call(ApiRequest::new(Method::Get, path)).await
    }

    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> Result<R> {
        let body = serde_json::to_value(body)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        self.call(ApiRequest::new(Method::Post, path).with_body(body))
            .await
    }

    pub async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> Result<R> {
        let body = serde_json::to_value(body)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        self.call(ApiRequest::new(Method::Put, path).with_body(body))
            .await
    }

    pub async fn delete(&self, path: impl Into<String>) -> Result<()> {
        self.call::<Value>(ApiRequest::new(Method::Delete, path))
            .await
            .map(|_| ())
    }
}

fn response_ok(status: u16) -> bool {
    (200..300).contains(&status)
}
