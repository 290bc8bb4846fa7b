//! reqwest-backed HTTP transport.

use super::{ApiRequest, Method, RawResponse, Transport};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Transport speaking JSON over HTTP(S) to the configured base URL.
///
/// # Example
///
/// ```no_run
/// # use appointment_client::config::ClientConfig;
/// # use appointment_client::transport::{ApiRequest, HttpTransport, Method, Transport};
/// # async fn example() -> appointment_client::Result<()> {
/// let transport = HttpTransport::new(&ClientConfig::default())?;
/// let response = transport
///     .send(ApiRequest::new(Method::Get, "/appointments/stats"))
///     .await?;
/// assert!(response.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from configuration.
    ///
    /// # Errors
    /// Returns `Error::Config` if the configuration is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!("✓ HTTP transport initialized: {}", config.base());

        Ok(HttpTransport {
            base_url: config.base().to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        let url = self.url(&request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("HTTP {} {} failed: {}", request.method, url, e);
            Error::from(e)
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        debug!(
            "✓ HTTP {} {} -> {} ({} bytes)",
            request.method,
            url,
            status,
            bytes.len()
        );

        if bytes.is_empty() {
            return Ok(RawResponse { status, body: None });
        }

        match serde_json::from_slice(&bytes) {
            Ok(body) => Ok(RawResponse {
                status,
                body: Some(body),
            }),
            Err(e) if (200..300).contains(&status) => Err(Error::Deserialization(format!(
                "{} {} returned non-JSON body: {}",
                request.method, request.path, e
            ))),
            // Error pages from proxies and the like carry no envelope.
            Err(_) => Ok(RawResponse { status, body: None }),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .send(ApiRequest::new(Method::Get, "/appointments/stats"))
            .await?;
        Ok(response.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_config() {
        let config = ClientConfig::default().with_base_url("localhost:8080");
        assert!(matches!(HttpTransport::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_url_joining() {
        let config = ClientConfig::default().with_base_url("http://localhost:9000/api/");
        let transport = HttpTransport::new(&config).expect("valid config");
        assert_eq!(transport.base_url(), "http://localhost:9000/api");
        assert_eq!(
            transport.url("/appointments/3"),
            "http://localhost:9000/api/appointments/3"
        );
    }
}
