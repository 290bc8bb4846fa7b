//! Request metrics hooks.
//!
//! Implement [`RequestMetrics`] to feed request timings and failures into a
//! monitoring system:
//!
//! ```ignore
//! use appointment_client::observability::RequestMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl RequestMetrics for PrometheusMetrics {
//!     fn record_success(&self, endpoint: &str, duration: Duration) {
//!         // histogram!("api_latency", "endpoint" => endpoint).record(duration);
//!     }
//! }
//!
//! // let api = ApiClient::new(transport).with_metrics(Arc::new(PrometheusMetrics));
//! ```
//!
//! Methods left unimplemented log via the `log` crate. [`NoOpMetrics`]
//! silences everything and is the default.

use crate::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Trait for request metrics collection.
///
/// `endpoint` is `"{METHOD} {path}"`, e.g. `"PATCH /appointments/3/status"`.
pub trait RequestMetrics: Send + Sync {
    /// Record a request answered with `success: true`.
    fn record_success(&self, endpoint: &str, duration: Duration) {
        debug!("API OK: {} took {:?}", endpoint, duration);
    }

    /// Record a request the backend refused with `success: false`.
    fn record_rejected(&self, endpoint: &str, message: &str) {
        info!("API REJECTED: {}: {}", endpoint, message);
    }

    /// Record a transport failure or undecodable response.
    fn record_failure(&self, endpoint: &str, error: &Error) {
        warn!("API FAILED: {}: {}", endpoint, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl RequestMetrics for NoOpMetrics {
    fn record_success(&self, _endpoint: &str, _duration: Duration) {}
    fn record_rejected(&self, _endpoint: &str, _message: &str) {}
    fn record_failure(&self, _endpoint: &str, _error: &Error) {}
}

/// Metrics that only log (the trait defaults).
#[derive(Clone, Default)]
pub struct LogMetrics;

impl RequestMetrics for LogMetrics {}

/// Atomic counters, handy for tests and simple dashboards.
#[derive(Default)]
pub struct CountingMetrics {
    pub succeeded: AtomicU64,
    pub rejected: AtomicU64,
    pub failed: AtomicU64,
}

impl CountingMetrics {
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.succeeded.load(Ordering::Relaxed),
            self.rejected.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

impl RequestMetrics for CountingMetrics {
    fn record_success(&self, _endpoint: &str, _duration: Duration) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_rejected(&self, _endpoint: &str, _message: &str) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, _endpoint: &str, _error: &Error) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}
