// Metrics and observability module
// This file defines the HTTP instrument bundle recorded by the middleware:
// request counts, latency, payload sizes, in-flight concurrency and errors
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use axum::http::StatusCode;
use prometheus::{
    exponential_buckets, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, DEFAULT_BUCKETS,
};
use std::time::Duration;

const REQUEST_LABELS: &[&str] = &["method", "path", "status"];
const SIZE_LABELS: &[&str] = &["method", "path"];
const IN_FLIGHT_LABELS: &[&str] = &["method"];
const ERROR_LABELS: &[&str] = &["method", "path", "error_type"];
const STATUS_CLASS_LABELS: &[&str] = &["status_class", "status_code"];

/// Error classification used for the `error_type` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientError,
    ServerError,
    Panic,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClientError => "client_error",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Panic => "panic",
        }
    }

    /// Classify a final status code. Anything below 400 is not an error.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            500.. => Some(ErrorKind::ServerError),
            400..=499 => Some(ErrorKind::ClientError),
            _ => None,
        }
    }
}

/// `404` -> `"4xx"`.
pub fn status_class(status: u16) -> String {
    format!("{}xx", status / 100)
}

/// The instruments shared by every request for one namespace.
///
/// Built once at startup and handed to the middleware as `Arc<HttpMetrics>`.
/// Every update goes straight to the prometheus vectors, which do their own
/// synchronization.
#[derive(Clone)]
pub struct HttpMetrics {
    pub requests: IntCounterVec,
    pub duration: HistogramVec,
    pub request_size: HistogramVec,
    pub response_size: HistogramVec,
    pub in_flight: IntGaugeVec,
    pub errors: IntCounterVec,
    pub status_classes: IntCounterVec,
}

impl HttpMetrics {
    /// Create and register all instruments. Fails if any name is already
    /// taken in `registry`; callers treat that as a fatal startup error.
    pub fn new(namespace: &str, registry: &Registry) -> Result<Self, MetricsError> {
        let size_buckets = exponential_buckets(100.0, 10.0, 8).map_err(MetricsError::Buckets)?;

        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of completed HTTP requests")
                .namespace(namespace),
            REQUEST_LABELS,
        )
        .map_err(MetricsError::Registration)?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "http_response_duration_seconds",
                "Histogram of response durations for HTTP requests",
            )
            .namespace(namespace)
            .buckets(DEFAULT_BUCKETS.to_vec()),
            REQUEST_LABELS,
        )
        .map_err(MetricsError::Registration)?;

        let request_size = HistogramVec::new(
            HistogramOpts::new("http_request_size_bytes", "Declared size of HTTP request bodies")
                .namespace(namespace)
                .buckets(size_buckets.clone()),
            SIZE_LABELS,
        )
        .map_err(MetricsError::Registration)?;

        let response_size = HistogramVec::new(
            HistogramOpts::new("http_response_size_bytes", "Bytes written to HTTP response bodies")
                .namespace(namespace)
                .buckets(size_buckets),
            SIZE_LABELS,
        )
        .map_err(MetricsError::Registration)?;

        let in_flight = IntGaugeVec::new(
            Opts::new("http_requests_in_flight", "HTTP requests currently being served")
                .namespace(namespace),
            IN_FLIGHT_LABELS,
        )
        .map_err(MetricsError::Registration)?;

        let errors = IntCounterVec::new(
            Opts::new("http_request_errors_total", "HTTP requests that ended in an error")
                .namespace(namespace),
            ERROR_LABELS,
        )
        .map_err(MetricsError::Registration)?;

        let status_classes = IntCounterVec::new(
            Opts::new("http_responses_by_status_total", "HTTP responses by status class and code")
                .namespace(namespace),
            STATUS_CLASS_LABELS,
        )
        .map_err(MetricsError::Registration)?;

        let metrics = Self {
            requests,
            duration,
            request_size,
            response_size,
            in_flight,
            errors,
            status_classes,
        };
        metrics.register(registry)?;
        Ok(metrics)
    }

    fn register(&self, registry: &Registry) -> Result<(), MetricsError> {
        registry
            .register(Box::new(self.requests.clone()))
            .map_err(MetricsError::Registration)?;
        registry
            .register(Box::new(self.duration.clone()))
            .map_err(MetricsError::Registration)?;
        registry
            .register(Box::new(self.request_size.clone()))
            .map_err(MetricsError::Registration)?;
        registry
            .register(Box::new(self.response_size.clone()))
            .map_err(MetricsError::Registration)?;
        registry
            .register(Box::new(self.in_flight.clone()))
            .map_err(MetricsError::Registration)?;
        registry
            .register(Box::new(self.errors.clone()))
            .map_err(MetricsError::Registration)?;
        registry
            .register(Box::new(self.status_classes.clone()))
            .map_err(MetricsError::Registration)?;
        Ok(())
    }

    /// Increment the in-flight gauge for `method`. The returned guard
    /// decrements it when dropped, including during unwinding.
    pub fn track_in_flight(&self, method: &str) -> InFlightGuard {
        let gauge = self.in_flight.with_label_values(&[method]);
        gauge.inc();
        InFlightGuard { gauge }
    }

    pub fn observe_request_size(&self, method: &str, path: &str, bytes: u64) {
        self.request_size
            .with_label_values(&[method, path])
            .observe(bytes as f64);
    }

    pub fn observe_response_size(&self, method: &str, path: &str, bytes: u64) {
        self.response_size
            .with_label_values(&[method, path])
            .observe(bytes as f64);
    }

    /// Record one finished request: count, latency, status class and, for
    /// status >= 400, the error counter.
    pub fn record_completion(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let code = status.to_string();
        self.requests
            .with_label_values(&[method, path, &code])
            .inc();
        self.duration
            .with_label_values(&[method, path, &code])
            .observe(elapsed.as_secs_f64());
        self.status_classes
            .with_label_values(&[&status_class(status), &code])
            .inc();

        if let Some(kind) = ErrorKind::from_status(status) {
            self.record_error(method, path, kind);
        }
    }

    /// Record a request whose handler panicked. It still counts as a
    /// completed request answered with 500, but its only error observation
    /// is `panic`. No duration is recorded.
    pub fn record_recovered(&self, method: &str, path: &str) {
        let code = StatusCode::INTERNAL_SERVER_ERROR.as_u16();
        self.requests
            .with_label_values(&[method, path, &code.to_string()])
            .inc();
        self.status_classes
            .with_label_values(&[&status_class(code), &code.to_string()])
            .inc();
        self.record_error(method, path, ErrorKind::Panic);
    }

    pub fn record_error(&self, method: &str, path: &str, kind: ErrorKind) {
        self.errors
            .with_label_values(&[method, path, kind.as_str()])
            .inc();
    }
}

/// Scope guard pairing every in-flight increment with a decrement.
#[must_use = "the in-flight gauge is decremented as soon as the guard is dropped"]
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
