// Error types for the telemetry layer
// Startup-time failures only: request-time outcomes are recorded as metrics,
// never surfaced as errors of this crate
//
// Numan Thabit 2025 Nov

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric registration failed: {0}")]
    Registration(#[source] prometheus::Error),
    #[error("invalid histogram buckets: {0}")]
    Buckets(#[source] prometheus::Error),
    #[error("metrics encoding failed: {0}")]
    Encode(#[source] prometheus::Error),
    #[error("metrics output is not utf-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}
