// Library root module for http-telemetry
// This file defines the public API: the instrument bundle, the middleware
// that records it and the exposition endpoint that serves it
//
// Numan Thabit 2025 Nov

pub mod config;
pub mod errors;
pub mod exposition;
pub mod metrics;
pub mod middleware;

pub use exposition::MetricsExporter;
pub use metrics::HttpMetrics;
pub use middleware::with_telemetry;
