// HTTP telemetry middleware
// Request instrumentation, response body capture and panic recovery,
// composed around an axum router
//
// Numan Thabit 2025 Nov

pub mod capture;
pub mod instrument;
pub mod recovery;

pub use capture::CapturedBody;
pub use instrument::track_metrics;
pub use recovery::recover_panics;

use crate::metrics::HttpMetrics;
use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;

/// Wrap every route of `router` (and its fallback) with the telemetry stack.
///
/// Recovery is added last so it is the outermost layer and also catches
/// panics raised inside the instrumentation itself.
pub fn with_telemetry<S>(router: Router<S>, metrics: Arc<HttpMetrics>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(from_fn_with_state(metrics.clone(), track_metrics))
        .layer(from_fn_with_state(metrics, recover_panics))
}
