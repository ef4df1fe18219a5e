// Request instrumentation middleware
// Times every request through the inner service and records counts, latency,
// payload sizes, in-flight concurrency and error classes
//
// Numan Thabit 2025 Nov

use super::capture::{CapturedBody, ResponseSizeRecorder};
use crate::metrics::HttpMetrics;
use axum::{
    body::Body,
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};
use http_body::Body as HttpBody;
use std::sync::Arc;
use std::time::Instant;

/// Axum middleware recording the HTTP instrument bundle for each request.
///
/// Purely observational: the downstream response (including 4xx/5xx) is
/// returned as-is, with its body wrapped so response bytes can be counted
/// as they stream out. Panics are left to [`super::recover_panics`].
pub async fn track_metrics(
    State(metrics): State<Arc<HttpMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().as_str().to_owned();
    let _in_flight = metrics.track_in_flight(&method);

    let path = request.uri().path().to_owned();
    if let Some(len) = declared_body_length(&request).filter(|len| *len > 0) {
        metrics.observe_request_size(&method, &path, len);
    }

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    metrics.record_completion(&method, &path, status, elapsed);

    let (parts, body) = response.into_parts();
    let recorder = ResponseSizeRecorder::new(metrics.clone(), method, path);
    Response::from_parts(parts, Body::new(CapturedBody::new(body, recorder)))
}

/// Request body length as declared by `Content-Length`, falling back to an
/// exact size hint from the body itself. `None` when unknown.
fn declared_body_length(request: &Request) -> Option<u64> {
    let header = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    header.or_else(|| request.body().size_hint().exact())
}
