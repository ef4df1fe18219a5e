// Panic recovery middleware
// Outermost layer: turns a panic anywhere below it into one recorded error
// observation and a generic 500 response, keeping the server loop alive
//
// Numan Thabit 2025 Nov

use crate::metrics::HttpMetrics;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::error;

pub async fn recover_panics(
    State(metrics): State<Arc<HttpMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().as_str().to_owned();
    let path = request.uri().path().to_owned();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            error!(
                method = %method,
                path = %path,
                panic = %panic_message(panic.as_ref()),
                "request handler panicked; responding with 500"
            );
            metrics.record_recovered(&method, &path);
            internal_error()
        }
    }
}

/// The only thing a client ever sees of a panic.
fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
