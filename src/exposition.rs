// Metrics exposition
// Serves the registry in the Prometheus text format at a configurable path
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::error;

/// Scrape endpoint over a prometheus [`Registry`].
#[derive(Clone, Default)]
pub struct MetricsExporter {
    registry: Registry,
}

impl MetricsExporter {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Registry that instruments must be registered with to be scraped.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder
            .encode(&families, &mut buf)
            .map_err(MetricsError::Encode)?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn router(&self, path: &str) -> Router {
        Router::new()
            .route(path, get(scrape))
            .with_state(self.clone())
    }
}

async fn scrape(State(exporter): State<MetricsExporter>) -> Response {
    match exporter.render() {
        Ok(body) => ([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(err) => {
            error!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
