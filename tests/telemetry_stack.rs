use axum::{
    body::Body,
    http::{header::CONTENT_LENGTH, Request, StatusCode},
    routing::{get, post},
    Router,
};
use http_body_util::BodyExt;
use http_telemetry::{with_telemetry, HttpMetrics, MetricsExporter};
use prometheus::core::Collector;
use prometheus::Registry;
use std::sync::Arc;
use tower::ServiceExt;

async fn place_order() -> &'static str {
    panic!("downstream fault")
}

fn app() -> (Arc<HttpMetrics>, MetricsExporter, Router) {
    let exporter = MetricsExporter::new(Registry::new());
    let metrics = Arc::new(HttpMetrics::new("stack", exporter.registry()).unwrap());
    let api = Router::new()
        .route("/users", get(|| async { "u".repeat(42) }))
        .route("/health", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/orders", post(place_order));
    let app = with_telemetry(api, metrics.clone()).merge(exporter.router("/metrics"));
    (metrics, exporter, app)
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn request_total(metrics: &HttpMetrics) -> u64 {
    metrics
        .requests
        .collect()
        .iter()
        .flat_map(|family| family.get_metric().iter())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

#[tokio::test]
async fn get_users_scenario() {
    let (metrics, _, app) = app();
    let (status, body) = call(&app, Request::get("/users").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.len(), 42);

    assert_eq!(metrics.requests.with_label_values(&["GET", "/users", "200"]).get(), 1);
    assert_eq!(
        metrics
            .duration
            .with_label_values(&["GET", "/users", "200"])
            .get_sample_count(),
        1
    );
    assert_eq!(
        metrics
            .response_size
            .with_label_values(&["GET", "/users"])
            .get_sample_sum(),
        42.0
    );
    assert_eq!(metrics.status_classes.with_label_values(&["2xx", "200"]).get(), 1);
    assert_eq!(
        metrics
            .errors
            .collect()
            .iter()
            .map(|f| f.get_metric().len())
            .sum::<usize>(),
        0
    );
}

#[tokio::test]
async fn post_orders_panic_scenario() {
    let (metrics, _, app) = app();
    let request = Request::post("/orders")
        .header(CONTENT_LENGTH, "1500")
        .body(Body::from(vec![b'o'; 1500]))
        .unwrap();

    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!String::from_utf8(body).unwrap().contains("downstream fault"));

    assert_eq!(
        metrics
            .request_size
            .with_label_values(&["POST", "/orders"])
            .get_sample_sum(),
        1500.0
    );
    assert_eq!(metrics.errors.with_label_values(&["POST", "/orders", "panic"]).get(), 1);
    assert_eq!(metrics.in_flight.with_label_values(&["POST"]).get(), 0);
}

#[tokio::test]
async fn get_health_unavailable_scenario() {
    let (metrics, _, app) = app();
    let (status, _) = call(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    assert_eq!(
        metrics
            .errors
            .with_label_values(&["GET", "/health", "server_error"])
            .get(),
        1
    );
    assert_eq!(metrics.status_classes.with_label_values(&["5xx", "503"]).get(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_are_counted_exactly_once() {
    let (metrics, _, app) = app();

    let mut handles = Vec::new();
    for i in 0..90 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let request = match i % 3 {
                0 => Request::get("/users").body(Body::empty()).unwrap(),
                1 => Request::get("/health").body(Body::empty()).unwrap(),
                _ => Request::post("/orders").body(Body::empty()).unwrap(),
            };
            call(&app, request).await.0
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(request_total(&metrics), 90);
    assert_eq!(metrics.requests.with_label_values(&["GET", "/users", "200"]).get(), 30);
    assert_eq!(metrics.requests.with_label_values(&["GET", "/health", "503"]).get(), 30);
    assert_eq!(metrics.requests.with_label_values(&["POST", "/orders", "500"]).get(), 30);
    assert_eq!(metrics.errors.with_label_values(&["POST", "/orders", "panic"]).get(), 30);
    assert_eq!(metrics.in_flight.with_label_values(&["GET"]).get(), 0);
    assert_eq!(metrics.in_flight.with_label_values(&["POST"]).get(), 0);
}

#[tokio::test]
async fn scrape_reflects_recorded_traffic() {
    let (_, _, app) = app();
    call(&app, Request::get("/users").body(Body::empty()).unwrap()).await;

    let (status, body) = call(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("stack_http_requests_total{method=\"GET\",path=\"/users\",status=\"200\"} 1"));
    assert!(text.contains("stack_http_response_size_bytes_sum{method=\"GET\",path=\"/users\"} 42"));
    // the scrape route sits outside the instrumented router
    assert!(!text.contains("path=\"/metrics\""));
}
