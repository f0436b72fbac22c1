//! Prometheus scrape endpoint and HTTP request metrics
//!
//! Counters emitted by the services:
//!
//! - `bookings_created_total`
//! - `booking_rejections_total{operation, kind}`
//! - `station_reconciliations_total`
//!
//! and by [`http_metrics_middleware`]:
//!
//! - `http_requests_total{method, path, status}`
//! - `http_request_duration_seconds{method, path}`

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared state for the metrics endpoint
#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// Register descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!("bookings_created_total", "Bookings accepted");
    describe_counter!(
        "booking_rejections_total",
        "Booking operations refused, by operation and error kind"
    );
    describe_counter!(
        "station_reconciliations_total",
        "Available-slot recomputations"
    );
    describe_counter!("http_requests_total", "HTTP requests served");
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request latency"
    );
}

/// `GET /metrics`
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}

/// Records request count and latency, labelled by the matched route
/// template so path parameters do not explode cardinality.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();
    metrics::counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(elapsed);

    response
}
