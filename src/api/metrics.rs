//! Prometheus metrics for HTTP traffic.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

use super::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

static RECORDER: Lazy<PrometheusHandle> = Lazy::new(|| {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("A metrics recorder was already installed; /metrics will be empty");
    }
    handle
});

/// Handle to the process-wide recorder, installed on first use.
pub fn recorder_handle() -> PrometheusHandle {
    RECORDER.clone()
}

/// Counts requests and records latency per method, route and status.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let path = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => "unmatched".to_owned(),
    };
    let method = req.method().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let labels = [
        ("method", method),
        ("path", path),
        ("status", response.status().as_u16().to_string()),
    ];
    metrics::counter!(HTTP_REQUESTS_TOTAL, &labels).increment(1);
    metrics::histogram!(HTTP_REQUEST_DURATION_SECONDS, &labels)
        .record(started.elapsed().as_secs_f64());

    response
}

/// Prometheus text exposition
pub async fn render(State(state): State<AppState>) -> String {
    state.metrics.render()
}
