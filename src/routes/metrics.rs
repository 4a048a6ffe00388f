use axum::http::StatusCode;
use prometheus::TextEncoder;

/// GET /metrics — Prometheus scrape endpoint, kept off the public ingress.
pub async fn metrics_handler() -> Result<String, StatusCode> {
    TextEncoder::new()
        .encode_to_string(&prometheus::gather())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
