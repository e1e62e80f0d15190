//! Router configuration for ticketdesk.

use super::state::AppState;
use crate::api::{dispatch, ingestion};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::time::Duration;
use ticketdesk_web::{health_check, method_not_allowed, track_correlation_id};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// - `GET /api/fetchMails`, `POST /api/verifyMail` (Dispatch API)
/// - `POST /api/receive` (Ingestion API)
/// - `GET /health`, `GET /metrics`
///
/// Other methods on the API routes answer 405 with a JSON body. `get` would
/// also serve HEAD, so `/api/fetchMails` refuses it explicitly. Every request
/// gets a correlation ID, request tracing and `request_timeout`.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let api_routes = Router::new()
        .route(
            "/fetchMails",
            get(dispatch::fetch_mails)
                .head(method_not_allowed)
                .fallback(method_not_allowed),
        )
        .route(
            "/verifyMail",
            post(dispatch::verify_mail).fallback(method_not_allowed),
        )
        .route(
            "/receive",
            post(ingestion::receive_mail).fallback(method_not_allowed),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .nest("/api", api_routes)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(track_correlation_id))
        .with_state(state)
}

/// Prometheus text exposition, or 404 when metrics are disabled.
async fn render_metrics(State(handle): State<Option<PrometheusHandle>>) -> impl IntoResponse {
    match handle {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
