//! Liveness and method-guard handlers.

use crate::error::AppError;
use axum::{Json, http::Method};
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Simple health check endpoint (for basic liveness).
///
/// Does not touch the stores or the filesystem.
///
/// ```text
/// GET /health
/// {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Method fallback: `{"status":405,"message":"METHOD_NOT_ALLOWED (<METHOD>)"}`.
///
/// Install with `MethodRouter::fallback` on each route.
#[allow(clippy::unused_async)]
pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::method_not_allowed(&method)
}
