//! Correlation ID middleware.
//!
//! # Flow
//!
//! 1. **Extract** the correlation ID from `X-Correlation-ID` (or generate a new UUID)
//! 2. **Store** it in request extensions as a [`CorrelationId`]
//! 3. **Run** the rest of the stack inside an `http_request` span
//! 4. **Echo** the ID back in the response `X-Correlation-ID` header
//!
//! ```ignore
//! use axum::{Router, middleware};
//! use ticketdesk_web::track_correlation_id;
//!
//! let app = Router::new()
//!     .route("/api/fetchMails", get(fetch_mails))
//!     .layer(middleware::from_fn(track_correlation_id));
//! ```

use crate::extractors::CorrelationId;
use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// `axum::middleware::from_fn` handler that tags every request with a
/// correlation ID and a tracing span.
pub async fn track_correlation_id(mut req: Request, next: Next) -> Response {
    let correlation_id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    req.extensions_mut().insert(CorrelationId(correlation_id));

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %req.method(),
        uri = %req.uri(),
    );

    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}
