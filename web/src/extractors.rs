//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation ID (from the middleware,
//!   the `X-Correlation-ID` header, or freshly generated)
//! - [`StrictJson`]: a JSON body that must be an object matching `T` exactly
//!
//! # Examples
//!
//! ```ignore
//! use ticketdesk_web::{CorrelationId, StrictJson};
//!
//! async fn handler(
//!     correlation_id: CorrelationId,
//!     StrictJson(request): StrictJson<VerifyRequest>,
//! ) -> Result<Json<VerifyResponse>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, mail_id = %request.id, "Verifying mail");
//!     ...
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Prefers the ID stored by [`track_correlation_id`](crate::track_correlation_id),
/// then a valid UUID in the `X-Correlation-ID` header, and otherwise generates
/// a new UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// JSON body extractor that rejects everything but an exact object.
///
/// Unlike `axum::Json` it ignores the `Content-Type` header (mail fetchers
/// send bare bodies) and answers every failure with a 400 [`AppError`]:
///
/// - unreadable body or invalid JSON
/// - a JSON value that is not an object
/// - missing, mistyped or (with `#[serde(deny_unknown_fields)]`) extra fields
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        parse_strict(&bytes).map(Self)
    }
}

/// Parse `bytes` as a JSON object and deserialize it into `T`.
///
/// # Errors
///
/// Returns a 400 [`AppError`] when the body is not a JSON object or does not
/// match `T`.
pub fn parse_strict<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::bad_request(format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(AppError::bad_request("request body must be a JSON object"));
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::bad_request(format!("invalid request body: {e}")))
}
