//! Axum integration for ticketdesk.
//!
//! The HTTP adapters in the application crate are deliberately thin: they
//! parse a request, call one store operation and map the result. This crate
//! holds the pieces every adapter shares.
//!
//! # Request Flow
//!
//! 1. **Correlation ID** is read from `X-Correlation-ID` or generated, and a
//!    tracing span is opened for the request
//! 2. **Extract** the body with [`StrictJson`] (400 on anything malformed)
//! 3. **Call** a Ticket Store / Mail Outbox operation
//! 4. **Map** domain errors through [`AppError`] (never leaking internals)
//! 5. **Return** a JSON (or plain-text) response
//!
//! # Example
//!
//! ```ignore
//! use ticketdesk_web::{AppError, StrictJson};
//! use axum::{Router, routing::post, Json};
//!
//! async fn verify(
//!     State(state): State<AppState>,
//!     StrictJson(request): StrictJson<VerifyRequest>,
//! ) -> Result<Json<VerifyResponse>, AppError> {
//!     let verified = state.outbox.verify_and_remove(&request.id).await?;
//!     Ok(Json(VerifyResponse::new(&request.id, verified)))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{CorrelationId, StrictJson, parse_strict};
pub use handlers::{health_check, method_not_allowed};
pub use middleware::{CORRELATION_ID_HEADER, track_correlation_id};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
