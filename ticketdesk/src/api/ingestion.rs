//! Ingestion API: customer mail in, tickets and replies out.
//!
//! - POST /api/receive - `{"from", "subject", "message"}`
//!
//! A subject carrying `[Ticket "<id>"]` for a known ticket appends the message
//! as an external reply (following merge redirects and reopening a Closed
//! ticket). Every other mail opens a new ticket.

use crate::tickets::TicketStore;
use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use ticketdesk_core::{TicketError, TicketId};
use ticketdesk_web::{AppError, parse_strict};

#[allow(clippy::expect_used)]
static REPLY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[Ticket "([A-Za-z0-9]+)"\]"#).expect("reply marker regex should compile")
});

#[allow(clippy::expect_used)]
static EMAIL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("e-mail regex should compile")
});

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /api/receive`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncomingMail {
    /// Sender address (becomes the customer or reply author)
    pub from: String,
    /// Subject, possibly carrying a reply marker
    pub subject: String,
    /// Mail body
    pub message: String,
}

/// Success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveResponse {
    /// Always 200
    pub status: u16,
    /// Always `"OK"`
    pub message: String,
    /// The created or updated ticket
    #[serde(rename = "ticketId")]
    pub ticket_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Turn an incoming mail into a ticket or a reply.
///
/// ```bash
/// curl -k -X POST https://localhost:8443/api/receive \
///   -d '{"from": "a@b.com", "subject": "Help", "message": "it is broken"}'
/// # {"status": 200, "message": "OK", "ticketId": "<ticket id>"}
/// ```
///
/// # Errors
///
/// - 500 (plain text) if the body is not UTF-8
/// - 400 for malformed JSON, missing/extra/mistyped fields or an invalid sender
/// - 409 if the marked ticket was merged away concurrently
/// - 500 on persistence failure
pub async fn receive_mail(
    State(tickets): State<Arc<TicketStore>>,
    body: Bytes,
) -> Result<Json<ReceiveResponse>, AppError> {
    let text = std::str::from_utf8(&body).map_err(|e| {
        AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unable to read request body: {e}"),
            "DECODE_FAILURE",
        )
        .as_plain_text()
    })?;

    let mail: IncomingMail = parse_strict(text.as_bytes())?;

    if !is_valid_email(&mail.from) {
        return Err(AppError::bad_request(format!(
            "invalid email address given: '{}'",
            mail.from
        )));
    }

    let ticket = match reply_target(&mail.subject) {
        Some(id) => match tickets.resolve_ticket(&id).await {
            Ok(live) => {
                tickets
                    .append_customer_reply(&live.id, &mail.from, &mail.message)
                    .await?
            }
            Err(TicketError::NotFound { .. }) => {
                tracing::warn!(
                    ticket_id = %id,
                    "Reply marker names no existing ticket, creating a new one"
                );
                tickets
                    .create_ticket(&mail.from, &mail.subject, &mail.message)
                    .await?
            }
            Err(e) => return Err(e.into()),
        },
        None => {
            tickets
                .create_ticket(&mail.from, &mail.subject, &mail.message)
                .await?
        }
    };

    Ok(Json(ReceiveResponse {
        status: StatusCode::OK.as_u16(),
        message: "OK".to_string(),
        ticket_id: ticket.id.into_inner(),
    }))
}

/// Ticket id named by a `[Ticket "<id>"]` marker in `subject`.
#[must_use]
pub fn reply_target(subject: &str) -> Option<TicketId> {
    REPLY_MARKER
        .captures(subject)
        .and_then(|captures| captures.get(1))
        .map(|id| TicketId::new(id.as_str()))
}

/// Whether `address` is a syntactically valid e-mail address.
#[must_use]
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_ADDRESS.is_match(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_target() {
        assert_eq!(
            reply_target(r#"[Ticket "abc123"] Help"#),
            Some(TicketId::new("abc123"))
        );
        assert_eq!(
            reply_target(r#"Re: [Ticket "XYZ"] Help"#),
            Some(TicketId::new("XYZ"))
        );
        assert_eq!(reply_target("Help"), None);
        assert_eq!(reply_target(r#"[Ticket "a-b"] Help"#), None);
        assert_eq!(reply_target(r#"[Ticket ""] Help"#), None);
    }

    #[test]
    fn test_email_validation() {
        for valid in ["a@b.com", "first.last+tag@mail.example.org"] {
            assert!(is_valid_email(valid), "{valid}");
        }
        for invalid in ["", "a@b", "no-at-sign.com", "a@-b.com", "a b@c.com"] {
            assert!(!is_valid_email(invalid), "{invalid}");
        }
    }
}
