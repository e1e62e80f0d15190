//! Dispatch API: the outbox as seen by the polling mail service.
//!
//! - GET /api/fetchMails - All pending mail, keyed by mail id
//! - POST /api/verifyMail - Acknowledge one mail as sent and remove it
//!
//! Any other method answers 405 (see [`crate::server::routes`]).

use crate::outbox::MailOutbox;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use ticketdesk_core::{Mail, MailId};
use ticketdesk_web::{AppError, StrictJson};

// ============================================================================
// Request/Response Types
// ============================================================================

/// A pending mail as handed to the mail service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    /// Mail id, to be echoed back on verification
    pub id: String,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Body text
    pub message: String,
}

impl From<Mail> for OutgoingMail {
    fn from(mail: Mail) -> Self {
        Self {
            id: mail.id.into_inner(),
            from: mail.from,
            to: mail.to,
            subject: mail.subject,
            message: mail.message,
        }
    }
}

/// Body of `POST /api/verifyMail`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyRequest {
    /// Id of the mail that was sent
    pub id: String,
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// `true` if the mail was pending and has been removed
    pub verified: bool,
    /// Human-readable outcome
    pub message: String,
}

impl VerifyResponse {
    fn new(id: &MailId, verified: bool) -> Self {
        let message = if verified {
            format!("mail '{id}' was successfully sent and deleted from server cache")
        } else {
            format!("mail '{id}' does not exist or has already been deleted")
        };
        Self { verified, message }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List pending mail.
///
/// ```bash
/// curl -k https://localhost:8443/api/fetchMails
/// # {"<mail id>": {"id": "...", "from": "...", "to": "...", "subject": "...", "message": "..."}}
/// ```
///
/// Answers `{}` when nothing is pending.
pub async fn fetch_mails(
    State(outbox): State<Arc<MailOutbox>>,
) -> Json<BTreeMap<String, OutgoingMail>> {
    let pending = outbox.list_pending().await;
    tracing::debug!(pending = pending.len(), "Serving pending mails");

    Json(
        pending
            .into_iter()
            .map(|mail| (mail.id.to_string(), OutgoingMail::from(mail)))
            .collect(),
    )
}

/// Acknowledge a sent mail.
///
/// ```bash
/// curl -k -X POST https://localhost:8443/api/verifyMail -d '{"id": "<mail id>"}'
/// # {"verified": true, "message": "mail '<mail id>' was successfully sent and deleted from server cache"}
/// ```
///
/// Unknown or already removed ids answer 200 with `verified: false`.
///
/// # Errors
///
/// 400 for a malformed body, 500 if the mail file could not be removed.
pub async fn verify_mail(
    State(outbox): State<Arc<MailOutbox>>,
    StrictJson(request): StrictJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let id = MailId::new(request.id);
    let verified = outbox.verify_and_remove(&id).await?;
    Ok(Json(VerifyResponse::new(&id, verified)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_messages() {
        let id = MailId::new("abc");
        assert_eq!(
            VerifyResponse::new(&id, true).message,
            "mail 'abc' was successfully sent and deleted from server cache"
        );
        assert_eq!(
            VerifyResponse::new(&id, false).message,
            "mail 'abc' does not exist or has already been deleted"
        );
    }
}
