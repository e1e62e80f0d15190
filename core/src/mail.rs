//! Outbox entries.

use crate::ids::MailId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notification waiting in the outbox for the external mail service.
///
/// Created when a ticket event owes the customer a notification, persisted
/// immediately, and removed only when the mail service verifies delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mail {
    /// Outbox id, generated at enqueue time
    pub id: MailId,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Rendered body
    pub message: String,
    /// When the mail was enqueued
    pub created_at: DateTime<Utc>,
}
