//! Ticket, entry and status types.

use crate::error::TicketError;
use crate::ids::{TicketId, UserId};
use crate::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of a ticket.
///
/// Transitions are caller-directed: `Open → InProgress → Closed`, and any
/// state may return to `Open`. Nothing changes status automatically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Ticket is open and waiting to be worked on
    #[default]
    Open,
    /// An editor is working on the ticket
    InProgress,
    /// Ticket has been resolved
    Closed,
}

impl Status {
    /// Numeric code used by form-style clients (`0`, `1`, `2`)
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::InProgress => 1,
            Self::Closed => 2,
        }
    }

    /// Map a numeric status code to a status.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::InvalidStatus`] for any code other than 0, 1 or 2.
    pub fn from_code(code: i64) -> Result<Self, TicketError> {
        match code {
            0 => Ok(Self::Open),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Closed),
            other => Err(TicketError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for Status {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "0" | "open" => Ok(Self::Open),
            "1" | "in_progress" | "inprogress" | "in progress" => Ok(Self::InProgress),
            "2" | "closed" => Ok(Self::Closed),
            _ => Err(TicketError::InvalidStatus(s.to_string())),
        }
    }
}

// ============================================================================
// Entry
// ============================================================================

/// Visibility of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyType {
    /// Visible to editors only
    Internal,
    /// Visible to (and usually mailed to) the customer
    External,
}

impl ReplyType {
    /// Whether this reply is customer-visible
    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Self::External)
    }
}

/// A single message in a ticket's append-only log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// When the entry was appended
    pub created_at: DateTime<Utc>,
    /// Customer address or editor name
    pub author: String,
    /// Free-text body
    pub body: String,
    /// Internal note or external reply
    pub reply_type: ReplyType,
}

// ============================================================================
// Assignee
// ============================================================================

/// Snapshot of the editor a ticket is assigned to.
///
/// Copied from the [`User`] at assignment time. Later changes to the user
/// (e.g. the holiday flag) do not reach tickets that already hold a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    /// Id of the assigned user
    pub user_id: UserId,
    /// Display name
    pub name: String,
    /// Login name
    pub username: String,
    /// E-mail address
    pub mail: String,
}

impl From<&User> for Assignee {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            mail: user.mail.clone(),
        }
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A support ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Immutable identifier
    pub id: TicketId,
    /// Subject line taken from the opening message
    pub subject: String,
    /// Current status
    pub status: Status,
    /// Responsible editor, if any
    pub assignee: Option<Assignee>,
    /// Originating customer address (immutable)
    pub customer: String,
    /// Append-only log, oldest first
    pub entries: Vec<Entry>,
    /// Set when this ticket is a tombstone redirecting to another ticket
    pub merged_into: Option<TicketId>,
}

impl Ticket {
    /// Whether this ticket has been merged away
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        self.merged_into.is_some()
    }

    /// The opening entry
    #[must_use]
    pub fn first_entry(&self) -> Option<&Entry> {
        self.entries.first()
    }

    /// The most recently appended entry
    #[must_use]
    pub fn latest_entry(&self) -> Option<&Entry> {
        self.entries.last()
    }

    /// Whether `user_id` is the current assignee
    #[must_use]
    pub fn is_assigned_to(&self, user_id: &UserId) -> bool {
        self.assignee
            .as_ref()
            .is_some_and(|assignee| &assignee.user_id == user_id)
    }
}
