//! Error taxonomy for ticket and outbox operations.

use crate::ids::TicketId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the Ticket Store, User Directory and Mail Outbox.
///
/// The HTTP adapters translate these into status codes; the messages here are
/// safe to show to editors but `Persistence` details are logged, not returned.
#[derive(Error, Debug)]
pub enum TicketError {
    /// Unknown ticket, mail or user id
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// Kind of record that was looked up
        resource: &'static str,
        /// The id that did not match
        id: String,
    },

    /// The ticket is a tombstone; callers must resolve to the target first
    #[error("ticket '{ticket}' has been merged into '{target}'")]
    AlreadyMerged {
        /// The merged-away ticket
        ticket: TicketId,
        /// Where it redirects to
        target: TicketId,
    },

    /// Reassignment requires an explicit unassign first
    #[error("ticket '{ticket}' is already assigned to '{assignee}'")]
    AlreadyAssigned {
        /// The ticket
        ticket: TicketId,
        /// Username of the current assignee
        assignee: String,
    },

    /// Unassign on a ticket without assignee
    #[error("ticket '{0}' has no assignee")]
    NotAssigned(TicketId),

    /// The requester may not perform this operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Status value outside the legal set
    #[error("invalid ticket status '{0}'")]
    InvalidStatus(String),

    /// Assignment rejected by the holiday policy
    #[error("user '{0}' is on holiday and cannot take new tickets")]
    AssigneeOnHoliday(String),

    /// Malformed input at an API boundary
    #[error("validation failed: {0}")]
    Validation(String),

    /// The Persistence Gateway failed; the operation did not take effect
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl TicketError {
    /// Shorthand for an unknown ticket id
    #[must_use]
    pub fn ticket_not_found(id: &TicketId) -> Self {
        Self::NotFound {
            resource: "ticket",
            id: id.to_string(),
        }
    }

    /// Shorthand for an unknown username
    #[must_use]
    pub fn user_not_found(username: &str) -> Self {
        Self::NotFound {
            resource: "user",
            id: username.to_string(),
        }
    }
}

/// Failures from the Persistence Gateway.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// File system error
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding error
    #[error("serialization error in '{}': {message}", .path.display())]
    Serialization {
        /// File involved
        path: PathBuf,
        /// Description from the JSON codec
        message: String,
    },

    /// Storage backend unavailable (used by non-file gateways and test doubles)
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    /// Wrap an I/O error with the path it occurred on
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON error with the path it occurred on
    #[must_use]
    pub fn serialization(path: impl Into<PathBuf>, err: &serde_json::Error) -> Self {
        Self::Serialization {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, TicketError>;
