//! Persistence Gateway traits.
//!
//! The stores treat storage as a simple load/save interface. The production
//! implementation writes one JSON file per record (see the `ticketdesk` crate);
//! `ticketdesk-testing` provides in-memory doubles.
//!
//! # Dyn Compatibility
//!
//! Methods return [`PersistenceFuture`] (`Pin<Box<dyn Future>>`) instead of
//! using `async fn`, so the stores can hold `Arc<dyn TicketRepository>` and the
//! HTTP state stays free of generic parameters.

use crate::error::PersistenceError;
use crate::ids::MailId;
use crate::mail::Mail;
use crate::ticket::Ticket;
use crate::user::User;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by gateway operations
pub type PersistenceFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, PersistenceError>> + Send + 'a>>;

/// Durable storage for tickets.
pub trait TicketRepository: Send + Sync {
    /// Create or overwrite the stored copy of `ticket`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the ticket could not be written.
    fn save_ticket<'a>(&'a self, ticket: &'a Ticket) -> PersistenceFuture<'a, ()>;

    /// Load every stored ticket (used for startup recovery).
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if any record cannot be read or decoded.
    fn load_tickets(&self) -> PersistenceFuture<'_, Vec<Ticket>>;
}

/// Durable storage for the mail outbox.
pub trait MailRepository: Send + Sync {
    /// Persist a queued mail.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the mail could not be written.
    fn save_mail<'a>(&'a self, mail: &'a Mail) -> PersistenceFuture<'a, ()>;

    /// Delete a queued mail. Removing a mail that is not stored is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if an existing record could not be deleted.
    fn remove_mail<'a>(&'a self, id: &'a MailId) -> PersistenceFuture<'a, ()>;

    /// Load every queued mail (used for startup recovery).
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if any record cannot be read or decoded.
    fn load_mails(&self) -> PersistenceFuture<'_, Vec<Mail>>;
}

/// Durable storage for the editor user set.
pub trait UserRepository: Send + Sync {
    /// Load all users.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the user set cannot be read or decoded.
    fn load_users(&self) -> PersistenceFuture<'_, Vec<User>>;

    /// Replace the stored user set.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the user set could not be written.
    fn save_users<'a>(&'a self, users: &'a [User]) -> PersistenceFuture<'a, ()>;
}
