//! In-memory Persistence Gateway doubles
//!
//! Provides fast, deterministic storage for store and API tests:
//! - [`InMemoryTicketRepository`]: HashMap-based ticket storage
//! - [`InMemoryMailRepository`]: HashMap-based outbox storage
//! - [`InMemoryUserRepository`]: Vec-based user set
//!
//! Every double can be switched into a failing mode with `fail_writes(true)`,
//! which makes all writes return [`PersistenceError::Unavailable`] so tests can
//! check that a failed write leaves the in-memory stores untouched.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use ticketdesk_core::{
    Mail, MailId, MailRepository, PersistenceError, PersistenceFuture, Ticket, TicketId,
    TicketRepository, User, UserRepository,
};

fn write_failure() -> PersistenceError {
    PersistenceError::Unavailable("write failure injected by test".to_string())
}

// ============================================================================
// Tickets
// ============================================================================

/// In-memory ticket storage for fast, deterministic testing.
///
/// # Example
///
/// ```
/// use ticketdesk_testing::InMemoryTicketRepository;
///
/// let repository = InMemoryTicketRepository::new();
/// assert!(repository.is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryTicketRepository {
    tickets: Arc<RwLock<HashMap<TicketId, Ticket>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryTicketRepository {
    /// Create a new empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `tickets` (for recovery tests)
    #[must_use]
    pub fn with_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        let repository = Self::new();
        {
            let mut map = repository.tickets.write().unwrap();
            for ticket in tickets {
                map.insert(ticket.id.clone(), ticket);
            }
        }
        repository
    }

    /// Make every subsequent write fail (or succeed again with `false`)
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stored copy of a ticket
    #[must_use]
    pub fn get(&self, id: &TicketId) -> Option<Ticket> {
        self.tickets.read().unwrap().get(id).cloned()
    }

    /// Whether a ticket has been stored
    #[must_use]
    pub fn contains(&self, id: &TicketId) -> bool {
        self.tickets.read().unwrap().contains_key(id)
    }

    /// Number of stored tickets
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.read().unwrap().len()
    }

    /// Whether nothing has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.read().unwrap().is_empty()
    }
}

impl TicketRepository for InMemoryTicketRepository {
    fn save_ticket<'a>(&'a self, ticket: &'a Ticket) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(write_failure());
            }
            self.tickets
                .write()
                .unwrap()
                .insert(ticket.id.clone(), ticket.clone());
            Ok(())
        })
    }

    fn load_tickets(&self) -> PersistenceFuture<'_, Vec<Ticket>> {
        Box::pin(async move { Ok(self.tickets.read().unwrap().values().cloned().collect()) })
    }
}

// ============================================================================
// Mails
// ============================================================================

/// In-memory outbox storage for fast, deterministic testing.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMailRepository {
    mails: Arc<RwLock<HashMap<MailId, Mail>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryMailRepository {
    /// Create a new empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `mails` (for recovery tests)
    #[must_use]
    pub fn with_mails(mails: impl IntoIterator<Item = Mail>) -> Self {
        let repository = Self::new();
        {
            let mut map = repository.mails.write().unwrap();
            for mail in mails {
                map.insert(mail.id.clone(), mail);
            }
        }
        repository
    }

    /// Make every subsequent write and delete fail (or succeed again with `false`)
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Whether a mail is stored
    #[must_use]
    pub fn contains(&self, id: &MailId) -> bool {
        self.mails.read().unwrap().contains_key(id)
    }

    /// Number of stored mails
    #[must_use]
    pub fn len(&self) -> usize {
        self.mails.read().unwrap().len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mails.read().unwrap().is_empty()
    }
}

impl MailRepository for InMemoryMailRepository {
    fn save_mail<'a>(&'a self, mail: &'a Mail) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(write_failure());
            }
            self.mails
                .write()
                .unwrap()
                .insert(mail.id.clone(), mail.clone());
            Ok(())
        })
    }

    fn remove_mail<'a>(&'a self, id: &'a MailId) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(write_failure());
            }
            self.mails.write().unwrap().remove(id);
            Ok(())
        })
    }

    fn load_mails(&self) -> PersistenceFuture<'_, Vec<Mail>> {
        Box::pin(async move { Ok(self.mails.read().unwrap().values().cloned().collect()) })
    }
}

// ============================================================================
// Users
// ============================================================================

/// In-memory user set for fast, deterministic testing.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryUserRepository {
    /// Create a repository holding `users`
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users.into_iter().collect())),
            failing: Arc::default(),
        }
    }

    /// Make every subsequent write fail (or succeed again with `false`)
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stored copy of a user by login name
    #[must_use]
    pub fn get(&self, username: &str) -> Option<User> {
        self.users
            .read()
            .unwrap()
            .iter()
            .find(|user| user.username == username)
            .cloned()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn load_users(&self) -> PersistenceFuture<'_, Vec<User>> {
        Box::pin(async move { Ok(self.users.read().unwrap().clone()) })
    }

    fn save_users<'a>(&'a self, users: &'a [User]) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(write_failure());
            }
            *self.users.write().unwrap() = users.to_vec();
            Ok(())
        })
    }
}
