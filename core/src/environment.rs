//! Environment traits for dependency injection.
//!
//! All non-deterministic inputs (time and fresh identifiers) are abstracted
//! behind traits and injected into the stores, so tests can substitute a
//! fixed clock and predictable ids.

use chrono::{DateTime, Utc};
use rand::{Rng, distributions::Alphanumeric};

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use ticketdesk_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let earlier = clock.now();
/// assert!(clock.now() >= earlier);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of fresh identifiers for tickets and mails.
///
/// Implementations must be safe to call concurrently from many handlers.
pub trait IdGenerator: Send + Sync {
    /// Produce a new identifier
    fn next_id(&self) -> String;
}

/// Random alphanumeric ids drawn from a 62-symbol alphabet.
///
/// Uses the thread-local generator from `rand`, which is a CSPRNG seeded once
/// per thread from the operating system. Nothing is reseeded per call.
#[derive(Debug, Clone, Copy)]
pub struct RandomIdGenerator {
    length: usize,
}

impl RandomIdGenerator {
    /// Shortest id length accepted; shorter requests are clamped up to this
    pub const MIN_LENGTH: usize = 10;

    /// Create a generator producing ids of `length` symbols (at least [`Self::MIN_LENGTH`])
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(Self::MIN_LENGTH),
        }
    }

    /// Length of the generated ids
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new(Self::MIN_LENGTH)
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}
