//! # Ticketdesk Testing
//!
//! Testing utilities and helpers for the ticketdesk crates.
//!
//! This crate provides:
//! - Deterministic implementations of the environment traits
//!   ([`FixedClock`], [`SequentialIdGenerator`])
//! - In-memory Persistence Gateway doubles with write-failure injection
//! - A tracing initialiser for tests that want log output
//!
//! ## Example
//!
//! ```ignore
//! use ticketdesk_testing::{test_clock, InMemoryTicketRepository, SequentialIdGenerator};
//!
//! #[tokio::test]
//! async fn creates_ticket() {
//!     let repository = Arc::new(InMemoryTicketRepository::new());
//!     let store = TicketStore::new(repository.clone(), outbox, Arc::new(test_clock()), ids);
//!
//!     let ticket = store.create_ticket("a@b.com", "Help", "it's broken").await?;
//!     assert!(repository.contains(&ticket.id));
//! }
//! ```

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use ticketdesk_core::environment::{Clock, IdGenerator};

pub mod repository_mocks;

pub use repository_mocks::{InMemoryMailRepository, InMemoryTicketRepository, InMemoryUserRepository};

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{AtomicU64, Clock, DateTime, IdGenerator, Ordering, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticketdesk_testing::mocks::FixedClock;
    /// use ticketdesk_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable ids: `<prefix>0000000001`, `<prefix>0000000002`, ...
    ///
    /// Thread-safe, so it can back stores exercised from concurrent tasks.
    #[derive(Debug)]
    pub struct SequentialIdGenerator {
        prefix: String,
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Create a generator whose ids start with `prefix`
        #[must_use]
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: AtomicU64::new(1),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::Relaxed);
            format!("{}{n:010}", self.prefix)
        }
    }
}

/// Install a `fmt` subscriber honouring `RUST_LOG`, once per test binary.
///
/// Subsequent calls are no-ops, so every test may call it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, SequentialIdGenerator, test_clock};
