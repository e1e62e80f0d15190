//! # Ticketdesk Core
//!
//! Domain model and seams shared by every ticketdesk crate.
//!
//! The tracker itself is split into two authoritative stores (tickets and the
//! mail outbox) that live in the `ticketdesk` application crate. This crate holds
//! what both of them, the HTTP layer and the test doubles agree on:
//!
//! - **Model**: [`Ticket`], [`Entry`], [`Status`], [`ReplyType`], [`Assignee`],
//!   [`User`] and [`Mail`]
//! - **Identifiers**: [`TicketId`], [`MailId`] and [`UserId`] (separate id spaces)
//! - **Errors**: the [`TicketError`] taxonomy and [`PersistenceError`]
//! - **Environment**: [`Clock`] and [`IdGenerator`], injected so tests stay deterministic
//! - **Persistence Gateway**: [`TicketRepository`], [`MailRepository`] and
//!   [`UserRepository`]
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────┐      ┌────────────────────────┐
//! │  Ingestion / Dispatch  │─────▶│  Ticket Store / Outbox │
//! │  (thin HTTP adapters)  │      │  (one lock per store)  │
//! └────────────────────────┘      └───────────┬────────────┘
//!                                             │ save / remove
//!                                             ▼
//!                                 ┌────────────────────────┐
//!                                 │   Persistence Gateway  │
//!                                 │   (JSON file per id)   │
//!                                 └────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod environment;
pub mod error;
pub mod ids;
pub mod mail;
pub mod persistence;
pub mod ticket;
pub mod user;

pub use environment::{Clock, IdGenerator, RandomIdGenerator, SystemClock};
pub use error::{PersistenceError, Result, TicketError};
pub use ids::{MailId, TicketId, UserId};
pub use mail::Mail;
pub use persistence::{MailRepository, PersistenceFuture, TicketRepository, UserRepository};
pub use ticket::{Assignee, Entry, ReplyType, Status, Ticket};
pub use user::User;

// Re-export chrono types used throughout the public API
pub use chrono::{DateTime, Utc};
