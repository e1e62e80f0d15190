//! Ticketdesk - a support-ticket tracker fed by e-mail
//!
//! Customers write to the support address. An external mail service forwards
//! every incoming message to the ingestion endpoint, which either opens a new
//! ticket or appends a reply to an existing one. Each change that owes the
//! customer a notification enqueues a mail in the outbox; the same mail service
//! polls the outbox, sends what it finds and confirms each delivery.
//!
//! # Architecture
//!
//! ```text
//!      mail service                          mail service
//!   POST /api/receive                 GET /api/fetchMails
//!          │                          POST /api/verifyMail
//!          ▼                                   │
//! ┌─────────────────┐   enqueue    ┌─────────────────┐
//! │  Ticket Store   │─────────────▶│   Mail Outbox   │
//! │  (lifecycle)    │              │  (at-least-once)│
//! └────────┬────────┘              └────────┬────────┘
//!          │ save                            │ save / remove
//!          ▼                                 ▼
//! ┌───────────────────────────────────────────────────┐
//! │        Persistence Gateway (JSON file per id)      │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! # Key Features
//!
//! ## 1. Write-through stores
//!
//! Each store serialises its read-modify-write cycles behind one lock and
//! persists a record before the in-memory copy changes. A failed write leaves
//! both unchanged.
//!
//! ## 2. Reply threading
//!
//! Outgoing subjects carry a `[Ticket "<id>"]` marker. Replies that keep it are
//! appended to that ticket (following merges) and reopen it when closed.
//!
//! ## 3. At-least-once delivery
//!
//! A mail stays in the outbox until the mail service verifies it. Restarts
//! reload pending mails from disk, so an unconfirmed mail is offered again.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod metrics;
pub mod notifications;
pub mod outbox;
pub mod persistence;
pub mod server;
pub mod tickets;
pub mod users;

pub use bootstrap::{Repositories, Services};
pub use config::Config;
pub use notifications::{MailEvent, MailTemplate, RenderedMail};
pub use outbox::MailOutbox;
pub use persistence::{JsonFileMailRepository, JsonFileTicketRepository, JsonFileUserRepository};
pub use server::{AppState, build_router};
pub use tickets::{NewEntry, TicketStore};
pub use users::{HolidayPolicy, UserDirectory};
