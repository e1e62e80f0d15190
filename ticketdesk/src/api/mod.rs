//! HTTP adapters for the external mail service.
//!
//! - [`dispatch`]: the outbox, drained by the polling mail sender
//! - [`ingestion`]: incoming customer mail, turned into tickets and replies
//!
//! Both adapters own no state. They parse the request, call one or two store
//! operations and map the outcome through [`AppError`](ticketdesk_web::AppError).

pub mod dispatch;
pub mod ingestion;
