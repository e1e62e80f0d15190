//! Handlers shared by every ticketdesk router.

pub mod health;

pub use health::{HealthResponse, health_check, method_not_allowed};
