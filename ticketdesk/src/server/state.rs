//! Application state for the ticketdesk HTTP server.

use crate::outbox::MailOutbox;
use crate::tickets::TicketStore;
use crate::users::UserDirectory;
use axum::extract::FromRef;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request. Handlers extract only the part
/// they need through [`FromRef`].
#[derive(Clone)]
pub struct AppState {
    /// Ticket Store (ingestion)
    pub tickets: Arc<TicketStore>,
    /// Mail Outbox (dispatch)
    pub outbox: Arc<MailOutbox>,
    /// Editor set
    pub users: Arc<UserDirectory>,
    /// Renders `/metrics`; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(
        tickets: Arc<TicketStore>,
        outbox: Arc<MailOutbox>,
        users: Arc<UserDirectory>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            tickets,
            outbox,
            users,
            metrics,
        }
    }
}

impl FromRef<AppState> for Arc<TicketStore> {
    fn from_ref(state: &AppState) -> Self {
        state.tickets.clone()
    }
}

impl FromRef<AppState> for Arc<MailOutbox> {
    fn from_ref(state: &AppState) -> Self {
        state.outbox.clone()
    }
}

impl FromRef<AppState> for Option<PrometheusHandle> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}
