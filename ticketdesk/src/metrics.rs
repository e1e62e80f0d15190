//! Business metrics for ticketdesk.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ticketdesk_tickets_created_total` - Tickets opened (via ingestion or the store API)
//! - `ticketdesk_entries_appended_total{reply_type}` - Entries appended to tickets
//! - `ticketdesk_assignments_total{action}` - Assign / unassign operations
//! - `ticketdesk_merges_total` - Tickets merged into another ticket
//! - `ticketdesk_mails_enqueued_total{event}` - Notifications placed in the outbox
//! - `ticketdesk_mails_verified_total{outcome}` - Verification calls (verified / unknown)
//!
//! ## Gauges
//! - `ticketdesk_pending_mails` - Mails waiting in the outbox

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install the Prometheus recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Install the Prometheus recorder and register metric descriptions.
///
/// The returned handle renders the text exposition served at `/metrics`.
///
/// # Errors
///
/// Returns [`MetricsError::Install`] if a global recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;
    register_business_metrics();
    Ok(handle)
}

/// Register all business metric descriptions.
pub fn register_business_metrics() {
    describe_counter!(
        "ticketdesk_tickets_created_total",
        "Total number of tickets created"
    );
    describe_counter!(
        "ticketdesk_entries_appended_total",
        "Total number of entries appended, by reply type (internal, external)"
    );
    describe_counter!(
        "ticketdesk_assignments_total",
        "Total number of assignment changes, by action (assign, unassign)"
    );
    describe_counter!(
        "ticketdesk_merges_total",
        "Total number of ticket merges"
    );
    describe_counter!(
        "ticketdesk_mails_enqueued_total",
        "Total number of notification mails enqueued, by event"
    );
    describe_counter!(
        "ticketdesk_mails_verified_total",
        "Total number of mail verification calls, by outcome (verified, unknown)"
    );
    describe_gauge!(
        "ticketdesk_pending_mails",
        "Current number of mails waiting in the outbox"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a ticket created.
pub fn record_ticket_created() {
    metrics::counter!("ticketdesk_tickets_created_total").increment(1);
}

/// Record an entry appended.
///
/// # Arguments
///
/// * `reply_type` - `"internal"` or `"external"`
pub fn record_entry_appended(reply_type: &'static str) {
    metrics::counter!("ticketdesk_entries_appended_total", "reply_type" => reply_type)
        .increment(1);
}

/// Record an assign or unassign.
pub fn record_assignment(action: &'static str) {
    metrics::counter!("ticketdesk_assignments_total", "action" => action).increment(1);
}

/// Record a merge.
pub fn record_merge() {
    metrics::counter!("ticketdesk_merges_total").increment(1);
}

/// Record a notification enqueued for `event`.
pub fn record_mail_enqueued(event: &'static str) {
    metrics::counter!("ticketdesk_mails_enqueued_total", "event" => event).increment(1);
    tracing::debug!(event, "Recorded mail_enqueued metric");
}

/// Record a verification call.
pub fn record_mail_verified(verified: bool) {
    let outcome = if verified { "verified" } else { "unknown" };
    metrics::counter!("ticketdesk_mails_verified_total", "outcome" => outcome).increment(1);
}

/// Set the pending mail gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_pending_mails(count: usize) {
    metrics::gauge!("ticketdesk_pending_mails").set(count as f64);
}
