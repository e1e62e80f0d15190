//! Ticketdesk HTTP server.
//!
//! Serves the mail-service APIs over the JSON-file stores.

use std::time::Duration;
use ticketdesk::{
    AppState, Config, Services, build_router, metrics, server::shutdown_signal,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ticketdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting ticketdesk");

    let config = Config::from_env();
    info!(
        tickets_dir = %config.storage.tickets_dir.display(),
        mails_dir = %config.storage.mails_dir.display(),
        users_file = %config.storage.users_file.display(),
        holiday_policy = ?config.tickets.holiday_policy,
        "Configuration loaded"
    );

    let metrics_handle = if config.server.metrics_enabled {
        let handle = metrics::install_recorder()?;
        info!("📊 Prometheus recorder installed");
        Some(handle)
    } else {
        None
    };

    let services = Services::from_config(&config).await?;
    info!(
        tickets = services.tickets.list_tickets().await.len(),
        pending_mails = services.outbox.len().await,
        users = services.users.list().await.len(),
        "📂 Stores ready"
    );

    let state = AppState::new(
        services.tickets,
        services.outbox,
        services.users,
        metrics_handle,
    );
    let app = build_router(state, config.request_timeout());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🌐 Listening on http://{addr}");

    let grace = config.shutdown_timeout();
    let (drained_tx, drained_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            drained_tx.send(()).ok();
        })
        .into_future();

    tokio::select! {
        result = server => result?,
        () = shutdown_deadline(drained_rx, grace) => {
            warn!(grace_secs = grace.as_secs(), "In-flight requests did not finish in time, exiting");
        }
    }

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Resolve `grace` after the shutdown signal fired; pending forever before it.
async fn shutdown_deadline(signalled: tokio::sync::oneshot::Receiver<()>, grace: Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}
