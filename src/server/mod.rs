//! HTTP server and background scheduler.

pub mod auth;
pub mod http;
pub mod scheduler;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;

use crate::core::tracker::UsageTracker;
use crate::error::Result;
use crate::storage::ResolvedConfig;

pub use http::{AppState, create_router};

/// Serve the API until ctrl-c.
///
/// # Errors
/// Returns an error if the store cannot be opened or the address cannot be
/// bound.
pub async fn serve(config: &ResolvedConfig) -> Result<()> {
    let tracker = UsageTracker::from_config(config)?;
    let state = AppState::new(tracker, config.cron_secret.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = config.schedule_enabled.then(|| {
        tokio::spawn(scheduler::budget_tick_loop(
            Arc::new(state.tracker().clone()),
            config.schedule_interval,
            shutdown_rx.clone(),
        ))
    });

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    let local_addr = listener.local_addr()?;
    let cron_auth = config.cron_secret.as_deref().map(auth::fingerprint);
    tracing::info!(
        addr = %local_addr,
        storage = state.tracker().store().backend_name(),
        openai_budget = config.budgets.openai,
        gemini_budget = config.budgets.gemini,
        cron_auth = cron_auth.as_deref(),
        scheduler = config.schedule_enabled,
        "spendwatch listening"
    );

    let app = create_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    })
    .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler {
        let _ = handle.await;
    }
    Ok(())
}
