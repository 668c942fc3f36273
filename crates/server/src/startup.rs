//! `serve`: wire the store, ticker, probes and router together and run until
//! Ctrl-C.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use salesdash_core::Config;
use salesdash_ingest::{IngestionTicker, RecordGenerator, TickerMetrics};
use salesdash_store::open_store;
use salesdash_store::seed::seed;

use crate::probe::Prober;
use crate::router::build_router;
use crate::state::AppState;

pub async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();

    let store = open_store(&config.postgres).await?;
    if !store.is_persistent() {
        // Nothing survives a restart in memory; start from the seed data.
        seed(store.as_ref(), false).await?;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (ticker_metrics, ticker_handle) = if config.ticker.enabled {
        let ticker = IngestionTicker::new(
            store.clone(),
            RecordGenerator::from_entropy(),
            TickerMetrics::new(),
            config.ticker.interval(),
        );
        let metrics = ticker.metrics();
        (Some(metrics), Some(ticker.spawn(shutdown_rx.clone())))
    } else {
        info!("ingestion ticker disabled");
        (None, None)
    };

    let prober = Prober::from_config(&config.probes)?;
    let state = Arc::new(AppState::new(
        store,
        config.dashboard.clone(),
        prober,
        ticker_metrics,
    ));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    info!("Server listening on http://{}", config.server.bind_addr());

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Keep the sender alive so the server keeps running.
                warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    let mut server_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*server_shutdown.borrow() {
                if server_shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    if let Some(handle) = ticker_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "ingestion ticker task failed");
        }
    }

    info!("server stopped");
    Ok(())
}
