//! Service wiring: cold start, poller, HTTP server and shutdown.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use super::config::Config;
use super::poller::Poller;
use super::state::AppState;
use crate::api;
use crate::engine::{Phase, ReconciliationEngine, ScrapeHealth};
use crate::error::{Error, Result};
use crate::source;
use crate::store::SnapshotStore;

/// Main application struct.
pub struct App;

impl App {
    /// Run until SIGINT or SIGTERM.
    pub async fn run(config: Config) -> Result<()> {
        Self::run_until(config, shutdown_signal()).await
    }

    /// Run until `signal` resolves, then stop the poller, drain the HTTP
    /// server and write the final state to disk.
    pub async fn run_until<F>(config: Config, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let state = build_state(&config);
        let engine = Arc::clone(state.engine());

        let source = source::from_config(&config.source)?;
        let poller = Poller::new(
            source,
            Arc::clone(&engine),
            config.poller.interval(),
            state.refresh_handle(),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller_handle = tokio::spawn(poller.run(shutdown_rx.clone()));

        let listener = match tokio::net::TcpListener::bind(config.bind_addr()?).await {
            Ok(listener) => listener,
            Err(e) => {
                let _ = shutdown_tx.send(true);
                let _ = poller_handle.await;
                return Err(e.into());
            }
        };
        info!(addr = %listener.local_addr()?, "HTTP server listening");

        let mut server_rx = shutdown_rx;
        let serve = axum::serve(listener, api::router(state))
            .with_graceful_shutdown(async move { wait_for_stop(&mut server_rx).await });
        let mut server = tokio::spawn(async move { serve.await });

        let early_exit = tokio::select! {
            () = signal => {
                info!("Shutdown signal received");
                None
            }
            joined = &mut server => Some(joined),
        };

        let _ = shutdown_tx.send(true);
        let served = match early_exit {
            Some(joined) => joined,
            None => server.await,
        };

        if let Err(e) = poller_handle.await {
            error!(error = %e, "Poller task failed");
            engine.health().mark_stopped(Phase::Failed);
        }

        let flush_engine = Arc::clone(&engine);
        if let Err(e) = tokio::task::spawn_blocking(move || flush_engine.flush()).await {
            error!(error = %e, "Final flush aborted");
        }
        info!("oddsfeed stopped");

        match served {
            Ok(result) => result.map_err(Error::from),
            Err(e) => Err(Error::Server(e.to_string())),
        }
    }
}

/// Restore persisted state and assemble the engine.
pub fn build_state(config: &Config) -> AppState {
    let persistence = config.storage.persistence();
    let loaded = persistence.load();
    info!(
        matches = loaded.snapshot.as_ref().map_or(0, |s| s.len()),
        mappings = loaded.mapping.len(),
        dir = %config.storage.data_dir.display(),
        "State restored"
    );

    let store = Arc::new(SnapshotStore::from_loaded(
        loaded,
        config.storage.history_limit,
    ));
    let health = Arc::new(ScrapeHealth::new(config.poller.recovery_threshold));
    let engine = ReconciliationEngine::new(store, health)
        .with_persistence(persistence, config.storage.persist_policy());
    AppState::new(Arc::new(engine))
}

async fn wait_for_stop(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
