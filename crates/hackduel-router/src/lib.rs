//! HackDuel Router
//!
//! HTTP front end of the rating engine. Boots the entry store from the
//! durable store or seed dataset, starts the write-behind worker and serves
//! the judging API until shutdown.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::AppConfig;
use hackduel_engine::{bootstrap, BootstrapReport, Engine, EngineError, EntryStore};
use hackduel_store::{CsvSeed, SqliteStore};
use hackduel_sync::{FlushQueue, SyncWorker};
use handlers::{create_router, AppState};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Router error
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Entry store could not be populated
    #[error("Bootstrap error: {0}")]
    Bootstrap(#[from] EngineError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Bootstrapped engine with its sync worker running
pub struct Service {
    /// Rating and matchmaking engine
    pub engine: Arc<Engine>,
    /// How the entry pool was populated
    pub report: BootstrapReport,
    /// Whether the durable store could be opened at startup
    pub durable_connected: bool,
    /// Finishes once every engine handle is dropped and the queue is drained
    pub worker: JoinHandle<()>,
}

/// Populate the entry store and start the write-behind worker
///
/// An unreachable database is not fatal: the pool comes from the seed
/// dataset (or starts empty), and writes keep retrying the open, counting
/// durability gaps until it succeeds.
pub async fn build_service(config: &AppConfig) -> Result<Service, RouterError> {
    let durable = Arc::new(SqliteStore::open_lazy(&config.storage.database));
    let durable_connected = durable.is_connected();
    if !durable_connected {
        warn!(
            "Serving without a durable store at {}; commits are kept in memory only",
            config.storage.database.display()
        );
    }

    let store = Arc::new(EntryStore::new());
    let report = {
        let durable = Arc::clone(&durable);
        let store = Arc::clone(&store);
        let seed = config.storage.dataset.clone().map(CsvSeed::new);
        let rating = config.rating.clone();
        tokio::task::spawn_blocking(move || bootstrap(&store, durable.as_ref(), seed.as_ref(), &rating))
            .await
            .map_err(|e| RouterError::Server(e.to_string()))??
    };
    info!(
        "Bootstrap complete: {} entries from {:?} ({} quarantined)",
        report.loaded, report.source, report.quarantined
    );

    let (queue, receiver) = FlushQueue::channel(&config.sync);
    let worker = SyncWorker::new(durable, config.sync.clone(), receiver).spawn();
    let engine = Arc::new(Engine::new(store, queue, config.engine_config()));

    Ok(Service {
        engine,
        report,
        durable_connected,
        worker,
    })
}

/// Start the HackDuel HTTP server
///
/// Returns once a shutdown signal has been received and the flush queue has
/// been drained.
pub async fn start_server(config: AppConfig) -> Result<(), RouterError> {
    start_server_with_shutdown(config, shutdown_signal()).await
}

/// Start the HackDuel HTTP server, stopping when `shutdown` completes
pub async fn start_server_with_shutdown<F>(config: AppConfig, shutdown: F) -> Result<(), RouterError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Starting HackDuel");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.storage.database.display());

    let Service { engine, worker, .. } = build_service(&config).await?;
    let app = create_router(AppState { engine });

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("HackDuel listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RouterError::Server(e.to_string()))?;

    // The router owned the last engine handle, so the queue is closed now
    info!("Draining flush queue");
    worker.await.map_err(|e| RouterError::Server(e.to_string()))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
