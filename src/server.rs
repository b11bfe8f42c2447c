//! Reusable reservation service runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full service lifecycle:
//! metrics, database init, migrations, the reservation engine, the
//! activation sweep, and graceful shutdown.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::reservation::{start_activation_task, ReservationEngine};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::{init_database, run_migrations, SeaOrmRepositoryProvider};
use crate::shared::clock::SystemClock;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the reservation service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running reservation service.
///
/// Exposes the engine and event bus to whatever front end embeds it.
///
/// ```rust,no_run
/// use parking_reservation::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Entry point for every booking operation.
    pub engine: Arc<ReservationEngine>,
    /// Lifecycle and payment-intent events.
    pub event_bus: SharedEventBus,
    /// Repository provider for data access.
    pub repos: Arc<dyn RepositoryProvider>,
    /// The configuration the service was started with.
    pub config: AppConfig,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    sweep_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the reservation service with the given options.
    ///
    /// This will:
    /// 1. Install the Prometheus exporter (if enabled)
    /// 2. Connect to the database and run migrations
    /// 3. Build the reservation engine
    /// 4. Start the activation sweep
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting parking reservation service...");

        // ── Prometheus exporter ────────────────────────────────
        if app_cfg.metrics.enabled {
            let addr = app_cfg.metrics_addr()?;
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()?;
            info!(%addr, "Prometheus exporter listening");
        }

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database_config()).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            run_migrations(&db).await?;
        }

        // ── Repositories & Engine ──────────────────────────────
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let event_bus = create_event_bus();
        let settings = app_cfg.reservation_settings()?;
        info!(
            lock_timeout_ms = settings.lock_timeout.as_millis() as u64,
            retry_max_attempts = settings.retry.max_attempts,
            overstay_multiplier = %settings.overstay_multiplier,
            "Reservation engine configured"
        );
        let engine = Arc::new(ReservationEngine::new(
            repos.clone(),
            event_bus.clone(),
            Arc::new(SystemClock),
            settings,
        ));

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);

        // ── Background tasks ───────────────────────────────────
        let sweep_task = start_activation_task(
            engine.clone(),
            shutdown.signal(),
            app_cfg.reservation.activation_interval_secs,
        );

        info!("Reservation service started");

        Ok(Self {
            engine,
            event_bus,
            repos,
            config: app_cfg,
            db,
            shutdown,
            sweep_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the service to fully stop after shutdown has been triggered.
    pub async fn wait(self) {
        info!("Waiting for background tasks to complete...");

        let sweep_task = self.sweep_task;
        let db = self.db;
        let finished = self
            .shutdown
            .shutdown_with_cleanup(|| async move {
                match sweep_task.await {
                    Ok(()) => info!("Activation sweep stopped"),
                    Err(e) => error!("Activation sweep task panicked: {}", e),
                }
                if let Err(e) = db.close().await {
                    warn!("Error closing database connection: {}", e);
                } else {
                    info!("Database connection closed");
                }
            })
            .await;

        if !finished {
            warn!("Shutdown timed out before cleanup finished");
        }
        info!("Parking reservation service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down parking reservation service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the background sweep is still running.
    pub fn is_running(&self) -> bool {
        !self.sweep_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_and_stops_on_in_memory_database() {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;
        config.server.shutdown_timeout = 5;

        let handle = ServerHandle::start(ServerOptions {
            config,
            auto_migrate: true,
        })
        .await
        .unwrap();
        assert!(handle.is_running());
        assert!(handle.engine.list_user_bookings("nobody").await.unwrap().is_empty());
        handle.shutdown().await;
    }
}
