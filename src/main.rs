//! EV charging booking service
//!
//! Reads configuration from a TOML file (~/.config/evcs-booking/config.toml,
//! or the path in $EVCS_CONFIG) and serves the REST API.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use evcs_booking::config::LoggingConfig;
use evcs_booking::shared::shutdown::ShutdownCoordinator;
use evcs_booking::shared::time::{SharedClock, SystemClock};
use evcs_booking::{
    config_path, connect_and_migrate, create_api_router, AppConfig, AppState, BookingLifecycle,
    DatabaseConfig, InMemoryRepositoryProvider, RepositoryProvider, SeaOrmRepositoryProvider,
    StationCapacityReconciler,
};

fn init_tracing(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if cfg.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let path = config_path();
    let (app_cfg, load_error) = match AppConfig::load(&path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_tracing(&app_cfg.logging);
    match load_error {
        None => info!("Configuration loaded from {}", path.display()),
        Some(e) => error!("Failed to load config: {}. Using defaults.", e),
    }

    info!("Starting EV charging booking service...");

    // ── Prometheus recorder (before any metrics calls) ─────────
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    evcs_booking::interfaces::http::modules::metrics::describe_metrics();
    info!("Prometheus metrics recorder installed");

    // ── Storage ────────────────────────────────────────────────
    let db = if app_cfg.database.is_memory() {
        warn!("Using the in-memory store; data is lost on exit");
        None
    } else {
        let db_config = DatabaseConfig {
            url: app_cfg.database.connection_url(),
            ..Default::default()
        };
        match connect_and_migrate(&db_config).await {
            Ok(db) => Some(db),
            Err(e) => {
                error!("Failed to prepare database: {}", e);
                return Err(e.into());
            }
        }
    };
    let repos: Arc<dyn RepositoryProvider> = match &db {
        Some(db) => Arc::new(SeaOrmRepositoryProvider::new(db.clone())),
        None => Arc::new(InMemoryRepositoryProvider::new()),
    };

    // ── Services ───────────────────────────────────────────────
    let clock: SharedClock = Arc::new(SystemClock);
    let store_timeout = app_cfg.booking.repository_timeout();
    let bookings = Arc::new(BookingLifecycle::new(
        repos.clone(),
        clock.clone(),
        app_cfg.booking.policy(),
        store_timeout,
    ));
    let stations = Arc::new(StationCapacityReconciler::new(repos, clock, store_timeout));
    info!(
        advance_window_days = app_cfg.booking.advance_window_days,
        lock_window_hours = app_cfg.booking.lock_window_hours,
        repository_timeout_ms = app_cfg.booking.repository_timeout_ms,
        "Booking policy configured"
    );

    let router = create_api_router(
        AppState::new(bookings, stations, db.clone()),
        Some(prometheus_handle),
    );

    // ── Shutdown ───────────────────────────────────────────────
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    // ── HTTP server ────────────────────────────────────────────
    let addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REST API listening on http://{}", addr);
    info!("Swagger UI available at http://{}/docs/", addr);

    let api_shutdown = shutdown_signal.clone();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                api_shutdown.wait().await;
                info!("REST API server received shutdown signal");
            })
            .await;
        // a server that stopped on its own still has to release the coordinator
        shutdown_signal.trigger();
        result
    });

    let drained = shutdown
        .shutdown_with_cleanup(|| async move {
            match server.await {
                Ok(Ok(())) => info!("REST API server stopped"),
                Ok(Err(e)) => error!("REST API server error: {}", e),
                Err(e) => error!("REST API server task panicked: {}", e),
            }
            if let Some(db) = db {
                match db.close().await {
                    Ok(()) => info!("Database connection closed"),
                    Err(e) => warn!("Error closing database connection: {}", e),
                }
            }
        })
        .await;
    if !drained {
        warn!("In-flight requests abandoned after shutdown timeout");
    }

    info!("EV charging booking service shutdown complete");
    Ok(())
}
