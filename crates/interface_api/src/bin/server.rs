//! Booking API Server Binary
//!
//! Starts the HTTP API over the PostgreSQL record stores.
//!
//! # Usage
//!
//! ```bash
//! BOOKING_DATABASE_URL=postgres://... cargo run --bin booking-api
//! ```
//!
//! # Environment Variables
//!
//! * `BOOKING_HOST` - Server host (default: 0.0.0.0)
//! * `BOOKING_PORT` - Server port (default: 8080)
//! * `BOOKING_DATABASE_URL` - PostgreSQL connection string
//! * `BOOKING_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `BOOKING_LOG_JSON` - Emit JSON log lines (default: false)
//! * `BOOKING_ENGINE__*` - Engine settings, e.g. `BOOKING_ENGINE__VAT_RATE=21`

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use app_booking::BookingEngine;
use infra_db::{create_pool, run_migrations, DatabaseConfig, PgBookingStore, PgInvoiceStore};
use interface_api::{config::ApiConfig, create_router};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid BOOKING_* configuration")?;

    init_tracing(&config.log_level, config.log_json);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting booking API server"
    );

    let pool = create_pool(DatabaseConfig::new(config.database_url.clone()))
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool).await.context("failed to apply migrations")?;

    let engine = BookingEngine::new(
        Arc::new(PgBookingStore::new(pool.clone())),
        Arc::new(PgInvoiceStore::new(pool)),
        config.engine.clone(),
    );
    let app = create_router(Arc::new(engine));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Installs the global subscriber
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
