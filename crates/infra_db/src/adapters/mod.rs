//! Domain Adapters
//!
//! PostgreSQL implementations of the record-store ports consumed by the
//! booking engine. Each adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::{PgBookingStore, PgInvoiceStore};
//! use std::sync::Arc;
//!
//! let bookings = Arc::new(PgBookingStore::new(pool.clone()));
//! let invoices = Arc::new(PgInvoiceStore::new(pool));
//! let engine = BookingEngine::new(bookings, invoices, EngineConfig::default());
//! ```

pub mod booking;
pub mod invoice;
mod codec;

pub use booking::PgBookingStore;
pub use invoice::PgInvoiceStore;

use chrono::Utc;
use core_kernel::{AdapterHealth, HealthCheckResult};
use sqlx::PgPool;

/// Runs `SELECT 1` and reports the round trip as a health check result
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        },
        Err(e) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(format!("Database error: {}", e)),
            checked_at: Utc::now(),
        },
    }
}
