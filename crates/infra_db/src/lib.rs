//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the booking engine, built on SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern:
//! - [`repositories`] own the SQL and read and write plain row structs
//! - [`adapters`] implement the domain ports (`BookingPort`, `InvoicePort`)
//!   and translate rows to domain types
//!
//! Non-overlap of active bookings is enforced by the `bookings_no_overlap`
//! exclusion constraint in the schema, so concurrent writers that both pass
//! the engine's pre-check cannot commit overlapping rows.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgBookingStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/bookings")).await?;
//! run_migrations(&pool).await?;
//! let store = PgBookingStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::{PgBookingStore, PgInvoiceStore};
