//! Test Utilities Crate
//!
//! Shared test infrastructure for the booking engine suites.
//!
//! # Modules
//!
//! - `fixtures`: Fixed dates, ids, tariff cards and leases
//! - `builders`: Booking builder and pre-seeded in-memory stores
//! - `database`: PostgreSQL test container with the booking schema
//! - `assertions`: Double-booking and invoice consistency checks
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
