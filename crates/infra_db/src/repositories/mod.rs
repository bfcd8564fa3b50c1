//! Repository implementations for the booking tables
//!
//! Repositories own the SQL. They read and write plain row structs and
//! know nothing about the domain types; the adapters in
//! [`crate::adapters`] translate between the two.
//!
//! All queries are built at runtime with `sqlx::query_as` and
//! `sqlx::QueryBuilder`, so the crate builds without a live database.

pub mod booking;
pub mod invoice;

pub use booking::BookingRepository;
pub use invoice::InvoiceRepository;
