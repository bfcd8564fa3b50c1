//! Booking application service
//!
//! [`BookingEngine`] is the entry point for every booking operation: ad-hoc
//! and flex-day bookings, recurring pattern fills, status changes, moves,
//! deletions and the draft-invoice reconciliation that follows them. It
//! depends only on the [`domain_booking::BookingPort`] and
//! [`domain_billing::InvoicePort`] traits, so the same engine runs against
//! PostgreSQL or the in-memory mocks.

pub mod config;
pub mod error;
pub mod requests;
pub mod engine;
mod fill;
mod reconciliation;

pub use config::EngineConfig;
pub use error::EngineError;
pub use engine::BookingEngine;
pub use requests::{
    BookingKind, BookingMove, BookingRequest, Deletion, FillScope, FlexBookingRequest,
    FlexFillRequest, InvoiceRemoval, PatternDeactivation, PatternFill, PatternRequest,
    ReconciliationOutcome, StatusChange,
};
