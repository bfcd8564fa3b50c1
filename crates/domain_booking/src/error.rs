//! Booking domain errors

use chrono::NaiveDate;
use core_kernel::MoneyError;
use thiserror::Error;

/// Errors that can occur in the booking domain
#[derive(Debug, Error, PartialEq)]
pub enum BookingError {
    #[error("Invalid interval: start {start} must be before end {end} within one day")]
    InvalidInterval { start: u32, end: u32 },

    #[error("Interval {start}-{end} is not aligned to a {granularity}-minute grid")]
    OffGrid { start: u32, end: u32, granularity: u32 },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),

    #[error("Lease is not valid on {0}")]
    LeaseNotActive(NaiveDate),

    #[error("Pattern is inactive")]
    PatternInactive,

    #[error(transparent)]
    Money(#[from] MoneyError),
}
