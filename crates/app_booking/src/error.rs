//! Engine error taxonomy

use chrono::NaiveDate;
use core_kernel::{InvoiceId, PortError, ResourceId};
use domain_billing::{BillingError, InvoiceStatus};
use domain_booking::BookingError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by [`crate::BookingEngine`] operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required selection is missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested slot overlaps an existing booking
    #[error("Conflict on resource {resource_id} at {date}: {detail}")]
    Conflict {
        resource_id: ResourceId,
        date: NaiveDate,
        detail: String,
    },

    #[error("Credit quota exceeded: {used} of {quota} used, {remaining} remaining")]
    QuotaExceeded {
        used: Decimal,
        remaining: Decimal,
        quota: Decimal,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invoice {invoice_id} is {status} and cannot be changed")]
    InvoiceLocked {
        invoice_id: InvoiceId,
        status: InvoiceStatus,
    },

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// A bulk insert stopped part way; `committed` rows were written
    #[error("Bulk insert halted after {committed} bookings: {source}")]
    PartialBatch {
        committed: usize,
        #[source]
        source: PortError,
    },

    /// Cancelling a pattern's bookings stopped part way; `cancelled`
    /// bookings and their invoices were already updated
    #[error("Cancellation halted after {cancelled} bookings: {source}")]
    PartialCancellation {
        cancelled: usize,
        #[source]
        source: PortError,
    },

    #[error("Store error: {0}")]
    Store(#[source] PortError),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    /// Store-level constraint violation on a write, reported as a conflict
    pub(crate) fn from_write(err: PortError, resource_id: ResourceId, date: NaiveDate) -> Self {
        match err {
            PortError::Conflict { message } => EngineError::Conflict {
                resource_id,
                date,
                detail: message,
            },
            other => other.into(),
        }
    }
}

impl From<PortError> for EngineError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => EngineError::NotFound { entity_type, id },
            PortError::Validation { message, .. } => EngineError::Validation(message),
            other => EngineError::Store(other),
        }
    }
}

impl From<BookingError> for EngineError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidStatusTransition { from, to } => {
                EngineError::InvalidTransition { from, to }
            }
            other => EngineError::Validation(other.to_string()),
        }
    }
}

impl From<BillingError> for EngineError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvoiceLocked { invoice_id, status } => {
                EngineError::InvoiceLocked { invoice_id, status }
            }
            other => EngineError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflict_becomes_conflict() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let err = EngineError::from_write(PortError::conflict("bookings_no_overlap"), ResourceId::new(), date);
        assert!(matches!(err, EngineError::Conflict { .. }));

        let err = EngineError::from_write(PortError::connection("down"), ResourceId::new(), date);
        assert!(matches!(err, EngineError::Store(_)));
    }

    #[test]
    fn test_not_found_passthrough() {
        let err: EngineError = PortError::not_found("Booking", "BKG-1").into();
        assert!(matches!(err, EngineError::NotFound { ref entity_type, .. } if entity_type == "Booking"));
    }

    #[test]
    fn test_domain_transition_error() {
        let err: EngineError = BookingError::InvalidStatusTransition {
            from: "cancelled".into(),
            to: "confirmed".into(),
        }
        .into();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }
}
