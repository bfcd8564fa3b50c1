//! Billing domain errors

use core_kernel::{InvoiceId, MoneyError};
use thiserror::Error;

use crate::invoice::InvoiceStatus;

/// Errors that can occur in the billing domain
#[derive(Debug, Error, PartialEq)]
pub enum BillingError {
    /// Only draft invoices may be changed
    #[error("Invoice {invoice_id} is {status} and can no longer be changed")]
    InvoiceLocked {
        invoice_id: InvoiceId,
        status: InvoiceStatus,
    },

    #[error("Invalid invoice status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    /// The charge belongs to a different holder or month than the invoice
    #[error("Charge does not belong on this invoice: {0}")]
    ForeignCharge(String),

    #[error(transparent)]
    Money(#[from] MoneyError),
}
