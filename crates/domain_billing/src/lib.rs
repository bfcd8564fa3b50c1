//! Billing Domain - Draft Invoices
//!
//! Monthly draft invoices per holder, kept in step with the bookings they
//! bill for.
//!
//! # Reconciliation
//!
//! - Adding a booking appends a charge line and, if a discount applied, a
//!   discount line; totals and VAT are recomputed from the lines
//! - Removing a booking drops its lines by booking id; an invoice left
//!   without charges should be deleted by the caller
//! - Only `Draft` invoices change; anything else fails with
//!   [`BillingError::InvoiceLocked`]
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{DraftInvoice, BookingCharge};
//!
//! let mut invoice = DraftInvoice::new(holder, period, Currency::EUR, vat, 14);
//! invoice.add_booking(&charge)?;
//! let removal = invoice.remove_booking(charge.booking_id)?;
//! assert!(removal.now_empty);
//! ```

pub mod invoice;
pub mod ports;
pub mod error;

pub use invoice::{
    net_of_vat, BookingCharge, DraftInvoice, InvoiceLine, InvoiceStatus, LineKind, LineRemoval,
};
pub use ports::InvoicePort;
pub use error::BillingError;
