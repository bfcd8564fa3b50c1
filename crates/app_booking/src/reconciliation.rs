//! Invoice reconciliation
//!
//! Keeps draft invoices in step with the bookings linked to them. A booking
//! is added to the draft invoice of its holder for the month it falls in;
//! cancelling or deleting it removes its lines again, and an invoice left
//! without charges is deleted rather than kept as an empty draft. Moving a
//! booking rewrites its lines, on the draft of the new month if it changed.

use tracing::{info, instrument, warn};

use core_kernel::{BookingId, Holder, InvoiceId, YearMonth};
use domain_billing::{net_of_vat, BillingError, BookingCharge, DraftInvoice};
use domain_booking::{Booking, PricingSnapshot, RateTier};

use crate::engine::BookingEngine;
use crate::error::EngineError;
use crate::requests::{InvoiceRemoval, ReconciliationOutcome};

impl BookingEngine {
    /// Adds a booking to its holder's draft invoice for the booking month
    ///
    /// Creates the draft if none exists. Calling it again for the same
    /// booking replaces its lines, so it is safe to repeat.
    ///
    /// # Errors
    ///
    /// - `Validation` for cancelled, unpriced or lease bookings
    /// - `InvoiceLocked` if the booking's invoice has been issued
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn generate_or_update_invoice_for_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<DraftInvoice, EngineError> {
        let mut booking = self.bookings.get_booking(booking_id).await?;
        if !booking.is_active() {
            return Err(EngineError::validation("a cancelled booking cannot be invoiced"));
        }
        if !booking.holder.is_billable() {
            return Err(EngineError::validation(
                "lease bookings are covered by credits and are not invoiced",
            ));
        }
        let pricing = booking
            .pricing
            .ok_or_else(|| EngineError::validation("booking has no price to invoice"))?;

        let charge = self.charge_for(&booking, &pricing)?;
        let linked = self.linked_invoice(&booking).await?;
        let invoice = self.place_charge(&mut booking, linked, &charge).await?;
        self.bookings.update_booking(booking).await?;

        info!(
            invoice_id = %invoice.id,
            subtotal = %invoice.subtotal,
            total = %invoice.total,
            "Booking invoiced"
        );
        Ok(invoice)
    }

    /// Removes a booking from its invoice
    ///
    /// Unlike cancellation, a locked invoice is reported as an error here.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn remove_booking_from_invoice(&self, booking_id: BookingId) -> Result<InvoiceRemoval, EngineError> {
        let mut booking = self.bookings.get_booking(booking_id).await?;
        let was_linked = booking.invoice_id.is_some();

        let outcome = self.detach_from_invoice(&mut booking).await?;
        if was_linked {
            self.bookings.update_booking(booking).await?;
        }

        Ok(InvoiceRemoval {
            invoice_updated: matches!(outcome, ReconciliationOutcome::Updated { .. }),
            invoice_deleted: matches!(outcome, ReconciliationOutcome::Deleted { .. }),
        })
    }

    /// Removal as a side effect of cancel or delete; never fails
    pub(crate) async fn reconcile_removal(&self, booking: &mut Booking) -> ReconciliationOutcome {
        let Some(invoice_id) = booking.invoice_id else {
            return ReconciliationOutcome::NotLinked;
        };
        let result = self.detach_from_invoice(booking).await;
        non_fatal(invoice_id, result)
    }

    /// Rewrites a moved booking's invoice lines; never fails
    ///
    /// Updates the booking's link in memory only.
    pub(crate) async fn reconcile_move(&self, booking: &mut Booking) -> ReconciliationOutcome {
        let Some(invoice_id) = booking.invoice_id else {
            return ReconciliationOutcome::NotLinked;
        };
        let result = self.follow_move(booking, invoice_id).await;
        non_fatal(invoice_id, result)
    }

    async fn follow_move(&self, booking: &mut Booking, previous: InvoiceId) -> Result<ReconciliationOutcome, EngineError> {
        let Some(linked) = self.linked_invoice(booking).await? else {
            booking.link_invoice(None);
            return Ok(ReconciliationOutcome::NotLinked);
        };
        let Some(pricing) = booking.pricing else {
            return self.detach_from_invoice(booking).await;
        };

        let charge = self.charge_for(booking, &pricing)?;
        let invoice = self.place_charge(booking, Some(linked), &charge).await?;
        Ok(if invoice.id == previous {
            ReconciliationOutcome::Updated { invoice_id: previous }
        } else {
            ReconciliationOutcome::Moved {
                from: previous,
                to: invoice.id,
            }
        })
    }

    /// Removes the booking's lines from its invoice and unlinks it
    ///
    /// Does not persist the booking; callers write it with their own change.
    pub(crate) async fn detach_from_invoice(&self, booking: &mut Booking) -> Result<ReconciliationOutcome, EngineError> {
        let Some(invoice_id) = booking.invoice_id else {
            return Ok(ReconciliationOutcome::NotLinked);
        };

        let mut invoice = match self.invoices.get_invoice(invoice_id).await {
            Ok(invoice) => invoice,
            Err(e) if e.is_not_found() => {
                booking.link_invoice(None);
                return Ok(ReconciliationOutcome::NotLinked);
            }
            Err(e) => return Err(e.into()),
        };

        let removal = invoice.remove_booking(booking.id)?;
        let outcome = if removal.now_empty {
            self.invoices.delete_invoice(invoice_id).await?;
            ReconciliationOutcome::Deleted { invoice_id }
        } else {
            if removal.removed {
                self.invoices.update_invoice(invoice).await?;
            }
            ReconciliationOutcome::Updated { invoice_id }
        };

        booking.link_invoice(None);
        info!(%invoice_id, outcome = ?outcome, "Booking removed from invoice");
        Ok(outcome)
    }

    /// The invoice the booking is linked to, if it still exists
    async fn linked_invoice(&self, booking: &Booking) -> Result<Option<DraftInvoice>, EngineError> {
        let Some(id) = booking.invoice_id else {
            return Ok(None);
        };
        match self.invoices.get_invoice(id).await {
            Ok(invoice) => Ok(Some(invoice)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Puts the charge on the draft for the booking's month and links it
    ///
    /// Replaces the booking's lines on `linked` when it covers that month,
    /// otherwise detaches the booking from it first.
    async fn place_charge(
        &self,
        booking: &mut Booking,
        linked: Option<DraftInvoice>,
        charge: &BookingCharge,
    ) -> Result<DraftInvoice, EngineError> {
        let period = YearMonth::of(booking.date());
        let invoice = match linked {
            Some(mut invoice) if invoice.period == period && invoice.holder == booking.holder => {
                invoice.add_booking(charge)?;
                self.invoices.update_invoice(invoice).await?
            }
            Some(_) => {
                self.detach_from_invoice(booking).await?;
                self.add_to_draft(charge, booking.holder, period).await?
            }
            None => self.add_to_draft(charge, booking.holder, period).await?,
        };
        booking.link_invoice(Some(invoice.id));
        Ok(invoice)
    }

    async fn add_to_draft(
        &self,
        charge: &BookingCharge,
        holder: Holder,
        period: YearMonth,
    ) -> Result<DraftInvoice, EngineError> {
        match self.invoices.find_draft(&holder, period).await? {
            Some(mut invoice) => {
                invoice.add_booking(charge)?;
                Ok(self.invoices.update_invoice(invoice).await?)
            }
            None => {
                let mut invoice = DraftInvoice::new(
                    holder,
                    period,
                    self.config.currency,
                    self.config.vat_rate,
                    self.config.payment_term_days,
                );
                invoice.add_booking(charge)?;
                info!(invoice_number = %invoice.invoice_number, "Draft invoice created");
                Ok(self.invoices.insert_invoice(invoice).await?)
            }
        }
    }

    /// Net-of-VAT contribution of a booking
    fn charge_for(&self, booking: &Booking, pricing: &PricingSnapshot) -> Result<BookingCharge, EngineError> {
        let (amount, discount_amount) = if pricing.vat_inclusive {
            (
                net_of_vat(pricing.amount, self.config.vat_rate).map_err(BillingError::from)?,
                net_of_vat(pricing.discount_amount, self.config.vat_rate).map_err(BillingError::from)?,
            )
        } else {
            (pricing.amount, pricing.discount_amount)
        };

        Ok(BookingCharge {
            booking_id: booking.id,
            holder: booking.holder,
            date: booking.date(),
            time_range: booking.slot.describe(),
            rate_description: rate_description(pricing),
            amount,
            discount_pct: pricing.discount_pct,
            discount_amount,
        })
    }
}

/// Turns a reconciliation error into a warning outcome
fn non_fatal(
    invoice_id: InvoiceId,
    result: Result<ReconciliationOutcome, EngineError>,
) -> ReconciliationOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(EngineError::InvoiceLocked { invoice_id, status }) => {
            warn!(%invoice_id, %status, "Invoice is locked; booking left on it");
            ReconciliationOutcome::Locked { invoice_id }
        }
        Err(err) => {
            warn!(%invoice_id, error = %err, "Invoice reconciliation failed");
            ReconciliationOutcome::Failed {
                invoice_id,
                error: err.to_string(),
            }
        }
    }
}

fn rate_description(pricing: &PricingSnapshot) -> String {
    match pricing.tier {
        RateTier::Hourly => format!("{} {}/h", pricing.tier.label(), pricing.applied_rate),
        RateTier::HalfDay | RateTier::FullDay => pricing.tier.label().to_string(),
    }
}
