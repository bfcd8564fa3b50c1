//! Booking orchestrator
//!
//! [`BookingEngine`] ties the pure booking rules to the record stores. Every
//! operation is a sequence of reads followed by writes; conflict and quota
//! checks read fresh state on every call and nothing is cached between
//! requests.
//!
//! The conflict check and the following insert are not atomic. When the
//! store enforces non-overlap itself, the constraint violation it reports is
//! surfaced as [`EngineError::Conflict`] just like a failed check.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use core_kernel::{
    BookingId, HealthCheckResult, Holder, LeaseId, ResourceId, YearMonth,
};
use domain_billing::InvoicePort;
use domain_booking::{
    agenda, find_conflict, free_slots, Booking, BookingPort, BookingQuery, BookingStatus,
    CreditLedger, Interval, Lease, PricingSnapshot, Slot, MINUTES_PER_DAY,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::requests::{
    BookingMove, BookingRequest, Deletion, FlexBookingRequest, ReconciliationOutcome,
    StatusChange,
};

/// The booking orchestrator
///
/// Holds the two record-store ports and the engine configuration. Cheap to
/// clone behind an `Arc` and safe to share between request handlers.
pub struct BookingEngine {
    pub(crate) bookings: Arc<dyn BookingPort>,
    pub(crate) invoices: Arc<dyn InvoicePort>,
    pub(crate) config: EngineConfig,
}

impl BookingEngine {
    pub fn new(
        bookings: Arc<dyn BookingPort>,
        invoices: Arc<dyn InvoicePort>,
        config: EngineConfig,
    ) -> Self {
        Self {
            bookings,
            invoices,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Single bookings
    // ========================================================================

    /// Creates an ad-hoc booking
    ///
    /// Validates the request, resolves the price, checks for conflicts and
    /// persists the booking as confirmed. Lease holders are routed through
    /// [`Self::create_flex_booking`] so their credit quota applies.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing selections or malformed times
    /// - `Conflict` if the slot overlaps an active booking
    /// - `QuotaExceeded` for a lease without credits left that month
    #[instrument(skip(self, request), fields(resource_id = ?request.resource_id))]
    pub async fn create_booking(&self, request: BookingRequest) -> Result<Booking, EngineError> {
        let (resource_id, holder, slot) = request.validate()?;

        if let Holder::Lease(lease_id) = holder {
            let day_type = slot
                .day_type()
                .ok_or_else(|| EngineError::validation("lease holders can only book flex days"))?;
            return self
                .create_flex_booking(FlexBookingRequest {
                    lease_id,
                    resource_id,
                    date: slot.date(),
                    day_type,
                })
                .await;
        }

        if let Slot::Timed { interval } = &slot {
            interval.ensure_aligned(self.config.slot_granularity_minutes)?;
        }

        let pricing = self.price(resource_id, &holder, &slot).await?;
        self.ensure_free(resource_id, &slot.interval(), None).await?;

        let booking = Booking::new(resource_id, holder, slot).with_pricing(pricing);
        let booking = self
            .bookings
            .insert_booking(booking)
            .await
            .map_err(|e| EngineError::from_write(e, resource_id, slot.date()))?;

        info!(
            booking_id = %booking.id,
            tier = %pricing.tier,
            final_amount = %pricing.final_amount,
            "Booking created"
        );
        Ok(booking)
    }

    /// Books a flex desk against a lease's monthly credits
    #[instrument(skip(self, request), fields(lease_id = %request.lease_id, date = %request.date))]
    pub async fn create_flex_booking(&self, request: FlexBookingRequest) -> Result<Booking, EngineError> {
        let lease = self.bookings.get_lease(request.lease_id).await?;
        lease.ensure_active_on(request.date)?;

        let ledger = self.ledger_for(&lease, YearMonth::of(request.date)).await?;
        let check = ledger.can_consume(request.day_type);
        if !check.allowed {
            return Err(EngineError::QuotaExceeded {
                used: check.used,
                remaining: check.remaining(),
                quota: check.quota,
            });
        }

        let slot = Slot::flex(request.date, request.day_type);
        self.ensure_free(request.resource_id, &slot.interval(), None).await?;

        let booking = Booking::new(request.resource_id, lease.holder(), slot);
        let booking = self
            .bookings
            .insert_booking(booking)
            .await
            .map_err(|e| EngineError::from_write(e, request.resource_id, request.date))?;

        info!(
            booking_id = %booking.id,
            used = %(check.used + request.day_type.credit_cost()),
            quota = %check.quota,
            "Flex booking created"
        );
        Ok(booking)
    }

    /// Applies a status transition
    ///
    /// Cancelling a booking that is on an invoice first removes it from the
    /// invoice. A locked invoice or a failing invoice store does not stop
    /// the cancellation; the outcome reports it instead.
    #[instrument(skip(self), fields(booking_id = %id, status = %status))]
    pub async fn change_status(&self, id: BookingId, status: BookingStatus) -> Result<StatusChange, EngineError> {
        let mut booking = self.bookings.get_booking(id).await?;
        if !booking.status.can_transition_to(status) {
            return Err(EngineError::InvalidTransition {
                from: booking.status.to_string(),
                to: status.to_string(),
            });
        }

        let invoice = if status == BookingStatus::Cancelled {
            self.reconcile_removal(&mut booking).await
        } else {
            ReconciliationOutcome::NotLinked
        };

        booking.update_status(status)?;
        let booking = self.bookings.update_booking(booking).await?;

        info!(invoice = ?invoice, "Booking status changed");
        Ok(StatusChange { booking, invoice })
    }

    /// Moves a booking to another slot without repricing it
    ///
    /// The booking's own id is excluded from the conflict check and, for a
    /// lease, from the credit count of the target month. A booking generated
    /// by a pattern becomes an exception to it. If the booking is on an
    /// invoice, its lines are rewritten for the new slot; a locked invoice
    /// or a failing invoice store is reported in the outcome.
    #[instrument(skip(self, target), fields(booking_id = %id, date = %target.date()))]
    pub async fn move_booking(&self, id: BookingId, target: Slot) -> Result<BookingMove, EngineError> {
        let mut booking = self.bookings.get_booking(id).await?;
        if !matches!(booking.status, BookingStatus::Pending | BookingStatus::Confirmed) {
            return Err(EngineError::validation(format!(
                "a {} booking cannot be moved",
                booking.status
            )));
        }
        if booking.slot.is_flex() != target.is_flex() {
            return Err(EngineError::validation(
                "a booking cannot change between timed and flex-day slots",
            ));
        }
        if let Slot::Timed { interval } = &target {
            interval.ensure_aligned(self.config.slot_granularity_minutes)?;
        }

        if let (Some(lease_id), Some(day_type)) = (booking.holder.lease_id(), target.day_type()) {
            let lease = self.bookings.get_lease(lease_id).await?;
            lease.ensure_active_on(target.date())?;
            let check = self
                .ledger_excluding(&lease, YearMonth::of(target.date()), Some(booking.id))
                .await?
                .can_consume(day_type);
            if !check.allowed {
                return Err(EngineError::QuotaExceeded {
                    used: check.used,
                    remaining: check.remaining(),
                    quota: check.quota,
                });
            }
        }

        self.ensure_free(booking.resource_id, &target.interval(), Some(booking.id)).await?;

        let resource_id = booking.resource_id;
        booking.reschedule(target);
        let mut booking = self
            .bookings
            .update_booking(booking)
            .await
            .map_err(|e| EngineError::from_write(e, resource_id, target.date()))?;

        let linked = booking.invoice_id;
        let invoice = self.reconcile_move(&mut booking).await;
        if booking.invoice_id != linked {
            booking = self.bookings.update_booking(booking).await?;
        }

        info!(is_exception = booking.is_exception, invoice = ?invoice, "Booking moved");
        Ok(BookingMove { booking, invoice })
    }

    /// Deletes a booking permanently, removing it from its invoice first
    #[instrument(skip(self), fields(booking_id = %id))]
    pub async fn delete_booking(&self, id: BookingId) -> Result<Deletion, EngineError> {
        let mut booking = self.bookings.get_booking(id).await?;
        let invoice = self.reconcile_removal(&mut booking).await;
        self.bookings.delete_booking(id).await?;

        info!(invoice = ?invoice, "Booking deleted");
        Ok(Deletion {
            booking_id: id,
            invoice,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Credits used and remaining for a lease in a month
    #[instrument(skip(self), fields(lease_id = %lease_id, month = %month))]
    pub async fn credit_usage(&self, lease_id: LeaseId, month: YearMonth) -> Result<CreditLedger, EngineError> {
        let lease = self.bookings.get_lease(lease_id).await?;
        self.ledger_for(&lease, month).await
    }

    /// Active bookings of a resource on a day, by start time
    #[instrument(skip(self))]
    pub async fn day_agenda(&self, resource_id: ResourceId, date: NaiveDate) -> Result<Vec<Booking>, EngineError> {
        let day = self.active_on(resource_id, date).await?;
        Ok(agenda(&day).into_iter().cloned().collect())
    }

    /// Free gaps of a resource on a day within `[open_from, open_until)`
    #[instrument(skip(self))]
    pub async fn free_slots(
        &self,
        resource_id: ResourceId,
        date: NaiveDate,
        open_from: u32,
        open_until: u32,
    ) -> Result<Vec<Interval>, EngineError> {
        if open_from >= open_until || open_until > MINUTES_PER_DAY {
            return Err(EngineError::validation(format!(
                "invalid opening hours {open_from}-{open_until}"
            )));
        }
        let busy: Vec<Interval> = self
            .active_on(resource_id, date)
            .await?
            .iter()
            .map(Booking::interval)
            .collect();
        Ok(free_slots(date, &busy, open_from, open_until))
    }

    /// Health of both record stores
    pub async fn health_check(&self) -> Vec<HealthCheckResult> {
        vec![
            self.bookings.health_check().await,
            self.invoices.health_check().await,
        ]
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    pub(crate) async fn price(
        &self,
        resource_id: ResourceId,
        holder: &Holder,
        slot: &Slot,
    ) -> Result<PricingSnapshot, EngineError> {
        let card = self.bookings.get_tariff_card(resource_id).await?;
        let discount = self.bookings.holder_discount(holder).await?;
        Ok(PricingSnapshot::price(&card, slot.billable_hours(), discount))
    }

    async fn active_on(&self, resource_id: ResourceId, date: NaiveDate) -> Result<Vec<Booking>, EngineError> {
        Ok(self
            .bookings
            .find_bookings(BookingQuery::for_resource(resource_id).on(date).active_only())
            .await?)
    }

    /// Fails with `Conflict` if `interval` overlaps an active booking
    pub(crate) async fn ensure_free(
        &self,
        resource_id: ResourceId,
        interval: &Interval,
        exclude: Option<BookingId>,
    ) -> Result<(), EngineError> {
        let day = self.active_on(resource_id, interval.date()).await?;
        if let Some(existing) = find_conflict(interval, &day, exclude) {
            debug!(existing = %existing.id, "Slot already taken");
            return Err(EngineError::Conflict {
                resource_id,
                date: interval.date(),
                detail: format!(
                    "{} overlaps booking {} ({})",
                    interval.time_range(),
                    existing.id,
                    existing.slot.describe()
                ),
            });
        }
        Ok(())
    }

    /// Recomputes a lease's usage for `month` from its bookings
    pub(crate) async fn ledger_for(&self, lease: &Lease, month: YearMonth) -> Result<CreditLedger, EngineError> {
        self.ledger_excluding(lease, month, None).await
    }

    /// Usage for `month` not counting the booking `exclude`
    async fn ledger_excluding(
        &self,
        lease: &Lease,
        month: YearMonth,
        exclude: Option<BookingId>,
    ) -> Result<CreditLedger, EngineError> {
        let bookings = self
            .bookings
            .find_bookings(
                BookingQuery::for_holder(lease.holder())
                    .between(month.first_day(), month.last_day())
                    .active_only(),
            )
            .await?;
        let counted = bookings.iter().filter(|b| Some(b.id) != exclude);
        Ok(CreditLedger::from_bookings(lease.id, month, lease.monthly_quota, counted))
    }
}
