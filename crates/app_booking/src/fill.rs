//! Recurring patterns and bulk fills
//!
//! A fill walks the dates a pattern selects, skips the ones that collide
//! with an existing booking or would overdraw a lease's monthly credits,
//! and writes the rest in bounded batches. Conflicts and quota are checked
//! against a schedule loaded once per fill and updated as dates are taken,
//! so the occurrences of one fill never collide with each other.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use tracing::{debug, info, instrument, warn};

use core_kernel::{Holder, PatternId, Percentage, YearMonth};
use domain_booking::{
    Booking, BookingQuery, BookingStatus, DaySchedule, Lease, PricingSnapshot, RecurrencePattern,
    RollingLedger, Slot, SlotTemplate, TariffCard,
};

use crate::engine::BookingEngine;
use crate::error::EngineError;
use crate::requests::{FillScope, FlexFillRequest, PatternDeactivation, PatternFill, PatternRequest};

/// Tariff and discount of a billable holder, fetched once per fill
struct Pricer {
    card: TariffCard,
    discount: Percentage,
}

impl Pricer {
    fn price(&self, slot: &Slot) -> PricingSnapshot {
        PricingSnapshot::price(&self.card, slot.billable_hours(), self.discount)
    }
}

impl BookingEngine {
    /// Persists a recurring pattern and fills it with bookings
    ///
    /// A bounded pattern is filled over its whole span; an open-ended one up
    /// to the configured horizon, and further with [`Self::extend_pattern`].
    #[instrument(skip(self, request), fields(resource_id = %request.resource_id, rule = %request.rule))]
    pub async fn create_recurring_pattern(&self, request: PatternRequest) -> Result<PatternFill, EngineError> {
        let pattern = request.into_pattern()?;

        let lease = match pattern.holder {
            Holder::Lease(lease_id) => {
                if !matches!(pattern.template, SlotTemplate::FlexDay { .. }) {
                    return Err(EngineError::validation("lease holders can only book flex days"));
                }
                Some(self.bookings.get_lease(lease_id).await?)
            }
            _ => None,
        };
        if let SlotTemplate::Timed { .. } = pattern.template {
            pattern
                .template
                .at(pattern.start_date)?
                .interval()
                .ensure_aligned(self.config.slot_granularity_minutes)?;
        }

        let until = match pattern.end_date {
            Some(end) => end,
            None => horizon(pattern.start_date, self.config.open_pattern_horizon_days),
        };

        let pattern = self.bookings.insert_pattern(pattern).await?;
        info!(pattern_id = %pattern.id, "Recurrence pattern created");

        self.fill_pattern(&pattern, pattern.start_date, until, lease.as_ref())
            .await
    }

    /// Fills a lease's flex desk by a rule over its contract or one month
    ///
    /// Dates beyond the monthly quota are skipped like conflicting dates.
    #[instrument(skip(self, request), fields(lease_id = %request.lease_id, scope = ?request.scope))]
    pub async fn fill_flex_pattern(&self, request: FlexFillRequest) -> Result<PatternFill, EngineError> {
        let lease = self.bookings.get_lease(request.lease_id).await?;

        let range = match request.scope {
            FillScope::Contract => lease.contract_range().ok_or_else(|| {
                EngineError::validation("an open-ended lease has no contract span to fill; fill by month")
            })?,
            FillScope::Month(month) => lease.month_range(month).ok_or_else(|| {
                EngineError::validation(format!("lease is not active in {month}"))
            })?,
        };

        let pattern = RecurrencePattern::new(
            request.resource_id,
            lease.holder(),
            SlotTemplate::FlexDay {
                day_type: request.day_type,
            },
            request.rule,
            range.start,
            Some(range.end),
        )?;
        let pattern = self.bookings.insert_pattern(pattern).await?;
        info!(pattern_id = %pattern.id, start = %range.start, end = %range.end, "Flex pattern created");

        self.fill_pattern(&pattern, range.start, range.end, Some(&lease)).await
    }

    /// Fills an active pattern further, up to and including `until`
    ///
    /// Dates that already carry one of the pattern's bookings are left alone.
    #[instrument(skip(self), fields(pattern_id = %pattern_id, until = %until))]
    pub async fn extend_pattern(&self, pattern_id: PatternId, until: NaiveDate) -> Result<PatternFill, EngineError> {
        let pattern = self.bookings.get_pattern(pattern_id).await?;
        pattern.ensure_active()?;

        let lease = match pattern.holder.lease_id() {
            Some(lease_id) => Some(self.bookings.get_lease(lease_id).await?),
            None => None,
        };

        let existing = self
            .bookings
            .find_bookings(BookingQuery::for_pattern(pattern_id))
            .await?;
        let from = existing
            .iter()
            .filter(|b| !b.is_exception)
            .map(Booking::date)
            .max()
            .and_then(|last| last.checked_add_days(Days::new(1)))
            .unwrap_or(pattern.start_date);

        if from > until {
            return Ok(PatternFill::new(pattern_id));
        }
        self.fill_pattern(&pattern, from, until, lease.as_ref()).await
    }

    /// Stops a pattern as of `end_date`
    ///
    /// Bookings on or before `end_date` are kept. With `cancel_future`, the
    /// pattern's later bookings are cancelled and removed from their
    /// invoices; occurrences moved by hand are left alone.
    #[instrument(skip(self), fields(pattern_id = %pattern_id, end_date = %end_date))]
    pub async fn deactivate_pattern(
        &self,
        pattern_id: PatternId,
        end_date: NaiveDate,
        cancel_future: bool,
    ) -> Result<PatternDeactivation, EngineError> {
        let mut pattern = self.bookings.get_pattern(pattern_id).await?;
        pattern.deactivate(end_date);
        let pattern = self.bookings.update_pattern(pattern).await?;

        let mut cancelled = 0;
        let mut warnings = Vec::new();

        if cancel_future {
            let cutoff = pattern.end_date.unwrap_or(end_date);
            let future = self
                .bookings
                .find_bookings(BookingQuery::for_pattern(pattern_id).active_only())
                .await?;

            for mut booking in future
                .into_iter()
                .filter(|b| b.date() > cutoff && !b.is_exception)
                .filter(|b| b.status.can_transition_to(BookingStatus::Cancelled))
            {
                let outcome = self.reconcile_removal(&mut booking).await;
                if outcome.is_warning() {
                    warnings.push(outcome);
                }
                booking.update_status(BookingStatus::Cancelled)?;
                if let Err(source) = self.bookings.update_booking(booking).await {
                    warn!(cancelled, error = %source, "Pattern cancellation halted");
                    return Err(EngineError::PartialCancellation { cancelled, source });
                }
                cancelled += 1;
            }
        }

        info!(cancelled, warnings = warnings.len(), "Recurrence pattern deactivated");
        Ok(PatternDeactivation {
            pattern,
            cancelled,
            warnings,
        })
    }

    /// Writes the pattern's bookings for the dates it selects in `[from, to]`
    async fn fill_pattern(
        &self,
        pattern: &RecurrencePattern,
        from: NaiveDate,
        to: NaiveDate,
        lease: Option<&Lease>,
    ) -> Result<PatternFill, EngineError> {
        let mut fill = PatternFill::new(pattern.id);

        let taken = self
            .bookings
            .find_bookings(
                BookingQuery::for_resource(pattern.resource_id)
                    .between(from, to)
                    .active_only(),
            )
            .await?;
        let mut schedule = DaySchedule::from_bookings(&taken);
        let already: HashSet<NaiveDate> = self
            .bookings
            .find_bookings(BookingQuery::for_pattern(pattern.id))
            .await?
            .iter()
            .map(Booking::date)
            .collect();

        let mut ledger = match lease {
            Some(lease) => {
                let (first, last) = (YearMonth::of(from).first_day(), YearMonth::of(to).last_day());
                let used = self
                    .bookings
                    .find_bookings(BookingQuery::for_holder(lease.holder()).between(first, last).active_only())
                    .await?;
                Some(RollingLedger::new(lease.id, lease.monthly_quota, &used))
            }
            None => None,
        };

        let pricer = if pattern.holder.is_billable() {
            Some(Pricer {
                card: self.bookings.get_tariff_card(pattern.resource_id).await?,
                discount: self.bookings.holder_discount(&pattern.holder).await?,
            })
        } else {
            None
        };

        let batch_size = self.config.effective_batch_size();
        let mut batch = Vec::with_capacity(batch_size);

        for date in pattern.occurrences(from, to) {
            if already.contains(&date) {
                continue;
            }
            if lease.is_some_and(|l| !l.is_active_on(date)) {
                continue;
            }

            let slot = pattern.template.at(date)?;
            if schedule.conflicts(&slot.interval()) {
                debug!(%date, "Skipping occupied date");
                fill.skipped_conflicts += 1;
                continue;
            }
            if let (Some(ledger), Some(day_type)) = (ledger.as_mut(), slot.day_type()) {
                if !ledger.try_consume(date, day_type) {
                    debug!(%date, "Skipping date over credit quota");
                    fill.skipped_quota += 1;
                    continue;
                }
            }
            schedule.insert(slot.interval());

            let mut booking = Booking::new(pattern.resource_id, pattern.holder, slot).with_pattern(pattern.id);
            if let Some(pricer) = &pricer {
                booking = booking.with_pricing(pricer.price(&slot));
            }
            batch.push(booking);

            if batch.len() >= batch_size {
                self.flush(&mut batch, &mut fill).await?;
            }
        }
        if !batch.is_empty() {
            self.flush(&mut batch, &mut fill).await?;
        }

        info!(
            pattern_id = %pattern.id,
            created = fill.created,
            skipped_conflicts = fill.skipped_conflicts,
            skipped_quota = fill.skipped_quota,
            "Pattern filled"
        );
        Ok(fill)
    }

    async fn flush(&self, batch: &mut Vec<Booking>, fill: &mut PatternFill) -> Result<(), EngineError> {
        let rows = std::mem::take(batch);
        match self.bookings.insert_bookings(rows).await {
            Ok(written) => {
                fill.created += written;
                debug!(written, total = fill.created, "Batch written");
                Ok(())
            }
            Err(source) => Err(EngineError::PartialBatch {
                committed: fill.created,
                source,
            }),
        }
    }
}

fn horizon(start: NaiveDate, days: u64) -> NaiveDate {
    start.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_saturates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(horizon(start, 31), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(horizon(NaiveDate::MAX, 1), NaiveDate::MAX);
    }
}
