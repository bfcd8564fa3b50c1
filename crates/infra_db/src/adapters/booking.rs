//! PostgreSQL Booking Store
//!
//! Implements `BookingPort` on top of [`BookingRepository`]. Slots are
//! flattened into `slot_kind`, `day_type` and minute offsets; flex days are
//! written with the offsets of their part of the day so the
//! `bookings_no_overlap` exclusion constraint covers them too. Pricing
//! snapshots, pattern templates and recurrence rules travel as JSONB.
//!
//! An exclusion-constraint violation surfaces as `PortError::Conflict`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    BookingId, DomainPort, HealthCheckResult, HealthCheckable, Holder, InvoiceId, LeaseId, Money,
    PatternId, Percentage, PortError, ResourceId,
};
use domain_booking::{
    Booking, BookingPort, BookingQuery, BookingStatus, DayType, HalfDayPeriod, Interval, Lease,
    RecurrencePattern, Slot, TariffCard,
};

use super::codec::{currency_from_code, holder_columns, holder_from_columns};
use crate::error::DatabaseError;
use crate::repositories::booking::{BookingFilter, BookingRepository, BookingRow, LeaseRow, PatternRow, TariffRow};

/// PostgreSQL-backed implementation of the BookingPort trait
#[derive(Debug, Clone)]
pub struct PgBookingStore {
    repository: BookingRepository,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BookingRepository::new(pool),
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &BookingRepository {
        &self.repository
    }
}

impl DomainPort for PgBookingStore {}

#[async_trait]
impl HealthCheckable for PgBookingStore {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(self.repository.pool(), "postgres-booking-store").await
    }
}

#[async_trait]
impl BookingPort for PgBookingStore {
    #[instrument(skip(self), fields(booking_id = %id))]
    async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError> {
        let row = self.repository.get(*id.as_uuid()).await?;
        Ok(booking_from_row(row)?)
    }

    #[instrument(skip(self))]
    async fn find_bookings(&self, query: BookingQuery) -> Result<Vec<Booking>, PortError> {
        let rows = self.repository.find(&filter_for(&query)).await?;
        debug!(count = rows.len(), "Loaded bookings");
        rows.into_iter()
            .map(|row| booking_from_row(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, booking), fields(booking_id = %booking.id))]
    async fn insert_booking(&self, booking: Booking) -> Result<Booking, PortError> {
        self.repository.insert(&booking_to_row(&booking)?).await?;
        Ok(booking)
    }

    #[instrument(skip(self, bookings), fields(count = bookings.len()))]
    async fn insert_bookings(&self, bookings: Vec<Booking>) -> Result<usize, PortError> {
        let rows = bookings
            .iter()
            .map(booking_to_row)
            .collect::<Result<Vec<_>, _>>()?;
        let written = self.repository.insert_many(&rows).await?;
        debug!(written, "Inserted booking batch");
        Ok(written as usize)
    }

    #[instrument(skip(self, booking), fields(booking_id = %booking.id))]
    async fn update_booking(&self, booking: Booking) -> Result<Booking, PortError> {
        self.repository.update(&booking_to_row(&booking)?).await?;
        Ok(booking)
    }

    #[instrument(skip(self), fields(booking_id = %id))]
    async fn delete_booking(&self, id: BookingId) -> Result<(), PortError> {
        Ok(self.repository.delete(*id.as_uuid()).await?)
    }

    #[instrument(skip(self), fields(pattern_id = %id))]
    async fn get_pattern(&self, id: PatternId) -> Result<RecurrencePattern, PortError> {
        let row = self.repository.get_pattern(*id.as_uuid()).await?;
        Ok(pattern_from_row(row)?)
    }

    #[instrument(skip(self, pattern), fields(pattern_id = %pattern.id))]
    async fn insert_pattern(&self, pattern: RecurrencePattern) -> Result<RecurrencePattern, PortError> {
        self.repository.insert_pattern(&pattern_to_row(&pattern)?).await?;
        Ok(pattern)
    }

    #[instrument(skip(self, pattern), fields(pattern_id = %pattern.id))]
    async fn update_pattern(&self, pattern: RecurrencePattern) -> Result<RecurrencePattern, PortError> {
        self.repository.update_pattern(&pattern_to_row(&pattern)?).await?;
        Ok(pattern)
    }

    #[instrument(skip(self), fields(resource_id = %resource_id))]
    async fn get_tariff_card(&self, resource_id: ResourceId) -> Result<TariffCard, PortError> {
        let row = self.repository.get_tariff(*resource_id.as_uuid()).await?;
        Ok(tariff_from_row(row)?)
    }

    #[instrument(skip(self), fields(holder = %holder))]
    async fn holder_discount(&self, holder: &Holder) -> Result<Percentage, PortError> {
        if !holder.is_billable() {
            return Ok(Percentage::ZERO);
        }
        let (holder_type, holder_id) = holder_columns(holder);
        match self.repository.get_discount(holder_type, holder_id).await? {
            Some(pct) => Percentage::new(pct)
                .map_err(|e| PortError::from(DatabaseError::serialization(e))),
            None => Ok(Percentage::ZERO),
        }
    }

    #[instrument(skip(self), fields(lease_id = %id))]
    async fn get_lease(&self, id: LeaseId) -> Result<Lease, PortError> {
        let row = self.repository.get_lease(*id.as_uuid()).await?;
        Ok(lease_from_row(row))
    }
}

// ============================================================================
// Row conversions
// ============================================================================

fn filter_for(query: &BookingQuery) -> BookingFilter {
    BookingFilter {
        resource_id: query.resource_id.map(|id| *id.as_uuid()),
        holder: query.holder.as_ref().map(holder_columns),
        pattern_id: query.pattern_id.map(|id| *id.as_uuid()),
        date_from: query.date_from,
        date_to: query.date_to,
        active_only: query.active_only,
        status: query.status.map(|s| s.as_str()),
    }
}

fn day_type_column(day_type: DayType) -> &'static str {
    match day_type {
        DayType::Full => "full",
        DayType::Half(HalfDayPeriod::Morning) => "morning",
        DayType::Half(HalfDayPeriod::Afternoon) => "afternoon",
    }
}

fn day_type_from_column(value: &str) -> Result<DayType, DatabaseError> {
    match value {
        "full" => Ok(DayType::Full),
        "morning" => Ok(DayType::Half(HalfDayPeriod::Morning)),
        "afternoon" => Ok(DayType::Half(HalfDayPeriod::Afternoon)),
        other => Err(DatabaseError::serialization(format!("unknown day type '{other}'"))),
    }
}

fn booking_to_row(booking: &Booking) -> Result<BookingRow, DatabaseError> {
    let (holder_type, holder_id) = holder_columns(&booking.holder);
    let interval = booking.interval();
    let (slot_kind, day_type) = match booking.slot {
        Slot::Timed { .. } => ("timed", None),
        Slot::FlexDay { day_type, .. } => ("flex_day", Some(day_type_column(day_type).to_string())),
    };
    let pricing = booking
        .pricing
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(DatabaseError::serialization)?;

    Ok(BookingRow {
        booking_id: *booking.id.as_uuid(),
        resource_id: *booking.resource_id.as_uuid(),
        holder_type: holder_type.to_string(),
        holder_id,
        booking_date: booking.date(),
        slot_kind: slot_kind.to_string(),
        day_type,
        start_minute: interval.start() as i32,
        end_minute: interval.end() as i32,
        status: booking.status.as_str().to_string(),
        pricing,
        pattern_id: booking.pattern_id.map(|id| *id.as_uuid()),
        invoice_id: booking.invoice_id.map(|id| *id.as_uuid()),
        is_exception: booking.is_exception,
        created_at: booking.created_at,
        updated_at: booking.updated_at,
    })
}

fn slot_from_row(row: &BookingRow) -> Result<Slot, DatabaseError> {
    match (row.slot_kind.as_str(), row.day_type.as_deref()) {
        ("timed", _) => {
            let start = minute(row.start_minute)?;
            let end = minute(row.end_minute)?;
            let interval = Interval::new(row.booking_date, start, end).map_err(DatabaseError::serialization)?;
            Ok(Slot::timed(interval))
        }
        ("flex_day", Some(day_type)) => Ok(Slot::flex(row.booking_date, day_type_from_column(day_type)?)),
        (kind, _) => Err(DatabaseError::serialization(format!(
            "booking {} has an unreadable slot of kind '{kind}'",
            row.booking_id
        ))),
    }
}

fn minute(value: i32) -> Result<u32, DatabaseError> {
    u32::try_from(value).map_err(|_| DatabaseError::serialization(format!("negative minute offset {value}")))
}

fn booking_from_row(row: BookingRow) -> Result<Booking, DatabaseError> {
    let slot = slot_from_row(&row)?;
    let status: BookingStatus = row.status.parse().map_err(DatabaseError::serialization)?;
    let pricing = row
        .pricing
        .map(serde_json::from_value)
        .transpose()
        .map_err(DatabaseError::serialization)?;

    Ok(Booking {
        id: BookingId::from_uuid(row.booking_id),
        resource_id: ResourceId::from_uuid(row.resource_id),
        holder: holder_from_columns(&row.holder_type, row.holder_id)?,
        slot,
        status,
        pricing,
        pattern_id: row.pattern_id.map(PatternId::from_uuid),
        invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
        is_exception: row.is_exception,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn pattern_to_row(pattern: &RecurrencePattern) -> Result<PatternRow, DatabaseError> {
    let (holder_type, holder_id) = holder_columns(&pattern.holder);
    Ok(PatternRow {
        pattern_id: *pattern.id.as_uuid(),
        resource_id: *pattern.resource_id.as_uuid(),
        holder_type: holder_type.to_string(),
        holder_id,
        template: serde_json::to_value(pattern.template).map_err(DatabaseError::serialization)?,
        rule: serde_json::to_value(pattern.rule).map_err(DatabaseError::serialization)?,
        start_date: pattern.start_date,
        end_date: pattern.end_date,
        active: pattern.active,
        created_at: pattern.created_at,
    })
}

fn pattern_from_row(row: PatternRow) -> Result<RecurrencePattern, DatabaseError> {
    Ok(RecurrencePattern {
        id: PatternId::from_uuid(row.pattern_id),
        resource_id: ResourceId::from_uuid(row.resource_id),
        holder: holder_from_columns(&row.holder_type, row.holder_id)?,
        template: serde_json::from_value(row.template).map_err(DatabaseError::serialization)?,
        rule: serde_json::from_value(row.rule).map_err(DatabaseError::serialization)?,
        start_date: row.start_date,
        end_date: row.end_date,
        active: row.active,
        created_at: row.created_at,
    })
}

fn tariff_from_row(row: TariffRow) -> Result<TariffCard, DatabaseError> {
    let currency = currency_from_code(&row.currency)?;
    let money = |amount| Money::new(amount, currency);
    let card = TariffCard::new(
        money(row.hourly_rate),
        row.half_day_rate.map(money),
        row.full_day_rate.map(money),
    )
    .map_err(DatabaseError::serialization)?;
    Ok(card.vat_inclusive(row.vat_inclusive))
}

fn lease_from_row(row: LeaseRow) -> Lease {
    Lease {
        id: LeaseId::from_uuid(row.lease_id),
        monthly_quota: row.monthly_quota,
        start_date: row.start_date,
        end_date: row.end_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};
    use core_kernel::{Currency, TenantId};
    use domain_booking::{PricingSnapshot, RecurrenceRule, SlotTemplate};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn eur(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::EUR)
    }

    #[test]
    fn test_timed_booking_row_keeps_offsets_and_pricing() {
        let card = TariffCard::new(eur(dec!(25)), Some(eur(dec!(80))), None).unwrap();
        let interval = Interval::new(date(2024, 3, 4), 9 * 60, 13 * 60).unwrap();
        let booking = Booking::new(ResourceId::new(), Holder::Tenant(TenantId::new()), Slot::timed(interval))
            .with_pricing(PricingSnapshot::price(&card, dec!(4), Percentage::new(dec!(10)).unwrap()));

        let row = booking_to_row(&booking).unwrap();
        assert_eq!(row.slot_kind, "timed");
        assert_eq!(row.day_type, None);
        assert_eq!((row.start_minute, row.end_minute), (540, 780));
        assert_eq!(row.holder_type, "tenant");

        assert_eq!(booking_from_row(row).unwrap(), booking);
    }

    #[test]
    fn test_flex_row_stores_canonical_offsets() {
        let booking = Booking::new(
            ResourceId::new(),
            Holder::Lease(LeaseId::new()),
            Slot::flex(date(2024, 3, 6), DayType::Half(HalfDayPeriod::Afternoon)),
        );
        let row = booking_to_row(&booking).unwrap();
        assert_eq!(row.slot_kind, "flex_day");
        assert_eq!(row.day_type.as_deref(), Some("afternoon"));
        assert_eq!((row.start_minute, row.end_minute), (720, 1440));
        assert_eq!(booking_from_row(row).unwrap().slot, booking.slot);
    }

    #[test]
    fn test_flex_row_without_day_type_is_rejected() {
        let booking = Booking::new(
            ResourceId::new(),
            Holder::Lease(LeaseId::new()),
            Slot::flex(date(2024, 3, 6), DayType::Full),
        );
        let mut row = booking_to_row(&booking).unwrap();
        row.day_type = None;
        assert!(booking_from_row(row).is_err());
    }

    #[test]
    fn test_pattern_json_columns() {
        let pattern = RecurrencePattern::new(
            ResourceId::new(),
            Holder::Tenant(TenantId::new()),
            SlotTemplate::Timed { start: 600, end: 660 },
            RecurrenceRule::weekly([Weekday::Mon, Weekday::Wed]),
            date(2024, 3, 1),
            None,
        )
        .unwrap();
        let row = pattern_to_row(&pattern).unwrap();
        assert_eq!(row.rule["type"], "weekly");
        assert_eq!(pattern_from_row(row).unwrap(), pattern);
    }

    #[test]
    fn test_tariff_row_conversion() {
        let row = TariffRow {
            resource_id: uuid::Uuid::new_v4(),
            currency: "EUR".into(),
            hourly_rate: dec!(10),
            half_day_rate: Some(dec!(36.30)),
            full_day_rate: Some(dec!(60.50)),
            vat_inclusive: true,
        };
        let card = tariff_from_row(row).unwrap();
        assert!(card.vat_inclusive);
        assert_eq!(card.half_day_rate, Some(eur(dec!(36.30))));
    }

    #[test]
    fn test_query_maps_to_filter() {
        let holder = Holder::Tenant(TenantId::new());
        let query = BookingQuery::for_holder(holder)
            .between(date(2024, 3, 1), date(2024, 3, 31))
            .active_only()
            .with_status(BookingStatus::Confirmed);
        let filter = filter_for(&query);
        assert_eq!(filter.holder.map(|(kind, _)| kind), Some("tenant"));
        assert_eq!(filter.status, Some("confirmed"));
        assert!(filter.active_only);
        assert_eq!(filter.date_to, Some(date(2024, 3, 31)));
    }
}
