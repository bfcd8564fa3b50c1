//! Booking entity and its status lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{BookingId, Holder, InvoiceId, PatternId, ResourceId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BookingError;
use crate::interval::{Interval, MIDDAY, MINUTES_PER_DAY};
use crate::tariff::{PricingSnapshot, FULL_DAY_HOURS, HALF_DAY_HOURS};

/// Which half of the day a half-day flex booking covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfDayPeriod {
    Morning,
    Afternoon,
}

/// Flex-desk day type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Full,
    Half(HalfDayPeriod),
}

impl DayType {
    /// Credits consumed by one booking of this type
    pub fn credit_cost(&self) -> Decimal {
        match self {
            DayType::Full => dec!(1),
            DayType::Half(_) => dec!(0.5),
        }
    }

    /// Hours charged when a billable holder books a flex day
    pub fn billable_hours(&self) -> Decimal {
        match self {
            DayType::Full => FULL_DAY_HOURS,
            DayType::Half(_) => HALF_DAY_HOURS,
        }
    }

    /// The part of the day this type occupies, for conflict checks
    pub fn interval_on(&self, date: NaiveDate) -> Interval {
        let (start, end) = match self {
            DayType::Full => (0, MINUTES_PER_DAY),
            DayType::Half(HalfDayPeriod::Morning) => (0, MIDDAY),
            DayType::Half(HalfDayPeriod::Afternoon) => (MIDDAY, MINUTES_PER_DAY),
        };
        Interval::whole_day(date).with_offsets(start, end)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayType::Full => "full day",
            DayType::Half(HalfDayPeriod::Morning) => "half day (morning)",
            DayType::Half(HalfDayPeriod::Afternoon) => "half day (afternoon)",
        }
    }
}

/// What a booking reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slot {
    /// A meeting-room style reservation with explicit times
    Timed { interval: Interval },
    /// A flex-desk day or half day
    FlexDay { date: NaiveDate, day_type: DayType },
}

impl Slot {
    pub fn timed(interval: Interval) -> Self {
        Slot::Timed { interval }
    }

    pub fn flex(date: NaiveDate, day_type: DayType) -> Self {
        Slot::FlexDay { date, day_type }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Slot::Timed { interval } => interval.date(),
            Slot::FlexDay { date, .. } => *date,
        }
    }

    /// The occupied interval; flex days map onto their canonical part of the day
    pub fn interval(&self) -> Interval {
        match self {
            Slot::Timed { interval } => *interval,
            Slot::FlexDay { date, day_type } => day_type.interval_on(*date),
        }
    }

    /// Duration fed to the tariff resolver
    pub fn billable_hours(&self) -> Decimal {
        match self {
            Slot::Timed { interval } => interval.duration_hours(),
            Slot::FlexDay { day_type, .. } => day_type.billable_hours(),
        }
    }

    /// `09:00-13:00` for timed slots, the day type label otherwise
    pub fn describe(&self) -> String {
        match self {
            Slot::Timed { interval } => interval.time_range(),
            Slot::FlexDay { day_type, .. } => day_type.label().to_string(),
        }
    }

    pub fn day_type(&self) -> Option<DayType> {
        match self {
            Slot::FlexDay { day_type, .. } => Some(*day_type),
            Slot::Timed { .. } => None,
        }
    }

    pub fn is_flex(&self) -> bool {
        matches!(self, Slot::FlexDay { .. })
    }
}

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Checks if transition is valid
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, target),
            (Pending, Confirmed)
                | (Confirmed, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Completed, Confirmed)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(BookingError::UnknownStatus(other.to_string())),
        }
    }
}

/// One reservation of a bookable resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub resource_id: ResourceId,
    pub holder: Holder,
    pub slot: Slot,
    pub status: BookingStatus,
    /// Price at creation time; flex bookings drawn on lease credits have none
    pub pricing: Option<PricingSnapshot>,
    pub pattern_id: Option<PatternId>,
    pub invoice_id: Option<InvoiceId>,
    /// Detached from its pattern by a manual change
    pub is_exception: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a confirmed booking
    pub fn new(resource_id: ResourceId, holder: Holder, slot: Slot) -> Self {
        let now = Utc::now();
        Self {
            id: BookingId::new_v7(),
            resource_id,
            holder,
            slot,
            status: BookingStatus::Confirmed,
            pricing: None,
            pattern_id: None,
            invoice_id: None,
            is_exception: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_pricing(mut self, pricing: PricingSnapshot) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn with_pattern(mut self, pattern_id: PatternId) -> Self {
        self.pattern_id = Some(pattern_id);
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_invoice(mut self, invoice_id: InvoiceId) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.slot.date()
    }

    pub fn interval(&self) -> Interval {
        self.slot.interval()
    }

    /// Returns true unless the booking is cancelled
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    pub fn is_billable(&self) -> bool {
        self.holder.is_billable() && self.pricing.is_some()
    }

    /// Updates the status
    pub fn update_status(&mut self, status: BookingStatus) -> Result<(), BookingError> {
        if !self.status.can_transition_to(status) {
            return Err(BookingError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves the booking to a new slot, keeping its pricing
    ///
    /// A booking generated by a pattern becomes an exception to it.
    pub fn reschedule(&mut self, slot: Slot) {
        self.slot = slot;
        if self.pattern_id.is_some() {
            self.is_exception = true;
        }
        self.updated_at = Utc::now();
    }

    pub fn link_invoice(&mut self, invoice_id: Option<InvoiceId>) {
        self.invoice_id = invoice_id;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::TenantId;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn booking() -> Booking {
        let interval = Interval::new(date(), 540, 780).unwrap();
        Booking::new(ResourceId::new(), Holder::Tenant(TenantId::new()), Slot::timed(interval))
    }

    #[test]
    fn test_new_booking_is_confirmed() {
        let b = booking();
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert!(b.is_active());
        assert!(!b.is_exception);
    }

    #[test]
    fn test_legal_transitions() {
        let mut b = booking().with_status(BookingStatus::Pending);
        b.update_status(BookingStatus::Confirmed).unwrap();
        b.update_status(BookingStatus::Completed).unwrap();
        b.update_status(BookingStatus::Confirmed).unwrap();
        b.update_status(BookingStatus::Cancelled).unwrap();
        assert!(!b.is_active());
    }

    #[test]
    fn test_illegal_transitions() {
        use BookingStatus::*;
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Confirmed));

        let mut b = booking().with_status(Cancelled);
        let err = b.update_status(Confirmed).unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidStatusTransition {
                from: "cancelled".to_string(),
                to: "confirmed".to_string(),
            }
        );
    }

    #[test]
    fn test_reschedule_marks_pattern_exception() {
        let mut plain = booking();
        let moved = Interval::new(date(), 600, 660).unwrap();
        plain.reschedule(Slot::timed(moved));
        assert!(!plain.is_exception);
        assert_eq!(plain.interval(), moved);

        let mut generated = booking().with_pattern(PatternId::new());
        generated.reschedule(Slot::timed(moved));
        assert!(generated.is_exception);
    }

    #[test]
    fn test_flex_day_canonical_intervals() {
        let full = Slot::flex(date(), DayType::Full).interval();
        let morning = Slot::flex(date(), DayType::Half(HalfDayPeriod::Morning)).interval();
        let afternoon = Slot::flex(date(), DayType::Half(HalfDayPeriod::Afternoon)).interval();
        assert!(full.overlaps(&morning));
        assert!(full.overlaps(&afternoon));
        assert!(!morning.overlaps(&afternoon));
    }

    #[test]
    fn test_credit_costs() {
        assert_eq!(DayType::Full.credit_cost(), dec!(1));
        assert_eq!(DayType::Half(HalfDayPeriod::Morning).credit_cost(), dec!(0.5));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("completed".parse::<BookingStatus>().unwrap(), BookingStatus::Completed);
        assert!("archived".parse::<BookingStatus>().is_err());
    }
}
