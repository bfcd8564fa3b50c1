//! Monthly flex-desk credit accounting
//!
//! Usage is derived, never stored: it is recomputed from the lease's
//! non-cancelled flex-day bookings every time a check is made. A full day
//! costs one credit and a half day half a credit; a booking is allowed when
//! `used + cost <= quota`.

use chrono::NaiveDate;
use core_kernel::{LeaseId, YearMonth};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::booking::{Booking, DayType};

/// Result of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCheck {
    pub allowed: bool,
    pub used: Decimal,
    pub quota: Decimal,
}

impl CreditCheck {
    pub fn remaining(&self) -> Decimal {
        self.quota - self.used
    }
}

/// Credits consumed by one lease in one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLedger {
    pub lease_id: LeaseId,
    pub month: YearMonth,
    pub quota: Decimal,
    pub used: Decimal,
}

impl CreditLedger {
    pub fn empty(lease_id: LeaseId, month: YearMonth, quota: Decimal) -> Self {
        Self {
            lease_id,
            month,
            quota,
            used: Decimal::ZERO,
        }
    }

    /// Sums the lease's active flex-day bookings falling in `month`
    pub fn from_bookings<'a>(
        lease_id: LeaseId,
        month: YearMonth,
        quota: Decimal,
        bookings: impl IntoIterator<Item = &'a Booking>,
    ) -> Self {
        let used = bookings
            .into_iter()
            .filter(|b| b.is_active() && b.holder.lease_id() == Some(lease_id))
            .filter(|b| month.contains(b.date()))
            .filter_map(|b| b.slot.day_type())
            .map(|d| d.credit_cost())
            .sum();
        Self {
            lease_id,
            month,
            quota,
            used,
        }
    }

    pub fn remaining(&self) -> Decimal {
        self.quota - self.used
    }

    pub fn can_consume(&self, day_type: DayType) -> CreditCheck {
        CreditCheck {
            allowed: self.used + day_type.credit_cost() <= self.quota,
            used: self.used,
            quota: self.quota,
        }
    }

    /// Books the cost against the ledger if it fits, returning whether it did
    pub fn try_consume(&mut self, day_type: DayType) -> bool {
        let check = self.can_consume(day_type);
        if check.allowed {
            self.used += day_type.credit_cost();
        }
        check.allowed
    }
}

/// Per-month ledgers for one lease, used while filling several months at once
#[derive(Debug, Clone)]
pub struct RollingLedger {
    lease_id: LeaseId,
    quota: Decimal,
    months: BTreeMap<YearMonth, CreditLedger>,
}

impl RollingLedger {
    /// Seeds the ledger from the lease's existing bookings
    pub fn new<'a>(
        lease_id: LeaseId,
        quota: Decimal,
        existing: impl IntoIterator<Item = &'a Booking>,
    ) -> Self {
        let mut ledger = Self {
            lease_id,
            quota,
            months: BTreeMap::new(),
        };
        for booking in existing {
            if !booking.is_active() || booking.holder.lease_id() != Some(lease_id) {
                continue;
            }
            if let Some(day_type) = booking.slot.day_type() {
                ledger.month_mut(YearMonth::of(booking.date())).used += day_type.credit_cost();
            }
        }
        ledger
    }

    /// Consumes credits for `date` if the month still has room
    pub fn try_consume(&mut self, date: NaiveDate, day_type: DayType) -> bool {
        self.month_mut(YearMonth::of(date)).try_consume(day_type)
    }

    pub fn ledger(&self, month: YearMonth) -> CreditLedger {
        self.months
            .get(&month)
            .cloned()
            .unwrap_or_else(|| CreditLedger::empty(self.lease_id, month, self.quota))
    }

    fn month_mut(&mut self, month: YearMonth) -> &mut CreditLedger {
        let (lease_id, quota) = (self.lease_id, self.quota);
        self.months
            .entry(month)
            .or_insert_with(|| CreditLedger::empty(lease_id, month, quota))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{BookingStatus, HalfDayPeriod, Slot};
    use core_kernel::{Holder, ResourceId};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flex(lease: LeaseId, on: NaiveDate, day_type: DayType) -> Booking {
        Booking::new(ResourceId::new(), Holder::Lease(lease), Slot::flex(on, day_type))
    }

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    #[test]
    fn test_quota_boundary() {
        let lease = LeaseId::new();
        let bookings: Vec<_> = (4..8).map(|d| flex(lease, date(2024, 3, d), DayType::Full)).collect();
        let mut ledger = CreditLedger::from_bookings(lease, march(), dec!(5), &bookings);
        assert_eq!(ledger.used, dec!(4));

        let check = ledger.can_consume(DayType::Full);
        assert!(check.allowed);
        assert!(ledger.try_consume(DayType::Full));
        assert_eq!(ledger.used, dec!(5));

        let check = ledger.can_consume(DayType::Full);
        assert!(!check.allowed);
        assert_eq!(check.used, dec!(5));
        assert_eq!(check.remaining(), dec!(0));
    }

    #[test]
    fn test_half_days_count_half() {
        let lease = LeaseId::new();
        let morning = DayType::Half(HalfDayPeriod::Morning);
        let bookings = vec![
            flex(lease, date(2024, 3, 4), morning),
            flex(lease, date(2024, 3, 5), morning),
            flex(lease, date(2024, 3, 6), DayType::Full),
        ];
        let ledger = CreditLedger::from_bookings(lease, march(), dec!(3), &bookings);
        assert_eq!(ledger.used, dec!(2));
        assert!(ledger.can_consume(DayType::Full).allowed);
        assert_eq!(ledger.remaining(), dec!(1));
    }

    #[test]
    fn test_ignores_cancelled_other_leases_and_other_months() {
        let lease = LeaseId::new();
        let bookings = vec![
            flex(lease, date(2024, 3, 4), DayType::Full).with_status(BookingStatus::Cancelled),
            flex(LeaseId::new(), date(2024, 3, 5), DayType::Full),
            flex(lease, date(2024, 4, 1), DayType::Full),
            flex(lease, date(2024, 3, 29), DayType::Full),
        ];
        let ledger = CreditLedger::from_bookings(lease, march(), dec!(5), &bookings);
        assert_eq!(ledger.used, dec!(1));
    }

    #[test]
    fn test_rolling_ledger_tracks_months_separately() {
        let lease = LeaseId::new();
        let existing = vec![flex(lease, date(2024, 3, 4), DayType::Full)];
        let mut rolling = RollingLedger::new(lease, dec!(2), &existing);

        assert!(rolling.try_consume(date(2024, 3, 5), DayType::Full));
        assert!(!rolling.try_consume(date(2024, 3, 6), DayType::Full));
        assert!(rolling.try_consume(date(2024, 4, 1), DayType::Full));
        assert!(rolling.try_consume(date(2024, 4, 2), DayType::Full));

        assert_eq!(rolling.ledger(march()).used, dec!(2));
        assert_eq!(rolling.ledger(YearMonth::new(2024, 5).unwrap()).used, dec!(0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn consumption_never_exceeds_quota(quota_halves in 0u32..40, requests in proptest::collection::vec(any::<bool>(), 0..60)) {
            let quota = Decimal::from(quota_halves) / Decimal::from(2);
            let mut ledger = CreditLedger::empty(LeaseId::new(), YearMonth::new(2024, 1).unwrap(), quota);
            for full in requests {
                let day_type = if full {
                    DayType::Full
                } else {
                    DayType::Half(crate::booking::HalfDayPeriod::Afternoon)
                };
                ledger.try_consume(day_type);
                prop_assert!(ledger.used <= ledger.quota);
            }
        }
    }
}
