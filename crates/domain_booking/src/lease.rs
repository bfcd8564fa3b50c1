//! Flexible-desk leases

use chrono::NaiveDate;
use core_kernel::{DateRange, Holder, LeaseId, YearMonth};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// A flex-desk contract with a monthly credit quota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    /// Credits available per calendar month (1 = one full day)
    pub monthly_quota: Decimal,
    pub start_date: NaiveDate,
    /// `None` for an open-ended contract
    pub end_date: Option<NaiveDate>,
}

impl Lease {
    pub fn new(monthly_quota: Decimal, start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            id: LeaseId::new(),
            monthly_quota,
            start_date,
            end_date,
        }
    }

    pub fn holder(&self) -> Holder {
        Holder::Lease(self.id)
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }

    pub fn ensure_active_on(&self, date: NaiveDate) -> Result<(), BookingError> {
        if self.is_active_on(date) {
            Ok(())
        } else {
            Err(BookingError::LeaseNotActive(date))
        }
    }

    /// The whole contract period; open-ended leases have none
    pub fn contract_range(&self) -> Option<DateRange> {
        self.end_date.map(|end| DateRange {
            start: self.start_date,
            end,
        })
    }

    /// The part of `month` covered by the contract
    pub fn month_range(&self, month: YearMonth) -> Option<DateRange> {
        let contract = DateRange {
            start: self.start_date,
            end: self.end_date.unwrap_or(NaiveDate::MAX),
        };
        DateRange::month(month).intersect(&contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_active_window() {
        let lease = Lease::new(dec!(5), date(2024, 2, 10), Some(date(2024, 5, 31)));
        assert!(!lease.is_active_on(date(2024, 2, 9)));
        assert!(lease.is_active_on(date(2024, 2, 10)));
        assert!(lease.is_active_on(date(2024, 5, 31)));
        assert!(lease.ensure_active_on(date(2024, 6, 1)).is_err());
    }

    #[test]
    fn test_month_range_clips_to_contract() {
        let lease = Lease::new(dec!(5), date(2024, 2, 10), Some(date(2024, 5, 15)));
        let feb = lease.month_range(YearMonth::new(2024, 2).unwrap()).unwrap();
        assert_eq!(feb.start, date(2024, 2, 10));
        assert_eq!(feb.end, date(2024, 2, 29));

        let may = lease.month_range(YearMonth::new(2024, 5).unwrap()).unwrap();
        assert_eq!(may.end, date(2024, 5, 15));

        assert!(lease.month_range(YearMonth::new(2024, 7).unwrap()).is_none());
    }

    #[test]
    fn test_open_ended_has_no_contract_range() {
        let lease = Lease::new(dec!(5), date(2024, 1, 1), None);
        assert!(lease.contract_range().is_none());
        assert!(lease.is_active_on(date(2030, 1, 1)));
    }
}
