//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the booking engine. Dates are fixed
//! so weekday-sensitive tests stay predictable: 4 March 2024 is a Monday.

use chrono::NaiveDate;
use core_kernel::{
    Currency, CustomerId, Holder, LeaseId, Money, Percentage, ResourceId, TenantId, YearMonth,
};
use domain_booking::{Interval, Lease, TariffCard};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn eur(amount: Decimal) -> Money {
        Money::new(amount, Currency::EUR)
    }
}

/// Fixture for tariff cards
pub struct TariffFixtures;

impl TariffFixtures {
    /// Meeting room at €25/h, €80 half day, €150 full day
    pub fn meeting_room() -> TariffCard {
        Self::card(dec!(25), Some(dec!(80)), Some(dec!(150)))
    }

    /// Only an hourly rate
    pub fn hourly_only(rate: Decimal) -> TariffCard {
        Self::card(rate, None, None)
    }

    /// Flex desk with rates that already include VAT
    pub fn flex_desk_vat_inclusive() -> TariffCard {
        Self::card(dec!(10), Some(dec!(36.30)), Some(dec!(60.50))).vat_inclusive(true)
    }

    pub fn card(hourly: Decimal, half_day: Option<Decimal>, full_day: Option<Decimal>) -> TariffCard {
        TariffCard::new(
            MoneyFixtures::eur(hourly),
            half_day.map(MoneyFixtures::eur),
            full_day.map(MoneyFixtures::eur),
        )
        .unwrap()
    }
}

/// Fixture for calendar test data
pub struct DateFixtures;

impl DateFixtures {
    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Monday 4 March 2024
    pub fn monday() -> NaiveDate {
        Self::date(2024, 3, 4)
    }

    /// Wednesday 6 March 2024
    pub fn wednesday() -> NaiveDate {
        Self::date(2024, 3, 6)
    }

    pub fn march_2024() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    pub fn april_2024() -> YearMonth {
        YearMonth::new(2024, 4).unwrap()
    }
}

/// Fixture for intervals, given as "HH:MM" wall-clock times
pub struct IntervalFixtures;

impl IntervalFixtures {
    pub fn at(date: NaiveDate, start: &str, end: &str) -> Interval {
        Interval::new(date, minutes(start), minutes(end)).unwrap()
    }

    /// 09:00-13:00 on the fixture Monday
    pub fn morning_meeting() -> Interval {
        Self::at(DateFixtures::monday(), "09:00", "13:00")
    }
}

/// Parses "HH:MM" into minutes from midnight
pub fn minutes(hhmm: &str) -> u32 {
    let (h, m) = hhmm.split_once(':').unwrap();
    h.parse::<u32>().unwrap() * 60 + m.parse::<u32>().unwrap()
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Deterministic meeting room id
    pub fn meeting_room() -> ResourceId {
        ResourceId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// Deterministic flex desk id
    pub fn flex_desk() -> ResourceId {
        ResourceId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap())
    }

    pub fn tenant() -> Holder {
        Holder::Tenant(TenantId::from_uuid(
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap(),
        ))
    }

    pub fn customer() -> Holder {
        Holder::Customer(CustomerId::from_uuid(
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440004").unwrap(),
        ))
    }

    pub fn lease_id() -> LeaseId {
        LeaseId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440005").unwrap())
    }
}

/// Fixture for leases and discounts
pub struct LeaseFixtures;

impl LeaseFixtures {
    /// Lease over 2024 with the given monthly quota
    pub fn year_2024(quota: Decimal) -> Lease {
        let mut lease = Lease::new(quota, DateFixtures::date(2024, 1, 1), Some(DateFixtures::date(2024, 12, 31)));
        lease.id = IdFixtures::lease_id();
        lease
    }

    /// Lease from 2024-01-01 without an end date
    pub fn open_ended(quota: Decimal) -> Lease {
        Lease::new(quota, DateFixtures::date(2024, 1, 1), None)
    }

    pub fn discount(pct: Decimal) -> Percentage {
        Percentage::new(pct).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    #[test]
    fn test_fixture_weekdays() {
        assert_eq!(DateFixtures::monday().weekday(), Weekday::Mon);
        assert_eq!(DateFixtures::wednesday().weekday(), Weekday::Wed);
    }

    #[test]
    fn test_minutes_parsing() {
        assert_eq!(minutes("09:30"), 570);
        assert_eq!(minutes("24:00"), 1440);
        assert_eq!(IntervalFixtures::morning_meeting().duration_minutes(), 240);
    }

    #[test]
    fn test_lease_fixture_id() {
        assert_eq!(LeaseFixtures::year_2024(dec!(5)).id, IdFixtures::lease_id());
    }
}
