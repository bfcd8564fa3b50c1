//! Property-Based Test Generators
//!
//! Proptest strategies for booking data that respect domain invariants:
//! intervals are non-empty, rates are non-negative and percentages stay in
//! `[0, 100]`.

use chrono::NaiveDate;
use core_kernel::{Currency, Money, Percentage};
use domain_booking::{DayType, HalfDayPeriod, Interval, RecurrenceRule, TariffCard, WeekdaySet};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Non-empty intervals on `date` aligned to `step` minutes
pub fn aligned_interval_strategy(date: NaiveDate, step: u32) -> impl Strategy<Value = Interval> {
    let slots = 1440 / step;
    (0..slots)
        .prop_flat_map(move |start| (Just(start), start + 1..=slots))
        .prop_map(move |(start, end)| Interval::new(date, start * step, end * step).unwrap())
}

/// Non-empty intervals on the same fixed date, at minute resolution
pub fn interval_strategy() -> impl Strategy<Value = Interval> {
    let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    (0u32..1440)
        .prop_flat_map(|start| (Just(start), start + 1..=1440))
        .prop_map(move |(start, end)| Interval::new(date, start, end).unwrap())
}

/// Percentages from 0% to 100% with two decimals
pub fn percentage_strategy() -> impl Strategy<Value = Percentage> {
    (0i64..=10_000).prop_map(|n| Percentage::new(Decimal::new(n, 2)).unwrap())
}

/// EUR amounts from €0.00 to €500.00
pub fn eur_strategy() -> impl Strategy<Value = Money> {
    (0i64..=50_000).prop_map(|cents| Money::new(Decimal::new(cents, 2), Currency::EUR))
}

/// Tariff cards with any combination of optional tiers
pub fn tariff_card_strategy() -> impl Strategy<Value = TariffCard> {
    (
        eur_strategy(),
        proptest::option::of(eur_strategy()),
        proptest::option::of(eur_strategy()),
        any::<bool>(),
    )
        .prop_map(|(hourly, half, full, inclusive)| {
            TariffCard::new(hourly, half, full).unwrap().vat_inclusive(inclusive)
        })
}

/// Non-empty weekday sets
pub fn weekday_set_strategy() -> impl Strategy<Value = WeekdaySet> {
    (1u8..128).prop_map(WeekdaySet::from_bits)
}

/// Valid recurrence rules of every kind
pub fn recurrence_rule_strategy() -> impl Strategy<Value = RecurrenceRule> {
    prop_oneof![
        Just(RecurrenceRule::Daily),
        weekday_set_strategy().prop_map(|days| RecurrenceRule::Weekly { days }),
        (1u32..=31).prop_map(RecurrenceRule::monthly),
    ]
}

pub fn day_type_strategy() -> impl Strategy<Value = DayType> {
    prop_oneof![
        Just(DayType::Full),
        Just(DayType::Half(HalfDayPeriod::Morning)),
        Just(DayType::Half(HalfDayPeriod::Afternoon)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_intervals_are_valid(interval in interval_strategy()) {
            prop_assert!(interval.start() < interval.end());
            prop_assert!(interval.end() <= 1440);
        }

        #[test]
        fn aligned_intervals_are_aligned(interval in aligned_interval_strategy(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), 30)) {
            prop_assert!(interval.is_aligned(30));
        }

        #[test]
        fn generated_rules_validate(rule in recurrence_rule_strategy()) {
            prop_assert!(rule.validate().is_ok());
        }
    }
}
