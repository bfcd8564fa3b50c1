//! Recurrence rules and their expansion into dates
//!
//! [`expand`] walks the intersection of the rule's own validity window and
//! the requested range one day at a time and yields the dates the rule
//! selects. The returned [`Occurrences`] is finite and `Clone`, so a caller
//! can count it and then walk it again.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BookingError;

/// A set of weekdays stored as a bitmask (bit 0 = Monday)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    pub fn single(day: Weekday) -> Self {
        Self(bit(day))
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= bit(day);
    }

    pub fn with(mut self, day: Weekday) -> Self {
        self.insert(day);
        self
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in Monday-first order
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_DAYS.into_iter().filter(move |d| self.contains(*d))
    }

    /// Raw mask for storage
    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b0111_1111)
    }
}

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn bit(day: Weekday) -> u8 {
    1 << day.num_days_from_monday()
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let days = Vec::<Weekday>::deserialize(deserializer)?;
        Ok(days.into_iter().collect())
    }
}

/// How often a pattern repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrenceRule {
    Daily,
    Weekly { days: WeekdaySet },
    /// A fixed day of the month; months without that day are skipped
    Monthly { day: u32 },
}

impl RecurrenceRule {
    pub fn weekly(days: impl IntoIterator<Item = Weekday>) -> Self {
        RecurrenceRule::Weekly {
            days: days.into_iter().collect(),
        }
    }

    pub fn monthly(day: u32) -> Self {
        RecurrenceRule::Monthly { day }
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        match self {
            RecurrenceRule::Daily => Ok(()),
            RecurrenceRule::Weekly { days } if days.is_empty() => Err(
                BookingError::InvalidRecurrence("weekly rule needs at least one weekday".into()),
            ),
            RecurrenceRule::Weekly { .. } => Ok(()),
            RecurrenceRule::Monthly { day } if !(1..=31).contains(day) => Err(
                BookingError::InvalidRecurrence(format!("day of month {day} out of range")),
            ),
            RecurrenceRule::Monthly { .. } => Ok(()),
        }
    }

    /// Per-day membership test
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            RecurrenceRule::Daily => true,
            RecurrenceRule::Weekly { days } => days.contains(date.weekday()),
            RecurrenceRule::Monthly { day } => date.day() == *day,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RecurrenceRule::Daily => "daily",
            RecurrenceRule::Weekly { .. } => "weekly",
            RecurrenceRule::Monthly { .. } => "monthly",
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceRule::Daily => f.write_str("daily"),
            RecurrenceRule::Weekly { days } => {
                let names: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                write!(f, "weekly on {}", names.join(","))
            }
            RecurrenceRule::Monthly { day } => write!(f, "monthly on day {day}"),
        }
    }
}

/// Dates selected by a rule inside a window
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        while let Some(current) = self.next {
            if current > self.last {
                self.next = None;
                break;
            }
            self.next = current.succ_opt();
            if self.rule.matches(current) {
                return Some(current);
            }
        }
        None
    }
}

/// Expands `rule` over `[max(range_start, start), min(range_end, end ?? range_end)]`
///
/// An empty window yields nothing.
pub fn expand(
    rule: RecurrenceRule,
    start: NaiveDate,
    end: Option<NaiveDate>,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Occurrences {
    let first = range_start.max(start);
    let last = end.map_or(range_end, |e| e.min(range_end));
    Occurrences {
        rule,
        next: (first <= last).then_some(first),
        last,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekly_two_weeks_mon_wed() {
        // 2024-03-04 is a Monday
        let rule = RecurrenceRule::weekly([Weekday::Mon, Weekday::Wed]);
        let dates: Vec<_> =
            expand(rule, date(2024, 3, 4), None, date(2024, 3, 4), date(2024, 3, 17)).collect();
        assert_eq!(
            dates,
            vec![date(2024, 3, 4), date(2024, 3, 6), date(2024, 3, 11), date(2024, 3, 13)]
        );
    }

    #[test]
    fn test_monthly_31_skips_february() {
        let rule = RecurrenceRule::monthly(31);
        let dates: Vec<_> =
            expand(rule, date(2024, 1, 1), None, date(2024, 1, 1), date(2024, 4, 30)).collect();
        assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 3, 31)]);
    }

    #[test]
    fn test_daily_clamped_to_pattern_window() {
        let dates: Vec<_> = expand(
            RecurrenceRule::Daily,
            date(2024, 3, 5),
            Some(date(2024, 3, 7)),
            date(2024, 3, 1),
            date(2024, 3, 31),
        )
        .collect();
        assert_eq!(dates, vec![date(2024, 3, 5), date(2024, 3, 6), date(2024, 3, 7)]);
    }

    #[test]
    fn test_empty_window() {
        let mut it = expand(
            RecurrenceRule::Daily,
            date(2024, 5, 1),
            None,
            date(2024, 3, 1),
            date(2024, 3, 31),
        );
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_occurrences_are_restartable() {
        let occ = expand(
            RecurrenceRule::weekly([Weekday::Fri]),
            date(2024, 1, 1),
            None,
            date(2024, 1, 1),
            date(2024, 1, 31),
        );
        assert_eq!(occ.clone().count(), 4);
        assert_eq!(occ.count(), 4);
    }

    #[test]
    fn test_rule_validation() {
        assert!(RecurrenceRule::Weekly { days: WeekdaySet::EMPTY }.validate().is_err());
        assert!(RecurrenceRule::monthly(0).validate().is_err());
        assert!(RecurrenceRule::monthly(32).validate().is_err());
        assert!(RecurrenceRule::monthly(31).validate().is_ok());
    }

    #[test]
    fn test_weekday_set_serde() {
        let set = WeekdaySet::single(Weekday::Wed).with(Weekday::Mon);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["Mon","Wed"]"#);
        let back: WeekdaySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
        assert_eq!(WeekdaySet::from_bits(set.bits()), set);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn weekly_dates_are_ascending_members(mask in 1u8..128u8, offset in 0i64..400, span in 0i64..120) {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(span);
            let days = WeekdaySet::from_bits(mask);
            let rule = RecurrenceRule::Weekly { days };
            let dates: Vec<_> = expand(rule, start, None, start, end).collect();
            for pair in dates.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for d in &dates {
                prop_assert!(days.contains(d.weekday()));
                prop_assert!(*d >= start && *d <= end);
            }
        }

        #[test]
        fn daily_yields_every_day(span in 0i64..400) {
            let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
            let end = start + chrono::Duration::days(span);
            let count = expand(RecurrenceRule::Daily, start, None, start, end).count();
            prop_assert_eq!(count as i64, span + 1);
        }

        #[test]
        fn monthly_never_rolls_over(day in 1u32..=31u32) {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
            for d in expand(RecurrenceRule::monthly(day), start, None, start, end) {
                prop_assert_eq!(d.day(), day);
            }
        }
    }
}
