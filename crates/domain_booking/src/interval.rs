//! Time intervals on a single calendar day
//!
//! An [`Interval`] is a date plus start/end offsets in minutes from midnight.
//! Overlap is half-open: a booking ending at 12:00 does not collide with one
//! starting at 12:00.

use chrono::{NaiveDate, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BookingError;

/// Minutes in a day; the largest valid end offset
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Start offset of the afternoon half of a day (12:00)
pub const MIDDAY: u32 = 12 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    date: NaiveDate,
    start: u32,
    end: u32,
}

impl Interval {
    /// Creates an interval; `end` must be after `start` and no later than midnight
    pub fn new(date: NaiveDate, start: u32, end: u32) -> Result<Self, BookingError> {
        if end <= start || end > MINUTES_PER_DAY {
            return Err(BookingError::InvalidInterval { start, end });
        }
        Ok(Self { date, start, end })
    }

    /// Creates an interval from wall-clock times
    ///
    /// An end time of `00:00` is read as the following midnight.
    pub fn from_times(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, BookingError> {
        let start = minutes_of(start);
        let end = match minutes_of(end) {
            0 => MINUTES_PER_DAY,
            m => m,
        };
        Self::new(date, start, end)
    }

    /// The whole of `date`
    pub fn whole_day(date: NaiveDate) -> Self {
        Self { date, start: 0, end: MINUTES_PER_DAY }
    }

    /// Same date with other offsets; callers guarantee `start < end <= MINUTES_PER_DAY`
    pub(crate) fn with_offsets(&self, start: u32, end: u32) -> Self {
        Self { date: self.date, start, end }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// The same offsets on another date
    pub fn on(&self, date: NaiveDate) -> Self {
        Self { date, ..*self }
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end - self.start
    }

    /// Duration in hours, e.g. `4` for 09:00-13:00 and `1.5` for 90 minutes
    pub fn duration_hours(&self) -> Decimal {
        Decimal::from(self.duration_minutes()) / Decimal::from(60)
    }

    /// Half-open overlap on the same date
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }

    /// Returns true if both offsets sit on a `granularity`-minute grid
    pub fn is_aligned(&self, granularity: u32) -> bool {
        granularity == 0 || (self.start % granularity == 0 && self.end % granularity == 0)
    }

    pub fn ensure_aligned(&self, granularity: u32) -> Result<(), BookingError> {
        if self.is_aligned(granularity) {
            Ok(())
        } else {
            Err(BookingError::OffGrid {
                start: self.start,
                end: self.end,
                granularity,
            })
        }
    }

    /// `HH:MM-HH:MM`
    pub fn time_range(&self) -> String {
        format!("{}-{}", clock(self.start), clock(self.end))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time_range())
    }
}

/// Duration of an interval in hours
pub fn duration(interval: &Interval) -> Decimal {
    interval.duration_hours()
}

/// Half-open overlap test
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.overlaps(b)
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn clock(offset: u32) -> String {
    format!("{:02}:{:02}", offset / 60, offset % 60)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_interval() -> impl Strategy<Value = Interval> {
        (0u32..MINUTES_PER_DAY, 1u32..=MINUTES_PER_DAY, 0i64..3).prop_filter_map(
            "end after start",
            |(start, end, day)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1)? + chrono::Duration::days(day);
                Interval::new(date, start, end).ok()
            },
        )
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in arb_interval(), b in arb_interval()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn interval_overlaps_itself(a in arb_interval()) {
            prop_assert!(a.overlaps(&a));
        }

        #[test]
        fn duration_is_positive(a in arb_interval()) {
            prop_assert!(a.duration_hours() > Decimal::ZERO);
        }
    }
}
