//! Overlap detection and day availability
//!
//! The checker is a pure scan over bookings the caller has already fetched
//! for one resource. [`DaySchedule`] keeps the occupied intervals of a
//! resource indexed by date so a bulk fill can also see bookings it has
//! accepted earlier in the same run.

use chrono::NaiveDate;
use core_kernel::BookingId;
use std::collections::BTreeMap;

use crate::booking::Booking;
use crate::interval::Interval;

/// First active booking overlapping `candidate`, skipping `exclude`
pub fn find_conflict<'a>(
    candidate: &Interval,
    existing: impl IntoIterator<Item = &'a Booking>,
    exclude: Option<BookingId>,
) -> Option<&'a Booking> {
    existing.into_iter().find(|b| {
        b.is_active() && Some(b.id) != exclude && b.interval().overlaps(candidate)
    })
}

pub fn has_conflict<'a>(
    candidate: &Interval,
    existing: impl IntoIterator<Item = &'a Booking>,
    exclude: Option<BookingId>,
) -> bool {
    find_conflict(candidate, existing, exclude).is_some()
}

/// Occupied intervals of one resource, by date
#[derive(Debug, Clone, Default)]
pub struct DaySchedule {
    by_date: BTreeMap<NaiveDate, Vec<Interval>>,
}

impl DaySchedule {
    /// Indexes the active bookings among `bookings`
    pub fn from_bookings<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        let mut schedule = Self::default();
        for booking in bookings.into_iter().filter(|b| b.is_active()) {
            schedule.insert(booking.interval());
        }
        schedule
    }

    pub fn insert(&mut self, interval: Interval) {
        self.by_date.entry(interval.date()).or_default().push(interval);
    }

    pub fn conflicts(&self, candidate: &Interval) -> bool {
        self.by_date
            .get(&candidate.date())
            .is_some_and(|day| day.iter().any(|i| i.overlaps(candidate)))
    }

    /// Inserts `candidate` unless it collides, returning whether it was taken
    pub fn try_reserve(&mut self, candidate: Interval) -> bool {
        if self.conflicts(&candidate) {
            return false;
        }
        self.insert(candidate);
        true
    }
}

/// Active bookings of a day ordered by start offset
pub fn agenda<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Vec<&'a Booking> {
    let mut day: Vec<&Booking> = bookings.into_iter().filter(|b| b.is_active()).collect();
    day.sort_by_key(|b| (b.interval().start(), b.interval().end()));
    day
}

/// Gaps between `busy` inside the opening window `[open_from, open_until)`
///
/// Busy intervals are merged first so adjacent or overlapping bookings
/// leave no zero-length gaps between them.
pub fn free_slots(
    date: NaiveDate,
    busy: &[Interval],
    open_from: u32,
    open_until: u32,
) -> Vec<Interval> {
    let mut spans: Vec<(u32, u32)> = busy
        .iter()
        .filter(|i| i.date() == date)
        .map(|i| (i.start(), i.end()))
        .collect();
    spans.sort_unstable();

    let mut merged: Vec<(u32, u32)> = Vec::new();
    for (start, end) in spans {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    let mut free = Vec::new();
    let mut cursor = open_from;
    for (start, end) in merged {
        if end <= cursor {
            continue;
        }
        if start >= open_until {
            break;
        }
        if start > cursor {
            free.extend(Interval::new(date, cursor, start).ok());
        }
        cursor = cursor.max(end);
    }
    if cursor < open_until {
        free.extend(Interval::new(date, cursor, open_until).ok());
    }
    free
}
