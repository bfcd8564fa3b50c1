//! Recurring booking patterns

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{Holder, PatternId, ResourceId};
use serde::{Deserialize, Serialize};

use crate::booking::{DayType, Slot};
use crate::error::BookingError;
use crate::interval::Interval;
use crate::recurrence::{expand, Occurrences, RecurrenceRule};

/// The slot every occurrence of a pattern reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotTemplate {
    Timed { start: u32, end: u32 },
    FlexDay { day_type: DayType },
}

impl SlotTemplate {
    /// Template from an interval, dropping its date
    pub fn from_interval(interval: &Interval) -> Self {
        SlotTemplate::Timed {
            start: interval.start(),
            end: interval.end(),
        }
    }

    /// The concrete slot on `date`
    pub fn at(&self, date: NaiveDate) -> Result<Slot, BookingError> {
        match *self {
            SlotTemplate::Timed { start, end } => Ok(Slot::timed(Interval::new(date, start, end)?)),
            SlotTemplate::FlexDay { day_type } => Ok(Slot::flex(date, day_type)),
        }
    }
}

/// A recurrence rule bound to a resource, holder and slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub id: PatternId,
    pub resource_id: ResourceId,
    pub holder: Holder,
    pub template: SlotTemplate,
    pub rule: RecurrenceRule,
    pub start_date: NaiveDate,
    /// `None` for an open-ended pattern
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl RecurrencePattern {
    pub fn new(
        resource_id: ResourceId,
        holder: Holder,
        template: SlotTemplate,
        rule: RecurrenceRule,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, BookingError> {
        rule.validate()?;
        if let Some(end) = end_date {
            if end < start_date {
                return Err(BookingError::InvalidRecurrence(format!(
                    "end date {end} is before start date {start_date}"
                )));
            }
        }
        // Reject a malformed time template up front rather than per occurrence
        template.at(start_date)?;

        Ok(Self {
            id: PatternId::new_v7(),
            resource_id,
            holder,
            template,
            rule,
            start_date,
            end_date,
            active: true,
            created_at: Utc::now(),
        })
    }

    /// Dates this pattern selects within `[range_start, range_end]`
    pub fn occurrences(&self, range_start: NaiveDate, range_end: NaiveDate) -> Occurrences {
        expand(self.rule, self.start_date, self.end_date, range_start, range_end)
    }

    /// Stops the pattern as of `end_date`
    ///
    /// An earlier existing end date is kept.
    pub fn deactivate(&mut self, end_date: NaiveDate) {
        self.active = false;
        self.end_date = Some(self.end_date.map_or(end_date, |e| e.min(end_date)));
    }

    pub fn ensure_active(&self) -> Result<(), BookingError> {
        if self.active {
            Ok(())
        } else {
            Err(BookingError::PatternInactive)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use core_kernel::TenantId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pattern(end: Option<NaiveDate>) -> RecurrencePattern {
        RecurrencePattern::new(
            ResourceId::new(),
            Holder::Tenant(TenantId::new()),
            SlotTemplate::Timed { start: 540, end: 600 },
            RecurrenceRule::weekly([Weekday::Tue]),
            date(2024, 4, 1),
            end,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_inverted_dates_and_bad_template() {
        let result = RecurrencePattern::new(
            ResourceId::new(),
            Holder::Tenant(TenantId::new()),
            SlotTemplate::Timed { start: 600, end: 540 },
            RecurrenceRule::Daily,
            date(2024, 4, 1),
            None,
        );
        assert!(matches!(result, Err(BookingError::InvalidInterval { .. })));

        let result = RecurrencePattern::new(
            ResourceId::new(),
            Holder::Tenant(TenantId::new()),
            SlotTemplate::Timed { start: 540, end: 600 },
            RecurrenceRule::Daily,
            date(2024, 4, 10),
            Some(date(2024, 4, 1)),
        );
        assert!(matches!(result, Err(BookingError::InvalidRecurrence(_))));
    }

    #[test]
    fn test_occurrences_respect_end_date() {
        let p = pattern(Some(date(2024, 4, 20)));
        let dates: Vec<_> = p.occurrences(date(2024, 1, 1), date(2024, 12, 31)).collect();
        assert_eq!(dates, vec![date(2024, 4, 2), date(2024, 4, 9), date(2024, 4, 16)]);
    }

    #[test]
    fn test_deactivate_keeps_earlier_end() {
        let mut p = pattern(Some(date(2024, 4, 20)));
        p.deactivate(date(2024, 6, 1));
        assert!(!p.active);
        assert_eq!(p.end_date, Some(date(2024, 4, 20)));
        assert_eq!(p.ensure_active(), Err(BookingError::PatternInactive));

        let mut open = pattern(None);
        open.deactivate(date(2024, 5, 1));
        assert_eq!(open.end_date, Some(date(2024, 5, 1)));
    }

    #[test]
    fn test_template_at_date() {
        let slot = SlotTemplate::Timed { start: 540, end: 600 }.at(date(2024, 4, 2)).unwrap();
        assert_eq!(slot.date(), date(2024, 4, 2));
        assert_eq!(slot.interval().duration_minutes(), 60);
    }
}
