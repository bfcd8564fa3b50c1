//! Request and response bodies
//!
//! Times travel as `HH:MM` strings and are converted to minute offsets
//! here; everything else maps onto the engine's request types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use app_booking::{BookingKind, BookingRequest, PatternRequest};
use core_kernel::{Holder, LeaseId, ResourceId, YearMonth};
use domain_booking::{BookingStatus, CreditLedger, DayType, Interval, RecurrenceRule, Slot, SlotTemplate};

use crate::error::ApiError;

/// Parses `HH:MM` into minutes after midnight; `24:00` is the end of the day
pub fn parse_time(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    match (hours, minutes) {
        (24, 0) => Some(24 * 60),
        (0..=23, 0..=59) => Some(hours * 60 + minutes),
        _ => None,
    }
}

pub fn format_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn validate_time(value: &str) -> Result<(), ValidationError> {
    parse_time(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("time_format"))
}

/// Start/end times or a day type, whichever the resource takes
fn slot_kind(
    start: Option<&str>,
    end: Option<&str>,
    day_type: Option<DayType>,
) -> Result<BookingKind, ApiError> {
    match (day_type, start, end) {
        (Some(day_type), None, None) => Ok(BookingKind::FlexDay { day_type }),
        (None, Some(start), Some(end)) => Ok(BookingKind::Timed {
            start: parse_time(start).ok_or_else(|| ApiError::bad_request(format!("invalid time {start}")))?,
            end: parse_time(end).ok_or_else(|| ApiError::bad_request(format!("invalid time {end}")))?,
        }),
        (Some(_), _, _) => Err(ApiError::bad_request("a flex day takes no start or end time")),
        _ => Err(ApiError::bad_request("start and end times are required")),
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// Body of `POST /bookings`
///
/// Resource, holder and date may be omitted; the engine reports which
/// selection is missing.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingBody {
    pub resource_id: Option<ResourceId>,
    pub holder: Option<Holder>,
    pub date: Option<NaiveDate>,
    #[validate(custom(function = "validate_time"))]
    pub start: Option<String>,
    #[validate(custom(function = "validate_time"))]
    pub end: Option<String>,
    pub day_type: Option<DayType>,
}

impl CreateBookingBody {
    pub fn into_request(self) -> Result<BookingRequest, ApiError> {
        let kind = slot_kind(self.start.as_deref(), self.end.as_deref(), self.day_type)?;
        Ok(BookingRequest {
            resource_id: self.resource_id,
            holder: self.holder,
            date: self.date,
            kind,
        })
    }
}

/// Body of `PUT /bookings/:id/slot`
#[derive(Debug, Deserialize, Validate)]
pub struct MoveBookingBody {
    pub date: NaiveDate,
    #[validate(custom(function = "validate_time"))]
    pub start: Option<String>,
    #[validate(custom(function = "validate_time"))]
    pub end: Option<String>,
    pub day_type: Option<DayType>,
}

impl MoveBookingBody {
    pub fn into_slot(self) -> Result<Slot, ApiError> {
        match slot_kind(self.start.as_deref(), self.end.as_deref(), self.day_type)? {
            BookingKind::Timed { start, end } => Interval::new(self.date, start, end)
                .map(Slot::timed)
                .map_err(|e| ApiError::bad_request(e.to_string())),
            BookingKind::FlexDay { day_type } => Ok(Slot::flex(self.date, day_type)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: BookingStatus,
}

// ============================================================================
// Patterns
// ============================================================================

/// Body of `POST /patterns`
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_pattern_dates"))]
pub struct CreatePatternBody {
    pub resource_id: ResourceId,
    pub holder: Holder,
    #[validate(custom(function = "validate_time"))]
    pub start: Option<String>,
    #[validate(custom(function = "validate_time"))]
    pub end: Option<String>,
    pub day_type: Option<DayType>,
    pub rule: RecurrenceRule,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

fn validate_pattern_dates(body: &CreatePatternBody) -> Result<(), ValidationError> {
    match body.end_date {
        Some(end) if end < body.start_date => Err(ValidationError::new("end_before_start")),
        _ => Ok(()),
    }
}

impl CreatePatternBody {
    pub fn into_request(self) -> Result<PatternRequest, ApiError> {
        let template = match slot_kind(self.start.as_deref(), self.end.as_deref(), self.day_type)? {
            BookingKind::Timed { start, end } => SlotTemplate::Timed { start, end },
            BookingKind::FlexDay { day_type } => SlotTemplate::FlexDay { day_type },
        };
        Ok(PatternRequest {
            resource_id: self.resource_id,
            holder: self.holder,
            template,
            rule: self.rule,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtendPatternBody {
    pub until: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct DeactivatePatternBody {
    pub end_date: NaiveDate,
    #[serde(default)]
    pub cancel_future: bool,
}

// ============================================================================
// Queries
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

/// Query of `GET /resources/:id/free-slots`; opening hours default to 08:00-18:00
#[derive(Debug, Deserialize, Validate)]
pub struct FreeSlotsQuery {
    pub date: NaiveDate,
    #[validate(custom(function = "validate_time"))]
    pub from: Option<String>,
    #[validate(custom(function = "validate_time"))]
    pub until: Option<String>,
}

impl FreeSlotsQuery {
    pub fn opening_hours(&self) -> (u32, u32) {
        let from = self.from.as_deref().and_then(parse_time).unwrap_or(8 * 60);
        let until = self.until.as_deref().and_then(parse_time).unwrap_or(18 * 60);
        (from, until)
    }
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// `YYYY-MM`
    pub month: String,
}

impl MonthQuery {
    pub fn month(&self) -> Result<YearMonth, ApiError> {
        self.month
            .parse()
            .map_err(|_| ApiError::bad_request(format!("invalid month '{}', expected YYYY-MM", self.month)))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
}

impl From<&Interval> for TimeSlot {
    fn from(interval: &Interval) -> Self {
        Self {
            start: format_time(interval.start()),
            end: format_time(interval.end()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreditUsageResponse {
    pub lease_id: LeaseId,
    pub month: YearMonth,
    pub quota: Decimal,
    pub used: Decimal,
    pub remaining: Decimal,
}

impl From<CreditLedger> for CreditUsageResponse {
    fn from(ledger: CreditLedger) -> Self {
        Self {
            remaining: ledger.remaining(),
            lease_id: ledger.lease_id,
            month: ledger.month,
            quota: ledger.quota,
            used: ledger.used,
        }
    }
}
