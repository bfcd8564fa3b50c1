//! Request and outcome types of the engine operations

use chrono::NaiveDate;
use core_kernel::{BookingId, Holder, InvoiceId, LeaseId, PatternId, ResourceId, YearMonth};
use domain_booking::{
    Booking, DayType, Interval, RecurrencePattern, RecurrenceRule, Slot, SlotTemplate,
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// What kind of slot a booking request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookingKind {
    /// Meeting-room style, explicit start and end offsets in minutes
    Timed { start: u32, end: u32 },
    /// Flex-desk day or half day
    FlexDay { day_type: DayType },
}

/// A single ad-hoc booking as entered by a user
///
/// Resource, holder and date are optional so an incomplete form surfaces
/// as a validation error rather than a type error at the edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub resource_id: Option<ResourceId>,
    pub holder: Option<Holder>,
    pub date: Option<NaiveDate>,
    pub kind: BookingKind,
}

impl BookingRequest {
    pub fn timed(resource_id: ResourceId, holder: Holder, interval: Interval) -> Self {
        Self {
            resource_id: Some(resource_id),
            holder: Some(holder),
            date: Some(interval.date()),
            kind: BookingKind::Timed {
                start: interval.start(),
                end: interval.end(),
            },
        }
    }

    pub fn flex(resource_id: ResourceId, holder: Holder, date: NaiveDate, day_type: DayType) -> Self {
        Self {
            resource_id: Some(resource_id),
            holder: Some(holder),
            date: Some(date),
            kind: BookingKind::FlexDay { day_type },
        }
    }

    /// Checks required selections and builds the slot
    pub(crate) fn validate(&self) -> Result<(ResourceId, Holder, Slot), EngineError> {
        let resource_id = self
            .resource_id
            .ok_or_else(|| EngineError::validation("a resource must be selected"))?;
        let holder = self
            .holder
            .ok_or_else(|| EngineError::validation("a tenant, customer or lease must be selected"))?;
        let date = self
            .date
            .ok_or_else(|| EngineError::validation("a date must be selected"))?;
        let slot = match self.kind {
            BookingKind::Timed { start, end } => Slot::timed(Interval::new(date, start, end)?),
            BookingKind::FlexDay { day_type } => Slot::flex(date, day_type),
        };
        Ok((resource_id, holder, slot))
    }
}

/// A recurring booking series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRequest {
    pub resource_id: ResourceId,
    pub holder: Holder,
    pub template: SlotTemplate,
    pub rule: RecurrenceRule,
    pub start_date: NaiveDate,
    /// `None` for an open-ended series
    pub end_date: Option<NaiveDate>,
}

impl PatternRequest {
    pub(crate) fn into_pattern(self) -> Result<RecurrencePattern, EngineError> {
        Ok(RecurrencePattern::new(
            self.resource_id,
            self.holder,
            self.template,
            self.rule,
            self.start_date,
            self.end_date,
        )?)
    }
}

/// Result of filling a pattern with bookings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFill {
    pub pattern_id: PatternId,
    pub created: usize,
    /// Dates skipped because the slot was taken
    pub skipped_conflicts: usize,
    /// Dates skipped because the lease had no credits left that month
    pub skipped_quota: usize,
}

impl PatternFill {
    pub(crate) fn new(pattern_id: PatternId) -> Self {
        Self {
            pattern_id,
            created: 0,
            skipped_conflicts: 0,
            skipped_quota: 0,
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_conflicts + self.skipped_quota
    }
}

/// A single flex-desk booking against a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexBookingRequest {
    pub lease_id: LeaseId,
    pub resource_id: ResourceId,
    pub date: NaiveDate,
    pub day_type: DayType,
}

/// Which dates a flex pattern fill covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "month", rename_all = "snake_case")]
pub enum FillScope {
    /// The whole lease contract
    Contract,
    /// One calendar month, clipped to the contract
    Month(YearMonth),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexFillRequest {
    pub lease_id: LeaseId,
    pub resource_id: ResourceId,
    pub rule: RecurrenceRule,
    pub day_type: DayType,
    pub scope: FillScope,
}

/// What happened to the linked invoice when a booking was cancelled, deleted or moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    /// The booking was not on an invoice
    NotLinked,
    /// The booking's lines were removed, or rewritten after a move
    Updated { invoice_id: InvoiceId },
    /// The booking moved to another month and now sits on that month's draft
    Moved { from: InvoiceId, to: InvoiceId },
    /// The booking was the last one on the invoice, which was deleted
    Deleted { invoice_id: InvoiceId },
    /// The invoice is no longer a draft and was left untouched
    Locked { invoice_id: InvoiceId },
    /// The invoice store failed; the invoice may be stale
    Failed { invoice_id: InvoiceId, error: String },
}

impl ReconciliationOutcome {
    /// Returns true for outcomes the caller should be warned about
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ReconciliationOutcome::Locked { .. } | ReconciliationOutcome::Failed { .. }
        )
    }
}

/// Result of `remove_booking_from_invoice`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRemoval {
    pub invoice_updated: bool,
    pub invoice_deleted: bool,
}

/// A status change together with its invoice side effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub booking: Booking,
    pub invoice: ReconciliationOutcome,
}

/// A moved booking together with its invoice side effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingMove {
    pub booking: Booking,
    pub invoice: ReconciliationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
    pub booking_id: BookingId,
    pub invoice: ReconciliationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDeactivation {
    pub pattern: RecurrencePattern,
    pub cancelled: usize,
    /// Invoice outcomes that need attention, one per affected booking
    pub warnings: Vec<ReconciliationOutcome>,
}
