//! Booking Domain
//!
//! Scheduling rules for shared office resources:
//! - Day intervals with half-open overlap
//! - Tiered tariff resolution and holder discounts
//! - Conflict detection and day availability
//! - Recurrence expansion (daily, weekly, monthly)
//! - Flex-desk monthly credit ledger
//! - The booking entity, its status lifecycle and the `BookingPort`
//!   record-store interface

pub mod interval;
pub mod tariff;
pub mod conflict;
pub mod recurrence;
pub mod credit;
pub mod booking;
pub mod pattern;
pub mod lease;
pub mod ports;
pub mod error;

pub use interval::{Interval, MINUTES_PER_DAY, MIDDAY};
pub use tariff::{
    apply_discount, resolve, Discounted, PricingSnapshot, RateTier, TariffCard, TariffResolution,
};
pub use conflict::{agenda, find_conflict, free_slots, has_conflict, DaySchedule};
pub use recurrence::{expand, Occurrences, RecurrenceRule, WeekdaySet};
pub use credit::{CreditCheck, CreditLedger, RollingLedger};
pub use booking::{Booking, BookingStatus, DayType, HalfDayPeriod, Slot};
pub use pattern::{RecurrencePattern, SlotTemplate};
pub use lease::Lease;
pub use ports::{BookingPort, BookingQuery};
pub use error::BookingError;
