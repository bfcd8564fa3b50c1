//! Core Kernel - Foundational types for the workspace booking engine
//!
//! This crate provides the building blocks shared by the booking and billing
//! domains:
//! - Money and percentage types with precise decimal arithmetic
//! - Calendar months and date ranges
//! - Strongly-typed identifiers and the booking `Holder` sum type
//! - Port infrastructure for record-store adapters

pub mod money;
pub mod calendar;
pub mod identifiers;
pub mod holder;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Percentage};
pub use calendar::{YearMonth, DateRange, CalendarError};
pub use identifiers::{
    ResourceId, BookingId, PatternId, TenantId, CustomerId, LeaseId, InvoiceId,
};
pub use holder::Holder;
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
