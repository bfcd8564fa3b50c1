//! Booking Domain Ports
//!
//! This module defines the record-store interface the booking engine
//! consumes. The engine never talks to a database directly; it receives an
//! `Arc<dyn BookingPort>` at construction.
//!
//! # Adapters
//!
//! - **PostgreSQL**: `infra_db::PgBookingStore`
//! - **Mock**: [`mock::MockBookingPort`], enabled by the `mock` feature, for
//!   tests that need no database
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_booking::ports::{BookingPort, BookingQuery};
//!
//! let day = port
//!     .find_bookings(BookingQuery::for_resource(room).on(date).active_only())
//!     .await?;
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::{
    BookingId, DomainPort, HealthCheckable, Holder, LeaseId, PatternId, Percentage, PortError,
    ResourceId,
};

use crate::booking::{Booking, BookingStatus};
use crate::lease::Lease;
use crate::pattern::RecurrencePattern;
use crate::tariff::TariffCard;

/// Filters for [`BookingPort::find_bookings`]
///
/// Unset fields do not filter. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingQuery {
    pub resource_id: Option<ResourceId>,
    pub holder: Option<Holder>,
    pub pattern_id: Option<PatternId>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Exclude cancelled bookings
    pub active_only: bool,
    pub status: Option<BookingStatus>,
}

impl BookingQuery {
    pub fn for_resource(resource_id: ResourceId) -> Self {
        Self {
            resource_id: Some(resource_id),
            ..Default::default()
        }
    }

    pub fn for_holder(holder: Holder) -> Self {
        Self {
            holder: Some(holder),
            ..Default::default()
        }
    }

    pub fn for_pattern(pattern_id: PatternId) -> Self {
        Self {
            pattern_id: Some(pattern_id),
            ..Default::default()
        }
    }

    /// Restricts to a single date
    pub fn on(self, date: NaiveDate) -> Self {
        self.between(date, date)
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn from_date(mut self, from: NaiveDate) -> Self {
        self.date_from = Some(from);
        self
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if `booking` satisfies every set filter
    pub fn matches(&self, booking: &Booking) -> bool {
        let date = booking.date();
        self.resource_id.map_or(true, |r| booking.resource_id == r)
            && self.holder.map_or(true, |h| booking.holder == h)
            && self.pattern_id.map_or(true, |p| booking.pattern_id == Some(p))
            && self.date_from.map_or(true, |from| date >= from)
            && self.date_to.map_or(true, |to| date <= to)
            && (!self.active_only || booking.is_active())
            && self.status.map_or(true, |s| booking.status == s)
    }
}

/// Record-store operations needed by the booking engine
///
/// Inserts and updates may fail with `PortError::Conflict` when the store
/// itself enforces non-overlap.
#[async_trait]
pub trait BookingPort: DomainPort + HealthCheckable {
    // ========================================================================
    // Bookings
    // ========================================================================

    /// Retrieves a booking by ID, or `PortError::NotFound`
    async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError>;

    /// Bookings matching the query, ordered by date then start offset
    async fn find_bookings(&self, query: BookingQuery) -> Result<Vec<Booking>, PortError>;

    async fn insert_booking(&self, booking: Booking) -> Result<Booking, PortError>;

    /// Inserts a batch as one unit and returns how many rows were written
    ///
    /// Either the whole batch is committed or none of it is.
    async fn insert_bookings(&self, bookings: Vec<Booking>) -> Result<usize, PortError>;

    async fn update_booking(&self, booking: Booking) -> Result<Booking, PortError>;

    async fn delete_booking(&self, id: BookingId) -> Result<(), PortError>;

    // ========================================================================
    // Recurrence patterns
    // ========================================================================

    async fn get_pattern(&self, id: PatternId) -> Result<RecurrencePattern, PortError>;

    async fn insert_pattern(&self, pattern: RecurrencePattern) -> Result<RecurrencePattern, PortError>;

    async fn update_pattern(&self, pattern: RecurrencePattern) -> Result<RecurrencePattern, PortError>;

    // ========================================================================
    // Reference data
    // ========================================================================

    /// Tariff card for the resource's type
    async fn get_tariff_card(&self, resource_id: ResourceId) -> Result<TariffCard, PortError>;

    /// Discount for a tenant or customer; zero when none is configured
    async fn holder_discount(&self, holder: &Holder) -> Result<Percentage, PortError>;

    async fn get_lease(&self, id: LeaseId) -> Result<Lease, PortError>;
}

/// Mock implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory mock implementation of BookingPort
    #[derive(Debug, Default)]
    pub struct MockBookingPort {
        bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
        patterns: Arc<RwLock<HashMap<PatternId, RecurrencePattern>>>,
        tariffs: Arc<RwLock<HashMap<ResourceId, TariffCard>>>,
        discounts: Arc<RwLock<HashMap<Holder, Percentage>>>,
        leases: Arc<RwLock<HashMap<LeaseId, Lease>>>,
        /// Remaining booking rows that may be inserted before inserts fail
        insert_budget: Arc<RwLock<Option<usize>>>,
        /// Remaining booking updates allowed before updates fail
        update_budget: Arc<RwLock<Option<usize>>>,
        batch_calls: AtomicUsize,
        exclusion_constraint: bool,
    }

    impl MockBookingPort {
        /// Creates a new mock port
        pub fn new() -> Self {
            Self::default()
        }

        /// Rejects overlapping active bookings on insert, like the database
        /// exclusion constraint does
        pub fn with_exclusion_constraint(mut self) -> Self {
            self.exclusion_constraint = true;
            self
        }

        pub async fn with_tariff(self, resource_id: ResourceId, card: TariffCard) -> Self {
            self.tariffs.write().await.insert(resource_id, card);
            self
        }

        pub async fn with_discount(self, holder: Holder, discount: Percentage) -> Self {
            self.discounts.write().await.insert(holder, discount);
            self
        }

        pub async fn with_lease(self, lease: Lease) -> Self {
            self.leases.write().await.insert(lease.id, lease);
            self
        }

        /// Pre-populates with bookings for testing
        pub async fn with_bookings(self, bookings: Vec<Booking>) -> Self {
            {
                let mut store = self.bookings.write().await;
                for booking in bookings {
                    store.insert(booking.id, booking);
                }
            }
            self
        }

        /// Lets only `rows` more booking rows be inserted; the insert that
        /// would exceed the budget fails with a connection error
        pub async fn fail_inserts_after(&self, rows: usize) {
            *self.insert_budget.write().await = Some(rows);
        }

        /// Lets only `updates` more booking updates succeed
        pub async fn fail_updates_after(&self, updates: usize) {
            *self.update_budget.write().await = Some(updates);
        }

        /// Every stored booking, in no particular order
        pub async fn all_bookings(&self) -> Vec<Booking> {
            self.bookings.read().await.values().cloned().collect()
        }

        /// Number of `insert_bookings` calls made so far
        pub fn batch_calls(&self) -> usize {
            self.batch_calls.load(Ordering::SeqCst)
        }

        async fn take_budget(&self, rows: usize) -> Result<(), PortError> {
            let mut budget = self.insert_budget.write().await;
            if let Some(remaining) = budget.as_mut() {
                if rows > *remaining {
                    return Err(PortError::connection("mock store unavailable"));
                }
                *remaining -= rows;
            }
            Ok(())
        }

        fn check_exclusion(
            &self,
            store: &HashMap<BookingId, Booking>,
            candidate: &Booking,
        ) -> Result<(), PortError> {
            if !self.exclusion_constraint || !candidate.is_active() {
                return Ok(());
            }
            let clash = store.values().any(|b| {
                b.id != candidate.id
                    && b.is_active()
                    && b.resource_id == candidate.resource_id
                    && b.interval().overlaps(&candidate.interval())
            });
            if clash {
                return Err(PortError::conflict("bookings_no_overlap"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockBookingPort {}

    #[async_trait]
    impl HealthCheckable for MockBookingPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-booking-port".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl BookingPort for MockBookingPort {
        async fn get_booking(&self, id: BookingId) -> Result<Booking, PortError> {
            self.bookings
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Booking", id))
        }

        async fn find_bookings(&self, query: BookingQuery) -> Result<Vec<Booking>, PortError> {
            let store = self.bookings.read().await;
            let mut results: Vec<Booking> =
                store.values().filter(|b| query.matches(b)).cloned().collect();
            results.sort_by_key(|b| (b.date(), b.interval().start(), b.id));
            Ok(results)
        }

        async fn insert_booking(&self, booking: Booking) -> Result<Booking, PortError> {
            self.take_budget(1).await?;
            let mut store = self.bookings.write().await;
            self.check_exclusion(&store, &booking)?;
            store.insert(booking.id, booking.clone());
            Ok(booking)
        }

        async fn insert_bookings(&self, bookings: Vec<Booking>) -> Result<usize, PortError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            self.take_budget(bookings.len()).await?;
            let mut store = self.bookings.write().await;
            for booking in &bookings {
                self.check_exclusion(&store, booking)?;
            }
            let count = bookings.len();
            for booking in bookings {
                store.insert(booking.id, booking);
            }
            Ok(count)
        }

        async fn update_booking(&self, booking: Booking) -> Result<Booking, PortError> {
            if let Some(remaining) = self.update_budget.write().await.as_mut() {
                if *remaining == 0 {
                    return Err(PortError::connection("mock store unavailable"));
                }
                *remaining -= 1;
            }
            let mut store = self.bookings.write().await;
            if !store.contains_key(&booking.id) {
                return Err(PortError::not_found("Booking", booking.id));
            }
            self.check_exclusion(&store, &booking)?;
            store.insert(booking.id, booking.clone());
            Ok(booking)
        }

        async fn delete_booking(&self, id: BookingId) -> Result<(), PortError> {
            self.bookings
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Booking", id))
        }

        async fn get_pattern(&self, id: PatternId) -> Result<RecurrencePattern, PortError> {
            self.patterns
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("RecurrencePattern", id))
        }

        async fn insert_pattern(&self, pattern: RecurrencePattern) -> Result<RecurrencePattern, PortError> {
            self.patterns.write().await.insert(pattern.id, pattern.clone());
            Ok(pattern)
        }

        async fn update_pattern(&self, pattern: RecurrencePattern) -> Result<RecurrencePattern, PortError> {
            let mut patterns = self.patterns.write().await;
            if !patterns.contains_key(&pattern.id) {
                return Err(PortError::not_found("RecurrencePattern", pattern.id));
            }
            patterns.insert(pattern.id, pattern.clone());
            Ok(pattern)
        }

        async fn get_tariff_card(&self, resource_id: ResourceId) -> Result<TariffCard, PortError> {
            self.tariffs
                .read()
                .await
                .get(&resource_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("TariffCard", resource_id))
        }

        async fn holder_discount(&self, holder: &Holder) -> Result<Percentage, PortError> {
            Ok(self
                .discounts
                .read()
                .await
                .get(holder)
                .copied()
                .unwrap_or(Percentage::ZERO))
        }

        async fn get_lease(&self, id: LeaseId) -> Result<Lease, PortError> {
            self.leases
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Lease", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockBookingPort;
    use super::*;
    use crate::booking::Slot;
    use crate::interval::Interval;
    use core_kernel::TenantId;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn booking(resource: ResourceId, d: u32, start: u32, end: u32) -> Booking {
        let interval = Interval::new(date(d), start, end).unwrap();
        Booking::new(resource, Holder::Tenant(TenantId::new()), Slot::timed(interval))
    }

    #[tokio::test]
    async fn test_find_filters_and_orders() {
        let room = ResourceId::new();
        let other = ResourceId::new();
        let port = MockBookingPort::new()
            .with_bookings(vec![
                booking(room, 5, 600, 660),
                booking(room, 5, 540, 600),
                booking(room, 6, 540, 600),
                booking(other, 5, 540, 600),
                booking(room, 5, 700, 760).with_status(BookingStatus::Cancelled),
            ])
            .await;

        let day = port
            .find_bookings(BookingQuery::for_resource(room).on(date(5)).active_only())
            .await
            .unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].interval().start(), 540);
        assert_eq!(day[1].interval().start(), 600);
    }

    #[tokio::test]
    async fn test_insert_budget_fails_whole_batch() {
        let room = ResourceId::new();
        let port = MockBookingPort::new();
        port.fail_inserts_after(2).await;

        let batch = vec![booking(room, 1, 0, 60), booking(room, 2, 0, 60)];
        assert_eq!(port.insert_bookings(batch).await.unwrap(), 2);

        let batch = vec![booking(room, 3, 0, 60)];
        let err = port.insert_bookings(batch).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(port.all_bookings().await.len(), 2);
        assert_eq!(port.batch_calls(), 2);
    }

    #[tokio::test]
    async fn test_exclusion_constraint_rejects_overlap() {
        let room = ResourceId::new();
        let port = MockBookingPort::new().with_exclusion_constraint();
        port.insert_booking(booking(room, 4, 540, 780)).await.unwrap();
        let err = port.insert_booking(booking(room, 4, 720, 840)).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_missing_discount_is_zero() {
        let port = MockBookingPort::new();
        let pct = port.holder_discount(&Holder::Tenant(TenantId::new())).await.unwrap();
        assert!(pct.is_zero());
    }
}
