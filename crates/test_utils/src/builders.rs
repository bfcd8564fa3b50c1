//! Test Data Builders
//!
//! Builders for bookings and for pre-seeded in-memory stores. Tests set only
//! the fields they care about; everything else falls back to the fixtures.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{Holder, InvoiceId, PatternId, Percentage, ResourceId};
use domain_billing::ports::mock::MockInvoicePort;
use domain_billing::DraftInvoice;
use domain_booking::ports::mock::MockBookingPort;
use domain_booking::{
    Booking, BookingStatus, DayType, Interval, Lease, PricingSnapshot, Slot, TariffCard,
};

use crate::fixtures::{IdFixtures, IntervalFixtures, TariffFixtures};

/// Builder for constructing test bookings
pub struct TestBookingBuilder {
    resource_id: ResourceId,
    holder: Holder,
    slot: Slot,
    status: BookingStatus,
    priced_with: Option<(TariffCard, Percentage)>,
    pattern_id: Option<PatternId>,
    invoice_id: Option<InvoiceId>,
}

impl Default for TestBookingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBookingBuilder {
    /// A confirmed 09:00-13:00 tenant booking of the fixture meeting room
    pub fn new() -> Self {
        Self {
            resource_id: IdFixtures::meeting_room(),
            holder: IdFixtures::tenant(),
            slot: Slot::timed(IntervalFixtures::morning_meeting()),
            status: BookingStatus::Confirmed,
            priced_with: None,
            pattern_id: None,
            invoice_id: None,
        }
    }

    pub fn with_resource(mut self, resource_id: ResourceId) -> Self {
        self.resource_id = resource_id;
        self
    }

    pub fn with_holder(mut self, holder: Holder) -> Self {
        self.holder = holder;
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.slot = Slot::timed(interval);
        self
    }

    /// Timed slot from "HH:MM" times
    pub fn at(self, date: NaiveDate, start: &str, end: &str) -> Self {
        self.with_interval(IntervalFixtures::at(date, start, end))
    }

    pub fn flex(mut self, date: NaiveDate, day_type: DayType) -> Self {
        self.slot = Slot::flex(date, day_type);
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    /// Prices the booking on `card` with `discount`
    pub fn priced(mut self, card: TariffCard, discount: Percentage) -> Self {
        self.priced_with = Some((card, discount));
        self
    }

    /// Prices the booking on the meeting room card without discount
    pub fn priced_default(self) -> Self {
        self.priced(TariffFixtures::meeting_room(), Percentage::ZERO)
    }

    pub fn with_pattern(mut self, pattern_id: PatternId) -> Self {
        self.pattern_id = Some(pattern_id);
        self
    }

    pub fn with_invoice(mut self, invoice_id: InvoiceId) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }

    pub fn build(self) -> Booking {
        let mut booking = Booking::new(self.resource_id, self.holder, self.slot).with_status(self.status);
        if let Some((card, discount)) = &self.priced_with {
            booking = booking.with_pricing(PricingSnapshot::price(card, self.slot.billable_hours(), *discount));
        }
        booking.pattern_id = self.pattern_id;
        booking.invoice_id = self.invoice_id;
        booking
    }
}

/// In-memory stores shared between a test and the code under test
pub struct MockStores {
    pub bookings: Arc<MockBookingPort>,
    pub invoices: Arc<MockInvoicePort>,
}

/// Builder for pre-seeded mock stores
pub struct MockStoresBuilder {
    bookings: MockBookingPort,
    invoices: MockInvoicePort,
}

impl Default for MockStoresBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStoresBuilder {
    pub fn new() -> Self {
        Self {
            bookings: MockBookingPort::new(),
            invoices: MockInvoicePort::new(),
        }
    }

    /// Meeting room and flex desk tariffs from the fixtures
    pub async fn with_default_tariffs(self) -> Self {
        self.with_tariff(IdFixtures::meeting_room(), TariffFixtures::meeting_room())
            .await
            .with_tariff(IdFixtures::flex_desk(), TariffFixtures::flex_desk_vat_inclusive())
            .await
    }

    pub async fn with_tariff(mut self, resource_id: ResourceId, card: TariffCard) -> Self {
        self.bookings = self.bookings.with_tariff(resource_id, card).await;
        self
    }

    pub async fn with_discount(mut self, holder: Holder, discount: Percentage) -> Self {
        self.bookings = self.bookings.with_discount(holder, discount).await;
        self
    }

    pub async fn with_lease(mut self, lease: Lease) -> Self {
        self.bookings = self.bookings.with_lease(lease).await;
        self
    }

    pub async fn with_bookings(mut self, bookings: Vec<Booking>) -> Self {
        self.bookings = self.bookings.with_bookings(bookings).await;
        self
    }

    pub async fn with_invoices(mut self, invoices: Vec<DraftInvoice>) -> Self {
        self.invoices = self.invoices.with_invoices(invoices).await;
        self
    }

    /// Rejects overlapping inserts in the store itself
    pub fn with_exclusion_constraint(mut self) -> Self {
        self.bookings = self.bookings.with_exclusion_constraint();
        self
    }

    pub fn build(self) -> MockStores {
        MockStores {
            bookings: Arc::new(self.bookings),
            invoices: Arc::new(self.invoices),
        }
    }
}
