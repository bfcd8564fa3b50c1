//! Custom Test Assertions
//!
//! Assertion helpers for booking and invoice invariants that give more
//! meaningful failure messages than a bare `assert!`.

use chrono::NaiveDate;
use core_kernel::Money;
use domain_billing::{DraftInvoice, LineKind};
use domain_booking::Booking;
use rust_decimal::Decimal;

/// Asserts that a Money value has exactly the expected amount
pub fn assert_money_eq(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Expected {} but got {}",
        expected,
        actual
    );
}

/// Asserts that no two active bookings of the same resource overlap
///
/// # Panics
///
/// Panics naming the first overlapping pair found
pub fn assert_no_double_booking(bookings: &[Booking]) {
    let active: Vec<&Booking> = bookings.iter().filter(|b| b.is_active()).collect();
    for (i, a) in active.iter().enumerate() {
        for b in &active[i + 1..] {
            assert!(
                a.resource_id != b.resource_id || !a.interval().overlaps(&b.interval()),
                "Bookings {} ({}) and {} ({}) overlap",
                a.id,
                a.interval(),
                b.id,
                b.interval()
            );
        }
    }
}

/// Asserts that dates are strictly ascending
pub fn assert_ascending(dates: &[NaiveDate]) {
    for pair in dates.windows(2) {
        assert!(pair[0] < pair[1], "Dates out of order: {} then {}", pair[0], pair[1]);
    }
}

/// Asserts that an invoice's subtotal equals the sum of its charge lines
/// and that VAT and total follow from it
pub fn assert_invoice_consistent(invoice: &DraftInvoice) {
    let charges: Decimal = invoice
        .lines
        .iter()
        .filter(|l| l.kind == LineKind::Charge)
        .map(|l| l.amount.amount())
        .sum::<Decimal>()
        .round_dp(2);
    assert_eq!(
        invoice.subtotal.amount(),
        charges,
        "Invoice {} subtotal {} does not match its charge lines {}",
        invoice.invoice_number,
        invoice.subtotal,
        charges
    );

    let discounts: Decimal = invoice
        .lines
        .iter()
        .filter(|l| l.kind == LineKind::Discount)
        .map(|l| l.amount.amount())
        .sum::<Decimal>()
        .round_dp(2);
    assert_eq!(invoice.discount_total.amount(), discounts, "Discount total mismatch");

    // Subtotal and discounts are rounded separately, so allow a cent
    let expected = invoice.subtotal.amount() - invoice.discount_total.amount() + invoice.vat_amount.amount();
    assert!(
        (invoice.total.amount() - expected).abs() <= Decimal::new(1, 2),
        "Invoice {} total {} is not net plus VAT ({})",
        invoice.invoice_number,
        invoice.total,
        expected
    );
}

/// Asserts that an invoice lists exactly the given bookings
pub fn assert_invoice_covers(invoice: &DraftInvoice, bookings: &[&Booking]) {
    let mut expected: Vec<_> = bookings.iter().map(|b| b.id).collect();
    let mut actual = invoice.booking_ids();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected, "Invoice {} covers the wrong bookings", invoice.invoice_number);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::TestBookingBuilder;
    use crate::fixtures::{DateFixtures, MoneyFixtures};
    use domain_booking::BookingStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_eq_ignores_scale() {
        assert_money_eq(&MoneyFixtures::eur(dec!(72.00)), dec!(72));
    }

    #[test]
    fn test_cancelled_overlap_is_allowed() {
        let day = DateFixtures::monday();
        let a = TestBookingBuilder::new().at(day, "09:00", "11:00").build();
        let b = TestBookingBuilder::new()
            .at(day, "10:00", "12:00")
            .with_status(BookingStatus::Cancelled)
            .build();
        assert_no_double_booking(&[a, b]);
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn test_active_overlap_panics() {
        let day = DateFixtures::monday();
        let a = TestBookingBuilder::new().at(day, "09:00", "11:00").build();
        let b = TestBookingBuilder::new().at(day, "10:30", "12:00").build();
        assert_no_double_booking(&[a, b]);
    }
}
