//! Comprehensive tests for domain_billing

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BookingId, Currency, CustomerId, Holder, Money, Percentage, TenantId, YearMonth};

use domain_billing::invoice::{BookingCharge, DraftInvoice, InvoiceStatus, LineKind};
use domain_billing::{net_of_vat, BillingError};

fn eur(amount: Decimal) -> Money {
    Money::new(amount, Currency::EUR)
}

fn period() -> YearMonth {
    YearMonth::new(2024, 6).unwrap()
}

fn charge(holder: Holder, day: u32, amount: Decimal, pct: Decimal) -> BookingCharge {
    let discount_pct = Percentage::new(pct).unwrap();
    BookingCharge {
        booking_id: BookingId::new(),
        holder,
        date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
        time_range: "14:00-16:00".to_string(),
        rate_description: "Hourly rate".to_string(),
        amount: eur(amount),
        discount_pct,
        discount_amount: discount_pct.of(&eur(amount)),
    }
}

fn draft(holder: Holder) -> DraftInvoice {
    DraftInvoice::new(holder, period(), Currency::EUR, Percentage::new(dec!(21)).unwrap(), 14)
}

// ============================================================================
// Draft Invoice Tests
// ============================================================================

mod draft_invoice_tests {
    use super::*;

    #[test]
    fn test_new_invoice_is_empty_draft() {
        let inv = draft(Holder::Customer(CustomerId::new()));
        assert_eq!(inv.status, InvoiceStatus::Draft);
        assert!(inv.lines.is_empty());
        assert!(inv.total.is_zero());
        assert_eq!((inv.due_date - inv.invoice_date).num_days(), 14);
    }

    #[test]
    fn test_discount_line_only_when_discounted() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = draft(holder);
        inv.add_booking(&charge(holder, 3, dec!(50), dec!(0))).unwrap();
        inv.add_booking(&charge(holder, 4, dec!(50), dec!(20))).unwrap();

        let kinds: Vec<_> = inv.lines.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LineKind::Charge, LineKind::Charge, LineKind::Discount]);
        assert_eq!(inv.subtotal, eur(dec!(100)));
        assert_eq!(inv.discount_total, eur(dec!(10)));
        // (100 - 10) * 1.21
        assert_eq!(inv.total, eur(dec!(108.90)));
    }

    #[test]
    fn test_booking_ids_lists_charges_once() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = draft(holder);
        let c = charge(holder, 3, dec!(50), dec!(10));
        inv.add_booking(&c).unwrap();
        assert_eq!(inv.booking_ids(), vec![c.booking_id]);
        assert!(inv.contains_booking(c.booking_id));
    }
}

// ============================================================================
// Reconciliation Tests
// ============================================================================

mod reconciliation_tests {
    use super::*;

    #[test]
    fn test_subtotal_tracks_linked_bookings() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = draft(holder);
        let charges: Vec<_> = (1..=5)
            .map(|d| charge(holder, d, Decimal::from(d * 10), dec!(10)))
            .collect();
        for c in &charges {
            inv.add_booking(c).unwrap();
        }
        assert_eq!(inv.subtotal, eur(dec!(150)));

        inv.remove_booking(charges[1].booking_id).unwrap();
        inv.remove_booking(charges[3].booking_id).unwrap();
        assert_eq!(inv.subtotal, eur(dec!(90)));
        assert_eq!(inv.discount_total, eur(dec!(9)));
        assert_eq!(inv.notes().len(), 6);
    }

    #[test]
    fn test_removing_every_booking_empties_invoice() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = draft(holder);
        let c = charge(holder, 3, dec!(50), dec!(10));
        inv.add_booking(&c).unwrap();
        let removal = inv.remove_booking(c.booking_id).unwrap();
        assert!(removal.removed);
        assert!(removal.now_empty);
        assert!(inv.notes().is_empty());
    }

    #[test]
    fn test_paid_invoice_is_locked() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = draft(holder);
        let c = charge(holder, 3, dec!(50), dec!(0));
        inv.add_booking(&c).unwrap();
        inv.issue().unwrap();
        inv.mark_paid().unwrap();

        let err = inv.remove_booking(c.booking_id).unwrap_err();
        assert_eq!(
            err,
            BillingError::InvoiceLocked {
                invoice_id: inv.id,
                status: InvoiceStatus::Paid,
            }
        );
    }

    #[test]
    fn test_vat_inclusive_rate_enters_net() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = draft(holder);
        let vat = Percentage::new(dec!(21)).unwrap();
        let mut c = charge(holder, 3, dec!(0), dec!(0));
        c.amount = net_of_vat(eur(dec!(121)), vat).unwrap();
        inv.add_booking(&c).unwrap();
        assert_eq!(inv.subtotal, eur(dec!(100)));
        assert_eq!(inv.vat_amount, eur(dec!(21)));
        assert_eq!(inv.total, eur(dec!(121)));
    }
}
