//! Draft invoices for resource bookings
//!
//! One draft invoice exists per holder and calendar month. Each booking adds
//! a charge line and, when a discount applied, a paired discount line. Lines
//! are structured records keyed by booking id; the free-text notes shown on
//! the printed invoice are rendered from them.
//!
//! Totals are always recomputed from the lines:
//! - `subtotal = Σ charge amounts` (pre-discount, net of VAT)
//! - `discount_total = Σ discount amounts`
//! - `vat_amount = (subtotal - discount_total) * vat_rate`
//! - `total = subtotal - discount_total + vat_amount`

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{BookingId, Currency, Holder, InvoiceId, Money, MoneyError, Percentage, YearMonth};

use crate::error::BillingError;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Still mutable by booking reconciliation
    Draft,
    /// Sent to the holder; locked
    Issued,
    /// Fully paid
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "issued" => Ok(InvoiceStatus::Issued),
            "paid" => Ok(InvoiceStatus::Paid),
            other => Err(format!("unknown invoice status {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Charge,
    Discount,
}

/// A line on an invoice, attributed to one booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub booking_id: BookingId,
    pub kind: LineKind,
    pub description: String,
    /// Always non-negative; discount lines are subtracted
    pub amount: Money,
}

impl InvoiceLine {
    /// The text line printed in the invoice notes
    pub fn render(&self) -> String {
        match self.kind {
            LineKind::Charge => format!("{}: {}", self.description, self.amount),
            LineKind::Discount => format!("{}: -{}", self.description, self.amount),
        }
    }
}

/// What one booking contributes to an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCharge {
    pub booking_id: BookingId,
    pub holder: Holder,
    pub date: NaiveDate,
    /// e.g. `09:00-13:00` or `full day`
    pub time_range: String,
    /// e.g. `Half-day rate`
    pub rate_description: String,
    /// Pre-discount amount, net of VAT
    pub amount: Money,
    pub discount_pct: Percentage,
    /// Net of VAT
    pub discount_amount: Money,
}

impl BookingCharge {
    fn lines(&self) -> Vec<InvoiceLine> {
        let mut lines = vec![InvoiceLine {
            booking_id: self.booking_id,
            kind: LineKind::Charge,
            description: format!("{} {} - {}", self.date, self.time_range, self.rate_description),
            amount: self.amount,
        }];
        if self.discount_amount.is_positive() {
            lines.push(InvoiceLine {
                booking_id: self.booking_id,
                kind: LineKind::Discount,
                description: format!("Discount {} ({})", self.discount_pct, self.date),
                amount: self.discount_amount,
            });
        }
        lines
    }
}

/// Converts a VAT-inclusive amount to its net part
pub fn net_of_vat(gross: Money, vat_rate: Percentage) -> Result<Money, MoneyError> {
    gross.divide(rust_decimal::Decimal::ONE + vat_rate.as_fraction())
}

/// Outcome of removing a booking from an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRemoval {
    /// Lines for the booking were found and removed
    pub removed: bool,
    /// No charge lines remain; the invoice should be deleted
    pub now_empty: bool,
}

/// A monthly invoice for one holder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftInvoice {
    pub id: InvoiceId,
    /// Human-readable number
    pub invoice_number: String,
    pub holder: Holder,
    pub period: YearMonth,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: Currency,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub discount_total: Money,
    pub vat_rate: Percentage,
    pub vat_amount: Money,
    pub total: Money,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DraftInvoice {
    /// Creates an empty draft invoice
    ///
    /// # Arguments
    ///
    /// * `holder` - Party being billed
    /// * `period` - Month the invoiced bookings fall in
    /// * `currency` - Invoice currency
    /// * `vat_rate` - VAT applied to the net total
    /// * `payment_term_days` - Days from invoice date to due date
    pub fn new(
        holder: Holder,
        period: YearMonth,
        currency: Currency,
        vat_rate: Percentage,
        payment_term_days: u64,
    ) -> Self {
        let now = Utc::now();
        let invoice_date = now.date_naive();
        Self {
            id: InvoiceId::new_v7(),
            invoice_number: generate_invoice_number(period),
            holder,
            period,
            invoice_date,
            due_date: invoice_date
                .checked_add_days(Days::new(payment_term_days))
                .unwrap_or(invoice_date),
            currency,
            lines: Vec::new(),
            subtotal: Money::zero(currency),
            discount_total: Money::zero(currency),
            vat_rate,
            vat_amount: Money::zero(currency),
            total: Money::zero(currency),
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.status == InvoiceStatus::Draft
    }

    /// Fails with `InvoiceLocked` unless the invoice is a draft
    pub fn ensure_mutable(&self) -> Result<(), BillingError> {
        if self.is_draft() {
            Ok(())
        } else {
            Err(BillingError::InvoiceLocked {
                invoice_id: self.id,
                status: self.status,
            })
        }
    }

    pub fn contains_booking(&self, booking_id: BookingId) -> bool {
        self.lines.iter().any(|l| l.booking_id == booking_id)
    }

    /// Ids of the bookings with a charge on this invoice
    pub fn booking_ids(&self) -> Vec<BookingId> {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Charge)
            .map(|l| l.booking_id)
            .collect()
    }

    /// Adds a booking's lines, replacing any lines it already has
    pub fn add_booking(&mut self, charge: &BookingCharge) -> Result<(), BillingError> {
        self.ensure_mutable()?;
        if charge.holder != self.holder || !self.period.contains(charge.date) {
            return Err(BillingError::ForeignCharge(format!(
                "{} on {} for {}",
                charge.booking_id, charge.date, charge.holder
            )));
        }
        if charge.amount.currency() != self.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                charge.amount.currency().to_string(),
            )
            .into());
        }

        self.lines.retain(|l| l.booking_id != charge.booking_id);
        self.lines.extend(charge.lines());
        self.recalculate_totals()
    }

    /// Removes every line of a booking
    pub fn remove_booking(&mut self, booking_id: BookingId) -> Result<LineRemoval, BillingError> {
        self.ensure_mutable()?;
        let before = self.lines.len();
        self.lines.retain(|l| l.booking_id != booking_id);
        let removed = self.lines.len() != before;
        if removed {
            self.recalculate_totals()?;
        }
        Ok(LineRemoval {
            removed,
            now_empty: !self.lines.iter().any(|l| l.kind == LineKind::Charge),
        })
    }

    /// The legacy free-text notes, one line per invoice line
    pub fn notes(&self) -> Vec<String> {
        self.lines.iter().map(InvoiceLine::render).collect()
    }

    /// Locks the invoice
    pub fn issue(&mut self) -> Result<(), BillingError> {
        self.transition(InvoiceStatus::Issued)
    }

    pub fn mark_paid(&mut self) -> Result<(), BillingError> {
        self.transition(InvoiceStatus::Paid)
    }

    fn transition(&mut self, to: InvoiceStatus) -> Result<(), BillingError> {
        use InvoiceStatus::*;
        if !matches!((self.status, to), (Draft, Issued) | (Issued, Paid)) {
            return Err(BillingError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Recalculates totals based on lines
    fn recalculate_totals(&mut self) -> Result<(), BillingError> {
        let zero = Money::zero(self.currency);
        let mut subtotal = zero;
        let mut discounts = zero;
        for line in &self.lines {
            match line.kind {
                LineKind::Charge => subtotal = subtotal.checked_add(&line.amount)?,
                LineKind::Discount => discounts = discounts.checked_add(&line.amount)?,
            }
        }

        let net = subtotal.saturating_sub(&discounts)?;
        self.subtotal = subtotal.round_to_currency();
        self.discount_total = discounts.round_to_currency();
        self.vat_amount = self.vat_rate.of(&net).round_to_currency();
        self.total = net.round_to_currency().checked_add(&self.vat_amount)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Generates a unique invoice number
fn generate_invoice_number(period: YearMonth) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!(
        "INV-{:04}{:02}-{}",
        period.year(),
        period.month(),
        duration.as_millis() % 1_000_000_000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::TenantId;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn eur(amount: Decimal) -> Money {
        Money::new(amount, Currency::EUR)
    }

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    fn charge(holder: Holder, day: u32, amount: Decimal, discount: Decimal) -> BookingCharge {
        let pct = if discount.is_zero() { dec!(0) } else { dec!(10) };
        BookingCharge {
            booking_id: BookingId::new(),
            holder,
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            time_range: "09:00-13:00".to_string(),
            rate_description: "Half-day rate".to_string(),
            amount: eur(amount),
            discount_pct: Percentage::new(pct).unwrap(),
            discount_amount: eur(discount),
        }
    }

    fn invoice(holder: Holder) -> DraftInvoice {
        DraftInvoice::new(holder, march(), Currency::EUR, Percentage::new(dec!(21)).unwrap(), 14)
    }

    #[test]
    fn test_totals_after_adding_charges() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = invoice(holder);
        inv.add_booking(&charge(holder, 4, dec!(80), dec!(8))).unwrap();
        inv.add_booking(&charge(holder, 5, dec!(50), dec!(0))).unwrap();

        assert_eq!(inv.subtotal, eur(dec!(130)));
        assert_eq!(inv.discount_total, eur(dec!(8)));
        assert_eq!(inv.vat_amount, eur(dec!(25.62)));
        assert_eq!(inv.total, eur(dec!(147.62)));
        assert_eq!(inv.lines.len(), 3);
    }

    #[test]
    fn test_notes_render_charge_and_discount() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = invoice(holder);
        inv.add_booking(&charge(holder, 4, dec!(80), dec!(8))).unwrap();
        assert_eq!(
            inv.notes(),
            vec![
                "2024-03-04 09:00-13:00 - Half-day rate: €80.00".to_string(),
                "Discount 10% (2024-03-04): -€8.00".to_string(),
            ]
        );
    }

    #[test]
    fn test_re_adding_booking_replaces_lines() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = invoice(holder);
        let mut c = charge(holder, 4, dec!(80), dec!(8));
        inv.add_booking(&c).unwrap();
        c.amount = eur(dec!(90));
        c.discount_amount = eur(dec!(9));
        inv.add_booking(&c).unwrap();
        assert_eq!(inv.lines.len(), 2);
        assert_eq!(inv.subtotal, eur(dec!(90)));
    }

    #[test]
    fn test_remove_last_booking_reports_empty() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = invoice(holder);
        let a = charge(holder, 4, dec!(80), dec!(8));
        let b = charge(holder, 5, dec!(50), dec!(0));
        inv.add_booking(&a).unwrap();
        inv.add_booking(&b).unwrap();

        let first = inv.remove_booking(a.booking_id).unwrap();
        assert!(first.removed);
        assert!(!first.now_empty);
        assert_eq!(inv.subtotal, eur(dec!(50)));
        assert!(inv.discount_total.is_zero());

        let second = inv.remove_booking(b.booking_id).unwrap();
        assert!(second.now_empty);
        assert!(inv.total.is_zero());
    }

    #[test]
    fn test_removing_unknown_booking_is_a_no_op() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = invoice(holder);
        inv.add_booking(&charge(holder, 4, dec!(80), dec!(0))).unwrap();
        let outcome = inv.remove_booking(BookingId::new()).unwrap();
        assert!(!outcome.removed);
        assert_eq!(inv.subtotal, eur(dec!(80)));
    }

    #[test]
    fn test_issued_invoice_is_locked() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = invoice(holder);
        let c = charge(holder, 4, dec!(80), dec!(0));
        inv.add_booking(&c).unwrap();
        inv.issue().unwrap();

        let err = inv.remove_booking(c.booking_id).unwrap_err();
        assert!(matches!(err, BillingError::InvoiceLocked { status: InvoiceStatus::Issued, .. }));
        assert_eq!(inv.subtotal, eur(dec!(80)));
        assert!(inv.add_booking(&charge(holder, 5, dec!(10), dec!(0))).is_err());
    }

    #[test]
    fn test_rejects_charge_for_other_holder_or_month() {
        let holder = Holder::Tenant(TenantId::new());
        let mut inv = invoice(holder);
        let other = charge(Holder::Tenant(TenantId::new()), 4, dec!(80), dec!(0));
        assert!(matches!(inv.add_booking(&other), Err(BillingError::ForeignCharge(_))));

        let mut april = charge(holder, 4, dec!(80), dec!(0));
        april.date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(inv.add_booking(&april).is_err());
    }

    #[test]
    fn test_status_transitions() {
        let mut inv = invoice(Holder::Tenant(TenantId::new()));
        assert!(inv.mark_paid().is_err());
        inv.issue().unwrap();
        inv.mark_paid().unwrap();
        assert_eq!(inv.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_net_of_vat() {
        let net = net_of_vat(eur(dec!(96.80)), Percentage::new(dec!(21)).unwrap()).unwrap();
        assert_eq!(net, eur(dec!(80)));
    }

    #[test]
    fn test_invoice_number_has_period() {
        let inv = invoice(Holder::Tenant(TenantId::new()));
        assert!(inv.invoice_number.starts_with("INV-202403-"));
    }
}
