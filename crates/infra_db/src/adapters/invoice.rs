//! PostgreSQL Invoice Store
//!
//! Implements `InvoicePort` on top of [`InvoiceRepository`]. The invoice
//! period is split into year and month columns and the lines are kept as a
//! JSONB array; totals are stored as computed by the domain.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, Holder, InvoiceId, Money, Percentage, PortError,
    YearMonth,
};
use domain_billing::{DraftInvoice, InvoicePort, InvoiceStatus};

use super::codec::{currency_from_code, holder_columns, holder_from_columns};
use crate::error::DatabaseError;
use crate::repositories::invoice::{InvoiceRepository, InvoiceRow};

/// PostgreSQL-backed implementation of the InvoicePort trait
#[derive(Debug, Clone)]
pub struct PgInvoiceStore {
    repository: InvoiceRepository,
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: InvoiceRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PgInvoiceStore {}

#[async_trait]
impl HealthCheckable for PgInvoiceStore {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-invoice-store").await
    }
}

#[async_trait]
impl InvoicePort for PgInvoiceStore {
    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn get_invoice(&self, id: InvoiceId) -> Result<DraftInvoice, PortError> {
        let row = self.repository.get(*id.as_uuid()).await?;
        Ok(invoice_from_row(row)?)
    }

    #[instrument(skip(self), fields(holder = %holder, period = %period))]
    async fn find_draft(&self, holder: &Holder, period: YearMonth) -> Result<Option<DraftInvoice>, PortError> {
        let (holder_type, holder_id) = holder_columns(holder);
        let row = self
            .repository
            .find_draft(holder_type, holder_id, period.year(), period.month() as i32)
            .await?;
        debug!(found = row.is_some(), "Looked up draft invoice");
        Ok(row.map(invoice_from_row).transpose()?)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn insert_invoice(&self, invoice: DraftInvoice) -> Result<DraftInvoice, PortError> {
        self.repository.insert(&invoice_to_row(&invoice)?).await?;
        Ok(invoice)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id, lines = invoice.lines.len()))]
    async fn update_invoice(&self, invoice: DraftInvoice) -> Result<DraftInvoice, PortError> {
        self.repository.update(&invoice_to_row(&invoice)?).await?;
        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn delete_invoice(&self, id: InvoiceId) -> Result<(), PortError> {
        Ok(self.repository.delete(*id.as_uuid()).await?)
    }
}

fn invoice_to_row(invoice: &DraftInvoice) -> Result<InvoiceRow, DatabaseError> {
    let (holder_type, holder_id) = holder_columns(&invoice.holder);
    Ok(InvoiceRow {
        invoice_id: *invoice.id.as_uuid(),
        invoice_number: invoice.invoice_number.clone(),
        holder_type: holder_type.to_string(),
        holder_id,
        period_year: invoice.period.year(),
        period_month: invoice.period.month() as i32,
        invoice_date: invoice.invoice_date,
        due_date: invoice.due_date,
        currency: invoice.currency.code().to_string(),
        lines: serde_json::to_value(&invoice.lines).map_err(DatabaseError::serialization)?,
        subtotal: invoice.subtotal.amount(),
        discount_total: invoice.discount_total.amount(),
        vat_rate: invoice.vat_rate.value(),
        vat_amount: invoice.vat_amount.amount(),
        total: invoice.total.amount(),
        status: invoice.status.as_str().to_string(),
        created_at: invoice.created_at,
        updated_at: invoice.updated_at,
    })
}

fn invoice_from_row(row: InvoiceRow) -> Result<DraftInvoice, DatabaseError> {
    let currency = currency_from_code(&row.currency)?;
    let money = |amount| Money::new(amount, currency);
    let month = u32::try_from(row.period_month)
        .map_err(|_| DatabaseError::serialization(format!("invalid period month {}", row.period_month)))?;
    let period = YearMonth::new(row.period_year, month).map_err(DatabaseError::serialization)?;
    let status: InvoiceStatus = row.status.parse().map_err(DatabaseError::serialization)?;

    Ok(DraftInvoice {
        id: InvoiceId::from_uuid(row.invoice_id),
        invoice_number: row.invoice_number,
        holder: holder_from_columns(&row.holder_type, row.holder_id)?,
        period,
        invoice_date: row.invoice_date,
        due_date: row.due_date,
        currency,
        lines: serde_json::from_value(row.lines).map_err(DatabaseError::serialization)?,
        subtotal: money(row.subtotal),
        discount_total: money(row.discount_total),
        vat_rate: Percentage::new(row.vat_rate).map_err(DatabaseError::serialization)?,
        vat_amount: money(row.vat_amount),
        total: money(row.total),
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{BookingId, Currency, CustomerId};
    use domain_billing::BookingCharge;
    use rust_decimal_macros::dec;

    fn draft() -> DraftInvoice {
        DraftInvoice::new(
            Holder::Customer(CustomerId::new()),
            YearMonth::new(2024, 3).unwrap(),
            Currency::EUR,
            Percentage::new(dec!(21)).unwrap(),
            30,
        )
    }

    #[test]
    fn test_empty_draft_row() {
        let invoice = draft();
        let row = invoice_to_row(&invoice).unwrap();
        assert_eq!(row.holder_type, "customer");
        assert_eq!((row.period_year, row.period_month), (2024, 3));
        assert_eq!(row.status, "draft");
        assert_eq!(row.lines, serde_json::json!([]));
        assert_eq!(invoice_from_row(row).unwrap(), invoice);
    }

    #[test]
    fn test_lines_survive_the_json_column() {
        let mut invoice = draft();
        let holder = invoice.holder;
        invoice
            .add_booking(&BookingCharge {
                booking_id: BookingId::new(),
                holder,
                date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
                time_range: "09:00-13:00".to_string(),
                rate_description: "Half-day rate".to_string(),
                amount: Money::new(dec!(80), Currency::EUR),
                discount_pct: Percentage::new(dec!(10)).unwrap(),
                discount_amount: Money::new(dec!(8), Currency::EUR),
            })
            .unwrap();

        let row = invoice_to_row(&invoice).unwrap();
        assert_eq!(row.lines.as_array().map(Vec::len), Some(2));
        assert_eq!(row.total, invoice.total.amount());

        let restored = invoice_from_row(row).unwrap();
        assert_eq!(restored.lines, invoice.lines);
        assert_eq!(restored.total, invoice.total);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut row = invoice_to_row(&draft()).unwrap();
        row.status = "void".to_string();
        assert!(matches!(invoice_from_row(row), Err(DatabaseError::SerializationError(_))));
    }
}
