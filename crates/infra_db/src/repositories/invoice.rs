//! Invoice repository implementation
//!
//! Invoice lines are stored as a JSONB array next to the totals, so an
//! invoice is always read and written as a whole.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const INVOICE_COLUMNS: &str = "invoice_id, invoice_number, holder_type, holder_id, period_year, \
     period_month, invoice_date, due_date, currency, lines, subtotal, discount_total, vat_rate, \
     vat_amount, total, status, created_at, updated_at";

/// Repository for draft and issued invoices
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, invoice_id: Uuid) -> Result<InvoiceRow, DatabaseError> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1");
        sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Invoice", invoice_id))
    }

    /// The draft invoice of a holder for one month, if any
    pub async fn find_draft(
        &self,
        holder_type: &str,
        holder_id: Uuid,
        year: i32,
        month: i32,
    ) -> Result<Option<InvoiceRow>, DatabaseError> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE holder_type = $1 AND holder_id = $2 AND period_year = $3 AND period_month = $4 \
             AND status = 'draft'"
        );
        Ok(sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(holder_type)
            .bind(holder_id)
            .bind(year)
            .bind(month)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn insert(&self, row: &InvoiceRow) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO invoices ({INVOICE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)"
        );
        sqlx::query(&sql)
            .bind(row.invoice_id)
            .bind(&row.invoice_number)
            .bind(&row.holder_type)
            .bind(row.holder_id)
            .bind(row.period_year)
            .bind(row.period_month)
            .bind(row.invoice_date)
            .bind(row.due_date)
            .bind(&row.currency)
            .bind(&row.lines)
            .bind(row.subtotal)
            .bind(row.discount_total)
            .bind(row.vat_rate)
            .bind(row.vat_amount)
            .bind(row.total)
            .bind(&row.status)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Rewrites lines, totals and status
    pub async fn update(&self, row: &InvoiceRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                lines = $2,
                subtotal = $3,
                discount_total = $4,
                vat_rate = $5,
                vat_amount = $6,
                total = $7,
                status = $8,
                updated_at = $9
            WHERE invoice_id = $1
            "#,
        )
        .bind(row.invoice_id)
        .bind(&row.lines)
        .bind(row.subtotal)
        .bind(row.discount_total)
        .bind(row.vat_rate)
        .bind(row.vat_amount)
        .bind(row.total)
        .bind(&row.status)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", row.invoice_id));
        }
        Ok(())
    }

    pub async fn delete(&self, invoice_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM invoices WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", invoice_id));
        }
        Ok(())
    }
}

/// Database row for an invoice
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct InvoiceRow {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub holder_type: String,
    pub holder_id: Uuid,
    pub period_year: i32,
    pub period_month: i32,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    /// Structured invoice lines as a JSON array
    pub lines: JsonValue,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
