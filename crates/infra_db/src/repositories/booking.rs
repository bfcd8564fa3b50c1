//! Booking repository implementation
//!
//! Bookings, recurrence patterns and the read-only reference tables the
//! engine prices and gates bookings with (tariff cards, holder discounts,
//! leases).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::DatabaseError;

const BOOKING_COLUMNS: &str = "booking_id, resource_id, holder_type, holder_id, booking_date, \
     slot_kind, day_type, start_minute, end_minute, status, pricing, pattern_id, invoice_id, \
     is_exception, created_at, updated_at";

const PATTERN_COLUMNS: &str = "pattern_id, resource_id, holder_type, holder_id, template, rule, \
     start_date, end_date, active, created_at";

/// Repository for bookings and their reference data
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    pub async fn get(&self, booking_id: Uuid) -> Result<BookingRow, DatabaseError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1");
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Booking", booking_id))
    }

    /// Bookings matching every set filter, by date then start minute
    pub async fn find(&self, filter: &BookingFilter) -> Result<Vec<BookingRow>, DatabaseError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE TRUE"));

        if let Some(resource_id) = filter.resource_id {
            builder.push(" AND resource_id = ").push_bind(resource_id);
        }
        if let Some((holder_type, holder_id)) = &filter.holder {
            builder
                .push(" AND holder_type = ")
                .push_bind(*holder_type)
                .push(" AND holder_id = ")
                .push_bind(*holder_id);
        }
        if let Some(pattern_id) = filter.pattern_id {
            builder.push(" AND pattern_id = ").push_bind(pattern_id);
        }
        if let Some(from) = filter.date_from {
            builder.push(" AND booking_date >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            builder.push(" AND booking_date <= ").push_bind(to);
        }
        if filter.active_only {
            builder.push(" AND status <> 'cancelled'");
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        builder.push(" ORDER BY booking_date, start_minute");

        Ok(builder.build_query_as::<BookingRow>().fetch_all(&self.pool).await?)
    }

    pub async fn insert(&self, row: &BookingRow) -> Result<(), DatabaseError> {
        self.insert_many(std::slice::from_ref(row)).await.map(|_| ())
    }

    /// Inserts all rows in one statement; either all are written or none
    pub async fn insert_many(&self, rows: &[BookingRow]) -> Result<u64, DatabaseError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Postgres>::new(format!("INSERT INTO bookings ({BOOKING_COLUMNS}) "));
        builder.push_values(rows, |mut b, row| {
            b.push_bind(row.booking_id)
                .push_bind(row.resource_id)
                .push_bind(&row.holder_type)
                .push_bind(row.holder_id)
                .push_bind(row.booking_date)
                .push_bind(&row.slot_kind)
                .push_bind(&row.day_type)
                .push_bind(row.start_minute)
                .push_bind(row.end_minute)
                .push_bind(&row.status)
                .push_bind(&row.pricing)
                .push_bind(row.pattern_id)
                .push_bind(row.invoice_id)
                .push_bind(row.is_exception)
                .push_bind(row.created_at)
                .push_bind(row.updated_at);
        });
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Overwrites the mutable columns of a booking
    pub async fn update(&self, row: &BookingRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                booking_date = $2,
                slot_kind = $3,
                day_type = $4,
                start_minute = $5,
                end_minute = $6,
                status = $7,
                pricing = $8,
                invoice_id = $9,
                is_exception = $10,
                updated_at = $11
            WHERE booking_id = $1
            "#,
        )
        .bind(row.booking_id)
        .bind(row.booking_date)
        .bind(&row.slot_kind)
        .bind(&row.day_type)
        .bind(row.start_minute)
        .bind(row.end_minute)
        .bind(&row.status)
        .bind(&row.pricing)
        .bind(row.invoice_id)
        .bind(row.is_exception)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Booking", row.booking_id));
        }
        Ok(())
    }

    pub async fn delete(&self, booking_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM bookings WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Booking", booking_id));
        }
        Ok(())
    }

    // ========================================================================
    // Recurrence patterns
    // ========================================================================

    pub async fn get_pattern(&self, pattern_id: Uuid) -> Result<PatternRow, DatabaseError> {
        let sql = format!("SELECT {PATTERN_COLUMNS} FROM recurrence_patterns WHERE pattern_id = $1");
        sqlx::query_as::<_, PatternRow>(&sql)
            .bind(pattern_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("RecurrencePattern", pattern_id))
    }

    pub async fn insert_pattern(&self, row: &PatternRow) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO recurrence_patterns ({PATTERN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        sqlx::query(&sql)
            .bind(row.pattern_id)
            .bind(row.resource_id)
            .bind(&row.holder_type)
            .bind(row.holder_id)
            .bind(&row.template)
            .bind(&row.rule)
            .bind(row.start_date)
            .bind(row.end_date)
            .bind(row.active)
            .bind(row.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Updates the end date and active flag; the rest of a pattern is fixed
    pub async fn update_pattern(&self, row: &PatternRow) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE recurrence_patterns SET end_date = $2, active = $3 WHERE pattern_id = $1")
            .bind(row.pattern_id)
            .bind(row.end_date)
            .bind(row.active)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("RecurrencePattern", row.pattern_id));
        }
        Ok(())
    }

    // ========================================================================
    // Reference data
    // ========================================================================

    pub async fn get_tariff(&self, resource_id: Uuid) -> Result<TariffRow, DatabaseError> {
        sqlx::query_as::<_, TariffRow>(
            r#"
            SELECT resource_id, currency, hourly_rate, half_day_rate, full_day_rate, vat_inclusive
            FROM tariff_cards
            WHERE resource_id = $1
            "#,
        )
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("TariffCard", resource_id))
    }

    /// Discount percentage of a holder, if one is configured
    pub async fn get_discount(&self, holder_type: &str, holder_id: Uuid) -> Result<Option<Decimal>, DatabaseError> {
        Ok(sqlx::query_scalar::<_, Decimal>(
            "SELECT discount_pct FROM holder_discounts WHERE holder_type = $1 AND holder_id = $2",
        )
        .bind(holder_type)
        .bind(holder_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn get_lease(&self, lease_id: Uuid) -> Result<LeaseRow, DatabaseError> {
        sqlx::query_as::<_, LeaseRow>(
            "SELECT lease_id, monthly_quota, start_date, end_date FROM leases WHERE lease_id = $1",
        )
        .bind(lease_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Lease", lease_id))
    }
}

/// Row-level filter for [`BookingRepository::find`]
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub resource_id: Option<Uuid>,
    pub holder: Option<(&'static str, Uuid)>,
    pub pattern_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub active_only: bool,
    pub status: Option<&'static str>,
}

/// Database row for a booking
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BookingRow {
    pub booking_id: Uuid,
    pub resource_id: Uuid,
    pub holder_type: String,
    pub holder_id: Uuid,
    pub booking_date: NaiveDate,
    /// `timed` or `flex_day`
    pub slot_kind: String,
    /// `full`, `morning` or `afternoon` for flex days
    pub day_type: Option<String>,
    pub start_minute: i32,
    pub end_minute: i32,
    pub status: String,
    pub pricing: Option<JsonValue>,
    pub pattern_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub is_exception: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a recurrence pattern
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PatternRow {
    pub pattern_id: Uuid,
    pub resource_id: Uuid,
    pub holder_type: String,
    pub holder_id: Uuid,
    pub template: JsonValue,
    pub rule: JsonValue,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TariffRow {
    pub resource_id: Uuid,
    pub currency: String,
    pub hourly_rate: Decimal,
    pub half_day_rate: Option<Decimal>,
    pub full_day_rate: Option<Decimal>,
    pub vat_inclusive: bool,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LeaseRow {
    pub lease_id: Uuid,
    pub monthly_quota: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}
