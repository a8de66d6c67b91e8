//! Database operations for `customers` and `segment_changes`.

use autoincome_core::{Customer, CustomerMetrics, NewCustomer, Segment, SegmentChange};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{require_row, DbError};

/// A row from the `customers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub source: String,
    pub order_count: i32,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
    pub segment: String,
    pub created_at: DateTime<Utc>,
}

impl CustomerRow {
    /// # Errors
    ///
    /// Returns [`DbError::Label`] if `segment` holds an unknown label.
    pub fn into_customer(self) -> Result<Customer, DbError> {
        Ok(Customer {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            source: self.source,
            order_count: self.order_count,
            total_spent: self.total_spent,
            average_order_value: self.average_order_value,
            last_order_date: self.last_order_date,
            segment: self.segment.parse()?,
            created_at: self.created_at,
        })
    }
}

const CUSTOMER_COLUMNS: &str = "id, email, first_name, last_name, source, order_count, \
     total_spent, average_order_value, last_order_date, segment, created_at";

/// Exact match on the stored (already normalised) email.
///
/// # Errors
///
/// Returns [`DbError`] on database failure or an unreadable row.
pub async fn find_customer_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Customer>, DbError> {
    sqlx::query_as::<_, CustomerRow>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?
    .map(CustomerRow::into_customer)
    .transpose()
}

/// Insert a customer in the `new` segment with zeroed metrics.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure; a reused email surfaces as
/// a unique violation.
pub async fn create_customer(pool: &PgPool, customer: &NewCustomer) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO customers (email, first_name, last_name, source, segment, created_at) \
         VALUES ($1, $2, $3, $4, 'new', $5) \
         RETURNING id",
    )
    .bind(&customer.email)
    .bind(customer.first_name.as_deref())
    .bind(customer.last_name.as_deref())
    .bind(&customer.source)
    .bind(customer.created_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no customer has `id`.
pub async fn get_customer(pool: &PgPool, id: i64) -> Result<Customer, DbError> {
    sqlx::query_as::<_, CustomerRow>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound {
        entity: "customer",
        id,
    })?
    .into_customer()
}

/// # Errors
///
/// Returns [`DbError`] on database failure or an unreadable row.
pub async fn list_customers(pool: &PgPool) -> Result<Vec<Customer>, DbError> {
    let rows = sqlx::query_as::<_, CustomerRow>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CustomerRow::into_customer).collect()
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no customer has `id`.
pub async fn update_customer_metrics(
    pool: &PgPool,
    id: i64,
    metrics: &CustomerMetrics,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE customers SET \
             order_count = $2, total_spent = $3, average_order_value = $4, \
             last_order_date = $5 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(metrics.order_count)
    .bind(metrics.total_spent)
    .bind(metrics.average_order_value)
    .bind(metrics.last_order_date)
    .execute(pool)
    .await?;

    require_row(result.rows_affected(), "customer", id)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no customer has `id`.
pub async fn update_customer_segment(
    pool: &PgPool,
    id: i64,
    segment: Segment,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE customers SET segment = $2 WHERE id = $1")
        .bind(id)
        .bind(segment.as_str())
        .execute(pool)
        .await?;

    require_row(result.rows_affected(), "customer", id)
}

/// Append one entry to the segment change log.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn record_segment_change(pool: &PgPool, change: &SegmentChange) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO segment_changes (customer_id, email, from_segment, to_segment, changed_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(change.customer_id)
    .bind(&change.email)
    .bind(change.from.as_str())
    .bind(change.to.as_str())
    .bind(change.changed_at)
    .execute(pool)
    .await?;

    Ok(())
}
