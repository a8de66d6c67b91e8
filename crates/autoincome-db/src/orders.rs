//! Database operations for `orders`.

use autoincome_core::{NewOrder, Order};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    /// `NULL` for orders not tied to a catalogue product.
    pub product_id: Option<i64>,
    pub stream_id: i64,
    pub amount: Decimal,
    pub quantity: i32,
    pub status: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

impl OrderRow {
    /// # Errors
    ///
    /// Returns [`DbError::Label`] if `status` holds an unknown label.
    pub fn into_order(self) -> Result<Order, DbError> {
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            product_id: self.product_id,
            stream_id: self.stream_id,
            amount: self.amount,
            quantity: self.quantity,
            status: self.status.parse()?,
            platform: self.platform,
            created_at: self.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_id, product_id, stream_id, amount, \
     quantity, status, platform, created_at";

/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure, including a missing
/// customer, stream or product.
pub async fn insert_order(pool: &PgPool, order: &NewOrder) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders \
             (order_number, customer_id, product_id, stream_id, amount, quantity, \
              status, platform, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(&order.order_number)
    .bind(order.customer_id)
    .bind(order.product_id)
    .bind(order.stream_id)
    .bind(order.amount)
    .bind(order.quantity)
    .bind(order.status.as_str())
    .bind(&order.platform)
    .bind(order.created_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Every order of one customer, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] on database failure or an unreadable row.
pub async fn list_customer_orders(pool: &PgPool, customer_id: i64) -> Result<Vec<Order>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at, id"
    ))
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(OrderRow::into_order).collect()
}

/// Completed orders of one stream, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] on database failure or an unreadable row.
pub async fn list_completed_orders(pool: &PgPool, stream_id: i64) -> Result<Vec<Order>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE stream_id = $1 AND status = 'completed' \
         ORDER BY created_at, id"
    ))
    .bind(stream_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(OrderRow::into_order).collect()
}
