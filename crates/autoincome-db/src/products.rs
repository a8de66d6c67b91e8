//! Database operations for `products`.

use autoincome_core::{NewProduct, Product};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{require_row, DbError};

/// A row from the `products` table.
///
/// `marketplace_url` stays `NULL` until the launch step publishes a listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub stream_id: i64,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub cost: Decimal,
    pub supplier: String,
    pub description: String,
    pub category: String,
    pub marketplace_url: Option<String>,
    pub sales_count: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ProductRow {
    /// # Errors
    ///
    /// Returns [`DbError::Label`] if `status` holds an unknown label.
    pub fn into_product(self) -> Result<Product, DbError> {
        Ok(Product {
            id: self.id,
            stream_id: self.stream_id,
            name: self.name,
            sku: self.sku,
            price: self.price,
            cost: self.cost,
            supplier: self.supplier,
            description: self.description,
            category: self.category,
            marketplace_url: self.marketplace_url,
            sales_count: self.sales_count,
            status: self.status.parse()?,
            created_at: self.created_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, stream_id, name, sku, price, cost, supplier, description, \
     category, marketplace_url, sales_count, status, created_at";

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Insert an `active` product and return its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure; a reused SKU surfaces as a
/// unique violation.
pub async fn insert_product(
    pool: &PgPool,
    product: &NewProduct,
    now: DateTime<Utc>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (stream_id, name, sku, price, cost, supplier, description, category, \
              status, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', $9) \
         RETURNING id",
    )
    .bind(product.stream_id)
    .bind(&product.name)
    .bind(&product.sku)
    .bind(product.price)
    .bind(product.cost)
    .bind(&product.supplier)
    .bind(&product.description)
    .bind(&product.category)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// # Errors
///
/// Returns [`DbError`] on database failure or an unreadable row.
pub async fn list_stream_products(pool: &PgPool, stream_id: i64) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE stream_id = $1 ORDER BY id"
    ))
    .bind(stream_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ProductRow::into_product).collect()
}

/// # Errors
///
/// Returns [`DbError`] on database failure or an unreadable row.
pub async fn list_active_products(pool: &PgPool) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE status = 'active' ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ProductRow::into_product).collect()
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`.
pub async fn update_product_price(pool: &PgPool, id: i64, price: Decimal) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE products SET price = $2 WHERE id = $1")
        .bind(id)
        .bind(price)
        .execute(pool)
        .await?;

    require_row(result.rows_affected(), "product", id)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`.
pub async fn set_product_listing(pool: &PgPool, id: i64, url: &str) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE products SET marketplace_url = $2 WHERE id = $1")
        .bind(id)
        .bind(url)
        .execute(pool)
        .await?;

    require_row(result.rows_affected(), "product", id)
}

/// Adds `quantity` to the product's `sales_count`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`.
pub async fn record_product_sale(pool: &PgPool, id: i64, quantity: i32) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE products SET sales_count = sales_count + $2 WHERE id = $1")
        .bind(id)
        .bind(quantity)
        .execute(pool)
        .await?;

    require_row(result.rows_affected(), "product", id)
}
