//! Database operations for `income_streams`.

use autoincome_core::{IncomeStream, NewStream, StreamMetrics, StreamStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{require_row, DbError};

/// A row from the `income_streams` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StreamRow {
    pub id: i64,
    pub opportunity_id: Option<i64>,
    pub name: String,
    pub platform: String,
    pub business_model: String,
    pub initial_investment: Decimal,
    pub marketing_budget: Decimal,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit_margin: Decimal,
    pub roi: Decimal,
    pub products_count: i32,
    pub customers_count: i32,
    pub conversion_rate: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StreamRow {
    /// # Errors
    ///
    /// Returns [`DbError::Label`] if a label column holds an unknown value.
    pub fn into_stream(self) -> Result<IncomeStream, DbError> {
        Ok(IncomeStream {
            id: self.id,
            opportunity_id: self.opportunity_id,
            name: self.name,
            platform: self.platform,
            business_model: self.business_model.parse()?,
            initial_investment: self.initial_investment,
            marketing_budget: self.marketing_budget,
            revenue: self.revenue,
            expenses: self.expenses,
            profit_margin: self.profit_margin,
            roi: self.roi,
            products_count: self.products_count,
            customers_count: self.customers_count,
            conversion_rate: self.conversion_rate,
            status: self.status.parse()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const STREAM_COLUMNS: &str = "id, opportunity_id, name, platform, business_model, \
     initial_investment, marketing_budget, revenue, expenses, profit_margin, roi, \
     products_count, customers_count, conversion_rate, status, created_at, updated_at";

/// Create an `active` stream with zeroed metrics and return its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn create_stream(
    pool: &PgPool,
    stream: &NewStream,
    now: DateTime<Utc>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO income_streams \
             (opportunity_id, name, platform, business_model, initial_investment, \
              status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, 'active', $6, $6) \
         RETURNING id",
    )
    .bind(stream.opportunity_id)
    .bind(&stream.name)
    .bind(&stream.platform)
    .bind(stream.business_model.as_str())
    .bind(stream.initial_investment)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no stream has `id`.
pub async fn get_stream(pool: &PgPool, id: i64) -> Result<IncomeStream, DbError> {
    sqlx::query_as::<_, StreamRow>(&format!(
        "SELECT {STREAM_COLUMNS} FROM income_streams WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound {
        entity: "stream",
        id,
    })?
    .into_stream()
}

/// All streams, optionally restricted to one status, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] on database failure or an unreadable row.
pub async fn list_streams(
    pool: &PgPool,
    status: Option<StreamStatus>,
) -> Result<Vec<IncomeStream>, DbError> {
    let rows = sqlx::query_as::<_, StreamRow>(&format!(
        "SELECT {STREAM_COLUMNS} FROM income_streams \
         WHERE ($1::TEXT IS NULL OR status = $1) \
         ORDER BY created_at, id"
    ))
    .bind(status.map(StreamStatus::as_str))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(StreamRow::into_stream).collect()
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no stream has `id`.
pub async fn update_stream_metrics(
    pool: &PgPool,
    id: i64,
    metrics: &StreamMetrics,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE income_streams SET \
             revenue = $2, expenses = $3, profit_margin = $4, roi = $5, \
             products_count = $6, customers_count = $7, conversion_rate = $8, \
             updated_at = $9 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(metrics.revenue)
    .bind(metrics.expenses)
    .bind(metrics.profit_margin)
    .bind(metrics.roi)
    .bind(metrics.products_count)
    .bind(metrics.customers_count)
    .bind(metrics.conversion_rate)
    .bind(now)
    .execute(pool)
    .await?;

    require_row(result.rows_affected(), "stream", id)
}

/// Adds `amount` to the stream's initial investment.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no stream has `id`.
pub async fn add_stream_investment(
    pool: &PgPool,
    id: i64,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE income_streams \
         SET initial_investment = initial_investment + $2, updated_at = $3 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(amount)
    .bind(now)
    .execute(pool)
    .await?;

    require_row(result.rows_affected(), "stream", id)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no stream has `id`.
pub async fn add_marketing_budget(
    pool: &PgPool,
    id: i64,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE income_streams \
         SET marketing_budget = marketing_budget + $2, updated_at = $3 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(amount)
    .bind(now)
    .execute(pool)
    .await?;

    require_row(result.rows_affected(), "stream", id)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no stream has `id`.
pub async fn set_stream_status(
    pool: &PgPool,
    id: i64,
    status: StreamStatus,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let result =
        sqlx::query("UPDATE income_streams SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(now)
            .execute(pool)
            .await?;

    require_row(result.rows_affected(), "stream", id)
}
