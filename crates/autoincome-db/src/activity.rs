//! Append-only logs (`reinvestments`, `activity_log`) and dashboard counts.

use autoincome_core::{ActivityLog, DashboardCounts, ReinvestmentLog};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn record_reinvestment(pool: &PgPool, entry: &ReinvestmentLog) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO reinvestments \
             (strategy, stream_id, opportunity_id, amount, expected_roi, description, executed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(entry.strategy.as_str())
    .bind(entry.stream_id)
    .bind(entry.opportunity_id)
    .bind(entry.amount)
    .bind(entry.expected_roi)
    .bind(&entry.description)
    .bind(entry.executed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn record_activity(pool: &PgPool, entry: &ActivityLog) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO activity_log (component, action, details, success, recorded_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&entry.component)
    .bind(&entry.action)
    .bind(&entry.details)
    .bind(entry.success)
    .bind(entry.recorded_at)
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(sqlx::FromRow)]
struct CountsRow {
    trends: i64,
    opportunities: i64,
    active_streams: i64,
    customers: i64,
    total_revenue: Decimal,
    total_expenses: Decimal,
}

/// Row counts plus revenue and expenses summed over active streams.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn dashboard_counts(pool: &PgPool) -> Result<DashboardCounts, DbError> {
    let row = sqlx::query_as::<_, CountsRow>(
        "SELECT \
             (SELECT COUNT(*) FROM trends) AS trends, \
             (SELECT COUNT(*) FROM opportunities) AS opportunities, \
             (SELECT COUNT(*) FROM income_streams WHERE status = 'active') AS active_streams, \
             (SELECT COUNT(*) FROM customers) AS customers, \
             (SELECT COALESCE(SUM(revenue), 0) FROM income_streams WHERE status = 'active') \
                 AS total_revenue, \
             (SELECT COALESCE(SUM(expenses), 0) FROM income_streams WHERE status = 'active') \
                 AS total_expenses",
    )
    .fetch_one(pool)
    .await?;

    Ok(DashboardCounts {
        trends: row.trends,
        opportunities: row.opportunities,
        active_streams: row.active_streams,
        customers: row.customers,
        total_revenue: row.total_revenue,
        total_expenses: row.total_expenses,
    })
}
