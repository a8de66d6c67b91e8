use autoincome_core::{AppConfig, StoreError, UnknownLabel};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/autoincome-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("stored value is not a valid label: {0}")]
    Label(#[from] UnknownLabel),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::not_found(entity, id),
            DbError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                StoreError::Duplicate {
                    entity: unique_entity(db.table()),
                    key: db.constraint().unwrap_or_default().to_string(),
                }
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Turns an UPDATE that touched no rows into [`DbError::NotFound`].
pub(crate) fn require_row(rows_affected: u64, entity: &'static str, id: i64) -> Result<(), DbError> {
    if rows_affected == 0 {
        return Err(DbError::NotFound { entity, id });
    }
    Ok(())
}

fn unique_entity(table: Option<&str>) -> &'static str {
    match table {
        Some("trends") => "trend",
        Some("products") => "product",
        Some("customers") => "customer",
        Some("orders") => "order",
        _ => "record",
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect using the database URL and pool sizing from the loaded config.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_config(config: &AppConfig) -> Result<PgPool, DbError> {
    connect_pool(&config.database_url, PoolConfig::from_app_config(config))
        .await
        .map_err(DbError::from)
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table does not exist on a fresh database; treat
    // that as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}


pub mod activity;
pub mod customers;
pub mod opportunities;
pub mod orders;
pub mod products;
pub mod store;
pub mod streams;
pub mod trends;

pub use activity::{dashboard_counts, record_activity, record_reinvestment};
pub use customers::{
    create_customer, find_customer_by_email, get_customer, list_customers,
    record_segment_change, update_customer_metrics, update_customer_segment, CustomerRow,
};
pub use opportunities::{
    get_opportunity, insert_opportunity, list_pending_opportunities, set_opportunity_status,
    OpportunityRow,
};
pub use orders::{insert_order, list_completed_orders, list_customer_orders, OrderRow};
pub use products::{
    insert_product, list_active_products, list_stream_products, record_product_sale,
    set_product_listing, update_product_price, ProductRow,
};
pub use store::PgStore;
pub use streams::{
    add_marketing_budget, add_stream_investment, create_stream, get_stream, list_streams,
    set_stream_status, update_stream_metrics, StreamRow,
};
pub use trends::{list_unanalyzed_trends, mark_trend_analyzed, upsert_trend, TrendRow};
