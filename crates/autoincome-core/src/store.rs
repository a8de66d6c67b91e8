//! Persistence contract consumed by the pipeline.
//!
//! Implementations must enforce the forward-only opportunity lifecycle and
//! keep trend identity unique on `(keyword, platform)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::customers::{Customer, CustomerMetrics, NewCustomer, Segment, SegmentChange};
use crate::opportunities::{Opportunity, OpportunityCandidate, OpportunityCriteria, OpportunityStatus};
use crate::orders::{NewOrder, Order};
use crate::products::{NewProduct, Product};
use crate::reinvestment::ReinvestmentLog;
use crate::streams::{IncomeStream, NewStream, StreamMetrics, StreamStatus};
use crate::trends::{NewTrend, Trend};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid opportunity transition from {from} to {to}")]
    InvalidTransition {
        from: OpportunityStatus,
        to: OpportunityStatus,
    },

    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Append-only activity entry written after each pipeline operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub component: String,
    pub action: String,
    pub details: String,
    pub success: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Row counts and money totals for the dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub trends: i64,
    pub opportunities: i64,
    pub active_streams: i64,
    pub customers: i64,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
}

#[async_trait]
pub trait Store: Send + Sync {
    // ------------------------------------------------------------------
    // Trends
    // ------------------------------------------------------------------

    /// Inserts or refreshes a trend keyed on `(keyword, platform)`.
    /// A refresh overwrites the signals and clears `analyzed`.
    async fn upsert_trend(&self, trend: &NewTrend, now: DateTime<Utc>)
        -> Result<i64, StoreError>;

    /// Oldest unanalyzed trends first.
    async fn list_unanalyzed_trends(&self, limit: i64) -> Result<Vec<Trend>, StoreError>;

    async fn mark_trend_analyzed(&self, trend_id: i64) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Opportunities
    // ------------------------------------------------------------------

    /// Persists a candidate as a `pending` opportunity.
    async fn insert_opportunity(
        &self,
        trend_id: i64,
        candidate: &OpportunityCandidate,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    async fn get_opportunity(&self, id: i64) -> Result<Opportunity, StoreError>;

    async fn list_pending_opportunities(
        &self,
        criteria: &OpportunityCriteria,
    ) -> Result<Vec<Opportunity>, StoreError>;

    /// Rejects backward or self transitions with [`StoreError::InvalidTransition`].
    async fn set_opportunity_status(
        &self,
        id: i64,
        status: OpportunityStatus,
    ) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Streams
    // ------------------------------------------------------------------

    async fn create_stream(&self, stream: &NewStream, now: DateTime<Utc>)
        -> Result<i64, StoreError>;

    async fn get_stream(&self, id: i64) -> Result<IncomeStream, StoreError>;

    /// All streams, optionally restricted to one status, oldest first.
    async fn list_streams(
        &self,
        status: Option<StreamStatus>,
    ) -> Result<Vec<IncomeStream>, StoreError>;

    async fn update_stream_metrics(
        &self,
        id: i64,
        metrics: &StreamMetrics,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn add_stream_investment(
        &self,
        id: i64,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn add_marketing_budget(
        &self,
        id: i64,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn set_stream_status(
        &self,
        id: i64,
        status: StreamStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    async fn insert_product(&self, product: &NewProduct, now: DateTime<Utc>)
        -> Result<i64, StoreError>;

    async fn list_stream_products(&self, stream_id: i64) -> Result<Vec<Product>, StoreError>;

    async fn list_active_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn update_product_price(&self, id: i64, price: Decimal) -> Result<(), StoreError>;

    async fn set_product_listing(&self, id: i64, url: &str) -> Result<(), StoreError>;

    /// Adds `quantity` to the product's `sales_count`.
    async fn record_product_sale(&self, id: i64, quantity: i32) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Customers and orders
    // ------------------------------------------------------------------

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError>;

    async fn create_customer(&self, customer: &NewCustomer) -> Result<i64, StoreError>;

    async fn get_customer(&self, id: i64) -> Result<Customer, StoreError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError>;

    async fn update_customer_metrics(
        &self,
        id: i64,
        metrics: &CustomerMetrics,
    ) -> Result<(), StoreError>;

    async fn update_customer_segment(&self, id: i64, segment: Segment) -> Result<(), StoreError>;

    async fn insert_order(&self, order: &NewOrder) -> Result<i64, StoreError>;

    async fn list_customer_orders(&self, customer_id: i64) -> Result<Vec<Order>, StoreError>;

    /// Completed orders of one stream, oldest first.
    async fn list_completed_orders(&self, stream_id: i64) -> Result<Vec<Order>, StoreError>;

    // ------------------------------------------------------------------
    // Logs and counts
    // ------------------------------------------------------------------

    async fn record_segment_change(&self, change: &SegmentChange) -> Result<(), StoreError>;

    async fn record_reinvestment(&self, entry: &ReinvestmentLog) -> Result<(), StoreError>;

    async fn record_activity(&self, entry: &ActivityLog) -> Result<(), StoreError>;

    async fn dashboard_counts(&self) -> Result<DashboardCounts, StoreError>;
}
