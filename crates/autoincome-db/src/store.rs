//! [`Store`] implementation over a Postgres pool.

use async_trait::async_trait;
use autoincome_core::{
    ActivityLog, Customer, CustomerMetrics, DashboardCounts, IncomeStream, NewCustomer,
    NewOrder, NewProduct, NewStream, NewTrend, Opportunity, OpportunityCandidate,
    OpportunityCriteria, OpportunityStatus, Order, Product, ReinvestmentLog, Segment,
    SegmentChange, Store, StoreError, StreamMetrics, StreamStatus, Trend,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::opportunities::TransitionResult;
use crate::{activity, customers, opportunities, orders, products, streams, trends, DbError};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Classifies a failed INSERT. Unique violations become
/// [`StoreError::Duplicate`] keyed on `key`; foreign-key violations become
/// [`StoreError::NotFound`] for whichever parent's constraint fired.
fn insert_error(
    err: DbError,
    entity: &'static str,
    key: &str,
    parents: &[(&str, &'static str, i64)],
) -> StoreError {
    if let DbError::Sqlx(sqlx::Error::Database(db)) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate {
                entity,
                key: key.to_string(),
            };
        }
        if db.is_foreign_key_violation() {
            let constraint = db.constraint().unwrap_or_default();
            if let Some((_, parent, id)) = parents
                .iter()
                .find(|(column, _, _)| constraint.contains(column))
                .or_else(|| parents.first())
            {
                return StoreError::not_found(*parent, id);
            }
        }
    }
    err.into()
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_trend(&self, trend: &NewTrend, now: DateTime<Utc>) -> Result<i64, StoreError> {
        Ok(trends::upsert_trend(&self.pool, trend, now).await?)
    }

    async fn list_unanalyzed_trends(&self, limit: i64) -> Result<Vec<Trend>, StoreError> {
        Ok(trends::list_unanalyzed_trends(&self.pool, limit).await?)
    }

    async fn mark_trend_analyzed(&self, trend_id: i64) -> Result<(), StoreError> {
        Ok(trends::mark_trend_analyzed(&self.pool, trend_id).await?)
    }

    async fn insert_opportunity(
        &self,
        trend_id: i64,
        candidate: &OpportunityCandidate,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        opportunities::insert_opportunity(&self.pool, trend_id, candidate, now)
            .await
            .map_err(|e| insert_error(e, "opportunity", "", &[("trend", "trend", trend_id)]))
    }

    async fn get_opportunity(&self, id: i64) -> Result<Opportunity, StoreError> {
        Ok(opportunities::get_opportunity(&self.pool, id).await?)
    }

    async fn list_pending_opportunities(
        &self,
        criteria: &OpportunityCriteria,
    ) -> Result<Vec<Opportunity>, StoreError> {
        Ok(opportunities::list_pending_opportunities(&self.pool, criteria).await?)
    }

    async fn set_opportunity_status(
        &self,
        id: i64,
        status: OpportunityStatus,
    ) -> Result<(), StoreError> {
        match opportunities::set_opportunity_status(&self.pool, id, status).await? {
            TransitionResult::Applied => Ok(()),
            TransitionResult::Rejected(from) => {
                Err(StoreError::InvalidTransition { from, to: status })
            }
        }
    }

    async fn create_stream(
        &self,
        stream: &NewStream,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let opportunity = stream.opportunity_id.unwrap_or_default();
        streams::create_stream(&self.pool, stream, now)
            .await
            .map_err(|e| {
                insert_error(
                    e,
                    "stream",
                    &stream.name,
                    &[("opportunity", "opportunity", opportunity)],
                )
            })
    }

    async fn get_stream(&self, id: i64) -> Result<IncomeStream, StoreError> {
        Ok(streams::get_stream(&self.pool, id).await?)
    }

    async fn list_streams(
        &self,
        status: Option<StreamStatus>,
    ) -> Result<Vec<IncomeStream>, StoreError> {
        Ok(streams::list_streams(&self.pool, status).await?)
    }

    async fn update_stream_metrics(
        &self,
        id: i64,
        metrics: &StreamMetrics,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(streams::update_stream_metrics(&self.pool, id, metrics, now).await?)
    }

    async fn add_stream_investment(
        &self,
        id: i64,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(streams::add_stream_investment(&self.pool, id, amount, now).await?)
    }

    async fn add_marketing_budget(
        &self,
        id: i64,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(streams::add_marketing_budget(&self.pool, id, amount, now).await?)
    }

    async fn set_stream_status(
        &self,
        id: i64,
        status: StreamStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(streams::set_stream_status(&self.pool, id, status, now).await?)
    }

    async fn insert_product(
        &self,
        product: &NewProduct,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        products::insert_product(&self.pool, product, now)
            .await
            .map_err(|e| {
                insert_error(
                    e,
                    "product",
                    &product.sku,
                    &[("stream", "stream", product.stream_id)],
                )
            })
    }

    async fn list_stream_products(&self, stream_id: i64) -> Result<Vec<Product>, StoreError> {
        Ok(products::list_stream_products(&self.pool, stream_id).await?)
    }

    async fn list_active_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(products::list_active_products(&self.pool).await?)
    }

    async fn update_product_price(&self, id: i64, price: Decimal) -> Result<(), StoreError> {
        Ok(products::update_product_price(&self.pool, id, price).await?)
    }

    async fn set_product_listing(&self, id: i64, url: &str) -> Result<(), StoreError> {
        Ok(products::set_product_listing(&self.pool, id, url).await?)
    }

    async fn record_product_sale(&self, id: i64, quantity: i32) -> Result<(), StoreError> {
        Ok(products::record_product_sale(&self.pool, id, quantity).await?)
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        Ok(customers::find_customer_by_email(&self.pool, email).await?)
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<i64, StoreError> {
        customers::create_customer(&self.pool, customer)
            .await
            .map_err(|e| insert_error(e, "customer", &customer.email, &[]))
    }

    async fn get_customer(&self, id: i64) -> Result<Customer, StoreError> {
        Ok(customers::get_customer(&self.pool, id).await?)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        Ok(customers::list_customers(&self.pool).await?)
    }

    async fn update_customer_metrics(
        &self,
        id: i64,
        metrics: &CustomerMetrics,
    ) -> Result<(), StoreError> {
        Ok(customers::update_customer_metrics(&self.pool, id, metrics).await?)
    }

    async fn update_customer_segment(&self, id: i64, segment: Segment) -> Result<(), StoreError> {
        Ok(customers::update_customer_segment(&self.pool, id, segment).await?)
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<i64, StoreError> {
        orders::insert_order(&self.pool, order).await.map_err(|e| {
            insert_error(
                e,
                "order",
                &order.order_number,
                &[
                    ("customer", "customer", order.customer_id),
                    ("stream", "stream", order.stream_id),
                    ("product", "product", order.product_id.unwrap_or_default()),
                ],
            )
        })
    }

    async fn list_customer_orders(&self, customer_id: i64) -> Result<Vec<Order>, StoreError> {
        Ok(orders::list_customer_orders(&self.pool, customer_id).await?)
    }

    async fn list_completed_orders(&self, stream_id: i64) -> Result<Vec<Order>, StoreError> {
        Ok(orders::list_completed_orders(&self.pool, stream_id).await?)
    }

    async fn record_segment_change(&self, change: &SegmentChange) -> Result<(), StoreError> {
        Ok(customers::record_segment_change(&self.pool, change).await?)
    }

    async fn record_reinvestment(&self, entry: &ReinvestmentLog) -> Result<(), StoreError> {
        Ok(activity::record_reinvestment(&self.pool, entry).await?)
    }

    async fn record_activity(&self, entry: &ActivityLog) -> Result<(), StoreError> {
        Ok(activity::record_activity(&self.pool, entry).await?)
    }

    async fn dashboard_counts(&self) -> Result<DashboardCounts, StoreError> {
        Ok(activity::dashboard_counts(&self.pool).await?)
    }
}
