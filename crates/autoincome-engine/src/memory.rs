//! In-process [`Store`] used by tests and dry runs.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use autoincome_core::{
    ActivityLog, Customer, CustomerMetrics, DashboardCounts, IncomeStream, NewCustomer, NewOrder,
    NewProduct, NewStream, NewTrend, Opportunity, OpportunityCandidate, OpportunityCriteria,
    OpportunityStatus, Order, OrderStatus, Product, ProductStatus, ReinvestmentLog, Segment,
    SegmentChange, Store, StoreError, StreamMetrics, StreamStatus, Trend,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Default)]
struct State {
    next_id: i64,
    trends: BTreeMap<i64, Trend>,
    opportunities: BTreeMap<i64, Opportunity>,
    streams: BTreeMap<i64, IncomeStream>,
    products: BTreeMap<i64, Product>,
    customers: BTreeMap<i64, Customer>,
    orders: BTreeMap<i64, Order>,
    segment_changes: Vec<SegmentChange>,
    reinvestments: Vec<ReinvestmentLog>,
    activity: Vec<ActivityLog>,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    /// Executed reinvestments, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the state lock is poisoned.
    pub fn reinvestments(&self) -> Result<Vec<ReinvestmentLog>, StoreError> {
        Ok(self.lock()?.reinvestments.clone())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the state lock is poisoned.
    pub fn segment_changes(&self) -> Result<Vec<SegmentChange>, StoreError> {
        Ok(self.lock()?.segment_changes.clone())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the state lock is poisoned.
    pub fn activity(&self) -> Result<Vec<ActivityLog>, StoreError> {
        Ok(self.lock()?.activity.clone())
    }

    /// Every opportunity regardless of status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the state lock is poisoned.
    pub fn opportunities(&self) -> Result<Vec<Opportunity>, StoreError> {
        Ok(self.lock()?.opportunities.values().cloned().collect())
    }
}

fn find_mut<'a, T>(
    map: &'a mut BTreeMap<i64, T>,
    entity: &'static str,
    id: i64,
) -> Result<&'a mut T, StoreError> {
    map.get_mut(&id).ok_or_else(|| StoreError::not_found(entity, id))
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_trend(&self, trend: &NewTrend, now: DateTime<Utc>) -> Result<i64, StoreError> {
        let mut state = self.lock()?;
        if let Some(existing) = state
            .trends
            .values_mut()
            .find(|t| t.keyword == trend.keyword && t.platform == trend.platform)
        {
            existing.search_volume = trend.search_volume;
            existing.growth_rate = trend.growth_rate;
            existing.competition_level = trend.competition_level;
            existing.sentiment_score = trend.sentiment_score;
            existing.analyzed = false;
            existing.scraped_at = now;
            return Ok(existing.id);
        }
        let id = state.allocate_id();
        state.trends.insert(
            id,
            Trend {
                id,
                keyword: trend.keyword.clone(),
                platform: trend.platform.clone(),
                search_volume: trend.search_volume,
                growth_rate: trend.growth_rate,
                competition_level: trend.competition_level,
                sentiment_score: trend.sentiment_score,
                analyzed: false,
                scraped_at: now,
            },
        );
        Ok(id)
    }

    async fn list_unanalyzed_trends(&self, limit: i64) -> Result<Vec<Trend>, StoreError> {
        let state = self.lock()?;
        let mut trends: Vec<Trend> = state.trends.values().filter(|t| !t.analyzed).cloned().collect();
        trends.sort_by_key(|t| (t.scraped_at, t.id));
        trends.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(trends)
    }

    async fn mark_trend_analyzed(&self, trend_id: i64) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        find_mut(&mut state.trends, "trend", trend_id)?.analyzed = true;
        Ok(())
    }

    async fn insert_opportunity(
        &self,
        trend_id: i64,
        candidate: &OpportunityCandidate,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let mut state = self.lock()?;
        let keyword = state
            .trends
            .get(&trend_id)
            .map(|t| t.keyword.clone())
            .ok_or_else(|| StoreError::not_found("trend", trend_id))?;
        let id = state.allocate_id();
        state.opportunities.insert(
            id,
            Opportunity {
                id,
                trend_id,
                keyword,
                business_model: candidate.business_model,
                profit_potential: candidate.profit_potential(),
                difficulty_score: candidate.difficulty_score(),
                investment_required: candidate.investment_required(),
                roi_estimate: candidate.roi_estimate,
                market_size: candidate.market_size,
                competition_analysis: candidate.competition_analysis.clone(),
                recommendation: candidate.recommendation.clone(),
                status: OpportunityStatus::Pending,
                created_at: now,
            },
        );
        Ok(id)
    }

    async fn get_opportunity(&self, id: i64) -> Result<Opportunity, StoreError> {
        let state = self.lock()?;
        state
            .opportunities
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("opportunity", id))
    }

    async fn list_pending_opportunities(
        &self,
        criteria: &OpportunityCriteria,
    ) -> Result<Vec<Opportunity>, StoreError> {
        let state = self.lock()?;
        let mut matches: Vec<Opportunity> = state
            .opportunities
            .values()
            .filter(|o| criteria.matches(o))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.profit_potential
                .cmp(&a.profit_potential)
                .then(b.roi_estimate.cmp(&a.roi_estimate))
                .then(a.id.cmp(&b.id))
        });
        matches.truncate(usize::try_from(criteria.limit.max(0)).unwrap_or(usize::MAX));
        Ok(matches)
    }

    async fn set_opportunity_status(
        &self,
        id: i64,
        status: OpportunityStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let opp = find_mut(&mut state.opportunities, "opportunity", id)?;
        if !opp.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: opp.status,
                to: status,
            });
        }
        opp.status = status;
        Ok(())
    }

    async fn create_stream(&self, stream: &NewStream, now: DateTime<Utc>) -> Result<i64, StoreError> {
        let mut state = self.lock()?;
        let id = state.allocate_id();
        state.streams.insert(
            id,
            IncomeStream {
                id,
                opportunity_id: stream.opportunity_id,
                name: stream.name.clone(),
                platform: stream.platform.clone(),
                business_model: stream.business_model,
                initial_investment: stream.initial_investment,
                marketing_budget: Decimal::ZERO,
                revenue: Decimal::ZERO,
                expenses: Decimal::ZERO,
                profit_margin: Decimal::ZERO,
                roi: Decimal::ZERO,
                products_count: 0,
                customers_count: 0,
                conversion_rate: Decimal::ZERO,
                status: StreamStatus::Active,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn get_stream(&self, id: i64) -> Result<IncomeStream, StoreError> {
        let state = self.lock()?;
        state
            .streams
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("stream", id))
    }

    async fn list_streams(
        &self,
        status: Option<StreamStatus>,
    ) -> Result<Vec<IncomeStream>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .streams
            .values()
            .filter(|s| status.is_none_or(|wanted| s.status == wanted))
            .cloned()
            .collect())
    }

    async fn update_stream_metrics(
        &self,
        id: i64,
        metrics: &StreamMetrics,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let s = find_mut(&mut state.streams, "stream", id)?;
        s.revenue = metrics.revenue;
        s.expenses = metrics.expenses;
        s.profit_margin = metrics.profit_margin;
        s.roi = metrics.roi;
        s.products_count = metrics.products_count;
        s.customers_count = metrics.customers_count;
        s.conversion_rate = metrics.conversion_rate;
        s.updated_at = now;
        Ok(())
    }

    async fn add_stream_investment(
        &self,
        id: i64,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let s = find_mut(&mut state.streams, "stream", id)?;
        s.initial_investment += amount;
        s.updated_at = now;
        Ok(())
    }

    async fn add_marketing_budget(
        &self,
        id: i64,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let s = find_mut(&mut state.streams, "stream", id)?;
        s.marketing_budget += amount;
        s.updated_at = now;
        Ok(())
    }

    async fn set_stream_status(
        &self,
        id: i64,
        status: StreamStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let s = find_mut(&mut state.streams, "stream", id)?;
        s.status = status;
        s.updated_at = now;
        Ok(())
    }

    async fn insert_product(&self, product: &NewProduct, now: DateTime<Utc>) -> Result<i64, StoreError> {
        let mut state = self.lock()?;
        if !state.streams.contains_key(&product.stream_id) {
            return Err(StoreError::not_found("stream", product.stream_id));
        }
        if state.products.values().any(|p| p.sku == product.sku) {
            return Err(StoreError::Duplicate {
                entity: "product",
                key: product.sku.clone(),
            });
        }
        let id = state.allocate_id();
        state.products.insert(
            id,
            Product {
                id,
                stream_id: product.stream_id,
                name: product.name.clone(),
                sku: product.sku.clone(),
                price: product.price,
                cost: product.cost,
                supplier: product.supplier.clone(),
                description: product.description.clone(),
                category: product.category.clone(),
                marketplace_url: None,
                sales_count: 0,
                status: ProductStatus::Active,
                created_at: now,
            },
        );
        Ok(id)
    }

    async fn list_stream_products(&self, stream_id: i64) -> Result<Vec<Product>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .products
            .values()
            .filter(|p| p.stream_id == stream_id)
            .cloned()
            .collect())
    }

    async fn list_active_products(&self) -> Result<Vec<Product>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .products
            .values()
            .filter(|p| p.status == ProductStatus::Active)
            .cloned()
            .collect())
    }

    async fn update_product_price(&self, id: i64, price: Decimal) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        find_mut(&mut state.products, "product", id)?.price = price;
        Ok(())
    }

    async fn set_product_listing(&self, id: i64, url: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        find_mut(&mut state.products, "product", id)?.marketplace_url = Some(url.to_string());
        Ok(())
    }

    async fn record_product_sale(&self, id: i64, quantity: i32) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let p = find_mut(&mut state.products, "product", id)?;
        p.sales_count = p.sales_count.saturating_add(quantity);
        Ok(())
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        let state = self.lock()?;
        Ok(state.customers.values().find(|c| c.email == email).cloned())
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<i64, StoreError> {
        let mut state = self.lock()?;
        if state.customers.values().any(|c| c.email == customer.email) {
            return Err(StoreError::Duplicate {
                entity: "customer",
                key: customer.email.clone(),
            });
        }
        let id = state.allocate_id();
        state.customers.insert(
            id,
            Customer {
                id,
                email: customer.email.clone(),
                first_name: customer.first_name.clone(),
                last_name: customer.last_name.clone(),
                source: customer.source.clone(),
                order_count: 0,
                total_spent: Decimal::ZERO,
                average_order_value: Decimal::ZERO,
                last_order_date: None,
                segment: Segment::New,
                created_at: customer.created_at,
            },
        );
        Ok(id)
    }

    async fn get_customer(&self, id: i64) -> Result<Customer, StoreError> {
        let state = self.lock()?;
        state
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("customer", id))
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        Ok(self.lock()?.customers.values().cloned().collect())
    }

    async fn update_customer_metrics(
        &self,
        id: i64,
        metrics: &CustomerMetrics,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let c = find_mut(&mut state.customers, "customer", id)?;
        c.order_count = metrics.order_count;
        c.total_spent = metrics.total_spent;
        c.average_order_value = metrics.average_order_value;
        c.last_order_date = metrics.last_order_date;
        Ok(())
    }

    async fn update_customer_segment(&self, id: i64, segment: Segment) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        find_mut(&mut state.customers, "customer", id)?.segment = segment;
        Ok(())
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<i64, StoreError> {
        let mut state = self.lock()?;
        if !state.customers.contains_key(&order.customer_id) {
            return Err(StoreError::not_found("customer", order.customer_id));
        }
        let id = state.allocate_id();
        state.orders.insert(
            id,
            Order {
                id,
                order_number: order.order_number.clone(),
                customer_id: order.customer_id,
                product_id: order.product_id,
                stream_id: order.stream_id,
                amount: order.amount,
                quantity: order.quantity,
                status: order.status,
                platform: order.platform.clone(),
                created_at: order.created_at,
            },
        );
        Ok(id)
    }

    async fn list_customer_orders(&self, customer_id: i64) -> Result<Vec<Order>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn list_completed_orders(&self, stream_id: i64) -> Result<Vec<Order>, StoreError> {
        let state = self.lock()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.stream_id == stream_id && o.status == OrderStatus::Completed)
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.created_at, o.id));
        Ok(orders)
    }

    async fn record_segment_change(&self, change: &SegmentChange) -> Result<(), StoreError> {
        self.lock()?.segment_changes.push(change.clone());
        Ok(())
    }

    async fn record_reinvestment(&self, entry: &ReinvestmentLog) -> Result<(), StoreError> {
        self.lock()?.reinvestments.push(entry.clone());
        Ok(())
    }

    async fn record_activity(&self, entry: &ActivityLog) -> Result<(), StoreError> {
        self.lock()?.activity.push(entry.clone());
        Ok(())
    }

    async fn dashboard_counts(&self) -> Result<DashboardCounts, StoreError> {
        let state = self.lock()?;
        let active = state
            .streams
            .values()
            .filter(|s| s.status == StreamStatus::Active);
        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        Ok(DashboardCounts {
            trends: count(state.trends.len()),
            opportunities: count(state.opportunities.len()),
            active_streams: count(active.clone().count()),
            customers: count(state.customers.len()),
            total_revenue: active.clone().map(|s| s.revenue).sum(),
            total_expenses: active.map(|s| s.expenses).sum(),
        })
    }
}
