//! Batch orchestration over a [`Store`].
//!
//! Every operation takes `now` explicitly and draws randomness from the
//! pipeline's own seeded generator. Top-level listing failures are returned;
//! failures on a single trend, opportunity, product, stream or customer are
//! logged with the item key and the batch moves on.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use autoincome_core::{
    ActivityLog, AppConfig, Customer, Heuristics, IncomeStream, NewCustomer, NewOrder, NewStream,
    Opportunity, OpportunityCandidate, OpportunityStatus, OrderStatus, Segment, SegmentChange,
    Store, StoreError, StreamMetrics, Trend,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::analyst::GenerativeAnalyst;
use crate::error::EngineError;
use crate::feed::{SyntheticTrendFeed, TrendFeed};
use crate::launch;
use crate::performance::{FinancialSummary, PerformanceCalculator, ProfitReport};
use crate::plan::BusinessPlan;
use crate::pricing::{round_money, PricingEngine};
use crate::reinvest::{self, ExecutionSummary, ReinvestmentDecision, ReinvestmentPlanner};
use crate::scorer::OpportunityScorer;
use crate::segmentation::{metrics_from_orders, CustomerAnalytics, Segmenter};

/// Opportunities considered by one launch pass.
const LAUNCH_LIMIT: i64 = 10;

const TOP_CUSTOMERS: usize = 10;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub trend_batch_size: i64,
    pub launch_platform: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            trend_batch_size: 50,
            launch_platform: "facebook_marketplace".to_string(),
        }
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            trend_batch_size: config.trend_batch_size,
            launch_platform: config.launch_platform.clone(),
        }
    }
}

/// An incoming sale, keyed on the buyer's email.
#[derive(Debug, Clone)]
pub struct OrderIntake {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub source: String,
    pub stream_id: i64,
    pub product_id: Option<i64>,
    pub amount: Decimal,
    pub quantity: i32,
    pub status: OrderStatus,
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedOrder {
    pub order_id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub segment: Segment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutomatedReinvestment {
    pub decision: ReinvestmentDecision,
    pub executed: ExecutionSummary,
}

/// Dashboard figures published after every snapshot job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DashboardSnapshot {
    pub trends: i64,
    pub opportunities: i64,
    pub active_streams: i64,
    pub customers: i64,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub last_update: Option<DateTime<Utc>>,
}

pub struct Pipeline {
    store: Arc<dyn Store>,
    scorer: OpportunityScorer,
    pricing: PricingEngine,
    performance: PerformanceCalculator,
    segmenter: Segmenter,
    planner: ReinvestmentPlanner,
    analyst: Option<Arc<dyn GenerativeAnalyst>>,
    feed: Arc<dyn TrendFeed>,
    rng: Mutex<StdRng>,
    /// Serialises performance passes so reinvestment never plans from a
    /// half-written set of stream metrics.
    performance_gate: tokio::sync::Mutex<()>,
    options: PipelineOptions,
}

impl Pipeline {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, heuristics: &Heuristics, options: PipelineOptions) -> Self {
        Self {
            store,
            scorer: OpportunityScorer::new(heuristics.scoring.clone()),
            pricing: PricingEngine::new(heuristics.pricing.clone()),
            performance: PerformanceCalculator::new(heuristics.performance.clone()),
            segmenter: Segmenter::new(heuristics.segmentation.clone()),
            planner: ReinvestmentPlanner::new(heuristics.reinvestment.clone()),
            analyst: None,
            feed: Arc::new(SyntheticTrendFeed),
            rng: Mutex::new(StdRng::from_os_rng()),
            performance_gate: tokio::sync::Mutex::new(()),
            options,
        }
    }

    #[must_use]
    pub fn with_analyst(mut self, analyst: Arc<dyn GenerativeAnalyst>) -> Self {
        self.analyst = Some(analyst);
        self
    }

    #[must_use]
    pub fn with_feed(mut self, feed: Arc<dyn TrendFeed>) -> Self {
        self.feed = feed;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn draw<T>(&self, f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *rng)
    }

    async fn log_activity(
        &self,
        component: &str,
        action: &str,
        details: String,
        success: bool,
        now: DateTime<Utc>,
    ) {
        let entry = ActivityLog {
            component: component.to_string(),
            action: action.to_string(),
            details,
            success,
            recorded_at: now,
        };
        if let Err(e) = self.store.record_activity(&entry).await {
            tracing::warn!(component, action, error = %e, "pipeline: failed to write activity log");
        }
    }

    // ------------------------------------------------------------------
    // Trends and opportunities
    // ------------------------------------------------------------------

    /// Pulls one batch from the trend feed and upserts it. Returns the number stored.
    pub async fn ingest_trends(&self, now: DateTime<Utc>) -> usize {
        let trends = self.draw(|rng| self.feed.collect(rng));
        let mut stored = 0usize;

        for trend in trends.into_iter().map(|t| t.sanitized()) {
            match self.store.upsert_trend(&trend, now).await {
                Ok(_) => stored += 1,
                Err(e) => {
                    tracing::warn!(trend = %trend.keyword, platform = %trend.platform, error = %e, "ingest: failed to store trend");
                }
            }
        }

        tracing::info!(stored, "ingest: trend batch stored");
        self.log_activity("TrendFeed", "ingest", format!("Stored {stored} trends"), true, now)
            .await;
        stored
    }

    async fn candidates_for(&self, trend: &Trend) -> Vec<OpportunityCandidate> {
        if let Some(analyst) = &self.analyst {
            match analyst.propose(trend).await {
                Ok(candidates) => return candidates,
                Err(e) => {
                    tracing::warn!(trend = %trend.keyword, error = %e, "analyzer: analyst failed, falling back to heuristics");
                }
            }
        }
        self.scorer.score(trend)
    }

    async fn analyze_one(&self, trend: &Trend, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let candidates = self.candidates_for(trend).await;
        for candidate in &candidates {
            self.store.insert_opportunity(trend.id, candidate, now).await?;
        }
        self.store.mark_trend_analyzed(trend.id).await?;
        Ok(candidates.len())
    }

    /// Scores up to one batch of unanalyzed trends. Returns the number of
    /// trends analyzed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the batch cannot be listed.
    pub async fn analyze_trends(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let trends = self
            .store
            .list_unanalyzed_trends(self.options.trend_batch_size)
            .await?;
        let mut analyzed = 0usize;
        let mut opportunities = 0usize;

        for trend in &trends {
            match self.analyze_one(trend, now).await {
                Ok(found) => {
                    analyzed += 1;
                    opportunities += found;
                    tracing::debug!(trend = %trend.keyword, found, "analyzer: trend scored");
                }
                Err(e) => {
                    tracing::warn!(trend = %trend.keyword, error = %e, "analyzer: failed to analyze trend");
                }
            }
        }

        tracing::info!(analyzed, opportunities, "analyzer: batch complete");
        self.log_activity(
            "TrendAnalyzer",
            "analyze",
            format!("Analyzed {analyzed} trends, found {opportunities} opportunities"),
            true,
            now,
        )
        .await;
        Ok(analyzed)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the opportunity does not exist.
    pub async fn business_plan(&self, opportunity_id: i64) -> Result<BusinessPlan, EngineError> {
        let opportunity = self.store.get_opportunity(opportunity_id).await?;
        Ok(BusinessPlan::for_opportunity(&opportunity))
    }

    // ------------------------------------------------------------------
    // Streams and products
    // ------------------------------------------------------------------

    async fn launch_one(&self, opp: &Opportunity, now: DateTime<Utc>) -> Result<i64, StoreError> {
        let platform = &self.options.launch_platform;
        let stream_id = self
            .store
            .create_stream(
                &NewStream {
                    opportunity_id: Some(opp.id),
                    name: format!("{} - {}", opp.keyword, opp.business_model),
                    platform: platform.clone(),
                    business_model: opp.business_model,
                    initial_investment: opp.investment_required,
                },
                now,
            )
            .await?;

        let count = self.pricing.product_count(opp.investment_required);
        for index in 0..count {
            let sku = self.draw(|rng| launch::sku(rng, now, index));
            let draft = self.pricing.draft_product(opp, stream_id, index, sku);
            let product_id = match self.store.insert_product(&draft, now).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(stream_id, sku = %draft.sku, error = %e, "launcher: failed to create product");
                    continue;
                }
            };
            let url = self.draw(|rng| launch::listing_url(rng, platform));
            if let Err(e) = self.store.set_product_listing(product_id, &url).await {
                tracing::warn!(product_id, error = %e, "launcher: failed to record listing");
            }
        }

        self.store
            .set_opportunity_status(opp.id, OpportunityStatus::Implemented)
            .await?;
        Ok(stream_id)
    }

    /// Opens a stream with listed products for each launchable opportunity.
    /// Returns the new stream ids.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if candidates cannot be listed.
    pub async fn launch_streams(&self, now: DateTime<Utc>) -> Result<Vec<i64>, EngineError> {
        let criteria = autoincome_core::OpportunityCriteria {
            limit: LAUNCH_LIMIT,
            ..self.planner.candidate_criteria()
        };
        let candidates = self.store.list_pending_opportunities(&criteria).await?;
        let mut launched = Vec::with_capacity(candidates.len());

        for opp in &candidates {
            match self.launch_one(opp, now).await {
                Ok(stream_id) => {
                    tracing::info!(opportunity_id = opp.id, stream_id, keyword = %opp.keyword, "launcher: stream launched");
                    launched.push(stream_id);
                }
                Err(e) => {
                    tracing::warn!(opportunity_id = opp.id, keyword = %opp.keyword, error = %e, "launcher: failed to launch stream");
                }
            }
        }

        self.log_activity(
            "StreamLauncher",
            "launch",
            format!("Launched {} streams", launched.len()),
            true,
            now,
        )
        .await;
        Ok(launched)
    }

    /// Reprices every active product. Returns the number of prices changed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if products cannot be listed.
    pub async fn optimize_pricing(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let products = self.store.list_active_products().await?;
        let mut updated = 0usize;

        for product in &products {
            let Some(price) = self.pricing.optimized_price(product, now) else {
                continue;
            };
            match self.store.update_product_price(product.id, price).await {
                Ok(()) => {
                    tracing::debug!(product_id = product.id, old = %product.price, new = %price, "pricing: repriced");
                    updated += 1;
                }
                Err(e) => {
                    tracing::warn!(product_id = product.id, error = %e, "pricing: failed to update price");
                }
            }
        }

        tracing::info!(updated, "pricing: optimization pass complete");
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Performance
    // ------------------------------------------------------------------

    fn conversion_rate(&self) -> Decimal {
        let h = self.performance.heuristics();
        let basis_points = self.draw(|rng| rng.random_range(0..10_000i64));
        round_money(
            h.conversion_rate_min
                + (h.conversion_rate_max - h.conversion_rate_min) * Decimal::new(basis_points, 4),
        )
    }

    async fn assess(
        &self,
        stream: &IncomeStream,
        now: DateTime<Utc>,
    ) -> Result<(ProfitReport, StreamMetrics), StoreError> {
        let orders = self.store.list_completed_orders(stream.id).await?;
        let products = self.store.list_stream_products(stream.id).await?;
        let report = self.performance.calculate(stream, &orders, &products, now);

        let customers: HashSet<i64> = orders.iter().map(|o| o.customer_id).collect();
        let metrics = StreamMetrics {
            revenue: report.revenue,
            expenses: report.expenses.total,
            profit_margin: report.profit_margin,
            roi: report.roi,
            products_count: i32::try_from(products.len()).unwrap_or(i32::MAX),
            customers_count: i32::try_from(customers.len()).unwrap_or(i32::MAX),
            conversion_rate: self.conversion_rate(),
        };
        Ok((report, metrics))
    }

    /// Paused streams are included: pausing stops activity, not accounting.
    async fn performance_pass(&self, now: DateTime<Utc>) -> Result<Vec<ProfitReport>, EngineError> {
        let streams = self.store.list_streams(None).await?;
        let mut reports = Vec::with_capacity(streams.len());

        for stream in &streams {
            let report = match self.assess(stream, now).await {
                Ok((report, metrics)) => {
                    if let Err(e) = self.store.update_stream_metrics(stream.id, &metrics, now).await {
                        tracing::warn!(stream_id = stream.id, error = %e, "performance: failed to persist metrics");
                    }
                    report
                }
                Err(e) => {
                    tracing::warn!(stream_id = stream.id, stream = %stream.name, error = %e, "performance: calculation failed, using zeroed report");
                    ProfitReport::zeroed(stream)
                }
            };
            reports.push(report);
        }
        Ok(reports)
    }

    /// Recomputes and persists metrics for every stream, active or paused.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if streams cannot be listed.
    pub async fn refresh_performance(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProfitReport>, EngineError> {
        let _gate = self.performance_gate.lock().await;
        let reports = self.performance_pass(now).await?;
        let summary = FinancialSummary::from_reports(&reports);
        tracing::info!(
            streams = summary.stream_count,
            revenue = %summary.total_revenue,
            profit = %summary.total_profit,
            "performance: pass complete"
        );
        Ok(reports)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if streams cannot be listed.
    pub async fn financial_summary(
        &self,
        now: DateTime<Utc>,
    ) -> Result<FinancialSummary, EngineError> {
        let reports = self.refresh_performance(now).await?;
        Ok(FinancialSummary::from_reports(&reports))
    }

    // ------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------

    /// Persists a segment change if the customer's segment moved.
    async fn resegment(
        &self,
        customer: &Customer,
        now: DateTime<Utc>,
    ) -> Result<Option<SegmentChange>, StoreError> {
        let segment = self.segmenter.segment(customer, now);
        if segment == customer.segment {
            return Ok(None);
        }
        self.store.update_customer_segment(customer.id, segment).await?;
        let change = SegmentChange {
            customer_id: customer.id,
            email: customer.email.clone(),
            from: customer.segment,
            to: segment,
            changed_at: now,
        };
        self.store.record_segment_change(&change).await?;
        tracing::info!(customer_id = customer.id, from = %change.from, to = %change.to, "segmentation: segment changed");
        Ok(Some(change))
    }

    /// Re-segments every customer. Returns the changes made.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if customers cannot be listed.
    pub async fn run_segmentation(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SegmentChange>, EngineError> {
        let customers = self.store.list_customers().await?;
        let mut changes = Vec::new();

        for customer in &customers {
            match self.resegment(customer, now).await {
                Ok(Some(change)) => changes.push(change),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(customer_id = customer.id, email = %customer.email, error = %e, "segmentation: failed to update customer");
                }
            }
        }

        self.log_activity(
            "Segmentation",
            "segment",
            format!("Updated {} of {} customers", changes.len(), customers.len()),
            true,
            now,
        )
        .await;
        Ok(changes)
    }

    /// Roll-up of the customer base. A customer whose orders cannot be read
    /// still counts, but contributes nothing to the average order value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if customers cannot be listed.
    pub async fn customer_analytics(
        &self,
        now: DateTime<Utc>,
    ) -> Result<CustomerAnalytics, EngineError> {
        let customers = self.store.list_customers().await?;
        let mut orders = Vec::new();
        for customer in &customers {
            match self.store.list_customer_orders(customer.id).await {
                Ok(found) => orders.extend(found),
                Err(e) => {
                    tracing::warn!(customer_id = customer.id, error = %e, "analytics: failed to load orders");
                }
            }
        }
        Ok(CustomerAnalytics::compute(&customers, &orders, now, TOP_CUSTOMERS))
    }

    /// Records a sale: find-or-create the customer, insert the order, bump
    /// product sales, recompute customer metrics and re-segment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the customer or order cannot be written.
    pub async fn record_order(
        &self,
        intake: &OrderIntake,
        now: DateTime<Utc>,
    ) -> Result<RecordedOrder, EngineError> {
        let email = intake.email.trim().to_ascii_lowercase();
        let customer_id = match self.store.find_customer_by_email(&email).await? {
            Some(existing) => existing.id,
            None => {
                self.store
                    .create_customer(&NewCustomer {
                        email: email.clone(),
                        first_name: intake.first_name.clone(),
                        last_name: intake.last_name.clone(),
                        source: intake.source.clone(),
                        created_at: now,
                    })
                    .await?
            }
        };

        let order_number = self.draw(|rng| launch::order_number(rng, now));
        let order_id = self
            .store
            .insert_order(&NewOrder {
                order_number: order_number.clone(),
                customer_id,
                product_id: intake.product_id,
                stream_id: intake.stream_id,
                amount: intake.amount,
                quantity: intake.quantity.max(1),
                status: intake.status,
                platform: intake.platform.clone(),
                created_at: now,
            })
            .await?;

        if intake.status == OrderStatus::Completed {
            if let Some(product_id) = intake.product_id {
                if let Err(e) = self
                    .store
                    .record_product_sale(product_id, intake.quantity.max(1))
                    .await
                {
                    tracing::warn!(product_id, error = %e, "orders: failed to bump product sales");
                }
            }
        }

        let orders = self.store.list_customer_orders(customer_id).await?;
        self.store
            .update_customer_metrics(customer_id, &metrics_from_orders(&orders))
            .await?;
        let customer = self.store.get_customer(customer_id).await?;
        let segment = match self.resegment(&customer, now).await? {
            Some(change) => change.to,
            None => customer.segment,
        };

        self.log_activity(
            "CustomerManager",
            "record_order",
            format!("Processed order {order_number} for {email}"),
            true,
            now,
        )
        .await;

        Ok(RecordedOrder {
            order_id,
            order_number,
            customer_id,
            segment,
        })
    }

    // ------------------------------------------------------------------
    // Reinvestment
    // ------------------------------------------------------------------

    /// Runs a fresh performance pass and plans reinvestment from it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if streams or candidates cannot be listed.
    pub async fn analyze_reinvestment(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ReinvestmentDecision, EngineError> {
        let reports = {
            let _gate = self.performance_gate.lock().await;
            self.performance_pass(now).await?
        };
        let candidates = self
            .store
            .list_pending_opportunities(&self.planner.candidate_criteria())
            .await?;
        let decision = self.planner.plan(&reports, candidates.first());
        tracing::info!(
            should_reinvest = decision.should_reinvest,
            total_profit = %decision.total_profit,
            available = %decision.available,
            recommendations = decision.recommendations.len(),
            "reinvest: analysis complete"
        );
        Ok(decision)
    }

    pub async fn execute_plan(
        &self,
        recommendations: &[autoincome_core::Recommendation],
        now: DateTime<Utc>,
    ) -> ExecutionSummary {
        let summary = reinvest::execute_plan(self.store.as_ref(), recommendations, now).await;
        self.log_activity(
            "ReinvestmentEngine",
            "execute",
            format!(
                "Executed {} strategies, invested {}",
                summary.executed_count, summary.total_invested
            ),
            true,
            now,
        )
        .await;
        summary
    }

    /// Plans reinvestment and executes only its high-priority recommendations.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the analysis cannot run.
    pub async fn run_automated_reinvestment(
        &self,
        now: DateTime<Utc>,
    ) -> Result<AutomatedReinvestment, EngineError> {
        let decision = self.analyze_reinvestment(now).await?;
        let executed = if decision.should_reinvest {
            let high: Vec<_> = decision
                .recommendations
                .iter()
                .filter(|r| r.priority == autoincome_core::Priority::High)
                .cloned()
                .collect();
            self.execute_plan(&high, now).await
        } else {
            ExecutionSummary::default()
        };
        Ok(AutomatedReinvestment { decision, executed })
    }

    // ------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the counts cannot be read.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<DashboardSnapshot, EngineError> {
        let counts = self.store.dashboard_counts().await?;
        Ok(DashboardSnapshot {
            trends: counts.trends,
            opportunities: counts.opportunities,
            active_streams: counts.active_streams,
            customers: counts.customers,
            total_revenue: counts.total_revenue,
            total_profit: counts.total_revenue - counts.total_expenses,
            last_update: Some(now),
        })
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
