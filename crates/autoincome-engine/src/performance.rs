//! Per-stream profit, expense and growth figures.

use std::collections::HashMap;

use autoincome_core::heuristics::PerformanceHeuristics;
use autoincome_core::{IncomeStream, Order, OrderStatus, Product};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpenseBreakdown {
    pub initial_investment: Decimal,
    pub marketing: Decimal,
    pub platform_fees: Decimal,
    pub product_costs: Decimal,
    pub operational: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitReport {
    pub stream_id: i64,
    pub stream_name: String,
    pub revenue: Decimal,
    pub expenses: ExpenseBreakdown,
    pub profit: Decimal,
    /// Percent of revenue; zero without revenue.
    pub profit_margin: Decimal,
    /// Percent of initial investment; zero without investment.
    pub roi: Decimal,
    /// Percent change of the trailing revenue window over the one before it.
    pub growth_rate: Decimal,
    pub initial_investment: Decimal,
    pub days_active: i64,
    pub profit_per_day: Decimal,
}

impl ProfitReport {
    /// Report for a stream whose inputs could not be loaded.
    #[must_use]
    pub fn zeroed(stream: &IncomeStream) -> Self {
        Self {
            stream_id: stream.id,
            stream_name: stream.name.clone(),
            revenue: Decimal::ZERO,
            expenses: ExpenseBreakdown::default(),
            profit: Decimal::ZERO,
            profit_margin: Decimal::ZERO,
            roi: Decimal::ZERO,
            growth_rate: Decimal::ZERO,
            initial_investment: stream.initial_investment,
            days_active: 0,
            profit_per_day: Decimal::ZERO,
        }
    }
}

/// Whole days elapsed since `since`, never negative.
#[must_use]
pub fn days_between(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_days().max(0)
}

#[derive(Debug, Clone)]
pub struct PerformanceCalculator {
    heuristics: PerformanceHeuristics,
}

impl PerformanceCalculator {
    #[must_use]
    pub fn new(heuristics: PerformanceHeuristics) -> Self {
        Self { heuristics }
    }

    #[must_use]
    pub fn heuristics(&self) -> &PerformanceHeuristics {
        &self.heuristics
    }

    /// Computes the report from completed orders; other statuses are ignored.
    #[must_use]
    pub fn calculate(
        &self,
        stream: &IncomeStream,
        orders: &[Order],
        products: &[Product],
        now: DateTime<Utc>,
    ) -> ProfitReport {
        let h = &self.heuristics;
        let completed: Vec<&Order> = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .collect();
        let costs: HashMap<i64, Decimal> = products.iter().map(|p| (p.id, p.cost)).collect();

        let revenue: Decimal = completed.iter().map(|o| o.amount).sum();
        let days_active = days_between(stream.created_at, now);

        let marketing_rate = if days_active < h.new_stream_days {
            h.new_stream_marketing_rate
        } else {
            h.mature_marketing_rate
        };
        let product_costs: Decimal = completed
            .iter()
            .filter_map(|o| {
                let cost = o.product_id.and_then(|id| costs.get(&id))?;
                Some(*cost * Decimal::from(o.quantity.max(1)))
            })
            .sum();

        let mut expenses = ExpenseBreakdown {
            initial_investment: stream.initial_investment,
            marketing: revenue * marketing_rate,
            platform_fees: revenue * h.platform_fee_rate,
            product_costs,
            operational: Decimal::from(days_active) * h.daily_operational_cost,
            total: Decimal::ZERO,
        };
        expenses.total = expenses.initial_investment
            + expenses.marketing
            + expenses.platform_fees
            + expenses.product_costs
            + expenses.operational;

        let profit = revenue - expenses.total;
        let profit_margin = if revenue.is_zero() {
            Decimal::ZERO
        } else {
            profit / revenue * HUNDRED
        };
        let roi = if stream.initial_investment.is_zero() {
            Decimal::ZERO
        } else {
            profit / stream.initial_investment * HUNDRED
        };
        let profit_per_day = if days_active == 0 {
            Decimal::ZERO
        } else {
            profit / Decimal::from(days_active)
        };

        ProfitReport {
            stream_id: stream.id,
            stream_name: stream.name.clone(),
            revenue,
            expenses,
            profit,
            profit_margin,
            roi,
            growth_rate: self.growth_rate(&completed, now),
            initial_investment: stream.initial_investment,
            days_active,
            profit_per_day,
        }
    }

    /// `(trailing - preceding) / preceding * 100` over two adjacent windows
    /// ending at `now`; zero when the preceding window has no revenue.
    fn growth_rate(&self, completed: &[&Order], now: DateTime<Utc>) -> Decimal {
        let window = Duration::days(self.heuristics.growth_window_days);
        let current_start = now - window;
        let previous_start = current_start - window;

        let sum_between = |from: DateTime<Utc>, to: DateTime<Utc>| -> Decimal {
            completed
                .iter()
                .filter(|o| o.created_at >= from && o.created_at < to)
                .map(|o| o.amount)
                .sum()
        };
        let current = sum_between(current_start, now);
        let previous = sum_between(previous_start, current_start);

        if previous.is_zero() {
            Decimal::ZERO
        } else {
            (current - previous) / previous * HUNDRED
        }
    }
}

impl Default for PerformanceCalculator {
    fn default() -> Self {
        Self::new(PerformanceHeuristics::default())
    }
}

/// Portfolio-wide roll-up of a performance pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub total_profit: Decimal,
    pub average_roi: Decimal,
    pub profit_margin: Decimal,
    pub stream_count: usize,
    pub profitable_streams: usize,
    /// Stream with the highest profit.
    pub top_performer: Option<(i64, String)>,
}

impl FinancialSummary {
    #[must_use]
    pub fn from_reports(reports: &[ProfitReport]) -> Self {
        let total_revenue: Decimal = reports.iter().map(|r| r.revenue).sum();
        let total_expenses: Decimal = reports.iter().map(|r| r.expenses.total).sum();
        let total_profit = total_revenue - total_expenses;
        let average_roi = if reports.is_empty() {
            Decimal::ZERO
        } else {
            reports.iter().map(|r| r.roi).sum::<Decimal>() / Decimal::from(reports.len())
        };
        let profit_margin = if total_revenue.is_zero() {
            Decimal::ZERO
        } else {
            total_profit / total_revenue * HUNDRED
        };
        let top_performer = reports
            .iter()
            .max_by_key(|r| r.profit)
            .map(|r| (r.stream_id, r.stream_name.clone()));

        Self {
            total_revenue,
            total_expenses,
            total_profit,
            average_roi,
            profit_margin,
            stream_count: reports.len(),
            profitable_streams: reports.iter().filter(|r| r.profit > Decimal::ZERO).count(),
            top_performer,
        }
    }
}
