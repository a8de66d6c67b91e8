//! Reinvestment planning and plan execution.
//!
//! [`ReinvestmentPlanner::plan`] is pure: it turns a performance pass into a
//! prioritised list of recommendations. [`execute_plan`] applies a list to a
//! [`Store`], one recommendation at a time, never letting one failure stop
//! the rest.

use autoincome_core::heuristics::{AllocationStep, ReinvestmentHeuristics};
use autoincome_core::{
    Opportunity, OpportunityCriteria, OpportunityStatus, Priority, Recommendation,
    ReinvestmentLog, Store, StoreError, Strategy,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::performance::ProfitReport;
use crate::pricing::round_money;

/// Pending opportunities considered for a new stream.
const CANDIDATE_LIMIT: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReinvestmentDecision {
    pub should_reinvest: bool,
    pub total_profit: Decimal,
    pub available: Decimal,
    pub emergency_reserve: Decimal,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone)]
pub struct ReinvestmentPlanner {
    heuristics: ReinvestmentHeuristics,
}

impl ReinvestmentPlanner {
    #[must_use]
    pub fn new(heuristics: ReinvestmentHeuristics) -> Self {
        Self { heuristics }
    }

    /// Filter for the opportunities a new stream may be created from.
    #[must_use]
    pub fn candidate_criteria(&self) -> OpportunityCriteria {
        OpportunityCriteria {
            min_profit_potential: self.heuristics.candidate_min_profit_potential,
            max_investment: self.heuristics.candidate_max_investment,
            limit: CANDIDATE_LIMIT,
        }
    }

    /// Builds the reinvestment decision for one performance pass.
    ///
    /// `best_opportunity` is the top pending opportunity matching
    /// [`Self::candidate_criteria`], if any.
    #[must_use]
    pub fn plan(
        &self,
        reports: &[ProfitReport],
        best_opportunity: Option<&Opportunity>,
    ) -> ReinvestmentDecision {
        let h = &self.heuristics;
        let total_profit: Decimal = reports.iter().map(|r| r.profit).sum();

        if total_profit < h.minimum_profit {
            return ReinvestmentDecision {
                should_reinvest: false,
                total_profit,
                available: Decimal::ZERO,
                emergency_reserve: Decimal::ZERO,
                recommendations: Vec::new(),
            };
        }

        let available = total_profit * h.reinvestment_share;
        let emergency_reserve = total_profit * h.emergency_reserve_share;

        let mut top: Vec<&ProfitReport> = reports
            .iter()
            .filter(|r| r.profit > Decimal::ZERO && r.roi > h.top_performer_min_roi)
            .collect();
        top.sort_by(|a, b| b.roi.cmp(&a.roi));

        let mut under: Vec<&ProfitReport> = reports
            .iter()
            .filter(|r| r.profit <= Decimal::ZERO || r.roi < h.underperformer_max_roi)
            .collect();
        under.sort_by(|a, b| a.roi.cmp(&b.roi));

        let mut recommendations = Vec::new();
        let mut remaining = available;

        if let Some(best) = top.first() {
            if remaining > h.scale.min_remaining {
                let amount = allocate(h.scale, remaining);
                recommendations.push(Recommendation {
                    strategy: Strategy::ScaleExistingStreams,
                    stream_id: Some(best.stream_id),
                    stream_name: Some(best.stream_name.clone()),
                    opportunity_id: None,
                    amount,
                    expected_roi: best.roi * h.scale_roi_factor,
                    description: format!(
                        "Scale {} with additional inventory and marketing",
                        best.stream_name
                    ),
                    priority: Priority::High,
                });
                remaining -= amount;
            }
        }

        if remaining > h.new_stream.min_remaining {
            if let Some(opp) = best_opportunity {
                let amount = allocate(h.new_stream, remaining);
                recommendations.push(Recommendation {
                    strategy: Strategy::CreateNewStreams,
                    stream_id: None,
                    stream_name: None,
                    opportunity_id: Some(opp.id),
                    amount,
                    expected_roi: Decimal::from(opp.roi_estimate),
                    description: format!(
                        "Create new {} stream for {}",
                        opp.business_model, opp.keyword
                    ),
                    priority: Priority::Medium,
                });
                remaining -= amount;
            }
        }

        if let Some(best) = top.first() {
            if remaining > h.marketing.min_remaining {
                let amount = allocate(h.marketing, remaining);
                recommendations.push(Recommendation {
                    strategy: Strategy::IncreaseMarketingBudget,
                    stream_id: Some(best.stream_id),
                    stream_name: Some(best.stream_name.clone()),
                    opportunity_id: None,
                    amount,
                    expected_roi: h.marketing_expected_roi,
                    description: format!("Increase marketing budget for {}", best.stream_name),
                    priority: Priority::Medium,
                });
                remaining -= amount;
            }
        }

        // Expansion is advisory and leaves `remaining` untouched.
        if total_profit > h.expansion_profit_threshold && remaining > h.expansion.min_remaining {
            recommendations.push(Recommendation {
                strategy: Strategy::ExpandToNewPlatforms,
                stream_id: None,
                stream_name: None,
                opportunity_id: None,
                amount: allocate(h.expansion, remaining),
                expected_roi: h.expansion_expected_roi,
                description: "Expand successful products to additional marketplaces (eBay, Etsy, etc.)"
                    .to_string(),
                priority: Priority::Low,
            });
        }

        if let Some(worst) = under.first() {
            if remaining > h.improvement.min_remaining {
                recommendations.push(Recommendation {
                    strategy: Strategy::ImproveProductQuality,
                    stream_id: Some(worst.stream_id),
                    stream_name: Some(worst.stream_name.clone()),
                    opportunity_id: None,
                    amount: allocate(h.improvement, remaining),
                    expected_roi: h.improvement_expected_roi,
                    description: format!(
                        "Improve {} with better products/pricing",
                        worst.stream_name
                    ),
                    priority: Priority::Low,
                });
            }
        }

        recommendations.sort_by_key(|r| r.priority.rank());

        ReinvestmentDecision {
            should_reinvest: true,
            total_profit,
            available,
            emergency_reserve,
            recommendations,
        }
    }
}

impl Default for ReinvestmentPlanner {
    fn default() -> Self {
        Self::new(ReinvestmentHeuristics::default())
    }
}

fn allocate(step: AllocationStep, remaining: Decimal) -> Decimal {
    round_money((remaining * step.share).min(step.cap))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    pub executed_count: usize,
    pub total_invested: Decimal,
}

fn missing_target(rec: &Recommendation, what: &'static str) -> StoreError {
    StoreError::NotFound {
        entity: what,
        id: format!("<unset on {}>", rec.strategy),
    }
}

/// Applies one recommendation. `Ok(false)` means the strategy is not executable.
async fn apply(
    store: &dyn Store,
    rec: &Recommendation,
    now: DateTime<Utc>,
) -> Result<bool, StoreError> {
    match rec.strategy {
        Strategy::ScaleExistingStreams => {
            let id = rec.stream_id.ok_or_else(|| missing_target(rec, "stream"))?;
            store.add_stream_investment(id, rec.amount, now).await?;
        }
        Strategy::CreateNewStreams => {
            let id = rec
                .opportunity_id
                .ok_or_else(|| missing_target(rec, "opportunity"))?;
            store
                .set_opportunity_status(id, OpportunityStatus::Implementing)
                .await?;
        }
        Strategy::IncreaseMarketingBudget => {
            let id = rec.stream_id.ok_or_else(|| missing_target(rec, "stream"))?;
            store.add_marketing_budget(id, rec.amount, now).await?;
        }
        Strategy::ExpandToNewPlatforms | Strategy::ImproveProductQuality => {
            tracing::info!(
                strategy = %rec.strategy,
                amount = %rec.amount,
                description = %rec.description,
                "reinvest: recorded advisory strategy"
            );
        }
        Strategy::AutomateOperations => return Ok(false),
    }
    Ok(true)
}

/// Executes every recommendation in order and logs each success.
pub async fn execute_plan(
    store: &dyn Store,
    recommendations: &[Recommendation],
    now: DateTime<Utc>,
) -> ExecutionSummary {
    let mut summary = ExecutionSummary::default();

    for rec in recommendations {
        match apply(store, rec, now).await {
            Ok(true) => {
                summary.executed_count += 1;
                summary.total_invested += rec.amount;
                if let Err(e) = store
                    .record_reinvestment(&ReinvestmentLog::executed(rec, now))
                    .await
                {
                    tracing::warn!(strategy = %rec.strategy, error = %e, "reinvest: failed to log execution");
                }
            }
            Ok(false) => {
                tracing::info!(strategy = %rec.strategy, "reinvest: strategy not executable, skipped");
            }
            Err(e) => {
                tracing::error!(strategy = %rec.strategy, error = %e, "reinvest: strategy failed");
            }
        }
    }

    summary
}

#[cfg(test)]
#[path = "reinvest_test.rs"]
mod tests;
