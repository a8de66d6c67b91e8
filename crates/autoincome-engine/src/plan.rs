//! Business plan drafted from a single opportunity.

use autoincome_core::{BusinessModel, MarketSize, Opportunity};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

/// Phase lengths in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub setup_days: i64,
    pub launch_days: i64,
    pub optimization_days: i64,
    pub scaling_days: i64,
}

impl Timeline {
    fn for_difficulty(difficulty: i16) -> Self {
        let base = i64::from(difficulty) * 3;
        Self {
            setup_days: (base * 3 / 10).max(1),
            launch_days: (base * 7 / 10).max(3),
            optimization_days: base.max(7),
            scaling_days: (base * 2).max(14),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub initial: Decimal,
    pub marketing: Decimal,
    pub operations: Decimal,
    pub contingency: Decimal,
}

impl Budget {
    fn for_investment(investment: Decimal) -> Self {
        let share = |rate: Decimal| {
            (investment * rate).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        };
        Self {
            initial: investment,
            marketing: share(dec!(0.4)),
            operations: share(dec!(0.3)),
            contingency: share(dec!(0.3)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessMetrics {
    /// First-month revenue target.
    pub revenue: Decimal,
    pub customers: i64,
    pub conversion_pct: i64,
    pub roi_target: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessPlan {
    pub opportunity_id: i64,
    pub business_model: BusinessModel,
    pub timeline: Timeline,
    pub budget: Budget,
    pub marketing_strategy: &'static str,
    pub risks: Vec<&'static str>,
    pub success_metrics: SuccessMetrics,
}

impl BusinessPlan {
    #[must_use]
    pub fn for_opportunity(opp: &Opportunity) -> Self {
        Self {
            opportunity_id: opp.id,
            business_model: opp.business_model,
            timeline: Timeline::for_difficulty(opp.difficulty_score),
            budget: Budget::for_investment(opp.investment_required),
            marketing_strategy: marketing_strategy(opp.business_model),
            risks: risks(opp),
            success_metrics: SuccessMetrics {
                revenue: opp.investment_required * Decimal::from(opp.roi_estimate)
                    / Decimal::ONE_HUNDRED,
                customers: (i64::from(opp.profit_potential) * 5).max(10),
                conversion_pct: (10 - i64::from(opp.difficulty_score)).max(2),
                roi_target: opp.roi_estimate,
            },
        }
    }
}

fn marketing_strategy(model: BusinessModel) -> &'static str {
    match model {
        BusinessModel::Dropshipping => {
            "Facebook Marketplace + Instagram ads targeting trending hashtags"
        }
        BusinessModel::DigitalProducts => {
            "Content marketing + email sequences + affiliate partnerships"
        }
        BusinessModel::PrintOnDemand => "Social media organic + influencer collaborations",
        BusinessModel::ServiceArbitrage => "Local SEO + networking + referral programs",
        BusinessModel::AffiliateMarketing
        | BusinessModel::MarketplaceSeller
        | BusinessModel::SubscriptionBox
        | BusinessModel::OnlineCourse
        | BusinessModel::SoftwareTool => "Multi-channel digital marketing approach",
    }
}

fn risks(opp: &Opportunity) -> Vec<&'static str> {
    let mut risks = Vec::new();
    if opp.difficulty_score > 7 {
        risks.push("High complexity may require specialized skills");
    }
    if opp.investment_required > dec!(500) {
        risks.push("Significant upfront investment required");
    }
    if opp.market_size == MarketSize::Small {
        risks.push("Limited market size may restrict growth");
    }
    if risks.is_empty() {
        risks.push("Low risk opportunity with manageable challenges");
    }
    risks
}

#[cfg(test)]
mod tests {
    use autoincome_core::OpportunityStatus;
    use chrono::Utc;

    use super::*;

    fn opportunity(difficulty: i16, investment: Decimal, market: MarketSize) -> Opportunity {
        Opportunity {
            id: 4,
            trend_id: 1,
            keyword: "wireless charging stand".to_string(),
            business_model: BusinessModel::Dropshipping,
            profit_potential: 8,
            difficulty_score: difficulty,
            investment_required: investment,
            roi_estimate: 500,
            market_size: market,
            competition_analysis: String::new(),
            recommendation: String::new(),
            status: OpportunityStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn medium_difficulty_plan() {
        let plan = BusinessPlan::for_opportunity(&opportunity(5, dec!(150), MarketSize::Medium));
        assert_eq!(
            plan.timeline,
            Timeline {
                setup_days: 4,
                launch_days: 10,
                optimization_days: 15,
                scaling_days: 30,
            }
        );
        assert_eq!(plan.budget.marketing, dec!(60));
        assert_eq!(plan.budget.operations, dec!(45));
        assert_eq!(plan.budget.contingency, dec!(45));
        assert_eq!(plan.risks, vec!["Low risk opportunity with manageable challenges"]);
        assert_eq!(plan.success_metrics.revenue, dec!(750));
        assert_eq!(plan.success_metrics.customers, 40);
        assert_eq!(plan.success_metrics.conversion_pct, 5);
        assert!(plan.marketing_strategy.starts_with("Facebook Marketplace"));
    }

    #[test]
    fn easy_plan_uses_phase_minimums() {
        let plan = BusinessPlan::for_opportunity(&opportunity(1, dec!(0), MarketSize::Large));
        assert_eq!(plan.timeline.setup_days, 1);
        assert_eq!(plan.timeline.launch_days, 3);
        assert_eq!(plan.timeline.optimization_days, 7);
        assert_eq!(plan.timeline.scaling_days, 14);
        assert_eq!(plan.success_metrics.conversion_pct, 9);
    }

    #[test]
    fn every_risk_is_listed() {
        let plan = BusinessPlan::for_opportunity(&opportunity(9, dec!(800), MarketSize::Small));
        assert_eq!(plan.risks.len(), 3);
        assert_eq!(plan.success_metrics.conversion_pct, 2);
    }

    #[test]
    fn budget_shares_round_half_away() {
        let plan = BusinessPlan::for_opportunity(&opportunity(3, dec!(15), MarketSize::Medium));
        // 4.5 rounds up for both 30% shares
        assert_eq!(plan.budget.operations, dec!(5));
        assert_eq!(plan.budget.marketing, dec!(6));
    }
}
