use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

labelled_enum! {
    /// The ways a trend can be monetised.
    pub enum BusinessModel: "business model" {
        Dropshipping => "dropshipping",
        DigitalProducts => "digital_products",
        PrintOnDemand => "print_on_demand",
        AffiliateMarketing => "affiliate_marketing",
        ServiceArbitrage => "service_arbitrage",
        SubscriptionBox => "subscription_box",
        OnlineCourse => "online_course",
        SoftwareTool => "software_tool",
        MarketplaceSeller => "marketplace_seller",
    }
}

labelled_enum! {
    pub enum MarketSize: "market size" {
        Small => "small",
        Medium => "medium",
        Large => "large",
    }
}

labelled_enum! {
    /// Lifecycle of an opportunity. Transitions only move forward.
    pub enum OpportunityStatus: "opportunity status" {
        Pending => "pending",
        Implementing => "implementing",
        Implemented => "implemented",
    }
}

impl OpportunityStatus {
    /// `pending -> implementing -> implemented`, plus the direct
    /// `pending -> implemented` taken when a stream is launched outright.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Implementing | Self::Implemented)
                | (Self::Implementing, Self::Implemented)
        )
    }
}

pub const SCORE_MIN: i16 = 1;
pub const SCORE_MAX: i16 = 10;
pub const INVESTMENT_MAX: Decimal = dec!(1000);

/// Clamps any raw score onto the 1..=10 scale.
#[must_use]
pub fn clamp_score(raw: i64) -> i16 {
    let clamped = raw.clamp(i64::from(SCORE_MIN), i64::from(SCORE_MAX));
    i16::try_from(clamped).unwrap_or(SCORE_MIN)
}

/// Clamps an investment figure onto `0..=1000`.
#[must_use]
pub fn clamp_investment(raw: Decimal) -> Decimal {
    raw.clamp(Decimal::ZERO, INVESTMENT_MAX)
}

/// A scored business idea for one trend, not yet persisted.
///
/// Construct through [`OpportunityCandidate::new`] so the scores and the
/// investment figure are always inside their documented ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityCandidate {
    pub business_model: BusinessModel,
    profit_potential: i16,
    difficulty_score: i16,
    investment_required: Decimal,
    pub roi_estimate: i32,
    pub market_size: MarketSize,
    pub competition_analysis: String,
    pub recommendation: String,
}

impl OpportunityCandidate {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        business_model: BusinessModel,
        profit_potential: i64,
        difficulty_score: i64,
        investment_required: Decimal,
        roi_estimate: i32,
        market_size: MarketSize,
        competition_analysis: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            business_model,
            profit_potential: clamp_score(profit_potential),
            difficulty_score: clamp_score(difficulty_score),
            investment_required: clamp_investment(investment_required),
            roi_estimate,
            market_size,
            competition_analysis: competition_analysis.into(),
            recommendation: recommendation.into(),
        }
    }

    #[must_use]
    pub fn profit_potential(&self) -> i16 {
        self.profit_potential
    }

    #[must_use]
    pub fn difficulty_score(&self) -> i16 {
        self.difficulty_score
    }

    #[must_use]
    pub fn investment_required(&self) -> Decimal {
        self.investment_required
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: i64,
    pub trend_id: i64,
    /// Keyword of the originating trend.
    pub keyword: String,
    pub business_model: BusinessModel,
    pub profit_potential: i16,
    pub difficulty_score: i16,
    pub investment_required: Decimal,
    pub roi_estimate: i32,
    pub market_size: MarketSize,
    pub competition_analysis: String,
    pub recommendation: String,
    pub status: OpportunityStatus,
    pub created_at: DateTime<Utc>,
}

/// Filter for picking launchable pending opportunities.
///
/// Matches pending opportunities with `profit_potential >= min_profit_potential`
/// and `investment_required <= max_investment`, best profit potential first,
/// ties broken by ROI estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpportunityCriteria {
    pub min_profit_potential: i16,
    pub max_investment: Decimal,
    pub limit: i64,
}

impl OpportunityCriteria {
    #[must_use]
    pub fn matches(&self, opportunity: &Opportunity) -> bool {
        opportunity.status == OpportunityStatus::Pending
            && opportunity.profit_potential >= self.min_profit_potential
            && opportunity.investment_required <= self.max_investment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_clamps_out_of_range_values() {
        let c = OpportunityCandidate::new(
            BusinessModel::SoftwareTool,
            42,
            -3,
            dec!(5000),
            300,
            MarketSize::Large,
            "crowded",
            "build it",
        );
        assert_eq!(c.profit_potential(), 10);
        assert_eq!(c.difficulty_score(), 1);
        assert_eq!(c.investment_required(), dec!(1000));
    }

    #[test]
    fn candidate_clamps_negative_investment_to_zero() {
        let c = OpportunityCandidate::new(
            BusinessModel::PrintOnDemand,
            5,
            3,
            dec!(-10),
            120,
            MarketSize::Small,
            "",
            "",
        );
        assert_eq!(c.investment_required(), Decimal::ZERO);
    }

    #[test]
    fn status_moves_forward_only() {
        use OpportunityStatus::{Implemented, Implementing, Pending};
        assert!(Pending.can_transition_to(Implementing));
        assert!(Pending.can_transition_to(Implemented));
        assert!(Implementing.can_transition_to(Implemented));
        assert!(!Implementing.can_transition_to(Pending));
        assert!(!Implemented.can_transition_to(Implementing));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn business_model_labels_round_trip_through_from_str() {
        for model in BusinessModel::ALL {
            assert_eq!(model.as_str().parse::<BusinessModel>().unwrap(), *model);
        }
    }

    #[test]
    fn business_model_accepts_every_glossary_label() {
        let labels = [
            "dropshipping",
            "digital_products",
            "print_on_demand",
            "affiliate_marketing",
            "service_arbitrage",
            "subscription_box",
            "online_course",
            "software_tool",
            "marketplace_seller",
        ];
        assert_eq!(BusinessModel::ALL.len(), labels.len());
        for label in labels {
            let model: BusinessModel = label.parse().unwrap();
            assert_eq!(model.as_str(), label);
        }
        assert!("saas_tool".parse::<BusinessModel>().is_err());
    }

    #[test]
    fn business_model_serializes_as_snake_case_label() {
        let json = serde_json::to_string(&BusinessModel::DigitalProducts).unwrap();
        assert_eq!(json, "\"digital_products\"");
    }
}
