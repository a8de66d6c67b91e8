use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

labelled_enum! {
    /// Where a slice of reinvested profit goes.
    pub enum Strategy: "reinvestment strategy" {
        ScaleExistingStreams => "scale_existing_streams",
        CreateNewStreams => "create_new_streams",
        IncreaseMarketingBudget => "increase_marketing_budget",
        ExpandToNewPlatforms => "expand_to_new_platforms",
        ImproveProductQuality => "improve_product_quality",
        /// Recognised label, never produced by the planner and never executed.
        AutomateOperations => "automate_operations",
    }
}

labelled_enum! {
    pub enum Priority: "priority" {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl Priority {
    /// Sort key: lower ranks come first.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub strategy: Strategy,
    pub stream_id: Option<i64>,
    pub stream_name: Option<String>,
    pub opportunity_id: Option<i64>,
    pub amount: Decimal,
    pub expected_roi: Decimal,
    pub description: String,
    pub priority: Priority,
}

/// Append-only record of an executed recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReinvestmentLog {
    pub strategy: Strategy,
    pub stream_id: Option<i64>,
    pub opportunity_id: Option<i64>,
    pub amount: Decimal,
    pub expected_roi: Decimal,
    pub description: String,
    pub executed_at: DateTime<Utc>,
}

impl ReinvestmentLog {
    #[must_use]
    pub fn executed(rec: &Recommendation, executed_at: DateTime<Utc>) -> Self {
        Self {
            strategy: rec.strategy,
            stream_id: rec.stream_id,
            opportunity_id: rec.opportunity_id,
            amount: rec.amount,
            expected_roi: rec.expected_roi,
            description: rec.description.clone(),
            executed_at,
        }
    }
}
