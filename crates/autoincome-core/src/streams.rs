use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::opportunities::BusinessModel;

labelled_enum! {
    pub enum StreamStatus: "stream status" {
        Active => "active",
        Paused => "paused",
    }
}

/// A launched income stream and its latest computed metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStream {
    pub id: i64,
    pub opportunity_id: Option<i64>,
    pub name: String,
    pub platform: String,
    pub business_model: BusinessModel,
    pub initial_investment: Decimal,
    pub marketing_budget: Decimal,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit_margin: Decimal,
    pub roi: Decimal,
    pub products_count: i32,
    pub customers_count: i32,
    pub conversion_rate: Decimal,
    pub status: StreamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStream {
    pub opportunity_id: Option<i64>,
    pub name: String,
    pub platform: String,
    pub business_model: BusinessModel,
    pub initial_investment: Decimal,
}

/// Metric columns rewritten by each performance pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamMetrics {
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub profit_margin: Decimal,
    pub roi: Decimal,
    pub products_count: i32,
    pub customers_count: i32,
    pub conversion_rate: Decimal,
}
