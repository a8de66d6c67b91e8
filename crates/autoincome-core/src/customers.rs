use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

labelled_enum! {
    /// Customer value tier, recomputed after every order.
    pub enum Segment: "segment" {
        New => "new",
        Regular => "regular",
        HighValue => "high_value",
        Vip => "vip",
        AtRisk => "at_risk",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub source: String,
    pub order_count: i32,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
    pub segment: Segment,
    /// Time of the customer's first order.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Order aggregates recomputed from the full order history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerMetrics {
    pub order_count: i32,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentChange {
    pub customer_id: i64,
    pub email: String,
    pub from: Segment,
    pub to: Segment,
    pub changed_at: DateTime<Utc>,
}
