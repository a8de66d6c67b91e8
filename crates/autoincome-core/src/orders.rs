use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

labelled_enum! {
    pub enum OrderStatus: "order status" {
        Pending => "pending",
        Completed => "completed",
        Cancelled => "cancelled",
        Refunded => "refunded",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub product_id: Option<i64>,
    pub stream_id: i64,
    pub amount: Decimal,
    pub quantity: i32,
    pub status: OrderStatus,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_id: i64,
    pub product_id: Option<i64>,
    pub stream_id: i64,
    pub amount: Decimal,
    pub quantity: i32,
    pub status: OrderStatus,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}
