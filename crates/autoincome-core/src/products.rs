use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

labelled_enum! {
    pub enum ProductStatus: "product status" {
        Active => "active",
        Inactive => "inactive",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub stream_id: i64,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub cost: Decimal,
    pub supplier: String,
    pub description: String,
    pub category: String,
    pub marketplace_url: Option<String>,
    pub sales_count: i32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

/// A drafted product ready to be inserted under a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub stream_id: i64,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub cost: Decimal,
    pub supplier: String,
    pub description: String,
    pub category: String,
}
