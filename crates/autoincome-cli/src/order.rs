//! Manual order intake.

use autoincome_core::OrderStatus;
use autoincome_engine::{OrderIntake, Pipeline};
use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Debug, Args)]
pub struct OrderArgs {
    /// Buyer email; matched case-insensitively against existing customers
    #[arg(long)]
    pub email: String,
    /// Stream the sale belongs to
    #[arg(long)]
    pub stream_id: i64,
    /// Order total
    #[arg(long)]
    pub amount: Decimal,
    #[arg(long)]
    pub product_id: Option<i64>,
    #[arg(long, default_value_t = 1)]
    pub quantity: i32,
    /// pending, completed, cancelled or refunded
    #[arg(long, default_value = "completed")]
    pub status: OrderStatus,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// Acquisition channel recorded on a new customer
    #[arg(long, default_value = "direct")]
    pub source: String,
    #[arg(long, default_value = "facebook_marketplace")]
    pub platform: String,
}

impl OrderArgs {
    fn intake(&self) -> OrderIntake {
        OrderIntake {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            source: self.source.clone(),
            stream_id: self.stream_id,
            product_id: self.product_id,
            amount: self.amount,
            quantity: self.quantity,
            status: self.status,
            platform: self.platform.clone(),
        }
    }
}

/// Record one order and print the resulting order number and segment.
///
/// # Errors
///
/// Returns an error if the stream, product or customer write fails.
pub(crate) async fn run_order(pipeline: &Pipeline, args: &OrderArgs) -> anyhow::Result<()> {
    if args.quantity < 1 {
        anyhow::bail!("--quantity must be at least 1");
    }
    if args.amount < Decimal::ZERO {
        anyhow::bail!("--amount must not be negative");
    }

    let recorded = pipeline.record_order(&args.intake(), Utc::now()).await?;
    println!(
        "recorded order {} (id {}) for customer {}; segment is now {}",
        recorded.order_number, recorded.order_id, recorded.customer_id, recorded.segment
    );
    Ok(())
}
