//! Product drafting and price optimisation.

use autoincome_core::heuristics::PricingHeuristics;
use autoincome_core::{BusinessModel, NewProduct, Opportunity, Product};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Name variants by product index; later indices fall back to `"{k} Pro"`.
const NAME_VARIANTS: &[(&str, &str)] = &[
    ("Premium ", ""),
    ("Professional ", ""),
    ("Deluxe ", ""),
    ("Essential ", ""),
    ("Complete ", " Kit"),
];

/// Category keywords, checked in order against the product name.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("tech", &["gadget", "device", "charger", "cable", "stand"]),
    ("home", &["organizer", "container", "kit", "holder"]),
    ("health", &["wellness", "fitness", "monitor", "tracker"]),
    ("fashion", &["accessory", "style", "design"]),
    ("business", &["professional", "office", "productivity"]),
];

/// Rounds a money value to cents, half away from zero.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[must_use]
pub fn product_name(keyword: &str, index: usize) -> String {
    match NAME_VARIANTS.get(index) {
        Some((prefix, suffix)) => format!("{prefix}{keyword}{suffix}"),
        None => format!("{keyword} Pro"),
    }
}

#[must_use]
pub fn categorize(product_name: &str) -> &'static str {
    let name = product_name.to_lowercase();
    CATEGORIES
        .iter()
        .find(|(_, words)| words.iter().any(|w| name.contains(w)))
        .map_or("general", |(category, _)| *category)
}

#[must_use]
pub fn supplier(model: BusinessModel) -> &'static str {
    match model {
        BusinessModel::Dropshipping => "AliExpress",
        BusinessModel::DigitalProducts => "Self-Created",
        BusinessModel::PrintOnDemand => "Printful",
        BusinessModel::ServiceArbitrage => "Freelancer Network",
        BusinessModel::AffiliateMarketing
        | BusinessModel::MarketplaceSeller
        | BusinessModel::SubscriptionBox
        | BusinessModel::OnlineCourse
        | BusinessModel::SoftwareTool => "Various",
    }
}

fn hashtag(keyword: &str) -> String {
    keyword.split_whitespace().collect()
}

#[must_use]
pub fn description(product_name: &str, model: BusinessModel, keyword: &str) -> String {
    let tag = hashtag(keyword);
    match model {
        BusinessModel::DigitalProducts | BusinessModel::OnlineCourse => format!(
            "INSTANT DOWNLOAD: {product_name}\n\
             A complete guide to {keyword} with step-by-step instructions and lifetime updates.\n\
             Delivered digitally, money-back guarantee.\n\
             #DigitalGuide #{tag}"
        ),
        BusinessModel::PrintOnDemand => format!(
            "CUSTOM DESIGN: {product_name}\n\
             Unique {keyword} themed design on premium materials, made to order.\n\
             Multiple sizes available.\n\
             #CustomDesign #{tag}"
        ),
        BusinessModel::ServiceArbitrage => format!(
            "PROFESSIONAL SERVICE: {product_name}\n\
             Expert {keyword} services with fast turnaround and dedicated support.\n\
             #ProfessionalService #{tag}"
        ),
        BusinessModel::Dropshipping
        | BusinessModel::AffiliateMarketing
        | BusinessModel::MarketplaceSeller
        | BusinessModel::SubscriptionBox
        | BusinessModel::SoftwareTool => format!(
            "TRENDING NOW: {product_name}\n\
             High quality and fast shipping, perfect for {keyword} enthusiasts.\n\
             Message us for bulk discounts.\n\
             #TrendingNow #{tag}"
        ),
    }
}

/// Price and cost for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub price: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone)]
pub struct PricingEngine {
    heuristics: PricingHeuristics,
}

impl PricingEngine {
    #[must_use]
    pub fn new(heuristics: PricingHeuristics) -> Self {
        Self { heuristics }
    }

    /// `price = min + (max - min) * profit_potential / 10`, cost from the
    /// model's multiplier. Both rounded to cents.
    #[must_use]
    pub fn quote(&self, model: BusinessModel, profit_potential: i16) -> Quote {
        let range = self.heuristics.price_range(model);
        let share = Decimal::from(profit_potential) / Decimal::TEN;
        let price = round_money(range.min + (range.max - range.min) * share);
        let cost = round_money(price * self.heuristics.cost_multiplier(model));
        Quote { price, cost }
    }

    /// `min(max_products, floor(budget / budget_per_product) + 1)`; a negative
    /// budget still yields one product.
    #[must_use]
    pub fn product_count(&self, budget: Decimal) -> usize {
        let per = (budget.max(Decimal::ZERO) / self.heuristics.budget_per_product).floor();
        let funded = per.to_usize().unwrap_or(usize::MAX);
        funded
            .saturating_add(1)
            .min(self.heuristics.max_products_per_stream)
    }

    #[must_use]
    pub fn draft_product(
        &self,
        opportunity: &Opportunity,
        stream_id: i64,
        index: usize,
        sku: String,
    ) -> NewProduct {
        let name = product_name(&opportunity.keyword, index);
        let quote = self.quote(opportunity.business_model, opportunity.profit_potential);
        NewProduct {
            stream_id,
            sku,
            price: quote.price,
            cost: quote.cost,
            supplier: supplier(opportunity.business_model).to_string(),
            description: description(&name, opportunity.business_model, &opportunity.keyword),
            category: categorize(&name).to_string(),
            name,
        }
    }

    /// Lowest price the optimiser will leave a product at.
    #[must_use]
    pub fn price_floor(&self, cost: Decimal) -> Decimal {
        round_money(cost * self.heuristics.markup_floor)
    }

    /// New price for `product`, or `None` when the change is too small to write.
    ///
    /// A product already below its floor is always moved up to the floor.
    #[must_use]
    pub fn optimized_price(&self, product: &Product, now: DateTime<Utc>) -> Option<Decimal> {
        let h = &self.heuristics;
        let days_listed = (now - product.created_at).num_days().max(0);

        let multiplier = if product.sales_count > h.raise_min_sales && days_listed > h.raise_after_days {
            h.raise_multiplier
        } else if product.sales_count == 0 && days_listed > h.lower_after_days {
            h.lower_multiplier
        } else {
            Decimal::ONE
        };

        let floor = self.price_floor(product.cost);
        if product.price < floor {
            return Some(floor);
        }

        let candidate = round_money((product.price * multiplier).max(floor));
        let delta = (candidate - product.price).abs();
        (delta > product.price * h.change_threshold).then_some(candidate)
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingHeuristics::default())
    }
}
