//! Tunable tables behind every scoring and decision formula.
//!
//! [`Heuristics::default`] carries the built-in values. An optional YAML file
//! can override any subset of them; omitted fields keep their defaults, but a
//! map that is present replaces the default map wholesale.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::opportunities::BusinessModel;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    pub scoring: ScoringHeuristics,
    pub pricing: PricingHeuristics,
    pub performance: PerformanceHeuristics,
    pub segmentation: SegmentationHeuristics,
    pub reinvestment: ReinvestmentHeuristics,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Inclusive raw-signal range mapped onto the 1..=10 score scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionMultipliers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for CompetitionMultipliers {
    fn default() -> Self {
        Self {
            low: 1.0,
            medium: 0.85,
            high: 0.7,
        }
    }
}

/// Keyword fragments that route a trend to a business model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorLists {
    pub physical: Vec<String>,
    pub digital: Vec<String>,
    pub print_on_demand: Vec<String>,
    pub service: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

impl Default for IndicatorLists {
    fn default() -> Self {
        Self {
            physical: words(&[
                "gadget",
                "tool",
                "device",
                "accessory",
                "equipment",
                "gear",
                "bottle",
                "stand",
                "holder",
                "organizer",
                "container",
                "kit",
                "charger",
                "cable",
                "case",
                "cover",
                "mount",
                "adapter",
            ]),
            digital: words(&[
                "guide",
                "course",
                "tutorial",
                "template",
                "planner",
                "tracker",
                "hack",
                "tip",
                "strategy",
                "method",
                "system",
                "blueprint",
                "checklist",
                "worksheet",
                "ebook",
                "pdf",
            ]),
            print_on_demand: words(&[
                "lifestyle",
                "motivation",
                "quote",
                "design",
                "art",
                "style",
                "fashion",
                "trend",
                "aesthetic",
                "vintage",
                "minimalist",
            ]),
            service: words(&[
                "consulting",
                "coaching",
                "training",
                "setup",
                "installation",
                "optimization",
                "management",
                "analysis",
                "audit",
                "review",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringHeuristics {
    pub volume_range: SignalRange,
    pub growth_range: SignalRange,
    pub sentiment_range: SignalRange,
    pub competition: CompetitionMultipliers,
    pub indicators: IndicatorLists,
    /// Candidates scoring below this profit potential are discarded.
    pub min_profit_potential: i16,
    /// Raw search volume at which the market counts as medium.
    pub medium_market_volume: i64,
    /// Raw search volume at which the market counts as large.
    pub large_market_volume: i64,
}

impl Default for ScoringHeuristics {
    fn default() -> Self {
        Self {
            volume_range: SignalRange {
                min: 0.0,
                max: 10_000.0,
            },
            growth_range: SignalRange {
                min: -50.0,
                max: 150.0,
            },
            sentiment_range: SignalRange {
                min: -5.0,
                max: 10.0,
            },
            competition: CompetitionMultipliers::default(),
            indicators: IndicatorLists::default(),
            min_profit_potential: 3,
            medium_market_volume: 1_000,
            large_market_volume: 5_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingHeuristics {
    pub price_ranges: BTreeMap<BusinessModel, PriceRange>,
    pub default_price_range: PriceRange,
    pub cost_multipliers: BTreeMap<BusinessModel, Decimal>,
    pub default_cost_multiplier: Decimal,
    /// Price never drops below `cost * markup_floor` after optimization.
    pub markup_floor: Decimal,
    pub raise_multiplier: Decimal,
    /// A product needs strictly more sales than this to earn a raise.
    pub raise_min_sales: i32,
    pub raise_after_days: i64,
    pub lower_multiplier: Decimal,
    pub lower_after_days: i64,
    /// Relative change a new price must exceed before it is written.
    pub change_threshold: Decimal,
    pub max_products_per_stream: usize,
    /// Budget that funds one additional product at launch.
    pub budget_per_product: Decimal,
}

impl Default for PricingHeuristics {
    fn default() -> Self {
        let range = |min, max| PriceRange { min, max };
        Self {
            price_ranges: BTreeMap::from([
                (BusinessModel::Dropshipping, range(dec!(15), dec!(75))),
                (BusinessModel::DigitalProducts, range(dec!(9), dec!(49))),
                (BusinessModel::PrintOnDemand, range(dec!(12), dec!(35))),
                (BusinessModel::ServiceArbitrage, range(dec!(25), dec!(150))),
            ]),
            default_price_range: range(dec!(20), dec!(60)),
            cost_multipliers: BTreeMap::from([
                (BusinessModel::Dropshipping, dec!(0.4)),
                (BusinessModel::DigitalProducts, dec!(0.1)),
                (BusinessModel::PrintOnDemand, dec!(0.3)),
                (BusinessModel::ServiceArbitrage, dec!(0.5)),
            ]),
            default_cost_multiplier: dec!(0.4),
            markup_floor: dec!(1.5),
            raise_multiplier: dec!(1.1),
            raise_min_sales: 5,
            raise_after_days: 7,
            lower_multiplier: dec!(0.9),
            lower_after_days: 14,
            change_threshold: dec!(0.05),
            max_products_per_stream: 5,
            budget_per_product: dec!(20),
        }
    }
}

impl PricingHeuristics {
    #[must_use]
    pub fn price_range(&self, model: BusinessModel) -> PriceRange {
        self.price_ranges
            .get(&model)
            .copied()
            .unwrap_or(self.default_price_range)
    }

    #[must_use]
    pub fn cost_multiplier(&self, model: BusinessModel) -> Decimal {
        self.cost_multipliers
            .get(&model)
            .copied()
            .unwrap_or(self.default_cost_multiplier)
    }
}

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceHeuristics {
    pub platform_fee_rate: Decimal,
    pub new_stream_marketing_rate: Decimal,
    pub mature_marketing_rate: Decimal,
    /// Streams younger than this many days use the new-stream marketing rate.
    pub new_stream_days: i64,
    pub daily_operational_cost: Decimal,
    pub growth_window_days: i64,
    /// Simulated conversion rate is drawn uniformly from `[min, max)` percent.
    pub conversion_rate_min: Decimal,
    pub conversion_rate_max: Decimal,
}

impl Default for PerformanceHeuristics {
    fn default() -> Self {
        Self {
            platform_fee_rate: dec!(0.04),
            new_stream_marketing_rate: dec!(0.15),
            mature_marketing_rate: dec!(0.08),
            new_stream_days: 30,
            daily_operational_cost: dec!(2),
            growth_window_days: 7,
            conversion_rate_min: dec!(1),
            conversion_rate_max: dec!(6),
        }
    }
}

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendTier {
    pub min_spent: Decimal,
    pub min_orders: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationHeuristics {
    pub vip: SpendTier,
    pub high_value: SpendTier,
    pub new_customer_days: i64,
    pub at_risk_days: i64,
    pub at_risk_min_orders: i32,
}

impl Default for SegmentationHeuristics {
    fn default() -> Self {
        Self {
            vip: SpendTier {
                min_spent: dec!(200),
                min_orders: 5,
            },
            high_value: SpendTier {
                min_spent: dec!(100),
                min_orders: 3,
            },
            new_customer_days: 7,
            at_risk_days: 30,
            at_risk_min_orders: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Reinvestment
// ---------------------------------------------------------------------------

/// One step of the sequential allocation: `min(share * remaining, cap)`,
/// taken only while `remaining > min_remaining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStep {
    pub share: Decimal,
    pub cap: Decimal,
    pub min_remaining: Decimal,
}

const fn step(share: Decimal, cap: Decimal, min_remaining: Decimal) -> AllocationStep {
    AllocationStep {
        share,
        cap,
        min_remaining,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinvestmentHeuristics {
    pub minimum_profit: Decimal,
    pub reinvestment_share: Decimal,
    pub emergency_reserve_share: Decimal,
    pub top_performer_min_roi: Decimal,
    pub underperformer_max_roi: Decimal,
    /// Total profit above which expansion to new platforms is considered.
    pub expansion_profit_threshold: Decimal,
    pub scale: AllocationStep,
    pub new_stream: AllocationStep,
    pub marketing: AllocationStep,
    pub expansion: AllocationStep,
    pub improvement: AllocationStep,
    pub scale_roi_factor: Decimal,
    pub marketing_expected_roi: Decimal,
    pub expansion_expected_roi: Decimal,
    pub improvement_expected_roi: Decimal,
    pub candidate_min_profit_potential: i16,
    pub candidate_max_investment: Decimal,
}

impl Default for ReinvestmentHeuristics {
    fn default() -> Self {
        Self {
            minimum_profit: dec!(50),
            reinvestment_share: dec!(0.7),
            emergency_reserve_share: dec!(0.1),
            top_performer_min_roi: dec!(50),
            underperformer_max_roi: dec!(20),
            expansion_profit_threshold: dec!(500),
            scale: step(dec!(0.4), dec!(300), dec!(100)),
            new_stream: step(dec!(0.3), dec!(200), dec!(150)),
            marketing: step(dec!(0.5), dec!(150), dec!(50)),
            expansion: step(dec!(1), dec!(200), dec!(100)),
            improvement: step(dec!(1), dec!(100), dec!(30)),
            scale_roi_factor: dec!(0.8),
            marketing_expected_roi: dec!(200),
            expansion_expected_roi: dec!(150),
            improvement_expected_roi: dec!(100),
            candidate_min_profit_potential: 7,
            candidate_max_investment: dec!(200),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl Heuristics {
    /// Parses a YAML override document and validates the merged result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HeuristicsParse`] for malformed YAML and
    /// [`ConfigError::Validation`] when a value is out of range.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let heuristics: Self = serde_yaml::from_str(raw)?;
        heuristics.validate()?;
        Ok(heuristics)
    }

    /// Checks ordering of ranges, rates in `[0, 1]` and positive thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scoring;
        for (name, range) in [
            ("scoring.volume_range", s.volume_range),
            ("scoring.growth_range", s.growth_range),
            ("scoring.sentiment_range", s.sentiment_range),
        ] {
            if !(range.min.is_finite() && range.max.is_finite() && range.max > range.min) {
                return Err(invalid(format!("{name}: max must exceed min")));
            }
        }
        for (name, m) in [
            ("scoring.competition.low", s.competition.low),
            ("scoring.competition.medium", s.competition.medium),
            ("scoring.competition.high", s.competition.high),
        ] {
            if !(m.is_finite() && m > 0.0) {
                return Err(invalid(format!("{name}: must be positive")));
            }
        }
        if !(1..=10).contains(&s.min_profit_potential) {
            return Err(invalid("scoring.min_profit_potential: must be within 1..=10"));
        }
        if s.medium_market_volume <= 0 || s.large_market_volume <= s.medium_market_volume {
            return Err(invalid(
                "scoring market volumes: large must exceed medium, both positive",
            ));
        }

        let p = &self.pricing;
        let ranges = p
            .price_ranges
            .iter()
            .map(|(m, r)| (m.as_str(), *r))
            .chain(std::iter::once(("default", p.default_price_range)));
        for (name, range) in ranges {
            if range.min < Decimal::ZERO || range.max < range.min {
                return Err(invalid(format!(
                    "pricing price range {name}: need 0 <= min <= max"
                )));
            }
        }
        let multipliers = p
            .cost_multipliers
            .iter()
            .map(|(m, v)| (m.as_str(), *v))
            .chain(std::iter::once(("default", p.default_cost_multiplier)));
        for (name, value) in multipliers {
            check_rate(&format!("pricing cost multiplier {name}"), value)?;
        }
        if p.markup_floor < Decimal::ONE {
            return Err(invalid("pricing.markup_floor: must be at least 1"));
        }
        if p.raise_multiplier <= Decimal::ZERO || p.lower_multiplier <= Decimal::ZERO {
            return Err(invalid("pricing multipliers: must be positive"));
        }
        check_rate("pricing.change_threshold", p.change_threshold)?;
        if p.max_products_per_stream == 0 || p.budget_per_product <= Decimal::ZERO {
            return Err(invalid(
                "pricing product batch: max products and budget per product must be positive",
            ));
        }

        let perf = &self.performance;
        check_rate("performance.platform_fee_rate", perf.platform_fee_rate)?;
        check_rate(
            "performance.new_stream_marketing_rate",
            perf.new_stream_marketing_rate,
        )?;
        check_rate("performance.mature_marketing_rate", perf.mature_marketing_rate)?;
        if perf.new_stream_days <= 0 || perf.growth_window_days <= 0 {
            return Err(invalid("performance day thresholds: must be positive"));
        }
        if perf.daily_operational_cost < Decimal::ZERO {
            return Err(invalid("performance.daily_operational_cost: must not be negative"));
        }
        if perf.conversion_rate_min < Decimal::ZERO
            || perf.conversion_rate_max <= perf.conversion_rate_min
        {
            return Err(invalid("performance conversion range: max must exceed min"));
        }

        let seg = &self.segmentation;
        if seg.vip.min_spent < seg.high_value.min_spent || seg.vip.min_orders < seg.high_value.min_orders
        {
            return Err(invalid("segmentation: vip tier must not be below high_value"));
        }
        if seg.new_customer_days <= 0 || seg.at_risk_days <= 0 || seg.at_risk_min_orders <= 0 {
            return Err(invalid("segmentation thresholds: must be positive"));
        }

        let r = &self.reinvestment;
        if r.minimum_profit <= Decimal::ZERO {
            return Err(invalid("reinvestment.minimum_profit: must be positive"));
        }
        check_rate("reinvestment.reinvestment_share", r.reinvestment_share)?;
        check_rate("reinvestment.emergency_reserve_share", r.emergency_reserve_share)?;
        if r.reinvestment_share + r.emergency_reserve_share > Decimal::ONE {
            return Err(invalid(
                "reinvestment shares: reinvestment plus reserve must not exceed 1",
            ));
        }
        for (name, s) in [
            ("reinvestment.scale", r.scale),
            ("reinvestment.new_stream", r.new_stream),
            ("reinvestment.marketing", r.marketing),
            ("reinvestment.expansion", r.expansion),
            ("reinvestment.improvement", r.improvement),
        ] {
            check_rate(&format!("{name}.share"), s.share)?;
            if s.cap <= Decimal::ZERO || s.min_remaining < Decimal::ZERO {
                return Err(invalid(format!(
                    "{name}: cap must be positive and min_remaining non-negative"
                )));
            }
        }
        if !(1..=10).contains(&r.candidate_min_profit_potential) {
            return Err(invalid(
                "reinvestment.candidate_min_profit_potential: must be within 1..=10",
            ));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation(message.into())
}

fn check_rate(name: &str, value: Decimal) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(invalid(format!("{name}: must be within [0, 1]")));
    }
    Ok(())
}

/// Loads heuristics from `path`, or the built-in defaults when `path` is `None`.
///
/// # Errors
///
/// Returns [`ConfigError::HeuristicsFileIo`] if the file cannot be read, or
/// the errors of [`Heuristics::from_yaml_str`].
pub fn load_heuristics(path: Option<&Path>) -> Result<Heuristics, ConfigError> {
    let Some(path) = path else {
        return Ok(Heuristics::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::HeuristicsFileIo {
        path: path.to_path_buf(),
        source,
    })?;
    Heuristics::from_yaml_str(&raw)
}

#[cfg(test)]
#[path = "heuristics_test.rs"]
mod tests;
