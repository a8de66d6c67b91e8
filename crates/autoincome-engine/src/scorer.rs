//! Heuristic opportunity scorer.
//!
//! Maps one trend onto zero or more business-model candidates by matching the
//! keyword against indicator lists and applying fixed formulas to the
//! normalised volume, growth and sentiment scores.

use autoincome_core::heuristics::{ScoringHeuristics, SignalRange};
use autoincome_core::{
    BusinessModel, CompetitionLevel, MarketSize, OpportunityCandidate, Trend,
};
use rust_decimal::Decimal;

/// Maps `value` from `range` onto the integer scale `1..=10`.
///
/// `round` is half-away-from-zero. Non-finite input maps to 1.
#[must_use]
pub fn normalize_score(value: f64, range: SignalRange) -> i64 {
    if !value.is_finite() {
        return 1;
    }
    let span = range.max - range.min;
    let scaled = ((value - range.min) / span * 9.0 + 1.0).round();
    #[allow(clippy::cast_possible_truncation)]
    let score = scaled.clamp(1.0, 10.0) as i64;
    score
}

/// The three normalised signals of one trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalScores {
    pub volume: i64,
    pub growth: i64,
    pub sentiment: i64,
}

#[derive(Debug, Clone)]
pub struct OpportunityScorer {
    heuristics: ScoringHeuristics,
}

impl OpportunityScorer {
    #[must_use]
    pub fn new(heuristics: ScoringHeuristics) -> Self {
        Self { heuristics }
    }

    #[must_use]
    pub fn heuristics(&self) -> &ScoringHeuristics {
        &self.heuristics
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn signal_scores(&self, trend: &Trend) -> SignalScores {
        let h = &self.heuristics;
        SignalScores {
            volume: normalize_score(trend.search_volume.max(0) as f64, h.volume_range),
            growth: normalize_score(trend.growth_rate, h.growth_range),
            sentiment: normalize_score(trend.sentiment_score, h.sentiment_range),
        }
    }

    #[must_use]
    pub fn market_size(&self, search_volume: i64) -> MarketSize {
        if search_volume < self.heuristics.medium_market_volume {
            MarketSize::Small
        } else if search_volume < self.heuristics.large_market_volume {
            MarketSize::Medium
        } else {
            MarketSize::Large
        }
    }

    /// Business models whose indicator lists match the keyword, in a fixed order.
    #[must_use]
    pub fn matching_models(&self, keyword: &str) -> Vec<BusinessModel> {
        let keyword = keyword.to_lowercase();
        let lists = &self.heuristics.indicators;
        [
            (BusinessModel::Dropshipping, &lists.physical),
            (BusinessModel::DigitalProducts, &lists.digital),
            (BusinessModel::PrintOnDemand, &lists.print_on_demand),
            (BusinessModel::ServiceArbitrage, &lists.service),
        ]
        .into_iter()
        .filter(|(_, words)| {
            words
                .iter()
                .any(|w| !w.is_empty() && keyword.contains(&w.to_lowercase()))
        })
        .map(|(model, _)| model)
        .collect()
    }

    /// Scores one trend. Candidates below the profit-potential threshold are dropped.
    #[must_use]
    pub fn score(&self, trend: &Trend) -> Vec<OpportunityCandidate> {
        let scores = self.signal_scores(trend);
        let market = self.market_size(trend.search_volume);

        self.matching_models(&trend.keyword)
            .into_iter()
            .filter_map(|model| self.candidate(model, trend, scores, market))
            .filter(|c| c.profit_potential() >= self.heuristics.min_profit_potential)
            .collect()
    }

    fn competition_multiplier(&self, level: CompetitionLevel) -> f64 {
        let m = &self.heuristics.competition;
        match level {
            CompetitionLevel::High => m.high,
            CompetitionLevel::Medium => m.medium,
            CompetitionLevel::Low => m.low,
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn candidate(
        &self,
        model: BusinessModel,
        trend: &Trend,
        s: SignalScores,
        market: MarketSize,
    ) -> Option<OpportunityCandidate> {
        let round = |x: f64| x.round() as i64;
        let roi = |base: i64, per_growth: i64| {
            i32::try_from(base + per_growth * s.growth).unwrap_or(i32::MAX)
        };
        let keyword = &trend.keyword;

        let candidate = match model {
            BusinessModel::Dropshipping => {
                let p = self.competition_multiplier(trend.competition_level);
                let difficulty = match trend.competition_level {
                    CompetitionLevel::High => 7,
                    CompetitionLevel::Medium => 5,
                    CompetitionLevel::Low => 3,
                };
                OpportunityCandidate::new(
                    model,
                    round((s.volume + s.growth) as f64 * p * 0.8),
                    difficulty,
                    Decimal::from(50 + 20 * s.volume),
                    roi(150, 50),
                    market,
                    format!(
                        "{} competition with {} search volume",
                        trend.competition_level, trend.search_volume
                    ),
                    format!(
                        "Start dropshipping {keyword} products on Facebook Marketplace. \
                         Focus on trending variations and bundle deals."
                    ),
                )
            }
            BusinessModel::DigitalProducts => OpportunityCandidate::new(
                model,
                round((s.sentiment + s.growth) as f64 * 0.9),
                4,
                Decimal::from(10 + 5 * s.volume),
                roi(200, 30),
                market,
                format!("Digital market with {} trending potential", trend.platform),
                format!(
                    "Create digital guides, templates, or courses about {keyword}. \
                     High profit margins with minimal investment."
                ),
            ),
            BusinessModel::PrintOnDemand => OpportunityCandidate::new(
                model,
                round((s.volume + s.sentiment) as f64 * 0.7),
                3,
                Decimal::ZERO,
                roi(120, 20),
                market,
                format!(
                    "Creative market opportunity with {} design competition",
                    trend.competition_level
                ),
                format!(
                    "Design {keyword} themed merchandise. Target trending hashtags and communities."
                ),
            ),
            BusinessModel::ServiceArbitrage => OpportunityCandidate::new(
                model,
                round((s.volume + s.growth) as f64 * 0.85),
                6,
                Decimal::from(100 + 10 * s.volume),
                roi(180, 40),
                market,
                "Service market with local and remote opportunities",
                format!(
                    "Offer {keyword} services by outsourcing to freelancers. \
                     Focus on quality and fast delivery."
                ),
            ),
            // Only reachable through the generative analyst.
            BusinessModel::AffiliateMarketing
            | BusinessModel::MarketplaceSeller
            | BusinessModel::SubscriptionBox
            | BusinessModel::OnlineCourse
            | BusinessModel::SoftwareTool => return None,
        };
        Some(candidate)
    }
}

impl Default for OpportunityScorer {
    fn default() -> Self {
        Self::new(ScoringHeuristics::default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;

    fn trend(keyword: &str, volume: i64, growth: f64, level: CompetitionLevel, sentiment: f64) -> Trend {
        Trend {
            id: 1,
            keyword: keyword.to_string(),
            platform: "google".to_string(),
            search_volume: volume,
            growth_rate: growth,
            competition_level: level,
            sentiment_score: sentiment,
            analyzed: false,
            scraped_at: Utc::now(),
        }
    }

    fn range(min: f64, max: f64) -> SignalRange {
        SignalRange { min, max }
    }

    #[test]
    fn normalize_score_endpoints() {
        assert_eq!(normalize_score(0.0, range(0.0, 10_000.0)), 1);
        assert_eq!(normalize_score(10_000.0, range(0.0, 10_000.0)), 10);
    }

    #[test]
    fn normalize_score_clamps_outside_range() {
        assert_eq!(normalize_score(-500.0, range(-50.0, 150.0)), 1);
        assert_eq!(normalize_score(90_000.0, range(0.0, 10_000.0)), 10);
    }

    #[test]
    fn normalize_score_non_finite_is_one() {
        assert_eq!(normalize_score(f64::NAN, range(0.0, 1.0)), 1);
        assert_eq!(normalize_score(f64::INFINITY, range(0.0, 1.0)), 1);
    }

    #[test]
    fn normalize_score_is_monotonic() {
        let r = range(-50.0, 150.0);
        let mut last = 0;
        for step in 0..=200 {
            let s = normalize_score(-50.0 + f64::from(step), r);
            assert!((1..=10).contains(&s));
            assert!(s >= last, "score dropped at step {step}");
            last = s;
        }
    }

    #[test]
    fn wireless_charging_stand_scores_as_dropshipping() {
        let scorer = OpportunityScorer::default();
        let t = trend("wireless charging stand", 4000, 80.0, CompetitionLevel::Medium, 3.0);

        assert_eq!(
            scorer.signal_scores(&t),
            SignalScores {
                volume: 5,
                growth: 7,
                sentiment: 6
            }
        );

        let candidates = scorer.score(&t);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.business_model, BusinessModel::Dropshipping);
        assert_eq!(c.profit_potential(), 8);
        assert_eq!(c.difficulty_score(), 5);
        assert_eq!(c.investment_required(), dec!(150));
        assert_eq!(c.roi_estimate, 500);
        assert_eq!(c.market_size, MarketSize::Medium);
        assert_eq!(c.competition_analysis, "medium competition with 4000 search volume");
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        let scorer = OpportunityScorer::default();
        assert_eq!(
            scorer.matching_models("Ultimate PLANNER Template"),
            vec![BusinessModel::DigitalProducts]
        );
    }

    #[test]
    fn keyword_can_match_several_models() {
        let scorer = OpportunityScorer::default();
        // "productivity hacks" -> digital (hack); "minimalist lifestyle" -> pod
        assert_eq!(
            scorer.matching_models("minimalist productivity hack"),
            vec![BusinessModel::DigitalProducts, BusinessModel::PrintOnDemand]
        );
    }

    #[test]
    fn no_indicator_yields_no_candidates() {
        let scorer = OpportunityScorer::default();
        let t = trend("blockchain gaming", 9000, 140.0, CompetitionLevel::Low, 9.0);
        assert!(scorer.score(&t).is_empty());
    }

    #[test]
    fn weak_signals_are_discarded() {
        let scorer = OpportunityScorer::default();
        // V=1, S=1 -> round(2 * 0.7) = 1 < 3
        let t = trend("vintage poster", 0, 0.0, CompetitionLevel::Low, -5.0);
        assert!(scorer.score(&t).is_empty());
    }

    #[test]
    fn print_on_demand_requires_no_investment() {
        let scorer = OpportunityScorer::default();
        let t = trend("motivation quote", 9000, 100.0, CompetitionLevel::High, 8.0);
        let candidates = scorer.score(&t);
        let pod = candidates
            .iter()
            .find(|c| c.business_model == BusinessModel::PrintOnDemand)
            .unwrap();
        assert_eq!(pod.investment_required(), Decimal::ZERO);
        assert_eq!(pod.difficulty_score(), 3);
        assert_eq!(pod.market_size, MarketSize::Large);
    }

    #[test]
    fn service_formula() {
        let scorer = OpportunityScorer::default();
        // V = round(5000/10000*9+1) = round(5.5) = 6, G = round(0.5*9+1) = round(5.5) = 6
        let t = trend("seo audit", 5000, 50.0, CompetitionLevel::Low, 0.0);
        let c = scorer.score(&t).into_iter().next().unwrap();
        assert_eq!(c.business_model, BusinessModel::ServiceArbitrage);
        assert_eq!(c.profit_potential(), 10);
        assert_eq!(c.difficulty_score(), 6);
        assert_eq!(c.investment_required(), dec!(160));
        assert_eq!(c.roi_estimate, 420);
    }

    #[test]
    fn market_size_thresholds() {
        let scorer = OpportunityScorer::default();
        assert_eq!(scorer.market_size(999), MarketSize::Small);
        assert_eq!(scorer.market_size(1000), MarketSize::Medium);
        assert_eq!(scorer.market_size(4999), MarketSize::Medium);
        assert_eq!(scorer.market_size(5000), MarketSize::Large);
    }
}
