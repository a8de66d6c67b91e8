//! Trend feeds. The only shipped feed is synthetic: fixed keyword lists with
//! signal values drawn from the caller's random source.

use autoincome_core::{CompetitionLevel, NewTrend};
use rand::{Rng, RngCore};

/// A source of raw trend observations for one ingestion pass.
pub trait TrendFeed: Send + Sync {
    fn collect(&self, rng: &mut dyn RngCore) -> Vec<NewTrend>;
}

const SEARCH_KEYWORDS: &[&str] = &[
    "AI automation tools",
    "sustainable products",
    "remote work accessories",
    "health monitoring devices",
    "eco-friendly packaging",
    "digital wellness",
    "smart home integration",
    "personalized nutrition",
    "virtual fitness",
    "cryptocurrency tools",
    "NFT marketplace",
    "blockchain gaming",
];

/// Social keywords with a fixed engagement figure used as search volume.
const SOCIAL_TRENDS: &[(&str, &str, i64)] = &[
    ("minimalist lifestyle", "instagram", 15_000),
    ("productivity hacks", "tiktok", 25_000),
    ("sustainable fashion", "pinterest", 8_000),
    ("home organization", "youtube", 12_000),
    ("plant-based recipes", "instagram", 18_000),
    ("digital detox", "twitter", 6_000),
];

const ECOMMERCE_KEYWORDS: &[&str] = &[
    "wireless charging stations",
    "ergonomic desk accessories",
    "pet wellness products",
    "travel organization tools",
    "kitchen gadgets 2024",
    "fitness tracking devices",
    "outdoor adventure gear",
    "smart water bottles",
    "portable phone stands",
    "blue light glasses",
    "aromatherapy diffusers",
    "meal prep containers",
];

/// Competition tier implied by raw search volume.
#[must_use]
pub fn competition_for_volume(volume: i64) -> CompetitionLevel {
    if volume < 1_000 {
        CompetitionLevel::Low
    } else if volume < 5_000 {
        CompetitionLevel::Medium
    } else {
        CompetitionLevel::High
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticTrendFeed;

impl SyntheticTrendFeed {
    fn search(rng: &mut dyn RngCore) -> impl Iterator<Item = NewTrend> + '_ {
        SEARCH_KEYWORDS.iter().map(move |keyword| {
            let volume = rng.random_range(1_000..11_000);
            NewTrend {
                keyword: (*keyword).to_string(),
                platform: "google".to_string(),
                search_volume: volume,
                growth_rate: rng.random_range(-50.0..150.0),
                competition_level: competition_for_volume(volume),
                sentiment_score: rng.random_range(-5.0..5.0),
            }
        })
    }

    fn social(rng: &mut dyn RngCore) -> impl Iterator<Item = NewTrend> + '_ {
        SOCIAL_TRENDS
            .iter()
            .map(move |(keyword, platform, engagement)| NewTrend {
                keyword: (*keyword).to_string(),
                platform: (*platform).to_string(),
                search_volume: *engagement,
                growth_rate: rng.random_range(20.0..120.0),
                competition_level: competition_for_volume(*engagement),
                sentiment_score: rng.random_range(2.0..10.0),
            })
    }

    fn ecommerce(rng: &mut dyn RngCore) -> impl Iterator<Item = NewTrend> + '_ {
        ECOMMERCE_KEYWORDS.iter().map(move |keyword| {
            let tier = rng.random_range(0..CompetitionLevel::ALL.len());
            NewTrend {
                keyword: (*keyword).to_string(),
                platform: "ecommerce".to_string(),
                search_volume: rng.random_range(500..5_500),
                growth_rate: rng.random_range(10.0..90.0),
                competition_level: CompetitionLevel::ALL[tier],
                sentiment_score: rng.random_range(2.0..8.0),
            }
        })
    }
}

impl TrendFeed for SyntheticTrendFeed {
    fn collect(&self, rng: &mut dyn RngCore) -> Vec<NewTrend> {
        let mut trends: Vec<NewTrend> = Self::search(rng).collect();
        trends.extend(Self::social(rng));
        trends.extend(Self::ecommerce(rng));
        trends
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn competition_tiers() {
        assert_eq!(competition_for_volume(999), CompetitionLevel::Low);
        assert_eq!(competition_for_volume(1_000), CompetitionLevel::Medium);
        assert_eq!(competition_for_volume(4_999), CompetitionLevel::Medium);
        assert_eq!(competition_for_volume(5_000), CompetitionLevel::High);
    }

    #[test]
    fn collects_every_list() {
        let mut rng = StdRng::seed_from_u64(11);
        let trends = SyntheticTrendFeed.collect(&mut rng);
        assert_eq!(
            trends.len(),
            SEARCH_KEYWORDS.len() + SOCIAL_TRENDS.len() + ECOMMERCE_KEYWORDS.len()
        );
    }

    #[test]
    fn values_stay_in_source_ranges() {
        let mut rng = StdRng::seed_from_u64(5);
        for t in SyntheticTrendFeed.collect(&mut rng) {
            match t.platform.as_str() {
                "google" => {
                    assert!((1_000..11_000).contains(&t.search_volume));
                    assert!((-50.0..150.0).contains(&t.growth_rate));
                    assert_eq!(t.competition_level, competition_for_volume(t.search_volume));
                }
                "ecommerce" => {
                    assert!((500..5_500).contains(&t.search_volume));
                    assert!((2.0..8.0).contains(&t.sentiment_score));
                }
                _ => {
                    assert!((20.0..120.0).contains(&t.growth_rate));
                    assert!(t.sentiment_score >= 2.0);
                }
            }
        }
    }

    #[test]
    fn seeded_feeds_match() {
        let a = SyntheticTrendFeed.collect(&mut StdRng::seed_from_u64(9));
        let b = SyntheticTrendFeed.collect(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
