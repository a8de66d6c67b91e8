use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

labelled_enum! {
    /// How crowded the market around a trend looks.
    pub enum CompetitionLevel: "competition level" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl CompetitionLevel {
    /// Parses a competition label from an upstream feed.
    ///
    /// Feeds are inconsistent about casing and sometimes send nothing useful,
    /// so anything unrecognised is treated as `Low`.
    #[must_use]
    pub fn from_label_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// A persisted market trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub id: i64,
    pub keyword: String,
    pub platform: String,
    pub search_volume: i64,
    pub growth_rate: f64,
    pub competition_level: CompetitionLevel,
    pub sentiment_score: f64,
    pub analyzed: bool,
    pub scraped_at: DateTime<Utc>,
}

/// A trend observation as it arrives from a feed, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrend {
    pub keyword: String,
    pub platform: String,
    pub search_volume: i64,
    pub growth_rate: f64,
    pub competition_level: CompetitionLevel,
    pub sentiment_score: f64,
}

impl NewTrend {
    /// Trims the keyword, floors negative volume at zero and replaces
    /// non-finite signals with zero.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.keyword = self.keyword.trim().to_string();
        self.platform = self.platform.trim().to_string();
        self.search_volume = self.search_volume.max(0);
        if !self.growth_rate.is_finite() {
            self.growth_rate = 0.0;
        }
        if !self.sentiment_score.is_finite() {
            self.sentiment_score = 0.0;
        }
        self
    }

    /// Upsert identity: trends are unique per keyword and platform.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.keyword, &self.platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parse_ignores_case_and_whitespace() {
        assert_eq!(
            CompetitionLevel::from_label_lenient(" HIGH "),
            CompetitionLevel::High
        );
        assert_eq!(
            CompetitionLevel::from_label_lenient("Medium"),
            CompetitionLevel::Medium
        );
    }

    #[test]
    fn lenient_parse_defaults_to_low() {
        assert_eq!(
            CompetitionLevel::from_label_lenient("fierce"),
            CompetitionLevel::Low
        );
        assert_eq!(CompetitionLevel::from_label_lenient(""), CompetitionLevel::Low);
    }

    #[test]
    fn strict_parse_rejects_unknown_label() {
        let err = "extreme".parse::<CompetitionLevel>().unwrap_err();
        assert_eq!(err.kind, "competition level");
        assert_eq!(err.value, "extreme");
    }

    #[test]
    fn sanitized_clears_bad_signals() {
        let trend = NewTrend {
            keyword: "  desk lamp ".to_string(),
            platform: "google".to_string(),
            search_volume: -40,
            growth_rate: f64::NAN,
            competition_level: CompetitionLevel::Low,
            sentiment_score: f64::INFINITY,
        }
        .sanitized();

        assert_eq!(trend.keyword, "desk lamp");
        assert_eq!(trend.search_volume, 0);
        assert!(trend.growth_rate.abs() < f64::EPSILON);
        assert!(trend.sentiment_score.abs() < f64::EPSILON);
    }
}
