//! Database operations for `trends`.

use autoincome_core::{CompetitionLevel, NewTrend, Trend};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{require_row, DbError};

/// A row from the `trends` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendRow {
    pub id: i64,
    pub keyword: String,
    pub platform: String,
    pub search_volume: i64,
    pub growth_rate: f64,
    pub competition_level: String,
    pub sentiment_score: f64,
    pub analyzed: bool,
    pub scraped_at: DateTime<Utc>,
}

impl TrendRow {
    /// # Errors
    ///
    /// Returns [`DbError::Label`] if `competition_level` holds an unknown label.
    pub fn into_trend(self) -> Result<Trend, DbError> {
        Ok(Trend {
            id: self.id,
            keyword: self.keyword,
            platform: self.platform,
            search_volume: self.search_volume,
            growth_rate: self.growth_rate,
            competition_level: self.competition_level.parse::<CompetitionLevel>()?,
            sentiment_score: self.sentiment_score,
            analyzed: self.analyzed,
            scraped_at: self.scraped_at,
        })
    }
}

const TREND_COLUMNS: &str = "id, keyword, platform, search_volume, growth_rate, \
     competition_level, sentiment_score, analyzed, scraped_at";

/// Insert a trend, or refresh the signals of the existing `(keyword, platform)`
/// row and put it back in the analysis queue. Returns the row id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure.
pub async fn upsert_trend(
    pool: &PgPool,
    trend: &NewTrend,
    now: DateTime<Utc>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO trends \
             (keyword, platform, search_volume, growth_rate, competition_level, \
              sentiment_score, analyzed, scraped_at) \
         VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7) \
         ON CONFLICT (keyword, platform) DO UPDATE SET \
             search_volume     = EXCLUDED.search_volume, \
             growth_rate       = EXCLUDED.growth_rate, \
             competition_level = EXCLUDED.competition_level, \
             sentiment_score   = EXCLUDED.sentiment_score, \
             analyzed          = FALSE, \
             scraped_at        = EXCLUDED.scraped_at \
         RETURNING id",
    )
    .bind(&trend.keyword)
    .bind(&trend.platform)
    .bind(trend.search_volume)
    .bind(trend.growth_rate)
    .bind(trend.competition_level.as_str())
    .bind(trend.sentiment_score)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Oldest unanalyzed trends first, at most `limit`.
///
/// # Errors
///
/// Returns [`DbError`] on database failure or an unreadable row.
pub async fn list_unanalyzed_trends(pool: &PgPool, limit: i64) -> Result<Vec<Trend>, DbError> {
    let rows = sqlx::query_as::<_, TrendRow>(&format!(
        "SELECT {TREND_COLUMNS} FROM trends \
         WHERE analyzed = FALSE \
         ORDER BY scraped_at, id \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(TrendRow::into_trend).collect()
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no trend has `trend_id`.
pub async fn mark_trend_analyzed(pool: &PgPool, trend_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE trends SET analyzed = TRUE WHERE id = $1")
        .bind(trend_id)
        .execute(pool)
        .await?;

    require_row(result.rows_affected(), "trend", trend_id)
}
