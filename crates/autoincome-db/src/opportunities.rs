//! Database operations for `opportunities`.
//!
//! Status changes are enforced in SQL: the UPDATE only matches rows whose
//! current status may legally move to the requested one, so two concurrent
//! launches cannot both claim the same opportunity.

use autoincome_core::{
    Opportunity, OpportunityCandidate, OpportunityCriteria, OpportunityStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// An `opportunities` row joined with its trend keyword.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OpportunityRow {
    pub id: i64,
    pub trend_id: i64,
    pub keyword: String,
    pub business_model: String,
    pub profit_potential: i16,
    pub difficulty_score: i16,
    pub investment_required: Decimal,
    pub roi_estimate: i32,
    pub market_size: String,
    pub competition_analysis: String,
    pub recommendation: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl OpportunityRow {
    /// # Errors
    ///
    /// Returns [`DbError::Label`] if a label column holds an unknown value.
    pub fn into_opportunity(self) -> Result<Opportunity, DbError> {
        Ok(Opportunity {
            id: self.id,
            trend_id: self.trend_id,
            keyword: self.keyword,
            business_model: self.business_model.parse()?,
            profit_potential: self.profit_potential,
            difficulty_score: self.difficulty_score,
            investment_required: self.investment_required,
            roi_estimate: self.roi_estimate,
            market_size: self.market_size.parse()?,
            competition_analysis: self.competition_analysis,
            recommendation: self.recommendation,
            status: self.status.parse()?,
            created_at: self.created_at,
        })
    }
}

const OPPORTUNITY_SELECT: &str = "SELECT o.id, o.trend_id, t.keyword, o.business_model, \
     o.profit_potential, o.difficulty_score, o.investment_required, o.roi_estimate, \
     o.market_size, o.competition_analysis, o.recommendation, o.status, o.created_at \
     FROM opportunities o JOIN trends t ON t.id = o.trend_id";

/// Persist a candidate as a `pending` opportunity and return its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on database failure, including a missing trend.
pub async fn insert_opportunity(
    pool: &PgPool,
    trend_id: i64,
    candidate: &OpportunityCandidate,
    now: DateTime<Utc>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO opportunities \
             (trend_id, business_model, profit_potential, difficulty_score, \
              investment_required, roi_estimate, market_size, competition_analysis, \
              recommendation, status, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10) \
         RETURNING id",
    )
    .bind(trend_id)
    .bind(candidate.business_model.as_str())
    .bind(candidate.profit_potential())
    .bind(candidate.difficulty_score())
    .bind(candidate.investment_required())
    .bind(candidate.roi_estimate)
    .bind(candidate.market_size.as_str())
    .bind(&candidate.competition_analysis)
    .bind(&candidate.recommendation)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no opportunity has `id`.
pub async fn get_opportunity(pool: &PgPool, id: i64) -> Result<Opportunity, DbError> {
    sqlx::query_as::<_, OpportunityRow>(&format!("{OPPORTUNITY_SELECT} WHERE o.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound {
            entity: "opportunity",
            id,
        })?
        .into_opportunity()
}

/// Pending opportunities matching `criteria`, highest profit potential first
/// and then highest ROI estimate.
///
/// # Errors
///
/// Returns [`DbError`] on database failure or an unreadable row.
pub async fn list_pending_opportunities(
    pool: &PgPool,
    criteria: &OpportunityCriteria,
) -> Result<Vec<Opportunity>, DbError> {
    let rows = sqlx::query_as::<_, OpportunityRow>(&format!(
        "{OPPORTUNITY_SELECT} \
         WHERE o.status = 'pending' \
           AND o.profit_potential >= $1 \
           AND o.investment_required <= $2 \
         ORDER BY o.profit_potential DESC, o.roi_estimate DESC, o.id \
         LIMIT $3"
    ))
    .bind(criteria.min_profit_potential)
    .bind(criteria.max_investment)
    .bind(criteria.limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(OpportunityRow::into_opportunity).collect()
}

/// Outcome of a guarded status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    Applied,
    /// The row exists but its current status cannot move to the target.
    Rejected(OpportunityStatus),
}

/// Move an opportunity to `status` if its current status allows it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no opportunity has `id`.
pub async fn set_opportunity_status(
    pool: &PgPool,
    id: i64,
    status: OpportunityStatus,
) -> Result<TransitionResult, DbError> {
    let allowed_from: Vec<&str> = OpportunityStatus::ALL
        .iter()
        .filter(|from| from.can_transition_to(status))
        .map(|from| from.as_str())
        .collect();

    let updated = sqlx::query_scalar::<_, i64>(
        "UPDATE opportunities SET status = $2 \
         WHERE id = $1 AND status = ANY($3) \
         RETURNING id",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(allowed_from)
    .fetch_optional(pool)
    .await?;

    if updated.is_some() {
        return Ok(TransitionResult::Applied);
    }

    let current = sqlx::query_scalar::<_, String>("SELECT status FROM opportunities WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound {
            entity: "opportunity",
            id,
        })?;

    Ok(TransitionResult::Rejected(current.parse()?))
}
