//! Generative opportunity analysis over an OpenAI-compatible chat API.
//!
//! The analyst is optional. Callers treat any [`EngineError`] from
//! [`GenerativeAnalyst::propose`] as a signal to fall back to the heuristic
//! scorer.

use std::time::Duration;

use async_trait::async_trait;
use autoincome_core::{AnalystSettings, BusinessModel, MarketSize, OpportunityCandidate, Trend};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::pricing::round_money;
use crate::retry::retry_with_backoff;

const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1000;

#[async_trait]
pub trait GenerativeAnalyst: Send + Sync {
    /// Proposes scored opportunities for one trend.
    ///
    /// # Errors
    ///
    /// Any transport, protocol or validation failure.
    async fn propose(&self, trend: &Trend) -> Result<Vec<OpportunityCandidate>, EngineError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// One proposal as the model writes it. Numeric fields stay optional so a
/// missing value is reported as a validation error, not a parse panic.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProposal {
    business_model: String,
    profit_potential: Option<f64>,
    difficulty_score: Option<f64>,
    investment_required: Option<f64>,
    roi_estimate: Option<f64>,
    #[serde(default)]
    market_size: String,
    #[serde(default)]
    competition_analysis: String,
    #[serde(default, alias = "recommendation")]
    ai_recommendation: String,
}

/// Client for `POST {base_url}/chat/completions`.
pub struct OpenAiAnalyst {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl OpenAiAnalyst {
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: &AnalystSettings) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("autoincome/0.1")
            .build()?;
        Ok(Self {
            client,
            url: format!(
                "{}/chat/completions",
                settings.base_url.trim_end_matches('/')
            ),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            max_retries: settings.max_retries,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry back-off base; tests use zero.
    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    async fn complete_once(&self, prompt: &str) -> Result<String, EngineError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::AnalystStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EngineError::Analyst("response has no message content".to_string()))
    }
}

#[async_trait]
impl GenerativeAnalyst for OpenAiAnalyst {
    async fn propose(&self, trend: &Trend) -> Result<Vec<OpportunityCandidate>, EngineError> {
        let prompt = build_prompt(trend);
        let content = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.complete_once(&prompt)
        })
        .await?;
        parse_proposals(&content)
    }
}

#[must_use]
pub fn build_prompt(trend: &Trend) -> String {
    format!(
        r#"Analyze this trending topic for business opportunities:

Keyword: {keyword}
Platform: {platform}
Search Volume: {volume}
Growth Rate: {growth}%
Competition: {competition}
Sentiment: {sentiment}

Generate 2-3 specific business opportunities. For each opportunity, provide:
1. Business model (one of: {models})
2. Profit potential (1-10 scale)
3. Difficulty score (1-10, where 1 is easiest)
4. Investment required ($0-$1000)
5. ROI estimate (percentage)
6. Market size (small/medium/large)
7. Competition analysis (brief)
8. Specific recommendation

Format as JSON array with these exact fields:
[{{
  "businessModel": "",
  "profitPotential": 0,
  "difficultyScore": 0,
  "investmentRequired": 0,
  "roiEstimate": 0,
  "marketSize": "",
  "competitionAnalysis": "",
  "aiRecommendation": ""
}}]
"#,
        keyword = trend.keyword,
        platform = trend.platform,
        volume = trend.search_volume,
        growth = trend.growth_rate,
        competition = trend.competition_level,
        sentiment = trend.sentiment_score,
        models = BusinessModel::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Removes a surrounding Markdown code fence, with or without a language tag.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i64(value: f64) -> i64 {
    // `as` saturates for out-of-range floats
    value.round() as i64
}

fn require(value: Option<f64>, field: &str, index: usize) -> Result<f64, EngineError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(EngineError::Analyst(format!(
            "proposal {index}: missing numeric field '{field}'"
        ))),
    }
}

/// Parses and validates the model's reply into clamped candidates.
///
/// The whole reply is rejected if any proposal names an unknown business
/// model or lacks a numeric field. An empty array is a valid answer.
///
/// # Errors
///
/// [`EngineError::Json`] for malformed JSON, [`EngineError::Analyst`] for
/// failed validation.
pub fn parse_proposals(content: &str) -> Result<Vec<OpportunityCandidate>, EngineError> {
    let raw: Vec<RawProposal> = serde_json::from_str(strip_code_fence(content))?;

    raw.into_iter()
        .enumerate()
        .map(|(index, p)| {
            let model: BusinessModel = p
                .business_model
                .trim()
                .parse()
                .map_err(|e| EngineError::Analyst(format!("proposal {index}: {e}")))?;
            let profit = require(p.profit_potential, "profitPotential", index)?;
            let difficulty = require(p.difficulty_score, "difficultyScore", index)?;
            let investment = require(p.investment_required, "investmentRequired", index)?;
            let roi = require(p.roi_estimate, "roiEstimate", index)?;

            let investment = Decimal::try_from(investment).map_err(|e| {
                EngineError::Analyst(format!("proposal {index}: investmentRequired: {e}"))
            })?;
            let roi = i32::try_from(round_to_i64(roi).clamp(i64::from(i32::MIN), i64::from(i32::MAX)))
                .unwrap_or(0);
            let market_size = p
                .market_size
                .trim()
                .to_ascii_lowercase()
                .parse()
                .unwrap_or(MarketSize::Medium);

            Ok(OpportunityCandidate::new(
                model,
                round_to_i64(profit),
                round_to_i64(difficulty),
                round_money(investment),
                roi,
                market_size,
                p.competition_analysis,
                p.ai_recommendation,
            ))
        })
        .collect()
}
