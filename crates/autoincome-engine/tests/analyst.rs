//! Integration tests for `OpenAiAnalyst` using wiremock HTTP mocks.

use autoincome_core::{AnalystSettings, BusinessModel, CompetitionLevel, Trend};
use autoincome_engine::{EngineError, GenerativeAnalyst, OpenAiAnalyst};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn analyst(base_url: &str, max_retries: u32) -> OpenAiAnalyst {
    let settings = AnalystSettings {
        api_key: "sk-test".to_owned(),
        base_url: format!("{base_url}/v1"),
        model: "gpt-3.5-turbo".to_owned(),
        timeout_secs: 5,
        max_retries,
    };
    OpenAiAnalyst::new(&settings)
        .expect("client construction should not fail")
        .with_backoff_base_ms(0)
}

fn trend() -> Trend {
    Trend {
        id: 7,
        keyword: "portable phone stands".to_owned(),
        platform: "ecommerce".to_owned(),
        search_volume: 3200,
        growth_rate: 45.0,
        competition_level: CompetitionLevel::Medium,
        sentiment_score: 5.5,
        analyzed: false,
        scraped_at: chrono::Utc::now(),
    }
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
}

const PROPOSALS: &str = r#"```json
[
  {"businessModel": "dropshipping", "profitPotential": 7, "difficultyScore": 4,
   "investmentRequired": 120, "roiEstimate": 250, "marketSize": "medium",
   "competitionAnalysis": "moderate", "aiRecommendation": "bundle with cables"},
  {"businessModel": "print_on_demand", "profitPotential": 5, "difficultyScore": 3,
   "investmentRequired": 0, "roiEstimate": 180, "marketSize": "small",
   "competitionAnalysis": "low", "aiRecommendation": "custom engravings"}
]
```"#;

#[tokio::test]
async fn propose_returns_parsed_candidates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-3.5-turbo",
            "temperature": 0.7,
            "max_tokens": 1000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(PROPOSALS)))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = analyst(&server.uri(), 0)
        .propose(&trend())
        .await
        .expect("proposals should parse");

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].business_model, BusinessModel::Dropshipping);
    assert_eq!(candidates[0].profit_potential(), 7);
    assert_eq!(candidates[1].business_model, BusinessModel::PrintOnDemand);
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = analyst(&server.uri(), 3)
        .propose(&trend())
        .await
        .expect_err("401 should fail");

    assert!(matches!(err, EngineError::AnalystStatus { status: 401, .. }));
}

#[tokio::test]
async fn server_error_is_retried_then_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = analyst(&server.uri(), 2)
        .propose(&trend())
        .await
        .expect_err("503 should fail after retries");

    assert!(matches!(err, EngineError::AnalystStatus { status: 503, .. }));
}

#[tokio::test]
async fn transient_failure_recovers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("[]")))
        .mount(&server)
        .await;

    let candidates = analyst(&server.uri(), 2)
        .propose(&trend())
        .await
        .expect("second attempt should succeed");
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn prose_reply_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("Sure! Here are some ideas.")),
        )
        .mount(&server)
        .await;

    let err = analyst(&server.uri(), 0)
        .propose(&trend())
        .await
        .expect_err("prose is not JSON");
    assert!(matches!(err, EngineError::Json(_)));
}

#[tokio::test]
async fn missing_choices_is_a_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = analyst(&server.uri(), 0)
        .propose(&trend())
        .await
        .expect_err("no choices");
    assert!(matches!(err, EngineError::Analyst(_)));
}
