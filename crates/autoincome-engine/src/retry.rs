//! Retry with exponential back-off and jitter for the analyst client.
//!
//! Only transient failures are retried: network timeouts, refused
//! connections and 5xx responses. Everything else returns at once so the
//! caller can fall back to the heuristic scorer without delay.

use std::future::Future;
use std::time::Duration;

use crate::error::EngineError;

const MAX_DELAY_MS: u64 = 60_000;

pub(crate) fn is_retriable(err: &EngineError) -> bool {
    match err {
        EngineError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        EngineError::AnalystStatus { status, .. } => *status >= 500,
        EngineError::Analyst(_) | EngineError::Json(_) | EngineError::Store(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts.
///
/// Attempt `n` sleeps `backoff_base_ms × 2ⁿ⁻¹` (±25 % jitter, capped at 60 s)
/// before trying again.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "analyst: transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
