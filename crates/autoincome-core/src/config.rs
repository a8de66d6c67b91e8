use crate::app_config::{AnalystSettings, AppConfig, Environment, JobIntervals};
use crate::ConfigError;

/// Placeholder key shipped in sample `.env` files; treated as no key at all.
const DEMO_API_KEY: &str = "demo-key";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from the process environment without
/// touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_u64(var, default)?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("AUTOINCOME_ENV", "development"))?;
    let log_level = or_default("AUTOINCOME_LOG_LEVEL", "info");
    let heuristics_path = lookup("AUTOINCOME_HEURISTICS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let db_max_connections = parse_u32("AUTOINCOME_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("AUTOINCOME_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("AUTOINCOME_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let trend_batch_size = i64::try_from(parse_positive_u64("AUTOINCOME_TREND_BATCH_SIZE", "50")?)
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "AUTOINCOME_TREND_BATCH_SIZE".to_string(),
            reason: e.to_string(),
        })?;
    let launch_platform = or_default("AUTOINCOME_LAUNCH_PLATFORM", "facebook_marketplace");
    let job_deadline_secs = parse_positive_u64("AUTOINCOME_JOB_DEADLINE_SECS", "300")?;

    let intervals = JobIntervals {
        ingest_secs: parse_positive_u64("AUTOINCOME_INGEST_INTERVAL_SECS", "3600")?,
        analyze_secs: parse_positive_u64("AUTOINCOME_ANALYZE_INTERVAL_SECS", "1800")?,
        launch_secs: parse_positive_u64("AUTOINCOME_LAUNCH_INTERVAL_SECS", "3600")?,
        reprice_secs: parse_positive_u64("AUTOINCOME_REPRICE_INTERVAL_SECS", "21600")?,
        performance_secs: parse_positive_u64("AUTOINCOME_PERFORMANCE_INTERVAL_SECS", "900")?,
        segment_secs: parse_positive_u64("AUTOINCOME_SEGMENT_INTERVAL_SECS", "3600")?,
        reinvest_secs: parse_positive_u64("AUTOINCOME_REINVEST_INTERVAL_SECS", "86400")?,
        snapshot_secs: parse_positive_u64("AUTOINCOME_SNAPSHOT_INTERVAL_SECS", "30")?,
    };

    let analyst = match lookup("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() && key.trim() != DEMO_API_KEY => Some(AnalystSettings {
            api_key: key.trim().to_string(),
            base_url: or_default("AUTOINCOME_ANALYST_URL", "https://api.openai.com/v1"),
            model: or_default("AUTOINCOME_ANALYST_MODEL", "gpt-3.5-turbo"),
            timeout_secs: parse_positive_u64("AUTOINCOME_ANALYST_TIMEOUT_SECS", "30")?,
            max_retries: parse_u32("AUTOINCOME_ANALYST_MAX_RETRIES", "2")?,
        }),
        _ => None,
    };

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        heuristics_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        trend_batch_size,
        launch_platform,
        job_deadline_secs,
        intervals,
        analyst,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AUTOINCOME_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
