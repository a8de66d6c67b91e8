use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Repeat interval of each periodic job, in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobIntervals {
    pub ingest_secs: u64,
    pub analyze_secs: u64,
    pub launch_secs: u64,
    pub reprice_secs: u64,
    pub performance_secs: u64,
    pub segment_secs: u64,
    pub reinvest_secs: u64,
    pub snapshot_secs: u64,
}

/// Connection settings for the optional generative analyst.
#[derive(Clone)]
pub struct AnalystSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl std::fmt::Debug for AnalystSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalystSettings")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub heuristics_path: Option<PathBuf>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub trend_batch_size: i64,
    pub launch_platform: String,
    pub job_deadline_secs: u64,
    pub intervals: JobIntervals,
    /// `None` when no usable API key is configured; scoring stays heuristic.
    pub analyst: Option<AnalystSettings>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("heuristics_path", &self.heuristics_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("trend_batch_size", &self.trend_batch_size)
            .field("launch_platform", &self.launch_platform)
            .field("job_deadline_secs", &self.job_deadline_secs)
            .field("intervals", &self.intervals)
            .field("analyst", &self.analyst)
            .finish()
    }
}
