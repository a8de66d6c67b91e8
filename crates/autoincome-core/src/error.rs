use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read heuristics file {path}: {source}")]
    HeuristicsFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse heuristics: {0}")]
    HeuristicsParse(#[from] serde_yaml::Error),

    #[error("heuristics validation failed: {0}")]
    Validation(String),
}
