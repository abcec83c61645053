use thiserror::Error;

#[derive(Error, Debug)]
pub enum BayesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BayesError>;
