use crate::error::{BayesError, Result};
use crate::spam::Combiner;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bayes: BayesConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Classifier settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BayesConfig {
    /// Produce scores on scan
    pub use_bayes: bool,
    /// Master switch for learn, forget and scan
    pub use_learner: bool,
    /// Minimum learned spam messages before scans are scored
    pub min_spam_num: u64,
    /// Minimum learned ham messages before scans are scored
    pub min_ham_num: u64,
    /// Score tokens seen only once
    pub use_hapaxes: bool,
    /// Apply Robinson's f(w) to low-frequency tokens
    pub smoothing: bool,
    /// Probability combining algorithm
    pub combiner: Combiner,
    /// Tokens longer than this are exploded or shortened
    pub max_token_length: usize,
    /// Number of most significant tokens fed to the combiner
    pub max_significant_tokens: usize,
    /// Skip the message when fewer significant tokens remain
    pub min_significant_tokens: usize,
    /// Forget and re-learn messages learned as the opposite class
    pub relearn: bool,
    /// Extra header names excluded from tokenization
    pub ignore_headers: Vec<String>,
    /// Sender address patterns whose mail is never scanned or learned
    pub ignore_from: Vec<String>,
    /// Recipient address patterns whose mail is never scanned or learned
    pub ignore_to: Vec<String>,
}

impl Default for BayesConfig {
    fn default() -> Self {
        Self {
            use_bayes: true,
            use_learner: true,
            min_spam_num: 200,
            min_ham_num: 200,
            use_hapaxes: true,
            smoothing: true,
            combiner: Combiner::default(),
            max_token_length: 15,
            max_significant_tokens: 150,
            min_significant_tokens: 0,
            relearn: true,
            ignore_headers: Vec::new(),
            ignore_from: Vec::new(),
            ignore_to: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot backing the in-memory token store
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BayesError::Config(e.to_string()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BayesError::Config(e.to_string()))
    }
}
