//! Classifier results and outcomes

use serde::{Deserialize, Serialize};

use crate::store::CorpusStats;
use crate::tokenizer::Token;

/// Result of learning a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearnOutcome {
    /// Counts were updated
    Learned,
    /// Already learned as the same class, nothing changed
    AlreadyLearned,
    /// Learned as the other class and relearning is off
    NotRelearned,
    /// Learned as the other class and unlearning it failed
    ForgetFailed,
    /// Learning is switched off
    Disabled,
    /// Sender or recipient is on the ignore list
    Ignored,
}

/// Result of forgetting a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForgetOutcome {
    /// Counts were reverted
    Forgotten,
    /// The message was never learned
    NotLearned,
    /// The stored seen flag is unreadable
    Corrupt,
    /// Learning is switched off
    Disabled,
    /// Sender or recipient is on the ignore list
    Ignored,
}

/// Why a scan produced no score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Scanning or learning is switched off
    Disabled,
    /// Sender or recipient is on the ignore list
    Ignored,
    /// Too few messages learned so far
    InsufficientCorpus { spam: u64, ham: u64 },
    /// None of the message's tokens are in the store
    NoKnownTokens,
    /// Too few tokens strong enough to score
    NotEnoughTokens,
}

/// Result of scanning a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScanOutcome {
    Scored(ScanResult),
    Skipped(SkipReason),
}

impl ScanOutcome {
    pub fn score(&self) -> Option<f64> {
        match self {
            ScanOutcome::Scored(result) => Some(result.score),
            ScanOutcome::Skipped(_) => None,
        }
    }

    pub fn result(&self) -> Option<&ScanResult> {
        match self {
            ScanOutcome::Scored(result) => Some(result),
            ScanOutcome::Skipped(_) => None,
        }
    }
}

/// A token that contributed to a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token: Token,
    /// Normalized string the token was hashed from
    pub text: String,
    pub probability: f64,
    pub spam_count: u32,
    pub ham_count: u32,
    /// Access time before this scan
    pub atime: i64,
}

/// Score and supporting detail of a scanned message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Spam probability in [0, 1]
    pub score: f64,
    /// Corpus totals at scan time
    pub corpus: CorpusStats,
    /// Distinct tokens in the message
    pub total_tokens: usize,
    /// Tokens of the message known to the store
    pub learned_tokens: usize,
    /// Significant tokens with p < 0.5, strongest first
    pub hammy: Vec<TokenInfo>,
    /// Significant tokens with p >= 0.5, strongest first
    pub spammy: Vec<TokenInfo>,
}

impl ScanResult {
    /// Template tags describing the scan
    pub fn tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("BAYES", format!("{:.4}", self.score)),
            ("BAYESTC", self.total_tokens.to_string()),
            ("BAYESTCLEARNED", self.learned_tokens.to_string()),
            ("BAYESTCHAMMY", self.hammy.len().to_string()),
            ("BAYESTCSPAMMY", self.spammy.len().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(p: f64) -> TokenInfo {
        TokenInfo {
            token: Token::from_text("x"),
            text: "x".to_string(),
            probability: p,
            spam_count: 1,
            ham_count: 0,
            atime: 0,
        }
    }

    #[test]
    fn test_tags() {
        let result = ScanResult {
            score: 0.98766,
            corpus: CorpusStats::default(),
            total_tokens: 40,
            learned_tokens: 12,
            hammy: vec![info(0.01)],
            spammy: vec![info(0.99), info(0.97)],
        };

        let tags = result.tags();
        assert_eq!(tags[0], ("BAYES", "0.9877".to_string()));
        assert_eq!(tags[1], ("BAYESTC", "40".to_string()));
        assert_eq!(tags[2], ("BAYESTCLEARNED", "12".to_string()));
        assert_eq!(tags[3], ("BAYESTCHAMMY", "1".to_string()));
        assert_eq!(tags[4], ("BAYESTCSPAMMY", "2".to_string()));
    }

    #[test]
    fn test_outcome_accessors() {
        let skipped = ScanOutcome::Skipped(SkipReason::NoKnownTokens);
        assert_eq!(skipped.score(), None);
        assert!(skipped.result().is_none());
    }
}
