//! Human-readable scan reports and score buckets

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::distance::declassification_distance;
use super::probability::ProbabilityModel;
use super::types::TokenInfo;
use crate::error::BayesError;
use crate::store::CorpusStats;

const SECONDS_PER_DAY: i64 = 86_400;

/// Score ranges reported as rule names, `(name, min, max)`
pub const SCORE_BUCKETS: &[(&str, f64, f64)] = &[
    ("BAYES_00", 0.0, 0.01),
    ("BAYES_05", 0.01, 0.05),
    ("BAYES_20", 0.05, 0.20),
    ("BAYES_40", 0.20, 0.40),
    ("BAYES_50", 0.40, 0.60),
    ("BAYES_60", 0.60, 0.80),
    ("BAYES_80", 0.80, 0.95),
    ("BAYES_95", 0.95, 0.99),
    ("BAYES_99", 0.99, 1.00),
    ("BAYES_999", 0.999, 1.00),
];

/// Layout of one entry in a token list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    /// `token`
    Short,
    /// `prob-distance--token`
    #[default]
    Compact,
    /// `prob-distance-count--token`
    Medium,
    /// `prob-distance--Hh-Ss--Ad--token`
    Long,
}

impl FromStr for ListFormat {
    type Err = BayesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(ListFormat::Short),
            "compact" => Ok(ListFormat::Compact),
            "medium" => Ok(ListFormat::Medium),
            "long" => Ok(ListFormat::Long),
            other => Err(BayesError::Parse(format!("unknown list format: {}", other))),
        }
    }
}

/// Render up to `limit` tokens as a comma separated list
///
/// Distances above 9 are shown as `+` except in the long format; ages are
/// whole days between the token's access time and `now`.
pub fn render_token_list(
    tokens: &[TokenInfo],
    limit: usize,
    format: ListFormat,
    model: &ProbabilityModel,
    corpus: CorpusStats,
    now: i64,
) -> String {
    let mut out = String::new();

    for (i, info) in tokens.iter().take(limit).enumerate() {
        if i > 0 {
            out.push_str(", ");
        }

        let distance = declassification_distance(
            model,
            corpus,
            info.spam_count,
            info.ham_count,
            info.probability,
        );
        let short_distance = if distance > 9 {
            "+".to_string()
        } else {
            distance.to_string()
        };
        let prob = format!("{:.3}", info.probability);
        let text = info.text.as_str();

        let entry = match format {
            ListFormat::Short => text.to_string(),
            ListFormat::Compact => format!("{}-{}--{}", prob, short_distance, text),
            ListFormat::Medium => format!(
                "{}-{}-{}--{}",
                prob,
                short_distance,
                info.spam_count as u64 + info.ham_count as u64,
                text
            ),
            ListFormat::Long => {
                let age = (now - info.atime).max(0) / SECONDS_PER_DAY;
                format!(
                    "{}-{}--{}h-{}s--{}d--{}",
                    prob, distance, info.ham_count, info.spam_count, age, text
                )
            }
        };
        out.push_str(&entry);
    }

    out
}

/// Whether `score` falls in `[min, max)`; a `max` of 1.0 or more is
/// inclusive
pub fn check_bayes(score: f64, min: f64, max: f64) -> bool {
    if score < min {
        return false;
    }
    if max >= 1.0 {
        score <= max
    } else {
        score < max
    }
}

/// Names of every score bucket `score` falls in
pub fn bayes_rules(score: f64) -> Vec<&'static str> {
    SCORE_BUCKETS
        .iter()
        .filter(|(_, min, max)| check_bayes(score, *min, *max))
        .map(|(name, _, _)| *name)
        .collect()
}
