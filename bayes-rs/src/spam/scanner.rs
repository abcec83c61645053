//! Scoring messages against the learned corpus

use chrono::Utc;
use std::cmp::Ordering;
use tracing::debug;

use super::classifier::{clamp_atime, BayesClassifier};
use super::probability::ProbabilityModel;
use super::types::{ScanOutcome, ScanResult, SkipReason, TokenInfo};
use crate::config::BayesConfig;
use crate::error::Result;
use crate::message::MessageView;
use crate::store::{StoreSession, TieMode, TokenStore};
use crate::tokenizer::{Token, Tokenizer};

impl<S: TokenStore> BayesClassifier<S> {
    /// Spam probability of a message, or the reason none was computed
    pub fn scan(&mut self, message: &MessageView) -> Result<ScanOutcome> {
        self.scan_at(message, Utc::now().timestamp())
    }

    /// [`scan`](Self::scan) with an explicit current time
    pub fn scan_at(&mut self, message: &MessageView, now: i64) -> Result<ScanOutcome> {
        let outcome = if !self.config.use_learner || !self.config.use_bayes {
            ScanOutcome::Skipped(SkipReason::Disabled)
        } else if self.ignore.is_ignored(message) {
            ScanOutcome::Skipped(SkipReason::Ignored)
        } else {
            let mut session = StoreSession::open(&mut self.store, TieMode::ReadOnly)?;
            let outcome = scan_trapped(
                &mut *session,
                &self.config,
                &self.tokenizer,
                &self.model,
                message,
                now,
            )?;
            session.close()?;
            outcome
        };

        match &outcome {
            ScanOutcome::Scored(result) => debug!(
                "Bayes score {:.4} for {} ({} of {} tokens known, {} hammy, {} spammy)",
                result.score,
                message.msgid,
                result.learned_tokens,
                result.total_tokens,
                result.hammy.len(),
                result.spammy.len()
            ),
            ScanOutcome::Skipped(reason) => {
                debug!("Bayes scan of {} skipped: {:?}", message.msgid, reason)
            }
        }

        Ok(outcome)
    }
}

fn strength(info: &TokenInfo) -> f64 {
    (info.probability - 0.5).abs()
}

fn scan_trapped<S: TokenStore + ?Sized>(
    store: &mut S,
    config: &BayesConfig,
    tokenizer: &Tokenizer,
    model: &ProbabilityModel,
    message: &MessageView,
    now: i64,
) -> Result<ScanOutcome> {
    let corpus = store.corpus_counts()?;
    if corpus.spam_count < config.min_spam_num || corpus.ham_count < config.min_ham_num {
        return Ok(ScanOutcome::Skipped(SkipReason::InsufficientCorpus {
            spam: corpus.spam_count,
            ham: corpus.ham_count,
        }));
    }

    let tokens = tokenizer.tokenize(message);
    let ids: Vec<Token> = tokens.keys().copied().collect();
    let counts = store.get_all(&ids)?;

    let mut learned_tokens = 0;
    let mut significant: Vec<TokenInfo> = Vec::new();

    for ((token, text), counts) in tokens.iter().zip(counts) {
        let Some(counts) = counts else {
            continue;
        };
        learned_tokens += 1;

        if let Some(probability) =
            model.token_probability(counts.spam_count, counts.ham_count, corpus)
        {
            significant.push(TokenInfo {
                token: *token,
                text: text.clone(),
                probability,
                spam_count: counts.spam_count,
                ham_count: counts.ham_count,
                atime: counts.atime,
            });
        }
    }

    if learned_tokens == 0 {
        return Ok(ScanOutcome::Skipped(SkipReason::NoKnownTokens));
    }

    significant.sort_by(|a, b| {
        strength(b)
            .partial_cmp(&strength(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.token.cmp(&b.token))
    });
    significant.truncate(config.max_significant_tokens);

    let min_strength = model.combiner.min_prob_strength();
    significant.retain(|info| strength(info) >= min_strength);

    if significant.is_empty() || significant.len() < config.min_significant_tokens {
        return Ok(ScanOutcome::Skipped(SkipReason::NotEnoughTokens));
    }

    let probs: Vec<f64> = significant.iter().map(|i| i.probability).collect();
    let score = model.combiner.combine(corpus, &probs);

    let used: Vec<Token> = significant.iter().map(|i| i.token).collect();
    store.touch(&used, clamp_atime(message.received, now))?;

    let (hammy, spammy): (Vec<TokenInfo>, Vec<TokenInfo>) = significant
        .into_iter()
        .partition(|info| info.probability < 0.5);

    Ok(ScanOutcome::Scored(ScanResult {
        score,
        corpus,
        total_tokens: tokens.len(),
        learned_tokens,
        hammy,
        spammy,
    }))
}
