//! Bayesian classifier: learning and forgetting

use chrono::Utc;
use tracing::{debug, warn};

use super::ignore::IgnorePolicy;
use super::probability::ProbabilityModel;
use super::types::{ForgetOutcome, LearnOutcome};
use crate::config::BayesConfig;
use crate::error::Result;
use crate::message::MessageView;
use crate::store::{SeenFlag, StoreSession, TieMode, TokenStore};
use crate::tokenizer::{Token, Tokenizer};

/// Receive times further than this in the future are not trusted
const MAX_FUTURE_SECS: i64 = 86_400;

/// Bayesian spam classifier over a token store
pub struct BayesClassifier<S: TokenStore> {
    pub(super) config: BayesConfig,
    pub(super) tokenizer: Tokenizer,
    pub(super) model: ProbabilityModel,
    pub(super) ignore: IgnorePolicy,
    pub(super) store: S,
}

impl<S: TokenStore> BayesClassifier<S> {
    /// Create a classifier; fails on malformed ignore patterns
    pub fn new(config: BayesConfig, store: S) -> Result<Self> {
        let ignore = IgnorePolicy::new(&config)?;
        let model = ProbabilityModel {
            combiner: config.combiner,
            smoothing: config.smoothing,
            use_hapaxes: config.use_hapaxes,
        };

        Ok(Self {
            tokenizer: Tokenizer::new(&config),
            model,
            ignore,
            config,
            store,
        })
    }

    pub fn config(&self) -> &BayesConfig {
        &self.config
    }

    pub fn model(&self) -> &ProbabilityModel {
        &self.model
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Learn a message as spam or ham
    pub fn learn(&mut self, message: &MessageView, is_spam: bool) -> Result<LearnOutcome> {
        self.learn_at(message, is_spam, Utc::now().timestamp())
    }

    /// [`learn`](Self::learn) with an explicit current time
    pub fn learn_at(
        &mut self,
        message: &MessageView,
        is_spam: bool,
        now: i64,
    ) -> Result<LearnOutcome> {
        if !self.config.use_learner {
            debug!("Learning disabled, not learning {}", message.msgid);
            return Ok(LearnOutcome::Disabled);
        }
        if let Some(pattern) = self.ignore.matching_pattern(message) {
            debug!("Not learning {}: matches ignore pattern {}", message.msgid, pattern);
            return Ok(LearnOutcome::Ignored);
        }

        let mut session = StoreSession::open(&mut self.store, TieMode::ReadWrite)?;
        let outcome = learn_trapped(
            &mut *session,
            &self.tokenizer,
            self.config.relearn,
            message,
            is_spam,
            now,
        )?;
        session.close()?;

        Ok(outcome)
    }

    /// Revert a previously learned message
    pub fn forget(&mut self, message: &MessageView) -> Result<ForgetOutcome> {
        if !self.config.use_learner {
            debug!("Learning disabled, not forgetting {}", message.msgid);
            return Ok(ForgetOutcome::Disabled);
        }
        if let Some(pattern) = self.ignore.matching_pattern(message) {
            debug!("Not forgetting {}: matches ignore pattern {}", message.msgid, pattern);
            return Ok(ForgetOutcome::Ignored);
        }

        let mut session = StoreSession::open(&mut self.store, TieMode::ReadWrite)?;
        let outcome = forget_trapped(&mut *session, &self.tokenizer, message)?;
        session.close()?;

        Ok(outcome)
    }
}

/// Receive time used as token access time
///
/// Times more than a day ahead of `now` are replaced by `now`.
pub fn clamp_atime(received: i64, now: i64) -> i64 {
    if received > now.saturating_add(MAX_FUTURE_SECS) {
        now
    } else {
        received
    }
}

/// Learn inside an already tied store
fn learn_trapped<S: TokenStore + ?Sized>(
    store: &mut S,
    tokenizer: &Tokenizer,
    relearn: bool,
    message: &MessageView,
    is_spam: bool,
    now: i64,
) -> Result<LearnOutcome> {
    let target = SeenFlag::from_is_spam(is_spam);

    if let Some(raw) = store.get_seen(&message.msgid)? {
        match raw.parse::<SeenFlag>() {
            Ok(seen) if seen == target => {
                debug!("{} already learned as {:?}", message.msgid, seen);
                return Ok(LearnOutcome::AlreadyLearned);
            }
            Ok(seen) => {
                if !relearn {
                    debug!("{} learned as {:?}, relearning disabled", message.msgid, seen);
                    return Ok(LearnOutcome::NotRelearned);
                }
                let forgotten = forget_trapped(store, tokenizer, message)?;
                if forgotten != ForgetOutcome::Forgotten {
                    warn!("Could not forget {} before relearning: {:?}", message.msgid, forgotten);
                    return Ok(LearnOutcome::ForgetFailed);
                }
            }
            Err(_) => {
                warn!("Corrupt seen flag {:?} for {}, treating as unseen", raw, message.msgid);
            }
        }
    }

    let atime = clamp_atime(message.received, now);
    let tokens: Vec<Token> = tokenizer.tokenize(message).into_keys().collect();
    let (delta_spam, delta_ham) = if is_spam { (1, 0) } else { (0, 1) };

    store.set_corpus_counts(delta_spam as i64, delta_ham as i64)?;
    store.bump_counts(&tokens, delta_spam, delta_ham, atime)?;
    store.put_seen(&message.msgid, target)?;

    debug!(
        "Learned {} as {:?} ({} tokens)",
        message.msgid,
        target,
        tokens.len()
    );
    Ok(LearnOutcome::Learned)
}

/// Forget inside an already tied store
fn forget_trapped<S: TokenStore + ?Sized>(
    store: &mut S,
    tokenizer: &Tokenizer,
    message: &MessageView,
) -> Result<ForgetOutcome> {
    let Some(raw) = store.get_seen(&message.msgid)? else {
        debug!("{} was never learned", message.msgid);
        return Ok(ForgetOutcome::NotLearned);
    };

    let seen = match raw.parse::<SeenFlag>() {
        Ok(seen) => seen,
        Err(_) => {
            warn!("Corrupt seen flag {:?} for {}, not forgetting", raw, message.msgid);
            return Ok(ForgetOutcome::Corrupt);
        }
    };

    let tokens: Vec<Token> = tokenizer.tokenize(message).into_keys().collect();
    let (delta_spam, delta_ham) = if seen.is_spam() { (-1, 0) } else { (0, -1) };

    store.set_corpus_counts(delta_spam as i64, delta_ham as i64)?;
    store.bump_counts(&tokens, delta_spam, delta_ham, message.received)?;
    store.delete_seen(&message.msgid)?;

    debug!(
        "Forgot {} ({:?}, {} tokens)",
        message.msgid,
        seen,
        tokens.len()
    );
    Ok(ForgetOutcome::Forgotten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BayesError;
    use crate::store::{CorpusStats, MemoryStore, MockTokenStore, TokenCounts};

    const NOW: i64 = 1_700_000_000;

    fn message(id: &str, body: &str) -> MessageView {
        MessageView::builder()
            .message_id(id)
            .rendered_body(body)
            .received_at(NOW - 3600)
            .build()
    }

    fn classifier() -> BayesClassifier<MemoryStore> {
        BayesClassifier::new(BayesConfig::default(), MemoryStore::new()).unwrap()
    }

    fn snapshot(store: &MemoryStore) -> (CorpusStats, Vec<(Token, TokenCounts)>) {
        (
            store.corpus_counts().unwrap(),
            store.tokens().map(|(t, c)| (*t, *c)).collect(),
        )
    }

    #[test]
    fn test_learn_updates_counts() {
        let mut c = classifier();
        let msg = message("a@example", "Cheap viagra pills");

        assert_eq!(c.learn_at(&msg, true, NOW).unwrap(), LearnOutcome::Learned);

        let store = c.store();
        assert_eq!(store.corpus_counts().unwrap().spam_count, 1);
        assert_eq!(store.get_seen("a@example").unwrap().as_deref(), Some("s"));

        let viagra = store.get(&Token::from_text("viagra")).unwrap().unwrap();
        assert_eq!((viagra.spam_count, viagra.ham_count), (1, 0));
        assert_eq!(viagra.atime, NOW - 3600);
    }

    #[test]
    fn test_double_learn_is_noop() {
        let mut c = classifier();
        let msg = message("a@example", "Cheap viagra pills");

        c.learn_at(&msg, true, NOW).unwrap();
        let before = snapshot(c.store());

        assert_eq!(c.learn_at(&msg, true, NOW).unwrap(), LearnOutcome::AlreadyLearned);
        assert_eq!(snapshot(c.store()), before);
    }

    #[test]
    fn test_learn_then_forget_restores_state() {
        let mut c = classifier();
        let ham = message("ham@example", "Quarterly report attached");
        c.learn_at(&ham, false, NOW).unwrap();
        let before = snapshot(c.store());

        let msg = message("a@example", "Cheap viagra pills");
        c.learn_at(&msg, true, NOW).unwrap();
        assert_eq!(c.forget(&msg).unwrap(), ForgetOutcome::Forgotten);

        assert_eq!(snapshot(c.store()), before);
        assert!(c.store().get_seen("a@example").unwrap().is_none());
    }

    #[test]
    fn test_forget_unknown_message() {
        let mut c = classifier();
        let msg = message("nobody@example", "whatever text");
        assert_eq!(c.forget(&msg).unwrap(), ForgetOutcome::NotLearned);
    }

    #[test]
    fn test_relearn_equals_forget_then_learn() {
        let msg = message("a@example", "Cheap viagra pills");

        let mut relearned = classifier();
        relearned.learn_at(&msg, true, NOW).unwrap();
        assert_eq!(relearned.learn_at(&msg, false, NOW).unwrap(), LearnOutcome::Learned);

        let mut fresh = classifier();
        fresh.learn_at(&msg, false, NOW).unwrap();

        assert_eq!(snapshot(relearned.store()), snapshot(fresh.store()));
        assert_eq!(
            relearned.store().get_seen("a@example").unwrap().as_deref(),
            Some("h")
        );
    }

    #[test]
    fn test_relearn_disabled() {
        let config = BayesConfig {
            relearn: false,
            ..Default::default()
        };
        let mut c = BayesClassifier::new(config, MemoryStore::new()).unwrap();
        let msg = message("a@example", "Cheap viagra pills");

        c.learn_at(&msg, true, NOW).unwrap();
        assert_eq!(c.learn_at(&msg, false, NOW).unwrap(), LearnOutcome::NotRelearned);
        assert_eq!(c.store().corpus_counts().unwrap().ham_count, 0);
    }

    #[test]
    fn test_corrupt_seen_flag() {
        let mut c = classifier();
        c.store_mut().put_raw_seen("a@example", "garbage");
        let msg = message("a@example", "Cheap viagra pills");

        assert_eq!(c.forget(&msg).unwrap(), ForgetOutcome::Corrupt);
        assert_eq!(c.learn_at(&msg, true, NOW).unwrap(), LearnOutcome::Learned);
        assert_eq!(c.store().get_seen("a@example").unwrap().as_deref(), Some("s"));
    }

    #[test]
    fn test_disabled_learner() {
        let config = BayesConfig {
            use_learner: false,
            ..Default::default()
        };
        let mut c = BayesClassifier::new(config, MemoryStore::new()).unwrap();
        let msg = message("a@example", "Cheap viagra pills");

        assert_eq!(c.learn_at(&msg, true, NOW).unwrap(), LearnOutcome::Disabled);
        assert_eq!(c.forget(&msg).unwrap(), ForgetOutcome::Disabled);
        assert_eq!(c.store().token_count(), 0);
    }

    #[test]
    fn test_ignored_sender() {
        let config = BayesConfig {
            ignore_from: vec!["*@lists.example.org".to_string()],
            ..Default::default()
        };
        let mut c = BayesClassifier::new(config, MemoryStore::new()).unwrap();
        let msg = MessageView::builder()
            .header("From", "News <news@lists.example.org>")
            .message_id("list@example")
            .rendered_body("Weekly digest")
            .build();

        assert_eq!(c.learn_at(&msg, true, NOW).unwrap(), LearnOutcome::Ignored);
        assert_eq!(c.forget(&msg).unwrap(), ForgetOutcome::Ignored);
        assert_eq!(c.store().corpus_counts().unwrap(), CorpusStats::default());
    }

    #[test]
    fn test_future_receive_time_is_clamped() {
        let mut c = classifier();
        let msg = MessageView::builder()
            .message_id("future@example")
            .rendered_body("Cheap viagra pills")
            .received_at(NOW + 10 * MAX_FUTURE_SECS)
            .build();

        c.learn_at(&msg, true, NOW).unwrap();
        let viagra = c.store().get(&Token::from_text("viagra")).unwrap().unwrap();
        assert_eq!(viagra.atime, NOW);
    }

    #[test]
    fn test_clamp_atime() {
        assert_eq!(clamp_atime(NOW, NOW), NOW);
        assert_eq!(clamp_atime(NOW + MAX_FUTURE_SECS, NOW), NOW + MAX_FUTURE_SECS);
        assert_eq!(clamp_atime(NOW + MAX_FUTURE_SECS + 1, NOW), NOW);
        assert_eq!(clamp_atime(-5, NOW), -5);
        assert_eq!(clamp_atime(i64::MAX, i64::MAX), i64::MAX);
    }

    #[test]
    fn test_relearn_reuses_session() {
        let mut store = MockTokenStore::new();
        store.expect_tie().times(1).returning(|_| Ok(()));
        store.expect_untie().times(1).returning(|| Ok(()));
        store
            .expect_get_seen()
            .returning(|_| Ok(Some("s".to_string())));
        store
            .expect_set_corpus_counts()
            .withf(|s, h| (*s, *h) == (-1, 0))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_set_corpus_counts()
            .withf(|s, h| (*s, *h) == (0, 1))
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_bump_counts().times(2).returning(|_, _, _, _| Ok(()));
        store.expect_delete_seen().times(1).returning(|_| Ok(()));
        store
            .expect_put_seen()
            .withf(|_, flag| *flag == SeenFlag::Ham)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut c = BayesClassifier::new(BayesConfig::default(), store).unwrap();
        let msg = message("a@example", "Cheap viagra pills");
        assert_eq!(c.learn_at(&msg, false, NOW).unwrap(), LearnOutcome::Learned);
    }

    #[test]
    fn test_store_failure_propagates_and_unties() {
        let mut store = MockTokenStore::new();
        store.expect_tie().times(1).returning(|_| Ok(()));
        store.expect_untie().times(1).returning(|| Ok(()));
        store
            .expect_get_seen()
            .returning(|_| Err(BayesError::Store("connection lost".to_string())));

        let mut c = BayesClassifier::new(BayesConfig::default(), store).unwrap();
        let msg = message("a@example", "Cheap viagra pills");
        assert!(matches!(
            c.learn_at(&msg, true, NOW),
            Err(BayesError::Store(_))
        ));
    }
}
