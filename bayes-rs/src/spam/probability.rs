//! Per-token spam probability

use super::combiner::Combiner;
use crate::store::CorpusStats;

/// Below this many observations an unsmoothed probability is noise
const MIN_UNSMOOTHED_COUNT: u64 = 10;

/// Parameters of the probability model, taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct ProbabilityModel {
    pub combiner: Combiner,
    pub smoothing: bool,
    pub use_hapaxes: bool,
}

impl ProbabilityModel {
    /// Spam probability of a token seen in `spam` spam and `ham` ham
    /// messages, or `None` when there is too little evidence
    ///
    /// The raw estimate compares the token's frequency in each corpus;
    /// with smoothing, Robinson's f(w) pulls rare tokens towards the
    /// combiner's `x` constant.
    pub fn token_probability(&self, spam: u32, ham: u32, corpus: CorpusStats) -> Option<f64> {
        let ns = corpus.spam_count;
        let nn = corpus.ham_count;
        if ns == 0 || nn == 0 {
            return None;
        }

        let s = spam as f64;
        let n = ham as f64;
        let total = spam as u64 + ham as u64;

        if total == 0 {
            return None;
        }
        if !self.smoothing && total < MIN_UNSMOOTHED_COUNT {
            return None;
        }
        if !self.use_hapaxes && total < 2 {
            return None;
        }

        let ns = ns as f64;
        let nn = nn as f64;
        let mut prob = (s * nn) / (n * ns + s * nn);

        if self.smoothing {
            let robs = self.combiner.s_constant();
            let robx = self.combiner.x_constant();
            let total = total as f64;
            prob = (robs * robx + total * prob) / (robs + total);
        }

        Some(prob.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(smoothing: bool, use_hapaxes: bool) -> ProbabilityModel {
        ProbabilityModel {
            combiner: Combiner::ChiSquare,
            smoothing,
            use_hapaxes,
        }
    }

    fn corpus(spam: u64, ham: u64) -> CorpusStats {
        CorpusStats {
            spam_count: spam,
            ham_count: ham,
        }
    }

    #[test]
    fn test_unseen_token_has_no_probability() {
        assert_eq!(model(true, true).token_probability(0, 0, corpus(100, 100)), None);
    }

    #[test]
    fn test_empty_class_has_no_probability() {
        assert_eq!(model(true, true).token_probability(3, 1, corpus(0, 100)), None);
        assert_eq!(model(true, true).token_probability(3, 1, corpus(100, 0)), None);
    }

    #[test]
    fn test_unsmoothed_needs_ten_observations() {
        let m = model(false, true);
        assert_eq!(m.token_probability(5, 4, corpus(100, 100)), None);
        assert_eq!(m.token_probability(10, 0, corpus(100, 100)), Some(1.0));
        assert_eq!(m.token_probability(5, 5, corpus(100, 100)), Some(0.5));
    }

    #[test]
    fn test_hapaxes_disabled() {
        let m = model(true, false);
        assert_eq!(m.token_probability(1, 0, corpus(100, 100)), None);
        assert!(m.token_probability(2, 0, corpus(100, 100)).is_some());
    }

    #[test]
    fn test_smoothing_pulls_towards_x() {
        let m = model(true, true);
        let hapax = m.token_probability(1, 0, corpus(100, 100)).unwrap();
        // (0.03 * 0.538 + 1 * 1.0) / 1.03
        assert!((hapax - 0.986_543_689).abs() < 1e-6);

        let frequent = m.token_probability(100, 0, corpus(100, 100)).unwrap();
        assert!(frequent > hapax);
        assert!(frequent < 1.0);
    }

    #[test]
    fn test_corpus_imbalance_is_normalized() {
        let m = model(false, true);
        // seen in 10% of spam and 10% of ham
        let p = m.token_probability(100, 10, corpus(1000, 100)).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_probability_in_unit_interval() {
        let m = model(true, true);
        for (s, n) in [(1, 0), (0, 1), (7, 3), (0, 500), (u32::MAX, 1), (200, 400)] {
            let p = m.token_probability(s, n, corpus(200, 200)).unwrap();
            assert!((0.0..=1.0).contains(&p), "p({}, {}) = {}", s, n, p);
        }
    }
}
