//! Declassification distance
//!
//! How many more messages of the opposite class a token must be learned
//! from before it stops being significant.

use super::probability::ProbabilityModel;
use crate::store::CorpusStats;

/// Learns of the opposite class needed to pull a significant token below
/// the combiner's minimum strength; 0 for tokens that are not significant
pub fn declassification_distance(
    model: &ProbabilityModel,
    corpus: CorpusStats,
    spam: u32,
    ham: u32,
    prob: f64,
) -> u32 {
    if model.token_probability(spam, ham, corpus).is_none() {
        return 0;
    }

    let min_strength = model.combiner.min_prob_strength();
    if (prob - 0.5).abs() < min_strength {
        return 0;
    }

    // a: the class the token would have to gain, b: the class it leans to
    let (big_a, small_a, big_b, small_b) = if prob > 0.5 {
        (
            corpus.ham_count as f64,
            ham as f64,
            corpus.spam_count as f64,
            spam as f64,
        )
    } else {
        (
            corpus.spam_count as f64,
            spam as f64,
            corpus.ham_count as f64,
            ham as f64,
        )
    };
    let q = 0.5 - min_strength;

    if !model.smoothing {
        let exact = (1.0 - 1e-6 + small_b * big_a * q / (big_b * (1.0 - q))).floor() - small_a;
        return exact.max(0.0) as u32;
    }

    let s = model.combiner.s_constant();
    let x = model.combiner.x_constant();

    let a = big_b * (1.0 - q);
    let b = big_b * (s * x + small_b * (1.0 - q) - q * s) - q * big_a * small_b;
    let c = big_a * small_b * (s * x - q * (s + small_b));

    let discriminant = (b * b - 4.0 * a * c).max(0.0);
    let exact = 1.0 - 1e-6 + (-b + discriminant.sqrt()) / (2.0 * a) - small_a;

    if exact < 1.0 {
        1
    } else {
        exact as u32
    }
}
