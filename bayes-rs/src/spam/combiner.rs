//! Combining per-token probabilities into one message score

use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

use crate::store::CorpusStats;

/// Rescale products once they drop below this
const UNDERFLOW_GUARD: f64 = 1e-200;

/// Probability combining algorithm
///
/// The algorithm also fixes the Robinson smoothing constants and the
/// minimum strength a token needs to take part in the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Combiner {
    /// Fisher/Robinson chi-square combining
    #[default]
    ChiSquare,
    /// Geometric-mean naive Bayes combining
    NaiveBayes,
}

impl Combiner {
    /// Strength of the background belief `s` in Robinson's f(w)
    pub fn s_constant(self) -> f64 {
        match self {
            Combiner::ChiSquare => 0.030,
            Combiner::NaiveBayes => 0.160,
        }
    }

    /// Assumed probability `x` of a token with no history
    pub fn x_constant(self) -> f64 {
        match self {
            Combiner::ChiSquare => 0.538,
            Combiner::NaiveBayes => 0.600,
        }
    }

    /// Tokens with `|p - 0.5|` below this are not significant
    pub fn min_prob_strength(self) -> f64 {
        match self {
            Combiner::ChiSquare => 0.346,
            Combiner::NaiveBayes => 0.430,
        }
    }

    /// Combine token probabilities, strongest first, into a score in [0, 1]
    ///
    /// An empty list gives the neutral 0.5.
    pub fn combine(self, corpus: CorpusStats, probs: &[f64]) -> f64 {
        if probs.is_empty() {
            return 0.5;
        }

        let score = match self {
            Combiner::ChiSquare => chi_square_combine(corpus, probs),
            Combiner::NaiveBayes => naive_bayes_combine(probs),
        };

        if score.is_nan() {
            0.5
        } else {
            score.clamp(0.0, 1.0)
        }
    }
}

fn chi_square_combine(corpus: CorpusStats, probs: &[f64]) -> f64 {
    let total = corpus.spam_count + corpus.ham_count;
    let (mut s, mut h) = if total == 0 {
        (0.5, 0.5)
    } else {
        (
            corpus.spam_count as f64 / total as f64,
            corpus.ham_count as f64 / total as f64,
        )
    };
    let mut s_exp: i32 = 0;
    let mut h_exp: i32 = 0;

    for &p in probs {
        s *= 1.0 - p;
        h *= p;

        if s < UNDERFLOW_GUARD {
            let (mantissa, exp) = frexp(s);
            s = mantissa;
            s_exp += exp;
        }
        if h < UNDERFLOW_GUARD {
            let (mantissa, exp) = frexp(h);
            h = mantissa;
            h_exp += exp;
        }
    }

    let ln_s = s.ln() + s_exp as f64 * LN_2;
    let ln_h = h.ln() + h_exp as f64 * LN_2;

    let k = probs.len();
    let spam = 1.0 - chi2q(-2.0 * ln_s, 2 * k);
    let ham = 1.0 - chi2q(-2.0 * ln_h, 2 * k);

    (spam - ham + 1.0) / 2.0
}

fn naive_bayes_combine(probs: &[f64]) -> f64 {
    let inv = 1.0 / probs.len() as f64;

    let mut p = 1.0;
    let mut q = 1.0;
    for &prob in probs {
        p *= (1.0 - prob).powf(inv);
        q *= prob.powf(inv);
    }
    let p = 1.0 - p;
    let q = 1.0 - q;

    if p + q == 0.0 {
        return 0.5;
    }
    (1.0 + (p - q) / (p + q)) / 2.0
}

/// Probability that a chi-square variate with `v` degrees of freedom
/// exceeds `x`; `v` must be even
pub fn chi2q(x: f64, v: usize) -> f64 {
    if x.is_infinite() {
        return 0.0;
    }

    let m = x / 2.0;
    let mut term = (-m).exp();
    let mut sum = term;

    for i in 1..v / 2 {
        term *= m / i as f64;
        sum += term;
    }

    sum.min(1.0)
}

/// Split `x` into a mantissa in [0.5, 1) and a power of two
///
/// Zero, infinities and NaN come back unchanged with exponent 0.
pub fn frexp(x: f64) -> (f64, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }

    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;

    if biased == 0 {
        // subnormal: normalize first
        let (mantissa, exp) = frexp(x * f64::from_bits(0x4350_0000_0000_0000));
        return (mantissa, exp - 54);
    }

    let mantissa = f64::from_bits((bits & !(0x7ff << 52)) | (1022 << 52));
    (mantissa, biased - 1022)
}
