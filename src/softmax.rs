//! Temperature-controlled softmax over move scores.
//!
//! The sampler leans on this for reproducible move probabilities, so the
//! recipe is fixed: subtract the maximum score, scale by lambda, clamp the
//! exponent argument, normalize through log-sum-exp. Anything that would
//! produce a non-finite result degrades to the uniform distribution instead
//! of propagating an error.

use crate::config::{MAX_LAMBDA, MIN_LAMBDA};

/// Upper bound on the exponent argument; exp(700) is still finite in f64.
const EXP_ARG_MAX: f64 = 700.0;
const EXP_ARG_MIN: f64 = -700.0;

/// Refuse absurdly large inputs outright.
const MAX_SCORES: usize = 1_000_000;

/// Converts raw move scores into a probability distribution.
///
/// Length-preserving. Returns the uniform distribution when the input is
/// empty-adjacent (non-finite entries, out-of-range lambda, overflow in the
/// normalization). Never panics.
pub fn softmax(scores: &[f64], lambda: f64) -> Vec<f64> {
    if !is_valid_input(scores) || !(MIN_LAMBDA..=MAX_LAMBDA).contains(&lambda) {
        log::warn!(
            "softmax fallback: invalid input (len={}, lambda={})",
            scores.len(),
            lambda
        );
        return uniform(scores.len());
    }

    let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max_score.is_finite() {
        log::warn!("softmax fallback: non-finite maximum score");
        return uniform(scores.len());
    }

    // All-equal scores short-circuit to the exact uniform answer; going
    // through exp/ln would cost a rounding error on the 1/n entries.
    if scores.iter().all(|&s| s == max_score) {
        return uniform(scores.len());
    }

    let scaled: Vec<f64> = scores
        .iter()
        .map(|s| ((s - max_score) * lambda).clamp(EXP_ARG_MIN, EXP_ARG_MAX))
        .collect();

    let sum_exp: f64 = scaled.iter().map(|s| s.exp()).sum();
    if sum_exp <= 0.0 || !sum_exp.is_finite() {
        log::warn!("softmax fallback: degenerate exponential sum");
        return uniform(scores.len());
    }

    let log_sum_exp = sum_exp.ln();
    if !log_sum_exp.is_finite() {
        log::warn!("softmax fallback: non-finite log-sum-exp");
        return uniform(scores.len());
    }

    let probabilities: Vec<f64> = scaled.iter().map(|s| (s - log_sum_exp).exp()).collect();
    if probabilities.iter().any(|p| !p.is_finite()) {
        log::warn!("softmax fallback: non-finite probability");
        return uniform(scores.len());
    }

    probabilities
}

/// Uniform distribution of the given length; empty for n = 0.
pub fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

fn is_valid_input(scores: &[f64]) -> bool {
    !scores.is_empty() && scores.len() <= MAX_SCORES && scores.iter().all(|s| s.is_finite())
}
