//! Move evaluation pipeline: cached backend result, fresh backend
//! evaluation, or the capture-and-center heuristic, in that order.

use super::{elapsed_ms, move_to_uci, SamplerController};
use crate::backend::{Backend, EvalError, EvalPosition};
use crate::debug_log::debug_log;
use crate::monitor::EvalMethod;
use rand_distr::{Distribution, Normal};
use shakmaty::{Chess, Move, Position, Square};
use std::time::Instant;

/// Standard deviation of the heuristic's sampling noise.
const HEURISTIC_NOISE_STD: f64 = 0.1;

impl SamplerController {
    /// Checks that a backend handle exists and answers its attribute query.
    /// Either failing routes evaluation to the heuristic.
    pub(crate) fn verify_backend_availability(&self) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            debug_log().log_warning("backend verification failed: no backend wired");
            return false;
        };
        match backend.attributes() {
            Ok(_) => true,
            Err(e) => {
                debug_log().log_warning(&format!("backend verification failed: {}", e));
                log::warn!("path integral: backend verification failed: {}", e);
                false
            }
        }
    }

    /// Scores the position after `m` with the value head, preferring cached
    /// backend results, and reports where the score came from.
    pub(crate) fn evaluate_move(&self, pos: &Chess, m: &Move) -> (f64, EvalMethod) {
        if self.verify_backend_availability() {
            // verify_backend_availability just proved the handle exists
            if let Some(backend) = self.backend.as_ref() {
                match self.backend_value(backend.as_ref(), pos, m) {
                    Ok(result) => return result,
                    Err(e) => {
                        debug_log().log_warning(&format!(
                            "neural network evaluation failed for move {}: {}, \
                             falling back to heuristic",
                            move_to_uci(m),
                            e
                        ));
                    }
                }
            }
        }
        (heuristic_score(m), EvalMethod::Heuristic)
    }

    fn backend_value(
        &self,
        backend: &dyn Backend,
        pos: &Chess,
        m: &Move,
    ) -> Result<(f64, EvalMethod), EvalError> {
        let mut after = pos.clone();
        after.play_unchecked(m);
        let legal: Vec<Move> = after.legal_moves().iter().cloned().collect();
        let eval_pos = EvalPosition {
            pos: &after,
            legal_moves: &legal,
        };

        let start = Instant::now();
        if let Some(cached) = backend.cached_evaluation(eval_pos) {
            let time_ms = elapsed_ms(start);
            debug_log().log_nn_call(true, time_ms, Some("Q value retrieved from cache"));
            return Ok((cached.q, EvalMethod::Cache));
        }

        let results = backend.evaluate_batch(&[eval_pos])?;
        let time_ms = elapsed_ms(start);
        match results.first() {
            Some(result) => {
                debug_log().log_nn_call(false, time_ms, Some("Q value computed by backend"));
                Ok((result.q, EvalMethod::NeuralNetwork))
            }
            None => {
                debug_log().log_nn_call(
                    false,
                    time_ms,
                    Some("evaluation returned empty results"),
                );
                Err(EvalError::EvaluationFailed("empty batch result".to_string()))
            }
        }
    }

    /// Policy-head probability of `m` among the legal moves of `pos`.
    /// Misses and backend failures return the uniform prior.
    pub(crate) fn evaluate_move_policy(&self, pos: &Chess, m: &Move) -> (f64, EvalMethod) {
        let legal: Vec<Move> = pos.legal_moves().iter().cloned().collect();

        if self.verify_backend_availability() {
            if let Some(backend) = self.backend.as_ref() {
                match self.backend_policy(backend.as_ref(), pos, &legal, m) {
                    Ok(result) => return result,
                    Err(e) => {
                        debug_log().log_warning(&format!(
                            "policy evaluation failed for move {}: {}, \
                             falling back to uniform",
                            move_to_uci(m),
                            e
                        ));
                    }
                }
            }
        }

        (1.0 / legal.len().max(1) as f64, EvalMethod::Heuristic)
    }

    fn backend_policy(
        &self,
        backend: &dyn Backend,
        pos: &Chess,
        legal: &[Move],
        m: &Move,
    ) -> Result<(f64, EvalMethod), EvalError> {
        let eval_pos = EvalPosition {
            pos,
            legal_moves: legal,
        };

        let start = Instant::now();
        if let Some(cached) = backend.cached_evaluation(eval_pos) {
            let time_ms = elapsed_ms(start);
            if let Some(p) = policy_for_move(legal, &cached.p, m) {
                debug_log().log_nn_call(true, time_ms, Some("policy retrieved from cache"));
                return Ok((p, EvalMethod::Cache));
            }
            debug_log().log_warning(&format!(
                "move {} not found in cached policy, trying fresh evaluation",
                move_to_uci(m)
            ));
        }

        let results = backend.evaluate_batch(&[eval_pos])?;
        let time_ms = elapsed_ms(start);
        let Some(result) = results.first() else {
            return Err(EvalError::EvaluationFailed("empty batch result".to_string()));
        };
        match policy_for_move(legal, &result.p, m) {
            Some(p) => {
                debug_log().log_nn_call(false, time_ms, Some("policy computed by backend"));
                Ok((p, EvalMethod::NeuralNetwork))
            }
            None => Err(EvalError::EvaluationFailed(format!(
                "move {} missing from policy output",
                move_to_uci(m)
            ))),
        }
    }
}

fn policy_for_move(legal: &[Move], p: &[f64], m: &Move) -> Option<f64> {
    legal
        .iter()
        .position(|candidate| candidate == m)
        .and_then(|idx| p.get(idx).copied())
}

/// Capture-and-center scoring used when no backend is reachable: +1.0 for a
/// capture (en passant included), +0.5 for landing on a central square, plus
/// Gaussian noise so repeated draws actually vary.
fn heuristic_score(m: &Move) -> f64 {
    let mut score = 0.0;
    if m.is_capture() {
        score += 1.0;
    }
    if matches!(m.to(), Square::D4 | Square::E4 | Square::D5 | Square::E5) {
        score += 0.5;
    }
    let noise = Normal::new(0.0, HEURISTIC_NOISE_STD).unwrap();
    score + noise.sample(&mut rand::thread_rng())
}
