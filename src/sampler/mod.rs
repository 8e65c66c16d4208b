//! Path-integral move sampling.
//!
//! The controller enumerates the legal moves of a position, draws a
//! configurable number of score samples per move through the evaluation
//! pipeline, converts the averaged scores into probabilities with the
//! temperature softmax, and selects a move. Two sampling modes share one
//! loop: competitive mode scores every draw with the value head (or the
//! heuristic), quantum-limit mode scores it through the configured reward
//! function.

mod eval;

use crate::backend::Backend;
use crate::config::{SamplerConfig, SamplerOptions};
use crate::debug_log::debug_log;
use crate::monitor::{EvalMethod, PerformanceMonitor, SamplingMetrics};
use crate::softmax::softmax;
use rand::distributions::{Distribution, WeightedIndex};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Warn above this many draws for a single move.
const MAX_SAMPLES_PER_MOVE: u32 = 10_000;
/// Warn above this many draws for a whole session.
const MAX_TOTAL_SAMPLES: u64 = 100_000;

/// Search bounds handed down by the engine shell. Carried through every
/// entry point for the callers that set them; the sampler itself bounds a
/// session by `samples x legal_moves`, not by the clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub movetime_ms: Option<u64>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
}

/// One move with its averaged sample score and (after softmax) probability.
#[derive(Debug, Clone)]
pub struct SampleResult {
    pub mv: Move,
    pub score: f64,
    pub probability: f64,
}

/// Renders a position as FEN.
pub fn position_to_fen(pos: &Chess) -> String {
    Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string()
}

/// Parses a FEN string into a playable position.
pub fn position_from_fen(fen: &str) -> Result<Chess, String> {
    let parsed: Fen = fen.parse().map_err(|e| format!("bad FEN '{}': {}", fen, e))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| format!("illegal position '{}': {}", fen, e))
}

/// Long-algebraic rendering of a move.
pub fn move_to_uci(m: &Move) -> String {
    m.to_uci(CastlingMode::Standard).to_string()
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Orchestrates one sampling session per move request.
pub struct SamplerController {
    config: SamplerConfig,
    monitor: PerformanceMonitor,
    backend: Option<Arc<dyn Backend>>,
}

impl SamplerController {
    pub fn new(options: &SamplerOptions, backend: Option<Arc<dyn Backend>>) -> Self {
        let mut controller = SamplerController {
            config: SamplerConfig::default(),
            monitor: PerformanceMonitor::new(),
            backend,
        };
        controller.update_options(options);
        controller
    }

    /// Replaces the configuration from an options bag and rewires the
    /// debug logger accordingly.
    pub fn update_options(&mut self, options: &SamplerOptions) {
        self.apply_config(SamplerConfig::from_options(options));
    }

    /// Replaces the configuration wholesale.
    pub fn set_config(&mut self, config: SamplerConfig) {
        self.apply_config(config);
    }

    fn apply_config(&mut self, config: SamplerConfig) {
        self.config = config;

        let logger = debug_log();
        logger.set_enabled(self.config.debug_logging);
        logger.set_stderr_echo(self.config.debug_logging);
        logger.set_output_file(self.config.metrics_file.as_deref());

        if self.config.enabled {
            if !self.config.is_valid() {
                log::warn!(
                    "path integral config out of range (lambda={}, samples={}); \
                     softmax will degrade to uniform",
                    self.config.lambda,
                    self.config.samples
                );
            }
            log::info!(
                "path integral enabled: lambda={} samples={} mode={} debug={}",
                self.config.lambda,
                self.config.samples,
                self.config.sampling_mode,
                if self.config.debug_logging { "on" } else { "off" }
            );
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Metrics of the most recent (or ongoing) sampling session.
    pub fn last_sampling_metrics(&self) -> SamplingMetrics {
        self.monitor.metrics()
    }

    /// Appends the current metrics to `path` as one JSON record.
    pub fn export_performance_metrics(&self, path: &Path) -> std::io::Result<()> {
        self.monitor.export_metrics(path)
    }

    /// Selects a move for `pos` by full sampling, or `None` when the sampler
    /// is disabled or anything along the way fails; the caller then runs its
    /// default search.
    pub fn select_move(&self, pos: &Chess, _limits: &SearchLimits) -> Option<Move> {
        if !self.config.enabled {
            return None;
        }

        let logger = debug_log();
        if self.config.debug_logging {
            logger.start_session(&position_to_fen(pos));
            log::info!(
                "path integral: selecting move, lambda={} samples={} mode={}",
                self.config.lambda,
                self.config.samples,
                self.config.sampling_mode
            );
        }

        let selected = self.run_sampling(pos);

        if self.config.debug_logging {
            logger.end_session();
        }
        selected
    }

    fn run_sampling(&self, pos: &Chess) -> Option<Move> {
        let legal: Vec<Move> = pos.legal_moves().iter().cloned().collect();
        if legal.is_empty() {
            debug_log().log_error("no legal moves available for sampling");
            log::error!("path integral: no legal moves available for sampling");
            return None;
        }

        let mut results = self.perform_sampling(pos, &legal);
        if results.is_empty() {
            return None;
        }
        self.select_from_sampling(&mut results)
    }

    /// The shared sampling loop: `samples` draws per legal move, averaged,
    /// with per-move and total sample-count verification.
    fn perform_sampling(&self, pos: &Chess, legal: &[Move]) -> Vec<SampleResult> {
        let logger = debug_log();
        let mut results = Vec::with_capacity(legal.len());

        if !self.validate_sample_count_integrity(self.config.samples, legal.len()) {
            logger.log_error("sample count integrity check failed, aborting sampling");
            return results;
        }

        let total_requested = u64::from(self.config.samples) * legal.len() as u64;
        self.monitor.start_sampling(total_requested as u32);

        let reward_mode = match self.config.sampling_mode {
            crate::config::SamplingMode::Competitive => None,
            crate::config::SamplingMode::QuantumLimit => Some(self.config.reward_mode.as_str()),
        };
        logger.log_sampling_start(
            self.config.samples,
            legal.len(),
            self.config.lambda,
            self.config.sampling_mode.as_str(),
            reward_mode,
        );
        log::debug!(
            "path integral: sampling {} legal moves with {} samples, lambda={}",
            legal.len(),
            self.config.samples,
            self.config.lambda
        );

        let mut total_performed: u64 = 0;
        for m in legal {
            let uci = move_to_uci(m);
            let mut total_score = 0.0;
            let mut valid_samples: u32 = 0;
            let mut attempted_samples: u32 = 0;

            for sample in 0..self.config.samples {
                attempted_samples += 1;
                let start = Instant::now();
                let (score, method) = self.draw_score(pos, m);
                let eval_time_ms = elapsed_ms(start);

                if score.is_finite() {
                    total_score += score;
                    valid_samples += 1;
                    total_performed += 1;
                    self.monitor.record(method, eval_time_ms);
                    logger.log_sample_evaluation(
                        &uci,
                        sample + 1,
                        score,
                        method.as_str(),
                        eval_time_ms,
                    );
                } else {
                    logger.log_warning(&format!(
                        "sample failed for move {}: non-finite score",
                        uci
                    ));
                }
            }

            if valid_samples != self.config.samples {
                logger.log_warning(&format!(
                    "sample count discrepancy for move {}: requested={}, actual={}, attempted={}",
                    uci, self.config.samples, valid_samples, attempted_samples
                ));
                log::warn!(
                    "path integral: move {} completed {}/{} samples",
                    uci,
                    valid_samples,
                    self.config.samples
                );
            } else {
                logger.log_info(&format!(
                    "move {} completed all {} samples successfully",
                    uci, self.config.samples
                ));
            }

            if valid_samples > 0 {
                results.push(SampleResult {
                    mv: m.clone(),
                    score: total_score / f64::from(valid_samples),
                    probability: 0.0,
                });
            }
        }

        if total_performed != total_requested {
            logger.log_warning(&format!(
                "total sample count discrepancy: requested={}, actual={}",
                total_requested, total_performed
            ));
            log::warn!(
                "path integral: total samples performed ({}) differs from requested ({})",
                total_performed,
                total_requested
            );
        } else {
            logger.log_info(&format!(
                "sample count verification passed: {} samples performed as requested",
                total_performed
            ));
        }

        self.monitor.end_sampling();

        let metrics = self.monitor.metrics();
        logger.log_sampling_complete(
            metrics.actual_samples,
            metrics.total_time_ms,
            metrics.neural_net_evaluations,
            metrics.cached_evaluations,
            metrics.heuristic_evaluations,
        );
        log::debug!(
            "path integral: {}/{} samples, {:.2}ms, {:.1} samples/sec",
            metrics.actual_samples,
            metrics.requested_samples,
            metrics.total_time_ms,
            metrics.samples_per_second
        );

        results
    }

    /// One score draw for `m`, routed by sampling and reward mode.
    fn draw_score(&self, pos: &Chess, m: &Move) -> (f64, EvalMethod) {
        use crate::config::{RewardMode, SamplingMode};
        match self.config.sampling_mode {
            SamplingMode::Competitive => self.evaluate_move(pos, m),
            SamplingMode::QuantumLimit => match self.config.reward_mode {
                RewardMode::Policy => self.evaluate_move_policy(pos, m),
                RewardMode::CpScore => self.evaluate_move(pos, m),
                RewardMode::Hybrid => {
                    let (policy, policy_method) = self.evaluate_move_policy(pos, m);
                    let (q, q_method) = self.evaluate_move(pos, m);
                    (policy * q, combine_methods(policy_method, q_method))
                }
            },
        }
    }

    /// Softmax over the averaged scores, then deterministic argmax.
    fn select_from_sampling(&self, results: &mut [SampleResult]) -> Option<Move> {
        let logger = debug_log();
        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
        let probabilities = softmax(&scores, self.config.lambda);
        logger.log_softmax(self.config.lambda, &scores, &probabilities);

        for (result, p) in results.iter_mut().zip(&probabilities) {
            result.probability = *p;
        }

        let (best_idx, best_prob) = probabilities
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(bi, bp), (i, &p)| {
                if p > bp {
                    (i, p)
                } else {
                    (bi, bp)
                }
            });

        let all: Vec<(String, f64)> = results
            .iter()
            .map(|r| (move_to_uci(&r.mv), r.probability))
            .collect();
        logger.log_move_selection(
            &move_to_uci(&results[best_idx].mv),
            best_prob,
            results[best_idx].score,
            &all,
        );
        log::debug!(
            "path integral: selected {} with probability {:.4} (score {:.4})",
            move_to_uci(&results[best_idx].mv),
            best_prob,
            results[best_idx].score
        );

        Some(results[best_idx].mv.clone())
    }

    /// Score-in, move-out variant for callers that already hold per-move
    /// scores from a search tree. Competitive mode draws from the softmax
    /// distribution (exploration is delegated here); quantum-limit mode
    /// takes the argmax. The batch is accounted like any other session: one
    /// draw per move, all cached, bracketed by its own debug session.
    pub fn select_move_from_scores(
        &self,
        legal_moves: &[Move],
        move_scores: &[f64],
        pos: &Chess,
    ) -> Option<Move> {
        if !self.config.enabled || legal_moves.is_empty() || move_scores.is_empty() {
            return None;
        }
        let logger = debug_log();
        if legal_moves.len() != move_scores.len() {
            logger.log_error("move count and score count mismatch");
            log::error!(
                "path integral: {} moves but {} scores",
                legal_moves.len(),
                move_scores.len()
            );
            return None;
        }

        if self.config.debug_logging {
            logger.start_session(&position_to_fen(pos));
        }

        // The scores came from an existing tree, so the whole batch counts
        // as cached work.
        self.monitor.start_sampling(legal_moves.len() as u32);
        for _ in legal_moves {
            self.monitor.record(EvalMethod::Cache, 0.0);
        }

        let reward_mode = match self.config.sampling_mode {
            crate::config::SamplingMode::Competitive => None,
            crate::config::SamplingMode::QuantumLimit => Some(self.config.reward_mode.as_str()),
        };
        logger.log_sampling_start(
            self.config.samples,
            legal_moves.len(),
            self.config.lambda,
            self.config.sampling_mode.as_str(),
            reward_mode,
        );

        let probabilities = softmax(move_scores, self.config.lambda);
        logger.log_softmax(self.config.lambda, move_scores, &probabilities);

        let selected_idx = match self.config.sampling_mode {
            crate::config::SamplingMode::Competitive => match WeightedIndex::new(&probabilities) {
                Ok(dist) => dist.sample(&mut rand::thread_rng()),
                Err(_) => argmax(&probabilities),
            },
            crate::config::SamplingMode::QuantumLimit => argmax(&probabilities),
        };

        let all: Vec<(String, f64)> = legal_moves
            .iter()
            .zip(&probabilities)
            .map(|(m, p)| (move_to_uci(m), *p))
            .collect();
        logger.log_move_selection(
            &move_to_uci(&legal_moves[selected_idx]),
            probabilities[selected_idx],
            move_scores[selected_idx],
            &all,
        );

        self.monitor.end_sampling();
        let metrics = self.monitor.metrics();
        logger.log_sampling_complete(
            metrics.actual_samples,
            metrics.total_time_ms,
            metrics.neural_net_evaluations,
            metrics.cached_evaluations,
            metrics.heuristic_evaluations,
        );

        if self.config.debug_logging {
            logger.end_session();
        }

        Some(legal_moves[selected_idx].clone())
    }

    /// Pre-sampling integrity gate. Hard failures return false; suspicious
    /// but workable configurations only warn.
    fn validate_sample_count_integrity(&self, requested: u32, legal_move_count: usize) -> bool {
        let logger = debug_log();

        if requested == 0 {
            logger.log_error("invalid sample count: 0 (must be > 0)");
            log::error!("path integral: invalid sample count 0 (must be > 0)");
            return false;
        }
        if requested > MAX_SAMPLES_PER_MOVE {
            logger.log_warning(&format!(
                "high sample count: {} (max recommended: {})",
                requested, MAX_SAMPLES_PER_MOVE
            ));
            log::warn!(
                "path integral: high sample count {} (max recommended: {})",
                requested,
                MAX_SAMPLES_PER_MOVE
            );
        }
        if legal_move_count == 0 {
            logger.log_error("no legal moves available for sampling");
            log::error!("path integral: no legal moves available for sampling");
            return false;
        }
        let total = u64::from(requested) * legal_move_count as u64;
        if total > MAX_TOTAL_SAMPLES {
            logger.log_warning(&format!(
                "high total sample count: {} ({} samples x {} moves, max recommended: {})",
                total, requested, legal_move_count, MAX_TOTAL_SAMPLES
            ));
            log::warn!(
                "path integral: high total sample count {} (max recommended: {})",
                total,
                MAX_TOTAL_SAMPLES
            );
        }
        logger.log_info(&format!(
            "sample count integrity check passed: {} samples per move, {} legal moves, {} total",
            requested, legal_move_count, total
        ));
        true
    }
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| {
            if v > bv {
                (i, v)
            } else {
                (bi, bv)
            }
        })
        .0
}

/// The hybrid reward touches two evaluations; count the draw under the most
/// expensive source involved.
fn combine_methods(a: EvalMethod, b: EvalMethod) -> EvalMethod {
    if a == EvalMethod::NeuralNetwork || b == EvalMethod::NeuralNetwork {
        EvalMethod::NeuralNetwork
    } else if a == EvalMethod::Cache || b == EvalMethod::Cache {
        EvalMethod::Cache
    } else {
        EvalMethod::Heuristic
    }
}
