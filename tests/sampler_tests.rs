//! End-to-end tests for the sampling controller.

use goshawk::backend::CountingBackend;
use goshawk::config::{RewardMode, SamplerConfig, SamplerOptions, SamplingMode};
use goshawk::sampler::{position_from_fen, SamplerController, SearchLimits};
use shakmaty::{Chess, Move, Position};
use std::sync::Arc;

const ITALIAN_FEN: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/3P1N2/PPP2PPP/RNBQK2R w KQkq - 0 1";

fn controller(lambda: f64, samples: u32, mode: SamplingMode) -> SamplerController {
    let options = SamplerOptions {
        lambda,
        samples,
        sampling_mode: mode,
        ..SamplerOptions::default()
    };
    SamplerController::new(&options, None)
}

fn legal_moves(pos: &Chess) -> Vec<Move> {
    pos.legal_moves().iter().cloned().collect()
}

#[test]
fn test_startpos_competitive_sampling() {
    let pos = Chess::default();
    let legal = legal_moves(&pos);
    let controller = controller(0.1, 5, SamplingMode::Competitive);

    let selected = controller.select_move(&pos, &SearchLimits::default());
    let selected = selected.expect("enabled sampler must select a move");
    assert!(legal.contains(&selected), "selected move must be legal");

    let metrics = controller.last_sampling_metrics();
    let expected = 5 * legal.len() as u32;
    assert_eq!(metrics.requested_samples, expected);
    assert_eq!(metrics.actual_samples, expected);
    // No backend wired: every draw must come from the heuristic.
    assert_eq!(metrics.heuristic_evaluations, expected);
    assert_eq!(metrics.neural_net_evaluations, 0);
    assert_eq!(metrics.cached_evaluations, 0);
    assert!(metrics.total_time_ms > 0.0);
}

#[test]
fn test_extreme_lambda_single_sample() {
    let pos = Chess::default();
    let legal = legal_moves(&pos);
    let controller = controller(10.0, 1, SamplingMode::Competitive);

    let selected = controller.select_move(&pos, &SearchLimits::default());
    assert!(legal.contains(&selected.expect("selection must succeed")));

    let metrics = controller.last_sampling_metrics();
    // Exactly one draw per legal move.
    assert_eq!(metrics.actual_samples, legal.len() as u32);
}

#[test]
fn test_quantum_limit_hybrid_sampling() {
    let pos = position_from_fen(ITALIAN_FEN).unwrap();
    let legal = legal_moves(&pos);

    let options = SamplerOptions {
        lambda: 0.1,
        samples: 3,
        sampling_mode: SamplingMode::QuantumLimit,
        reward_mode: RewardMode::Hybrid,
        ..SamplerOptions::default()
    };
    let controller = SamplerController::new(&options, None);

    let selected = controller.select_move(&pos, &SearchLimits::default());
    assert!(legal.contains(&selected.expect("selection must succeed")));

    let metrics = controller.last_sampling_metrics();
    assert_eq!(metrics.actual_samples, 3 * legal.len() as u32);
    assert_eq!(metrics.heuristic_evaluations, metrics.actual_samples);
}

#[test]
fn test_quantum_limit_policy_and_cp_modes() {
    let pos = Chess::default();
    for reward_mode in [RewardMode::Policy, RewardMode::CpScore] {
        let options = SamplerOptions {
            samples: 2,
            sampling_mode: SamplingMode::QuantumLimit,
            reward_mode,
            ..SamplerOptions::default()
        };
        let controller = SamplerController::new(&options, None);
        let selected = controller.select_move(&pos, &SearchLimits::default());
        assert!(selected.is_some(), "reward mode {:?} must select", reward_mode);
    }
}

#[test]
fn test_disabled_sampler_returns_none() {
    let options = SamplerOptions {
        samples: 0,
        ..SamplerOptions::default()
    };
    let controller = SamplerController::new(&options, None);
    assert!(!controller.is_enabled());
    assert!(controller.select_move(&Chess::default(), &SearchLimits::default()).is_none());
}

#[test]
fn test_integrity_gate_rejects_zero_samples() {
    let mut controller = controller(0.1, 5, SamplingMode::Competitive);
    controller.set_config(SamplerConfig {
        samples: 0,
        enabled: true,
        ..SamplerConfig::default()
    });
    assert!(controller.select_move(&Chess::default(), &SearchLimits::default()).is_none());
}

#[test]
fn test_checkmate_position_returns_none() {
    // Fool's mate: White has no legal moves.
    let pos = position_from_fen(
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
    )
    .unwrap();
    assert!(legal_moves(&pos).is_empty());

    let controller = controller(0.1, 5, SamplingMode::Competitive);
    assert!(controller.select_move(&pos, &SearchLimits::default()).is_none());
}

#[test]
fn test_single_legal_move_is_selected() {
    // White king on a1 in check from the b2 queen; Kxb2 is the only move.
    let pos = position_from_fen("k7/8/8/8/8/8/1q6/K7 w - - 0 1").unwrap();
    let legal = legal_moves(&pos);
    assert_eq!(legal.len(), 1);

    let controller = controller(0.1, 3, SamplingMode::Competitive);
    let selected = controller.select_move(&pos, &SearchLimits::default());
    assert_eq!(selected.as_ref(), Some(&legal[0]));
}

#[test]
fn test_backend_fresh_evaluations_are_counted() {
    let pos = Chess::default();
    let legal_count = legal_moves(&pos).len() as u32;
    let backend = Arc::new(CountingBackend::new(0.3));

    let options = SamplerOptions {
        samples: 2,
        ..SamplerOptions::default()
    };
    let controller = SamplerController::new(&options, Some(backend.clone()));
    controller.select_move(&pos, &SearchLimits::default()).expect("selection");

    let metrics = controller.last_sampling_metrics();
    assert_eq!(metrics.neural_net_evaluations, 2 * legal_count);
    assert_eq!(metrics.cached_evaluations, 0);
    assert_eq!(metrics.heuristic_evaluations, 0);
    assert_eq!(backend.batch_evaluations(), 2 * legal_count);
}

#[test]
fn test_backend_cache_hits_are_counted() {
    let pos = Chess::default();
    let legal_count = legal_moves(&pos).len() as u32;
    let backend = Arc::new(CountingBackend::with_cache(0.3));

    let options = SamplerOptions {
        samples: 2,
        ..SamplerOptions::default()
    };
    let controller = SamplerController::new(&options, Some(backend.clone()));
    controller.select_move(&pos, &SearchLimits::default()).expect("selection");

    let metrics = controller.last_sampling_metrics();
    assert_eq!(metrics.cached_evaluations, 2 * legal_count);
    assert_eq!(metrics.neural_net_evaluations, 0);
    assert_eq!(backend.batch_evaluations(), 0);
}

#[test]
fn test_dead_backend_routes_to_heuristic() {
    let pos = Chess::default();
    let legal_count = legal_moves(&pos).len() as u32;
    let backend = Arc::new(CountingBackend::new(0.3));
    backend.set_failing(true);

    let options = SamplerOptions {
        samples: 1,
        ..SamplerOptions::default()
    };
    let controller = SamplerController::new(&options, Some(backend));
    controller.select_move(&pos, &SearchLimits::default()).expect("selection");

    let metrics = controller.last_sampling_metrics();
    assert_eq!(metrics.heuristic_evaluations, legal_count);
    assert_eq!(metrics.neural_net_evaluations, 0);
}

#[test]
fn test_non_finite_backend_scores_drop_every_draw() {
    // A backend that answers NaN produces no valid draws: every move is
    // dropped from the result set and selection falls back to the caller.
    let backend = Arc::new(CountingBackend::new(f64::NAN));
    let options = SamplerOptions {
        samples: 2,
        ..SamplerOptions::default()
    };
    let controller = SamplerController::new(&options, Some(backend));

    assert!(controller.select_move(&Chess::default(), &SearchLimits::default()).is_none());
    let metrics = controller.last_sampling_metrics();
    assert_eq!(metrics.actual_samples, 0);
    assert!(metrics.requested_samples > 0);
}

#[test]
fn test_export_performance_metrics() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let controller = controller(0.1, 2, SamplingMode::Competitive);
    controller
        .select_move(&Chess::default(), &SearchLimits::default())
        .expect("selection");
    controller.export_performance_metrics(file.path()).unwrap();

    let contents = std::fs::read_to_string(file.path()).unwrap();
    let record: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
    assert_eq!(record["metrics"]["actual_samples"], 2 * 20u32);
}

#[test]
fn test_score_overload_rejects_length_mismatch() {
    let pos = Chess::default();
    let legal = legal_moves(&pos);
    let controller = controller(0.1, 5, SamplingMode::Competitive);
    assert!(controller.select_move_from_scores(&legal, &[1.0, 2.0], &pos).is_none());
    assert!(controller.select_move_from_scores(&[], &[], &pos).is_none());
}

#[test]
fn test_score_overload_quantum_limit_takes_argmax() {
    let pos = Chess::default();
    let legal = legal_moves(&pos);
    let scores: Vec<f64> = (0..legal.len()).map(|i| i as f64 * 0.1).collect();

    let controller = controller(1.0, 5, SamplingMode::QuantumLimit);
    let selected = controller.select_move_from_scores(&legal, &scores, &pos);
    assert_eq!(selected.as_ref(), Some(&legal[legal.len() - 1]));
}

#[test]
fn test_score_overload_accounts_draws_as_cached() {
    let pos = Chess::default();
    let legal = legal_moves(&pos);
    let scores: Vec<f64> = (0..legal.len()).map(|i| i as f64 * 0.1).collect();

    let controller = controller(1.0, 5, SamplingMode::QuantumLimit);
    controller
        .select_move_from_scores(&legal, &scores, &pos)
        .expect("selection");

    // The call just made owns the metrics: one cached draw per move.
    let metrics = controller.last_sampling_metrics();
    assert_eq!(metrics.requested_samples, legal.len() as u32);
    assert_eq!(metrics.actual_samples, legal.len() as u32);
    assert_eq!(metrics.cached_evaluations, legal.len() as u32);
    assert_eq!(metrics.neural_net_evaluations, 0);
    assert_eq!(metrics.heuristic_evaluations, 0);
}

#[test]
fn test_score_overload_competitive_draws_from_distribution() {
    let pos = Chess::default();
    let legal = legal_moves(&pos);
    let scores: Vec<f64> = (0..legal.len()).map(|i| i as f64 * 0.1).collect();

    let controller = controller(1.0, 5, SamplingMode::Competitive);
    for _ in 0..10 {
        let selected = controller
            .select_move_from_scores(&legal, &scores, &pos)
            .expect("weighted draw must yield a move");
        assert!(legal.contains(&selected));
    }
}
