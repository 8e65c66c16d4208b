//! Tests for the sampling performance monitor.

use goshawk::monitor::{EvalMethod, PerformanceMonitor};

#[test]
fn test_records_ignored_while_idle() {
    let monitor = PerformanceMonitor::new();
    monitor.record(EvalMethod::NeuralNetwork, 1.0);
    monitor.record_heuristic_evaluation();
    monitor.end_sampling();

    let metrics = monitor.metrics();
    assert_eq!(metrics.actual_samples, 0);
    assert_eq!(metrics.neural_net_evaluations, 0);
    assert_eq!(metrics.heuristic_evaluations, 0);
}

#[test]
fn test_bucket_accounting_invariant() {
    let monitor = PerformanceMonitor::new();
    monitor.start_sampling(10);
    monitor.record(EvalMethod::NeuralNetwork, 2.0);
    monitor.record(EvalMethod::NeuralNetwork, 3.0);
    monitor.record(EvalMethod::Cache, 0.1);
    monitor.record(EvalMethod::Heuristic, 0.05);
    monitor.end_sampling();

    let metrics = monitor.metrics();
    assert_eq!(metrics.requested_samples, 10);
    assert_eq!(metrics.actual_samples, 4);
    assert_eq!(
        metrics.actual_samples,
        metrics.neural_net_evaluations + metrics.cached_evaluations + metrics.heuristic_evaluations
    );
    assert_eq!(metrics.neural_net_evaluations, 2);
    assert_eq!(metrics.cached_evaluations, 1);
    assert_eq!(metrics.heuristic_evaluations, 1);
    assert!((metrics.neural_net_time_ms - 5.0).abs() < 1e-9);
}

#[test]
fn test_unknown_method_token_counts_as_neural_network() {
    let monitor = PerformanceMonitor::new();
    monitor.start_sampling(2);
    monitor.record_sample("warp_drive", 1.5);
    monitor.record_sample("cache", 0.0);
    monitor.end_sampling();

    let metrics = monitor.metrics();
    assert_eq!(metrics.neural_net_evaluations, 1);
    assert_eq!(metrics.cached_evaluations, 1);
    assert!((metrics.neural_net_time_ms - 1.5).abs() < 1e-9);
}

#[test]
fn test_direct_helpers() {
    let monitor = PerformanceMonitor::new();
    monitor.start_sampling(3);
    monitor.record_neural_net_evaluation(4.0);
    monitor.record_cached_evaluation();
    monitor.record_heuristic_evaluation();
    monitor.end_sampling();

    let metrics = monitor.metrics();
    assert_eq!(metrics.actual_samples, 3);
    assert_eq!(metrics.neural_net_evaluations, 1);
    assert_eq!(metrics.cached_evaluations, 1);
    assert_eq!(metrics.heuristic_evaluations, 1);
}

#[test]
fn test_live_snapshot_while_active() {
    let monitor = PerformanceMonitor::new();
    monitor.start_sampling(5);
    monitor.record(EvalMethod::Heuristic, 0.01);
    assert!(monitor.is_active());

    let live = monitor.metrics();
    assert_eq!(live.actual_samples, 1);
    // Snapshots must not close the session.
    assert!(monitor.is_active());

    monitor.record(EvalMethod::Heuristic, 0.01);
    monitor.end_sampling();
    assert!(!monitor.is_active());
    assert_eq!(monitor.metrics().actual_samples, 2);
}

#[test]
fn test_derived_rates() {
    let monitor = PerformanceMonitor::new();
    monitor.start_sampling(4);
    for _ in 0..4 {
        monitor.record(EvalMethod::Heuristic, 0.0);
    }
    monitor.end_sampling();

    let metrics = monitor.metrics();
    assert!(metrics.total_time_ms >= 0.0);
    let expected_avg = metrics.total_time_ms / metrics.actual_samples as f64;
    assert!((metrics.avg_time_per_sample_ms - expected_avg).abs() < 1e-9);
    assert!(metrics.samples_per_second > 0.0);
    assert!(metrics.samples_per_second.is_finite());
}

#[test]
fn test_start_sampling_resets_previous_session() {
    let monitor = PerformanceMonitor::new();
    monitor.start_sampling(2);
    monitor.record(EvalMethod::NeuralNetwork, 1.0);
    monitor.end_sampling();

    monitor.start_sampling(7);
    monitor.end_sampling();

    let metrics = monitor.metrics();
    assert_eq!(metrics.requested_samples, 7);
    assert_eq!(metrics.actual_samples, 0);
    assert_eq!(metrics.neural_net_evaluations, 0);
}

#[test]
fn test_disabled_monitor_is_inert() {
    let monitor = PerformanceMonitor::new();
    monitor.set_enabled(false);
    monitor.start_sampling(5);
    monitor.record(EvalMethod::Heuristic, 1.0);
    monitor.end_sampling();
    assert_eq!(monitor.metrics().actual_samples, 0);
}

#[test]
fn test_export_appends_json_records() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let monitor = PerformanceMonitor::new();

    monitor.start_sampling(2);
    monitor.record(EvalMethod::Heuristic, 0.1);
    monitor.record(EvalMethod::Heuristic, 0.1);
    monitor.end_sampling();

    monitor.export_metrics(file.path()).unwrap();
    monitor.export_metrics(file.path()).unwrap();

    let contents = std::fs::read_to_string(file.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value["timestamp"].is_number());
        assert_eq!(value["metrics"]["actual_samples"], 2);
        assert_eq!(value["metrics"]["requested_samples"], 2);
    }
}
