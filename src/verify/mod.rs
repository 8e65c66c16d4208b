//! Verification harness.
//!
//! Drives the sampling controller end-to-end across positions and
//! configurations, checks that the requested work actually happened
//! (sample counts, evaluation sources, timing), and aggregates everything
//! into an exportable report. The harness never aborts a suite: scenario
//! failures are recorded on the individual result and the run continues.

mod report;
mod scenarios;

pub use report::{ComprehensiveVerificationReport, TestScenario, VerificationResult};
pub use scenarios::{
    default_test_positions, edge_case_scenarios, performance_scenarios, standard_scenarios,
};

use crate::backend::Backend;
use crate::config::{ExportFormat, SamplerConfig, SamplerOptions};
use crate::monitor::SamplingMetrics;
use crate::sampler::{elapsed_ms, position_to_fen, SamplerController, SearchLimits};
use report::{render_csv, render_json, render_result_text, render_summary_text, render_text};
use shakmaty::Chess;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Below this per-sample average the run probably skipped real work.
const MIN_REASONABLE_TIME_PER_SAMPLE_MS: f64 = 0.001;
/// Above this per-sample average something is badly wrong.
const MAX_REASONABLE_TIME_PER_SAMPLE_MS: f64 = 1000.0;
/// Accepted deviation between requested and performed samples.
const SAMPLE_COUNT_TOLERANCE_PERCENT: f64 = 5.0;

const DEFAULT_OUTPUT_DIR: &str = "./verification_reports";

/// Exercises a controller across verification scenarios and builds reports.
pub struct SamplingVerifier {
    controller: SamplerController,
    backend: Option<Arc<dyn Backend>>,
    options: SamplerOptions,
    verbose: bool,
    output_dir: PathBuf,
}

impl SamplingVerifier {
    pub fn new(options: &SamplerOptions) -> Self {
        SamplingVerifier {
            controller: SamplerController::new(options, None),
            backend: None,
            options: options.clone(),
            verbose: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Wires a backend in; the controller is rebuilt around it.
    pub fn set_backend(&mut self, backend: Arc<dyn Backend>) {
        self.backend = Some(backend.clone());
        self.controller = SamplerController::new(&self.options, Some(backend));
        log::info!("verifier: backend wired");
    }

    pub fn update_options(&mut self, options: &SamplerOptions) {
        self.options = options.clone();
        self.controller.update_options(options);
    }

    /// Runs one end-to-end selection under `config` and validates what the
    /// performance monitor observed.
    pub fn verify_sampling(
        &mut self,
        pos: &Chess,
        config: &SamplerConfig,
        limits: &SearchLimits,
    ) -> VerificationResult {
        run_verification(
            &mut self.controller,
            self.backend.is_some(),
            self.verbose,
            pos,
            config,
            limits,
            0.0,
            MAX_REASONABLE_TIME_PER_SAMPLE_MS * 10.0,
        )
    }

    fn verify_scenario(&mut self, scenario: &TestScenario) -> VerificationResult {
        let pos = match crate::sampler::position_from_fen(&scenario.position_fen) {
            Ok(pos) => pos,
            Err(e) => {
                let mut result = VerificationResult {
                    position_fen: scenario.position_fen.clone(),
                    config_used: scenario.config.clone(),
                    ..VerificationResult::default()
                };
                result.errors.push(format!("invalid FEN position: {}", e));
                return result;
            }
        };
        run_verification(
            &mut self.controller,
            self.backend.is_some(),
            self.verbose,
            &pos,
            &scenario.config,
            &scenario.limits,
            scenario.min_expected_time_ms,
            scenario.max_expected_time_ms,
        )
    }

    /// Every standard scenario against every given position (or the default
    /// position set when `fens` is empty).
    pub fn run_comprehensive_test(&mut self, fens: &[String]) -> ComprehensiveVerificationReport {
        let positions = if fens.is_empty() {
            default_test_positions()
        } else {
            fens.to_vec()
        };
        let scenarios = standard_scenarios();
        if self.verbose {
            log::info!(
                "running comprehensive test: {} positions x {} scenarios",
                positions.len(),
                scenarios.len()
            );
        }
        self.run_matrix(&positions, scenarios)
    }

    pub fn run_standard_test_suite(&mut self) -> ComprehensiveVerificationReport {
        self.run_comprehensive_test(&default_test_positions())
    }

    /// High sample counts over a subset of positions.
    pub fn run_performance_test_suite(&mut self) -> ComprehensiveVerificationReport {
        let mut positions = default_test_positions();
        positions.truncate(5);
        self.run_matrix(&positions, performance_scenarios())
    }

    /// Extreme parameter values over a subset of positions.
    pub fn run_edge_case_test_suite(&mut self) -> ComprehensiveVerificationReport {
        let mut positions = default_test_positions();
        positions.truncate(3);
        self.run_matrix(&positions, edge_case_scenarios())
    }

    fn run_matrix(
        &mut self,
        positions: &[String],
        scenarios: Vec<TestScenario>,
    ) -> ComprehensiveVerificationReport {
        let mut report = ComprehensiveVerificationReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            ..ComprehensiveVerificationReport::default()
        };
        for fen in positions {
            for scenario in &scenarios {
                let mut scenario = scenario.clone();
                scenario.position_fen = fen.clone();
                let result = self.verify_scenario(&scenario);
                report.individual_results.push(result);
            }
        }
        generate_summary_statistics(&mut report);
        report
    }

    /// Runs independent sampling sessions in parallel: one controller per
    /// thread, `runs_per_thread` verifications each, all on the starting
    /// position with a small sample count.
    pub fn run_concurrency_test(
        &self,
        threads: usize,
        runs_per_thread: usize,
    ) -> ComprehensiveVerificationReport {
        let mut report = ComprehensiveVerificationReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            ..ComprehensiveVerificationReport::default()
        };

        // Small sample count, debug settings inherited from the verifier so
        // the interleaved sessions land in the configured log sink.
        let options = SamplerOptions {
            samples: 3,
            ..self.options.clone()
        };
        let config = SamplerConfig::from_options(&options);
        let (sender, receiver) = crossbeam_channel::unbounded();

        std::thread::scope(|scope| {
            for _ in 0..threads {
                let sender = sender.clone();
                let options = options.clone();
                let config = config.clone();
                scope.spawn(move || {
                    let mut controller = SamplerController::new(&options, None);
                    for _ in 0..runs_per_thread {
                        let result = run_verification(
                            &mut controller,
                            false,
                            false,
                            &Chess::default(),
                            &config,
                            &SearchLimits::default(),
                            0.0,
                            MAX_REASONABLE_TIME_PER_SAMPLE_MS * 10.0,
                        );
                        sender.send(result).ok();
                    }
                });
            }
            drop(sender);
        });

        report.individual_results = receiver.iter().collect();
        generate_summary_statistics(&mut report);
        report
    }

    /// Writes `report` into the configured output directory, creating it if
    /// absent. Returns the written path.
    pub fn export_report(
        &self,
        report: &ComprehensiveVerificationReport,
        filename: &str,
        format: ExportFormat,
    ) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(filename);
        let contents = match format {
            ExportFormat::Json => render_json(report),
            ExportFormat::Csv => render_csv(report),
            ExportFormat::Text | ExportFormat::None => render_text(report),
        };
        std::fs::write(&path, contents)?;
        if self.verbose {
            log::info!("report exported to {}", path.display());
        }
        Ok(path)
    }
}

/// The verification core shared by the suites and the concurrency workers.
#[allow(clippy::too_many_arguments)]
fn run_verification(
    controller: &mut SamplerController,
    backend_available: bool,
    verbose: bool,
    pos: &Chess,
    config: &SamplerConfig,
    limits: &SearchLimits,
    min_expected_time_ms: f64,
    max_expected_time_ms: f64,
) -> VerificationResult {
    let mut result = VerificationResult {
        position_fen: position_to_fen(pos),
        config_used: config.clone(),
        requested_samples: config.samples,
        backend_available,
        ..VerificationResult::default()
    };

    if verbose {
        log::info!(
            "verifying sampling for {} with {} samples, lambda={}",
            result.position_fen,
            config.samples,
            config.lambda
        );
    }

    controller.set_config(config.clone());
    if !backend_available {
        result
            .warnings
            .push("no neural network backend available, using heuristic evaluation".to_string());
    }

    let start = Instant::now();
    let selected = controller.select_move(pos, limits);
    result.total_time_ms = elapsed_ms(start);

    let metrics = controller.last_sampling_metrics();
    result.sampling_completed = selected.is_some();
    result.actual_samples = metrics.actual_samples;
    result.neural_net_evaluations = metrics.neural_net_evaluations;
    result.cached_evaluations = metrics.cached_evaluations;
    result.heuristic_evaluations = metrics.heuristic_evaluations;
    result.avg_time_per_sample_ms = metrics.avg_time_per_sample_ms;

    result.samples_match_requested = validate_sample_counts(&metrics);
    result.neural_net_used = validate_neural_network_usage(&metrics, backend_available);
    result.timing_reasonable =
        validate_timing_reasonableness(&metrics, min_expected_time_ms, max_expected_time_ms);

    analyze_performance_metrics(&mut result, &metrics);
    result.detailed_report = render_result_text(&result);

    if verbose {
        log::info!(
            "verification completed: valid={}, samples={}/{}, time={:.2}ms",
            result.is_valid(),
            result.actual_samples,
            metrics.requested_samples,
            result.total_time_ms
        );
    }
    result
}

/// Performed sample count must stay within tolerance of the session's
/// requested total (per-move samples times legal moves).
fn validate_sample_counts(metrics: &SamplingMetrics) -> bool {
    if metrics.actual_samples == metrics.requested_samples {
        return true;
    }
    let tolerance = ((f64::from(metrics.requested_samples)
        * SAMPLE_COUNT_TOLERANCE_PERCENT
        / 100.0) as i64)
        .max(1);
    (i64::from(metrics.actual_samples) - i64::from(metrics.requested_samples)).abs() <= tolerance
}

fn validate_neural_network_usage(metrics: &SamplingMetrics, backend_available: bool) -> bool {
    if backend_available {
        metrics.neural_net_evaluations > 0 || metrics.cached_evaluations > 0
    } else {
        metrics.heuristic_evaluations > 0
    }
}

fn validate_timing_reasonableness(
    metrics: &SamplingMetrics,
    min_expected_time_ms: f64,
    max_expected_time_ms: f64,
) -> bool {
    if metrics.avg_time_per_sample_ms < MIN_REASONABLE_TIME_PER_SAMPLE_MS {
        return false;
    }
    if metrics.avg_time_per_sample_ms > MAX_REASONABLE_TIME_PER_SAMPLE_MS {
        return false;
    }
    if min_expected_time_ms > 0.0 && metrics.total_time_ms < min_expected_time_ms {
        return false;
    }
    if max_expected_time_ms > 0.0 && metrics.total_time_ms > max_expected_time_ms {
        return false;
    }
    true
}

/// Flags suspicious patterns in the metrics as warnings or errors.
fn analyze_performance_metrics(result: &mut VerificationResult, metrics: &SamplingMetrics) {
    if result.backend_available && metrics.neural_net_evaluations == 0 {
        result
            .warnings
            .push("backend available but no neural network evaluations performed".to_string());
    }
    if metrics.actual_samples > 0 && metrics.avg_time_per_sample_ms < 0.01 {
        result.warnings.push(
            "extremely fast sampling detected, verify computation is actually performed"
                .to_string(),
        );
    }
    if metrics.actual_samples != metrics.requested_samples {
        result.warnings.push(format!(
            "sample count mismatch: requested {}, actual {}",
            metrics.requested_samples, metrics.actual_samples
        ));
    }

    let total_evaluations = metrics.neural_net_evaluations
        + metrics.cached_evaluations
        + metrics.heuristic_evaluations;
    if total_evaluations == 0 {
        result
            .errors
            .push("no evaluations performed during sampling".to_string());
    } else if total_evaluations < metrics.actual_samples {
        result
            .warnings
            .push("fewer evaluations than samples, possible evaluation reuse".to_string());
    }
}

fn generate_summary_statistics(report: &mut ComprehensiveVerificationReport) {
    report.total_tests = report.individual_results.len() as u32;
    report.passed_tests = 0;
    report.failed_tests = 0;
    report.warnings_count = 0;
    report.errors_count = 0;
    report.tests_with_neural_net = 0;
    report.tests_with_heuristics_only = 0;

    let mut rates: Vec<f64> = Vec::new();
    for result in &report.individual_results {
        if result.is_valid() {
            report.passed_tests += 1;
        } else {
            report.failed_tests += 1;
        }
        report.warnings_count += result.warnings.len() as u32;
        report.errors_count += result.errors.len() as u32;
        if result.neural_net_used && result.backend_available {
            report.tests_with_neural_net += 1;
        } else {
            report.tests_with_heuristics_only += 1;
        }
        let rate = result.samples_per_second();
        if rate > 0.0 {
            rates.push(rate);
        }
    }

    if !rates.is_empty() {
        rates.sort_by(|a, b| a.total_cmp(b));
        report.min_samples_per_second = rates[0];
        report.max_samples_per_second = rates[rates.len() - 1];
        report.avg_samples_per_second = rates.iter().sum::<f64>() / rates.len() as f64;
    }

    report.summary_report = render_summary_text(report);
}
