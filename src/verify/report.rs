//! Verification result and report types, plus the text/json/csv renderers.

use crate::config::SamplerConfig;
use crate::sampler::SearchLimits;
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;

/// Outcome of verifying one sampling run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationResult {
    pub samples_match_requested: bool,
    pub neural_net_used: bool,
    pub timing_reasonable: bool,
    pub backend_available: bool,
    pub sampling_completed: bool,

    pub requested_samples: u32,
    pub actual_samples: u32,
    pub neural_net_evaluations: u32,
    pub cached_evaluations: u32,
    pub heuristic_evaluations: u32,
    pub total_time_ms: f64,
    pub avg_time_per_sample_ms: f64,

    pub detailed_report: String,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,

    pub position_fen: String,
    pub config_used: SamplerConfig,
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        self.samples_match_requested && self.sampling_completed && self.errors.is_empty()
    }

    pub fn samples_per_second(&self) -> f64 {
        if self.total_time_ms > 0.0 {
            f64::from(self.actual_samples) * 1000.0 / self.total_time_ms
        } else {
            0.0
        }
    }
}

/// One verification scenario: a position, a configuration, and what to
/// expect from the run.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub position_fen: String,
    pub config: SamplerConfig,
    pub limits: SearchLimits,
    pub expect_neural_net_usage: bool,
    pub min_expected_time_ms: f64,
    pub max_expected_time_ms: f64,
}

impl TestScenario {
    pub fn new(name: &str, position_fen: &str, config: SamplerConfig) -> Self {
        TestScenario {
            name: name.to_string(),
            position_fen: position_fen.to_string(),
            config,
            limits: SearchLimits::default(),
            expect_neural_net_usage: true,
            min_expected_time_ms: 0.0,
            max_expected_time_ms: 10_000.0,
        }
    }
}

/// Aggregate of a whole verification suite.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComprehensiveVerificationReport {
    pub individual_results: Vec<VerificationResult>,

    pub total_tests: u32,
    pub passed_tests: u32,
    pub failed_tests: u32,
    pub warnings_count: u32,
    pub errors_count: u32,

    pub avg_samples_per_second: f64,
    pub min_samples_per_second: f64,
    pub max_samples_per_second: f64,

    pub tests_with_neural_net: u32,
    pub tests_with_heuristics_only: u32,

    pub summary_report: String,
    pub generated_at: String,
}

impl ComprehensiveVerificationReport {
    pub fn is_overall_success(&self) -> bool {
        self.failed_tests == 0 && self.errors_count == 0
    }
}

/// Per-result detailed block of the text report.
pub fn render_result_text(result: &VerificationResult) -> String {
    let yes_no = |b: bool| if b { "YES" } else { "NO" };
    let mut report = String::new();

    writeln!(report, "=== Path Integral Sampling Verification Report ===").ok();
    writeln!(report, "Position: {}", result.position_fen).ok();
    writeln!(report, "Configuration:").ok();
    writeln!(report, "  - Lambda: {}", result.config_used.lambda).ok();
    writeln!(report, "  - Samples: {}", result.config_used.samples).ok();
    writeln!(report, "  - Mode: {}", result.config_used.sampling_mode).ok();
    writeln!(report, "  - Reward Mode: {}", result.config_used.reward_mode).ok();
    writeln!(report).ok();

    writeln!(report, "Results:").ok();
    writeln!(report, "  - Sampling Completed: {}", yes_no(result.sampling_completed)).ok();
    writeln!(report, "  - Samples Match Requested: {}", yes_no(result.samples_match_requested)).ok();
    writeln!(report, "  - Neural Network Used: {}", yes_no(result.neural_net_used)).ok();
    writeln!(report, "  - Timing Reasonable: {}", yes_no(result.timing_reasonable)).ok();
    writeln!(report, "  - Backend Available: {}", yes_no(result.backend_available)).ok();
    writeln!(report).ok();

    writeln!(report, "Performance Metrics:").ok();
    writeln!(report, "  - Requested Samples: {}", result.requested_samples).ok();
    writeln!(report, "  - Actual Samples: {}", result.actual_samples).ok();
    writeln!(report, "  - Neural Net Evaluations: {}", result.neural_net_evaluations).ok();
    writeln!(report, "  - Cached Evaluations: {}", result.cached_evaluations).ok();
    writeln!(report, "  - Heuristic Evaluations: {}", result.heuristic_evaluations).ok();
    writeln!(report, "  - Total Time: {:.3} ms", result.total_time_ms).ok();
    writeln!(report, "  - Avg Time per Sample: {:.3} ms", result.avg_time_per_sample_ms).ok();
    writeln!(report, "  - Samples per Second: {:.1}", result.samples_per_second()).ok();
    writeln!(report).ok();

    if !result.warnings.is_empty() {
        writeln!(report, "Warnings:").ok();
        for warning in &result.warnings {
            writeln!(report, "  - {}", warning).ok();
        }
        writeln!(report).ok();
    }
    if !result.errors.is_empty() {
        writeln!(report, "Errors:").ok();
        for error in &result.errors {
            writeln!(report, "  - {}", error).ok();
        }
        writeln!(report).ok();
    }

    writeln!(report, "Overall Result: {}", if result.is_valid() { "PASS" } else { "FAIL" }).ok();
    report
}

/// Suite summary block of the text report.
pub fn render_summary_text(report: &ComprehensiveVerificationReport) -> String {
    let mut summary = String::new();
    writeln!(summary, "=== Comprehensive Verification Summary ===").ok();
    writeln!(summary, "Total Tests: {}", report.total_tests).ok();
    writeln!(summary, "Passed: {}", report.passed_tests).ok();
    writeln!(summary, "Failed: {}", report.failed_tests).ok();
    writeln!(summary, "Warnings: {}", report.warnings_count).ok();
    writeln!(summary, "Errors: {}", report.errors_count).ok();
    writeln!(summary).ok();
    writeln!(summary, "Performance Analysis:").ok();
    writeln!(summary, "  - Average Samples/sec: {:.1}", report.avg_samples_per_second).ok();
    writeln!(summary, "  - Min Samples/sec: {:.1}", report.min_samples_per_second).ok();
    writeln!(summary, "  - Max Samples/sec: {:.1}", report.max_samples_per_second).ok();
    writeln!(summary).ok();
    writeln!(summary, "Backend Usage:").ok();
    writeln!(summary, "  - Tests with Neural Net: {}", report.tests_with_neural_net).ok();
    writeln!(summary, "  - Tests with Heuristics Only: {}", report.tests_with_heuristics_only).ok();
    writeln!(summary).ok();
    writeln!(
        summary,
        "Overall Result: {}",
        if report.is_overall_success() { "SUCCESS" } else { "FAILURE" }
    )
    .ok();
    summary
}

/// Full text report: summary followed by every detailed block.
pub fn render_text(report: &ComprehensiveVerificationReport) -> String {
    let mut text = String::new();
    text.push_str(&report.summary_report);
    text.push_str("\n\n=== Individual Test Results ===\n");
    for result in &report.individual_results {
        text.push_str(&result.detailed_report);
        text.push_str("\n----------------------------------------\n");
    }
    text
}

/// Machine-readable JSON report.
pub fn render_json(report: &ComprehensiveVerificationReport) -> String {
    let individual: Vec<serde_json::Value> = report
        .individual_results
        .iter()
        .map(|result| {
            json!({
                "position_fen": result.position_fen,
                "requested_samples": result.requested_samples,
                "actual_samples": result.actual_samples,
                "total_time_ms": result.total_time_ms,
                "samples_per_second": result.samples_per_second(),
                "is_valid": result.is_valid(),
                "neural_net_evaluations": result.neural_net_evaluations,
                "cached_evaluations": result.cached_evaluations,
                "heuristic_evaluations": result.heuristic_evaluations,
            })
        })
        .collect();

    let value = json!({
        "summary": {
            "total_tests": report.total_tests,
            "passed_tests": report.passed_tests,
            "failed_tests": report.failed_tests,
            "warnings_count": report.warnings_count,
            "errors_count": report.errors_count,
            "avg_samples_per_second": report.avg_samples_per_second,
            "overall_success": report.is_overall_success(),
        },
        "individual_results": individual,
    });

    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

/// One row per result, spreadsheet-friendly.
pub fn render_csv(report: &ComprehensiveVerificationReport) -> String {
    let mut csv = String::from(
        "Position,Requested_Samples,Actual_Samples,Total_Time_ms,Samples_Per_Second,\
         Neural_Net_Evaluations,Cached_Evaluations,Heuristic_Evaluations,\
         Is_Valid,Warnings_Count,Errors_Count\n",
    );
    for result in &report.individual_results {
        writeln!(
            csv,
            "\"{}\",{},{},{},{},{},{},{},{},{},{}",
            result.position_fen,
            result.requested_samples,
            result.actual_samples,
            result.total_time_ms,
            result.samples_per_second(),
            result.neural_net_evaluations,
            result.cached_evaluations,
            result.heuristic_evaluations,
            if result.is_valid() { "1" } else { "0" },
            result.warnings.len(),
            result.errors.len(),
        )
        .ok();
    }
    csv
}
