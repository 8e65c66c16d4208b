//! Performance accounting for one sampling session.
//!
//! A session is bracketed by `start_sampling`/`end_sampling`; in between the
//! controller records one entry per score draw, bucketed by how the draw was
//! produced. Sampling is single-producer, so one mutex is enough; the active
//! flag is atomic so snapshots never block behind a session.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Floor for the rate divisor so a zero-length session stays finite.
const TIME_EPSILON_MS: f64 = 1e-9;

/// How a score draw was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMethod {
    NeuralNetwork,
    Cache,
    Heuristic,
}

impl EvalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalMethod::NeuralNetwork => "neural_network",
            EvalMethod::Cache => "cache",
            EvalMethod::Heuristic => "heuristic",
        }
    }
}

/// Counters and derived rates for one sampling session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SamplingMetrics {
    pub requested_samples: u32,
    pub actual_samples: u32,
    pub neural_net_evaluations: u32,
    pub cached_evaluations: u32,
    pub heuristic_evaluations: u32,
    pub total_time_ms: f64,
    pub avg_time_per_sample_ms: f64,
    pub neural_net_time_ms: f64,
    pub samples_per_second: f64,
}

impl SamplingMetrics {
    pub fn reset(&mut self) {
        *self = SamplingMetrics::default();
    }

    /// Recomputes the per-sample average and throughput from the counters.
    pub fn finalize_derived(&mut self) {
        self.avg_time_per_sample_ms = self.total_time_ms / f64::from(self.actual_samples.max(1));
        self.samples_per_second =
            1000.0 * f64::from(self.actual_samples) / self.total_time_ms.max(TIME_EPSILON_MS);
    }
}

struct MonitorState {
    metrics: SamplingMetrics,
    start: Instant,
}

/// Thread-safe counters and timers for one sampling session at a time.
pub struct PerformanceMonitor {
    state: Mutex<MonitorState>,
    active: AtomicBool,
    enabled: AtomicBool,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        PerformanceMonitor::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        PerformanceMonitor {
            state: Mutex::new(MonitorState {
                metrics: SamplingMetrics::default(),
                start: Instant::now(),
            }),
            active: AtomicBool::new(false),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Resets all counters and opens a new session.
    pub fn start_sampling(&self, requested_samples: u32) {
        if !self.is_enabled() {
            return;
        }
        let mut state = self.state.lock().unwrap();
        state.metrics.reset();
        state.metrics.requested_samples = requested_samples;
        state.start = Instant::now();
        self.active.store(true, Ordering::SeqCst);
        log::debug!("sampling session started, {} samples requested", requested_samples);
    }

    /// Records one draw under the given bucket.
    pub fn record(&self, method: EvalMethod, time_ms: f64) {
        if !self.is_enabled() || !self.is_active() {
            return;
        }
        let mut state = self.state.lock().unwrap();
        state.metrics.actual_samples += 1;
        match method {
            EvalMethod::NeuralNetwork => {
                state.metrics.neural_net_evaluations += 1;
                state.metrics.neural_net_time_ms += time_ms;
            }
            EvalMethod::Cache => state.metrics.cached_evaluations += 1,
            EvalMethod::Heuristic => state.metrics.heuristic_evaluations += 1,
        }
    }

    /// String-token variant of `record`. Unknown tokens are bucketed as
    /// neural-network work so they stay visible in the expensive column.
    pub fn record_sample(&self, eval_method: &str, time_ms: f64) {
        let method = match eval_method {
            "neural_network" | "neural_net" => EvalMethod::NeuralNetwork,
            "cached" | "cache" => EvalMethod::Cache,
            "heuristic" => EvalMethod::Heuristic,
            other => {
                log::warn!("unknown evaluation method '{}', counting as neural_network", other);
                EvalMethod::NeuralNetwork
            }
        };
        self.record(method, time_ms);
    }

    pub fn record_neural_net_evaluation(&self, time_ms: f64) {
        self.record(EvalMethod::NeuralNetwork, time_ms);
    }

    pub fn record_cached_evaluation(&self) {
        self.record(EvalMethod::Cache, 0.0);
    }

    pub fn record_heuristic_evaluation(&self) {
        self.record(EvalMethod::Heuristic, 0.0);
    }

    /// Closes the session and freezes the derived rates.
    pub fn end_sampling(&self) {
        if !self.is_enabled() || !self.is_active() {
            return;
        }
        let mut state = self.state.lock().unwrap();
        state.metrics.total_time_ms = state.start.elapsed().as_secs_f64() * 1000.0;
        state.metrics.finalize_derived();
        self.active.store(false, Ordering::SeqCst);
        log::debug!(
            "sampling session ended: {}/{} samples in {:.2}ms",
            state.metrics.actual_samples,
            state.metrics.requested_samples,
            state.metrics.total_time_ms
        );
    }

    /// Snapshot of the current metrics. While a session is active the timing
    /// fields reflect the elapsed time so far; nothing is mutated.
    pub fn metrics(&self) -> SamplingMetrics {
        if !self.is_enabled() {
            return SamplingMetrics::default();
        }
        let state = self.state.lock().unwrap();
        let mut metrics = state.metrics.clone();
        if self.is_active() {
            metrics.total_time_ms = state.start.elapsed().as_secs_f64() * 1000.0;
            metrics.finalize_derived();
        }
        metrics
    }

    /// Appends the current metrics as one JSON object to `path`.
    pub fn export_metrics(&self, path: &Path) -> std::io::Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let metrics = self.metrics();
        let record = serde_json::json!({
            "timestamp": chrono::Utc::now().timestamp_millis(),
            "metrics": metrics,
        });
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", record)?;
        Ok(())
    }
}
