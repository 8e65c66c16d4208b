//! Path-integral root-move sampling for neural chess engines.
//!
//! Given a position, the sampler enumerates the legal moves, draws a
//! configurable number of score samples per move from a neural backend (or
//! a capture-and-center heuristic when no backend is reachable), converts
//! the averaged scores into a probability distribution with a numerically
//! stable temperature softmax, and selects a move. Every step is accounted
//! for: a per-session performance monitor proves the requested sampling
//! work actually happened, a process-wide debug logger emits the session as
//! structured JSON events, and a verification harness drives the whole
//! pipeline across positions, configurations and threads.
//!
//! Chess rules come from `shakmaty`; neural inference stays behind the
//! [`backend::Backend`] trait.

pub mod backend;
pub mod config;
pub mod debug_log;
pub mod engine;
pub mod monitor;
pub mod sampler;
pub mod softmax;
pub mod verify;

pub use backend::{Backend, BackendAttributes, CountingBackend, EvalError, Evaluation};
pub use config::{ExportFormat, RewardMode, SamplerConfig, SamplerOptions, SamplingMode};
pub use debug_log::debug_log;
pub use engine::{BestMoveInfo, EngineAdapter, InfoSink, ThinkingInfo};
pub use monitor::{EvalMethod, PerformanceMonitor, SamplingMetrics};
pub use sampler::{
    move_to_uci, position_from_fen, position_to_fen, SampleResult, SamplerController,
    SearchLimits,
};
pub use verify::{ComprehensiveVerificationReport, SamplingVerifier, TestScenario, VerificationResult};
