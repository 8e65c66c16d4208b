//! Neural evaluation backend seam.
//!
//! The sampler never owns inference. It talks to whatever backend the engine
//! wired in through this trait: a cached-result query, a batched fresh
//! evaluation, and an attribute probe used to verify the backend is actually
//! alive before each evaluation path.

use shakmaty::{Chess, Move};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("backend evaluation failed: {0}")]
    EvaluationFailed(String),
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

/// One position handed to the backend, with its legal moves so the policy
/// vector can be aligned to them.
#[derive(Clone, Copy)]
pub struct EvalPosition<'a> {
    pub pos: &'a Chess,
    pub legal_moves: &'a [Move],
}

/// Backend output for one position.
///
/// `q` is the value-head estimate from the white-to-move perspective;
/// `p` holds one policy probability per entry of the queried legal-move list.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub q: f64,
    pub p: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct BackendAttributes {
    pub name: String,
    pub max_batch_size: usize,
}

/// A neural evaluation backend.
///
/// Evaluates a position and returns a value estimate plus a prior
/// distribution over the supplied legal moves. Implementations own their
/// caching and batching; the sampler only distinguishes "came from cache"
/// from "freshly computed".
pub trait Backend: Send + Sync {
    /// Probes the backend. An error here means the backend is not usable
    /// and callers must take the heuristic path.
    fn attributes(&self) -> Result<BackendAttributes, EvalError>;

    /// Returns the stored evaluation for `pos` if the backend has one.
    fn cached_evaluation(&self, pos: EvalPosition<'_>) -> Option<Evaluation>;

    /// Runs a fresh batched evaluation, one result per input position.
    fn evaluate_batch(&self, batch: &[EvalPosition<'_>]) -> Result<Vec<Evaluation>, EvalError>;
}

/// Deterministic backend double: serves a fixed Q and a uniform policy, and
/// counts every query so tests can assert how the sampler used it.
pub struct CountingBackend {
    q: f64,
    serve_cached: bool,
    fail_attributes: AtomicBool,
    attribute_queries: AtomicU32,
    cache_queries: AtomicU32,
    batch_evaluations: AtomicU32,
}

impl CountingBackend {
    pub fn new(q: f64) -> Self {
        CountingBackend {
            q,
            serve_cached: false,
            fail_attributes: AtomicBool::new(false),
            attribute_queries: AtomicU32::new(0),
            cache_queries: AtomicU32::new(0),
            batch_evaluations: AtomicU32::new(0),
        }
    }

    /// Variant whose cache query always hits.
    pub fn with_cache(q: f64) -> Self {
        CountingBackend {
            serve_cached: true,
            ..CountingBackend::new(q)
        }
    }

    /// Makes the attribute probe fail, simulating a dead backend.
    pub fn set_failing(&self, failing: bool) {
        self.fail_attributes.store(failing, Ordering::SeqCst);
    }

    pub fn attribute_queries(&self) -> u32 {
        self.attribute_queries.load(Ordering::SeqCst)
    }

    pub fn cache_queries(&self) -> u32 {
        self.cache_queries.load(Ordering::SeqCst)
    }

    pub fn batch_evaluations(&self) -> u32 {
        self.batch_evaluations.load(Ordering::SeqCst)
    }

    fn evaluation_for(&self, pos: EvalPosition<'_>) -> Evaluation {
        let n = pos.legal_moves.len().max(1);
        Evaluation {
            q: self.q,
            p: vec![1.0 / n as f64; pos.legal_moves.len()],
        }
    }
}

impl Backend for CountingBackend {
    fn attributes(&self) -> Result<BackendAttributes, EvalError> {
        self.attribute_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_attributes.load(Ordering::SeqCst) {
            return Err(EvalError::BackendUnavailable("simulated failure".into()));
        }
        Ok(BackendAttributes {
            name: "counting".to_string(),
            max_batch_size: 256,
        })
    }

    fn cached_evaluation(&self, pos: EvalPosition<'_>) -> Option<Evaluation> {
        self.cache_queries.fetch_add(1, Ordering::SeqCst);
        if self.serve_cached {
            Some(self.evaluation_for(pos))
        } else {
            None
        }
    }

    fn evaluate_batch(&self, batch: &[EvalPosition<'_>]) -> Result<Vec<Evaluation>, EvalError> {
        self.batch_evaluations.fetch_add(1, Ordering::SeqCst);
        Ok(batch.iter().map(|p| self.evaluation_for(*p)).collect())
    }
}
