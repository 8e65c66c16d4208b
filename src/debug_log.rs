//! Structured debug event stream.
//!
//! One process-wide logger collects sampling events from every controller
//! instance and writes them as single-line JSON objects, to an append-mode
//! file, to stderr, or both. Events between `start_session` and
//! `end_session` carry the session's random id; starting a session while one
//! is active implicitly ends the previous one.
//!
//! When disabled, every entry point is a single atomic load.

use once_cell::sync::Lazy;
use rand::Rng;
use serde_json::{json, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

static LOGGER: Lazy<DebugLogger> = Lazy::new(DebugLogger::new);

/// The process-wide debug logger.
pub fn debug_log() -> &'static DebugLogger {
    &LOGGER
}

struct Session {
    id: String,
    position_fen: String,
    started: Instant,
}

struct LoggerInner {
    file: Option<File>,
    session: Option<Session>,
}

pub struct DebugLogger {
    enabled: AtomicBool,
    stderr_echo: AtomicBool,
    inner: Mutex<LoggerInner>,
}

impl DebugLogger {
    fn new() -> Self {
        DebugLogger {
            enabled: AtomicBool::new(false),
            stderr_echo: AtomicBool::new(false),
            inner: Mutex::new(LoggerInner {
                file: None,
                session: None,
            }),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_stderr_echo(&self, echo: bool) {
        self.stderr_echo.store(echo, Ordering::SeqCst);
    }

    /// Points the file sink at `path` (append mode), or removes it.
    /// A file that cannot be opened leaves the stderr sink as the only
    /// output and reports the failure there.
    pub fn set_output_file(&self, path: Option<&Path>) {
        let mut inner = self.inner.lock().unwrap();
        inner.file = match path {
            None => None,
            Some(p) => match std::fs::OpenOptions::new().create(true).append(true).open(p) {
                Ok(f) => Some(f),
                Err(e) => {
                    log::error!("debug log: cannot open {}: {}", p.display(), e);
                    None
                }
            },
        };
    }

    /// Opens a session for `position_fen`, ending any active one first.
    /// Returns the generated session id, or `None` while disabled.
    pub fn start_session(&self, position_fen: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.session.is_some() {
            self.end_session_locked(&mut inner);
        }
        let id = generate_session_id();
        inner.session = Some(Session {
            id: id.clone(),
            position_fen: position_fen.to_string(),
            started: Instant::now(),
        });
        let data = json!({
            "session_id": id,
            "position_fen": position_fen,
        });
        self.write_entry(&mut inner, "session_start", data);
        Some(id)
    }

    pub fn end_session(&self) {
        if !self.is_enabled() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        self.end_session_locked(&mut inner);
    }

    fn end_session_locked(&self, inner: &mut LoggerInner) {
        let Some(session) = inner.session.take() else {
            return;
        };
        let data = json!({
            "session_id": session.id,
            "total_session_time_ms": session.started.elapsed().as_millis() as u64,
        });
        self.write_entry(inner, "session_end", data);
    }

    /// Id of the active session, if any.
    pub fn session_id(&self) -> Option<String> {
        self.inner.lock().unwrap().session.as_ref().map(|s| s.id.clone())
    }

    pub fn log_sampling_start(
        &self,
        requested_samples: u32,
        legal_moves: usize,
        lambda: f64,
        sampling_mode: &str,
        reward_mode: Option<&str>,
    ) {
        if !self.is_enabled() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        let Some((id, fen)) = session_fields(&inner) else {
            return;
        };
        let mut data = json!({
            "session_id": id,
            "position_fen": fen,
            "requested_samples": requested_samples,
            "legal_moves": legal_moves,
            "lambda": lambda,
            "sampling_mode": sampling_mode,
        });
        if let Some(reward) = reward_mode {
            data["reward_mode"] = json!(reward);
        }
        self.write_entry(&mut inner, "sampling_start", data);
    }

    pub fn log_sample_evaluation(
        &self,
        mv: &str,
        sample_number: u32,
        score: f64,
        eval_method: &str,
        eval_time_ms: f64,
    ) {
        if !self.is_enabled() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        let Some((id, _)) = session_fields(&inner) else {
            return;
        };
        let data = json!({
            "session_id": id,
            "move": mv,
            "sample_number": sample_number,
            "score": score,
            "evaluation_method": eval_method,
            "evaluation_time_ms": eval_time_ms,
        });
        self.write_entry(&mut inner, "sample_evaluation", data);
    }

    pub fn log_sampling_complete(
        &self,
        total_samples: u32,
        total_time_ms: f64,
        neural_net_evaluations: u32,
        cached_evaluations: u32,
        heuristic_evaluations: u32,
    ) {
        if !self.is_enabled() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        let Some((id, _)) = session_fields(&inner) else {
            return;
        };
        let avg = if total_samples > 0 {
            total_time_ms / f64::from(total_samples)
        } else {
            0.0
        };
        let data = json!({
            "session_id": id,
            "total_samples": total_samples,
            "total_time_ms": total_time_ms,
            "neural_net_evaluations": neural_net_evaluations,
            "cached_evaluations": cached_evaluations,
            "heuristic_evaluations": heuristic_evaluations,
            "avg_time_per_sample_ms": avg,
        });
        self.write_entry(&mut inner, "sampling_complete", data);
    }

    pub fn log_move_selection(
        &self,
        selected_move: &str,
        probability: f64,
        score: f64,
        all_probabilities: &[(String, f64)],
    ) {
        if !self.is_enabled() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        let Some((id, _)) = session_fields(&inner) else {
            return;
        };
        let all: Vec<Value> = all_probabilities
            .iter()
            .map(|(mv, p)| json!({ "move": mv, "probability": p }))
            .collect();
        let data = json!({
            "session_id": id,
            "selected_move": selected_move,
            "probability": probability,
            "score": score,
            "all_probabilities": all,
        });
        self.write_entry(&mut inner, "move_selection", data);
    }

    pub fn log_nn_call(&self, cache_hit: bool, eval_time_ms: f64, details: Option<&str>) {
        if !self.is_enabled() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        let Some((id, _)) = session_fields(&inner) else {
            return;
        };
        let mut data = json!({
            "session_id": id,
            "cache_hit": cache_hit,
            "evaluation_time_ms": eval_time_ms,
        });
        if let Some(details) = details {
            data["details"] = json!(details);
        }
        self.write_entry(&mut inner, "neural_network_call", data);
    }

    pub fn log_softmax(&self, lambda: f64, input_scores: &[f64], output_probabilities: &[f64]) {
        if !self.is_enabled() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        let Some((id, _)) = session_fields(&inner) else {
            return;
        };
        let data = json!({
            "session_id": id,
            "lambda": lambda,
            "input_scores": input_scores,
            "output_probabilities": output_probabilities,
        });
        self.write_entry(&mut inner, "softmax_calculation", data);
    }

    pub fn log_info(&self, message: &str) {
        self.log_message("info", message);
    }

    pub fn log_warning(&self, message: &str) {
        self.log_message("warning", message);
    }

    pub fn log_error(&self, message: &str) {
        self.log_message("error", message);
    }

    fn log_message(&self, event_type: &str, message: &str) {
        if !self.is_enabled() {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        let id = inner
            .session
            .as_ref()
            .map(|s| s.id.clone())
            .unwrap_or_else(|| "none".to_string());
        let data = json!({
            "session_id": id,
            "message": message,
        });
        self.write_entry(&mut inner, event_type, data);
    }

    /// Ends any active session and drops the file sink. Called at process
    /// teardown; the logger stays usable afterwards.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap();
        if self.is_enabled() {
            self.end_session_locked(&mut inner);
        }
        if let Some(file) = inner.file.as_mut() {
            file.flush().ok();
        }
        inner.file = None;
    }

    fn write_entry(&self, inner: &mut LoggerInner, event_type: &str, data: Value) {
        let entry = json!({
            "timestamp": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            "event_type": event_type,
            "data": data,
        });
        let line = entry.to_string();
        if self.stderr_echo.load(Ordering::SeqCst) {
            eprintln!("PI_DEBUG: {}", line);
        }
        if let Some(file) = inner.file.as_mut() {
            if writeln!(file, "{}", line).is_err() {
                log::error!("debug log: write to file sink failed");
            }
        }
    }
}

fn session_fields(inner: &LoggerInner) -> Option<(String, String)> {
    inner
        .session
        .as_ref()
        .map(|s| (s.id.clone(), s.position_fen.clone()))
}

/// 128-bit random id rendered as 32 hex digits with UUID-style dashes.
fn generate_session_id() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
