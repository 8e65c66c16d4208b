//! Engine-side adapter.
//!
//! Wires the sampler into the engine's move-request path. When the sampler
//! is enabled and produces a move, the adapter publishes a one-ply thinking
//! record followed by the best-move record; otherwise it declines and the
//! caller falls through to its default tree search.

use crate::backend::Backend;
use crate::config::SamplerOptions;
use crate::sampler::{move_to_uci, SamplerController, SearchLimits};
use shakmaty::{Chess, Color, Position};
use std::sync::Arc;

/// Search progress record, mirroring the engine shell's `info` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinkingInfo {
    pub depth: u32,
    pub seldepth: u32,
    pub time_ms: u64,
    pub nodes: u64,
    pub nps: u64,
    pub pv: Vec<String>,
    pub multipv: u32,
}

/// Final move record. `player` is +1 when White is to move, -1 for Black.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMoveInfo {
    pub best_move: String,
    pub player: i8,
}

/// Where the adapter publishes its records; the engine shell implements
/// this over its protocol writer.
pub trait InfoSink {
    fn thinking(&mut self, info: ThinkingInfo);
    fn best_move(&mut self, info: BestMoveInfo);
}

/// Owns a controller and answers move requests with it.
pub struct EngineAdapter {
    controller: SamplerController,
}

impl EngineAdapter {
    pub fn new(options: &SamplerOptions, backend: Option<Arc<dyn Backend>>) -> Self {
        EngineAdapter {
            controller: SamplerController::new(options, backend),
        }
    }

    pub fn controller(&self) -> &SamplerController {
        &self.controller
    }

    /// Picks up option changes.
    pub fn update_options(&mut self, options: &SamplerOptions) {
        self.controller.update_options(options);
    }

    /// Starts a new game: re-reads the shell's current option values in
    /// case they changed since the last request.
    pub fn new_game(&mut self, options: &SamplerOptions) {
        self.update_options(options);
    }

    /// Handles one move request. Returns true when the sampler selected a
    /// move and both records were published; false means the caller must
    /// run its default search.
    pub fn handle_go(
        &mut self,
        pos: &Chess,
        limits: &SearchLimits,
        sink: &mut dyn InfoSink,
    ) -> bool {
        if !self.controller.is_enabled() {
            return false;
        }

        let Some(selected) = self.controller.select_move(pos, limits) else {
            log::debug!("path integral declined, delegating to default search");
            return false;
        };

        let metrics = self.controller.last_sampling_metrics();
        let uci = move_to_uci(&selected);

        sink.thinking(ThinkingInfo {
            depth: 1,
            seldepth: 1,
            time_ms: metrics.total_time_ms as u64,
            nodes: u64::from(metrics.actual_samples),
            nps: metrics.samples_per_second as u64,
            pv: vec![uci.clone()],
            multipv: 1,
        });
        sink.best_move(BestMoveInfo {
            best_move: uci,
            player: if pos.turn() == Color::White { 1 } else { -1 },
        });
        true
    }
}
