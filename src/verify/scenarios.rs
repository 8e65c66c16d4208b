//! Built-in verification scenarios and test positions.

use super::TestScenario;
use crate::config::{RewardMode, SamplerConfig, SamplingMode};

/// Default verification positions: the starting position plus middlegame,
/// endgame and tactical samples.
pub fn default_test_positions() -> Vec<String> {
    [
        // Starting position
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        // Middlegame
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 10",
        "4rrk1/pp1n3p/3q2pQ/2p1pb2/2PP4/2P3N1/P2B2PP/4RRK1 b - - 7 19",
        // Endgame
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 11",
        "4k2r/1pb2ppp/1p2p3/1R1p4/3P4/2r1PN2/P4PPP/1R4K1 b - - 3 22",
        // Tactical
        "r1bq1r1k/1pp1n1pp/1p1p4/4p2Q/4Pp2/1BNP4/PPP2PPP/3R1RK1 w - - 2 14",
        "r1bbk1nr/pp3p1p/2n5/1N4p1/2Np1B2/8/PPP2PPP/2KR1B1R w kq - 0 13",
    ]
    .iter()
    .map(|fen| fen.to_string())
    .collect()
}

fn scenario_config(lambda: f64, samples: u32, mode: SamplingMode) -> SamplerConfig {
    SamplerConfig {
        lambda,
        samples,
        sampling_mode: mode,
        enabled: true,
        ..SamplerConfig::default()
    }
}

/// Basic verification with standard configurations.
pub fn standard_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "Standard Competitive",
            "",
            scenario_config(0.1, 50, SamplingMode::Competitive),
        ),
        TestScenario::new("Standard Quantum Limit", "", {
            let mut config = scenario_config(0.1, 50, SamplingMode::QuantumLimit);
            config.reward_mode = RewardMode::Hybrid;
            config
        }),
        TestScenario::new(
            "Low Lambda",
            "",
            scenario_config(0.01, 25, SamplingMode::Competitive),
        ),
        TestScenario::new(
            "High Lambda",
            "",
            scenario_config(1.0, 25, SamplingMode::Competitive),
        ),
    ]
}

/// High sample counts, for throughput measurement.
pub fn performance_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "High Sample Count",
            "",
            scenario_config(0.1, 500, SamplingMode::Competitive),
        ),
        TestScenario::new(
            "Very High Sample Count",
            "",
            scenario_config(0.1, 1000, SamplingMode::Competitive),
        ),
    ]
}

/// Extreme but accepted parameter values.
pub fn edge_case_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "Minimum Samples",
            "",
            scenario_config(0.1, 1, SamplingMode::Competitive),
        ),
        TestScenario::new(
            "Extreme Low Lambda",
            "",
            scenario_config(0.001, 100, SamplingMode::Competitive),
        ),
        TestScenario::new(
            "Extreme High Lambda",
            "",
            scenario_config(10.0, 100, SamplingMode::Competitive),
        ),
    ]
}
