//! Tests for configuration parsing, validation and round-trips.

use goshawk::config::{
    ExportFormat, RewardMode, SamplerConfig, SamplerOptions, SamplingMode,
};
use goshawk::sampler::SamplerController;

#[test]
fn test_defaults() {
    let config = SamplerConfig::default();
    assert_eq!(config.lambda, 0.1);
    assert_eq!(config.samples, 50);
    assert_eq!(config.reward_mode, RewardMode::Hybrid);
    assert_eq!(config.sampling_mode, SamplingMode::Competitive);
    assert!(!config.enabled);
    assert!(!config.debug_logging);
    assert!(config.metrics_file.is_none());
    assert_eq!(config.export_format, ExportFormat::None);
    assert!(config.is_valid());
}

#[test]
fn test_validity_boundaries() {
    let mut config = SamplerConfig::default();

    config.lambda = 0.001;
    assert!(config.is_valid());
    config.lambda = 10.0;
    assert!(config.is_valid());
    config.lambda = 0.0009;
    assert!(!config.is_valid());
    config.lambda = 10.001;
    assert!(!config.is_valid());

    config.lambda = 0.1;
    config.samples = 1;
    assert!(config.is_valid());
    config.samples = 100_000;
    assert!(config.is_valid());
    config.samples = 0;
    assert!(!config.is_valid());
    config.samples = 100_001;
    assert!(!config.is_valid());
}

#[test]
fn test_enablement_is_derived_from_options() {
    let mut opts = SamplerOptions::default();
    assert!(SamplerConfig::from_options(&opts).enabled);

    opts.lambda = 0.0;
    assert!(!SamplerConfig::from_options(&opts).enabled);

    opts.lambda = 0.1;
    opts.samples = 0;
    assert!(!SamplerConfig::from_options(&opts).enabled);
}

#[test]
fn test_set_config_round_trip() {
    let mut controller = SamplerController::new(&SamplerOptions::default(), None);
    let config = SamplerConfig {
        lambda: 2.5,
        samples: 17,
        reward_mode: RewardMode::CpScore,
        sampling_mode: SamplingMode::QuantumLimit,
        enabled: true,
        debug_logging: false,
        metrics_file: None,
        export_format: ExportFormat::Csv,
    };
    controller.set_config(config.clone());
    assert_eq!(controller.config(), &config);
    assert!(controller.is_enabled());
}

#[test]
fn test_options_from_pairs() {
    let opts = SamplerOptions::from_pairs([
        ("PathIntegralLambda", "0.25"),
        ("PathIntegralSamples", "12"),
        ("PathIntegralRewardMode", "policy"),
        ("PathIntegralMode", "quantum_limit"),
        ("PathIntegralDebugMode", "true"),
        ("PathIntegralMetricsFile", "/tmp/pi.log"),
        ("UnrelatedOption", "whatever"),
    ]);
    assert_eq!(opts.lambda, 0.25);
    assert_eq!(opts.samples, 12);
    assert_eq!(opts.reward_mode, RewardMode::Policy);
    assert_eq!(opts.sampling_mode, SamplingMode::QuantumLimit);
    assert!(opts.debug_mode);
    assert_eq!(opts.metrics_file, "/tmp/pi.log");
}

#[test]
fn test_malformed_option_values_keep_defaults() {
    let opts = SamplerOptions::from_pairs([
        ("PathIntegralLambda", "not-a-number"),
        ("PathIntegralSamples", "-3"),
        ("PathIntegralRewardMode", "mystery"),
        ("PathIntegralDebugMode", "false"),
    ]);
    assert_eq!(opts.lambda, 0.1);
    assert_eq!(opts.samples, 50);
    assert_eq!(opts.reward_mode, RewardMode::Hybrid);
    assert!(!opts.debug_mode);
}

#[test]
fn test_mode_spellings_round_trip() {
    for mode in [RewardMode::Policy, RewardMode::CpScore, RewardMode::Hybrid] {
        assert_eq!(RewardMode::parse(mode.as_str()), mode);
    }
    for mode in [SamplingMode::Competitive, SamplingMode::QuantumLimit] {
        assert_eq!(SamplingMode::parse(mode.as_str()), mode);
    }
    for format in [
        ExportFormat::None,
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Text,
    ] {
        assert_eq!(ExportFormat::parse(format.as_str()), format);
    }
}

#[test]
fn test_config_serde_round_trip() {
    let config = SamplerConfig {
        lambda: 0.7,
        samples: 99,
        reward_mode: RewardMode::Policy,
        sampling_mode: SamplingMode::QuantumLimit,
        enabled: true,
        debug_logging: true,
        metrics_file: Some("/tmp/metrics.jsonl".into()),
        export_format: ExportFormat::Json,
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: SamplerConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}
