//! Sampler configuration.
//!
//! Typed configuration for the path-integral sampler, filled either from the
//! engine shell's option pairs or directly by the verification tool.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lowest accepted softmax temperature.
pub const MIN_LAMBDA: f64 = 0.001;
/// Highest accepted softmax temperature.
pub const MAX_LAMBDA: f64 = 10.0;
/// Lowest accepted per-move sample count.
pub const MIN_SAMPLES: u32 = 1;
/// Highest accepted per-move sample count.
pub const MAX_SAMPLES: u32 = 100_000;

/// How a single draw is scored in quantum-limit sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardMode {
    /// Policy-head probability of the move.
    Policy,
    /// Value-head Q of the position after the move.
    CpScore,
    /// Product of policy probability and Q.
    Hybrid,
}

impl RewardMode {
    /// Parses the wire spelling. Unknown spellings fall back to the default;
    /// the engine shell sends free-form strings.
    pub fn parse(s: &str) -> Self {
        match s {
            "policy" => RewardMode::Policy,
            "cp_score" => RewardMode::CpScore,
            "hybrid" => RewardMode::Hybrid,
            other => {
                log::warn!("unknown reward mode '{}', using hybrid", other);
                RewardMode::Hybrid
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RewardMode::Policy => "policy",
            RewardMode::CpScore => "cp_score",
            RewardMode::Hybrid => "hybrid",
        }
    }
}

impl Default for RewardMode {
    fn default() -> Self {
        RewardMode::Hybrid
    }
}

impl fmt::Display for RewardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which sampling loop the controller runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Average value-head draws per move, pick the softmax argmax.
    Competitive,
    /// Score draws through the configured reward mode, then argmax.
    QuantumLimit,
}

impl SamplingMode {
    /// Parses the wire spelling, falling back to competitive.
    pub fn parse(s: &str) -> Self {
        match s {
            "competitive" => SamplingMode::Competitive,
            "quantum_limit" => SamplingMode::QuantumLimit,
            other => {
                log::warn!("unknown sampling mode '{}', using competitive", other);
                SamplingMode::Competitive
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingMode::Competitive => "competitive",
            SamplingMode::QuantumLimit => "quantum_limit",
        }
    }
}

impl Default for SamplingMode {
    fn default() -> Self {
        SamplingMode::Competitive
    }
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report export format for the verification tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    None,
    Json,
    Csv,
    Text,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => ExportFormat::Json,
            "csv" => ExportFormat::Csv,
            "text" => ExportFormat::Text,
            "none" => ExportFormat::None,
            other => {
                log::warn!("unknown export format '{}', using none", other);
                ExportFormat::None
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::None => "none",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "text",
        }
    }
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat::None
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete sampler configuration.
///
/// `enabled` is derived, never set directly: the sampler runs iff both
/// `lambda` and `samples` are positive. The controller keeps running with an
/// out-of-range configuration by disabling itself rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Softmax temperature, valid in [0.001, 10.0].
    pub lambda: f64,
    /// Score draws per legal move, valid in [1, 100000].
    pub samples: u32,
    pub reward_mode: RewardMode,
    pub sampling_mode: SamplingMode,
    pub enabled: bool,
    pub debug_logging: bool,
    /// Debug log sink; `None` keeps the stderr channel only.
    pub metrics_file: Option<PathBuf>,
    pub export_format: ExportFormat,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            lambda: 0.1,
            samples: 50,
            reward_mode: RewardMode::default(),
            sampling_mode: SamplingMode::default(),
            enabled: false,
            debug_logging: false,
            metrics_file: None,
            export_format: ExportFormat::default(),
        }
    }
}

impl SamplerConfig {
    /// Checks the documented value ranges.
    pub fn is_valid(&self) -> bool {
        (MIN_LAMBDA..=MAX_LAMBDA).contains(&self.lambda)
            && (MIN_SAMPLES..=MAX_SAMPLES).contains(&self.samples)
    }

    /// Builds a config from an options bag, deriving the enabled flag.
    pub fn from_options(opts: &SamplerOptions) -> Self {
        SamplerConfig {
            lambda: opts.lambda,
            samples: opts.samples,
            reward_mode: opts.reward_mode,
            sampling_mode: opts.sampling_mode,
            enabled: opts.lambda > 0.0 && opts.samples > 0,
            debug_logging: opts.debug_mode,
            metrics_file: if opts.metrics_file.is_empty() {
                None
            } else {
                Some(PathBuf::from(&opts.metrics_file))
            },
            export_format: ExportFormat::default(),
        }
    }
}

/// The options bag the engine shell hands to the controller.
///
/// Field names mirror the engine option table (`PathIntegralLambda` and
/// friends); `from_pairs` accepts the raw string pairs of that table.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerOptions {
    pub lambda: f64,
    pub samples: u32,
    pub reward_mode: RewardMode,
    pub sampling_mode: SamplingMode,
    pub debug_mode: bool,
    pub metrics_file: String,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        SamplerOptions {
            lambda: 0.1,
            samples: 50,
            reward_mode: RewardMode::default(),
            sampling_mode: SamplingMode::default(),
            debug_mode: false,
            metrics_file: String::new(),
        }
    }
}

impl SamplerOptions {
    /// Parses engine option pairs. A malformed value keeps the field default
    /// and logs a warning; unrecognized names are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut opts = SamplerOptions::default();
        for (name, value) in pairs {
            match name {
                "PathIntegralLambda" => match value.parse::<f64>() {
                    Ok(v) => opts.lambda = v,
                    Err(_) => log::warn!("bad PathIntegralLambda value '{}'", value),
                },
                "PathIntegralSamples" => match value.parse::<u32>() {
                    Ok(v) => opts.samples = v,
                    Err(_) => log::warn!("bad PathIntegralSamples value '{}'", value),
                },
                "PathIntegralRewardMode" => opts.reward_mode = RewardMode::parse(value),
                "PathIntegralMode" => opts.sampling_mode = SamplingMode::parse(value),
                "PathIntegralDebugMode" => {
                    opts.debug_mode = matches!(value, "true" | "on" | "1");
                }
                "PathIntegralMetricsFile" => opts.metrics_file = value.to_string(),
                _ => {}
            }
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_enablement() {
        let mut opts = SamplerOptions::default();
        let cfg = SamplerConfig::from_options(&opts);
        assert!(cfg.enabled);

        opts.samples = 0;
        let cfg = SamplerConfig::from_options(&opts);
        assert!(!cfg.enabled);
    }

    #[test]
    fn lenient_mode_parsing() {
        assert_eq!(RewardMode::parse("cp_score"), RewardMode::CpScore);
        assert_eq!(RewardMode::parse("garbage"), RewardMode::Hybrid);
        assert_eq!(SamplingMode::parse("quantum_limit"), SamplingMode::QuantumLimit);
        assert_eq!(SamplingMode::parse(""), SamplingMode::Competitive);
    }
}
