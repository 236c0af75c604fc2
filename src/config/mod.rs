// src/config/mod.rs
//! Pipeline configuration management

pub mod constants;
pub mod loader;
pub mod processing_config;

pub use loader::{ConfigError, ConfigLoader};
pub use processing_config::*;

use crate::processing::normalize::NormalizationMethod;
use crate::processing::smoothing::SmoothingMethod;
use serde::{Deserialize, Serialize};

/// Complete pipeline configuration
///
/// Scalar settings come before the stage tables so the struct serializes to
/// valid TOML.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "defaults::sampling_rate_hz")]
    pub sampling_rate_hz: f64,

    #[serde(default = "defaults::rectify")]
    pub rectify: bool,

    #[serde(default)]
    pub normalization: NormalizationMethod,

    #[serde(default)]
    pub filter_bank: FilterBankConfig,

    #[serde(default)]
    pub smoothing: SmoothingMethod,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub threshold: ThresholdConfig,

    #[serde(default)]
    pub grasp: GraspConfig,
}

mod defaults {
    use crate::config::constants::signal;

    pub fn sampling_rate_hz() -> f64 { signal::DEFAULT_SAMPLING_RATE_HZ }
    pub fn rectify() -> bool { true }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: defaults::sampling_rate_hz(),
            rectify: defaults::rectify(),
            normalization: NormalizationMethod::default(),
            filter_bank: FilterBankConfig::default(),
            smoothing: SmoothingMethod::default(),
            features: FeatureConfig::default(),
            threshold: ThresholdConfig::default(),
            grasp: GraspConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Check every section, collecting all problems
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(constants::signal::MIN_SAMPLING_RATE_HZ..=constants::signal::MAX_SAMPLING_RATE_HZ)
            .contains(&self.sampling_rate_hz)
        {
            errors.push(format!(
                "Sampling rate ({} Hz) must be between {} and {} Hz",
                self.sampling_rate_hz,
                constants::signal::MIN_SAMPLING_RATE_HZ,
                constants::signal::MAX_SAMPLING_RATE_HZ
            ));
        }

        if let Err(e) = validate_filter_bank(&self.filter_bank, self.sampling_rate_hz) {
            errors.push(e);
        }

        if let Err(e) = self.smoothing.validate() {
            errors.push(e);
        }

        if let Err(e) = validate_detection(&self.features, &self.threshold, &self.grasp) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Sampling rate of the feature series (`fs / step`)
    pub fn feature_rate(&self) -> f64 {
        self.features.window().feature_rate(self.sampling_rate_hz)
    }
}
