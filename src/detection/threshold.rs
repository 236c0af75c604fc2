// src/detection/threshold.rs
//! Decision thresholds for feature series

use crate::config::constants::threshold as defaults;
use crate::error::{EmgError, EmgResult, ProcessingStage};
use crate::processing::features::FeatureKind;
use serde::{Deserialize, Serialize};

/// How a threshold is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Per-feature constant
    #[default]
    Fixed,
    /// `mean + k * std` of the series
    MeanStd,
    /// A percentile of the series
    Percentile,
}

impl ThresholdMethod {
    /// Case-insensitive lookup of "fixed", "mean_std" or "percentile"
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fixed" => Some(ThresholdMethod::Fixed),
            "mean_std" => Some(ThresholdMethod::MeanStd),
            "percentile" => Some(ThresholdMethod::Percentile),
            _ => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self, ThresholdMethod::Fixed)
    }
}

/// Constant threshold for each feature, tuned for normalized envelopes
pub fn fixed_threshold(kind: FeatureKind) -> f64 {
    match kind {
        FeatureKind::Rms => 0.22,
        FeatureKind::Mav => 0.22,
        FeatureKind::Var => 0.01,
        FeatureKind::Log => -5.0,
        FeatureKind::IntegralEmg => 50.0,
        FeatureKind::WaveLength => 3.0,
        FeatureKind::Aac => 0.01,
        FeatureKind::Dasdv => 0.01,
        FeatureKind::ZeroCrossing => 10.0,
        FeatureKind::Wamp => 10.0,
        FeatureKind::Myop => 0.01,
    }
}

/// Tunables and failure behaviour of the [`ThresholdEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    /// Multiplier of the standard deviation for [`ThresholdMethod::MeanStd`]
    pub mean_std_k: f64,
    /// Percentile (0-100) for [`ThresholdMethod::Percentile`]
    pub percentile: f64,
    /// Returned for unknown features and empty dynamic input
    pub fallback: f64,
    /// Fail instead of returning the fallback
    pub strict: bool,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            mean_std_k: defaults::DEFAULT_MEAN_STD_K,
            percentile: defaults::DEFAULT_PERCENTILE,
            fallback: defaults::FALLBACK_THRESHOLD,
            strict: false,
        }
    }
}

impl ThresholdPolicy {
    /// Default tunables with the soft fallbacks turned into errors
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

/// Derives thresholds under a [`ThresholdPolicy`]
#[derive(Debug, Clone, Default)]
pub struct ThresholdEngine {
    policy: ThresholdPolicy,
}

impl ThresholdEngine {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Threshold for a known feature
    ///
    /// Empty `values` with a dynamic method returns the fallback, or fails
    /// with `InsufficientLength` in strict mode.
    pub fn threshold(&self, kind: FeatureKind, values: &[f64], method: ThresholdMethod) -> EmgResult<f64> {
        self.evaluate(fixed_threshold(kind), values, method)
    }

    /// Threshold for caller-supplied feature and method names
    ///
    /// Outside strict mode an unknown feature resolves to the fallback and
    /// an unknown method to the fixed table.
    pub fn threshold_by_name(&self, feature_name: &str, values: Option<&[f64]>, method: &str) -> EmgResult<f64> {
        let kind = FeatureKind::from_name(feature_name);
        if kind.is_none() && self.policy.strict {
            return Err(EmgError::invalid_parameter(
                ProcessingStage::Thresholding,
                "feature_name",
                format!("unknown feature '{}'", feature_name),
            ));
        }
        let fixed = kind.map(fixed_threshold).unwrap_or(self.policy.fallback);
        let values = values.unwrap_or(&[]);

        match ThresholdMethod::from_name(method) {
            Some(method) => self.evaluate(fixed, values, method),
            None if self.policy.strict => Err(EmgError::invalid_parameter(
                ProcessingStage::Thresholding,
                "method",
                format!("unknown threshold method '{}'", method),
            )),
            None if values.is_empty() => Ok(self.policy.fallback),
            None => Ok(fixed),
        }
    }

    fn evaluate(&self, fixed: f64, values: &[f64], method: ThresholdMethod) -> EmgResult<f64> {
        match method {
            ThresholdMethod::Fixed => Ok(fixed),
            _ if values.is_empty() => {
                if self.policy.strict {
                    Err(EmgError::insufficient_length(ProcessingStage::Thresholding, 0, 1))
                } else {
                    Ok(self.policy.fallback)
                }
            }
            ThresholdMethod::MeanStd => Ok(mean(values) + self.policy.mean_std_k * population_std(values)),
            ThresholdMethod::Percentile => Ok(percentile(values, self.policy.percentile)),
        }
    }
}

/// Soft-failing threshold lookup with the default policy
pub fn get_threshold(feature_name: &str, values: Option<&[f64]>, method: &str) -> f64 {
    let engine = ThresholdEngine::default();
    match engine.threshold_by_name(feature_name, values, method) {
        Ok(threshold) => threshold,
        Err(_) => engine.policy().fallback,
    }
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with divisor `n`
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    (values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// `q`-th percentile (0-100) with linear interpolation between closest ranks
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
