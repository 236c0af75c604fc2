// src/config/processing_config.rs
//! Per-stage configuration structures

use crate::config::constants;
use crate::detection::threshold::{ThresholdMethod, ThresholdPolicy};
use crate::processing::features::{FeatureKind, FeatureParams};
use crate::processing::filters::{BandType, Cutoff};
use crate::processing::windowing::WindowSpec;
use serde::{Deserialize, Serialize};

/// Filter bank configuration; a missing stage is skipped
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FilterBankConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub butterworth: Option<ButterworthConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notch: Option<NotchConfig>,
}

/// Butterworth stage
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ButterworthConfig {
    pub band: BandType,
    /// Single edge in Hz, or `[low, high]` for band kinds
    pub cutoff: Cutoff,
    #[serde(default = "defaults::filter_order")]
    pub order: usize,
}

/// Mains notch stage
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NotchConfig {
    #[serde(default = "defaults::notch_frequency_hz")]
    pub frequency_hz: f64,
    #[serde(default = "defaults::notch_quality_factor")]
    pub quality_factor: f64,
}

/// Sliding-window feature extraction
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeatureConfig {
    #[serde(default = "defaults::frame")]
    pub frame: usize,
    #[serde(default = "defaults::step")]
    pub step: usize,
    #[serde(default = "defaults::selected_features")]
    pub selected: Vec<FeatureKind>,
    #[serde(default)]
    pub params: FeatureParams,
}

/// Threshold derivation for the detection feature
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ThresholdConfig {
    /// Feature series the threshold and grasp mask are derived from
    #[serde(default = "defaults::detection_feature")]
    pub feature: FeatureKind,
    #[serde(default)]
    pub method: ThresholdMethod,
    #[serde(default = "defaults::mean_std_k")]
    pub mean_std_k: f64,
    #[serde(default = "defaults::percentile")]
    pub percentile: f64,
    #[serde(default = "defaults::fallback")]
    pub fallback: f64,
    #[serde(default)]
    pub strict: bool,
}

/// Grasp detection
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GraspConfig {
    #[serde(default = "defaults::min_duration_sec")]
    pub min_duration_sec: f64,
    #[serde(default = "defaults::control_threshold")]
    pub control_threshold: f64,
    /// Control matrix column used for the myocontrol mask
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_column: Option<usize>,
}

pub(crate) mod defaults {
    use super::constants::{features, filters, grasp, threshold};
    use crate::processing::features::FeatureKind;

    pub fn filter_order() -> usize { filters::DEFAULT_FILTER_ORDER }
    pub fn notch_frequency_hz() -> f64 { filters::DEFAULT_NOTCH_FREQUENCY_HZ }
    pub fn notch_quality_factor() -> f64 { filters::DEFAULT_NOTCH_QUALITY_FACTOR }

    pub fn frame() -> usize { features::DEFAULT_FRAME }
    pub fn step() -> usize { features::DEFAULT_STEP }
    pub fn selected_features() -> Vec<FeatureKind> { FeatureKind::ALL.to_vec() }

    pub fn detection_feature() -> FeatureKind { FeatureKind::Rms }
    pub fn mean_std_k() -> f64 { threshold::DEFAULT_MEAN_STD_K }
    pub fn percentile() -> f64 { threshold::DEFAULT_PERCENTILE }
    pub fn fallback() -> f64 { threshold::FALLBACK_THRESHOLD }

    pub fn min_duration_sec() -> f64 { grasp::DEFAULT_MIN_DURATION_SEC }
    pub fn control_threshold() -> f64 { grasp::DEFAULT_CONTROL_THRESHOLD }
}

impl Default for FilterBankConfig {
    fn default() -> Self {
        Self {
            butterworth: Some(ButterworthConfig::default()),
            notch: Some(NotchConfig::default()),
        }
    }
}

impl Default for ButterworthConfig {
    fn default() -> Self {
        Self {
            band: BandType::Lowpass,
            cutoff: Cutoff::Single(constants::filters::DEFAULT_LOWPASS_CUTOFF_HZ),
            order: defaults::filter_order(),
        }
    }
}

impl Default for NotchConfig {
    fn default() -> Self {
        Self {
            frequency_hz: defaults::notch_frequency_hz(),
            quality_factor: defaults::notch_quality_factor(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            frame: defaults::frame(),
            step: defaults::step(),
            selected: defaults::selected_features(),
            params: FeatureParams::default(),
        }
    }
}

impl FeatureConfig {
    /// Window geometry
    pub fn window(&self) -> WindowSpec {
        WindowSpec::new(self.frame, self.step)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            feature: defaults::detection_feature(),
            method: ThresholdMethod::default(),
            mean_std_k: defaults::mean_std_k(),
            percentile: defaults::percentile(),
            fallback: defaults::fallback(),
            strict: false,
        }
    }
}

impl ThresholdConfig {
    /// Policy applied by the threshold engine
    pub fn policy(&self) -> ThresholdPolicy {
        ThresholdPolicy {
            mean_std_k: self.mean_std_k,
            percentile: self.percentile,
            fallback: self.fallback,
            strict: self.strict,
        }
    }
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self {
            min_duration_sec: defaults::min_duration_sec(),
            control_threshold: defaults::control_threshold(),
            control_column: None,
        }
    }
}

/// Validate stage configuration against a sampling rate
pub fn validate_filter_bank(config: &FilterBankConfig, sampling_rate_hz: f64) -> Result<(), String> {
    let nyquist = sampling_rate_hz / 2.0;

    if let Some(ref stage) = config.butterworth {
        if stage.order < constants::filters::MIN_FILTER_ORDER
            || stage.order > constants::filters::MAX_FILTER_ORDER
        {
            return Err(format!(
                "Filter order must be between {} and {}",
                constants::filters::MIN_FILTER_ORDER,
                constants::filters::MAX_FILTER_ORDER
            ));
        }

        let edges: Vec<f64> = match (stage.band.is_band(), stage.cutoff) {
            (false, Cutoff::Single(fc)) => vec![fc],
            (true, Cutoff::Band(low, high)) => {
                if low >= high {
                    return Err("Band low edge must be below the high edge".to_string());
                }
                vec![low, high]
            }
            _ => {
                return Err(format!(
                    "Cutoff shape does not match {:?} filter",
                    stage.band
                ))
            }
        };

        for edge in edges {
            if edge <= 0.0 || edge >= nyquist {
                return Err(format!(
                    "Cutoff ({} Hz) must lie between 0 and Nyquist ({} Hz)",
                    edge, nyquist
                ));
            }
        }
    }

    if let Some(ref notch) = config.notch {
        if notch.frequency_hz <= 0.0 || notch.frequency_hz >= nyquist {
            return Err(format!(
                "Notch frequency ({} Hz) must lie between 0 and Nyquist ({} Hz)",
                notch.frequency_hz, nyquist
            ));
        }
        if notch.quality_factor <= 0.0 {
            return Err("Notch quality factor must be positive".to_string());
        }
    }

    Ok(())
}

/// Validate feature, threshold and grasp settings
pub fn validate_detection(
    features: &FeatureConfig,
    threshold: &ThresholdConfig,
    grasp: &GraspConfig,
) -> Result<(), String> {
    if features.frame == 0 {
        return Err("Feature frame must be greater than 0".to_string());
    }
    if features.step == 0 {
        return Err("Feature step must be greater than 0".to_string());
    }
    if features.selected.is_empty() {
        return Err("At least one feature must be selected".to_string());
    }
    if !features.selected.contains(&threshold.feature) {
        return Err(format!(
            "Detection feature {} is not among the selected features",
            threshold.feature
        ));
    }

    if !(0.0..=100.0).contains(&threshold.percentile) {
        return Err("Threshold percentile must be between 0 and 100".to_string());
    }

    if grasp.min_duration_sec < 0.0 {
        return Err("Minimum grasp duration cannot be negative".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stages_are_valid() {
        assert!(validate_filter_bank(&FilterBankConfig::default(), 2000.0).is_ok());
        assert!(validate_detection(
            &FeatureConfig::default(),
            &ThresholdConfig::default(),
            &GraspConfig::default()
        )
        .is_ok());
    }

    #[test]
    fn test_cutoff_above_nyquist() {
        // 450 Hz lowpass is fine at 2 kHz but not at 800 Hz
        assert!(validate_filter_bank(&FilterBankConfig::default(), 800.0).is_err());
    }

    #[test]
    fn test_cutoff_shape_mismatch() {
        let config = FilterBankConfig {
            butterworth: Some(ButterworthConfig {
                band: BandType::Bandpass,
                cutoff: Cutoff::Single(20.0),
                order: 4,
            }),
            notch: None,
        };
        assert!(validate_filter_bank(&config, 2000.0).is_err());
    }

    #[test]
    fn test_invalid_detection_config() {
        let mut features = FeatureConfig::default();
        features.step = 0;
        assert!(validate_detection(&features, &ThresholdConfig::default(), &GraspConfig::default()).is_err());

        let features = FeatureConfig {
            selected: vec![FeatureKind::Mav],
            ..FeatureConfig::default()
        };
        assert!(validate_detection(&features, &ThresholdConfig::default(), &GraspConfig::default()).is_err());

        let grasp = GraspConfig {
            min_duration_sec: -1.0,
            ..GraspConfig::default()
        };
        assert!(validate_detection(&FeatureConfig::default(), &ThresholdConfig::default(), &grasp).is_err());
    }

    #[test]
    fn test_stage_config_deserialization() {
        let config: FilterBankConfig = toml::from_str(
            r#"
[butterworth]
band = "bandpass"
cutoff = [20.0, 450.0]

[notch]
quality_factor = 25.0
"#,
        )
        .unwrap();

        let stage = config.butterworth.unwrap();
        assert_eq!(stage.band, BandType::Bandpass);
        assert_eq!(stage.cutoff, Cutoff::Band(20.0, 450.0));
        assert_eq!(stage.order, 4);

        let notch = config.notch.unwrap();
        assert_eq!(notch.frequency_hz, 50.0);
        assert_eq!(notch.quality_factor, 25.0);
    }

    #[test]
    fn test_threshold_policy_from_config() {
        let config = ThresholdConfig {
            strict: true,
            ..ThresholdConfig::default()
        };
        let policy = config.policy();
        assert!(policy.strict);
        assert_eq!(policy.percentile, 85.0);
        assert_eq!(policy.mean_std_k, 0.5);
    }
}
