// src/processing/normalize.rs
//! Amplitude normalization

use crate::error::{EmgError, EmgResult, ProcessingStage};
use serde::{Deserialize, Serialize};

/// Normalization applied after smoothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Leave amplitudes untouched
    #[default]
    None,
    /// Divide by the largest absolute sample, range [-1, 1]
    MaxAbs,
    /// Shift and scale into [0, 1]
    MinMax,
}

impl NormalizationMethod {
    /// Apply the method to `signal`
    pub fn apply(&self, signal: &[f64]) -> EmgResult<Vec<f64>> {
        match self {
            NormalizationMethod::None => Ok(signal.to_vec()),
            NormalizationMethod::MaxAbs => normalize(signal),
            NormalizationMethod::MinMax => normalize_min_max(signal),
        }
    }
}

/// Scale by `max(|x|)` so the output peaks at exactly 1 in magnitude
pub fn normalize(signal: &[f64]) -> EmgResult<Vec<f64>> {
    let peak = signal.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));

    if peak == 0.0 || !peak.is_finite() {
        return Err(EmgError::degenerate(
            ProcessingStage::Normalization,
            if signal.is_empty() {
                "cannot normalize an empty signal".to_string()
            } else {
                format!("peak amplitude {} cannot be used as a divisor", peak)
            },
        ));
    }

    Ok(signal.iter().map(|x| x / peak).collect())
}

/// Scale into [0, 1] using the signal's range
pub fn normalize_min_max(signal: &[f64]) -> EmgResult<Vec<f64>> {
    let (min, max) = signal
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    let range = max - min;

    if !(range > 0.0 && range.is_finite()) {
        return Err(EmgError::degenerate(
            ProcessingStage::Normalization,
            "signal has no amplitude range",
        ));
    }

    Ok(signal.iter().map(|x| (x - min) / range).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::rectify::rectify;

    #[test]
    fn test_rectify_then_normalize() {
        let out = normalize(&rectify(&[-4.0, 2.0, -1.0, 3.0])).unwrap();
        assert_eq!(out, vec![1.0, 0.5, 0.25, 0.75]);
    }

    #[test]
    fn test_normalize_keeps_sign() {
        let out = normalize(&[-2.0, 1.0, 0.5]).unwrap();
        assert_eq!(out, vec![-1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(matches!(
            normalize(&[0.0, 0.0, 0.0]),
            Err(EmgError::DegenerateSignal { .. })
        ));
        assert!(matches!(normalize(&[]), Err(EmgError::DegenerateSignal { .. })));
        assert!(matches!(
            normalize_min_max(&[2.0, 2.0]),
            Err(EmgError::DegenerateSignal { .. })
        ));
    }

    #[test]
    fn test_min_max() {
        let out = normalize_min_max(&[-1.0, 0.0, 3.0]).unwrap();
        assert_eq!(out, vec![0.0, 0.25, 1.0]);
    }

    #[test]
    fn test_method_dispatch() {
        let signal = [1.0, -4.0];
        assert_eq!(NormalizationMethod::None.apply(&signal).unwrap(), signal.to_vec());
        assert_eq!(NormalizationMethod::MaxAbs.apply(&signal).unwrap(), vec![0.25, -1.0]);
        assert_eq!(NormalizationMethod::MinMax.apply(&signal).unwrap(), vec![1.0, 0.0]);
    }
}
