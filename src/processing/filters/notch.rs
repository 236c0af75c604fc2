// src/processing/filters/notch.rs
//! Notch filter for powerline interference removal

use super::{normalized_frequency, Biquad, SosFilter};
use crate::error::{EmgError, EmgResult, ProcessingStage};
use std::f64::consts::PI;

/// Second-order IIR notch centred on `notch_freq`
///
/// The -3 dB bandwidth is `notch_freq / quality_factor`.
pub fn iir_notch(notch_freq: f64, fs: f64, quality_factor: f64) -> EmgResult<SosFilter> {
    if !(quality_factor.is_finite() && quality_factor > 0.0) {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Filtering,
            "quality_factor",
            format!("quality factor must be positive, got {}", quality_factor),
        ));
    }

    let w0 = normalized_frequency(notch_freq, fs, "notch_freq")? * PI;
    let bandwidth = w0 / quality_factor;
    let gain = 1.0 / (1.0 + (bandwidth / 2.0).tan());
    let cos_w0 = w0.cos();

    let section = Biquad {
        b: [gain, -2.0 * gain * cos_w0, gain],
        a: [1.0, -2.0 * gain * cos_w0, 2.0 * gain - 1.0],
    };

    SosFilter::new(vec![section], 2)
}
