// src/processing/filters/mod.rs
//! Digital IIR filters for EMG signal processing
//!
//! Filters are designed as cascades of second-order sections and applied
//! forward and backward (see [`zero_phase`]) so the output carries no group
//! delay.

pub mod butterworth;
pub mod notch;
pub mod zero_phase;

pub use butterworth::butterworth;
pub use notch::iir_notch;
pub use zero_phase::{filtfilt, padlen};

use crate::error::{EmgError, EmgResult, ProcessingStage};
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Filter band kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandType {
    /// Pass below the cutoff
    #[serde(rename = "low", alias = "lowpass")]
    Lowpass,
    /// Pass above the cutoff
    #[serde(rename = "high", alias = "highpass")]
    Highpass,
    /// Pass between the two cutoffs
    #[serde(rename = "bandpass")]
    Bandpass,
    /// Reject between the two cutoffs
    #[serde(rename = "bandstop")]
    Bandstop,
}

impl BandType {
    /// Parse the short names used by collaborators ("low", "high", ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "low" | "lowpass" => Some(BandType::Lowpass),
            "high" | "highpass" => Some(BandType::Highpass),
            "bandpass" | "band" => Some(BandType::Bandpass),
            "bandstop" | "stop" => Some(BandType::Bandstop),
            _ => None,
        }
    }

    /// True for the two-edge kinds
    pub fn is_band(&self) -> bool {
        matches!(self, BandType::Bandpass | BandType::Bandstop)
    }
}

/// Cutoff specification in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cutoff {
    /// Single edge for low/high pass
    Single(f64),
    /// `(low, high)` edges for band kinds
    Band(f64, f64),
}

/// One second-order section, `a[0]` normalized to 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    /// Numerator coefficients
    pub b: [f64; 3],
    /// Denominator coefficients
    pub a: [f64; 3],
}

impl Biquad {
    /// Complex response at normalized angular frequency `omega` (rad/sample)
    pub fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = self.a[0] + z1 * self.a[1] + z2 * self.a[2];
        num / den
    }

    /// DC gain `sum(b) / sum(a)`
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    fn scaled(mut self, gain: f64) -> Self {
        for b in &mut self.b {
            *b *= gain;
        }
        self
    }
}

/// Cascade of second-order sections
#[derive(Debug, Clone, PartialEq)]
pub struct SosFilter {
    sections: Vec<Biquad>,
    order: usize,
}

impl SosFilter {
    /// Build a cascade; `order` is the order of the overall transfer function
    pub fn new(sections: Vec<Biquad>, order: usize) -> EmgResult<Self> {
        if sections.is_empty() {
            return Err(EmgError::invalid_parameter(
                ProcessingStage::Filtering,
                "sections",
                "filter needs at least one section",
            ));
        }
        if sections.iter().any(|s| s.a[0] != 1.0) {
            return Err(EmgError::invalid_parameter(
                ProcessingStage::Filtering,
                "sections",
                "section denominators must be normalized (a[0] == 1)",
            ));
        }
        Ok(Self { sections, order })
    }

    /// Sections in application order
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Transfer function order
    pub fn order(&self) -> usize {
        self.order
    }

    /// Magnitude response at `freq_hz` for sampling rate `fs`
    pub fn magnitude_at(&self, freq_hz: f64, fs: f64) -> f64 {
        let omega = 2.0 * std::f64::consts::PI * freq_hz / fs;
        self.sections
            .iter()
            .map(|s| s.response(omega))
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }
}

/// Normalize `cutoff_hz` by Nyquist, requiring the result to lie in (0, 1)
pub(crate) fn normalized_frequency(
    cutoff_hz: f64,
    fs: f64,
    parameter: &'static str,
) -> EmgResult<f64> {
    if !(fs.is_finite() && fs > 0.0) {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Filtering,
            "fs",
            format!("sampling rate must be positive, got {}", fs),
        ));
    }
    let normalized = cutoff_hz / (fs / 2.0);
    if !(normalized > 0.0 && normalized < 1.0) {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Filtering,
            parameter,
            format!(
                "{} Hz normalizes to {:.4}, must lie strictly between 0 and Nyquist ({} Hz)",
                cutoff_hz,
                normalized,
                fs / 2.0
            ),
        ));
    }
    Ok(normalized)
}
