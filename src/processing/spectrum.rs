// src/processing/spectrum.rs
//! FFT power spectrum for checking mains residue and band content

use crate::error::{EmgError, EmgResult, ProcessingStage};
use rustfft::{num_complex::Complex, FftPlanner};

/// One-sided power spectrum
///
/// Bin powers sum to the mean square of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
}

impl PowerSpectrum {
    /// Frequency resolution (Hz per bin)
    pub fn resolution(&self) -> f64 {
        self.frequencies.get(1).copied().unwrap_or(0.0)
    }

    /// Total power of bins with `low_hz <= f <= high_hz`
    pub fn band_power(&self, low_hz: f64, high_hz: f64) -> f64 {
        self.frequencies
            .iter()
            .zip(&self.power)
            .filter(|(&f, _)| f >= low_hz && f <= high_hz)
            .map(|(_, &p)| p)
            .sum()
    }

    /// Frequency of the strongest non-DC bin
    pub fn peak_frequency(&self) -> Option<f64> {
        self.frequencies
            .iter()
            .zip(&self.power)
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&f, _)| f)
    }
}

/// Rectangular-window power spectrum of the whole signal
pub fn power_spectrum(signal: &[f64], fs: f64) -> EmgResult<PowerSpectrum> {
    if signal.is_empty() {
        return Err(EmgError::insufficient_length(ProcessingStage::Filtering, 0, 1));
    }
    if !(fs.is_finite() && fs > 0.0) {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Filtering,
            "fs",
            format!("sampling rate must be positive, got {}", fs),
        ));
    }

    let n = signal.len();
    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let n_freqs = n / 2 + 1;
    let norm = 1.0 / (n as f64).powi(2);

    let power = buffer[..n_freqs]
        .iter()
        .enumerate()
        .map(|(k, c)| {
            let p = c.norm_sqr() * norm;
            // Fold the negative-frequency half in, except at DC and Nyquist
            if k == 0 || (n % 2 == 0 && k == n / 2) {
                p
            } else {
                2.0 * p
            }
        })
        .collect();

    let frequencies = (0..n_freqs).map(|k| k as f64 * fs / n as f64).collect();

    Ok(PowerSpectrum { frequencies, power })
}

/// Power of `signal` between `low_hz` and `high_hz` inclusive
pub fn band_power(signal: &[f64], fs: f64, low_hz: f64, high_hz: f64) -> EmgResult<f64> {
    if low_hz > high_hz {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Filtering,
            "band",
            format!("low edge {} Hz is above high edge {} Hz", low_hz, high_hz),
        ));
    }
    Ok(power_spectrum(signal, fs)?.band_power(low_hz, high_hz))
}
