// src/processing/filters/butterworth.rs
//! Butterworth filter design as second-order sections
//!
//! The analog prototype poles are frequency transformed for the requested
//! band, mapped to the z-plane with the bilinear transform (after tan
//! pre-warping) and paired into biquads. Every section is then scaled to unit
//! gain at the band's reference frequency.

use super::{normalized_frequency, BandType, Biquad, Cutoff, SosFilter};
use crate::error::{EmgError, EmgResult, ProcessingStage};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

const IMAG_TOLERANCE: f64 = 1e-12;

/// Design an order-`order` Butterworth filter
///
/// `cutoff` must be [`Cutoff::Single`] for low/high pass and
/// [`Cutoff::Band`] for bandpass/bandstop. Band kinds produce a transfer
/// function of order `2 * order`.
pub fn butterworth(order: usize, band: BandType, cutoff: Cutoff, fs: f64) -> EmgResult<SosFilter> {
    if order == 0 {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Filtering,
            "order",
            "filter order must be at least 1",
        ));
    }

    let prototype = prototype_poles(order);

    match (band, cutoff) {
        (BandType::Lowpass, Cutoff::Single(fc)) | (BandType::Highpass, Cutoff::Single(fc)) => {
            let wn = normalized_frequency(fc, fs, "cutoff")?;
            let warped = prewarp(wn);

            let analog: Vec<Complex64> = if band == BandType::Lowpass {
                prototype.iter().map(|&p| p * warped).collect()
            } else {
                prototype.iter().map(|&p| warped / p).collect()
            };

            let (numerator, omega_ref) = if band == BandType::Lowpass {
                (SectionZeros::Lowpass, 0.0)
            } else {
                (SectionZeros::Highpass, PI)
            };
            assemble(&analog, numerator, omega_ref, order)
        }
        (BandType::Bandpass, Cutoff::Band(low, high)) | (BandType::Bandstop, Cutoff::Band(low, high)) => {
            let wl = normalized_frequency(low, fs, "cutoff.low")?;
            let wh = normalized_frequency(high, fs, "cutoff.high")?;
            if wl >= wh {
                return Err(EmgError::invalid_parameter(
                    ProcessingStage::Filtering,
                    "cutoff",
                    format!("low edge {} Hz must be below high edge {} Hz", low, high),
                ));
            }

            let (w1, w2) = (prewarp(wl), prewarp(wh));
            let bw = w2 - w1;
            let w0 = (w1 * w2).sqrt();
            let center = 2.0 * w0.atan();

            let mut analog = Vec::with_capacity(2 * order);
            for &p in &prototype {
                let a = if band == BandType::Bandpass {
                    p * (bw / 2.0)
                } else {
                    (bw / 2.0) / p
                };
                let d = (a * a - w0 * w0).sqrt();
                analog.push(a + d);
                analog.push(a - d);
            }

            let (numerator, omega_ref) = if band == BandType::Bandpass {
                (SectionZeros::Bandpass, center)
            } else {
                (SectionZeros::Bandstop { center }, 0.0)
            };
            assemble(&analog, numerator, omega_ref, 2 * order)
        }
        (band, cutoff) => Err(EmgError::invalid_parameter(
            ProcessingStage::Filtering,
            "cutoff",
            format!("{:?} filter cannot use cutoff {:?}", band, cutoff),
        )),
    }
}

/// Left half-plane poles of the normalized analog Butterworth prototype
fn prototype_poles(order: usize) -> Vec<Complex64> {
    (0..order)
        .map(|k| {
            let theta = PI / 2.0 + PI * (2 * k + 1) as f64 / (2 * order) as f64;
            Complex64::from_polar(1.0, theta)
        })
        .collect()
}

/// Pre-warp a Nyquist-normalized frequency for the bilinear transform
fn prewarp(wn: f64) -> f64 {
    (PI * wn / 2.0).tan()
}

/// Bilinear transform with unit sample period scaling: z = (1 + s) / (1 - s)
fn bilinear(s: Complex64) -> Complex64 {
    (1.0 + s) / (1.0 - s)
}

/// Zero placement for each section kind
#[derive(Debug, Clone, Copy)]
enum SectionZeros {
    Lowpass,
    Highpass,
    Bandpass,
    Bandstop { center: f64 },
}

impl SectionZeros {
    fn second_order(&self) -> [f64; 3] {
        match self {
            SectionZeros::Lowpass => [1.0, 2.0, 1.0],
            SectionZeros::Highpass => [1.0, -2.0, 1.0],
            SectionZeros::Bandpass => [1.0, 0.0, -1.0],
            SectionZeros::Bandstop { center } => [1.0, -2.0 * center.cos(), 1.0],
        }
    }

    fn first_order(&self) -> [f64; 3] {
        match self {
            SectionZeros::Highpass => [1.0, -1.0, 0.0],
            _ => [1.0, 1.0, 0.0],
        }
    }
}

fn assemble(
    analog_poles: &[Complex64],
    zeros: SectionZeros,
    omega_ref: f64,
    order: usize,
) -> EmgResult<SosFilter> {
    let digital: Vec<Complex64> = analog_poles.iter().map(|&s| bilinear(s)).collect();

    let mut denominators = Vec::with_capacity(digital.len() / 2 + 1);

    for p in digital.iter().filter(|p| p.im > IMAG_TOLERANCE) {
        denominators.push(([1.0, -2.0 * p.re, p.norm_sqr()], true));
    }

    let mut real: Vec<f64> = digital
        .iter()
        .filter(|p| p.im.abs() <= IMAG_TOLERANCE)
        .map(|p| p.re)
        .collect();
    real.sort_by(|a, b| a.total_cmp(b));

    let mut pairs = real.chunks_exact(2);
    for pair in &mut pairs {
        denominators.push(([1.0, -(pair[0] + pair[1]), pair[0] * pair[1]], true));
    }
    if let [single] = pairs.remainder() {
        denominators.push(([1.0, -single, 0.0], false));
    }

    let sections = denominators
        .into_iter()
        .map(|(a, second_order)| {
            let b = if second_order {
                zeros.second_order()
            } else {
                zeros.first_order()
            };
            let raw = Biquad { b, a };
            let gain = raw.response(omega_ref).norm();
            if gain > 0.0 && gain.is_finite() {
                Ok(raw.scaled(1.0 / gain))
            } else {
                Err(EmgError::invalid_parameter(
                    ProcessingStage::Filtering,
                    "cutoff",
                    "filter design produced a section with zero reference gain",
                ))
            }
        })
        .collect::<EmgResult<Vec<_>>>()?;

    SosFilter::new(sections, order)
}
