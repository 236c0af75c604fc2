//! Synthetic EMG shared by the integration tests

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

pub const FS: f64 = 2000.0;

/// Uniform noise modulated by `envelope(t)`, reproducible per seed
pub fn synthetic_emg<F: Fn(f64) -> f64>(seconds: f64, seed: u64, envelope: F) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = (seconds * FS) as usize;
    (0..n)
        .map(|i| envelope(i as f64 / FS) * rng.gen_range(-1.0..1.0))
        .collect()
}

/// Quiet baseline with one contraction between `onset` and `offset` seconds
pub fn contraction(seconds: f64, onset: f64, offset: f64, seed: u64) -> Vec<f64> {
    synthetic_emg(seconds, seed, |t| if (onset..offset).contains(&t) { 1.0 } else { 0.02 })
}

pub fn sine(freq_hz: f64, amplitude: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| amplitude * (2.0 * PI * freq_hz * i as f64 / FS).sin())
        .collect()
}

pub fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}
