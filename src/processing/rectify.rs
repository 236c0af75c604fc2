// src/processing/rectify.rs
//! Full-wave rectification

/// Element-wise absolute value
pub fn rectify(signal: &[f64]) -> Vec<f64> {
    signal.iter().map(|x| x.abs()).collect()
}
