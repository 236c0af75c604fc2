// src/processing/smoothing.rs
//! Envelope smoothing: Savitzky-Golay, moving MAV and moving RMS

use crate::config::constants::smoothing as defaults;
use crate::error::{EmgError, EmgResult, ProcessingStage};
use serde::{Deserialize, Serialize};

/// Smoothing method with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum SmoothingMethod {
    /// Local least-squares polynomial fit
    #[serde(rename = "sg")]
    SavitzkyGolay {
        #[serde(default = "default_window_length")]
        window_length: usize,
        #[serde(default = "default_polyorder")]
        polyorder: usize,
    },
    /// Moving mean of the absolute signal
    #[serde(rename = "mav")]
    MovingAverage {
        #[serde(default = "default_window_size")]
        window_size: usize,
    },
    /// Moving root-mean-square
    #[serde(rename = "rms")]
    MovingRms {
        #[serde(default = "default_window_size")]
        window_size: usize,
    },
    /// Identity
    #[default]
    #[serde(rename = "none")]
    None,
}

fn default_window_length() -> usize {
    defaults::DEFAULT_SG_WINDOW_LENGTH
}

fn default_polyorder() -> usize {
    defaults::DEFAULT_SG_POLYORDER
}

fn default_window_size() -> usize {
    defaults::DEFAULT_ENVELOPE_WINDOW
}

impl SmoothingMethod {
    /// Method for a short name with default parameters; unknown names give
    /// [`SmoothingMethod::None`]
    pub fn from_name(name: &str) -> Self {
        match name {
            "sg" => SmoothingMethod::SavitzkyGolay {
                window_length: default_window_length(),
                polyorder: default_polyorder(),
            },
            "mav" => SmoothingMethod::MovingAverage {
                window_size: default_window_size(),
            },
            "rms" => SmoothingMethod::MovingRms {
                window_size: default_window_size(),
            },
            _ => SmoothingMethod::None,
        }
    }

    /// Short name of the method
    pub fn name(&self) -> &'static str {
        match self {
            SmoothingMethod::SavitzkyGolay { .. } => "sg",
            SmoothingMethod::MovingAverage { .. } => "mav",
            SmoothingMethod::MovingRms { .. } => "rms",
            SmoothingMethod::None => "none",
        }
    }

    /// Length-independent parameter checks
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            SmoothingMethod::SavitzkyGolay { window_length, polyorder } => {
                if window_length % 2 == 0 {
                    Err(format!("Savitzky-Golay window length ({}) must be odd", window_length))
                } else if window_length <= polyorder {
                    Err(format!(
                        "Savitzky-Golay window length ({}) must exceed polyorder ({})",
                        window_length, polyorder
                    ))
                } else {
                    Ok(())
                }
            }
            SmoothingMethod::MovingAverage { window_size } | SmoothingMethod::MovingRms { window_size } => {
                if window_size == 0 {
                    Err("Smoothing window size must be greater than 0".to_string())
                } else {
                    Ok(())
                }
            }
            SmoothingMethod::None => Ok(()),
        }
    }
}

/// Smooth `signal` with `method`, returning a signal of the same length
pub fn smooth(signal: &[f64], method: &SmoothingMethod) -> EmgResult<Vec<f64>> {
    match *method {
        SmoothingMethod::SavitzkyGolay { window_length, polyorder } => {
            savgol(signal, window_length, polyorder)
        }
        SmoothingMethod::MovingAverage { window_size } => moving_average(signal, window_size),
        SmoothingMethod::MovingRms { window_size } => moving_rms(signal, window_size),
        SmoothingMethod::None => Ok(signal.to_vec()),
    }
}

/// Savitzky-Golay smoothing
///
/// Interior samples use the fixed least-squares weights of a centred window;
/// the first and last `window_length / 2` samples are evaluated from a
/// polynomial fitted over the first and last full window.
pub fn savgol(signal: &[f64], window_length: usize, polyorder: usize) -> EmgResult<Vec<f64>> {
    SmoothingMethod::SavitzkyGolay { window_length, polyorder }
        .validate()
        .map_err(|reason| EmgError::invalid_parameter(ProcessingStage::Smoothing, "window_length", reason))?;

    let n = signal.len();
    if window_length > n {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Smoothing,
            "window_length",
            format!("window length {} exceeds signal length {}", window_length, n),
        ));
    }
    if window_length == 1 {
        return Ok(signal.to_vec());
    }

    let half = window_length / 2;
    let positions: Vec<f64> = (0..window_length)
        .map(|i| (i as f64 - half as f64) / half as f64)
        .collect();

    // Weights for the centre value of the fit: row 0 of (AᵀA)⁻¹Aᵀ
    let mut e0 = vec![0.0; polyorder + 1];
    e0[0] = 1.0;
    let v = solve(normal_matrix(&positions, polyorder), e0)?;
    let weights: Vec<f64> = positions.iter().map(|&t| eval_poly(&v, t)).collect();

    let mut output = vec![0.0; n];
    for i in half..n - half {
        let window = &signal[i - half..=i + half];
        output[i] = window.iter().zip(&weights).map(|(x, w)| x * w).sum();
    }

    let head = polyfit(&positions, &signal[..window_length], polyorder)?;
    for i in 0..half {
        output[i] = eval_poly(&head, positions[i]);
    }

    let tail = polyfit(&positions, &signal[n - window_length..], polyorder)?;
    for i in window_length - half..window_length {
        output[n - window_length + i] = eval_poly(&tail, positions[i]);
    }

    Ok(output)
}

/// Moving mean of `|x|` with centred "same" alignment
pub fn moving_average(signal: &[f64], window_size: usize) -> EmgResult<Vec<f64>> {
    let magnitudes: Vec<f64> = signal.iter().map(|x| x.abs()).collect();
    same_mean(&magnitudes, window_size)
}

/// Moving root-mean-square with centred "same" alignment
pub fn moving_rms(signal: &[f64], window_size: usize) -> EmgResult<Vec<f64>> {
    let squares: Vec<f64> = signal.iter().map(|x| x * x).collect();
    // Prefix-sum cancellation can leave tiny negatives
    Ok(same_mean(&squares, window_size)?
        .into_iter()
        .map(|m| m.max(0.0).sqrt())
        .collect())
}

/// Convolution with a `1/w` box kernel, output aligned to the input
///
/// Output `i` averages input samples `i + s - w + 1 ..= i + s` with
/// `s = (w - 1) / 2`; samples outside the signal count as zero.
fn same_mean(values: &[f64], window_size: usize) -> EmgResult<Vec<f64>> {
    if window_size == 0 {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Smoothing,
            "window_size",
            "window size must be at least one sample",
        ));
    }

    let n = values.len();
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for &v in values {
        acc += v;
        prefix.push(acc);
    }

    let shift = (window_size - 1) / 2;
    let scale = 1.0 / window_size as f64;

    Ok((0..n)
        .map(|i| {
            let hi = (i + shift + 1).min(n);
            let lo = (i + shift + 1).saturating_sub(window_size);
            (prefix[hi] - prefix[lo]) * scale
        })
        .collect())
}

/// Normal-equation matrix `AᵀA` for a polynomial basis over `positions`
fn normal_matrix(positions: &[f64], degree: usize) -> Vec<Vec<f64>> {
    (0..=degree)
        .map(|r| {
            (0..=degree)
                .map(|c| positions.iter().map(|t| t.powi((r + c) as i32)).sum())
                .collect()
        })
        .collect()
}

/// Least-squares polynomial coefficients (lowest power first)
fn polyfit(positions: &[f64], values: &[f64], degree: usize) -> EmgResult<Vec<f64>> {
    let rhs: Vec<f64> = (0..=degree)
        .map(|r| {
            positions
                .iter()
                .zip(values)
                .map(|(t, y)| t.powi(r as i32) * y)
                .sum()
        })
        .collect();
    solve(normal_matrix(positions, degree), rhs)
}

fn eval_poly(coefficients: &[f64], t: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Gaussian elimination with partial pivoting
fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> EmgResult<Vec<f64>> {
    let size = rhs.len();

    for col in 0..size {
        let pivot = (col..size)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot][col].abs() < 1e-12 {
            return Err(EmgError::invalid_parameter(
                ProcessingStage::Smoothing,
                "polyorder",
                "polynomial fit is singular for this window",
            ));
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..size {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..size {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; size];
    for row in (0..size).rev() {
        let tail: f64 = (row + 1..size).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_all_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() < tol, "index {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn test_method_names() {
        assert_eq!(
            SmoothingMethod::from_name("sg"),
            SmoothingMethod::SavitzkyGolay { window_length: 101, polyorder: 2 }
        );
        assert_eq!(SmoothingMethod::from_name("mav"), SmoothingMethod::MovingAverage { window_size: 100 });
        assert_eq!(SmoothingMethod::from_name("rms"), SmoothingMethod::MovingRms { window_size: 100 });
        assert_eq!(SmoothingMethod::from_name("none"), SmoothingMethod::None);
        assert_eq!(SmoothingMethod::from_name("gaussian"), SmoothingMethod::None);
        assert_eq!(SmoothingMethod::from_name("rms").name(), "rms");
    }

    #[test]
    fn test_unknown_method_is_identity() {
        let signal = vec![1.0, -2.0, 3.0];
        assert_eq!(smooth(&signal, &SmoothingMethod::from_name("median")).unwrap(), signal);
    }

    #[test]
    fn test_moving_average_same_alignment() {
        // Window 3 is centred, edges see zero padding
        let out = moving_average(&[3.0, -3.0, 3.0, -3.0], 3).unwrap();
        assert_all_close(&out, &[2.0, 3.0, 3.0, 2.0], 1e-12);

        // Even window averages the current and previous sample
        let out = moving_average(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_all_close(&out, &[0.5, 1.5, 2.5, 3.5], 1e-12);
    }

    #[test]
    fn test_window_longer_than_signal() {
        let out = moving_average(&[1.0, 1.0], 5).unwrap();
        assert_all_close(&out, &[0.4, 0.4], 1e-12);
    }

    #[test]
    fn test_moving_rms() {
        let out = moving_rms(&[2.0, -2.0, 2.0, -2.0, 2.0], 1).unwrap();
        assert_all_close(&out, &[2.0; 5], 1e-12);

        let out = moving_rms(&[0.0, 3.0, 4.0], 2).unwrap();
        assert_all_close(&out, &[0.0, 4.5f64.sqrt(), 12.5f64.sqrt()], 1e-12);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(moving_average(&[1.0], 0).is_err());
        assert!(smooth(&[1.0], &SmoothingMethod::MovingRms { window_size: 0 }).is_err());
    }

    #[test]
    fn test_savgol_preserves_polynomials() {
        // A quadratic is reproduced exactly, edges included
        let signal: Vec<f64> = (0..50).map(|i| 0.5 * (i as f64).powi(2) - 3.0 * i as f64 + 1.0).collect();
        let out = savgol(&signal, 11, 2).unwrap();
        assert_all_close(&out, &signal, 1e-6);
    }

    #[test]
    fn test_savgol_interior_weights() {
        // Classic 5-point quadratic weights: (-3, 12, 17, 12, -3) / 35
        let mut impulse = vec![0.0; 9];
        impulse[4] = 35.0;
        let out = savgol(&impulse, 5, 2).unwrap();
        assert_all_close(&out[2..7], &[-3.0, 12.0, 17.0, 12.0, -3.0], 1e-9);
    }

    #[test]
    fn test_savgol_parameter_errors() {
        let signal = vec![0.0; 20];
        assert!(matches!(savgol(&signal, 10, 2), Err(EmgError::InvalidParameter { .. })));
        assert!(matches!(savgol(&signal, 3, 3), Err(EmgError::InvalidParameter { .. })));
        assert!(matches!(savgol(&signal, 21, 2), Err(EmgError::InvalidParameter { .. })));
        assert!(savgol(&signal, 19, 2).is_ok());
    }

    #[test]
    fn test_method_serde() {
        let method: SmoothingMethod = toml::from_str("method = \"sg\"\nwindow_length = 51").unwrap();
        assert_eq!(method, SmoothingMethod::SavitzkyGolay { window_length: 51, polyorder: 2 });

        let method: SmoothingMethod = toml::from_str("method = \"none\"").unwrap();
        assert_eq!(method, SmoothingMethod::None);
    }
}
