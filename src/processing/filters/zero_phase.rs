// src/processing/filters/zero_phase.rs
//! Forward-backward (zero-phase) filtering

use super::{Biquad, SosFilter};
use crate::error::{EmgError, EmgResult, ProcessingStage};

/// Number of samples reflected at each edge before filtering
pub fn padlen(filter: &SosFilter) -> usize {
    3 * (filter.order() + 1)
}

/// Apply `filter` forward then backward, cancelling its phase response
///
/// The signal is extended at both ends by odd reflection and every section
/// starts from its steady-state response to the first sample, which keeps
/// edge transients out of the result. The signal must be longer than
/// [`padlen`].
pub fn filtfilt(filter: &SosFilter, signal: &[f64]) -> EmgResult<Vec<f64>> {
    let edge = padlen(filter);
    if signal.len() <= edge {
        return Err(EmgError::insufficient_length(
            ProcessingStage::Filtering,
            signal.len(),
            edge + 1,
        ));
    }

    let extended = odd_extension(signal, edge);
    let zi = steady_state(filter.sections());

    let forward = sosfilt(filter.sections(), &extended, &zi);

    let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
    reversed = sosfilt(filter.sections(), &reversed, &zi);
    reversed.reverse();

    Ok(reversed[edge..reversed.len() - edge].to_vec())
}

/// Reflect `edge` samples about each endpoint: `2*x[0] - x[edge..1]` and
/// `2*x[n-1] - x[n-2..n-1-edge]`
fn odd_extension(signal: &[f64], edge: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * edge);
    extended.extend((1..=edge).rev().map(|i| 2.0 * first - signal[i]));
    extended.extend_from_slice(signal);
    extended.extend((1..=edge).map(|i| 2.0 * last - signal[n - 1 - i]));
    extended
}

/// Per-section state for a unit step that has been applied forever
///
/// Each section's state is scaled by the DC gain of the sections before it.
fn steady_state(sections: &[Biquad]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|s| {
            let g = s.dc_gain();
            let z1 = s.b[2] - s.a[2] * g;
            let z0 = s.b[1] - s.a[1] * g + z1;
            let state = [z0 * scale, z1 * scale];
            scale *= g;
            state
        })
        .collect()
}

/// Cascade filtering in transposed direct form II, states seeded with
/// `zi * x[0]`
fn sosfilt(sections: &[Biquad], input: &[f64], zi: &[[f64; 2]]) -> Vec<f64> {
    let x0 = input.first().copied().unwrap_or(0.0);
    let mut states: Vec<[f64; 2]> = zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect();

    input
        .iter()
        .map(|&x| {
            let mut y = x;
            for (s, z) in sections.iter().zip(states.iter_mut()) {
                let input = y;
                y = s.b[0] * input + z[0];
                z[0] = s.b[1] * input - s.a[1] * y + z[1];
                z[1] = s.b[2] * input - s.a[2] * y;
            }
            y
        })
        .collect()
}
