//! Time domain reducers over one window of samples
//!
//! Every reducer accepts any window length. Difference-based reducers
//! return 0 for windows shorter than two samples; mean-based reducers return
//! 0 for an empty window.

use crate::config::constants::features::LOG_EPSILON;

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

fn diffs(window: &[f64]) -> impl ExactSizeIterator<Item = f64> + '_ {
    window.windows(2).map(|w| w[1] - w[0])
}

/// Population variance
pub fn variance(window: &[f64]) -> f64 {
    let mu = mean(window.iter().copied());
    mean(window.iter().map(|x| (x - mu).powi(2)))
}

/// Root mean square
pub fn rms(window: &[f64]) -> f64 {
    mean(window.iter().map(|x| x * x)).sqrt()
}

/// Integrated EMG, `sum(|x|)`
pub fn integral_emg(window: &[f64]) -> f64 {
    window.iter().map(|x| x.abs()).sum()
}

/// Mean absolute value
pub fn mean_absolute_value(window: &[f64]) -> f64 {
    mean(window.iter().map(|x| x.abs()))
}

/// `ln(sum(x²) + ε)`
pub fn log_energy(window: &[f64]) -> f64 {
    (window.iter().map(|x| x * x).sum::<f64>() + LOG_EPSILON).ln()
}

/// Cumulative absolute first difference
pub fn waveform_length(window: &[f64]) -> f64 {
    diffs(window).map(f64::abs).sum()
}

/// Average amplitude change
pub fn average_amplitude_change(window: &[f64]) -> f64 {
    mean(diffs(window).map(f64::abs))
}

/// Difference absolute standard deviation value
pub fn dasdv(window: &[f64]) -> f64 {
    mean(diffs(window).map(|d| d * d)).sqrt()
}

/// Number of changes in `sign(x - threshold)`; touching the threshold counts
/// as a change into and out of the zero sign
pub fn zero_crossings(window: &[f64], threshold: f64) -> f64 {
    let sign = |x: f64| {
        let v = x - threshold;
        if v > 0.0 {
            1i8
        } else if v < 0.0 {
            -1
        } else {
            0
        }
    };
    window
        .windows(2)
        .filter(|w| sign(w[0]) != sign(w[1]))
        .count() as f64
}

/// Willison amplitude: first differences whose magnitude exceeds `threshold`
pub fn willison_amplitude(window: &[f64], threshold: f64) -> f64 {
    diffs(window).filter(|d| d.abs() > threshold).count() as f64
}

/// Myopulse rate: fraction of samples whose magnitude exceeds `threshold`
pub fn myopulse_rate(window: &[f64], threshold: f64) -> f64 {
    mean(window.iter().map(|x| if x.abs() > threshold { 1.0 } else { 0.0 }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: [f64; 4] = [1.0, -1.0, 2.0, 0.0];

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{} vs {}", a, b);
    }

    #[test]
    fn test_amplitude_features() {
        // mean 0.5, squares 1, 1, 4, 0
        assert_close(variance(&WINDOW), (0.25 + 2.25 + 2.25 + 0.25) / 4.0);
        assert_close(rms(&WINDOW), (6.0f64 / 4.0).sqrt());
        assert_close(integral_emg(&WINDOW), 4.0);
        assert_close(mean_absolute_value(&WINDOW), 1.0);
        assert_close(log_energy(&WINDOW), (6.0 + 1e-10f64).ln());
    }

    #[test]
    fn test_difference_features() {
        // diffs -2, 3, -2
        assert_close(waveform_length(&WINDOW), 7.0);
        assert_close(average_amplitude_change(&WINDOW), 7.0 / 3.0);
        assert_close(dasdv(&WINDOW), (17.0f64 / 3.0).sqrt());
        assert_close(willison_amplitude(&WINDOW, 2.5), 1.0);
    }

    #[test]
    fn test_zero_crossings() {
        assert_close(zero_crossings(&WINDOW, 0.0), 3.0);
        assert_close(zero_crossings(&[1.0, 2.0, 3.0], 0.0), 0.0);
        // Threshold shifts the reference level
        assert_close(zero_crossings(&[1.0, 2.0, 3.0], 1.5), 1.0);
    }

    #[test]
    fn test_myopulse_rate() {
        assert_close(myopulse_rate(&[0.0, 0.5, -0.02, 0.005], 0.01), 0.5);
    }

    #[test]
    fn test_degenerate_windows() {
        assert_close(log_energy(&[0.0; 10]), (1e-10f64).ln());
        assert_close(average_amplitude_change(&[3.0]), 0.0);
        assert_close(dasdv(&[3.0]), 0.0);
        assert_close(variance(&[]), 0.0);
    }
}
