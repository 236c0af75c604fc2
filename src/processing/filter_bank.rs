// src/processing/filter_bank.rs
//! Filter bank combining a Butterworth stage and a mains notch

use crate::config::processing_config::{ButterworthConfig, FilterBankConfig, NotchConfig};
use crate::error::EmgResult;
use crate::processing::filters::{butterworth, filtfilt, iir_notch, padlen, BandType, Cutoff, SosFilter};
use crate::signal::MultiChannelSignal;

/// Zero-phase Butterworth filtering of one signal
///
/// `cutoff` is in Hz; `order` is the design order before the forward-backward
/// pass doubles it.
pub fn apply_filter(
    signal: &[f64],
    band: BandType,
    cutoff: Cutoff,
    fs: f64,
    order: usize,
) -> EmgResult<Vec<f64>> {
    let filter = butterworth(order, band, cutoff, fs)?;
    filtfilt(&filter, signal)
}

/// Zero-phase notch filtering of one signal
pub fn apply_notch(
    signal: &[f64],
    notch_freq: f64,
    fs: f64,
    quality_factor: f64,
) -> EmgResult<Vec<f64>> {
    let filter = iir_notch(notch_freq, fs, quality_factor)?;
    filtfilt(&filter, signal)
}

/// Butterworth filtering applied independently to every channel
pub fn apply_filter_channels(
    signal: &MultiChannelSignal,
    band: BandType,
    cutoff: Cutoff,
    order: usize,
) -> EmgResult<MultiChannelSignal> {
    let filter = butterworth(order, band, cutoff, signal.fs())?;
    signal.map_channels(|channel| filtfilt(&filter, channel))
}

/// Notch filtering applied independently to every channel
pub fn apply_notch_channels(
    signal: &MultiChannelSignal,
    notch_freq: f64,
    quality_factor: f64,
) -> EmgResult<MultiChannelSignal> {
    let filter = iir_notch(notch_freq, signal.fs(), quality_factor)?;
    signal.map_channels(|channel| filtfilt(&filter, channel))
}

/// Filter bank with an optional Butterworth stage followed by an optional notch
#[derive(Debug, Clone)]
pub struct FilterBank {
    butterworth: Option<SosFilter>,
    notch: Option<SosFilter>,
    config: FilterBankConfig,
    sample_rate: f64,
}

impl FilterBank {
    /// Design every configured stage for `sample_rate`
    pub fn from_config(config: &FilterBankConfig, sample_rate: f64) -> EmgResult<Self> {
        let butterworth_stage = match &config.butterworth {
            Some(ButterworthConfig { band, cutoff, order }) => {
                Some(butterworth(*order, *band, *cutoff, sample_rate)?)
            }
            None => None,
        };

        let notch_stage = match &config.notch {
            Some(NotchConfig { frequency_hz, quality_factor }) => {
                Some(iir_notch(*frequency_hz, sample_rate, *quality_factor)?)
            }
            None => None,
        };

        Ok(Self {
            butterworth: butterworth_stage,
            notch: notch_stage,
            config: config.clone(),
            sample_rate,
        })
    }

    /// Run one signal through every stage
    pub fn process(&self, signal: &[f64]) -> EmgResult<Vec<f64>> {
        let mut output = signal.to_vec();

        if let Some(ref filter) = self.butterworth {
            output = filtfilt(filter, &output)?;
        }

        if let Some(ref filter) = self.notch {
            output = filtfilt(filter, &output)?;
        }

        Ok(output)
    }

    /// Run every channel through the bank, preserving channel order
    pub fn process_channels(&self, signal: &MultiChannelSignal) -> EmgResult<MultiChannelSignal> {
        signal.map_channels(|channel| self.process(channel))
    }

    /// Shortest signal every stage accepts
    pub fn min_length(&self) -> usize {
        self.butterworth
            .iter()
            .chain(self.notch.iter())
            .map(|f| padlen(f) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Get configuration
    pub fn config(&self) -> &FilterBankConfig {
        &self.config
    }

    /// Sampling rate the stages were designed for
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Get filter counts as `(butterworth, notch)`
    pub fn filter_counts(&self) -> (usize, usize) {
        (
            usize::from(self.butterworth.is_some()),
            usize::from(self.notch.is_some()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmgError;
    use std::f64::consts::PI;

    fn mixture(fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / fs;
                (2.0 * PI * 10.0 * t).sin() + 0.5 * (2.0 * PI * 50.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_filter_bank_creation() {
        let bank = FilterBank::from_config(&FilterBankConfig::default(), 2000.0).unwrap();
        assert_eq!(bank.filter_counts(), (1, 1));
        assert_eq!(bank.sample_rate(), 2000.0);
        assert_eq!(bank.min_length(), 16);
    }

    #[test]
    fn test_empty_bank_is_identity() {
        let config = FilterBankConfig {
            butterworth: None,
            notch: None,
        };
        let bank = FilterBank::from_config(&config, 1000.0).unwrap();
        let input = vec![1.0, -2.0, 3.0];
        assert_eq!(bank.process(&input).unwrap(), input);
        assert_eq!(bank.min_length(), 0);
    }

    #[test]
    fn test_filter_bank_processing() {
        let fs = 1000.0;
        let config = FilterBankConfig {
            butterworth: Some(ButterworthConfig {
                band: BandType::Lowpass,
                cutoff: Cutoff::Single(450.0),
                order: 4,
            }),
            notch: Some(NotchConfig {
                frequency_hz: 50.0,
                quality_factor: 30.0,
            }),
        };
        let bank = FilterBank::from_config(&config, fs).unwrap();
        let output = bank.process(&mixture(fs, 4000)).unwrap();

        // 10 Hz component survives, 50 Hz component is gone
        let clean: Vec<f64> = (0..4000).map(|i| (2.0 * PI * 10.0 * i as f64 / fs).sin()).collect();
        let err = output[1000..3000]
            .iter()
            .zip(&clean[1000..3000])
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            / 2000.0;
        assert!(err < 1e-3, "mean squared error {}", err);
    }

    #[test]
    fn test_invalid_cutoff_rejected() {
        let config = FilterBankConfig {
            butterworth: Some(ButterworthConfig {
                band: BandType::Lowpass,
                cutoff: Cutoff::Single(450.0),
                order: 4,
            }),
            notch: None,
        };
        let result = FilterBank::from_config(&config, 500.0);
        assert!(matches!(result, Err(EmgError::InvalidParameter { .. })));
    }

    #[test]
    fn test_channels_filtered_independently() {
        let fs = 1000.0;
        let signal = MultiChannelSignal::from_channels(
            vec![vec![1.0; 100], vec![-2.0; 100]],
            fs,
        )
        .unwrap();
        let out = apply_filter_channels(&signal, BandType::Lowpass, Cutoff::Single(100.0), 4).unwrap();

        assert_eq!(out.channel_count(), 2);
        assert!(out.select_channel(0).unwrap().iter().all(|&x| (x - 1.0).abs() < 1e-9));
        assert!(out.select_channel(1).unwrap().iter().all(|&x| (x + 2.0).abs() < 1e-9));

        let notched = apply_notch_channels(&signal, 50.0, 30.0).unwrap();
        assert_eq!(notched.len(), 100);
    }

    #[test]
    fn test_apply_filter_short_signal() {
        let result = apply_filter(&[0.0; 10], BandType::Lowpass, Cutoff::Single(100.0), 1000.0, 4);
        assert!(matches!(result, Err(EmgError::InsufficientLength { .. })));

        let result = apply_notch(&[0.0; 9], 50.0, 1000.0, 30.0);
        assert!(matches!(result, Err(EmgError::InsufficientLength { .. })));
    }
}
