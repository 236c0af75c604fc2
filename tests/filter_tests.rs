// tests/filter_tests.rs
//! Filter bank behaviour on synthetic signals

mod common;

use common::{add, sine, synthetic_emg, FS};
use emg_grasp::config::{ButterworthConfig, FilterBankConfig, NotchConfig};
use emg_grasp::error::{EmgError, ProcessingStage};
use emg_grasp::processing::filter_bank::apply_filter_channels;
use emg_grasp::processing::filters::{butterworth, filtfilt, padlen};
use emg_grasp::processing::{
    apply_filter, apply_notch, band_power, BandType, Cutoff, FilterBank,
};
use emg_grasp::MultiChannelSignal;

/// Mains hum on top of muscle activity is removed by the notch stage
#[test]
fn test_notch_removes_mains() {
    let emg = synthetic_emg(2.0, 7, |_| 0.5);
    let hum = sine(50.0, 1.0, emg.len());
    let noisy = add(&emg, &hum);
    let cleaned = apply_notch(&noisy, 50.0, FS, 30.0).unwrap();
    assert_eq!(cleaned.len(), noisy.len());

    // Compare the middle second, away from the edge transients
    let (a, b) = (1000, 3000);
    let before = band_power(&noisy[a..b], FS, 49.0, 51.0).unwrap();
    let after = band_power(&cleaned[a..b], FS, 49.0, 51.0).unwrap();
    assert!(after < before * 0.01, "mains power {} -> {}", before, after);

    // Activity away from the notch survives
    let broadband_before = band_power(&noisy[a..b], FS, 100.0, 400.0).unwrap();
    let broadband_after = band_power(&cleaned[a..b], FS, 100.0, 400.0).unwrap();
    assert!((broadband_after / broadband_before - 1.0).abs() < 0.05);
}

/// Lowpass keeps the passband tone and attenuates the stopband tone
#[test]
fn test_lowpass_separates_tones() {
    let n = 4000;
    let mixed = add(&sine(100.0, 1.0, n), &sine(800.0, 1.0, n));
    let filtered = apply_filter(&mixed, BandType::Lowpass, Cutoff::Single(450.0), FS, 4).unwrap();

    let pass = band_power(&filtered, FS, 95.0, 105.0).unwrap();
    let stop = band_power(&filtered, FS, 795.0, 805.0).unwrap();
    // A unit sine carries 0.5 power
    assert!((pass - 0.5).abs() < 0.01, "passband power {}", pass);
    assert!(stop < 1e-4, "stopband power {}", stop);
}

/// Forward-backward filtering introduces no lag
#[test]
fn test_zero_phase() {
    let pulse: Vec<f64> = (0..2000)
        .map(|i| (-((i as f64 - 1000.0) / 20.0).powi(2) / 2.0).exp())
        .collect();
    let filtered = apply_filter(&pulse, BandType::Lowpass, Cutoff::Single(200.0), FS, 4).unwrap();

    let argmax = |x: &[f64]| {
        x.iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    };
    assert_eq!(argmax(&filtered), 1000);
}

/// Bandpass rejects both out-of-band tones
#[test]
fn test_bandpass() {
    let n = 4000;
    let mixed = add(&add(&sine(5.0, 1.0, n), &sine(100.0, 1.0, n)), &sine(900.0, 1.0, n));
    let filtered = apply_filter(&mixed, BandType::Bandpass, Cutoff::Band(20.0, 450.0), FS, 4).unwrap();

    assert!(band_power(&filtered, FS, 95.0, 105.0).unwrap() > 0.45);
    assert!(band_power(&filtered, FS, 0.0, 7.0).unwrap() < 1e-3);
    assert!(band_power(&filtered, FS, 895.0, 905.0).unwrap() < 1e-4);
}

/// Signals no longer than the padding are rejected
#[test]
fn test_short_signal_rejected() {
    let filter = butterworth(4, BandType::Lowpass, Cutoff::Single(450.0), FS).unwrap();
    let edge = padlen(&filter);

    match filtfilt(&filter, &vec![0.0; edge]) {
        Err(EmgError::InsufficientLength { stage, got, need }) => {
            assert_eq!(stage, ProcessingStage::Filtering);
            assert_eq!(got, edge);
            assert_eq!(need, edge + 1);
        }
        other => panic!("Expected insufficient length, got {:?}", other),
    }
    assert!(filtfilt(&filter, &vec![0.0; edge + 1]).is_ok());
}

/// Design errors surface as invalid parameters
#[test]
fn test_invalid_design() {
    let above_nyquist = apply_filter(&[0.0; 100], BandType::Lowpass, Cutoff::Single(1200.0), FS, 4);
    assert!(matches!(above_nyquist, Err(EmgError::InvalidParameter { .. })));

    let inverted_band = apply_filter(&[0.0; 100], BandType::Bandpass, Cutoff::Band(300.0, 100.0), FS, 4);
    assert!(matches!(inverted_band, Err(EmgError::InvalidParameter { .. })));

    let zero_order = apply_filter(&[0.0; 100], BandType::Highpass, Cutoff::Single(20.0), FS, 0);
    assert!(matches!(zero_order, Err(EmgError::InvalidParameter { .. })));
}

/// Configured bank equals the two stages applied by hand
#[test]
fn test_bank_matches_manual_stages() {
    let config = FilterBankConfig {
        butterworth: Some(ButterworthConfig {
            band: BandType::Highpass,
            cutoff: Cutoff::Single(20.0),
            order: 2,
        }),
        notch: Some(NotchConfig {
            frequency_hz: 60.0,
            quality_factor: 20.0,
        }),
    };
    let bank = FilterBank::from_config(&config, FS).unwrap();
    assert_eq!(bank.filter_counts(), (1, 1));

    let signal = synthetic_emg(1.0, 3, |_| 1.0);
    let manual = apply_filter(&signal, BandType::Highpass, Cutoff::Single(20.0), FS, 2)
        .and_then(|s| apply_notch(&s, 60.0, FS, 20.0))
        .unwrap();
    let banked = bank.process(&signal).unwrap();

    for (a, b) in manual.iter().zip(&banked) {
        assert!((a - b).abs() < 1e-12);
    }
}

/// Channels are filtered independently and keep their order
#[test]
fn test_multichannel_order() {
    let quiet = synthetic_emg(1.0, 1, |_| 0.1);
    let loud = synthetic_emg(1.0, 2, |_| 1.0);
    let signal = MultiChannelSignal::from_channels(vec![quiet.clone(), loud.clone()], FS).unwrap();

    let filtered =
        apply_filter_channels(&signal, BandType::Lowpass, Cutoff::Single(450.0), 4).unwrap();
    assert_eq!(filtered.channel_count(), 2);

    let expected_loud = apply_filter(&loud, BandType::Lowpass, Cutoff::Single(450.0), FS, 4).unwrap();
    assert_eq!(filtered.select_channel(1).unwrap(), expected_loud);
}
