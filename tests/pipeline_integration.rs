// tests/pipeline_integration.rs
//! End-to-end analysis of synthetic recordings

mod common;

use common::{contraction, FS};
use emg_grasp::config::ThresholdConfig;
use emg_grasp::processing::{normalize, rectify};
use emg_grasp::{
    EmgPipeline, FeatureKind, NormalizationMethod, PipelineConfig, Recording, SmoothingMethod,
    ThresholdMethod,
};
use proptest::prelude::*;
use serde_json::json;

fn normalized_config() -> PipelineConfig {
    PipelineConfig {
        normalization: NormalizationMethod::MaxAbs,
        ..PipelineConfig::default()
    }
}

/// Rectify then normalize a short signal
#[test]
fn test_rectify_normalize() {
    let out = normalize(&rectify(&[-4.0, 2.0, -1.0, 3.0])).unwrap();
    assert_eq!(out, vec![1.0, 0.5, 0.25, 0.75]);
}

/// Recording bundle through every stage, with the control comparison
#[test]
fn test_recording_end_to_end() {
    let ch0 = contraction(4.0, 1.0, 2.5, 1);
    let ch1 = contraction(4.0, 1.0, 2.5, 2);
    // 40 control rows over 4 s; column 1 follows the contraction
    let control: Vec<Vec<f64>> = (0..40)
        .map(|row| {
            let t = row as f64 / 10.0;
            vec![0.0, if (1.0..2.5).contains(&t) { 0.8 } else { 0.05 }]
        })
        .collect();
    let bundle = json!({
        "sampling_rate_hz": FS,
        "emg": [ch0, ch1],
        "myocontrol": control,
    });
    let recording = Recording::from_json_str(&bundle.to_string()).unwrap();

    let mut config = normalized_config();
    config.smoothing = SmoothingMethod::MovingRms { window_size: 50 };
    config.grasp.control_column = Some(1);
    let pipeline = EmgPipeline::new(config).unwrap();

    let control = recording.control.as_ref().map(|m| m.view());
    let results = pipeline.process_all(&recording.signal, control).unwrap();
    assert_eq!(results.len(), 2);

    for analysis in &results {
        assert_eq!(analysis.processed.len(), 8000);
        assert_eq!(analysis.features.n_rows(), (8000 - 200) / 50 + 1);
        assert_eq!(analysis.events.len(), 1);

        let event = analysis.events[0];
        assert!((event.onset_sec - 1.0).abs() < 0.15, "onset {}", event.onset_sec);
        assert!((event.offset_sec - 2.5).abs() < 0.15, "offset {}", event.offset_sec);
        assert!(analysis.agreement().unwrap() > 0.9);
    }

    let summary = results[1].summary(1, pipeline.feature_rate());
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["channel"], 1);
    assert_eq!(value["events"].as_array().unwrap().len(), 1);
}

/// Dynamic thresholds adapt to the recording's own level
#[test]
fn test_dynamic_threshold() {
    let signal: Vec<f64> = contraction(4.0, 1.5, 3.0, 5).iter().map(|v| v * 0.01).collect();

    // Unnormalized: the fixed RMS threshold is far above this signal
    let fixed = EmgPipeline::new(PipelineConfig::default()).unwrap();
    assert!(fixed.analyze_channel(&signal, None).unwrap().events.is_empty());

    let config = PipelineConfig {
        threshold: ThresholdConfig {
            method: ThresholdMethod::MeanStd,
            ..ThresholdConfig::default()
        },
        ..PipelineConfig::default()
    };
    let adaptive = EmgPipeline::new(config).unwrap();
    let analysis = adaptive.analyze_channel(&signal, None).unwrap();
    assert_eq!(analysis.events.len(), 1);
    assert!(analysis.threshold < 0.01);
}

/// Detection on a different feature
#[test]
fn test_detection_feature_choice() {
    let mut config = PipelineConfig::default();
    config.threshold.feature = FeatureKind::Mav;
    config.features.selected = vec![FeatureKind::Mav, FeatureKind::Wamp];
    let pipeline = EmgPipeline::new(config).unwrap();

    let analysis = pipeline.analyze_channel(&contraction(3.0, 1.0, 2.0, 9), None).unwrap();
    assert_eq!(analysis.features.columns(), &[FeatureKind::Mav, FeatureKind::Wamp]);
    assert_eq!(analysis.threshold, 0.22);
    assert_eq!(analysis.events.len(), 1);
}

/// Savitzky-Golay smoothing keeps the signal length inside the pipeline
#[test]
fn test_savgol_smoothing() {
    let mut config = normalized_config();
    config.smoothing = SmoothingMethod::from_name("sg");
    let pipeline = EmgPipeline::new(config).unwrap();

    let signal = contraction(2.0, 0.5, 1.5, 4);
    let processed = pipeline.condition(&signal).unwrap();
    assert_eq!(processed.len(), signal.len());
    let peak = processed.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    assert!((peak - 1.0).abs() < 1e-12);
}

/// Silence cannot be normalized
#[test]
fn test_silent_channel() {
    let pipeline = EmgPipeline::new(normalized_config()).unwrap();
    assert!(pipeline.analyze_channel(&vec![0.0; 4000], None).is_err());
}

proptest! {
    #[test]
    fn prop_normalize_peaks_at_one(signal in prop::collection::vec(-100.0f64..100.0, 1..200)) {
        prop_assume!(signal.iter().any(|&v| v != 0.0));
        let out = normalize(&signal).unwrap();
        let peak = out.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        prop_assert!((peak - 1.0).abs() < 1e-12);
        prop_assert_eq!(out.len(), signal.len());
    }

    #[test]
    fn prop_rectify_non_negative(signal in prop::collection::vec(-10.0f64..10.0, 0..200)) {
        let out = rectify(&signal);
        prop_assert!(out.iter().zip(&signal).all(|(r, s)| *r >= 0.0 && *r == s.abs()));
    }
}
