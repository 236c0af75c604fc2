// src/pipeline.rs
//! Offline analysis pipeline
//!
//! Conditions one EMG channel (filter bank, rectification, smoothing,
//! normalization), extracts windowed features and turns the configured
//! detection feature into a grasp mask. A control matrix recorded with the
//! same session can be turned into a second mask aligned to the first for
//! comparison.

use crate::config::PipelineConfig;
use crate::detection::{
    align_mask, detect_grasp_from_threshold, get_myocontrol_grasp, ColumnIndex, GraspEvent,
    GraspMask, ThresholdEngine,
};
use crate::error::{EmgError, EmgResult, ProcessingStage};
use crate::processing::features::{sliding_window_features_with, FeatureTable};
use crate::processing::{rectify, smooth, FilterBank};
use crate::signal::MultiChannelSignal;
use ndarray::ArrayView2;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span};

/// Result of analysing one channel
#[derive(Debug, Clone)]
pub struct ChannelAnalysis {
    /// Conditioned signal, same length as the input
    pub processed: Vec<f64>,
    pub features: FeatureTable,
    /// Threshold applied to the detection feature
    pub threshold: f64,
    /// One entry per feature window
    pub grasp: GraspMask,
    pub events: Vec<GraspEvent>,
    /// Control-derived grasp resampled to the feature windows
    pub control_mask: Option<GraspMask>,
}

impl ChannelAnalysis {
    /// Fraction of windows where the EMG and control masks agree
    pub fn agreement(&self) -> Option<f64> {
        let control = self.control_mask.as_ref()?;
        if self.grasp.is_empty() {
            return None;
        }
        let matching = self
            .grasp
            .as_slice()
            .iter()
            .zip(control.as_slice())
            .filter(|(a, b)| a == b)
            .count();
        Some(matching as f64 / self.grasp.len() as f64)
    }

    /// Serializable digest of the analysis
    pub fn summary(&self, channel: usize, feature_rate_hz: f64) -> AnalysisSummary {
        AnalysisSummary {
            channel,
            samples: self.processed.len(),
            windows: self.features.n_rows(),
            feature_rate_hz,
            threshold: self.threshold,
            active_windows: self.grasp.active_count(),
            events: self.events.clone(),
            control_active_windows: self.control_mask.as_ref().map(GraspMask::active_count),
            agreement: self.agreement(),
        }
    }
}

/// Compact report of a [`ChannelAnalysis`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub channel: usize,
    pub samples: usize,
    pub windows: usize,
    pub feature_rate_hz: f64,
    pub threshold: f64,
    pub active_windows: usize,
    pub events: Vec<GraspEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_active_windows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<f64>,
}

/// Configured analysis pipeline
#[derive(Debug, Clone)]
pub struct EmgPipeline {
    config: PipelineConfig,
    filter_bank: FilterBank,
    thresholds: ThresholdEngine,
}

impl EmgPipeline {
    /// Validate `config` and design its filters
    pub fn new(config: PipelineConfig) -> EmgResult<Self> {
        config.validate().map_err(|errors| EmgError::Configuration {
            component: "pipeline".to_string(),
            reason: errors.join("; "),
        })?;

        let filter_bank = FilterBank::from_config(&config.filter_bank, config.sampling_rate_hz)?;
        let thresholds = ThresholdEngine::new(config.threshold.policy());

        let (butterworth, notch) = filter_bank.filter_counts();
        debug!(
            fs = config.sampling_rate_hz,
            butterworth,
            notch,
            smoothing = config.smoothing.name(),
            "pipeline configured"
        );

        Ok(Self {
            config,
            filter_bank,
            thresholds,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn filter_bank(&self) -> &FilterBank {
        &self.filter_bank
    }

    /// Feature series sampling rate
    pub fn feature_rate(&self) -> f64 {
        self.config.feature_rate()
    }

    /// Filter, rectify, smooth and normalize one channel
    pub fn condition(&self, signal: &[f64]) -> EmgResult<Vec<f64>> {
        let mut output = self.filter_bank.process(signal)?;

        if self.config.rectify {
            output = rectify(&output);
        }

        output = smooth(&output, &self.config.smoothing)?;
        self.config.normalization.apply(&output)
    }

    /// Run the full analysis on one channel
    ///
    /// `control` is a `samples x columns` matrix; it is used only when a
    /// control column is configured.
    pub fn analyze_channel(
        &self,
        signal: &[f64],
        control: Option<ArrayView2<'_, f64>>,
    ) -> EmgResult<ChannelAnalysis> {
        let processed = self.condition(signal)?;

        let features = sliding_window_features_with(
            &processed,
            self.config.features.window(),
            Some(self.config.features.selected.as_slice()),
            &self.config.features.params,
        )?;

        let detection_feature = self.config.threshold.feature;
        let series = features.column_vec(detection_feature).ok_or_else(|| {
            EmgError::invalid_parameter(
                ProcessingStage::Thresholding,
                "feature",
                format!("{} is not among the selected features", detection_feature),
            )
        })?;

        let threshold = self
            .thresholds
            .threshold(detection_feature, &series, self.config.threshold.method)?;

        let fs_feature = self.feature_rate();
        let grasp = detect_grasp_from_threshold(
            &series,
            threshold,
            fs_feature,
            self.config.grasp.min_duration_sec,
        )?;
        let events = grasp.events(fs_feature);

        let control_mask = match (control, self.config.grasp.control_column) {
            (Some(matrix), Some(column)) => {
                let raw = get_myocontrol_grasp(
                    matrix,
                    ColumnIndex(column),
                    self.config.grasp.control_threshold,
                )?;
                Some(align_mask(&raw, grasp.len())?)
            }
            _ => None,
        };

        debug!(
            samples = signal.len(),
            windows = features.n_rows(),
            threshold,
            events = events.len(),
            "channel analysed"
        );

        Ok(ChannelAnalysis {
            processed,
            features,
            threshold,
            grasp,
            events,
            control_mask,
        })
    }

    /// Analyse every channel in parallel, in channel order
    pub fn process_all(
        &self,
        signal: &MultiChannelSignal,
        control: Option<ArrayView2<'_, f64>>,
    ) -> EmgResult<Vec<ChannelAnalysis>> {
        self.check_sampling_rate(signal)?;

        let span = info_span!("process_all", channels = signal.channel_count(), samples = signal.len());
        let _enter = span.enter();

        let channels: Vec<Vec<f64>> = (0..signal.channel_count())
            .map(|idx| signal.select_channel(idx))
            .collect::<EmgResult<_>>()?;

        let results = channels
            .par_iter()
            .map(|channel| self.analyze_channel(channel, control))
            .collect::<EmgResult<Vec<_>>>()?;

        info!(
            channels = results.len(),
            events = results.iter().map(|r| r.events.len()).sum::<usize>(),
            "recording analysed"
        );
        Ok(results)
    }

    /// Analyse one channel of a multi-channel recording
    pub fn analyze_recording_channel(
        &self,
        signal: &MultiChannelSignal,
        channel: usize,
        control: Option<ArrayView2<'_, f64>>,
    ) -> EmgResult<ChannelAnalysis> {
        self.check_sampling_rate(signal)?;
        let samples = signal.select_channel(channel)?;

        let span = info_span!("analyze_channel", channel, samples = samples.len());
        let _enter = span.enter();
        self.analyze_channel(&samples, control)
    }

    fn check_sampling_rate(&self, signal: &MultiChannelSignal) -> EmgResult<()> {
        if (signal.fs() - self.config.sampling_rate_hz).abs() > f64::EPSILON {
            return Err(EmgError::invalid_parameter(
                ProcessingStage::Acquisition,
                "fs",
                format!(
                    "recording sampled at {} Hz, pipeline configured for {} Hz",
                    signal.fs(),
                    self.config.sampling_rate_hz
                ),
            ));
        }
        Ok(())
    }
}
