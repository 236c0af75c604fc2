// src/processing/windowing.rs
//! Sliding-window geometry for feature extraction

use crate::error::{EmgError, EmgResult, ProcessingStage};
use serde::{Deserialize, Serialize};

/// Fixed-length windows of `frame` samples advancing by `step`
///
/// Trailing samples that do not fill a whole window are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub frame: usize,
    pub step: usize,
}

impl WindowSpec {
    pub fn new(frame: usize, step: usize) -> Self {
        Self { frame, step }
    }

    /// Reject zero-sized frames and strides
    pub fn validate(&self) -> EmgResult<()> {
        if self.frame == 0 {
            return Err(EmgError::invalid_parameter(
                ProcessingStage::FeatureExtraction,
                "frame",
                "window frame must be at least one sample",
            ));
        }
        if self.step == 0 {
            return Err(EmgError::invalid_parameter(
                ProcessingStage::FeatureExtraction,
                "step",
                "window step must be at least one sample",
            ));
        }
        Ok(())
    }

    /// Number of complete windows in `len` samples, failing when `len < frame`
    pub fn row_count(&self, len: usize) -> EmgResult<usize> {
        self.validate()?;
        if len < self.frame {
            return Err(EmgError::insufficient_length(
                ProcessingStage::FeatureExtraction,
                len,
                self.frame,
            ));
        }
        Ok((len - self.frame) / self.step + 1)
    }

    /// Start index of every complete window
    pub fn starts(&self, len: usize) -> EmgResult<Vec<usize>> {
        let rows = self.row_count(len)?;
        Ok((0..rows).map(|i| i * self.step).collect())
    }

    /// Sampling rate of a per-window series
    pub fn feature_rate(&self, fs: f64) -> f64 {
        fs / self.step as f64
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            frame: crate::config::constants::features::DEFAULT_FRAME,
            step: crate::config::constants::features::DEFAULT_STEP,
        }
    }
}
