//! Signal containers shared by every pipeline stage

use crate::error::{EmgError, EmgResult, ProcessingStage};
use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;

/// Sample type used throughout the pipeline
pub type Sample = f64;

/// A bundle of equally long channels sharing one sampling rate
///
/// Stored as a `channels x samples` matrix, so the equal-length invariant
/// holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiChannelSignal {
    data: Array2<Sample>,
    fs: f64,
}

impl MultiChannelSignal {
    /// Wrap a `channels x samples` matrix
    pub fn new(data: Array2<Sample>, fs: f64) -> EmgResult<Self> {
        validate_sampling_rate(fs)?;
        Ok(Self { data, fs })
    }

    /// Build from per-channel vectors, rejecting ragged input
    pub fn from_channels(channels: Vec<Vec<Sample>>, fs: f64) -> EmgResult<Self> {
        validate_sampling_rate(fs)?;
        let n_channels = channels.len();
        let n_samples = channels.first().map_or(0, Vec::len);

        if let Some((idx, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != n_samples)
        {
            return Err(EmgError::invalid_parameter(
                ProcessingStage::Acquisition,
                "channels",
                format!(
                    "channel {} has {} samples, expected {}",
                    idx,
                    ch.len(),
                    n_samples
                ),
            ));
        }

        let flat: Vec<Sample> = channels.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((n_channels, n_samples), flat).map_err(|e| {
            EmgError::invalid_parameter(ProcessingStage::Acquisition, "channels", e.to_string())
        })?;
        Ok(Self { data, fs })
    }

    /// Sampling rate in Hz
    pub fn fs(&self) -> f64 {
        self.fs
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples per channel
    pub fn len(&self) -> usize {
        self.data.ncols()
    }

    /// True when no samples are present
    pub fn is_empty(&self) -> bool {
        self.data.ncols() == 0
    }

    /// Underlying matrix
    pub fn data(&self) -> &Array2<Sample> {
        &self.data
    }

    /// Borrow one channel
    pub fn channel(&self, index: usize) -> EmgResult<ArrayView1<'_, Sample>> {
        if index >= self.channel_count() {
            return Err(EmgError::invalid_parameter(
                ProcessingStage::Acquisition,
                "channel_index",
                format!(
                    "channel {} out of range for {} channels",
                    index,
                    self.channel_count()
                ),
            ));
        }
        Ok(self.data.row(index))
    }

    /// Copy one channel out as a plain signal
    pub fn select_channel(&self, index: usize) -> EmgResult<Vec<Sample>> {
        Ok(self.channel(index)?.to_vec())
    }

    /// Apply a per-channel stage to every channel
    ///
    /// Channels are processed in parallel; output channel order matches the
    /// input and the first failing channel's error is returned.
    pub fn map_channels<F>(&self, stage: F) -> EmgResult<Self>
    where
        F: Fn(&[Sample]) -> EmgResult<Vec<Sample>> + Sync,
    {
        let processed: Vec<Vec<Sample>> = self
            .data
            .axis_iter(Axis(0))
            .map(|row| row.to_vec())
            .collect::<Vec<_>>()
            .par_iter()
            .map(|channel| stage(channel.as_slice()))
            .collect::<EmgResult<Vec<_>>>()?;

        Self::from_channels(processed, self.fs)
    }
}

fn validate_sampling_rate(fs: f64) -> EmgResult<()> {
    if !(fs.is_finite() && fs > 0.0) {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Acquisition,
            "fs",
            format!("sampling rate must be positive, got {}", fs),
        ));
    }
    Ok(())
}
