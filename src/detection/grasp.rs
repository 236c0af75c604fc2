// src/detection/grasp.rs
//! Binary grasp masks from feature thresholds or a myocontrol channel

use crate::config::constants::grasp::RESAMPLED_MASK_CUTOFF;
use crate::error::{EmgError, EmgResult, ProcessingStage};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Per-window grasp decisions, each 0 or 1
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraspMask(Vec<u8>);

/// One contiguous grasp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraspEvent {
    /// First active index
    pub start: usize,
    /// One past the last active index
    pub end: usize,
    pub onset_sec: f64,
    pub offset_sec: f64,
}

impl GraspEvent {
    pub fn duration_sec(&self) -> f64 {
        self.offset_sec - self.onset_sec
    }
}

impl GraspMask {
    pub fn from_bools<I: IntoIterator<Item = bool>>(decisions: I) -> Self {
        Self(decisions.into_iter().map(u8::from).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Number of active entries
    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|&&v| v == 1).count()
    }

    /// Mask as 0.0 / 1.0 values
    pub fn to_f64(&self) -> Vec<f64> {
        self.0.iter().map(|&v| f64::from(v)).collect()
    }

    /// Active runs as events, timed at `fs_feature` entries per second
    pub fn events(&self, fs_feature: f64) -> Vec<GraspEvent> {
        runs(&self.0)
            .into_iter()
            .map(|(start, end)| GraspEvent {
                start,
                end,
                onset_sec: start as f64 / fs_feature,
                offset_sec: end as f64 / fs_feature,
            })
            .collect()
    }
}

/// `(start, end)` of every run of ones, `end` exclusive
fn runs(mask: &[u8]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;

    for (i, &v) in mask.iter().enumerate() {
        match (v == 1, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, mask.len()));
    }
    runs
}

/// `1` where the value is strictly above `threshold`
pub fn threshold_mask(values: &[f64], threshold: f64) -> GraspMask {
    GraspMask::from_bools(values.iter().map(|&v| v > threshold))
}

/// Convert a duration into whole feature samples, truncating
pub fn min_duration_samples(fs_feature: f64, min_duration_sec: f64) -> EmgResult<usize> {
    if !(fs_feature.is_finite() && fs_feature > 0.0) {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::GraspDetection,
            "fs_feature",
            format!("feature rate must be positive, got {}", fs_feature),
        ));
    }
    if !(min_duration_sec.is_finite() && min_duration_sec >= 0.0) {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::GraspDetection,
            "min_duration_sec",
            format!("minimum duration cannot be negative, got {}", min_duration_sec),
        ));
    }
    Ok((min_duration_sec * fs_feature) as usize)
}

/// Zero every run of ones shorter than `min_samples`
///
/// Runs are measured when they close; a run still open at the end of the
/// mask is closed there and kept if it already spans `min_samples`.
pub fn enforce_min_duration(mask: &GraspMask, min_samples: usize) -> GraspMask {
    let mut filtered = vec![0u8; mask.len()];
    for (start, end) in runs(mask.as_slice()) {
        if end - start >= min_samples {
            filtered[start..end].fill(1);
        }
    }
    GraspMask(filtered)
}

/// Threshold a feature series and drop grasps shorter than
/// `min_duration_sec`
pub fn detect_grasp_from_threshold(
    feature_values: &[f64],
    threshold: f64,
    fs_feature: f64,
    min_duration_sec: f64,
) -> EmgResult<GraspMask> {
    let min_samples = min_duration_samples(fs_feature, min_duration_sec)?;
    Ok(enforce_min_duration(&threshold_mask(feature_values, threshold), min_samples))
}

/// Column of a control matrix, parsed from loosely typed input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnIndex(pub usize);

fn not_an_index(reason: String) -> EmgError {
    EmgError::invalid_parameter(ProcessingStage::GraspDetection, "column_index", reason)
}

impl From<usize> for ColumnIndex {
    fn from(index: usize) -> Self {
        ColumnIndex(index)
    }
}

impl FromStr for ColumnIndex {
    type Err = EmgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .map(ColumnIndex)
            .map_err(|_| not_an_index(format!("'{}' is not a non-negative integer", s)))
    }
}

impl TryFrom<&serde_json::Value> for ColumnIndex {
    type Error = EmgError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(index) = n.as_u64() {
                    usize::try_from(index)
                        .map(ColumnIndex)
                        .map_err(|_| not_an_index(format!("{} is out of range", index)))
                } else {
                    Err(not_an_index(format!("{} is not a non-negative integer", n)))
                }
            }
            serde_json::Value::String(s) => s.parse(),
            other => Err(not_an_index(format!("{} is not an integer", other))),
        }
    }
}

/// Grasp where column `column` of a `samples x columns` control matrix is
/// strictly above `threshold`
pub fn get_myocontrol_grasp(
    control: ArrayView2<'_, f64>,
    column: ColumnIndex,
    threshold: f64,
) -> EmgResult<GraspMask> {
    let ColumnIndex(index) = column;
    if index >= control.ncols() {
        return Err(not_an_index(format!(
            "column {} out of range for control matrix with {} columns",
            index,
            control.ncols()
        )));
    }
    Ok(GraspMask::from_bools(control.column(index).iter().map(|&v| v > threshold)))
}

/// Evenly spaced points on [0, 1]
fn unit_grid(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = 1.0 / (n - 1) as f64;
            let mut grid: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
            grid[n - 1] = 1.0;
            grid
        }
    }
}

/// Nearest-neighbour resampling of `values` onto `target_len` points
///
/// Source and target are both placed on uniform grids over [0, 1]. A target
/// point exactly between two sources takes the lower one.
pub fn resample_nearest(values: &[f64], target_len: usize) -> EmgResult<Vec<f64>> {
    if values.is_empty() {
        if target_len == 0 {
            return Ok(Vec::new());
        }
        return Err(EmgError::insufficient_length(ProcessingStage::GraspDetection, 0, 1));
    }

    let source = unit_grid(values.len());
    let bounds: Vec<f64> = source.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();

    Ok(unit_grid(target_len)
        .into_iter()
        .map(|x| values[bounds.partition_point(|&b| b < x)])
        .collect())
}

/// Resample `mask` to `target_len` entries and re-binarize at 0.5
pub fn align_mask(mask: &GraspMask, target_len: usize) -> EmgResult<GraspMask> {
    if mask.len() == target_len {
        return Ok(mask.clone());
    }
    let resampled = resample_nearest(&mask.to_f64(), target_len)?;
    Ok(threshold_mask(&resampled, RESAMPLED_MASK_CUTOFF))
}
