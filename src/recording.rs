// src/recording.rs
//! JSON recording bundles
//!
//! ```json
//! {
//!   "sampling_rate_hz": 2000.0,
//!   "emg": [[0.01, -0.02, ...], [...]],
//!   "myocontrol": [[0.0, 0.1], [0.0, 0.4], ...]
//! }
//! ```
//!
//! `emg` holds one array per channel. `myocontrol`, when present, holds one
//! row per control sample with one value per control column.

use crate::config::constants::signal::DEFAULT_SAMPLING_RATE_HZ;
use crate::error::{EmgError, EmgResult, IntoEmgError, ProcessingStage};
use crate::signal::MultiChannelSignal;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct RecordingFile {
    #[serde(default = "default_sampling_rate")]
    sampling_rate_hz: f64,
    emg: Vec<Vec<f64>>,
    #[serde(default)]
    myocontrol: Option<Vec<Vec<f64>>>,
}

fn default_sampling_rate() -> f64 {
    DEFAULT_SAMPLING_RATE_HZ
}

/// EMG channels with the optional control matrix recorded alongside
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub signal: MultiChannelSignal,
    /// `samples x columns` control matrix
    pub control: Option<Array2<f64>>,
}

impl Recording {
    pub fn from_path<P: AsRef<Path>>(path: P) -> EmgResult<Self> {
        let file = File::open(path.as_ref()).emg_err("open recording")?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> EmgResult<Self> {
        let raw: RecordingFile = serde_json::from_reader(reader).emg_err("parse recording")?;

        let signal = MultiChannelSignal::from_channels(raw.emg, raw.sampling_rate_hz)?;
        let control = raw.myocontrol.map(control_matrix).transpose()?;

        Ok(Self { signal, control })
    }

    pub fn from_json_str(json: &str) -> EmgResult<Self> {
        Self::from_reader(json.as_bytes())
    }
}

fn control_matrix(rows: Vec<Vec<f64>>) -> EmgResult<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);

    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n_cols) {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Acquisition,
            "myocontrol",
            format!("row {} has {} columns, expected {}", idx, row.len(), n_cols),
        ));
    }

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| EmgError::invalid_parameter(ProcessingStage::Acquisition, "myocontrol", e.to_string()))
}
