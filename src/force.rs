// src/force.rs
//! Force tracking evaluation for the orthosis controller
//!
//! A force recording pairs target and measured forces on the flexion and
//! extension sides with the controller input that selected the side.

use crate::config::constants::force::DEFAULT_ZONE_THRESHOLD;
use crate::error::{EmgError, EmgResult, IntoEmgError, ProcessingStage};
use crate::processing::smoothing::{smooth, SmoothingMethod};
use crate::rom::JointAngles;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Time-aligned force recording
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceTrace {
    pub time: Vec<f64>,
    pub target_flexion: Vec<f64>,
    pub actual_flexion: Vec<f64>,
    pub target_extension: Vec<f64>,
    pub actual_extension: Vec<f64>,
    /// Controller input, above 0.5 while flexion is commanded
    pub input_value: Vec<f64>,
    /// Joint angles in degrees, present when the export carries them
    pub mcp: Option<Vec<f64>>,
    pub pip: Option<Vec<f64>>,
    pub dip: Option<Vec<f64>>,
}

/// One CSV row of a force export
#[derive(Debug, Deserialize)]
struct ForceRow {
    #[serde(rename = "Time (s)")]
    time: f64,
    #[serde(rename = "Target Flexion(N)")]
    target_flexion: f64,
    #[serde(rename = "Actual Flexion(N)")]
    actual_flexion: f64,
    #[serde(rename = "Target Extension(N)")]
    target_extension: f64,
    #[serde(rename = "Actual Extension(N)")]
    actual_extension: f64,
    #[serde(rename = "Input Value")]
    input_value: f64,
    #[serde(rename = "MCP (α)", default)]
    mcp: Option<f64>,
    #[serde(rename = "PIP (β)", default)]
    pip: Option<f64>,
    #[serde(rename = "DIP (γ)", default)]
    dip: Option<f64>,
}

/// Angle column that is either absent or filled on every row
fn angle_column(name: &str, cells: Vec<Option<f64>>) -> EmgResult<Option<Vec<f64>>> {
    if cells.iter().all(Option::is_none) {
        return Ok(None);
    }
    let rows = cells.len();
    cells.into_iter().collect::<Option<Vec<f64>>>().map(Some).ok_or_else(|| {
        EmgError::invalid_parameter(
            ProcessingStage::Kinematics,
            "force_trace",
            format!("{} column has empty cells among {} rows", name, rows),
        )
    })
}

fn excursion(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    if values.is_empty() {
        0.0
    } else {
        max - min
    }
}

impl ForceTrace {
    /// Read a CSV export with the columns `Time (s)`, `Target Flexion(N)`,
    /// `Actual Flexion(N)`, `Target Extension(N)`, `Actual Extension(N)` and
    /// `Input Value`, plus the optional angle columns `MCP (α)`, `PIP (β)`
    /// and `DIP (γ)`; other columns are ignored
    pub fn from_csv_reader<R: Read>(reader: R) -> EmgResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut trace = ForceTrace::default();
        let (mut mcp, mut pip, mut dip) = (Vec::new(), Vec::new(), Vec::new());

        for row in csv_reader.deserialize() {
            let row: ForceRow = row.emg_err("read force row")?;
            trace.time.push(row.time);
            trace.target_flexion.push(row.target_flexion);
            trace.actual_flexion.push(row.actual_flexion);
            trace.target_extension.push(row.target_extension);
            trace.actual_extension.push(row.actual_extension);
            trace.input_value.push(row.input_value);
            mcp.push(row.mcp);
            pip.push(row.pip);
            dip.push(row.dip);
        }

        trace.mcp = angle_column("MCP", mcp)?;
        trace.pip = angle_column("PIP", pip)?;
        trace.dip = angle_column("DIP", dip)?;

        trace.validate()?;
        Ok(trace)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn has_angles(&self) -> bool {
        self.mcp.is_some() || self.pip.is_some() || self.dip.is_some()
    }

    /// Every column must match the time axis
    pub fn validate(&self) -> EmgResult<()> {
        let columns = [
            ("target_flexion", Some(self.target_flexion.len())),
            ("actual_flexion", Some(self.actual_flexion.len())),
            ("target_extension", Some(self.target_extension.len())),
            ("actual_extension", Some(self.actual_extension.len())),
            ("input_value", Some(self.input_value.len())),
            ("mcp", self.mcp.as_ref().map(Vec::len)),
            ("pip", self.pip.as_ref().map(Vec::len)),
            ("dip", self.dip.as_ref().map(Vec::len)),
        ];
        for (name, len) in columns {
            match len {
                Some(len) if len != self.time.len() => {
                    return Err(EmgError::invalid_parameter(
                        ProcessingStage::Kinematics,
                        "force_trace",
                        format!("{} has {} samples, time axis has {}", name, len, self.time.len()),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Copy with the force and angle columns smoothed by `method`
    ///
    /// Time and controller input are left untouched so zones still come
    /// from the raw input.
    pub fn smoothed(&self, method: &SmoothingMethod) -> EmgResult<Self> {
        let smooth_angles = |column: &Option<Vec<f64>>| -> EmgResult<Option<Vec<f64>>> {
            column.as_deref().map(|values| smooth(values, method)).transpose()
        };

        Ok(ForceTrace {
            time: self.time.clone(),
            target_flexion: smooth(&self.target_flexion, method)?,
            actual_flexion: smooth(&self.actual_flexion, method)?,
            target_extension: smooth(&self.target_extension, method)?,
            actual_extension: smooth(&self.actual_extension, method)?,
            input_value: self.input_value.clone(),
            mcp: smooth_angles(&self.mcp)?,
            pip: smooth_angles(&self.pip)?,
            dip: smooth_angles(&self.dip)?,
        })
    }

    /// Peak-to-peak angle per joint over the recording, when all three
    /// angle columns are present
    pub fn angle_excursion(&self) -> Option<JointAngles> {
        match (&self.mcp, &self.pip, &self.dip) {
            (Some(mcp), Some(pip), Some(dip)) => Some(JointAngles {
                mcp: excursion(mcp),
                pip: excursion(pip),
                dip: excursion(dip),
            }),
            _ => None,
        }
    }

    pub fn flexion_error(&self) -> EmgResult<TrackingError> {
        tracking_error(&self.time, &self.target_flexion, &self.actual_flexion)
    }

    pub fn extension_error(&self) -> EmgResult<TrackingError> {
        tracking_error(&self.time, &self.target_extension, &self.actual_extension)
    }

    /// Flexion/extension zones from the controller input at the default 0.5 cut
    pub fn zones(&self) -> EmgResult<Vec<Zone>> {
        flexion_extension_zones(&self.time, &self.input_value, DEFAULT_ZONE_THRESHOLD)
    }
}

/// Deviation of a measured force from its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingError {
    pub mae: f64,
    pub rmse: f64,
    pub max_abs: f64,
    /// Trapezoidal integral of `|actual - target|` over time (N·s)
    pub error_area: f64,
}

/// Compare `actual` against `target` sampled at `time`
pub fn tracking_error(time: &[f64], target: &[f64], actual: &[f64]) -> EmgResult<TrackingError> {
    if target.len() != time.len() || actual.len() != time.len() {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Kinematics,
            "force_trace",
            format!(
                "time, target and actual lengths differ ({}, {}, {})",
                time.len(),
                target.len(),
                actual.len()
            ),
        ));
    }
    if time.is_empty() {
        return Err(EmgError::insufficient_length(ProcessingStage::Kinematics, 0, 1));
    }

    let errors: Vec<f64> = actual.iter().zip(target).map(|(a, t)| (a - t).abs()).collect();
    let n = errors.len() as f64;

    let error_area = time
        .windows(2)
        .zip(errors.windows(2))
        .map(|(t, e)| (t[1] - t[0]) * (e[0] + e[1]) / 2.0)
        .sum();

    Ok(TrackingError {
        mae: errors.iter().sum::<f64>() / n,
        rmse: (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt(),
        max_abs: errors.iter().copied().fold(0.0, f64::max),
        error_area,
    })
}

/// Side of the hand the controller is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Flexion,
    Extension,
}

/// Interval during which the controller input stayed on one side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub start_sec: f64,
    pub end_sec: f64,
}

/// Split a recording into alternating zones from the binarized input
///
/// Input above `threshold` is flexion. Each zone ends at the timestamp of
/// the first sample on the other side; the last zone ends at the final
/// timestamp.
pub fn flexion_extension_zones(time: &[f64], input: &[f64], threshold: f64) -> EmgResult<Vec<Zone>> {
    if time.len() != input.len() {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Kinematics,
            "input_value",
            format!("input has {} samples, time axis has {}", input.len(), time.len()),
        ));
    }

    let kind_of = |v: f64| if v > threshold { ZoneKind::Flexion } else { ZoneKind::Extension };

    let (Some(&first_time), Some(&first_input), Some(&last_time)) = (time.first(), input.first(), time.last()) else {
        return Ok(Vec::new());
    };

    let mut zones = Vec::new();
    let mut current = kind_of(first_input);
    let mut start = first_time;

    for (&t, &v) in time.iter().zip(input).skip(1) {
        let kind = kind_of(v);
        if kind != current {
            zones.push(Zone {
                kind: current,
                start_sec: start,
                end_sec: t,
            });
            current = kind;
            start = t;
        }
    }

    zones.push(Zone {
        kind: current,
        start_sec: start,
        end_sec: last_time,
    });
    Ok(zones)
}
