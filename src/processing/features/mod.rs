//! EMG feature extraction
//!
//! Eleven scalar descriptors computed over sliding windows of one channel:
//! - Amplitude: VAR, RMS, Integral EMG, MAV, LOG
//! - Waveform complexity: Wave Length, AAC, DASDV
//! - Counting: Zero Crossing, WAMP, MYOP
//!
//! Features are identified by the closed [`FeatureKind`] enum; string names
//! from callers are resolved once with [`FeatureKind::from_name`].

pub mod time_domain;

use crate::config::constants::features as defaults;
use crate::error::{EmgError, EmgResult, IntoEmgError, ProcessingStage};
use crate::processing::windowing::WindowSpec;
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Feature identifiers in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    #[serde(rename = "VAR")]
    Var,
    #[serde(rename = "RMS")]
    Rms,
    #[serde(rename = "Integral EMG")]
    IntegralEmg,
    #[serde(rename = "MAV")]
    Mav,
    #[serde(rename = "LOG")]
    Log,
    #[serde(rename = "Wave Length")]
    WaveLength,
    #[serde(rename = "AAC")]
    Aac,
    #[serde(rename = "DASDV")]
    Dasdv,
    #[serde(rename = "Zero Crossing")]
    ZeroCrossing,
    #[serde(rename = "WAMP")]
    Wamp,
    #[serde(rename = "MYOP")]
    Myop,
}

impl FeatureKind {
    /// Every feature, canonical order
    pub const ALL: [FeatureKind; 11] = [
        FeatureKind::Var,
        FeatureKind::Rms,
        FeatureKind::IntegralEmg,
        FeatureKind::Mav,
        FeatureKind::Log,
        FeatureKind::WaveLength,
        FeatureKind::Aac,
        FeatureKind::Dasdv,
        FeatureKind::ZeroCrossing,
        FeatureKind::Wamp,
        FeatureKind::Myop,
    ];

    /// Display name used in tables and by callers
    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Var => "VAR",
            FeatureKind::Rms => "RMS",
            FeatureKind::IntegralEmg => "Integral EMG",
            FeatureKind::Mav => "MAV",
            FeatureKind::Log => "LOG",
            FeatureKind::WaveLength => "Wave Length",
            FeatureKind::Aac => "AAC",
            FeatureKind::Dasdv => "DASDV",
            FeatureKind::ZeroCrossing => "Zero Crossing",
            FeatureKind::Wamp => "WAMP",
            FeatureKind::Myop => "MYOP",
        }
    }

    /// Exact-match lookup of a display name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Resolve caller-supplied names, dropping unknown ones and duplicates;
    /// the result is in canonical order
    pub fn parse_selection<S: AsRef<str>>(names: &[S]) -> Vec<FeatureKind> {
        let mut kinds: Vec<FeatureKind> = names
            .iter()
            .filter_map(|name| Self::from_name(name.as_ref()))
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Reduce one window to this feature's value
    pub fn compute(&self, window: &[f64], params: &FeatureParams) -> f64 {
        use time_domain::*;

        match self {
            FeatureKind::Var => variance(window),
            FeatureKind::Rms => rms(window),
            FeatureKind::IntegralEmg => integral_emg(window),
            FeatureKind::Mav => mean_absolute_value(window),
            FeatureKind::Log => log_energy(window),
            FeatureKind::WaveLength => waveform_length(window),
            FeatureKind::Aac => average_amplitude_change(window),
            FeatureKind::Dasdv => dasdv(window),
            FeatureKind::ZeroCrossing => zero_crossings(window, params.zero_crossing_threshold),
            FeatureKind::Wamp => willison_amplitude(window, params.wamp_threshold),
            FeatureKind::Myop => myopulse_rate(window, params.myop_threshold),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thresholds used by the counting features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureParams {
    #[serde(default = "default_zero_crossing_threshold")]
    pub zero_crossing_threshold: f64,
    #[serde(default = "default_wamp_threshold")]
    pub wamp_threshold: f64,
    #[serde(default = "default_myop_threshold")]
    pub myop_threshold: f64,
}

fn default_zero_crossing_threshold() -> f64 {
    defaults::DEFAULT_ZERO_CROSSING_THRESHOLD
}

fn default_wamp_threshold() -> f64 {
    defaults::DEFAULT_WAMP_THRESHOLD
}

fn default_myop_threshold() -> f64 {
    defaults::DEFAULT_MYOP_THRESHOLD
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            zero_crossing_threshold: default_zero_crossing_threshold(),
            wamp_threshold: default_wamp_threshold(),
            myop_threshold: default_myop_threshold(),
        }
    }
}

/// Feature values of one window, ordered by kind
pub type FeatureRecord = BTreeMap<FeatureKind, f64>;

/// Compute the requested features of one window
pub fn extract_features(window: &[f64], selected: &[FeatureKind], params: &FeatureParams) -> FeatureRecord {
    selected
        .iter()
        .map(|&kind| (kind, kind.compute(window, params)))
        .collect()
}

/// Name-keyed variant of [`extract_features`]; unknown names are omitted
///
/// Pairs come back in canonical feature order regardless of request order.
pub fn extract_features_by_name<S: AsRef<str>>(window: &[f64], names: &[S]) -> Vec<(String, f64)> {
    let kinds = FeatureKind::parse_selection(names);
    extract_features(window, &kinds, &FeatureParams::default())
        .into_iter()
        .map(|(kind, value)| (kind.name().to_string(), value))
        .collect()
}

/// Per-window feature values, one row per window in start order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<FeatureKind>,
    values: Array2<f64>,
    window_starts: Vec<usize>,
    window: WindowSpec,
}

impl FeatureTable {
    /// Selected features, in column order
    pub fn columns(&self) -> &[FeatureKind] {
        &self.columns
    }

    /// Rows x columns value matrix
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    /// First sample of every window
    pub fn window_starts(&self) -> &[usize] {
        &self.window_starts
    }

    pub fn frame(&self) -> usize {
        self.window.frame
    }

    pub fn step(&self) -> usize {
        self.window.step
    }

    /// Series of one feature, `None` if it was not selected
    pub fn column(&self, kind: FeatureKind) -> Option<ArrayView1<'_, f64>> {
        self.columns
            .iter()
            .position(|&c| c == kind)
            .map(|idx| self.values.column(idx))
    }

    /// Series of one feature as an owned vector
    pub fn column_vec(&self, kind: FeatureKind) -> Option<Vec<f64>> {
        self.column(kind).map(|col| col.to_vec())
    }

    /// All selected features of one window
    pub fn record(&self, row: usize) -> Option<FeatureRecord> {
        if row >= self.n_rows() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .enumerate()
                .map(|(idx, &kind)| (kind, self.values[[row, idx]]))
                .collect(),
        )
    }

    /// Time axis of the feature series: `row * step / fs`
    pub fn window_times(&self, fs: f64) -> Vec<f64> {
        (0..self.n_rows())
            .map(|row| (row * self.window.step) as f64 / fs)
            .collect()
    }

    /// Write the table as CSV with a `window_start` column followed by one
    /// column per feature
    pub fn write_csv<W: Write>(&self, writer: W) -> EmgResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["window_start".to_string()];
        header.extend(self.columns.iter().map(|c| c.name().to_string()));
        csv_writer.write_record(&header).emg_err("write feature header")?;

        for (row, start) in self.window_starts.iter().enumerate() {
            let mut record = vec![start.to_string()];
            record.extend(self.values.row(row).iter().map(|v| v.to_string()));
            csv_writer.write_record(&record).emg_err("write feature row")?;
        }

        csv_writer.flush().emg_err("flush feature table")
    }
}

/// Compute features over windows of `frame` samples advancing by `step`
///
/// `selected = None` computes all eleven features; an empty selection gives a
/// table with one row per window and no columns. A trailing partial window
/// is dropped.
pub fn sliding_window_features(
    signal: &[f64],
    frame: usize,
    step: usize,
    selected: Option<&[FeatureKind]>,
) -> EmgResult<FeatureTable> {
    sliding_window_features_with(signal, WindowSpec::new(frame, step), selected, &FeatureParams::default())
}

/// [`sliding_window_features`] with explicit counting thresholds
pub fn sliding_window_features_with(
    signal: &[f64],
    window: WindowSpec,
    selected: Option<&[FeatureKind]>,
    params: &FeatureParams,
) -> EmgResult<FeatureTable> {
    let columns: Vec<FeatureKind> = match selected {
        Some(kinds) => {
            let mut kinds = kinds.to_vec();
            kinds.sort();
            kinds.dedup();
            kinds
        }
        None => FeatureKind::ALL.to_vec(),
    };

    let window_starts = window.starts(signal.len())?;

    let rows: Vec<Vec<f64>> = window_starts
        .par_iter()
        .map(|&start| {
            let samples = &signal[start..start + window.frame];
            columns.iter().map(|kind| kind.compute(samples, params)).collect()
        })
        .collect();

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let values = Array2::from_shape_vec((window_starts.len(), columns.len()), flat).map_err(|e| {
        EmgError::invalid_parameter(ProcessingStage::FeatureExtraction, "selected_features", e.to_string())
    })?;

    Ok(FeatureTable {
        columns,
        values,
        window_starts,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.1).sin()).collect()
    }

    #[test]
    fn test_feature_names_round_trip() {
        for kind in FeatureKind::ALL {
            assert_eq!(FeatureKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(FeatureKind::from_name("rms"), None);
        assert_eq!(FeatureKind::Rms.to_string(), "RMS");
    }

    #[test]
    fn test_parse_selection() {
        let kinds = FeatureKind::parse_selection(&["MYOP", "bogus", "RMS", "MYOP"]);
        assert_eq!(kinds, vec![FeatureKind::Rms, FeatureKind::Myop]);
    }

    #[test]
    fn test_extract_features_by_name() {
        let record = extract_features_by_name(&[3.0, -4.0], &["MAV", "Spectral Entropy", "RMS", "AAC"]);
        let names: Vec<&str> = record.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["RMS", "MAV", "AAC"]);
        assert!((record[0].1 - 12.5f64.sqrt()).abs() < 1e-12);
        assert!((record[1].1 - 3.5).abs() < 1e-12);
        assert!((record[2].1 - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_sliding_window_row_count() {
        let table = sliding_window_features(&ramp(1000), 200, 50, None).unwrap();
        assert_eq!(table.n_rows(), 17);
        assert_eq!(table.columns().len(), 11);
        assert_eq!(table.window_starts()[16], 800);
        assert_eq!(table.frame(), 200);
        assert_eq!(table.step(), 50);
    }

    #[test]
    fn test_sliding_window_too_short() {
        let result = sliding_window_features(&ramp(100), 200, 50, None);
        assert!(matches!(result, Err(EmgError::InsufficientLength { .. })));
    }

    #[test]
    fn test_columns_match_direct_computation() {
        let signal = ramp(300);
        let table = sliding_window_features(&signal, 100, 40, Some(&[FeatureKind::Mav, FeatureKind::Var])).unwrap();

        assert_eq!(table.columns(), &[FeatureKind::Var, FeatureKind::Mav]);
        let mav = table.column_vec(FeatureKind::Mav).unwrap();
        for (row, value) in mav.iter().enumerate() {
            let start = row * 40;
            let expected = time_domain::mean_absolute_value(&signal[start..start + 100]);
            assert!((value - expected).abs() < 1e-12);
        }
        assert!(table.column(FeatureKind::Rms).is_none());

        let record = table.record(2).unwrap();
        assert_eq!(record.keys().copied().collect::<Vec<_>>(), vec![FeatureKind::Var, FeatureKind::Mav]);
        assert!(table.record(table.n_rows()).is_none());
    }

    #[test]
    fn test_window_times() {
        let table = sliding_window_features(&ramp(400), 200, 50, Some(&[FeatureKind::Rms])).unwrap();
        assert_eq!(table.window_times(2000.0), vec![0.0, 0.025, 0.05, 0.075, 0.1]);
    }

    #[test]
    fn test_empty_selection_gives_empty_columns() {
        let table = sliding_window_features(&ramp(400), 200, 50, Some(&[][..])).unwrap();
        assert_eq!(table.n_rows(), 5);
        assert!(table.columns().is_empty());
        assert_eq!(table.values().dim(), (5, 0));
        assert!(table.record(0).unwrap().is_empty());

        let kinds = FeatureKind::parse_selection(&["Kurtosis", "Skewness"]);
        let unknown_only = sliding_window_features(&ramp(400), 200, 50, Some(kinds.as_slice())).unwrap();
        assert_eq!(unknown_only.values().dim(), (5, 0));
    }

    #[test]
    fn test_write_csv() {
        let table = sliding_window_features(&[1.0, -1.0, 1.0, -1.0], 2, 2, Some(&[FeatureKind::Mav, FeatureKind::WaveLength])).unwrap();
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "window_start,MAV,Wave Length\n0,1,2\n2,1,2\n");
    }
}
