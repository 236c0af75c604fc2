// src/error.rs
//! Unified error handling for the grasp analysis pipeline
//!
//! Every stage fails fast with one of three processing error kinds: an
//! out-of-range argument, a signal too short for the requested operation, or
//! a zero-energy signal that cannot be scaled. Each carries the
//! [`ProcessingStage`] it came from so callers can surface a useful message
//! without parsing strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unified error type for the EMG grasp pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmgError {
    /// Out-of-range or mismatched argument
    #[error("[{stage}] invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Stage that rejected the argument
        stage: ProcessingStage,
        /// Name of the offending parameter
        parameter: &'static str,
        /// Human readable explanation
        reason: String,
    },

    /// Signal shorter than the filter or window requirement
    #[error("[{stage}] insufficient signal length: got {got} samples, need at least {need}")]
    InsufficientLength {
        /// Stage that needed more samples
        stage: ProcessingStage,
        /// Number of samples provided
        got: usize,
        /// Minimum number of samples required
        need: usize,
    },

    /// Zero-energy (or otherwise unscalable) signal
    #[error("[{stage}] degenerate signal: {reason}")]
    DegenerateSignal {
        /// Stage that hit the degenerate input
        stage: ProcessingStage,
        /// Human readable explanation
        reason: String,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("[CONFIG] configuration error in {component}: {reason}")]
    Configuration {
        /// Configuration section or loader component
        component: String,
        /// Human readable explanation
        reason: String,
    },

    /// Recording or export I/O failure
    #[error("[IO] {operation} failed: {reason}")]
    Io {
        /// Operation being performed
        operation: String,
        /// Underlying error text
        reason: String,
    },
}

/// Pipeline stages used to tag errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStage {
    /// Channel selection and multi-channel bookkeeping
    Acquisition,
    /// Butterworth and notch filtering
    Filtering,
    /// Savitzky-Golay and moving-window envelopes
    Smoothing,
    /// Max-abs and min-max scaling
    Normalization,
    /// Sliding-window feature extraction
    FeatureExtraction,
    /// Decision boundary computation
    Thresholding,
    /// Binary grasp mask derivation
    GraspDetection,
    /// Force tracking and range-of-motion analysis
    Kinematics,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessingStage::Acquisition => "ACQUISITION",
            ProcessingStage::Filtering => "FILTERING",
            ProcessingStage::Smoothing => "SMOOTHING",
            ProcessingStage::Normalization => "NORMALIZATION",
            ProcessingStage::FeatureExtraction => "FEATURES",
            ProcessingStage::Thresholding => "THRESHOLD",
            ProcessingStage::GraspDetection => "GRASP",
            ProcessingStage::Kinematics => "KINEMATICS",
        };
        f.write_str(name)
    }
}

impl EmgError {
    /// Build an [`EmgError::InvalidParameter`]
    pub fn invalid_parameter(
        stage: ProcessingStage,
        parameter: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        EmgError::InvalidParameter {
            stage,
            parameter,
            reason: reason.into(),
        }
    }

    /// Build an [`EmgError::InsufficientLength`]
    pub fn insufficient_length(stage: ProcessingStage, got: usize, need: usize) -> Self {
        EmgError::InsufficientLength { stage, got, need }
    }

    /// Build an [`EmgError::DegenerateSignal`]
    pub fn degenerate(stage: ProcessingStage, reason: impl Into<String>) -> Self {
        EmgError::DegenerateSignal {
            stage,
            reason: reason.into(),
        }
    }

    /// Stage that produced the error, if it came from the pipeline
    pub fn stage(&self) -> Option<ProcessingStage> {
        match self {
            EmgError::InvalidParameter { stage, .. }
            | EmgError::InsufficientLength { stage, .. }
            | EmgError::DegenerateSignal { stage, .. } => Some(*stage),
            EmgError::Configuration { .. } | EmgError::Io { .. } => None,
        }
    }
}

/// Result type alias for EMG operations
pub type EmgResult<T> = Result<T, EmgError>;

/// Convenience trait for mapping foreign I/O style errors
pub trait IntoEmgError<T> {
    /// Convert the error side into [`EmgError::Io`] tagged with `operation`
    fn emg_err(self, operation: &str) -> EmgResult<T>;
}

impl<T, E> IntoEmgError<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn emg_err(self, operation: &str) -> EmgResult<T> {
        self.map_err(|err| EmgError::Io {
            operation: operation.to_string(),
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmgError::insufficient_length(ProcessingStage::FeatureExtraction, 100, 200);
        let display = format!("{}", err);
        assert!(display.contains("FEATURES"));
        assert!(display.contains("100"));
        assert!(display.contains("200"));
    }

    #[test]
    fn test_invalid_parameter_builder() {
        let err = EmgError::invalid_parameter(ProcessingStage::Filtering, "cutoff", "above Nyquist");
        match &err {
            EmgError::InvalidParameter { stage, parameter, reason } => {
                assert_eq!(*stage, ProcessingStage::Filtering);
                assert_eq!(*parameter, "cutoff");
                assert_eq!(reason, "above Nyquist");
            }
            _ => panic!("Expected invalid parameter error"),
        }
        assert_eq!(err.stage(), Some(ProcessingStage::Filtering));
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EmgError>();
    }

    #[test]
    fn test_into_emg_error_trait() {
        let result: Result<i32, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "test error",
        ));

        match result.emg_err("read recording").unwrap_err() {
            EmgError::Io { operation, reason } => {
                assert_eq!(operation, "read recording");
                assert!(reason.contains("test error"));
            }
            other => panic!("Expected io error, got {:?}", other),
        }
    }
}
