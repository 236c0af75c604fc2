//! EMG-Grasp: offline EMG processing and grasp detection
//!
//! This library turns raw surface EMG recordings from a hand neuro-orthosis
//! into grasp decisions. It features:
//!
//! - Zero-phase Butterworth and mains-notch filter bank
//! - Rectification, Savitzky-Golay / moving-window smoothing and normalization
//! - Eleven time-domain features over sliding windows
//! - Fixed, mean/std and percentile thresholds
//! - Grasp masks with minimum-duration hysteresis and control-signal alignment
//! - Force tracking and finger range-of-motion analysis
//! - TOML configuration with layered overrides
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use emg_grasp::{EmgPipeline, PipelineConfig, Recording};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let recording = Recording::from_path("session.json")?;
//!     let pipeline = EmgPipeline::new(PipelineConfig::default())?;
//!
//!     for (channel, analysis) in pipeline.process_all(&recording.signal, None)?.iter().enumerate() {
//!         println!("channel {}: {} grasps", channel, analysis.events.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod detection;
pub mod error;
pub mod force;
pub mod pipeline;
pub mod processing;
pub mod recording;
pub mod rom;
pub mod signal;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConfigLoader, PipelineConfig};
pub use detection::{ColumnIndex, GraspEvent, GraspMask, ThresholdEngine, ThresholdMethod};
pub use error::{EmgError, EmgResult, ProcessingStage};
pub use pipeline::{AnalysisSummary, ChannelAnalysis, EmgPipeline};
pub use processing::{FeatureKind, FeatureTable, NormalizationMethod, SmoothingMethod};
pub use recording::Recording;
pub use signal::MultiChannelSignal;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
