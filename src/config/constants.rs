// src/config/constants.rs
//! Pipeline-wide configuration constants

/// Acquisition constants
pub mod signal {
    pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 2000.0;
    pub const MIN_SAMPLING_RATE_HZ: f64 = 100.0;
    pub const MAX_SAMPLING_RATE_HZ: f64 = 100_000.0;
}

/// Filter bank constants
pub mod filters {
    pub const DEFAULT_FILTER_ORDER: usize = 4;
    pub const MIN_FILTER_ORDER: usize = 1;
    pub const MAX_FILTER_ORDER: usize = 12;
    pub const DEFAULT_LOWPASS_CUTOFF_HZ: f64 = 450.0;
    pub const DEFAULT_NOTCH_FREQUENCY_HZ: f64 = 50.0;
    pub const DEFAULT_NOTCH_QUALITY_FACTOR: f64 = 30.0;
}

/// Smoother constants
pub mod smoothing {
    pub const DEFAULT_SG_WINDOW_LENGTH: usize = 101;
    pub const DEFAULT_SG_POLYORDER: usize = 2;
    pub const DEFAULT_ENVELOPE_WINDOW: usize = 100;
}

/// Feature extraction constants
pub mod features {
    pub const DEFAULT_FRAME: usize = 200;
    pub const DEFAULT_STEP: usize = 50;
    pub const DEFAULT_ZERO_CROSSING_THRESHOLD: f64 = 0.0;
    pub const DEFAULT_WAMP_THRESHOLD: f64 = 0.01;
    pub const DEFAULT_MYOP_THRESHOLD: f64 = 0.01;
    /// Guards `ln(0)` in the LOG feature
    pub const LOG_EPSILON: f64 = 1e-10;
}

/// Threshold engine constants
pub mod threshold {
    pub const DEFAULT_MEAN_STD_K: f64 = 0.5;
    pub const DEFAULT_PERCENTILE: f64 = 85.0;
    pub const FALLBACK_THRESHOLD: f64 = 0.1;
}

/// Grasp detector constants
pub mod grasp {
    pub const DEFAULT_MIN_DURATION_SEC: f64 = 0.3;
    pub const DEFAULT_CONTROL_THRESHOLD: f64 = 0.2;
    /// Cut-off used to re-binarize a resampled mask
    pub const RESAMPLED_MASK_CUTOFF: f64 = 0.5;
}

/// Force comparison constants
pub mod force {
    pub const DEFAULT_ZONE_THRESHOLD: f64 = 0.5;
}

/// Configuration file locations
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";
    pub const ENV_PREFIX: &str = "EMG_";
}
