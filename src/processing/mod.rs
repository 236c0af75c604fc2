// src/processing/mod.rs
//! Signal conditioning and feature extraction stages
//!
//! Every stage is a pure function from a borrowed signal to a new one.

pub mod features;
pub mod filter_bank;
pub mod filters;
pub mod normalize;
pub mod rectify;
pub mod smoothing;
pub mod spectrum;
pub mod windowing;

pub use features::{
    extract_features, extract_features_by_name, sliding_window_features, FeatureKind,
    FeatureParams, FeatureRecord, FeatureTable,
};
pub use filter_bank::{apply_filter, apply_notch, FilterBank};
pub use filters::{BandType, Cutoff, SosFilter};
pub use normalize::{normalize, normalize_min_max, NormalizationMethod};
pub use rectify::rectify;
pub use smoothing::{smooth, SmoothingMethod};
pub use spectrum::{band_power, power_spectrum, PowerSpectrum};
pub use windowing::WindowSpec;
