// src/detection/mod.rs
//! Threshold derivation and grasp detection

pub mod grasp;
pub mod threshold;

pub use grasp::{
    align_mask, detect_grasp_from_threshold, enforce_min_duration, get_myocontrol_grasp,
    resample_nearest, threshold_mask, ColumnIndex, GraspEvent, GraspMask,
};
pub use threshold::{
    fixed_threshold, get_threshold, ThresholdEngine, ThresholdMethod, ThresholdPolicy,
};
