// src/rom.rs
//! Finger range of motion from annotated joint landmarks
//!
//! Landmarks are five image points along one finger, from the metacarpal
//! base to the fingertip. Collecting them is left to the caller.

use crate::error::{EmgError, EmgResult, ProcessingStage};
use serde::{Deserialize, Serialize};

/// 2-D landmark in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Angles at the three finger joints, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub mcp: f64,
    pub pip: f64,
    pub dip: f64,
}

/// Angle ABC at vertex `b`, in degrees within [0, 180]
pub fn joint_angle(a: Point, b: Point, c: Point) -> EmgResult<f64> {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);
    let norms = bax.hypot(bay) * bcx.hypot(bcy);

    if norms == 0.0 || !norms.is_finite() {
        return Err(EmgError::degenerate(
            ProcessingStage::Kinematics,
            "joint landmarks coincide",
        ));
    }

    let cos_angle = ((bax * bcx + bay * bcy) / norms).clamp(-1.0, 1.0);
    Ok(cos_angle.acos().to_degrees())
}

/// MCP, PIP and DIP angles from five landmarks
pub fn finger_joint_angles(points: &[Point]) -> EmgResult<JointAngles> {
    let [p0, p1, p2, p3, p4] = points else {
        return Err(EmgError::invalid_parameter(
            ProcessingStage::Kinematics,
            "points",
            format!("expected 5 landmarks, got {}", points.len()),
        ));
    };

    Ok(JointAngles {
        mcp: joint_angle(*p0, *p1, *p2)?,
        pip: joint_angle(*p1, *p2, *p3)?,
        dip: joint_angle(*p2, *p3, *p4)?,
    })
}

/// Per-joint range of motion, `extension - flexion`
pub fn range_of_motion(flexion: &JointAngles, extension: &JointAngles) -> JointAngles {
    JointAngles {
        mcp: extension.mcp - flexion.mcp,
        pip: extension.pip - flexion.pip,
        dip: extension.dip - flexion.dip,
    }
}
