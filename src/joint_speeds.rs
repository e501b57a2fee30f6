//! Per-joint speed channels and their summaries.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::{Joint, Sequence};
use crate::math::signal::mean;

/// Exported speed of one joint over the recording.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointSpeedSummary {
    pub joint: Joint,
    /// One sample per frame, 0.0 where the joint was not captured.
    pub speeds: Vec<f64>,
    pub max_speed: f64,
    pub avg_speed: f64,
}

/// Speed summary of every joint, in skeleton order.
#[must_use]
pub fn compute_joint_speeds(sequence: &Sequence) -> Vec<JointSpeedSummary> {
    Joint::ALL
        .iter()
        .map(|&joint| {
            let speeds: Vec<f64> = sequence
                .iter()
                .map(|f| f.joint_speed(joint).unwrap_or(0.0))
                .collect();
            JointSpeedSummary {
                joint,
                max_speed: speeds.iter().copied().fold(0.0, f64::max),
                avg_speed: mean(&speeds),
                speeds,
            }
        })
        .collect()
}
