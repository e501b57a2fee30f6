//! Named time series extracted from a [`Sequence`].
//!
//! The detectors work on flat per-frame arrays rather than on frames, so this
//! module is the single place that knows which markers feed which channel.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::frame::{Joint, Sequence};
use crate::math::geometry::norm3;

/// Effector channels, one sample per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectorChannels {
    /// Frame timestamps.
    pub times: Vec<f64>,
    /// Effector positions.
    pub positions: Vec<[f64; 3]>,
    /// Effector velocities.
    pub velocities: Vec<[f64; 3]>,
    /// `|velocity|` per frame.
    pub speeds: Vec<f64>,
}

impl EffectorChannels {
    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Effector height (z) at `index`.
    #[must_use]
    pub fn height(&self, index: usize) -> f64 {
        self.positions[index][2]
    }
}

/// Centre-of-mass trajectory, one sample per frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CenterOfMassChannels {
    pub times: Vec<f64>,
    pub positions: Vec<[f64; 3]>,
    /// Speed as exported by the capture system.
    pub speeds: Vec<f64>,
}

/// Shoulder, elbow and wrist of the throwing arm in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmPose {
    pub shoulder: [f64; 3],
    pub elbow: [f64; 3],
    pub wrist: [f64; 3],
}

impl ArmPose {
    /// Elbow angle in degrees (180 = straight arm).
    #[must_use]
    pub fn elbow_angle(&self) -> f64 {
        crate::math::geometry::vertex_angle(&self.shoulder, &self.elbow, &self.wrist)
    }
}

/// Throwing side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Right,
    Left,
}

impl Side {
    const fn arm_joints(self) -> (Joint, Joint, Joint) {
        match self {
            Self::Right => (Joint::ShoulderRight, Joint::ElbowRight, Joint::WristRight),
            Self::Left => (Joint::ShoulderLeft, Joint::ElbowLeft, Joint::WristLeft),
        }
    }
}

/// Per-frame arm poses; `None` where a marker was not captured.
pub type ArmChain = Vec<Option<ArmPose>>;

/// Right and left ankle heights, one sample per frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FootHeights {
    pub right: Vec<f64>,
    pub left: Vec<f64>,
}

impl FootHeights {
    /// Pair externally supplied ankle-height channels.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::LengthMismatch`] if the channels differ in
    /// length.
    pub fn new(right: Vec<f64>, left: Vec<f64>) -> Result<Self> {
        if right.len() != left.len() {
            return Err(AnalysisError::length_mismatch(right.len(), left.len()));
        }
        Ok(Self { right, left })
    }
}

/// Extract effector time, position, velocity and speed channels.
#[must_use]
pub fn extract_effector(sequence: &Sequence) -> EffectorChannels {
    let n = sequence.len();
    let mut channels = EffectorChannels {
        times: Vec::with_capacity(n),
        positions: Vec::with_capacity(n),
        velocities: Vec::with_capacity(n),
        speeds: Vec::with_capacity(n),
    };

    for frame in sequence {
        channels.times.push(frame.time);
        channels.positions.push(frame.effector_pos);
        channels.velocities.push(frame.effector_vel);
        channels.speeds.push(norm3(&frame.effector_vel));
    }

    channels
}

/// Extract the throwing-arm chain.
///
/// Returns `None` when no frame carries all three arm markers, so callers
/// can skip arm-based logic entirely.
#[must_use]
pub fn extract_arm_chain(sequence: &Sequence, side: Side) -> Option<ArmChain> {
    let (shoulder, elbow, wrist) = side.arm_joints();

    let chain: ArmChain = sequence
        .iter()
        .map(|frame| {
            Some(ArmPose {
                shoulder: frame.joint(shoulder)?,
                elbow: frame.joint(elbow)?,
                wrist: frame.joint(wrist)?,
            })
        })
        .collect();

    if chain.iter().all(Option::is_none) {
        None
    } else {
        Some(chain)
    }
}

/// Extract the centre-of-mass trajectory.
///
/// Frames without a sample read as the origin with speed 0. Returns `None`
/// when no frame carries one.
#[must_use]
pub fn extract_center_of_mass(sequence: &Sequence) -> Option<CenterOfMassChannels> {
    if sequence.iter().all(|f| f.center_of_mass.is_none()) {
        return None;
    }

    let samples = sequence
        .iter()
        .map(|f| f.center_of_mass.map_or(([0.0; 3], 0.0), |c| (c.position, c.speed)));
    let (positions, speeds): (Vec<_>, Vec<_>) = samples.unzip();

    Some(CenterOfMassChannels {
        times: sequence.iter().map(|f| f.time).collect(),
        positions,
        speeds,
    })
}

/// Extract ankle heights. Missing ankle markers read as height 0.
#[must_use]
pub fn extract_foot_heights(sequence: &Sequence) -> FootHeights {
    let height = |frame: &crate::frame::Frame, joint| frame.joint(joint).map_or(0.0, |p| p[2]);

    FootHeights {
        right: sequence.iter().map(|f| height(f, Joint::AnkleRight)).collect(),
        left: sequence.iter().map(|f| height(f, Joint::AnkleLeft)).collect(),
    }
}
