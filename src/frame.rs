//! Motion-capture frames and the validated [`Sequence`] they form.
//!
//! A [`Sequence`] is the unit of analysis: a finite, non-empty list of
//! frames with strictly increasing positive timestamps. It is immutable
//! once built.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Tracked skeleton marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Joint {
    Root,
    Pelvis,
    SpineLow,
    SpineHigh,
    Torso,
    Neck,
    Head,
    ClavicleRight,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandIndexRight,
    HandLittleRight,
    ClavicleLeft,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandIndexLeft,
    HandLittleLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
}

impl Joint {
    /// Every joint, in skeleton order.
    pub const ALL: [Self; 27] = [
        Self::Root,
        Self::Pelvis,
        Self::SpineLow,
        Self::SpineHigh,
        Self::Torso,
        Self::Neck,
        Self::Head,
        Self::ClavicleRight,
        Self::ShoulderRight,
        Self::ElbowRight,
        Self::WristRight,
        Self::HandIndexRight,
        Self::HandLittleRight,
        Self::ClavicleLeft,
        Self::ShoulderLeft,
        Self::ElbowLeft,
        Self::WristLeft,
        Self::HandIndexLeft,
        Self::HandLittleLeft,
        Self::HipRight,
        Self::KneeRight,
        Self::AnkleRight,
        Self::FootRight,
        Self::HipLeft,
        Self::KneeLeft,
        Self::AnkleLeft,
        Self::FootLeft,
    ];

    /// Short stable name of the marker.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Pelvis => "pelvis",
            Self::SpineLow => "spine_low",
            Self::SpineHigh => "spine_high",
            Self::Torso => "torso",
            Self::Neck => "neck",
            Self::Head => "head",
            Self::ClavicleRight => "clavicle_r",
            Self::ShoulderRight => "shoulder_r",
            Self::ElbowRight => "elbow_r",
            Self::WristRight => "wrist_r",
            Self::HandIndexRight => "hand_index_r",
            Self::HandLittleRight => "hand_little_r",
            Self::ClavicleLeft => "clavicle_l",
            Self::ShoulderLeft => "shoulder_l",
            Self::ElbowLeft => "elbow_l",
            Self::WristLeft => "wrist_l",
            Self::HandIndexLeft => "hand_index_l",
            Self::HandLittleLeft => "hand_little_l",
            Self::HipRight => "hip_r",
            Self::KneeRight => "knee_r",
            Self::AnkleRight => "ankle_r",
            Self::FootRight => "foot_r",
            Self::HipLeft => "hip_l",
            Self::KneeLeft => "knee_l",
            Self::AnkleLeft => "ankle_l",
            Self::FootLeft => "foot_l",
        }
    }
}

/// Whole-body centre of mass as exported by the capture system.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CenterOfMass {
    pub position: [f64; 3],
    pub speed: f64,
}

/// One time-stamped motion-capture sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    /// Capture time (seconds).
    pub time: f64,

    /// Effector (implement proxy) position [x, y, z], z up.
    pub effector_pos: [f64; 3],

    /// Effector velocity [vx, vy, vz].
    pub effector_vel: [f64; 3],

    /// Effector speed as exported by the capture system.
    pub effector_speed: f64,

    /// Joint positions present in this sample.
    pub joints: BTreeMap<Joint, [f64; 3]>,

    /// Exported joint speeds present in this sample.
    pub joint_speeds: BTreeMap<Joint, f64>,

    pub center_of_mass: Option<CenterOfMass>,
}

impl Frame {
    /// Create a frame without joint data.
    #[must_use]
    pub fn new(time: f64, effector_pos: [f64; 3], effector_vel: [f64; 3]) -> Self {
        let effector_speed = crate::math::geometry::norm3(&effector_vel);
        Self {
            time,
            effector_pos,
            effector_vel,
            effector_speed,
            joints: BTreeMap::new(),
            joint_speeds: BTreeMap::new(),
            center_of_mass: None,
        }
    }

    /// Attach a joint position.
    #[must_use]
    pub fn with_joint(mut self, joint: Joint, position: [f64; 3]) -> Self {
        self.joints.insert(joint, position);
        self
    }

    /// Attach an exported joint speed.
    #[must_use]
    pub fn with_joint_speed(mut self, joint: Joint, speed: f64) -> Self {
        self.joint_speeds.insert(joint, speed);
        self
    }

    /// Attach the centre-of-mass sample.
    #[must_use]
    pub fn with_center_of_mass(mut self, position: [f64; 3], speed: f64) -> Self {
        self.center_of_mass = Some(CenterOfMass { position, speed });
        self
    }

    /// Position of a joint, if it was captured.
    #[must_use]
    pub fn joint(&self, joint: Joint) -> Option<[f64; 3]> {
        self.joints.get(&joint).copied()
    }

    /// Exported speed of a joint, if it was captured.
    #[must_use]
    pub fn joint_speed(&self, joint: Joint) -> Option<f64> {
        self.joint_speeds.get(&joint).copied()
    }
}

/// Validated, ordered list of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    frames: Vec<Frame>,
}

impl Sequence {
    /// Build a sequence, checking the timestamp invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `frames` is empty
    /// - any timestamp is not positive
    /// - timestamps are not strictly increasing
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(AnalysisError::EmptySequence);
        }

        for (i, frame) in frames.iter().enumerate() {
            if frame.time.is_nan() || frame.time <= 0.0 {
                return Err(AnalysisError::NonPositiveTimestamp { index: i });
            }
        }

        if let Some(i) = frames.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(AnalysisError::NonMonotonicTimestamps { index: i + 1 });
        }

        Ok(Self { frames })
    }

    /// Number of frames (always at least 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Borrow the frames.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Timestamp of the frame at `index`, clamped into range.
    #[must_use]
    pub fn time_at(&self, index: usize) -> f64 {
        self.frames[index.min(self.frames.len() - 1)].time
    }

    /// Iterate over frames.
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
