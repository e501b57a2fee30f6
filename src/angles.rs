//! Per-frame joint angle series for plotting.
//!
//! A missing marker or a degenerate vector yields 0.0 for that frame rather
//! than an error, so every series has exactly one sample per frame.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::{Frame, Joint, Sequence};
use crate::math::geometry::{
    inclination_from_vertical, midpoint3, planar_angle_between, vertex_angle,
};

/// Joint angle time series, all in degrees except `effector_speed`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointAngleSeries {
    pub times: Vec<f64>,
    /// Shoulder-elbow-wrist, right side.
    pub elbow_r: Vec<f64>,
    /// Hip-knee-ankle, right side.
    pub knee_r: Vec<f64>,
    /// Hip-knee-ankle, left side.
    pub knee_l: Vec<f64>,
    /// Torso-shoulder-elbow, right side.
    pub shoulder_r: Vec<f64>,
    /// Mid-hip to neck line against the vertical.
    pub trunk_inclination: Vec<f64>,
    /// Planar angle between the hip line and the shoulder line.
    pub hip_shoulder_separation: Vec<f64>,
    /// Effector speed as exported by the capture system.
    pub effector_speed: Vec<f64>,
}

impl JointAngleSeries {
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
}

/// Compute every joint angle series of a sequence.
#[must_use]
pub fn compute_joint_angles(sequence: &Sequence) -> JointAngleSeries {
    let mut series = JointAngleSeries::default();

    for frame in sequence {
        series.times.push(frame.time);
        series
            .elbow_r
            .push(chain_angle(frame, Joint::ShoulderRight, Joint::ElbowRight, Joint::WristRight));
        series
            .knee_r
            .push(chain_angle(frame, Joint::HipRight, Joint::KneeRight, Joint::AnkleRight));
        series
            .knee_l
            .push(chain_angle(frame, Joint::HipLeft, Joint::KneeLeft, Joint::AnkleLeft));
        series
            .shoulder_r
            .push(chain_angle(frame, Joint::Torso, Joint::ShoulderRight, Joint::ElbowRight));
        series
            .trunk_inclination
            .push(trunk_inclination(frame).unwrap_or(0.0));
        series
            .hip_shoulder_separation
            .push(hip_shoulder_separation(frame).unwrap_or(0.0));
        series.effector_speed.push(frame.effector_speed);
    }

    series
}

fn chain_angle(frame: &Frame, a: Joint, vertex: Joint, b: Joint) -> f64 {
    match (frame.joint(a), frame.joint(vertex), frame.joint(b)) {
        (Some(p1), Some(p2), Some(p3)) => vertex_angle(&p1, &p2, &p3),
        _ => 0.0,
    }
}

fn trunk_inclination(frame: &Frame) -> Option<f64> {
    let mid_hip = midpoint3(&frame.joint(Joint::HipRight)?, &frame.joint(Joint::HipLeft)?);
    let neck = frame.joint(Joint::Neck)?;
    let trunk = [neck[0] - mid_hip[0], neck[1] - mid_hip[1], neck[2] - mid_hip[2]];
    Some(inclination_from_vertical(&trunk))
}

fn hip_shoulder_separation(frame: &Frame) -> Option<f64> {
    let line = |left: Joint, right: Joint| -> Option<[f64; 2]> {
        let l = frame.joint(left)?;
        let r = frame.joint(right)?;
        Some([r[0] - l[0], r[1] - l[1]])
    };
    let hips = line(Joint::HipLeft, Joint::HipRight)?;
    let shoulders = line(Joint::ShoulderLeft, Joint::ShoulderRight)?;
    Some(planar_angle_between(&hips, &shoulders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn posed_frame(t: f64) -> Frame {
        Frame::new(t, [0.5, 0.0, 1.8], [3.0, 0.0, 4.0])
            .with_joint(Joint::ShoulderRight, [0.0, -0.2, 1.5])
            .with_joint(Joint::ElbowRight, [0.3, -0.2, 1.5])
            .with_joint(Joint::WristRight, [0.3, -0.2, 1.8])
            .with_joint(Joint::ShoulderLeft, [0.0, 0.2, 1.5])
            .with_joint(Joint::Torso, [0.0, 0.0, 1.3])
            .with_joint(Joint::Neck, [0.0, 0.0, 1.6])
            .with_joint(Joint::HipRight, [0.0, -0.15, 1.0])
            .with_joint(Joint::HipLeft, [0.15, 0.0, 1.0])
            .with_joint(Joint::KneeRight, [0.0, -0.15, 0.5])
            .with_joint(Joint::AnkleRight, [0.0, -0.15, 0.1])
    }

    #[test]
    fn test_angles_from_markers() {
        let seq = Sequence::new(vec![posed_frame(0.01), posed_frame(0.02)]).unwrap();
        let angles = compute_joint_angles(&seq);

        assert_eq!(angles.len(), 2);
        assert_relative_eq!(angles.elbow_r[0], 90.0, epsilon = 1e-9);
        assert_eq!(angles.knee_r[0], 180.0);
        assert_relative_eq!(angles.effector_speed[1], 5.0);

        // Hip line rotated 45° away from the shoulder line.
        assert_relative_eq!(angles.hip_shoulder_separation[0], 45.0, epsilon = 1e-9);
        assert!(angles.trunk_inclination[0] > 0.0 && angles.trunk_inclination[0] < 30.0);
    }

    #[test]
    fn test_missing_markers_yield_zero() {
        let seq = Sequence::new(vec![posed_frame(0.01)]).unwrap();
        let angles = compute_joint_angles(&seq);
        assert_eq!(angles.knee_l[0], 0.0);

        let bare = Sequence::new(vec![Frame::new(0.01, [1.0, 0.0, 1.0], [0.0; 3])]).unwrap();
        let angles = compute_joint_angles(&bare);
        assert_eq!(angles.elbow_r, vec![0.0]);
        assert_eq!(angles.trunk_inclination, vec![0.0]);
        assert_eq!(angles.hip_shoulder_separation, vec![0.0]);
    }
}
