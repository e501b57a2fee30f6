//! Release-instant kinematics and derived performance metrics.
//!
//! Everything here is a pure function of the effector channels and the
//! [`ReleaseEvent`]. Degenerate inputs resolve to documented sentinels
//! from [`BiomechanicsConfig`] instead of errors.

use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::channels::{extract_effector, EffectorChannels};
use crate::config::{BiomechanicsConfig, STANDARD_GRAVITY};
use crate::frame::Sequence;
use crate::math::geometry::{distance3, norm3, wrap_delta};
use crate::release::ReleaseEvent;

/// Scalar performance metrics of one throw.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BiomechanicsReport {
    /// Speed at release.
    pub release_speed: f64,
    /// Effector height at release.
    pub release_height: f64,
    /// Launch angle above the horizontal (degrees).
    pub release_angle: f64,
    /// Planar speed at release.
    pub horizontal_speed: f64,
    /// Planar heading of the release velocity (degrees, from +x towards +y).
    pub horizontal_direction: f64,
    /// Effector position at release.
    pub release_position: [f64; 3],
    /// Turns of the effector about its pre-release centroid.
    pub rotation_count: f64,
    /// Effector path length before release.
    pub trajectory_length: f64,
    /// Fastest effector speed over the whole sequence.
    pub max_speed: f64,
    /// Time from the first frame to release.
    pub total_time: f64,
    /// Flat-ground projectile range, `None` when undefined.
    pub projectile_range: Option<f64>,
}

/// Effector kinematics at the frame nearest a chosen time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstantKinematics {
    pub target_time: f64,
    pub actual_time: f64,
    /// `|actual_time - target_time|`.
    pub time_offset: f64,
    pub frame_index: usize,
    pub height: f64,
    pub speed: f64,
    pub angle: f64,
    pub projectile_range: Option<f64>,
}

/// Projected range for one launch angle of a what-if sweep.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AngleWhatIf {
    pub angle: f64,
    pub range: Option<f64>,
    /// Range minus the base-angle range; `None` if either is undefined.
    pub delta_from_base: Option<f64>,
}

/// A frame near a chosen time considered as an alternative release.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReleaseCandidate {
    pub index: usize,
    pub time: f64,
    pub height: f64,
    pub speed: f64,
    pub vertical_velocity: f64,
    /// Launch angle in degrees, 0 for a purely vertical velocity.
    pub angle: f64,
    /// Projectile range, 0 when undefined.
    pub estimated_range: f64,
}

/// Number of candidates kept by default when ranking.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 5;

/// Compute the biomechanics report for a sequence.
#[must_use]
pub fn compute_biomechanics(
    sequence: &Sequence,
    release: &ReleaseEvent,
    config: &BiomechanicsConfig,
) -> BiomechanicsReport {
    compute_biomechanics_from_channels(&extract_effector(sequence), release, config)
}

/// Compute the biomechanics report from pre-extracted effector channels.
#[must_use]
pub fn compute_biomechanics_from_channels(
    channels: &EffectorChannels,
    release: &ReleaseEvent,
    config: &BiomechanicsConfig,
) -> BiomechanicsReport {
    let [vx, vy, _] = release.velocity;
    let release_height = release.position[2];
    let release_angle = launch_angle(&release.velocity, config.vertical_release_angle);

    let pre_release = &channels.positions[..release.index.min(channels.len())];

    let max_speed = channels.speeds.iter().copied().fold(0.0, f64::max);
    let total_time = release.time - channels.times.first().copied().unwrap_or(release.time);

    BiomechanicsReport {
        release_speed: release.speed,
        release_height,
        release_angle,
        horizontal_speed: vx.hypot(vy),
        horizontal_direction: vy.atan2(vx).to_degrees(),
        release_position: release.position,
        rotation_count: rotation_count(
            pre_release,
            config.min_rotation_points,
            config.default_rotation_count,
        ),
        trajectory_length: trajectory_length(pre_release),
        max_speed,
        total_time,
        projectile_range: projectile_range_with_gravity(
            release_height,
            release.speed,
            release_angle,
            config.gravity,
        ),
    }
}

/// Launch angle of a velocity above the horizontal plane, in degrees.
///
/// Returns `vertical_default` when the velocity has no horizontal component.
#[must_use]
pub fn launch_angle(velocity: &[f64; 3], vertical_default: f64) -> f64 {
    let horizontal = velocity[0].hypot(velocity[1]);
    if horizontal > 0.0 {
        velocity[2].atan2(horizontal).to_degrees()
    } else {
        vertical_default
    }
}

/// Flat-ground projectile range under standard gravity.
///
/// `R = (v² cosθ / g) · [sinθ + √(sin²θ + 2gh/v²)]`
///
/// Returns `None` unless `speed > 0` and `angle_deg > 0`.
///
/// # Example
///
/// ```
/// use throw_kinematics::projectile_range;
///
/// let range = projectile_range(0.0, 10.0, 45.0).unwrap();
/// assert!((range - 100.0 / 9.81).abs() < 1e-9);
/// assert!(projectile_range(2.0, 12.0, 0.0).is_none());
/// ```
#[must_use]
pub fn projectile_range(height: f64, speed: f64, angle_deg: f64) -> Option<f64> {
    projectile_range_with_gravity(height, speed, angle_deg, STANDARD_GRAVITY)
}

/// Flat-ground projectile range for an explicit gravitational acceleration.
///
/// Also `None` when the release is so far below ground that the implement
/// never reaches height 0.
#[must_use]
pub fn projectile_range_with_gravity(
    height: f64,
    speed: f64,
    angle_deg: f64,
    gravity: f64,
) -> Option<f64> {
    if !(speed > 0.0 && angle_deg > 0.0 && gravity > 0.0) {
        return None;
    }

    let (sin_a, cos_a) = angle_deg.to_radians().sin_cos();
    let v2 = speed * speed;
    let discriminant = sin_a * sin_a + 2.0 * gravity * height / v2;
    if discriminant < 0.0 {
        return None;
    }

    Some(v2 * cos_a / gravity * (sin_a + discriminant.sqrt()))
}

/// Number of turns traced by the planar projection of `positions`.
///
/// Angles are taken about the planar centroid, consecutive differences are
/// unwrapped into `(-π, π]`, and their absolute values summed.
#[must_use]
pub fn rotation_count(positions: &[[f64; 3]], min_points: usize, default: f64) -> f64 {
    if positions.is_empty() || positions.len() < min_points {
        return default;
    }

    let n = positions.len() as f64;
    let cx = positions.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = positions.iter().map(|p| p[1]).sum::<f64>() / n;

    let angles: Vec<f64> = positions
        .iter()
        .map(|p| (p[1] - cy).atan2(p[0] - cx))
        .collect();

    let total: f64 = angles
        .windows(2)
        .map(|w| wrap_delta(w[1] - w[0], PI).abs())
        .sum();

    total / (2.0 * PI)
}

/// Path length through consecutive positions.
#[must_use]
pub fn trajectory_length(positions: &[[f64; 3]]) -> f64 {
    positions.windows(2).map(|w| distance3(&w[0], &w[1])).sum()
}

/// Effector kinematics at the frame whose time is closest to `target_time`.
///
/// Ties go to the earlier frame. A purely vertical velocity has launch angle
/// 0 here, so no range is reported for it.
#[must_use]
pub fn kinematics_at_time(
    sequence: &Sequence,
    target_time: f64,
    config: &BiomechanicsConfig,
) -> InstantKinematics {
    let frames = sequence.frames();
    let mut frame_index = 0;
    for (i, f) in frames.iter().enumerate().skip(1) {
        if (f.time - target_time).abs() < (frames[frame_index].time - target_time).abs() {
            frame_index = i;
        }
    }
    let frame = &frames[frame_index];

    let speed = norm3(&frame.effector_vel);
    let height = frame.effector_pos[2];
    let angle = launch_angle(&frame.effector_vel, 0.0);

    InstantKinematics {
        target_time,
        actual_time: frame.time,
        time_offset: (frame.time - target_time).abs(),
        frame_index,
        height,
        speed,
        angle,
        projectile_range: projectile_range_with_gravity(height, speed, angle, config.gravity),
    }
}

/// Every frame within `half_window` seconds of `target_time`, as a release
/// candidate.
///
/// The scan starts at the first frame at or after `target_time -
/// half_window` and stops at the first frame past `target_time +
/// half_window`.
#[must_use]
pub fn search_release_candidates(
    channels: &EffectorChannels,
    target_time: f64,
    half_window: f64,
    config: &BiomechanicsConfig,
) -> Vec<ReleaseCandidate> {
    let Some(start) = channels
        .times
        .iter()
        .position(|&t| t >= target_time - half_window)
    else {
        return Vec::new();
    };

    (start..channels.len())
        .take_while(|&i| channels.times[i] <= target_time + half_window)
        .map(|i| {
            let velocity = &channels.velocities[i];
            let height = channels.height(i);
            let speed = norm3(velocity);
            let angle = launch_angle(velocity, 0.0);
            let range = projectile_range_with_gravity(height, speed, angle, config.gravity);
            ReleaseCandidate {
                index: i,
                time: channels.times[i],
                height,
                speed,
                vertical_velocity: velocity[2],
                angle,
                estimated_range: range.unwrap_or(0.0),
            }
        })
        .collect()
}

/// Keep the most promising candidates, best estimated range first.
///
/// Only candidates above `candidate_min_height` qualify. The first
/// non-empty tier of the preferred angle range, the relaxed angle and a
/// rising effector is ranked. Equal ranges keep time order.
#[must_use]
pub fn rank_release_candidates(
    candidates: &[ReleaseCandidate],
    limit: usize,
    config: &BiomechanicsConfig,
) -> Vec<ReleaseCandidate> {
    let (low, high) = config.candidate_angle_range;
    let tiers: [&dyn Fn(&ReleaseCandidate) -> bool; 3] = [
        &|c: &ReleaseCandidate| c.angle > low && c.angle < high,
        &|c: &ReleaseCandidate| c.angle > config.candidate_relaxed_angle,
        &|c: &ReleaseCandidate| c.vertical_velocity > 0.0,
    ];

    let mut ranked: Vec<ReleaseCandidate> = tiers
        .iter()
        .map(|accept| {
            candidates
                .iter()
                .filter(|c| c.height > config.candidate_min_height && accept(*c))
                .cloned()
                .collect::<Vec<_>>()
        })
        .find(|tier| !tier.is_empty())
        .unwrap_or_default();

    ranked.sort_by(|a, b| b.estimated_range.total_cmp(&a.estimated_range));
    ranked.truncate(limit);
    ranked
}

/// Range at `base_angle + delta` for each delta, compared with the base range.
#[must_use]
pub fn range_what_if(
    height: f64,
    speed: f64,
    base_angle: f64,
    deltas: &[f64],
    gravity: f64,
) -> Vec<AngleWhatIf> {
    let base = projectile_range_with_gravity(height, speed, base_angle, gravity);

    deltas
        .iter()
        .map(|&delta| {
            let angle = base_angle + delta;
            let range = projectile_range_with_gravity(height, speed, angle, gravity);
            AngleWhatIf {
                angle,
                range,
                delta_from_base: range.zip(base).map(|(r, b)| r - b),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::release::{ReleaseStrategy, ThrowClass};
    use approx::assert_relative_eq;

    fn circle_channels(n: usize, turns: f64) -> EffectorChannels {
        let positions: Vec<[f64; 3]> = (0..n)
            .map(|i| {
                let a = 2.0 * PI * turns * i as f64 / n as f64;
                [a.cos(), a.sin(), 1.0]
            })
            .collect();
        EffectorChannels {
            times: (0..n).map(|i| 1.0 + i as f64 * 0.01).collect(),
            velocities: vec![[0.0, 8.0, 6.0]; n],
            speeds: vec![10.0; n],
            positions,
        }
    }

    fn release_at(channels: &EffectorChannels, index: usize) -> ReleaseEvent {
        ReleaseEvent {
            index,
            time: channels.times[index],
            position: channels.positions[index],
            velocity: channels.velocities[index],
            speed: channels.speeds[index],
            throw_class: ThrowClass::ShotPut,
            strategy: ReleaseStrategy::SpeedPeak,
            refined: false,
        }
    }

    #[test]
    fn test_range_flat_ground() {
        let range = projectile_range(0.0, 10.0, 45.0).unwrap();
        assert_relative_eq!(range, 100.0 / 9.81, epsilon = 1e-9);
        assert_relative_eq!(range, 10.19, epsilon = 0.01);
    }

    #[test]
    fn test_range_unavailable() {
        assert!(projectile_range(2.0, 12.0, 0.0).is_none());
        assert!(projectile_range(2.0, 12.0, -5.0).is_none());
        assert!(projectile_range(2.0, 0.0, 40.0).is_none());
        assert!(projectile_range(-50.0, 1.0, 10.0).is_none());
    }

    #[test]
    fn test_release_height_adds_range() {
        let low = projectile_range(0.0, 12.8, 30.7).unwrap();
        let high = projectile_range(2.14, 12.8, 30.7).unwrap();
        assert!(high > low);
    }

    #[test]
    fn test_launch_angle() {
        assert_relative_eq!(launch_angle(&[1.0, 0.0, 1.0], 35.0), 45.0, epsilon = 1e-12);
        assert_eq!(launch_angle(&[0.0, 0.0, 5.0], 35.0), 35.0);
        assert!(launch_angle(&[3.0, 4.0, -1.0], 35.0) < 0.0);
    }

    #[test]
    fn test_rotation_count_sentinel() {
        let channels = circle_channels(9, 1.0);
        assert_eq!(rotation_count(&channels.positions, 10, 1.5), 1.5);
        assert_eq!(rotation_count(&[], 10, 1.5), 1.5);
    }

    #[test]
    fn test_rotation_count_circle() {
        // Two turns sampled at 200 points, the last step not closing the loop.
        let channels = circle_channels(200, 2.0);
        let turns = rotation_count(&channels.positions, 10, 1.5);
        assert_relative_eq!(turns, 2.0 * 199.0 / 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_report_fields() {
        let channels = circle_channels(100, 1.0);
        let release = release_at(&channels, 50);
        let report =
            compute_biomechanics_from_channels(&channels, &release, &BiomechanicsConfig::default());

        assert_relative_eq!(report.release_speed, 10.0);
        assert_relative_eq!(report.release_height, 1.0);
        assert_relative_eq!(report.horizontal_speed, 8.0);
        assert_relative_eq!(report.horizontal_direction, 90.0, epsilon = 1e-9);
        assert_relative_eq!(report.release_angle, 6.0f64.atan2(8.0).to_degrees(), epsilon = 1e-12);
        assert_relative_eq!(report.total_time, 0.5, epsilon = 1e-12);
        assert_relative_eq!(report.max_speed, 10.0);
        assert!(report.projectile_range.is_some());

        // Chord length of 49 steps of 2π/100 on a unit circle.
        let chord = 2.0 * (PI / 100.0).sin();
        assert_relative_eq!(report.trajectory_length, 49.0 * chord, epsilon = 1e-9);
    }

    fn candidate(index: usize, height: f64, angle: f64, vz: f64, range: f64) -> ReleaseCandidate {
        ReleaseCandidate {
            index,
            time: index as f64 * 0.01,
            height,
            speed: 12.0,
            vertical_velocity: vz,
            angle,
            estimated_range: range,
        }
    }

    #[test]
    fn test_instant_kinematics_nearest_frame() {
        let frames = (1..=5)
            .map(|i| {
                let t = f64::from(i) * 0.1;
                Frame::new(t, [0.0, 0.0, 2.0], [8.0, 0.0, 6.0])
            })
            .chain(std::iter::once(Frame::new(0.6, [0.0, 0.0, 2.0], [0.0, 0.0, 5.0])))
            .collect();
        let sequence = Sequence::new(frames).unwrap();
        let config = BiomechanicsConfig::default();

        let k = kinematics_at_time(&sequence, 0.24, &config);
        assert_eq!(k.frame_index, 1);
        assert_relative_eq!(k.time_offset, 0.04, epsilon = 1e-12);
        assert_relative_eq!(k.speed, 10.0);
        assert_relative_eq!(k.angle, 6.0f64.atan2(8.0).to_degrees(), epsilon = 1e-12);
        assert!(k.projectile_range.is_some());

        // Halfway between two frames resolves to the earlier one.
        assert_eq!(kinematics_at_time(&sequence, 0.25, &config).frame_index, 1);
        assert_eq!(kinematics_at_time(&sequence, 9.0, &config).frame_index, 5);
    }

    #[test]
    fn test_instant_kinematics_vertical_launch_has_no_range() {
        let sequence = Sequence::new(vec![Frame::new(0.1, [0.0, 0.0, 2.0], [0.0, 0.0, 5.0])])
            .unwrap();
        let k = kinematics_at_time(&sequence, 0.1, &BiomechanicsConfig::default());

        assert_eq!(k.angle, 0.0);
        assert!(k.projectile_range.is_none());
    }

    #[test]
    fn test_candidate_search_window() {
        let n = 40;
        let channels = EffectorChannels {
            times: (0..n).map(|i| 1.0 + i as f64 * 0.01).collect(),
            positions: vec![[0.0, 0.0, 2.0]; n],
            velocities: (0..n).map(|i| [8.0, 0.0, i as f64 * 0.5 - 10.0]).collect(),
            speeds: vec![10.0; n],
        };
        let config = BiomechanicsConfig::default();

        let found = search_release_candidates(&channels, 1.2, 0.055, &config);
        let indices: Vec<usize> = found.iter().map(|c| c.index).collect();
        assert_eq!(indices, (15..=25).collect::<Vec<_>>());

        let rising = &found[10];
        assert_relative_eq!(rising.vertical_velocity, 2.5, epsilon = 1e-12);
        assert!(rising.angle > 0.0);
        assert_relative_eq!(
            rising.estimated_range,
            projectile_range(2.0, rising.speed, rising.angle).unwrap(),
            epsilon = 1e-9
        );

        // Falling frames have no range.
        assert_eq!(found[0].estimated_range, 0.0);

        assert!(search_release_candidates(&channels, 5.0, 0.1, &config).is_empty());
    }

    #[test]
    fn test_candidate_ranking_tiers() {
        let config = BiomechanicsConfig::default();

        let candidates = vec![
            candidate(0, 2.0, 35.0, 4.0, 15.0),
            candidate(1, 2.0, 30.0, 3.0, 16.0),
            candidate(2, 1.5, 40.0, 4.0, 20.0),
            candidate(3, 2.0, 15.0, 2.0, 18.0),
        ];
        let ranked = rank_release_candidates(&candidates, DEFAULT_CANDIDATE_LIMIT, &config);
        let indices: Vec<usize> = ranked.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 0]);

        // No preferred angle left: relax to angles above 10.
        let relaxed = rank_release_candidates(&candidates[2..], 5, &config);
        assert_eq!(relaxed.iter().map(|c| c.index).collect::<Vec<_>>(), vec![3]);

        // Only a rising effector is left.
        let rising = vec![
            candidate(4, 2.0, 5.0, 1.0, 9.0),
            candidate(5, 2.0, -3.0, -0.5, 0.0),
        ];
        let last = rank_release_candidates(&rising, 5, &config);
        assert_eq!(last.iter().map(|c| c.index).collect::<Vec<_>>(), vec![4]);

        assert!(rank_release_candidates(&rising[1..], 5, &config).is_empty());
    }

    #[test]
    fn test_candidate_ranking_limit_and_ties() {
        let candidates: Vec<ReleaseCandidate> = (0..8)
            .map(|i| candidate(i, 2.0, 30.0, 3.0, if i < 2 { 20.0 } else { i as f64 }))
            .collect();
        let ranked = rank_release_candidates(&candidates, 3, &BiomechanicsConfig::default());
        let indices: Vec<usize> = ranked.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 7]);
    }

    #[test]
    fn test_what_if_sweep() {
        let sweep = range_what_if(2.14, 12.8, 30.7, &[-5.0, 0.0, 5.0], STANDARD_GRAVITY);
        assert_eq!(sweep.len(), 3);
        assert_eq!(sweep[1].delta_from_base, Some(0.0));
        assert!(sweep[2].delta_from_base.unwrap() > 0.0);

        let flat = range_what_if(2.0, 10.0, 2.0, &[-5.0], STANDARD_GRAVITY);
        assert!(flat[0].range.is_none());
        assert!(flat[0].delta_from_base.is_none());
    }
}
