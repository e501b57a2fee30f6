//! Throw classification and release-instant detection.
//!
//! The release frame is chosen by an ordered cascade of strategies. The first
//! strategy that applies and yields a frame wins:
//!
//! 1. **Arm extension** (shot put with arm markers only): frames with a
//!    straightened elbow, a high effector and upward velocity; the fastest
//!    one wins.
//! 2. **Speed peak**: the first local maximum of the smoothed speed that is
//!    high enough, fast enough, and followed by a clear drop.
//! 3. **Height-gated maximum**: the fastest frame above the class height.
//! 4. **Global maximum**: the fastest frame in the search window.
//!
//! Strategies 3 and 4 are followed by a small local refinement. All search
//! happens inside a [`SearchWindow`] that excludes capture-boundary frames.
//! Detection never fails: the last strategy always yields a frame.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::channels::{extract_effector, ArmPose, EffectorChannels};
use crate::config::ReleaseConfig;
use crate::frame::Sequence;
use crate::math::signal::{centered_moving_average, first_max_by};

/// Throw type inferred from the peak effector speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ThrowClass {
    /// Peak speed below the class threshold.
    ShotPut,
    /// Peak speed at or above the class threshold.
    Discus,
}

impl ThrowClass {
    /// Classify from a peak speed.
    #[must_use]
    pub fn from_peak_speed(peak_speed: f64, threshold: f64) -> Self {
        if peak_speed < threshold {
            Self::ShotPut
        } else {
            Self::Discus
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ShotPut => "Shot Put",
            Self::Discus => "Discus",
        }
    }
}

/// Strategy of the cascade that selected the release frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReleaseStrategy {
    ArmExtension,
    SpeedPeak,
    HeightGatedMax,
    GlobalMax,
}

impl ReleaseStrategy {
    /// Evaluation order.
    pub const CASCADE: [Self; 4] = [
        Self::ArmExtension,
        Self::SpeedPeak,
        Self::HeightGatedMax,
        Self::GlobalMax,
    ];

    /// Whether a selection by this strategy is followed by local refinement.
    #[must_use]
    pub const fn refines(self) -> bool {
        matches!(self, Self::HeightGatedMax | Self::GlobalMax)
    }

    fn applies(self, ctx: &SearchContext<'_>) -> bool {
        match self {
            Self::ArmExtension => ctx.class == ThrowClass::ShotPut && ctx.arm.is_some(),
            Self::SpeedPeak | Self::HeightGatedMax | Self::GlobalMax => true,
        }
    }

    fn select(self, ctx: &SearchContext<'_>) -> Option<usize> {
        match self {
            Self::ArmExtension => select_arm_extension(ctx),
            Self::SpeedPeak => select_speed_peak(ctx),
            Self::HeightGatedMax => select_height_gated_max(ctx),
            Self::GlobalMax => select_global_max(ctx),
        }
    }
}

/// The release instant and the effector state at that frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReleaseEvent {
    /// Frame index of the release.
    pub index: usize,
    /// Release time (seconds).
    pub time: f64,
    /// Effector position at release.
    pub position: [f64; 3],
    /// Effector velocity at release.
    pub velocity: [f64; 3],
    /// `|velocity|` at release.
    pub speed: f64,
    /// Throw type used for the height thresholds.
    pub throw_class: ThrowClass,
    /// Strategy that produced the index.
    pub strategy: ReleaseStrategy,
    /// Whether local refinement moved the index.
    pub refined: bool,
}

/// Frame range `[start, end)` searched by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: usize,
    pub end: usize,
}

impl SearchWindow {
    /// Window for a sequence of `n` frames.
    ///
    /// Excludes `max(skip_start_min, skip_start_fraction * n)` leading and
    /// `max(skip_end_min, skip_end_fraction * n)` trailing frames. Sequences
    /// too short to leave anything are searched in full.
    #[must_use]
    pub fn for_length(n: usize, config: &ReleaseConfig) -> Self {
        let skip_start = config
            .skip_start_min
            .max((n as f64 * config.skip_start_fraction) as usize);
        let skip_end = config
            .skip_end_min
            .max((n as f64 * config.skip_end_fraction) as usize);
        let end = n.saturating_sub(skip_end);

        if skip_start < end {
            Self {
                start: skip_start,
                end,
            }
        } else {
            log::warn!(
                "sequence of {n} frames too short for boundary exclusion, searching all frames"
            );
            Self { start: 0, end: n }
        }
    }

    /// Indices of the window.
    #[must_use]
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

struct SearchContext<'a> {
    channels: &'a EffectorChannels,
    arm: Option<&'a [Option<ArmPose>]>,
    smoothed: Vec<f64>,
    window: SearchWindow,
    class: ThrowClass,
    global_max: f64,
    min_height: f64,
    config: &'a ReleaseConfig,
}

impl SearchContext<'_> {
    fn speed(&self, i: usize) -> f64 {
        self.channels.speeds[i]
    }

    fn height(&self, i: usize) -> f64 {
        self.channels.height(i)
    }
}

/// Peak raw speed inside the search window.
#[must_use]
pub fn peak_window_speed(channels: &EffectorChannels, window: SearchWindow) -> f64 {
    window
        .indices()
        .map(|i| channels.speeds[i])
        .fold(0.0, f64::max)
}

/// Classify the throw from the peak speed inside the search window.
///
/// # Panics
///
/// Panics if `channels` is empty.
#[must_use]
pub fn classify_throw(channels: &EffectorChannels, config: &ReleaseConfig) -> ThrowClass {
    let window = SearchWindow::for_length(channels.len(), config);
    ThrowClass::from_peak_speed(
        peak_window_speed(channels, window),
        config.class_speed_threshold,
    )
}

/// Classify the throw and locate the release frame.
///
/// `arm` is the per-frame throwing-arm chain; pass `None` when the arm
/// markers were not captured.
///
/// # Panics
///
/// Panics if `channels` is empty. A [`Sequence`] is never empty, so channels
/// extracted from one are always valid input.
#[must_use]
pub fn detect_release(
    channels: &EffectorChannels,
    arm: Option<&[Option<ArmPose>]>,
    config: &ReleaseConfig,
) -> ReleaseEvent {
    assert!(!channels.is_empty(), "release detection needs at least one frame");

    let window = SearchWindow::for_length(channels.len(), config);
    let global_max = peak_window_speed(channels, window);
    let class = ThrowClass::from_peak_speed(global_max, config.class_speed_threshold);
    let min_height = config.min_height(class);

    log::info!(
        "throw classified as {} (peak speed {global_max:.2}, min release height {min_height})",
        class.name()
    );

    let ctx = SearchContext {
        channels,
        arm,
        smoothed: centered_moving_average(&channels.speeds, config.smoothing_half_window),
        window,
        class,
        global_max,
        min_height,
        config,
    };

    let (strategy, selected) = ReleaseStrategy::CASCADE
        .iter()
        .copied()
        .filter(|s| s.applies(&ctx))
        .find_map(|s| s.select(&ctx).map(|i| (s, i)))
        .unwrap_or((ReleaseStrategy::GlobalMax, window.start));

    let index = if strategy.refines() {
        refine(&ctx, selected)
    } else {
        selected
    };

    log::info!(
        "release at frame {index} via {strategy:?} (speed {:.2}, height {:.2})",
        ctx.speed(index),
        ctx.height(index)
    );

    ReleaseEvent {
        index,
        time: channels.times[index],
        position: channels.positions[index],
        velocity: channels.velocities[index],
        speed: channels.speeds[index],
        throw_class: class,
        strategy,
        refined: index != selected,
    }
}

/// Convenience wrapper over [`detect_release`] working from a [`Sequence`].
#[must_use]
pub fn detect_throw_class_and_release(
    sequence: &Sequence,
    arm: Option<&[Option<ArmPose>]>,
    config: &ReleaseConfig,
) -> ReleaseEvent {
    detect_release(&extract_effector(sequence), arm, config)
}

fn select_arm_extension(ctx: &SearchContext<'_>) -> Option<usize> {
    let arm = ctx.arm?;
    let cfg = ctx.config;
    let end = ctx.window.end.min(arm.len());

    let candidates = (ctx.window.start..end).filter(|&i| {
        arm[i].is_some_and(|pose| {
            pose.elbow_angle() > cfg.arm_extension_angle
                && ctx.height(i) > cfg.arm_extension_min_height
                && ctx.channels.velocities[i][2] > 0.0
        })
    });

    let best = first_max_by(candidates, |i| ctx.speed(i)).map(|(i, _)| i);
    match best {
        Some(i) => log::debug!("arm extension candidate wins at frame {i}"),
        None => log::debug!("no arm extension candidate, falling back to speed peaks"),
    }
    best
}

fn select_speed_peak(ctx: &SearchContext<'_>) -> Option<usize> {
    let cfg = ctx.config;
    let s = &ctx.smoothed;
    let min_peak_speed = ctx.global_max * cfg.min_peak_fraction;

    let first = ctx.window.start + 1;
    let last = ctx.window.end.saturating_sub(1);

    for i in first..last {
        let is_peak = s[i] > s[i - 1] && s[i] >= s[i + 1];
        if !is_peak || ctx.height(i) <= ctx.min_height || ctx.speed(i) < min_peak_speed {
            continue;
        }

        let speed = ctx.speed(i);
        let look_ahead_end = (i + cfg.drop_look_ahead).min(ctx.window.end);
        let min_after = s
            .get(i + 1..look_ahead_end)
            .unwrap_or(&[])
            .iter()
            .copied()
            .fold(speed, f64::min);
        let drop_ratio = if speed > 0.0 {
            (speed - min_after) / speed
        } else {
            0.0
        };

        if drop_ratio > cfg.min_drop_ratio {
            log::debug!(
                "speed peak at frame {i}: speed {speed:.2}, post-peak drop {:.1}%",
                drop_ratio * 100.0
            );
            return Some(i);
        }
        log::debug!("rejected plateau at frame {i}: drop {:.1}%", drop_ratio * 100.0);
    }

    None
}

fn select_height_gated_max(ctx: &SearchContext<'_>) -> Option<usize> {
    let gated = ctx.window.indices().filter(|&i| ctx.height(i) > ctx.min_height);
    first_max_by(gated, |i| ctx.speed(i)).map(|(i, _)| i)
}

fn select_global_max(ctx: &SearchContext<'_>) -> Option<usize> {
    log::warn!("no frame above {} m, using global speed maximum", ctx.min_height);
    first_max_by(ctx.window.indices(), |i| ctx.speed(i)).map(|(i, _)| i)
}

/// Move to a strictly faster frame within the refinement radius, provided it
/// is not far below the class height.
fn refine(ctx: &SearchContext<'_>, index: usize) -> usize {
    let cfg = ctx.config;
    let lo = ctx.window.start.max(index.saturating_sub(cfg.refine_radius));
    let hi = ctx.window.end.min(index + cfg.refine_radius + 1);
    let floor = ctx.min_height - cfg.refine_height_margin;

    let mut best = index;
    for i in lo..hi {
        if ctx.speed(i) > ctx.speed(best) && ctx.height(i) > floor {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels_from(speeds: &[f64], heights: &[f64]) -> EffectorChannels {
        let n = speeds.len();
        EffectorChannels {
            times: (0..n).map(|i| (i + 1) as f64 * 0.01).collect(),
            positions: heights.iter().map(|&z| [1.0, 0.0, z]).collect(),
            velocities: speeds.iter().map(|&v| [v, 0.0, 0.0]).collect(),
            speeds: speeds.to_vec(),
        }
    }

    /// 100-frame throw peaking at frame 60 whose arm is only straight on
    /// frames 70..76. Those frames get `extended_height` and `extended_vz`.
    fn arm_throw(
        peak_speed: f64,
        extended_height: f64,
        extended_vz: f64,
    ) -> (EffectorChannels, Vec<Option<ArmPose>>) {
        let extended = |i: usize| (70..76).contains(&i);
        let speeds: Vec<f64> = (0..100)
            .map(|i| peak_speed - (i as f64 - 60.0).abs() * 0.2)
            .collect();
        let heights: Vec<f64> = (0..100)
            .map(|i| if extended(i) { extended_height } else { 2.0 })
            .collect();
        let mut channels = channels_from(&speeds, &heights);
        for (i, velocity) in channels.velocities.iter_mut().enumerate() {
            velocity[2] = if extended(i) { extended_vz } else { 1.0 };
        }

        let arm = (0..100)
            .map(|i| {
                let wrist = if extended(i) {
                    [0.6, 0.0, 1.5]
                } else {
                    [0.3, 0.0, 1.8]
                };
                Some(ArmPose {
                    shoulder: [0.0, 0.0, 1.5],
                    elbow: [0.3, 0.0, 1.5],
                    wrist,
                })
            })
            .collect();
        (channels, arm)
    }

    #[test]
    fn test_arm_extension_selects_straight_arm() {
        let (channels, arm) = arm_throw(14.0, 2.0, 1.0);
        let event = detect_release(&channels, Some(arm.as_slice()), &ReleaseConfig::default());

        assert_eq!(event.throw_class, ThrowClass::ShotPut);
        assert_eq!(event.strategy, ReleaseStrategy::ArmExtension);
        assert_eq!(event.index, 70);
    }

    #[test]
    fn test_arm_extension_requires_rising_effector() {
        let config = ReleaseConfig::default();
        for vz in [0.0, -1.0] {
            let (channels, arm) = arm_throw(14.0, 2.0, vz);
            let event = detect_release(&channels, Some(arm.as_slice()), &config);
            assert_eq!(event.strategy, ReleaseStrategy::SpeedPeak, "vz = {vz}");
            assert_eq!(event.index, 60);
        }
    }

    #[test]
    fn test_arm_extension_requires_release_height() {
        let config = ReleaseConfig::default();
        for height in [1.6, 1.5] {
            let (channels, arm) = arm_throw(14.0, height, 1.0);
            let event = detect_release(&channels, Some(arm.as_slice()), &config);
            assert_eq!(event.strategy, ReleaseStrategy::SpeedPeak, "height = {height}");
            assert_eq!(event.index, 60);
        }
    }

    #[test]
    fn test_arm_extension_ignored_for_discus() {
        let (channels, arm) = arm_throw(24.0, 2.0, 1.0);
        let event = detect_release(&channels, Some(arm.as_slice()), &ReleaseConfig::default());

        assert_eq!(event.throw_class, ThrowClass::Discus);
        assert_eq!(event.strategy, ReleaseStrategy::SpeedPeak);
        assert_eq!(event.index, 60);
    }

    #[test]
    fn test_bent_arm_is_not_extended() {
        let (channels, mut arm) = arm_throw(14.0, 2.0, 1.0);
        for pose in arm.iter_mut().flatten() {
            pose.wrist = [0.3, 0.0, 1.8];
        }
        let event = detect_release(&channels, Some(arm.as_slice()), &ReleaseConfig::default());
        assert_eq!(event.strategy, ReleaseStrategy::SpeedPeak);
    }

    #[test]
    fn test_search_window_bounds() {
        let config = ReleaseConfig::default();
        assert_eq!(
            SearchWindow::for_length(200, &config),
            SearchWindow { start: 20, end: 196 }
        );
        assert_eq!(
            SearchWindow::for_length(30, &config),
            SearchWindow { start: 5, end: 27 }
        );
        assert_eq!(
            SearchWindow::for_length(6, &config),
            SearchWindow { start: 0, end: 6 }
        );
    }

    #[test]
    fn test_classification_boundary() {
        let config = ReleaseConfig::default();
        let heights = vec![2.0; 40];

        let slow = channels_from(&vec![17.99; 40], &heights);
        assert_eq!(classify_throw(&slow, &config), ThrowClass::ShotPut);

        let fast = channels_from(&vec![18.01; 40], &heights);
        assert_eq!(classify_throw(&fast, &config), ThrowClass::Discus);
    }

    #[test]
    fn test_symmetric_peak_detected() {
        // Triangle peaking at frame 30, apex 22.
        let speeds: Vec<f64> = (0..61)
            .map(|i| 22.0 - (f64::from(i) - 30.0).abs() * 0.6)
            .collect();
        let channels = channels_from(&speeds, &vec![2.0; 61]);
        let event = detect_release(&channels, None, &ReleaseConfig::default());

        assert_eq!(event.index, 30);
        assert_eq!(event.strategy, ReleaseStrategy::SpeedPeak);
        assert_eq!(event.throw_class, ThrowClass::Discus);
        assert!(!event.refined);
    }

    #[test]
    fn test_plateau_is_not_a_peak() {
        // Flat speed never drops after the peak, so the fallback decides.
        let mut speeds = vec![10.0; 40];
        speeds[20] = 10.2;
        let channels = channels_from(&speeds, &vec![2.0; 40]);
        let event = detect_release(&channels, None, &ReleaseConfig::default());

        assert_eq!(event.strategy, ReleaseStrategy::HeightGatedMax);
        assert_eq!(event.index, 20);
    }

    #[test]
    fn test_global_max_when_nothing_high_enough() {
        let mut speeds = vec![5.0; 40];
        speeds[25] = 9.0;
        let channels = channels_from(&speeds, &vec![0.5; 40]);
        let event = detect_release(&channels, None, &ReleaseConfig::default());

        assert_eq!(event.strategy, ReleaseStrategy::GlobalMax);
        assert_eq!(event.index, 25);
    }

    #[test]
    fn test_refinement_moves_to_faster_neighbor() {
        // Frame 20 is the only frame above 1.6 m and its bump is too small to
        // count as a peak. Frame 22 is faster and only slightly lower.
        let mut speeds = vec![9.0; 40];
        let mut heights = vec![1.0; 40];
        speeds[20] = 9.2;
        heights[20] = 1.7;
        speeds[22] = 9.3;
        heights[22] = 1.55;
        let channels = channels_from(&speeds, &heights);
        let event = detect_release(&channels, None, &ReleaseConfig::default());

        assert_eq!(event.strategy, ReleaseStrategy::HeightGatedMax);
        assert_eq!(event.index, 22);
        assert!(event.refined);
    }

    #[test]
    fn test_tiny_sequence_does_not_panic() {
        let channels = channels_from(&[1.0, 3.0, 2.0], &[0.1, 0.1, 0.1]);
        let event = detect_release(&channels, None, &ReleaseConfig::default());
        assert_eq!(event.index, 1);
    }

    #[test]
    fn test_deterministic() {
        let speeds: Vec<f64> = (0..80).map(|i| (f64::from(i) * 0.2).sin().abs() * 12.0).collect();
        let channels = channels_from(&speeds, &vec![1.8; 80]);
        let config = ReleaseConfig::default();
        assert_eq!(
            detect_release(&channels, None, &config),
            detect_release(&channels, None, &config)
        );
    }
}
