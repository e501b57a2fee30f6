//! Five-phase segmentation of the throwing motion.
//!
//! Boundaries are detected in order, each search starting at the previous
//! boundary and stopping before the release frame:
//!
//! | Stage        | Starts at            | Detected from                      |
//! |--------------|----------------------|------------------------------------|
//! | Preparation  | end of backswing     | effector heading reversal          |
//! | Entry        | right foot off       | right ankle rises above takeoff    |
//! | Airborne     | left foot off        | left ankle rises above takeoff     |
//! | Transition   | right foot lands     | right ankle drops below takeoff    |
//! | Delivery     | left foot lands      | left ankle drops below takeoff     |
//!
//! A missing detection is filled with a proportional default and the five
//! boundaries are then clamped so they are strictly increasing and keep a
//! margin before the release.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::channels::FootHeights;
use crate::config::PhaseConfig;
use crate::frame::Sequence;
use crate::math::geometry::{planar_heading, wrap_delta};
use crate::math::signal::{holds_for, mean};
use crate::release::ReleaseEvent;

/// Identifier of a technical phase, in temporal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PhaseId {
    Preparation,
    Entry,
    Airborne,
    Transition,
    Delivery,
}

impl PhaseId {
    /// All phases in order.
    pub const ALL: [Self; 5] = [
        Self::Preparation,
        Self::Entry,
        Self::Airborne,
        Self::Transition,
        Self::Delivery,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Preparation => "Preparation",
            Self::Entry => "Entry",
            Self::Airborne => "Airborne",
            Self::Transition => "Transition",
            Self::Delivery => "Delivery",
        }
    }

    /// Fixed display color (hex RGB).
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Preparation => "#22c55e",
            Self::Entry => "#3b82f6",
            Self::Airborne => "#f97316",
            Self::Transition => "#8b5cf6",
            Self::Delivery => "#ef4444",
        }
    }
}

/// Phase-specific metrics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseMetrics {
    /// Phase duration (seconds, 3 decimals).
    pub duration: f64,
    /// Flight time; set on [`PhaseId::Airborne`] only.
    pub flight_time: Option<f64>,
    /// Release speed (2 decimals); set on [`PhaseId::Delivery`] only.
    pub release_speed: Option<f64>,
}

/// One segment of the throw.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Phase {
    pub id: PhaseId,
    pub start_time: f64,
    pub end_time: f64,
    pub start_frame_index: usize,
    pub end_frame_index: usize,
    pub color: String,
    pub metrics: PhaseMetrics,
}

/// Direction of an ankle-height threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Crossing {
    /// Rises above the takeoff height.
    Off,
    /// Drops below the takeoff height.
    Land,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Foot {
    Right,
    Left,
}

/// Foot events opening Entry, Airborne, Transition and Delivery.
const FOOT_EVENTS: [(Foot, Crossing); 4] = [
    (Foot::Right, Crossing::Off),
    (Foot::Left, Crossing::Off),
    (Foot::Right, Crossing::Land),
    (Foot::Left, Crossing::Land),
];

/// Start frames of the five phases plus the release frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseBoundaries {
    /// Start frame of each phase, in [`PhaseId::ALL`] order.
    pub starts: [usize; 5],
    /// Release frame closing the Delivery phase.
    pub release: usize,
    /// Whether each start was detected rather than filled by default.
    pub detected: [bool; 5],
}

impl PhaseBoundaries {
    /// Start frame of a phase.
    #[must_use]
    pub fn start_of(&self, id: PhaseId) -> usize {
        self.starts[id as usize]
    }

    /// End frame of a phase: the next phase's start, or the release.
    #[must_use]
    pub fn end_of(&self, id: PhaseId) -> usize {
        self.starts.get(id as usize + 1).copied().unwrap_or(self.release)
    }
}

/// Segment the throw into its five phases.
///
/// Never fails: missing detections fall back to proportional defaults.
/// When the release lies at frame 5 or later the returned start frames
/// are strictly increasing and all before the release.
#[must_use]
pub fn segment_phases(
    sequence: &Sequence,
    feet: &FootHeights,
    release: &ReleaseEvent,
    config: &PhaseConfig,
) -> Vec<Phase> {
    let boundaries = detect_boundaries(sequence, feet, release.index, config);
    build_phases(sequence, &boundaries, release)
}

/// Detect and repair the phase boundaries for a release at `release_index`.
#[must_use]
pub fn detect_boundaries(
    sequence: &Sequence,
    feet: &FootHeights,
    release_index: usize,
    config: &PhaseConfig,
) -> PhaseBoundaries {
    let mut starts = [0usize; 5];
    let mut detected = [false; 5];

    let (prep, prep_found) = preparation_start(sequence, release_index, config);
    starts[0] = prep;
    detected[0] = prep_found;
    if !prep_found {
        log::warn!(
            "{} start not detected, defaulting to frame {prep}",
            PhaseId::Preparation.name()
        );
    }

    let mut previous = prep;
    for (k, &(foot, crossing)) in FOOT_EVENTS.iter().enumerate() {
        let heights = match foot {
            Foot::Right => &feet.right,
            Foot::Left => &feet.left,
        };

        let found = find_crossing(heights, previous, release_index, crossing, config);
        let index = found.unwrap_or_else(|| {
            let fraction = config.fallback_fractions[k];
            let fallback = proportional_default(previous, release_index, fraction);
            log::warn!(
                "{} start ({foot:?} {crossing:?}) not detected, using frame {fallback}",
                PhaseId::ALL[k + 1].name()
            );
            fallback
        });

        starts[k + 1] = index;
        detected[k + 1] = found.is_some();
        previous = index;
    }

    let repaired = enforce_order(starts, release_index, config.release_margins);
    if repaired != starts {
        log::debug!("phase boundaries {starts:?} repaired to {repaired:?}");
    }

    PhaseBoundaries {
        starts: repaired,
        release: release_index,
        detected,
    }
}

/// Frame where the effector heading stops decreasing and starts increasing.
///
/// Returns the search-window start with `false` when no reversal is found.
fn preparation_start(
    sequence: &Sequence,
    release_index: usize,
    config: &PhaseConfig,
) -> (usize, bool) {
    let n = sequence.len();
    let window_start = (n as f64 * config.preparation_window_start) as usize;
    let window_end = (n as f64 * config.preparation_window_end) as usize;
    let w = config.rate_window;

    let headings: Vec<f64> = sequence
        .iter()
        .map(|f| planar_heading(&f.effector_pos).to_degrees())
        .collect();
    let changes: Vec<f64> = headings
        .windows(2)
        .map(|p| wrap_delta(p[1] - p[0], 180.0))
        .collect();

    let last = window_end
        .saturating_sub(w)
        .min(changes.len().saturating_sub(w))
        .min(release_index);

    let reversal = (window_start + w..last).find(|&i| {
        mean(&changes[i - w..i]) < -config.rate_threshold
            && mean(&changes[i..i + w]) > config.rate_threshold
    });

    match reversal {
        Some(i) => (i, true),
        None => (window_start, false),
    }
}

/// First frame in `[from, until)` that crosses the takeoff height and stays
/// on the new side for `stability_frames` frames (itself included).
fn find_crossing(
    heights: &[f64],
    from: usize,
    until: usize,
    crossing: Crossing,
    config: &PhaseConfig,
) -> Option<usize> {
    let threshold = config.takeoff_height;
    let on_new_side = |z: f64| match crossing {
        Crossing::Off => z > threshold,
        Crossing::Land => z < threshold,
    };

    (from..until.min(heights.len()))
        .find(|&i| holds_for(heights, i, config.stability_frames, on_new_side))
}

fn proportional_default(previous: usize, release_index: usize, fraction: f64) -> usize {
    let span = release_index as f64 - previous as f64;
    let offset = (fraction * span) as isize;
    (previous as isize + offset).max(0) as usize
}

/// Clamp boundaries so each exceeds its predecessor and keeps its margin
/// before the release.
fn enforce_order(starts: [usize; 5], release_index: usize, margins: [usize; 5]) -> [usize; 5] {
    let release = release_index as isize;
    let mut repaired = [0usize; 5];
    let mut floor: isize = 0;

    for (k, (&raw, &margin)) in starts.iter().zip(margins.iter()).enumerate() {
        let capped = (raw as isize).min(release - margin as isize);
        let value = floor.max(capped);
        repaired[k] = value as usize;
        floor = value + 1;
    }

    repaired
}

fn build_phases(
    sequence: &Sequence,
    boundaries: &PhaseBoundaries,
    release: &ReleaseEvent,
) -> Vec<Phase> {
    PhaseId::ALL
        .iter()
        .map(|&id| {
            let start = boundaries.start_of(id);
            let end = boundaries.end_of(id);
            let start_time = sequence.time_at(start);
            let end_time = if id == PhaseId::Delivery {
                release.time
            } else {
                sequence.time_at(end)
            };
            let duration = round_to(end_time - start_time, 3);

            Phase {
                id,
                start_time: round_to(start_time, 3),
                end_time: round_to(end_time, 3),
                start_frame_index: start,
                end_frame_index: end,
                color: id.color().to_string(),
                metrics: PhaseMetrics {
                    duration,
                    flight_time: (id == PhaseId::Airborne).then_some(duration),
                    release_speed: (id == PhaseId::Delivery).then(|| round_to(release.speed, 2)),
                },
            }
        })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
