//! End-to-end analysis of a throw recording.
//!
//! [`analyze_sequence`] runs channel extraction, release detection, the
//! biomechanics calculator and the phase segmenter in that order. Each
//! recording is analyzed independently; [`analyze_batch`] is a plain loop.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::angles::{compute_joint_angles, JointAngleSeries};
use crate::biomechanics::{compute_biomechanics_from_channels, BiomechanicsReport};
use crate::channels::{
    extract_arm_chain, extract_center_of_mass, extract_effector, extract_foot_heights,
    CenterOfMassChannels,
};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::frame::Sequence;
use crate::frame_source::FrameSource;
use crate::joint_speeds::{compute_joint_speeds, JointSpeedSummary};
use crate::phases::{segment_phases, Phase};
use crate::release::{detect_release, ReleaseEvent, ThrowClass};

/// Everything derived from one recording.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThrowAnalysis {
    pub throw_class: ThrowClass,
    pub release: ReleaseEvent,
    pub biomechanics: BiomechanicsReport,
    /// The five phases in temporal order.
    pub phases: Vec<Phase>,
    pub joint_angles: JointAngleSeries,
    /// One summary per joint, in skeleton order.
    pub joint_speeds: Vec<JointSpeedSummary>,
    /// `None` when the recording has no centre-of-mass samples.
    pub center_of_mass: Option<CenterOfMassChannels>,
}

/// Analyze one sequence.
///
/// # Errors
///
/// Returns an error if the configuration is invalid. The analysis itself
/// never fails.
///
/// # Example
///
/// ```
/// use throw_kinematics::{analyze_sequence, AnalysisConfig, Frame, Sequence};
///
/// let frames = (1..=120)
///     .map(|i| {
///         let t = f64::from(i) * 0.01;
///         let speed = 20.0 - (f64::from(i) - 80.0).abs() * 0.3;
///         Frame::new(t, [1.0, 0.0, 1.8], [speed, 0.0, 1.0])
///     })
///     .collect();
/// let sequence = Sequence::new(frames)?;
///
/// let analysis = analyze_sequence(&sequence, &AnalysisConfig::default())?;
/// assert_eq!(analysis.release.index, 79);
/// assert_eq!(analysis.phases.len(), 5);
/// # Ok::<(), throw_kinematics::AnalysisError>(())
/// ```
pub fn analyze_sequence(sequence: &Sequence, config: &AnalysisConfig) -> Result<ThrowAnalysis> {
    config.validate()?;

    let channels = extract_effector(sequence);
    let arm = extract_arm_chain(sequence, config.throwing_side);
    if arm.is_none() {
        log::warn!("no {:?} arm markers, arm-extension strategy disabled", config.throwing_side);
    }

    let release = detect_release(&channels, arm.as_deref(), &config.release);
    let biomechanics =
        compute_biomechanics_from_channels(&channels, &release, &config.biomechanics);
    let phases = segment_phases(
        sequence,
        &extract_foot_heights(sequence),
        &release,
        &config.phases,
    );

    Ok(ThrowAnalysis {
        throw_class: release.throw_class,
        release,
        biomechanics,
        phases,
        joint_angles: compute_joint_angles(sequence),
        joint_speeds: compute_joint_speeds(sequence),
        center_of_mass: extract_center_of_mass(sequence),
    })
}

/// Load and analyze each source in turn.
///
/// A failing recording does not stop the batch; its slot holds the error.
#[must_use]
pub fn analyze_batch<S: FrameSource>(
    sources: &[S],
    config: &AnalysisConfig,
) -> Vec<Result<ThrowAnalysis>> {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let result = source
                .load_sequence()
                .and_then(|sequence| analyze_sequence(&sequence, config));
            if let Err(e) = &result {
                log::warn!("recording {i} skipped: {e}");
            }
            result
        })
        .collect()
}
