//! Throw Kinematics Library
//!
//! Release detection, release-instant kinematics and phase segmentation for
//! motion-captured throws (shot put, discus).
//!
//! Given per-frame effector positions and velocities plus skeleton markers,
//! the library:
//!
//! - **classifies** the throw from its peak effector speed
//! - **locates the release** with a cascade of detection strategies
//! - **computes** release speed, height and angle, rotation count and the
//!   projected range
//! - **segments** the motion into five phases bounded by foot-contact events
//!
//! Every analysis step is a pure, total function of a validated
//! [`Sequence`]; degenerate inputs resolve to documented sentinels.
//!
//! # Quick Start
//!
//! ```
//! use throw_kinematics::{analyze_sequence, AnalysisConfig, Frame, Sequence};
//!
//! let frames = (1..=100)
//!     .map(|i| {
//!         let t = f64::from(i) * 0.01;
//!         let speed = 12.0 - (f64::from(i) - 60.0).abs() * 0.2;
//!         Frame::new(t, [0.8, 0.2, 2.0], [speed, 0.0, 2.0])
//!     })
//!     .collect();
//! let sequence = Sequence::new(frames)?;
//!
//! let analysis = analyze_sequence(&sequence, &AnalysisConfig::default())?;
//! println!(
//!     "{} released at {:.2}s, {:.1} m/s",
//!     analysis.throw_class.name(),
//!     analysis.release.time,
//!     analysis.biomechanics.release_speed,
//! );
//! # Ok::<(), throw_kinematics::AnalysisError>(())
//! ```
//!
//! # Pipeline
//!
//! | Step | Function | Output |
//! |------|----------|--------|
//! | Load | [`FrameSource::load_sequence`] | [`Sequence`] |
//! | Release | [`detect_throw_class_and_release`] | [`ReleaseEvent`] |
//! | Metrics | [`compute_biomechanics`] | [`BiomechanicsReport`] |
//! | Phases | [`segment_phases`] | five [`Phase`]s |
//! | Angles | [`compute_joint_angles`] | [`JointAngleSeries`] |
//! | Joint speeds | [`compute_joint_speeds`] | [`JointSpeedSummary`] per joint |

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod analysis;
pub mod angles;
pub mod biomechanics;
pub mod channels;
pub mod config;
pub mod error;
pub mod frame;
pub mod frame_source;
pub mod joint_speeds;
pub mod math;
pub mod phases;
pub mod release;

// Re-exports for convenient access
pub use analysis::{analyze_batch, analyze_sequence, ThrowAnalysis};
pub use angles::{compute_joint_angles, JointAngleSeries};
pub use biomechanics::{
    compute_biomechanics, kinematics_at_time, projectile_range, range_what_if,
    rank_release_candidates, search_release_candidates, AngleWhatIf, BiomechanicsReport,
    InstantKinematics, ReleaseCandidate, DEFAULT_CANDIDATE_LIMIT,
};
pub use channels::{
    extract_arm_chain, extract_center_of_mass, extract_effector, extract_foot_heights,
    CenterOfMassChannels, FootHeights, Side,
};
pub use config::{AnalysisConfig, BiomechanicsConfig, PhaseConfig, ReleaseConfig};
pub use error::{AnalysisError, Result};
pub use frame::{CenterOfMass, Frame, Joint, Sequence};
pub use frame_source::{ColumnLayout, FrameSource, TsvFrameSource};
pub use joint_speeds::{compute_joint_speeds, JointSpeedSummary};
pub use math::vertex_angle;
pub use phases::{segment_phases, Phase, PhaseId, PhaseMetrics};
pub use release::{detect_throw_class_and_release, ReleaseEvent, ReleaseStrategy, ThrowClass};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of phases produced by [`segment_phases`].
pub const PHASE_COUNT: usize = 5;
