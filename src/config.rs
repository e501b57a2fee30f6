//! Configuration for throw analysis.
//!
//! Every threshold used by the detectors is an explicit field here rather
//! than a process-wide constant. [`AnalysisConfig`] bundles one sub-config
//! per stage of the pipeline.
//!
//! # Example
//!
//! ```
//! use throw_kinematics::AnalysisConfig;
//!
//! let config = AnalysisConfig::default().with_takeoff_height(0.18);
//! assert!(config.validate().is_ok());
//! ```

use crate::channels::Side;
use crate::error::{AnalysisError, Result};

/// Standard gravitational acceleration (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Parameters of the release detector.
///
/// The height minimums are class dependent: a shot put is released from
/// above the head, a discus is slung from around shoulder height.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseConfig {
    /// Peak speed below which a throw is classified as a shot put.
    pub class_speed_threshold: f64,

    /// Minimum effector height for a shot put release.
    pub shot_put_min_height: f64,

    /// Minimum effector height for a discus release.
    pub discus_min_height: f64,

    /// Half width of the centered moving average (2 gives a 5-frame window).
    pub smoothing_half_window: usize,

    /// Fraction of leading frames excluded as capture-boundary artifacts.
    pub skip_start_fraction: f64,

    /// Lower bound on the number of excluded leading frames.
    pub skip_start_min: usize,

    /// Fraction of trailing frames excluded as capture-boundary artifacts.
    pub skip_end_fraction: f64,

    /// Lower bound on the number of excluded trailing frames.
    pub skip_end_min: usize,

    /// Elbow angle (degrees) above which the throwing arm counts as extended.
    pub arm_extension_angle: f64,

    /// Effector height required for an arm-extension candidate.
    pub arm_extension_min_height: f64,

    /// Peaks slower than this fraction of the global maximum are ignored.
    pub min_peak_fraction: f64,

    /// Relative drop in smoothed speed required after a peak.
    pub min_drop_ratio: f64,

    /// Smoothed samples `i + 1 .. i + drop_look_ahead` are checked for the
    /// post-peak drop.
    pub drop_look_ahead: usize,

    /// Radius (frames) of the local refinement after the fallback strategies.
    pub refine_radius: usize,

    /// Height slack below the class minimum accepted during refinement.
    pub refine_height_margin: f64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            class_speed_threshold: 18.0,
            shot_put_min_height: 1.6,
            discus_min_height: 1.2,
            smoothing_half_window: 2,
            skip_start_fraction: 0.10,
            skip_start_min: 5,
            skip_end_fraction: 0.02,
            skip_end_min: 3,
            arm_extension_angle: 130.0,
            arm_extension_min_height: 1.6,
            min_peak_fraction: 0.40,
            min_drop_ratio: 0.05,
            drop_look_ahead: 10,
            refine_radius: 5,
            refine_height_margin: 0.1,
        }
    }
}

/// Parameters of the biomechanics calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomechanicsConfig {
    /// Gravitational acceleration used by the range formula.
    pub gravity: f64,

    /// Launch angle reported when the release velocity has no horizontal part.
    pub vertical_release_angle: f64,

    /// Minimum number of pre-release points for a rotation estimate.
    pub min_rotation_points: usize,

    /// Rotation count reported when there is too little pre-release history.
    pub default_rotation_count: f64,

    /// Release candidates must be higher than this.
    pub candidate_min_height: f64,

    /// Open launch-angle range (degrees) of a preferred release candidate.
    pub candidate_angle_range: (f64, f64),

    /// Launch angle a candidate must exceed once no preferred one exists.
    pub candidate_relaxed_angle: f64,
}

impl Default for BiomechanicsConfig {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            vertical_release_angle: 35.0,
            min_rotation_points: 10,
            default_rotation_count: 1.5,
            candidate_min_height: 1.6,
            candidate_angle_range: (20.0, 50.0),
            candidate_relaxed_angle: 10.0,
        }
    }
}

/// Parameters of the phase segmenter.
///
/// The preparation window and the fallback fractions are empirical values
/// from field recordings and have not been validated beyond them.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseConfig {
    /// Ankle height separating ground contact from flight.
    pub takeoff_height: f64,

    /// Frames (including the crossing frame) that must stay on the new side.
    pub stability_frames: usize,

    /// Start of the preparation-reversal search, as a fraction of length.
    pub preparation_window_start: f64,

    /// End of the preparation-reversal search, as a fraction of length.
    pub preparation_window_end: f64,

    /// Frames averaged on each side of a candidate reversal.
    pub rate_window: usize,

    /// Mean angular rate (degrees/frame) that counts as turning.
    pub rate_threshold: f64,

    /// Proportional defaults for right-off, left-off, right-land, left-land.
    pub fallback_fractions: [f64; 4],

    /// Frames each boundary must keep before the release, in phase order.
    pub release_margins: [usize; 5],
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            takeoff_height: 0.15,
            stability_frames: 5,
            preparation_window_start: 0.45,
            preparation_window_end: 0.75,
            rate_window: 5,
            rate_threshold: 0.1,
            fallback_fractions: [0.2, 0.3, 0.3, 0.3],
            release_margins: [50, 40, 30, 20, 10],
        }
    }
}

/// Complete configuration for a throw analysis run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisConfig {
    /// Release detector parameters.
    pub release: ReleaseConfig,

    /// Biomechanics calculator parameters.
    pub biomechanics: BiomechanicsConfig,

    /// Phase segmenter parameters.
    pub phases: PhaseConfig,

    /// Arm whose markers feed the arm-extension strategy.
    pub throwing_side: Side,
}

impl ReleaseConfig {
    /// Validate the release parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.class_speed_threshold <= 0.0 {
            return Err(AnalysisError::invalid_config(
                "class_speed_threshold must be positive",
            ));
        }
        if !(0.0..1.0).contains(&self.skip_start_fraction)
            || !(0.0..1.0).contains(&self.skip_end_fraction)
        {
            return Err(AnalysisError::invalid_config(
                "skip fractions must lie in [0, 1)",
            ));
        }
        if !(0.0..=1.0).contains(&self.min_peak_fraction) {
            return Err(AnalysisError::invalid_config(
                "min_peak_fraction must lie in [0, 1]",
            ));
        }
        if !(0.0..1.0).contains(&self.min_drop_ratio) {
            return Err(AnalysisError::invalid_config(
                "min_drop_ratio must lie in [0, 1)",
            ));
        }
        if !(0.0..=180.0).contains(&self.arm_extension_angle) {
            return Err(AnalysisError::invalid_config(
                "arm_extension_angle must lie in [0, 180]",
            ));
        }
        if self.drop_look_ahead < 2 {
            return Err(AnalysisError::invalid_config(
                "drop_look_ahead must be at least 2",
            ));
        }
        Ok(())
    }

    /// Minimum release height for the given throw class.
    #[must_use]
    pub fn min_height(&self, class: crate::release::ThrowClass) -> f64 {
        match class {
            crate::release::ThrowClass::ShotPut => self.shot_put_min_height,
            crate::release::ThrowClass::Discus => self.discus_min_height,
        }
    }
}

impl BiomechanicsConfig {
    /// Validate the biomechanics parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.gravity <= 0.0 {
            return Err(AnalysisError::invalid_config("gravity must be positive"));
        }
        if self.min_rotation_points < 2 {
            return Err(AnalysisError::invalid_config(
                "min_rotation_points must be at least 2",
            ));
        }
        let (low, high) = self.candidate_angle_range;
        if low.is_nan() || high.is_nan() || low >= high {
            return Err(AnalysisError::invalid_config(
                "candidate_angle_range must be increasing",
            ));
        }
        Ok(())
    }
}

impl PhaseConfig {
    /// Validate the phase parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.stability_frames == 0 {
            return Err(AnalysisError::invalid_config(
                "stability_frames must be at least 1",
            ));
        }
        if self.rate_window == 0 {
            return Err(AnalysisError::invalid_config(
                "rate_window must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.preparation_window_start)
            || !(0.0..=1.0).contains(&self.preparation_window_end)
            || self.preparation_window_start >= self.preparation_window_end
        {
            return Err(AnalysisError::invalid_config(
                "preparation window must satisfy 0 <= start < end <= 1",
            ));
        }
        if self
            .fallback_fractions
            .iter()
            .any(|f| !(0.0..=1.0).contains(f))
        {
            return Err(AnalysisError::invalid_config(
                "fallback_fractions must lie in [0, 1]",
            ));
        }
        if self.release_margins.windows(2).any(|w| w[0] < w[1]) {
            return Err(AnalysisError::invalid_config(
                "release_margins must be non-increasing",
            ));
        }
        Ok(())
    }
}

impl AnalysisConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate every sub-configuration.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range parameter found.
    pub fn validate(&self) -> Result<()> {
        self.release.validate()?;
        self.biomechanics.validate()?;
        self.phases.validate()
    }

    /// Set the shot put / discus speed boundary.
    #[must_use]
    pub const fn with_class_speed_threshold(mut self, threshold: f64) -> Self {
        self.release.class_speed_threshold = threshold;
        self
    }

    /// Set the ankle takeoff height.
    #[must_use]
    pub const fn with_takeoff_height(mut self, height: f64) -> Self {
        self.phases.takeoff_height = height;
        self
    }

    /// Set the gravitational acceleration.
    #[must_use]
    pub const fn with_gravity(mut self, gravity: f64) -> Self {
        self.biomechanics.gravity = gravity;
        self
    }

    /// Set the throwing arm.
    #[must_use]
    pub const fn with_throwing_side(mut self, side: Side) -> Self {
        self.throwing_side = side;
        self
    }

    /// Set the preparation-reversal search window (fractions of length).
    #[must_use]
    pub const fn with_preparation_window(mut self, start: f64, end: f64) -> Self {
        self.phases.preparation_window_start = start;
        self.phases.preparation_window_end = end;
        self
    }
}
