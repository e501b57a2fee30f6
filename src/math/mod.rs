//! Mathematical utilities for throw analysis.
//!
//! This module provides:
//! - [`geometry`]: joint angles, norms, planar headings
//! - [`signal`]: smoothing and windowed predicates over sample series

pub mod geometry;
pub mod signal;

pub use geometry::{norm3, vertex_angle, wrap_delta};
pub use signal::{centered_moving_average, holds_for};
