//! Vector and angle geometry.
//!
//! Positions are plain `[f64; 3]` arrays at the API boundary; nalgebra
//! vectors are used internally for the dot/norm arithmetic.

use nalgebra::{Vector2, Vector3};

/// Angle at vertex `p2` of the chain `p1`-`p2`-`p3`, in degrees.
///
/// Computed between `p1 - p2` and `p3 - p2`. 180° means the chain is fully
/// extended, 0° means fully folded. Returns 0 when either vector has zero
/// length (missing or coincident markers).
///
/// # Example
///
/// ```
/// use throw_kinematics::vertex_angle;
///
/// let straight = vertex_angle(&[0.0, 0.0, 0.0], &[0.5, 0.0, 0.0], &[1.0, 0.0, 0.0]);
/// assert!((straight - 180.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn vertex_angle(p1: &[f64; 3], p2: &[f64; 3], p3: &[f64; 3]) -> f64 {
    let v1 = Vector3::from(*p1) - Vector3::from(*p2);
    let v2 = Vector3::from(*p3) - Vector3::from(*p2);

    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 == 0.0 || n2 == 0.0 {
        return 0.0;
    }

    let dot = v1.dot(&v2);

    // Collinear chains resolve exactly; acos near ±1 loses ~1e-6 degrees.
    if v1.cross(&v2) == Vector3::zeros() {
        return if dot < 0.0 { 180.0 } else { 0.0 };
    }

    let cos_angle = (dot / (n1 * n2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Angle between two planar vectors in degrees, 0 if either is zero.
#[must_use]
pub fn planar_angle_between(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let a = Vector2::from(*a);
    let b = Vector2::from(*b);

    let na = a.norm();
    let nb = b.norm();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }

    (a.dot(&b) / (na * nb)).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Angle between a vector and the vertical (+z) axis in degrees, 0 if zero.
#[must_use]
pub fn inclination_from_vertical(v: &[f64; 3]) -> f64 {
    let norm = norm3(v);
    if norm == 0.0 {
        return 0.0;
    }
    (v[2] / norm).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Euclidean norm of a 3D vector.
#[must_use]
#[inline]
pub fn norm3(v: &[f64; 3]) -> f64 {
    Vector3::from(*v).norm()
}

/// Euclidean distance between two 3D points.
#[must_use]
#[inline]
pub fn distance3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (Vector3::from(*b) - Vector3::from(*a)).norm()
}

/// Component-wise midpoint of two 3D points.
#[must_use]
pub fn midpoint3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    let m = (Vector3::from(*a) + Vector3::from(*b)) * 0.5;
    [m.x, m.y, m.z]
}

/// Polar angle of the planar (x, y) projection about the origin, in radians.
#[must_use]
#[inline]
pub fn planar_heading(p: &[f64; 3]) -> f64 {
    p[1].atan2(p[0])
}

/// Wrap an angular difference into `(-half_turn, half_turn]`.
///
/// `half_turn` is π for radians and 180 for degrees.
#[must_use]
pub fn wrap_delta(mut diff: f64, half_turn: f64) -> f64 {
    let full_turn = 2.0 * half_turn;
    while diff > half_turn {
        diff -= full_turn;
    }
    while diff <= -half_turn {
        diff += full_turn;
    }
    diff
}
