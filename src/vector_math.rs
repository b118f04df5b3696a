//! Basic vector math helper functions.
//!
//! Projection, safe normalisation and planar magnitudes used by the
//! movement code. Every normalisation guards against near-zero and
//! non-finite input and yields the zero vector instead.

use glam::Vec3;

use crate::{KINDA_SMALL_NUMBER, SMALL_NUMBER};

/// Returns `true` when every component lies within the default tolerance.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use wallrun::vector_math::is_nearly_zero;
/// assert!(is_nearly_zero(Vec3::new(1e-5, 0.0, -1e-5)));
/// assert!(!is_nearly_zero(Vec3::new(0.1, 0.0, 0.0)));
/// ```
#[must_use]
pub fn is_nearly_zero(vector: Vec3) -> bool {
    vector.abs().max_element() <= KINDA_SMALL_NUMBER
}

/// Scalar counterpart of [`is_nearly_zero`], with the tighter
/// [`SMALL_NUMBER`] tolerance.
#[must_use]
pub const fn is_nearly_zero_scalar(value: f32) -> bool {
    value.abs() <= SMALL_NUMBER
}

/// Returns the unit vector in the direction of `vector`.
///
/// Non-finite input and vectors whose squared length is below
/// [`SMALL_NUMBER`] yield [`Vec3::ZERO`].
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use wallrun::vector_math::safe_normal;
/// let n = safe_normal(Vec3::new(3.0, 0.0, 4.0));
/// assert!((n.x - 0.6).abs() < 1e-6);
/// assert!((n.z - 0.8).abs() < 1e-6);
///
/// assert_eq!(safe_normal(Vec3::ZERO), Vec3::ZERO);
/// assert_eq!(safe_normal(Vec3::new(f32::NAN, 1.0, 0.0)), Vec3::ZERO);
/// ```
#[must_use]
pub fn safe_normal(vector: Vec3) -> Vec3 {
    if !vector.is_finite() || vector.length_squared() <= SMALL_NUMBER {
        return Vec3::ZERO;
    }
    vector.normalize_or_zero()
}

/// Normalises the horizontal (XY) part of `vector`, discarding Z.
#[must_use]
pub fn safe_normal_2d(vector: Vec3) -> Vec3 {
    safe_normal(Vec3::new(vector.x, vector.y, 0.0))
}

/// Squared length of the XY part.
#[must_use]
pub const fn size_squared_2d(vector: Vec3) -> f32 {
    vector.x * vector.x + vector.y * vector.y
}

/// Length of the XY part.
#[must_use]
pub fn size_2d(vector: Vec3) -> f32 {
    size_squared_2d(vector).sqrt()
}

/// Removes the component of `vector` along `plane_normal`.
///
/// `plane_normal` is expected to be unit length.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use wallrun::vector_math::vector_plane_project;
/// let projected = vector_plane_project(Vec3::new(300.0, 300.0, -100.0), Vec3::NEG_X);
/// assert_eq!(projected, Vec3::new(0.0, 300.0, -100.0));
/// ```
#[must_use]
pub fn vector_plane_project(vector: Vec3, plane_normal: Vec3) -> Vec3 {
    vector - plane_normal * vector.dot(plane_normal)
}
