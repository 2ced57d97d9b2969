pub mod affine;
pub mod matrix;
pub mod minimize;
pub mod polygon;
pub mod tolerance;

pub use affine::Affine;
pub use tolerance::{Tolerance, UnitSystem};

use crate::error::{GeometryError, Result};

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix type.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Returns `v` scaled to length 1.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroVector`] for a zero-length vector.
pub fn unit(v: &Vector3) -> Result<Vector3> {
    scaled_to(v, 1.0)
}

/// Returns `v` scaled to the wanted length.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroVector`] for a zero-length vector.
pub fn scaled_to(v: &Vector3, length: f64) -> Result<Vector3> {
    let len = v.norm();
    if len == 0.0 || !len.is_finite() {
        return Err(GeometryError::ZeroVector.into());
    }
    Ok(v * (length / len))
}

/// Cross product rescaled to the given length.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroVector`] if the vectors are parallel.
pub fn cross_scaled(a: &Vector3, b: &Vector3, length: f64) -> Result<Vector3> {
    scaled_to(&a.cross(b), length)
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: &Point3, b: &Point3) -> f64 {
    (a - b).norm()
}

/// Midpoint of two points.
#[must_use]
pub fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    nalgebra::center(a, b)
}

/// Solves `a*x² + b*x + c = 0`.
///
/// Near-zero leading coefficients degrade to the linear case and a
/// near-zero discriminant yields the single double root.
#[must_use]
pub fn solve_quadratic(a: f64, b: f64, c: f64, tol: &Tolerance) -> Vec<f64> {
    if tol.almost_zero(a) {
        if tol.almost_zero(b) {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if tol.almost_zero(disc) {
        return vec![-b / (2.0 * a)];
    }
    if disc < 0.0 {
        return Vec::new();
    }
    let root = disc.sqrt();
    vec![(-b + root) / (2.0 * a), (-b - root) / (2.0 * a)]
}
