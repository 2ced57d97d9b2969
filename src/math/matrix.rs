//! 3x3 matrix helpers with closed-form determinant and inverse.
//!
//! Storage is [`nalgebra::Matrix3`]; the numerics here are written out
//! explicitly so that singularity checks use the session [`Tolerance`].

use crate::error::{GeometryError, Result};

use super::{Matrix3, Tolerance, Vector3};

/// Coordinate axis, used for Euler rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Unit vector along the axis.
    #[must_use]
    pub fn unit(self) -> Vector3 {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

/// Determinant by cofactor expansion along the first row.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn determinant(m: &Matrix3) -> f64 {
    let (a, b, c) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (d, e, f) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let (g, h, i) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);
    a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
}

/// A matrix is invertible if its determinant is not (almost) zero.
#[must_use]
pub fn is_invertible(m: &Matrix3, tol: &Tolerance) -> bool {
    !tol.almost_equal_squared(determinant(m), 0.0)
}

/// Inverse via adjugate divided by determinant.
///
/// # Errors
///
/// Returns [`GeometryError::NotInvertible`] for a singular matrix.
#[allow(clippy::many_single_char_names)]
pub fn inverted(m: &Matrix3, tol: &Tolerance) -> Result<Matrix3> {
    let det = determinant(m);
    if tol.almost_equal_squared(det, 0.0) {
        return Err(GeometryError::NotInvertible.into());
    }
    let (a, b, c) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (d, e, f) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let (g, h, i) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);

    #[rustfmt::skip]
    let adjugate = Matrix3::new(
        e * i - f * h, c * h - b * i, b * f - c * e,
        f * g - d * i, a * i - c * g, c * d - a * f,
        d * h - e * g, b * g - a * h, a * e - b * d,
    );
    Ok(adjugate / det)
}

/// Returns true if `m * mᵀ` is the identity within tolerance.
#[must_use]
pub fn is_orthonormal(m: &Matrix3, tol: &Tolerance) -> bool {
    let product = m * m.transpose();
    let diff = product - Matrix3::identity();
    diff.iter().all(|v| tol.almost_zero(*v))
}

/// Rotation matrix around one coordinate axis (angle in radians).
#[must_use]
pub fn euler_rotation(angle: f64, axis: Axis) -> Matrix3 {
    let (s, c) = angle.sin_cos();
    #[rustfmt::skip]
    let m = match axis {
        Axis::X => Matrix3::new(
            1.0, 0.0, 0.0,
            0.0, c,   -s,
            0.0, s,   c,
        ),
        Axis::Y => Matrix3::new(
            c,   0.0, s,
            0.0, 1.0, 0.0,
            -s,  0.0, c,
        ),
        Axis::Z => Matrix3::new(
            c,   -s,  0.0,
            s,   c,   0.0,
            0.0, 0.0, 1.0,
        ),
    };
    m
}

/// Euler angles `(ax, ay, az)` in radians of an orthonormal matrix built as
/// `Rz * Ry * Rx`.
///
/// When `|r20|` is (almost) one the decomposition is not unique (gimbal
/// lock); `ax` is then fixed to zero and the remaining freedom is put into
/// `az`.
#[must_use]
pub fn euler_angles(m: &Matrix3) -> (f64, f64, f64) {
    const GIMBAL: f64 = 0.9999;
    let r00 = m[(0, 0)];
    let r10 = m[(1, 0)];
    let r11 = m[(1, 1)];
    let r12 = m[(1, 2)];
    let r20 = m[(2, 0)];
    let r21 = m[(2, 1)];
    let r22 = m[(2, 2)];

    if r20 < GIMBAL {
        if r20 > -GIMBAL {
            let ay = (-r20).asin();
            let az = r10.atan2(r00);
            let ax = r21.atan2(r22);
            (ax, ay, az)
        } else {
            // r20 = -1
            let ay = std::f64::consts::FRAC_PI_2;
            let az = -(-r12).atan2(r11);
            (0.0, ay, az)
        }
    } else {
        // r20 = +1
        let ay = -std::f64::consts::FRAC_PI_2;
        let az = (-r12).atan2(r11);
        (0.0, ay, az)
    }
}

/// Diagonal scaling matrix.
#[must_use]
pub fn scale(fx: f64, fy: f64, fz: f64) -> Matrix3 {
    Matrix3::from_diagonal(&Vector3::new(fx, fy, fz))
}

/// Matrix mapping the source vectors onto the target vectors.
///
/// # Errors
///
/// Returns [`GeometryError::NotInvertible`] if the source vectors are
/// linearly dependent.
pub fn base_transformation(src: [Vector3; 3], trg: [Vector3; 3], tol: &Tolerance) -> Result<Matrix3> {
    let from = Matrix3::from_columns(&src);
    let to = Matrix3::from_columns(&trg);
    Ok(to * inverted(&from, tol)?)
}

/// Orthonormal matrix whose rows are the unit vectors of the given axes.
///
/// At least one axis must be given; the missing axes are completed to a
/// right-handed orthonormal base. Applying the result maps `px` (resp.
/// `py`, `pz`) onto the corresponding coordinate axis.
///
/// # Errors
///
/// Returns an error if no axis is given, an axis is zero, or the given
/// axes are not mutually perpendicular.
pub fn orthonormal_basis(
    px: Option<Vector3>,
    py: Option<Vector3>,
    pz: Option<Vector3>,
    tol: &Tolerance,
) -> Result<Matrix3> {
    let px = px.map(|v| super::unit(&v)).transpose()?;
    let py = py.map(|v| super::unit(&v)).transpose()?;
    let pz = pz.map(|v| super::unit(&v)).transpose()?;

    let given: Vec<Vector3> = [px, py, pz].iter().flatten().copied().collect();
    for (i, a) in given.iter().enumerate() {
        for b in given.iter().skip(i + 1) {
            if !tol.is_perpendicular(a, b) {
                return Err(GeometryError::NotPerpendicular.into());
            }
        }
    }

    let (tx, ty, tz) = match (px, py, pz) {
        (None, None, None) => {
            return Err(GeometryError::Degenerate("no base vector given".into()).into());
        }
        (Some(x), Some(y), _) => (x, y, x.cross(&y)),
        (Some(x), None, Some(z)) => (x, z.cross(&x), z),
        (None, Some(y), Some(z)) => (y.cross(&z), y, z),
        (Some(x), None, None) => {
            let y = any_perpendicular(&x);
            (x, y, x.cross(&y))
        }
        (None, Some(y), None) => {
            let z = any_perpendicular(&y);
            (y.cross(&z), y, z)
        }
        (None, None, Some(z)) => {
            let x = any_perpendicular(&z);
            (x, z.cross(&x), z)
        }
    };
    Ok(Matrix3::from_rows(&[tx.transpose(), ty.transpose(), tz.transpose()]))
}

/// Some unit vector perpendicular to the given unit vector.
#[must_use]
pub fn any_perpendicular(v: &Vector3) -> Vector3 {
    let reference = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&reference).normalize()
}
