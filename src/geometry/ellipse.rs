use std::f64::consts::{FRAC_PI_2, PI, TAU};

use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::math::{minimize, Affine, Point3, Tolerance, Vector3};

use super::Plane;

/// Samples used to bracket the principal axes of a transformed ellipse.
const AXIS_SEARCH_SAMPLES: u32 = 72;

/// An ellipse in 3D space, given by its center and two perpendicular
/// semi-diameters.
///
/// `P(θ) = center + diam1 * cos(θ) + diam2 * sin(θ)`, so θ = 0 reaches the
/// first vertex and θ = 90° the second one. `diam1` is always the longer
/// semi-diameter; the parameter runs counter-clockwise around
/// `diam1 × diam2`.
#[derive(Debug, Clone, Copy)]
pub struct Ellipse3 {
    center: Point3,
    diam1: Vector3,
    diam2: Vector3,
    a: f64,
    b: f64,
    exc: f64,
    tol: Tolerance,
}

impl Ellipse3 {
    /// Creates an ellipse from its center and two semi-diameters.
    ///
    /// The diameters may be given in any length order; if `diam2` is the
    /// longer one the pair is rotated by 90° so that the orientation
    /// `diam1 × diam2` is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if a diameter is zero or the diameters are not
    /// perpendicular.
    pub fn new(center: Point3, diam1: Vector3, diam2: Vector3, tol: Tolerance) -> Result<Self> {
        if tol.is_zero_vector(&diam1) || tol.is_zero_vector(&diam2) {
            return Err(GeometryError::Degenerate("both ellipse radii must be > 0".into()).into());
        }
        if !tol.is_perpendicular(&diam1, &diam2) {
            return Err(GeometryError::NotPerpendicular.into());
        }
        let (diam1, diam2) = if diam2.norm() > diam1.norm() {
            (diam2, -diam1)
        } else {
            (diam1, diam2)
        };
        let a = diam1.norm();
        let b = diam2.norm();
        Ok(Self {
            center,
            diam1,
            diam2,
            a,
            b,
            exc: (a * a - b * b).max(0.0).sqrt(),
            tol,
        })
    }

    /// Creates an ellipse whose parameter runs counter-clockwise around
    /// `normal`.
    ///
    /// # Errors
    ///
    /// Returns an error for the cases of [`Ellipse3::new`], or if `normal`
    /// is parallel to the ellipse plane.
    pub fn with_normal(
        center: Point3,
        diam1: Vector3,
        diam2: Vector3,
        normal: &Vector3,
        tol: Tolerance,
    ) -> Result<Self> {
        let ellipse = Self::new(center, diam1, diam2, tol)?;
        let orientation = ellipse.diam1.cross(&ellipse.diam2).dot(normal);
        if tol.almost_zero(orientation) {
            return Err(GeometryError::Degenerate("normal lies in the ellipse plane".into()).into());
        }
        if orientation < 0.0 {
            Ok(Self {
                diam2: -ellipse.diam2,
                ..ellipse
            })
        } else {
            Ok(ellipse)
        }
    }

    /// Creates an ellipse from its center and two vertices.
    ///
    /// # Errors
    ///
    /// See [`Ellipse3::new`].
    pub fn from_vertices(center: Point3, vert1: Point3, vert2: Point3, tol: Tolerance) -> Result<Self> {
        Self::new(center, vert1 - center, vert2 - center, tol)
    }

    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the longer semi-diameter.
    #[must_use]
    pub fn diam1(&self) -> &Vector3 {
        &self.diam1
    }

    /// Returns the shorter semi-diameter.
    #[must_use]
    pub fn diam2(&self) -> &Vector3 {
        &self.diam2
    }

    /// Returns the vertices at θ = 0 and θ = 90°.
    #[must_use]
    pub fn vertices(&self) -> (Point3, Point3) {
        (self.center + self.diam1, self.center + self.diam2)
    }

    /// Returns the semi-axis lengths `(a, b)` with `a >= b`.
    #[must_use]
    pub fn radii(&self) -> (f64, f64) {
        (self.a, self.b)
    }

    /// Returns the linear eccentricity (center to focus distance).
    #[must_use]
    pub fn linear_eccentricity(&self) -> f64 {
        self.exc
    }

    #[must_use]
    pub fn foci(&self) -> (Point3, Point3) {
        let offset = self.diam1 * (self.exc / self.a);
        (self.center + offset, self.center - offset)
    }

    #[must_use]
    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    /// Unit normal; the parameter runs counter-clockwise around it.
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        self.diam1.cross(&self.diam2).normalize()
    }

    /// The plane containing the ellipse, with the same normal.
    ///
    /// # Errors
    ///
    /// Never fails for a validly constructed ellipse.
    pub fn plane(&self) -> Result<Plane> {
        Plane::new(self.center, self.diam1.cross(&self.diam2), self.tol)
    }

    #[must_use]
    pub fn is_circle(&self) -> bool {
        self.tol.almost_equal(self.a, self.b)
    }

    #[must_use]
    pub fn point_for_angle(&self, angle: f64) -> Point3 {
        let (s, c) = angle.sin_cos();
        self.center + self.diam1 * c + self.diam2 * s
    }

    /// First derivative of [`Ellipse3::point_for_angle`] by the angle.
    #[must_use]
    pub fn tangent_for_angle(&self, angle: f64) -> Vector3 {
        let (s, c) = angle.sin_cos();
        -self.diam1 * s + self.diam2 * c
    }

    /// Second derivative of [`Ellipse3::point_for_angle`] by the angle.
    #[must_use]
    pub fn second_derivative_for_angle(&self, angle: f64) -> Vector3 {
        let (s, c) = angle.sin_cos();
        -self.diam1 * c - self.diam2 * s
    }

    /// Angle in `[0, 2π)` of a point on the ellipse.
    ///
    /// The angle is computed analytically and verified; if the check fails
    /// a bounded numeric search over both half turns takes over.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NotOnCurve`] if no angle reproduces the point.
    pub fn angle_for_point(&self, point: &Point3) -> Result<f64> {
        let offset = point - self.center;
        let x = offset.dot(&self.diam1) / (self.a * self.a);
        let y = offset.dot(&self.diam2) / (self.b * self.b);
        let angle = self.tol.normalize_angle(y.atan2(x));
        if self.tol.same_point(&self.point_for_angle(angle), point) {
            return Ok(angle);
        }

        debug!(x = point.x, y = point.y, z = point.z, "analytic ellipse angle rejected, searching numerically");
        let distance = |t: f64| (self.point_for_angle(t) - point).norm();
        let mut best = f64::INFINITY;
        for (lo, hi) in [(0.0, PI), (PI, TAU)] {
            let found = minimize::find_minimum(&distance, lo, hi, 1e-12);
            if found.value < self.tol.accuracy() {
                return Ok(self.tol.normalize_angle(found.x));
            }
            best = best.min(found.value);
        }
        Err(GeometryError::NotOnCurve { distance: best }.into())
    }

    /// Focal-distance test restricted to the ellipse plane.
    #[must_use]
    pub fn contains_point(&self, point: &Point3) -> bool {
        let in_plane = self.plane().is_ok_and(|plane| plane.contains_point(point));
        if !in_plane {
            return false;
        }
        let (f1, f2) = self.foci();
        self.tol.almost_zero((point - f1).norm() + (point - f2).norm() - 2.0 * self.a)
    }

    /// Same center, plane and axes (the parameter orientation is ignored).
    #[must_use]
    pub fn is_same_as(&self, other: &Ellipse3) -> bool {
        if !self.tol.same_point(&self.center, &other.center) {
            return false;
        }
        if !self.tol.is_collinear(&self.normal(), &other.normal()) {
            return false;
        }
        if !self.tol.almost_equal(self.a, other.a) || !self.tol.almost_equal(self.b, other.b) {
            return false;
        }
        self.is_circle() || self.tol.is_collinear(&self.diam1, &other.diam1)
    }

    /// Image of the ellipse under an affine map.
    ///
    /// The images of `diam1` and `diam2` are only conjugate diameters of the
    /// image; its principal axes are recovered by searching the longest
    /// radius. The result runs counter-clockwise around a normal on the
    /// same side as the mapped normal, so its parameter orientation is
    /// reversed against the mapped curve exactly when the map reverses
    /// orientation.
    ///
    /// # Errors
    ///
    /// Returns an error if the map collapses the ellipse.
    pub fn transformed(&self, affine: &Affine) -> Result<Ellipse3> {
        let center = affine.apply_point(&self.center);
        let u = affine.apply_vector(&self.diam1);
        let v = affine.apply_vector(&self.diam2);
        let span = u.cross(&v);
        if self.tol.is_zero_vector(&span) {
            return Err(GeometryError::Degenerate("affine map collapses the ellipse".into()).into());
        }
        let span = span.normalize();
        // Keep the normal on the side of the mapped normal. A projection can
        // turn the mapped normal into the image plane; then the image
        // orientation decides.
        let mapped_normal = affine.apply_vector(&self.normal());
        let side = mapped_normal.try_normalize(0.0).map_or(0.0, |n| n.dot(&span));
        let normal = if self.tol.almost_zero(side) || side > 0.0 { span } else { -span };

        let conjugate = |t: f64| u * t.cos() + v * t.sin();
        let longest = minimize::sample_then_nest(|t| -conjugate(t).norm_squared(), 0.0, PI, AXIS_SEARCH_SAMPLES);
        let diam_max = conjugate(longest.x);
        let min_len = conjugate(longest.x + FRAC_PI_2).norm();
        let diam_min = crate::math::scaled_to(&normal.cross(&diam_max), min_len)?;
        Ellipse3::new(center, diam_max, diam_min, self.tol)
    }

    /// Projection onto the XY plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the ellipse is seen edge-on from +Z.
    pub fn flattened(&self) -> Result<Ellipse3> {
        self.transformed(&Affine::from_matrix(crate::math::matrix::scale(1.0, 1.0, 0.0)))
    }
}
