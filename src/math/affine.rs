//! Affine maps: a linear 3x3 part followed by a translation.

use std::ops::Mul;

use crate::error::{GeometryError, Result};
use crate::geometry::{Circle2, Ellipse3, Line, Plane};

use super::matrix::{self, Axis};
use super::{Matrix3, Point3, Tolerance, Vector3};

/// An affine map `x ↦ matrix · x + shift`.
///
/// Composition with `*` applies the right operand first, like matrix
/// multiplication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    matrix: Matrix3,
    shift: Vector3,
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    #[must_use]
    pub fn new(matrix: Matrix3, shift: Vector3) -> Self {
        Self { matrix, shift }
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    #[must_use]
    pub fn from_matrix(matrix: Matrix3) -> Self {
        Self::new(matrix, Vector3::zeros())
    }

    #[must_use]
    pub fn translation(shift: Vector3) -> Self {
        Self::new(Matrix3::identity(), shift)
    }

    /// Rotation by `angle` radians around `line`, counter-clockwise when
    /// looking against the line direction.
    ///
    /// # Errors
    ///
    /// Never fails for a valid line; the error path covers the basis
    /// construction.
    pub fn rotation_about_line(line: &Line, angle: f64) -> Result<Self> {
        let tol = line.tolerance();
        // Map the line direction onto Z, rotate in XY, map back.
        let base = matrix::orthonormal_basis(None, None, Some(*line.direction()), tol)?;
        let rotation = base.transpose() * matrix::euler_rotation(angle, Axis::Z) * base;
        let pivot = line.origin().coords;
        Ok(Self::new(rotation, pivot - rotation * pivot))
    }

    /// Orthonormal map sending `plane` onto the XY plane, `p0` onto the
    /// origin and `px` onto the positive X axis.
    ///
    /// # Errors
    ///
    /// Returns an error if `p0` or `px` is not on the plane or both coincide.
    pub fn morph_plane_to_xy(plane: &Plane, p0: &Point3, px: &Point3) -> Result<Self> {
        if !plane.contains_point(p0) || !plane.contains_point(px) {
            return Err(GeometryError::Degenerate("morph points must lie on the plane".into()).into());
        }
        let tol = plane.tolerance();
        if tol.same_point(p0, px) {
            return Err(GeometryError::Degenerate("morph points must be different".into()).into());
        }
        // px - p0 may be off the plane by up to the accuracy.
        let x_dir = plane.nearest_point_to(px) - plane.nearest_point_to(p0);
        let base = matrix::orthonormal_basis(Some(x_dir), None, Some(*plane.normal()), tol)?;
        Ok(Self::from_matrix(base) * Self::translation(-p0.coords))
    }

    /// Reflection at a plane.
    ///
    /// # Errors
    ///
    /// Never fails for a valid plane; the error path covers the basis
    /// construction.
    pub fn mirror(plane: &Plane) -> Result<Self> {
        let [p1, p2, _] = plane.three_points();
        let morph = Self::morph_plane_to_xy(plane, &p1, &p2)?;
        let flip = Self::from_matrix(matrix::scale(1.0, 1.0, -1.0));
        Ok(morph.inverted(plane.tolerance())? * flip * morph)
    }

    /// Reflection through a point.
    #[must_use]
    pub fn point_mirror(point: &Point3) -> Self {
        Self::new(-Matrix3::identity(), point.coords * 2.0)
    }

    #[must_use]
    pub fn matrix(&self) -> &Matrix3 {
        &self.matrix
    }

    #[must_use]
    pub fn shift(&self) -> &Vector3 {
        &self.shift
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        matrix::determinant(&self.matrix)
    }

    #[must_use]
    pub fn is_invertible(&self, tol: &Tolerance) -> bool {
        matrix::is_invertible(&self.matrix, tol)
    }

    /// Rotation or reflection (plus translation): distances are kept.
    #[must_use]
    pub fn is_orthonormal(&self, tol: &Tolerance) -> bool {
        matrix::is_orthonormal(&self.matrix, tol)
    }

    /// False for maps that turn right-handed frames into left-handed ones.
    #[must_use]
    pub fn preserves_orientation(&self) -> bool {
        self.determinant() > 0.0
    }

    #[must_use]
    pub fn is_translation(&self, tol: &Tolerance) -> bool {
        (self.matrix - Matrix3::identity()).iter().all(|v| tol.almost_zero(*v))
    }

    /// # Errors
    ///
    /// Returns [`GeometryError::NotInvertible`] for a singular linear part.
    pub fn inverted(&self, tol: &Tolerance) -> Result<Self> {
        let inv = matrix::inverted(&self.matrix, tol)?;
        Ok(Self::new(inv, -(inv * self.shift)))
    }

    #[must_use]
    pub fn apply_point(&self, point: &Point3) -> Point3 {
        Point3::from(self.matrix * point.coords + self.shift)
    }

    /// Applies the linear part only.
    #[must_use]
    pub fn apply_vector(&self, vector: &Vector3) -> Vector3 {
        self.matrix * vector
    }

    /// # Errors
    ///
    /// Returns an error if the map collapses the line direction.
    pub fn apply_line(&self, line: &Line) -> Result<Line> {
        let p1 = self.apply_point(line.origin());
        let p2 = self.apply_point(&line.point_at(1.0));
        Line::through(p1, p2, *line.tolerance())
    }

    /// # Errors
    ///
    /// Returns an error if the map collapses the plane.
    pub fn apply_plane(&self, plane: &Plane) -> Result<Plane> {
        let [p1, p2, p3] = plane.three_points();
        Plane::from_points(
            self.apply_point(&p1),
            self.apply_point(&p2),
            self.apply_point(&p3),
            *plane.tolerance(),
        )
    }

    /// Image of a circle under a map that keeps it a circle parallel to
    /// the XY plane. Other maps need [`Affine::apply_ellipse`].
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Unsupported`] if the map tilts or distorts
    /// the circle, or an error if the radius collapses.
    pub fn apply_circle2(&self, circle: &Circle2) -> Result<Circle2> {
        let tol = circle.tolerance();
        let r = circle.radius();
        let u = self.apply_vector(&(Vector3::x() * r));
        let v = self.apply_vector(&(Vector3::y() * r));
        let keeps_plane = tol.almost_zero(u.z) && tol.almost_zero(v.z);
        if !keeps_plane || !tol.almost_equal(u.norm(), v.norm()) || !tol.is_perpendicular(&u, &v) {
            return Err(GeometryError::Unsupported("map does not keep the circle an xy circle".into()).into());
        }
        Circle2::new(self.apply_point(circle.center()), u.norm(), *tol)
    }

    /// # Errors
    ///
    /// Returns an error if the map collapses the ellipse.
    pub fn apply_ellipse(&self, ellipse: &Ellipse3) -> Result<Ellipse3> {
        ellipse.transformed(self)
    }
}

impl Mul for Affine {
    type Output = Affine;

    fn mul(self, rhs: Affine) -> Affine {
        Affine::new(self.matrix * rhs.matrix, self.matrix * rhs.shift + self.shift)
    }
}

impl Mul<Point3> for Affine {
    type Output = Point3;

    fn mul(self, rhs: Point3) -> Point3 {
        self.apply_point(&rhs)
    }
}

impl Mul<&Point3> for &Affine {
    type Output = Point3;

    fn mul(self, rhs: &Point3) -> Point3 {
        self.apply_point(rhs)
    }
}
