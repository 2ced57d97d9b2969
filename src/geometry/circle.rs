use crate::error::{GeometryError, Result};
use crate::math::{solve_quadratic, Point3, Tolerance, Vector3};

use super::{Line, Plane};

/// A circle in the XY plane.
#[derive(Debug, Clone, Copy)]
pub struct Circle2 {
    center: Point3,
    radius: f64,
    tol: Tolerance,
}

impl Circle2 {
    /// Creates a new circle.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is not positive.
    pub fn new(center: Point3, radius: f64, tol: Tolerance) -> Result<Self> {
        if radius <= 0.0 || tol.almost_zero(radius) {
            return Err(GeometryError::Degenerate("circle radius must be positive".into()).into());
        }
        Ok(Self { center, radius, tol })
    }

    /// Circle through three points of the XY plane.
    ///
    /// Returns `Ok(None)` if the points are collinear, so no circle exists.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NotPlanar`] if a point leaves the XY plane.
    pub fn from_three_points(p1: &Point3, p2: &Point3, p3: &Point3, tol: Tolerance) -> Result<Option<Self>> {
        let off = p1.z.abs() + p2.z.abs() + p3.z.abs();
        if off > 3.0 * tol.accuracy() {
            return Err(GeometryError::NotPlanar(format!("circle points are off the xy plane by {off}")).into());
        }
        if tol.same_point(p1, p2) || tol.same_point(p2, p3) || tol.same_point(p1, p3) {
            return Ok(None);
        }
        let xy = Plane::xy(tol);
        let bisector1 = Line::through(*p1, *p2, tol)?.perpendicular_through(nalgebra::center(p1, p2), &xy)?;
        let bisector2 = Line::through(*p2, *p3, tol)?.perpendicular_through(nalgebra::center(p2, p3), &xy)?;
        if bisector1.is_parallel(&bisector2) {
            return Ok(None);
        }
        let Some(center) = bisector1.intersect_line(&bisector2) else {
            return Ok(None);
        };
        let radius = (p1 - center).norm();
        Ok(Some(Self { center, radius, tol }))
    }

    /// Returns the center of the circle.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius of the circle.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    #[must_use]
    pub fn contains_point(&self, point: &Point3) -> bool {
        self.tol.almost_equal((point - self.center).norm(), self.radius)
    }

    /// Point at `angle` radians, counter-clockwise from the +X direction.
    #[must_use]
    pub fn point_for_angle(&self, angle: f64) -> Point3 {
        let (s, c) = angle.sin_cos();
        self.center + Vector3::new(c, s, 0.0) * self.radius
    }

    #[must_use]
    pub fn is_same_as(&self, other: &Circle2) -> bool {
        self.tol.same_point(&self.center, &other.center) && self.tol.almost_equal(self.radius, other.radius)
    }

    /// Intersections with a line of the XY plane: zero, one or two points.
    #[must_use]
    pub fn intersect_line(&self, line: &Line) -> Vec<Point3> {
        // |o + λd - c|² = r² with a unit direction d.
        let offset = line.origin() - self.center;
        let b = 2.0 * line.direction().dot(&offset);
        let c = offset.norm_squared() - self.radius * self.radius;
        solve_quadratic(1.0, b, c, &self.tol)
            .into_iter()
            .map(|lambda| line.point_at(lambda))
            .collect()
    }

    /// Intersections with another circle, through their radical line.
    #[must_use]
    pub fn intersect_circle(&self, other: &Circle2) -> Vec<Point3> {
        let (x1, y1, r1) = (self.center.x, self.center.y, self.radius);
        let (x2, y2, r2) = (other.center.x, other.center.y, other.radius);
        // Radical line: a*x + b*y = c
        let a = 2.0 * (x2 - x1);
        let b = 2.0 * (y2 - y1);
        let c = r1 * r1 - x1 * x1 - y1 * y1 - r2 * r2 + x2 * x2 + y2 * y2;
        if self.tol.almost_zero(a) && self.tol.almost_zero(b) {
            return Vec::new();
        }
        let origin = if a.abs() > b.abs() {
            Point3::new(c / a, 0.0, 0.0)
        } else {
            Point3::new(0.0, c / b, 0.0)
        };
        match Line::new(origin, Vector3::new(-b, a, 0.0), self.tol) {
            Ok(radical) => self.intersect_line(&radical),
            Err(_) => Vec::new(),
        }
    }
}
