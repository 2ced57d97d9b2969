use crate::error::{GeometryError, Result};
use crate::math::{Point3, Tolerance, Vector3};

use super::Plane;

/// An infinite line defined by an origin point and a unit direction.
///
/// The parametric form is: `P(λ) = origin + λ * direction`.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    origin: Point3,
    direction: Vector3,
    tol: Tolerance,
}

impl Line {
    /// Creates a new line from an origin and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is (almost) zero-length.
    pub fn new(origin: Point3, direction: Vector3, tol: Tolerance) -> Result<Self> {
        if tol.is_zero_vector(&direction) {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction.normalize(),
            tol,
        })
    }

    /// Creates the line running through two points, directed from `p1` to `p2`.
    ///
    /// # Errors
    ///
    /// Returns an error if both points coincide.
    pub fn through(p1: Point3, p2: Point3, tol: Tolerance) -> Result<Self> {
        if tol.same_point(&p1, &p2) {
            return Err(GeometryError::Degenerate("line points must be different".into()).into());
        }
        Self::new(p1, p2 - p1, tol)
    }

    /// Returns the origin point of the line.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction vector of the line.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    #[must_use]
    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    /// Point at signed distance `lambda` from the origin.
    #[must_use]
    pub fn point_at(&self, lambda: f64) -> Point3 {
        self.origin + self.direction * lambda
    }

    /// Parameter of a point on the line, `None` if the point is off the line.
    #[must_use]
    pub fn param_for_point(&self, point: &Point3) -> Option<f64> {
        if !self.contains_point(point) {
            return None;
        }
        Some((point - self.origin).dot(&self.direction))
    }

    #[must_use]
    pub fn contains_point(&self, point: &Point3) -> bool {
        if self.tol.same_point(point, &self.origin) {
            return true;
        }
        self.tol.is_collinear(&(point - self.origin), &self.direction)
    }

    /// Returns true if the point lies on the line between `from` and `to`.
    #[must_use]
    pub fn lies_between(&self, from: &Point3, to: &Point3, point: &Point3) -> bool {
        if !self.contains_point(point) {
            return false;
        }
        let edge = (to - from).norm();
        (point - from).norm() + (point - to).norm() < edge + self.tol.accuracy()
    }

    #[must_use]
    pub fn is_parallel(&self, other: &Line) -> bool {
        self.tol.is_collinear(&self.direction, &other.direction)
    }

    /// Two lines are the same if they are parallel and share a point.
    #[must_use]
    pub fn is_same_as(&self, other: &Line) -> bool {
        self.is_parallel(other) && other.contains_point(&self.origin)
    }

    /// Foot of the perpendicular from `point` onto the line.
    #[must_use]
    pub fn nearest_point_to(&self, point: &Point3) -> Point3 {
        let lambda = (point - self.origin).dot(&self.direction);
        self.point_at(lambda)
    }

    #[must_use]
    pub fn distance_to(&self, point: &Point3) -> f64 {
        (point - self.nearest_point_to(point)).norm()
    }

    /// The pair of points (one on each line) that are closest to each other.
    ///
    /// Coincident lines yield the own origin twice; parallel lines yield the
    /// own origin and its foot on `other`.
    #[must_use]
    pub fn nearest_points_to_line(&self, other: &Line) -> (Point3, Point3) {
        if self.is_same_as(other) {
            return (self.origin, self.origin);
        }
        let connection = self.direction.cross(&other.direction);
        if self.tol.is_zero_vector(&connection) {
            return (self.origin, other.nearest_point_to(&self.origin));
        }
        // The plane spanned by this line and the connecting direction cuts
        // the other line in its closest point.
        let helper_normal = self.direction.cross(&connection);
        let on_other = match Plane::new(self.origin, helper_normal, self.tol) {
            Ok(plane) => plane.intersect_line(other),
            Err(_) => None,
        };
        match on_other {
            Some(f2) => (self.nearest_point_to(&f2), f2),
            None => (self.origin, other.nearest_point_to(&self.origin)),
        }
    }

    /// Intersection point with another line, `None` for skew or parallel
    /// lines.
    #[must_use]
    pub fn intersect_line(&self, other: &Line) -> Option<Point3> {
        if self.is_parallel(other) {
            return if self.is_same_as(other) {
                Some(self.origin)
            } else {
                None
            };
        }
        let (p1, p2) = self.nearest_points_to_line(other);
        self.tol.same_point(&p1, &p2).then_some(p1)
    }

    /// Line through `point`, lying in `plane` and perpendicular to this line.
    ///
    /// # Errors
    ///
    /// Returns an error if this line is perpendicular to the plane.
    pub fn perpendicular_through(&self, point: Point3, plane: &Plane) -> Result<Line> {
        Line::new(point, self.direction.cross(plane.normal()), self.tol)
    }

    /// The same line shifted by `offset`.
    #[must_use]
    pub fn shifted_by(&self, offset: &Vector3) -> Line {
        Self {
            origin: self.origin + offset,
            ..*self
        }
    }
}
