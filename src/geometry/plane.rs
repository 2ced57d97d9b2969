use crate::error::{GeometryError, Result};
use crate::math::{matrix, Point3, Tolerance, Vector3};

use super::Line;

/// An infinite plane in 3D space.
///
/// Stored in Hesse normal form: every point `x` of the plane satisfies
/// `x · normal = d`.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    point: Point3,
    normal: Vector3,
    d: f64,
    tol: Tolerance,
}

impl Plane {
    /// Creates a plane from a point on it and a normal vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn new(point: Point3, normal: Vector3, tol: Tolerance) -> Result<Self> {
        if tol.is_zero_vector(&normal) {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal.normalize();
        Ok(Self {
            point,
            normal,
            d: point.coords.dot(&normal),
            tol,
        })
    }

    /// Creates the plane through three points.
    ///
    /// The normal follows the right-hand rule over `p1 → p2 → p3`.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are collinear.
    pub fn from_points(p1: Point3, p2: Point3, p3: Point3, tol: Tolerance) -> Result<Self> {
        let normal = (p2 - p1).cross(&(p3 - p1));
        if tol.is_zero_vector(&normal) {
            return Err(GeometryError::Degenerate("plane points are collinear".into()).into());
        }
        Self::new(p1, normal, tol)
    }

    /// The XY plane through the origin, normal +Z.
    #[must_use]
    pub fn xy(tol: Tolerance) -> Self {
        Self {
            point: Point3::origin(),
            normal: Vector3::z(),
            d: 0.0,
            tol,
        }
    }

    /// Returns the reference point of the plane.
    #[must_use]
    pub fn point(&self) -> &Point3 {
        &self.point
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the signed distance of the plane from the origin.
    #[must_use]
    pub fn d(&self) -> f64 {
        self.d
    }

    #[must_use]
    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    /// Signed distance of `point`, positive on the side the normal points to.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        point.coords.dot(&self.normal) - self.d
    }

    #[must_use]
    pub fn distance(&self, point: &Point3) -> f64 {
        self.signed_distance(point).abs()
    }

    #[must_use]
    pub fn contains_point(&self, point: &Point3) -> bool {
        self.tol.almost_zero(self.signed_distance(point))
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn nearest_point_to(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    #[must_use]
    pub fn is_parallel(&self, other: &Plane) -> bool {
        self.tol.is_collinear(&self.normal, &other.normal)
    }

    #[must_use]
    pub fn is_same_as(&self, other: &Plane) -> bool {
        self.is_parallel(other) && other.contains_point(&self.point)
    }

    /// Intersection point with a line, `None` if the line runs parallel.
    #[must_use]
    pub fn intersect_line(&self, line: &Line) -> Option<Point3> {
        let denom = line.direction().dot(&self.normal);
        if self.tol.almost_zero(denom) {
            return None;
        }
        let lambda = (self.d - self.normal.dot(&line.origin().coords)) / denom;
        Some(line.point_at(lambda))
    }

    /// Intersection line with another plane, `None` for parallel planes.
    #[must_use]
    pub fn intersect_plane(&self, other: &Plane) -> Option<Line> {
        if self.is_parallel(other) {
            return None;
        }
        let (n1, n2) = (self.normal, other.normal);
        let dot = n1.dot(&n2);
        let denom = 1.0 - dot * dot;
        let f1 = (self.d - other.d * dot) / denom;
        let f2 = (other.d - self.d * dot) / denom;
        let point = Point3::from(n1 * f1 + n2 * f2);
        Line::new(point, n1.cross(&n2), self.tol).ok()
    }

    /// Three non-collinear points spanning the plane, oriented so that
    /// [`Plane::from_points`] reproduces the normal.
    #[must_use]
    pub fn three_points(&self) -> [Point3; 3] {
        let u = matrix::any_perpendicular(&self.normal);
        let v = self.normal.cross(&u);
        [self.point, self.point + u, self.point + v]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn tol() -> Tolerance {
        Tolerance::metric()
    }

    #[test]
    fn collinear_points_are_rejected() {
        let r = Plane::from_points(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0), tol());
        assert!(r.is_err());
    }

    #[test]
    fn distances() {
        let plane = Plane::new(p(0.0, 0.0, 2.0), Vector3::new(0.0, 0.0, 3.0), tol()).unwrap();
        assert!((plane.signed_distance(&p(5.0, 1.0, 5.0)) - 3.0).abs() < 1e-12);
        assert!((plane.signed_distance(&p(5.0, 1.0, -1.0)) + 3.0).abs() < 1e-12);
        assert!(plane.contains_point(&p(7.0, -3.0, 2.0)));
        let q = plane.nearest_point_to(&p(1.0, 2.0, 9.0));
        assert!((q - p(1.0, 2.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn line_intersection() {
        let plane = Plane::xy(tol());
        let line = Line::through(p(1.0, 1.0, 1.0), p(2.0, 2.0, 3.0), tol()).unwrap();
        let x = plane.intersect_line(&line).unwrap();
        assert!((x - p(0.5, 0.5, 0.0)).norm() < 1e-12);
        let flat = Line::new(p(0.0, 0.0, 1.0), Vector3::x(), tol()).unwrap();
        assert!(plane.intersect_line(&flat).is_none());
    }

    #[test]
    fn plane_intersection() {
        let a = Plane::xy(tol());
        let b = Plane::new(p(3.0, 0.0, 0.0), Vector3::x(), tol()).unwrap();
        let line = a.intersect_plane(&b).unwrap();
        assert!(line.contains_point(&p(3.0, 7.0, 0.0)));
        assert!(tol().is_collinear(line.direction(), &Vector3::y()));

        let c = Plane::new(p(0.0, 0.0, 5.0), -Vector3::z(), tol()).unwrap();
        assert!(a.intersect_plane(&c).is_none());
    }

    #[test]
    fn three_points_rebuild_the_plane() {
        let plane = Plane::new(p(1.0, 2.0, 3.0), Vector3::new(1.0, -1.0, 2.0), tol()).unwrap();
        let [a, b, c] = plane.three_points();
        let rebuilt = Plane::from_points(a, b, c, tol()).unwrap();
        assert!(rebuilt.is_same_as(&plane));
        assert!((rebuilt.normal() - plane.normal()).norm() < 1e-12);
    }
}
