use crate::error::{GeometryError, Result};
use crate::geometry::Line;
use crate::math::{Affine, Point3, Tolerance, Vector3};

use super::basis::PowerBasis;
use super::{svg_point, Curve};

/// A straight segment.
#[derive(Debug, Clone)]
pub struct LineSegment {
    start: Point3,
    stop: Point3,
    basis: PowerBasis<2>,
    tol: Tolerance,
}

impl LineSegment {
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if both points coincide.
    pub fn new(start: Point3, stop: Point3, tol: Tolerance) -> Result<Self> {
        if tol.same_point(&start, &stop) {
            return Err(GeometryError::Degenerate("line segment has zero length".into()).into());
        }
        Ok(Self {
            start,
            stop,
            basis: PowerBasis::line(&start, &stop),
            tol,
        })
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        (self.stop - self.start).norm()
    }

    /// The infinite line carrying this segment.
    ///
    /// # Errors
    ///
    /// Never fails for a constructed segment.
    pub fn line(&self) -> Result<Line> {
        Line::through(self.start, self.stop, self.tol)
    }

    #[must_use]
    pub fn reversed(&self) -> LineSegment {
        Self {
            start: self.stop,
            stop: self.start,
            basis: PowerBasis::line(&self.stop, &self.start),
            tol: self.tol,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the map sends both ends onto one point.
    pub fn transformed(&self, affine: &Affine) -> Result<LineSegment> {
        Self::new(affine.apply_point(&self.start), affine.apply_point(&self.stop), self.tol)
    }

    #[must_use]
    pub fn svg_fragment(&self, decimals: usize) -> String {
        format!("L {}", svg_point(&self.stop, decimals))
    }
}

impl Curve for LineSegment {
    fn start(&self) -> &Point3 {
        &self.start
    }

    fn stop(&self) -> &Point3 {
        &self.stop
    }

    fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    fn point_at(&self, t: f64) -> Point3 {
        self.basis.point(t)
    }

    fn tangent_at(&self, t: f64) -> Vector3 {
        self.basis.derivative(t)
    }

    fn second_derivative_at(&self, _t: f64) -> Vector3 {
        Vector3::zeros()
    }

    fn normal(&self) -> Option<Vector3> {
        None
    }

    fn osculating_circle(&self, _t: f64) -> Option<super::OsculatingCircle> {
        None
    }

    /// A line needs no intermediate points.
    fn inter_points(&self, _step: f64) -> Vec<Point3> {
        vec![self.start]
    }

    fn inter_points_with_tangent(&self, _step: f64) -> Vec<(Point3, Vector3)> {
        vec![(self.start, self.stop - self.start)]
    }

    fn contains_point(&self, point: &Point3) -> bool {
        self.line()
            .is_ok_and(|line| line.lies_between(&self.start, &self.stop, point))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn zero_length_is_rejected() {
        let tol = Tolerance::metric();
        assert!(LineSegment::new(p(1.0, 1.0), p(1.0, 1.0005), tol).is_err());
    }

    #[test]
    fn evaluation_and_reversal() {
        let tol = Tolerance::metric();
        let seg = LineSegment::new(p(0.0, 0.0), p(4.0, 2.0), tol).unwrap();
        assert!((seg.point_at(0.5) - p(2.0, 1.0)).norm() < 1e-12);
        assert!((seg.tangent_at(0.3) - Vector3::new(4.0, 2.0, 0.0)).norm() < 1e-12);
        let rev = seg.reversed();
        assert!((rev.point_at(0.25) - seg.point_at(0.75)).norm() < 1e-12);
        assert!(seg.osculating_circle(0.5).is_none());
    }

    #[test]
    fn samples_only_the_start() {
        let seg = LineSegment::new(p(0.0, 0.0), p(4.0, 2.0), Tolerance::metric()).unwrap();
        assert_eq!(seg.inter_points(0.1).len(), 1);
        assert_eq!(seg.inter_points_and_stop(0.1).len(), 2);
    }

    #[test]
    fn containment_stays_between_ends() {
        let seg = LineSegment::new(p(0.0, 0.0), p(4.0, 2.0), Tolerance::metric()).unwrap();
        assert!(seg.contains_point(&p(2.0, 1.0)));
        assert!(!seg.contains_point(&p(6.0, 3.0)));
        assert_eq!(seg.svg_fragment(1), "L 4.0,2.0");
    }
}
