use crate::error::{GeometryError, OperationError, Result};
use crate::math::{scaled_to, Affine, Point3, Tolerance, Vector3};

use super::basis::PowerBasis;
use super::{consistent_normal, svg_point, Curve};

/// Largest accepted handle length relative to the start-stop distance in
/// the `connect` constructors.
const MAX_STIFFNESS: f64 = 0.9;

fn check_stiffness(stiffness: f64) -> Result<()> {
    if stiffness > MAX_STIFFNESS || stiffness <= 0.0 {
        return Err(OperationError::InvalidInput(format!(
            "bezier stiffness {stiffness} must be in (0, {MAX_STIFFNESS}]"
        ))
        .into());
    }
    Ok(())
}

/// First point of `candidates` that differs from `from`.
fn first_distinct<'a>(from: &Point3, candidates: &[&'a Point3], tol: &Tolerance) -> Option<&'a Point3> {
    candidates.iter().copied().find(|c| !tol.same_point(from, c))
}

/// A quadratic Bezier curve.
#[derive(Debug, Clone)]
pub struct Bezier2Segment {
    start: Point3,
    handle: Point3,
    stop: Point3,
    basis: PowerBasis<3>,
    normal: Option<Vector3>,
    tol: Tolerance,
}

impl Bezier2Segment {
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if all three points coincide.
    pub fn new(start: Point3, handle: Point3, stop: Point3, tol: Tolerance) -> Result<Self> {
        if tol.same_point(&start, &stop) && tol.same_point(&start, &handle) {
            return Err(GeometryError::Degenerate("quadratic bezier collapses to a point".into()).into());
        }
        let basis = PowerBasis::quadratic(&start, &handle, &stop);
        let normal = consistent_normal(
            &basis.derivative(0.0).cross(&basis.second_derivative(0.0)),
            &basis.derivative(1.0).cross(&basis.second_derivative(1.0)),
            &tol,
        );
        Ok(Self {
            start,
            handle,
            stop,
            basis,
            normal,
            tol,
        })
    }

    /// Curve leaving `start` along `tangent`, with the handle at
    /// `stiffness` times the start-stop distance.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for a stiffness outside
    /// `(0, 0.9]` and [`GeometryError::ZeroVector`] for a zero tangent.
    pub fn connect(start: Point3, tangent: &Vector3, stop: Point3, stiffness: f64, tol: Tolerance) -> Result<Self> {
        check_stiffness(stiffness)?;
        let dist = (stop - start).norm();
        let handle = start + scaled_to(tangent, dist * stiffness)?;
        Self::new(start, handle, stop, tol)
    }

    #[must_use]
    pub fn handle(&self) -> &Point3 {
        &self.handle
    }

    /// Direction of travel at the start, also for a handle on the start.
    #[must_use]
    pub fn tangent_at_start(&self) -> Vector3 {
        first_distinct(&self.start, &[&self.handle, &self.stop], &self.tol).map_or(Vector3::zeros(), |p| p - self.start)
    }

    /// Direction of travel at the stop, also for a handle on the stop.
    #[must_use]
    pub fn tangent_at_stop(&self) -> Vector3 {
        first_distinct(&self.stop, &[&self.handle, &self.start], &self.tol).map_or(Vector3::zeros(), |p| self.stop - p)
    }

    #[must_use]
    pub fn reversed(&self) -> Bezier2Segment {
        // Same control polygon backwards, so the degeneracy check cannot fail.
        let basis = PowerBasis::quadratic(&self.stop, &self.handle, &self.start);
        Self {
            start: self.stop,
            handle: self.handle,
            stop: self.start,
            basis,
            normal: self.normal.map(|n| -n),
            tol: self.tol,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the map collapses the curve to a point.
    pub fn transformed(&self, affine: &Affine) -> Result<Bezier2Segment> {
        Self::new(
            affine.apply_point(&self.start),
            affine.apply_point(&self.handle),
            affine.apply_point(&self.stop),
            self.tol,
        )
    }

    #[must_use]
    pub fn svg_fragment(&self, decimals: usize) -> String {
        format!("Q {} {}", svg_point(&self.handle, decimals), svg_point(&self.stop, decimals))
    }
}

impl Curve for Bezier2Segment {
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

    fn second_derivative_at(&self, t: f64) -> Vector3 {
        self.basis.second_derivative(t)
    }

    fn normal(&self) -> Option<Vector3> {
        self.normal
    }

    fn direction_at(&self, t: f64) -> Vector3 {
        let d = self.basis.derivative(t);
        if !self.tol.is_zero_vector(&d) {
            d
        } else if t < 0.5 {
            self.tangent_at_start()
        } else {
            self.tangent_at_stop()
        }
    }
}

/// A cubic Bezier curve.
#[derive(Debug, Clone)]
pub struct Bezier3Segment {
    start: Point3,
    handle1: Point3,
    handle2: Point3,
    stop: Point3,
    basis: PowerBasis<4>,
    normal: Option<Vector3>,
    tol: Tolerance,
}

impl Bezier3Segment {
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if all four points coincide.
    pub fn new(start: Point3, handle1: Point3, handle2: Point3, stop: Point3, tol: Tolerance) -> Result<Self> {
        if [&handle1, &handle2, &stop].iter().all(|p| tol.same_point(&start, p)) {
            return Err(GeometryError::Degenerate("cubic bezier collapses to a point".into()).into());
        }
        let basis = PowerBasis::cubic(&start, &handle1, &handle2, &stop);
        let normal = consistent_normal(
            &basis.derivative(0.0).cross(&basis.second_derivative(0.0)),
            &basis.derivative(1.0).cross(&basis.second_derivative(1.0)),
            &tol,
        );
        Ok(Self {
            start,
            handle1,
            handle2,
            stop,
            basis,
            normal,
            tol,
        })
    }

    /// Curve leaving `start` along `tangent_start` and arriving at `stop`
    /// along `tangent_stop`; handle lengths are the stiffness times the
    /// start-stop distance.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for a stiffness outside
    /// `(0, 0.9]` and [`GeometryError::ZeroVector`] for a zero tangent.
    pub fn connect(
        start: Point3,
        tangent_start: &Vector3,
        stop: Point3,
        tangent_stop: &Vector3,
        stiffness: (f64, f64),
        tol: Tolerance,
    ) -> Result<Self> {
        check_stiffness(stiffness.0)?;
        check_stiffness(stiffness.1)?;
        let dist = (stop - start).norm();
        let handle1 = start + scaled_to(tangent_start, dist * stiffness.0)?;
        let handle2 = stop - scaled_to(tangent_stop, dist * stiffness.1)?;
        Self::new(start, handle1, handle2, stop, tol)
    }

    #[must_use]
    pub fn handle1(&self) -> &Point3 {
        &self.handle1
    }

    #[must_use]
    pub fn handle2(&self) -> &Point3 {
        &self.handle2
    }

    /// Direction of travel at the start; skips handles lying on the start.
    #[must_use]
    pub fn tangent_at_start(&self) -> Vector3 {
        first_distinct(&self.start, &[&self.handle1, &self.handle2, &self.stop], &self.tol)
            .map_or(Vector3::zeros(), |p| p - self.start)
    }

    /// Direction of travel at the stop; skips handles lying on the stop.
    #[must_use]
    pub fn tangent_at_stop(&self) -> Vector3 {
        first_distinct(&self.stop, &[&self.handle2, &self.handle1, &self.start], &self.tol)
            .map_or(Vector3::zeros(), |p| self.stop - p)
    }

    #[must_use]
    pub fn reversed(&self) -> Bezier3Segment {
        let basis = PowerBasis::cubic(&self.stop, &self.handle2, &self.handle1, &self.start);
        // Recomputed: for a non-planar curve the start torsion frame differs.
        let normal = consistent_normal(
            &basis.derivative(0.0).cross(&basis.second_derivative(0.0)),
            &basis.derivative(1.0).cross(&basis.second_derivative(1.0)),
            &self.tol,
        );
        Self {
            start: self.stop,
            handle1: self.handle2,
            handle2: self.handle1,
            stop: self.start,
            basis,
            normal,
            tol: self.tol,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the map collapses the curve to a point.
    pub fn transformed(&self, affine: &Affine) -> Result<Bezier3Segment> {
        Self::new(
            affine.apply_point(&self.start),
            affine.apply_point(&self.handle1),
            affine.apply_point(&self.handle2),
            affine.apply_point(&self.stop),
            self.tol,
        )
    }

    #[must_use]
    pub fn svg_fragment(&self, decimals: usize) -> String {
        format!(
            "C {} {} {}",
            svg_point(&self.handle1, decimals),
            svg_point(&self.handle2, decimals),
            svg_point(&self.stop, decimals)
        )
    }
}

impl Curve for Bezier3Segment {
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

    fn second_derivative_at(&self, t: f64) -> Vector3 {
        self.basis.second_derivative(t)
    }

    fn normal(&self) -> Option<Vector3> {
        self.normal
    }

    fn direction_at(&self, t: f64) -> Vector3 {
        let d = self.basis.derivative(t);
        if !self.tol.is_zero_vector(&d) {
            d
        } else if t < 0.5 {
            self.tangent_at_start()
        } else {
            self.tangent_at_stop()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn tol() -> Tolerance {
        Tolerance::metric()
    }

    #[test]
    fn collapsed_curves_are_rejected() {
        assert!(Bezier2Segment::new(p(1.0, 1.0), p(1.0, 1.0), p(1.0, 1.0), tol()).is_err());
        assert!(Bezier3Segment::new(p(1.0, 1.0), p(1.0, 1.0), p(1.0, 1.0), p(1.0, 1.0), tol()).is_err());
        assert!(Bezier3Segment::new(p(1.0, 1.0), p(1.0, 1.0), p(1.0, 1.0), p(2.0, 1.0), tol()).is_ok());
    }

    #[test]
    fn parabola_vertex_circle() {
        let q = Bezier2Segment::new(p(-1.0, 1.0), p(0.0, -1.0), p(1.0, 1.0), tol()).unwrap();
        let circle = q.osculating_circle(0.5).unwrap();
        assert_abs_diff_eq!(circle.radius, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!((circle.center - p(0.0, 0.5)).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!((circle.normal - Vector3::z()).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn s_curve_has_no_single_normal() {
        let s = Bezier3Segment::new(p(0.0, 0.0), p(1.0, 1.0), p(2.0, -1.0), p(3.0, 0.0), tol()).unwrap();
        assert!(s.normal().is_none());
        // Both halves still get circles, turning opposite ways.
        let left = s.osculating_circle(0.1).unwrap();
        let right = s.osculating_circle(0.9).unwrap();
        assert!(left.normal.z < 0.0);
        assert!(right.normal.z > 0.0);
        assert!(s.osculating_circle(0.5).is_none());
    }

    #[test]
    fn arch_keeps_its_normal() {
        let c = Bezier3Segment::new(p(0.0, 0.0), p(0.0, 1.0), p(1.0, 1.0), p(1.0, 0.0), tol()).unwrap();
        let n = c.normal().unwrap();
        assert_abs_diff_eq!((n + Vector3::z()).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!((c.reversed().normal().unwrap() - Vector3::z()).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn reversal_runs_backwards() {
        let c = Bezier3Segment::new(p(0.0, 100.0), p(0.0, 0.0), p(80.0, 0.0), p(100.0, 90.0), tol()).unwrap();
        let r = c.reversed();
        for k in 0..=10 {
            let t = f64::from(k) / 10.0;
            assert_abs_diff_eq!((r.point_at(t) - c.point_at(1.0 - t)).norm(), 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!((r.tangent_at(t) + c.tangent_at(1.0 - t)).norm(), 0.0, epsilon = 1e-9);
        }
        let q = Bezier2Segment::new(p(0.0, 0.0), p(1.0, 2.0), p(2.0, 0.0), tol()).unwrap();
        assert_abs_diff_eq!((q.reversed().point_at(0.3) - q.point_at(0.7)).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_handles_fall_back_to_next_point() {
        let c = Bezier3Segment::new(p(0.0, 0.0), p(0.0, 0.0), p(1.0, 1.0), p(2.0, 0.0), tol()).unwrap();
        assert_abs_diff_eq!((c.tangent_at_start() - Vector3::new(1.0, 1.0, 0.0)).norm(), 0.0, epsilon = 1e-12);
        assert!(c.tangent_at(0.0).norm() < 1e-12);
        let dir = c.direction_at(0.0);
        assert_abs_diff_eq!((dir - Vector3::new(1.0, 1.0, 0.0)).norm(), 0.0, epsilon = 1e-12);

        let q = Bezier2Segment::new(p(0.0, 0.0), p(2.0, 0.0), p(2.0, 0.0), tol()).unwrap();
        assert_abs_diff_eq!((q.tangent_at_stop() - Vector3::new(2.0, 0.0, 0.0)).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn connect_places_handles_along_tangents() {
        let c = Bezier3Segment::connect(p(0.0, 0.0), &Vector3::y(), p(10.0, 0.0), &(-Vector3::y()), (0.5, 0.25), tol())
            .unwrap();
        assert_abs_diff_eq!((c.handle1() - p(0.0, 5.0)).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!((c.handle2() - p(10.0, 2.5)).norm(), 0.0, epsilon = 1e-12);
        let q = Bezier2Segment::connect(p(0.0, 0.0), &Vector3::x(), p(0.0, 4.0), 0.5, tol()).unwrap();
        assert_abs_diff_eq!((q.handle() - p(2.0, 0.0)).norm(), 0.0, epsilon = 1e-12);
        assert!(Bezier2Segment::connect(p(0.0, 0.0), &Vector3::x(), p(0.0, 4.0), 0.95, tol()).is_err());
        assert!(Bezier2Segment::connect(p(0.0, 0.0), &Vector3::zeros(), p(0.0, 4.0), 0.5, tol()).is_err());
    }

    #[test]
    fn svg_fragments() {
        let q = Bezier2Segment::new(p(0.0, 0.0), p(1.0, 2.0), p(2.0, 0.0), tol()).unwrap();
        assert_eq!(q.svg_fragment(0), "Q 1,2 2,0");
        let c = Bezier3Segment::new(p(0.0, 100.0), p(0.0, 0.0), p(80.0, 0.0), p(100.0, 90.0), tol()).unwrap();
        assert_eq!(c.svg_fragment(1), "C 0.0,0.0 80.0,0.0 100.0,90.0");
    }
}
