//! Elliptical arcs in the SVG sense: an ellipse, two end points, and the
//! large-arc and sweep flags choosing one of the four candidate arcs.

use std::f64::consts::{PI, TAU};

use tracing::{debug, warn};

use crate::error::{GeometryError, Result};
use crate::geometry::Ellipse3;
use crate::math::{Affine, Point3, Tolerance, Vector3};

use super::{svg_number, svg_point, Curve};

/// Radicand values in `(-RADICAND_BAND, 0)` are rounding noise of the
/// center construction and treated as zero.
const RADICAND_BAND: f64 = 1e-10;

/// An arc of an [`Ellipse3`].
///
/// `point_at(t)` is the ellipse point at angle `start_angle + t * delta`.
/// `sweep` says whether `delta` is positive, i.e. whether the arc runs
/// counter-clockwise around the ellipse normal. It is stored rather than
/// read off `delta` so that half ellipses, where both directions have the
/// same span, keep their direction through reversal and transformation.
#[derive(Debug, Clone)]
pub struct ArcSegment {
    start: Point3,
    stop: Point3,
    ellipse: Ellipse3,
    start_angle: f64,
    delta: f64,
    large_arc: bool,
    sweep: bool,
    tol: Tolerance,
}

impl ArcSegment {
    /// Builds an arc from SVG endpoint parameters.
    ///
    /// `radii` are the x and y radii and `x_rotation` the axis rotation in
    /// degrees; `sweep` selects the positive angle direction of the XY
    /// plane. Radii too small to connect both points are scaled up
    /// uniformly. The arc lies in the plane `z = start.z`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Unsupported`] for a rotated ellipse,
    /// [`GeometryError::Degenerate`] for a zero radius or coincident end
    /// points, and [`GeometryError::SelfTest`] if the constructed arc does
    /// not reproduce its end points.
    pub fn from_svg(
        start: Point3,
        stop: Point3,
        radii: (f64, f64),
        x_rotation: f64,
        large_arc: bool,
        sweep: bool,
        tol: Tolerance,
    ) -> Result<Self> {
        if !tol.almost_zero(x_rotation) {
            return Err(GeometryError::Unsupported(format!("arc with x-axis rotation {x_rotation}°")).into());
        }
        let (mut rx, mut ry) = (radii.0.abs(), radii.1.abs());
        if rx == 0.0 || ry == 0.0 || tol.almost_zero(rx) || tol.almost_zero(ry) {
            return Err(GeometryError::Degenerate("arc radius is zero".into()).into());
        }
        if tol.same_point(&start, &stop) {
            return Err(GeometryError::Degenerate("arc end points coincide".into()).into());
        }

        // Midpoint-centered coordinates; without rotation no unrotation is needed.
        let x1 = (start.x - stop.x) / 2.0;
        let y1 = (start.y - stop.y) / 2.0;
        let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
        if lambda > 1.0 {
            let scale = lambda.sqrt();
            debug!(rx, ry, scale, "arc radii too small for end points, scaling up");
            rx *= scale;
            ry *= scale;
        }
        let (rx2, ry2) = (rx * rx, ry * ry);
        let den = rx2 * y1 * y1 + ry2 * x1 * x1;
        let mut radicand = (rx2 * ry2 - den) / den;
        if radicand < 0.0 {
            if radicand > -RADICAND_BAND {
                radicand = 0.0;
            } else {
                return Err(GeometryError::Degenerate(format!("negative arc radicand {radicand}")).into());
            }
        }
        let root = if large_arc == sweep { -radicand.sqrt() } else { radicand.sqrt() };
        let cx = root * rx * y1 / ry + (start.x + stop.x) / 2.0;
        let cy = -root * ry * x1 / rx + (start.y + stop.y) / 2.0;

        let center = Point3::new(cx, cy, start.z);
        let ellipse = Ellipse3::new(center, Vector3::new(rx, 0.0, 0.0), Vector3::new(0.0, ry, 0.0), tol)?;
        Self::from_ellipse(ellipse, start, stop, large_arc, sweep)
    }

    /// Builds the arc of `ellipse` from `start` to `stop`.
    ///
    /// The direction comes from `sweep` alone; `large_arc` follows from the
    /// resulting span and is only kept as given for half ellipses.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NotOnCurve`] if an end point is not on the
    /// ellipse, [`GeometryError::Degenerate`] for coincident end points,
    /// and [`GeometryError::SelfTest`] if the angles do not reproduce the
    /// end points.
    pub fn from_ellipse(ellipse: Ellipse3, start: Point3, stop: Point3, large_arc: bool, sweep: bool) -> Result<Self> {
        let tol = *ellipse.tolerance();
        if tol.same_point(&start, &stop) {
            return Err(GeometryError::Degenerate("arc end points coincide".into()).into());
        }
        let start_angle = ellipse.angle_for_point(&start)?;
        let stop_angle = ellipse.angle_for_point(&stop)?;
        let span = tol.normalize_angle(stop_angle - start_angle);
        let delta = if sweep { span } else { span - TAU };

        let derived_large = delta.abs() > PI;
        let large = if tol.almost_equal(delta.abs(), PI) {
            large_arc
        } else {
            if derived_large != large_arc {
                warn!(large_arc, delta, "large-arc flag contradicts arc span, using span");
            }
            derived_large
        };

        let arc = Self {
            start,
            stop,
            ellipse,
            start_angle,
            delta,
            large_arc: large,
            sweep,
            tol,
        };
        arc.self_test(stop_angle)?;
        Ok(arc)
    }

    fn self_test(&self, stop_angle: f64) -> Result<()> {
        if !self.tol.same_point(&self.ellipse.point_for_angle(self.start_angle), &self.start) {
            return Err(GeometryError::SelfTest("arc start is not on its ellipse".into()).into());
        }
        if !self.tol.same_point(&self.ellipse.point_for_angle(self.start_angle + self.delta), &self.stop) {
            return Err(GeometryError::SelfTest("arc stop is not on its ellipse".into()).into());
        }
        if !self.tol.almost_equal_angles(self.start_angle + self.delta, stop_angle) {
            return Err(GeometryError::SelfTest("arc angles do not add up".into()).into());
        }
        Ok(())
    }

    #[must_use]
    pub fn ellipse(&self) -> &Ellipse3 {
        &self.ellipse
    }

    #[must_use]
    pub fn center(&self) -> &Point3 {
        self.ellipse.center()
    }

    #[must_use]
    pub fn radii(&self) -> (f64, f64) {
        self.ellipse.radii()
    }

    /// Ellipse angle of the start point, in `[0, 2π)`.
    #[must_use]
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// Signed span in `(-2π, 2π)`; positive when `sweep` is set.
    #[must_use]
    pub fn delta_angle(&self) -> f64 {
        self.delta
    }

    #[must_use]
    pub fn stop_angle(&self) -> f64 {
        self.tol.normalize_angle(self.start_angle + self.delta)
    }

    #[must_use]
    pub fn is_circle(&self) -> bool {
        self.ellipse.is_circle()
    }

    #[must_use]
    pub fn large_arc(&self) -> bool {
        self.large_arc
    }

    /// Direction around the ellipse normal.
    #[must_use]
    pub fn sweep(&self) -> bool {
        self.sweep
    }

    /// SVG sweep flag, i.e. the direction seen from +Z.
    #[must_use]
    pub fn svg_sweep(&self) -> bool {
        self.sweep != (self.ellipse.normal().z < 0.0)
    }

    #[must_use]
    pub fn reversed(&self) -> ArcSegment {
        Self {
            start: self.stop,
            stop: self.start,
            ellipse: self.ellipse,
            start_angle: self.stop_angle(),
            delta: -self.delta,
            large_arc: self.large_arc,
            sweep: !self.sweep,
            tol: self.tol,
        }
    }

    /// Image under an affine map.
    ///
    /// The image ellipse gets freshly computed principal axes. Its
    /// parameter may run the other way than the mapped curve (mirrors);
    /// the sweep flag is inverted in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if the map collapses the ellipse or the rebuilt arc
    /// fails its self test.
    pub fn transformed(&self, affine: &Affine) -> Result<ArcSegment> {
        let ellipse = self.ellipse.transformed(affine)?;
        let mapped_orientation =
            affine.apply_vector(self.ellipse.diam1()).cross(&affine.apply_vector(self.ellipse.diam2()));
        let flipped = mapped_orientation.dot(&ellipse.normal()) < 0.0;
        Self::from_ellipse(
            ellipse,
            affine.apply_point(&self.start),
            affine.apply_point(&self.stop),
            self.large_arc,
            self.sweep != flipped,
        )
    }

    /// `A rx ry angle large-arc sweep x,y`, the flags as seen from +Z.
    #[must_use]
    pub fn svg_fragment(&self, decimals: usize) -> String {
        let (a, b) = self.ellipse.radii();
        let d1 = self.ellipse.diam1();
        let (rx, ry, angle) = if self.is_circle() || self.tol.almost_zero(d1.y) {
            (a, b, 0.0)
        } else if self.tol.almost_zero(d1.x) {
            (b, a, 0.0)
        } else {
            (a, b, d1.y.atan2(d1.x).to_degrees())
        };
        format!(
            "A {} {} {} {} {} {}",
            svg_number(rx, decimals),
            svg_number(ry, decimals),
            svg_number(angle, decimals),
            u8::from(self.large_arc),
            u8::from(self.svg_sweep()),
            svg_point(&self.stop, decimals)
        )
    }
}

impl Curve for ArcSegment {
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
        self.ellipse.point_for_angle(self.start_angle + t * self.delta)
    }

    fn tangent_at(&self, t: f64) -> Vector3 {
        self.ellipse.tangent_for_angle(self.start_angle + t * self.delta) * self.delta
    }

    fn second_derivative_at(&self, t: f64) -> Vector3 {
        self.ellipse.second_derivative_for_angle(self.start_angle + t * self.delta) * (self.delta * self.delta)
    }

    /// Tangent × second derivative is `delta³ · diam1 × diam2`.
    fn normal(&self) -> Option<Vector3> {
        let n = self.ellipse.normal();
        Some(if self.delta < 0.0 { -n } else { n })
    }

    fn contains_point(&self, point: &Point3) -> bool {
        if !self.ellipse.contains_point(point) {
            return false;
        }
        let Ok(angle) = self.ellipse.angle_for_point(point) else {
            return false;
        };
        let travelled = if self.delta > 0.0 {
            self.tol.normalize_angle(angle - self.start_angle)
        } else {
            self.tol.normalize_angle(self.start_angle - angle)
        };
        let (_, b) = self.ellipse.radii();
        let slack = self.tol.accuracy() / b;
        travelled <= self.delta.abs() + slack || travelled >= TAU - slack
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::matrix::{self, Axis};
    use crate::math::Matrix3;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn tol() -> Tolerance {
        Tolerance::metric()
    }

    fn arc(start: Point3, stop: Point3, r: f64, large: bool, sweep: bool) -> ArcSegment {
        ArcSegment::from_svg(start, stop, (r, r), 0.0, large, sweep, tol()).unwrap()
    }

    fn assert_same_curve(a: &ArcSegment, b: &ArcSegment) {
        for k in 0..=8 {
            let t = f64::from(k) / 8.0;
            assert_abs_diff_eq!((a.point_at(t) - b.point_at(t)).norm(), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn quarter_circle_center() {
        let a = arc(p(50.0, 100.0), p(0.0, 50.0), 50.0, false, false);
        assert_abs_diff_eq!((a.center() - p(0.0, 100.0)).norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a.delta_angle(), -FRAC_PI_2, epsilon = 1e-9);
        let b = arc(p(150.0, 100.0), p(100.0, 50.0), 50.0, false, true);
        assert_abs_diff_eq!((b.center() - p(150.0, 50.0)).norm(), 0.0, epsilon = 1e-9);
        assert!(b.delta_angle() > 0.0);
    }

    #[test]
    fn end_points_are_reproduced() {
        let a = arc(p(0.0, 100.0), p(100.0, 0.0), 80.0, true, false);
        assert_abs_diff_eq!((a.point_at(0.0) - p(0.0, 100.0)).norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!((a.point_at(1.0) - p(100.0, 0.0)).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn small_radii_are_scaled_to_a_half_circle() {
        let a = arc(p(0.0, 0.0), p(100.0, 0.0), 10.0, false, true);
        assert_abs_diff_eq!(a.radii().0, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!((a.center() - p(50.0, 0.0)).norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a.delta_angle(), PI, epsilon = 1e-9);
    }

    #[test]
    fn rejected_inputs() {
        let r = ArcSegment::from_svg(p(0.0, 0.0), p(10.0, 0.0), (10.0, 5.0), 30.0, false, true, tol());
        assert!(matches!(
            r,
            Err(crate::GeopathError::Geometry(GeometryError::Unsupported(_)))
        ));
        assert!(ArcSegment::from_svg(p(0.0, 0.0), p(10.0, 0.0), (0.0, 5.0), 0.0, false, true, tol()).is_err());
        assert!(ArcSegment::from_svg(p(1.0, 1.0), p(1.0, 1.0), (5.0, 5.0), 0.0, false, true, tol()).is_err());
    }

    #[test]
    fn ellipse_with_taller_y_radius() {
        let a = ArcSegment::from_svg(p(20.0, 0.0), p(0.0, 50.0), (20.0, 50.0), 0.0, false, true, tol()).unwrap();
        assert!(a.center().coords.norm() < 1e-9);
        assert_abs_diff_eq!(a.delta_angle(), FRAC_PI_2, epsilon = 1e-9);
        assert_eq!(a.svg_fragment(0), "A 20 50 0 0 1 0,50");
        // Vertex curvature radius b²/a at the end of the long axis.
        let circle = a.osculating_circle(1.0).unwrap();
        assert_abs_diff_eq!(circle.radius, 8.0, epsilon = 1e-6);
    }

    #[test]
    fn half_circle_direction_survives_reversal() {
        let a = arc(p(0.0, 100.0), p(0.0, 0.0), 50.0, false, false);
        assert_abs_diff_eq!(a.delta_angle(), -PI, epsilon = 1e-9);
        let r = a.reversed();
        assert!(r.sweep());
        assert_abs_diff_eq!(r.delta_angle(), PI, epsilon = 1e-9);
        let rr = r.reversed();
        assert!(!rr.sweep());
        assert_same_curve(&a, &rr);
        // Points of the reversed arc in reverse order.
        assert_abs_diff_eq!((r.point_at(0.25) - a.point_at(0.75)).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn mirror_flips_svg_sweep() {
        let a = arc(p(0.0, 100.0), p(0.0, 0.0), 50.0, false, false);
        let mirror = Affine::from_matrix(matrix::scale(-1.0, 1.0, 1.0));
        let m = a.transformed(&mirror).unwrap();
        assert!(m.svg_sweep());
        assert_abs_diff_eq!((m.point_at(0.5) - mirror.apply_point(&a.point_at(0.5))).norm(), 0.0, epsilon = 1e-6);
        let back = m.transformed(&mirror).unwrap();
        assert!(!back.svg_sweep());
        assert_same_curve(&a, &back);
    }

    #[test]
    fn moved_circular_arc_stays_readable_svg() {
        let a = arc(p(0.0, 0.0), p(10.0, 10.0), 10.0, false, true);
        let turn = Affine::from_matrix(matrix::euler_rotation(0.7, Axis::Z));
        let mirror = Affine::from_matrix(matrix::scale(-1.0, 1.0, 1.0));
        for image in [a.transformed(&turn).unwrap(), a.transformed(&mirror).unwrap()] {
            let fragment = image.svg_fragment(6);
            let tokens: Vec<&str> = fragment.split_whitespace().collect();
            assert_eq!(tokens.len(), 7, "{fragment}");
            assert_abs_diff_eq!(tokens[3].parse::<f64>().unwrap(), 0.0);
            let radii = (tokens[1].parse().unwrap(), tokens[2].parse().unwrap());
            let reread = ArcSegment::from_svg(
                *image.start(),
                *image.stop(),
                radii,
                tokens[3].parse().unwrap(),
                tokens[4] == "1",
                tokens[5] == "1",
                tol(),
            )
            .unwrap();
            assert_same_curve(&image, &reread);
        }
    }

    #[test]
    fn shear_round_trip() {
        let a = ArcSegment::from_svg(p(30.0, 0.0), p(0.0, 10.0), (30.0, 10.0), 0.0, true, false, tol()).unwrap();
        let shear = Affine::new(
            Matrix3::new(1.0, 0.6, 0.0, 0.2, 1.3, 0.0, 0.0, 0.0, 1.0),
            Vector3::new(5.0, -3.0, 1.0),
        );
        let image = a.transformed(&shear).unwrap();
        for k in 0..=8 {
            let t = f64::from(k) / 8.0;
            let mapped = shear.apply_point(&a.point_at(t));
            assert!(image.contains_point(&mapped));
        }
        let back = image.transformed(&shear.inverted(&tol()).unwrap()).unwrap();
        assert_same_curve(&a, &back);
    }

    #[test]
    fn rotation_into_space() {
        let a = arc(p(10.0, 0.0), p(0.0, 10.0), 10.0, false, true);
        let rot = Affine::from_matrix(matrix::euler_rotation(FRAC_PI_2, Axis::X));
        let image = a.transformed(&rot).unwrap();
        assert_abs_diff_eq!((image.point_at(1.0) - Point3::new(0.0, 0.0, 10.0)).norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!((image.point_at(0.5) - rot.apply_point(&a.point_at(0.5))).norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn containment_respects_the_span() {
        let a = arc(p(10.0, 0.0), p(0.0, 10.0), 10.0, false, true);
        assert!(a.contains_point(&p(10.0, 0.0)));
        assert!(a.contains_point(&a.point_at(0.3)));
        assert!(!a.contains_point(&p(-10.0, 0.0)));
        assert!(!a.contains_point(&p(5.0, 5.0)));
    }
}
