mod arc;
mod basis;
mod bezier;
mod cnc;
mod line;

pub use arc::ArcSegment;
pub use bezier::{Bezier2Segment, Bezier3Segment};
pub use cnc::CncFitter;
pub use line::LineSegment;

use crate::error::{GeometryError, Result};
use crate::math::{minimize, Affine, Point3, Tolerance, Vector3};

/// Straight chords used by [`Segment::cnc_friendly_simple`].
const SIMPLE_CHORDS: u32 = 100;

/// Samples per segment fed into the line/arc fitter.
const CNC_SAMPLES: u32 = 1000;

/// Coarse samples before interval nesting in [`Curve::find_minimal_point`].
const SEARCH_SAMPLES: u32 = 100;

/// Best fitting circle of a curve at one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsculatingCircle {
    pub center: Point3,
    pub radius: f64,
    /// Unit normal of the circle plane; the curve turns counter-clockwise
    /// around it.
    pub normal: Vector3,
}

/// One uniform sample of a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub t: f64,
    pub point: Point3,
    pub tangent: Vector3,
    /// `None` where the curve is straight or at an inflection.
    pub circle: Option<OsculatingCircle>,
}

/// Result of a search along a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub t: f64,
    pub point: Point3,
    pub value: f64,
}

/// The differential contract shared by every segment kind.
///
/// `t` runs over `[0, 1]`; `point_at(0)` is the start and `point_at(1)` the
/// stop point. Derivatives are taken with respect to `t`.
pub trait Curve {
    fn start(&self) -> &Point3;

    fn stop(&self) -> &Point3;

    fn tolerance(&self) -> &Tolerance;

    fn point_at(&self, t: f64) -> Point3;

    fn tangent_at(&self, t: f64) -> Vector3;

    fn second_derivative_at(&self, t: f64) -> Vector3;

    /// Normal cached at construction (`tangent × second derivative` at the
    /// start), or `None` for straight curves and planar curves that turn
    /// both ways.
    fn normal(&self) -> Option<Vector3>;

    /// Direction of travel at `t`, also where the derivative vanishes.
    fn direction_at(&self, t: f64) -> Vector3 {
        self.tangent_at(t)
    }

    /// Osculating circle at `t`, `None` where the curvature vanishes.
    fn osculating_circle(&self, t: f64) -> Option<OsculatingCircle> {
        let tangent = self.tangent_at(t);
        let speed = tangent.norm();
        if speed == 0.0 {
            return None;
        }
        let cross = tangent.cross(&self.second_derivative_at(t));
        let curvature = cross.norm() / speed.powi(3);
        if self.tolerance().almost_equal_squared(curvature, 0.0) {
            return None;
        }
        let normal = match self.normal() {
            Some(n) if n.dot(&cross) > 0.0 => n,
            _ => cross.normalize(),
        };
        let radius = 1.0 / curvature;
        let towards_center = normal.cross(&tangent).normalize();
        Some(OsculatingCircle {
            center: self.point_at(t) + towards_center * radius,
            radius,
            normal,
        })
    }

    /// Points at uniform parameter steps, the stop point excluded.
    fn inter_points(&self, step: f64) -> Vec<Point3> {
        parameters(step).map(|t| self.point_at(t)).collect()
    }

    /// [`Curve::inter_points`] plus the stop point.
    fn inter_points_and_stop(&self, step: f64) -> Vec<Point3> {
        let mut points = self.inter_points(step);
        if points.last().is_none_or(|last| !self.tolerance().same_point(last, self.stop())) {
            points.push(*self.stop());
        }
        points
    }

    fn inter_points_with_tangent(&self, step: f64) -> Vec<(Point3, Vector3)> {
        parameters(step)
            .map(|t| (self.point_at(t), self.direction_at(t)))
            .collect()
    }

    fn inter_points_and_derivs(&self, step: f64) -> Vec<CurveSample> {
        parameters(step)
            .map(|t| CurveSample {
                t,
                point: self.point_at(t),
                tangent: self.direction_at(t),
                circle: self.osculating_circle(t),
            })
            .collect()
    }

    /// Parameter minimizing `f` over the curve, by coarse sampling and
    /// interval nesting.
    fn find_minimal_point<F>(&self, f: F) -> CurvePoint
    where
        F: Fn(&Point3) -> f64,
        Self: Sized,
    {
        let found = minimize::sample_then_nest(|t| f(&self.point_at(t)), 0.0, 1.0, SEARCH_SAMPLES);
        CurvePoint {
            t: found.x,
            point: self.point_at(found.x),
            value: found.value,
        }
    }

    fn find_nearest_point(&self, point: &Point3) -> CurvePoint
    where
        Self: Sized,
    {
        self.find_minimal_point(|p| (p - point).norm())
    }

    /// Nearest curve point, which must coincide with `point`.
    ///
    /// The accepted distance grows with the curve size.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NotOnCurve`] if the point is too far away.
    fn project_point(&self, point: &Point3) -> Result<CurvePoint>
    where
        Self: Sized,
    {
        let found = self.find_nearest_point(point);
        let size = (self.stop() - self.start()).norm().max(1.0);
        if found.value > self.tolerance().accuracy() * size {
            return Err(GeometryError::NotOnCurve { distance: found.value }.into());
        }
        Ok(found)
    }

    fn contains_point(&self, point: &Point3) -> bool
    where
        Self: Sized,
    {
        let found = self.find_nearest_point(point);
        self.tolerance().same_point(&found.point, point)
    }
}

/// Uniform parameters `0, step, 2·step, …` below 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parameters(step: f64) -> impl Iterator<Item = f64> {
    let count = if step > 0.0 && step <= 1.0 {
        ((1.0 / step).round() as u32).max(1)
    } else {
        1
    };
    (0..count).map(move |i| f64::from(i) / f64::from(count))
}

/// `tangent × second derivative` at the start, if it points to the same
/// side at the stop.
pub(crate) fn consistent_normal(at_start: &Vector3, at_stop: &Vector3, tol: &Tolerance) -> Option<Vector3> {
    if tol.is_zero_vector(at_start) || tol.is_zero_vector(at_stop) {
        return None;
    }
    (at_start.dot(at_stop) > 0.0).then(|| at_start.normalize())
}

/// Fixed-decimal rendering for SVG path data, without negative zero.
pub(crate) fn svg_number(value: f64, decimals: usize) -> String {
    let s = format!("{value:.decimals$}");
    if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
        s[1..].to_string()
    } else {
        s
    }
}

pub(crate) fn svg_point(p: &Point3, decimals: usize) -> String {
    format!("{},{}", svg_number(p.x, decimals), svg_number(p.y, decimals))
}

/// One piece of a path.
#[derive(Debug, Clone)]
pub enum Segment {
    Line(LineSegment),
    Bezier2(Bezier2Segment),
    Bezier3(Bezier3Segment),
    Arc(ArcSegment),
}

macro_rules! dispatch {
    ($self:expr, $seg:ident => $body:expr) => {
        match $self {
            Segment::Line($seg) => $body,
            Segment::Bezier2($seg) => $body,
            Segment::Bezier3($seg) => $body,
            Segment::Arc($seg) => $body,
        }
    };
}

impl Curve for Segment {
    fn start(&self) -> &Point3 {
        dispatch!(self, s => s.start())
    }

    fn stop(&self) -> &Point3 {
        dispatch!(self, s => s.stop())
    }

    fn tolerance(&self) -> &Tolerance {
        dispatch!(self, s => s.tolerance())
    }

    fn point_at(&self, t: f64) -> Point3 {
        dispatch!(self, s => s.point_at(t))
    }

    fn tangent_at(&self, t: f64) -> Vector3 {
        dispatch!(self, s => s.tangent_at(t))
    }

    fn second_derivative_at(&self, t: f64) -> Vector3 {
        dispatch!(self, s => s.second_derivative_at(t))
    }

    fn normal(&self) -> Option<Vector3> {
        dispatch!(self, s => s.normal())
    }

    fn direction_at(&self, t: f64) -> Vector3 {
        dispatch!(self, s => s.direction_at(t))
    }

    fn inter_points(&self, step: f64) -> Vec<Point3> {
        dispatch!(self, s => s.inter_points(step))
    }

    fn inter_points_with_tangent(&self, step: f64) -> Vec<(Point3, Vector3)> {
        dispatch!(self, s => s.inter_points_with_tangent(step))
    }

    fn contains_point(&self, point: &Point3) -> bool {
        dispatch!(self, s => s.contains_point(point))
    }
}

impl Segment {
    /// The same curve run backwards: `reversed().point_at(t) == point_at(1 - t)`.
    #[must_use]
    pub fn reversed(&self) -> Segment {
        match self {
            Segment::Line(s) => Segment::Line(s.reversed()),
            Segment::Bezier2(s) => Segment::Bezier2(s.reversed()),
            Segment::Bezier3(s) => Segment::Bezier3(s.reversed()),
            Segment::Arc(s) => Segment::Arc(s.reversed()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the map collapses the segment.
    pub fn transformed(&self, affine: &Affine) -> Result<Segment> {
        Ok(match self {
            Segment::Line(s) => Segment::Line(s.transformed(affine)?),
            Segment::Bezier2(s) => Segment::Bezier2(s.transformed(affine)?),
            Segment::Bezier3(s) => Segment::Bezier3(s.transformed(affine)?),
            Segment::Arc(s) => Segment::Arc(s.transformed(affine)?),
        })
    }

    /// Projection onto the XY plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment collapses under the projection.
    pub fn make_flat(&self) -> Result<Segment> {
        self.transformed(&flattening())
    }

    /// SVG path-data fragment continuing from the start point.
    #[must_use]
    pub fn svg_fragment(&self, decimals: usize) -> String {
        dispatch!(self, s => s.svg_fragment(decimals))
    }

    /// Control points of a NURBS description; arcs have none.
    #[must_use]
    pub fn control_points(&self) -> Option<Vec<Point3>> {
        match self {
            Segment::Line(s) => Some(vec![*s.start(), *s.stop()]),
            Segment::Bezier2(s) => Some(vec![*s.start(), *s.handle(), *s.stop()]),
            Segment::Bezier3(s) => Some(vec![*s.start(), *s.handle1(), *s.handle2(), *s.stop()]),
            Segment::Arc(_) => None,
        }
    }

    /// Approximation by straight chords.
    ///
    /// # Errors
    ///
    /// Never fails for a constructed segment; chords are built fallibly.
    pub fn cnc_friendly_simple(&self) -> Result<Vec<Segment>> {
        let tol = *self.tolerance();
        let mut points = self.inter_points_and_stop(1.0 / f64::from(SIMPLE_CHORDS));
        points.dedup_by(|b, a| tol.same_point(a, b));
        points
            .windows(2)
            .map(|w| LineSegment::new(w[0], w[1], tol).map(Segment::Line))
            .collect()
    }

    /// Approximation by lines and circular arcs deviating at most
    /// `tolerance` from the segment.
    ///
    /// Lines and circular arcs are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive tolerance or a segment outside
    /// the XY plane.
    pub fn cnc_friendly(&self, tolerance: f64) -> Result<Vec<Segment>> {
        match self {
            Segment::Line(_) => return Ok(vec![self.clone()]),
            Segment::Arc(arc) if arc.is_circle() => return Ok(vec![self.clone()]),
            _ => {}
        }
        let mut fitter = CncFitter::new(tolerance, *self.tolerance())?;
        for point in self.inter_points_and_stop(1.0 / f64::from(CNC_SAMPLES)) {
            fitter.push(point)?;
        }
        fitter.finish()
    }
}

impl From<LineSegment> for Segment {
    fn from(s: LineSegment) -> Self {
        Segment::Line(s)
    }
}

impl From<Bezier2Segment> for Segment {
    fn from(s: Bezier2Segment) -> Self {
        Segment::Bezier2(s)
    }
}

impl From<Bezier3Segment> for Segment {
    fn from(s: Bezier3Segment) -> Self {
        Segment::Bezier3(s)
    }
}

impl From<ArcSegment> for Segment {
    fn from(s: ArcSegment) -> Self {
        Segment::Arc(s)
    }
}

/// Projection onto the XY plane.
pub(crate) fn flattening() -> Affine {
    Affine::from_matrix(crate::math::matrix::scale(1.0, 1.0, 0.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parameter_steps() {
        let ts: Vec<f64> = parameters(0.25).collect();
        assert_eq!(ts, vec![0.0, 0.25, 0.5, 0.75]);
        assert_eq!(parameters(0.0).count(), 1);
        assert_eq!(parameters(0.001).count(), 1000);
    }

    #[test]
    fn svg_numbers() {
        assert_eq!(svg_number(1.23456, 2), "1.23");
        assert_eq!(svg_number(-0.0001, 2), "0.00");
        assert_eq!(svg_number(-1.5, 1), "-1.5");
        assert_eq!(svg_number(100.0, 0), "100");
    }

    #[test]
    fn inflection_has_no_cached_normal() {
        let tol = Tolerance::metric();
        let up = Vector3::new(0.0, 0.0, 2.0);
        assert!(consistent_normal(&up, &up, &tol).is_some());
        assert!(consistent_normal(&up, &(-up), &tol).is_none());
        assert!(consistent_normal(&Vector3::zeros(), &up, &tol).is_none());
    }
}
