//! Greedy reduction of a dense point stream into lines and circular arcs.

use std::f64::consts::PI;

use tracing::{debug, trace};

use crate::error::{OperationError, Result};
use crate::geometry::{Circle2, Line};
use crate::math::polygon::signed_area_2d;
use crate::math::{Point3, Tolerance};

use super::{ArcSegment, LineSegment, Segment};

/// Shape the current run is being grown as.
#[derive(Debug, Clone, Copy)]
enum RunShape {
    /// Fewer than three points, nothing fitted yet.
    Open,
    Line,
    Circle(Circle2),
}

/// Streaming line/arc fitter.
///
/// Points are pushed in curve order. The current run grows as long as it
/// stays within `tolerance` of one line or one circle; when a point breaks
/// the fit the run is emitted as a [`LineSegment`] or an [`ArcSegment`]
/// and a new run starts at its last point. Consecutive emitted segments
/// share their end points. All points must lie in the XY plane.
#[derive(Debug)]
pub struct CncFitter {
    tolerance: f64,
    tol: Tolerance,
    run: Vec<Point3>,
    shape: RunShape,
    segments: Vec<Segment>,
}

impl CncFitter {
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for a non-positive tolerance.
    pub fn new(tolerance: f64, tol: Tolerance) -> Result<Self> {
        if tolerance <= 0.0 || !tolerance.is_finite() {
            return Err(OperationError::InvalidInput(format!("cnc tolerance must be positive, got {tolerance}")).into());
        }
        Ok(Self {
            tolerance,
            tol,
            run: Vec::new(),
            shape: RunShape::Open,
            segments: Vec::new(),
        })
    }

    /// Adds the next point of the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the point leaves the XY plane or an emitted
    /// segment cannot be built.
    pub fn push(&mut self, point: Point3) -> Result<()> {
        if self.run.last().is_some_and(|last| self.tol.same_point(last, &point)) {
            return Ok(());
        }
        self.run.push(point);
        match self.run.len() {
            0..=2 => return Ok(()),
            3 => {
                self.shape = match Circle2::from_three_points(&self.run[0], &self.run[1], &self.run[2], self.tol)? {
                    Some(circle) => RunShape::Circle(circle),
                    None => RunShape::Line,
                };
                return Ok(());
            }
            _ => {}
        }

        let fits = match self.shape {
            RunShape::Open => true,
            RunShape::Line => self.still_in_line(),
            RunShape::Circle(circle) => match self.acceptable_circle(circle)? {
                Some(fitted) => {
                    self.shape = RunShape::Circle(fitted);
                    true
                }
                None => false,
            },
        };
        if !fits {
            self.run.pop();
            self.emit()?;
            let last = *self.run.last().unwrap_or(&point);
            self.run.clear();
            self.run.extend([last, point]);
            self.shape = RunShape::Open;
        }
        Ok(())
    }

    /// Emits the pending run and returns all segments.
    ///
    /// # Errors
    ///
    /// Returns an error if the last segment cannot be built, or
    /// [`OperationError::Failed`] if the points never left their start.
    pub fn finish(mut self) -> Result<Vec<Segment>> {
        if self.run.len() > 1 {
            self.emit()?;
        }
        if self.segments.is_empty() {
            return Err(OperationError::Failed("cnc fit found no distinct points".into()).into());
        }
        debug!(segments = self.segments.len(), "cnc fit finished");
        Ok(self.segments)
    }

    fn still_in_line(&self) -> bool {
        let [first, inner @ .., last] = self.run.as_slice() else {
            return true;
        };
        let Ok(line) = Line::through(*first, *last, self.tol) else {
            return false;
        };
        inner.iter().all(|p| line.distance_to(p) <= self.tolerance)
    }

    /// The given circle if the run still fits it, else one refit through
    /// the first, middle and last point.
    fn acceptable_circle(&self, circle: Circle2) -> Result<Option<Circle2>> {
        if radial_spread(&self.run, &circle) < self.tolerance {
            return Ok(Some(circle));
        }
        let [first, .., last] = self.run.as_slice() else {
            return Ok(None);
        };
        if self.run.len() > 3 {
            let mid = &self.run[self.run.len() / 2];
            if let Some(refit) = Circle2::from_three_points(first, mid, last, self.tol)? {
                if radial_spread(&self.run, &refit) < self.tolerance {
                    return Ok(Some(refit));
                }
            }
        }
        Ok(None)
    }

    fn emit(&mut self) -> Result<()> {
        if self.run.len() < 2 {
            return Ok(());
        }
        let mut fitted = Vec::new();
        self.fit_run(&self.run, &mut fitted)?;
        trace!(segments = fitted.len(), points = self.run.len(), "cnc run emitted");
        self.segments.append(&mut fitted);
        Ok(())
    }

    /// Emits `run` as one line or arc through its end points if every
    /// point stays within the tolerance of it, else halves the run.
    ///
    /// The arc lies on the circle through first, middle and last point, and
    /// the tolerance is checked against that circle.
    fn fit_run(&self, run: &[Point3], out: &mut Vec<Segment>) -> Result<()> {
        let [first, .., last] = run else {
            return Ok(());
        };
        let (first, last) = (*first, *last);
        if run.len() == 2 {
            if !self.tol.same_point(&first, &last) {
                out.push(Segment::Line(LineSegment::new(first, last, self.tol)?));
            }
            return Ok(());
        }
        if !self.tol.same_point(&first, &last) {
            let chord = Line::through(first, last, self.tol)?;
            if run.iter().all(|p| chord.distance_to(p) <= self.tolerance) {
                out.push(Segment::Line(LineSegment::new(first, last, self.tol)?));
                return Ok(());
            }
            let mid = run[run.len() / 2];
            let area = signed_area_2d(&[first, mid, last]);
            if !self.tol.almost_zero(area) {
                if let Some(circle) = Circle2::from_three_points(&first, &mid, &last, self.tol)? {
                    if radial_spread(run, &circle) < self.tolerance {
                        out.push(Segment::Arc(self.arc_on(&circle, first, last, area > 0.0)?));
                        return Ok(());
                    }
                }
            }
        }
        trace!(points = run.len(), "cnc run does not fit its end points, halving");
        let half = run.len() / 2;
        self.fit_run(&run[..=half], out)?;
        self.fit_run(&run[half..], out)
    }

    fn arc_on(&self, circle: &Circle2, first: Point3, last: Point3, sweep: bool) -> Result<ArcSegment> {
        let c = circle.center();
        let angle = |p: &Point3| (p.y - c.y).atan2(p.x - c.x);
        let span = if sweep {
            self.tol.normalize_angle(angle(&last) - angle(&first))
        } else {
            self.tol.normalize_angle(angle(&first) - angle(&last))
        };
        let radius = circle.radius();
        ArcSegment::from_svg(first, last, (radius, radius), 0.0, span > PI, sweep, self.tol)
    }
}

/// Difference of the largest and smallest distance to the circle center.
fn radial_spread(run: &[Point3], circle: &Circle2) -> f64 {
    let (min, max) = run
        .iter()
        .map(|p| (p - circle.center()).norm())
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), r| (lo.min(r), hi.max(r)));
    max - min
}
