//! Ordered sequences of connected segments.

use std::f64::consts::{FRAC_PI_2, PI};

use tracing::debug;

use crate::error::{PathError, Result};
use crate::geometry::{Circle2, Ellipse3, Line, Plane};
use crate::math::{polygon, Affine, Point3, Tolerance, Vector3};
use crate::segment::{ArcSegment, Curve, CurvePoint, CurveSample, LineSegment, Segment};

/// Parameter step used to sample a path for its orientation.
const ORIENTATION_STEP: f64 = 0.05;

/// A point found on a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    /// Index of the segment the point lies on.
    pub index: usize,
    pub t: f64,
    pub point: Point3,
    pub value: f64,
}

impl PathPoint {
    fn on(index: usize, found: CurvePoint) -> Self {
        Self {
            index,
            t: found.t,
            point: found.point,
            value: found.value,
        }
    }
}

/// Axis a path is mirrored at by [`Path::supplement_by_mirror`].
#[derive(Debug, Clone, Copy)]
pub enum MirrorAxis {
    /// Half turn around the line.
    Line(Line),
    /// Reflection at the plane.
    Plane(Plane),
}

/// A closed run of arcs describing a whole circle or ellipse.
#[derive(Debug, Clone, Copy)]
pub enum FullEllipse {
    Circle(Circle2),
    Ellipse(Ellipse3),
}

/// An ordered sequence of segments.
///
/// Consecutive segments are expected to connect (`stop` of one equals
/// `start` of the next within the tolerance); [`Path::push`] does not
/// enforce it so that several loops, e.g. a ring, can share one path.
/// All operations returning a `Path` build a new value.
#[derive(Debug, Clone)]
pub struct Path {
    segments: Vec<Segment>,
    tol: Tolerance,
}

impl Path {
    #[must_use]
    pub fn new(tol: Tolerance) -> Self {
        Self {
            segments: Vec::new(),
            tol,
        }
    }

    #[must_use]
    pub fn from_segments(segments: Vec<Segment>, tol: Tolerance) -> Self {
        Self { segments, tol }
    }

    /// Straight lines through `points`, closed back to the first point if
    /// `closed` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if two consecutive points coincide.
    pub fn polygon(points: &[Point3], closed: bool, tol: Tolerance) -> Result<Path> {
        let segments = points
            .windows(2)
            .map(|w| LineSegment::new(w[0], w[1], tol).map(Segment::Line))
            .collect::<Result<Vec<_>>>()?;
        let path = Self::from_segments(segments, tol);
        if closed {
            path.close_by_line()
        } else {
            Ok(path)
        }
    }

    /// Four quarter circles starting at `center + (r, 0, 0)`.
    ///
    /// `clockwise` is the direction seen from +Z.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive radius.
    pub fn full_circle(center: &Point3, radius: f64, clockwise: bool, tol: Tolerance) -> Result<Path> {
        Self::quarter_arcs(center, radius, radius, clockwise, tol)
    }

    /// Four quarter ellipses with radii along X and Y, turned by `angle`
    /// radians around the Z axis through `center`.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive radius.
    pub fn full_ellipse(
        center: &Point3,
        radius_x: f64,
        radius_y: f64,
        angle: f64,
        clockwise: bool,
        tol: Tolerance,
    ) -> Result<Path> {
        let path = Self::quarter_arcs(center, radius_x, radius_y, clockwise, tol)?;
        if tol.almost_zero(angle) {
            return Ok(path);
        }
        let axis = Line::new(*center, Vector3::z(), tol)?;
        path.transformed(&Affine::rotation_about_line(&axis, angle)?)
    }

    /// Clockwise outer circle followed by a counter-clockwise inner one.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive radius.
    pub fn full_circle_ring(center: &Point3, outer: f64, inner: f64, tol: Tolerance) -> Result<Path> {
        let mut path = Self::full_circle(center, outer, true, tol)?;
        path.segments.extend(Self::full_circle(center, inner, false, tol)?.segments);
        Ok(path)
    }

    fn quarter_arcs(center: &Point3, rx: f64, ry: f64, clockwise: bool, tol: Tolerance) -> Result<Path> {
        let mut corners: Vec<Point3> = (0..4)
            .map(|k| {
                let (s, c) = (f64::from(k) * FRAC_PI_2).sin_cos();
                center + Vector3::new(rx * c, ry * s, 0.0)
            })
            .collect();
        if clockwise {
            corners[1..].reverse();
        }
        let segments = (0..4)
            .map(|k| {
                ArcSegment::from_svg(corners[k], corners[(k + 1) % 4], (rx, ry), 0.0, false, !clockwise, tol)
                    .map(Segment::Arc)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_segments(segments, tol))
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn prepend(&mut self, segment: Segment) {
        self.segments.insert(0, segment);
    }

    fn first(&self) -> Result<&Segment> {
        self.segments.first().ok_or_else(|| PathError::Empty.into())
    }

    fn last(&self) -> Result<&Segment> {
        self.segments.last().ok_or_else(|| PathError::Empty.into())
    }

    /// # Errors
    ///
    /// Returns [`PathError::Empty`] for a path without segments.
    pub fn start(&self) -> Result<Point3> {
        Ok(*self.first()?.start())
    }

    /// # Errors
    ///
    /// Returns [`PathError::Empty`] for a path without segments.
    pub fn stop(&self) -> Result<Point3> {
        Ok(*self.last()?.stop())
    }

    /// The stop point, or the start of the last segment for a closed path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Empty`] for a path without segments.
    pub fn smart_stop(&self) -> Result<Point3> {
        let last = self.last()?;
        if self.is_closed() {
            Ok(*last.start())
        } else {
            Ok(*last.stop())
        }
    }

    /// # Errors
    ///
    /// Returns [`PathError::NotConnected`] with the index of the first
    /// segment not starting where its predecessor stops.
    pub fn check_connected(&self) -> Result<()> {
        match self
            .segments
            .windows(2)
            .position(|w| !self.tol.same_point(w[0].stop(), w[1].start()))
        {
            Some(i) => Err(PathError::NotConnected { index: i + 1 }.into()),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn are_segs_connected(&self) -> bool {
        self.check_connected().is_ok()
    }

    /// Connected, and the last segment stops at the first start.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => self.are_segs_connected() && self.tol.same_point(last.stop(), first.start()),
            _ => false,
        }
    }

    /// Orientation seen from +Z, from the sampled outline.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty path or an outline without area.
    pub fn is_clockwise(&self) -> Result<bool> {
        if self.segments.is_empty() {
            return Err(PathError::Empty.into());
        }
        polygon::is_clockwise(&self.all_inter_points(ORIENTATION_STEP), &Vector3::z(), &self.tol)
    }

    /// The path running in the wanted direction, seen from +Z.
    ///
    /// # Errors
    ///
    /// See [`Path::is_clockwise`].
    pub fn make_clockwise(self, clockwise: bool) -> Result<Path> {
        if self.is_clockwise()? == clockwise {
            Ok(self)
        } else {
            Ok(self.reversed())
        }
    }

    /// True if the path consists of arcs only.
    #[must_use]
    pub fn describes_an_ellipse(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|s| matches!(s, Segment::Arc(_)))
    }

    /// Box around all start and stop points (handles and arc bulges are
    /// not included).
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Empty`] for a path without segments.
    pub fn simple_bounding_box(&self) -> Result<(Point3, Point3)> {
        let first = *self.first()?.start();
        Ok(self
            .segments
            .iter()
            .flat_map(|s| [s.start(), s.stop()])
            .fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p))))
    }

    /// The point minimizing `f` over all segments.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Empty`] for a path without segments.
    pub fn find_minimal_point<F>(&self, f: F) -> Result<PathPoint>
    where
        F: Fn(&Point3) -> f64,
    {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| PathPoint::on(i, s.find_minimal_point(&f)))
            .min_by(|a, b| a.value.total_cmp(&b.value))
            .ok_or_else(|| PathError::Empty.into())
    }

    /// # Errors
    ///
    /// Returns [`PathError::Empty`] for a path without segments.
    pub fn find_nearest_point(&self, point: &Point3) -> Result<PathPoint> {
        self.find_minimal_point(|p| (p - point).norm())
    }

    /// Per segment, the minimum of the non-negative `f` where it reaches
    /// zero.
    #[must_use]
    pub fn find_all_points_on_path<F>(&self, f: F) -> Vec<PathPoint>
    where
        F: Fn(&Point3) -> f64,
    {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| PathPoint::on(i, s.find_minimal_point(&f)))
            .filter(|found| self.tol.almost_zero(found.value))
            .collect()
    }

    #[must_use]
    pub fn contains_point(&self, point: &Point3) -> bool {
        self.find_nearest_point(point)
            .is_ok_and(|found| self.tol.same_point(&found.point, point))
    }

    /// Same points in the opposite order.
    #[must_use]
    pub fn reversed(&self) -> Path {
        Self::from_segments(self.segments.iter().rev().map(Segment::reversed).collect(), self.tol)
    }

    /// # Errors
    ///
    /// Returns an error if the map collapses a segment.
    pub fn transformed(&self, affine: &Affine) -> Result<Path> {
        let segments = self
            .segments
            .iter()
            .map(|s| s.transformed(affine))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_segments(segments, self.tol))
    }

    /// Projection onto the XY plane.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment collapses under the projection.
    pub fn make_flat(&self) -> Result<Path> {
        let segments = self.segments.iter().map(Segment::make_flat).collect::<Result<Vec<_>>>()?;
        Ok(Self::from_segments(segments, self.tol))
    }

    /// Appends a line back to the start unless the path is closed.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Empty`] for a path without segments, or an
    /// error if the ends already meet while an inner joint is open.
    pub fn close_by_line(mut self) -> Result<Path> {
        if self.is_closed() {
            return Ok(self);
        }
        let line = LineSegment::new(self.stop()?, self.start()?, self.tol)?;
        self.segments.push(Segment::Line(line));
        Ok(self)
    }

    /// Appends the mirror image of the path, run backwards.
    ///
    /// A closed path first loses its closing segment. Without an axis the
    /// path is turned half around the line from its start to its stop,
    /// which keeps it in its plane. A line joins the image where it does
    /// not meet the path, so the result is connected; it is closed only if
    /// the start lies on the axis, and [`Path::close_by_line`] closes it.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty path, a default axis through
    /// coincident ends, or a map collapsing a segment.
    pub fn supplement_by_mirror(mut self, axis: Option<MirrorAxis>) -> Result<Path> {
        if self.is_closed() {
            self.segments.pop();
        }
        let axis = match axis {
            Some(axis) => axis,
            None => MirrorAxis::Line(Line::through(self.start()?, self.stop()?, self.tol)?),
        };
        let affine = match &axis {
            MirrorAxis::Line(line) => Affine::rotation_about_line(line, PI)?,
            MirrorAxis::Plane(plane) => Affine::mirror(plane)?,
        };
        let image = self.reversed().transformed(&affine)?;
        let (stop, image_start) = (self.stop()?, image.start()?);
        if !self.tol.same_point(&stop, &image_start) {
            self.segments.push(Segment::Line(LineSegment::new(stop, image_start, self.tol)?));
        }
        self.segments.extend(image.segments);
        Ok(self)
    }

    /// Removes closed runs of arcs on one ellipse and returns them as
    /// circles or ellipses.
    pub fn extract_full_ellipses(&mut self) -> Vec<FullEllipse> {
        let mut found = Vec::new();
        let mut remove = vec![false; self.segments.len()];
        let mut candidate: Vec<usize> = Vec::new();

        for (i, segment) in self.segments.iter().enumerate() {
            let Segment::Arc(arc) = segment else {
                candidate.clear();
                continue;
            };
            let extends = candidate.last().is_some_and(|&j| match &self.segments[j] {
                Segment::Arc(prev) => {
                    prev.ellipse().is_same_as(arc.ellipse()) && self.tol.same_point(prev.stop(), arc.start())
                }
                _ => false,
            });
            if !extends {
                candidate.clear();
            }
            candidate.push(i);

            let closes = candidate.len() > 1
                && self.tol.same_point(self.segments[candidate[0]].start(), arc.stop());
            if closes {
                for &j in &candidate {
                    remove[j] = true;
                }
                found.push(full_ellipse_of(arc));
                candidate.clear();
            }
        }

        let mut flags = remove.into_iter();
        self.segments.retain(|_| !flags.next().unwrap_or(false));
        debug!(count = found.len(), "extracted full ellipses");
        found
    }

    /// SVG path data.
    ///
    /// A move is emitted for the first segment and wherever a segment does
    /// not start at the current position; ` Z` ends a closed path.
    #[must_use]
    pub fn svg_code(&self, decimals: usize) -> String {
        let mut tokens = Vec::with_capacity(self.segments.len() * 2);
        let mut position: Option<Point3> = None;
        for segment in &self.segments {
            if position.is_none_or(|p| !self.tol.same_point(&p, segment.start())) {
                tokens.push(format!("M {}", crate::segment::svg_point(segment.start(), decimals)));
            }
            tokens.push(segment.svg_fragment(decimals));
            position = Some(*segment.stop());
        }
        let mut code = tokens.join(" ");
        if self.is_closed() {
            code.push_str(" Z");
        }
        code
    }

    /// Sampled points of all segments; shared joints appear once and an
    /// open path ends with its stop point.
    #[must_use]
    pub fn all_inter_points(&self, step: f64) -> Vec<Point3> {
        let mut points: Vec<Point3> = Vec::new();
        for segment in &self.segments {
            let fresh = segment.inter_points(step);
            if let (Some(last), Some(first)) = (points.last(), fresh.first()) {
                if self.tol.same_point(last, first) {
                    points.pop();
                }
            }
            points.extend(fresh);
        }
        if !self.is_closed() {
            if let Some(last) = self.segments.last() {
                points.push(*last.stop());
            }
        }
        points
    }

    #[must_use]
    pub fn all_inter_points_with_tangent(&self, step: f64) -> Vec<(Point3, Vector3)> {
        self.segments
            .iter()
            .flat_map(|s| s.inter_points_with_tangent(step))
            .collect()
    }

    #[must_use]
    pub fn all_inter_points_and_derivs(&self, step: f64) -> Vec<CurveSample> {
        self.segments
            .iter()
            .flat_map(|s| s.inter_points_and_derivs(step))
            .collect()
    }

    /// Polygon through `steps_per_segment` samples of each segment (lines
    /// contribute their ends only).
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive step count.
    pub fn as_polygon(&self, steps_per_segment: u32) -> Result<Path> {
        if steps_per_segment == 0 {
            return Err(crate::error::OperationError::InvalidInput("polygon needs at least one step".into()).into());
        }
        let mut points = self.all_inter_points(1.0 / f64::from(steps_per_segment));
        points.dedup_by(|b, a| self.tol.same_point(a, b));
        Self::polygon(&points, self.is_closed(), self.tol)
    }

    /// Lines and circular arcs within `tolerance` of the path.
    ///
    /// # Errors
    ///
    /// See [`Segment::cnc_friendly`].
    pub fn cnc_friendly(&self, tolerance: f64) -> Result<Path> {
        let mut segments = Vec::new();
        for segment in &self.segments {
            segments.extend(segment.cnc_friendly(tolerance)?);
        }
        debug!(before = self.segments.len(), after = segments.len(), "path made cnc friendly");
        Ok(Self::from_segments(segments, self.tol))
    }

    /// Straight chords only.
    ///
    /// # Errors
    ///
    /// See [`Segment::cnc_friendly_simple`].
    pub fn cnc_friendly_simple(&self) -> Result<Path> {
        let mut segments = Vec::new();
        for segment in &self.segments {
            segments.extend(segment.cnc_friendly_simple()?);
        }
        Ok(Self::from_segments(segments, self.tol))
    }

    /// Control points per segment, `None` if the path contains an arc.
    #[must_use]
    pub fn control_points(&self) -> Option<Vec<Vec<Point3>>> {
        self.segments.iter().map(Segment::control_points).collect()
    }
}

fn full_ellipse_of(arc: &ArcSegment) -> FullEllipse {
    let ellipse = *arc.ellipse();
    if arc.is_circle() {
        let (radius, _) = ellipse.radii();
        // Radii of a constructed ellipse are positive, so this succeeds.
        if let Ok(circle) = Circle2::new(*ellipse.center(), radius, *ellipse.tolerance()) {
            return FullEllipse::Circle(circle);
        }
    }
    FullEllipse::Ellipse(ellipse)
}
