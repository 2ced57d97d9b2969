use super::{Point3, Tolerance, Vector3};
use crate::error::{GeometryError, Result};

/// Computes the signed area of a polygon in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise (seen from +Z).
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Twice the vector area of a closed polygon in 3D.
///
/// Its direction is the polygon normal (right-hand rule over the point
/// order), its length twice the enclosed area.
#[must_use]
pub fn vector_area(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut va = Vector3::zeros();
    for i in 0..n {
        let a = points[i].coords;
        let b = points[(i + 1) % n].coords;
        va += a.cross(&b);
    }
    va
}

/// Unsigned area of a (planar) polygon in 3D.
#[must_use]
pub fn area(points: &[Point3]) -> f64 {
    vector_area(points).norm() / 2.0
}

/// Returns true if the polygon runs clockwise seen from the side `view`
/// points to.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] if the polygon has no area, so no
/// orientation exists.
pub fn is_clockwise(points: &[Point3], view: &Vector3, tol: &Tolerance) -> Result<bool> {
    let va = vector_area(points);
    if tol.is_zero_vector(&va) {
        return Err(GeometryError::Degenerate("polygon orientation needs a nonzero area".into()).into());
    }
    Ok(va.dot(view) < 0.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(ccw: bool) -> Vec<Point3> {
        let mut pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        if !ccw {
            pts.reverse();
        }
        pts
    }

    #[test]
    fn signed_area_ccw_square() {
        assert!((signed_area_2d(&square(true)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn signed_area_cw_square() {
        assert!((signed_area_2d(&square(false)) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area_2d(&[Point3::new(0.0, 0.0, 0.0)]).abs() < 1e-12);
        assert!(signed_area_2d(&[]).abs() < 1e-12);
    }

    #[test]
    fn area_of_tilted_square() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert!((area(&pts) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn orientation_from_view() {
        let tol = Tolerance::metric();
        let above = Vector3::z();
        let below = -Vector3::z();
        assert!(!is_clockwise(&square(true), &above, &tol).unwrap());
        assert!(is_clockwise(&square(true), &below, &tol).unwrap());
        assert!(is_clockwise(&square(false), &above, &tol).unwrap());
    }

    #[test]
    fn collinear_polygon_has_no_orientation() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(is_clockwise(&pts, &Vector3::z(), &Tolerance::metric()).is_err());
    }
}
