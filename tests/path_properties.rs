#![allow(clippy::unwrap_used)]

use std::f64::consts::PI;

use approx::assert_abs_diff_eq;
use geopath::geometry::{Line, Plane};
use geopath::math::matrix::{self, Axis};
use geopath::math::{Affine, Matrix3, Point3, Tolerance, Vector3};
use geopath::path::{MirrorAxis, Path};
use geopath::segment::{ArcSegment, Bezier2Segment, Bezier3Segment, Curve, LineSegment, Segment};

fn p(x: f64, y: f64) -> Point3 {
    Point3::new(x, y, 0.0)
}

fn tol() -> Tolerance {
    Tolerance::metric()
}

fn one_of_each() -> Vec<Segment> {
    vec![
        LineSegment::new(p(0.0, 0.0), p(30.0, 10.0), tol()).unwrap().into(),
        Bezier2Segment::new(p(30.0, 10.0), p(40.0, 40.0), p(60.0, 10.0), tol()).unwrap().into(),
        Bezier3Segment::new(p(0.0, 100.0), p(0.0, 0.0), p(80.0, 0.0), p(100.0, 90.0), tol())
            .unwrap()
            .into(),
        ArcSegment::from_svg(p(30.0, 0.0), p(0.0, 10.0), (30.0, 10.0), 0.0, true, false, tol())
            .unwrap()
            .into(),
    ]
}

fn skewing_affine() -> Affine {
    Affine::new(
        Matrix3::new(1.2, 0.5, 0.0, -0.3, 0.9, 0.0, 0.0, 0.1, 1.0),
        Vector3::new(12.0, -7.0, 3.0),
    )
}

fn assert_same_points(a: &Segment, b: &Segment, epsilon: f64) {
    for k in 0..=10 {
        let t = f64::from(k) / 10.0;
        assert_abs_diff_eq!((a.point_at(t) - b.point_at(t)).norm(), 0.0, epsilon = epsilon);
    }
}

fn assert_end_points(segment: &Segment) {
    assert!(tol().same_point(&segment.point_at(0.0), segment.start()), "{segment:?}");
    assert!(tol().same_point(&segment.point_at(1.0), segment.stop()), "{segment:?}");
}

#[test]
fn parameter_ends_are_the_end_points() {
    let affine = skewing_affine();
    for segment in one_of_each() {
        assert_end_points(&segment);
        assert_end_points(&segment.reversed());
        assert_end_points(&segment.transformed(&affine).unwrap());
    }
}

#[test]
fn reversal_is_an_involution() {
    for segment in one_of_each() {
        let reversed = segment.reversed();
        for k in 0..=10 {
            let t = f64::from(k) / 10.0;
            assert_abs_diff_eq!((reversed.point_at(t) - segment.point_at(1.0 - t)).norm(), 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(
                (reversed.tangent_at(t) + segment.tangent_at(1.0 - t)).norm(),
                0.0,
                epsilon = 1e-9
            );
        }
        let twice = reversed.reversed();
        assert_same_points(&segment, &twice, 1e-9);
        assert_abs_diff_eq!((twice.tangent_at(0.3) - segment.tangent_at(0.3)).norm(), 0.0, epsilon = 1e-9);
    }
}

#[test]
fn transform_and_inverse_restore_every_kind() {
    let affine = skewing_affine();
    let inverse = affine.inverted(&tol()).unwrap();
    for segment in one_of_each() {
        let image = segment.transformed(&affine).unwrap();
        for k in 0..=10 {
            let t = f64::from(k) / 10.0;
            // The image is the same point set, though an arc may be
            // parametrized differently.
            assert!(image.contains_point(&affine.apply_point(&segment.point_at(t))), "{segment:?} t={t}");
        }
        let back = image.transformed(&inverse).unwrap();
        assert_same_points(&segment, &back, 1e-5);
    }
}

#[test]
fn arc_flag_matrix() {
    let (start, stop) = (p(0.0, 100.0), p(100.0, 0.0));
    for large in [false, true] {
        for sweep in [false, true] {
            let arc = ArcSegment::from_svg(start, stop, (80.0, 80.0), 0.0, large, sweep, tol()).unwrap();
            assert!(arc.contains_point(&start));
            assert!(arc.contains_point(&stop));
            assert_eq!(arc.delta_angle() > 0.0, sweep);
            assert_eq!(arc.large_arc(), large);
            if large {
                assert!(arc.delta_angle().abs() >= PI);
            } else {
                assert!(arc.delta_angle().abs() <= PI);
            }
        }
    }
    // Small and large arc of the same sweep complete each other to a circle.
    let small = ArcSegment::from_svg(start, stop, (80.0, 80.0), 0.0, false, false, tol()).unwrap();
    let large = ArcSegment::from_svg(start, stop, (80.0, 80.0), 0.0, true, true, tol()).unwrap();
    assert_abs_diff_eq!((small.center() - large.center()).norm(), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(small.delta_angle() - large.delta_angle(), -2.0 * PI, epsilon = 1e-9);
}

#[test]
fn circular_arc_is_already_cnc_friendly() {
    let arc = ArcSegment::from_svg(p(10.0, 0.0), p(0.0, 10.0), (10.0, 10.0), 0.0, false, true, tol()).unwrap();
    let segment = Segment::Arc(arc);
    let fitted = segment.cnc_friendly(0.05).unwrap();
    assert_eq!(fitted.len(), 1);
    assert_same_points(&segment, &fitted[0], 1e-12);
}

#[test]
fn bezier_refit_stays_within_tolerance() {
    let curve = Bezier3Segment::new(p(0.0, 100.0), p(0.0, 0.0), p(80.0, 0.0), p(100.0, 90.0), tol()).unwrap();
    let path = Path::from_segments(vec![curve.clone().into()], tol());
    let fitted = path.cnc_friendly(0.05).unwrap();

    assert!(fitted.len() > 1);
    assert!(fitted.are_segs_connected());
    assert!(tol().same_point(&fitted.start().unwrap(), curve.start()));
    assert!(tol().same_point(&fitted.stop().unwrap(), curve.stop()));
    assert!(fitted.segments().iter().any(|s| matches!(s, Segment::Arc(_))));
    for (i, segment) in fitted.segments().iter().enumerate() {
        for k in 0..=100 {
            let q = segment.point_at(f64::from(k) / 100.0);
            let nearest = curve.find_nearest_point(&q);
            assert!(nearest.value <= 0.05, "segment {i} deviates by {}", nearest.value);
        }
    }
}

#[test]
fn osculating_circle_of_a_circular_arc() {
    let arc = ArcSegment::from_svg(p(50.0, 100.0), p(0.0, 50.0), (50.0, 50.0), 0.0, true, true, tol()).unwrap();
    let center = *arc.center();
    for k in 0..=10 {
        let circle = arc.osculating_circle(f64::from(k) / 10.0).unwrap();
        assert_abs_diff_eq!(circle.radius, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!((circle.center - center).norm(), 0.0, epsilon = 1e-9);
    }
}

#[test]
fn mirror_then_close_is_closed() {
    let half = Path::from_segments(
        vec![Bezier3Segment::new(p(0.0, 0.0), p(10.0, 30.0), p(40.0, 30.0), p(50.0, 5.0), tol())
            .unwrap()
            .into()],
        tol(),
    );
    let by_line = half.clone().supplement_by_mirror(None).unwrap().close_by_line().unwrap();
    assert!(by_line.is_closed());

    let axis = Line::new(p(0.0, -10.0), Vector3::x(), tol()).unwrap();
    let turned = half.clone().supplement_by_mirror(Some(MirrorAxis::Line(axis))).unwrap();
    assert!(turned.close_by_line().unwrap().is_closed());

    let plane = Plane::new(p(60.0, 0.0), Vector3::x(), tol()).unwrap();
    let mirrored = half.supplement_by_mirror(Some(MirrorAxis::Plane(plane))).unwrap();
    assert!(mirrored.close_by_line().unwrap().is_closed());
}

#[test]
fn half_circle_direction_survives_reverse_and_transform() {
    let original = ArcSegment::from_svg(p(0.0, 100.0), p(0.0, 0.0), (50.0, 50.0), 0.0, false, false, tol()).unwrap();
    let middle = original.point_at(0.5);
    assert_abs_diff_eq!((middle - p(50.0, 50.0)).norm(), 0.0, epsilon = 1e-9);

    let mirror = Affine::from_matrix(matrix::scale(-1.0, 1.0, 1.0));
    let turn = Affine::from_matrix(matrix::euler_rotation(0.7, Axis::Z));
    let steps: [(&str, Option<Affine>); 6] = [
        ("reverse", None),
        ("mirror", Some(mirror)),
        ("reverse", None),
        ("turn", Some(turn)),
        ("reverse", None),
        ("mirror", Some(mirror)),
    ];

    let mut arc = original.clone();
    let mut expected_middle = middle;
    for (name, step) in steps {
        arc = match step {
            None => arc.reversed(),
            Some(affine) => {
                expected_middle = affine.apply_point(&expected_middle);
                arc.transformed(&affine).unwrap()
            }
        };
        assert_abs_diff_eq!(arc.delta_angle().abs(), PI, epsilon = 1e-6);
        assert_eq!(arc.delta_angle() > 0.0, arc.sweep(), "after {name}");
        assert_abs_diff_eq!((arc.point_at(0.5) - expected_middle).norm(), 0.0, epsilon = 1e-6);
    }
}
