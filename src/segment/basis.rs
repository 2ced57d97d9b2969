use crate::math::{Point3, Vector3};

/// Monomial coefficients of a polynomial curve, `P(t) = Σ a_k t^k`.
///
/// Built once from the control points so that evaluating the point and
/// both derivatives costs one Horner pass each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PowerBasis<const N: usize> {
    coeffs: [Vector3; N],
}

impl PowerBasis<2> {
    pub(crate) fn line(p0: &Point3, p1: &Point3) -> Self {
        Self {
            coeffs: [p0.coords, p1 - p0],
        }
    }
}

impl PowerBasis<3> {
    pub(crate) fn quadratic(p0: &Point3, p1: &Point3, p2: &Point3) -> Self {
        let (p0, p1, p2) = (p0.coords, p1.coords, p2.coords);
        Self {
            coeffs: [p0, (p1 - p0) * 2.0, p0 - p1 * 2.0 + p2],
        }
    }
}

impl PowerBasis<4> {
    pub(crate) fn cubic(p0: &Point3, p1: &Point3, p2: &Point3, p3: &Point3) -> Self {
        let (p0, p1, p2, p3) = (p0.coords, p1.coords, p2.coords, p3.coords);
        Self {
            coeffs: [
                p0,
                (p1 - p0) * 3.0,
                (p0 - p1 * 2.0 + p2) * 3.0,
                p3 - p0 + (p1 - p2) * 3.0,
            ],
        }
    }
}

impl<const N: usize> PowerBasis<N> {
    pub(crate) fn point(&self, t: f64) -> Point3 {
        let mut acc = Vector3::zeros();
        for c in self.coeffs.iter().rev() {
            acc = acc * t + c;
        }
        Point3::from(acc)
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn derivative(&self, t: f64) -> Vector3 {
        let mut acc = Vector3::zeros();
        for k in (1..N).rev() {
            acc = acc * t + self.coeffs[k] * k as f64;
        }
        acc
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn second_derivative(&self, t: f64) -> Vector3 {
        let mut acc = Vector3::zeros();
        for k in (2..N).rev() {
            acc = acc * t + self.coeffs[k] * (k * (k - 1)) as f64;
        }
        acc
    }
}
