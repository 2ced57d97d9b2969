use std::f64::consts::TAU;

use super::{Point3, Vector3};

/// Accuracy wanted for lengths measured in millimetres.
const MM_ACCURACY: f64 = 0.001;

/// Millimetres per inch.
const MM_PER_INCH: f64 = 25.4;

/// Unit system all lengths of a session are measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

/// Comparison thresholds shared by every geometric value of a session.
///
/// A `Tolerance` is chosen once (metric or imperial) and then captured by
/// value by lines, planes, ellipses, segments and paths. All equality and
/// near-zero tests of the engine go through it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    units: UnitSystem,
    accuracy: f64,
    squared_accuracy: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::metric()
    }
}

impl Tolerance {
    /// Thresholds for lengths in millimetres.
    #[must_use]
    pub fn metric() -> Self {
        Self::for_units(UnitSystem::Metric)
    }

    /// Thresholds for lengths in inches.
    #[must_use]
    pub fn imperial() -> Self {
        Self::for_units(UnitSystem::Imperial)
    }

    /// Thresholds for the given unit system.
    ///
    /// The squared accuracy is intentionally coarser than `accuracy²`: it is
    /// `accuracy * 0.001` for both unit systems.
    #[must_use]
    pub fn for_units(units: UnitSystem) -> Self {
        let accuracy = match units {
            UnitSystem::Metric => MM_ACCURACY,
            UnitSystem::Imperial => MM_ACCURACY / MM_PER_INCH,
        };
        Self {
            units,
            accuracy,
            squared_accuracy: accuracy * MM_ACCURACY,
        }
    }

    /// Returns the active unit system.
    #[must_use]
    pub fn units(&self) -> UnitSystem {
        self.units
    }

    /// Returns the wanted accuracy for lengths.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Returns the wanted accuracy for squared quantities.
    #[must_use]
    pub fn squared_accuracy(&self) -> f64 {
        self.squared_accuracy
    }

    /// Converts a length given in millimetres into the active unit.
    #[must_use]
    pub fn mm(&self, millimetres: f64) -> f64 {
        match self.units {
            UnitSystem::Metric => millimetres,
            UnitSystem::Imperial => millimetres / MM_PER_INCH,
        }
    }

    #[must_use]
    pub fn almost_equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.accuracy
    }

    #[must_use]
    pub fn almost_zero(&self, value: f64) -> bool {
        value.abs() < self.accuracy
    }

    #[must_use]
    pub fn almost_equal_squared(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.squared_accuracy
    }

    /// Two points are the same if their distance is below the accuracy.
    #[must_use]
    pub fn same_point(&self, a: &Point3, b: &Point3) -> bool {
        self.almost_zero((a - b).norm())
    }

    #[must_use]
    pub fn is_zero_vector(&self, v: &Vector3) -> bool {
        self.almost_zero(v.norm())
    }

    /// Returns true if both vectors point along the same axis (either sense).
    ///
    /// Zero vectors are never collinear to anything.
    #[must_use]
    pub fn is_collinear(&self, a: &Vector3, b: &Vector3) -> bool {
        match (a.try_normalize(0.0), b.try_normalize(0.0)) {
            (Some(ua), Some(ub)) => self.almost_equal_squared(ua.dot(&ub).abs(), 1.0),
            _ => false,
        }
    }

    /// Returns true if the vectors are perpendicular.
    ///
    /// Zero vectors are never perpendicular to anything.
    #[must_use]
    pub fn is_perpendicular(&self, a: &Vector3, b: &Vector3) -> bool {
        match (a.try_normalize(0.0), b.try_normalize(0.0)) {
            (Some(ua), Some(ub)) => self.almost_equal_squared(ua.dot(&ub), 0.0),
            _ => false,
        }
    }

    /// Maps an angle in radians into `[0, 2π)`.
    #[must_use]
    pub fn normalize_angle(&self, angle: f64) -> f64 {
        let a = angle.rem_euclid(TAU);
        // rem_euclid rounds tiny negative angles up to a full turn
        if a >= TAU {
            0.0
        } else {
            a
        }
    }

    /// Angles are equal if they describe the same direction.
    #[must_use]
    pub fn almost_equal_angles(&self, a: f64, b: f64) -> bool {
        let diff = self.normalize_angle(a - b);
        self.almost_zero(diff) || self.almost_equal(diff, TAU)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn imperial_is_finer_than_metric() {
        let metric = Tolerance::metric();
        let imperial = Tolerance::imperial();
        assert!(imperial.accuracy() < metric.accuracy());
        assert!(metric.almost_equal(1.0, 1.0005));
        assert!(!imperial.almost_equal(1.0, 1.0005));
    }

    #[test]
    fn mm_conversion() {
        assert!((Tolerance::imperial().mm(25.4) - 1.0).abs() < 1e-12);
        assert!((Tolerance::metric().mm(25.4) - 25.4).abs() < 1e-12);
    }

    #[test]
    fn collinear_and_perpendicular() {
        let tol = Tolerance::metric();
        let x = Vector3::x();
        assert!(tol.is_collinear(&x, &Vector3::new(-3.0, 0.0, 0.0)));
        assert!(!tol.is_collinear(&x, &Vector3::new(1.0, 1.0, 0.0)));
        assert!(tol.is_perpendicular(&x, &Vector3::new(0.0, 0.0, 2.0)));
        assert!(!tol.is_perpendicular(&x, &Vector3::zeros()));
    }

    #[test]
    fn angle_normalization() {
        let tol = Tolerance::metric();
        assert!((tol.normalize_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!(tol.normalize_angle(-1e-20).abs() < 1e-12);
        assert!((tol.normalize_angle(3.0 * TAU + 1.0) - 1.0).abs() < 1e-9);
        assert!(tol.almost_equal_angles(-PI, PI));
        assert!(tol.almost_equal_angles(0.0, TAU));
        assert!(!tol.almost_equal_angles(0.0, PI));
    }
}
