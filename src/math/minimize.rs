//! Bounded one-dimensional minimization.
//!
//! Both searches terminate after a fixed number of steps; a caller that
//! needs the minimum to be "good enough" must check the returned value.

/// Upper bound on golden-section iterations.
const MAX_ITERATIONS: usize = 200;

/// Interval width at which interval nesting stops.
const NESTING_CUTOFF: f64 = 1e-10;

/// Location and value of a minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    /// Argument at the minimum.
    pub x: f64,
    /// Function value at the minimum.
    pub value: f64,
}

/// Golden-section search for a minimum of `f` in `[lo, hi]`.
///
/// Converges to a local minimum; stops once the bracket is narrower than
/// `x_tol` or after a fixed iteration count.
pub fn find_minimum<F>(f: F, lo: f64, hi: f64, x_tol: f64) -> Minimum
where
    F: Fn(f64) -> f64,
{
    let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);

    for _ in 0..MAX_ITERATIONS {
        if (b - a).abs() <= x_tol {
            break;
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = f(d);
        }
    }

    let mut best = if fc < fd {
        Minimum { x: c, value: fc }
    } else {
        Minimum { x: d, value: fd }
    };
    // The bracket ends are never evaluated by the loop itself.
    for x in [lo, hi] {
        let value = f(x);
        if value < best.value {
            best = Minimum { x, value };
        }
    }
    best
}

/// Coarse sampling of `[lo, hi]` followed by interval nesting around the
/// best sample.
///
/// Robust against several local minima as long as `samples` resolves them.
pub fn sample_then_nest<F>(f: F, lo: f64, hi: f64, samples: u32) -> Minimum
where
    F: Fn(f64) -> f64,
{
    let samples = samples.max(1);
    let step = (hi - lo) / f64::from(samples);

    let mut best = Minimum {
        x: lo,
        value: f(lo),
    };
    for i in 1..=samples {
        let x = lo + step * f64::from(i);
        let value = f(x);
        if value < best.value {
            best = Minimum { x, value };
        }
    }

    let (range_lo, range_hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let mut low = (best.x - step.abs()).max(range_lo);
    let mut upp = (best.x + step.abs()).min(range_hi);
    let mut f_low = f(low);
    let mut f_upp = f(upp);
    let mut width = upp - low;
    while width > NESTING_CUTOFF {
        width /= 2.0;
        if f_low < f_upp {
            upp = low + width;
            f_upp = f(upp);
        } else {
            low = upp - width;
            f_low = f(low);
        }
    }

    let nested = if f_low < f_upp {
        Minimum { x: low, value: f_low }
    } else {
        Minimum { x: upp, value: f_upp }
    };
    if nested.value <= best.value {
        nested
    } else {
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_section_finds_parabola_minimum() {
        let m = find_minimum(|x| (x - 1.3).powi(2) + 2.0, -5.0, 5.0, 1e-10);
        assert!((m.x - 1.3).abs() < 1e-6);
        assert!((m.value - 2.0).abs() < 1e-10);
    }

    #[test]
    fn golden_section_respects_bounds() {
        let m = find_minimum(|x| x, 2.0, 3.0, 1e-10);
        assert!((m.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn sampling_escapes_local_minimum() {
        // Local minimum near 0.2, global one near 0.8.
        let f = |x: f64| (x - 0.2).powi(2) * (x - 0.8).powi(2) + 0.1 * (x - 0.8).abs();
        let m = sample_then_nest(f, 0.0, 1.0, 100);
        assert!((m.x - 0.8).abs() < 1e-6);
    }
}
