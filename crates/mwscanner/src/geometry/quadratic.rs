//! Scalar quadratic root finder.

/// Negative discriminants within this fraction of `p1² + |4 p2 p0|` are
/// treated as a double root.
const DISC_REL_TOL: f64 = 1e-12;

/// Roots of `p2 x² + p1 x + p0 = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuadraticRoots {
    /// Two real roots, ordered `r1 >= r2`.
    Real(f64, f64),
    /// Complex-conjugate pair `re ± i·im` with `im > 0`.
    Complex {
        /// Real part.
        re: f64,
        /// Imaginary part magnitude.
        im: f64,
    },
}

/// Discriminant `p1² − 4 p2 p0`.
pub fn discriminant(p2: f64, p1: f64, p0: f64) -> f64 {
    p1 * p1 - 4.0 * p2 * p0
}

/// Solve `p2 x² + p1 x + p0 = 0`.
///
/// Returns `None` when `p2 == 0` or a coefficient is not finite. Real roots
/// use the cancellation-free form `q = −(p1 + sign(p1)·√disc) / 2`,
/// `x₁ = q / p2`, `x₂ = p0 / q`.
pub fn solve_quadratic(p2: f64, p1: f64, p0: f64) -> Option<QuadraticRoots> {
    if !(p2.is_finite() && p1.is_finite() && p0.is_finite()) || p2 == 0.0 {
        return None;
    }

    let mut disc = discriminant(p2, p1, p0);
    if disc < 0.0 {
        let scale = p1 * p1 + (4.0 * p2 * p0).abs();
        if disc >= -DISC_REL_TOL * scale {
            disc = 0.0;
        } else {
            return Some(QuadraticRoots::Complex {
                re: -p1 / (2.0 * p2),
                im: (-disc).sqrt() / (2.0 * p2.abs()),
            });
        }
    }

    if disc == 0.0 {
        let r = -p1 / (2.0 * p2);
        return Some(QuadraticRoots::Real(r, r));
    }

    let s = disc.sqrt();
    let q = -0.5 * (p1 + s.copysign(p1));
    let r1 = q / p2;
    let r2 = p0 / q;
    Some(if r1 >= r2 {
        QuadraticRoots::Real(r1, r2)
    } else {
        QuadraticRoots::Real(r2, r1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distinct_real_roots() {
        // (x - 3)(x + 2) = x² - x - 6
        match solve_quadratic(1.0, -1.0, -6.0) {
            Some(QuadraticRoots::Real(r1, r2)) => {
                assert_relative_eq!(r1, 3.0, epsilon = 1e-12);
                assert_relative_eq!(r2, -2.0, epsilon = 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_zero_linear_term() {
        match solve_quadratic(0.1, 0.0, -1.0) {
            Some(QuadraticRoots::Real(r1, r2)) => {
                assert_relative_eq!(r1, 10f64.sqrt(), epsilon = 1e-12);
                assert_relative_eq!(r2, -(10f64.sqrt()), epsilon = 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cancellation_prone_roots() {
        // Roots 1e8 and 1e-8: the naive formula loses the small one.
        match solve_quadratic(1.0, -(1e8 + 1e-8), 1.0) {
            Some(QuadraticRoots::Real(r1, r2)) => {
                assert_relative_eq!(r1, 1e8, max_relative = 1e-12);
                assert_relative_eq!(r2, 1e-8, max_relative = 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_double_root_with_rounding() {
        // (x - 0.1)² with a discriminant that rounds slightly negative.
        let p1 = -0.2;
        let p0 = 0.1 * 0.1 + 1e-18;
        match solve_quadratic(1.0, p1, p0) {
            Some(QuadraticRoots::Real(r1, r2)) => {
                assert_relative_eq!(r1, 0.1, epsilon = 1e-7);
                assert_relative_eq!(r2, 0.1, epsilon = 1e-7);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_complex_roots() {
        // x² + 2x + 5 → −1 ± 2i
        match solve_quadratic(1.0, 2.0, 5.0) {
            Some(QuadraticRoots::Complex { re, im }) => {
                assert_relative_eq!(re, -1.0, epsilon = 1e-12);
                assert_relative_eq!(im, 2.0, epsilon = 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_quadratic() {
        assert!(solve_quadratic(0.0, 1.0, 1.0).is_none());
        assert!(solve_quadratic(f64::NAN, 1.0, 1.0).is_none());
    }
}
