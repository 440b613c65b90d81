//! Core ellipse types, fit configuration and the geometry error type.

use nalgebra::{Matrix2, Rotation2, SymmetricEigen, Vector2};
use serde::{Deserialize, Serialize};

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors that can occur while fitting an ellipse or intersecting it with an
/// antenna axis.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The point set cannot bound a 2-D ellipse.
    DegenerateInput {
        /// Number of points supplied.
        points: usize,
        /// What made the input degenerate.
        reason: &'static str,
    },
    /// Convergence tolerance must be finite and strictly positive.
    InvalidTolerance {
        /// Offending tolerance.
        tolerance: f64,
    },
    /// The weighting iteration hit its iteration cap.
    NotConverged {
        /// Iterations performed.
        iterations: usize,
        /// L2 norm of the last weight update.
        last_update: f64,
    },
    /// The shape matrix is not positive-definite (not a real ellipse).
    InvalidEllipse {
        /// Discriminant `B² − 4AC` of the implicit quadratic form.
        discriminant: f64,
    },
    /// The antenna axis does not cross the ellipse.
    ComplexRoot {
        /// Axis angle in degrees.
        angle_deg: f64,
        /// Discriminant of the scalar quadratic along the axis.
        discriminant: f64,
    },
    /// Selector index outside `0..=7`.
    InvalidSelector {
        /// Offending index.
        index: usize,
    },
    /// A scalar input was NaN or infinite.
    NonFiniteInput {
        /// Which input.
        what: &'static str,
        /// Offending value.
        value: f64,
    },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateInput { points, reason } => {
                write!(f, "degenerate input ({} points): {}", points, reason)
            }
            Self::InvalidTolerance { tolerance } => {
                write!(f, "tolerance must be finite and > 0, got {}", tolerance)
            }
            Self::NotConverged {
                iterations,
                last_update,
            } => write!(
                f,
                "ellipse fit did not converge after {} iterations (last update {:.3e})",
                iterations, last_update
            ),
            Self::InvalidEllipse { discriminant } => write!(
                f,
                "matrix is not a valid ellipse: discriminant {:.6e} must be < 0",
                discriminant
            ),
            Self::ComplexRoot {
                angle_deg,
                discriminant,
            } => write!(
                f,
                "axis at {}° does not intersect the ellipse (discriminant {:.6e})",
                angle_deg, discriminant
            ),
            Self::InvalidSelector { index } => {
                write!(f, "selector index must be in 0..=7, got {}", index)
            }
            Self::NonFiniteInput { what, value } => {
                write!(f, "{} must be finite, got {}", what, value)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

// ── Center-form ellipse ────────────────────────────────────────────────────

/// Ellipse in center form: `(p − c)ᵀ A (p − c) = 1`.
///
/// `A` is symmetric positive-definite; construction rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    matrix: Matrix2<f64>,
    center: Vector2<f64>,
}

impl Ellipse {
    /// Build from a shape matrix and center.
    ///
    /// The matrix is symmetrized before validation, so the small asymmetry
    /// left behind by a numerical inverse is accepted.
    pub fn new(matrix: Matrix2<f64>, center: Vector2<f64>) -> Result<Self, GeometryError> {
        let matrix = (matrix + matrix.transpose()) * 0.5;
        for &v in matrix.iter() {
            if !v.is_finite() {
                return Err(GeometryError::NonFiniteInput {
                    what: "ellipse matrix entry",
                    value: v,
                });
            }
        }
        for &v in center.iter() {
            if !v.is_finite() {
                return Err(GeometryError::NonFiniteInput {
                    what: "ellipse center",
                    value: v,
                });
            }
        }

        let e = Self { matrix, center };
        let disc = e.discriminant();
        if disc >= 0.0 || matrix[(0, 0)] <= 0.0 {
            return Err(GeometryError::InvalidEllipse { discriminant: disc });
        }
        Ok(e)
    }

    /// Build from the implicit coefficients `a = A₁₁`, `b = A₁₂ = A₂₁`,
    /// `c = A₂₂` and the center `(cx, cy)`.
    pub fn from_coeffs(a: f64, b: f64, c: f64, cx: f64, cy: f64) -> Result<Self, GeometryError> {
        Self::new(Matrix2::new(a, b, b, c), Vector2::new(cx, cy))
    }

    /// Circle of the given radius.
    pub fn circle(radius: f64, center: [f64; 2]) -> Result<Self, GeometryError> {
        let k = 1.0 / (radius * radius);
        Self::from_coeffs(k, 0.0, k, center[0], center[1])
    }

    /// Shape matrix `A`.
    pub fn matrix(&self) -> &Matrix2<f64> {
        &self.matrix
    }

    /// Center `c`.
    pub fn center(&self) -> &Vector2<f64> {
        &self.center
    }

    /// `[a, b, c]` with `a = A₁₁`, `b = A₁₂`, `c = A₂₂`.
    pub fn coeffs(&self) -> [f64; 3] {
        [self.matrix[(0, 0)], self.matrix[(0, 1)], self.matrix[(1, 1)]]
    }

    /// Discriminant `B² − 4AC` of the quadratic form `a x² + 2b xy + c y²`,
    /// i.e. `4 (b² − a c)`. Negative for every valid ellipse.
    pub fn discriminant(&self) -> f64 {
        let [a, b, c] = self.coeffs();
        4.0 * (b * b - a * c)
    }

    /// Value of `(p − c)ᵀ A (p − c)`: below 1 inside, 1 on the boundary.
    pub fn level(&self, p: [f64; 2]) -> f64 {
        let d = Vector2::new(p[0], p[1]) - self.center;
        d.dot(&(self.matrix * d))
    }

    /// Whether `p` lies inside or on the ellipse up to `eps`.
    pub fn contains(&self, p: [f64; 2], eps: f64) -> bool {
        self.level(p) <= 1.0 + eps
    }

    /// Geometric parameters (semi-axes and orientation).
    pub fn axes(&self) -> EllipseAxes {
        let eig = SymmetricEigen::new(self.matrix);
        let (i_major, i_minor) = if eig.eigenvalues[0] <= eig.eigenvalues[1] {
            (0, 1)
        } else {
            (1, 0)
        };
        // The smaller eigenvalue belongs to the longer semi-axis.
        let dir = eig.eigenvectors.column(i_major);
        EllipseAxes {
            cx: self.center.x,
            cy: self.center.y,
            a: 1.0 / eig.eigenvalues[i_major].sqrt(),
            b: 1.0 / eig.eigenvalues[i_minor].sqrt(),
            angle: normalize_angle(dir[1].atan2(dir[0])),
        }
    }

    /// Sample `n` points on the ellipse boundary.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        self.axes().sample_points(n)
    }
}

// ── Geometric ellipse ──────────────────────────────────────────────────────

/// Geometric ellipse parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseAxes {
    /// Center x (mm).
    pub cx: f64,
    /// Center y (mm).
    pub cy: f64,
    /// Semi-major axis length.
    pub a: f64,
    /// Semi-minor axis length.
    pub b: f64,
    /// Rotation angle of the major axis from +x, in radians (−π/2, π/2].
    pub angle: f64,
}

impl EllipseAxes {
    /// Convert back to center form.
    pub fn to_ellipse(&self) -> Result<Ellipse, GeometryError> {
        let (s, c) = self.angle.sin_cos();
        let ia2 = 1.0 / (self.a * self.a);
        let ib2 = 1.0 / (self.b * self.b);
        Ellipse::from_coeffs(
            c * c * ia2 + s * s * ib2,
            c * s * (ia2 - ib2),
            s * s * ia2 + c * c * ib2,
            self.cx,
            self.cy,
        )
    }

    /// `n` boundary points at equal parameter steps, starting at the end of
    /// the major axis.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let rot = Rotation2::new(self.angle);
        let center = Vector2::new(self.cx, self.cy);
        let step = std::f64::consts::TAU / n as f64;
        (0..n)
            .map(|i| {
                let (s, c) = (step * i as f64).sin_cos();
                let p = center + rot * Vector2::new(self.a * c, self.b * s);
                [p.x, p.y]
            })
            .collect()
    }
}

// ── Fit configuration ──────────────────────────────────────────────────────

/// Configuration for the minimum-volume enclosing ellipse fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Stop once the L2 norm of the weight update falls to this value.
    pub tolerance: f64,
    /// Hard cap on weighting iterations.
    pub max_iters: usize,
    /// Rescale the result so every input point satisfies `level <= 1`.
    pub enforce_containment: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_iters: 10_000,
            enforce_containment: true,
        }
    }
}

/// Result of a minimum-volume enclosing ellipse fit.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Fitted ellipse.
    pub ellipse: Ellipse,
    /// Final per-point weights (sum to 1).
    pub weights: Vec<f64>,
    /// Number of weighting iterations performed.
    pub iterations: usize,
    /// L2 norm of the last weight update.
    pub final_update: f64,
}

/// Fold an axis direction into (−π/2, π/2].
pub(crate) fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::{FRAC_PI_2, PI};
    let folded = (angle + FRAC_PI_2).rem_euclid(PI) - FRAC_PI_2;
    if folded <= -FRAC_PI_2 {
        folded + PI
    } else {
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_normalize_angle_range() {
        assert_relative_eq!(normalize_angle(0.3), 0.3, epsilon = 1e-12);
        assert_eq!(normalize_angle(-FRAC_PI_2), FRAC_PI_2);
        assert_relative_eq!(normalize_angle(PI), 0.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(2.0), 2.0 - PI, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-7.0), -7.0 + 2.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_points_start_on_major_axis() {
        let axes = EllipseAxes {
            cx: 1.0,
            cy: -1.0,
            a: 10.0,
            b: 4.0,
            angle: FRAC_PI_2,
        };
        let pts = axes.sample_points(4);
        assert_eq!(pts.len(), 4);
        assert_relative_eq!(pts[0][0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(pts[0][1], 9.0, epsilon = 1e-12);
        assert_relative_eq!(pts[1][0], -3.0, epsilon = 1e-12);
        assert_relative_eq!(pts[1][1], -1.0, epsilon = 1e-12);
        assert!(axes.sample_points(0).is_empty());
    }
}
