//! Minimum-volume enclosing ellipse (Khachiyan's algorithm, d = 2).

use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};

use super::types::{Ellipse, FitConfig, FitResult, GeometryError};

const DIM: f64 = 2.0;

/// Relative determinant threshold below which a point cloud counts as collinear.
const COLLINEAR_REL_DET: f64 = 1e-12;

/// Fit the minimum-volume ellipse enclosing `points`.
///
/// Uses the default iteration cap and containment guard; see
/// [`fit_enclosing_ellipse_with`] for the full result.
pub fn fit_enclosing_ellipse(points: &[[f64; 2]], tolerance: f64) -> Result<Ellipse, GeometryError> {
    let config = FitConfig {
        tolerance,
        ..FitConfig::default()
    };
    fit_enclosing_ellipse_with(points, &config).map(|r| r.ellipse)
}

/// Fit the minimum-volume ellipse enclosing `points`.
///
/// Maintains a weight vector `u` over the points, starting uniform. Each
/// iteration lifts the points to homogeneous coordinates `q = (x, y, 1)`,
/// forms `X = Σ uᵢ qᵢ qᵢᵀ`, finds the point with the largest leverage
/// `qᵀ X⁻¹ q` and moves weight towards it. On convergence the center is the
/// weighted centroid and `A = (Σ uᵢ pᵢ pᵢᵀ − c cᵀ)⁻¹ / d`.
///
/// Requires at least 3 non-collinear points.
pub fn fit_enclosing_ellipse_with(
    points: &[[f64; 2]],
    config: &FitConfig,
) -> Result<FitResult, GeometryError> {
    let n = points.len();
    if n < 3 {
        return Err(GeometryError::DegenerateInput {
            points: n,
            reason: "at least 3 points are required",
        });
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(GeometryError::InvalidTolerance {
            tolerance: config.tolerance,
        });
    }
    if points.iter().flatten().any(|v| !v.is_finite()) {
        return Err(GeometryError::DegenerateInput {
            points: n,
            reason: "non-finite coordinate",
        });
    }
    if is_collinear(points) {
        return Err(GeometryError::DegenerateInput {
            points: n,
            reason: "points are collinear",
        });
    }

    let lifted: Vec<Vector3<f64>> = points
        .iter()
        .map(|&[x, y]| Vector3::new(x, y, 1.0))
        .collect();

    let mut u = vec![1.0 / n as f64; n];
    let mut iterations = 0usize;
    let mut update = f64::INFINITY;

    while update > config.tolerance {
        if iterations >= config.max_iters {
            return Err(GeometryError::NotConverged {
                iterations,
                last_update: update,
            });
        }
        iterations += 1;

        let mut x = Matrix3::<f64>::zeros();
        for (q, &w) in lifted.iter().zip(&u) {
            x += q * q.transpose() * w;
        }
        let x_inv = x.try_inverse().ok_or(GeometryError::DegenerateInput {
            points: n,
            reason: "weighted scatter matrix is singular",
        })?;

        // First maximum wins on ties.
        let (j, m_max) = lifted
            .iter()
            .map(|q| q.dot(&(x_inv * q)))
            .enumerate()
            .fold((0usize, f64::NEG_INFINITY), |best, (i, m)| {
                if m > best.1 {
                    (i, m)
                } else {
                    best
                }
            });

        let step = (m_max - DIM - 1.0) / ((DIM + 1.0) * (m_max - 1.0));

        let mut sq = 0.0;
        for (i, w) in u.iter_mut().enumerate() {
            let mut next = (1.0 - step) * *w;
            if i == j {
                next += step;
            }
            sq += (next - *w) * (next - *w);
            *w = next;
        }
        update = sq.sqrt();

        tracing::trace!(iteration = iterations, point = j, leverage = m_max, update, "mvee step");
    }

    let center = points
        .iter()
        .zip(&u)
        .fold(Vector2::<f64>::zeros(), |acc, (&[x, y], &w)| {
            acc + Vector2::new(x, y) * w
        });

    let mut scatter = Matrix2::<f64>::zeros();
    for (&[x, y], &w) in points.iter().zip(&u) {
        let p = Vector2::new(x, y);
        scatter += p * p.transpose() * w;
    }
    scatter -= center * center.transpose();

    let mut shape = scatter.try_inverse().ok_or(GeometryError::DegenerateInput {
        points: n,
        reason: "weighted covariance is singular",
    })? / DIM;

    if config.enforce_containment {
        let worst = points
            .iter()
            .map(|&[x, y]| {
                let d = Vector2::new(x, y) - center;
                d.dot(&(shape * d))
            })
            .fold(0.0f64, f64::max);
        if worst > 1.0 {
            tracing::debug!(worst_level = worst, "rescaling ellipse to contain every point");
            shape /= worst;
        }
    }

    let ellipse = Ellipse::new(shape, center)?;

    tracing::debug!(
        points = n,
        iterations,
        final_update = update,
        cx = center.x,
        cy = center.y,
        "fitted enclosing ellipse"
    );

    Ok(FitResult {
        ellipse,
        weights: u,
        iterations,
        final_update: update,
    })
}

/// True when the points span less than two dimensions (collinear or all
/// coincident), judged by the determinant of their covariance relative to its
/// squared trace.
fn is_collinear(points: &[[f64; 2]]) -> bool {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for &[x, y] in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let trace = sxx + syy;
    if trace <= f64::MIN_POSITIVE {
        return true;
    }
    let det = sxx * syy - sxy * sxy;
    det <= COLLINEAR_REL_DET * trace * trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_collinear_detection() {
        let line: Vec<[f64; 2]> = (0..5).map(|i| [i as f64, 2.0 * i as f64 + 1.0]).collect();
        assert!(is_collinear(&line));

        let same: Vec<[f64; 2]> = vec![[3.0, 3.0]; 4];
        assert!(is_collinear(&same));

        let tri = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert!(!is_collinear(&tri));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let pts = [[0.0, 0.0], [4.0, 0.5], [1.0, 3.0], [-2.0, 1.0], [0.5, -2.5]];
        let res = fit_enclosing_ellipse_with(&pts, &FitConfig::default()).expect("fit");
        let total: f64 = res.weights.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        assert!(res.weights.iter().all(|&w| w >= 0.0));
        assert!(res.iterations >= 1);
        assert!(res.final_update <= 1e-3);
    }

    #[test]
    fn test_triangle_is_circumscribed() {
        // Minimum enclosing ellipse of a triangle passes through all three
        // vertices and is centered on the centroid.
        let pts = [[0.0, 0.0], [6.0, 0.0], [0.0, 3.0]];
        let config = FitConfig {
            tolerance: 1e-9,
            ..FitConfig::default()
        };
        let res = fit_enclosing_ellipse_with(&pts, &config).expect("fit");
        let c = res.ellipse.center();
        assert_relative_eq!(c.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(c.y, 1.0, epsilon = 1e-6);
        for &p in &pts {
            assert_relative_eq!(res.ellipse.level(p), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_iteration_cap() {
        let pts = [[0.0, 0.0], [5.0, 0.3], [1.0, 3.0], [-2.0, 1.2], [0.7, -2.5], [3.0, 3.3]];
        let config = FitConfig {
            tolerance: 1e-12,
            max_iters: 2,
            enforce_containment: true,
        };
        match fit_enclosing_ellipse_with(&pts, &config) {
            Err(GeometryError::NotConverged { iterations, .. }) => assert_eq!(iterations, 2),
            other => panic!("expected NotConverged, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_tolerance() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        for tol in [0.0, -1e-3, f64::NAN] {
            assert!(matches!(
                fit_enclosing_ellipse(&pts, tol),
                Err(GeometryError::InvalidTolerance { .. })
            ));
        }
    }

    #[test]
    fn test_non_finite_point_rejected() {
        let pts = [[0.0, 0.0], [f64::NAN, 1.0], [0.0, 1.0]];
        assert!(matches!(
            fit_enclosing_ellipse(&pts, 1e-3),
            Err(GeometryError::DegenerateInput { points: 3, .. })
        ));
    }
}
