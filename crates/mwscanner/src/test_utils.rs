//! Shared point-set helpers for unit tests.

use rand::Rng;

/// `n` vertices of a regular polygon of circumradius `radius`, centered on the
/// origin, first vertex at angle `phase` (radians).
pub(crate) fn regular_polygon(n: usize, radius: f64, phase: f64) -> Vec<[f64; 2]> {
    (0..n)
        .map(|i| {
            let t = phase + 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
            [radius * t.cos(), radius * t.sin()]
        })
        .collect()
}

/// `n` points drawn uniformly from the square `[-half, half]²`.
pub(crate) fn random_cloud(rng: &mut impl Rng, n: usize, half: f64) -> Vec<[f64; 2]> {
    (0..n)
        .map(|_| [rng.gen_range(-half..half), rng.gen_range(-half..half)])
        .collect()
}

/// Radial positions of an antenna array homed onto an elliptical head with
/// semi-axes `(a, b)` centered at `center`, offset outward by `gap`.
pub(crate) fn homed_positions(
    angles_deg: &[f64],
    a: f64,
    b: f64,
    center: [f64; 2],
    gap: f64,
) -> Vec<f64> {
    angles_deg
        .iter()
        .map(|&deg| {
            let (s, c) = deg.to_radians().sin_cos();
            // Outer crossing of the axis with the axis-aligned head ellipse.
            let qa = (c / a).powi(2) + (s / b).powi(2);
            let qb = -2.0 * (c * center[0] / (a * a) + s * center[1] / (b * b));
            let qc = (center[0] / a).powi(2) + (center[1] / b).powi(2) - 1.0;
            let r = (-qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa);
            r + gap
        })
        .collect()
}
