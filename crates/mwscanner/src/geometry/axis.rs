//! Intersection of a fitted ellipse with an antenna's radial axis.
//!
//! Every axis through the origin crosses a valid enclosing ellipse twice. Only
//! one crossing lies on the antenna's side of the head; which one is decided
//! by a fixed per-antenna rule table ([`AxisSelector`]) rather than by the
//! axis angle.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::quadratic::{discriminant, solve_quadratic, QuadraticRoots};
use super::types::{Ellipse, GeometryError};

/// Which coordinate of a candidate root is tested for its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinate {
    X,
    Y,
}

/// Required sign of the probed coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSign {
    Positive,
    Negative,
}

impl RootSign {
    fn matches(self, v: f64) -> bool {
        match self {
            Self::Positive => v > 0.0,
            Self::Negative => v < 0.0,
        }
    }
}

/// How the other coordinate of the selected point is derived from the probed
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complement {
    /// Other coordinate is 0.
    Zero,
    /// Other coordinate equals the probed one.
    Same,
    /// Other coordinate is the negated probed one.
    Negated,
}

/// Root-selection rule for one antenna.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRule {
    pub probe: Coordinate,
    pub sign: RootSign,
    pub complement: Complement,
}

impl SelectionRule {
    /// Pick a point from the two candidate roots.
    ///
    /// The first candidate is taken when its probed coordinate has the
    /// required sign; otherwise the second is taken unconditionally. The
    /// returned flag is set when the second candidate does not match either.
    pub fn select(&self, candidates: &[[f64; 2]; 2]) -> ([f64; 2], bool) {
        let probe = |p: &[f64; 2]| match self.probe {
            Coordinate::X => p[0],
            Coordinate::Y => p[1],
        };

        let first = probe(&candidates[0]);
        let (value, fallback) = if self.sign.matches(first) {
            (first, false)
        } else {
            let second = probe(&candidates[1]);
            (second, !self.sign.matches(second))
        };

        let other = match self.complement {
            Complement::Zero => 0.0,
            Complement::Same => value,
            Complement::Negated => -value,
        };

        let point = match self.probe {
            Coordinate::X => [value, other],
            Coordinate::Y => [other, value],
        };
        (point, fallback)
    }
}

/// Antenna selector: one variant per canonical axis of the eight-antenna rig.
///
/// The discriminant is the selector index (0–7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSelector {
    /// Index 0, 90°.
    North = 0,
    /// Index 1, 45°.
    NorthEast = 1,
    /// Index 2, 0°.
    East = 2,
    /// Index 3, 315°.
    SouthEast = 3,
    /// Index 4, 270°.
    South = 4,
    /// Index 5, 225°.
    SouthWest = 5,
    /// Index 6, 180°.
    West = 6,
    /// Index 7, 135°.
    NorthWest = 7,
}

impl AxisSelector {
    /// All selectors in index order.
    pub const ALL: [AxisSelector; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Selector for an index in `0..=7`.
    pub fn from_index(index: usize) -> Result<Self, GeometryError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(GeometryError::InvalidSelector { index })
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis angle (degrees) this selector is laid out for.
    pub fn canonical_angle_deg(self) -> f64 {
        match self {
            Self::North => 90.0,
            Self::NorthEast => 45.0,
            Self::East => 0.0,
            Self::SouthEast => 315.0,
            Self::South => 270.0,
            Self::SouthWest => 225.0,
            Self::West => 180.0,
            Self::NorthWest => 135.0,
        }
    }

    pub fn rule(self) -> SelectionRule {
        use Complement::*;
        use Coordinate::*;
        use RootSign::*;

        let (probe, sign, complement) = match self {
            Self::North => (Y, Positive, Zero),
            Self::NorthEast => (X, Positive, Same),
            Self::East => (X, Positive, Zero),
            Self::SouthEast => (X, Positive, Negated),
            Self::South => (Y, Negative, Zero),
            Self::SouthWest => (X, Negative, Same),
            Self::West => (X, Negative, Zero),
            Self::NorthWest => (X, Negative, Negated),
        };
        SelectionRule {
            probe,
            sign,
            complement,
        }
    }
}

/// Result of intersecting one antenna axis with an ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisIntersection {
    /// Axis angle in degrees.
    pub angle_deg: f64,
    /// Both crossings, ordered by decreasing signed distance along the axis
    /// direction.
    pub roots: [[f64; 2]; 2],
    /// Selected target point.
    pub point: [f64; 2],
    /// Distance of `point` from the origin.
    pub radius: f64,
    /// `radius − reference_radius` rounded to the nearest whole mm, ties to
    /// even; positive means the target lies farther out than the antenna.
    pub radial_delta: f64,
    /// Neither root had the sign the selector expects; `point` came from the
    /// second root regardless.
    pub fallback: bool,
}

/// Intersect the axis at `axis_angle_deg` with `ellipse` and select the
/// crossing on the antenna's side.
///
/// Points on the axis are written `r·d` with `d = (cos θ, sin θ)`, which turns
/// the ellipse equation into `(dᵀAd) r² − 2 (dᵀAc) r + (cᵀAc − 1) = 0`. This
/// is the `y = tan θ · x` substitution scaled by `cos² θ`, so vertical axes
/// need no special case.
pub fn solve_axis(
    ellipse: &Ellipse,
    axis_angle_deg: f64,
    selector: AxisSelector,
    reference_radius: f64,
) -> Result<AxisIntersection, GeometryError> {
    if !axis_angle_deg.is_finite() {
        return Err(GeometryError::NonFiniteInput {
            what: "axis angle",
            value: axis_angle_deg,
        });
    }
    if !reference_radius.is_finite() {
        return Err(GeometryError::NonFiniteInput {
            what: "reference radius",
            value: reference_radius,
        });
    }

    let (sin_t, cos_t) = axis_angle_deg.to_radians().sin_cos();
    let dir = Vector2::new(cos_t, sin_t);
    let a = ellipse.matrix();
    let c = ellipse.center();

    let ad = a * dir;
    let p2 = dir.dot(&ad);
    let p1 = -2.0 * ad.dot(c);
    let p0 = c.dot(&(a * c)) - 1.0;

    if p2 <= 0.0 {
        return Err(GeometryError::InvalidEllipse {
            discriminant: ellipse.discriminant(),
        });
    }

    let (r1, r2) = match solve_quadratic(p2, p1, p0) {
        Some(QuadraticRoots::Real(r1, r2)) => (r1, r2),
        Some(QuadraticRoots::Complex { .. }) => {
            return Err(GeometryError::ComplexRoot {
                angle_deg: axis_angle_deg,
                discriminant: discriminant(p2, p1, p0),
            })
        }
        None => {
            return Err(GeometryError::InvalidEllipse {
                discriminant: ellipse.discriminant(),
            })
        }
    };

    let roots = [[r1 * cos_t, r1 * sin_t], [r2 * cos_t, r2 * sin_t]];
    let (point, fallback) = selector.rule().select(&roots);
    let radius = point[0].hypot(point[1]);
    let radial_delta = (radius - reference_radius).round_ties_even();

    if fallback {
        tracing::warn!(
            selector = selector.index(),
            angle_deg = axis_angle_deg,
            root0 = ?roots[0],
            root1 = ?roots[1],
            "no root has the expected sign, keeping the second root"
        );
    }
    tracing::debug!(
        selector = selector.index(),
        angle_deg = axis_angle_deg,
        x = point[0],
        y = point[1],
        radial_delta,
        "solved axis"
    );

    Ok(AxisIntersection {
        angle_deg: axis_angle_deg,
        roots,
        point,
        radius,
        radial_delta,
        fallback,
    })
}
