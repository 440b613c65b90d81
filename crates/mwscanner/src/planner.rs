//! Positioning plans.
//!
//! Turns measured radial antenna positions into move commands. Radii are
//! measured from the head center; a forward move brings the antenna closer
//! to the head.

use serde::{Deserialize, Serialize};

use crate::array::{AntennaArray, AntennaSpec};
use crate::geometry::{
    fit_enclosing_ellipse_with, solve_axis, AxisIntersection, Ellipse, FitConfig, GeometryError,
};

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors raised while planning antenna moves.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Fitting or axis intersection failed.
    Geometry(GeometryError),
    /// One position per antenna is required.
    PositionCount { expected: usize, got: usize },
    /// Antenna index outside the array.
    UnknownAntenna { index: usize },
    /// The fitted ellipse lies well inside an antenna.
    NegativeMove { antenna: usize, distance_mm: f64 },
    /// An antenna already sits beyond the largest reachable circle.
    CircleUnreachable {
        antenna: usize,
        position_mm: f64,
        limit_mm: f64,
    },
    /// Move distances must be finite and non-negative.
    InvalidDistance { value: f64 },
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geometry(e) => write!(f, "geometry: {}", e),
            Self::PositionCount { expected, got } => {
                write!(f, "expected {} antenna positions, got {}", expected, got)
            }
            Self::UnknownAntenna { index } => write!(f, "no antenna at index {}", index),
            Self::NegativeMove {
                antenna,
                distance_mm,
            } => write!(
                f,
                "antenna {} would have to move {} mm into the head",
                antenna, distance_mm
            ),
            Self::CircleUnreachable {
                antenna,
                position_mm,
                limit_mm,
            } => write!(
                f,
                "antenna {} at {} mm is beyond the reachable circle radius {} mm",
                antenna, position_mm, limit_mm
            ),
            Self::InvalidDistance { value } => {
                write!(f, "distance must be finite and >= 0, got {}", value)
            }
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Geometry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeometryError> for PlanError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}

// ── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards the head (radius decreases).
    Forward,
    /// Away from the head (radius increases).
    Backward,
}

/// One actuator move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCommand {
    /// Antenna id.
    pub antenna: usize,
    pub direction: Direction,
    pub distance_mm: f64,
    /// Whole motor steps for `distance_mm`.
    pub steps: u32,
    /// The requested distance was shortened to stay within travel.
    pub clamped: bool,
}

/// Planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub fit: FitConfig,
    /// Negative radial deltas above `-negative_slack_mm` become zero moves.
    pub negative_slack_mm: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            fit: FitConfig::default(),
            negative_slack_mm: 2.0,
        }
    }
}

/// Moves that place every antenna on a common enclosing ellipse.
#[derive(Debug, Clone)]
pub struct EllipsePlan {
    pub ellipse: Ellipse,
    /// One intersection per antenna, in array order.
    pub axes: Vec<AxisIntersection>,
    /// One move per antenna, in array order.
    pub moves: Vec<MoveCommand>,
}

/// Moves that place every antenna on a common circle.
#[derive(Debug, Clone)]
pub struct CirclePlan {
    pub target_radius_mm: f64,
    /// The target was lowered to the smallest home radius.
    pub capped: bool,
    pub moves: Vec<MoveCommand>,
}

// ── Planning ───────────────────────────────────────────────────────────────

/// Plan a single move, shortened to the antenna's travel limits.
///
/// `index` is the antenna's position in the array, `position_mm` its current
/// radius.
pub fn plan_move(
    array: &AntennaArray,
    index: usize,
    position_mm: f64,
    direction: Direction,
    distance_mm: f64,
) -> Result<MoveCommand, PlanError> {
    let spec = array
        .antenna(index)
        .ok_or(PlanError::UnknownAntenna { index })?;
    check_distance(distance_mm)?;
    check_position(position_mm)?;

    let available = match direction {
        Direction::Forward => position_mm - spec.inner_radius_mm(),
        Direction::Backward => spec.home_radius_mm - position_mm,
    }
    .max(0.0);

    let clamped = distance_mm > available;
    let distance_mm = distance_mm.min(available);
    if clamped {
        tracing::warn!(
            antenna = spec.id,
            ?direction,
            position_mm,
            distance_mm,
            "move shortened to stay within travel"
        );
    }

    Ok(MoveCommand {
        antenna: spec.id,
        direction,
        distance_mm,
        steps: array.distance_to_steps(distance_mm),
        clamped,
    })
}

/// Plan moves that put every antenna `distance_from_head_mm` outside the
/// farthest one, on a common circle.
pub fn plan_circle(
    array: &AntennaArray,
    positions_mm: &[f64],
    distance_from_head_mm: f64,
) -> Result<CirclePlan, PlanError> {
    check_count(array, positions_mm)?;
    check_distance(distance_from_head_mm)?;

    let mut farthest = 0;
    for (i, &p) in positions_mm.iter().enumerate() {
        check_position(p)?;
        if p > positions_mm[farthest] {
            farthest = i;
        }
    }
    let max_pos = positions_mm[farthest];
    let limit = array.min_home_radius_mm();
    if max_pos > limit {
        return Err(PlanError::CircleUnreachable {
            antenna: array.antennas()[farthest].id,
            position_mm: max_pos,
            limit_mm: limit,
        });
    }

    let mut target = max_pos + distance_from_head_mm;
    let capped = target > limit;
    if capped {
        tracing::warn!(
            requested_mm = target,
            limit_mm = limit,
            "circle radius capped at the smallest home radius"
        );
        target = limit;
    }

    let moves = positions_mm
        .iter()
        .enumerate()
        .map(|(i, &p)| plan_move(array, i, p, Direction::Backward, target - p))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        target_radius_mm = target,
        capped,
        antennas = moves.len(),
        "planned circle"
    );
    Ok(CirclePlan {
        target_radius_mm: target,
        capped,
        moves,
    })
}

/// Plan moves that put every antenna on the minimum-volume ellipse enclosing
/// their current positions.
pub fn plan_ellipse(
    array: &AntennaArray,
    positions_mm: &[f64],
    config: &PlanConfig,
) -> Result<EllipsePlan, PlanError> {
    check_count(array, positions_mm)?;
    if !(config.negative_slack_mm.is_finite() && config.negative_slack_mm >= 0.0) {
        return Err(PlanError::InvalidDistance {
            value: config.negative_slack_mm,
        });
    }
    for &p in positions_mm {
        check_position(p)?;
    }

    let points = array.coordinates(positions_mm);
    let fit = fit_enclosing_ellipse_with(&points, &config.fit)?;
    let ellipse = fit.ellipse;
    let discriminant = ellipse.discriminant();
    if discriminant >= 0.0 {
        return Err(GeometryError::InvalidEllipse { discriminant }.into());
    }

    let mut axes = Vec::with_capacity(array.len());
    let mut moves = Vec::with_capacity(array.len());
    for (i, (spec, &pos)) in array.antennas().iter().zip(positions_mm).enumerate() {
        let axis = solve_axis(&ellipse, spec.angle_deg, spec.selector()?, pos)?;
        moves.push(resolve_axis_move(
            array,
            i,
            spec,
            pos,
            axis.radial_delta,
            config.negative_slack_mm,
        )?);
        axes.push(axis);
    }

    let geom = ellipse.axes();
    tracing::info!(
        cx = geom.cx,
        cy = geom.cy,
        a = geom.a,
        b = geom.b,
        iterations = fit.iterations,
        "planned ellipse"
    );
    Ok(EllipsePlan {
        ellipse,
        axes,
        moves,
    })
}

/// Turn a rounded radial delta into a backward move.
///
/// The delta is first limited to the room left before the home radius; the
/// sign test then applies to the limited value, so an antenna already beyond
/// home yields a negative move.
fn resolve_axis_move(
    array: &AntennaArray,
    index: usize,
    spec: &AntennaSpec,
    position_mm: f64,
    radial_delta: f64,
    negative_slack_mm: f64,
) -> Result<MoveCommand, PlanError> {
    let room = spec.home_radius_mm - position_mm;
    let limited = radial_delta > room;
    let delta = if limited {
        tracing::warn!(
            antenna = spec.id,
            radial_delta,
            room_mm = room,
            "target beyond home radius, moving to home instead"
        );
        room
    } else {
        radial_delta
    };

    let distance = if delta >= 0.0 {
        delta
    } else if delta > -negative_slack_mm {
        tracing::debug!(antenna = spec.id, delta, "small negative delta ignored");
        0.0
    } else {
        return Err(PlanError::NegativeMove {
            antenna: spec.id,
            distance_mm: delta,
        });
    };

    let mut cmd = plan_move(array, index, position_mm, Direction::Backward, distance)?;
    cmd.clamped |= limited;
    Ok(cmd)
}

fn check_count(array: &AntennaArray, positions_mm: &[f64]) -> Result<(), PlanError> {
    if positions_mm.len() != array.len() {
        return Err(PlanError::PositionCount {
            expected: array.len(),
            got: positions_mm.len(),
        });
    }
    Ok(())
}

fn check_distance(distance_mm: f64) -> Result<(), PlanError> {
    if !(distance_mm.is_finite() && distance_mm >= 0.0) {
        return Err(PlanError::InvalidDistance { value: distance_mm });
    }
    Ok(())
}

fn check_position(position_mm: f64) -> Result<(), PlanError> {
    if !position_mm.is_finite() {
        return Err(GeometryError::NonFiniteInput {
            what: "antenna position",
            value: position_mm,
        }
        .into());
    }
    Ok(())
}
