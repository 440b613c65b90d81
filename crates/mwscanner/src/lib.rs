//! mwscanner — antenna placement geometry for a radial microwave head scanner.
//!
//! Eight antennas sit on fixed radial axes around the head and move along
//! them. After every antenna has been brought onto the head, the library
//! computes where each antenna should go so that all of them lie on one
//! common curve:
//!
//! 1. **Fit** – minimum-volume enclosing ellipse of the antenna positions
//!    (Khachiyan's weighting iteration).
//! 2. **Axis solve** – intersection of each antenna axis with the ellipse,
//!    with a fixed per-antenna root selection table.
//! 3. **Plan** – radial deltas turned into clamped actuator moves, or a plain
//!    common-circle plan.
//!
//! # Public API
//! - [`fit_enclosing_ellipse`] and [`solve_axis`] as the geometric core
//! - [`AntennaArray`] for the rig description
//! - [`plan_ellipse`], [`plan_circle`] and [`plan_move`] for move planning
//! - [`report`] structures for JSON output
//!
//! Motor control, homing and measurement are out of scope.

mod array;
mod geometry;
mod planner;
pub mod report;

#[cfg(test)]
pub(crate) mod test_utils;

pub use array::{AntennaArray, AntennaSpec, ArrayError};
pub use geometry::{
    fit_enclosing_ellipse, fit_enclosing_ellipse_with, solve_axis, solve_quadratic,
    AxisIntersection, AxisSelector, Complement, Coordinate, Ellipse, EllipseAxes, FitConfig,
    FitResult, GeometryError, QuadraticRoots, RootSign, SelectionRule,
};
pub use planner::{
    plan_circle, plan_ellipse, plan_move, CirclePlan, Direction, EllipsePlan, MoveCommand,
    PlanConfig, PlanError,
};
