//! Ellipse geometry for antenna placement.
//!
//! Implements:
//! - Minimum-volume enclosing ellipse (Khachiyan's weighting iteration).
//! - Center-form ↔ geometric ellipse conversion.
//! - Intersection of an ellipse with an antenna's radial axis, with the fixed
//!   per-antenna root selection table.

mod axis;
mod mvee;
mod quadratic;
mod types;

pub use axis::{
    solve_axis, AxisIntersection, AxisSelector, Complement, Coordinate, RootSign, SelectionRule,
};
pub use mvee::{fit_enclosing_ellipse, fit_enclosing_ellipse_with};
pub use quadratic::{solve_quadratic, QuadraticRoots};
pub use types::{Ellipse, EllipseAxes, FitConfig, FitResult, GeometryError};
