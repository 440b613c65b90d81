//! Serializable views of fits and plans.

use serde::{Deserialize, Serialize};

use crate::array::AntennaArray;
use crate::geometry::{AxisIntersection, Ellipse, FitResult};
use crate::planner::{CirclePlan, Direction, EllipsePlan, MoveCommand};

/// Ellipse parameters for serialization (center form + geometry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EllipseReport {
    /// Shape matrix `A`, row-major.
    pub matrix: [[f64; 2]; 2],
    /// Center (x, y) in mm.
    pub center_xy: [f64; 2],
    /// Semi-axes [major, minor] in mm.
    pub semi_axes: [f64; 2],
    /// Rotation of the major axis in radians.
    pub angle: f64,
    pub discriminant: f64,
}

impl From<&Ellipse> for EllipseReport {
    fn from(e: &Ellipse) -> Self {
        let m = e.matrix();
        let axes = e.axes();
        Self {
            matrix: [[m[(0, 0)], m[(0, 1)]], [m[(1, 0)], m[(1, 1)]]],
            center_xy: [e.center().x, e.center().y],
            semi_axes: [axes.a, axes.b],
            angle: axes.angle,
            discriminant: e.discriminant(),
        }
    }
}

impl From<Ellipse> for EllipseReport {
    fn from(e: Ellipse) -> Self {
        Self::from(&e)
    }
}

/// Fit output with convergence details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub ellipse: EllipseReport,
    pub iterations: usize,
    pub final_update: f64,
    pub weights: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub boundary_samples: Vec<[f64; 2]>,
}

impl From<&FitResult> for FitReport {
    fn from(fit: &FitResult) -> Self {
        Self {
            ellipse: EllipseReport::from(&fit.ellipse),
            iterations: fit.iterations,
            final_update: fit.final_update,
            weights: fit.weights.clone(),
            boundary_samples: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisReport {
    pub angle_deg: f64,
    pub roots: [[f64; 2]; 2],
    pub point: [f64; 2],
    pub radius: f64,
    pub radial_delta: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub fallback: bool,
}

impl From<&AxisIntersection> for AxisReport {
    fn from(a: &AxisIntersection) -> Self {
        Self {
            angle_deg: a.angle_deg,
            roots: a.roots,
            point: a.point,
            radius: a.radius,
            radial_delta: a.radial_delta,
            fallback: a.fallback,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveReport {
    pub antenna: usize,
    pub direction: Direction,
    pub distance_mm: f64,
    pub steps: u32,
    pub clamped: bool,
}

impl From<&MoveCommand> for MoveReport {
    fn from(m: &MoveCommand) -> Self {
        Self {
            antenna: m.antenna,
            direction: m.direction,
            distance_mm: m.distance_mm,
            steps: m.steps,
            clamped: m.clamped,
        }
    }
}

/// Plan output: an ellipse plan carries the fit and per-axis detail, a
/// circle plan its target radius.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ellipse: Option<EllipseReport>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub axes: Vec<AxisReport>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_radius_mm: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub capped: bool,
    pub moves: Vec<MoveReport>,
}

impl From<&EllipsePlan> for PlanReport {
    fn from(plan: &EllipsePlan) -> Self {
        Self {
            ellipse: Some(EllipseReport::from(&plan.ellipse)),
            axes: plan.axes.iter().map(AxisReport::from).collect(),
            target_radius_mm: None,
            capped: false,
            moves: plan.moves.iter().map(MoveReport::from).collect(),
        }
    }
}

impl From<&CirclePlan> for PlanReport {
    fn from(plan: &CirclePlan) -> Self {
        Self {
            ellipse: None,
            axes: Vec::new(),
            target_radius_mm: Some(plan.target_radius_mm),
            capped: plan.capped,
            moves: plan.moves.iter().map(MoveReport::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArraySummary {
    pub name: String,
    pub steps_per_mm: f64,
    pub antenna_count: usize,
    pub min_home_radius_mm: f64,
    /// Per antenna: `[angle_deg, inner_radius_mm, home_radius_mm]`.
    pub ranges: Vec<[f64; 3]>,
}

impl From<&AntennaArray> for ArraySummary {
    fn from(array: &AntennaArray) -> Self {
        Self {
            name: array.name.clone(),
            steps_per_mm: array.steps_per_mm,
            antenna_count: array.len(),
            min_home_radius_mm: array.min_home_radius_mm(),
            ranges: array
                .antennas()
                .iter()
                .map(|a| [a.angle_deg, a.inner_radius_mm(), a.home_radius_mm])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{plan_circle, plan_ellipse, PlanConfig};
    use crate::test_utils::homed_positions;

    #[test]
    fn ellipse_report_fields() {
        let e = Ellipse::from_coeffs(0.01, 0.0, 0.04, 1.0, 2.0).unwrap();
        let r = EllipseReport::from(e);
        assert_eq!(r.matrix, [[0.01, 0.0], [0.0, 0.04]]);
        assert_eq!(r.center_xy, [1.0, 2.0]);
        assert!((r.semi_axes[0] - 10.0).abs() < 1e-9);
        assert!((r.semi_axes[1] - 5.0).abs() < 1e-9);
        assert!(r.discriminant < 0.0);
    }

    #[test]
    fn circle_plan_json_omits_ellipse_fields() {
        let arr = AntennaArray::default();
        let plan = plan_circle(&arr, &[70.0; 8], 5.0).unwrap();
        let json = serde_json::to_value(PlanReport::from(&plan)).unwrap();
        assert!(json.get("ellipse").is_none());
        assert!(json.get("axes").is_none());
        assert_eq!(json["target_radius_mm"], 75.0);
        assert_eq!(json["moves"].as_array().map(Vec::len), Some(8));
        assert_eq!(json["moves"][0]["direction"], "backward");
        assert_eq!(json["moves"][0]["steps"], 125);
    }

    #[test]
    fn ellipse_plan_json_has_axes() {
        let arr = AntennaArray::default();
        let angles: Vec<f64> = arr.antennas().iter().map(|a| a.angle_deg).collect();
        let pos = homed_positions(&angles, 85.0, 75.0, [0.0, 0.0], 0.0);
        let plan = plan_ellipse(&arr, &pos, &PlanConfig::default()).unwrap();
        let json = serde_json::to_value(PlanReport::from(&plan)).unwrap();
        assert_eq!(json["axes"].as_array().map(Vec::len), Some(8));
        assert!(json["ellipse"]["discriminant"].as_f64().unwrap() < 0.0);
        assert!(json.get("target_radius_mm").is_none());
    }

    #[test]
    fn array_summary() {
        let s = ArraySummary::from(&AntennaArray::default());
        assert_eq!(s.antenna_count, 8);
        assert_eq!(s.min_home_radius_mm, 100.0);
        assert_eq!(s.ranges[0], [90.0, 70.5, 110.5]);
    }
}
