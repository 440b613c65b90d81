//! Runtime antenna array description.
//!
//! Array JSON follows a versioned schema (`mwscanner.array.v1`). Each antenna
//! moves along a fixed radial axis through the head center; its `id` is also
//! its root-selection index.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::{AxisSelector, GeometryError};

const ARRAY_SCHEMA_V1: &str = "mwscanner.array.v1";

const DEFAULT_NAME: &str = "mwscanner_lab_8ch";
const DEFAULT_ANGLES_DEG: [f64; 8] = [90.0, 45.0, 0.0, 315.0, 270.0, 225.0, 180.0, 135.0];
/// Home-position distance between opposing antennas: 0–4, 1–5, 2–6, 3–7.
const DEFAULT_HOME_SPANS_MM: [f64; 4] = [221.0, 204.0, 204.0, 200.0];
const DEFAULT_TRAVEL_MM: f64 = 40.0;
/// 200 steps per revolution over an 8 mm lead screw.
const DEFAULT_STEPS_PER_MM: f64 = 25.0;
const MAX_ANTENNAS: usize = 8;

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors raised while loading or validating an array description.
#[derive(Debug)]
pub enum ArrayError {
    /// Reading the file failed.
    Io(std::io::Error),
    /// The JSON could not be parsed.
    Parse(serde_json::Error),
    /// Unknown schema tag.
    Schema {
        /// Schema string found in the file.
        found: String,
    },
    /// The description is inconsistent.
    Invalid(String),
}

impl std::fmt::Display for ArrayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read array description: {}", e),
            Self::Parse(e) => write!(f, "failed to parse array description: {}", e),
            Self::Schema { found } => write!(
                f,
                "unsupported array schema '{}' (expected '{}')",
                found, ARRAY_SCHEMA_V1
            ),
            Self::Invalid(msg) => write!(f, "invalid array description: {}", msg),
        }
    }
}

impl std::error::Error for ArrayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ArrayError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ArrayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

// ── Types ──────────────────────────────────────────────────────────────────

/// One antenna and its actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AntennaSpec {
    /// Antenna number (0–7); doubles as the root-selection index.
    pub id: usize,
    /// Axis angle from +x, degrees.
    pub angle_deg: f64,
    /// Distance from the head center at the home (fully retracted) position.
    pub home_radius_mm: f64,
    /// Actuator travel.
    pub travel_mm: f64,
}

impl AntennaSpec {
    /// Closest allowed distance from the head center.
    pub fn inner_radius_mm(&self) -> f64 {
        self.home_radius_mm - self.travel_mm
    }

    /// Root-selection rule for this antenna.
    pub fn selector(&self) -> Result<AxisSelector, GeometryError> {
        AxisSelector::from_index(self.id)
    }

    /// Cartesian position of this antenna at `radius_mm`.
    pub fn position_xy(&self, radius_mm: f64) -> [f64; 2] {
        AntennaArray::to_cartesian(radius_mm, self.angle_deg)
    }
}

/// Runtime array description used by the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct AntennaArray {
    pub name: String,
    pub steps_per_mm: f64,
    antennas: Vec<AntennaSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArraySpecV1 {
    schema: String,
    name: String,
    steps_per_mm: f64,
    antennas: Vec<AntennaSpec>,
}

impl AntennaArray {
    /// Build and validate an array description.
    pub fn new(
        name: impl Into<String>,
        steps_per_mm: f64,
        antennas: Vec<AntennaSpec>,
    ) -> Result<Self, ArrayError> {
        Self::from_spec(ArraySpecV1 {
            schema: ARRAY_SCHEMA_V1.to_string(),
            name: name.into(),
            steps_per_mm,
            antennas,
        })
    }

    /// Load an array description from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ArrayError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parse an array description from a JSON string.
    pub fn from_json_str(data: &str) -> Result<Self, ArrayError> {
        let spec: ArraySpecV1 = serde_json::from_str(data)?;
        Self::from_spec(spec)
    }

    /// Serialize to the versioned JSON schema.
    pub fn to_json_string(&self) -> Result<String, ArrayError> {
        let spec = ArraySpecV1 {
            schema: ARRAY_SCHEMA_V1.to_string(),
            name: self.name.clone(),
            steps_per_mm: self.steps_per_mm,
            antennas: self.antennas.clone(),
        };
        Ok(serde_json::to_string_pretty(&spec)?)
    }

    fn from_spec(spec: ArraySpecV1) -> Result<Self, ArrayError> {
        if spec.schema != ARRAY_SCHEMA_V1 {
            return Err(ArrayError::Schema { found: spec.schema });
        }
        validate_array_spec(&spec).map_err(ArrayError::Invalid)?;
        Ok(Self {
            name: spec.name,
            steps_per_mm: spec.steps_per_mm,
            antennas: spec.antennas,
        })
    }

    /// Number of antennas.
    pub fn len(&self) -> usize {
        self.antennas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.antennas.is_empty()
    }

    /// Antenna at position `index` in the array (not by id).
    pub fn antenna(&self, index: usize) -> Option<&AntennaSpec> {
        self.antennas.get(index)
    }

    pub fn antennas(&self) -> &[AntennaSpec] {
        &self.antennas
    }

    /// Smallest home radius over all antennas; the largest circle every
    /// antenna can reach.
    pub fn min_home_radius_mm(&self) -> f64 {
        self.antennas
            .iter()
            .map(|a| a.home_radius_mm)
            .fold(f64::INFINITY, f64::min)
    }

    /// Point at `radius_mm` along the axis at `angle_deg`.
    pub fn to_cartesian(radius_mm: f64, angle_deg: f64) -> [f64; 2] {
        let (s, c) = angle_deg.to_radians().sin_cos();
        [radius_mm * c, radius_mm * s]
    }

    /// Cartesian antenna positions, pairing `positions_mm` with the antennas
    /// in array order.
    pub fn coordinates(&self, positions_mm: &[f64]) -> Vec<[f64; 2]> {
        self.antennas
            .iter()
            .zip(positions_mm)
            .map(|(a, &r)| a.position_xy(r))
            .collect()
    }

    /// Whole motor steps covering `distance_mm` (truncated; negative → 0).
    pub fn distance_to_steps(&self, distance_mm: f64) -> u32 {
        (distance_mm * self.steps_per_mm).max(0.0) as u32
    }

    /// Linear distance covered by `steps`.
    pub fn steps_to_distance(&self, steps: u32) -> f64 {
        steps as f64 / self.steps_per_mm
    }
}

impl Default for AntennaArray {
    fn default() -> Self {
        let antennas = DEFAULT_ANGLES_DEG
            .iter()
            .enumerate()
            .map(|(id, &angle_deg)| AntennaSpec {
                id,
                angle_deg,
                home_radius_mm: DEFAULT_HOME_SPANS_MM[id % 4] / 2.0,
                travel_mm: DEFAULT_TRAVEL_MM,
            })
            .collect();
        Self {
            name: DEFAULT_NAME.to_string(),
            steps_per_mm: DEFAULT_STEPS_PER_MM,
            antennas,
        }
    }
}

fn validate_array_spec(spec: &ArraySpecV1) -> Result<(), String> {
    if spec.name.trim().is_empty() {
        return Err("array name must not be empty".to_string());
    }

    if !spec.steps_per_mm.is_finite() || spec.steps_per_mm <= 0.0 {
        return Err("steps_per_mm must be finite and > 0".to_string());
    }

    if spec.antennas.is_empty() || spec.antennas.len() > MAX_ANTENNAS {
        return Err(format!(
            "antenna count must be in 1..={}, got {}",
            MAX_ANTENNAS,
            spec.antennas.len()
        ));
    }

    let mut seen = [false; MAX_ANTENNAS];
    for a in &spec.antennas {
        if a.id >= MAX_ANTENNAS {
            return Err(format!("antenna id {} out of range 0..=7", a.id));
        }
        if seen[a.id] {
            return Err(format!("duplicate antenna id {}", a.id));
        }
        seen[a.id] = true;

        if !a.angle_deg.is_finite() {
            return Err(format!("antenna {}: angle_deg must be finite", a.id));
        }
        if !a.home_radius_mm.is_finite() || a.home_radius_mm <= 0.0 {
            return Err(format!(
                "antenna {}: home_radius_mm must be finite and > 0",
                a.id
            ));
        }
        if !a.travel_mm.is_finite() || a.travel_mm <= 0.0 {
            return Err(format!("antenna {}: travel_mm must be finite and > 0", a.id));
        }
        if a.travel_mm >= a.home_radius_mm {
            return Err(format!(
                "antenna {}: travel_mm ({}) must be below home_radius_mm ({})",
                a.id, a.travel_mm, a.home_radius_mm
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_array_matches_lab_rig() {
        let arr = AntennaArray::default();
        assert_eq!(arr.len(), 8);
        let homes: Vec<f64> = arr.antennas().iter().map(|a| a.home_radius_mm).collect();
        assert_eq!(homes, vec![110.5, 102.0, 102.0, 100.0, 110.5, 102.0, 102.0, 100.0]);
        let inner: Vec<f64> = arr.antennas().iter().map(|a| a.inner_radius_mm()).collect();
        assert_eq!(inner, vec![70.5, 62.0, 62.0, 60.0, 70.5, 62.0, 62.0, 60.0]);
        assert_eq!(arr.min_home_radius_mm(), 100.0);
        for a in arr.antennas() {
            let sel = a.selector().unwrap();
            assert_eq!(sel.canonical_angle_deg(), a.angle_deg);
        }
    }

    #[test]
    fn json_roundtrip() {
        let arr = AntennaArray::default();
        let json = arr.to_json_string().unwrap();
        assert!(json.contains(ARRAY_SCHEMA_V1));
        let back = AntennaArray::from_json_str(&json).unwrap();
        assert_eq!(back, arr);
    }

    #[test]
    fn rejects_wrong_schema() {
        let json = r#"{"schema":"mwscanner.array.v0","name":"x","steps_per_mm":25.0,
            "antennas":[{"id":0,"angle_deg":90.0,"home_radius_mm":100.0,"travel_mm":40.0}]}"#;
        assert!(matches!(
            AntennaArray::from_json_str(json),
            Err(ArrayError::Schema { .. })
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let json = r#"{"schema":"mwscanner.array.v1","name":"x","steps_per_mm":25.0,
            "antennas":[{"id":0,"angle_deg":90.0,"home_radius_mm":100.0,"travel_mm":40.0,"gain":3}]}"#;
        assert!(matches!(
            AntennaArray::from_json_str(json),
            Err(ArrayError::Parse(_))
        ));
    }

    #[test]
    fn validation_errors() {
        let ok = AntennaSpec {
            id: 0,
            angle_deg: 90.0,
            home_radius_mm: 100.0,
            travel_mm: 40.0,
        };
        assert!(AntennaArray::new("a", 25.0, vec![ok]).is_ok());
        assert!(matches!(
            AntennaArray::new(" ", 25.0, vec![ok]),
            Err(ArrayError::Invalid(_))
        ));
        assert!(matches!(
            AntennaArray::new("a", 0.0, vec![ok]),
            Err(ArrayError::Invalid(_))
        ));
        assert!(matches!(
            AntennaArray::new("a", 25.0, vec![]),
            Err(ArrayError::Invalid(_))
        ));
        assert!(matches!(
            AntennaArray::new("a", 25.0, vec![ok, ok]),
            Err(ArrayError::Invalid(_))
        ));
        let bad_id = AntennaSpec { id: 8, ..ok };
        assert!(matches!(
            AntennaArray::new("a", 25.0, vec![bad_id]),
            Err(ArrayError::Invalid(_))
        ));
        let too_long = AntennaSpec {
            travel_mm: 100.0,
            ..ok
        };
        assert!(matches!(
            AntennaArray::new("a", 25.0, vec![too_long]),
            Err(ArrayError::Invalid(_))
        ));
    }

    #[test]
    fn cartesian_conversion() {
        let p = AntennaArray::to_cartesian(10.0, 45.0);
        assert_relative_eq!(p[0], 7.0710678118654755, epsilon = 1e-12);
        assert_relative_eq!(p[1], 7.0710678118654755, epsilon = 1e-12);

        let arr = AntennaArray::default();
        let pts = arr.coordinates(&[100.0; 8]);
        assert_eq!(pts.len(), 8);
        assert_relative_eq!(pts[0][1], 100.0, epsilon = 1e-12);
        assert_relative_eq!(pts[2][0], 100.0, epsilon = 1e-12);
        assert_relative_eq!(pts[6][0], -100.0, epsilon = 1e-12);
    }

    #[test]
    fn step_conversion() {
        let arr = AntennaArray::default();
        assert_eq!(arr.distance_to_steps(10.0), 250);
        assert_eq!(arr.distance_to_steps(0.03), 0);
        assert_eq!(arr.distance_to_steps(-5.0), 0);
        assert_relative_eq!(arr.steps_to_distance(500), 20.0);
    }
}
