//! # Scenario Module - Evacuation Input Model
//!
//! This module defines the serde data model for evacuation scenarios: the
//! floor plan (wall segments, exit points, seeded agent clusters), the hazard
//! list, and the scalar knobs carried alongside them. A `Scenario` is
//! immutable during a run; every solver consumes it through the shared
//! rasterizer.
//!
//! The JSON layout matches the external scenario documents:
//!
//! ```json
//! {
//!   "id": "…", "name": "…", "description": "…", "type": "building",
//!   "num_agents": 100, "panic_factor": 1.2, "time_steps": 100,
//!   "building_layout": {
//!     "walls": [[[0.0, 0.0], [20.0, 0.0]]],
//!     "exits": [[10.0, 0.0]],
//!     "initial_positions": [{"x": 5.0, "y": 8.0, "count": 20}]
//!   },
//!   "hazards": [
//!     {"position": [5.0, 5.0], "type": "fire", "radius": 2.0, "intensity": 0.9}
//!   ]
//! }
//! ```
//!
//! Coordinates are meters in `[0, 20]` by default. Unknown hazard `type`
//! strings deserialize as generic repulsors and never feed the fire field.

use crate::error::SimError;
use crate::vector::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

/// Default side length of the square world domain in meters.
pub const WORLD_SIZE: f64 = 20.0;

/// A wall segment between two points, in meters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Wall(pub [f64; 2], pub [f64; 2]);

impl Wall {
    /// Start point of the segment.
    pub fn start(&self) -> Vec2 {
        Vec2::new(self.0[0], self.0[1])
    }

    /// End point of the segment.
    pub fn end(&self) -> Vec2 {
        Vec2::new(self.1[0], self.1[1])
    }

    /// Segment length in meters.
    pub fn length(&self) -> f64 {
        self.start().distance_to(&self.end())
    }
}

/// A seeded cluster of agents around a point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InitialCluster {
    pub x: f64,
    pub y: f64,
    pub count: usize,
}

impl InitialCluster {
    /// Cluster center as a vector.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Floor-plan geometry: walls, exits, and seeded agent clusters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingLayout {
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub exits: Vec<[f64; 2]>,
    #[serde(default)]
    pub initial_positions: Vec<InitialCluster>,
}

impl BuildingLayout {
    /// Exit points as vectors.
    pub fn exit_points(&self) -> Vec<Vec2> {
        self.exits.iter().map(|e| Vec2::new(e[0], e[1])).collect()
    }
}

/// Hazard classification.
///
/// The fire field of the macroscopic solver is fed only by `Fire` hazards;
/// `Structural` feeds the structural damage field; everything else, including
/// unrecognized type strings, acts as a generic repulsor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Fire,
    Structural,
    Flood,
    Earthquake,
    #[serde(other)]
    Generic,
}

/// A circular hazard disc with linearly decaying intensity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    /// Center in meters.
    pub position: [f64; 2],
    #[serde(rename = "type", default = "Hazard::default_kind")]
    pub kind: HazardKind,
    #[serde(default = "Hazard::default_radius")]
    pub radius: f64,
    #[serde(default = "Hazard::default_intensity")]
    pub intensity: f64,
}

impl Hazard {
    fn default_kind() -> HazardKind {
        HazardKind::Fire
    }

    fn default_radius() -> f64 {
        2.0
    }

    fn default_intensity() -> f64 {
        1.0
    }

    /// Hazard center as a vector.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.position[0], self.position[1])
    }
}

/// Scenario category used by the scenario library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    #[default]
    Building,
    Mall,
    Stadium,
    School,
    Public,
}

/// A complete evacuation scenario.
///
/// Immutable input to all solvers. Validation happens up front via
/// [`Scenario::validate`] so that no state is allocated for an unusable
/// floor plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: ScenarioKind,
    #[serde(default = "Scenario::default_num_agents")]
    pub num_agents: usize,
    #[serde(default = "Scenario::default_panic_factor")]
    pub panic_factor: f64,
    #[serde(default = "Scenario::default_time_steps")]
    pub time_steps: usize,
    #[serde(default)]
    pub building_layout: BuildingLayout,
    #[serde(default)]
    pub hazards: Vec<Hazard>,
}

impl Scenario {
    fn default_num_agents() -> usize {
        100
    }

    fn default_panic_factor() -> f64 {
        1.2
    }

    fn default_time_steps() -> usize {
        100
    }

    /// Builds a bare scenario from a layout, with default knobs.
    pub fn from_layout(layout: BuildingLayout) -> Self {
        Scenario {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            kind: ScenarioKind::Building,
            num_agents: Self::default_num_agents(),
            panic_factor: Self::default_panic_factor(),
            time_steps: Self::default_time_steps(),
            building_layout: layout,
            hazards: Vec::new(),
        }
    }

    /// Validates the scenario before any solver state is allocated.
    ///
    /// A scenario with zero exits is rejected: no solver can make progress
    /// against it. Zero walls is legal (an open field) but logged as a
    /// warning. Malformed geometry, such as non-finite coordinates or a
    /// negative hazard radius, is rejected.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.building_layout.exits.is_empty() {
            return Err(SimError::InvalidScenario(
                "building layout must include at least one exit".into(),
            ));
        }
        if self.building_layout.walls.is_empty() {
            warn!(
                "scenario '{}' has no walls; running against an open domain",
                self.name
            );
        }
        for (i, wall) in self.building_layout.walls.iter().enumerate() {
            let coords = [wall.0[0], wall.0[1], wall.1[0], wall.1[1]];
            if coords.iter().any(|c| !c.is_finite()) {
                return Err(SimError::InvalidScenario(format!(
                    "wall segment {} has non-finite coordinates",
                    i
                )));
            }
        }
        for (i, exit) in self.building_layout.exits.iter().enumerate() {
            if !exit[0].is_finite() || !exit[1].is_finite() {
                return Err(SimError::InvalidScenario(format!(
                    "exit {} has non-finite coordinates",
                    i
                )));
            }
        }
        for (i, hazard) in self.hazards.iter().enumerate() {
            if hazard.radius <= 0.0 || !hazard.radius.is_finite() {
                return Err(SimError::InvalidScenario(format!(
                    "hazard {} has non-positive radius {}",
                    i, hazard.radius
                )));
            }
            if hazard.intensity < 0.0 || !hazard.intensity.is_finite() {
                return Err(SimError::InvalidScenario(format!(
                    "hazard {} has negative intensity {}",
                    i, hazard.intensity
                )));
            }
        }
        if self.panic_factor < 0.0 {
            return Err(SimError::InvalidScenario(format!(
                "panic factor must be non-negative, got {}",
                self.panic_factor
            )));
        }
        Ok(())
    }

    /// Total agent count seeded by the initial clusters, or zero when the
    /// scenario relies on random placement.
    pub fn seeded_agent_count(&self) -> usize {
        self.building_layout
            .initial_positions
            .iter()
            .map(|c| c.count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_layout() -> BuildingLayout {
        BuildingLayout {
            walls: vec![
                Wall([0.0, 0.0], [20.0, 0.0]),
                Wall([0.0, 0.0], [0.0, 20.0]),
                Wall([0.0, 20.0], [20.0, 20.0]),
                Wall([20.0, 0.0], [20.0, 20.0]),
            ],
            exits: vec![[10.0, 0.0]],
            initial_positions: vec![InitialCluster {
                x: 10.0,
                y: 15.0,
                count: 30,
            }],
        }
    }

    #[test]
    fn validate_accepts_box_scenario() {
        let scenario = Scenario::from_layout(box_layout());
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.seeded_agent_count(), 30);
    }

    #[test]
    fn validate_rejects_missing_exits() {
        let mut layout = box_layout();
        layout.exits.clear();
        let scenario = Scenario::from_layout(layout);
        let err = scenario.validate().unwrap_err();
        assert_eq!(err.kind(), "invalid_scenario");
    }

    #[test]
    fn validate_rejects_bad_hazard() {
        let mut scenario = Scenario::from_layout(box_layout());
        scenario.hazards.push(Hazard {
            position: [5.0, 5.0],
            kind: HazardKind::Fire,
            radius: -1.0,
            intensity: 0.5,
        });
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn unknown_hazard_type_becomes_generic() {
        let json = r#"{
            "position": [3.0, 4.0],
            "type": "chemical_spill",
            "radius": 1.5,
            "intensity": 0.7
        }"#;
        let hazard: Hazard = serde_json::from_str(json).unwrap();
        assert_eq!(hazard.kind, HazardKind::Generic);
    }

    #[test]
    fn scenario_json_round_trip() {
        let json = r#"{
            "id": "s1",
            "name": "Box",
            "description": "test box",
            "type": "school",
            "num_agents": 42,
            "panic_factor": 1.1,
            "time_steps": 80,
            "building_layout": {
                "walls": [[[0.0, 0.0], [10.0, 0.0]]],
                "exits": [[5.0, 0.0]],
                "initial_positions": [{"x": 5.0, "y": 8.0, "count": 20}]
            },
            "hazards": [
                {"position": [2.0, 2.0], "type": "fire", "radius": 1.0, "intensity": 0.8}
            ]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.kind, ScenarioKind::School);
        assert_eq!(scenario.num_agents, 42);
        assert_eq!(scenario.building_layout.walls.len(), 1);
        assert_eq!(scenario.hazards[0].kind, HazardKind::Fire);

        let back = serde_json::to_string(&scenario).unwrap();
        let again: Scenario = serde_json::from_str(&back).unwrap();
        assert_eq!(again.time_steps, 80);
        assert!((again.panic_factor - 1.1).abs() < 1e-12);
    }

    #[test]
    fn defaults_fill_missing_knobs() {
        let json = r#"{
            "building_layout": { "exits": [[1.0, 1.0]] }
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.num_agents, 100);
        assert_eq!(scenario.time_steps, 100);
        assert!((scenario.panic_factor - 1.2).abs() < 1e-12);
    }
}
