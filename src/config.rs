//! # Config Module - Engine Configuration and Parameter Presets
//!
//! Holds the engine-wide configuration (mock switch, thread knob, resource
//! limits) and the research-based parameter presets for each solver family.
//!
//! The mock switch is an explicit configuration field, not hidden global
//! state: the binary reads the `DEV_MODE` environment variable once at
//! startup and materializes it here, so every solver call and every envelope
//! reflects which path produced it.

use crate::error::SimError;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Caps above which the macroscopic solver diverts to the mock oracle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub max_grid_resolution: usize,
    pub max_time_steps: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            max_grid_resolution: 200,
            max_time_steps: 150,
        }
    }
}

/// Engine-wide configuration shared by all solver calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Force the mock oracle for every solver call.
    #[serde(default)]
    pub mock: bool,
    /// Rayon worker count; `None` leaves the global pool untouched. The
    /// request surface's acceleration flag maps onto this knob.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Resource caps for the performance safeguard.
    #[serde(default)]
    pub limits: ResourceLimits,
}

impl EngineConfig {
    /// Builds a config from the process environment: `DEV_MODE=mock` turns
    /// the mock switch on. Called once by the binary; the library never
    /// reads environment variables itself.
    pub fn from_env() -> Self {
        let mock = std::env::var("DEV_MODE")
            .map(|v| v.eq_ignore_ascii_case("mock"))
            .unwrap_or(false);
        if mock {
            info!("DEV_MODE=mock: all solver calls will use the mock oracle");
        }
        EngineConfig {
            mock,
            ..Default::default()
        }
    }

    /// Loads a configuration file in TOML format.
    ///
    /// ```toml
    /// mock = false
    /// threads = 4
    ///
    /// [limits]
    /// max_grid_resolution = 200
    /// max_time_steps = 150
    /// ```
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| SimError::InvalidParameters(format!("bad config file: {}", e)))
    }
}

/// Parameter preset for the microscopic (social-force) solver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MicroPreset {
    pub panic_factor: f64,
    pub agent_count: usize,
    pub time_step: f64,
    pub desired_speed: f64,
    pub relaxation_time: f64,
}

/// Parameter preset for the mesoscopic (lattice) solver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MesoPreset {
    pub density_threshold: f64,
    pub grid_size: usize,
}

/// Parameter preset for the macroscopic (PDE) solver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacroPreset {
    pub evacuation_coefficient: f64,
    pub grid_resolution: usize,
}

/// Looks up a microscopic preset by name.
///
/// `standard` follows Weidmann's walking speed; `emergency` raises speed and
/// panic with faster reactions; `crowded` slows the crowd down and triples
/// the head count.
pub fn micro_preset(name: &str) -> Option<MicroPreset> {
    match name {
        "standard" => Some(MicroPreset {
            panic_factor: 1.0,
            agent_count: 100,
            time_step: 0.1,
            desired_speed: 1.34,
            relaxation_time: 0.5,
        }),
        "emergency" => Some(MicroPreset {
            panic_factor: 1.5,
            agent_count: 100,
            time_step: 0.05,
            desired_speed: 1.8,
            relaxation_time: 0.3,
        }),
        "crowded" => Some(MicroPreset {
            panic_factor: 1.2,
            agent_count: 300,
            time_step: 0.1,
            desired_speed: 1.0,
            relaxation_time: 0.6,
        }),
        _ => None,
    }
}

/// Looks up a mesoscopic preset by name.
pub fn meso_preset(name: &str) -> Option<MesoPreset> {
    match name {
        "standard" => Some(MesoPreset {
            density_threshold: 3.5,
            grid_size: 50,
        }),
        "high_density" => Some(MesoPreset {
            density_threshold: 5.0,
            grid_size: 50,
        }),
        "fire_scenario" => Some(MesoPreset {
            density_threshold: 3.0,
            grid_size: 60,
        }),
        _ => None,
    }
}

/// Looks up a macroscopic preset by name.
pub fn macro_preset(name: &str) -> Option<MacroPreset> {
    match name {
        "standard" => Some(MacroPreset {
            evacuation_coefficient: 1.0,
            grid_resolution: 100,
        }),
        "fire" => Some(MacroPreset {
            evacuation_coefficient: 1.5,
            grid_resolution: 120,
        }),
        "high_detail" => Some(MacroPreset {
            evacuation_coefficient: 1.2,
            grid_resolution: 200,
        }),
        _ => None,
    }
}
