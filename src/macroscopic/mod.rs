//! # Macroscopic Module - Crowd-Density PDE Solver
//!
//! Evolves a scalar crowd density by an advection–diffusion–reaction
//! equation on the shared raster grid:
//!
//! ```text
//! ∂ρ/∂t + ∇·(vρ) = D ∇²ρ − γ·E(x)·ρ − λf·F(x,t)·ρ
//! ```
//!
//! where `E` is the exit mask and `F` a coupled fire field that spreads by a
//! 3×3 kernel during the first half of the horizon, then freezes. The
//! velocity field `v` descends the raster's wall-aware exit-distance
//! potential at unit magnitude and is refreshed every ten steps with a
//! fire-avoidance perturbation, renormalized to unit length.
//!
//! The scheme is explicit and first-order; the diffusion term is
//! conditionally stable (`4·D·dt/dx² < 1`). Runs above the configured
//! resolution or horizon caps divert to the mock oracle with capped
//! parameters instead of failing.
//!
//! ## Submodules
//!
//! - [`step`]: velocity field, fire spread, and the per-step update
//! - [`tests`]: unit tests for initialization, fire, and the update rule

// Velocity field, fire spread, per-step update
pub mod step;
// Unit tests
pub mod tests;

use crate::config::{EngineConfig, MacroPreset};
use crate::envelope::SimulationOutcome;
use crate::error::SimError;
use crate::field::Field;
use crate::geometry::{Raster, rasterize};
use crate::mock::mock_macroscopic;
use crate::scenario::{HazardKind, Scenario, WORLD_SIZE};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Parameters of a macroscopic run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacroParams {
    /// Grid resolution (cells per side).
    pub grid_resolution: usize,
    /// Number of integration steps.
    pub time_steps: usize,
    /// Diffusion coefficient `D`.
    pub diffusion: f64,
    /// Evacuation sink coefficient `γ`.
    pub evacuation_rate: f64,
    /// Fire reaction coefficient `λf`.
    pub fire_coupling: f64,
    /// Integration time step in seconds.
    pub dt: f64,
}

impl Default for MacroParams {
    fn default() -> Self {
        MacroParams {
            grid_resolution: 100,
            time_steps: 100,
            diffusion: 0.5,
            evacuation_rate: 1.5,
            fire_coupling: 0.2,
            dt: 0.1,
        }
    }
}

impl MacroParams {
    /// Applies a named preset on top of the defaults.
    pub fn from_preset(preset: &MacroPreset) -> Self {
        MacroParams {
            grid_resolution: preset.grid_resolution,
            evacuation_rate: preset.evacuation_coefficient,
            ..Default::default()
        }
    }

    /// Rejects out-of-range parameters before allocation.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.grid_resolution < 3 {
            return Err(SimError::InvalidParameters(format!(
                "grid_resolution must be at least 3, got {}",
                self.grid_resolution
            )));
        }
        if self.time_steps == 0 {
            return Err(SimError::InvalidParameters("time_steps must be positive".into()));
        }
        if self.dt <= 0.0 || !self.dt.is_finite() {
            return Err(SimError::InvalidParameters(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if self.diffusion < 0.0 || self.evacuation_rate < 0.0 || self.fire_coupling < 0.0 {
            return Err(SimError::InvalidParameters(
                "diffusion, evacuation, and fire coefficients must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Finite-difference engine for the density PDE.
pub struct DensityEngine {
    params: MacroParams,
    raster: Raster,
    /// Crowd density.
    density: Field,
    /// Unit velocity components descending the exit potential.
    velocity_x: Field,
    velocity_y: Field,
    /// Fire intensity in `[0, 1]`.
    fire: Field,
    /// Structural damage intensity (rasterized, uncoupled from the PDE).
    structural: Field,
    /// Exit sink indicator (0/1 per cell).
    exit_field: Field,
    step_count: usize,
    should_stop: Arc<AtomicBool>,
}

impl DensityEngine {
    /// Builds the engine: rasterizes the scenario, seeds the density, and
    /// computes the initial velocity field from the exit potential.
    pub fn new(scenario: &Scenario, params: MacroParams) -> Result<Self, SimError> {
        params.validate()?;
        let raster = rasterize(scenario, params.grid_resolution, WORLD_SIZE)?;
        let n = params.grid_resolution;
        let dx = raster.dx();

        // Initial density: seeded clusters as count/dx², or a central
        // radial hump of height 5/dx²
        let mut density = Field::zeros(n);
        let clusters = &scenario.building_layout.initial_positions;
        if clusters.is_empty() {
            let center = (n / 2) as f64;
            let radius = (n / 8) as f64;
            let height = 5.0 / (dx * dx);
            for y in 0..n {
                for x in 0..n {
                    let d = ((x as f64 - center).powi(2) + (y as f64 - center).powi(2)).sqrt();
                    if d < radius {
                        density.set(x, y, height);
                    }
                }
            }
        } else {
            for cluster in clusters {
                let x = crate::field::world_to_grid(cluster.x, n, WORLD_SIZE);
                let y = crate::field::world_to_grid(cluster.y, n, WORLD_SIZE);
                density.add(x, y, cluster.count as f64 / (dx * dx));
            }
        }
        density.zero_where(&raster.wall_mask);

        let mut fire = raster
            .hazard_field(HazardKind::Fire)
            .cloned()
            .unwrap_or_else(|| Field::zeros(n));
        fire.clamp_inplace(0.0, 1.0);
        fire.zero_where(&raster.wall_mask);

        let mut structural = raster
            .hazard_field(HazardKind::Structural)
            .cloned()
            .unwrap_or_else(|| Field::zeros(n));
        structural.zero_where(&raster.wall_mask);

        let exit_field = raster.exit_mask.to_field();

        let mut engine = DensityEngine {
            params,
            raster,
            density,
            velocity_x: Field::zeros(n),
            velocity_y: Field::zeros(n),
            fire,
            structural,
            exit_field,
            step_count: 0,
            should_stop: Arc::new(AtomicBool::new(false)),
        };
        engine.refresh_velocity_field();

        info!(
            "density engine: {}x{} grid, dx = {:.3} m, {} steps",
            n, n, dx, params.time_steps
        );
        Ok(engine)
    }

    /// Run parameters.
    pub fn parameters(&self) -> &MacroParams {
        &self.params
    }

    /// Steps completed so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// The shared raster backing this run.
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Current crowd density.
    pub fn density(&self) -> &Field {
        &self.density
    }

    /// Current fire field.
    pub fn fire(&self) -> &Field {
        &self.fire
    }

    /// Rasterized structural damage field (not coupled into the update).
    pub fn structural(&self) -> &Field {
        &self.structural
    }

    /// Current velocity components.
    pub fn velocity(&self) -> (&Field, &Field) {
        (&self.velocity_x, &self.velocity_y)
    }

    /// Cloned atomic flag for external cancellation; the run stops at the
    /// next step boundary.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.should_stop)
    }

    /// Requests cancellation at the next step boundary.
    pub fn stop(&self) {
        self.should_stop.store(true, Ordering::Relaxed);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.should_stop.load(Ordering::Relaxed)
    }
}

/// Runs a macroscopic simulation for a scenario.
///
/// Applies the performance safeguard before dispatch: a request above the
/// configured caps is served by the mock oracle at capped parameters, with
/// the downshift recorded in the envelope. A run that trips the numerical
/// containment policy three steps in a row also falls through to the oracle.
pub fn simulate(
    scenario: &Scenario,
    params: MacroParams,
    config: &EngineConfig,
) -> Result<SimulationOutcome, SimError> {
    params.validate()?;
    scenario.validate()?;

    let limits = config.limits;
    if params.grid_resolution > limits.max_grid_resolution
        || params.time_steps > limits.max_time_steps
    {
        let capped_n = params.grid_resolution.min(limits.max_grid_resolution);
        let capped_t = params.time_steps.min(limits.max_time_steps);
        warn!(
            "macroscopic request {}x{} cells / {} steps exceeds caps; serving mock at {}x{} / {}",
            params.grid_resolution,
            params.grid_resolution,
            params.time_steps,
            capped_n,
            capped_n,
            capped_t
        );
        let mut outcome = mock_macroscopic(scenario, capped_n, capped_t)?;
        outcome.warnings.push(format!(
            "resource limits exceeded: request {}x{}/{} capped to {}x{}/{}",
            params.grid_resolution,
            params.grid_resolution,
            params.time_steps,
            capped_n,
            capped_n,
            capped_t
        ));
        return Ok(outcome);
    }

    if config.mock {
        return mock_macroscopic(scenario, params.grid_resolution, params.time_steps);
    }

    let mut engine = DensityEngine::new(scenario, params)?;
    match engine.run() {
        Ok(outcome) => Ok(outcome),
        Err(SimError::InternalNumerical(msg)) => {
            warn!("macroscopic run degenerated ({}); falling back to mock", msg);
            let mut outcome =
                mock_macroscopic(scenario, params.grid_resolution, params.time_steps)?;
            outcome
                .warnings
                .push(format!("numerical failure in native run: {}", msg));
            Ok(outcome)
        }
        Err(other) => Err(other),
    }
}
