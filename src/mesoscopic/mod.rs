//! # Mesoscopic Module - BGK Lattice Solver
//!
//! Evolves a discrete-velocity distribution `f_k(x, y)` with `k = 0..7`
//! compass directions `c_k = (cos 2πk/8, sin 2πk/8)` over the shared raster
//! grid. Each step applies, in order:
//!
//! 1. macroscopic moments (density and cell velocity),
//! 2. BGK collision toward the isotropic equilibrium `ρ/K`, with a slower
//!    relaxation time in overcrowded cells,
//! 3. hazard repulsion injected along directions pointing down the hazard
//!    gradient, bounded by the local density,
//! 4. exit attraction injected along directions pointing up the
//!    exit-attraction gradient, bounded by the local density,
//! 5. streaming of each channel by one lattice cell per component, and
//! 6. wall boundary enforcement (`f_k(wall) = 0`).
//!
//! Mass leaves the system only by streaming off the grid or into wall
//! cells; open exits on the domain boundary act as the sink.
//!
//! ## Submodules
//!
//! - [`step`]: the per-step update kernel
//! - [`tests`]: unit tests for moments, collision, and streaming

// Per-step update kernel
pub mod step;
// Unit tests
pub mod tests;

use crate::config::{EngineConfig, MesoPreset};
use crate::envelope::SimulationOutcome;
use crate::error::SimError;
use crate::field::Field;
use crate::geometry::{Raster, rasterize};
use crate::mock::mock_mesoscopic;
use crate::scenario::{Scenario, WORLD_SIZE};
use crate::vector::Vec2;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Number of discrete velocity directions.
pub const NUM_DIRECTIONS: usize = 8;

/// Parameters of a mesoscopic run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MesoParams {
    /// Grid resolution (cells per side).
    pub grid_size: usize,
    /// Number of lattice steps.
    pub time_steps: usize,
    /// Crowding threshold in agents/m² above which relaxation slows down.
    pub density_threshold: f64,
    /// Reported time step in seconds.
    pub dt: f64,
}

impl Default for MesoParams {
    fn default() -> Self {
        MesoParams {
            grid_size: 50,
            time_steps: 100,
            density_threshold: 4.0,
            dt: 0.1,
        }
    }
}

impl MesoParams {
    /// Applies a named preset on top of the defaults.
    pub fn from_preset(preset: &MesoPreset) -> Self {
        MesoParams {
            grid_size: preset.grid_size,
            density_threshold: preset.density_threshold,
            ..Default::default()
        }
    }

    /// Rejects out-of-range parameters before allocation.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.grid_size < 2 {
            return Err(SimError::InvalidParameters(format!(
                "grid_size must be at least 2, got {}",
                self.grid_size
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
        if self.density_threshold <= 0.0 {
            return Err(SimError::InvalidParameters(format!(
                "density_threshold must be positive, got {}",
                self.density_threshold
            )));
        }
        Ok(())
    }
}

/// Double-buffered lattice engine over the shared raster.
pub struct LatticeEngine {
    params: MesoParams,
    raster: Raster,
    directions: [Vec2; NUM_DIRECTIONS],
    shifts: [(isize, isize); NUM_DIRECTIONS],
    /// Distribution channels, one field per direction.
    f: Vec<Field>,
    /// Streaming target buffer.
    f_next: Vec<Field>,
    /// Aggregated hazard intensity (static over the run).
    hazard: Field,
    /// Hazard gradient components (static over the run).
    hazard_grad: (Field, Field),
    /// Exit-attraction gradient components (static over the run).
    attraction_grad: (Field, Field),
    step_count: usize,
    should_stop: Arc<AtomicBool>,
}

impl LatticeEngine {
    /// Builds the engine: rasterizes the scenario, seeds the initial
    /// density, and caches the static hazard and exit-attraction gradients.
    pub fn new(scenario: &Scenario, params: MesoParams) -> Result<Self, SimError> {
        params.validate()?;
        let raster = rasterize(scenario, params.grid_size, WORLD_SIZE)?;
        let n = params.grid_size;

        let mut directions = [Vec2::zero(); NUM_DIRECTIONS];
        let mut shifts = [(0isize, 0isize); NUM_DIRECTIONS];
        for (k, direction) in directions.iter_mut().enumerate() {
            *direction = Vec2::from_angle(2.0 * PI * k as f64 / NUM_DIRECTIONS as f64);
            shifts[k] = (
                direction.x.round() as isize,
                direction.y.round() as isize,
            );
        }

        // Initial spatial density: seeded clusters, or a central block
        let mut density = Field::zeros(n);
        let clusters = &scenario.building_layout.initial_positions;
        if clusters.is_empty() {
            let center = (n / 2) as f64;
            let radius = (n / 8) as f64;
            for y in 0..n {
                for x in 0..n {
                    let d = ((x as f64 - center).powi(2) + (y as f64 - center).powi(2)).sqrt();
                    if d < radius {
                        density.set(x, y, 5.0);
                    }
                }
            }
        } else {
            for cluster in clusters {
                let x = crate::field::world_to_grid(cluster.x, n, WORLD_SIZE);
                let y = crate::field::world_to_grid(cluster.y, n, WORLD_SIZE);
                density.add(x, y, cluster.count as f64);
            }
        }
        density.zero_where(&raster.wall_mask);

        // Uniform split across the eight channels
        let mut f = Vec::with_capacity(NUM_DIRECTIONS);
        for _ in 0..NUM_DIRECTIONS {
            let mut channel = density.clone();
            channel.map_inplace(|v| v / NUM_DIRECTIONS as f64);
            f.push(channel);
        }

        let hazard = raster.hazard_total();
        let hazard_grad = hazard.gradient();

        // Exit attraction peaks at exits and decays with straight-line
        // distance, length scale N/10
        let mut attraction = Field::zeros(n);
        let scale = (n as f64 / 10.0).max(1.0);
        for y in 0..n {
            for x in 0..n {
                let mut best = 0.0_f64;
                for &(ex, ey) in &raster.exit_cells {
                    let d =
                        ((x as f64 - ex as f64).powi(2) + (y as f64 - ey as f64).powi(2)).sqrt();
                    best = best.max((-d / scale).exp());
                }
                attraction.set(x, y, best);
            }
        }
        let attraction_grad = attraction.gradient();

        info!(
            "lattice engine: {}x{} grid, {} channels, {} steps",
            n, n, NUM_DIRECTIONS, params.time_steps
        );

        Ok(LatticeEngine {
            params,
            f_next: vec![Field::zeros(n); NUM_DIRECTIONS],
            f,
            raster,
            directions,
            shifts,
            hazard,
            hazard_grad,
            attraction_grad,
            step_count: 0,
            should_stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Run parameters.
    pub fn parameters(&self) -> &MesoParams {
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

    /// Current distribution channels.
    pub fn channels(&self) -> &[Field] {
        &self.f
    }

    /// Total density (sum over channels).
    pub fn density(&self) -> Field {
        let n = self.params.grid_size;
        let mut rho = Field::zeros(n);
        for channel in &self.f {
            for (dst, &src) in rho.data_mut().iter_mut().zip(channel.data().iter()) {
                *dst += src;
            }
        }
        rho
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

/// Runs a mesoscopic simulation for a scenario.
///
/// Dispatches to the mock oracle when the engine config demands it, and
/// falls through to the oracle after three consecutive degenerate steps.
pub fn simulate(
    scenario: &Scenario,
    params: MesoParams,
    config: &EngineConfig,
) -> Result<SimulationOutcome, SimError> {
    params.validate()?;
    scenario.validate()?;

    if config.mock {
        return mock_mesoscopic(scenario, params.grid_size, params.time_steps);
    }

    let mut engine = LatticeEngine::new(scenario, params)?;
    match engine.run() {
        Ok(outcome) => Ok(outcome),
        Err(SimError::InternalNumerical(msg)) => {
            warn!("mesoscopic run degenerated ({}); falling back to mock", msg);
            let mut outcome = mock_mesoscopic(scenario, params.grid_size, params.time_steps)?;
            outcome
                .warnings
                .push(format!("numerical failure in native run: {}", msg));
            Ok(outcome)
        }
        Err(other) => Err(other),
    }
}
