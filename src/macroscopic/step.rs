//! Velocity field construction, fire spread, and the per-step density
//! update.
//!

use super::DensityEngine;
use crate::envelope::SimulationOutcome;
use crate::error::SimError;
use crate::field::Field;
use log::warn;

/// Fire-spread convolution kernel.
const FIRE_KERNEL: [[f64; 3]; 3] = [[0.05, 0.2, 0.05], [0.2, 0.0, 0.2], [0.05, 0.2, 0.05]];
/// Fraction of the kernel response added per step.
const FIRE_SPREAD_RATE: f64 = 0.1;
/// Weight of the fire-avoidance perturbation on the velocity field.
const FIRE_AVOIDANCE: f64 = 0.5;
/// Steps between velocity-field refreshes.
const VELOCITY_REFRESH_INTERVAL: usize = 10;
/// Consecutive degenerate steps tolerated before the run aborts.
const MAX_DIRTY_STEPS: usize = 3;

impl DensityEngine {
    /// Executes the full run, recording the pre-update state each step.
    pub fn run(&mut self) -> Result<SimulationOutcome, SimError> {
        let params = self.params;
        let mut density_history = Vec::with_capacity(params.time_steps);
        let mut velocity_x_history = Vec::with_capacity(params.time_steps);
        let mut velocity_y_history = Vec::with_capacity(params.time_steps);
        let mut fire_history = Vec::with_capacity(params.time_steps);
        let mut evacuated_count = Vec::with_capacity(params.time_steps);
        let mut warnings = Vec::new();
        let mut sanitized = false;
        let mut dirty_streak = 0;
        let mut truncated = false;

        for t in 0..params.time_steps {
            if self.stop_requested() {
                warn!("macroscopic run cancelled at step {}/{}", t, params.time_steps);
                warnings.push(format!("cancelled after {} of {} steps", t, params.time_steps));
                truncated = true;
                break;
            }

            // Snapshot before the update
            density_history.push(self.density.clone());
            velocity_x_history.push(self.velocity_x.clone());
            velocity_y_history.push(self.velocity_y.clone());
            fire_history.push(self.fire.clone());

            let evacuated = self.step(t);
            evacuated_count.push(evacuated);

            let replaced = self.density.sanitize() + self.fire.sanitize();
            if replaced > 0 {
                sanitized = true;
                dirty_streak += 1;
                warnings.push(format!("step {}: zeroed {} non-finite cells", t, replaced));
                if dirty_streak >= MAX_DIRTY_STEPS {
                    return Err(SimError::InternalNumerical(format!(
                        "non-finite density for {} consecutive steps",
                        dirty_streak
                    )));
                }
            } else {
                dirty_streak = 0;
            }
        }

        let recorded = density_history.len();
        let mut outcome = SimulationOutcome::with_meta(params.grid_resolution, recorded, params.dt);
        outcome.density = Some(density_history);
        outcome.velocity_x = Some(velocity_x_history);
        outcome.velocity_y = Some(velocity_y_history);
        outcome.fire = Some(fire_history);
        outcome.evacuated_count = Some(evacuated_count);
        outcome.truncated = truncated;
        outcome.mock_data = sanitized;
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// One PDE step at horizon index `t`. Returns the mass evacuated this
    /// step (`Σ dt·γ·E·ρ`, taken before the positivity clamp). State may be
    /// inspected between steps.
    pub fn step(&mut self, t: usize) -> f64 {
        let params = self.params;
        let dx = self.raster.dx();
        let dt = params.dt;

        // Fire spreads during the first half of the horizon, then freezes
        if t < params.time_steps / 2 && self.fire.sum() > 0.0 {
            let spread = self.fire.conv3x3(&FIRE_KERNEL);
            for i in 0..self.fire.data().len() {
                let next = self.fire.data()[i] + FIRE_SPREAD_RATE * spread.data()[i];
                self.fire.data_mut()[i] = next.clamp(0.0, 1.0);
            }
            self.fire.zero_where(&self.raster.wall_mask);
        }

        let divergence = self
            .density
            .flux_divergence(&self.velocity_x, &self.velocity_y, dx);
        let laplacian = self.density.laplacian(dx);

        let mut evacuated = 0.0;
        for i in 0..self.density.data().len() {
            let rho = self.density.data()[i];
            let sink = params.evacuation_rate * self.exit_field.data()[i] * rho;
            let burn = params.fire_coupling * self.fire.data()[i] * rho;
            evacuated += dt * sink;

            let next = rho - dt * divergence.data()[i] - dt * sink - dt * burn
                + dt * params.diffusion * laplacian.data()[i];
            self.density.data_mut()[i] = next.max(0.0);
        }
        self.density.zero_where(&self.raster.wall_mask);

        self.step_count += 1;
        if self.step_count % VELOCITY_REFRESH_INTERVAL == 0 {
            self.refresh_velocity_field();
        }

        evacuated
    }

    /// Rebuilds the unit velocity field from the exit potential and, where
    /// fire is present, tilts it away from the fire gradient before
    /// renormalizing to unit magnitude.
    pub(crate) fn refresh_velocity_field(&mut self) {
        let n = self.params.grid_resolution;

        // The potential is the raster's wall-aware exit distance; walls and
        // unreachable pockets carry a large finite stand-in so the gradient
        // stays defined and points back toward reachable cells
        let mut potential = self.raster.exit_distance.clone();
        let ceiling = 2.0 * n as f64;
        potential.map_inplace(|v| if v.is_finite() { v } else { ceiling });

        let (gx, gy) = potential.gradient();
        let mut vx = Field::zeros(n);
        let mut vy = Field::zeros(n);
        for i in 0..gx.data().len() {
            let magnitude = (gx.data()[i].powi(2) + gy.data()[i].powi(2)).sqrt();
            if magnitude > 0.0 {
                // Descend the potential toward the nearest exit
                vx.data_mut()[i] = -gx.data()[i] / magnitude;
                vy.data_mut()[i] = -gy.data()[i] / magnitude;
            }
        }

        if self.fire.sum() > 0.0 {
            let (fgx, fgy) = self.fire.gradient();
            for i in 0..vx.data().len() {
                let magnitude = (fgx.data()[i].powi(2) + fgy.data()[i].powi(2)).sqrt();
                if magnitude > 0.0 {
                    let intensity = self.fire.data()[i];
                    vx.data_mut()[i] -= FIRE_AVOIDANCE * (fgx.data()[i] / magnitude) * intensity;
                    vy.data_mut()[i] -= FIRE_AVOIDANCE * (fgy.data()[i] / magnitude) * intensity;
                }
            }
            // Renormalize to unit magnitude after the perturbation
            for i in 0..vx.data().len() {
                let magnitude = (vx.data()[i].powi(2) + vy.data()[i].powi(2)).sqrt();
                if magnitude > 0.0 {
                    vx.data_mut()[i] /= magnitude;
                    vy.data_mut()[i] /= magnitude;
                }
            }
        }

        vx.zero_where(&self.raster.wall_mask);
        vy.zero_where(&self.raster.wall_mask);
        self.velocity_x = vx;
        self.velocity_y = vy;
    }
}
