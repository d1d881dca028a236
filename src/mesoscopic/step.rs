//! Per-step update kernel for the lattice engine.
//!

use super::{LatticeEngine, NUM_DIRECTIONS};
use crate::envelope::SimulationOutcome;
use crate::error::SimError;
use crate::field::Field;
use log::warn;
use rayon::prelude::*;

/// Density below which a cell's velocity is treated as zero.
const DENSITY_FLOOR: f64 = 1e-5;
/// Hazard intensity below which no repulsion is injected.
const HAZARD_FLOOR: f64 = 0.01;
/// Relaxation time in free cells.
const TAU_FREE: f64 = 1.0;
/// Relaxation time in overcrowded cells.
const TAU_CROWDED: f64 = 2.0;
/// Weight of the exit-attraction injection.
const ATTRACTION_WEIGHT: f64 = 0.1;
/// Consecutive degenerate steps tolerated before the run aborts.
const MAX_DIRTY_STEPS: usize = 3;

impl LatticeEngine {
    /// Executes the full run, recording the pre-update state each step.
    pub fn run(&mut self) -> Result<SimulationOutcome, SimError> {
        let params = self.params;
        let mut density_history = Vec::with_capacity(params.time_steps);
        let mut velocity_x_history = Vec::with_capacity(params.time_steps);
        let mut velocity_y_history = Vec::with_capacity(params.time_steps);
        let mut occupancy = Vec::with_capacity(params.time_steps);
        let mut warnings = Vec::new();
        let mut sanitized = false;
        let mut dirty_streak = 0;
        let mut truncated = false;

        for t in 0..params.time_steps {
            if self.stop_requested() {
                warn!("mesoscopic run cancelled at step {}/{}", t, params.time_steps);
                warnings.push(format!("cancelled after {} of {} steps", t, params.time_steps));
                truncated = true;
                break;
            }

            let (rho, u, v) = self.moments();
            occupancy.push(rho.sum());
            density_history.push(rho);
            velocity_x_history.push(u);
            velocity_y_history.push(v);

            self.step();

            let replaced: usize = self.f.iter_mut().map(|channel| channel.sanitize()).sum();
            if replaced > 0 {
                sanitized = true;
                dirty_streak += 1;
                warnings.push(format!("step {}: zeroed {} non-finite lattice cells", t, replaced));
                if dirty_streak >= MAX_DIRTY_STEPS {
                    return Err(SimError::InternalNumerical(format!(
                        "non-finite distribution for {} consecutive steps",
                        dirty_streak
                    )));
                }
            } else {
                dirty_streak = 0;
            }
        }

        let recorded = density_history.len();
        let mut outcome = SimulationOutcome::with_meta(params.grid_size, recorded, params.dt);
        outcome.density = Some(density_history);
        outcome.velocity_x = Some(velocity_x_history);
        outcome.velocity_y = Some(velocity_y_history);
        outcome.total_occupancy = Some(occupancy);
        outcome.truncated = truncated;
        outcome.mock_data = sanitized;
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Macroscopic moments of the distribution: density and cell velocity.
    ///
    /// Velocity is momentum over density where density clears the floor,
    /// zero elsewhere. Channel speeds are unit, so cell speeds never exceed
    /// one lattice unit.
    pub(crate) fn moments(&self) -> (Field, Field, Field) {
        let n = self.params.grid_size;
        let mut rho = Field::zeros(n);
        let mut mom_x = Field::zeros(n);
        let mut mom_y = Field::zeros(n);

        for (k, channel) in self.f.iter().enumerate() {
            let c = self.directions[k];
            for i in 0..channel.data().len() {
                let value = channel.data()[i];
                rho.data_mut()[i] += value;
                mom_x.data_mut()[i] += c.x * value;
                mom_y.data_mut()[i] += c.y * value;
            }
        }

        let mut u = Field::zeros(n);
        let mut v = Field::zeros(n);
        for i in 0..rho.data().len() {
            let d = rho.data()[i];
            if d > DENSITY_FLOOR {
                u.data_mut()[i] = mom_x.data()[i] / d;
                v.data_mut()[i] = mom_y.data()[i] / d;
            }
        }
        (rho, u, v)
    }

    /// One lattice step: collision, hazard repulsion, exit attraction,
    /// streaming, boundary enforcement. The order is part of the contract;
    /// state may be inspected between steps.
    pub fn step(&mut self) {
        let params = self.params;
        let n = params.grid_size;
        let dt = params.dt;

        let (rho, _, _) = self.moments();

        // Relaxation slows down in overcrowded cells
        let mut tau = Field::zeros(n);
        for i in 0..tau.data().len() {
            tau.data_mut()[i] = if rho.data()[i] > params.density_threshold {
                TAU_CROWDED
            } else {
                TAU_FREE
            };
        }

        let directions = self.directions;
        let hazard = &self.hazard;
        let (hazard_gx, hazard_gy) = (&self.hazard_grad.0, &self.hazard_grad.1);
        let (attr_gx, attr_gy) = (&self.attraction_grad.0, &self.attraction_grad.1);
        let rho_ref = &rho;
        let tau_ref = &tau;

        // Channels are independent given the shared moment fields
        self.f.par_iter_mut().enumerate().for_each(|(k, channel)| {
            let c = directions[k];
            let inv_k = 1.0 / NUM_DIRECTIONS as f64;
            for i in 0..channel.data().len() {
                let density = rho_ref.data()[i];
                let mut value = channel.data()[i];

                // BGK relaxation toward the isotropic equilibrium rho/K
                let equilibrium = density * inv_k;
                value += dt * (-(value - equilibrium) / tau_ref.data()[i]);

                // Hazard repulsion: inject along directions pointing down
                // the hazard gradient, never more than the cell holds
                let h = hazard.data()[i];
                if h > HAZARD_FLOOR {
                    let s = -(c.x * hazard_gx.data()[i] + c.y * hazard_gy.data()[i]);
                    if s > 0.0 {
                        value += (s * h * dt).clamp(0.0, density);
                    }
                }

                // Exit attraction: inject along directions pointing up the
                // attraction gradient, bounded by the cell density
                let a = c.x * attr_gx.data()[i] + c.y * attr_gy.data()[i];
                if a > 0.0 {
                    value += (a * ATTRACTION_WEIGHT).clamp(0.0, density);
                }

                channel.data_mut()[i] = value;
            }
        });

        // Streaming: shift each channel one lattice cell per component;
        // quantities leaving the grid are lost
        let shifts = self.shifts;
        let f_ref = &self.f;
        self.f_next
            .par_iter_mut()
            .enumerate()
            .for_each(|(k, target)| {
                target.map_inplace(|_| 0.0);
                let (sx, sy) = shifts[k];
                let source = &f_ref[k];
                for y in 0..n {
                    for x in 0..n {
                        let nx = x as isize + sx;
                        let ny = y as isize + sy;
                        if nx >= 0 && nx < n as isize && ny >= 0 && ny < n as isize {
                            let value = source.get(x, y);
                            if value != 0.0 {
                                target.add(nx as usize, ny as usize, value);
                            }
                        }
                    }
                }
            });
        std::mem::swap(&mut self.f, &mut self.f_next);

        // Walls absorb anything streamed into them
        for channel in &mut self.f {
            channel.zero_where(&self.raster.wall_mask);
        }

        self.step_count += 1;
    }
}
