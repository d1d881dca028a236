//! # Mock Oracle - Deterministic Solver Surrogate
//!
//! Produces result envelopes with the same shape as any native solver run,
//! without numerical solution. Used when the mock switch is on, and as the
//! deterministic downshift target for the macroscopic performance safeguard
//! and the numerical-failure containment policy.
//!
//! All functions here are pure: for fixed inputs they return identical
//! envelopes, using a fixed-seed generator where placement would otherwise
//! be random. Every envelope they emit carries `mock_data = true`.

use crate::envelope::SimulationOutcome;
use crate::error::SimError;
use crate::field::Field;
use crate::geometry::rasterize;
use crate::scenario::{HazardKind, Scenario, WORLD_SIZE};
use crate::vector::Vec2;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed seed for mock placement; keeps the oracle deterministic.
const MOCK_SEED: u64 = 2024;

/// Fraction of the initial mass that the mock evacuation curve saturates at.
const SATURATION: f64 = 0.9;

/// Smooth monotone evacuation fraction in `[0, SATURATION]`.
fn evacuation_fraction(t: usize, time_steps: usize) -> f64 {
    if time_steps <= 1 {
        return 0.0;
    }
    let progress = t as f64 / (time_steps - 1) as f64;
    SATURATION * progress.powf(0.8)
}

/// Mock microscopic run: agents drift straight toward their nearest exit and
/// the cumulative safe count follows a quadratic curve saturating below the
/// head count.
pub fn mock_microscopic(
    scenario: &Scenario,
    num_agents: usize,
    time_steps: usize,
    panic_factor: f64,
    desired_speed: f64,
) -> Result<SimulationOutcome, SimError> {
    scenario.validate()?;
    if num_agents == 0 || time_steps == 0 {
        return Err(SimError::InvalidParameters(
            "mock run needs at least one agent and one step".into(),
        ));
    }
    info!(
        "mock microscopic run: {} agents over {} steps",
        num_agents, time_steps
    );

    let dt = 0.1;
    let exits = scenario.building_layout.exit_points();

    // Seed agents from the scenario clusters when present, otherwise from a
    // fixed-seed uniform draw over the domain
    let mut rng = StdRng::seed_from_u64(MOCK_SEED);
    let mut agents: Vec<Vec2> = Vec::with_capacity(num_agents);
    for cluster in &scenario.building_layout.initial_positions {
        for _ in 0..cluster.count {
            if agents.len() < num_agents {
                agents.push(cluster.center());
            }
        }
    }
    while agents.len() < num_agents {
        agents.push(Vec2::new(
            rng.random_range(0.0..WORLD_SIZE),
            rng.random_range(0.0..WORLD_SIZE),
        ));
    }

    let mut positions = Vec::with_capacity(time_steps);
    let mut velocities = Vec::with_capacity(time_steps);
    let mut safe_agents = Vec::with_capacity(time_steps);

    for t in 0..time_steps {
        let progress = t as f64 / time_steps as f64;
        let safe = ((num_agents as f64) * progress * progress * SATURATION) as usize;
        safe_agents.push(safe);

        let mut frame_pos = Vec::with_capacity(num_agents);
        let mut frame_vel = Vec::with_capacity(num_agents);
        for (i, agent) in agents.iter_mut().enumerate() {
            let evacuated = i < safe;
            let velocity = if evacuated {
                Vec2::zero()
            } else {
                nearest_exit(agent, &exits)
                    .map(|e| (e - *agent).normalize() * desired_speed)
                    .unwrap_or_else(Vec2::zero)
            };
            frame_pos.push([agent.x, agent.y]);
            frame_vel.push([velocity.x, velocity.y]);
            if !evacuated {
                *agent += velocity * dt;
            }
        }
        positions.push(frame_pos);
        velocities.push(frame_vel);
    }

    let mut outcome = SimulationOutcome::with_meta(0, time_steps, dt);
    outcome.positions = Some(positions);
    outcome.velocities = Some(velocities);
    outcome.safe_agents = Some(safe_agents);
    outcome.panic_factor = Some(panic_factor);
    outcome.mock_data = true;
    Ok(outcome)
}

/// Mock mesoscopic run: a radial density hump decays monotonically while the
/// velocity field points at the nearest exit from every occupied cell.
pub fn mock_mesoscopic(
    scenario: &Scenario,
    grid_size: usize,
    time_steps: usize,
) -> Result<SimulationOutcome, SimError> {
    let (density, velocity_x, velocity_y, occupancy, _) =
        mock_grid_series(scenario, grid_size, time_steps)?;
    info!(
        "mock mesoscopic run: {}x{} grid over {} steps",
        grid_size, grid_size, time_steps
    );

    let mut outcome = SimulationOutcome::with_meta(grid_size, time_steps, 0.1);
    outcome.density = Some(density);
    outcome.velocity_x = Some(velocity_x);
    outcome.velocity_y = Some(velocity_y);
    outcome.total_occupancy = Some(occupancy);
    outcome.mock_data = true;
    Ok(outcome)
}

/// Mock macroscopic run: the mesoscopic shape plus a fire field that grows to
/// a saturating plateau over the first half of the horizon and freezes, and a
/// cumulative evacuation curve saturating at 90% of the initial mass.
pub fn mock_macroscopic(
    scenario: &Scenario,
    grid_resolution: usize,
    time_steps: usize,
) -> Result<SimulationOutcome, SimError> {
    let (density, velocity_x, velocity_y, _, initial_mass) =
        mock_grid_series(scenario, grid_resolution, time_steps)?;
    info!(
        "mock macroscopic run: {}x{} grid over {} steps",
        grid_resolution, grid_resolution, time_steps
    );

    let raster = rasterize(scenario, grid_resolution, WORLD_SIZE)?;
    let mut fire_now = raster
        .hazard_field(HazardKind::Fire)
        .cloned()
        .unwrap_or_else(|| Field::zeros(grid_resolution));
    fire_now.clamp_inplace(0.0, 1.0);

    let mut fire = Vec::with_capacity(time_steps);
    let mut evacuated_count = Vec::with_capacity(time_steps);
    for t in 0..time_steps {
        if t > 0 && t < time_steps / 2 {
            fire_now.map_inplace(|v| (v * 1.05).min(1.0));
        }
        fire.push(fire_now.clone());
        evacuated_count.push(initial_mass * evacuation_fraction(t, time_steps));
    }

    let mut outcome = SimulationOutcome::with_meta(grid_resolution, time_steps, 0.1);
    outcome.density = Some(density);
    outcome.velocity_x = Some(velocity_x);
    outcome.velocity_y = Some(velocity_y);
    outcome.fire = Some(fire);
    outcome.evacuated_count = Some(evacuated_count);
    outcome.mock_data = true;
    Ok(outcome)
}

/// Shared grid series for the mock solvers: decaying radial hump, cached
/// nearest-exit direction field, per-step occupancy, and the initial mass.
#[allow(clippy::type_complexity)]
fn mock_grid_series(
    scenario: &Scenario,
    n: usize,
    time_steps: usize,
) -> Result<(Vec<Field>, Vec<Field>, Vec<Field>, Vec<f64>, f64), SimError> {
    if time_steps == 0 {
        return Err(SimError::InvalidParameters(
            "mock run needs at least one step".into(),
        ));
    }
    let raster = rasterize(scenario, n, WORLD_SIZE)?;

    // Radial hump in the domain center
    let mut initial = Field::zeros(n);
    let center = (n / 2) as f64;
    let hump_radius = (n / 4) as f64;
    let falloff = (n as f64 / 8.0).max(1.0);
    for y in 0..n {
        for x in 0..n {
            let d = ((x as f64 - center).powi(2) + (y as f64 - center).powi(2)).sqrt();
            if d < hump_radius {
                initial.set(x, y, (-d / falloff).exp());
            }
        }
    }
    initial.zero_where(&raster.wall_mask);
    let initial_mass = initial.sum();

    // Unit direction toward the nearest exit, cached once
    let mut dir_x = Field::zeros(n);
    let mut dir_y = Field::zeros(n);
    for y in 0..n {
        for x in 0..n {
            if initial.get(x, y) <= 0.01 {
                continue;
            }
            let mut best: Option<(f64, (usize, usize))> = None;
            for &(ex, ey) in &raster.exit_cells {
                let d = ((x as f64 - ex as f64).powi(2) + (y as f64 - ey as f64).powi(2)).sqrt();
                if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                    best = Some((d, (ex, ey)));
                }
            }
            if let Some((d, (ex, ey))) = best {
                let d = d.max(0.1);
                dir_x.set(x, y, (ex as f64 - x as f64) / d);
                dir_y.set(x, y, (ey as f64 - y as f64) / d);
            }
        }
    }

    let mut density = Vec::with_capacity(time_steps);
    let mut velocity_x = Vec::with_capacity(time_steps);
    let mut velocity_y = Vec::with_capacity(time_steps);
    let mut occupancy = Vec::with_capacity(time_steps);

    for t in 0..time_steps {
        let remaining = 1.0 - evacuation_fraction(t, time_steps);
        let mut frame = initial.clone();
        frame.map_inplace(|v| v * remaining);
        occupancy.push(frame.sum());

        let mut vx = dir_x.clone();
        let mut vy = dir_y.clone();
        for i in 0..frame.data().len() {
            if frame.data()[i] <= 0.01 {
                vx.data_mut()[i] = 0.0;
                vy.data_mut()[i] = 0.0;
            }
        }
        density.push(frame);
        velocity_x.push(vx);
        velocity_y.push(vy);
    }

    Ok((density, velocity_x, velocity_y, occupancy, initial_mass))
}

/// Nearest exit point to a world position.
fn nearest_exit(position: &Vec2, exits: &[Vec2]) -> Option<Vec2> {
    exits
        .iter()
        .min_by(|a, b| {
            position
                .distance_to(a)
                .total_cmp(&position.distance_to(b))
        })
        .copied()
}
