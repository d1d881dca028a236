//! Force terms and stepping kernel for the social-force engine.
//!

use super::{Agent, EXIT_CAPTURE_RADIUS, MicroParams, SocialForceEngine};
use crate::envelope::SimulationOutcome;
use crate::error::SimError;
use crate::scenario::{Hazard, WORLD_SIZE, Wall};
use crate::vector::Vec2;
use log::warn;
use rayon::prelude::*;

/// Interaction cutoff for agent-agent repulsion, in meters.
const REPULSION_RANGE: f64 = 2.0;
/// Decay length of agent-agent repulsion, in meters.
const REPULSION_DECAY: f64 = 0.8;
/// Strength of agent-agent repulsion.
const REPULSION_STRENGTH: f64 = 2.0;
/// Interaction cutoff for wall repulsion, in meters.
const WALL_RANGE: f64 = 1.0;
/// Decay length of wall repulsion, in meters.
const WALL_DECAY: f64 = 0.2;
/// Strength of wall repulsion.
const WALL_STRENGTH: f64 = 3.0;
/// Strength of hazard avoidance.
const HAZARD_STRENGTH: f64 = 5.0;
/// Consecutive degenerate steps tolerated before the run aborts.
const MAX_DIRTY_STEPS: usize = 3;

impl SocialForceEngine {
    /// Executes the full run, recording one frame per step.
    ///
    /// Cancellation is honored between steps: the recorded prefix is
    /// returned with `truncated = true`. Non-finite agent state is zeroed
    /// in place and logged; three consecutive degenerate steps abort with
    /// `InternalNumerical`, which the caller converts into a mock fallback.
    pub fn run(&mut self) -> Result<SimulationOutcome, SimError> {
        let params = self.params;
        let agent_count = self.agents_a.len();

        let mut positions = Vec::with_capacity(params.time_steps);
        let mut velocities = Vec::with_capacity(params.time_steps);
        let mut safe_agents = Vec::with_capacity(params.time_steps);
        let mut warnings = Vec::new();
        let mut sanitized = false;
        let mut dirty_streak = 0;
        let mut truncated = false;

        for t in 0..params.time_steps {
            if self.stop_requested() {
                warn!("microscopic run cancelled at step {}/{}", t, params.time_steps);
                warnings.push(format!("cancelled after {} of {} steps", t, params.time_steps));
                truncated = true;
                break;
            }

            self.step();

            let replaced = self.sanitize();
            if replaced > 0 {
                sanitized = true;
                dirty_streak += 1;
                warnings.push(format!(
                    "step {}: zeroed {} non-finite agent components",
                    t, replaced
                ));
                if dirty_streak >= MAX_DIRTY_STEPS {
                    return Err(SimError::InternalNumerical(format!(
                        "non-finite agent state for {} consecutive steps",
                        dirty_streak
                    )));
                }
            } else {
                dirty_streak = 0;
            }

            let mut frame_pos = Vec::with_capacity(agent_count);
            let mut frame_vel = Vec::with_capacity(agent_count);
            for agent in &self.agents_a {
                frame_pos.push([agent.position.x, agent.position.y]);
                frame_vel.push([agent.velocity.x, agent.velocity.y]);
            }
            positions.push(frame_pos);
            velocities.push(frame_vel);
            safe_agents.push(agent_count - self.active.len());
        }

        let recorded = positions.len();
        let mut outcome = SimulationOutcome::with_meta(0, recorded, params.dt);
        outcome.positions = Some(positions);
        outcome.velocities = Some(velocities);
        outcome.safe_agents = Some(safe_agents);
        outcome.panic_factor = Some(params.panic_factor);
        outcome.truncated = truncated;
        outcome.mock_data = sanitized;
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Advances all active agents by one explicit Euler step, then captures
    /// agents inside an exit radius. State may be inspected between steps.
    pub fn step(&mut self) {
        let params = self.params;
        let current = &self.agents_a;
        let walls = &self.walls;
        let hazards = &self.hazards;
        let max_speed = params.max_speed();

        // Parallel force evaluation: read buffer A, write buffer B
        self.agents_b
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, next)| {
                let agent = current[i];
                if agent.evacuated {
                    *next = agent;
                    return;
                }

                let force = total_force(i, current, walls, hazards, &params);
                let velocity = (agent.velocity + force * params.dt).clamp_norm(max_speed);
                let moved = agent.position + velocity * params.dt;
                // Agents never leave the world domain
                let position = Vec2::new(
                    moved.x.clamp(0.0, WORLD_SIZE),
                    moved.y.clamp(0.0, WORLD_SIZE),
                );
                *next = Agent {
                    position,
                    velocity,
                    goal: agent.goal,
                    evacuated: false,
                };
            });

        std::mem::swap(&mut self.agents_a, &mut self.agents_b);
        self.step_count += 1;

        // Exit capture: freeze the agent where it was caught
        let exits = &self.exits;
        let agents = &mut self.agents_a;
        self.active.retain(|&i| {
            let agent = &mut agents[i];
            let reached = exits
                .iter()
                .any(|e| agent.position.distance_to(e) < EXIT_CAPTURE_RADIUS);
            if reached {
                agent.evacuated = true;
                agent.velocity = Vec2::zero();
            }
            !reached
        });
    }

    /// Zeroes non-finite position/velocity components, returning how many
    /// components were replaced.
    pub(crate) fn sanitize(&mut self) -> usize {
        let mut replaced = 0;
        for agent in &mut self.agents_a {
            for v in [
                &mut agent.position.x,
                &mut agent.position.y,
                &mut agent.velocity.x,
                &mut agent.velocity.y,
            ] {
                if !v.is_finite() {
                    *v = 0.0;
                    replaced += 1;
                }
            }
        }
        replaced
    }
}

/// Total force on one agent: driving + panic-scaled agent repulsion + wall
/// repulsion + panic-scaled hazard avoidance.
pub(crate) fn total_force(
    index: usize,
    agents: &[Agent],
    walls: &[Wall],
    hazards: &[Hazard],
    params: &MicroParams,
) -> Vec2 {
    let agent = &agents[index];
    desired_force(agent, params)
        + agent_repulsion(index, agents) * params.panic_factor
        + wall_repulsion(&agent.position, walls)
        + hazard_avoidance(&agent.position, hazards) * params.panic_factor
}

/// Driving force relaxing the agent's velocity toward its desired velocity.
///
/// `(1/τ) · (v_des · n̂ − v)` with `n̂` the unit direction to the assigned
/// exit; an agent sitting on its goal feels no directed drive.
pub(crate) fn desired_force(agent: &Agent, params: &MicroParams) -> Vec2 {
    let toward_goal = agent.goal - agent.position;
    let direction = if toward_goal.norm() > 0.01 {
        toward_goal.normalize()
    } else {
        Vec2::zero()
    };
    (direction * params.desired_speed - agent.velocity) / params.relaxation_time
}

/// Exponential repulsion from nearby active agents.
pub(crate) fn agent_repulsion(index: usize, agents: &[Agent]) -> Vec2 {
    let agent = &agents[index];
    let mut force = Vec2::zero();
    for (j, other) in agents.iter().enumerate() {
        if j == index || other.evacuated {
            continue;
        }
        let separation = other.position - agent.position;
        let distance = separation.norm();
        if distance > 0.0 && distance < REPULSION_RANGE {
            let away = -(separation / distance);
            force += away * (REPULSION_STRENGTH * (-distance / REPULSION_DECAY).exp());
        }
    }
    force
}

/// Short-range exponential repulsion from wall segments.
///
/// Each segment contributes along the outward normal from the agent's
/// closest point on the segment. Zero-length segments are skipped.
pub(crate) fn wall_repulsion(position: &Vec2, walls: &[Wall]) -> Vec2 {
    let mut force = Vec2::zero();
    for wall in walls {
        if wall.length() == 0.0 {
            continue;
        }
        let closest = position.project_onto_segment(&wall.start(), &wall.end());
        let away = *position - closest;
        let distance = away.norm();
        if distance < WALL_RANGE {
            force += away.normalize() * (WALL_STRENGTH * (-distance / WALL_DECAY).exp());
        }
    }
    force
}

/// Exponential avoidance of hazard discs within twice their radius.
pub(crate) fn hazard_avoidance(position: &Vec2, hazards: &[Hazard]) -> Vec2 {
    let mut force = Vec2::zero();
    for hazard in hazards {
        let away = *position - hazard.center();
        let distance = away.norm();
        if distance < 2.0 * hazard.radius {
            force += away.normalize()
                * (hazard.intensity * HAZARD_STRENGTH * (-distance / hazard.radius).exp());
        }
    }
    force
}

/// Closest exit to a position, if any exits exist.
pub(crate) fn nearest_exit(position: &Vec2, exits: &[Vec2]) -> Option<Vec2> {
    exits
        .iter()
        .min_by(|a, b| position.distance_to(a).total_cmp(&position.distance_to(b)))
        .copied()
}
