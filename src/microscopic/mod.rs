//! # Microscopic Module - Social-Force Particle Solver
//!
//! Continuous-state particle simulation of individual pedestrians under
//! Helbing-style social forces with panic scaling. Each agent feels four
//! force terms (driving toward its assigned exit, repulsion from nearby
//! agents, repulsion from walls, and avoidance of hazards) integrated with
//! an explicit Euler step and a panic-scaled speed cap.
//!
//! ## Architecture
//!
//! The engine mirrors the double-buffered, rayon-parallel stepping scheme of
//! the library's other solvers:
//!
//! - All force evaluations for one step read the previous agent buffer
//!   immutably while writing the next buffer, so neighbor sums are
//!   synchronous and thread-safe.
//! - Buffers swap by pointer after each step.
//! - An atomic stop flag allows cancellation between steps; a cancelled run
//!   returns its recorded frames with `truncated = true`.
//!
//! Evacuated agents are tracked by flag and an active-index list; they keep
//! their capture position (frozen, zero velocity) in the emitted history and
//! are excluded from every force sum.
//!
//! ## Submodules
//!
//! - [`forces`]: force terms and the per-step update kernel
//! - [`tests`]: unit tests for forces, capture, and containment

// Force terms and stepping kernel
pub mod forces;

use crate::config::{EngineConfig, MicroPreset};
use crate::envelope::SimulationOutcome;
use crate::error::SimError;
use crate::mock::mock_microscopic;
use crate::scenario::{Hazard, Scenario, WORLD_SIZE, Wall};
use crate::vector::Vec2;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Distance from an exit at which an agent counts as evacuated, in meters.
pub const EXIT_CAPTURE_RADIUS: f64 = 1.0;

/// Standard deviation of the placement jitter around a seeded cluster.
const CLUSTER_JITTER: f64 = 0.5;

/// Parameters of a microscopic run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MicroParams {
    /// Agents to place when the scenario seeds no clusters.
    pub num_agents: usize,
    /// Number of integration steps.
    pub time_steps: usize,
    /// Panic multiplier applied to interaction and hazard forces.
    pub panic_factor: f64,
    /// Free-walking desired speed in m/s.
    pub desired_speed: f64,
    /// Relaxation time of the driving force in seconds.
    pub relaxation_time: f64,
    /// Integration time step in seconds.
    pub dt: f64,
    /// Seed for initial placement.
    pub seed: u64,
}

impl Default for MicroParams {
    fn default() -> Self {
        MicroParams {
            num_agents: 100,
            time_steps: 100,
            panic_factor: 1.2,
            desired_speed: 1.4,
            relaxation_time: 0.5,
            dt: 0.1,
            seed: 42,
        }
    }
}

impl MicroParams {
    /// Applies a named preset on top of the defaults.
    pub fn from_preset(preset: &MicroPreset) -> Self {
        MicroParams {
            num_agents: preset.agent_count,
            panic_factor: preset.panic_factor,
            desired_speed: preset.desired_speed,
            relaxation_time: preset.relaxation_time,
            dt: preset.time_step,
            ..Default::default()
        }
    }

    /// Rejects out-of-range parameters before allocation.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.time_steps == 0 {
            return Err(SimError::InvalidParameters("time_steps must be positive".into()));
        }
        if self.dt <= 0.0 || !self.dt.is_finite() {
            return Err(SimError::InvalidParameters(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if self.desired_speed <= 0.0 {
            return Err(SimError::InvalidParameters(format!(
                "desired_speed must be positive, got {}",
                self.desired_speed
            )));
        }
        if self.relaxation_time <= 0.0 {
            return Err(SimError::InvalidParameters(format!(
                "relaxation_time must be positive, got {}",
                self.relaxation_time
            )));
        }
        if self.panic_factor < 0.0 {
            return Err(SimError::InvalidParameters(format!(
                "panic_factor must be non-negative, got {}",
                self.panic_factor
            )));
        }
        Ok(())
    }

    /// Panic-scaled speed cap.
    pub fn max_speed(&self) -> f64 {
        self.desired_speed * (1.0 + 0.5 * self.panic_factor)
    }
}

/// State of a single agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Agent {
    /// Position in meters.
    pub position: Vec2,
    /// Velocity in m/s.
    pub velocity: Vec2,
    /// Assigned exit, fixed at initialization.
    pub goal: Vec2,
    /// Whether the agent has reached an exit.
    pub evacuated: bool,
}

/// Double-buffered social-force engine.
pub struct SocialForceEngine {
    params: MicroParams,
    walls: Vec<Wall>,
    exits: Vec<Vec2>,
    hazards: Vec<Hazard>,
    agents_a: Vec<Agent>,
    agents_b: Vec<Agent>,
    active: Vec<usize>,
    step_count: usize,
    should_stop: Arc<AtomicBool>,
}

impl SocialForceEngine {
    /// Builds the engine and places the agents.
    ///
    /// Scenario clusters take precedence: each cluster spawns `count` agents
    /// with Gaussian jitter around its center. Without clusters,
    /// `params.num_agents` agents are placed uniformly at random. Placement
    /// draws from a seeded generator, so runs are reproducible.
    pub fn new(scenario: &Scenario, params: MicroParams) -> Result<Self, SimError> {
        params.validate()?;
        scenario.validate()?;

        let exits = scenario.building_layout.exit_points();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let jitter = Normal::new(0.0, CLUSTER_JITTER)
            .map_err(|e| SimError::InvalidParameters(e.to_string()))?;
        let uniform = Uniform::new(0.0, WORLD_SIZE)
            .map_err(|e| SimError::InvalidParameters(e.to_string()))?;

        let mut positions: Vec<Vec2> = Vec::new();
        for cluster in &scenario.building_layout.initial_positions {
            for _ in 0..cluster.count {
                let p = cluster.center() + Vec2::new(jitter.sample(&mut rng), jitter.sample(&mut rng));
                positions.push(Vec2::new(
                    p.x.clamp(0.0, WORLD_SIZE),
                    p.y.clamp(0.0, WORLD_SIZE),
                ));
            }
        }
        if positions.is_empty() {
            if params.num_agents == 0 {
                return Err(SimError::InvalidParameters(
                    "num_agents must be positive when the scenario seeds no clusters".into(),
                ));
            }
            for _ in 0..params.num_agents {
                positions.push(Vec2::new(uniform.sample(&mut rng), uniform.sample(&mut rng)));
            }
        }

        let agents: Vec<Agent> = positions
            .into_iter()
            .map(|position| {
                let goal = forces::nearest_exit(&position, &exits).unwrap_or(position);
                Agent {
                    position,
                    velocity: Vec2::zero(),
                    goal,
                    evacuated: false,
                }
            })
            .collect();

        let count = agents.len();
        info!(
            "social-force engine: {} agents, {} walls, {} exits, {} hazards",
            count,
            scenario.building_layout.walls.len(),
            exits.len(),
            scenario.hazards.len()
        );

        Ok(SocialForceEngine {
            params,
            walls: scenario.building_layout.walls.clone(),
            exits,
            hazards: scenario.hazards.clone(),
            agents_b: agents.clone(),
            agents_a: agents,
            active: (0..count).collect(),
            step_count: 0,
            should_stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Run parameters.
    pub fn parameters(&self) -> &MicroParams {
        &self.params
    }

    /// Steps completed so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Current agent states.
    pub fn agents(&self) -> &[Agent] {
        &self.agents_a
    }

    /// Indices of agents still in the domain.
    pub fn active_agents(&self) -> &[usize] {
        &self.active
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

/// Runs a microscopic simulation for a scenario.
///
/// Dispatches to the mock oracle when the engine config demands it. A run
/// that trips the numerical containment policy three steps in a row also
/// falls through to the oracle, with a warning recorded in the envelope.
pub fn simulate(
    scenario: &Scenario,
    params: MicroParams,
    config: &EngineConfig,
) -> Result<SimulationOutcome, SimError> {
    params.validate()?;
    scenario.validate()?;

    let agent_count = match scenario.seeded_agent_count() {
        0 => params.num_agents,
        n => n,
    };

    if config.mock {
        return mock_microscopic(
            scenario,
            agent_count,
            params.time_steps,
            params.panic_factor,
            params.desired_speed,
        );
    }

    let mut engine = SocialForceEngine::new(scenario, params)?;
    match engine.run() {
        Ok(outcome) => Ok(outcome),
        Err(SimError::InternalNumerical(msg)) => {
            warn!("microscopic run degenerated ({}); falling back to mock", msg);
            let mut outcome = mock_microscopic(
                scenario,
                agent_count,
                params.time_steps,
                params.panic_factor,
                params.desired_speed,
            )?;
            outcome
                .warnings
                .push(format!("numerical failure in native run: {}", msg));
            Ok(outcome)
        }
        Err(other) => Err(other),
    }
}
