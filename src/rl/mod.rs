//! # RL Module - Grid Evacuation Environment
//!
//! Episodic discrete-action environment for training a controller that
//! issues global directional guidance to a crowd. The environment reuses the
//! shared raster (walls, exits, hazards) and exposes a gym-style
//! `reset` / `step` / `observation` surface:
//!
//! - **Observation**: four channels at grid resolution (agent density
//!   normalized by 5 and clamped, wall mask, aggregated hazard intensity,
//!   exit mask), every channel in `[0, 1]`.
//! - **Actions**: the eight compass directions. Each active agent combines
//!   the commanded direction with its own exit attraction and hazard
//!   repulsion, normalized and rounded onto the lattice.
//! - **Reward**: `10·Δevacuated − 2·Σ hazard(agent) + fairness`, where the
//!   fairness bonus pays out when exit usage stays balanced (low Gini).
//! - **Termination**: everyone out, or the step cap.
//!
//! The environment is an explicit state machine, `Fresh` to `Ready` to
//! `InEpisode` to `Terminal`, and stepping a terminal episode is an error
//! rather than a silent reset.
//!
//! Training of the policy network itself lives outside this crate; the
//! environment contract here is sufficient to drive any learner.
//!
//! ## Submodules
//!
//! - [`reward`]: Gini coefficient and reward assembly
//! - [`tests`]: unit tests for the state machine, movement, and reward

// Gini coefficient and reward assembly
pub mod reward;
// Unit tests
pub mod tests;

use crate::error::SimError;
use crate::field::Field;
use crate::geometry::{Raster, rasterize};
use crate::scenario::{Scenario, WORLD_SIZE};
use log::info;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Number of discrete actions (compass directions).
pub const NUM_ACTIONS: usize = 8;

/// Action index to lattice step, clockwise from north.
pub const ACTIONS: [(i32, i32); NUM_ACTIONS] = [
    (0, -1),  // north
    (1, -1),  // northeast
    (1, 0),   // east
    (1, 1),   // southeast
    (0, 1),   // south
    (-1, 1),  // southwest
    (-1, 0),  // west
    (-1, -1), // northwest
];

/// Environment configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Grid resolution (cells per side).
    pub grid_size: usize,
    /// Agents to place at reset.
    pub num_agents: usize,
    /// Step cap before an episode truncates.
    pub max_steps: usize,
    /// Density normalization for the agent channel.
    pub density_norm: f64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            grid_size: 50,
            num_agents: 100,
            max_steps: 1000,
            density_norm: 5.0,
        }
    }
}

impl EnvConfig {
    /// Rejects out-of-range parameters before allocation.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.grid_size < 2 {
            return Err(SimError::InvalidParameters(format!(
                "grid_size must be at least 2, got {}",
                self.grid_size
            )));
        }
        if self.num_agents == 0 {
            return Err(SimError::InvalidParameters("num_agents must be positive".into()));
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidParameters("max_steps must be positive".into()));
        }
        Ok(())
    }
}

/// Lifecycle phase of the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvPhase {
    /// Constructed, never reset.
    Fresh,
    /// Reset, no step taken yet.
    Ready,
    /// At least one step taken, episode still live.
    InEpisode,
    /// Episode over; only `reset` is legal.
    Terminal,
}

/// Four-channel observation tensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Agent density normalized by the density norm, clamped to `[0, 1]`.
    pub agent_density: Field,
    /// Wall mask as 0/1.
    pub walls: Field,
    /// Aggregated hazard intensity clamped to `[0, 1]`.
    pub hazards: Field,
    /// Exit mask as 0/1.
    pub exits: Field,
}

impl Observation {
    /// The channels in canonical order.
    pub fn channels(&self) -> [&Field; 4] {
        [&self.agent_density, &self.walls, &self.hazards, &self.exits]
    }
}

/// Result of one environment step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Observation after the move.
    pub observation: Observation,
    /// Scalar reward for the step.
    pub reward: f64,
    /// Episode finished (everyone out or step cap hit).
    pub done: bool,
    /// Diagnostics for the step.
    pub info: StepInfo,
}

/// Step diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepInfo {
    /// Total agents evacuated so far.
    pub evacuated: usize,
    /// Sum of hazard intensity under active agents.
    pub hazard_penalty: f64,
    /// Steps taken this episode.
    pub step: usize,
    /// Fairness bonus granted this step.
    pub fairness_bonus: f64,
}

/// Grid evacuation environment over the shared raster.
pub struct EvacuationEnv {
    config: EnvConfig,
    raster: Raster,
    /// Aggregated hazard intensity (unclamped, used for penalties).
    hazard: Field,
    /// Cached wall/hazard/exit observation channels.
    walls_channel: Field,
    hazards_channel: Field,
    exits_channel: Field,
    /// Hazard centers in grid coordinates with their influence radius.
    hazard_influence: Vec<(f64, f64, f64)>,
    agent_cells: Vec<(usize, usize)>,
    /// True once an agent has evacuated; never unset within an episode.
    agent_status: Vec<bool>,
    /// Exit attribution, recorded at the capture step.
    exit_usage: Vec<usize>,
    agent_channel: Field,
    phase: EnvPhase,
    step_count: usize,
    prev_evacuated: usize,
    rng: StdRng,
}

impl EvacuationEnv {
    /// Builds the environment from a scenario. The environment starts
    /// `Fresh`; call [`EvacuationEnv::reset`] before stepping.
    pub fn new(scenario: &Scenario, config: EnvConfig) -> Result<Self, SimError> {
        config.validate()?;
        let raster = rasterize(scenario, config.grid_size, WORLD_SIZE)?;
        let n = config.grid_size;

        let hazard = raster.hazard_total();
        let mut hazards_channel = hazard.clone();
        hazards_channel.clamp_inplace(0.0, 1.0);

        // Influence radius: the agent-level repulsion acts out to twice the
        // rasterized hazard radius
        let hazard_influence = scenario
            .hazards
            .iter()
            .map(|h| {
                let cx = crate::field::world_to_grid(h.position[0], n, WORLD_SIZE) as f64;
                let cy = crate::field::world_to_grid(h.position[1], n, WORLD_SIZE) as f64;
                (cx, cy, h.radius * n as f64 / 10.0)
            })
            .collect();

        info!(
            "evacuation environment: {}x{} grid, {} agents, {} exits",
            n,
            n,
            config.num_agents,
            raster.exit_cells.len()
        );

        Ok(EvacuationEnv {
            config,
            walls_channel: raster.wall_mask.to_field(),
            exits_channel: raster.exit_mask.to_field(),
            hazards_channel,
            hazard,
            hazard_influence,
            exit_usage: vec![0; raster.exit_cells.len()],
            raster,
            agent_cells: Vec::new(),
            agent_status: Vec::new(),
            agent_channel: Field::zeros(n),
            phase: EnvPhase::Fresh,
            step_count: 0,
            prev_evacuated: 0,
            rng: StdRng::seed_from_u64(0),
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> EnvPhase {
        self.phase
    }

    /// Steps taken in the current episode.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Agents evacuated so far in this episode.
    pub fn evacuated(&self) -> usize {
        self.agent_status.iter().filter(|&&s| s).count()
    }

    /// Per-exit usage counts, attributed at capture time.
    pub fn exit_usage(&self) -> &[usize] {
        &self.exit_usage
    }

    /// Per-agent evacuated flags.
    pub fn agent_status(&self) -> &[bool] {
        &self.agent_status
    }

    /// The shared raster backing this environment.
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Places agents uniformly at random on free cells and moves the
    /// environment to `Ready`.
    ///
    /// Cells that are walls or carry hazard above 0.5 are rejected and
    /// redrawn. The seed makes placement reproducible.
    pub fn reset(&mut self, seed: u64) -> Result<Observation, SimError> {
        self.rng = StdRng::seed_from_u64(seed);
        self.agent_cells.clear();
        self.agent_status = vec![false; self.config.num_agents];
        self.exit_usage = vec![0; self.raster.exit_cells.len()];
        self.agent_channel = Field::zeros(self.config.grid_size);
        self.step_count = 0;
        self.prev_evacuated = 0;

        let n = self.config.grid_size;
        let mut placed = 0;
        let mut attempts = 0usize;
        let attempt_cap = self.config.num_agents * 10_000;

        while placed < self.config.num_agents {
            attempts += 1;
            if attempts > attempt_cap {
                return Err(SimError::InvalidScenario(
                    "could not place agents: no free cells below the hazard threshold".into(),
                ));
            }
            let x = self.rng.random_range(0..n);
            let y = self.rng.random_range(0..n);
            if self.cell_blocked(x, y) {
                continue;
            }
            self.agent_cells.push((x, y));
            self.agent_channel.add(x, y, 1.0);
            placed += 1;
        }

        self.phase = EnvPhase::Ready;
        Ok(self.observation())
    }

    /// Current observation tensor.
    pub fn observation(&self) -> Observation {
        let mut agent_density = self.agent_channel.clone();
        let norm = self.config.density_norm;
        agent_density.map_inplace(|v| (v / norm).clamp(0.0, 1.0));
        Observation {
            agent_density,
            walls: self.walls_channel.clone(),
            hazards: self.hazards_channel.clone(),
            exits: self.exits_channel.clone(),
        }
    }

    /// Applies one global directional command to every active agent.
    ///
    /// Errors with `InvalidParameters` when the episode is terminal, the
    /// environment was never reset, or the action index is out of range.
    pub fn step(&mut self, action: usize) -> Result<StepResult, SimError> {
        match self.phase {
            EnvPhase::Fresh => {
                return Err(SimError::InvalidParameters(
                    "environment must be reset before stepping".into(),
                ));
            }
            EnvPhase::Terminal => {
                return Err(SimError::InvalidParameters(
                    "episode is terminal; reset to start a new one".into(),
                ));
            }
            EnvPhase::Ready | EnvPhase::InEpisode => {}
        }
        if action >= NUM_ACTIONS {
            return Err(SimError::InvalidParameters(format!(
                "action index {} out of range 0..{}",
                action, NUM_ACTIONS
            )));
        }

        let n = self.config.grid_size as i32;
        let (ax, ay) = ACTIONS[action];
        self.agent_channel = Field::zeros(self.config.grid_size);

        for i in 0..self.agent_cells.len() {
            if self.agent_status[i] {
                continue;
            }
            let (x, y) = self.agent_cells[i];
            let (fx, fy) = self.desired_step(x, y, ax, ay);

            let nx = ((x as f64 + fx).round() as i32).clamp(0, n - 1) as usize;
            let ny = ((y as f64 + fy).round() as i32).clamp(0, n - 1) as usize;

            // Walls block the move
            if !self.raster.wall_mask.get(nx, ny) {
                self.agent_cells[i] = (nx, ny);
                if let Some(exit_index) = self.capture_exit(nx, ny) {
                    self.agent_status[i] = true;
                    self.exit_usage[exit_index] += 1;
                    continue;
                }
            }
            let (cx, cy) = self.agent_cells[i];
            self.agent_channel.add(cx, cy, 1.0);
        }

        let evacuated = self.evacuated();
        let info = StepInfo {
            evacuated,
            hazard_penalty: self.hazard_penalty(),
            step: self.step_count + 1,
            fairness_bonus: reward::fairness_bonus(&self.exit_usage),
        };
        let reward_value = reward::step_reward(
            evacuated.saturating_sub(self.prev_evacuated),
            info.hazard_penalty,
            info.fairness_bonus,
        );
        self.prev_evacuated = evacuated;
        self.step_count += 1;

        let done =
            evacuated == self.config.num_agents || self.step_count >= self.config.max_steps;
        self.phase = if done {
            EnvPhase::Terminal
        } else {
            EnvPhase::InEpisode
        };

        Ok(StepResult {
            observation: self.observation(),
            reward: reward_value,
            done,
            info,
        })
    }

    /// Combined desired step for one agent: commanded direction plus exit
    /// attraction plus hazard repulsion, normalized to unit length.
    fn desired_step(&self, x: usize, y: usize, ax: i32, ay: i32) -> (f64, f64) {
        let mut fx = ax as f64;
        let mut fy = ay as f64;

        if let Some((ex, ey)) = self.nearest_exit_cell(x, y) {
            let dx = ex as f64 - x as f64;
            let dy = ey as f64 - y as f64;
            let d = (dx * dx + dy * dy).sqrt().max(0.1);
            fx += dx / (d * 5.0);
            fy += dy / (d * 5.0);
        }

        for &(hx, hy, influence) in &self.hazard_influence {
            let dx = hx - x as f64;
            let dy = hy - y as f64;
            let d = (dx * dx + dy * dy).sqrt();
            if d < influence {
                let d = d.max(0.1);
                fx -= dx / (d * 3.0);
                fy -= dy / (d * 3.0);
            }
        }

        let magnitude = (fx * fx + fy * fy).sqrt();
        if magnitude > 0.0 {
            (fx / magnitude, fy / magnitude)
        } else {
            (0.0, 0.0)
        }
    }

    /// Nearest mapped exit cell to a grid position.
    fn nearest_exit_cell(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        self.raster
            .exit_cells
            .iter()
            .min_by(|a, b| {
                let da = (a.0 as f64 - x as f64).powi(2) + (a.1 as f64 - y as f64).powi(2);
                let db = (b.0 as f64 - x as f64).powi(2) + (b.1 as f64 - y as f64).powi(2);
                da.total_cmp(&db)
            })
            .copied()
    }

    /// Index of the exit that captures an agent at `(x, y)`, if any: the
    /// nearest mapped exit within Chebyshev distance 1.
    fn capture_exit(&self, x: usize, y: usize) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for (j, &(ex, ey)) in self.raster.exit_cells.iter().enumerate() {
            let cheb = (ex as i64 - x as i64)
                .abs()
                .max((ey as i64 - y as i64).abs());
            if cheb <= 1 {
                let d = (ex as f64 - x as f64).powi(2) + (ey as f64 - y as f64).powi(2);
                if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                    best = Some((d, j));
                }
            }
        }
        best.map(|(_, j)| j)
    }

    /// Sum of hazard intensity under all active agents.
    fn hazard_penalty(&self) -> f64 {
        let mut total = 0.0;
        for (i, &(x, y)) in self.agent_cells.iter().enumerate() {
            if !self.agent_status[i] {
                total += self.hazard.get(x, y);
            }
        }
        total
    }

    /// Whether a cell rejects agent placement.
    fn cell_blocked(&self, x: usize, y: usize) -> bool {
        self.raster.wall_mask.get(x, y) || self.hazard.get(x, y) > 0.5
    }
}
