//! # CLI Module - Command Line Interface for the Evacuation Engine
//!
//! This module provides a command-line interface over the three numerical
//! solvers and the grid environment:
//!
//! ## `simulate`
//!
//! Runs one solver against a scenario document and writes the result
//! envelope as JSON (or compact binary with `--binary`). Grid resolution,
//! horizon, head count, and panic factor can be overridden per call, and a
//! named preset applies the research-based parameter sets.
//!
//! **Usage**:
//! ```bash
//! evacsim-rs simulate --solver macroscopic --scenario mall.json \
//!     --grid-size 80 --time-steps 120 --output run.json
//! ```
//!
//! ## `rollout`
//!
//! Evaluates the grid environment under a stationary uniform random policy
//! for a batch of seeded episodes and prints the evaluation report
//! (evacuation times, success rates, exit-usage Gini).
//!
//! **Usage**:
//! ```bash
//! evacsim-rs rollout --scenario school.json --episodes 20 --seed 7
//! ```
//!
//! ## `validate`
//!
//! Parses and validates a scenario document, reporting the rasterized cell
//! counts at the requested resolution without running anything.
//!
//! **Usage**:
//! ```bash
//! evacsim-rs validate --scenario stadium.json --grid-size 100
//! ```
//!
//! ## Mock switch
//!
//! `--mock` (or `DEV_MODE=mock` in the process environment) forces the
//! deterministic mock oracle for every solver call; the envelope records
//! which path produced it.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Optional TOML engine configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Force the deterministic mock oracle
    #[arg(long, global = true)]
    pub mock: bool,

    /// Rayon worker threads (defaults to all cores)
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Solver family selector.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    /// Social-force particle model
    Microscopic,
    /// Discrete-velocity lattice model
    Mesoscopic,
    /// Density PDE model
    Macroscopic,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one solver against a scenario and emit a result envelope
    Simulate {
        /// Which solver family to run
        #[arg(short, long, value_enum)]
        solver: Solver,

        /// Scenario JSON document
        #[arg(short = 'c', long)]
        scenario: PathBuf,

        /// Grid resolution override (mesoscopic/macroscopic)
        #[arg(short, long)]
        grid_size: Option<usize>,

        /// Time-step count override
        #[arg(short, long)]
        time_steps: Option<usize>,

        /// Agent-count override (microscopic)
        #[arg(short, long)]
        num_agents: Option<usize>,

        /// Panic-factor override (microscopic)
        #[arg(short, long)]
        panic_factor: Option<f64>,

        /// Named parameter preset (standard, emergency, crowded, ...)
        #[arg(long, default_value = "standard")]
        preset: String,

        /// Placement seed (microscopic)
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output file for the envelope; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the envelope in compact binary form instead of JSON
        #[arg(long)]
        binary: bool,
    },

    /// Evaluate the grid environment under a uniform random policy
    Rollout {
        /// Scenario JSON document
        #[arg(short = 'c', long)]
        scenario: PathBuf,

        /// Number of seeded episodes
        #[arg(short, long, default_value_t = 20)]
        episodes: usize,

        /// Base seed; episode i uses seed + i
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Grid resolution of the environment
        #[arg(short, long, default_value_t = 50)]
        grid_size: usize,

        /// Agents per episode
        #[arg(short, long, default_value_t = 100)]
        num_agents: usize,

        /// Output file for the report; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and validate a scenario document
    Validate {
        /// Scenario JSON document
        #[arg(short = 'c', long)]
        scenario: PathBuf,

        /// Resolution at which to report rasterization statistics
        #[arg(short, long, default_value_t = 50)]
        grid_size: usize,
    },
}
