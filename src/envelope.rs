//! # Envelope Module - Uniform Solver Results
//!
//! Every solver, including the mock oracle, emits the same in-memory
//! result shape: time-indexed spatial tensors,
//! scalar time series, and run metadata. Absent slots are simply `None`;
//! consumers treat them as zero. Errors map to a small failure envelope with
//! a stable kind tag.

use crate::error::SimError;
use crate::field::Field;
use serde::{Deserialize, Serialize};

/// A time-indexed sequence of spatial fields (`[T]` frames of `N × N`).
pub type FieldSeries = Vec<Field>;

/// A time-indexed sequence of per-agent planar coordinates
/// (`[T][num_agents][2]`).
pub type TrackSeries = Vec<Vec<[f64; 2]>>;

/// Uniform result envelope for all solvers.
///
/// Metadata always carries the effective grid resolution, step count, and
/// time step, plus the flags that record which path produced the data:
/// `mock_data` for the oracle, `truncated` for a cancelled run. Warnings
/// collect recoverable trouble (NaN containment, resource downshifts).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Crowd density per cell, `[T, N, N]`.
    pub density: Option<FieldSeries>,
    /// X-component of the cell velocity field, `[T, N, N]`.
    pub velocity_x: Option<FieldSeries>,
    /// Y-component of the cell velocity field, `[T, N, N]`.
    pub velocity_y: Option<FieldSeries>,
    /// Fire intensity per cell, `[T, N, N]` (macroscopic only).
    pub fire: Option<FieldSeries>,
    /// Per-agent positions in meters, `[T, A, 2]` (microscopic only).
    pub positions: Option<TrackSeries>,
    /// Per-agent velocities in m/s, `[T, A, 2]` (microscopic only).
    pub velocities: Option<TrackSeries>,

    /// Mass evacuated per step (macroscopic).
    pub evacuated_count: Option<Vec<f64>>,
    /// Total occupancy per step (mesoscopic).
    pub total_occupancy: Option<Vec<f64>>,
    /// Cumulative evacuated agents per step (microscopic).
    pub safe_agents: Option<Vec<usize>>,

    /// Panic factor in effect (microscopic).
    pub panic_factor: Option<f64>,
    /// Grid resolution the run actually used.
    pub grid_resolution: usize,
    /// Number of recorded time steps.
    pub time_steps: usize,
    /// Integration time step in seconds.
    pub dt: f64,
    /// True when the mock oracle produced this envelope.
    pub mock_data: bool,
    /// True when the run was cancelled and the series are shorter than
    /// requested.
    pub truncated: bool,
    /// Recoverable anomalies encountered during the run.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl SimulationOutcome {
    /// Empty envelope with metadata filled in.
    pub fn with_meta(grid_resolution: usize, time_steps: usize, dt: f64) -> Self {
        SimulationOutcome {
            grid_resolution,
            time_steps,
            dt,
            ..Default::default()
        }
    }

    /// Number of frames actually recorded in the densest series present.
    pub fn recorded_steps(&self) -> usize {
        self.density
            .as_ref()
            .map(|d| d.len())
            .or_else(|| self.positions.as_ref().map(|p| p.len()))
            .unwrap_or(self.time_steps)
    }
}

/// Structured failure envelope: `{success: false, error, error_kind}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEnvelope {
    pub success: bool,
    pub error: String,
    pub error_kind: String,
}

impl From<&SimError> for FailureEnvelope {
    fn from(err: &SimError) -> Self {
        FailureEnvelope {
            success: false,
            error: err.to_string(),
            error_kind: err.kind().to_string(),
        }
    }
}
