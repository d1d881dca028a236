//! Error types for the evacuation engine.
//!
//! Every fallible library entry point returns [`SimError`]. Each variant maps
//! to a stable snake_case kind tag used in the failure envelope, so callers
//! can switch on `error_kind` without parsing messages.

use thiserror::Error;

/// Engine-wide error type.
#[derive(Debug, Error)]
pub enum SimError {
    /// The scenario is structurally unusable (e.g. no exits, malformed wall
    /// segment). Raised before any state allocation.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    /// A request parameter is out of range (zero grid, zero agents, negative
    /// counts, stepping a finished episode).
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The request exceeds the configured resource caps. The solver surface
    /// downshifts to the mock oracle instead of surfacing this variant.
    #[error("resource limits exceeded: {0}")]
    ResourceExceeded(String),

    /// A referenced scenario or model id does not exist in the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-finite values were detected in a state field and could not be
    /// contained.
    #[error("numerical failure: {0}")]
    InternalNumerical(String),

    /// The run was cancelled between time steps.
    #[error("cancelled")]
    Cancelled,

    /// Filesystem failure in the persistence layer.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure in the persistence layer.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Binary (de)serialization failure in the persistence layer.
    #[error(transparent)]
    Bin(#[from] bincode::Error),
}

impl SimError {
    /// Stable kind tag for the failure envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            SimError::InvalidScenario(_) => "invalid_scenario",
            SimError::InvalidParameters(_) => "invalid_parameters",
            SimError::ResourceExceeded(_) => "resource_exceeded",
            SimError::NotFound(_) => "not_found",
            SimError::InternalNumerical(_) => "internal_numerical",
            SimError::Cancelled => "cancelled",
            SimError::Io(_) => "io",
            SimError::Json(_) => "serialization",
            SimError::Bin(_) => "serialization",
        }
    }
}
