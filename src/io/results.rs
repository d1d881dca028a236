//! Result envelope persistence: pretty JSON for inspection, bincode for
//! bulk storage.

use crate::envelope::SimulationOutcome;
use crate::error::SimError;
use std::path::Path;

/// Writes an envelope as pretty-printed JSON.
pub fn save_outcome_json(outcome: &SimulationOutcome, path: &Path) -> Result<(), SimError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(outcome)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Writes an envelope in compact binary form.
pub fn save_outcome_binary(outcome: &SimulationOutcome, path: &Path) -> Result<(), SimError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = bincode::serialize(outcome)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Reads an envelope written by [`save_outcome_binary`].
pub fn load_outcome_binary(path: &Path) -> Result<SimulationOutcome, SimError> {
    let bytes = std::fs::read(path)?;
    Ok(bincode::deserialize(&bytes)?)
}
