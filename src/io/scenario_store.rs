//! Scenario JSON load/save.

use crate::error::SimError;
use crate::scenario::Scenario;
use log::info;
use std::path::Path;

/// Loads a scenario document and validates it.
pub fn load_scenario(path: &Path) -> Result<Scenario, SimError> {
    let text = std::fs::read_to_string(path)?;
    let scenario: Scenario = serde_json::from_str(&text)?;
    scenario.validate()?;
    info!(
        "loaded scenario '{}' ({} walls, {} exits, {} hazards)",
        scenario.name,
        scenario.building_layout.walls.len(),
        scenario.building_layout.exits.len(),
        scenario.hazards.len()
    );
    Ok(scenario)
}

/// Saves a scenario as pretty-printed JSON, creating parent directories.
pub fn save_scenario(scenario: &Scenario, path: &Path) -> Result<(), SimError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(scenario)?;
    std::fs::write(path, text)?;
    Ok(())
}
