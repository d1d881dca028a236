//! Policy model store.
//!
//! Each trained policy lives under the store root as two files keyed by its
//! model id: `<id>.json` (metadata) and `<id>.bin` (weights blob). The
//! engine treats the blob as opaque bytes; interpretation is the trainer's
//! business.

use crate::error::SimError;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata persisted alongside a policy weights blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyMetadata {
    /// Store key; must be filesystem-safe.
    pub model_id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Grid resolution the policy observes.
    pub grid_size: usize,
    /// Head count the policy was trained against.
    pub num_agents: usize,
    /// Training episodes completed.
    #[serde(default)]
    pub episodes: usize,
    /// Unix timestamp of creation, supplied by the caller.
    #[serde(default)]
    pub created_at: u64,
}

/// Filesystem-backed model store.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    /// Opens (and creates if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, SimError> {
        std::fs::create_dir_all(root)?;
        Ok(ModelStore {
            root: root.to_path_buf(),
        })
    }

    fn metadata_path(&self, model_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", model_id))
    }

    fn weights_path(&self, model_id: &str) -> PathBuf {
        self.root.join(format!("{}.bin", model_id))
    }

    /// Persists a model: metadata as JSON, weights as raw bytes.
    pub fn save(&self, metadata: &PolicyMetadata, weights: &[u8]) -> Result<(), SimError> {
        if metadata.model_id.is_empty()
            || metadata
                .model_id
                .chars()
                .any(|c| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
        {
            return Err(SimError::InvalidParameters(format!(
                "model id '{}' is not filesystem-safe",
                metadata.model_id
            )));
        }
        let text = serde_json::to_string_pretty(metadata)?;
        std::fs::write(self.metadata_path(&metadata.model_id), text)?;
        std::fs::write(self.weights_path(&metadata.model_id), weights)?;
        info!(
            "saved model '{}' ({} weight bytes)",
            metadata.model_id,
            weights.len()
        );
        Ok(())
    }

    /// Loads a model's metadata and weights blob.
    pub fn load(&self, model_id: &str) -> Result<(PolicyMetadata, Vec<u8>), SimError> {
        let metadata_path = self.metadata_path(model_id);
        if !metadata_path.exists() {
            return Err(SimError::NotFound(format!("model '{}'", model_id)));
        }
        let text = std::fs::read_to_string(&metadata_path)?;
        let metadata: PolicyMetadata = serde_json::from_str(&text)?;
        let weights = std::fs::read(self.weights_path(model_id))
            .map_err(|_| SimError::NotFound(format!("weights blob for model '{}'", model_id)))?;
        Ok((metadata, weights))
    }

    /// Lists the ids of all stored models, sorted.
    pub fn list(&self) -> Result<Vec<String>, SimError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Removes a model's metadata and weights.
    pub fn delete(&self, model_id: &str) -> Result<(), SimError> {
        let metadata_path = self.metadata_path(model_id);
        if !metadata_path.exists() {
            return Err(SimError::NotFound(format!("model '{}'", model_id)));
        }
        std::fs::remove_file(metadata_path)?;
        let weights_path = self.weights_path(model_id);
        if weights_path.exists() {
            std::fs::remove_file(weights_path)?;
        }
        Ok(())
    }
}
