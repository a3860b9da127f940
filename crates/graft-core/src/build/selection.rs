//! Remembered watch selections, one file per workspace.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSelection {
    pub libraries: Vec<String>,
    pub saved_at: DateTime<Utc>,
}

/// Stores selections under `<state_dir>/build-selection/<key>.json`.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    dir: PathBuf,
}

impl SelectionStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            dir: state_dir.join("build-selection"),
        }
    }

    /// Stable key for a workspace location.
    pub fn workspace_key(workspace: &Path) -> String {
        let path = fs::canonicalize(workspace).unwrap_or_else(|_| workspace.to_path_buf());
        blake3::hash(path.to_string_lossy().as_bytes())
            .to_hex()
            .to_string()
    }

    fn path_for(&self, workspace: &Path) -> PathBuf {
        self.dir
            .join(format!("{}.json", Self::workspace_key(workspace)))
    }

    /// Previous selection, if any. An unreadable file counts as none.
    pub fn load(&self, workspace: &Path) -> Option<SavedSelection> {
        let path = self.path_for(workspace);
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(saved) => Some(saved),
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable selection: {}", err);
                None
            }
        }
    }

    pub fn save(&self, workspace: &Path, libraries: &[String]) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create selection directory: {}", self.dir.display()))?;
        let saved = SavedSelection {
            libraries: libraries.to_vec(),
            saved_at: Utc::now(),
        };
        let path = self.path_for(workspace);
        let bytes = serde_json::to_vec_pretty(&saved).context("Failed to serialize selection")?;
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to write selection: {}", path.display()))
    }
}
