//! Application context shared by frontends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::build::SelectionStore;
use crate::config::{ConfigScope, ConfigStore, GraftConfig, global_config_dir};
use crate::index::LocalIndex;
use crate::workspace::{Project, WorkspaceRegistry};

/// Directories and service factories for one invocation.
///
/// Frontends create this once; tests point every directory into a temp dir.
#[derive(Debug, Clone)]
pub struct AppContext {
    home_dir: PathBuf,
    state_dir: PathBuf,
    data_dir: PathBuf,
    global_config_dir: PathBuf,
}

impl AppContext {
    /// Context rooted at the user's standard directories.
    pub fn from_env() -> anyhow::Result<Self> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
        let state_dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|p| p.join("graft"))
            .unwrap_or_else(|| home_dir.join(".local").join("state").join("graft"));
        let data_dir = dirs::data_dir().unwrap_or_else(|| home_dir.join(".local").join("share"));
        let global_config_dir = global_config_dir(&home_dir);
        Ok(Self::new(home_dir, state_dir, data_dir, global_config_dir))
    }

    /// Create a context with explicit directories.
    pub fn new(
        home_dir: PathBuf,
        state_dir: PathBuf,
        data_dir: PathBuf,
        global_config_dir: PathBuf,
    ) -> Self {
        Self {
            home_dir,
            state_dir,
            data_dir,
            global_config_dir,
        }
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn global_config_dir(&self) -> &Path {
        &self.global_config_dir
    }

    pub fn config_store(&self, scope: ConfigScope, project_root: &Path) -> ConfigStore {
        ConfigStore::from_paths(scope, &self.global_config_dir, project_root)
    }

    /// Global `graft.toml`, or defaults when missing.
    pub fn global_config(&self) -> anyhow::Result<GraftConfig> {
        let config = self
            .config_store(ConfigScope::Global, Path::new(""))
            .load()?;
        config.validate()?;
        Ok(config)
    }

    /// Fresh registry carrying the global config.
    pub fn registry(&self) -> anyhow::Result<Arc<WorkspaceRegistry>> {
        Ok(WorkspaceRegistry::builder()
            .global_config(self.global_config()?)
            .build())
    }

    /// Index for the organization `project` belongs to.
    pub fn local_index_for(&self, project: &Project) -> LocalIndex {
        LocalIndex::for_organization(&self.data_dir, &LocalIndex::organization_for(project))
    }

    pub fn selection_store(&self) -> SelectionStore {
        SelectionStore::new(&self.state_dir)
    }
}
