//! Config store for loading and saving graft.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{ConfigScope, GraftConfig, parser, paths::config_path_for_scope};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    scope: ConfigScope,
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn from_paths(scope: ConfigScope, global_dir: &Path, project_root: &Path) -> Self {
        Self {
            scope,
            config_path: config_path_for_scope(scope, global_dir, project_root),
        }
    }

    /// Store for the `graft.toml` of a single project.
    pub fn for_project(project_root: &Path) -> Self {
        Self {
            scope: ConfigScope::Project,
            config_path: config_path_for_scope(ConfigScope::Project, Path::new(""), project_root),
        }
    }

    pub fn scope(&self) -> ConfigScope {
        self.scope
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn exists(&self) -> bool {
        self.config_path.is_file()
    }

    pub fn load(&self) -> anyhow::Result<GraftConfig> {
        if !self.config_path.exists() {
            return Ok(GraftConfig::default());
        }
        parser::parse_graft_toml(&self.config_path)
    }

    pub fn save(&self, config: &GraftConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
