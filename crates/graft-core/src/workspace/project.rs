//! The `Project` handle.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use crate::config::{CONFIG_FILE_NAME, ConfigStore, GraftConfig};
use crate::git::GitRepo;
use crate::linked::{LinkedProjects, LinkedProjectsConfig};

use super::manifest::Manifest;
use super::registry::{NearestOptions, WorkspaceRegistry};

/// Classification resolved once per location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectKind {
    /// Directory with a readable `package.json`.
    Manifest,
    /// Existing directory without a usable manifest.
    Unrecognized,
}

type Memo = Arc<dyn Any + Send + Sync>;

/// One resolved workspace directory.
///
/// Location, kind and manifest are fixed at resolution time. Derived values
/// are memoized per instance, and the last loaded linked-projects config is
/// kept on the handle so every holder of the `Arc` observes it.
pub struct Project {
    location: PathBuf,
    kind: ProjectKind,
    manifest: Manifest,
    registry: Weak<WorkspaceRegistry>,
    cache: Mutex<HashMap<&'static str, Memo>>,
    linked_config: Mutex<Option<LinkedProjectsConfig>>,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("location", &self.location)
            .field("kind", &self.kind)
            .field("name", &self.name())
            .finish()
    }
}

impl Project {
    pub(crate) fn new(
        location: PathBuf,
        kind: ProjectKind,
        manifest: Manifest,
        registry: Weak<WorkspaceRegistry>,
    ) -> Self {
        Self {
            location,
            kind,
            manifest,
            registry,
            cache: Mutex::new(HashMap::new()),
            linked_config: Mutex::new(None),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn kind(&self) -> ProjectKind {
        self.kind
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Manifest name, or the directory name for unrecognized projects.
    pub fn name(&self) -> &str {
        match self.manifest.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self
                .location
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default(),
        }
    }

    /// Manifest version when it is valid semver.
    pub fn version(&self) -> Option<semver::Version> {
        let raw = self.manifest.version.as_deref()?;
        match semver::Version::parse(raw) {
            Ok(version) => Some(version),
            Err(err) => {
                tracing::debug!(project = self.name(), version = raw, "invalid version: {}", err);
                None
            }
        }
    }

    pub fn registry(&self) -> Option<Arc<WorkspaceRegistry>> {
        self.registry.upgrade()
    }

    /// Whether the directory carries a `graft.toml` workspace marker.
    pub fn has_marker(&self) -> bool {
        self.location.join(CONFIG_FILE_NAME).is_file()
    }

    /// Git view of this project.
    pub fn git(&self) -> GitRepo<'_> {
        GitRepo::new(&self.location)
    }

    /// Linked-projects view of this project.
    pub fn linked(&self) -> LinkedProjects<'_> {
        LinkedProjects::new(self)
    }

    /// Sorted dependency names across all manifest dependency maps.
    pub fn dependency_names(&self) -> Arc<Vec<String>> {
        self.memoized("dependency-names", || {
            Arc::new(self.manifest.all_dependency_names())
        })
    }

    /// Global config with this project's `graft.toml` layered on top.
    pub fn settings(&self) -> Arc<GraftConfig> {
        self.memoized("settings", || {
            let global = self
                .registry()
                .map(|r| r.global_config().clone())
                .unwrap_or_default();
            let local = match ConfigStore::for_project(&self.location).load() {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(
                        project = self.name(),
                        location = %self.location.display(),
                        "ignoring unreadable {}: {:#}",
                        CONFIG_FILE_NAME,
                        err
                    );
                    GraftConfig::default()
                }
            };
            Arc::new(global.overlay(&local))
        })
    }

    /// Whether the registry's core-template predicate accepts this project.
    pub fn is_core(&self) -> bool {
        self.memoized("is-core", || match self.registry() {
            Some(registry) => registry.is_core(self),
            None => self.settings().is_core(),
        })
    }

    pub fn mainline_branch(&self) -> String {
        self.settings().mainline_branch().to_string()
    }

    /// Nearest manifest project above this one.
    pub fn parent_project(&self) -> Option<Arc<Project>> {
        let registry = self.registry()?;
        let parent = self.location.parent()?;
        registry.nearest_to(
            parent,
            &NearestOptions {
                kind: Some(ProjectKind::Manifest),
                ..Default::default()
            },
        )
    }

    /// Compute `init` once per instance and return the cached value afterwards.
    pub fn memoized<T, F>(&self, key: &'static str, init: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if let Some(hit) = self
            .cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(key).cloned())
            .and_then(|memo| memo.downcast_ref::<T>().cloned())
        {
            return hit;
        }

        // Computed outside the lock; `init` may memoize other keys.
        let value = init();
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, Arc::new(value.clone()));
        }
        value
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Last linked-projects config loaded through [`LinkedProjects::get_config`].
    pub fn linked_config_snapshot(&self) -> Option<LinkedProjectsConfig> {
        self.linked_config.lock().ok().and_then(|c| c.clone())
    }

    pub(crate) fn store_linked_config(&self, config: LinkedProjectsConfig) {
        if let Ok(mut slot) = self.linked_config.lock() {
            *slot = Some(config);
        }
    }
}
