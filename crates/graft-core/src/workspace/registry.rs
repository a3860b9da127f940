//! Identity-mapped project resolution.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;

use crate::config::GraftConfig;

use super::manifest::{MANIFEST_FILE_NAME, Manifest};
use super::path::canonical_location;
use super::probe::{FsProbe, StdFs};
use super::project::{Project, ProjectKind};

/// Folder into which dependencies are installed; never a project root.
pub const DEPENDENCY_FOLDER: &str = "node_modules";

pub type CorePredicate = Box<dyn Fn(&Project) -> bool + Send + Sync>;

/// Filters for [`WorkspaceRegistry::nearest_to`].
#[derive(Debug, Clone, Default)]
pub struct NearestOptions {
    pub kind: Option<ProjectKind>,
    /// Require the match to be the top of a git working tree.
    pub find_git_root: bool,
    /// Never stop inside a `node_modules` folder.
    pub only_outside_dependency_folders: bool,
}

/// Process-local registry of resolved projects.
///
/// Holds at most one [`Project`] per canonical location, so long-lived holders
/// observe each other's mutations. The cache is invalidated only through
/// [`add`](Self::add), [`unload`](Self::unload) and [`remove`](Self::remove).
pub struct WorkspaceRegistry {
    projects: Mutex<HashMap<PathBuf, Arc<Project>>>,
    missing: Mutex<HashSet<PathBuf>>,
    probe: Arc<dyn FsProbe>,
    global_config: GraftConfig,
    core_predicate: CorePredicate,
}

impl std::fmt::Debug for WorkspaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceRegistry")
            .field("projects", &self.len())
            .finish()
    }
}

/// Builder for [`WorkspaceRegistry`].
pub struct RegistryBuilder {
    probe: Arc<dyn FsProbe>,
    global_config: GraftConfig,
    core_predicate: CorePredicate,
}

impl RegistryBuilder {
    pub fn probe(mut self, probe: Arc<dyn FsProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn global_config(mut self, config: GraftConfig) -> Self {
        self.global_config = config;
        self
    }

    pub fn core_predicate(mut self, predicate: CorePredicate) -> Self {
        self.core_predicate = predicate;
        self
    }

    pub fn build(self) -> Arc<WorkspaceRegistry> {
        Arc::new(WorkspaceRegistry {
            projects: Mutex::new(HashMap::new()),
            missing: Mutex::new(HashSet::new()),
            probe: self.probe,
            global_config: self.global_config,
            core_predicate: self.core_predicate,
        })
    }
}

impl WorkspaceRegistry {
    /// Registry probing the real filesystem with an empty global config.
    pub fn new() -> Arc<Self> {
        Self::builder().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            probe: Arc::new(StdFs),
            global_config: GraftConfig::default(),
            core_predicate: Box::new(|project: &Project| project.settings().is_core()),
        }
    }

    pub fn global_config(&self) -> &GraftConfig {
        &self.global_config
    }

    pub(crate) fn is_core(&self, project: &Project) -> bool {
        (self.core_predicate)(project)
    }

    /// Number of resolved projects currently cached.
    pub fn len(&self) -> usize {
        self.projects.lock().map(|p| p.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached project at `location` without probing.
    pub fn cached(&self, location: impl AsRef<Path>) -> Option<Arc<Project>> {
        let key = canonical_location(location.as_ref());
        self.projects.lock().ok()?.get(&key).cloned()
    }

    /// Resolve `location` to its project handle.
    ///
    /// Returns the cached instance when there is one. A location confirmed
    /// missing is remembered and not probed again.
    pub fn resolve(self: &Arc<Self>, location: impl AsRef<Path>) -> Option<Arc<Project>> {
        let key = canonical_location(location.as_ref());

        if let Some(hit) = self.projects.lock().ok()?.get(&key) {
            return Some(Arc::clone(hit));
        }
        if self.missing.lock().ok()?.contains(&key) {
            return None;
        }

        if !self.probe.exists(&key) {
            tracing::debug!(location = %key.display(), "no project: location does not exist");
            if let Ok(mut missing) = self.missing.lock() {
                missing.insert(key);
            }
            return None;
        }

        let (kind, manifest) = self.classify(&key);
        let project = Arc::new(Project::new(
            key.clone(),
            kind,
            manifest,
            Arc::downgrade(self),
        ));

        let mut projects = self.projects.lock().ok()?;
        Some(Arc::clone(projects.entry(key).or_insert(project)))
    }

    fn classify(&self, location: &Path) -> (ProjectKind, Manifest) {
        let manifest_path = location.join(MANIFEST_FILE_NAME);
        if !self.probe.is_file(&manifest_path) {
            return (ProjectKind::Unrecognized, Manifest::default());
        }
        let parsed = self
            .probe
            .read_to_string(&manifest_path)
            .map_err(anyhow::Error::from)
            .and_then(|content| Manifest::parse(&content));
        match parsed {
            Ok(manifest) => (ProjectKind::Manifest, manifest),
            Err(err) => {
                tracing::warn!(
                    location = %location.display(),
                    "unreadable {}, treating as unrecognized: {:#}",
                    MANIFEST_FILE_NAME,
                    err
                );
                (ProjectKind::Unrecognized, Manifest::default())
            }
        }
    }

    /// Walk from `location` towards the filesystem root and return the first
    /// project accepted by `options`.
    pub fn nearest_to(
        self: &Arc<Self>,
        location: impl AsRef<Path>,
        options: &NearestOptions,
    ) -> Option<Arc<Project>> {
        let mut current = canonical_location(location.as_ref());

        loop {
            if options.only_outside_dependency_folders {
                current = above_dependency_folder(current)?;
            }

            let project = self.resolve(&current)?;
            let kind_matches = options.kind.is_none_or(|kind| project.kind() == kind);
            if kind_matches && (!options.find_git_root || project.git().is_repo_root()) {
                return Some(project);
            }

            let here = project.location().to_path_buf();
            let parent = here.parent()?.to_path_buf();
            if parent == here || parent == current {
                return None;
            }
            current = parent;
        }
    }

    /// Chain of manifest projects from `location` upwards, nearest first.
    ///
    /// Stops after `stop_at` when given. Each location appears once.
    pub fn all_projects_from(
        self: &Arc<Self>,
        location: impl AsRef<Path>,
        stop_at: Option<&Path>,
    ) -> Vec<Arc<Project>> {
        let stop_at = stop_at.map(canonical_location);
        let options = NearestOptions {
            kind: Some(ProjectKind::Manifest),
            ..Default::default()
        };

        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(canonical_location(location.as_ref()));

        while let Some(start) = next.take() {
            let Some(project) = self.nearest_to(&start, &options) else {
                break;
            };
            if !seen.insert(project.location().to_path_buf()) {
                break;
            }
            chain.push(Arc::clone(&project));

            if stop_at.as_deref() == Some(project.location()) {
                break;
            }
            next = project.location().parent().map(Path::to_path_buf);
            if let (Some(parent), Some(stop)) = (&next, &stop_at)
                && !parent.starts_with(stop)
            {
                break;
            }
        }
        chain
    }

    /// Register `project` under its location, replacing any cached instance.
    pub fn add(&self, project: Arc<Project>) {
        let key = project.location().to_path_buf();
        if let Ok(mut missing) = self.missing.lock() {
            missing.remove(&key);
        }
        if let Ok(mut projects) = self.projects.lock() {
            projects.insert(key, project);
        }
    }

    /// Forget `project` so the next resolution reads the disk again.
    pub fn unload(&self, project: &Project) -> Option<Arc<Project>> {
        self.unload_location(project.location())
    }

    /// Forget whatever is cached for `location`, positive or negative.
    pub fn unload_location(&self, location: impl AsRef<Path>) -> Option<Arc<Project>> {
        let key = canonical_location(location.as_ref());
        if let Ok(mut missing) = self.missing.lock() {
            missing.remove(&key);
        }
        self.projects.lock().ok()?.remove(&key)
    }

    /// Unload and resolve again, returning the fresh instance.
    pub fn reload(self: &Arc<Self>, project: &Project) -> Option<Arc<Project>> {
        self.unload(project);
        self.resolve(project.location())
    }

    /// Unload `project` and delete its directory from disk.
    pub fn remove(&self, project: &Project) -> anyhow::Result<()> {
        self.unload(project);
        let location = project.location();
        if location.exists() {
            std::fs::remove_dir_all(location).with_context(|| {
                format!("Failed to remove project directory: {}", location.display())
            })?;
        }
        if let Ok(mut missing) = self.missing.lock() {
            missing.insert(location.to_path_buf());
        }
        tracing::info!(location = %location.display(), "removed project");
        Ok(())
    }
}

/// Climb out of any `node_modules` (or `node_modules/@scope`) folder that
/// contains `path`.
fn above_dependency_folder(mut path: PathBuf) -> Option<PathBuf> {
    loop {
        let parent = path.parent()?;
        let grandparent = parent.parent();
        let parent_name = parent.file_name().and_then(|n| n.to_str()).unwrap_or_default();

        if parent_name == DEPENDENCY_FOLDER {
            path = grandparent?.to_path_buf();
        } else if parent_name.starts_with('@')
            && grandparent
                .and_then(|g| g.file_name())
                .is_some_and(|n| n == DEPENDENCY_FOLDER)
        {
            path = grandparent?.parent()?.to_path_buf();
        } else {
            return Some(path);
        }
    }
}
