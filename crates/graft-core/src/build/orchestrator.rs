//! Library discovery, ordering, building and installation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use anyhow::Context;

use crate::fs::{DENY_PREFIXES, DENYLIST, LinkMode, copy_into, ensure_symlink, list_candidate_children};
use crate::prompt::Prompter;
use crate::workspace::registry::DEPENDENCY_FOLDER;
use crate::workspace::{Project, ProjectKind};

use super::command::BuildCommand;
use super::order::sort_by_dependencies;
use super::selection::SelectionStore;
use super::watch::{WatchReport, WatchTarget, run_watch};

/// A buildable sub-project of the workspace.
#[derive(Debug, Clone)]
pub struct Library {
    pub project: Arc<Project>,
    pub command: BuildCommand,
}

impl Library {
    pub fn new(project: Arc<Project>) -> Self {
        let command = BuildCommand::derive(project.location(), &project.settings());
        Self { project, command }
    }

    pub fn name(&self) -> String {
        self.project.name().to_string()
    }

    pub fn output_location(&self) -> PathBuf {
        self.project.location().join(&self.command.output_dir)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Overrides the workspace `build.strategy`.
    pub strategy: Option<LinkMode>,
    /// Build even when output already exists.
    pub rebuild: bool,
    pub watch: bool,
    /// Watch every library without asking.
    pub all: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Library names in build order.
    pub order: Vec<String>,
    /// Libraries whose build command ran.
    pub built: Vec<String>,
    /// Install locations created or refreshed.
    pub installed: Vec<PathBuf>,
    pub watch: Option<WatchReport>,
}

/// Builds the libraries of one workspace in dependency order.
pub struct LibraryBuilder<'a> {
    workspace: Arc<Project>,
    prompter: &'a dyn Prompter,
    selections: Option<SelectionStore>,
}

impl<'a> LibraryBuilder<'a> {
    pub fn new(workspace: Arc<Project>, prompter: &'a dyn Prompter) -> Self {
        Self {
            workspace,
            prompter,
            selections: None,
        }
    }

    /// Remember watch selections between runs.
    pub fn with_selection_store(mut self, store: SelectionStore) -> Self {
        self.selections = Some(store);
        self
    }

    pub fn workspace(&self) -> &Arc<Project> {
        &self.workspace
    }

    /// Manifest projects under the configured library roots, or the
    /// workspace's own children when no root holds any.
    pub fn discover(&self) -> Vec<Library> {
        let Some(registry) = self.workspace.registry() else {
            return Vec::new();
        };
        let settings = self.workspace.settings();
        let manifest_children = |dir: &Path| -> Vec<Arc<Project>> {
            list_candidate_children(dir, &DENYLIST, &DENY_PREFIXES)
                .into_iter()
                .filter_map(|child| registry.resolve(child))
                .filter(|p| p.kind() == ProjectKind::Manifest)
                .collect()
        };

        let mut found: Vec<Arc<Project>> = settings
            .library_roots()
            .iter()
            .flat_map(|root| manifest_children(&self.workspace.location().join(root)))
            .collect();
        if found.is_empty() {
            found = manifest_children(self.workspace.location());
        }
        // Overlapping roots ("libs", "./libs") list the same projects again.
        let mut seen = HashSet::new();
        found.retain(|project| seen.insert(project.location().to_path_buf()));

        found.into_iter().map(Library::new).collect()
    }

    /// Discovered libraries, dependencies first.
    pub fn ordered(&self) -> anyhow::Result<Vec<Library>> {
        sort_by_dependencies(
            &self.discover(),
            |lib| lib.name(),
            |lib| lib.project.dependency_names().as_ref().clone(),
        )
    }

    /// Projects that receive installed libraries.
    pub fn consumers(&self) -> Vec<PathBuf> {
        let mut consumers = vec![self.workspace.location().to_path_buf()];
        for target in self.workspace.settings().link_targets() {
            let path = self.workspace.location().join(target);
            if !consumers.contains(&path) {
                consumers.push(path);
            }
        }
        consumers
    }

    /// `<consumer>/node_modules/<name>` for every consumer.
    pub fn install_locations(&self, library: &Library) -> Vec<PathBuf> {
        let name = library.name();
        self.consumers()
            .into_iter()
            .map(|consumer| {
                name.split('/')
                    .fold(consumer.join(DEPENDENCY_FOLDER), |path, part| path.join(part))
            })
            .collect()
    }

    pub fn run(&self, options: &BuildOptions) -> anyhow::Result<BuildReport> {
        let strategy = options
            .strategy
            .unwrap_or_else(|| self.workspace.settings().build_strategy());
        let libraries = self.ordered()?;
        let mut report = BuildReport {
            order: libraries.iter().map(Library::name).collect(),
            ..Default::default()
        };
        tracing::info!(
            workspace = self.workspace.name(),
            strategy = strategy.as_str(),
            "building {} libraries",
            libraries.len()
        );

        for library in &libraries {
            let output = library.output_location();
            if options.rebuild || !output.exists() {
                self.build_one(library)?;
                report.built.push(library.name());
            }
            for install in self.install_locations(library) {
                let changed = match strategy {
                    LinkMode::Symlink => ensure_symlink(&output, &install)?,
                    LinkMode::Copy => copy_into(&output, &install)?,
                }
                .changed;
                if changed {
                    tracing::debug!(library = %library.name(), install = %install.display(), "installed");
                }
                report.installed.push(install);
            }
        }

        if options.watch {
            let selected = self.select_watch_set(&libraries, options.all)?;
            let targets = libraries
                .iter()
                .filter(|lib| selected.contains(&lib.name()))
                .map(|lib| self.watch_target(lib))
                .collect();
            report.watch = Some(run_watch(targets)?);
        }

        Ok(report)
    }

    fn build_one(&self, library: &Library) -> anyhow::Result<()> {
        let (program, args) = library
            .command
            .build
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("Empty build command for {}", library.name()))?;
        tracing::info!(library = %library.name(), "building: {}", library.command.build.join(" "));

        let output = Command::new(program)
            .args(args)
            .current_dir(library.project.location())
            .output()
            .with_context(|| format!("Failed to run build for {}", library.name()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Build of {} failed ({}): {}",
                library.name(),
                output.status,
                stderr.trim()
            );
        }
        Ok(())
    }

    fn watch_target(&self, library: &Library) -> WatchTarget {
        WatchTarget {
            name: library.name(),
            command: library.command.watch.clone(),
            cwd: library.project.location().to_path_buf(),
            success_marker: library.command.success_marker.clone(),
            output: library.output_location(),
            install_locations: self.install_locations(library),
        }
    }

    /// Decide which libraries to watch.
    ///
    /// A remembered selection is offered first; small workspaces are offered
    /// "all"; otherwise the operator picks. The choice is remembered.
    pub fn select_watch_set(&self, libraries: &[Library], all: bool) -> anyhow::Result<Vec<String>> {
        let names: Vec<String> = libraries.iter().map(Library::name).collect();
        if all {
            return Ok(names);
        }
        let location = self.workspace.location();

        if let Some(saved) = self.selections.as_ref().and_then(|s| s.load(location)) {
            let known: Vec<String> = saved
                .libraries
                .into_iter()
                .filter(|n| names.contains(n))
                .collect();
            if !known.is_empty() {
                let question = format!(
                    "Watch the previous selection ({}) from {}?",
                    known.join(", "),
                    saved.saved_at.format("%Y-%m-%d %H:%M")
                );
                if self.prompter.confirm(&question, true)? {
                    return Ok(known);
                }
            }
        }

        let threshold = self.workspace.settings().watch_threshold();
        let selected = if names.len() < threshold
            && self
                .prompter
                .confirm(&format!("Watch all {} libraries?", names.len()), true)?
        {
            names
        } else {
            let picked = self.prompter.multi_select(
                "Libraries to watch",
                &names,
                &vec![false; names.len()],
            )?;
            picked
                .into_iter()
                .filter_map(|i| names.get(i).cloned())
                .collect()
        };

        if let Some(store) = &self.selections
            && let Err(err) = store.save(location, &selected)
        {
            tracing::warn!("could not remember watch selection: {:#}", err);
        }
        Ok(selected)
    }
}
