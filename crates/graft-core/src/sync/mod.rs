//! Push/pull synchronization over a project and its linked children.

pub mod commit;
mod pull;
mod push;
pub mod retry;
pub mod translate;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

pub use commit::{CommitData, CommitType, slugify};
pub use translate::{HttpTranslator, Translator};

use crate::error::is_exit_requested;
use crate::index::LocalIndex;
use crate::prompt::Prompter;
use crate::workspace::Project;

#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Clone missing linked projects without asking and recurse into children.
    pub clone_children: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    pub commit_type: Option<CommitType>,
    pub message: Option<String>,
    pub issues: Vec<String>,
    /// Do not recurse into linked children.
    pub no_recursive: bool,
}

/// How one project's sync ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed,
    /// Not a repository root, or the operator chose "skip".
    Skipped,
}

/// Runs the pull and push flows.
///
/// Every operator decision goes through the injected [`Prompter`]; every
/// synced location ends up in the [`LocalIndex`].
pub struct SyncOrchestrator<'a> {
    prompter: &'a dyn Prompter,
    index: LocalIndex,
    translator: Option<Box<dyn Translator + 'a>>,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(prompter: &'a dyn Prompter, index: LocalIndex) -> Self {
        Self {
            prompter,
            index,
            translator: None,
        }
    }

    /// Use `translator` instead of the configured HTTP endpoint.
    pub fn with_translator(mut self, translator: Box<dyn Translator + 'a>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn index(&self) -> &LocalIndex {
        &self.index
    }

    /// Run `step` for every git child not synced yet in this run. Child
    /// failures are logged; only an operator "exit" stops the loop.
    fn for_each_child<F>(
        &self,
        project: &Project,
        visited: &mut HashSet<PathBuf>,
        mut step: F,
    ) -> anyhow::Result<()>
    where
        F: FnMut(&Arc<Project>, &mut HashSet<PathBuf>) -> anyhow::Result<SyncOutcome>,
    {
        for child in project.linked().git_children() {
            if visited.contains(child.location()) {
                tracing::debug!(child = child.name(), "already synced in this run");
                continue;
            }
            match step(&child, visited) {
                Ok(outcome) => {
                    tracing::debug!(child = child.name(), ?outcome, "child synced");
                }
                Err(err) if is_exit_requested(&err) => return Err(err),
                Err(err) => {
                    tracing::error!(
                        child = child.name(),
                        location = %child.location().display(),
                        "sync failed: {:#}",
                        err
                    );
                }
            }
        }
        Ok(())
    }

    /// Mark `project` as handled; `false` when it already was (linked
    /// projects may declare each other).
    fn first_visit(visited: &mut HashSet<PathBuf>, project: &Project) -> bool {
        if visited.insert(project.location().to_path_buf()) {
            return true;
        }
        tracing::debug!(project = project.name(), "already synced in this run");
        false
    }

    /// Record every declared linked project that exists on disk.
    fn persist_linked_locations(&self, project: &Project) -> anyhow::Result<()> {
        let config = match project.linked().get_config() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(project = project.name(), "linked projects unavailable: {:#}", err);
                return Ok(());
            }
        };
        let existing: Vec<_> = config
            .projects
            .iter()
            .map(|p| p.project_location(project.location()))
            .filter(|location| location.exists())
            .collect();
        self.index.add_all(existing)?;
        Ok(())
    }
}
