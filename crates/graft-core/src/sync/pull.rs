use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::linked::SyncAction;
use crate::workspace::Project;

use super::retry::{RetryChoice, RetryMenu, ask_retry};
use super::{PullOptions, SyncOrchestrator, SyncOutcome};

impl SyncOrchestrator<'_> {
    /// Pull `project`, then (when the policy or options ask for it) its children.
    pub fn pull(&self, project: &Arc<Project>, options: &PullOptions) -> anyhow::Result<SyncOutcome> {
        self.pull_tree(project, options, &mut HashSet::new())
    }

    fn pull_tree(
        &self,
        project: &Arc<Project>,
        options: &PullOptions,
        visited: &mut HashSet<PathBuf>,
    ) -> anyhow::Result<SyncOutcome> {
        if !Self::first_visit(visited, project) {
            return Ok(SyncOutcome::Skipped);
        }
        let git = project.git();
        if !git.is_inside_repo() || !git.is_repo_root() {
            tracing::warn!(
                project = project.name(),
                location = %project.location().display(),
                "not a repository root, skipping pull"
            );
            return Ok(SyncOutcome::Skipped);
        }

        project.linked().clone_missing(
            SyncAction::Pull,
            options.clone_children,
            self.prompter,
            &self.index,
        )?;

        stash_if_dirty(project);

        let branch = git.current_branch()?;
        tracing::info!(project = project.name(), branch = %branch, "pulling");
        loop {
            match git.pull(&branch) {
                Ok(()) => break,
                Err(err) => {
                    tracing::error!(project = project.name(), "pull failed: {:#}", err);
                    let question = format!("Pulling {} ({}) failed. What now?", project.name(), branch);
                    match ask_retry(self.prompter, RetryMenu::Pull, &question)? {
                        RetryChoice::Retry => continue,
                        _ => {
                            tracing::info!(project = project.name(), "pull skipped");
                            return Ok(SyncOutcome::Skipped);
                        }
                    }
                }
            }
        }

        // Manifest and config may have changed on disk.
        let project = reload(project);
        self.index.add(project.location())?;

        if project.settings().auto_stage_all() || options.clone_children {
            self.for_each_child(&project, visited, |child, visited| {
                self.pull_tree(child, options, visited)
            })?;
        }

        self.persist_linked_locations(&project)?;
        Ok(SyncOutcome::Completed)
    }
}

/// Stage then stash local changes. Failures are logged and ignored.
fn stash_if_dirty(project: &Project) {
    let git = project.git();
    if !git.is_dirty() {
        return;
    }
    if let Err(err) = git.stage_all() {
        tracing::warn!(project = project.name(), "could not stage before stash: {:#}", err);
    }
    match git.stash() {
        Ok(()) => tracing::info!(project = project.name(), "stashed local changes"),
        Err(err) => tracing::warn!(project = project.name(), "could not stash: {:#}", err),
    }
}

pub(super) fn reload(project: &Arc<Project>) -> Arc<Project> {
    project
        .registry()
        .and_then(|registry| registry.reload(project))
        .unwrap_or_else(|| Arc::clone(project))
}
