//! Linked-project graph model.
//!
//! A project may declare sibling repositories it works with in
//! `linked-projects.json`. This module reconciles that declaration with what
//! is actually cloned on disk and exposes the children over which push and
//! pull recurse.

mod children;
mod clone;
mod detect;
pub mod reconcile;
pub mod schema;
mod store;

use std::sync::Arc;

pub use clone::CloneReport;
pub use schema::{LINKED_PROJECTS_FILE, LinkedProject, LinkedProjectsConfig};

use crate::index::LocalIndex;
use crate::prompt::Prompter;
use crate::workspace::Project;

/// Which sync flow is asking for linked-project maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Pull,
    Push,
}

/// Linked-projects view of one project. Obtained through `Project::linked()`.
#[derive(Debug, Clone, Copy)]
pub struct LinkedProjects<'a> {
    project: &'a Project,
}

impl<'a> LinkedProjects<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    pub fn project(&self) -> &Project {
        self.project
    }

    /// Load, reconcile and (only when changed) persist the linked config.
    pub fn get_config(&self) -> anyhow::Result<LinkedProjectsConfig> {
        store::get_config(self.project)
    }

    /// Declare a new linked project, replacing one with the same clone path.
    pub fn add(&self, entry: LinkedProject) -> anyhow::Result<LinkedProjectsConfig> {
        let mut config = self.get_config()?;
        config
            .projects
            .retain(|p| p.relative_clone_path != entry.relative_clone_path);
        config.projects.push(entry);
        store::save_config(self.project, config)
    }

    /// Drop the declaration for `relative_clone_path`. Cloned files stay.
    pub fn remove(&self, relative_clone_path: &str) -> anyhow::Result<LinkedProjectsConfig> {
        let wanted = reconcile::normalize_clone_path(relative_clone_path);
        let mut config = self.get_config()?;
        config.projects.retain(|p| p.relative_clone_path != wanted);
        store::save_config(self.project, config)
    }

    /// Linked projects found on disk below this project.
    pub fn detect(&self, recursive: bool, include_unversioned: bool) -> Vec<LinkedProject> {
        detect::detect(self.project.location(), recursive, include_unversioned)
    }

    /// Clone every declared linked project that is not on disk yet.
    pub fn clone_missing(
        &self,
        action: SyncAction,
        clone_children: bool,
        prompter: &dyn Prompter,
        index: &LocalIndex,
    ) -> anyhow::Result<CloneReport> {
        clone::clone_missing(self.project, action, clone_children, prompter, index)
    }

    /// Children that push/pull recurse into: git roots inside a repository.
    pub fn git_children(&self) -> Vec<Arc<Project>> {
        children::git_children(self.project)
    }
}

#[cfg(test)]
mod tests;
