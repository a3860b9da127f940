use std::path::PathBuf;
use std::sync::Arc;

use crate::fs::{DENY_PREFIXES, DENYLIST, list_candidate_children};
use crate::workspace::Project;

/// Linked children that are themselves the top of a git working tree.
///
/// Declared entries (joined with their internal path) win; without any
/// declaration the immediate candidate children are considered.
pub(super) fn git_children(project: &Project) -> Vec<Arc<Project>> {
    let Some(registry) = project.registry() else {
        return Vec::new();
    };

    let config = match project.linked().get_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(project = project.name(), "linked projects unavailable: {:#}", err);
            Default::default()
        }
    };

    let candidates: Vec<PathBuf> = if config.projects.is_empty() {
        list_candidate_children(project.location(), &DENYLIST, &DENY_PREFIXES)
    } else {
        config
            .projects
            .iter()
            .map(|p| p.project_location(project.location()))
            .collect()
    };

    candidates
        .into_iter()
        .filter_map(|location| registry.resolve(location))
        .filter(|child| child.location() != project.location())
        .filter(|child| {
            let git = child.git();
            git.is_inside_repo() && git.is_repo_root()
        })
        .collect()
}
