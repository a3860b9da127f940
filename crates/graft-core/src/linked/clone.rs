//! Cloning declared linked projects that are missing on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::fs::remove_path;
use crate::git::{Git, GitRepo, ensure_git_exclude, remote};
use crate::index::LocalIndex;
use crate::prompt::Prompter;
use crate::sync::retry::{RetryChoice, RetryMenu, ask_retry};
use crate::workspace::Project;

use super::SyncAction;
use super::schema::LinkedProject;

/// What [`clone_missing`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneReport {
    /// Clone destinations created in this run.
    pub cloned: Vec<PathBuf>,
    /// Clone paths left missing (declined, skipped after failure, no URL, or
    /// occupied by something that is not a clone).
    pub skipped: Vec<String>,
}

pub(super) fn clone_missing(
    project: &Project,
    action: SyncAction,
    clone_children: bool,
    prompter: &dyn Prompter,
    index: &LocalIndex,
) -> anyhow::Result<CloneReport> {
    let mut report = CloneReport::default();
    if action == SyncAction::Push && project.settings().auto_stage_all() {
        tracing::debug!(project = project.name(), "auto-stage on; not cloning during push");
        return Ok(report);
    }

    let config = project.linked().get_config()?;
    if config.projects.is_empty() {
        return Ok(report);
    }

    let owner_flavor = project
        .git()
        .origin_url()
        .map(|url| remote::flavor(&url))
        .unwrap_or(remote::RemoteFlavor::Other);

    for entry in &config.projects {
        let path = &entry.relative_clone_path;
        let dest = entry.clone_location(project.location());
        match occupancy(&dest) {
            Occupancy::Clone => continue,
            Occupancy::Foreign => {
                tracing::warn!(
                    project = project.name(),
                    path = %dest.display(),
                    "clone destination exists and is not a git repository; leaving it alone"
                );
                report.skipped.push(path.clone());
                continue;
            }
            Occupancy::Free => {}
        }

        let Some(url) = entry.clone_url(owner_flavor) else {
            tracing::warn!(project = project.name(), clone_path = %path, "no remote URL; not cloning");
            report.skipped.push(path.clone());
            continue;
        };

        if !clone_children
            && !prompter.confirm(&format!("Clone missing linked project '{}' from {}?", path, url), true)?
        {
            report.skipped.push(path.clone());
            continue;
        }

        if clone_with_retry(project, entry, &dest, url, prompter)? {
            after_clone(project, entry, &dest, index);
            report.cloned.push(dest);
        } else {
            report.skipped.push(path.clone());
        }
    }

    Ok(report)
}

enum Occupancy {
    /// Already the top of a working tree.
    Clone,
    /// Missing, or an empty directory `git clone` accepts.
    Free,
    /// A file or a non-empty directory that is not a clone.
    Foreign,
}

fn occupancy(dest: &Path) -> Occupancy {
    if GitRepo::new(dest).is_repo_root() {
        return Occupancy::Clone;
    }
    match fs::symlink_metadata(dest) {
        Err(_) => Occupancy::Free,
        Ok(meta) if meta.is_dir() => match fs::read_dir(dest).map(|mut entries| entries.next().is_none()) {
            Ok(true) => Occupancy::Free,
            _ => Occupancy::Foreign,
        },
        Ok(_) => Occupancy::Foreign,
    }
}

/// Returns `false` when the operator skipped the clone.
fn clone_with_retry(
    project: &Project,
    entry: &LinkedProject,
    dest: &Path,
    url: &str,
    prompter: &dyn Prompter,
) -> anyhow::Result<bool> {
    let branch = entry.branch_or("");
    let branch = (!branch.is_empty()).then_some(branch);

    loop {
        let existed = dest.exists();
        tracing::info!(clone_path = %entry.relative_clone_path, url, "cloning linked project");
        match Git::new(project.location()).clone_into(url, dest, branch) {
            Ok(()) => return Ok(true),
            Err(err) => {
                tracing::error!(clone_path = %entry.relative_clone_path, "clone failed: {:#}", err);
                // Only clean up what this attempt created.
                if !existed
                    && dest.exists()
                    && let Err(err) = remove_path(dest)
                {
                    tracing::warn!(path = %dest.display(), "could not remove partial clone: {}", err);
                }
                let question = format!("Cloning '{}' failed. What now?", entry.relative_clone_path);
                match ask_retry(prompter, RetryMenu::Clone, &question)? {
                    RetryChoice::Retry => continue,
                    _ => return Ok(false),
                }
            }
        }
    }
}

fn after_clone(project: &Project, entry: &LinkedProject, dest: &Path, index: &LocalIndex) {
    // Clones outside the owner's tree (`../sibling`) are not the owner's to ignore.
    if project.git().is_repo_root()
        && let Ok(inside) = dest.strip_prefix(project.location())
    {
        let pattern = format!("/{}", inside.to_string_lossy().replace('\\', "/"));
        if let Err(err) = ensure_git_exclude(project.location(), &pattern) {
            tracing::warn!(project = project.name(), "could not update git exclude: {:#}", err);
        }
    }

    let location = entry.project_location(project.location());
    if let Some(registry) = project.registry() {
        registry.unload_location(&location);
        if registry.resolve(&location).is_none() {
            tracing::warn!(path = %location.display(), "cloned linked project not found on disk");
        }
    }
    if let Err(err) = index.add(&location) {
        tracing::warn!("could not record clone in local index: {:#}", err);
    }
}
