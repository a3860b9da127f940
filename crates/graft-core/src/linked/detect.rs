//! Discovery of linked projects already present on disk.

use std::path::Path;

use walkdir::WalkDir;

use crate::config::CONFIG_FILE_NAME;
use crate::fs::{DENY_PREFIXES, DENYLIST, list_candidate_children, walk::is_candidate_name};
use crate::git::GitRepo;
use crate::workspace::MANIFEST_FILE_NAME;

use super::schema::LinkedProject;

pub(super) fn detect(
    location: &Path,
    recursive: bool,
    include_unversioned: bool,
) -> Vec<LinkedProject> {
    if recursive {
        detect_recursive(location, include_unversioned)
    } else {
        list_candidate_children(location, &DENYLIST, &DENY_PREFIXES)
            .into_iter()
            .filter_map(|child| describe(location, &child, include_unversioned))
            .collect()
    }
}

fn detect_recursive(location: &Path, include_unversioned: bool) -> Vec<LinkedProject> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(location)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.file_type().is_dir()
                && is_candidate_name(&entry.file_name().to_string_lossy(), &DENYLIST, &DENY_PREFIXES)
        });

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {}", err);
                continue;
            }
        };
        if let Some(linked) = describe(location, entry.path(), include_unversioned) {
            found.push(linked);
            // Anything deeper belongs to that clone.
            walker.skip_current_dir();
        }
    }
    found
}

/// Linked-project entry for `child` if it is a git root, or an unversioned
/// workspace project when `include_unversioned` is set.
fn describe(owner: &Path, child: &Path, include_unversioned: bool) -> Option<LinkedProject> {
    let repo = GitRepo::new(child);
    let versioned = repo.is_repo_root();
    let unversioned = include_unversioned
        && child.join(CONFIG_FILE_NAME).is_file()
        && child.join(MANIFEST_FILE_NAME).is_file();
    if !versioned && !unversioned {
        return None;
    }

    let relative = child
        .strip_prefix(owner)
        .ok()?
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let mut entry = LinkedProject::new(relative);
    if versioned {
        entry.remote_url = repo.origin_url();
        entry.default_branch = repo.current_branch().ok();
    }
    Some(entry)
}
