//! Candidate child directory listing.
//!
//! Listing is kept apart from classification: callers decide afterwards
//! whether a candidate is a project, a git root or a linked clone.

use std::fs;
use std::path::{Path, PathBuf};

/// Structural folder names that never hold a child project.
pub const DENYLIST: [&str; 8] = [
    "node_modules",
    "bower_components",
    "dist",
    "build",
    "coverage",
    "out",
    "tmp",
    "target",
];

/// Name prefixes that never hold a child project (hidden and scratch folders).
pub const DENY_PREFIXES: [&str; 3] = [".", "tmp-", "tmp_"];

/// Immediate subdirectories of `dir` that are not excluded by name.
///
/// Symlinked directories are skipped. The result is sorted so callers see a
/// stable order. A missing or unreadable `dir` yields an empty list.
pub fn list_candidate_children(dir: &Path, denylist: &[&str], deny_prefixes: &[&str]) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut children: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| is_candidate_name(&entry.file_name().to_string_lossy(), denylist, deny_prefixes))
        .map(|entry| entry.path())
        .collect();
    children.sort();
    children
}

pub fn is_candidate_name(name: &str, denylist: &[&str], deny_prefixes: &[&str]) -> bool {
    !denylist.contains(&name) && !deny_prefixes.iter().any(|p| name.starts_with(p))
}
