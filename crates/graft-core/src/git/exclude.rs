//! `.git/info/exclude` maintenance for clones nested in a working tree.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::Context;
use git2::Repository;

/// Append `pattern` to the repository's info/exclude unless it is listed.
///
/// Returns whether the file changed. The git directory is located through
/// libgit2, so a `.git` file (worktree, submodule) is followed.
pub fn ensure_git_exclude(repo_root: &Path, pattern: &str) -> anyhow::Result<bool> {
    if pattern.trim().is_empty() || pattern.contains(['\n', '\r']) {
        anyhow::bail!("Invalid git exclude pattern: {:?}", pattern);
    }

    let repo = Repository::open(repo_root)
        .with_context(|| format!("Not a git repository: {}", repo_root.display()))?;
    let exclude = repo.path().join("info").join("exclude");

    let current = match fs::read_to_string(&exclude) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", exclude.display()));
        }
    };
    if current.lines().any(|line| line.trim() == pattern) {
        return Ok(false);
    }

    if let Some(info) = exclude.parent() {
        fs::create_dir_all(info)
            .with_context(|| format!("Failed to create {}", info.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&exclude)
        .with_context(|| format!("Failed to open {}", exclude.display()))?;
    let separator = if current.is_empty() || current.ends_with('\n') { "" } else { "\n" };
    writeln!(file, "{}{}", separator, pattern)
        .with_context(|| format!("Failed to write {}", exclude.display()))?;

    tracing::debug!(repo = %repo_root.display(), pattern, "added git exclude");
    Ok(true)
}
