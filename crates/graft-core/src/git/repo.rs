//! Repository view attached to a project location.

use std::path::Path;

use git2::{BranchType, Repository, Status, StatusOptions};

use super::Git;

/// Git operations scoped to one project directory.
///
/// Obtained through `Project::git()`; borrows the project's location.
#[derive(Debug, Clone, Copy)]
pub struct GitRepo<'a> {
    location: &'a Path,
}

impl<'a> GitRepo<'a> {
    pub fn new(location: &'a Path) -> Self {
        Self { location }
    }

    pub fn location(&self) -> &Path {
        self.location
    }

    pub fn cli(&self) -> Git {
        Git::new(self.location)
    }

    /// Whether the location is anywhere inside a working tree.
    pub fn is_inside_repo(&self) -> bool {
        Repository::discover(self.location)
            .map(|repo| !repo.is_bare())
            .unwrap_or(false)
    }

    /// Whether the location is the top of a working tree, not just inside one.
    pub fn is_repo_root(&self) -> bool {
        let Ok(repo) = Repository::open(self.location) else {
            return false;
        };
        match repo.workdir() {
            Some(workdir) => same_dir(workdir, self.location),
            None => false,
        }
    }

    /// Whether HEAD points at a commit (false for a freshly initialised repo).
    pub fn has_commits(&self) -> bool {
        Repository::discover(self.location)
            .ok()
            .and_then(|repo| repo.head().ok().and_then(|h| h.target()))
            .is_some()
    }

    /// Short name of the checked-out branch, including an unborn one.
    pub fn current_branch(&self) -> anyhow::Result<String> {
        self.cli().run(&["symbolic-ref", "--short", "HEAD"])
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        Repository::discover(self.location)
            .map(|repo| repo.find_branch(name, BranchType::Local).is_ok())
            .unwrap_or(false)
    }

    /// Full message of the HEAD commit without trailing whitespace.
    pub fn last_commit_message(&self) -> Option<String> {
        let repo = Repository::discover(self.location).ok()?;
        let commit = repo.head().ok()?.peel_to_commit().ok()?;
        commit.message().map(|m| m.trim_end().to_string())
    }

    pub fn origin_url(&self) -> Option<String> {
        let repo = Repository::discover(self.location).ok()?;
        let remote = repo.find_remote("origin").ok()?;
        remote.url().map(str::to_string)
    }

    /// Untracked, modified or staged files (ignored files excluded).
    pub fn is_dirty(&self) -> bool {
        self.statuses_any(|_| true)
    }

    pub fn has_staged_changes(&self) -> bool {
        self.statuses_any(|s| {
            s.intersects(
                Status::INDEX_NEW
                    | Status::INDEX_MODIFIED
                    | Status::INDEX_DELETED
                    | Status::INDEX_RENAMED
                    | Status::INDEX_TYPECHANGE,
            )
        })
    }

    fn statuses_any(&self, pred: impl Fn(Status) -> bool) -> bool {
        let Ok(repo) = Repository::discover(self.location) else {
            return false;
        };
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);
        match repo.statuses(Some(&mut opts)) {
            Ok(statuses) => statuses.iter().any(|entry| pred(entry.status())),
            Err(err) => {
                tracing::warn!(location = %self.location.display(), "git status failed: {}", err);
                false
            }
        }
    }

    pub fn stage_all(&self) -> anyhow::Result<()> {
        self.cli().run(&["add", "--all", "."]).map(|_| ())
    }

    pub fn stash(&self) -> anyhow::Result<()> {
        self.cli().run(&["stash"]).map(|_| ())
    }

    pub fn pull(&self, branch: &str) -> anyhow::Result<()> {
        self.cli()
            .run(&["pull", "--no-rebase", "--tags", "origin", branch])
            .map(|_| ())
    }

    pub fn push(&self, branch: &str, force: bool) -> anyhow::Result<()> {
        let mut args = vec!["push"];
        if force {
            args.push("--force");
        }
        args.extend(["--set-upstream", "origin", branch]);
        self.cli().run(&args).map(|_| ())
    }

    pub fn commit(&self, message: &str) -> anyhow::Result<()> {
        self.cli().run(&["commit", "-m", message]).map(|_| ())
    }

    pub fn commit_allow_empty(&self, message: &str) -> anyhow::Result<()> {
        self.cli()
            .run(&["commit", "--allow-empty", "-m", message])
            .map(|_| ())
    }

    /// Undo the HEAD commit, keeping its changes staged.
    pub fn soft_reset_last_commit(&self) -> anyhow::Result<()> {
        self.cli().run(&["reset", "--soft", "HEAD~1"]).map(|_| ())
    }

    /// Whether HEAD has a parent commit that a soft reset could move to.
    pub fn head_has_parent(&self) -> bool {
        Repository::discover(self.location)
            .ok()
            .and_then(|repo| {
                let commit = repo.head().ok()?.peel_to_commit().ok()?;
                Some(commit.parent_count() > 0)
            })
            .unwrap_or(false)
    }

    pub fn amend(&self, message: &str) -> anyhow::Result<()> {
        self.cli()
            .run(&["commit", "--amend", "-m", message])
            .map(|_| ())
    }

    pub fn checkout(&self, branch: &str) -> anyhow::Result<()> {
        self.cli().run(&["checkout", branch]).map(|_| ())
    }

    pub fn checkout_new(&self, branch: &str) -> anyhow::Result<()> {
        self.cli().run(&["checkout", "-b", branch]).map(|_| ())
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.components().eq(b.components()),
    }
}
