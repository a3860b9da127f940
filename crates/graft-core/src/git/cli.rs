//! Thin runner around the `git` executable.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;

use crate::error::WorkspaceError;

/// Variables that would redirect git away from `cwd` when graft itself runs
/// inside a git hook.
const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

#[derive(Debug, Clone)]
pub struct Git {
    cwd: PathBuf,
}

impl Git {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Run git with `args`, returning trimmed stdout.
    ///
    /// A non-zero exit becomes [`WorkspaceError::GitCommand`] carrying stderr.
    pub fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        let mut cmd = Command::new("git");
        for key in GIT_ENV_OVERRIDES {
            cmd.env_remove(key);
        }
        let output = cmd
            .args(args)
            .current_dir(&self.cwd)
            .output()
            .with_context(|| format!("Failed to run git {:?}", args))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(WorkspaceError::GitCommand {
                args: args.join(" "),
                cwd: self.cwd.clone(),
                stderr: detail,
            }
            .into());
        }

        tracing::debug!(cwd = %self.cwd.display(), "git {}", args.join(" "));
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run git and report only whether it succeeded.
    pub fn succeeds(&self, args: &[&str]) -> bool {
        self.run(args).is_ok()
    }

    /// Clone `url` at `branch` into `dest` (relative to `cwd` or absolute).
    pub fn clone_into(&self, url: &str, dest: &Path, branch: Option<&str>) -> anyhow::Result<()> {
        let dest = dest
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid clone destination: {}", dest.display()))?;
        let mut args = vec!["clone"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.extend([url, dest]);
        self.run(&args)?;
        Ok(())
    }
}
