use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use anyhow::Context;

use crate::error::WorkspaceError;
use crate::linked::SyncAction;
use crate::workspace::Project;

use super::commit::{CommitData, warn_on_disagreement};
use super::retry::{RetryChoice, RetryMenu, ask_retry};
use super::translate::HttpTranslator;
use super::{PushOptions, SyncOrchestrator, SyncOutcome};

const INITIAL_COMMIT_MESSAGE: &str = "chore: initial commit";

impl SyncOrchestrator<'_> {
    /// Commit and push `project`, then recurse into its children.
    pub fn push(&self, project: &Arc<Project>, options: &PushOptions) -> anyhow::Result<SyncOutcome> {
        self.push_tree(project, options, &mut HashSet::new())
    }

    fn push_tree(
        &self,
        project: &Arc<Project>,
        options: &PushOptions,
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
                "not a repository root, skipping push"
            );
            return Ok(SyncOutcome::Skipped);
        }
        if !git.has_commits() && !self.bootstrap(project)? {
            return Ok(SyncOutcome::Skipped);
        }

        let settings = project.settings();
        if !settings.auto_stage_all() {
            project
                .linked()
                .clone_missing(SyncAction::Push, false, self.prompter, &self.index)?;
        }
        self.index.add(project.location())?;

        let data = self.resolve_commit_data(project, options)?;

        if let Some(command) = settings.sync.lint_command.as_deref() {
            self.lint(project, command)?;
        }

        let current = git.current_branch()?;
        if !settings.metadata_branching() && !data.is_action_commit && data.commit_message == current {
            return Err(WorkspaceError::policy(
                project,
                format!(
                    "commit message would just be the branch name '{}'; pass a more specific message",
                    current
                ),
            )
            .into());
        }

        if settings.auto_stage_all() {
            git.stage_all()?;
        }

        if settings.metadata_branching()
            && !data.is_action_commit
            && !data.branch_name.is_empty()
            && data.branch_name != current
        {
            self.switch_branch(project, &current, &data.branch_name)?;
        }

        commit(project, &data.commit_message)?;

        let branch = git.current_branch()?;
        let mut force = false;
        loop {
            tracing::info!(project = project.name(), branch = %branch, force, "pushing");
            match git.push(&branch, force) {
                Ok(()) => break,
                Err(err) => {
                    tracing::error!(project = project.name(), "push failed: {:#}", err);
                    let question = format!("Pushing {} ({}) failed. What now?", project.name(), branch);
                    match ask_retry(self.prompter, RetryMenu::Push, &question)? {
                        RetryChoice::Retry => force = false,
                        RetryChoice::Force => force = true,
                        _ => {
                            tracing::info!(project = project.name(), "push skipped");
                            return Ok(SyncOutcome::Skipped);
                        }
                    }
                }
            }
        }

        let skip_recursive = project
            .linked()
            .get_config()
            .map(|c| c.skip_recursive_push)
            .unwrap_or(false);
        if !options.no_recursive && !skip_recursive {
            self.for_each_child(project, visited, |child, visited| {
                self.push_tree(child, options, visited)
            })?;
        }

        self.persist_linked_locations(project)?;
        Ok(SyncOutcome::Completed)
    }

    /// Offer to put an empty repository on the mainline branch with a first commit.
    fn bootstrap(&self, project: &Project) -> anyhow::Result<bool> {
        let mainline = project.mainline_branch();
        let question = format!(
            "{} has no commits yet. Check out '{}' and create an initial commit?",
            project.name(),
            mainline
        );
        if !self.prompter.confirm(&question, true)? {
            tracing::info!(project = project.name(), "empty repository left alone");
            return Ok(false);
        }

        let git = project.git();
        if git.current_branch().ok().as_deref() != Some(mainline.as_str()) {
            git.checkout_new(&mainline)?;
        }
        git.commit_allow_empty(INITIAL_COMMIT_MESSAGE)?;
        tracing::info!(project = project.name(), branch = %mainline, "created initial commit");
        Ok(true)
    }

    fn resolve_commit_data(&self, project: &Project, options: &PushOptions) -> anyhow::Result<CommitData> {
        let settings = project.settings();
        let from_args = CommitData::from_args(
            options.commit_type,
            options.message.as_deref(),
            &options.issues,
        );
        let from_branch = project
            .git()
            .current_branch()
            .ok()
            .map(|branch| CommitData::from_branch(&branch));

        match (from_args, from_branch) {
            (Some(args), Some(branch)) => {
                warn_on_disagreement(&args, &branch);
                Ok(args)
            }
            (Some(args), None) => Ok(args),
            (None, Some(mut branch)) => {
                if settings.commit_message_required()
                    && !branch.is_action_commit
                    && !branch.follows_convention()
                {
                    return Err(WorkspaceError::policy(project, "a commit message is required").into());
                }
                if let Some(translation) = settings.translation() {
                    match &self.translator {
                        Some(translator) => branch.translate(translator.as_ref(), &translation),
                        None => branch.translate(&HttpTranslator::from_settings(&translation), &translation),
                    }
                }
                Ok(branch)
            }
            (None, None) => Err(WorkspaceError::policy(
                project,
                "no commit message given and no current branch to derive one from",
            )
            .into()),
        }
    }

    fn switch_branch(&self, project: &Project, current: &str, target: &str) -> anyhow::Result<()> {
        if project.settings().confirm_branch_change() {
            let question = format!("Switch {} from '{}' to '{}'?", project.name(), current, target);
            if !self.prompter.confirm(&question, true)? {
                tracing::info!(project = project.name(), branch = current, "staying on current branch");
                return Ok(());
            }
        }
        let git = project.git();
        if git.branch_exists(target) {
            git.checkout(target)
        } else {
            git.checkout_new(target)
        }
    }

    /// Run the lint command until it passes or the operator skips it.
    fn lint(&self, project: &Project, command: &str) -> anyhow::Result<()> {
        loop {
            let status = shell(command)
                .current_dir(project.location())
                .status()
                .with_context(|| format!("Failed to run lint command: {}", command));
            match status {
                Ok(status) if status.success() => return Ok(()),
                Ok(status) => tracing::error!(project = project.name(), %status, "lint failed"),
                Err(err) => tracing::error!(project = project.name(), "{:#}", err),
            }

            let question = format!("Lint failed for {}. What now?", project.name());
            match ask_retry(self.prompter, RetryMenu::Lint, &question)? {
                RetryChoice::Retry => continue,
                _ => {
                    tracing::warn!(project = project.name(), "lint skipped");
                    return Ok(());
                }
            }
        }
    }
}

/// Commit staged changes with `message`.
///
/// When HEAD already carries `message`, that commit is folded into the new
/// one instead of stacking a duplicate.
fn commit(project: &Project, message: &str) -> anyhow::Result<()> {
    let git = project.git();
    if git.last_commit_message().as_deref() == Some(message) {
        if git.head_has_parent() {
            tracing::debug!(project = project.name(), "head has the same message, soft reset");
            git.soft_reset_last_commit()?;
            if !git.has_staged_changes() {
                return git.commit_allow_empty(message);
            }
        } else {
            if git.has_staged_changes() {
                git.amend(message)?;
            }
            return Ok(());
        }
    }

    if !git.has_staged_changes() {
        tracing::info!(project = project.name(), "nothing to commit");
        return Ok(());
    }
    git.commit(message)
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}
