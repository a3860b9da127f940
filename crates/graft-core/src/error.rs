//! Error conditions callers need to tell apart.
//!
//! Most functions return `anyhow::Result`; the variants here travel inside the
//! `anyhow::Error` and are recovered with `downcast_ref` where the distinction
//! matters (the CLI exits on `ExitRequested`, sync recursion keeps going on
//! everything else).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// A dependency cycle was found while ordering libraries.
    #[error("Circular dependency detected at '{node}'")]
    CircularDependency { node: String },

    /// The operator chose "exit" in a retry menu.
    #[error("Operation aborted by operator")]
    ExitRequested,

    /// A sync policy rejected the operation for this project.
    #[error("[{project}] {location}: {message}")]
    Policy {
        project: String,
        location: PathBuf,
        message: String,
    },

    /// The local index could not be recovered.
    #[error("Local project index is corrupt and could not be reset: {path}")]
    IndexCorrupt { path: PathBuf },

    /// A git invocation exited with a non-zero status.
    #[error("git {args} failed in {cwd}: {stderr}")]
    GitCommand {
        args: String,
        cwd: PathBuf,
        stderr: String,
    },

    /// A scripted prompter ran out of answers.
    #[error("No scripted answer left for prompt: {question}")]
    NoScriptedAnswer { question: String },
}

impl WorkspaceError {
    pub fn policy(project: &crate::workspace::Project, message: impl Into<String>) -> Self {
        Self::Policy {
            project: project.name().to_string(),
            location: project.location().to_path_buf(),
            message: message.into(),
        }
    }
}

/// Whether an error chain carries an operator "exit" decision.
pub fn is_exit_requested(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<WorkspaceError>(),
        Some(WorkspaceError::ExitRequested)
    )
}
