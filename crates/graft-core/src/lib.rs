//! Graft Core Library
//!
//! Resolves workspace projects, models the linked-repository graph and drives
//! dependency-ordered builds and multi-repository pull/push synchronization.

pub mod build;
pub mod config;
pub mod context;
pub mod error;
pub mod fs;
pub mod git;
pub mod index;
pub mod linked;
pub mod prompt;
pub mod sync;
pub mod workspace;

/// Re-exports of commonly used types
pub mod prelude {
    // Workspace
    pub use crate::workspace::{
        Manifest, NearestOptions, Project, ProjectKind, WorkspaceRegistry,
    };

    // Configuration
    pub use crate::config::{ConfigScope, ConfigStore, GraftConfig};
    pub use crate::fs::LinkMode;
    pub use crate::context::AppContext;

    // Linked projects
    pub use crate::linked::{LinkedProject, LinkedProjectsConfig, SyncAction};

    // Build
    pub use crate::build::{BuildOptions, BuildReport, LibraryBuilder, sort_by_dependencies};

    // Sync
    pub use crate::sync::{
        CommitData, PullOptions, PushOptions, SyncOrchestrator, SyncOutcome,
    };

    // Index
    pub use crate::index::LocalIndex;

    // Operator interaction
    pub use crate::prompt::{Answer, AssumeDefaults, Prompter, ScriptedPrompter};

    // Errors
    pub use crate::error::WorkspaceError;
}
