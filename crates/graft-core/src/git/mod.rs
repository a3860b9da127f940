//! Git access for projects.
//!
//! Mutations (clone, commit, push, pull, ...) run the `git` CLI so they behave
//! exactly like the operator's own git, hooks and credentials included.
//! Read-only queries go through libgit2.

mod cli;
mod exclude;
pub mod remote;
mod repo;

pub use cli::Git;
pub use exclude::ensure_git_exclude;
pub use remote::RemoteFlavor;
pub use repo::GitRepo;
