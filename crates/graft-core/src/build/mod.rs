//! Dependency-ordered library builds.

pub mod command;
mod orchestrator;
pub mod order;
pub mod selection;
pub mod watch;

pub use command::{BuildCommand, LibraryFlavor};
pub use orchestrator::{BuildOptions, BuildReport, Library, LibraryBuilder};
pub use order::sort_by_dependencies;
pub use selection::{SavedSelection, SelectionStore};
pub use watch::{WatchReport, WatchTarget, run_watch};
