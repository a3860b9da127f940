//! Filesystem primitives shared across features.

pub mod link_mode;
pub mod materialize;
pub mod walk;

pub use link_mode::LinkMode;
pub use materialize::{LinkReport, copy_into, ensure_symlink, remove_path};
pub use walk::{DENYLIST, DENY_PREFIXES, list_candidate_children};
