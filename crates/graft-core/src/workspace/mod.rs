//! Project identity: manifests, the `Project` handle and the registry that
//! guarantees one handle per location.

pub mod manifest;
pub mod path;
pub mod probe;
pub mod project;
pub mod registry;

pub use manifest::{MANIFEST_FILE_NAME, Manifest};
pub use path::{canonical_location, fold_dots};
pub use probe::{FsProbe, StdFs};
pub use project::{Project, ProjectKind};
pub use registry::{CorePredicate, NearestOptions, WorkspaceRegistry};
