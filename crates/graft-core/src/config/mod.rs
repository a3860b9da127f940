//! Configuration for different scopes
//!
//! Supports two configuration scopes:
//! - Global: `graft.toml` in the user config directory
//! - Project: `graft.toml` at a project root, which also marks the directory
//!   as a graft-managed workspace

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

use serde::{Deserialize, Serialize};

pub use parser::{parse_graft_toml, parse_graft_toml_str, to_toml};
pub use paths::{CONFIG_FILE_NAME, config_path_for_scope, global_config_dir};
pub use schema::{BuildSection, GraftConfig, SyncSection, TranslateSection, WorkspaceSection};
pub use store::ConfigStore;

/// Configuration scope levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigScope {
    /// User-wide configuration
    Global,
    /// Configuration stored next to a project's manifest
    Project,
}
