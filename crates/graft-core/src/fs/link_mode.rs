use serde::{Deserialize, Serialize};

/// How built library output reaches a dependency-install location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Symlink the install location to the build output.
    #[default]
    #[serde(rename = "link")]
    Symlink,
    /// Copy the build output into the install location.
    Copy,
}

impl LinkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkMode::Symlink => "link",
            LinkMode::Copy => "copy",
        }
    }
}
