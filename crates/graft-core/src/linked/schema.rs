//! `linked-projects.json` schema.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::git::RemoteFlavor;
use crate::workspace::fold_dots;

pub const LINKED_PROJECTS_FILE: &str = "linked-projects.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedProjectsConfig {
    /// Naming convention hint for linked repositories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Stop push from recursing into children.
    #[serde(default)]
    pub skip_recursive_push: bool,
    #[serde(default)]
    pub projects: Vec<LinkedProject>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedProject {
    /// Clone destination relative to the owning project.
    #[serde(default)]
    pub relative_clone_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url_ssh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url_http: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    /// Path of the actual project inside the clone, for embedded projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_relative_project_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl LinkedProject {
    pub fn new(relative_clone_path: impl Into<String>) -> Self {
        Self {
            relative_clone_path: relative_clone_path.into(),
            ..Default::default()
        }
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = Some(branch.into());
        self
    }

    pub fn with_internal_path(mut self, path: impl Into<String>) -> Self {
        self.internal_relative_project_path = Some(path.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// URL to clone from, matching the owner's remote flavour when possible.
    pub fn clone_url(&self, owner_flavor: RemoteFlavor) -> Option<&str> {
        let preferred = match owner_flavor {
            RemoteFlavor::Ssh => self.remote_url_ssh.as_deref(),
            RemoteFlavor::Http => self.remote_url_http.as_deref(),
            RemoteFlavor::Other => None,
        };
        preferred
            .or(self.remote_url.as_deref())
            .or(self.remote_url_ssh.as_deref())
            .or(self.remote_url_http.as_deref())
    }

    /// Directory the repository is cloned into.
    pub fn clone_location(&self, owner: &Path) -> PathBuf {
        fold_dots(&owner.join(&self.relative_clone_path))
    }

    /// Directory holding the project itself (inside the clone for embedded projects).
    pub fn project_location(&self, owner: &Path) -> PathBuf {
        let clone = self.clone_location(owner);
        match self.internal_relative_project_path.as_deref() {
            Some(inner) if !inner.is_empty() => clone.join(inner),
            _ => clone,
        }
    }

    pub fn branch_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.default_branch.as_deref().unwrap_or(fallback)
    }
}
