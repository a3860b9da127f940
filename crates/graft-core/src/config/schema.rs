//! graft.toml schema.
//!
//! Every field is optional so a project file can override only what it needs;
//! the accessor methods on [`GraftConfig`] supply the defaults.

use serde::{Deserialize, Serialize};

use crate::fs::LinkMode;

pub const DEFAULT_MAINLINE_BRANCH: &str = "master";
pub const DEFAULT_WATCH_THRESHOLD: usize = 5;
pub const DEFAULT_OUTPUT_DIR: &str = "dist";
pub const DEFAULT_LIBRARY_ROOTS: [&str; 3] = ["projects", "packages", "libs"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraftConfig {
    pub workspace: WorkspaceSection,
    pub sync: SyncSection,
    pub translate: TranslateSection,
    pub build: BuildSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSection {
    /// Namespace for the local project index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Marks the project as a core template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mainline_branch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_stage_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_branching: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_message_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lint_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_branch_change: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<LinkMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_roots: Option<Vec<String>>,
    /// Extra consumer projects (relative to the workspace) that receive links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_targets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_threshold: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_marker: Option<String>,
}

/// Source and target locale plus the service endpoint for commit translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSettings {
    pub source: String,
    pub target: String,
    pub endpoint: String,
}

pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://libretranslate.com";

impl GraftConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (key, cmd) in [
            ("build.command", &self.build.command),
            ("build.watch_command", &self.build.watch_command),
        ] {
            if let Some(cmd) = cmd
                && cmd.is_empty()
            {
                anyhow::bail!("{} must name a program", key);
            }
        }
        if self.build.watch_threshold == Some(0) {
            anyhow::bail!("build.watch_threshold must be greater than zero");
        }
        Ok(())
    }

    /// Layer a project file over this (global) config.
    ///
    /// Project-only keys (`workspace.core` and the per-library build command
    /// overrides) are never inherited from the global scope.
    pub fn overlay(&self, project: &GraftConfig) -> GraftConfig {
        GraftConfig {
            workspace: WorkspaceSection {
                organization: project
                    .workspace
                    .organization
                    .clone()
                    .or_else(|| self.workspace.organization.clone()),
                core: project.workspace.core,
                mainline_branch: project
                    .workspace
                    .mainline_branch
                    .clone()
                    .or_else(|| self.workspace.mainline_branch.clone()),
            },
            sync: SyncSection {
                auto_stage_all: project.sync.auto_stage_all.or(self.sync.auto_stage_all),
                metadata_branching: project
                    .sync
                    .metadata_branching
                    .or(self.sync.metadata_branching),
                commit_message_required: project
                    .sync
                    .commit_message_required
                    .or(self.sync.commit_message_required),
                lint_command: project
                    .sync
                    .lint_command
                    .clone()
                    .or_else(|| self.sync.lint_command.clone()),
                confirm_branch_change: project
                    .sync
                    .confirm_branch_change
                    .or(self.sync.confirm_branch_change),
            },
            translate: TranslateSection {
                source: project
                    .translate
                    .source
                    .clone()
                    .or_else(|| self.translate.source.clone()),
                target: project
                    .translate
                    .target
                    .clone()
                    .or_else(|| self.translate.target.clone()),
                endpoint: project
                    .translate
                    .endpoint
                    .clone()
                    .or_else(|| self.translate.endpoint.clone()),
            },
            build: BuildSection {
                strategy: project.build.strategy.or(self.build.strategy),
                library_roots: project
                    .build
                    .library_roots
                    .clone()
                    .or_else(|| self.build.library_roots.clone()),
                link_targets: project.build.link_targets.clone(),
                watch_threshold: project.build.watch_threshold.or(self.build.watch_threshold),
                output_dir: project
                    .build
                    .output_dir
                    .clone()
                    .or_else(|| self.build.output_dir.clone()),
                command: project.build.command.clone(),
                watch_command: project.build.watch_command.clone(),
                success_marker: project.build.success_marker.clone(),
            },
        }
    }

    pub fn is_core(&self) -> bool {
        self.workspace.core.unwrap_or(false)
    }

    pub fn mainline_branch(&self) -> &str {
        self.workspace
            .mainline_branch
            .as_deref()
            .unwrap_or(DEFAULT_MAINLINE_BRANCH)
    }

    pub fn auto_stage_all(&self) -> bool {
        self.sync.auto_stage_all.unwrap_or(true)
    }

    pub fn metadata_branching(&self) -> bool {
        self.sync.metadata_branching.unwrap_or(false)
    }

    pub fn commit_message_required(&self) -> bool {
        self.sync.commit_message_required.unwrap_or(false)
    }

    pub fn confirm_branch_change(&self) -> bool {
        self.sync.confirm_branch_change.unwrap_or(true)
    }

    /// Translation is active only when both locales are configured.
    pub fn translation(&self) -> Option<TranslationSettings> {
        match (&self.translate.source, &self.translate.target) {
            (Some(source), Some(target)) => Some(TranslationSettings {
                source: source.clone(),
                target: target.clone(),
                endpoint: self
                    .translate
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TRANSLATE_ENDPOINT.to_string()),
            }),
            _ => None,
        }
    }

    pub fn build_strategy(&self) -> LinkMode {
        self.build.strategy.unwrap_or_default()
    }

    pub fn library_roots(&self) -> Vec<String> {
        self.build.library_roots.clone().unwrap_or_else(|| {
            DEFAULT_LIBRARY_ROOTS
                .iter()
                .map(|s| s.to_string())
                .collect()
        })
    }

    pub fn link_targets(&self) -> &[String] {
        self.build.link_targets.as_deref().unwrap_or(&[])
    }

    pub fn watch_threshold(&self) -> usize {
        self.build
            .watch_threshold
            .unwrap_or(DEFAULT_WATCH_THRESHOLD)
    }

    pub fn output_dir(&self) -> &str {
        self.build
            .output_dir
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_DIR)
    }
}
