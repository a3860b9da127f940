//! Reading and writing `linked-projects.json`.

use std::path::Path;

use anyhow::Context;

use crate::workspace::Project;

use super::reconcile::reconcile;
use super::schema::{LINKED_PROJECTS_FILE, LinkedProjectsConfig};

enum Loaded {
    /// File parsed; rewrite only if reconciliation changes it.
    Parsed(LinkedProjectsConfig),
    /// No file yet, but the project carries the marker: create it.
    Create,
    /// No file and no marker, or a file we could not read: leave disk alone.
    ReadOnly,
}

pub(super) fn get_config(project: &Project) -> anyhow::Result<LinkedProjectsConfig> {
    let path = project.location().join(LINKED_PROJECTS_FILE);
    let loaded = load(project, &path);

    let raw = match &loaded {
        Loaded::Parsed(config) => config.clone(),
        Loaded::Create | Loaded::ReadOnly => LinkedProjectsConfig::default(),
    };
    let origin = project.git().origin_url();
    let reconciled = reconcile(&raw, origin.as_deref(), &project.mainline_branch());

    let must_write = match &loaded {
        Loaded::Parsed(parsed) => *parsed != reconciled,
        Loaded::Create => true,
        Loaded::ReadOnly => false,
    };
    if must_write {
        write(&path, &reconciled)?;
        tracing::debug!(project = project.name(), "updated {}", LINKED_PROJECTS_FILE);
    }

    project.store_linked_config(reconciled.clone());
    Ok(reconciled)
}

/// Reconcile `config` and write it unconditionally.
pub(super) fn save_config(
    project: &Project,
    config: LinkedProjectsConfig,
) -> anyhow::Result<LinkedProjectsConfig> {
    let origin = project.git().origin_url();
    let reconciled = reconcile(&config, origin.as_deref(), &project.mainline_branch());
    write(&project.location().join(LINKED_PROJECTS_FILE), &reconciled)?;
    project.store_linked_config(reconciled.clone());
    Ok(reconciled)
}

fn load(project: &Project, path: &Path) -> Loaded {
    if !path.is_file() {
        return if project.has_marker() {
            Loaded::Create
        } else {
            Loaded::ReadOnly
        };
    }

    match std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|text| parse(&text))
    {
        Ok(config) => Loaded::Parsed(config),
        Err(err) => {
            tracing::warn!(
                project = project.name(),
                path = %path.display(),
                "ignoring unreadable {}: {:#}",
                LINKED_PROJECTS_FILE,
                err
            );
            Loaded::ReadOnly
        }
    }
}

/// Parse JSON with comments and trailing commas tolerated.
pub(super) fn parse(text: &str) -> anyhow::Result<LinkedProjectsConfig> {
    let value = jsonc_parser::parse_to_serde_value(text, &Default::default())
        .map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))?;
    match value {
        Some(value) => serde_json::from_value(value).context("Unexpected linked-projects shape"),
        None => Ok(LinkedProjectsConfig::default()),
    }
}

fn write(path: &Path, config: &LinkedProjectsConfig) -> anyhow::Result<()> {
    let mut body = serde_json::to_string_pretty(config)?;
    body.push('\n');
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write linked projects: {}", path.display()))
}
