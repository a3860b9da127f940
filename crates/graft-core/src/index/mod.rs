//! Local persistent index of every project location seen.
//!
//! One JSON file per organization under the user data directory:
//! `<data_dir>/graft/<organization>/projects.json`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::WorkspaceError;
use crate::git::remote;
use crate::workspace::{Project, WorkspaceRegistry, canonical_location};

pub const INDEX_FILE_NAME: &str = "projects.json";

/// Oldest entries are evicted beyond this many.
pub const MAX_ENTRIES: usize = 1000;

pub const DEFAULT_ORGANIZATION: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(default)]
    pub projects: Vec<IndexEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub location: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LocalIndex {
    path: PathBuf,
}

impl LocalIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_organization(data_dir: &Path, organization: &str) -> Self {
        let safe: String = organization
            .chars()
            .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
            .collect();
        Self::new(data_dir.join("graft").join(safe).join(INDEX_FILE_NAME))
    }

    /// `workspace.organization`, else the owner segment of the origin remote.
    pub fn organization_for(project: &Project) -> String {
        if let Some(org) = project.settings().workspace.organization.clone()
            && !org.trim().is_empty()
        {
            return org;
        }
        project
            .git()
            .origin_url()
            .and_then(|url| remote::organization(&url))
            .unwrap_or_else(|| DEFAULT_ORGANIZATION.to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, resetting an unreadable file to the empty default once.
    pub fn load(&self) -> anyhow::Result<IndexRecord> {
        match self.read() {
            Ok(record) => Ok(record),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "resetting unreadable index: {:#}", err);
                let corrupt = || WorkspaceError::IndexCorrupt {
                    path: self.path.clone(),
                };
                self.save(&IndexRecord::default()).map_err(|e| {
                    tracing::debug!("index reset failed: {:#}", e);
                    corrupt()
                })?;
                self.read().map_err(|e| {
                    tracing::debug!("index still unreadable: {:#}", e);
                    corrupt().into()
                })
            }
        }
    }

    /// Record `location`. Returns `false` when it was already present.
    pub fn add(&self, location: impl AsRef<Path>) -> anyhow::Result<bool> {
        let added = self.add_all([location.as_ref()])?;
        Ok(added > 0)
    }

    /// Record several locations with a single write. Returns how many were new.
    pub fn add_all<I, P>(&self, locations: I) -> anyhow::Result<usize>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut record = self.load()?;
        let mut added = 0;
        for location in locations {
            let location = canonical_location(location.as_ref());
            if record.projects.iter().any(|e| e.location == location) {
                continue;
            }
            record.projects.push(IndexEntry { location });
            added += 1;
        }
        if added == 0 {
            return Ok(0);
        }

        let overflow = record.projects.len().saturating_sub(MAX_ENTRIES);
        if overflow > 0 {
            record.projects.drain(..overflow);
            tracing::debug!(evicted = overflow, "index full, evicted oldest entries");
        }
        self.save(&record)?;
        Ok(added)
    }

    pub fn locations(&self) -> anyhow::Result<Vec<PathBuf>> {
        Ok(self
            .load()?
            .projects
            .into_iter()
            .map(|e| e.location)
            .collect())
    }

    /// Drop locations that no longer exist. Returns the removed ones.
    pub fn prune_missing(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut record = self.load()?;
        let (kept, removed): (Vec<_>, Vec<_>) = record
            .projects
            .into_iter()
            .partition(|e| e.location.exists());
        record.projects = kept;
        if !removed.is_empty() {
            self.save(&record)?;
        }
        Ok(removed.into_iter().map(|e| e.location).collect())
    }

    /// Resolve every indexed location that still exists.
    pub fn rehydrate(&self, registry: &Arc<WorkspaceRegistry>) -> anyhow::Result<Vec<Arc<Project>>> {
        Ok(self
            .locations()?
            .into_iter()
            .filter_map(|location| registry.resolve(location))
            .collect())
    }

    /// Write atomically (tmp + rename).
    fn save(&self, record: &IndexRecord) -> anyhow::Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Index path has no parent: {}", self.path.display()))?;
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create index directory: {}", dir.display()))?;

        let bytes = serde_json::to_vec_pretty(record).context("Failed to serialize index")?;
        let tmp_path = dir.join(format!("{}.{}.tmp", INDEX_FILE_NAME, std::process::id()));
        fs::write(&tmp_path, bytes)
            .with_context(|| format!("Failed to write tmp index: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            let _ = fs::remove_file(&tmp_path);
            format!("Failed to replace index: {}", self.path.display())
        })
    }

    fn read(&self) -> anyhow::Result<IndexRecord> {
        if !self.path.exists() {
            return Ok(IndexRecord::default());
        }
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read index: {}", self.path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse index: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_empty() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::new(temp.path().join("projects.json"));
        assert_eq!(index.load().unwrap(), IndexRecord::default());
        assert!(!index.path().exists());
    }

    #[test]
    fn keeps_first_position_of_duplicates() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::new(temp.path().join("projects.json"));

        assert!(index.add("/w/a").unwrap());
        assert!(index.add("/w/b").unwrap());
        assert!(!index.add("/w/a/").unwrap());

        assert_eq!(
            index.locations().unwrap(),
            vec![PathBuf::from("/w/a"), PathBuf::from("/w/b")]
        );
    }

    #[test]
    fn evicts_oldest_beyond_cap() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::new(temp.path().join("projects.json"));

        let added = index
            .add_all((0..MAX_ENTRIES + 2).map(|i| format!("/w/p{}", i)))
            .unwrap();
        assert_eq!(added, MAX_ENTRIES + 2);

        let locations = index.locations().unwrap();
        assert_eq!(locations.len(), MAX_ENTRIES);
        assert_eq!(locations[0], PathBuf::from("/w/p2"));
        assert_eq!(locations.last().unwrap(), &PathBuf::from(format!("/w/p{}", MAX_ENTRIES + 1)));
    }

    #[test]
    fn corrupt_file_is_reset() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("projects.json");
        fs::write(&path, "not json").unwrap();
        let index = LocalIndex::new(&path);

        assert!(index.add("/w/a").unwrap());
        assert_eq!(index.locations().unwrap(), vec![PathBuf::from("/w/a")]);
    }

    #[test]
    fn unrecoverable_index_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("projects.json");
        fs::create_dir_all(path.join("occupied")).unwrap();
        let index = LocalIndex::new(&path);

        let err = index.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkspaceError>(),
            Some(WorkspaceError::IndexCorrupt { .. })
        ));
    }

    #[test]
    fn prune_and_rehydrate() {
        let temp = TempDir::new().unwrap();
        let alive = temp.path().join("alive");
        fs::create_dir_all(&alive).unwrap();
        let gone = temp.path().join("gone");
        let index = LocalIndex::new(temp.path().join("idx").join("projects.json"));
        index.add_all([&alive, &gone]).unwrap();

        let registry = WorkspaceRegistry::new();
        let projects = index.rehydrate(&registry).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].location(), alive.as_path());

        assert_eq!(index.prune_missing().unwrap(), vec![gone]);
        assert_eq!(index.locations().unwrap(), vec![alive]);
    }

    #[test]
    fn organization_path_is_sanitized() {
        let index = LocalIndex::for_organization(Path::new("/data"), "acme/web");
        assert_eq!(index.path(), Path::new("/data/graft/acme_web/projects.json"));
    }
}
