//! Location canonicalization.

use std::path::{Component, Path, PathBuf};

/// Folder name that always resolves to its parent project.
pub const BUILD_OUTPUT_DIR: &str = "dist";

/// Canonical form of a project location.
///
/// Relative paths are made absolute against the current directory, `.` and
/// `..` are folded lexically (symlinks are not followed, so a path is keyed
/// the way the operator wrote it) and a trailing `dist` segment is replaced by
/// its parent.
pub fn canonical_location(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let normalized = fold_dots(&absolute);
    if normalized.file_name().is_some_and(|n| n == BUILD_OUTPUT_DIR)
        && let Some(parent) = normalized.parent()
    {
        return parent.to_path_buf();
    }
    normalized
}

/// Fold `.` and `..` segments without touching the filesystem.
pub fn fold_dots(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_dots_and_trailing_separators() {
        assert_eq!(
            canonical_location(Path::new("/work/a/./b/../c/")),
            PathBuf::from("/work/a/c")
        );
    }

    #[test]
    fn dist_resolves_to_parent() {
        assert_eq!(
            canonical_location(Path::new("/work/lib/dist")),
            PathBuf::from("/work/lib")
        );
        assert_eq!(
            canonical_location(Path::new("/work/lib/dist/")),
            PathBuf::from("/work/lib")
        );
    }

    #[test]
    fn fold_dots_keeps_build_output_segment() {
        assert_eq!(fold_dots(Path::new("/ws/a/../b/./dist")), PathBuf::from("/ws/b/dist"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        assert!(canonical_location(Path::new("some/where")).is_absolute());
    }
}
