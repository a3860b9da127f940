//! Installing built library output into dependency-install locations.
//!
//! Both strategies stage the new entry next to the destination and rename it
//! into place, so a failed install never leaves a half-written destination.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkReport {
    pub changed: bool,
}

/// Make `link_path` a symlink to `target`.
///
/// An existing symlink already pointing at `target` is left alone. Anything
/// else at `link_path` (a real directory, a file, a broken or foreign symlink)
/// is replaced.
pub fn ensure_symlink(target: &Path, link_path: &Path) -> anyhow::Result<LinkReport> {
    require_output_dir(target)?;

    if fs::read_link(link_path).is_ok_and(|current| current == target) && link_path.exists() {
        return Ok(LinkReport { changed: false });
    }

    let staged = staging_path(link_path)?;
    create_dir_symlink(target, &staged).with_context(|| {
        format!("Failed to create symlink {} -> {}", link_path.display(), target.display())
    })?;
    swap_in(&staged, link_path)?;
    Ok(LinkReport { changed: true })
}

/// Copy the tree at `src_dir` into `dst_dir`, replacing whatever was there.
///
/// A stale symlink at `dst_dir` (left over from the link strategy) is
/// replaced, never followed.
pub fn copy_into(src_dir: &Path, dst_dir: &Path) -> anyhow::Result<LinkReport> {
    require_output_dir(src_dir)?;

    let staged = staging_path(dst_dir)?;
    if let Err(err) = copy_tree(src_dir, &staged) {
        let _ = fs::remove_dir_all(&staged);
        return Err(err);
    }
    swap_in(&staged, dst_dir)?;
    Ok(LinkReport { changed: true })
}

/// Remove a file, directory tree or symlink (without following it).
pub fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn require_output_dir(dir: &Path) -> anyhow::Result<()> {
    let meta = fs::metadata(dir)
        .with_context(|| format!("Failed to stat build output: {}", dir.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("Build output is not a directory: {}", dir.display());
    }
    Ok(())
}

/// Sibling of `dst` to build the replacement in. Parent folders are created
/// and a leftover from an interrupted run is cleared.
fn staging_path(dst: &Path) -> anyhow::Result<PathBuf> {
    let (Some(parent), Some(name)) = (dst.parent(), dst.file_name()) else {
        anyhow::bail!("Not an install location: {}", dst.display());
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let staged = parent.join(format!(".{}.graft-{}", name.to_string_lossy(), std::process::id()));
    if fs::symlink_metadata(&staged).is_ok() {
        remove_path(&staged)
            .with_context(|| format!("Failed to clear {}", staged.display()))?;
    }
    Ok(staged)
}

fn swap_in(staged: &Path, dst: &Path) -> anyhow::Result<()> {
    if fs::symlink_metadata(dst).is_ok() {
        remove_path(dst).with_context(|| format!("Failed to remove {}", dst.display()))?;
    }
    fs::rename(staged, dst)
        .with_context(|| format!("Failed to move {} into place", dst.display()))
}

/// Copy `src` to `dst`, following symlinks inside the build output (bundlers
/// emit them for assets).
fn copy_tree(src: &Path, dst: &Path) -> anyhow::Result<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let to = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&to)
                .with_context(|| format!("Failed to create {}", to.display()))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &to).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), to.display())
            })?;
        } else {
            anyhow::bail!("Unsupported entry in build output: {}", entry.path().display());
        }
    }
    Ok(())
}

#[cfg(unix)]
fn create_dir_symlink(src_dir: &Path, dst_link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src_dir, dst_link)
}

#[cfg(windows)]
fn create_dir_symlink(src_dir: &Path, dst_link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(src_dir, dst_link)
}

#[cfg(not(any(unix, windows)))]
fn create_dir_symlink(_src_dir: &Path, _dst_link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "Symlinks are not supported on this platform",
    ))
}
