//! Orphan artifact pruning.
//!
//! After a batch, any patch-set file whose target no longer exists in the
//! modified tree is deleted, then directories left empty are removed
//! bottom-up. The patch-set root itself is never removed.

use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

use treepatch_core::RelPath;

use crate::error::{io_err, SyncError};
use crate::paths::{artifact_path_to_target_path, is_manifest};
use crate::walker;
use crate::writer::remove_if_exists;

/// What a prune pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub deleted: Vec<RelPath>,
    pub removed_dirs: usize,
}

/// True when the artifact at `rel` no longer refers to a modified-tree file.
///
/// A file is kept if its implied target exists, or if its own relative path
/// exists (a verbatim copy whose name happens to end in `.patch`).
pub fn is_orphan(rel: &RelPath, patched_root: &Path) -> bool {
    if is_manifest(rel) {
        return false;
    }
    let target = artifact_path_to_target_path(rel);
    !(target.under(patched_root).is_file() || rel.under(patched_root).is_file())
}

/// Delete orphaned artifacts under `patch_root`, then empty directories.
pub fn prune(patch_root: &Path, patched_root: &Path) -> Result<PruneReport, SyncError> {
    if !patch_root.is_dir() {
        return Ok(PruneReport::default());
    }

    // Collect first so deletion never races the directory iterator.
    let mut orphans = Vec::new();
    for file in walker::walk(patch_root, &[])? {
        let file = file?;
        if is_orphan(&file.rel, patched_root) {
            orphans.push(file);
        }
    }

    let mut deleted = Vec::with_capacity(orphans.len());
    for orphan in orphans {
        if remove_if_exists(&orphan.path)? {
            tracing::info!(path = %orphan.rel, "deleted orphan artifact");
            deleted.push(orphan.rel);
        }
    }

    let removed_dirs = delete_empty_dirs(patch_root)?;
    Ok(PruneReport {
        deleted,
        removed_dirs,
    })
}

/// Remove every empty directory below `root`, deepest first.
///
/// A directory whose only contents were empty directories is removed too.
pub fn delete_empty_dirs(root: &Path) -> Result<usize, SyncError> {
    let mut removed = 0;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|source| SyncError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let mut children = std::fs::read_dir(path).map_err(|e| io_err(path, e))?;
        if children.next().is_none() {
            std::fs::remove_dir(path).map_err(|e| io_err(path, e))?;
            tracing::debug!("removed empty directory {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}
