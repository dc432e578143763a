//! Baseline files that no longer exist in the modified tree.
//!
//! The set is persisted as `removed_files.list` in the patch set, one
//! relative path per line in baseline discovery order. The file is absent
//! whenever the set is empty.

use std::path::Path;

use serde::Serialize;

use treepatch_core::RelPath;

use crate::error::{io_err, SyncError};
use crate::paths::REMOVED_FILES_LIST;
use crate::walker;
use crate::writer::{remove_if_exists, write_if_changed, WriteOutcome};

/// What happened to the manifest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestUpdate {
    Written,
    Unchanged,
    Deleted,
    Absent,
}

/// Relative paths present under `base_root` but not under `patched_root`.
pub fn removed_files(
    base_root: &Path,
    patched_root: &Path,
    excluded_dirs: &[String],
) -> Result<Vec<RelPath>, SyncError> {
    let mut removed = Vec::new();
    for file in walker::walk(base_root, excluded_dirs)? {
        let file = file?;
        if !file.rel.under(patched_root).is_file() {
            removed.push(file.rel);
        }
    }
    Ok(removed)
}

/// Persist `removed` into `patch_root`, or delete the manifest when empty.
pub fn write_manifest(patch_root: &Path, removed: &[RelPath]) -> Result<ManifestUpdate, SyncError> {
    let path = patch_root.join(REMOVED_FILES_LIST);
    if removed.is_empty() {
        return Ok(if remove_if_exists(&path)? {
            tracing::info!("deleted {REMOVED_FILES_LIST}");
            ManifestUpdate::Deleted
        } else {
            ManifestUpdate::Absent
        });
    }

    let mut content = String::new();
    for rel in removed {
        content.push_str(rel.as_str());
        content.push('\n');
    }
    Ok(match write_if_changed(&path, content.as_bytes())? {
        WriteOutcome::Written => {
            tracing::info!(count = removed.len(), "wrote {REMOVED_FILES_LIST}");
            ManifestUpdate::Written
        }
        WriteOutcome::Unchanged => ManifestUpdate::Unchanged,
    })
}

/// Read the manifest back; empty when the file does not exist.
pub fn read_manifest(patch_root: &Path) -> Result<Vec<RelPath>, SyncError> {
    let path = patch_root.join(REMOVED_FILES_LIST);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(&path, err)),
    };
    Ok(content
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(RelPath::from)
        .collect())
}

/// Recompute and persist the manifest in one step.
pub fn update(
    base_root: &Path,
    patched_root: &Path,
    patch_root: &Path,
    excluded_dirs: &[String],
) -> Result<(Vec<RelPath>, ManifestUpdate), SyncError> {
    let removed = removed_files(base_root, patched_root, excluded_dirs)?;
    let manifest = write_manifest(patch_root, &removed)?;
    Ok((removed, manifest))
}
