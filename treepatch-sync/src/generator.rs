//! Per-path patch generation.
//!
//! For one relative path the generator leaves the patch set in exactly one of
//! these states:
//! - verbatim copy at `<rel>` (no baseline counterpart, or a binary change)
//! - unified diff at `<rel>.patch` (text change against the baseline)
//! - nothing (identical to the baseline)
//!
//! Side effects never leave the patch-set root.

use serde::Serialize;

use treepatch_core::{DiffAlgorithm, RelPath, TreeRoots};

use crate::differ::Differ;
use crate::error::SyncError;
use crate::hunk::strip_dest_hunk_offsets;
use crate::paths::target_to_artifact_path;
use crate::writer::{copy_if_changed, remove_if_exists, write_if_changed, WriteOutcome};

/// What `generate` did for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateOutcome {
    /// New file stored verbatim.
    Copied,
    /// Changed file that cannot be diffed as text, stored verbatim.
    CopiedBinary,
    /// Patch text written or replaced.
    PatchWritten,
    /// Existing artifact already held the right bytes.
    Unchanged,
    /// Identical to baseline; a stale artifact was deleted.
    PatchRemoved,
    /// Identical to baseline; nothing was on disk.
    Clean,
}

impl GenerateOutcome {
    /// True when the patch set was modified.
    pub fn touched(self) -> bool {
        matches!(
            self,
            GenerateOutcome::Copied
                | GenerateOutcome::CopiedBinary
                | GenerateOutcome::PatchWritten
                | GenerateOutcome::PatchRemoved
        )
    }
}

/// Writes and deletes artifacts for individual relative paths.
pub struct PatchGenerator<'a> {
    roots: &'a TreeRoots,
    differ: &'a dyn Differ,
    algorithm: DiffAlgorithm,
    normalize_hunk_offsets: bool,
}

impl<'a> PatchGenerator<'a> {
    pub fn new(roots: &'a TreeRoots, differ: &'a dyn Differ, algorithm: DiffAlgorithm) -> Self {
        Self {
            roots,
            differ,
            algorithm,
            normalize_hunk_offsets: false,
        }
    }

    /// Post-process patch text with [`strip_dest_hunk_offsets`] before writing.
    pub fn normalize_hunk_offsets(mut self, enabled: bool) -> Self {
        self.normalize_hunk_offsets = enabled;
        self
    }

    /// Copy when the baseline lacks `rel`, diff otherwise.
    pub fn generate(&self, rel: &RelPath) -> Result<GenerateOutcome, SyncError> {
        if self.roots.base_file(rel).is_file() {
            self.diff(rel)
        } else {
            self.copy(rel)
        }
    }

    /// Store the modified file verbatim at `<rel>` in the patch set.
    pub fn copy(&self, rel: &RelPath) -> Result<GenerateOutcome, SyncError> {
        let src = self.roots.patched_file(rel);
        let dst = self.roots.copy_file(rel);
        Ok(match copy_if_changed(&src, &dst)? {
            WriteOutcome::Written => GenerateOutcome::Copied,
            WriteOutcome::Unchanged => GenerateOutcome::Unchanged,
        })
    }

    /// Diff against the baseline and write, replace or delete `<rel>.patch`.
    pub fn diff(&self, rel: &RelPath) -> Result<GenerateOutcome, SyncError> {
        let base = self.roots.base_file(rel);
        let patched = self.roots.patched_file(rel);
        let patch_path = target_to_artifact_path(rel).under(&self.roots.patches);
        let copy_path = self.roots.copy_file(rel);

        let artifact = match self.differ.diff(self.algorithm, &base, &patched, rel) {
            Ok(artifact) => artifact,
            Err(SyncError::NotText { .. }) => {
                remove_if_exists(&patch_path)?;
                return Ok(match copy_if_changed(&patched, &copy_path)? {
                    WriteOutcome::Written => GenerateOutcome::CopiedBinary,
                    WriteOutcome::Unchanged => GenerateOutcome::Unchanged,
                });
            }
            Err(err) => return Err(err),
        };

        // A verbatim copy is stale once the baseline has this path.
        let removed_copy = remove_if_exists(&copy_path)?;

        if artifact.is_empty() {
            let removed_patch = remove_if_exists(&patch_path)?;
            return Ok(if removed_patch || removed_copy {
                GenerateOutcome::PatchRemoved
            } else {
                GenerateOutcome::Clean
            });
        }

        let mut text = artifact.render(true);
        if self.normalize_hunk_offsets {
            text = strip_dest_hunk_offsets(&text);
        }
        Ok(match write_if_changed(&patch_path, text.as_bytes())? {
            WriteOutcome::Written => GenerateOutcome::PatchWritten,
            WriteOutcome::Unchanged if removed_copy => GenerateOutcome::PatchWritten,
            WriteOutcome::Unchanged => GenerateOutcome::Unchanged,
        })
    }
}
