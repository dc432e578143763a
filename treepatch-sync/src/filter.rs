//! Diffability allowlist and incremental (cutoff) filtering.
//!
//! Classification of a modified-tree file:
//! 1. modified before the cutoff → skipped, no work at all
//! 2. no baseline counterpart → `Copy` (regardless of extension)
//! 3. baseline counterpart and diffable suffix → `Diff`
//! 4. otherwise → ignored

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use treepatch_core::{RelPath, TreeRoots};

use crate::error::{io_err, SyncError};

/// What a run should do with one modified-tree file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Store the whole file verbatim; the baseline has no counterpart.
    Copy,
    /// Diff against the baseline counterpart.
    Diff,
}

impl TaskKind {
    pub fn describe(self, rel: &RelPath) -> String {
        match self {
            TaskKind::Copy => format!("Copying: {rel}"),
            TaskKind::Diff => format!("Diffing: {rel}"),
        }
    }
}

/// Result of classifying a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Task(TaskKind),
    /// Older than the cutoff.
    Unchanged,
    /// Has a baseline counterpart but is not on the allowlist.
    NotDiffable,
}

/// True when `rel` ends with one of the allowlisted suffixes.
///
/// Suffixes are matched literally, so both `.cs` and exact file names such as
/// `App.config` work.
pub fn is_diffable(rel: &RelPath, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| rel.ends_with(ext))
}

/// Last-modified time of `path` as a UTC timestamp.
pub fn modified_at(path: &Path) -> Result<DateTime<Utc>, SyncError> {
    let meta = std::fs::metadata(path).map_err(|e| io_err(path, e))?;
    let mtime = meta.modified().map_err(|e| io_err(path, e))?;
    Ok(DateTime::<Utc>::from(mtime))
}

/// Files modified at or after the cutoff qualify; no cutoff means everything does.
pub fn passes_cutoff(modified: DateTime<Utc>, cutoff: Option<DateTime<Utc>>) -> bool {
    match cutoff {
        Some(cutoff) => modified >= cutoff,
        None => true,
    }
}

/// Incremental filter bound to one run's roots, allowlist and cutoff.
#[derive(Debug, Clone)]
pub struct ChangeFilter<'a> {
    roots: &'a TreeRoots,
    extensions: &'a [String],
    cutoff: Option<DateTime<Utc>>,
}

impl<'a> ChangeFilter<'a> {
    pub fn new(
        roots: &'a TreeRoots,
        extensions: &'a [String],
        cutoff: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            roots,
            extensions,
            cutoff,
        }
    }

    /// Classify the modified-tree file at `path` (relative path `rel`).
    pub fn classify(&self, path: &Path, rel: &RelPath) -> Result<Classification, SyncError> {
        if self.cutoff.is_some() && !passes_cutoff(modified_at(path)?, self.cutoff) {
            return Ok(Classification::Unchanged);
        }
        if !self.roots.base_file(rel).is_file() {
            return Ok(Classification::Task(TaskKind::Copy));
        }
        if is_diffable(rel, self.extensions) {
            return Ok(Classification::Task(TaskKind::Diff));
        }
        Ok(Classification::NotDiffable)
    }
}
