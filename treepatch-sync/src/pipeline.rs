//! Shared entrypoints used by the CLI.
//!
//! Every function takes an explicit `home` so tests can point the settings
//! store at a `TempDir`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use treepatch_core::{RelPath, SyncConfig};

use crate::cutoff::CutoffState;
use crate::engine::{DiffEngine, RunMode, SyncPlan, SyncReport};
use crate::error::SyncError;
use crate::paths::{is_manifest, PATCH_SUFFIX};
use crate::{removed, walker};

/// Build an engine whose cutoff lives in `<home>/.treepatch/settings.json`.
pub fn engine_at(home: &Path, config: SyncConfig) -> Result<DiffEngine, SyncError> {
    let cutoff = CutoffState::at_home(home, config.cutoff_key());
    DiffEngine::from_config(config, cutoff)
}

/// Run one synchronization pass for a resolved profile.
pub fn run(home: &Path, config: SyncConfig, mode: RunMode) -> Result<SyncReport, SyncError> {
    engine_at(home, config)?.run(mode)
}

/// Compute what `run` would do, without writing anything.
pub fn plan(home: &Path, config: SyncConfig, mode: RunMode) -> Result<SyncPlan, SyncError> {
    engine_at(home, config)?.plan(mode)
}

/// Current state of a profile's patch set.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub name: String,
    pub cutoff: Option<DateTime<Utc>>,
    pub patches: usize,
    pub copies: usize,
    pub removed_files: Vec<RelPath>,
    pub pending: SyncPlan,
}

/// Summarize the patch set and the work pending since the last run.
pub fn status(home: &Path, config: SyncConfig) -> Result<StatusReport, SyncError> {
    let name = config.name.clone();
    let engine = engine_at(home, config)?;
    let pending = engine.plan(RunMode::Incremental)?;

    let patch_root = &engine.roots().patches;
    let (mut patches, mut copies) = (0, 0);
    if patch_root.is_dir() {
        for file in walker::walk(patch_root, &[])? {
            let file = file?;
            if is_manifest(&file.rel) {
                continue;
            }
            if file.rel.ends_with(PATCH_SUFFIX) {
                patches += 1;
            } else {
                copies += 1;
            }
        }
    }

    Ok(StatusReport {
        name,
        cutoff: pending.cutoff,
        patches,
        copies,
        removed_files: removed::read_manifest(patch_root)?,
        pending,
    })
}
