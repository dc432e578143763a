//! One synchronization run over a baseline tree, a modified tree and a patch set.
//!
//! Run order:
//! 1. walk the modified tree, filter by cutoff and allowlist, classify
//! 2. execute all copy/diff items in parallel
//! 3. prune orphaned artifacts and empty directories
//! 4. recompute the removed-file manifest
//! 5. advance the cutoff
//!
//! Steps 3–5 happen only when every item in step 2 succeeded, so a failed
//! run leaves the cutoff where it was and everything is reconsidered next time.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use treepatch_core::{RelPath, SyncConfig, TreeRoots};

use crate::cutoff::CutoffState;
use crate::differ::{Differ, SimilarDiffer};
use crate::error::{io_err, SyncError};
use crate::filter::{is_diffable, ChangeFilter, Classification, TaskKind};
use crate::generator::{GenerateOutcome, PatchGenerator};
use crate::paths::PATCH_SUFFIX;
use crate::pruner::{self, PruneReport};
use crate::removed::{self, ManifestUpdate};
use crate::scheduler::{WorkItem, WorkScheduler};
use crate::walker;

/// Whether the persisted cutoff is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Incremental,
    /// Reconsider every file regardless of the cutoff.
    Full,
}

/// A file selected for work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTask {
    pub rel: RelPath,
    pub kind: TaskKind,
}

impl PlannedTask {
    pub fn description(&self) -> String {
        self.kind.describe(&self.rel)
    }
}

/// Side-effect-free view of what a run would do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub cutoff: Option<DateTime<Utc>>,
    pub tasks: Vec<PlannedTask>,
    /// Files older than the cutoff.
    pub skipped: usize,
    /// Files with a baseline counterpart that are not on the allowlist.
    pub ignored: usize,
}

impl SyncPlan {
    pub fn count(&self, kind: TaskKind) -> usize {
        self.tasks.iter().filter(|t| t.kind == kind).count()
    }
}

/// Per-path result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    pub rel: RelPath,
    pub kind: TaskKind,
    pub outcome: GenerateOutcome,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub previous_cutoff: Option<DateTime<Utc>>,
    pub cutoff: DateTime<Utc>,
    pub results: Vec<TaskResult>,
    pub skipped: usize,
    pub ignored: usize,
    pub pruned: PruneReport,
    pub removed_files: Vec<RelPath>,
    pub manifest: ManifestUpdate,
}

impl SyncReport {
    /// Paths whose artifacts were created, replaced or deleted by generation.
    pub fn touched(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| r.outcome.touched())
    }

    pub fn count(&self, outcome: GenerateOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// Patch-set synchronization engine for one profile.
pub struct DiffEngine {
    config: SyncConfig,
    roots: TreeRoots,
    differ: Box<dyn Differ>,
    cutoff: CutoffState,
    scheduler: WorkScheduler,
}

impl DiffEngine {
    /// Engine using the `similar`-backed differ. `config` directories must
    /// already be resolved.
    pub fn from_config(config: SyncConfig, cutoff: CutoffState) -> Result<Self, SyncError> {
        let differ = SimilarDiffer::new(config.context_radius);
        Self::new(config, Box::new(differ), cutoff)
    }

    pub fn new(
        config: SyncConfig,
        differ: Box<dyn Differ>,
        cutoff: CutoffState,
    ) -> Result<Self, SyncError> {
        config.validate()?;
        let roots = TreeRoots {
            base: config.base_dir.clone(),
            patched: config.patched_dir.clone(),
            patches: config.patch_dir.clone(),
        };
        let scheduler = WorkScheduler::new(config.jobs)?;
        Ok(Self {
            config,
            roots,
            differ,
            cutoff,
            scheduler,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn roots(&self) -> &TreeRoots {
        &self.roots
    }

    pub fn cutoff(&self) -> &CutoffState {
        &self.cutoff
    }

    /// Classify every modified-tree file without touching the patch set.
    pub fn plan(&self, mode: RunMode) -> Result<SyncPlan, SyncError> {
        ensure_root(&self.roots.base)?;
        let cutoff = match mode {
            RunMode::Incremental => self.cutoff.get()?,
            RunMode::Full => None,
        };
        let filter = ChangeFilter::new(&self.roots, &self.config.extensions, cutoff);

        let mut plan = SyncPlan {
            cutoff,
            tasks: Vec::new(),
            skipped: 0,
            ignored: 0,
        };
        let mut seen = BTreeSet::new();
        for file in walker::walk(&self.roots.patched, &self.config.excluded_dirs)? {
            let file = file?;
            seen.insert(file.rel.clone());
            match filter.classify(&file.path, &file.rel)? {
                Classification::Task(kind) => plan.tasks.push(PlannedTask {
                    rel: file.rel,
                    kind,
                }),
                Classification::Unchanged => {
                    tracing::debug!(path = %file.rel, "unchanged since cutoff");
                    plan.skipped += 1;
                }
                Classification::NotDiffable => plan.ignored += 1,
            }
        }
        self.check_artifact_clashes(&seen)?;
        Ok(plan)
    }

    /// A modified-tree file named `<rel>.patch` is stored verbatim at the same
    /// place the diff of `<rel>` is written. Checked over the whole tree, not
    /// just this run's tasks, since either side may be skipped by the cutoff.
    fn check_artifact_clashes(&self, seen: &BTreeSet<RelPath>) -> Result<(), SyncError> {
        for copy in seen {
            let Some(target) = copy.strip_suffix(PATCH_SUFFIX) else {
                continue;
            };
            if seen.contains(&target)
                && self.roots.base_file(&target).is_file()
                && is_diffable(&target, &self.config.extensions)
            {
                return Err(SyncError::ArtifactClash {
                    copy: copy.clone(),
                    target,
                });
            }
        }
        Ok(())
    }

    /// Run a full synchronization pass.
    pub fn run(&self, mode: RunMode) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        let plan = self.plan(mode)?;
        std::fs::create_dir_all(&self.roots.patches)
            .map_err(|e| io_err(&self.roots.patches, e))?;
        tracing::info!(
            tasks = plan.tasks.len(),
            skipped = plan.skipped,
            threads = self.scheduler.threads(),
            "generating patches"
        );

        let generator = PatchGenerator::new(&self.roots, self.differ.as_ref(), self.config.algorithm)
            .normalize_hunk_offsets(self.config.normalize_hunk_offsets);
        let generator = &generator;
        let items: Vec<WorkItem<'_, TaskResult>> = plan
            .tasks
            .iter()
            .map(|task| {
                WorkItem::new(task.description(), move || {
                    let outcome = match task.kind {
                        TaskKind::Copy => generator.copy(&task.rel)?,
                        TaskKind::Diff => generator.diff(&task.rel)?,
                    };
                    Ok(TaskResult {
                        rel: task.rel.clone(),
                        kind: task.kind,
                        outcome,
                    })
                })
            })
            .collect();
        let results: Vec<TaskResult> = self
            .scheduler
            .execute(items)
            .into_result()?
            .into_iter()
            .map(|(_, result)| result)
            .collect();

        tracing::info!("deleting unnecessary patches");
        let pruned = pruner::prune(&self.roots.patches, &self.roots.patched)?;

        tracing::info!("noting removed files");
        let (removed_files, manifest) = removed::update(
            &self.roots.base,
            &self.roots.patched,
            &self.roots.patches,
            &self.config.excluded_dirs,
        )?;

        let previous_cutoff = self.cutoff.get()?;
        let cutoff = self.cutoff.advance(started_at)?;

        Ok(SyncReport {
            started_at,
            previous_cutoff,
            cutoff,
            results,
            skipped: plan.skipped,
            ignored: plan.ignored,
            pruned,
            removed_files,
            manifest,
        })
    }
}

fn ensure_root(path: &std::path::Path) -> Result<(), SyncError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(SyncError::RootNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = RelPath::from(rel).under(root);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn engine(tmp: &TempDir) -> DiffEngine {
        let mut config = SyncConfig::new(
            tmp.path().join("base"),
            tmp.path().join("src"),
            tmp.path().join("patches"),
        );
        config.jobs = Some(2);
        fs::create_dir_all(&config.base_dir).unwrap();
        fs::create_dir_all(&config.patched_dir).unwrap();
        DiffEngine::from_config(config, CutoffState::in_memory(None)).unwrap()
    }

    #[test]
    fn plan_classifies_without_side_effects() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        write(&engine.roots().base, "a.cs", "a\n");
        write(&engine.roots().base, "lib.dll", "bin");
        write(&engine.roots().patched, "a.cs", "a2\n");
        write(&engine.roots().patched, "lib.dll", "bin2");
        write(&engine.roots().patched, "new.txt", "n");

        let plan = engine.plan(RunMode::Incremental).unwrap();
        assert_eq!(plan.count(TaskKind::Diff), 1);
        assert_eq!(plan.count(TaskKind::Copy), 1);
        assert_eq!(plan.ignored, 1);
        assert_eq!(plan.skipped, 0);
        assert!(!engine.roots().patches.exists());
    }

    #[test]
    fn run_advances_cutoff_and_second_run_has_no_work() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        write(&engine.roots().base, "a.cs", "a\n");
        write(&engine.roots().patched, "a.cs", "b\n");

        let report = engine.run(RunMode::Incremental).unwrap();
        assert_eq!(report.count(GenerateOutcome::PatchWritten), 1);
        assert_eq!(report.previous_cutoff, None);
        assert_eq!(engine.cutoff().get().unwrap(), Some(report.started_at));

        let plan = engine.plan(RunMode::Incremental).unwrap();
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.skipped, 1);

        let full = engine.plan(RunMode::Full).unwrap();
        assert_eq!(full.tasks.len(), 1);
    }

    #[test]
    fn new_file_named_like_a_patch_of_a_diffed_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        write(&engine.roots().base, "a.cs", "a\n");
        write(&engine.roots().patched, "a.cs", "b\n");
        write(&engine.roots().patched, "a.cs.patch", "verbatim\n");

        let err = engine.plan(RunMode::Incremental).unwrap_err();
        match &err {
            SyncError::ArtifactClash { copy, target } => {
                assert_eq!(copy.as_str(), "a.cs.patch");
                assert_eq!(target.as_str(), "a.cs");
            }
            other => panic!("expected clash, got {other:?}"),
        }
        assert!(engine.run(RunMode::Full).is_err());
        assert!(!engine.roots().patches.join("a.cs.patch").exists());
        assert_eq!(engine.cutoff().get().unwrap(), None);
    }

    #[test]
    fn patch_named_file_without_diffed_counterpart_is_copied() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        // `b.cs` is new, so it is copied to `b.cs`, not diffed to `b.cs.patch`.
        write(&engine.roots().patched, "b.cs", "b\n");
        write(&engine.roots().patched, "b.cs.patch", "verbatim\n");

        let report = engine.run(RunMode::Incremental).unwrap();
        assert_eq!(report.count(GenerateOutcome::Copied), 2);
        assert_eq!(
            fs::read_to_string(engine.roots().patches.join("b.cs.patch")).unwrap(),
            "verbatim\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_file_name_fails_the_run_naming_the_file() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        write(&engine.roots().patched, "ok.cs", "ok\n");
        let bad = engine
            .roots()
            .patched
            .join(OsStr::from_bytes(b"bad\xff.txt"));
        if fs::write(&bad, "x").is_err() {
            return;
        }

        for mode in [RunMode::Incremental, RunMode::Full] {
            match engine.run(mode) {
                Err(SyncError::NonUtf8Path { path }) => assert_eq!(path, bad),
                other => panic!("expected non-UTF-8 error, got {other:?}"),
            }
        }
        assert_eq!(engine.cutoff().get().unwrap(), None);

        fs::rename(&bad, engine.roots().patched.join("renamed.txt")).unwrap();
        let report = engine.run(RunMode::Incremental).unwrap();
        assert_eq!(report.count(GenerateOutcome::Copied), 2);
        assert!(engine.cutoff().get().unwrap().is_some());
    }

    #[test]
    fn missing_baseline_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        fs::remove_dir_all(&engine.roots().base).unwrap();
        let err = engine.run(RunMode::Incremental).unwrap_err();
        assert!(matches!(err, SyncError::RootNotFound { .. }));
        assert_eq!(engine.cutoff().get().unwrap(), None);
    }
}
