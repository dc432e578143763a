//! # treepatch-sync
//!
//! Keeps a directory of unified-diff patch files in step with a modified
//! source tree, relative to a baseline tree.
//!
//! Call [`pipeline::run`] for a complete pass, or build a [`DiffEngine`]
//! directly to inject a custom [`Differ`] or cutoff store.

pub mod cutoff;
pub mod differ;
pub mod engine;
pub mod error;
pub mod filter;
pub mod generator;
pub mod hunk;
pub mod paths;
pub mod pipeline;
pub mod pruner;
pub mod removed;
pub mod scheduler;
pub mod walker;
pub mod writer;

pub use cutoff::CutoffState;
pub use differ::{Differ, PatchArtifact, SimilarDiffer};
pub use engine::{DiffEngine, PlannedTask, RunMode, SyncPlan, SyncReport, TaskResult};
pub use error::{ItemFailure, SyncError};
pub use filter::TaskKind;
pub use generator::{GenerateOutcome, PatchGenerator};
pub use hunk::{normalize_patch_set, strip_dest_hunk_offsets};
pub use paths::{artifact_path_to_target_path, target_to_artifact_path};
pub use removed::ManifestUpdate;
pub use scheduler::{BatchReport, WorkItem, WorkScheduler};
