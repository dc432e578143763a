//! Error types for treepatch-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use treepatch_core::{CoreError, RelPath};

/// All errors that can arise from a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from config or settings persistence.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed below `root`.
    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A file name that cannot be carried as a `/`-separated relative path.
    #[error("file name is not valid UTF-8: {path:?}; rename it to continue")]
    NonUtf8Path { path: PathBuf },

    /// Two modified-tree files would write the same patch-set artifact.
    #[error("'{copy}' in the modified tree collides with the patch for '{target}'; rename one of them")]
    ArtifactClash { copy: RelPath, target: RelPath },

    /// A tree root is missing or not a directory.
    #[error("tree root not found: {path}")]
    RootNotFound { path: PathBuf },

    /// The file cannot be represented as unified-diff text.
    #[error("not a text file: {path}")]
    NotText { path: PathBuf },

    /// The differ rejected its input.
    #[error("differ failed on {path}: {reason}")]
    Differ { path: PathBuf, reason: String },

    /// A work item panicked; siblings kept running.
    #[error("work item '{description}' panicked: {message}")]
    WorkerPanicked {
        description: String,
        message: String,
    },

    /// One or more work items in a batch failed.
    #[error("{} of {total} work item(s) failed: {}", failures.len(), summarize(failures))]
    Batch {
        total: usize,
        failures: Vec<ItemFailure>,
    },

    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A failed work item, attributable to the path in its description.
#[derive(Debug)]
pub struct ItemFailure {
    pub description: String,
    pub error: SyncError,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description, self.error)
    }
}

fn summarize(failures: &[ItemFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
