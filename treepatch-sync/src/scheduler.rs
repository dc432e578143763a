//! Parallel execution of independent work items.
//!
//! Every item runs exactly once, on a dedicated `rayon` pool. A failing or
//! panicking item is recorded and its siblings keep going; the batch is
//! judged only after all of them have finished.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{ItemFailure, SyncError};

type Action<'a, T> = Box<dyn FnOnce() -> Result<T, SyncError> + Send + 'a>;

/// A described, self-contained unit of work.
pub struct WorkItem<'a, T> {
    description: String,
    action: Action<'a, T>,
}

impl<'a, T> WorkItem<'a, T> {
    pub fn new(
        description: impl Into<String>,
        action: impl FnOnce() -> Result<T, SyncError> + Send + 'a,
    ) -> Self {
        Self {
            description: description.into(),
            action: Box::new(action),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl<T> std::fmt::Debug for WorkItem<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkItem")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Result of one item, in submission order.
#[derive(Debug)]
pub struct ItemOutcome<T> {
    pub description: String,
    pub result: Result<T, SyncError>,
}

/// All item outcomes of one batch.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub outcomes: Vec<ItemOutcome<T>>,
}

impl<T> BatchReport<T> {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Successful `(description, value)` pairs, or [`SyncError::Batch`]
    /// listing every failure.
    pub fn into_result(self) -> Result<Vec<(String, T)>, SyncError> {
        let total = self.outcomes.len();
        let mut done = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome.result {
                Ok(value) => done.push((outcome.description, value)),
                Err(error) => failures.push(ItemFailure {
                    description: outcome.description,
                    error,
                }),
            }
        }
        if failures.is_empty() {
            Ok(done)
        } else {
            Err(SyncError::Batch { total, failures })
        }
    }
}

/// Fixed-size worker pool.
pub struct WorkScheduler {
    pool: ThreadPool,
}

impl WorkScheduler {
    /// `jobs = None` sizes the pool to the available parallelism.
    pub fn new(jobs: Option<usize>) -> Result<Self, SyncError> {
        let mut builder =
            ThreadPoolBuilder::new().thread_name(|i| format!("treepatch-worker-{i}"));
        if let Some(jobs) = jobs {
            builder = builder.num_threads(jobs.max(1));
        }
        Ok(Self {
            pool: builder.build()?,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run every item to completion and report per-item results.
    pub fn execute<'a, T: Send>(&self, items: Vec<WorkItem<'a, T>>) -> BatchReport<T> {
        let total = items.len();
        let finished = AtomicUsize::new(0);
        let outcomes = self.pool.install(|| {
            items
                .into_par_iter()
                .map(|item| {
                    let WorkItem {
                        description,
                        action,
                    } = item;
                    let result = match catch_unwind(AssertUnwindSafe(action)) {
                        Ok(result) => result,
                        Err(payload) => Err(SyncError::WorkerPanicked {
                            description: description.clone(),
                            message: panic_message(payload.as_ref()),
                        }),
                    };
                    let n = finished.fetch_add(1, Ordering::Relaxed) + 1;
                    match &result {
                        Ok(_) => tracing::info!("[{n}/{total}] {description}"),
                        Err(err) => tracing::warn!(error = %err, "[{n}/{total}] {description} failed"),
                    }
                    ItemOutcome {
                        description,
                        result,
                    }
                })
                .collect()
        });
        BatchReport { outcomes }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
