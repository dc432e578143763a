//! Last-successful-sync timestamp.
//!
//! Files modified before the cutoff are assumed to need no new work. The
//! value only ever moves forward, and only after a run has fully completed.

use std::path::Path;

use chrono::{DateTime, Utc};

use treepatch_core::{FileSetting, MemorySetting, Setting};

use crate::error::SyncError;

type Timestamp = Option<DateTime<Utc>>;

/// Cutoff backed by an injected [`Setting`].
pub struct CutoffState {
    setting: Box<dyn Setting<Timestamp>>,
}

impl CutoffState {
    pub fn new(setting: Box<dyn Setting<Timestamp>>) -> Self {
        Self { setting }
    }

    /// Cutoff stored under `key` in `<home>/.treepatch/settings.json`.
    pub fn at_home(home: &Path, key: impl Into<String>) -> Self {
        Self::new(Box::new(FileSetting::<Timestamp>::at_home(home, key)))
    }

    /// In-process cutoff starting at `initial`.
    pub fn in_memory(initial: Timestamp) -> Self {
        Self::new(Box::new(MemorySetting::new(initial)))
    }

    /// `None` until the first successful run.
    pub fn get(&self) -> Result<Timestamp, SyncError> {
        Ok(self.setting.get()?)
    }

    pub fn set(&self, value: DateTime<Utc>) -> Result<(), SyncError> {
        Ok(self.setting.set(Some(value))?)
    }

    /// Move the cutoff to `to` unless it is already later. Returns the stored value.
    pub fn advance(&self, to: DateTime<Utc>) -> Result<DateTime<Utc>, SyncError> {
        let next = match self.get()? {
            Some(current) if current > to => current,
            _ => to,
        };
        self.set(next)?;
        tracing::info!(cutoff = %next.to_rfc3339(), "advanced diff cutoff");
        Ok(next)
    }
}

impl std::fmt::Debug for CutoffState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CutoffState").finish_non_exhaustive()
    }
}
