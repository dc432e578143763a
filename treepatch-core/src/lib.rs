//! treepatch core library: domain types, configuration, persisted settings, errors.
//!
//! Public API surface:
//! - [`types`]: relative paths, tree roots, diff algorithm selection
//! - [`config`]: YAML sync profile load / save / validate
//! - [`settings`]: key/value settings store and the [`settings::Setting`] capability
//! - [`error`]: [`CoreError`]

pub mod config;
pub mod error;
pub mod settings;
pub mod types;

pub use config::SyncConfig;
pub use error::CoreError;
pub use settings::{FileSetting, MemorySetting, Setting};
pub use types::{DiffAlgorithm, RelPath, TreeRoots};
