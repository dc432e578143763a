//! YAML sync profile.
//!
//! # File layout
//!
//! ```yaml
//! name: terraria
//! base_dir: src/decompiled
//! patched_dir: src/Terraria
//! patch_dir: patches/Terraria
//! algorithm: patience
//! jobs: 8
//! ```
//!
//! Relative directories are resolved against the directory that holds the
//! config file, so a profile can be checked in next to the trees it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::types::{DiffAlgorithm, TreeRoots};

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "treepatch.yaml";

/// Suffixes whose files are diffed rather than ignored when a baseline
/// counterpart exists.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".cs",
    ".csproj",
    ".ico",
    ".resx",
    ".png",
    "App.config",
    ".json",
];

/// Directory names skipped at any depth when walking a tree.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[".git", ".vs", ".idea", "bin", "obj"];

/// A single sync profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Profile name; keys the persisted cutoff.
    #[serde(default = "default_name")]
    pub name: String,
    pub base_dir: PathBuf,
    pub patched_dir: PathBuf,
    pub patch_dir: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
    #[serde(default)]
    pub algorithm: DiffAlgorithm,
    #[serde(default = "default_context_radius")]
    pub context_radius: usize,
    /// Worker threads; `None` uses available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Rewrite destination hunk offsets to `_` before writing patches.
    #[serde(default)]
    pub normalize_hunk_offsets: bool,
}

fn default_name() -> String {
    "default".to_string()
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_excluded_dirs() -> Vec<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect()
}

fn default_context_radius() -> usize {
    3
}

impl SyncConfig {
    /// A profile with default tuning for the given roots.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        patched_dir: impl Into<PathBuf>,
        patch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: default_name(),
            base_dir: base_dir.into(),
            patched_dir: patched_dir.into(),
            patch_dir: patch_dir.into(),
            extensions: default_extensions(),
            excluded_dirs: default_excluded_dirs(),
            algorithm: DiffAlgorithm::default(),
            context_radius: default_context_radius(),
            jobs: None,
            normalize_hunk_offsets: false,
        }
    }

    /// Settings key under which this profile's cutoff is persisted.
    pub fn cutoff_key(&self) -> String {
        format!("{}.diff_cutoff", self.name)
    }

    /// Tree roots with relative directories resolved against `origin`.
    pub fn roots(&self, origin: &Path) -> TreeRoots {
        TreeRoots {
            base: resolve(origin, &self.base_dir),
            patched: resolve(origin, &self.patched_dir),
            patches: resolve(origin, &self.patch_dir),
        }
    }

    /// Rewrite the three directories as absolute paths under `origin`.
    pub fn resolved(mut self, origin: &Path) -> Self {
        let roots = self.roots(origin);
        self.base_dir = roots.base;
        self.patched_dir = roots.patched;
        self.patch_dir = roots.patches;
        self
    }

    /// Reject layouts the engine cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidConfig("name must not be empty".into()));
        }
        if self.base_dir == self.patched_dir {
            return Err(CoreError::InvalidConfig(
                "base_dir and patched_dir must differ".into(),
            ));
        }
        for (field, tree) in [("base_dir", &self.base_dir), ("patched_dir", &self.patched_dir)] {
            if nested(&self.patch_dir, tree) {
                return Err(CoreError::InvalidConfig(format!(
                    "patch_dir must not be, contain, or sit inside {field}"
                )));
            }
        }
        if self.jobs == Some(0) {
            return Err(CoreError::InvalidConfig("jobs must be at least 1".into()));
        }
        if self.extensions.iter().any(|e| e.is_empty()) {
            return Err(CoreError::InvalidConfig(
                "extensions must not contain empty entries".into(),
            ));
        }
        Ok(())
    }
}

/// Component-wise: either path is the other or lies beneath it.
fn nested(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn resolve(origin: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        origin.join(dir)
    }
}

/// Load and validate a profile. Relative directories stay relative; call
/// [`SyncConfig::resolved`] with [`config_origin`] to anchor them.
///
/// Returns `CoreError::ConfigNotFound` if absent,
/// `CoreError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<SyncConfig, CoreError> {
    if !path.exists() {
        return Err(CoreError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config: SyncConfig = serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load a profile and resolve its directories against the file's location.
pub fn load_resolved_at(path: &Path) -> Result<SyncConfig, CoreError> {
    let config = load_at(path)?;
    Ok(config.resolved(&config_origin(path)))
}

/// Directory relative config paths are anchored to.
pub fn config_origin(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Atomically save a profile.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `rename`.
pub fn save_at(path: &Path, config: &SyncConfig) -> Result<(), CoreError> {
    config.validate()?;
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
