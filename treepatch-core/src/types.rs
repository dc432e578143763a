//! Domain types shared by the sync engine and the CLI.
//!
//! Relative paths are always `/`-separated strings so that manifests and log
//! lines read the same on every platform.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RelPath
// ---------------------------------------------------------------------------

/// A path relative to one of the tree roots, `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelPath(String);

impl RelPath {
    /// Like [`RelPath::from_path`], but `None` when a component is not valid
    /// UTF-8 and so could not be resolved back to the same file.
    pub fn try_from_path(path: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::ParentDir => parts.push(".."),
                _ => {}
            }
        }
        Some(Self(parts.join("/")))
    }

    /// Build a `RelPath` from a filesystem path that is already relative.
    ///
    /// `.` components are dropped; separators are normalised to `/`.
    /// Non-UTF-8 components are converted lossily.
    pub fn from_path(path: &Path) -> Self {
        let parts: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect();
        Self(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve against a root directory.
    pub fn under(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for part in self.0.split('/').filter(|p| !p.is_empty()) {
            out.push(part);
        }
        out
    }

    /// Append a literal suffix to the final component (`a/b.cs` → `a/b.cs.patch`).
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix))
    }

    /// Strip a literal suffix from the final component, if present.
    pub fn strip_suffix(&self, suffix: &str) -> Option<Self> {
        self.0
            .strip_suffix(suffix)
            .filter(|s| !s.is_empty() && !s.ends_with('/'))
            .map(|s| Self(s.to_string()))
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RelPath {
    fn from(s: &str) -> Self {
        Self::from_path(Path::new(s))
    }
}

impl From<String> for RelPath {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

// ---------------------------------------------------------------------------
// TreeRoots
// ---------------------------------------------------------------------------

/// The three directories one synchronization run works over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRoots {
    /// Read-only baseline tree.
    pub base: PathBuf,
    /// Read-only modified tree.
    pub patched: PathBuf,
    /// Read-write patch set.
    pub patches: PathBuf,
}

impl TreeRoots {
    pub fn base_file(&self, rel: &RelPath) -> PathBuf {
        rel.under(&self.base)
    }

    pub fn patched_file(&self, rel: &RelPath) -> PathBuf {
        rel.under(&self.patched)
    }

    /// Location of a verbatim copy inside the patch set.
    pub fn copy_file(&self, rel: &RelPath) -> PathBuf {
        rel.under(&self.patches)
    }
}

// ---------------------------------------------------------------------------
// DiffAlgorithm
// ---------------------------------------------------------------------------

/// Line-matching strategy handed to the differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

impl fmt::Display for DiffAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffAlgorithm::Myers => write!(f, "myers"),
            DiffAlgorithm::Patience => write!(f, "patience"),
            DiffAlgorithm::Lcs => write!(f, "lcs"),
        }
    }
}

impl std::str::FromStr for DiffAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "myers" => Ok(Self::Myers),
            "patience" => Ok(Self::Patience),
            "lcs" => Ok(Self::Lcs),
            other => Err(format!(
                "unknown diff algorithm '{other}'; expected: myers, patience, lcs"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
