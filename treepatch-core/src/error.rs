//! Error types for treepatch-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration and settings operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Settings document could not be encoded or decoded.
    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.treepatch/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}; run `treepatch init` first")]
    ConfigNotFound { path: PathBuf },

    /// The config parsed but describes an unusable layout.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
