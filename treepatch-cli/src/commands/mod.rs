pub mod diff;
pub mod init;
pub mod normalize;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use treepatch_core::{config, settings, SyncConfig};

pub fn home_dir() -> Result<PathBuf> {
    Ok(settings::home_dir()?)
}

/// Load a profile with its directories anchored at the config file.
pub fn load_profile(path: &Path) -> Result<SyncConfig> {
    config::load_resolved_at(path)
        .with_context(|| format!("failed to load profile '{}'", path.display()))
}

/// Human age of the last successful run, e.g. `5m ago`.
pub fn format_age(at: Option<DateTime<Utc>>) -> String {
    let Some(at) = at else {
        return "never".to_string();
    };
    let secs = (Utc::now() - at).num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
