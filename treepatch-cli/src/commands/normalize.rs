//! `treepatch normalize`: strip destination offsets from every hunk header.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use treepatch_core::config::DEFAULT_CONFIG_FILE;
use treepatch_sync::normalize_patch_set;

use super::load_profile;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Profile to operate on.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl NormalizeArgs {
    pub fn run(self) -> Result<()> {
        let profile = load_profile(&self.config)?;
        let rewritten = normalize_patch_set(&profile.patch_dir, &profile.patched_dir)
            .with_context(|| format!("failed to normalize '{}'", profile.patch_dir.display()))?;

        if rewritten.is_empty() {
            println!("✓ '{}' — all patches already normalized", profile.name);
            return Ok(());
        }
        println!(
            "✓ '{}' normalized {} patch(es)",
            profile.name,
            rewritten.len()
        );
        for rel in rewritten {
            println!("  {}  {rel}", "✎".yellow());
        }
        Ok(())
    }
}
