//! `treepatch init --base <dir> --patched <dir> --patches <dir>`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use treepatch_core::{config, SyncConfig};

/// Write a new sync profile.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Profile file to create.
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Baseline (unmodified) tree.
    #[arg(long)]
    pub base: PathBuf,

    /// Modified tree.
    #[arg(long)]
    pub patched: PathBuf,

    /// Directory that holds the patch set.
    #[arg(long)]
    pub patches: PathBuf,

    /// Profile name; keys the persisted cutoff.
    #[arg(long)]
    pub name: Option<String>,

    /// Overwrite an existing profile.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        if self.config.exists() && !self.force {
            bail!(
                "'{}' already exists; pass --force to overwrite",
                self.config.display()
            );
        }

        let mut profile = SyncConfig::new(self.base, self.patched, self.patches);
        if let Some(name) = self.name {
            profile.name = name;
        }
        config::save_at(&self.config, &profile)
            .with_context(|| format!("failed to write '{}'", self.config.display()))?;

        println!(
            "✓ Wrote profile '{}' to {}",
            profile.name,
            self.config.display()
        );
        println!("  Run `treepatch diff` to generate patches.");
        Ok(())
    }
}
