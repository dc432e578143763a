//! `treepatch status`: patch-set summary and pending work.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use treepatch_core::config::DEFAULT_CONFIG_FILE;
use treepatch_sync::{pipeline, pipeline::StatusReport, TaskKind};

use super::{format_age, home_dir, load_profile};

/// Arguments for `treepatch status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Profile to inspect.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct PendingRow {
    #[tabled(rename = "action")]
    action: String,
    #[tabled(rename = "path")]
    path: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let profile = load_profile(&self.config)?;
        let name = profile.name.clone();
        let report = pipeline::status(&home, profile)
            .with_context(|| format!("status failed for '{name}'"))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_status(&report);
        Ok(())
    }
}

fn print_status(report: &StatusReport) {
    let separator = "■".repeat(60).bright_black().to_string();
    println!(
        "treepatch v{} | profile '{}' | {} patches | {} copies | {} removed",
        env!("CARGO_PKG_VERSION"),
        report.name,
        report.patches,
        report.copies,
        report.removed_files.len(),
    );
    println!("Last run: {}", format_age(report.cutoff));
    println!("{separator}");

    let pending = &report.pending;
    if pending.tasks.is_empty() {
        println!("{} Nothing pending.", "✓".green().bold());
        return;
    }

    let rows: Vec<PendingRow> = pending
        .tasks
        .iter()
        .map(|task| PendingRow {
            action: match task.kind {
                TaskKind::Diff => "diff".yellow().to_string(),
                TaskKind::Copy => "copy".green().to_string(),
            },
            path: task.rel.to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{separator}");
    println!(
        "{} pending ({} skipped). Run 'treepatch diff' to update the patch set.",
        pending.tasks.len(),
        pending.skipped
    );
}
