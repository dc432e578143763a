//! `treepatch diff`: regenerate the patch set.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use treepatch_core::config::DEFAULT_CONFIG_FILE;
use treepatch_sync::{
    pipeline, GenerateOutcome, ManifestUpdate, RunMode, SyncError, SyncPlan, SyncReport,
    TaskKind,
};

use super::{format_age, home_dir, load_profile};

/// Arguments for `treepatch diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Profile to run.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Ignore the cutoff and reconsider every file.
    #[arg(long)]
    pub full: bool,

    /// Print the work list without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Worker threads (overrides the profile).
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Strip destination offsets from hunk headers of written patches.
    #[arg(long)]
    pub normalize_hunks: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mut profile = load_profile(&self.config)?;
        if self.jobs.is_some() {
            profile.jobs = self.jobs;
        }
        if self.normalize_hunks {
            profile.normalize_hunk_offsets = true;
        }
        let mode = if self.full {
            RunMode::Full
        } else {
            RunMode::Incremental
        };
        let name = profile.name.clone();

        if self.dry_run {
            let plan = pipeline::plan(&home, profile, mode)
                .with_context(|| format!("planning failed for '{name}'"))?;
            if self.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&plan).context("failed to serialize plan")?
                );
            } else {
                print_plan(&name, &plan);
            }
            return Ok(());
        }

        let report = match pipeline::run(&home, profile, mode) {
            Ok(report) => report,
            Err(SyncError::Batch { total, failures }) => {
                eprintln!(
                    "{} {} of {total} item(s) failed; cutoff not advanced",
                    "✗".red().bold(),
                    failures.len()
                );
                for failure in &failures {
                    eprintln!("  {} {failure}", "✗".red());
                }
                bail!("diff failed for '{name}'");
            }
            Err(err) => return Err(err).with_context(|| format!("diff failed for '{name}'")),
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            print_report(&name, &report);
        }
        Ok(())
    }
}

fn print_plan(name: &str, plan: &SyncPlan) {
    let prefix = "[dry-run] ".bright_black();
    if plan.tasks.is_empty() {
        println!("{prefix}✓ '{name}' — nothing to do ({} skipped)", plan.skipped);
        return;
    }
    println!(
        "{prefix}'{name}' would process {} file(s) ({} diff, {} copy, {} skipped)",
        plan.tasks.len(),
        plan.count(TaskKind::Diff),
        plan.count(TaskKind::Copy),
        plan.skipped,
    );
    for task in &plan.tasks {
        println!("  ~  {}", task.description());
    }
}

fn print_report(name: &str, report: &SyncReport) {
    let touched = report.touched().count();
    let unchanged = report.results.len() - touched;
    println!(
        "{} '{name}' diffed ({touched} updated, {unchanged} unchanged, {} skipped)",
        "✓".green().bold(),
        report.skipped,
    );

    for result in report.touched() {
        let (marker, detail) = match result.outcome {
            GenerateOutcome::PatchWritten => ("✎".yellow(), "patch"),
            GenerateOutcome::Copied => ("+".green(), "copy"),
            GenerateOutcome::CopiedBinary => ("+".green(), "binary copy"),
            GenerateOutcome::PatchRemoved => ("-".red(), "reverted"),
            GenerateOutcome::Unchanged | GenerateOutcome::Clean => continue,
        };
        println!("  {marker}  {} ({detail})", result.rel);
    }
    for rel in &report.pruned.deleted {
        println!("  {}  {rel} (pruned)", "-".red());
    }

    match report.manifest {
        ManifestUpdate::Written => println!(
            "  removed files: {} (manifest updated)",
            report.removed_files.len()
        ),
        ManifestUpdate::Deleted => println!("  removed files: none (manifest deleted)"),
        ManifestUpdate::Unchanged | ManifestUpdate::Absent => {}
    }
    println!(
        "  cutoff: {} (previous: {})",
        report.cutoff.to_rfc3339(),
        format_age(report.previous_cutoff)
    );
}
