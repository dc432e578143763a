//! treepatch: keep a directory of patches in step with a modified source tree.
//!
//! # Usage
//!
//! ```text
//! treepatch init --base <dir> --patched <dir> --patches <dir> [--name <n>] [--config <file>]
//! treepatch diff [--full] [--dry-run] [--jobs N] [--normalize-hunks] [--json]
//! treepatch status [--json]
//! treepatch normalize
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, init::InitArgs, normalize::NormalizeArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "treepatch",
    version,
    about = "Maintain unified-diff patches between a baseline tree and a modified tree",
    long_about = None,
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new sync profile.
    Init(InitArgs),

    /// Regenerate patches for files changed since the last run.
    Diff(DiffArgs),

    /// Show the patch set and the work pending since the last run.
    Status(StatusArgs),

    /// Rewrite hunk headers of every patch with the destination offset stripped.
    Normalize(NormalizeArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Normalize(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
