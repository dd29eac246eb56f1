//! Viren - a periodic self-journaling agent
//!
//! CLI entry point for the reflection loop.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use viren::cli::display;
use viren::cycle::config::{LoopConfig, LoopPaths, DEFAULT_CONFIG_FILE};
use viren::cycle::runner::{CycleRunner, RunMode};
use viren::cycle::update::MarkerValidator;
use viren::intel::HttpIntel;
use viren::log::diagnostics;
use viren::{supervisor, StdinOperator};

/// Run Viren's reflective loop
///
/// Every cycle fetches a line of intel, writes a reflection, applies any
/// staged self-update policy, and asks the operator for a message.
#[derive(Parser, Debug)]
#[command(name = "viren", version, about)]
struct Cli {
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Directory holding anchors, state, reflections and logs
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Path to viren.toml (defaults to <root>/viren.toml; optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds to pause between cycles, overriding the config
    #[arg(long)]
    sleep_secs: Option<u64>,

    /// File holding a replacement behavior definition for the first cycle
    #[arg(long)]
    update_from: Option<PathBuf>,
}

/// Pick the run mode from the CLI flags and config.
fn run_mode(cli: &Cli, config: &LoopConfig) -> RunMode {
    if cli.once {
        RunMode::Once
    } else {
        RunMode::Forever {
            pause: cli
                .sleep_secs
                .map_or_else(|| config.sleep_duration(), Duration::from_secs),
        }
    }
}

/// Read a replacement definition supplied on the command line.
///
/// An empty file is passed through; the update step treats it as no replacement.
fn read_replacement(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replacement from '{}'", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init();
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(DEFAULT_CONFIG_FILE));
    let config = LoopConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;
    let paths = LoopPaths::resolve(&cli.root, &config.paths);

    let replacement = cli
        .update_from
        .as_deref()
        .map(read_replacement)
        .transpose()?;

    // Swap in whatever the previous process staged
    if supervisor::promote_staged(&paths)? {
        display::print_promoted();
    }

    let intel = HttpIntel::new(&config.intel.url, config.intel_timeout())?;
    let runner = CycleRunner::new(
        paths,
        Box::new(intel),
        Box::new(MarkerValidator::new(&config.update.marker)),
        Box::new(StdinOperator),
    );
    let mode = run_mode(&cli, &config);

    tokio::select! {
        result = runner.run(replacement, mode) => result,
        _ = tokio::signal::ctrl_c() => {
            display::print_exit();
            // A pending stdin read would keep the runtime alive on shutdown
            std::process::exit(0);
        }
    }
}
