//! mdu - Parallel Disk Usage Calculator
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use mdu::config::{CliArgs, WalkConfig};
use mdu::report::{print_summary, print_usages};
use mdu::walker::Dispatcher;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every path was walked without errors
fn run() -> Result<bool> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Validate and create config
    let config = WalkConfig::from_args(args).context("Invalid configuration")?;

    // Setup logging
    setup_logging(config.verbose)?;

    let dispatcher = Dispatcher::new(config.paths.iter().cloned(), config.worker_count);

    // Setup signal handler for graceful shutdown
    let cancel = dispatcher.cancel_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        cancel.cancel();
    })
    .context("Failed to set signal handler")?;

    // Run the walk
    let result = dispatcher.run().context("Walk failed")?;

    print_usages(&result.usages, config.human_readable).context("Failed to write results")?;

    if config.show_summary {
        print_summary(&result, config.worker_count);
    }

    if !result.is_complete() {
        info!(errors = result.stats.errors, "Walk completed with errors");
    }

    Ok(result.is_complete())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("mdu=debug,warn")
    } else {
        EnvFilter::new("mdu=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
