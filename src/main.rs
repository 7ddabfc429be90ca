//! jagar-config: check the matic-jagar configuration
//!
//! This is the process bootstrap around the config library. The library only
//! returns errors; deciding to stop the process on a bad configuration happens
//! here. Any failure is reported as one line on stderr with a non-zero exit
//! status, and nothing is partially started.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use matic_jagar_config::{cli::Cli, cli_handler::handle_command};
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    }

    debug!("Parsed CLI arguments: {:?}", cli);

    let mut stdout = std::io::stdout().lock();
    match handle_command(&cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing subscriber. Logs go to stderr so `show` output on
/// stdout stays clean.
///
/// # Verbosity Levels
/// - 0 (default): Only warnings and errors, unless `RUST_LOG` is set
/// - 1 (-v): Info level
/// - 2 (-vv): Debug level
/// - 3+ (-vvv): Trace level
fn init_tracing(verbose: u8) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
