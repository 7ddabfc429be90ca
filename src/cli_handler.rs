//! Command handling for jagar-config.
//!
//! Library errors are passed up unchanged; their messages already name the
//! failure kind and cause, and `main` prints them as a single line.

use anyhow::Result;
use std::io::Write;

use crate::cli::{Cli, Commands};
use crate::config::ConfigLoader;

/// Run the subcommand selected on the command line, writing results to `out`.
pub fn handle_command(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let loader = build_loader(cli)?;

    match &cli.command {
        Commands::Check { exclude } => {
            let (path, _) = loader.load_located(exclude)?;
            if exclude.is_empty() {
                writeln!(out, "{}: OK", path.display())?;
            } else {
                let skipped: Vec<String> = exclude.iter().map(ToString::to_string).collect();
                writeln!(out, "{}: OK (skipped {})", path.display(), skipped.join(", "))?;
            }
        }
        Commands::Show => {
            let config = loader.load_unvalidated()?;
            let rendered = config.redacted().to_toml_string()?;
            write!(out, "{rendered}")?;
        }
        Commands::Paths => match &cli.config {
            Some(path) => writeln!(out, "{}", path.display())?,
            None => {
                for dir in loader.search_paths() {
                    writeln!(out, "{}", dir.display())?;
                }
            }
        },
    }

    Ok(())
}

fn build_loader(cli: &Cli) -> Result<ConfigLoader> {
    match &cli.config {
        Some(path) => Ok(ConfigLoader::with_file(path.clone())),
        None => Ok(ConfigLoader::new()?),
    }
}
