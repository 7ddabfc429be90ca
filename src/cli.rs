//! Command-line interface definitions for jagar-config.
//!
//! Uses clap's derive API for type-safe argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Section;

/// Check and inspect the matic-jagar configuration.
///
/// Without `--config`, the file is looked up as `config.{json,toml,yaml,yml}` in
/// the current directory, then in `~/.matic-jagar/config/`.
#[derive(Parser, Debug)]
#[command(name = "jagar-config")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Read this config file instead of searching for one.
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity.
    ///
    /// Can be specified multiple times:
    /// -v    = info level
    /// -vv   = debug level
    /// -vvv  = trace level
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Subcommands for jagar-config.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the configuration and validate it.
    ///
    /// Exits non-zero and prints every violation when validation fails.
    Check {
        /// Section to leave out of validation (repeatable).
        ///
        /// Accepts the section name (`Telegram`) or its file key (`telegram`).
        #[arg(short = 'x', long = "exclude", value_name = "SECTION")]
        exclude: Vec<Section>,
    },

    /// Print the loaded configuration as TOML, with secrets redacted.
    ///
    /// The configuration is not validated.
    Show,

    /// Print the directories searched for the config file, in order.
    Paths,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::parse_from(["jagar-config", "check"]);

        assert!(cli.config.is_none());
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Check { exclude } => assert!(exclude.is_empty()),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_parse_excludes() {
        let cli = Cli::parse_from([
            "jagar-config",
            "check",
            "--exclude",
            "Telegram",
            "-x",
            "sendgrid",
        ]);

        match cli.command {
            Commands::Check { exclude } => {
                assert_eq!(exclude, vec![Section::Telegram, Section::SendGrid]);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_section() {
        let result = Cli::try_parse_from(["jagar-config", "check", "-x", "metrics"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::parse_from(["jagar-config", "show", "-c", "/etc/jagar/config.toml", "-vv"]);

        assert!(matches!(cli.command, Commands::Show));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/jagar/config.toml")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_parse_paths() {
        let cli = Cli::parse_from(["jagar-config", "paths"]);
        assert!(matches!(cli.command, Commands::Paths));
    }
}
