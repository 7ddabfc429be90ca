//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use super::validate::ValidationErrors;

/// Boxed error coming from one of the format backends (TOML, JSON, YAML).
pub type FormatError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while locating, loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine user's home directory.
    #[error("Could not determine home directory")]
    NoHomeDirectory,

    /// No configuration file was found in any search directory.
    #[error("Config file \"{name}\" not found in {}", display_paths(.searched))]
    NotFound {
        /// Base name that was searched for.
        name: String,
        /// Directories probed, in precedence order.
        searched: Vec<PathBuf>,
    },

    /// Failed to read a configuration file.
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the file that couldn't be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file extension does not name a supported format.
    #[error("Unsupported config file format: {path}")]
    UnsupportedFormat {
        /// Path to the offending file.
        path: PathBuf,
    },

    /// The file content is not valid in its format.
    #[error("Failed to parse config file {path}: {}", single_line(.source))]
    ParseError {
        /// Path to the file that couldn't be parsed.
        path: PathBuf,
        /// The underlying parser diagnostic.
        source: FormatError,
    },

    /// The parsed content does not fit the configuration schema.
    #[error("Failed to map config file {path} onto the schema: {}", single_line(.source))]
    MappingError {
        /// Path to the file that couldn't be mapped.
        path: PathBuf,
        /// The underlying deserialization error.
        source: FormatError,
    },

    /// An exclusion list named a section that does not exist.
    #[error("Unknown config section: {0}")]
    UnknownSection(String),

    /// The configuration failed one or more field constraints.
    #[error("Config validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Failed to serialize configuration.
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "(no search paths)".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collapse a backend diagnostic onto one line.
///
/// Source snippets (gutter lines such as `1 | [telegram` and caret markers) are
/// dropped; the remaining lines are joined with `: `.
fn single_line(source: &FormatError) -> String {
    let text = source.to_string();
    let kept: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_snippet_line(line))
        .collect();
    if kept.is_empty() {
        return text.trim().to_string();
    }
    kept.join(": ")
}

fn is_snippet_line(line: &str) -> bool {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit()).trim_start();
    rest.starts_with('|') || rest.chars().all(|c| c == '^' || c.is_whitespace())
}
