//! Configuration file resolution and loading.
//!
//! The file is searched for in two directories, first match wins:
//!
//! 1. The current working directory
//! 2. User config directory: `~/.matic-jagar/config/`
//!
//! Inside each directory the base name `config` is tried with every supported
//! extension (`json`, `toml`, `yaml`, `yml`, in that order). A missing file is an
//! error: there are no built-in defaults to fall back to.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::error::ConfigError;
use super::format::ConfigFormat;
use super::schema::Config;
use super::validate::Section;

/// Hidden application directory under the user's home.
pub const APP_DIR: &str = ".matic-jagar";

/// Config subdirectory inside [`APP_DIR`].
pub const CONFIG_SUBDIR: &str = "config";

/// Base name of the configuration file, without extension.
pub const CONFIG_NAME: &str = "config";

/// Where the configuration comes from.
#[derive(Debug, Clone)]
enum Source {
    /// Probe these directories in order.
    Search(Vec<PathBuf>),
    /// Use exactly this file.
    File(PathBuf),
}

/// Locates, parses and validates the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    source: Source,
}

impl ConfigLoader {
    /// Create a loader searching the current directory, then the user config
    /// directory.
    ///
    /// Fails when the user's home directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        let user_dir = user_config_dir(&home);
        debug!("User config directory: {:?}", user_dir);

        Ok(Self::with_search_paths(vec![PathBuf::from("."), user_dir]))
    }

    /// Create a loader searching the given directories, in order.
    #[must_use]
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            source: Source::Search(paths),
        }
    }

    /// Create a loader that reads exactly `path`, skipping the search.
    ///
    /// The format is taken from the file extension.
    #[must_use]
    pub fn with_file(path: PathBuf) -> Self {
        Self {
            source: Source::File(path),
        }
    }

    /// Directories probed, in precedence order. Empty for a pinned file.
    pub fn search_paths(&self) -> &[PathBuf] {
        match &self.source {
            Source::Search(paths) => paths.as_slice(),
            Source::File(_) => &[],
        }
    }

    /// Find the configuration file and its format.
    pub fn locate(&self) -> Result<(PathBuf, ConfigFormat), ConfigError> {
        match &self.source {
            Source::File(path) => {
                let format = ConfigFormat::from_path(path)
                    .ok_or_else(|| ConfigError::UnsupportedFormat { path: path.clone() })?;
                Ok((path.clone(), format))
            }
            Source::Search(directories) => {
                for dir in directories {
                    for (ext, format) in ConfigFormat::SEARCH_ORDER {
                        let candidate = dir.join(format!("{CONFIG_NAME}.{ext}"));
                        if candidate.is_file() {
                            debug!("Found config file at {:?}", candidate);
                            return Ok((candidate, format));
                        }
                    }
                    debug!("No config file in {:?}", dir);
                }

                Err(ConfigError::NotFound {
                    name: CONFIG_NAME.to_string(),
                    searched: directories.clone(),
                })
            }
        }
    }

    /// Locate, read, parse and map the file without validating it.
    pub fn load_unvalidated(&self) -> Result<Config, ConfigError> {
        self.read_located().map(|(_, config)| config)
    }

    /// Load the configuration and validate every section.
    pub fn load(&self) -> Result<Config, ConfigError> {
        self.load_except(&[])
    }

    /// Load the configuration and validate all sections except `exclude`.
    pub fn load_except(&self, exclude: &[Section]) -> Result<Config, ConfigError> {
        self.load_located(exclude).map(|(_, config)| config)
    }

    /// Like [`ConfigLoader::load_except`], also returning the file that was read.
    pub fn load_located(&self, exclude: &[Section]) -> Result<(PathBuf, Config), ConfigError> {
        let (path, config) = self.read_located()?;
        config.validate(exclude)?;
        Ok((path, config))
    }

    fn read_located(&self) -> Result<(PathBuf, Config), ConfigError> {
        let (path, format) = self.locate()?;
        let config = read_file(&path, format)?;
        info!("Loaded {} configuration from {:?}", format, path);
        Ok((path, config))
    }
}

/// Load and validate the configuration from the default search paths.
///
/// Errors are returned, never turned into a process exit; the caller decides.
pub fn load_config() -> Result<Config, ConfigError> {
    ConfigLoader::new()?.load()
}

/// `<home>/.matic-jagar/config`
pub fn user_config_dir(home: &Path) -> PathBuf {
    home.join(APP_DIR).join(CONFIG_SUBDIR)
}

fn read_file(path: &Path, format: ConfigFormat) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    format.decode(path, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const VALID_TOML: &str = r#"
        [validator_details]
        validator_name = "jagar"

        [telegram]
        tg_bot_token = "123:abc"
        tg_chat_id = 42
    "#;

    #[test]
    fn test_user_config_dir() {
        assert_eq!(
            user_config_dir(Path::new("/home/op")),
            PathBuf::from("/home/op/.matic-jagar/config")
        );
    }

    #[test]
    fn test_default_search_paths() {
        // Only meaningful where a home directory can be resolved.
        let Ok(loader) = ConfigLoader::new() else {
            return;
        };

        let paths = loader.search_paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], PathBuf::from("."));
        assert!(paths[1].ends_with(".matic-jagar/config"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::with_search_paths(vec![
            dir.path().join("first"),
            dir.path().join("second"),
        ]);

        let err = loader.load().unwrap_err();
        match err {
            ConfigError::NotFound { name, searched } => {
                assert_eq!(name, "config");
                assert_eq!(searched.len(), 2);
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_loads_toml() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), VALID_TOML).unwrap();

        let loader = ConfigLoader::with_search_paths(vec![dir.path().to_path_buf()]);
        let config = loader.load().unwrap();

        assert_eq!(config.validator_details.validator_name, "jagar");
        assert_eq!(config.telegram.chat_id, 42);
    }

    #[test]
    fn test_extension_order_within_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), "telegram:\n  tg_chat_id: 1\n").unwrap();
        fs::write(dir.path().join("config.toml"), "[telegram]\ntg_chat_id = 2\n").unwrap();

        let loader = ConfigLoader::with_search_paths(vec![dir.path().to_path_buf()]);
        let (path, format) = loader.locate().unwrap();

        assert_eq!(format, ConfigFormat::Toml);
        assert_eq!(path, dir.path().join("config.toml"));
    }

    #[test]
    fn test_directory_named_config_is_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("config.toml")).unwrap();

        let loader = ConfigLoader::with_search_paths(vec![dir.path().to_path_buf()]);
        assert!(matches!(loader.locate(), Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "this is not valid TOML [[[").unwrap();

        let loader = ConfigLoader::with_search_paths(vec![dir.path().to_path_buf()]);
        let err = loader.load().unwrap_err();

        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_validation_failure_surfaces() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "[validator_details]\n").unwrap();

        let loader = ConfigLoader::with_search_paths(vec![dir.path().to_path_buf()]);

        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let config = loader.load_except(&[Section::Telegram]).unwrap();
        assert!(config.telegram.bot_token.is_empty());
    }

    #[test]
    fn test_pinned_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, VALID_TOML).unwrap();

        let loader = ConfigLoader::with_file(path.clone());
        assert!(loader.search_paths().is_empty());
        assert_eq!(loader.locate().unwrap(), (path, ConfigFormat::Toml));
        assert_eq!(loader.load().unwrap().telegram.bot_token, "123:abc");
    }

    #[test]
    fn test_pinned_file_missing_is_read_error() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::with_file(dir.path().join("absent.toml"));

        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_pinned_file_unknown_extension() {
        let loader = ConfigLoader::with_file(PathBuf::from("config.ini"));
        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_load_located_reports_path() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.yml"), "telegram:\n  tg_bot_token: \"123:abc\"\n").unwrap();

        let loader = ConfigLoader::with_search_paths(vec![dir.path().to_path_buf()]);
        let (path, config) = loader.load_located(&[]).unwrap();

        assert_eq!(path, dir.path().join("config.yml"));
        assert_eq!(config.telegram.bot_token, "123:abc");
    }

    #[test]
    fn test_parse_error_message_is_one_line() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "[telegram\ntg_bot_token = 1\n").unwrap();

        let loader = ConfigLoader::with_search_paths(vec![dir.path().to_path_buf()]);
        let err = loader.load().unwrap_err();

        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert_eq!(err.to_string().lines().count(), 1);
    }
}
