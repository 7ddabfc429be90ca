//! Configuration system for matic-jagar.
//!
//! This module loads the service configuration from a single file and checks
//! it against the constraints each section declares with `validator`.
//!
//! # File Location
//!
//! The first file found wins:
//!
//! 1. `./config.{json,toml,yaml,yml}`
//! 2. `~/.matic-jagar/config/config.{json,toml,yaml,yml}`
//!
//! No file at all is an error. Sections missing from the file take empty values.
//!
//! # Validation
//!
//! [`Config::validate`] reports every violation at once. Sections can be left
//! out of a pass, e.g. alert credentials during a dry run:
//!
//! ```toml
//! [telegram]
//! tg_bot_token = "123456:ABC"
//! tg_chat_id = -1001234567890
//!
//! [alerting_threholds]
//! num_peers_threshold = 2
//! ```
//!
//! ```no_run
//! use matic_jagar_config::config::{ConfigLoader, Section};
//!
//! let config = ConfigLoader::new()?.load_except(&[Section::Telegram, Section::SendGrid])?;
//! # Ok::<(), matic_jagar_config::config::ConfigError>(())
//! ```

mod error;
mod format;
mod lenient;
mod loader;
mod schema;
mod validate;

pub use error::{ConfigError, FormatError};
pub use format::ConfigFormat;
pub use loader::{APP_DIR, CONFIG_NAME, CONFIG_SUBDIR, ConfigLoader, load_config, user_config_dir};
pub use schema::{
    AlertKind, AlerterPreferences, AlertingThreshold, Config, EnableAlerts, Endpoints, InfluxDB,
    REDACTED, RegularStatusAlerts, Scraper, SendGrid, Telegram, Toggle, ValDetails,
};
pub use validate::{Constrained, Rule, Section, ValidationErrors, Violation};
