//! File formats a configuration may be written in.
//!
//! Decoding happens in two stages so the error tells the operator what went
//! wrong: first the text is parsed into the format's generic value tree
//! ([`ConfigError::ParseError`]), then that tree is mapped onto [`Config`]
//! ([`ConfigError::MappingError`]).
//!
//! Keys are matched case-insensitively: every map key in the tree is lowercased
//! before mapping, so `[Telegram]` and `[telegram]` name the same section.

use std::fmt;
use std::path::Path;

use super::error::ConfigError;
use super::schema::Config;

/// A supported configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
    /// `.yaml` / `.yml`
    Yaml,
}

impl ConfigFormat {
    /// Extensions probed in each search directory, in order.
    pub const SEARCH_ORDER: [(&'static str, ConfigFormat); 4] = [
        ("json", ConfigFormat::Json),
        ("toml", ConfigFormat::Toml),
        ("yaml", ConfigFormat::Yaml),
        ("yml", ConfigFormat::Yaml),
    ];

    /// Detect the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::SEARCH_ORDER
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, format)| *format)
    }

    /// Detect the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse `contents` and map it onto [`Config`].
    ///
    /// `path` is only used for error reporting.
    pub fn decode(self, path: &Path, contents: &str) -> Result<Config, ConfigError> {
        match self {
            ConfigFormat::Toml => {
                let table: toml::Table = contents.parse().map_err(|e| parse_error(path, e))?;
                lowercase_toml_keys(toml::Value::Table(table))
                    .try_into()
                    .map_err(|e| mapping_error(path, e))
            }
            ConfigFormat::Json => {
                let value: serde_json::Value =
                    serde_json::from_str(contents).map_err(|e| parse_error(path, e))?;
                serde_json::from_value(lowercase_json_keys(value))
                    .map_err(|e| mapping_error(path, e))
            }
            ConfigFormat::Yaml => {
                let value: serde_yaml::Value =
                    serde_yaml::from_str(contents).map_err(|e| parse_error(path, e))?;
                // An empty document is a valid, empty configuration.
                if value.is_null() {
                    return Ok(Config::default());
                }
                serde_yaml::from_value(lowercase_yaml_keys(value))
                    .map_err(|e| mapping_error(path, e))
            }
        }
    }
}

fn lowercase_toml_keys(value: toml::Value) -> toml::Value {
    match value {
        toml::Value::Table(table) => toml::Value::Table(
            table
                .into_iter()
                .map(|(key, value)| (key.to_lowercase(), lowercase_toml_keys(value)))
                .collect(),
        ),
        toml::Value::Array(items) => {
            toml::Value::Array(items.into_iter().map(lowercase_toml_keys).collect())
        }
        other => other,
    }
}

fn lowercase_json_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_lowercase(), lowercase_json_keys(value)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(lowercase_json_keys).collect())
        }
        other => other,
    }
}

fn lowercase_yaml_keys(value: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;

    match value {
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .into_iter()
                .map(|(key, value)| {
                    let key = match key {
                        Value::String(key) => Value::String(key.to_lowercase()),
                        other => other,
                    };
                    (key, lowercase_yaml_keys(value))
                })
                .collect(),
        ),
        Value::Sequence(items) => {
            Value::Sequence(items.into_iter().map(lowercase_yaml_keys).collect())
        }
        other => other,
    }
}

fn parse_error<E>(path: &Path, source: E) -> ConfigError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ConfigError::ParseError {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}

fn mapping_error<E>(path: &Path, source: E) -> ConfigError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ConfigError::MappingError {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Json => write!(f, "json"),
            ConfigFormat::Toml => write!(f, "toml"),
            ConfigFormat::Yaml => write!(f, "yaml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Toggle;

    fn decode(format: ConfigFormat, contents: &str) -> Result<Config, ConfigError> {
        format.decode(Path::new("config"), contents)
    }

    #[test]
    fn test_detect_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("config.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("a/config.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("config.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("config.ini")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), None);
    }

    #[test]
    fn test_toml_parse_error() {
        let err = decode(ConfigFormat::Toml, "this is not valid TOML [[[").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_toml_mapping_error() {
        let err = decode(
            ConfigFormat::Toml,
            r#"
            [alerting_threholds]
            missed_blocks_threshold = "lots"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MappingError { .. }));
    }

    #[test]
    fn test_section_of_wrong_shape_is_mapping_error() {
        let err = decode(ConfigFormat::Toml, "telegram = \"token\"").unwrap_err();
        assert!(matches!(err, ConfigError::MappingError { .. }));
    }

    #[test]
    fn test_json_decode() {
        let config = decode(
            ConfigFormat::Json,
            r#"{
                "telegram": {"tg_bot_token": "123:abc", "tg_chat_id": -1001},
                "alerter_preferences": {"proposal_alerts": "yes"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, -1001);
        assert_eq!(config.alerter_preferences.proposal_alerts, Toggle::On);
    }

    #[test]
    fn test_json_parse_error() {
        let err = decode(ConfigFormat::Json, "{ \"telegram\": ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_yaml_decode() {
        let config = decode(
            ConfigFormat::Yaml,
            "regular_status_alerts:\n  alert_timings:\n    - \"09:00\"\n    - \"21:00\"\ninfluxdb:\n  port: 8086\n",
        )
        .unwrap();

        assert_eq!(config.regular_status_alerts.alert_timings, vec!["09:00", "21:00"]);
        assert_eq!(config.influxdb.port, "8086");
    }

    #[test]
    fn test_empty_documents() {
        assert_eq!(decode(ConfigFormat::Toml, "").unwrap(), Config::default());
        assert_eq!(decode(ConfigFormat::Yaml, "").unwrap(), Config::default());
    }

    #[test]
    fn test_yaml_mapping_error() {
        let err = decode(ConfigFormat::Yaml, "- just\n- a list\n").unwrap_err();
        assert!(matches!(err, ConfigError::MappingError { .. }));
    }

    #[test]
    fn test_keys_match_case_insensitively() {
        let config = decode(
            ConfigFormat::Toml,
            r#"
            [Telegram]
            TG_Bot_Token = "123:abc"
            tg_chat_id = 5

            [Validator_Details]
            validator_name = "Jagar"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, 5);
        // Values keep their case.
        assert_eq!(config.validator_details.validator_name, "Jagar");
    }

    #[test]
    fn test_mixed_case_keys_in_json_and_yaml() {
        let json = decode(
            ConfigFormat::Json,
            r#"{"Telegram": {"TG_CHAT_ID": 9}, "Alerter_Preferences": {"Proposal_Alerts": "yes"}}"#,
        )
        .unwrap();
        assert_eq!(json.telegram.chat_id, 9);
        assert_eq!(json.alerter_preferences.proposal_alerts, Toggle::On);

        let yaml = decode(
            ConfigFormat::Yaml,
            "Regular_Status_Alerts:\n  Alert_Timings:\n    - \"09:00\"\nInfluxDB:\n  Port: 8086\n",
        )
        .unwrap();
        assert_eq!(yaml.regular_status_alerts.alert_timings, vec!["09:00"]);
        assert_eq!(yaml.influxdb.port, "8086");
    }
}
