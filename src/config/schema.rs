//! Configuration schema definitions.
//!
//! This module defines the structure of the matic-jagar configuration file.
//! Every field carries its external key explicitly (`rename`), so in-memory names
//! can change without breaking existing files. Keys are kept byte-for-byte,
//! including the historical spellings `alerting_threholds`, `bor_rpc_end_point`
//! and `tg_commnads_rate`.
//!
//! Each section derives [`Validate`] with its constraints written on the fields
//! (see [`Constrained`]).

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use validator::Validate;

use super::error::ConfigError;
use super::lenient;
use super::validate::{
    Constrained, digits, duration, email_address, hex_address, http_url, port, required,
    times_of_day,
};

/// Placeholder written in place of secrets by [`Config::redacted`].
pub const REDACTED: &str = "<redacted>";

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// RPC and LCD endpoints of the chains being watched.
    #[serde(rename = "rpc_and_lcd_endpoints")]
    pub endpoints: Endpoints,

    /// Identity of the monitored validator.
    #[serde(rename = "validator_details")]
    pub validator_details: ValDetails,

    /// Delivery channels that are switched on.
    #[serde(rename = "enable_alerts")]
    pub enable_alerts: EnableAlerts,

    /// Daily status report schedule.
    #[serde(rename = "regular_status_alerts")]
    pub regular_status_alerts: RegularStatusAlerts,

    /// Per-alert on/off switches.
    #[serde(rename = "alerter_preferences")]
    pub alerter_preferences: AlerterPreferences,

    /// Thresholds that trigger alerts.
    #[serde(rename = "alerting_threholds")]
    pub alerting_thresholds: AlertingThreshold,

    /// Scraper intervals.
    #[serde(rename = "scraper")]
    pub scraper: Scraper,

    /// Telegram bot credentials.
    #[serde(rename = "telegram")]
    pub telegram: Telegram,

    /// SendGrid credentials for email alerts.
    #[serde(rename = "sendgrid")]
    pub sendgrid: SendGrid,

    /// InfluxDB connection settings.
    #[serde(rename = "influxdb")]
    pub influxdb: InfluxDB,
}

impl Config {
    /// Serialize the configuration back to TOML using the same key table.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Copy of this configuration with every secret replaced by [`REDACTED`].
    ///
    /// Empty secrets stay empty so a missing token is still visible.
    #[must_use]
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        for secret in [
            &mut copy.telegram.bot_token,
            &mut copy.sendgrid.token,
            &mut copy.influxdb.password,
        ] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        copy
    }
}

/// API base URLs used by the scrapers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct Endpoints {
    /// Ethereum RPC, used for the signer's ETH balance.
    #[serde(rename = "eth_rpc_endpoint", deserialize_with = "lenient::string")]
    #[validate(custom(function = "http_url"))]
    pub eth_rpc_endpoint: String,

    /// Local Bor node RPC.
    #[serde(rename = "bor_rpc_end_point", deserialize_with = "lenient::string")]
    #[validate(custom(function = "http_url"))]
    pub bor_rpc_endpoint: String,

    /// External Bor RPC used as the network reference height.
    #[serde(rename = "bor_external_rpc", deserialize_with = "lenient::string")]
    #[validate(custom(function = "http_url"))]
    pub bor_external_rpc: String,

    /// Local Heimdall RPC.
    #[serde(rename = "heimdall_rpc_endpoint", deserialize_with = "lenient::string")]
    #[validate(custom(function = "http_url"))]
    pub heimdall_rpc_endpoint: String,

    /// Local Heimdall LCD (REST).
    #[serde(rename = "heimdall_lcd_endpoint", deserialize_with = "lenient::string")]
    #[validate(custom(function = "http_url"))]
    pub heimdall_lcd_endpoint: String,

    /// External Heimdall RPC used as the network reference height.
    #[serde(rename = "heimdall_external_rpc", deserialize_with = "lenient::string")]
    #[validate(custom(function = "http_url"))]
    pub heimdall_external_rpc: String,

    /// Polygon staking API.
    #[serde(rename = "polygon_staking_endpoint", deserialize_with = "lenient::string")]
    #[validate(custom(function = "http_url"))]
    pub polygon_staking_endpoint: String,
}

/// Validator identity. Not checked against the chain here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ValDetails {
    /// Validator hex address, used for balances, proposals and missed blocks.
    #[serde(rename = "validator_hex_addr", deserialize_with = "lenient::string")]
    #[validate(custom(function = "hex_address"))]
    pub validator_hex_address: String,

    /// Signer address, used for latest block and current proposer lookups.
    #[serde(rename = "signer_address", deserialize_with = "lenient::string")]
    #[validate(custom(function = "hex_address"))]
    pub signer_address: String,

    /// Moniker shown in alert messages.
    #[serde(rename = "validator_name", deserialize_with = "lenient::string")]
    pub validator_name: String,

    /// Stake manager contract address.
    #[serde(rename = "stake_manager_contract", deserialize_with = "lenient::string")]
    #[validate(custom(function = "hex_address"))]
    pub stake_manager_contract: String,

    /// Validator number on the staking dashboard.
    #[serde(rename = "validator_number", deserialize_with = "lenient::string")]
    #[validate(custom(function = "digits"))]
    pub validator_number: String,
}

/// Delivery channel switches. The two are independent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct EnableAlerts {
    /// Send alerts to Telegram.
    #[serde(rename = "enable_telegram_alerts", deserialize_with = "lenient::boolean")]
    pub enable_telegram_alerts: bool,

    /// Send alerts by email through SendGrid.
    #[serde(rename = "enable_email_alerts", deserialize_with = "lenient::boolean")]
    pub enable_email_alerts: bool,
}

impl EnableAlerts {
    /// Whether at least one delivery channel is on.
    pub fn any(&self) -> bool {
        self.enable_telegram_alerts || self.enable_email_alerts
    }
}

/// Time slots at which a validator status report is sent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RegularStatusAlerts {
    /// Slots such as `"09:00"` or `"02:30PM"`, in schedule order.
    /// Duplicates are kept.
    #[serde(rename = "alert_timings")]
    #[validate(custom(function = "times_of_day"))]
    pub alert_timings: Vec<String>,
}

/// On/off switch for a single alert kind.
///
/// Files spell these as strings (`"yes"`, `"no"`); booleans and the other
/// common spellings are accepted too. An empty value means off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Toggle {
    /// Alert is sent.
    On,
    /// Alert is suppressed.
    #[default]
    Off,
}

impl Toggle {
    /// Whether the toggle is on.
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }

    /// Parse a textual toggle, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "on" | "enable" | "enabled" | "1" => Some(Toggle::On),
            "no" | "n" | "false" | "off" | "disable" | "disabled" | "0" | "" => Some(Toggle::Off),
            _ => None,
        }
    }

    /// The spelling written back to files.
    pub fn as_str(self) -> &'static str {
        match self {
            Toggle::On => "yes",
            Toggle::Off => "no",
        }
    }
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        if value { Toggle::On } else { Toggle::Off }
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Toggle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Toggle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ToggleVisitor;

        impl<'de> Visitor<'de> for ToggleVisitor {
            type Value = Toggle;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"yes\", \"no\" or a boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Toggle, E> {
                Toggle::parse(v).ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Toggle, E> {
                Ok(Toggle::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Toggle, E> {
                match v {
                    0 => Ok(Toggle::Off),
                    1 => Ok(Toggle::On),
                    _ => Err(E::invalid_value(Unexpected::Signed(v), &self)),
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Toggle, E> {
                match v {
                    0 => Ok(Toggle::Off),
                    1 => Ok(Toggle::On),
                    _ => Err(E::invalid_value(Unexpected::Unsigned(v), &self)),
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<Toggle, E> {
                Ok(Toggle::Off)
            }

            fn visit_none<E: de::Error>(self) -> Result<Toggle, E> {
                Ok(Toggle::Off)
            }
        }

        deserializer.deserialize_any(ToggleVisitor)
    }
}

/// Alert kinds with an individual switch in [`AlerterPreferences`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    /// Account balance changed.
    BalanceChange,
    /// Voting power changed.
    VotingPower,
    /// New governance proposal.
    Proposal,
    /// Node lags the network by more than the block diff threshold.
    BlockDiff,
    /// Validator missed blocks.
    MissedBlock,
    /// Peer count fell below the threshold.
    NumPeers,
    /// Node is catching up.
    NodeSync,
    /// Node is down.
    NodeStatus,
    /// Signer ETH balance fell below the threshold.
    EthLowBalance,
}

/// Individual alert switches.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct AlerterPreferences {
    /// Balance change alerts.
    #[serde(rename = "balance_change_alerts")]
    pub balance_change_alerts: Toggle,
    /// Voting power alerts.
    #[serde(rename = "voting_power_alerts")]
    pub voting_power_alerts: Toggle,
    /// Proposal alerts.
    #[serde(rename = "proposal_alerts")]
    pub proposal_alerts: Toggle,
    /// Block height difference alerts.
    #[serde(rename = "block_diff_alerts")]
    pub block_diff_alerts: Toggle,
    /// Missed block alerts.
    #[serde(rename = "missed_block_alerts")]
    pub missed_block_alerts: Toggle,
    /// Peer count alerts.
    #[serde(rename = "num_peers_alerts")]
    pub num_peers_alerts: Toggle,
    /// Node sync alerts.
    #[serde(rename = "node_sync_alert")]
    pub node_sync_alert: Toggle,
    /// Node status alerts.
    #[serde(rename = "node_status_alert")]
    pub node_status_alert: Toggle,
    /// Low ETH balance alerts.
    #[serde(rename = "eth_low_balance_alert")]
    pub eth_low_balance_alert: Toggle,
}

impl AlerterPreferences {
    /// Whether alerts of the given kind are switched on.
    pub fn is_enabled(&self, kind: AlertKind) -> bool {
        let toggle = match kind {
            AlertKind::BalanceChange => self.balance_change_alerts,
            AlertKind::VotingPower => self.voting_power_alerts,
            AlertKind::Proposal => self.proposal_alerts,
            AlertKind::BlockDiff => self.block_diff_alerts,
            AlertKind::MissedBlock => self.missed_block_alerts,
            AlertKind::NumPeers => self.num_peers_alerts,
            AlertKind::NodeSync => self.node_sync_alert,
            AlertKind::NodeStatus => self.node_status_alert,
            AlertKind::EthLowBalance => self.eth_low_balance_alert,
        };
        toggle.is_on()
    }
}

/// Thresholds at which the alerter fires.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct AlertingThreshold {
    /// Alert when connected peers fall below this count.
    #[serde(rename = "num_peers_threshold", deserialize_with = "lenient::int")]
    #[validate(range(min = 0, code = "non_negative"))]
    pub num_peers_threshold: i64,

    /// Alert when consecutive missed blocks reach this count.
    #[serde(rename = "missed_blocks_threshold", deserialize_with = "lenient::int")]
    #[validate(range(min = 0, code = "non_negative"))]
    pub missed_blocks_threshold: i64,

    /// Alert when the gap between network and node height reaches this count.
    #[serde(rename = "block_diff_threshold", deserialize_with = "lenient::int")]
    #[validate(range(min = 0, code = "non_negative"))]
    pub block_diff_threshold: i64,

    /// Alert when the signer's ETH balance falls below this amount.
    #[serde(rename = "eth_balance_threshold", deserialize_with = "lenient::float")]
    #[validate(range(min = 0.0, code = "non_negative"))]
    pub eth_balance_threshold: f64,
}

/// Scraper polling intervals, as duration strings (`"3s"`, `"1m"`, `"2h30m"`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct Scraper {
    /// Interval of the generic scrapers.
    #[serde(rename = "rate", deserialize_with = "lenient::string")]
    #[validate(custom(function = "duration"))]
    pub rate: String,

    /// Interval of the validator status scraper.
    #[serde(rename = "validator_rate", deserialize_with = "lenient::string")]
    #[validate(custom(function = "duration"))]
    pub validator_rate: String,

    /// Interval of the contract scrapers.
    #[serde(rename = "contract_rate", deserialize_with = "lenient::string")]
    #[validate(custom(function = "duration"))]
    pub contract_rate: String,

    /// Interval at which Telegram commands are polled.
    #[serde(rename = "tg_commnads_rate", deserialize_with = "lenient::string")]
    #[validate(custom(function = "duration"))]
    pub commands_rate: String,
}

impl Scraper {
    /// Parsed [`Scraper::rate`]; `None` when unset or malformed.
    pub fn rate_interval(&self) -> Option<Duration> {
        parse_interval(&self.rate)
    }

    /// Parsed [`Scraper::validator_rate`].
    pub fn validator_interval(&self) -> Option<Duration> {
        parse_interval(&self.validator_rate)
    }

    /// Parsed [`Scraper::contract_rate`].
    pub fn contract_interval(&self) -> Option<Duration> {
        parse_interval(&self.contract_rate)
    }

    /// Parsed [`Scraper::commands_rate`].
    pub fn commands_interval(&self) -> Option<Duration> {
        parse_interval(&self.commands_rate)
    }
}

fn parse_interval(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    humantime::parse_duration(raw).ok()
}

/// Telegram bot details.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct Telegram {
    /// Bot token.
    #[serde(rename = "tg_bot_token", deserialize_with = "lenient::string")]
    #[validate(custom(function = "required"))]
    pub bot_token: String,

    /// Chat that receives the alerts.
    #[serde(rename = "tg_chat_id", deserialize_with = "lenient::int")]
    pub chat_id: i64,
}

impl Telegram {
    /// Whether both a token and a chat are set.
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty() && self.chat_id != 0
    }
}

/// SendGrid API credentials.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct SendGrid {
    /// API token.
    #[serde(rename = "sendgrid_token", deserialize_with = "lenient::string")]
    pub token: String,

    /// Address that receives every alert.
    #[serde(rename = "receiver_email_address", deserialize_with = "lenient::string")]
    #[validate(custom(function = "email_address"))]
    pub receiver_email_address: String,

    /// Sender address of the SendGrid account.
    #[serde(rename = "account_email", deserialize_with = "lenient::string")]
    #[validate(custom(function = "email_address"))]
    pub sender_email: String,

    /// Sender display name.
    #[serde(rename = "sendgrid_account_name", deserialize_with = "lenient::string")]
    pub sender_name: String,
}

impl SendGrid {
    /// Whether a token and both addresses are set.
    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty()
            && !self.receiver_email_address.trim().is_empty()
            && !self.sender_email.trim().is_empty()
    }
}

/// InfluxDB connection settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct InfluxDB {
    /// Port InfluxDB listens on.
    #[serde(rename = "port", deserialize_with = "lenient::string")]
    #[validate(custom(function = "port"))]
    pub port: String,

    /// Host InfluxDB runs on.
    #[serde(rename = "ip", deserialize_with = "lenient::string")]
    pub ip: String,

    /// Database the metrics are written to.
    #[serde(rename = "database", deserialize_with = "lenient::string")]
    pub database: String,

    /// User name.
    #[serde(rename = "username", deserialize_with = "lenient::string")]
    pub username: String,

    /// Password.
    #[serde(rename = "password", deserialize_with = "lenient::string")]
    pub password: String,
}

impl InfluxDB {
    /// Port as a number; `None` when unset or out of range.
    pub fn port_number(&self) -> Option<u16> {
        self.port.trim().parse().ok().filter(|p| *p != 0)
    }

    /// HTTP address of the server, defaulting the host to `localhost`.
    pub fn address(&self) -> String {
        let host = match self.ip.trim() {
            "" => "localhost",
            ip => ip,
        };
        format!("http://{}:{}", host, self.port.trim())
    }
}

impl Constrained for Endpoints {
    const FIELDS: &'static [&'static str] = &[
        "eth_rpc_endpoint",
        "bor_rpc_end_point",
        "bor_external_rpc",
        "heimdall_rpc_endpoint",
        "heimdall_lcd_endpoint",
        "heimdall_external_rpc",
        "polygon_staking_endpoint",
    ];
}

impl Constrained for ValDetails {
    const FIELDS: &'static [&'static str] = &[
        "validator_hex_addr",
        "signer_address",
        "validator_name",
        "stake_manager_contract",
        "validator_number",
    ];
}

impl Constrained for EnableAlerts {
    const FIELDS: &'static [&'static str] = &["enable_telegram_alerts", "enable_email_alerts"];
}

impl Constrained for RegularStatusAlerts {
    const FIELDS: &'static [&'static str] = &["alert_timings"];
}

impl Constrained for AlerterPreferences {
    const FIELDS: &'static [&'static str] = &[
        "balance_change_alerts",
        "voting_power_alerts",
        "proposal_alerts",
        "block_diff_alerts",
        "missed_block_alerts",
        "num_peers_alerts",
        "node_sync_alert",
        "node_status_alert",
        "eth_low_balance_alert",
    ];
}

impl Constrained for AlertingThreshold {
    const FIELDS: &'static [&'static str] = &[
        "num_peers_threshold",
        "missed_blocks_threshold",
        "block_diff_threshold",
        "eth_balance_threshold",
    ];
}

impl Constrained for Scraper {
    const FIELDS: &'static [&'static str] =
        &["rate", "validator_rate", "contract_rate", "tg_commnads_rate"];
}

impl Constrained for Telegram {
    const FIELDS: &'static [&'static str] = &["tg_bot_token", "tg_chat_id"];
    const SECRETS: &'static [&'static str] = &["tg_bot_token"];
}

impl Constrained for SendGrid {
    const FIELDS: &'static [&'static str] = &[
        "sendgrid_token",
        "receiver_email_address",
        "account_email",
        "sendgrid_account_name",
    ];
    const SECRETS: &'static [&'static str] = &["sendgrid_token"];
}

impl Constrained for InfluxDB {
    const FIELDS: &'static [&'static str] = &["port", "ip", "database", "username", "password"];
    const SECRETS: &'static [&'static str] = &["password"];
}
