//! Constraint checking over a loaded [`Config`].
//!
//! Each section derives [`validator::Validate`] with its constraints written on
//! the fields. Validation runs every section except the excluded ones and merges
//! their reports into one [`ValidationErrors`], in section then field order,
//! rather than stopping at the first failure.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};
use validator::{Validate, ValidateEmail, ValidateUrl, ValidationError};

use super::error::ConfigError;
use super::schema::{Config, REDACTED};

/// Top-level section of the configuration, used to scope validation.
///
/// Parses from either the in-memory name (`Telegram`, `AlertingThresholds`) or
/// the file key (`telegram`, `alerting_threholds`), ignoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `rpc_and_lcd_endpoints`
    Endpoints,
    /// `validator_details`
    ValDetails,
    /// `enable_alerts`
    EnableAlerts,
    /// `regular_status_alerts`
    RegularStatusAlerts,
    /// `alerter_preferences`
    AlerterPreferences,
    /// `alerting_threholds`
    AlertingThresholds,
    /// `scraper`
    Scraper,
    /// `telegram`
    Telegram,
    /// `sendgrid`
    SendGrid,
    /// `influxdb`
    InfluxDB,
}

impl Section {
    /// Every section, in file order.
    pub const ALL: [Section; 10] = [
        Section::Endpoints,
        Section::ValDetails,
        Section::EnableAlerts,
        Section::RegularStatusAlerts,
        Section::AlerterPreferences,
        Section::AlertingThresholds,
        Section::Scraper,
        Section::Telegram,
        Section::SendGrid,
        Section::InfluxDB,
    ];

    /// In-memory name of the section.
    pub fn name(self) -> &'static str {
        match self {
            Section::Endpoints => "Endpoints",
            Section::ValDetails => "ValDetails",
            Section::EnableAlerts => "EnableAlerts",
            Section::RegularStatusAlerts => "RegularStatusAlerts",
            Section::AlerterPreferences => "AlerterPreferences",
            Section::AlertingThresholds => "AlertingThresholds",
            Section::Scraper => "Scraper",
            Section::Telegram => "Telegram",
            Section::SendGrid => "SendGrid",
            Section::InfluxDB => "InfluxDB",
        }
    }

    /// Key of the section in the configuration file.
    pub fn key(self) -> &'static str {
        match self {
            Section::Endpoints => "rpc_and_lcd_endpoints",
            Section::ValDetails => "validator_details",
            Section::EnableAlerts => "enable_alerts",
            Section::RegularStatusAlerts => "regular_status_alerts",
            Section::AlerterPreferences => "alerter_preferences",
            Section::AlertingThresholds => "alerting_threholds",
            Section::Scraper => "scraper",
            Section::Telegram => "telegram",
            Section::SendGrid => "sendgrid",
            Section::InfluxDB => "influxdb",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Section {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Section::ALL
            .into_iter()
            .find(|section| {
                section.name().eq_ignore_ascii_case(wanted)
                    || section.key().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ConfigError::UnknownSection(s.to_string()))
    }
}

/// The rule a field failed. Its [`Rule::name`] is the `validator` error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Value must be set (non-blank text).
    Required,
    /// Number must be zero or greater.
    NonNegative,
    /// `http`, `https`, `ws` or `wss` URL with a host.
    Url,
    /// `0x` followed by hex digits.
    HexAddress,
    /// Decimal digits only.
    Numeric,
    /// `HH:MM` (24h) or `hh:mmAM`/`hh:mmPM`. Applies to each list entry.
    TimeOfDay,
    /// Duration such as `3s`, `1m` or `2h30m`.
    Duration,
    /// Plausible email address.
    Email,
    /// TCP port in 1..=65535.
    Port,
}

impl Rule {
    const ALL: [Rule; 9] = [
        Rule::Required,
        Rule::NonNegative,
        Rule::Url,
        Rule::HexAddress,
        Rule::Numeric,
        Rule::TimeOfDay,
        Rule::Duration,
        Rule::Email,
        Rule::Port,
    ];

    /// Short rule name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::NonNegative => "non_negative",
            Rule::Url => "url",
            Rule::HexAddress => "hex_address",
            Rule::Numeric => "numeric",
            Rule::TimeOfDay => "time_of_day",
            Rule::Duration => "duration",
            Rule::Email => "email",
            Rule::Port => "port",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Rule::Required => "must not be empty",
            Rule::NonNegative => "must be zero or greater",
            Rule::Url => "must be an http(s) or ws(s) URL",
            Rule::HexAddress => "must be a 0x-prefixed hex address",
            Rule::Numeric => "must contain only digits",
            Rule::TimeOfDay => "must be a time of day like 09:00 or 02:30PM",
            Rule::Duration => "must be a duration like 3s or 1m",
            Rule::Email => "must be an email address",
            Rule::Port => "must be a port between 1 and 65535",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        Rule::ALL.into_iter().find(|rule| rule.name() == code)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Custom checks referenced from the `#[validate(custom(...))]` attributes in
// the schema. Apart from `required` they accept an empty value.

pub(crate) fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(failure(Rule::Required, value))
    } else {
        Ok(())
    }
}

pub(crate) fn http_url(value: &str) -> Result<(), ValidationError> {
    check(Rule::Url, value, |v| v.validate_url() && has_web_scheme(v))
}

pub(crate) fn email_address(value: &str) -> Result<(), ValidationError> {
    check(Rule::Email, value, |v| v.validate_email())
}

pub(crate) fn hex_address(value: &str) -> Result<(), ValidationError> {
    check(Rule::HexAddress, value, is_hex_address)
}

pub(crate) fn digits(value: &str) -> Result<(), ValidationError> {
    check(Rule::Numeric, value, |v| {
        let v = v.trim();
        !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit())
    })
}

pub(crate) fn duration(value: &str) -> Result<(), ValidationError> {
    check(Rule::Duration, value, |v| humantime::parse_duration(v.trim()).is_ok())
}

pub(crate) fn port(value: &str) -> Result<(), ValidationError> {
    check(Rule::Port, value, |v| v.trim().parse::<u16>().is_ok_and(|p| p != 0))
}

/// Every entry must be a time of day. Offending entries are reported under the
/// `invalid` parameter as `[index, value]` pairs.
pub(crate) fn times_of_day(values: &[String]) -> Result<(), ValidationError> {
    let invalid: Vec<(usize, &str)> = values
        .iter()
        .enumerate()
        .filter(|(_, value)| !is_time_of_day(value))
        .map(|(index, value)| (index, value.as_str()))
        .collect();
    if invalid.is_empty() {
        return Ok(());
    }
    let mut error = ValidationError::new(Rule::TimeOfDay.name());
    error.add_param(Cow::Borrowed("invalid"), &invalid);
    Err(error)
}

fn check(
    rule: Rule,
    value: &str,
    accepts: impl FnOnce(&str) -> bool,
) -> Result<(), ValidationError> {
    if value.is_empty() || accepts(value) {
        Ok(())
    } else {
        Err(failure(rule, value))
    }
}

fn failure(rule: Rule, value: &str) -> ValidationError {
    let mut error = ValidationError::new(rule.name());
    error.add_param(Cow::Borrowed("value"), &value);
    error
}

fn has_web_scheme(s: &str) -> bool {
    s.split_once("://").is_some_and(|(scheme, _)| {
        matches!(
            scheme.to_ascii_lowercase().as_str(),
            "http" | "https" | "ws" | "wss"
        )
    })
}

fn is_hex_address(s: &str) -> bool {
    let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) else {
        return false;
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_time_of_day(s: &str) -> bool {
    let s = s.trim();
    let upper = s.to_ascii_uppercase();
    let (clock, twelve_hour) = match upper
        .strip_suffix("AM")
        .or_else(|| upper.strip_suffix("PM"))
    {
        Some(clock) => (clock.trim_end(), true),
        None => (upper.as_str(), false),
    };

    let Some((hours, minutes)) = clock.split_once(':') else {
        return false;
    };
    let valid_digits = |part: &str, max_len: usize| {
        !part.is_empty() && part.len() <= max_len && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !valid_digits(hours, 2) || minutes.len() != 2 || !valid_digits(minutes, 2) {
        return false;
    }

    let (Ok(h), Ok(m)) = (hours.parse::<u8>(), minutes.parse::<u8>()) else {
        return false;
    };
    let hour_ok = if twelve_hour {
        (1..=12).contains(&h)
    } else {
        h <= 23
    };
    hour_ok && m <= 59
}

/// A configuration section checked by [`Config::validate`].
pub trait Constrained: Validate {
    /// File keys of the section's fields, in file order. Violations are
    /// reported in this order.
    const FIELDS: &'static [&'static str];

    /// File keys whose values are kept out of diagnostics.
    const SECRETS: &'static [&'static str] = &[];
}

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Section the field belongs to.
    pub section: Section,
    /// Dotted file path of the field, e.g. `telegram.tg_bot_token`.
    pub field: String,
    /// Rule that failed.
    pub rule: Rule,
    /// Offending value, redacted for secrets.
    pub value: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (got {:?})", self.field, self.rule.describe(), self.value)
    }
}

/// Every constraint violation found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    /// The violations, in section then field order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether any violation is located under `section`.
    pub fn touches(&self, section: Section) -> bool {
        self.violations.iter().any(|v| v.section == section)
    }

    /// Iterate the violations.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.violations.len() == 1 {
            "violation"
        } else {
            "violations"
        };
        write!(f, "{} {}: ", self.violations.len(), noun)?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Run the section's `validator` checks and append its violations to `out`.
fn collect_section<T: Constrained>(section: Section, value: &T, out: &mut Vec<Violation>) {
    let Err(report) = value.validate() else {
        return;
    };

    // (field position, list index, violation)
    let mut found: Vec<(usize, usize, Violation)> = Vec::new();
    for (key, errors) in report.field_errors() {
        let key: &str = &key;
        let position = T::FIELDS
            .iter()
            .position(|field| *field == key)
            .unwrap_or(T::FIELDS.len());
        let secret = T::SECRETS.iter().any(|field| *field == key);

        for error in errors.iter() {
            let Some(rule) = Rule::from_code(&error.code) else {
                warn!(
                    "Unrecognised validation code {:?} on {}.{}",
                    error.code,
                    section.key(),
                    key
                );
                continue;
            };

            match error.params.get("invalid").and_then(Value::as_array) {
                Some(entries) => {
                    for entry in entries {
                        let index = entry
                            .get(0)
                            .and_then(Value::as_u64)
                            .and_then(|index| usize::try_from(index).ok())
                            .unwrap_or_default();
                        found.push((
                            position,
                            index,
                            Violation {
                                section,
                                field: format!("{}.{}[{}]", section.key(), key, index),
                                rule,
                                value: render(entry.get(1), secret),
                            },
                        ));
                    }
                }
                None => found.push((
                    position,
                    0,
                    Violation {
                        section,
                        field: format!("{}.{}", section.key(), key),
                        rule,
                        value: render(error.params.get("value"), secret),
                    },
                )),
            }
        }
    }

    found.sort_by_key(|(position, index, _)| (*position, *index));
    out.extend(found.into_iter().map(|(_, _, violation)| violation));
}

fn render(value: Option<&Value>, secret: bool) -> String {
    let text = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if secret && !text.is_empty() {
        REDACTED.to_string()
    } else {
        text
    }
}

impl Config {
    /// Check every section's constraints, skipping sections listed in `exclude`.
    ///
    /// Excluded sections are not inspected at all, so their values pass even
    /// when malformed. All violations are reported together.
    pub fn validate(&self, exclude: &[Section]) -> Result<(), ValidationErrors> {
        let mut violations = Vec::new();

        for section in Section::ALL {
            if exclude.contains(&section) {
                debug!("Skipping validation of excluded section {}", section);
                continue;
            }
            self.collect_violations(section, &mut violations);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            debug!("Config validation found {} violation(s)", violations.len());
            Err(ValidationErrors { violations })
        }
    }

    /// Like [`Config::validate`], with sections named as strings.
    ///
    /// Names are resolved through [`Section`]'s `FromStr`; an unknown name is an
    /// error rather than silently validating everything.
    pub fn validate_except(&self, names: &[&str]) -> Result<(), ConfigError> {
        let exclude = names
            .iter()
            .map(|name| name.parse::<Section>())
            .collect::<Result<Vec<_>, _>>()?;
        self.validate(&exclude)?;
        Ok(())
    }

    fn collect_violations(&self, section: Section, out: &mut Vec<Violation>) {
        match section {
            Section::Endpoints => collect_section(section, &self.endpoints, out),
            Section::ValDetails => collect_section(section, &self.validator_details, out),
            Section::EnableAlerts => collect_section(section, &self.enable_alerts, out),
            Section::RegularStatusAlerts => {
                collect_section(section, &self.regular_status_alerts, out)
            }
            Section::AlerterPreferences => {
                collect_section(section, &self.alerter_preferences, out)
            }
            Section::AlertingThresholds => {
                collect_section(section, &self.alerting_thresholds, out)
            }
            Section::Scraper => collect_section(section, &self.scraper, out),
            Section::Telegram => collect_section(section, &self.telegram, out),
            Section::SendGrid => collect_section(section, &self.sendgrid, out),
            Section::InfluxDB => collect_section(section, &self.influxdb, out),
        }
    }
}
