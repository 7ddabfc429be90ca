//! matic-jagar-config: configuration for the matic-jagar validator monitor
//!
//! This crate loads, structures and validates the configuration consumed by the
//! alerting service (endpoints, validator identity, alert thresholds, scraper
//! intervals and the Telegram, SendGrid and InfluxDB credentials).
//!
//! # Architecture
//!
//! - **Config**: schema, file resolution, multi-format loading and validation
//! - **CLI**: the `jagar-config` operator tool for checking a configuration

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod cli;
pub mod cli_handler;
pub mod config;

pub use config::{Config, ConfigError, ConfigLoader, Section, load_config};
