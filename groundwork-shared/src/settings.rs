//! Environment parsing primitives shared by the API server and the CLI.
//!
//! Every loader in this workspace takes a `lookup` closure instead of reading
//! `std::env` directly, so configuration can be built from a plain map in tests:
//!
//! ```
//! use groundwork_shared::settings::{parse_or, Lookup};
//! use std::collections::HashMap;
//!
//! let vars = HashMap::from([("API_PORT".to_string(), "9000".to_string())]);
//! let lookup = |key: &str| vars.get(key).cloned();
//! let port: u16 = parse_or(&lookup, "API_PORT", 8000).unwrap();
//! assert_eq!(port, 9000);
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source of configuration values (usually `std::env::var`)
pub trait Lookup: Fn(&str) -> Option<String> {}

impl<F: Fn(&str) -> Option<String>> Lookup for F {}

/// Reads variables from the process environment
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),

    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(key: &str, value: &str, reason: impl fmt::Display) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Returns the trimmed value of `key`, treating blank values as unset
pub fn get(lookup: &impl Lookup, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Returns the value of `key` or `default`
pub fn get_or(lookup: &impl Lookup, key: &str, default: &str) -> String {
    get(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Returns the value of `key` or fails with [`ConfigError::Missing`]
pub fn require(lookup: &impl Lookup, key: &str) -> Result<String, ConfigError> {
    get(lookup, key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

/// Parses `key` into `T`, falling back to `default` when unset
pub fn parse_or<T>(lookup: &impl Lookup, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(lookup, key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| ConfigError::invalid(key, &raw, e)),
        None => Ok(default),
    }
}

/// Parses a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`)
pub fn parse_bool_or(lookup: &impl Lookup, key: &str, default: bool) -> Result<bool, ConfigError> {
    match get(lookup, key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(key, &raw, "expected a boolean")),
        },
        None => Ok(default),
    }
}

/// Splits a comma-separated variable into trimmed, non-empty items
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Unit for the `*_UNIT` family of variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    pub const fn seconds(self) -> i64 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => 60,
            TimeUnit::Hours => 3_600,
            TimeUnit::Days => 86_400,
            TimeUnit::Weeks => 604_800,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "s" => Ok(TimeUnit::Seconds),
            "minutes" | "minute" | "m" => Ok(TimeUnit::Minutes),
            "hours" | "hour" | "h" => Ok(TimeUnit::Hours),
            "days" | "day" | "d" => Ok(TimeUnit::Days),
            "weeks" | "week" | "w" => Ok(TimeUnit::Weeks),
            other => Err(format!(
                "unknown time unit '{}', expected seconds, minutes, hours, days or weeks",
                other
            )),
        }
    }
}

/// Longest accepted threshold: ten years
pub const MAX_THRESHOLD_SECONDS: i64 = 10 * 365 * 86_400;

/// A duration expressed as `value * unit`, e.g. `ACCESS_UNIT=hours ACCESS_VALUE=1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub unit: TimeUnit,
    pub value: i64,
}

impl Threshold {
    pub const fn new(unit: TimeUnit, value: i64) -> Self {
        Self { unit, value }
    }

    /// Reads `<prefix>_UNIT` and `<prefix>_VALUE`
    pub fn from_lookup(
        lookup: &impl Lookup,
        prefix: &str,
        default: Threshold,
    ) -> Result<Self, ConfigError> {
        let unit = parse_or(lookup, &format!("{}_UNIT", prefix), default.unit)?;
        let value_key = format!("{}_VALUE", prefix);
        let value: i64 = parse_or(lookup, &value_key, default.value)?;
        if value <= 0 {
            return Err(ConfigError::invalid(
                &value_key,
                &value.to_string(),
                "must be a positive number",
            ));
        }
        let threshold = Self { unit, value };
        if threshold.total_seconds() > MAX_THRESHOLD_SECONDS {
            return Err(ConfigError::invalid(
                &value_key,
                &value.to_string(),
                "must not exceed ten years",
            ));
        }
        Ok(threshold)
    }

    fn total_seconds(&self) -> i64 {
        self.value.saturating_mul(self.unit.seconds())
    }

    /// The threshold as a duration, capped at [`MAX_THRESHOLD_SECONDS`]
    pub fn as_duration(&self) -> Duration {
        Duration::seconds(self.total_seconds().clamp(0, MAX_THRESHOLD_SECONDS))
    }

    pub fn as_std(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.as_duration().num_seconds().max(0) as u64)
    }
}
