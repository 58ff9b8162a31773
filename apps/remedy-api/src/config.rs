//! Application configuration.
//!
//! Configuration is loaded from `REMEDY_*` environment variables with
//! fallback to defaults.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `REMEDY_DB_PATH` | `remedy.db` |
//! | `REMEDY_DB_MAX_CONNECTIONS` | `5` |
//! | `REMEDY_UTC_OFFSET_MINUTES` | `300` |
//! | `REMEDY_SHORT_EXPIRY_DAYS` | `30` |
//! | `REMEDY_DEFAULT_PAGE_LIMIT` | `10` |
//! | `REMEDY_STORE_NAME` | `Remedy Pharmacy` |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use remedy_core::pagination::MAX_PAGE_LIMIT;
use remedy_core::period::ReportClock;
use remedy_core::{DEFAULT_SHORT_EXPIRY_DAYS, MAX_EXPIRY_WINDOW_DAYS};
use remedy_db::DbConfig;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Report time zone, minutes east of UTC (300 = +05:00)
    pub utc_offset_minutes: i32,

    /// Days ahead of today that count as short expiry
    pub short_expiry_days: i64,

    /// Page size when a listing request omits `limit`
    pub default_page_limit: u32,

    /// Store name (display only)
    pub store_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from("remedy.db"),
            db_max_connections: 5,
            utc_offset_minutes: 300,
            short_expiry_days: DEFAULT_SHORT_EXPIRY_DAYS,
            default_page_limit: 10,
            store_name: "Remedy Pharmacy".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        AppConfig::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let config = AppConfig {
            db_path: lookup("REMEDY_DB_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),

            db_max_connections: parse(&lookup, "REMEDY_DB_MAX_CONNECTIONS", defaults.db_max_connections)?,

            utc_offset_minutes: parse(&lookup, "REMEDY_UTC_OFFSET_MINUTES", defaults.utc_offset_minutes)?,

            short_expiry_days: parse(&lookup, "REMEDY_SHORT_EXPIRY_DAYS", defaults.short_expiry_days)?,

            default_page_limit: parse(&lookup, "REMEDY_DEFAULT_PAGE_LIMIT", defaults.default_page_limit)?,

            store_name: lookup("REMEDY_STORE_NAME").unwrap_or(defaults.store_name),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("REMEDY_DB_MAX_CONNECTIONS".to_string()));
        }
        if !(0..=MAX_EXPIRY_WINDOW_DAYS).contains(&self.short_expiry_days) {
            return Err(ConfigError::InvalidValue("REMEDY_SHORT_EXPIRY_DAYS".to_string()));
        }
        if self.default_page_limit == 0 || self.default_page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::InvalidValue("REMEDY_DEFAULT_PAGE_LIMIT".to_string()));
        }
        self.report_clock()?;
        Ok(())
    }

    /// The local calendar reports are evaluated in.
    pub fn report_clock(&self) -> Result<ReportClock, ConfigError> {
        ReportClock::from_offset_minutes(self.utc_offset_minutes)
            .map_err(|_| ConfigError::InvalidValue("REMEDY_UTC_OFFSET_MINUTES".to_string()))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path).max_connections(self.db_max_connections)
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.report_clock().unwrap(), ReportClock::from_offset_minutes(300).unwrap());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("REMEDY_DB_PATH", "/var/lib/remedy/store.db"),
            ("REMEDY_DB_MAX_CONNECTIONS", "8"),
            ("REMEDY_UTC_OFFSET_MINUTES", "-240"),
            ("REMEDY_SHORT_EXPIRY_DAYS", " 60 "),
            ("REMEDY_STORE_NAME", "Corner Chemist"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/remedy/store.db"));
        assert_eq!(config.db_max_connections, 8);
        assert_eq!(config.utc_offset_minutes, -240);
        assert_eq!(config.short_expiry_days, 60);
        assert_eq!(config.store_name, "Corner Chemist");
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = from_map(&[("REMEDY_DB_MAX_CONNECTIONS", "many")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for REMEDY_DB_MAX_CONNECTIONS");

        assert!(from_map(&[("REMEDY_UTC_OFFSET_MINUTES", "100000")]).is_err());
        assert!(from_map(&[("REMEDY_DEFAULT_PAGE_LIMIT", "500")]).is_err());
        assert!(from_map(&[("REMEDY_SHORT_EXPIRY_DAYS", "-1")]).is_err());
        assert!(from_map(&[("REMEDY_SHORT_EXPIRY_DAYS", "3650")]).is_ok());
        assert!(from_map(&[("REMEDY_SHORT_EXPIRY_DAYS", "9223372036854775807")]).is_err());
    }
}
