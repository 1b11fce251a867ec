//! Configuration management for Juicesync
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files, with a fallback reader for the older
//! `key = value` files used by earlier gateway deployments.

use crate::error::{JuicesyncError, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;
mod legacy;

pub use legacy::parse_key_value;

/// Legacy JuiceNet settings: `api_key`, `location_general`, `location_specific`
pub const LEGACY_JUICENET_CONF: &str = "/etc/swarm-gateway/juicenet.conf";
/// Legacy InfluxDB settings: `url`, `port`, `username`, `password`, `database`
pub const LEGACY_INFLUX_CONF: &str = "/etc/swarm-gateway/influx.conf";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// JuiceNet cloud API access
    pub juicenet: JuicenetConfig,

    /// InfluxDB write target
    pub influx: InfluxConfig,

    /// Location tags attached to every record
    pub location: LocationConfig,

    /// Session history processing
    pub history: HistoryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// JuiceNet API parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JuicenetConfig {
    /// Account API token
    pub api_key: String,

    /// API base URL
    pub base_url: String,

    /// Identifier this client reports as `device_id` in every request
    pub client_device_id: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Sample-count hint sent with `get_plot`; large enough to get full density
    pub plot_intervals: u32,
}

/// InfluxDB 1.x connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    /// Server host name
    pub host: String,

    /// TCP port
    pub port: u16,

    pub username: String,
    pub password: String,

    /// Target database
    pub database: String,

    /// Use HTTPS
    pub ssl: bool,

    /// Gzip request bodies
    pub gzip: bool,

    /// Verify the server certificate when using HTTPS
    pub verify_ssl: bool,
}

/// Location tags
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LocationConfig {
    pub general: String,
    pub specific: String,
}

/// Session history processing options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// IANA zone the charger reports its wall-clock timestamps in
    pub timezone: String,

    /// Sessions closer than this many seconds are merged
    pub max_gap_seconds: i64,

    /// File holding the last processed session end
    pub checkpoint_file: String,

    /// Fetch and emit per-second power samples for every new session
    pub fetch_power_samples: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (its directory receives the rolling files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to write the rolling log file
    pub file_output: bool,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "juicesync.yaml",
            "/data/juicesync.yaml",
            "/etc/juicesync/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Build a configuration from the legacy `key = value` files
    pub fn from_legacy_files<P: AsRef<Path>, Q: AsRef<Path>>(
        juicenet_path: P,
        influx_path: Q,
    ) -> Result<Self> {
        let juicenet = parse_key_value(&std::fs::read_to_string(juicenet_path)?);
        let influx = parse_key_value(&std::fs::read_to_string(influx_path)?);
        legacy::config_from_maps(&juicenet, &influx)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Zone used to reinterpret device-local timestamps
    pub fn source_zone(&self) -> Result<Tz> {
        self.history.timezone.parse::<Tz>().map_err(|e| {
            JuicesyncError::validation("history.timezone", format!("{}", e))
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.juicenet.api_key.trim().is_empty() {
            return Err(JuicesyncError::validation(
                "juicenet.api_key",
                "API key cannot be empty",
            ));
        }

        if self.juicenet.base_url.trim().is_empty() {
            return Err(JuicesyncError::validation(
                "juicenet.base_url",
                "Base URL cannot be empty",
            ));
        }

        if self.influx.host.trim().is_empty() {
            return Err(JuicesyncError::validation(
                "influx.host",
                "Host cannot be empty",
            ));
        }

        if self.influx.port == 0 {
            return Err(JuicesyncError::validation(
                "influx.port",
                "Port must be greater than 0",
            ));
        }

        if self.influx.database.trim().is_empty() {
            return Err(JuicesyncError::validation(
                "influx.database",
                "Database cannot be empty",
            ));
        }

        if self.history.max_gap_seconds <= 0 {
            return Err(JuicesyncError::validation(
                "history.max_gap_seconds",
                "Must be positive",
            ));
        }

        self.source_zone()?;

        Ok(())
    }
}
