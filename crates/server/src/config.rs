// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Monitor Configuration
//!
//! This module provides configuration management for the monitor server.
//!
//! ## Configuration Structure
//!
//! - Datasource connection settings and pool sizing
//! - Profiler settings (enabled, required at startup, procedure class)
//! - Patient table name
//! - HTTP bind address
//!
//! ## Example
//!
//! ```yaml
//! datasource:
//!   url: "mysql://localhost:3306/clinic"
//!   username: monitor
//!   password: secret
//! perfmon:
//!   required: false
//! http:
//!   bind: "127.0.0.1:8080"
//! ```
//!
//! Environment variables override file values; see [`MonitorConfig::apply_env`].

use std::net::SocketAddr;
use std::path::Path;

use iris_monitor_perfmon::{DEFAULT_PROCEDURE_CLASS, ProcedureClass, SqlDialect};
use serde::Deserialize;

/// Datasource URL override
pub const ENV_DATASOURCE_URL: &str = "IRIS_MONITOR_DATASOURCE_URL";
/// Datasource username override
pub const ENV_DATASOURCE_USERNAME: &str = "IRIS_MONITOR_DATASOURCE_USERNAME";
/// Datasource password override
pub const ENV_DATASOURCE_PASSWORD: &str = "IRIS_MONITOR_DATASOURCE_PASSWORD";
/// Profiler on/off override
pub const ENV_PERFMON_ENABLED: &str = "IRIS_MONITOR_PERFMON_ENABLED";
/// HTTP bind address override
pub const ENV_HTTP_BIND: &str = "IRIS_MONITOR_HTTP_BIND";

/// Database connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataSourceConfig {
    /// Connection URL, e.g. `mysql://host:3306/db`
    pub url: String,

    /// Username spliced into the URL when it carries none
    pub username: Option<String>,

    /// Password spliced into the URL when it carries none
    pub password: Option<String>,

    /// Maximum number of connections in each pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl DataSourceConfig {
    /// SQL dialect derived from the URL scheme
    pub fn dialect(&self) -> Result<SqlDialect, ConfigError> {
        SqlDialect::from_url(&self.url).map_err(|e| ConfigError::InvalidDatasourceUrl {
            reason: e.to_string(),
        })
    }

    /// URL with configured credentials applied
    ///
    /// Credentials already present in the URL win over `username`/`password`.
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        let (scheme, rest) =
            self.url
                .split_once("://")
                .ok_or_else(|| ConfigError::InvalidDatasourceUrl {
                    reason: "Missing protocol (e.g., mysql://, postgres://)".to_string(),
                })?;

        let authority = rest.split('/').next().unwrap_or_default();
        let Some(username) = self.username.as_deref().filter(|_| !authority.contains('@'))
        else {
            return Ok(self.url.clone());
        };

        let credentials = match self.password.as_deref() {
            Some(password) => format!("{}:{}", encode_userinfo(username), encode_userinfo(password)),
            None => encode_userinfo(username),
        };
        Ok(format!("{}://{}@{}", scheme, credentials, rest))
    }
}

/// Percent-encode everything outside RFC 3986 unreserved characters
fn encode_userinfo(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Profiler settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerfmonConfig {
    /// Profile lookups at all
    pub enabled: bool,

    /// Fail startup when the profiler cannot be reached
    ///
    /// When false, an unreachable profiler is replaced by a no-op backend.
    pub required: bool,

    /// Engine class exposing `start`, `generateReport` and `stop`
    pub procedure_class: String,

    /// Timeout for each profiler call in seconds
    pub call_timeout_secs: u64,
}

impl Default for PerfmonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            required: true,
            procedure_class: DEFAULT_PROCEDURE_CLASS.to_string(),
            call_timeout_secs: 5,
        }
    }
}

/// Patient lookup settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatientConfig {
    /// Table holding patient records, optionally schema-qualified
    pub table: String,
}

impl Default for PatientConfig {
    fn default() -> Self {
        Self {
            table: "patient".to_string(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Main monitor configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub datasource: DataSourceConfig,
    pub perfmon: PerfmonConfig,
    pub patient: PatientConfig,
    pub http: HttpConfig,
}

impl MonitorConfig {
    /// Parse a YAML document; absent sections use defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Apply overrides from an environment lookup
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATASOURCE_URL) {
            self.datasource.url = url;
        }
        if let Some(username) = lookup(ENV_DATASOURCE_USERNAME) {
            self.datasource.username = Some(username);
        }
        if let Some(password) = lookup(ENV_DATASOURCE_PASSWORD) {
            self.datasource.password = Some(password);
        }
        if let Some(enabled) = lookup(ENV_PERFMON_ENABLED) {
            self.perfmon.enabled = parse_bool(&enabled).ok_or_else(|| ConfigError::InvalidEnv {
                key: ENV_PERFMON_ENABLED,
                reason: format!("expected true/false, got '{}'", enabled),
            })?;
        }
        if let Some(bind) = lookup(ENV_HTTP_BIND) {
            self.http.bind = bind.parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_HTTP_BIND,
                reason: format!("expected host:port, got '{}'", bind),
            })?;
        }
        Ok(())
    }

    /// Validate the configuration
    ///
    /// Checks that:
    /// - The datasource URL is present and uses a supported scheme
    /// - Pool settings are reasonable
    /// - The procedure class and patient table are valid identifiers
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datasource.url.is_empty() {
            return Err(ConfigError::MissingDatasourceUrl);
        }
        self.datasource.dialect()?;

        let pool = &self.datasource;
        if pool.max_connections == 0 {
            return Err(ConfigError::InvalidPoolConfig {
                reason: "max_connections must be > 0".to_string(),
            });
        }
        if pool.min_connections > pool.max_connections {
            return Err(ConfigError::InvalidPoolConfig {
                reason: "min_connections cannot exceed max_connections".to_string(),
            });
        }
        if pool.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidPoolConfig {
                reason: "connect_timeout_secs must be > 0".to_string(),
            });
        }
        if pool.idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidPoolConfig {
                reason: "idle_timeout_secs must be > 0".to_string(),
            });
        }

        ProcedureClass::parse(&self.perfmon.procedure_class).map_err(|e| {
            ConfigError::InvalidPerfmonConfig {
                reason: e.to_string(),
            }
        })?;
        if self.perfmon.call_timeout_secs == 0 {
            return Err(ConfigError::InvalidPerfmonConfig {
                reason: "call_timeout_secs must be > 0".to_string(),
            });
        }

        iris_monitor_patient::live::validate_table_name(&self.patient.table).map_err(|e| {
            ConfigError::InvalidPatientConfig {
                reason: e.to_string(),
            }
        })?;

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Missing datasource URL
    #[error("Datasource url is required (set datasource.url or IRIS_MONITOR_DATASOURCE_URL)")]
    MissingDatasourceUrl,

    /// Invalid datasource URL
    #[error("Invalid datasource url: {reason}")]
    InvalidDatasourceUrl { reason: String },

    /// Invalid pool configuration
    #[error("Invalid pool configuration: {reason}")]
    InvalidPoolConfig { reason: String },

    /// Invalid profiler configuration
    #[error("Invalid perfmon configuration: {reason}")]
    InvalidPerfmonConfig { reason: String },

    /// Invalid patient configuration
    #[error("Invalid patient configuration: {reason}")]
    InvalidPatientConfig { reason: String },

    /// Unparseable environment override
    #[error("Invalid value for {key}: {reason}")]
    InvalidEnv { key: &'static str, reason: String },

    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
