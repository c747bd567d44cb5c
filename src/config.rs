//! Configuration file management for certscan.
//!
//! Settings are merged from three places, later ones winning:
//!
//! 1. Default values
//! 2. Configuration file (`certscan.toml` or the path given with `--config`)
//! 3. Command-line arguments
//!
//! # Example Configuration File
//!
//! ```toml
//! hosts_file = "websites.yml"
//! port = 443
//! timeout_secs = 30
//! log_file = "logs/ssl_certificate.log"
//! log_level = "info"
//! report_dir = "ssl_serializations"
//! certificates_dir = "ssl_certificates"
//! output = "summary"
//!
//! [prometheus]
//! enabled = false
//! address = "http://localhost:9091"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use strum_macros::{Display, EnumString};

use crate::DEFAULT_PORT;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "certscan.toml";

/// What to print on stdout once a batch is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Table of scanned hosts
    Summary,
    /// The JSON report
    Json,
    /// Nothing beyond the log
    Quiet,
}

/// Main configuration structure.
///
/// All fields are optional to support partial configuration and merging.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// YAML list of hostnames to scan; rewritten deduplicated on each run
    pub hosts_file: Option<String>,
    /// Port used for every host
    pub port: Option<u16>,
    /// Connect, read and write timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Append-only log file mirrored from the console
    pub log_file: Option<String>,
    /// Log filter directive, e.g. "info" or "certscan=debug"
    pub log_level: Option<String>,
    /// Directory receiving the JSON report
    pub report_dir: Option<String>,
    /// Directory receiving the certificate details and failure logs
    pub certificates_dir: Option<String>,
    /// Console output: summary, json, quiet
    pub output: Option<String>,
    /// Prometheus configuration
    pub prometheus: Option<PrometheusConfig>,
}

/// Prometheus Push Gateway settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PrometheusConfig {
    /// Push batch totals after the run
    pub enabled: Option<bool>,
    /// Push gateway address (e.g., "http://localhost:9091")
    pub address: Option<String>,
}

impl Default for Config {
    /// # Default Values
    ///
    /// - `hosts_file`: "websites.yml"
    /// - `port`: 443
    /// - `timeout_secs`: 30
    /// - `log_file`: "logs/ssl_certificate.log"
    /// - `log_level`: "info"
    /// - `report_dir`: "ssl_serializations"
    /// - `certificates_dir`: "ssl_certificates"
    /// - `output`: "summary"
    /// - `prometheus.enabled`: false
    /// - `prometheus.address`: "http://localhost:9091"
    fn default() -> Self {
        Config {
            hosts_file: Some("websites.yml".to_string()),
            port: Some(DEFAULT_PORT),
            timeout_secs: Some(30),
            log_file: Some("logs/ssl_certificate.log".to_string()),
            log_level: Some("info".to_string()),
            report_dir: Some("ssl_serializations".to_string()),
            certificates_dir: Some("ssl_certificates".to_string()),
            output: Some("summary".to_string()),
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".to_string()),
            }),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully parsed configuration
    /// * `Err(ConfigError::Io)` - File could not be read
    /// * `Err(ConfigError::Parse)` - File contains invalid TOML
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use certscan::config::Config;
    /// let config = Config::from_file("certscan.toml")?;
    /// # Ok::<(), certscan::config::ConfigError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Merges this configuration with another, prioritizing the other's values.
    ///
    /// ```
    /// # use certscan::config::Config;
    /// let file_config = Config::from_file("certscan.toml").unwrap_or_else(|_| Config::empty());
    /// let merged = Config::default().merge_with(file_config);
    /// assert!(merged.port.is_some());
    /// ```
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.hosts_file.is_some() {
            self.hosts_file = other.hosts_file;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.log_file.is_some() {
            self.log_file = other.log_file;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.report_dir.is_some() {
            self.report_dir = other.report_dir;
        }
        if other.certificates_dir.is_some() {
            self.certificates_dir = other.certificates_dir;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if let Some(other_prom) = other.prometheus {
            if let Some(ref mut self_prom) = self.prometheus {
                if other_prom.enabled.is_some() {
                    self_prom.enabled = other_prom.enabled;
                }
                if other_prom.address.is_some() {
                    self_prom.address = other_prom.address;
                }
            } else {
                self.prometheus = Some(other_prom);
            }
        }
        self
    }

    /// A configuration with every field unset, the identity for `merge_with`.
    pub fn empty() -> Self {
        Config {
            hosts_file: None,
            port: None,
            timeout_secs: None,
            log_file: None,
            log_level: None,
            report_dir: None,
            certificates_dir: None,
            output: None,
            prometheus: None,
        }
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Only provided arguments (Some values) override other configurations.
    pub fn from_cli_args(
        hosts_file: Option<String>,
        port: Option<u16>,
        timeout_secs: Option<u64>,
        output: Option<String>,
        prometheus: Option<bool>,
        prometheus_address: Option<String>,
    ) -> Self {
        let prometheus = if prometheus.is_some() || prometheus_address.is_some() {
            Some(PrometheusConfig {
                enabled: prometheus,
                address: prometheus_address,
            })
        } else {
            None
        };
        Config {
            hosts_file,
            port,
            timeout_secs,
            output,
            prometheus,
            ..Config::empty()
        }
    }

    /// Checks values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == Some(0) {
            return Err(ConfigError::Validation("port must be greater than 0".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(output) = &self.output {
            OutputFormat::from_str(output).map_err(|_| {
                ConfigError::Validation(format!(
                    "unknown output '{}', expected summary, json or quiet",
                    output
                ))
            })?;
        }
        Ok(())
    }

    pub fn hosts_file(&self) -> &str {
        self.hosts_file.as_deref().unwrap_or("websites.yml")
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }

    pub fn log_file(&self) -> &str {
        self.log_file.as_deref().unwrap_or("logs/ssl_certificate.log")
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn report_dir(&self) -> &str {
        self.report_dir.as_deref().unwrap_or("ssl_serializations")
    }

    pub fn certificates_dir(&self) -> &str {
        self.certificates_dir.as_deref().unwrap_or("ssl_certificates")
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output
            .as_deref()
            .and_then(|o| OutputFormat::from_str(o).ok())
            .unwrap_or(OutputFormat::Summary)
    }

    /// Push gateway address when Prometheus export is enabled.
    pub fn prometheus_address(&self) -> Option<&str> {
        let prometheus = self.prometheus.as_ref()?;
        if prometheus.enabled.unwrap_or(false) {
            Some(
                prometheus
                    .address
                    .as_deref()
                    .unwrap_or("http://localhost:9091"),
            )
        } else {
            None
        }
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            hosts_file: Some("websites.yml".to_string()),
            port: Some(443),
            timeout_secs: Some(10),
            log_file: Some("logs/ssl_certificate.log".to_string()),
            log_level: Some("info".to_string()),
            report_dir: Some("ssl_serializations".to_string()),
            certificates_dir: Some("ssl_certificates".to_string()),
            output: Some("summary".to_string()),
            prometheus: Some(PrometheusConfig {
                enabled: Some(true),
                address: Some("http://localhost:9091".to_string()),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
    /// Validation error (invalid values)
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
