//! Runtime configuration and its validation.

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::error::ConfigError;
use crate::sanitize::validate_segment;
use crate::selector::LabelSelector;
use crate::source::DEFAULT_RESYNC_INTERVAL;

pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/dashboards";
pub const DEFAULT_MANIFEST_DIR: &str = "/etc/dashboard-loader/manifests";
pub const DEFAULT_SELECTOR: &str = "grafana-dashboard=true";
pub const DEFAULT_METRICS_ADDR: &str = ":8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a level name, falling back to `Info` for anything unrecognized.
    ///
    /// The flag tells whether the input was recognized.
    pub fn parse_lenient(value: &str) -> (LogLevel, bool) {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => (LogLevel::Debug, true),
            "info" => (LogLevel::Info, true),
            "warn" | "warning" => (LogLevel::Warn, true),
            "error" => (LogLevel::Error, true),
            _ => (LogLevel::Info, false),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable `key=value` lines
    #[default]
    Logfmt,
    /// One JSON object per line
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Logfmt => write!(f, "logfmt"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Root of the dashboard tree.
    pub output_dir: PathBuf,
    /// Directory of ConfigMap manifests to mirror.
    pub manifest_dir: PathBuf,
    /// `None` watches all namespaces.
    pub namespace: Option<String>,
    pub selector: LabelSelector,
    pub metrics_addr: SocketAddr,
    pub resync_interval: Duration,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            manifest_dir: PathBuf::from(DEFAULT_MANIFEST_DIR),
            namespace: None,
            selector: LabelSelector::equals("grafana-dashboard", "true"),
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            resync_interval: DEFAULT_RESYNC_INTERVAL,
            log_level: LogLevel::Info,
            log_format: LogFormat::Logfmt,
        }
    }
}

impl LoaderConfig {
    /// Checks everything that must hold before the loader starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.output_dir.is_dir() {
            return Err(ConfigError::OutputDirMissing(self.output_dir.clone()));
        }
        if !self.manifest_dir.is_dir() {
            return Err(ConfigError::ManifestDirMissing(self.manifest_dir.clone()));
        }
        if self.resync_interval.is_zero() {
            return Err(ConfigError::Validation {
                message: "resync interval must be greater than zero".to_string(),
            });
        }
        if let Some(namespace) = &self.namespace {
            validate_segment("namespace", namespace).map_err(|e| ConfigError::Validation {
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// Parses a listen address. A bare `:port` binds all interfaces.
pub fn parse_listen_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidListenAddr {
        addr: value.to_string(),
        reason,
    };

    let candidate = match value.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => value.to_string(),
    };

    if let Ok(addr) = candidate.parse::<SocketAddr>() {
        return Ok(addr);
    }

    candidate
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("address resolved to nothing".to_string()))
}
