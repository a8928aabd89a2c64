use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{
    parse_listen_addr, LoaderConfig, LogFormat, LogLevel, DEFAULT_MANIFEST_DIR,
    DEFAULT_METRICS_ADDR, DEFAULT_OUTPUT_DIR, DEFAULT_SELECTOR,
};
use crate::error::ConfigError;
use crate::selector::LabelSelector;

#[derive(Parser, Debug)]
#[command(name = "dashboard-loader")]
#[command(about = "Mirrors labelled ConfigMaps into a directory of dashboard files")]
#[command(version)]
pub struct Cli {
    /// Directory dashboards are written to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub outdir: PathBuf,

    /// Namespace to watch (all namespaces when empty)
    #[arg(short, long, default_value = "")]
    pub namespace: String,

    /// Label selector ConfigMaps must match
    #[arg(long, default_value = DEFAULT_SELECTOR)]
    pub selector: String,

    /// Address of the Prometheus metrics endpoint
    #[arg(long, default_value = DEFAULT_METRICS_ADDR)]
    pub metrics_addr: String,

    /// Log level: debug, info, warn or error
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Logfmt)]
    pub log_format: LogFormat,

    /// Directory of ConfigMap manifests to mirror
    #[arg(long = "manifests", env = "MANIFEST_DIR", default_value = DEFAULT_MANIFEST_DIR)]
    pub manifest_dir: PathBuf,

    /// Seconds between full resyncs
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub resync_interval: u64,
}

impl Cli {
    /// Returns the raw `--log-level` value if it names no known level.
    pub fn unrecognized_log_level(&self) -> Option<&str> {
        match LogLevel::parse_lenient(&self.log_level) {
            (_, true) => None,
            (_, false) => Some(self.log_level.as_str()),
        }
    }

    pub fn into_config(self) -> Result<LoaderConfig, ConfigError> {
        let (log_level, _) = LogLevel::parse_lenient(&self.log_level);
        let namespace = Some(self.namespace.trim().to_string()).filter(|ns| !ns.is_empty());

        Ok(LoaderConfig {
            output_dir: self.outdir,
            manifest_dir: self.manifest_dir,
            namespace,
            selector: LabelSelector::parse(&self.selector)?,
            metrics_addr: parse_listen_addr(&self.metrics_addr)?,
            resync_interval: Duration::from_secs(self.resync_interval),
            log_level,
            log_format: self.log_format,
        })
    }
}
