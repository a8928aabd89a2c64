use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::sanitize::SegmentError;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Event source error: {0}")]
    Source(#[from] SourceError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// The filesystem operation a per-entry failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Write,
    Remove,
    InvalidKey,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOperation::Write => write!(f, "write"),
            FileOperation::Remove => write!(f, "remove"),
            FileOperation::InvalidKey => write!(f, "invalid key"),
        }
    }
}

/// A single entry that could not be brought in line during an add reconciliation.
#[derive(Error, Debug)]
#[error("{operation} failed for '{path}': {message}")]
pub struct EntryFailure {
    pub path: PathBuf,
    pub operation: FileOperation,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Invalid resource identifier '{id}': {source}")]
    InvalidIdentifier {
        id: String,
        #[source]
        source: SegmentError,
    },

    #[error("Failed to create dashboard directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list dashboard directory '{path}': {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove dashboard directory '{path}': {source}")]
    RemoveDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reconciliation of {id} left {} entries unresolved", .failures.len())]
    Incomplete {
        id: String,
        failures: Vec<EntryFailure>,
    },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Manifest directory not found: {0}")]
    ManifestDirNotFound(PathBuf),

    #[error("Failed to read manifest '{path}': {source}")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest '{path}': {message}")]
    ParseManifest { path: PathBuf, message: String },

    #[error("Invalid ConfigMap {id} in '{path}': {message}")]
    InvalidResource {
        id: String,
        path: PathBuf,
        message: String,
    },

    #[error("Duplicate ConfigMap {id} in '{first}' and '{second}'")]
    DuplicateResource {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Failed to start source runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Event channel closed")]
    ChannelClosed,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Output directory '{0}' does not exist or is not a directory")]
    OutputDirMissing(PathBuf),

    #[error("Manifest directory '{0}' does not exist or is not a directory")]
    ManifestDirMissing(PathBuf),

    #[error("Invalid label selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid listen address '{addr}': {reason}")]
    InvalidListenAddr { addr: String, reason: String },

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Failed to start metrics exporter: {0}")]
    Exporter(#[from] metrics_exporter_prometheus::BuildError),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to bridge log records into tracing: {0}")]
    LogBridge(#[from] log::SetLoggerError),

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub type Result<T> = std::result::Result<T, LoaderError>;
