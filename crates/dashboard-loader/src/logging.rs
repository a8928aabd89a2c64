//! Process-wide tracing subscriber.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LogLevel};
use crate::error::LoggingError;

/// Installs the global subscriber and routes `log` records into it.
///
/// `RUST_LOG`, when set and valid, overrides `level`.
pub fn init(level: LogLevel, format: LogFormat) -> Result<(), LoggingError> {
    tracing_log::LogTracer::init()?;

    let filter = build_filter(level);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Logfmt => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_target(false)),
        )?,
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_current_span(false)),
        )?,
    }

    Ok(())
}

fn build_filter(level: LogLevel) -> EnvFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}
