use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use dashboard_loader::cli::Cli;
use dashboard_loader::metrics::install_exporter;
use dashboard_loader::source::EventSource;
use dashboard_loader::{
    logging, shutdown, DashboardLayout, Dispatcher, LoaderConfig, ManifestSource, PrometheusMetrics,
    Reconciler, ResourceFilter, Result,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let unrecognized_level = cli.unrecognized_log_level().map(str::to_string);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(config.log_level, config.log_format) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Some(level) = unrecognized_level {
        warn!(level = %level, "Unrecognized log level, falling back to info");
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "dashboard-loader failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: LoaderConfig) -> Result<()> {
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        outdir = %config.output_dir.display(),
        manifests = %config.manifest_dir.display(),
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        selector = %config.selector,
        "Starting dashboard-loader"
    );

    let stop_rx = shutdown::install_stop_handler()?;
    install_exporter(config.metrics_addr)?;

    let reconciler = Reconciler::new(
        DashboardLayout::new(&config.output_dir),
        Arc::new(PrometheusMetrics::new()),
    );

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let dispatcher = Dispatcher::start(reconciler, event_rx);

    let filter = ResourceFilter::new(config.namespace.clone(), config.selector.clone());
    let source = ManifestSource::for_directory(&config.manifest_dir, filter)
        .with_resync_interval(config.resync_interval);
    let handle = match source.start(event_tx) {
        Ok(handle) => handle,
        Err(e) => {
            dispatcher.stop();
            dispatcher.wait();
            return Err(e.into());
        }
    };

    let _ = stop_rx.recv();
    info!("Shutdown signal received");

    handle.stop();
    dispatcher.stop();
    let handled = dispatcher.wait();

    info!(events = handled, "dashboard-loader stopped");
    Ok(())
}
