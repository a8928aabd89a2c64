//! Error counters and event metrics for reconciliation.
//!
//! The reconciler reports through the [`ReconcileMetrics`] trait so tests can
//! inspect a local [`CounterMetrics`] while the binary forwards everything to
//! the Prometheus exporter via [`PrometheusMetrics`].

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::MetricsError;

/// Metric names as constants for consistency.
pub mod names {
    pub const CREATE_ERRORS_TOTAL: &str = "dashboard_loader_create_errors_total";
    pub const DELETE_ERRORS_TOTAL: &str = "dashboard_loader_delete_errors_total";
    pub const EVENTS_PROCESSED_TOTAL: &str = "dashboard_loader_events_processed_total";
    pub const EVENT_DURATION_SECONDS: &str = "dashboard_loader_event_duration_seconds";
    pub const BUILD_INFO: &str = "dashboard_loader_build_info";
}

/// The kind of event being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Deleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Added => "added",
            EventKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait ReconcileMetrics: Send + Sync {
    /// A file or directory could not be created or written.
    fn create_error(&self);

    /// A file or directory could not be removed.
    fn delete_error(&self);

    fn event_processed(&self, _kind: EventKind, _success: bool, _elapsed: Duration) {}
}

impl<T: ReconcileMetrics + ?Sized> ReconcileMetrics for Arc<T> {
    fn create_error(&self) {
        (**self).create_error();
    }

    fn delete_error(&self) {
        (**self).delete_error();
    }

    fn event_processed(&self, kind: EventKind, success: bool, elapsed: Duration) {
        (**self).event_processed(kind, success, elapsed);
    }
}

/// No-op sink for unit tests.
pub struct NoopMetrics;

impl ReconcileMetrics for NoopMetrics {
    fn create_error(&self) {}

    fn delete_error(&self) {}
}

/// In-process counters.
#[derive(Debug, Default)]
pub struct CounterMetrics {
    create_errors: AtomicU64,
    delete_errors: AtomicU64,
    events_succeeded: AtomicU64,
    events_failed: AtomicU64,
}

impl CounterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_errors(&self) -> u64 {
        self.create_errors.load(Ordering::Relaxed)
    }

    pub fn delete_errors(&self) -> u64 {
        self.delete_errors.load(Ordering::Relaxed)
    }

    pub fn events_succeeded(&self) -> u64 {
        self.events_succeeded.load(Ordering::Relaxed)
    }

    pub fn events_failed(&self) -> u64 {
        self.events_failed.load(Ordering::Relaxed)
    }
}

impl ReconcileMetrics for CounterMetrics {
    fn create_error(&self) {
        self.create_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn delete_error(&self) {
        self.delete_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn event_processed(&self, _kind: EventKind, success: bool, _elapsed: Duration) {
        if success {
            self.events_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.events_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Forwards to the global `metrics` recorder.
///
/// Without an installed recorder every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    pub fn new() -> Self {
        Self
    }
}

impl ReconcileMetrics for PrometheusMetrics {
    fn create_error(&self) {
        counter!(names::CREATE_ERRORS_TOTAL).increment(1);
    }

    fn delete_error(&self) {
        counter!(names::DELETE_ERRORS_TOTAL).increment(1);
    }

    fn event_processed(&self, kind: EventKind, success: bool, elapsed: Duration) {
        let outcome = if success { "success" } else { "error" };
        counter!(
            names::EVENTS_PROCESSED_TOTAL,
            "kind" => kind.as_str(),
            "outcome" => outcome
        )
        .increment(1);
        histogram!(names::EVENT_DURATION_SECONDS, "kind" => kind.as_str())
            .record(elapsed.as_secs_f64());
    }
}

/// Installs the Prometheus recorder and serves `/metrics` on `addr`.
///
/// Must be called once at startup.
pub fn install_exporter(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(
        names::CREATE_ERRORS_TOTAL,
        "Number of errors while creating dashboard files"
    );
    describe_counter!(
        names::DELETE_ERRORS_TOTAL,
        "Number of errors while deleting dashboard files"
    );
    describe_counter!(
        names::EVENTS_PROCESSED_TOTAL,
        "Number of resource events handled, by kind and outcome"
    );
    describe_histogram!(
        names::EVENT_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time spent reconciling a single event"
    );
    describe_gauge!(names::BUILD_INFO, "Build information");

    // Register the error counters up front so they are scraped as 0.
    counter!(names::CREATE_ERRORS_TOTAL).absolute(0);
    counter!(names::DELETE_ERRORS_TOTAL).absolute(0);
    gauge!(names::BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}
