pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod reconciler;
pub mod resource;
pub mod sanitize;
pub mod selector;
pub mod shutdown;
pub mod source;
pub mod store;

pub use config::{LoaderConfig, LogFormat, LogLevel};
pub use dispatcher::Dispatcher;
pub use error::{
    ConfigError, LoaderError, LoggingError, MetricsError, ReconcileError, Result, SourceError,
};
pub use event::{EventHandler, ResourceEvent};
pub use layout::DashboardLayout;
pub use metrics::{CounterMetrics, NoopMetrics, PrometheusMetrics, ReconcileMetrics};
pub use reconciler::{ReconcileReport, Reconciler};
pub use resource::{Resource, ResourceId};
pub use selector::LabelSelector;
pub use source::{
    EventSource, ListWatchSource, ManifestLoader, ManifestSource, ResourceFilter, SourceHandle,
};
pub use store::{DashboardStore, LocalStore};
