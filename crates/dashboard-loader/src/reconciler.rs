//! Dashboard reconciler: resource content → files on disk.
//!
//! Every call re-derives the current state from the directory listing, so the
//! reconciler keeps no state between events. A repeated `Added` for the same
//! content is a no-op, which is what lets the periodic resync heal drift.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::error::{EntryFailure, FileOperation, ReconcileError};
use crate::event::EventHandler;
use crate::layout::{is_dashboard_key, DashboardLayout};
use crate::metrics::{EventKind, ReconcileMetrics};
use crate::resource::{Resource, ResourceId};
use crate::store::{DashboardStore, LocalStore};

/// What an add reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Keys whose file was created or rewritten.
    pub written: Vec<String>,
    /// Keys whose file already had the right content.
    pub unchanged: Vec<String>,
    /// Keys ignored because they are not dashboard files.
    pub skipped: Vec<String>,
    /// Stale directory entries that were removed.
    pub removed: Vec<String>,
}

impl ReconcileReport {
    /// True if the call did not touch the filesystem.
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

pub struct Reconciler {
    layout: DashboardLayout,
    metrics: Arc<dyn ReconcileMetrics>,
    store: Arc<dyn DashboardStore>,
}

impl Reconciler {
    pub fn new(layout: DashboardLayout, metrics: Arc<dyn ReconcileMetrics>) -> Self {
        Self {
            layout,
            metrics,
            store: Arc::new(LocalStore),
        }
    }

    /// Replaces the local filesystem with another store.
    pub fn with_store(mut self, store: Arc<dyn DashboardStore>) -> Self {
        self.store = store;
        self
    }

    pub fn layout(&self) -> &DashboardLayout {
        &self.layout
    }

    /// Makes the resource's directory contain exactly its dashboard entries.
    ///
    /// Per-entry failures do not stop the remaining entries; they are collected
    /// into [`ReconcileError::Incomplete`] once everything else is done.
    pub fn reconcile_added(&self, resource: &Resource) -> Result<ReconcileReport, ReconcileError> {
        let id = &resource.id;
        info!(resource = %id, entries = resource.entries.len(), "ConfigMap added");

        let dir = match self.layout.directory_for(id) {
            Ok(dir) => dir,
            Err(source) => {
                error!(resource = %id, error = %source, "Refusing unsafe resource identifier");
                self.metrics.create_error();
                return Err(ReconcileError::InvalidIdentifier {
                    id: id.to_string(),
                    source,
                });
            }
        };

        if let Err(source) = self.store.create_dir_all(&dir) {
            error!(resource = %id, path = %dir.display(), error = %source, "Cannot create dashboard directory");
            self.metrics.create_error();
            return Err(ReconcileError::CreateDirectory { path: dir, source });
        }

        let mut to_remove = match self.store.list(&dir) {
            Ok(names) => names,
            Err(source) => {
                error!(resource = %id, path = %dir.display(), error = %source, "Cannot list dashboards");
                self.metrics.create_error();
                return Err(ReconcileError::ListDirectory { path: dir, source });
            }
        };

        let mut report = ReconcileReport::default();
        let mut failures = Vec::new();

        for (key, content) in &resource.entries {
            if !is_dashboard_key(key) {
                info!(resource = %id, key = %key, "Skipping entry without .json extension");
                report.skipped.push(key.clone());
                continue;
            }

            let path = match self.layout.file_for(id, key) {
                Ok(path) => path,
                Err(e) => {
                    error!(resource = %id, key = %key, error = %e, "Refusing unsafe entry key");
                    self.metrics.create_error();
                    failures.push(EntryFailure {
                        path: dir.clone(),
                        operation: FileOperation::InvalidKey,
                        message: format!("{:?}: {}", key, e),
                    });
                    continue;
                }
            };

            if self.store.content_matches(&path, content) {
                report.unchanged.push(key.clone());
            } else if let Err(e) = self.store.write(&path, content) {
                error!(resource = %id, key = %key, error = %e, "Failed to write dashboard");
                self.metrics.create_error();
                failures.push(EntryFailure {
                    path,
                    operation: FileOperation::Write,
                    message: e.to_string(),
                });
                continue;
            } else {
                report.written.push(key.clone());
            }

            to_remove.remove(&OsString::from(key));
        }

        for name in to_remove {
            let path = dir.join(&name);
            match self.store.remove(&path) {
                Ok(()) => report.removed.push(name.to_string_lossy().into_owned()),
                Err(e) => {
                    error!(resource = %id, path = %path.display(), error = %e, "Failed to remove outdated file");
                    self.metrics.delete_error();
                    failures.push(EntryFailure {
                        path,
                        operation: FileOperation::Remove,
                        message: e.to_string(),
                    });
                }
            }
        }

        if !report.is_noop() {
            info!(
                resource = %id,
                written = report.written.len(),
                removed = report.removed.len(),
                "Dashboards updated"
            );
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(ReconcileError::Incomplete {
                id: id.to_string(),
                failures,
            })
        }
    }

    /// Removes the resource's directory tree.
    ///
    /// Returns `false` if there was nothing to remove.
    pub fn reconcile_deleted(&self, id: &ResourceId) -> Result<bool, ReconcileError> {
        info!(resource = %id, "ConfigMap deleted");

        let dir = match self.layout.directory_for(id) {
            Ok(dir) => dir,
            Err(source) => {
                error!(resource = %id, error = %source, "Refusing unsafe resource identifier");
                self.metrics.delete_error();
                return Err(ReconcileError::InvalidIdentifier {
                    id: id.to_string(),
                    source,
                });
            }
        };

        match self.store.remove(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(resource = %id, "Dashboard directory already absent");
                Ok(false)
            }
            Err(source) => {
                error!(resource = %id, path = %dir.display(), error = %source, "Failed to remove dashboards");
                self.metrics.delete_error();
                Err(ReconcileError::RemoveDirectory { path: dir, source })
            }
        }
    }
}

impl EventHandler for Reconciler {
    fn on_added(&self, resource: &Resource) -> Result<(), ReconcileError> {
        let started = Instant::now();
        let result = self.reconcile_added(resource).map(|_| ());
        self.metrics
            .event_processed(EventKind::Added, result.is_ok(), started.elapsed());
        result
    }

    fn on_deleted(&self, id: &ResourceId) -> Result<(), ReconcileError> {
        let started = Instant::now();
        let result = self.reconcile_deleted(id).map(|_| ());
        self.metrics
            .event_processed(EventKind::Deleted, result.is_ok(), started.elapsed());
        result
    }
}
