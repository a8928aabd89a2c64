//! Event sources: discover resources and turn listings into lifecycle events.
//!
//! A source lists the resources in scope, diffs each listing against the
//! previous one and delivers `Added`/`Deleted` events through a channel. Every
//! periodic resync re-delivers `Added` for all live resources.

pub mod cache;
pub mod list_watch;
pub mod manifest;

use std::path::PathBuf;

use crossbeam_channel::Sender;

use crate::error::SourceError;
use crate::event::ResourceEvent;
use crate::resource::Resource;
use crate::selector::LabelSelector;

pub use cache::{ResourceCache, SyncReason};
pub use list_watch::{ListWatchSource, SourceHandle, DEFAULT_RESYNC_INTERVAL};
pub use manifest::ManifestLoader;

/// Manifest directory listing, re-listed on every change below the directory.
pub type ManifestSource = ListWatchSource<ManifestLoader>;

impl ManifestSource {
    pub fn for_directory(manifest_dir: impl Into<PathBuf>, filter: ResourceFilter) -> Self {
        let manifest_dir = manifest_dir.into();
        ListWatchSource::new(ManifestLoader::new(manifest_dir.clone()), filter).watching(manifest_dir)
    }
}

/// Something that can deliver resource events until stopped.
pub trait EventSource {
    fn start(self, events: Sender<ResourceEvent>) -> Result<SourceHandle, SourceError>;
}

/// Produces the full current set of resources.
pub trait ResourceLister: Send + 'static {
    fn list(&self) -> Result<Vec<Resource>, SourceError>;
}

impl<F> ResourceLister for F
where
    F: Fn() -> Result<Vec<Resource>, SourceError> + Send + 'static,
{
    fn list(&self) -> Result<Vec<Resource>, SourceError> {
        self()
    }
}

/// Namespace scope plus label selector.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    /// `None` watches all namespaces.
    pub namespace: Option<String>,
    pub selector: LabelSelector,
}

impl ResourceFilter {
    pub fn new(namespace: Option<String>, selector: LabelSelector) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()),
            selector,
        }
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        if let Some(namespace) = &self.namespace {
            if &resource.id.namespace != namespace {
                return false;
            }
        }
        self.selector.matches(&resource.labels)
    }
}
