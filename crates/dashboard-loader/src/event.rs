//! Resource lifecycle events and the handler interface that consumes them.

use crate::error::ReconcileError;
use crate::resource::{Resource, ResourceId};

/// A lifecycle notification delivered by an event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// The resource exists with this content (new, updated or resynced).
    Added(Resource),
    /// The resource no longer exists.
    Deleted(ResourceId),
}

impl ResourceEvent {
    pub fn id(&self) -> &ResourceId {
        match self {
            ResourceEvent::Added(resource) => &resource.id,
            ResourceEvent::Deleted(id) => id,
        }
    }
}

/// Receives events one at a time, in delivery order.
pub trait EventHandler: Send {
    fn on_added(&self, resource: &Resource) -> Result<(), ReconcileError>;

    fn on_deleted(&self, id: &ResourceId) -> Result<(), ReconcileError>;
}

/// Routes one event to the handler. Failures are logged and returned, never fatal.
pub fn dispatch<H: EventHandler + ?Sized>(
    handler: &H,
    event: &ResourceEvent,
) -> Result<(), ReconcileError> {
    let result = match event {
        ResourceEvent::Added(resource) => handler.on_added(resource),
        ResourceEvent::Deleted(id) => handler.on_deleted(id),
    };
    if let Err(e) = &result {
        log::warn!("Event for {} failed: {}", event.id(), e);
    }
    result
}
