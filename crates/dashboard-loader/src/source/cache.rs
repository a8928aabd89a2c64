use std::collections::BTreeMap;

use crate::event::ResourceEvent;
use crate::resource::{Resource, ResourceId};

/// Why a listing is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReason {
    /// Periodic full resync: every live resource is re-delivered.
    Resync,
    /// Something changed: only new or modified resources are delivered.
    Change,
}

/// Last known set of resources, used to derive events from full listings.
#[derive(Debug, Default)]
pub struct ResourceCache {
    known: BTreeMap<ResourceId, Resource>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.known.contains_key(id)
    }

    /// Replaces the known set with `listing` and returns the events that
    /// describe the transition: deletions first, then additions, each in id order.
    pub fn apply(&mut self, listing: Vec<Resource>, reason: SyncReason) -> Vec<ResourceEvent> {
        let current: BTreeMap<ResourceId, Resource> =
            listing.into_iter().map(|r| (r.id.clone(), r)).collect();

        let mut events: Vec<ResourceEvent> = self
            .known
            .keys()
            .filter(|id| !current.contains_key(*id))
            .cloned()
            .map(ResourceEvent::Deleted)
            .collect();

        for (id, resource) in &current {
            let changed = self.known.get(id) != Some(resource);
            if changed || reason == SyncReason::Resync {
                events.push(ResourceEvent::Added(resource.clone()));
            }
        }

        self.known = current;
        events
    }
}
