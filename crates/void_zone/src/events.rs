//! Zone events and lifecycle hooks

use crate::descriptor::ResourceHandle;
use crate::provider::{InstantiateStatus, RequestId};
use void_scene::NodeId;

/// Something the zone did, queued until the host drains it
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneEvent {
    /// Instantiate request issued
    LoadRequested {
        resource: ResourceHandle,
        request: RequestId,
    },
    /// Completion folded into the registry
    Loaded {
        resource: ResourceHandle,
        instance: NodeId,
    },
    /// Provider did not produce an instance
    LoadFailed {
        resource: ResourceHandle,
        status: InstantiateStatus,
        message: Option<String>,
    },
    /// Completion arrived for a request the zone no longer tracks
    Discarded {
        resource: ResourceHandle,
        request: RequestId,
        instance: Option<NodeId>,
    },
    /// Instance handed back to the provider during unload
    Released {
        resource: ResourceHandle,
        instance: NodeId,
    },
    /// Placement re-applied to a loaded instance
    Refreshed {
        resource: ResourceHandle,
        instance: NodeId,
    },
    /// Descriptor at this position has no resource handle
    MissingResource { index: usize },
}

impl ZoneEvent {
    /// Resource the event concerns, if any
    pub fn resource(&self) -> Option<&ResourceHandle> {
        match self {
            ZoneEvent::LoadRequested { resource, .. }
            | ZoneEvent::Loaded { resource, .. }
            | ZoneEvent::LoadFailed { resource, .. }
            | ZoneEvent::Discarded { resource, .. }
            | ZoneEvent::Released { resource, .. }
            | ZoneEvent::Refreshed { resource, .. } => Some(resource),
            ZoneEvent::MissingResource { .. } => None,
        }
    }
}

/// Summary of one `load_all` pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Requests issued
    pub requested: usize,
    /// Descriptors skipped because a record exists
    pub already_loaded: usize,
    /// Descriptors skipped because a request is outstanding
    pub in_flight: usize,
    /// Descriptors with no resource handle
    pub missing_resource: usize,
}

/// Callback run after a load pass
pub type LoadCycleCallback = Box<dyn Fn(&LoadReport) + Send + Sync>;

/// Callback run after an unload pass with the number of releases
pub type UnloadCycleCallback = Box<dyn Fn(usize) + Send + Sync>;

/// Lifecycle callbacks for a zone
#[derive(Default)]
pub struct ZoneHooks {
    /// Called once per load pass, after all requests are issued
    pub on_load_cycle_complete: Option<LoadCycleCallback>,
    /// Called once per unload pass, after all releases are issued
    pub on_unload_cycle_complete: Option<UnloadCycleCallback>,
}

impl ZoneHooks {
    /// Create empty hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Set load-cycle callback
    pub fn on_load_cycle_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&LoadReport) + Send + Sync + 'static,
    {
        self.on_load_cycle_complete = Some(Box::new(f));
        self
    }

    /// Set unload-cycle callback
    pub fn on_unload_cycle_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_unload_cycle_complete = Some(Box::new(f));
        self
    }

    pub(crate) fn load_cycle_complete(&self, report: &LoadReport) {
        if let Some(ref callback) = self.on_load_cycle_complete {
            callback(report);
        }
    }

    pub(crate) fn unload_cycle_complete(&self, released: usize) {
        if let Some(ref callback) = self.on_unload_cycle_complete {
            callback(released);
        }
    }
}

impl std::fmt::Debug for ZoneHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneHooks")
            .field("on_load_cycle_complete", &self.on_load_cycle_complete.is_some())
            .field("on_unload_cycle_complete", &self.on_unload_cycle_complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_hooks_invoke_callbacks() {
        let loads = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));
        let loads_clone = loads.clone();
        let released_clone = released.clone();

        let hooks = ZoneHooks::new()
            .on_load_cycle_complete(move |report| {
                loads_clone.fetch_add(report.requested, Ordering::SeqCst);
            })
            .on_unload_cycle_complete(move |n| {
                released_clone.fetch_add(n, Ordering::SeqCst);
            });

        hooks.load_cycle_complete(&LoadReport {
            requested: 3,
            ..Default::default()
        });
        hooks.unload_cycle_complete(2);

        assert_eq!(loads.load(Ordering::SeqCst), 3);
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_hooks_are_noops() {
        let hooks = ZoneHooks::new();
        hooks.load_cycle_complete(&LoadReport::default());
        hooks.unload_cycle_complete(0);
    }

    #[test]
    fn test_event_resource() {
        let event = ZoneEvent::Loaded {
            resource: "tower".into(),
            instance: NodeId::new(0, 0),
        };
        assert_eq!(event.resource().map(|r| r.as_str()), Some("tower"));
        assert_eq!(ZoneEvent::MissingResource { index: 2 }.resource(), None);
    }
}
