//! Host-driven provider: requests wait until the caller finishes them

use super::{AssetProvider, InstantiateRequest, InstantiateResult};
use crate::descriptor::ResourceHandle;
use parking_lot::Mutex;
use std::collections::VecDeque;
use void_scene::{NodeId, SharedScene};

/// Provider that queues requests so the host decides when, and in which
/// order, they complete. Instances are spawned into the scene on `succeed`.
pub struct ManualProvider {
    scene: SharedScene,
    pending: Mutex<VecDeque<InstantiateRequest>>,
    released: Mutex<Vec<NodeId>>,
}

impl ManualProvider {
    /// Create a provider spawning into `scene`
    pub fn new(scene: SharedScene) -> Self {
        Self {
            scene,
            pending: Mutex::new(VecDeque::new()),
            released: Mutex::new(Vec::new()),
        }
    }

    /// Number of requests waiting
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Resources of the waiting requests, in arrival order
    pub fn pending_resources(&self) -> Vec<ResourceHandle> {
        self.pending.lock().iter().map(|r| r.resource.clone()).collect()
    }

    /// Take every waiting request
    pub fn take_requests(&self) -> Vec<InstantiateRequest> {
        self.pending.lock().drain(..).collect()
    }

    /// Take the oldest waiting request for a resource
    pub fn take_request(&self, resource: &ResourceHandle) -> Option<InstantiateRequest> {
        let mut pending = self.pending.lock();
        let position = pending.iter().position(|r| &r.resource == resource)?;
        pending.remove(position)
    }

    /// Spawn the requested instance and report success.
    ///
    /// Returns `None` if the instance could not be spawned, or if the zone that
    /// asked for it is gone (the orphan is despawned).
    pub fn succeed(&self, request: InstantiateRequest) -> Option<NodeId> {
        let spawned = self
            .scene
            .write()
            .spawn(request.resource.as_str(), request.pose(), request.parent);
        match spawned {
            Ok(instance) => match request.resolve(InstantiateResult::succeeded(instance)) {
                Ok(()) => Some(instance),
                Err(_) => {
                    log::debug!("Despawning orphaned instance {}", instance);
                    self.scene.write().despawn(instance);
                    None
                }
            },
            Err(e) => {
                let _ = request.resolve(InstantiateResult::failed(e.to_string()));
                None
            }
        }
    }

    /// Report failure
    pub fn fail(&self, request: InstantiateRequest, message: impl Into<String>) {
        let _ = request.resolve(InstantiateResult::failed(message));
    }

    /// Report cancellation
    pub fn cancel(&self, request: InstantiateRequest) {
        let _ = request.resolve(InstantiateResult::cancelled("cancelled by host"));
    }

    /// Resolve a request with an arbitrary result
    pub fn resolve_with(&self, request: InstantiateRequest, result: InstantiateResult) {
        if let Err(InstantiateResult {
            instance: Some(instance),
            ..
        }) = request.resolve(result)
        {
            self.scene.write().despawn(instance);
        }
    }

    /// Succeed every waiting request in arrival order
    pub fn complete_all(&self) -> usize {
        let requests = self.take_requests();
        let count = requests.len();
        for request in requests {
            self.succeed(request);
        }
        count
    }

    /// Instances released so far
    pub fn released(&self) -> Vec<NodeId> {
        self.released.lock().clone()
    }
}

impl AssetProvider for ManualProvider {
    fn instantiate(&self, request: InstantiateRequest) {
        self.pending.lock().push_back(request);
    }

    fn release(&self, instance: NodeId) {
        self.released.lock().push(instance);
        self.scene.write().despawn(instance);
    }
}
