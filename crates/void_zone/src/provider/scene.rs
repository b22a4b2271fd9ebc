//! Provider that instantiates catalog resources straight into a scene graph

use super::{AssetProvider, InstantiateRequest, InstantiateResult};
use crate::descriptor::ResourceHandle;
use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use void_scene::{NodeId, SharedScene};

/// Scene provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Worker threads servicing requests (0 = complete inline)
    pub worker_threads: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { worker_threads: 2 }
    }
}

/// Provider counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderStats {
    /// Instances created
    pub instantiated: u64,
    /// Requests that failed
    pub failed: u64,
    /// Instances released
    pub released: u64,
}

struct Shared {
    scene: SharedScene,
    catalog: HashSet<ResourceHandle>,
    stats: Mutex<ProviderStats>,
}

impl Shared {
    fn instantiate(&self, request: InstantiateRequest) {
        if !self.catalog.contains(&request.resource) {
            self.stats.lock().failed += 1;
            let message = format!("unknown resource '{}'", request.resource);
            let _ = request.resolve(InstantiateResult::failed(message));
            return;
        }

        let spawned = self
            .scene
            .write()
            .spawn(request.resource.as_str(), request.pose(), request.parent);

        match spawned {
            Ok(instance) => {
                self.stats.lock().instantiated += 1;
                if request.resolve(InstantiateResult::succeeded(instance)).is_err() {
                    log::debug!("Releasing orphaned instance {}", instance);
                    self.release(instance);
                }
            }
            Err(e) => {
                self.stats.lock().failed += 1;
                let _ = request.resolve(InstantiateResult::failed(e.to_string()));
            }
        }
    }

    fn release(&self, instance: NodeId) {
        if self.scene.write().despawn(instance) {
            self.stats.lock().released += 1;
        } else {
            log::debug!("Release of {} ignored: instance already gone", instance);
        }
    }
}

/// In-process provider backed by a [`SharedScene`].
///
/// Requests for resources in the catalog spawn a node named after the
/// resource; anything else fails. With worker threads, requests complete
/// off the calling thread in whatever order the workers finish them.
pub struct SceneProvider {
    shared: Arc<Shared>,
    jobs: Option<Sender<InstantiateRequest>>,
    workers: Vec<JoinHandle<()>>,
}

impl SceneProvider {
    /// Create a provider for a catalog of resources
    pub fn new<I, R>(scene: SharedScene, catalog: I, config: ProviderConfig) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ResourceHandle>,
    {
        let shared = Arc::new(Shared {
            scene,
            catalog: catalog.into_iter().map(Into::into).collect(),
            stats: Mutex::new(ProviderStats::default()),
        });

        let mut provider = Self {
            shared,
            jobs: None,
            workers: Vec::new(),
        };

        if config.worker_threads > 0 {
            let (tx, rx) = unbounded::<InstantiateRequest>();
            for i in 0..config.worker_threads {
                let rx = rx.clone();
                let shared = provider.shared.clone();
                let spawned = thread::Builder::new()
                    .name(format!("zone-provider-{}", i))
                    .spawn(move || {
                        for request in rx.iter() {
                            shared.instantiate(request);
                        }
                    });
                match spawned {
                    Ok(handle) => provider.workers.push(handle),
                    Err(e) => log::error!("Failed to spawn provider worker {}: {}", i, e),
                }
            }
            if !provider.workers.is_empty() {
                provider.jobs = Some(tx);
            }
        }

        provider
    }

    /// Check if a resource is in the catalog
    pub fn knows(&self, resource: &ResourceHandle) -> bool {
        self.shared.catalog.contains(resource)
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> ProviderStats {
        self.shared.stats.lock().clone()
    }

    /// Number of running workers
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl AssetProvider for SceneProvider {
    fn instantiate(&self, request: InstantiateRequest) {
        match &self.jobs {
            Some(jobs) => {
                if let Err(unsent) = jobs.send(request) {
                    self.shared.instantiate(unsent.into_inner());
                }
            }
            None => self.shared.instantiate(request),
        }
    }

    fn release(&self, instance: NodeId) {
        self.shared.release(instance);
    }
}

impl Drop for SceneProvider {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loops.
        self.jobs.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("Provider worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ResolvedPlacement;
    use crate::provider::{Completion, Generation, InstantiateStatus, RequestId, Ticket};
    use glam::Vec3;
    use void_scene::{Pose, SceneGraph};

    fn request(resource: &str, sender: Sender<Completion>) -> InstantiateRequest {
        let placement = ResolvedPlacement {
            parent: None,
            transform_target: None,
            pose: Pose::from_position(Vec3::new(0.0, 1.0, 0.0)),
        };
        let ticket = Ticket {
            request: RequestId(1),
            generation: Generation(1),
        };
        InstantiateRequest::new(ticket, resource.into(), &placement, sender)
    }

    #[test]
    fn test_inline_instantiate_and_release() {
        let scene = SceneGraph::shared();
        let provider =
            SceneProvider::new(scene.clone(), ["house"], ProviderConfig { worker_threads: 0 });
        let (tx, rx) = unbounded();

        provider.instantiate(request("house", tx));
        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.result.status, InstantiateStatus::Succeeded);

        let instance = completion.result.instance.unwrap();
        assert_eq!(scene.read().name(instance), Some("house"));
        assert!(scene
            .read()
            .world_pose(instance)
            .unwrap()
            .position
            .abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));

        provider.release(instance);
        assert!(!scene.read().is_alive(instance));
        assert_eq!(
            provider.stats(),
            ProviderStats {
                instantiated: 1,
                failed: 0,
                released: 1
            }
        );
    }

    #[test]
    fn test_unknown_resource_fails() {
        let scene = SceneGraph::shared();
        let provider = SceneProvider::new(scene.clone(), ["house"], ProviderConfig { worker_threads: 0 });
        let (tx, rx) = unbounded();

        provider.instantiate(request("castle", tx));
        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.result.status, InstantiateStatus::Failed);
        assert!(scene.read().is_empty());
        assert_eq!(provider.stats().failed, 1);
    }

    #[test]
    fn test_worker_threads_complete_requests() {
        let scene = SceneGraph::shared();
        let provider = SceneProvider::new(scene.clone(), ["a", "b"], ProviderConfig { worker_threads: 2 });
        assert_eq!(provider.worker_count(), 2);
        let (tx, rx) = unbounded();

        provider.instantiate(request("a", tx.clone()));
        provider.instantiate(request("b", tx));

        let mut statuses = Vec::new();
        for _ in 0..2 {
            let completion = rx
                .recv_timeout(std::time::Duration::from_secs(5))
                .unwrap();
            statuses.push(completion.result.status);
        }
        assert!(statuses.iter().all(|s| *s == InstantiateStatus::Succeeded));
        assert_eq!(scene.read().len(), 2);
    }

    #[test]
    fn test_orphaned_instance_released() {
        let scene = SceneGraph::shared();
        let provider =
            SceneProvider::new(scene.clone(), ["house"], ProviderConfig { worker_threads: 0 });
        let (tx, rx) = unbounded();
        drop(rx);

        provider.instantiate(request("house", tx));
        assert!(scene.read().is_empty());
        assert_eq!(provider.stats().instantiated, 1);
        assert_eq!(provider.stats().released, 1);
    }
}
