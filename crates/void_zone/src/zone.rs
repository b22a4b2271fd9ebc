//! The zone loader: registry, orchestrators and completion reconciler
//!
//! All registry mutation happens on the thread that owns the [`ZoneLoader`].
//! Providers finish requests wherever they like; their completions are queued
//! on a channel and folded in by [`ZoneLoader::process_completions`], which
//! every entry point runs first.

use crate::config::ZoneConfig;
use crate::descriptor::{
    DescriptorSet, LoadableDescriptor, PlacementSpec, ResolvedPlacement, ResourceHandle,
};
use crate::error::Result;
use crate::events::{LoadReport, ZoneEvent, ZoneHooks};
use crate::layer::{Layer, LayerMask};
use crate::provider::{
    AssetProvider, Completion, Generation, InstantiateRequest, InstantiateResult,
    InstantiateStatus, RequestId, Ticket,
};
use crate::record::{LoadRecord, Registry};
use crate::scene_access::SceneAccess;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Coarse state of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneStatus {
    /// Disabled
    Inactive,
    /// Nothing loaded or requested
    Empty,
    /// At least one request outstanding
    Loading,
    /// Resources loaded, nothing outstanding
    Loaded,
}

/// Zone counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneStats {
    /// Instantiate requests issued
    pub requests_issued: u64,
    /// Completions appended to the registry
    pub loads_completed: u64,
    /// Completions without an instance
    pub loads_failed: u64,
    /// Stale completions dropped
    pub completions_discarded: u64,
    /// Instances released during unload
    pub releases_issued: u64,
    /// Records re-placed by refresh
    pub refreshes_applied: u64,
    /// Load passes run
    pub load_passes: u64,
    /// Unload passes run
    pub unload_passes: u64,
    /// Descriptors reported without a resource handle
    pub missing_resources: u64,
}

/// Bookkeeping for an outstanding request
#[derive(Debug, Clone)]
struct InFlight {
    resource: ResourceHandle,
    placement: ResolvedPlacement,
    generation: Generation,
}

/// Trigger-driven loader for a set of resources.
///
/// Loads every declared resource when a collidable actor enters, releases
/// them when it leaves, and keeps at most one record (or one outstanding
/// request) per resource handle.
pub struct ZoneLoader {
    config: ZoneConfig,
    descriptors: DescriptorSet,
    registry: Registry,
    in_flight: HashMap<RequestId, InFlight>,
    in_flight_resources: HashSet<ResourceHandle>,
    provider: Arc<dyn AssetProvider>,
    scene: Arc<dyn SceneAccess>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    active: bool,
    generation: Generation,
    next_request: u64,
    events: Vec<ZoneEvent>,
    stats: ZoneStats,
    hooks: ZoneHooks,
}

impl ZoneLoader {
    /// Create an active zone with no descriptors
    pub fn new(
        config: ZoneConfig,
        provider: Arc<dyn AssetProvider>,
        scene: Arc<dyn SceneAccess>,
    ) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        Self {
            config,
            descriptors: DescriptorSet::new(),
            registry: Registry::new(),
            in_flight: HashMap::new(),
            in_flight_resources: HashSet::new(),
            provider,
            scene,
            completion_tx,
            completion_rx,
            active: true,
            generation: Generation(1),
            next_request: 1,
            events: Vec::new(),
            stats: ZoneStats::default(),
            hooks: ZoneHooks::new(),
        }
    }

    /// Set the descriptor list, rejecting duplicate resource handles
    pub fn with_descriptors(mut self, descriptors: Vec<LoadableDescriptor>) -> Result<Self> {
        self.set_descriptors(descriptors)?;
        Ok(self)
    }

    /// Set lifecycle hooks
    pub fn with_hooks(mut self, hooks: ZoneHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set the load-cycle hook
    pub fn on_load_cycle_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&LoadReport) + Send + Sync + 'static,
    {
        self.hooks = std::mem::take(&mut self.hooks).on_load_cycle_complete(f);
        self
    }

    /// Set the unload-cycle hook
    pub fn on_unload_cycle_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.hooks = std::mem::take(&mut self.hooks).on_unload_cycle_complete(f);
        self
    }

    // ---- Descriptors ----

    /// Replace the descriptor list. Takes effect on the next load or refresh.
    pub fn set_descriptors(&mut self, descriptors: Vec<LoadableDescriptor>) -> Result<()> {
        match DescriptorSet::from_descriptors(descriptors) {
            Ok(set) => {
                self.descriptors = set;
                Ok(())
            }
            Err(e) => {
                log::error!("Zone '{}': {}", self.config.name, e);
                Err(e)
            }
        }
    }

    /// Append a descriptor
    pub fn add_descriptor(&mut self, descriptor: LoadableDescriptor) -> Result<()> {
        self.descriptors.push(descriptor)
    }

    /// Remove the descriptor for a resource. Its record, if any, stays loaded.
    pub fn remove_descriptor(&mut self, resource: &ResourceHandle) -> Option<LoadableDescriptor> {
        self.descriptors.remove(resource)
    }

    /// Edit the placement of a descriptor between cycles
    pub fn placement_mut(&mut self, resource: &ResourceHandle) -> Option<&mut PlacementSpec> {
        self.descriptors.placement_mut(resource)
    }

    /// Declared descriptors
    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    // ---- Completion reconciler ----

    /// Fold every queued completion into the registry. Returns how many were handled.
    pub fn process_completions(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.reconcile(completion);
            handled += 1;
        }
        handled
    }

    fn reconcile(&mut self, completion: Completion) {
        let Completion {
            ticket,
            resource,
            result,
        } = completion;

        let entry = match self.in_flight.remove(&ticket.request) {
            Some(entry) => {
                self.in_flight_resources.remove(&entry.resource);
                entry
            }
            None => {
                self.discard(ticket, resource, result);
                return;
            }
        };

        if !self.active || entry.generation != self.generation || ticket.generation != self.generation {
            self.discard(ticket, entry.resource, result);
            return;
        }

        match (result.status, result.instance) {
            (InstantiateStatus::Succeeded, Some(instance)) => {
                let record = LoadRecord {
                    resource: entry.resource.clone(),
                    instance,
                    placement: entry.placement,
                };
                match self.registry.insert(record) {
                    Ok(()) => {
                        log::debug!(
                            "Zone '{}': loaded '{}' as {}",
                            self.config.name,
                            entry.resource,
                            instance
                        );
                        self.stats.loads_completed += 1;
                        self.events.push(ZoneEvent::Loaded {
                            resource: entry.resource,
                            instance,
                        });
                    }
                    Err(duplicate) => {
                        log::warn!(
                            "Zone '{}': '{}' already loaded, releasing duplicate {}",
                            self.config.name,
                            duplicate.resource,
                            duplicate.instance
                        );
                        self.provider.release(duplicate.instance);
                        self.stats.completions_discarded += 1;
                        self.events.push(ZoneEvent::Discarded {
                            resource: duplicate.resource,
                            request: ticket.request,
                            instance: Some(duplicate.instance),
                        });
                    }
                }
            }
            (status, _) => {
                log::warn!(
                    "Zone '{}': instantiate of '{}' ended {:?}{}",
                    self.config.name,
                    entry.resource,
                    status,
                    result
                        .message
                        .as_deref()
                        .map(|m| format!(": {}", m))
                        .unwrap_or_default()
                );
                self.stats.loads_failed += 1;
                self.events.push(ZoneEvent::LoadFailed {
                    resource: entry.resource,
                    status,
                    message: result.message,
                });
            }
        }
    }

    fn discard(&mut self, ticket: Ticket, resource: ResourceHandle, result: InstantiateResult) {
        log::debug!(
            "Zone '{}': discarding stale completion {} for '{}' ({:?})",
            self.config.name,
            ticket.request,
            resource,
            result.status
        );
        if let Some(instance) = result.instance {
            self.provider.release(instance);
        }
        self.stats.completions_discarded += 1;
        self.events.push(ZoneEvent::Discarded {
            resource,
            request: ticket.request,
            instance: result.instance,
        });
    }

    // ---- Load orchestrator ----

    /// Request every declared resource that is neither loaded nor in flight
    pub fn load_all(&mut self) -> LoadReport {
        self.process_completions();

        if !self.active {
            log::warn!("Zone '{}': load ignored, zone is disabled", self.config.name);
            return LoadReport::default();
        }
        if self.descriptors.is_empty() {
            log::info!("Zone '{}': no descriptors to load", self.config.name);
            return LoadReport::default();
        }

        let mut report = LoadReport::default();
        let descriptors: Vec<LoadableDescriptor> = self.descriptors.iter().cloned().collect();

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            let Some(resource) = descriptor.resource else {
                log::error!(
                    "Zone '{}': descriptor {} has no resource handle, skipping",
                    self.config.name,
                    index
                );
                report.missing_resource += 1;
                self.stats.missing_resources += 1;
                self.events.push(ZoneEvent::MissingResource { index });
                continue;
            };

            if self.registry.contains(&resource) {
                log::debug!("Zone '{}': '{}' already loaded", self.config.name, resource);
                report.already_loaded += 1;
                continue;
            }
            if self.in_flight_resources.contains(&resource) {
                log::debug!("Zone '{}': '{}' already in flight", self.config.name, resource);
                report.in_flight += 1;
                continue;
            }

            let placement = descriptor.placement.resolve(self.scene.as_ref());
            self.issue(resource, placement);
            report.requested += 1;
        }

        self.stats.load_passes += 1;
        log::info!(
            "Zone '{}': load pass requested {} ({} loaded, {} in flight, {} missing)",
            self.config.name,
            report.requested,
            report.already_loaded,
            report.in_flight,
            report.missing_resource
        );
        self.hooks.load_cycle_complete(&report);
        report
    }

    fn issue(&mut self, resource: ResourceHandle, placement: ResolvedPlacement) {
        let request = RequestId(self.next_request);
        self.next_request += 1;
        let ticket = Ticket {
            request,
            generation: self.generation,
        };

        self.in_flight.insert(
            request,
            InFlight {
                resource: resource.clone(),
                placement,
                generation: self.generation,
            },
        );
        self.in_flight_resources.insert(resource.clone());
        self.stats.requests_issued += 1;
        self.events.push(ZoneEvent::LoadRequested {
            resource: resource.clone(),
            request,
        });

        log::debug!(
            "Zone '{}': requesting '{}' {} at {:?}",
            self.config.name,
            resource,
            request,
            placement.position()
        );
        let req = InstantiateRequest::new(ticket, resource, &placement, self.completion_tx.clone());
        self.provider.instantiate(req);
    }

    // ---- Unload orchestrator ----

    /// Release every loaded instance and clear the registry. Returns the number released.
    ///
    /// Outstanding requests are kept; their completions still land while the
    /// zone stays active.
    pub fn unload_all(&mut self) -> usize {
        self.process_completions();
        self.release_all()
    }

    fn release_all(&mut self) -> usize {
        if self.registry.is_empty() {
            log::info!("Zone '{}': nothing to unload", self.config.name);
            return 0;
        }

        let records = self.registry.take_all();
        let released = records.len();
        for record in records {
            log::debug!(
                "Zone '{}': releasing '{}' ({})",
                self.config.name,
                record.resource,
                record.instance
            );
            self.provider.release(record.instance);
            self.events.push(ZoneEvent::Released {
                resource: record.resource,
                instance: record.instance,
            });
        }

        self.stats.releases_issued += released as u64;
        self.stats.unload_passes += 1;
        log::info!("Zone '{}': released {} instance(s)", self.config.name, released);
        self.hooks.unload_cycle_complete(released);
        released
    }

    // ---- Refresh ----

    /// Re-apply current descriptor placement to every loaded instance.
    ///
    /// Records whose descriptor was removed, or whose instance is gone, are
    /// skipped. Returns the number of records re-placed.
    pub fn refresh(&mut self) -> usize {
        self.process_completions();

        if self.registry.is_empty() {
            log::info!("Zone '{}': nothing to refresh", self.config.name);
            return 0;
        }

        let name = &self.config.name;
        let scene = self.scene.as_ref();
        let descriptors = &self.descriptors;
        let mut refreshed = Vec::new();

        for record in self.registry.iter_mut() {
            let Some(spec) = descriptors.placement(&record.resource) else {
                log::debug!("Zone '{}': '{}' has no descriptor, skipping", name, record.resource);
                continue;
            };
            if !scene.is_alive(record.instance) {
                log::debug!("Zone '{}': '{}' instance is gone, skipping", name, record.resource);
                continue;
            }

            let mut placement = spec.resolve(scene);
            if !scene.set_parent(record.instance, placement.parent) {
                placement.parent = scene.parent(record.instance);
            }
            scene.set_world_pose(record.instance, placement.pose);
            record.placement = placement;

            refreshed.push(ZoneEvent::Refreshed {
                resource: record.resource.clone(),
                instance: record.instance,
            });
        }

        let count = refreshed.len();
        self.events.extend(refreshed);
        self.stats.refreshes_applied += count as u64;
        log::info!("Zone '{}': refreshed {} instance(s)", self.config.name, count);
        count
    }

    // ---- Lifecycle ----

    /// Activate the zone. Starts a new generation and unloads anything held.
    ///
    /// Enabling an already active zone also starts a new generation, so any
    /// outstanding requests are abandoned and their completions released.
    pub fn enable(&mut self) {
        self.process_completions();
        self.advance_generation();
        self.active = true;
        log::debug!("Zone '{}': enabled ({:?})", self.config.name, self.generation);
        self.release_all();
    }

    /// Deactivate the zone. Unloads everything and abandons outstanding requests.
    pub fn disable(&mut self) {
        self.process_completions();
        self.release_all();
        self.advance_generation();
        self.active = false;
        log::debug!("Zone '{}': disabled ({:?})", self.config.name, self.generation);
    }

    fn advance_generation(&mut self) {
        self.generation = self.generation.next();
        if !self.in_flight.is_empty() {
            log::debug!(
                "Zone '{}': abandoning {} outstanding request(s)",
                self.config.name,
                self.in_flight.len()
            );
        }
        self.in_flight.clear();
        self.in_flight_resources.clear();
    }

    // ---- Triggers ----

    /// Actor entered the zone. Returns true if a load pass ran.
    pub fn on_enter(&mut self, layer: Layer) -> bool {
        self.process_completions();

        if !self.active {
            log::trace!("Zone '{}': enter of {} ignored, disabled", self.config.name, layer);
            return false;
        }
        if self.descriptors.is_empty() || !self.config.collidable_layers.contains(layer) {
            log::trace!("Zone '{}': enter of {} ignored", self.config.name, layer);
            return false;
        }

        self.load_all();
        true
    }

    /// Actor left the zone. Returns true if an unload pass ran.
    pub fn on_exit(&mut self, layer: Layer) -> bool {
        self.process_completions();

        if !self.active
            || self.registry.is_empty()
            || !self.config.unload_on_exit
            || !self.config.collidable_layers.contains(layer)
        {
            log::trace!("Zone '{}': exit of {} ignored", self.config.name, layer);
            return false;
        }

        self.unload_all();
        true
    }

    // ---- Policy ----

    /// Whether exit triggers an unload
    pub fn unload_on_exit(&self) -> bool {
        self.config.unload_on_exit
    }

    /// Set the unload-on-exit policy
    pub fn set_unload_on_exit(&mut self, unload: bool) {
        self.config.unload_on_exit = unload;
    }

    /// Layers that drive the zone
    pub fn collidable_layers(&self) -> LayerMask {
        self.config.collidable_layers
    }

    /// Set the layers that drive the zone
    pub fn set_collidable_layers(&mut self, layers: LayerMask) {
        self.config.collidable_layers = layers;
    }

    /// Zone configuration
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    // ---- Queries ----
    //
    // Queries see completions folded so far; call `process_completions` first
    // for an up-to-date view.

    /// True if any resource is loaded
    pub fn is_any_loaded(&self) -> bool {
        !self.registry.is_empty()
    }

    /// True unless disabled
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Loaded records in completion order
    pub fn records(&self) -> &[LoadRecord] {
        self.registry.as_slice()
    }

    /// Record for a resource
    pub fn record(&self, resource: &ResourceHandle) -> Option<&LoadRecord> {
        self.registry.get(resource)
    }

    /// True if a request for the resource is outstanding
    pub fn is_in_flight(&self, resource: &ResourceHandle) -> bool {
        self.in_flight_resources.contains(resource)
    }

    /// Number of outstanding requests
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Current activation generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Coarse state
    pub fn status(&self) -> ZoneStatus {
        if !self.active {
            ZoneStatus::Inactive
        } else if !self.in_flight.is_empty() {
            ZoneStatus::Loading
        } else if self.registry.is_empty() {
            ZoneStatus::Empty
        } else {
            ZoneStatus::Loaded
        }
    }

    /// Counters
    pub fn stats(&self) -> &ZoneStats {
        &self.stats
    }

    /// Take queued events
    pub fn drain_events(&mut self) -> Vec<ZoneEvent> {
        std::mem::take(&mut self.events)
    }
}

impl std::fmt::Debug for ZoneLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneLoader")
            .field("name", &self.config.name)
            .field("active", &self.active)
            .field("generation", &self.generation)
            .field("loaded", &self.registry.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl Drop for ZoneLoader {
    fn drop(&mut self) {
        // Outstanding requests are released by their providers once the
        // completion queue is gone.
        self.process_completions();
        if !self.registry.is_empty() {
            log::debug!("Zone '{}': dropped while loaded", self.config.name);
            self.release_all();
        }
    }
}
