//! Asset provider seam
//!
//! The zone never creates instances itself. It hands an [`InstantiateRequest`]
//! to an [`AssetProvider`], which may finish it on any thread and in any order.
//! Each request owns a one-shot completion promise: `resolve` consumes the
//! request, and dropping it unresolved reports `Cancelled`, so every request
//! completes exactly once.

mod manual;
mod scene;

pub use manual::ManualProvider;
pub use scene::{ProviderConfig, ProviderStats, SceneProvider};

use crate::descriptor::{ResolvedPlacement, ResourceHandle};
use crossbeam_channel::Sender;
use glam::{Quat, Vec3};
use std::fmt;
use void_scene::{NodeId, Pose};

/// Identifier of one instantiate request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Activation generation of a zone. Bumped on enable and disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    /// The following generation
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Token captured when a request is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    /// Request this ticket belongs to
    pub request: RequestId,
    /// Zone generation at issuance
    pub generation: Generation,
}

/// Outcome of an instantiate request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstantiateStatus {
    /// Instance created
    Succeeded,
    /// Provider could not create the instance
    Failed,
    /// Request was abandoned
    Cancelled,
    /// Provider reported no status
    None,
}

/// Result delivered for a request
#[derive(Debug, Clone, PartialEq)]
pub struct InstantiateResult {
    /// Status
    pub status: InstantiateStatus,
    /// Created instance (only meaningful when succeeded)
    pub instance: Option<NodeId>,
    /// Provider diagnostic
    pub message: Option<String>,
}

impl InstantiateResult {
    /// Successful result
    pub fn succeeded(instance: NodeId) -> Self {
        Self {
            status: InstantiateStatus::Succeeded,
            instance: Some(instance),
            message: None,
        }
    }

    /// Failed result
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: InstantiateStatus::Failed,
            instance: None,
            message: Some(message.into()),
        }
    }

    /// Cancelled result
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            status: InstantiateStatus::Cancelled,
            instance: None,
            message: Some(message.into()),
        }
    }

    /// Result with no status
    pub fn none() -> Self {
        Self {
            status: InstantiateStatus::None,
            instance: None,
            message: None,
        }
    }
}

/// A finished request, queued back to the zone
#[derive(Debug, Clone)]
pub struct Completion {
    /// Ticket of the originating request
    pub ticket: Ticket,
    /// Resource that was requested
    pub resource: ResourceHandle,
    /// What happened
    pub result: InstantiateResult,
}

/// Request to instantiate one resource at a world-space pose
#[derive(Debug)]
pub struct InstantiateRequest {
    /// Resource to instantiate
    pub resource: ResourceHandle,
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// Node to attach the instance under
    pub parent: Option<NodeId>,
    ticket: Ticket,
    completion: Option<Sender<Completion>>,
}

impl InstantiateRequest {
    pub(crate) fn new(
        ticket: Ticket,
        resource: ResourceHandle,
        placement: &ResolvedPlacement,
        completion: Sender<Completion>,
    ) -> Self {
        Self {
            resource,
            position: placement.position(),
            rotation: placement.rotation(),
            parent: placement.parent,
            ticket,
            completion: Some(completion),
        }
    }

    /// Ticket identifying this request
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Requested world pose
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    /// Complete the request. May be called from any thread.
    ///
    /// Hands the result back if the zone that issued the request is gone; the
    /// provider then owns any instance it created and must release it.
    pub fn resolve(mut self, result: InstantiateResult) -> Result<(), InstantiateResult> {
        self.deliver(result)
    }

    fn deliver(&mut self, result: InstantiateResult) -> Result<(), InstantiateResult> {
        let Some(sender) = self.completion.take() else {
            return Ok(());
        };
        let completion = Completion {
            ticket: self.ticket,
            resource: self.resource.clone(),
            result,
        };
        sender.send(completion).map_err(|unsent| {
            log::trace!(
                "Completion for '{}' {} undelivered: zone is gone",
                self.resource,
                self.ticket.request
            );
            unsent.into_inner().result
        })
    }
}

impl Drop for InstantiateRequest {
    fn drop(&mut self) {
        if self.completion.is_some() {
            // Cancelled results carry no instance.
            let _ = self.deliver(InstantiateResult::cancelled("request dropped unresolved"));
        }
    }
}

/// External asynchronous instantiate/release service
pub trait AssetProvider: Send + Sync {
    /// Start instantiating a resource. Completion is reported through the request.
    fn instantiate(&self, request: InstantiateRequest);

    /// Release an instance. Fire-and-forget; the instance is invalid afterwards.
    fn release(&self, instance: NodeId);
}
