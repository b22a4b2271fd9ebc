//! Void Zone - Trigger-Driven Asset Streaming
//!
//! A zone owns a list of loadable descriptors and a registry of what is
//! currently instantiated. Actors entering the zone load every declared
//! resource through an asynchronous [`AssetProvider`]; leaving releases them.
//!
//! # Features
//!
//! - One record or outstanding request per resource handle
//! - Out-of-order completions from any thread, folded in on the owning thread
//! - Generation tickets so completions after disable are released, not recorded
//! - Refresh re-applies descriptor placement without reloading
//! - Layer-mask and unload-on-exit trigger policy
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use void_zone::prelude::*;
//!
//! let scene = SceneGraph::shared();
//! let provider = Arc::new(SceneProvider::new(scene.clone(), ["house"], ProviderConfig::default()));
//! let mut zone = ZoneLoader::new(ZoneConfig::named("village"), provider, scene)
//!     .with_descriptors(vec![LoadableDescriptor::new("house").at(Vec3::new(4.0, 0.0, 0.0))])?;
//!
//! zone.on_enter(Layer::PLAYER);
//! // each frame
//! zone.process_completions();
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod layer;
pub mod provider;
pub mod record;
pub mod scene_access;
pub mod zone;

pub mod prelude {
    pub use crate::config::ZoneConfig;
    pub use crate::descriptor::{
        DescriptorSet, LoadableDescriptor, PlacementSpec, ResolvedPlacement, ResourceHandle,
    };
    pub use crate::error::{Result, ZoneError};
    pub use crate::events::{LoadReport, ZoneEvent, ZoneHooks};
    pub use crate::layer::{Layer, LayerMask};
    pub use crate::provider::{
        AssetProvider, Generation, InstantiateRequest, InstantiateResult, InstantiateStatus,
        ManualProvider, ProviderConfig, ProviderStats, RequestId, SceneProvider, Ticket,
    };
    pub use crate::record::LoadRecord;
    pub use crate::scene_access::SceneAccess;
    pub use crate::zone::{ZoneLoader, ZoneStats, ZoneStatus};
    pub use void_scene::{NodeId, Pose, Quat, SceneGraph, SharedScene, Vec3};
}

pub use prelude::*;
