//! Void Scene - Scene Graph
//!
//! A small scene graph used as the placement target for streamed content.
//!
//! # Features
//!
//! - Generational node ids (stale ids are detected after despawn)
//! - Parent/child ownership with recursive despawn
//! - Local poses with derived world poses
//! - Re-parenting that preserves world placement
//!
//! # Example
//!
//! ```ignore
//! use void_scene::prelude::*;
//!
//! let scene = SceneGraph::shared();
//! let anchor = scene.write().spawn("anchor", Pose::from_position(Vec3::X), None)?;
//! let prop = scene.write().spawn("prop", Pose::IDENTITY, Some(anchor))?;
//! ```

pub mod error;
pub mod graph;
pub mod node;
pub mod pose;

pub mod prelude {
    pub use crate::error::{Result, SceneError};
    pub use crate::graph::{SceneGraph, SharedScene};
    pub use crate::node::NodeId;
    pub use crate::pose::Pose;
    pub use glam::{Quat, Vec3};
}

pub use prelude::*;
