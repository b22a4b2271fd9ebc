//! Error types for the scene graph

use crate::node::NodeId;
use thiserror::Error;

/// Scene graph errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// Node does not exist (never spawned or already despawned)
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Requested parent does not exist
    #[error("Parent node not found: {0}")]
    ParentNotFound(NodeId),

    /// Re-parenting would make a node its own ancestor
    #[error("Parenting {node} under {parent} would create a cycle")]
    HierarchyCycle { node: NodeId, parent: NodeId },
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
