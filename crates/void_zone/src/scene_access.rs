//! The zone's view of the host scene

use parking_lot::RwLock;
use void_scene::{NodeId, Pose, SceneGraph};

/// Scene operations the zone needs for placement and refresh.
///
/// Methods take `&self`; implementations do their own locking so the scene can
/// be shared with provider worker threads.
pub trait SceneAccess: Send + Sync {
    /// Check if a node is still alive
    fn is_alive(&self, node: NodeId) -> bool;

    /// World-space pose of a live node
    fn world_pose(&self, node: NodeId) -> Option<Pose>;

    /// Move a node to a world-space pose. Returns false if the node is gone.
    fn set_world_pose(&self, node: NodeId, pose: Pose) -> bool;

    /// Re-parent a node (None = scene root), keeping its world pose.
    /// Returns false if the change could not be applied.
    fn set_parent(&self, node: NodeId, parent: Option<NodeId>) -> bool;

    /// Current parent of a node
    fn parent(&self, node: NodeId) -> Option<NodeId>;
}

impl SceneAccess for RwLock<SceneGraph> {
    fn is_alive(&self, node: NodeId) -> bool {
        self.read().is_alive(node)
    }

    fn world_pose(&self, node: NodeId) -> Option<Pose> {
        self.read().world_pose(node)
    }

    fn set_world_pose(&self, node: NodeId, pose: Pose) -> bool {
        self.write().set_world_pose(node, pose).is_ok()
    }

    fn set_parent(&self, node: NodeId, parent: Option<NodeId>) -> bool {
        match self.write().set_parent(node, parent) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not re-parent {}: {}", node, e);
                false
            }
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.read().parent(node)
    }
}
