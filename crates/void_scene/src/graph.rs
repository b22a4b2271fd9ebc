//! Scene graph storage
//!
//! Nodes live in generational slots. Each node stores its pose relative to its
//! parent; world poses are derived on demand by walking the parent chain, so
//! moving an anchor moves everything attached under it.

use crate::error::{Result, SceneError};
use crate::node::{Node, NodeId};
use crate::pose::Pose;
use parking_lot::RwLock;
use std::sync::Arc;

/// Scene graph shared between the control thread and provider workers
pub type SharedScene = Arc<RwLock<SceneGraph>>;

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The scene graph
#[derive(Debug, Default)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    /// Free slot indices available for reuse
    free: Vec<u32>,
    live: usize,
}

impl SceneGraph {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scene behind a shared lock
    pub fn shared() -> SharedScene {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Spawn a node at a world-space pose, optionally attached under `parent`
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        world: Pose,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let local = match parent {
            Some(p) => {
                let parent_world = self.world_pose(p).ok_or(SceneError::ParentNotFound(p))?;
                parent_world.inverse().mul_pose(&world)
            }
            None => world,
        };

        let id = self.allocate(Node::new(name.into(), local, parent));
        if let Some(p) = parent {
            if let Some(parent_node) = self.node_mut(p) {
                parent_node.children.push(id);
            }
        }
        Ok(id)
    }

    /// Despawn a node and everything under it. Returns false if it was not alive.
    pub fn despawn(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.node(id).map(|n| n.parent) else {
            return false;
        };

        if let Some(p) = parent {
            if let Some(parent_node) = self.node_mut(p) {
                parent_node.children.retain(|&c| c != id);
            }
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index() as usize];
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index());
                self.live -= 1;
            }
        }
        true
    }

    /// Check if a node id refers to a live node
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Node name
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    /// First live node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.ids().find(|&id| self.name(id) == Some(name))
    }

    /// Parent of a node (None for roots and dead nodes)
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Direct children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Pose relative to the parent
    pub fn local_pose(&self, id: NodeId) -> Option<Pose> {
        self.node(id).map(|n| n.local)
    }

    /// World-space pose
    pub fn world_pose(&self, id: NodeId) -> Option<Pose> {
        let mut node = self.node(id)?;
        let mut world = node.local;
        while let Some(p) = node.parent {
            node = self.node(p)?;
            world = node.local.mul_pose(&world);
        }
        Some(world)
    }

    /// Set the pose relative to the parent
    pub fn set_local_pose(&mut self, id: NodeId, local: Pose) -> Result<()> {
        let node = self.node_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        node.local = local;
        Ok(())
    }

    /// Move a node so that its world pose equals `world`
    pub fn set_world_pose(&mut self, id: NodeId, world: Pose) -> Result<()> {
        let parent = self.node(id).ok_or(SceneError::NodeNotFound(id))?.parent;
        let local = match parent.and_then(|p| self.world_pose(p)) {
            Some(parent_world) => parent_world.inverse().mul_pose(&world),
            None => world,
        };
        self.set_local_pose(id, local)
    }

    /// Attach a node under `parent` (or detach to the root), keeping its world pose
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<()> {
        let world = self.world_pose(id).ok_or(SceneError::NodeNotFound(id))?;
        let old_parent = self.parent(id);
        if old_parent == parent {
            return Ok(());
        }

        if let Some(p) = parent {
            if !self.is_alive(p) {
                return Err(SceneError::ParentNotFound(p));
            }
            if self.is_ancestor_or_self(id, p) {
                return Err(SceneError::HierarchyCycle { node: id, parent: p });
            }
        }

        if let Some(old) = old_parent {
            if let Some(old_node) = self.node_mut(old) {
                old_node.children.retain(|&c| c != id);
            }
        }
        if let Some(p) = parent {
            if let Some(parent_node) = self.node_mut(p) {
                parent_node.children.push(id);
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = parent;
        }

        self.set_world_pose(id, world)
    }

    /// Live root nodes
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|&id| self.parent(id).is_none())
    }

    /// All live node ids
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.node
                .as_ref()
                .map(|_| NodeId::new(i as u32, slot.generation))
        })
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if the scene has no live nodes
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(p) => node = p,
                None => return false,
            }
        }
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }
}
