//! Loadable descriptors: what a zone loads and where it goes

use crate::error::{Result, ZoneError};
use crate::scene_access::SceneAccess;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use void_scene::{NodeId, Pose};

/// Opaque key understood by the asset provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    /// Create a handle
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceHandle {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ResourceHandle {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Authored placement of a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    /// Node the instance is attached under (None = scene root)
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// Live anchor whose world pose is used; takes precedence over the overrides
    #[serde(default)]
    pub transform_target: Option<NodeId>,
    /// World position used when no transform target is set
    #[serde(default = "default_position")]
    pub position: Vec3,
    /// World rotation used when no transform target is set
    #[serde(default = "default_rotation")]
    pub rotation: Quat,
}

fn default_position() -> Vec3 {
    Vec3::ZERO
}

fn default_rotation() -> Quat {
    Quat::IDENTITY
}

impl PlacementSpec {
    /// Resolve against the current scene.
    ///
    /// Targets that are no longer alive resolve as unset: a dead transform
    /// target falls back to the overrides, a dead parent to the scene root.
    pub fn resolve(&self, scene: &dyn SceneAccess) -> ResolvedPlacement {
        let target = self
            .transform_target
            .and_then(|t| scene.world_pose(t).map(|pose| (t, pose)));

        let pose = match target {
            Some((_, pose)) => pose,
            None => Pose::new(self.position, self.rotation),
        };

        ResolvedPlacement {
            parent: self.parent.filter(|&p| scene.is_alive(p)),
            transform_target: target.map(|(t, _)| t),
            pose,
        }
    }
}

impl Default for PlacementSpec {
    fn default() -> Self {
        Self {
            parent: None,
            transform_target: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Placement actually applied to an instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPlacement {
    /// Parent the instance was attached under
    pub parent: Option<NodeId>,
    /// Transform target the pose was read from, if any
    pub transform_target: Option<NodeId>,
    /// World pose
    pub pose: Pose,
}

impl ResolvedPlacement {
    /// Resolved world position
    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    /// Resolved world rotation
    pub fn rotation(&self) -> Quat {
        self.pose.rotation
    }
}

/// One loadable resource declared on a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadableDescriptor {
    /// Resource to instantiate. A descriptor without one is a configuration
    /// error reported at load time.
    pub resource: Option<ResourceHandle>,
    /// Where to put it
    #[serde(default)]
    pub placement: PlacementSpec,
}

impl LoadableDescriptor {
    /// Descriptor for a resource at the origin
    pub fn new(resource: impl Into<ResourceHandle>) -> Self {
        Self {
            resource: Some(resource.into()),
            placement: PlacementSpec::default(),
        }
    }

    /// Descriptor with no resource set
    pub fn unset() -> Self {
        Self {
            resource: None,
            placement: PlacementSpec::default(),
        }
    }

    /// Set the override position
    pub fn at(mut self, position: Vec3) -> Self {
        self.placement.position = position;
        self
    }

    /// Set the override rotation
    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.placement.rotation = rotation;
        self
    }

    /// Follow a transform target
    pub fn following(mut self, target: NodeId) -> Self {
        self.placement.transform_target = Some(target);
        self
    }

    /// Attach under a parent
    pub fn parented_to(mut self, parent: NodeId) -> Self {
        self.placement.parent = Some(parent);
        self
    }
}

/// Ordered descriptor list with a uniqueness index on resource handles
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    entries: Vec<LoadableDescriptor>,
    index: HashMap<ResourceHandle, usize>,
}

impl DescriptorSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list, rejecting duplicate resource handles
    pub fn from_descriptors(descriptors: Vec<LoadableDescriptor>) -> Result<Self> {
        let mut set = Self::new();
        for descriptor in descriptors {
            set.push(descriptor)?;
        }
        Ok(set)
    }

    /// Append a descriptor
    pub fn push(&mut self, descriptor: LoadableDescriptor) -> Result<()> {
        let position = self.entries.len();
        if let Some(resource) = &descriptor.resource {
            if let Some(&first) = self.index.get(resource) {
                return Err(ZoneError::DuplicateResource {
                    resource: resource.clone(),
                    first,
                    second: position,
                });
            }
            self.index.insert(resource.clone(), position);
        }
        self.entries.push(descriptor);
        Ok(())
    }

    /// Remove the descriptor for a resource
    pub fn remove(&mut self, resource: &ResourceHandle) -> Option<LoadableDescriptor> {
        let position = self.index.remove(resource)?;
        let removed = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Descriptor for a resource
    pub fn get(&self, resource: &ResourceHandle) -> Option<&LoadableDescriptor> {
        self.index.get(resource).map(|&i| &self.entries[i])
    }

    /// Placement for a resource
    pub fn placement(&self, resource: &ResourceHandle) -> Option<&PlacementSpec> {
        self.get(resource).map(|d| &d.placement)
    }

    /// Editable placement for a resource. Edits apply on the next load or refresh.
    pub fn placement_mut(&mut self, resource: &ResourceHandle) -> Option<&mut PlacementSpec> {
        let i = *self.index.get(resource)?;
        Some(&mut self.entries[i].placement)
    }

    /// Check if a resource is declared
    pub fn contains(&self, resource: &ResourceHandle) -> bool {
        self.index.contains_key(resource)
    }

    /// Descriptors in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &LoadableDescriptor> {
        self.entries.iter()
    }

    /// Descriptors in declaration order
    pub fn as_slice(&self) -> &[LoadableDescriptor] {
        &self.entries
    }

    /// Number of descriptors (including ones without a resource)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_scene::SceneGraph;

    #[test]
    fn test_duplicate_resource_rejected() {
        let result = DescriptorSet::from_descriptors(vec![
            LoadableDescriptor::new("house"),
            LoadableDescriptor::unset(),
            LoadableDescriptor::new("house"),
        ]);

        match result {
            Err(ZoneError::DuplicateResource { resource, first, second }) => {
                assert_eq!(resource.as_str(), "house");
                assert_eq!(first, 0);
                assert_eq!(second, 2);
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_unset_entries_are_allowed() {
        let set = DescriptorSet::from_descriptors(vec![
            LoadableDescriptor::unset(),
            LoadableDescriptor::unset(),
            LoadableDescriptor::new("tree"),
        ])
        .unwrap();

        assert_eq!(set.len(), 3);
        assert!(set.contains(&"tree".into()));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut set = DescriptorSet::from_descriptors(vec![
            LoadableDescriptor::new("a"),
            LoadableDescriptor::new("b"),
            LoadableDescriptor::new("c"),
        ])
        .unwrap();

        assert!(set.remove(&"a".into()).is_some());
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get(&"c".into()).and_then(|d| d.resource.clone()),
            Some("c".into())
        );
        assert!(set.remove(&"a".into()).is_none());
    }

    #[test]
    fn test_placement_prefers_live_target() {
        let scene = SceneGraph::shared();
        let target = scene
            .write()
            .spawn("target", Pose::from_position(Vec3::new(5.0, 0.0, 0.0)), None)
            .unwrap();

        let spec = LoadableDescriptor::new("r")
            .at(Vec3::new(1.0, 1.0, 1.0))
            .following(target)
            .placement;

        let resolved = spec.resolve(&*scene);
        assert_eq!(resolved.position(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(resolved.transform_target, Some(target));
    }

    #[test]
    fn test_dead_targets_resolve_as_unset() {
        let scene = SceneGraph::shared();
        let target = scene.write().spawn("target", Pose::IDENTITY, None).unwrap();
        let parent = scene.write().spawn("parent", Pose::IDENTITY, None).unwrap();

        let spec = LoadableDescriptor::new("r")
            .at(Vec3::new(2.0, 0.0, 0.0))
            .following(target)
            .parented_to(parent)
            .placement;

        scene.write().despawn(target);
        scene.write().despawn(parent);

        let resolved = spec.resolve(&*scene);
        assert_eq!(resolved.position(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(resolved.transform_target, None);
        assert_eq!(resolved.parent, None);
    }
}
