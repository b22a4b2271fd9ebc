//! Load records and the registry of materialized resources

use crate::descriptor::{ResolvedPlacement, ResourceHandle};
use std::collections::HashMap;
use void_scene::NodeId;

/// One currently materialized resource
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRecord {
    /// Resource the instance was created from
    pub resource: ResourceHandle,
    /// Live instance owned by the zone until released
    pub instance: NodeId,
    /// Placement last applied to the instance
    pub placement: ResolvedPlacement,
}

/// Ordered registry of load records, at most one per resource
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<LoadRecord>,
    index: HashMap<ResourceHandle, usize>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Hands the record back if its resource is already recorded.
    pub fn insert(&mut self, record: LoadRecord) -> Result<(), LoadRecord> {
        if self.index.contains_key(&record.resource) {
            return Err(record);
        }
        self.index.insert(record.resource.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Check if a resource has a record
    pub fn contains(&self, resource: &ResourceHandle) -> bool {
        self.index.contains_key(resource)
    }

    /// Record for a resource
    pub fn get(&self, resource: &ResourceHandle) -> Option<&LoadRecord> {
        self.index.get(resource).map(|&i| &self.records[i])
    }

    /// Records in completion order
    pub fn iter(&self) -> impl Iterator<Item = &LoadRecord> {
        self.records.iter()
    }

    /// Mutable records. The resource field must not be changed through this.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut LoadRecord> {
        self.records.iter_mut()
    }

    /// Records in completion order
    pub fn as_slice(&self) -> &[LoadRecord] {
        &self.records
    }

    /// Remove every record, returning them in order
    pub fn take_all(&mut self) -> Vec<LoadRecord> {
        self.index.clear();
        std::mem::take(&mut self.records)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_scene::Pose;

    fn record(resource: &str, index: u32) -> LoadRecord {
        LoadRecord {
            resource: resource.into(),
            instance: NodeId::new(index, 0),
            placement: ResolvedPlacement {
                parent: None,
                transform_target: None,
                pose: Pose::IDENTITY,
            },
        }
    }

    #[test]
    fn test_one_record_per_resource() {
        let mut registry = Registry::new();
        assert!(registry.insert(record("a", 1)).is_ok());

        let rejected = registry.insert(record("a", 2)).unwrap_err();
        assert_eq!(rejected.instance, NodeId::new(2, 0));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&"a".into()).unwrap().instance, NodeId::new(1, 0));
    }

    #[test]
    fn test_take_all_empties() {
        let mut registry = Registry::new();
        registry.insert(record("a", 1)).unwrap();
        registry.insert(record("b", 2)).unwrap();

        let taken = registry.take_all();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].resource.as_str(), "a");
        assert!(registry.is_empty());
        assert!(!registry.contains(&"a".into()));

        // Freed resources can be recorded again.
        assert!(registry.insert(record("a", 3)).is_ok());
    }
}
