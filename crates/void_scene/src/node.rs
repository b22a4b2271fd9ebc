//! Node identifiers and per-node storage

use crate::pose::Pose;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generational node identifier.
///
/// The generation is bumped every time a slot is reused, so an id held past
/// `despawn` never aliases the node that later takes its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Create a node id from its parts
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack into a u64 (generation in the high bits)
    pub const fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Unpack from `to_bits`
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// Serialized as the packed u64, same as the engine's entity ids.
impl Serialize for NodeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(NodeId::from_bits(bits))
    }
}

/// A live node in the graph
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub name: String,
    /// Pose relative to the parent (world space for roots)
    pub local: Pose,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: String, local: Pose, parent: Option<NodeId>) -> Self {
        Self {
            name,
            local,
            parent,
            children: Vec::new(),
        }
    }
}
