//! Actor layers and the collidable-layer mask

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an actor crossing a zone boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layer(pub u32);

impl Layer {
    /// Default layer
    pub const DEFAULT: Self = Self(0);
    /// Player layer
    pub const PLAYER: Self = Self(1);
    /// Enemy layer
    pub const ENEMIES: Self = Self(2);
    /// Projectile layer
    pub const PROJECTILES: Self = Self(3);

    /// Single-bit mask for this layer; layers past 31 have no bit
    pub fn bit(&self) -> Option<u32> {
        1u32.checked_shl(self.0)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer {}", self.0)
    }
}

/// Set of layers allowed to drive a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Every layer
    pub const ALL: Self = Self(u32::MAX);
    /// No layer
    pub const NONE: Self = Self(0);

    /// Build a mask from a list of layers
    pub fn from_layers(layers: &[Layer]) -> Self {
        Self(
            layers
                .iter()
                .filter_map(Layer::bit)
                .fold(0u32, |acc, bit| acc | bit),
        )
    }

    /// Add a layer
    pub fn with(mut self, layer: Layer) -> Self {
        if let Some(bit) = layer.bit() {
            self.0 |= bit;
        }
        self
    }

    /// Remove a layer
    pub fn without(mut self, layer: Layer) -> Self {
        if let Some(bit) = layer.bit() {
            self.0 &= !bit;
        }
        self
    }

    /// Membership test: the mask is unchanged by adding the layer's bit
    pub fn contains(&self, layer: Layer) -> bool {
        match layer.bit() {
            Some(bit) => self.0 == self.0 | bit,
            None => false,
        }
    }

    /// Check if no layer is allowed
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}
