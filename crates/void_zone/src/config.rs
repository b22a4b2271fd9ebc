//! Zone configuration

use crate::error::Result;
use crate::layer::LayerMask;
use serde::{Deserialize, Serialize};

/// Per-zone policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Name used in log output
    pub name: String,

    /// Actor layers that trigger loading and unloading
    pub collidable_layers: LayerMask,

    /// Release everything when a collidable actor leaves
    pub unload_on_exit: bool,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            name: "zone".to_string(),
            collidable_layers: LayerMask::ALL,
            unload_on_exit: true,
        }
    }
}

impl ZoneConfig {
    /// Config with a name and default policy
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the collidable layers
    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.collidable_layers = layers;
        self
    }

    /// Set the unload-on-exit policy
    pub fn with_unload_on_exit(mut self, unload: bool) -> Self {
        self.unload_on_exit = unload;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZoneError;
    use crate::layer::Layer;

    #[test]
    fn test_defaults() {
        let config = ZoneConfig::default();
        assert_eq!(config.collidable_layers, LayerMask::ALL);
        assert!(config.unload_on_exit);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ZoneConfig::from_json(r#"{ "name": "harbor", "collidable_layers": 2 }"#).unwrap();
        assert_eq!(config.name, "harbor");
        assert!(config.collidable_layers.contains(Layer::PLAYER));
        assert!(!config.collidable_layers.contains(Layer::DEFAULT));
        assert!(config.unload_on_exit);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ZoneConfig::from_json("{ \"unload_on_exit\": 3 }").unwrap_err();
        assert!(matches!(err, ZoneError::InvalidConfig(_)));
    }
}
