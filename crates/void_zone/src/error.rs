//! Error types for zone configuration

use crate::descriptor::ResourceHandle;
use thiserror::Error;

/// Zone errors.
///
/// Only configuration problems surface as `Err`. Runtime failures (provider
/// failures, stale completions) are reported through logging and
/// [`ZoneEvent`](crate::events::ZoneEvent)s instead.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// Two descriptors name the same resource
    #[error("Resource '{resource}' declared twice (entries {first} and {second})")]
    DuplicateResource {
        resource: ResourceHandle,
        first: usize,
        second: usize,
    },

    /// Zone configuration could not be parsed
    #[error("Invalid zone configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Result type for zone operations
pub type Result<T> = std::result::Result<T, ZoneError>;
