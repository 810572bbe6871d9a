//! Error taxonomy of the core

use thiserror::Error;
use touch_hal::{BusError, HalError};

/// Board configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read board config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed board config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Well-formed but unusable
    #[error("invalid board config: {0}")]
    Invalid(String),
}

/// Core errors
#[derive(Debug, Error)]
pub enum CoreError {
    /// Register transaction failed after retries
    #[error(transparent)]
    Io(#[from] BusError),

    /// A required resource could not be obtained; fatal to bring-up
    #[error("failed to acquire {resource}: {source}")]
    ResourceAcquisition {
        resource: String,
        #[source]
        source: HalError,
    },

    /// A rail refused to switch on
    #[error("failed to enable rail {rail}: {source}")]
    Power {
        rail: String,
        #[source]
        source: HalError,
    },

    #[error(transparent)]
    ConfigInvalid(#[from] ConfigError),

    #[error(transparent)]
    Hal(#[from] HalError),
}

impl CoreError {
    pub fn acquisition(resource: impl Into<String>, source: HalError) -> Self {
        Self::ResourceAcquisition {
            resource: resource.into(),
            source,
        }
    }

    /// Returns true if bring-up failed for lack of a resource
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(self, Self::ResourceAcquisition { .. })
    }
}

/// Errors talking to a [`CoreWorker`](crate::CoreWorker)
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn core worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("core worker has stopped")]
    Stopped,

    #[error("core worker panicked")]
    Panicked,
}
