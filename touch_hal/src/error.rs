//! HAL error type

use crate::bus::BusError;
use thiserror::Error;

/// Errors reported by board resources and chip implementations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Register access failed
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The board does not provide the requested resource
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The resource exists but is owned elsewhere
    #[error("resource busy: {0}")]
    Busy(String),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// Device-specific failure
    #[error("device error: {0}")]
    Device(String),
}

impl HalError {
    /// Returns true if the resource simply is not there
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
