//! Pin control and GPIO abstraction
//!
//! Two kinds of pin resources exist:
//! - **Pin-multiplexing states**: named configurations of a group of pins
//!   ("active", "suspend") selected as a whole
//! - **GPIO lines**: single pins owned exclusively once requested

use crate::error::HalError;
use serde::{Deserialize, Serialize};

/// A resolved pin-multiplexing state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinState {
    name: String,
}

impl PinState {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Pin-control handle for the device's pin group
pub trait PinControl: Send {
    /// Resolves a named state
    ///
    /// # Errors
    /// Returns `HalError::NotFound` if the board does not define the state
    fn lookup_state(&mut self, name: &str) -> Result<PinState, HalError>;

    /// Applies a previously resolved state
    fn select_state(&mut self, state: &PinState) -> Result<(), HalError>;
}

/// Logic level of a GPIO line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    High,
}

/// An owned GPIO line
///
/// The line is released back to the board when the handle is dropped.
pub trait GpioLine: Send {
    /// Board line number
    fn line(&self) -> u32;

    /// Configures the line as an output driving `level`
    fn set_output(&mut self, level: Level) -> Result<(), HalError>;

    /// Configures the line as an input
    fn set_input(&mut self) -> Result<(), HalError>;
}
