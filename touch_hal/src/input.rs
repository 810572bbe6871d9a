//! Input event sink

use crate::error::HalError;
use touch_types::{InputCapabilities, TouchFrame};

/// Sink interface for delivering touch frames to the input consumer
pub trait InputSink: Send {
    /// Declares axes, slots and keys; called once at bring-up
    fn configure(&mut self, capabilities: &InputCapabilities) -> Result<(), HalError>;

    /// Delivers one frame
    ///
    /// An empty frame releases every contact.
    fn report(&mut self, frame: &TouchFrame);
}
