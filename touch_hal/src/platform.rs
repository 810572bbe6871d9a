//! Board resource provider

use crate::error::HalError;
use crate::interrupts::{InterruptLine, IrqTrigger};
use crate::pins::{GpioLine, PinControl};
use crate::power::Regulator;

/// Board resource provider
///
/// Hands out rails, pin control, GPIO lines and the interrupt line by
/// identity. Every handle is owned by the caller and released on drop, so
/// the core never frees anything explicitly.
pub trait Platform {
    /// Acquires the rail with the given name
    fn regulator(&mut self, name: &str) -> Result<Box<dyn Regulator>, HalError>;

    /// Acquires the pin-control handle of the device
    ///
    /// Returns `HalError::NotFound` on boards without pin multiplexing.
    fn pin_control(&mut self) -> Result<Box<dyn PinControl>, HalError>;

    /// Requests exclusive ownership of a GPIO line
    fn request_gpio(&mut self, line: u32, label: &str) -> Result<Box<dyn GpioLine>, HalError>;

    /// Requests the interrupt line wired to GPIO `line`
    fn request_irq(
        &mut self,
        line: u32,
        trigger: IrqTrigger,
    ) -> Result<Box<dyn InterruptLine>, HalError>;
}
