//! Hardware operations of a chip family

use crate::bus::BusError;
use crate::error::HalError;
use touch_types::{TouchEvent, VersionInfo};

/// Chip-family operations
///
/// Implemented once per controller family (usually on top of a
/// `touch_bus::RegisterBus`) and handed to the core at bring-up. Hooks with a
/// default body are optional; the default is "not present".
pub trait HardwareOps: Send {
    /// Device name reported in chip info
    fn name(&self) -> &str;

    /// Reads `buf.len()` bytes starting at register `address`
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError>;

    /// Writes `data` starting at register `address`
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError>;

    /// Reads and decodes the pending event after an interrupt
    fn decode_event(&mut self) -> Result<TouchEvent, HalError>;

    /// Puts the controller into its sleep mode
    fn suspend(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    /// Wakes the controller (usually a reset sequence)
    fn resume(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn read_version(&mut self) -> Result<VersionInfo, HalError> {
        Err(HalError::Unsupported("read_version"))
    }
}
