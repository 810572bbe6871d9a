//! Power rail abstraction

use crate::error::HalError;

/// A power rail (regulator) handle
///
/// The handle is acquired by name from the [`Platform`](crate::Platform) and
/// released when dropped. Enabling and disabling are reference-counted by
/// the board in real systems; the core enables each rail at most once.
pub trait Regulator: Send {
    /// Name the rail was acquired by
    fn name(&self) -> &str;

    /// Switches the rail on
    fn enable(&mut self) -> Result<(), HalError>;

    /// Switches the rail off
    fn disable(&mut self) -> Result<(), HalError>;
}
