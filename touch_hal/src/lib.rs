//! # Touch Hardware Abstraction Layer
//!
//! This crate defines the seams between the touch core and the board.
//!
//! ## Philosophy
//!
//! **The core never touches hardware directly.**
//!
//! Rails, pins, interrupt lines, the register bus and the chip itself are all
//! reached through traits. Boards implement them; tests fake them.
//!
//! ## Design Principles
//!
//! 1. **Trait-based**: every hardware operation goes through a trait
//! 2. **Ownership-scoped**: handles release their resource when dropped
//! 3. **Chip-agnostic**: chip families plug in through [`HardwareOps`]
//! 4. **Testable**: every trait can be mocked for testing

pub mod adapters;
pub mod bus;
pub mod device;
pub mod error;
pub mod input;
pub mod interrupts;
pub mod pins;
pub mod platform;
pub mod power;

pub use adapters::{I2cAdapter, SpiAdapter, StdDelay};
pub use bus::{BusAdapter, BusError, BusMessage, TransferFault};
pub use device::HardwareOps;
pub use error::HalError;
pub use input::InputSink;
pub use interrupts::{InterruptLine, IrqTrigger};
pub use pins::{GpioLine, Level, PinControl, PinState};
pub use platform::Platform;
pub use power::Regulator;

pub use embedded_hal::delay::DelayNs;
