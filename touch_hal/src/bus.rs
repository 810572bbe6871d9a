//! Byte bus abstraction
//!
//! A [`BusAdapter`] performs one exchange: an ordered list of messages sent
//! to the device as a unit (one I2C transaction with repeated starts, or one
//! chip-select window on SPI). It reports how many messages completed; the
//! register protocol in `touch_bus` decides what counts as success.

use thiserror::Error;

/// One message inside a bus exchange
#[derive(Debug)]
pub enum BusMessage<'a> {
    /// Bytes clocked out to the device
    Write(&'a [u8]),
    /// Buffer filled with bytes clocked in from the device
    Read(&'a mut [u8]),
}

impl BusMessage<'_> {
    /// Number of payload bytes carried by this message
    pub fn len(&self) -> usize {
        match self {
            Self::Write(bytes) => bytes.len(),
            Self::Read(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read(_))
    }
}

/// Failure of a single bus exchange
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferFault {
    #[error("no acknowledge from device")]
    Nack,

    #[error("bus arbitration lost")]
    ArbitrationLoss,

    #[error("short transfer: {completed} of {expected} messages completed")]
    Short { expected: usize, completed: usize },

    #[error("operation not supported by adapter")]
    Unsupported,

    #[error("bus error: {0}")]
    Other(String),
}

/// Failure of a register transaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// A segment failed on every attempt
    ///
    /// Segments completed before the failing one stay applied; `transferred`
    /// counts their bytes.
    #[error(
        "transfer at {address:#06x} failed after {attempts} attempts ({transferred} bytes applied): {last}"
    )]
    RetryExhausted {
        /// Start address of the failing segment
        address: u16,
        attempts: u32,
        transferred: usize,
        last: TransferFault,
    },

    #[error("transaction of {len} bytes at {address:#06x} exceeds the register space")]
    AddressRange { address: u16, len: usize },

    #[error("invalid transfer policy: {0}")]
    InvalidPolicy(&'static str),
}

impl BusError {
    /// Bytes applied before the transaction failed
    pub fn transferred(&self) -> usize {
        match self {
            Self::RetryExhausted { transferred, .. } => *transferred,
            Self::AddressRange { .. } | Self::InvalidPolicy(_) => 0,
        }
    }
}

/// Bus adapter trait
///
/// Implementers run the messages as one exchange and return the number of
/// messages the controller reports as completed.
pub trait BusAdapter {
    fn transfer(&mut self, messages: &mut [BusMessage<'_>]) -> Result<usize, TransferFault>;
}

impl<T: BusAdapter + ?Sized> BusAdapter for Box<T> {
    fn transfer(&mut self, messages: &mut [BusMessage<'_>]) -> Result<usize, TransferFault> {
        (**self).transfer(messages)
    }
}

impl<T: BusAdapter + ?Sized> BusAdapter for &mut T {
    fn transfer(&mut self, messages: &mut [BusMessage<'_>]) -> Result<usize, TransferFault> {
        (**self).transfer(messages)
    }
}
