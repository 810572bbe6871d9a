//! `embedded-hal` adapters
//!
//! Lets any `embedded-hal` 1.0 I2C or SPI implementation serve as a
//! [`BusAdapter`]. Both run the whole message list inside one transaction,
//! so a successful call always completes every message.

use crate::bus::{BusAdapter, BusMessage, TransferFault};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, Error as _, I2c, SevenBitAddress};
use embedded_hal::spi::{self, Error as _, SpiDevice};

/// I2C client at a fixed 7-bit address
pub struct I2cAdapter<I> {
    i2c: I,
    address: SevenBitAddress,
}

impl<I: I2c> I2cAdapter<I> {
    pub fn new(i2c: I, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    /// Returns the underlying bus
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> BusAdapter for I2cAdapter<I> {
    fn transfer(&mut self, messages: &mut [BusMessage<'_>]) -> Result<usize, TransferFault> {
        let count = messages.len();
        let mut operations: Vec<i2c::Operation<'_>> = messages
            .iter_mut()
            .map(|message| match message {
                BusMessage::Write(bytes) => i2c::Operation::Write(*bytes),
                BusMessage::Read(buf) => i2c::Operation::Read(&mut **buf),
            })
            .collect();

        self.i2c
            .transaction(self.address, &mut operations)
            .map_err(|err| i2c_fault(err.kind()))?;
        Ok(count)
    }
}

fn i2c_fault(kind: i2c::ErrorKind) -> TransferFault {
    match kind {
        i2c::ErrorKind::NoAcknowledge(_) => TransferFault::Nack,
        i2c::ErrorKind::ArbitrationLoss => TransferFault::ArbitrationLoss,
        other => TransferFault::Other(format!("{:?}", other)),
    }
}

/// SPI device; chip select is held for the whole exchange
pub struct SpiAdapter<S> {
    spi: S,
}

impl<S: SpiDevice> SpiAdapter<S> {
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    pub fn release(self) -> S {
        self.spi
    }
}

impl<S: SpiDevice> BusAdapter for SpiAdapter<S> {
    fn transfer(&mut self, messages: &mut [BusMessage<'_>]) -> Result<usize, TransferFault> {
        let count = messages.len();
        let mut operations: Vec<spi::Operation<'_, u8>> = messages
            .iter_mut()
            .map(|message| match message {
                BusMessage::Write(bytes) => spi::Operation::Write(*bytes),
                BusMessage::Read(buf) => spi::Operation::Read(&mut **buf),
            })
            .collect();

        self.spi
            .transaction(&mut operations)
            .map_err(|err| TransferFault::Other(format!("{:?}", err.kind())))?;
        Ok(count)
    }
}

/// Blocking delay for hosted builds
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
