//! # Register Bus
//!
//! Chunked, retrying register access over a byte bus.
//!
//! ## Philosophy
//!
//! A register transaction is split into segments no larger than the bus can
//! carry. Every segment is framed with the big-endian start address, sent as
//! one exchange and retried a bounded number of times. The next segment starts
//! where the previous one ended.
//!
//! ## Partial transactions
//!
//! Segments are not transactional. When a segment exhausts its retries the
//! call fails, segments already completed stay applied, and the error reports
//! how many bytes that was (see [`BusError::transferred`]).
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A register map for any controller family
//! - An asynchronous or DMA transport

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use touch_hal::{BusAdapter, BusError, BusMessage, DelayNs, TransferFault};

/// Length of the big-endian register address header
pub const ADDR_LEN: usize = 2;

/// Framed segments up to this size use a stack buffer
pub const INLINE_SCRATCH: usize = 64;

/// Default SPI write command byte
pub const SPI_WRITE_CMD: u8 = 0xF0;

/// Default SPI read command byte
pub const SPI_READ_CMD: u8 = 0xF1;

/// Segmenting and retry parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPolicy {
    /// Largest payload moved by one segment
    pub max_transfer: usize,
    /// Attempts per segment
    pub retry_times: u32,
    /// Delay between attempts, in microseconds
    pub retry_delay_us: u32,
}

impl TransferPolicy {
    pub const I2C: Self = Self {
        max_transfer: 256,
        retry_times: 3,
        retry_delay_us: 2000,
    };

    pub const SPI: Self = Self {
        max_transfer: 64,
        retry_times: 3,
        retry_delay_us: 2000,
    };

    /// Checks the policy can make progress
    pub fn validate(&self) -> Result<(), BusError> {
        if self.max_transfer == 0 {
            return Err(BusError::InvalidPolicy("max_transfer must be non-zero"));
        }
        if self.max_transfer > usize::from(u16::MAX) {
            return Err(BusError::InvalidPolicy("max_transfer exceeds the register space"));
        }
        if self.retry_times == 0 {
            return Err(BusError::InvalidPolicy("retry_times must be non-zero"));
        }
        Ok(())
    }
}

/// How a segment is put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Address header followed by payload in one transaction
    I2c,
    /// Command byte, address header and (for writes) a length field
    Spi { write_cmd: u8, read_cmd: u8 },
}

impl Framing {
    /// SPI framing with the default command bytes
    pub const fn spi() -> Self {
        Self::Spi {
            write_cmd: SPI_WRITE_CMD,
            read_cmd: SPI_READ_CMD,
        }
    }

    /// Bytes prepended to a read segment in the scratch buffer
    fn read_header_len(&self) -> usize {
        match self {
            Self::I2c => ADDR_LEN,
            Self::Spi { .. } => 1 + ADDR_LEN,
        }
    }

    /// Bytes prepended to a write segment
    fn write_header_len(&self) -> usize {
        match self {
            Self::I2c => ADDR_LEN,
            Self::Spi { .. } => 1 + ADDR_LEN + 2,
        }
    }
}

/// Segment buffer, on the stack when the framed segment is small enough
enum Scratch {
    Inline([u8; INLINE_SCRATCH]),
    Heap(Vec<u8>),
}

impl Scratch {
    fn with_len(len: usize) -> Self {
        if len <= INLINE_SCRATCH {
            Self::Inline([0; INLINE_SCRATCH])
        } else {
            Self::Heap(vec![0; len])
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Self::Inline(buf) => &mut buf[..],
            Self::Heap(buf) => buf.as_mut_slice(),
        }
    }

    #[cfg(test)]
    fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }
}

/// Runs one exchange and checks every message completed
fn exchange<A: BusAdapter>(
    adapter: &mut A,
    messages: &mut [BusMessage<'_>],
) -> Result<(), TransferFault> {
    let expected = messages.len();
    let completed = adapter.transfer(messages)?;
    if completed == expected {
        Ok(())
    } else {
        Err(TransferFault::Short {
            expected,
            completed,
        })
    }
}

/// Rejects transactions running past the last register
fn check_range(address: u16, len: usize) -> Result<(), BusError> {
    let last = usize::from(address) + len - 1;
    if last > usize::from(u16::MAX) {
        return Err(BusError::AddressRange { address, len });
    }
    Ok(())
}

/// Register access over a [`BusAdapter`]
pub struct RegisterBus<A, D> {
    adapter: A,
    delay: D,
    framing: Framing,
    policy: TransferPolicy,
}

impl<A: BusAdapter, D: DelayNs> RegisterBus<A, D> {
    /// Creates a bus with an explicit framing and policy
    pub fn new(
        adapter: A,
        delay: D,
        framing: Framing,
        policy: TransferPolicy,
    ) -> Result<Self, BusError> {
        policy.validate()?;
        Ok(Self {
            adapter,
            delay,
            framing,
            policy,
        })
    }

    /// I2C framing with the I2C policy preset
    pub fn i2c(adapter: A, delay: D) -> Self {
        Self {
            adapter,
            delay,
            framing: Framing::I2c,
            policy: TransferPolicy::I2C,
        }
    }

    /// SPI framing with the SPI policy preset
    pub fn spi(adapter: A, delay: D) -> Self {
        Self {
            adapter,
            delay,
            framing: Framing::spi(),
            policy: TransferPolicy::SPI,
        }
    }

    pub fn policy(&self) -> TransferPolicy {
        self.policy
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Consumes the bus and returns the adapter
    pub fn release(self) -> A {
        self.adapter
    }

    /// Reads `buf.len()` bytes starting at `address`
    ///
    /// On failure, `buf` holds the bytes of every completed segment and the
    /// remainder is left untouched.
    pub fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError> {
        if buf.is_empty() {
            return Ok(());
        }
        check_range(address, buf.len())?;

        let header_len = self.framing.read_header_len();
        let mut scratch = Scratch::with_len(buf.len().min(self.policy.max_transfer) + header_len);
        let framing = self.framing;

        let mut offset = 0;
        while offset < buf.len() {
            let len = (buf.len() - offset).min(self.policy.max_transfer);
            let segment_address = address + offset as u16;
            let (header, data) = scratch.as_mut_slice()[..header_len + len].split_at_mut(header_len);
            let read_cmd = fill_read_header(framing, segment_address, header);
            let header = &*header;

            self.with_retry(segment_address, offset, |adapter| match read_cmd {
                None => exchange(
                    adapter,
                    &mut [BusMessage::Write(header), BusMessage::Read(&mut *data)],
                ),
                Some(cmd) => {
                    exchange(adapter, &mut [BusMessage::Write(header)])?;
                    exchange(
                        adapter,
                        &mut [BusMessage::Write(&[cmd]), BusMessage::Read(&mut *data)],
                    )
                }
            })?;

            buf[offset..offset + len].copy_from_slice(data);
            offset += len;
        }
        Ok(())
    }

    /// Reads `len` bytes starting at `address` into a new buffer
    pub fn read_vec(&mut self, address: u16, len: usize) -> Result<Vec<u8>, BusError> {
        let mut buf = vec![0; len];
        self.read(address, &mut buf)?;
        Ok(buf)
    }

    /// Writes `data` starting at `address`
    ///
    /// On failure, every segment before the failing one has been written.
    pub fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError> {
        if data.is_empty() {
            return Ok(());
        }
        check_range(address, data.len())?;

        let header_len = self.framing.write_header_len();
        let mut scratch = Scratch::with_len(data.len().min(self.policy.max_transfer) + header_len);
        let framing = self.framing;

        let mut offset = 0;
        while offset < data.len() {
            let len = (data.len() - offset).min(self.policy.max_transfer);
            let segment_address = address + offset as u16;
            let frame = &mut scratch.as_mut_slice()[..header_len + len];
            fill_write_header(framing, segment_address, len, frame);
            frame[header_len..].copy_from_slice(&data[offset..offset + len]);
            let frame = &*frame;

            self.with_retry(segment_address, offset, |adapter| {
                exchange(adapter, &mut [BusMessage::Write(frame)])
            })?;
            offset += len;
        }
        Ok(())
    }

    /// Attempts one segment up to `retry_times` times
    fn with_retry<F>(&mut self, address: u16, transferred: usize, mut op: F) -> Result<(), BusError>
    where
        F: FnMut(&mut A) -> Result<(), TransferFault>,
    {
        let attempts = self.policy.retry_times;
        let mut last = TransferFault::Unsupported;
        for attempt in 1..=attempts {
            match op(&mut self.adapter) {
                Ok(()) => {
                    if attempt > 1 {
                        debug!("segment at {:#06x} recovered on attempt {}", address, attempt);
                    }
                    return Ok(());
                }
                Err(fault) => {
                    warn!(
                        "segment at {:#06x} attempt {}/{} failed: {}",
                        address, attempt, attempts, fault
                    );
                    last = fault;
                }
            }
            if attempt < attempts {
                self.delay.delay_us(self.policy.retry_delay_us);
            }
        }

        error!(
            "segment at {:#06x} failed after {} attempts, {} bytes applied",
            address, attempts, transferred
        );
        Err(BusError::RetryExhausted {
            address,
            attempts,
            transferred,
            last,
        })
    }
}

/// Writes the read header, returning the SPI read command if one is needed
fn fill_read_header(framing: Framing, address: u16, header: &mut [u8]) -> Option<u8> {
    let [hi, lo] = address.to_be_bytes();
    match framing {
        Framing::I2c => {
            header.copy_from_slice(&[hi, lo]);
            None
        }
        Framing::Spi {
            write_cmd,
            read_cmd,
        } => {
            header.copy_from_slice(&[write_cmd, hi, lo]);
            Some(read_cmd)
        }
    }
}

fn fill_write_header(framing: Framing, address: u16, len: usize, frame: &mut [u8]) {
    let [hi, lo] = address.to_be_bytes();
    match framing {
        Framing::I2c => frame[..ADDR_LEN].copy_from_slice(&[hi, lo]),
        Framing::Spi { write_cmd, .. } => {
            // len fits: max_transfer is capped at u16::MAX
            let [len_hi, len_lo] = (len as u16).to_be_bytes();
            frame[..5].copy_from_slice(&[write_cmd, hi, lo, len_hi, len_lo]);
        }
    }
}
