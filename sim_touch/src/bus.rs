//! Simulated register device
//!
//! A 64 KiB register file behind the I2C framing used by `touch_bus`: a read
//! is `[Write(addr), Read(n)]`, a write is `[Write(addr ‖ payload)]`. Every
//! exchange is recorded, and a [`FaultPlan`] can fail or shorten it.

use crate::fault_injection::{FaultInjector, FaultPlan, Injected};
use crate::lock;
use log::debug;
use std::sync::{Arc, Mutex};
use touch_hal::{BusAdapter, BusMessage, TransferFault};

const REGISTER_SPACE: usize = 0x1_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// One exchange as seen by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub address: u16,
    /// Payload bytes, without the address header
    pub len: usize,
    pub direction: Direction,
    /// Whether the exchange took effect
    pub ok: bool,
}

#[derive(Debug)]
struct SimBusState {
    memory: Vec<u8>,
    records: Vec<TransferRecord>,
    injector: FaultInjector,
}

/// Simulated register device
///
/// Clones share the same registers, records and fault plan, so a test can
/// keep one clone while the other sits inside a chip driver.
#[derive(Debug, Clone)]
pub struct SimBus {
    state: Arc<Mutex<SimBusState>>,
}

impl SimBus {
    /// Fault-free device with zeroed registers
    pub fn new() -> Self {
        Self::with_faults(FaultPlan::new())
    }

    pub fn with_faults(plan: FaultPlan) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimBusState {
                memory: vec![0; REGISTER_SPACE],
                records: Vec::new(),
                injector: FaultInjector::new(plan),
            })),
        }
    }

    /// Replaces the fault plan; exchange indices restart at zero
    pub fn set_fault_plan(&self, plan: FaultPlan) {
        lock(&self.state).injector = FaultInjector::new(plan);
    }

    /// Writes registers directly, bypassing the bus
    pub fn load(&self, address: u16, bytes: &[u8]) {
        let start = usize::from(address);
        let end = (start + bytes.len()).min(REGISTER_SPACE);
        lock(&self.state).memory[start..end].copy_from_slice(&bytes[..end - start]);
    }

    /// Reads registers directly, bypassing the bus
    pub fn peek(&self, address: u16, len: usize) -> Vec<u8> {
        let start = usize::from(address);
        let end = (start + len).min(REGISTER_SPACE);
        lock(&self.state).memory[start..end].to_vec()
    }

    pub fn records(&self) -> Vec<TransferRecord> {
        lock(&self.state).records.clone()
    }

    /// Number of exchanges attempted, including faulted ones
    pub fn exchange_count(&self) -> usize {
        lock(&self.state).records.len()
    }

    pub fn clear_records(&self) {
        lock(&self.state).records.clear();
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusAdapter for SimBus {
    fn transfer(&mut self, messages: &mut [BusMessage<'_>]) -> Result<usize, TransferFault> {
        let mut state = lock(&self.state);
        let state = &mut *state;

        let (address, len, direction) = match &*messages {
            [BusMessage::Write(header), BusMessage::Read(buf)] if header.len() == 2 => {
                (u16::from_be_bytes([header[0], header[1]]), buf.len(), Direction::Read)
            }
            [BusMessage::Write(frame)] if frame.len() >= 2 => (
                u16::from_be_bytes([frame[0], frame[1]]),
                frame.len() - 2,
                Direction::Write,
            ),
            _ => return Err(TransferFault::Unsupported),
        };

        let start = usize::from(address);
        if start + len > REGISTER_SPACE {
            return Err(TransferFault::Other(format!(
                "{} bytes at {:#06x} past end of register space",
                len, address
            )));
        }

        let mut record = TransferRecord {
            address,
            len,
            direction,
            ok: false,
        };
        match state.injector.next_exchange() {
            Injected::Fail(fault) => {
                debug!("sim bus: injected {} at {:#06x}", fault, address);
                state.records.push(record);
                return Err(fault);
            }
            Injected::Short => {
                debug!("sim bus: injected short exchange at {:#06x}", address);
                state.records.push(record);
                return Ok(messages.len() - 1);
            }
            Injected::Pass => {}
        }

        match messages {
            [_, BusMessage::Read(buf)] => buf.copy_from_slice(&state.memory[start..start + len]),
            [BusMessage::Write(frame)] => {
                state.memory[start..start + len].copy_from_slice(&frame[2..]);
            }
            _ => return Err(TransferFault::Unsupported),
        }
        record.ok = true;
        state.records.push(record);
        Ok(messages.len())
    }
}
