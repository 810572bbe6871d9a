//! Simulated controller family
//!
//! A small register map on top of [`SimBus`], driven through the real
//! `touch_bus::RegisterBus`:
//!
//! | register        | layout                                              |
//! |-----------------|-----------------------------------------------------|
//! | `REG_COMMAND`   | command byte (`CMD_SLEEP`, `CMD_WAKE`)              |
//! | `REG_VERSION`   | pid (4 ASCII bytes), vid (le16), 4 reserved, sensor |
//! | `REG_STATUS`    | bit 7 ready, bit 4 key byte present, low nibble count |
//! | `REG_POINTS`    | `count` records of id, x le16, y le16, w le16, p    |
//!
//! A key byte, when present, follows the last point record.

use crate::bus::SimBus;
use crate::call_log::{Call, CallLog};
use crate::delay::SimDelay;
use touch_bus::{Framing, RegisterBus, TransferPolicy};
use touch_hal::{BusError, HalError, HardwareOps};
use touch_types::{TouchEvent, TouchFrame, TouchPoint, VersionInfo};

pub const REG_COMMAND: u16 = 0x8040;
pub const REG_VERSION: u16 = 0x8140;
pub const REG_STATUS: u16 = 0x814E;
pub const REG_POINTS: u16 = 0x814F;

pub const CMD_WAKE: u8 = 0x00;
pub const CMD_SLEEP: u8 = 0x05;

pub const STATUS_READY: u8 = 0x80;
pub const STATUS_KEY: u8 = 0x10;
pub const MAX_POINTS: usize = 10;
pub const POINT_SIZE: usize = 8;

const VERSION_LEN: usize = 11;

/// Simulated chip implementing [`HardwareOps`]
pub struct SimChip {
    name: String,
    bus: RegisterBus<SimBus, SimDelay>,
    log: CallLog,
    fail_suspend: bool,
    fail_resume: bool,
}

impl SimChip {
    /// Creates a chip over `bus` with the I2C policy preset
    pub fn new(name: impl Into<String>, bus: SimBus, log: CallLog) -> Self {
        Self {
            name: name.into(),
            bus: RegisterBus::i2c(bus, SimDelay::new()),
            log,
            fail_suspend: false,
            fail_resume: false,
        }
    }

    /// Creates a chip with an explicit transfer policy and delay
    pub fn with_policy(
        name: impl Into<String>,
        bus: SimBus,
        delay: SimDelay,
        policy: TransferPolicy,
        log: CallLog,
    ) -> Result<Self, BusError> {
        Ok(Self {
            name: name.into(),
            bus: RegisterBus::new(bus, delay, Framing::I2c, policy)?,
            log,
            fail_suspend: false,
            fail_resume: false,
        })
    }

    /// Makes the suspend hook report a device error
    pub fn failing_suspend(mut self) -> Self {
        self.fail_suspend = true;
        self
    }

    pub fn failing_resume(mut self) -> Self {
        self.fail_resume = true;
        self
    }

    /// Writes a pending frame into the registers, as the controller would
    pub fn load_frame(bus: &SimBus, frame: &TouchFrame) {
        let count = frame.points.len().min(MAX_POINTS);
        let mut points = Vec::with_capacity(count * POINT_SIZE + 1);
        for point in &frame.points[..count] {
            points.push(point.id);
            points.extend_from_slice(&point.x.to_le_bytes());
            points.extend_from_slice(&point.y.to_le_bytes());
            points.extend_from_slice(&point.w.to_le_bytes());
            // Pressure is a single byte in this map
            points.push(point.p.min(0xFF) as u8);
        }
        let mut status = STATUS_READY | count as u8;
        if frame.keys != 0 {
            status |= STATUS_KEY;
            points.push(frame.keys as u8);
        }
        bus.load(REG_POINTS, &points);
        bus.load(REG_STATUS, &[status]);
    }

    /// Writes the version block
    pub fn load_version(bus: &SimBus, pid: &str, vid: u16, sensor_id: u8) {
        let mut block = [0u8; VERSION_LEN];
        for (dst, src) in block[..4].iter_mut().zip(pid.bytes()) {
            *dst = src;
        }
        block[4..6].copy_from_slice(&vid.to_le_bytes());
        block[10] = sensor_id;
        bus.load(REG_VERSION, &block);
    }

    fn decode_points(raw: &[u8]) -> Vec<TouchPoint> {
        raw.chunks_exact(POINT_SIZE)
            .map(|r| {
                TouchPoint::new(
                    r[0],
                    u16::from_le_bytes([r[1], r[2]]),
                    u16::from_le_bytes([r[3], r[4]]),
                )
                .with_contact(u16::from_le_bytes([r[5], r[6]]), u16::from(r[7]))
            })
            .collect()
    }
}

impl HardwareOps for SimChip {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), BusError> {
        self.bus.read(address, buf)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), BusError> {
        self.bus.write(address, data)
    }

    fn decode_event(&mut self) -> Result<TouchEvent, HalError> {
        self.log.record(Call::Decode);
        let mut status = [0u8; 1];
        self.bus.read(REG_STATUS, &mut status)?;
        let status = status[0];
        if status & STATUS_READY == 0 {
            return Ok(TouchEvent::Other);
        }

        let count = usize::from(status & 0x0F);
        if count > MAX_POINTS {
            self.bus.write(REG_STATUS, &[0])?;
            return Err(HalError::Device(format!("touch count {} out of range", count)));
        }
        let has_key = status & STATUS_KEY != 0;
        let len = count * POINT_SIZE + usize::from(has_key);
        let raw = self.bus.read_vec(REG_POINTS, len)?;
        self.bus.write(REG_STATUS, &[0])?;

        let mut frame = TouchFrame::new();
        frame.points = Self::decode_points(&raw[..count * POINT_SIZE]);
        if has_key {
            frame.keys = u32::from(raw[len - 1]);
        }
        Ok(TouchEvent::Touch(frame))
    }

    fn suspend(&mut self) -> Result<(), HalError> {
        self.log.record(Call::HwSuspend);
        if self.fail_suspend {
            return Err(HalError::Device("sleep command rejected".to_string()));
        }
        self.bus.write(REG_COMMAND, &[CMD_SLEEP])?;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), HalError> {
        self.log.record(Call::HwResume);
        if self.fail_resume {
            return Err(HalError::Device("wake command rejected".to_string()));
        }
        self.bus.write(REG_COMMAND, &[CMD_WAKE])?;
        Ok(())
    }

    fn read_version(&mut self) -> Result<VersionInfo, HalError> {
        self.log.record(Call::ReadVersion);
        let block = self.bus.read_vec(REG_VERSION, VERSION_LEN)?;
        let pid: String = block[..4]
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| char::from(*b))
            .collect();
        Ok(VersionInfo {
            valid: !pid.is_empty(),
            pid,
            vid: u16::from_le_bytes([block[4], block[5]]),
            sensor_id: block[10],
        })
    }
}
