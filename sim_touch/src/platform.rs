//! Simulated board resources

use crate::call_log::{Call, CallLog};
use crate::lock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use touch_hal::{
    GpioLine, HalError, InterruptLine, IrqTrigger, Level, PinControl, PinState, Platform,
    Regulator,
};

/// Interrupt numbers are the GPIO line plus this offset
pub const IRQ_BASE: u32 = 100;

#[derive(Debug, Clone, Copy, Default)]
struct RailBehavior {
    fail_enable: bool,
    fail_disable: bool,
}

/// Simulated power rail
pub struct SimRegulator {
    name: String,
    behavior: RailBehavior,
    log: CallLog,
}

impl Regulator for SimRegulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn enable(&mut self) -> Result<(), HalError> {
        self.log.record(Call::RegulatorEnable(self.name.clone()));
        if self.behavior.fail_enable {
            return Err(HalError::Device(format!("{} failed to ramp", self.name)));
        }
        Ok(())
    }

    fn disable(&mut self) -> Result<(), HalError> {
        self.log.record(Call::RegulatorDisable(self.name.clone()));
        if self.behavior.fail_disable {
            return Err(HalError::Device(format!("{} failed to turn off", self.name)));
        }
        Ok(())
    }
}

/// Simulated pin controller
pub struct SimPinControl {
    states: Vec<String>,
    fail_select: bool,
    log: CallLog,
}

impl PinControl for SimPinControl {
    fn lookup_state(&mut self, name: &str) -> Result<PinState, HalError> {
        if self.states.iter().any(|s| s == name) {
            Ok(PinState::new(name))
        } else {
            Err(HalError::NotFound(format!("pin state {}", name)))
        }
    }

    fn select_state(&mut self, state: &PinState) -> Result<(), HalError> {
        self.log.record(Call::PinSelect(state.name().to_string()));
        if self.fail_select {
            return Err(HalError::Device(format!("cannot select {}", state.name())));
        }
        Ok(())
    }
}

/// Simulated GPIO line; released back to the platform on drop
pub struct SimGpio {
    line: u32,
    claimed: Arc<Mutex<HashSet<u32>>>,
    log: CallLog,
}

impl GpioLine for SimGpio {
    fn line(&self) -> u32 {
        self.line
    }

    fn set_output(&mut self, level: Level) -> Result<(), HalError> {
        self.log.record(Call::GpioOutput {
            line: self.line,
            level,
        });
        Ok(())
    }

    fn set_input(&mut self) -> Result<(), HalError> {
        self.log.record(Call::GpioInput(self.line));
        Ok(())
    }
}

impl Drop for SimGpio {
    fn drop(&mut self) {
        lock(&self.claimed).remove(&self.line);
    }
}

/// Simulated interrupt line
pub struct SimIrqLine {
    irq: u32,
    log: CallLog,
}

impl InterruptLine for SimIrqLine {
    fn irq(&self) -> u32 {
        self.irq
    }

    fn enable(&self) {
        self.log.record(Call::IrqEnable(self.irq));
    }

    fn disable(&self) {
        self.log.record(Call::IrqDisable(self.irq));
    }
}

/// Simulated board
///
/// Resources must be declared with the builder methods before the core asks
/// for them; anything undeclared is reported as `HalError::NotFound`.
pub struct SimPlatform {
    log: CallLog,
    rails: HashMap<String, RailBehavior>,
    pin_states: Option<Vec<String>>,
    fail_pin_select: bool,
    gpios: HashSet<u32>,
    claimed: Arc<Mutex<HashSet<u32>>>,
    irq_available: bool,
}

impl SimPlatform {
    /// Board with nothing on it
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            rails: HashMap::new(),
            pin_states: None,
            fail_pin_select: false,
            gpios: HashSet::new(),
            claimed: Arc::default(),
            irq_available: true,
        }
    }

    /// Board with rails "avdd" and "vbus", both pin states, reset on GPIO 1
    /// and interrupt on GPIO 2
    pub fn standard(log: CallLog) -> Self {
        Self::new(log)
            .with_rail("avdd")
            .with_rail("vbus")
            .with_pin_states(&["pmx_ts_active", "pmx_ts_suspend"])
            .with_gpio(1)
            .with_gpio(2)
    }

    pub fn with_rail(mut self, name: &str) -> Self {
        self.rails.insert(name.to_string(), RailBehavior::default());
        self
    }

    /// Rail whose enable always fails
    pub fn with_failing_rail(mut self, name: &str) -> Self {
        self.rails.insert(
            name.to_string(),
            RailBehavior {
                fail_enable: true,
                fail_disable: false,
            },
        );
        self
    }

    /// Rail whose disable always fails
    pub fn with_sticky_rail(mut self, name: &str) -> Self {
        self.rails.insert(
            name.to_string(),
            RailBehavior {
                fail_enable: false,
                fail_disable: true,
            },
        );
        self
    }

    pub fn without_rail(mut self, name: &str) -> Self {
        self.rails.remove(name);
        self
    }

    /// Provides pin control defining exactly `states`
    pub fn with_pin_states(mut self, states: &[&str]) -> Self {
        self.pin_states = Some(states.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn without_pin_control(mut self) -> Self {
        self.pin_states = None;
        self
    }

    pub fn with_failing_pin_select(mut self) -> Self {
        self.fail_pin_select = true;
        self
    }

    pub fn with_gpio(mut self, line: u32) -> Self {
        self.gpios.insert(line);
        self
    }

    pub fn without_gpio(mut self, line: u32) -> Self {
        self.gpios.remove(&line);
        self
    }

    /// Makes every interrupt request fail
    pub fn without_irq(mut self) -> Self {
        self.irq_available = false;
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// GPIO lines currently owned by a handle
    pub fn claimed_gpios(&self) -> Vec<u32> {
        let mut lines: Vec<u32> = lock(&self.claimed).iter().copied().collect();
        lines.sort_unstable();
        lines
    }
}

impl Platform for SimPlatform {
    fn regulator(&mut self, name: &str) -> Result<Box<dyn Regulator>, HalError> {
        let behavior = self
            .rails
            .get(name)
            .copied()
            .ok_or_else(|| HalError::NotFound(format!("rail {}", name)))?;
        Ok(Box::new(SimRegulator {
            name: name.to_string(),
            behavior,
            log: self.log.clone(),
        }))
    }

    fn pin_control(&mut self) -> Result<Box<dyn PinControl>, HalError> {
        let states = self
            .pin_states
            .clone()
            .ok_or_else(|| HalError::NotFound("pin control".to_string()))?;
        Ok(Box::new(SimPinControl {
            states,
            fail_select: self.fail_pin_select,
            log: self.log.clone(),
        }))
    }

    fn request_gpio(&mut self, line: u32, label: &str) -> Result<Box<dyn GpioLine>, HalError> {
        if !self.gpios.contains(&line) {
            return Err(HalError::NotFound(format!("gpio {} ({})", line, label)));
        }
        if !lock(&self.claimed).insert(line) {
            return Err(HalError::Busy(format!("gpio {} ({})", line, label)));
        }
        Ok(Box::new(SimGpio {
            line,
            claimed: Arc::clone(&self.claimed),
            log: self.log.clone(),
        }))
    }

    fn request_irq(
        &mut self,
        line: u32,
        trigger: IrqTrigger,
    ) -> Result<Box<dyn InterruptLine>, HalError> {
        if !self.irq_available || !self.gpios.contains(&line) {
            return Err(HalError::NotFound(format!("irq for gpio {}", line)));
        }
        self.log.record(Call::IrqRequest { line, trigger });
        Ok(Box::new(SimIrqLine {
            irq: IRQ_BASE + line,
            log: self.log.clone(),
        }))
    }
}
