//! Core orchestrator
//!
//! [`TouchCore`] owns everything acquired at bring-up and exposes the host
//! operations: interrupt enable/disable, suspend, resume, interrupt handling
//! and extension registration. Dropping it powers the device off and releases
//! every pin and line.

use crate::config::BoardConfig;
use crate::error::CoreError;
use crate::extension::{ExtensionModule, ExtensionRegistry, ModuleId};
use crate::irq::{process_interrupt, DispatchOutcome, InterruptGate};
use crate::pins::{GpioPins, PinStates};
use crate::power::PowerRails;
use crate::suspend::{Phase, SuspendController, TransitionOutcome, TransitionParts};
use crate::trigger::{PowerEvent, Transition, TriggerAdapter};
use log::{debug, info, warn};
use std::sync::Arc;
use touch_hal::{HardwareOps, InputSink, Platform};
use touch_types::ChipInfo;

/// A running touch device
pub struct TouchCore {
    config: BoardConfig,
    hw: Box<dyn HardwareOps>,
    sink: Box<dyn InputSink>,
    registry: ExtensionRegistry,
    gate: Arc<InterruptGate>,
    power: PowerRails,
    pins: Option<PinStates>,
    gpios: GpioPins,
    suspend_ctl: SuspendController,
    trigger: Box<dyn TriggerAdapter>,
}

impl TouchCore {
    /// Brings the device up
    ///
    /// Sequence: validate config, acquire rails, pin control (optional,
    /// "active" selected), GPIO lines, power on, declare input capabilities,
    /// request the interrupt. Any failure after power-on switches the rails
    /// back off before the error is returned.
    pub fn bring_up(
        config: BoardConfig,
        platform: &mut dyn Platform,
        hw: Box<dyn HardwareOps>,
        mut sink: Box<dyn InputSink>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        info!("bringing up {} ({})", config.device_name, hw.name());

        let mut power = PowerRails::acquire(platform, &config)?;

        let mut pins = if config.pin_control {
            PinStates::acquire(platform)
        } else {
            None
        };
        if let Some(states) = pins.as_mut() {
            if let Err(err) = states.select_active() {
                warn!("failed to select active pin state: {}", err);
            }
        }

        let gpios = GpioPins::request(platform, &config)?;
        power.power_on()?;

        let gate = match Self::attach(platform, &config, &gpios, sink.as_mut()) {
            Ok(gate) => gate,
            Err(err) => {
                warn!("bring-up failed after power on: {}", err);
                power.power_off();
                return Err(err);
            }
        };

        let trigger = config.suspend_trigger.adapter();
        info!(
            "{} up on irq {}, suspend driven by {:?}",
            config.device_name,
            gate.irq(),
            trigger.kind()
        );

        Ok(Self {
            config,
            hw,
            sink,
            registry: ExtensionRegistry::new(),
            gate: Arc::new(gate),
            power,
            pins,
            gpios,
            suspend_ctl: SuspendController::new(),
            trigger,
        })
    }

    /// Declares input capabilities and requests the interrupt line
    fn attach(
        platform: &mut dyn Platform,
        config: &BoardConfig,
        gpios: &GpioPins,
        sink: &mut dyn InputSink,
    ) -> Result<InterruptGate, CoreError> {
        sink.configure(&config.capabilities())?;
        let line = platform
            .request_irq(gpios.irq_line(), config.irq_trigger)
            .map_err(|err| CoreError::acquisition("irq line", err))?;
        // A freshly requested line is live
        Ok(InterruptGate::new(line, true))
    }

    /// Tears the device down
    ///
    /// Masks the interrupt, tears down every extension module (last
    /// registered first) and powers off. Pins and lines are released when
    /// the core is dropped at the end of this call.
    pub fn teardown(mut self) {
        self.shutdown();
        info!("{} torn down", self.config.device_name);
    }

    fn shutdown(&mut self) {
        self.gate.disable();
        self.registry.teardown_all();
        self.power.power_off();
    }

    /// Enables or disables the interrupt
    ///
    /// Returns true if the line actually changed state.
    pub fn enable_interrupt(&self, enable: bool) -> bool {
        self.gate.set_enabled(enable)
    }

    /// Handles one interrupt trigger
    pub fn handle_interrupt(&mut self) -> DispatchOutcome {
        process_interrupt(
            &self.gate,
            &mut self.registry,
            self.hw.as_mut(),
            self.sink.as_mut(),
        )
    }

    pub fn suspend(&mut self) -> TransitionOutcome {
        let parts = TransitionParts {
            gate: &self.gate,
            pins: self.pins.as_mut(),
            hw: self.hw.as_mut(),
            sink: self.sink.as_mut(),
            registry: &mut self.registry,
        };
        self.suspend_ctl.suspend(parts)
    }

    pub fn resume(&mut self) -> TransitionOutcome {
        let parts = TransitionParts {
            gate: &self.gate,
            pins: self.pins.as_mut(),
            hw: self.hw.as_mut(),
            sink: self.sink.as_mut(),
            registry: &mut self.registry,
        };
        self.suspend_ctl.resume(parts)
    }

    /// Feeds a host power event through the configured trigger
    ///
    /// Returns `None` if the event does not belong to the configured source.
    pub fn notify(&mut self, event: &PowerEvent) -> Option<TransitionOutcome> {
        let transition = self.trigger.notify(event);
        debug!("power event {:?} -> {:?}", event, transition);
        match transition? {
            Transition::Suspend => Some(self.suspend()),
            Transition::Resume => Some(self.resume()),
        }
    }

    /// Registers an extension module at the end of the chain
    pub fn register(&mut self, module: Box<dyn ExtensionModule>) -> ModuleId {
        self.registry.register(module)
    }

    pub fn unregister(&mut self, id: ModuleId) -> Option<Box<dyn ExtensionModule>> {
        self.registry.unregister(id)
    }

    /// Device identification
    ///
    /// The version is included only if the controller reports a valid one.
    pub fn chip_info(&mut self) -> ChipInfo {
        let version = match self.hw.read_version() {
            Ok(version) if version.valid => Some(version),
            Ok(_) => {
                debug!("{}: version block not valid", self.hw.name());
                None
            }
            Err(err) => {
                debug!("{}: no version: {}", self.hw.name(), err);
                None
            }
        };
        ChipInfo {
            name: self.config.device_name.clone(),
            version,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspend_ctl.is_suspended()
    }

    pub fn phase(&self) -> Phase {
        self.suspend_ctl.phase()
    }

    pub fn irq_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    pub fn is_powered(&self) -> bool {
        self.power.is_powered()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Shared handle to the interrupt gate
    pub fn interrupt_gate(&self) -> Arc<InterruptGate> {
        Arc::clone(&self.gate)
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn reset_line(&self) -> Option<u32> {
        self.gpios.reset_line()
    }
}

impl Drop for TouchCore {
    fn drop(&mut self) {
        self.shutdown();
    }
}
