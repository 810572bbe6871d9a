//! Suspend/resume state machine
//!
//! Two phases, Active and Suspended. Suspending masks the interrupt before
//! the controller goes to sleep and releases every contact; resuming wakes
//! the controller before the interrupt is unmasked.

use crate::extension::{Dispatch, ExtensionRegistry};
use crate::irq::InterruptGate;
use crate::pins::PinStates;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use touch_hal::{HardwareOps, InputSink};
use touch_types::TouchFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Active,
    Suspended,
}

/// Result of a suspend or resume request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The transition ran
    Applied,
    /// Already in the requested phase
    Unchanged,
    /// An extension module vetoed the transition
    Cancelled,
}

/// Resources a transition works on, borrowed from the core
pub struct TransitionParts<'a> {
    pub gate: &'a InterruptGate,
    pub pins: Option<&'a mut PinStates>,
    pub hw: &'a mut dyn HardwareOps,
    pub sink: &'a mut dyn InputSink,
    pub registry: &'a mut ExtensionRegistry,
}

#[derive(Debug, Default)]
pub struct SuspendController {
    phase: Phase,
}

impl SuspendController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_suspended(&self) -> bool {
        self.phase == Phase::Suspended
    }

    /// Puts the device to sleep
    ///
    /// Order: mask interrupt, controller sleep, phase change, suspend pin
    /// state, release frame. Hardware and pin failures are logged and do not
    /// stop the transition.
    pub fn suspend(&mut self, parts: TransitionParts<'_>) -> TransitionOutcome {
        if self.phase == Phase::Suspended {
            debug!("suspend requested while suspended");
            return TransitionOutcome::Unchanged;
        }
        let TransitionParts {
            gate,
            pins,
            hw,
            sink,
            registry,
        } = parts;

        if registry.dispatch_before_suspend(hw) == Dispatch::Cancelled {
            return TransitionOutcome::Cancelled;
        }

        gate.disable();
        if let Err(err) = hw.suspend() {
            warn!("{}: suspend failed: {}", hw.name(), err);
        }
        self.phase = Phase::Suspended;
        if let Some(pins) = pins {
            if let Err(err) = pins.select_suspend() {
                warn!("failed to select suspend pin state: {}", err);
            }
        }
        sink.report(&TouchFrame::released());

        registry.dispatch_after_suspend(hw);
        info!("touch suspended");
        TransitionOutcome::Applied
    }

    /// Wakes the device
    ///
    /// Order: active pin state, phase change, controller wake, unmask
    /// interrupt.
    pub fn resume(&mut self, parts: TransitionParts<'_>) -> TransitionOutcome {
        if self.phase == Phase::Active {
            debug!("resume requested while active");
            return TransitionOutcome::Unchanged;
        }
        let TransitionParts {
            gate,
            pins,
            hw,
            sink: _,
            registry,
        } = parts;

        if registry.dispatch_before_resume(hw) == Dispatch::Cancelled {
            return TransitionOutcome::Cancelled;
        }

        if let Some(pins) = pins {
            if let Err(err) = pins.select_active() {
                warn!("failed to select active pin state: {}", err);
            }
        }
        self.phase = Phase::Active;
        if let Err(err) = hw.resume() {
            warn!("{}: resume failed: {}", hw.name(), err);
        }
        gate.enable();

        registry.dispatch_after_resume(hw);
        info!("touch resumed");
        TransitionOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{ExtensionModule, ModuleAction};
    use crate::pins::{PINCTRL_STATE_ACTIVE, PINCTRL_STATE_SUSPEND};
    use sim_touch::{Call, CallLog, SimBus, SimChip, SimInputSink, SimPlatform};
    use touch_hal::{IrqTrigger, Platform};

    const IRQ: u32 = 102;

    struct Rig {
        log: CallLog,
        gate: InterruptGate,
        pins: Option<PinStates>,
        chip: SimChip,
        sink: SimInputSink,
        registry: ExtensionRegistry,
        controller: SuspendController,
    }

    impl Rig {
        fn new(platform: SimPlatform, chip: impl FnOnce(&CallLog) -> SimChip) -> Self {
            let log = platform.log().clone();
            let mut platform = platform;
            let line = platform.request_irq(2, IrqTrigger::FallingEdge).unwrap();
            let pins = PinStates::acquire(&mut platform);
            let chip = chip(&log);
            log.clear();
            Self {
                gate: InterruptGate::new(line, true),
                pins,
                sink: SimInputSink::new(log.clone()),
                chip,
                log,
                registry: ExtensionRegistry::new(),
                controller: SuspendController::new(),
            }
        }

        fn standard() -> Self {
            Self::new(SimPlatform::standard(CallLog::new()), |log| {
                SimChip::new("sim", SimBus::new(), log.clone())
            })
        }

        fn parts(&mut self) -> TransitionParts<'_> {
            TransitionParts {
                gate: &self.gate,
                pins: self.pins.as_mut(),
                hw: &mut self.chip,
                sink: &mut self.sink,
                registry: &mut self.registry,
            }
        }

        fn suspend(&mut self) -> TransitionOutcome {
            let parts = TransitionParts {
                gate: &self.gate,
                pins: self.pins.as_mut(),
                hw: &mut self.chip,
                sink: &mut self.sink,
                registry: &mut self.registry,
            };
            self.controller.suspend(parts)
        }

        fn resume(&mut self) -> TransitionOutcome {
            let parts = TransitionParts {
                gate: &self.gate,
                pins: self.pins.as_mut(),
                hw: &mut self.chip,
                sink: &mut self.sink,
                registry: &mut self.registry,
            };
            self.controller.resume(parts)
        }
    }

    struct Veto;

    impl ExtensionModule for Veto {
        fn name(&self) -> &str {
            "veto"
        }

        fn before_suspend(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
            ModuleAction::Cancel
        }
    }

    #[test]
    fn test_suspend_order() {
        let mut rig = Rig::standard();
        assert_eq!(rig.suspend(), TransitionOutcome::Applied);
        assert!(rig.controller.is_suspended());
        assert!(!rig.gate.is_enabled());
        assert_eq!(
            rig.log.calls(),
            vec![
                Call::IrqDisable(IRQ),
                Call::HwSuspend,
                Call::PinSelect(PINCTRL_STATE_SUSPEND.to_string()),
                Call::Report { touches: 0 },
            ]
        );
        assert!(rig.sink.last_frame().unwrap().is_released());
    }

    #[test]
    fn test_resume_order() {
        let mut rig = Rig::standard();
        rig.suspend();
        rig.log.clear();

        assert_eq!(rig.resume(), TransitionOutcome::Applied);
        assert_eq!(rig.controller.phase(), Phase::Active);
        assert!(rig.gate.is_enabled());
        assert_eq!(
            rig.log.calls(),
            vec![
                Call::PinSelect(PINCTRL_STATE_ACTIVE.to_string()),
                Call::HwResume,
                Call::IrqEnable(IRQ),
            ]
        );
    }

    #[test]
    fn test_repeated_transitions_are_noops() {
        let mut rig = Rig::standard();
        assert_eq!(rig.resume(), TransitionOutcome::Unchanged);
        assert!(rig.log.is_empty());

        rig.suspend();
        rig.log.clear();
        assert_eq!(rig.suspend(), TransitionOutcome::Unchanged);
        assert!(rig.log.is_empty());
    }

    #[test]
    fn test_hardware_failure_still_suspends() {
        let mut rig = Rig::new(SimPlatform::standard(CallLog::new()), |log| {
            SimChip::new("sim", SimBus::new(), log.clone()).failing_suspend()
        });
        assert_eq!(rig.suspend(), TransitionOutcome::Applied);
        assert!(rig.controller.is_suspended());
        assert_eq!(rig.log.count(&Call::Report { touches: 0 }), 1);
    }

    #[test]
    fn test_without_pin_control() {
        let mut rig = Rig::new(
            SimPlatform::standard(CallLog::new()).without_pin_control(),
            |log| SimChip::new("sim", SimBus::new(), log.clone()),
        );
        rig.suspend();
        rig.resume();
        assert_eq!(
            rig.log.count_matching(|c| matches!(c, Call::PinSelect(_))),
            0
        );
        assert!(rig.gate.is_enabled());
    }

    #[test]
    fn test_extension_veto_keeps_active() {
        let mut rig = Rig::standard();
        rig.registry.register(Box::new(Veto));

        assert_eq!(rig.suspend(), TransitionOutcome::Cancelled);
        assert_eq!(rig.controller.phase(), Phase::Active);
        assert!(rig.gate.is_enabled());
        assert!(rig.log.is_empty());
    }

    #[test]
    fn test_parts_borrow_helper() {
        let mut rig = Rig::standard();
        let mut controller = SuspendController::new();
        assert_eq!(controller.suspend(rig.parts()), TransitionOutcome::Applied);
        assert_eq!(controller.resume(rig.parts()), TransitionOutcome::Applied);
    }
}
