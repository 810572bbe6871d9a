//! Interrupt pipeline
//!
//! [`InterruptGate`] guards the interrupt line with a compare-and-swap flag
//! so the line is unmasked or masked exactly once per actual transition, no
//! matter how many contexts ask. [`process_interrupt`] turns one trigger into
//! extension dispatch, event decode and delivery.

use crate::extension::{Dispatch, ExtensionRegistry};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use touch_hal::{HardwareOps, InputSink, InterruptLine};
use touch_types::TouchEvent;

/// Compare-and-swap guarded interrupt line
///
/// `Send + Sync`; share it with `Arc` between the worker and the notifier.
pub struct InterruptGate {
    enabled: AtomicBool,
    line: Box<dyn InterruptLine>,
}

impl InterruptGate {
    /// Wraps a requested line; `enabled` is the line's current state
    pub fn new(line: Box<dyn InterruptLine>, enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            line,
        }
    }

    /// Unmasks the line if it is masked
    ///
    /// Returns true if this call performed the transition.
    pub fn enable(&self) -> bool {
        let won = self
            .enabled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.line.enable();
        }
        won
    }

    /// Masks the line if it is unmasked
    ///
    /// Returns true if this call performed the transition.
    pub fn disable(&self) -> bool {
        let won = self
            .enabled
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.line.disable();
        }
        won
    }

    pub fn set_enabled(&self, enable: bool) -> bool {
        if enable {
            self.enable()
        } else {
            self.disable()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn irq(&self) -> u32 {
        self.line.irq()
    }
}

/// What happened to one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An extension module claimed the interrupt; no event was read
    Cancelled,
    /// A touch frame was delivered to the sink
    Reported,
    /// The event was not a touch report
    Discarded,
    /// The event could not be read or decoded
    DecodeFailed,
    /// The line is disabled; nothing ran
    Masked,
}

/// Handles one interrupt
///
/// Decode failures are logged and leave the line enabled; the next trigger
/// gets a fresh attempt.
pub fn process_interrupt(
    gate: &InterruptGate,
    registry: &mut ExtensionRegistry,
    hw: &mut dyn HardwareOps,
    sink: &mut dyn InputSink,
) -> DispatchOutcome {
    if !gate.is_enabled() {
        debug!("irq {} masked, dropping trigger", gate.irq());
        return DispatchOutcome::Masked;
    }

    if registry.dispatch_interrupt(hw) == Dispatch::Cancelled {
        return DispatchOutcome::Cancelled;
    }

    match hw.decode_event() {
        Ok(TouchEvent::Touch(frame)) => {
            sink.report(&frame);
            DispatchOutcome::Reported
        }
        Ok(TouchEvent::Other) => DispatchOutcome::Discarded,
        Err(err) => {
            warn!("{}: failed to decode event: {}", hw.name(), err);
            DispatchOutcome::DecodeFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{ExtensionModule, ModuleAction};
    use sim_touch::{BusFault, Call, CallLog, FaultPlan, SimBus, SimChip, SimInputSink, SimPlatform};
    use std::sync::Arc;
    use std::thread;
    use touch_hal::{IrqTrigger, Platform};
    use touch_types::{TouchFrame, TouchPoint};

    const IRQ: u32 = 102;

    fn gate(log: &CallLog, enabled: bool) -> InterruptGate {
        let mut platform = SimPlatform::standard(log.clone());
        let line = platform.request_irq(2, IrqTrigger::FallingEdge).unwrap();
        log.clear();
        InterruptGate::new(line, enabled)
    }

    struct CancelAll;

    impl ExtensionModule for CancelAll {
        fn name(&self) -> &str {
            "cancel-all"
        }

        fn on_interrupt(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
            ModuleAction::Cancel
        }
    }

    #[test]
    fn test_enable_twice_enables_once() {
        let log = CallLog::new();
        let gate = gate(&log, false);

        assert!(gate.enable());
        assert!(!gate.enable());
        assert!(gate.is_enabled());
        assert_eq!(log.calls(), vec![Call::IrqEnable(IRQ)]);
    }

    #[test]
    fn test_disable_twice_disables_once() {
        let log = CallLog::new();
        let gate = gate(&log, true);

        assert!(gate.set_enabled(false));
        assert!(!gate.set_enabled(false));
        assert!(gate.set_enabled(true));
        assert_eq!(log.calls(), vec![Call::IrqDisable(IRQ), Call::IrqEnable(IRQ)]);
    }

    #[test]
    fn test_concurrent_disable_runs_once() {
        let log = CallLog::new();
        let gate = Arc::new(gate(&log, true));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.disable())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(log.count(&Call::IrqDisable(IRQ)), 1);
    }

    #[test]
    fn test_touch_frame_reported() {
        let log = CallLog::new();
        let gate = gate(&log, true);
        let bus = SimBus::new();
        let mut chip = SimChip::new("sim", bus.clone(), log.clone());
        let mut sink = SimInputSink::new(log.clone());
        let mut registry = ExtensionRegistry::new();

        let frame = TouchFrame::new().with_point(TouchPoint::new(0, 10, 20));
        SimChip::load_frame(&bus, &frame);

        let outcome = process_interrupt(&gate, &mut registry, &mut chip, &mut sink);
        assert_eq!(outcome, DispatchOutcome::Reported);
        assert_eq!(sink.frames(), vec![frame]);
    }

    #[test]
    fn test_other_event_discarded() {
        let log = CallLog::new();
        let gate = gate(&log, true);
        let mut chip = SimChip::new("sim", SimBus::new(), log.clone());
        let mut sink = SimInputSink::new(log.clone());

        let outcome = process_interrupt(&gate, &mut ExtensionRegistry::new(), &mut chip, &mut sink);
        assert_eq!(outcome, DispatchOutcome::Discarded);
        assert!(sink.frames().is_empty());
    }

    #[test]
    fn test_cancel_skips_decode() {
        let log = CallLog::new();
        let gate = gate(&log, true);
        let mut chip = SimChip::new("sim", SimBus::new(), log.clone());
        let mut sink = SimInputSink::new(log.clone());
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(CancelAll));

        let outcome = process_interrupt(&gate, &mut registry, &mut chip, &mut sink);
        assert_eq!(outcome, DispatchOutcome::Cancelled);
        assert_eq!(log.count(&Call::Decode), 0);
    }

    #[test]
    fn test_masked_line_does_nothing() {
        let log = CallLog::new();
        let gate = gate(&log, false);
        let mut chip = SimChip::new("sim", SimBus::new(), log.clone());
        let mut sink = SimInputSink::new(log.clone());

        let outcome = process_interrupt(&gate, &mut ExtensionRegistry::new(), &mut chip, &mut sink);
        assert_eq!(outcome, DispatchOutcome::Masked);
        assert!(log.is_empty());
    }

    #[test]
    fn test_decode_failure_keeps_line_enabled() {
        let log = CallLog::new();
        let gate = gate(&log, true);
        let bus = SimBus::with_faults(FaultPlan::new().with_bus_fault(BusFault::FailAlways));
        let mut chip = SimChip::new("sim", bus, log.clone());
        let mut sink = SimInputSink::new(log.clone());

        let outcome = process_interrupt(&gate, &mut ExtensionRegistry::new(), &mut chip, &mut sink);
        assert_eq!(outcome, DispatchOutcome::DecodeFailed);
        assert!(gate.is_enabled());
        assert_eq!(log.count(&Call::IrqDisable(IRQ)), 0);
    }
}
