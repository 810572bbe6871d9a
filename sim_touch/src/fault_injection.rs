//! Deterministic fault injection for the simulated bus
//!
//! A [`FaultPlan`] lists the faults a test wants; a [`FaultInjector`] applies
//! them one bus exchange at a time.
//!
//! ## Example
//!
//! ```
//! use sim_touch::fault_injection::{BusFault, FaultInjector, FaultPlan, Injected};
//!
//! let mut injector = FaultInjector::new(FaultPlan::new().with_bus_fault(BusFault::FailNext { count: 1 }));
//! assert!(matches!(injector.next_exchange(), Injected::Fail(_)));
//! assert_eq!(injector.next_exchange(), Injected::Pass);
//! ```

use touch_hal::TransferFault;

/// A fault to inject into bus exchanges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusFault {
    /// Every exchange is NACKed
    FailAlways,

    /// The next N exchanges are NACKed
    FailNext { count: usize },

    /// Every exchange from the given index on is NACKed
    FailFrom { exchange: usize },

    /// The next N exchanges complete one message short
    ShortNext { count: usize },
}

/// Faults configured for one test
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    bus_faults: Vec<BusFault>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self {
            bus_faults: Vec::new(),
        }
    }

    /// Adds a bus fault to the plan
    pub fn with_bus_fault(mut self, fault: BusFault) -> Self {
        self.bus_faults.push(fault);
        self
    }

    pub fn bus_faults(&self) -> &[BusFault] {
        &self.bus_faults
    }
}

/// What the injector decided for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injected {
    Pass,
    Fail(TransferFault),
    /// Complete one message fewer than requested
    Short,
}

/// Applies a [`FaultPlan`] exchange by exchange
#[derive(Debug)]
pub struct FaultInjector {
    exchanges_seen: usize,
    fail_always: bool,
    fail_next: usize,
    fail_from: Option<usize>,
    short_next: usize,
}

impl FaultInjector {
    pub fn new(plan: FaultPlan) -> Self {
        let mut injector = Self {
            exchanges_seen: 0,
            fail_always: false,
            fail_next: 0,
            fail_from: None,
            short_next: 0,
        };

        for fault in plan.bus_faults() {
            match fault {
                BusFault::FailAlways => injector.fail_always = true,
                BusFault::FailNext { count } => injector.fail_next += count,
                BusFault::FailFrom { exchange } => {
                    injector.fail_from = Some(injector.fail_from.map_or(*exchange, |f| f.min(*exchange)));
                }
                BusFault::ShortNext { count } => injector.short_next += count,
            }
        }

        injector
    }

    /// Decides the fate of the next exchange
    pub fn next_exchange(&mut self) -> Injected {
        let index = self.exchanges_seen;
        self.exchanges_seen += 1;

        if self.fail_always || self.fail_from.map_or(false, |from| index >= from) {
            return Injected::Fail(TransferFault::Nack);
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Injected::Fail(TransferFault::Nack);
        }
        if self.short_next > 0 {
            self.short_next -= 1;
            return Injected::Short;
        }
        Injected::Pass
    }

    /// Number of exchanges seen so far, faulted or not
    pub fn exchanges_seen(&self) -> usize {
        self.exchanges_seen
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::new(FaultPlan::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plan_passes() {
        let mut injector = FaultInjector::default();
        for _ in 0..5 {
            assert_eq!(injector.next_exchange(), Injected::Pass);
        }
        assert_eq!(injector.exchanges_seen(), 5);
    }

    #[test]
    fn test_fail_from_index() {
        let mut injector =
            FaultInjector::new(FaultPlan::new().with_bus_fault(BusFault::FailFrom { exchange: 2 }));
        assert_eq!(injector.next_exchange(), Injected::Pass);
        assert_eq!(injector.next_exchange(), Injected::Pass);
        assert_eq!(injector.next_exchange(), Injected::Fail(TransferFault::Nack));
        assert_eq!(injector.next_exchange(), Injected::Fail(TransferFault::Nack));
    }

    #[test]
    fn test_short_then_pass() {
        let mut injector =
            FaultInjector::new(FaultPlan::new().with_bus_fault(BusFault::ShortNext { count: 1 }));
        assert_eq!(injector.next_exchange(), Injected::Short);
        assert_eq!(injector.next_exchange(), Injected::Pass);
    }

    #[test]
    fn test_fail_always() {
        let mut injector = FaultInjector::new(FaultPlan::new().with_bus_fault(BusFault::FailAlways));
        for _ in 0..10 {
            assert!(matches!(injector.next_exchange(), Injected::Fail(_)));
        }
    }
}
