//! # Simulated Touch Hardware
//!
//! Deterministic stand-ins for every hardware seam of the touch stack.
//!
//! ## Philosophy
//!
//! - **Deterministic**: no randomness, no wall-clock time
//! - **Observable**: every side effect lands in one shared [`CallLog`]
//! - **Fault-injectable**: bus failures are scripted with a [`FaultPlan`]
//! - **Test-focused**: not intended for production use
//!
//! ## Example
//!
//! ```
//! use sim_touch::{BusFault, CallLog, FaultPlan, SimBus};
//!
//! let bus = SimBus::with_faults(FaultPlan::new().with_bus_fault(BusFault::FailNext { count: 2 }));
//! let log = CallLog::new();
//! assert!(log.is_empty());
//! # let _ = bus;
//! ```

pub mod bus;
pub mod call_log;
pub mod chip;
pub mod delay;
pub mod fault_injection;
pub mod platform;
pub mod sink;

pub use bus::{Direction, SimBus, TransferRecord};
pub use call_log::{Call, CallLog};
pub use chip::SimChip;
pub use delay::SimDelay;
pub use fault_injection::{BusFault, FaultInjector, FaultPlan, Injected};
pub use platform::{SimGpio, SimIrqLine, SimPinControl, SimPlatform, SimRegulator};
pub use sink::SimInputSink;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a shared simulation state, ignoring poisoning from a panicked test
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
