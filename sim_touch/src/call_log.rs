//! Shared record of hardware side effects

use crate::lock;
use std::sync::{Arc, Mutex};
use touch_hal::{IrqTrigger, Level};

/// One observable side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RegulatorEnable(String),
    RegulatorDisable(String),
    PinSelect(String),
    GpioOutput { line: u32, level: Level },
    GpioInput(u32),
    IrqRequest { line: u32, trigger: IrqTrigger },
    IrqEnable(u32),
    IrqDisable(u32),
    Decode,
    HwSuspend,
    HwResume,
    ReadVersion,
    Configure,
    Report { touches: usize },
    /// Extension module hook, recorded by test modules
    Hook { module: String, hook: &'static str },
}

/// Ordered call log shared by every simulated resource
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }

    /// Snapshot of every call so far
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of calls equal to `call`
    pub fn count(&self, call: &Call) -> usize {
        lock(&self.calls).iter().filter(|c| *c == call).count()
    }

    pub fn count_matching(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| predicate(c)).count()
    }

    /// Index of the first occurrence of `call`
    pub fn position(&self, call: &Call) -> Option<usize> {
        lock(&self.calls).iter().position(|c| c == call)
    }

    /// Calls with every call not matching `predicate` removed
    pub fn filtered(&self, predicate: impl Fn(&Call) -> bool) -> Vec<Call> {
        lock(&self.calls)
            .iter()
            .filter(|c| predicate(c))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let log = CallLog::new();
        let other = log.clone();
        other.record(Call::Decode);
        log.record(Call::HwSuspend);

        assert_eq!(log.calls(), vec![Call::Decode, Call::HwSuspend]);
        assert_eq!(other.position(&Call::HwSuspend), Some(1));
    }

    #[test]
    fn test_count_and_filter() {
        let log = CallLog::new();
        log.record(Call::IrqEnable(7));
        log.record(Call::Decode);
        log.record(Call::IrqEnable(7));

        assert_eq!(log.count(&Call::IrqEnable(7)), 2);
        assert_eq!(
            log.count_matching(|c| matches!(c, Call::IrqEnable(_) | Call::IrqDisable(_))),
            2
        );
        assert_eq!(log.filtered(|c| *c == Call::Decode), vec![Call::Decode]);

        log.clear();
        assert!(log.is_empty());
    }
}
