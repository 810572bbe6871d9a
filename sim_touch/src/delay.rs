//! Simulated delay

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use touch_hal::DelayNs;

/// Delay that returns immediately and accumulates the time asked for
///
/// Clones share the same total.
#[derive(Debug, Clone, Default)]
pub struct SimDelay {
    total_ns: Arc<AtomicU64>,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total simulated delay in microseconds
    pub fn total_us(&self) -> u64 {
        self.total_ns.load(Ordering::Relaxed) / 1_000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.fetch_add(u64::from(ns), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_accumulates() {
        let delay = SimDelay::new();
        let mut handle = delay.clone();
        handle.delay_us(2000);
        handle.delay_ms(1);
        assert_eq!(delay.total_us(), 3000);
    }
}
