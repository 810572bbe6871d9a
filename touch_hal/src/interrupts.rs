//! Interrupt line abstraction

use serde::{Deserialize, Serialize};

/// Trigger condition of the device's interrupt line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrqTrigger {
    RisingEdge,
    #[default]
    FallingEdge,
    LevelHigh,
    LevelLow,
}

impl IrqTrigger {
    pub fn is_level(&self) -> bool {
        matches!(self, Self::LevelHigh | Self::LevelLow)
    }
}

/// A requested interrupt line
///
/// The line is requested with one-shot semantics: it stays masked while its
/// handler runs. `enable`/`disable` map straight to the interrupt controller
/// and are not reference-counted here; callers guard them.
pub trait InterruptLine: Send + Sync {
    /// Interrupt number
    fn irq(&self) -> u32;

    /// Unmasks the line
    fn enable(&self);

    /// Masks the line, waiting for a running handler to finish
    fn disable(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_default_is_falling_edge() {
        assert_eq!(IrqTrigger::default(), IrqTrigger::FallingEdge);
        assert!(!IrqTrigger::FallingEdge.is_level());
        assert!(IrqTrigger::LevelLow.is_level());
    }

    #[test]
    fn test_trigger_serialization() {
        let json = serde_json::to_string(&IrqTrigger::RisingEdge).unwrap();
        assert_eq!(json, "\"rising_edge\"");
        let decoded: IrqTrigger = serde_json::from_str("\"level_high\"").unwrap();
        assert_eq!(decoded, IrqTrigger::LevelHigh);
    }
}
