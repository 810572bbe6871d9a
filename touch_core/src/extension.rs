//! Extension module registry
//!
//! Extension modules add behavior around the core without the core knowing
//! about them: gesture wakeup, firmware update, proximity handling and the
//! like. Hooks run in registration order; the first module to cancel wins.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use touch_hal::HardwareOps;
use uuid::Uuid;

/// Registered module identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(Uuid);

impl ModuleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module:{}", self.0)
    }
}

/// Verdict of a hook that may stop further processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleAction {
    Continue,
    Cancel,
}

/// Result of running a cancellable hook chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    Cancelled,
}

/// Optional hook set contributed by an extension module
///
/// Every hook has a no-op default, so a module only implements what it needs.
pub trait ExtensionModule: Send {
    fn name(&self) -> &str;

    /// Runs before the core reads the event of an interrupt
    ///
    /// Returning [`ModuleAction::Cancel`] skips the event read for this
    /// occurrence.
    fn on_interrupt(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
        ModuleAction::Continue
    }

    /// Runs before suspend; `Cancel` keeps the device active
    fn before_suspend(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
        ModuleAction::Continue
    }

    fn after_suspend(&mut self, _hw: &mut dyn HardwareOps) {}

    /// Runs before resume; `Cancel` keeps the device suspended
    fn before_resume(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
        ModuleAction::Continue
    }

    fn after_resume(&mut self, _hw: &mut dyn HardwareOps) {}

    /// Runs once when the module leaves the registry
    fn on_teardown(&mut self) {}
}

struct Entry {
    id: ModuleId,
    module: Box<dyn ExtensionModule>,
}

/// Ordered collection of extension modules
///
/// Registration order is the only priority.
#[derive(Default)]
pub struct ExtensionRegistry {
    entries: Vec<Entry>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a module to the chain
    pub fn register(&mut self, module: Box<dyn ExtensionModule>) -> ModuleId {
        let id = ModuleId::new();
        debug!("registering extension {} as {}", module.name(), id);
        self.entries.push(Entry { id, module });
        id
    }

    /// Removes a module, running its teardown hook
    ///
    /// Returns `None` if no module has this id.
    pub fn unregister(&mut self, id: ModuleId) -> Option<Box<dyn ExtensionModule>> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        let mut entry = self.entries.remove(index);
        debug!("unregistering extension {}", entry.module.name());
        entry.module.on_teardown();
        Some(entry.module)
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Module names in dispatch order
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.module.name().to_string())
            .collect()
    }

    pub fn dispatch_interrupt(&mut self, hw: &mut dyn HardwareOps) -> Dispatch {
        self.run_until_cancel(hw, "interrupt", |module, hw| module.on_interrupt(hw))
    }

    pub fn dispatch_before_suspend(&mut self, hw: &mut dyn HardwareOps) -> Dispatch {
        self.run_until_cancel(hw, "suspend", |module, hw| module.before_suspend(hw))
    }

    pub fn dispatch_after_suspend(&mut self, hw: &mut dyn HardwareOps) {
        for entry in &mut self.entries {
            entry.module.after_suspend(hw);
        }
    }

    pub fn dispatch_before_resume(&mut self, hw: &mut dyn HardwareOps) -> Dispatch {
        self.run_until_cancel(hw, "resume", |module, hw| module.before_resume(hw))
    }

    pub fn dispatch_after_resume(&mut self, hw: &mut dyn HardwareOps) {
        for entry in &mut self.entries {
            entry.module.after_resume(hw);
        }
    }

    /// Tears down every module, last registered first, and empties the registry
    pub fn teardown_all(&mut self) {
        while let Some(mut entry) = self.entries.pop() {
            debug!("tearing down extension {}", entry.module.name());
            entry.module.on_teardown();
        }
    }

    fn run_until_cancel<F>(&mut self, hw: &mut dyn HardwareOps, what: &str, mut hook: F) -> Dispatch
    where
        F: FnMut(&mut dyn ExtensionModule, &mut dyn HardwareOps) -> ModuleAction,
    {
        for entry in &mut self.entries {
            if hook(entry.module.as_mut(), hw) == ModuleAction::Cancel {
                debug!("{} cancelled by extension {}", what, entry.module.name());
                return Dispatch::Cancelled;
            }
        }
        Dispatch::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_touch::{Call, CallLog, SimBus, SimChip};

    /// Module recording its hooks, cancelling interrupts on chosen occurrences
    struct Recorder {
        name: String,
        log: CallLog,
        cancel_on: Vec<usize>,
        seen: usize,
    }

    impl Recorder {
        fn boxed(name: &str, log: &CallLog) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                log: log.clone(),
                cancel_on: Vec::new(),
                seen: 0,
            })
        }

        fn hook(&self, hook: &'static str) {
            self.log.record(Call::Hook {
                module: self.name.clone(),
                hook,
            });
        }
    }

    impl ExtensionModule for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_interrupt(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
            self.seen += 1;
            self.hook("interrupt");
            if self.cancel_on.contains(&self.seen) {
                ModuleAction::Cancel
            } else {
                ModuleAction::Continue
            }
        }

        fn before_suspend(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
            self.hook("before_suspend");
            ModuleAction::Continue
        }

        fn on_teardown(&mut self) {
            self.hook("teardown");
        }
    }

    /// Module implementing no hooks at all
    struct Silent;

    impl ExtensionModule for Silent {
        fn name(&self) -> &str {
            "silent"
        }
    }

    fn hw(log: &CallLog) -> SimChip {
        SimChip::new("sim", SimBus::new(), log.clone())
    }

    fn hooks(log: &CallLog) -> Vec<(String, &'static str)> {
        log.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Hook { module, hook } => Some((module, hook)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = CallLog::new();
        let mut registry = ExtensionRegistry::new();
        registry.register(Recorder::boxed("a", &log));
        registry.register(Box::new(Silent));
        registry.register(Recorder::boxed("b", &log));

        assert_eq!(registry.dispatch_interrupt(&mut hw(&log)), Dispatch::Continue);
        assert_eq!(
            hooks(&log),
            vec![("a".to_string(), "interrupt"), ("b".to_string(), "interrupt")]
        );
        assert_eq!(registry.names(), vec!["a", "silent", "b"]);
    }

    #[test]
    fn test_cancel_stops_iteration() {
        let log = CallLog::new();
        let mut registry = ExtensionRegistry::new();
        let mut first = Recorder::boxed("first", &log);
        first.cancel_on = vec![1];
        registry.register(first);
        registry.register(Recorder::boxed("second", &log));

        let mut chip = hw(&log);
        assert_eq!(registry.dispatch_interrupt(&mut chip), Dispatch::Cancelled);
        assert_eq!(hooks(&log), vec![("first".to_string(), "interrupt")]);

        log.clear();
        assert_eq!(registry.dispatch_interrupt(&mut chip), Dispatch::Continue);
        assert_eq!(hooks(&log).len(), 2);
    }

    #[test]
    fn test_empty_registry_continues() {
        let log = CallLog::new();
        let mut registry = ExtensionRegistry::new();
        let mut chip = hw(&log);
        assert_eq!(registry.dispatch_interrupt(&mut chip), Dispatch::Continue);
        assert_eq!(registry.dispatch_before_suspend(&mut chip), Dispatch::Continue);
        assert_eq!(registry.dispatch_before_resume(&mut chip), Dispatch::Continue);
    }

    #[test]
    fn test_unregister_runs_teardown() {
        let log = CallLog::new();
        let mut registry = ExtensionRegistry::new();
        let id = registry.register(Recorder::boxed("fw", &log));
        assert!(registry.contains(id));

        let module = registry.unregister(id).unwrap();
        assert_eq!(module.name(), "fw");
        assert!(registry.is_empty());
        assert_eq!(hooks(&log), vec![("fw".to_string(), "teardown")]);
        assert!(registry.unregister(id).is_none());
    }

    #[test]
    fn test_teardown_all_in_reverse_order() {
        let log = CallLog::new();
        let mut registry = ExtensionRegistry::new();
        registry.register(Recorder::boxed("a", &log));
        registry.register(Recorder::boxed("b", &log));
        registry.register(Recorder::boxed("c", &log));

        registry.teardown_all();
        assert!(registry.is_empty());
        assert_eq!(
            hooks(&log),
            vec![
                ("c".to_string(), "teardown"),
                ("b".to_string(), "teardown"),
                ("a".to_string(), "teardown"),
            ]
        );
    }

    #[test]
    fn test_module_ids_unique() {
        assert_ne!(ModuleId::new(), ModuleId::new());
        assert!(ModuleId::new().to_string().starts_with("module:"));
    }
}
