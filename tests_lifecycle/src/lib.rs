//! Lifecycle Test Utilities
//!
//! Shared fixtures for the cross-crate integration tests.
//!
//! ## Test Philosophy
//!
//! - **Observable ordering**: every hardware side effect is checked through
//!   one shared call log
//! - **Deterministic failures**: all bus faults come from a `FaultPlan`
//! - **No leaks**: rails end switched off and lines end released, whatever
//!   path bring-up or teardown took

use sim_touch::{Call, CallLog, SimBus, SimChip, SimInputSink, SimPlatform};
use touch_core::{BoardConfig, CoreError, ExtensionModule, ModuleAction, TouchCore};
use touch_hal::HardwareOps;
use touch_types::PanelGeometry;

/// Installs the test logger once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Board description matching [`SimPlatform::standard`]
pub fn standard_config() -> BoardConfig {
    let mut config = BoardConfig::new(
        "samp-ts",
        2,
        PanelGeometry {
            max_x: 1080,
            max_y: 2340,
            max_w: 255,
            max_p: 255,
            max_id: 10,
        },
    );
    config.reset_gpio = Some(1);
    config.avdd_name = Some("avdd".to_string());
    config.vbus_name = Some("vbus".to_string());
    config
}

/// Simulated board plus handles to observe it
pub struct TestBoard {
    pub log: CallLog,
    pub platform: SimPlatform,
    pub bus: SimBus,
    pub sink: SimInputSink,
}

impl TestBoard {
    pub fn new(platform: SimPlatform) -> Self {
        init_logging();
        let log = platform.log().clone();
        Self {
            sink: SimInputSink::new(log.clone()),
            bus: SimBus::new(),
            platform,
            log,
        }
    }

    /// Board with both rails, both pin states, reset and interrupt lines
    pub fn standard() -> Self {
        Self::new(SimPlatform::standard(CallLog::new()))
    }

    pub fn chip(&self) -> SimChip {
        SimChip::new("sim-gt", self.bus.clone(), self.log.clone())
    }

    pub fn bring_up(&mut self, config: BoardConfig) -> Result<TouchCore, CoreError> {
        let chip = self.chip();
        self.bring_up_with(config, chip)
    }

    pub fn bring_up_with(
        &mut self,
        config: BoardConfig,
        chip: SimChip,
    ) -> Result<TouchCore, CoreError> {
        TouchCore::bring_up(
            config,
            &mut self.platform,
            Box::new(chip),
            Box::new(self.sink.clone()),
        )
    }

    /// Rail enable/disable calls, in order
    pub fn rail_calls(&self) -> Vec<Call> {
        self.log
            .filtered(|c| matches!(c, Call::RegulatorEnable(_) | Call::RegulatorDisable(_)))
    }
}

/// Extension module recording its hooks
///
/// Cancels the interrupt hook on the occurrences listed in `cancel_on`
/// (1-based).
pub struct RecordingModule {
    name: String,
    log: CallLog,
    cancel_on: Vec<usize>,
    interrupts: usize,
}

impl RecordingModule {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            cancel_on: Vec::new(),
            interrupts: 0,
        }
    }

    pub fn cancelling_on(mut self, occurrences: &[usize]) -> Self {
        self.cancel_on = occurrences.to_vec();
        self
    }

    fn record(&self, hook: &'static str) {
        self.log.record(Call::Hook {
            module: self.name.clone(),
            hook,
        });
    }
}

impl ExtensionModule for RecordingModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_interrupt(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
        self.interrupts += 1;
        self.record("interrupt");
        if self.cancel_on.contains(&self.interrupts) {
            ModuleAction::Cancel
        } else {
            ModuleAction::Continue
        }
    }

    fn before_suspend(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
        self.record("before_suspend");
        ModuleAction::Continue
    }

    fn after_suspend(&mut self, _hw: &mut dyn HardwareOps) {
        self.record("after_suspend");
    }

    fn before_resume(&mut self, _hw: &mut dyn HardwareOps) -> ModuleAction {
        self.record("before_resume");
        ModuleAction::Continue
    }

    fn after_resume(&mut self, _hw: &mut dyn HardwareOps) {
        self.record("after_resume");
    }

    fn on_teardown(&mut self) {
        self.record("teardown");
    }
}

/// Hook names recorded for `module`, in order
pub fn hooks_of(log: &CallLog, module: &str) -> Vec<&'static str> {
    log.calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Hook { module: m, hook } if m == module => Some(hook),
            _ => None,
        })
        .collect()
}
