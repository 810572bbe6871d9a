//! Recording input sink

use crate::call_log::{Call, CallLog};
use crate::lock;
use std::sync::{Arc, Mutex};
use touch_hal::{HalError, InputSink};
use touch_types::{InputCapabilities, TouchFrame};

#[derive(Debug, Default)]
struct SinkState {
    capabilities: Option<InputCapabilities>,
    frames: Vec<TouchFrame>,
}

/// Input sink that keeps everything it is given
///
/// Clones share the same recorded state.
#[derive(Debug, Clone, Default)]
pub struct SimInputSink {
    state: Arc<Mutex<SinkState>>,
    log: CallLog,
    reject_configure: bool,
}

impl SimInputSink {
    pub fn new(log: CallLog) -> Self {
        Self {
            state: Arc::default(),
            log,
            reject_configure: false,
        }
    }

    /// Makes `configure` fail, as an input layer refusing registration would
    pub fn rejecting_configure(mut self) -> Self {
        self.reject_configure = true;
        self
    }

    pub fn capabilities(&self) -> Option<InputCapabilities> {
        lock(&self.state).capabilities.clone()
    }

    pub fn frames(&self) -> Vec<TouchFrame> {
        lock(&self.state).frames.clone()
    }

    pub fn last_frame(&self) -> Option<TouchFrame> {
        lock(&self.state).frames.last().cloned()
    }
}

impl InputSink for SimInputSink {
    fn configure(&mut self, capabilities: &InputCapabilities) -> Result<(), HalError> {
        self.log.record(Call::Configure);
        if self.reject_configure {
            return Err(HalError::Device("input device registration refused".to_string()));
        }
        lock(&self.state).capabilities = Some(capabilities.clone());
        Ok(())
    }

    fn report(&mut self, frame: &TouchFrame) {
        self.log.record(Call::Report {
            touches: frame.touch_count(),
        });
        lock(&self.state).frames.push(frame.clone());
    }
}
