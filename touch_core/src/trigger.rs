//! Sleep/wake trigger sources
//!
//! Exactly one source drives suspend and resume; which one is chosen by the
//! board configuration. Each adapter maps the host events of its own source
//! to a [`Transition`] and ignores everything else.

use serde::{Deserialize, Serialize};

/// Which host mechanism drives suspend/resume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// System power-management suspend/resume callbacks
    #[default]
    SystemPm,
    /// Display blank/unblank notifications
    DisplayBlank,
    /// Legacy early-suspend/late-resume
    EarlySuspend,
}

/// Display blanking level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankState {
    Unblank,
    Normal,
    VsyncSuspend,
    HsyncSuspend,
    Powerdown,
}

/// Power event delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerEvent {
    PmSuspend,
    PmResume,
    /// Display blank notification; `early` is the pre-change notification
    Blank { early: bool, state: BlankState },
    EarlySuspend,
    LateResume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Suspend,
    Resume,
}

/// Maps host power events to transitions
pub trait TriggerAdapter: Send {
    fn kind(&self) -> TriggerKind;

    /// Returns the transition requested by `event`, if any
    fn notify(&mut self, event: &PowerEvent) -> Option<Transition>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPmTrigger;

impl TriggerAdapter for SystemPmTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::SystemPm
    }

    fn notify(&mut self, event: &PowerEvent) -> Option<Transition> {
        match event {
            PowerEvent::PmSuspend => Some(Transition::Suspend),
            PowerEvent::PmResume => Some(Transition::Resume),
            _ => None,
        }
    }
}

/// Follows the display: unblank resumes, powerdown suspends
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayBlankTrigger;

impl TriggerAdapter for DisplayBlankTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::DisplayBlank
    }

    fn notify(&mut self, event: &PowerEvent) -> Option<Transition> {
        match event {
            PowerEvent::Blank {
                early: false,
                state: BlankState::Unblank,
            } => Some(Transition::Resume),
            PowerEvent::Blank {
                early: false,
                state: BlankState::Powerdown,
            } => Some(Transition::Suspend),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EarlySuspendTrigger;

impl TriggerAdapter for EarlySuspendTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::EarlySuspend
    }

    fn notify(&mut self, event: &PowerEvent) -> Option<Transition> {
        match event {
            PowerEvent::EarlySuspend => Some(Transition::Suspend),
            PowerEvent::LateResume => Some(Transition::Resume),
            _ => None,
        }
    }
}

impl TriggerKind {
    /// Creates the adapter for this source
    pub fn adapter(self) -> Box<dyn TriggerAdapter> {
        match self {
            Self::SystemPm => Box::new(SystemPmTrigger),
            Self::DisplayBlank => Box::new(DisplayBlankTrigger),
            Self::EarlySuspend => Box::new(EarlySuspendTrigger),
        }
    }
}
