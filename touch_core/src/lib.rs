//! # Touch Core
//!
//! Orchestration core of the touch-controller stack.
//!
//! ## Philosophy
//!
//! - **One owner**: a single [`TouchCore`] owns every resource it acquired
//! - **Idempotent transitions**: enabling, disabling, suspending and resuming
//!   twice has the side effect once
//! - **Ordered rollback**: a failed bring-up leaves no rail switched on
//! - **Pluggable**: extension modules hook interrupts and power transitions
//!
//! ## Core Concepts
//!
//! - [`BoardConfig`]: immutable board description loaded from JSON
//! - [`ExtensionRegistry`]: ordered chain of [`ExtensionModule`]s
//! - [`InterruptGate`]: compare-and-swap guarded interrupt line
//! - [`PowerRails`] / [`PinStates`] / [`GpioPins`]: lifecycle resources
//! - [`SuspendController`]: Active/Suspended state machine
//! - [`TriggerAdapter`]: maps host power events to transitions
//! - [`CoreWorker`]: runs a core on its own thread behind a [`CoreHandle`]
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A wire decoder for any controller family
//! - A sysfs/diagnostic attribute surface
//! - A device-tree parser

pub mod config;
pub mod error;
pub mod extension;
pub mod irq;
pub mod orchestrator;
pub mod pins;
pub mod power;
pub mod suspend;
pub mod trigger;
pub mod worker;

pub use config::BoardConfig;
pub use error::{ConfigError, CoreError, WorkerError};
pub use extension::{Dispatch, ExtensionModule, ExtensionRegistry, ModuleAction, ModuleId};
pub use irq::{process_interrupt, DispatchOutcome, InterruptGate};
pub use orchestrator::TouchCore;
pub use pins::{GpioPins, PinStates, PINCTRL_STATE_ACTIVE, PINCTRL_STATE_SUSPEND};
pub use power::PowerRails;
pub use suspend::{Phase, SuspendController, TransitionOutcome, TransitionParts};
pub use trigger::{
    BlankState, DisplayBlankTrigger, EarlySuspendTrigger, PowerEvent, SystemPmTrigger, Transition,
    TriggerAdapter, TriggerKind,
};
pub use worker::{CoreHandle, CoreWorker};
