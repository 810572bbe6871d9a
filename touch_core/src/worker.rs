//! Single-writer core worker
//!
//! Interrupt handling and sleep/wake transitions arrive from different
//! contexts. The worker owns the [`TouchCore`] on a dedicated thread and
//! applies requests one at a time, so a suspend can never overlap an
//! in-flight interrupt dispatch.
//!
//! ```text
//! irq context / notifier          core worker thread
//!        │                              │
//!        │  CoreHandle::suspend()       │
//!        │─────────────────────────────>│ TouchCore::suspend()
//!        │                              │
//!        │  TransitionOutcome           │
//!        │<─────────────────────────────│
//! ```

use crate::error::WorkerError;
use crate::extension::{ExtensionModule, ModuleId};
use crate::irq::DispatchOutcome;
use crate::orchestrator::TouchCore;
use crate::suspend::TransitionOutcome;
use crate::trigger::PowerEvent;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info};
use std::thread::{self, JoinHandle};
use touch_types::ChipInfo;

enum Command {
    Interrupt(Sender<DispatchOutcome>),
    Suspend(Sender<TransitionOutcome>),
    Resume(Sender<TransitionOutcome>),
    EnableIrq(bool, Sender<bool>),
    Notify(PowerEvent, Sender<Option<TransitionOutcome>>),
    Register(Box<dyn ExtensionModule>, Sender<ModuleId>),
    Unregister(ModuleId, Sender<Option<Box<dyn ExtensionModule>>>),
    ChipInfo(Sender<ChipInfo>),
    Shutdown,
}

/// Cloneable handle submitting requests to a [`CoreWorker`]
///
/// Every call blocks until the worker has applied the request.
#[derive(Clone)]
pub struct CoreHandle {
    commands: Sender<Command>,
}

impl CoreHandle {
    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T, WorkerError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.commands
            .send(make(reply_tx))
            .map_err(|_| WorkerError::Stopped)?;
        reply_rx.recv().map_err(|_| WorkerError::Stopped)
    }

    pub fn handle_interrupt(&self) -> Result<DispatchOutcome, WorkerError> {
        self.request(Command::Interrupt)
    }

    pub fn suspend(&self) -> Result<TransitionOutcome, WorkerError> {
        self.request(Command::Suspend)
    }

    pub fn resume(&self) -> Result<TransitionOutcome, WorkerError> {
        self.request(Command::Resume)
    }

    /// Returns true if the line actually changed state
    pub fn enable_interrupt(&self, enable: bool) -> Result<bool, WorkerError> {
        self.request(|reply| Command::EnableIrq(enable, reply))
    }

    pub fn notify(&self, event: PowerEvent) -> Result<Option<TransitionOutcome>, WorkerError> {
        self.request(|reply| Command::Notify(event, reply))
    }

    pub fn register(&self, module: Box<dyn ExtensionModule>) -> Result<ModuleId, WorkerError> {
        self.request(|reply| Command::Register(module, reply))
    }

    pub fn unregister(
        &self,
        id: ModuleId,
    ) -> Result<Option<Box<dyn ExtensionModule>>, WorkerError> {
        self.request(|reply| Command::Unregister(id, reply))
    }

    pub fn chip_info(&self) -> Result<ChipInfo, WorkerError> {
        self.request(Command::ChipInfo)
    }
}

/// Runs a [`TouchCore`] on its own thread
pub struct CoreWorker {
    handle: CoreHandle,
    thread: Option<JoinHandle<()>>,
}

impl CoreWorker {
    /// Moves `core` onto a new worker thread
    pub fn spawn(core: TouchCore) -> Result<Self, WorkerError> {
        let (commands, inbox) = unbounded();
        let thread = thread::Builder::new()
            .name("touch-core".to_string())
            .spawn(move || Self::run(core, inbox))?;

        Ok(Self {
            handle: CoreHandle { commands },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> CoreHandle {
        self.handle.clone()
    }

    /// Stops the worker, tearing the core down
    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), WorkerError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        // The worker may already be gone; joining tells us how it ended
        let _ = self.handle.commands.send(Command::Shutdown);
        thread.join().map_err(|_| WorkerError::Panicked)
    }

    fn run(mut core: TouchCore, inbox: Receiver<Command>) {
        info!("core worker started");
        // Reply send errors mean the requester gave up waiting; nothing to do
        for command in inbox.iter() {
            match command {
                Command::Interrupt(reply) => {
                    let _ = reply.send(core.handle_interrupt());
                }
                Command::Suspend(reply) => {
                    let _ = reply.send(core.suspend());
                }
                Command::Resume(reply) => {
                    let _ = reply.send(core.resume());
                }
                Command::EnableIrq(enable, reply) => {
                    let _ = reply.send(core.enable_interrupt(enable));
                }
                Command::Notify(event, reply) => {
                    let _ = reply.send(core.notify(&event));
                }
                Command::Register(module, reply) => {
                    let _ = reply.send(core.register(module));
                }
                Command::Unregister(id, reply) => {
                    let _ = reply.send(core.unregister(id));
                }
                Command::ChipInfo(reply) => {
                    let _ = reply.send(core.chip_info());
                }
                Command::Shutdown => {
                    debug!("core worker shutting down");
                    break;
                }
            }
        }
        core.teardown();
        info!("core worker stopped");
    }
}

impl Drop for CoreWorker {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            error!("core worker did not stop cleanly: {}", err);
        }
    }
}
