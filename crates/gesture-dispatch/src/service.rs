//! Dispatch actor.
//!
//! `DispatchService` owns the engine and processes commands one at a time from
//! a single channel, so the pending-request slot needs no lock. Proximity
//! checks and executor calls run on their own tasks and report back through
//! the same channel, so the actor keeps draining (and suppressing) gestures
//! while either is in progress.
//! `DispatchHandle` is the cheap, cloneable front door used by input sources
//! and platform callbacks.

use std::sync::Arc;

use gesture_core::{GestureError, GestureEvent, Result};
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{Action, ActionCatalog};
use crate::engine::{DispatchEngine, DispatchStart, GateTicket, Submission};
use crate::error::ActionError;
use crate::ports::ActionResult;
use crate::proximity::GateVerdict;
use crate::state::EngineState;

#[derive(Debug)]
enum Command {
    Gesture(GestureEvent),
    GateResolved { id: Uuid, verdict: GateVerdict },
    Dispatch(Uuid),
    Executed {
        id: Uuid,
        action: Action,
        result: std::result::Result<ActionResult, ActionError>,
    },
    TorchChanged { camera_id: String, enabled: bool },
    TorchUnavailable { camera_id: String },
    /// Reply once the engine is idle.
    Settle(oneshot::Sender<()>),
}

/// Sender side of the dispatch actor.
#[derive(Clone)]
pub struct DispatchHandle {
    commands: mpsc::UnboundedSender<Command>,
    catalog: Arc<ActionCatalog>,
    shutdown: Arc<Notify>,
}

impl DispatchHandle {
    /// Hand a raw key event to the dispatcher.
    ///
    /// Returns whether the scancode belongs to the gesture device. Never
    /// blocks; the event is processed on the actor.
    pub fn submit(&self, event: GestureEvent) -> bool {
        if !self.catalog.is_supported(event.scancode) {
            return false;
        }
        if self.commands.send(Command::Gesture(event)).is_err() {
            warn!(scancode = %event.scancode, "Dispatch service stopped, dropping gesture");
        }
        true
    }

    /// Torch-status callback: mode changed on `camera_id`.
    pub fn torch_changed(&self, camera_id: impl Into<String>, enabled: bool) {
        self.send(Command::TorchChanged {
            camera_id: camera_id.into(),
            enabled,
        });
    }

    /// Torch-status callback: torch became unavailable on `camera_id`.
    pub fn torch_unavailable(&self, camera_id: impl Into<String>) {
        self.send(Command::TorchUnavailable {
            camera_id: camera_id.into(),
        });
    }

    /// Wait until every event sent so far has been fully handled and no
    /// request is pending.
    pub async fn settle(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Settle(tx))
            .map_err(|_| GestureError::ShuttingDown)?;
        rx.await.map_err(|_| GestureError::ShuttingDown)
    }

    /// Signal the service to stop.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Dispatch service stopped, dropping command");
        }
    }
}

/// The dispatch actor.
pub struct DispatchService {
    engine: DispatchEngine,
    commands: mpsc::UnboundedReceiver<Command>,
    loopback: mpsc::UnboundedSender<Command>,
    shutdown: Arc<Notify>,
    tasks: JoinSet<()>,
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl DispatchService {
    pub fn new(engine: DispatchEngine) -> (Self, DispatchHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());
        let handle = DispatchHandle {
            commands: tx.clone(),
            catalog: Arc::new(engine.catalog().clone()),
            shutdown: Arc::clone(&shutdown),
        };
        let service = Self {
            engine,
            commands: rx,
            loopback: tx,
            shutdown,
            tasks: JoinSet::new(),
            idle_waiters: Vec::new(),
        };
        (service, handle)
    }

    /// Process commands until shutdown.
    ///
    /// Proximity checks still running at shutdown are cancelled, which
    /// releases their wake locks and sensor subscriptions. An executor call
    /// still in flight is cancelled with them.
    pub async fn run(mut self) {
        info!(
            gestures = self.engine.catalog().len(),
            proximity_gate = self.engine.gate().is_enabled(),
            "Dispatch service started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => break,
                Some(command) = self.commands.recv() => {
                    self.handle(command);
                    self.notify_if_idle();
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Background task failed");
                        self.engine.abandon_pending();
                        self.notify_if_idle();
                    }
                }
                else => break,
            }
        }

        self.tasks.shutdown().await;
        info!(state = %self.engine.current_state(), "Dispatch service stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Gesture(event) => match self.engine.submit(&event) {
                Submission::Gated(ticket) => self.start_gate_check(ticket),
                Submission::Ready(id) => self.enqueue(Command::Dispatch(id)),
                Submission::Suppressed => {
                    debug!(scancode = %event.scancode, "Gesture suppressed");
                }
                Submission::NotHandled | Submission::Acknowledged => {}
            },
            Command::GateResolved { id, verdict } => {
                if self.engine.resolve_gate(id, verdict) {
                    self.enqueue(Command::Dispatch(id));
                }
            }
            Command::Dispatch(id) => match self.engine.begin_dispatch(id) {
                DispatchStart::Execute(action) => self.start_execution(id, action),
                DispatchStart::Finished(outcome) => {
                    debug!(request_id = %id, ?outcome, "Dispatch finished");
                }
            },
            Command::Executed { id, action, result } => {
                let outcome = self.engine.finish_dispatch(id, &action, result);
                debug!(request_id = %id, ?outcome, "Dispatch finished");
            }
            Command::TorchChanged { camera_id, enabled } => {
                self.engine.torch().on_mode_changed(&camera_id, enabled);
            }
            Command::TorchUnavailable { camera_id } => {
                self.engine.torch().on_unavailable(&camera_id);
            }
            Command::Settle(reply) => self.idle_waiters.push(reply),
        }
    }

    fn start_gate_check(&mut self, ticket: GateTicket) {
        let gate = self.engine.gate().clone();
        let loopback = self.loopback.clone();
        self.tasks.spawn(async move {
            let verdict = gate.check(ticket.timeout).await;
            // The service may already be gone; the verdict is then moot.
            let _ = loopback.send(Command::GateResolved {
                id: ticket.id,
                verdict,
            });
        });
    }

    fn start_execution(&mut self, id: Uuid, action: Action) {
        let executor = self.engine.executor();
        let loopback = self.loopback.clone();
        self.tasks.spawn(async move {
            let result = executor.perform(&action).await;
            let _ = loopback.send(Command::Executed { id, action, result });
        });
    }

    fn enqueue(&self, command: Command) {
        // The service holds the receiver, so this only fails during teardown.
        let _ = self.loopback.send(command);
    }

    fn notify_if_idle(&mut self) {
        if self.engine.current_state() != EngineState::Idle || self.idle_waiters.is_empty() {
            return;
        }
        for waiter in self.idle_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
