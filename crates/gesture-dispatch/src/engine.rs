//! Gesture dispatch state machine.
//!
//! The `DispatchEngine` owns the single pending request slot. It is driven by
//! the dispatch actor in three steps:
//! - `submit` classifies a raw event and may open a request,
//! - `resolve_gate` applies a proximity verdict to a gated request,
//! - `begin_dispatch` resolves the action target and marks the request
//!   `Dispatching`; `finish_dispatch` takes the executor result, confirms
//!   and frees the slot.
//!
//! While a request occupies the slot every other event is dropped, including
//! while its executor call is still running.

use std::sync::Arc;
use std::time::Duration;

use gesture_core::{GestureEvent, PreferenceStore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{Action, ActionCatalog};
use crate::error::ActionError;
use crate::haptic::HapticFeedback;
use crate::ports::{ActionExecutor, ActionResult};
use crate::proximity::{GateVerdict, ProximityGate};
use crate::state::{EngineState, PendingRequest, RequestState};
use crate::target::{self, Resolution};
use crate::torch::TorchState;

/// A gated request waiting for its proximity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTicket {
    pub id: Uuid,
    pub timeout: Duration,
}

/// How the engine took an incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Scancode is not a gesture.
    NotHandled,
    /// Gesture key press; only the release triggers an action.
    Acknowledged,
    /// Dropped because another request is pending.
    Suppressed,
    /// Waiting on a proximity check.
    Gated(GateTicket),
    /// Cleared to dispatch immediately.
    Ready(Uuid),
}

impl Submission {
    /// Whether the event belongs to the gesture device.
    pub fn is_handled(&self) -> bool {
        !matches!(self, Submission::NotHandled)
    }
}

/// Result of the dispatch step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action took effect.
    Executed,
    /// The executor ran but reported that nothing happened.
    Declined(String),
    /// The action had no usable target.
    Unresolvable(String),
    /// The executor failed.
    Failed(String),
    /// The id does not match a ready request.
    Stale,
}

/// What the dispatch step does next.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchStart {
    /// Run this resolved action and hand the result to `finish_dispatch`.
    Execute(Action),
    /// Nothing to execute.
    Finished(DispatchOutcome),
}

pub struct DispatchEngine {
    catalog: ActionCatalog,
    gate: ProximityGate,
    executor: Arc<dyn ActionExecutor>,
    haptic: HapticFeedback,
    prefs: Arc<dyn PreferenceStore>,
    torch: Arc<TorchState>,
    pending: Option<PendingRequest>,
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("gestures", &self.catalog.len())
            .field("gate_enabled", &self.gate.is_enabled())
            .field("torch", &self.torch)
            .field("pending", &self.pending)
            .finish()
    }
}

impl DispatchEngine {
    pub fn new(
        catalog: ActionCatalog,
        gate: ProximityGate,
        executor: Arc<dyn ActionExecutor>,
        haptic: HapticFeedback,
        prefs: Arc<dyn PreferenceStore>,
        torch: Arc<TorchState>,
    ) -> Self {
        Self {
            catalog,
            gate,
            executor,
            haptic,
            prefs,
            torch,
            pending: None,
        }
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn executor(&self) -> Arc<dyn ActionExecutor> {
        Arc::clone(&self.executor)
    }

    pub fn gate(&self) -> &ProximityGate {
        &self.gate
    }

    pub fn torch(&self) -> &Arc<TorchState> {
        &self.torch
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn current_state(&self) -> EngineState {
        self.pending
            .as_ref()
            .map(PendingRequest::engine_state)
            .unwrap_or(EngineState::Idle)
    }

    /// Classify `event` and open a request for a released gesture.
    pub fn submit(&mut self, event: &GestureEvent) -> Submission {
        let Some(action) = self.catalog.lookup(event.scancode) else {
            debug!(scancode = %event.scancode, "Ignoring non-gesture scancode");
            return Submission::NotHandled;
        };

        if !event.is_release() {
            return Submission::Acknowledged;
        }

        if let Some(pending) = &self.pending {
            debug!(
                scancode = %event.scancode,
                pending_id = %pending.id,
                pending_state = %pending.state(),
                "Dropping gesture while another is pending"
            );
            return Submission::Suppressed;
        }

        let gated = action.needs_confirmation && self.gate.is_enabled();
        let state = if gated {
            RequestState::AwaitingProximity
        } else {
            RequestState::Ready
        };
        let request = PendingRequest::new(event.scancode, action.clone(), state);
        let id = request.id;

        info!(
            request_id = %id,
            gesture = request.action.gesture,
            action = %request.action.kind,
            gated,
            "Gesture accepted"
        );
        self.pending = Some(request);

        if gated {
            Submission::Gated(GateTicket {
                id,
                timeout: self.gate.timeout(),
            })
        } else {
            Submission::Ready(id)
        }
    }

    /// Apply a proximity verdict. Returns true when the request is now ready.
    ///
    /// Verdicts for a request that is no longer pending are ignored.
    pub fn resolve_gate(&mut self, id: Uuid, verdict: GateVerdict) -> bool {
        let request = match self.pending.as_mut() {
            Some(request) if request.id == id => request,
            _ => {
                debug!(request_id = %id, verdict = %verdict, "Ignoring verdict for stale request");
                return false;
            }
        };

        if verdict.allows_dispatch() {
            return match request.advance(RequestState::Ready) {
                Ok(()) => true,
                Err(e) => {
                    warn!(request_id = %id, error = %e, "Verdict ignored");
                    false
                }
            };
        }

        if let Err(e) = request.advance(RequestState::Discarded) {
            warn!(request_id = %id, error = %e, "Verdict ignored");
            return false;
        }
        info!(
            request_id = %id,
            gesture = request.action.gesture,
            "Gesture discarded, no far reading before timeout"
        );
        self.pending = None;
        false
    }

    /// Start running the ready request `id`.
    ///
    /// On `Execute` the request stays in the slot as `Dispatching` until
    /// `finish_dispatch` reports the executor result, so gestures arriving
    /// meanwhile are suppressed.
    pub fn begin_dispatch(&mut self, id: Uuid) -> DispatchStart {
        let request = match self.pending.as_mut() {
            Some(request) if request.id == id && request.state() == RequestState::Ready => request,
            _ => {
                debug!(request_id = %id, "Dispatch for stale request");
                return DispatchStart::Finished(DispatchOutcome::Stale);
            }
        };

        match target::resolve(&request.action, self.prefs.as_ref(), &self.torch) {
            Resolution::Ready(action) => {
                if let Err(e) = request.advance(RequestState::Dispatching) {
                    warn!(request_id = %id, error = %e, "Dispatch ignored");
                    return DispatchStart::Finished(DispatchOutcome::Stale);
                }
                debug!(request_id = %id, action = %action.kind, "Executing gesture action");
                DispatchStart::Execute(action)
            }
            Resolution::Skipped(reason) => {
                info!(request_id = %id, gesture = request.action.gesture, %reason, "Gesture skipped");
                self.pending = None;
                DispatchStart::Finished(DispatchOutcome::Unresolvable(reason.to_string()))
            }
        }
    }

    /// Record the executor result for the dispatching request `id` and free
    /// the slot. Haptic confirmation fires only when the action executed.
    pub fn finish_dispatch(
        &mut self,
        id: Uuid,
        action: &Action,
        result: Result<ActionResult, ActionError>,
    ) -> DispatchOutcome {
        let dispatching = matches!(
            &self.pending,
            Some(request) if request.id == id && request.state() == RequestState::Dispatching
        );
        if !dispatching {
            debug!(request_id = %id, "Executor result for stale request");
            return DispatchOutcome::Stale;
        }
        self.pending = None;

        match result {
            Ok(result) if result.executed => {
                info!(
                    request_id = %id,
                    action = %action.kind,
                    message = %result.message,
                    "Gesture action executed"
                );
                self.haptic.confirm();
                DispatchOutcome::Executed
            }
            Ok(result) => {
                info!(request_id = %id, action = %action.kind, message = %result.message, "Gesture action had no effect");
                DispatchOutcome::Declined(result.message)
            }
            Err(ActionError::Unresolvable(unresolved)) => {
                warn!(request_id = %id, action = %action.kind, %unresolved, "Gesture target unresolvable");
                DispatchOutcome::Unresolvable(unresolved)
            }
            Err(e) => {
                warn!(request_id = %id, action = %action.kind, error = %e, "Gesture action failed");
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Drop whatever request holds the slot. Used when the task driving it died.
    pub fn abandon_pending(&mut self) -> Option<PendingRequest> {
        let request = self.pending.take()?;
        warn!(request_id = %request.id, state = %request.state(), "Pending gesture abandoned");
        Some(request)
    }

    /// Run the ready request `id` to completion in place.
    pub async fn dispatch(&mut self, id: Uuid) -> DispatchOutcome {
        match self.begin_dispatch(id) {
            DispatchStart::Execute(action) => {
                let result = self.executor.perform(&action).await;
                self.finish_dispatch(id, &action, result)
            }
            DispatchStart::Finished(outcome) => outcome,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
