//! Gesture dispatch engine.
//!
//! Maps gesture scancodes to actions, optionally holds each gesture behind a
//! proximity "far" confirmation, and fires the action through an external
//! executor with haptic confirmation. All events flow through a single actor
//! (`DispatchService`) so at most one gesture is in flight at any time.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod haptic;
pub mod intent_spec;
pub mod ports;
pub mod proximity;
pub mod service;
pub mod state;
pub mod target;
pub mod torch;

pub use catalog::{Action, ActionCatalog, ActionKind, AppCategory, AppRef, MediaKey};
pub use engine::{DispatchEngine, DispatchOutcome, DispatchStart, GateTicket, Submission};
pub use error::{ActionError, IntentSpecError, PortError, RequestError};
pub use haptic::HapticFeedback;
pub use intent_spec::{ExtraValue, IntentSpec};
pub use ports::{
    ActionExecutor, ActionResult, Capability, ProximitySensorPort, VibrationPort, WakeLockPort,
};
pub use proximity::{GateVerdict, ProximityGate};
pub use service::{DispatchHandle, DispatchService};
pub use state::{EngineState, PendingRequest, RequestState};
pub use target::{Resolution, SkipReason};
pub use torch::TorchState;
