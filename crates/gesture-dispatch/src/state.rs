//! Pending request lifecycle and the engine's observable state.
//!
//! A request only moves forward:
//! - AwaitingProximity -> Ready (gate approved or bypassed)
//! - AwaitingProximity -> Discarded (gate timed out)
//! - Ready -> Dispatching (executor started)
//!
//! A dispatching request keeps the slot until the executor returns.

use std::fmt;

use chrono::{DateTime, Utc};
use gesture_core::Scancode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Action;
use crate::error::RequestError;

/// State of the single in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Waiting for a "far" proximity reading.
    AwaitingProximity,
    /// Cleared to run; the dispatch step has not yet taken it.
    Ready,
    /// The executor is running.
    Dispatching,
    /// Dropped without running.
    Discarded,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::AwaitingProximity => write!(f, "awaiting_proximity"),
            RequestState::Ready => write!(f, "ready"),
            RequestState::Dispatching => write!(f, "dispatching"),
            RequestState::Discarded => write!(f, "discarded"),
        }
    }
}

impl RequestState {
    pub fn can_transition_to(&self, target: &RequestState) -> bool {
        matches!(
            (self, target),
            (RequestState::AwaitingProximity, RequestState::Ready)
                | (RequestState::AwaitingProximity, RequestState::Discarded)
                | (RequestState::Ready, RequestState::Dispatching)
        )
    }
}

/// Engine state as seen from outside, derived from the pending slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    AwaitingProximity,
    Dispatching,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Idle => write!(f, "Idle"),
            EngineState::AwaitingProximity => write!(f, "AwaitingProximity"),
            EngineState::Dispatching => write!(f, "Dispatching"),
        }
    }
}

/// The gesture currently being handled.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: Uuid,
    pub scancode: Scancode,
    pub action: Action,
    pub created_at: DateTime<Utc>,
    state: RequestState,
}

impl PendingRequest {
    pub fn new(scancode: Scancode, action: Action, state: RequestState) -> Self {
        Self {
            id: Uuid::new_v4(),
            scancode,
            action,
            created_at: Utc::now(),
            state,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Move to `target`, rejecting backward or repeated transitions.
    pub fn advance(&mut self, target: RequestState) -> Result<(), RequestError> {
        if !self.state.can_transition_to(&target) {
            return Err(RequestError::InvalidTransition(self.state, target));
        }
        tracing::debug!(request_id = %self.id, "Request state: {} -> {}", self.state, target);
        self.state = target;
        Ok(())
    }

    pub fn engine_state(&self) -> EngineState {
        match self.state {
            RequestState::AwaitingProximity => EngineState::AwaitingProximity,
            RequestState::Ready | RequestState::Dispatching | RequestState::Discarded => {
                EngineState::Dispatching
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionKind, SLIDE_O};

    fn torch_request(state: RequestState) -> PendingRequest {
        PendingRequest::new(
            SLIDE_O,
            Action::new("slide_o", ActionKind::ToggleTorch, false),
            state,
        )
    }

    #[test]
    fn test_request_state_display() {
        assert_eq!(RequestState::AwaitingProximity.to_string(), "awaiting_proximity");
        assert_eq!(RequestState::Ready.to_string(), "ready");
        assert_eq!(RequestState::Discarded.to_string(), "discarded");
        assert_eq!(RequestState::Dispatching.to_string(), "dispatching");
    }

    #[test]
    fn test_engine_state_display() {
        assert_eq!(EngineState::Idle.to_string(), "Idle");
        assert_eq!(EngineState::AwaitingProximity.to_string(), "AwaitingProximity");
        assert_eq!(EngineState::Dispatching.to_string(), "Dispatching");
    }

    #[test]
    fn test_forward_transitions() {
        assert!(RequestState::AwaitingProximity.can_transition_to(&RequestState::Ready));
        assert!(RequestState::AwaitingProximity.can_transition_to(&RequestState::Discarded));
        assert!(RequestState::Ready.can_transition_to(&RequestState::Dispatching));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        assert!(!RequestState::Ready.can_transition_to(&RequestState::AwaitingProximity));
        assert!(!RequestState::Discarded.can_transition_to(&RequestState::AwaitingProximity));
        assert!(!RequestState::Discarded.can_transition_to(&RequestState::Ready));
        assert!(!RequestState::Ready.can_transition_to(&RequestState::Discarded));
        assert!(!RequestState::Ready.can_transition_to(&RequestState::Ready));
        assert!(!RequestState::AwaitingProximity.can_transition_to(&RequestState::Dispatching));
        assert!(!RequestState::Dispatching.can_transition_to(&RequestState::Ready));
        assert!(!RequestState::Dispatching.can_transition_to(&RequestState::Dispatching));
    }

    #[test]
    fn test_advance() {
        let mut request = torch_request(RequestState::AwaitingProximity);
        assert_eq!(request.engine_state(), EngineState::AwaitingProximity);

        request.advance(RequestState::Ready).unwrap();
        assert_eq!(request.state(), RequestState::Ready);
        assert_eq!(request.engine_state(), EngineState::Dispatching);

        let err = request.advance(RequestState::Discarded).unwrap_err();
        assert!(matches!(
            err,
            RequestError::InvalidTransition(RequestState::Ready, RequestState::Discarded)
        ));
        assert_eq!(request.state(), RequestState::Ready);

        request.advance(RequestState::Dispatching).unwrap();
        assert_eq!(request.engine_state(), EngineState::Dispatching);
    }

    #[test]
    fn test_requests_get_unique_ids() {
        let a = torch_request(RequestState::Ready);
        let b = torch_request(RequestState::Ready);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&RequestState::AwaitingProximity).unwrap();
        assert_eq!(json, "\"awaiting_proximity\"");
        let state: EngineState = serde_json::from_str("\"dispatching\"").unwrap();
        assert_eq!(state, EngineState::Dispatching);
    }
}
