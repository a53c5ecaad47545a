//! Error types for the dispatch engine.
//!
//! None of these cross the input boundary: the engine logs them and reports
//! only whether an event was handled.

use crate::state::RequestState;

/// Errors reported by an `ActionExecutor`.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action target could not be resolved: {0}")]
    Unresolvable(String),
    #[error("Platform service unavailable: {0}")]
    PlatformUnavailable(&'static str),
    #[error("Action execution failed: {0}")]
    ExecutionFailed(String),
}

/// Errors from platform ports.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Port unavailable: {0}")]
    Unavailable(&'static str),
    #[error("Sensor subscription failed: {0}")]
    SubscriptionFailed(String),
}

/// Errors from parsing an `intent:` launch target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentSpecError {
    #[error("Intent URI must start with 'intent:'")]
    MissingScheme,
    #[error("Intent URI has no '#Intent;' fragment")]
    MissingFragment,
    #[error("Intent URI fragment is not terminated by 'end'")]
    Unterminated,
    #[error("Malformed intent URI token: {0}")]
    MalformedToken(String),
    #[error("Invalid launch flags: {0}")]
    InvalidFlags(String),
    #[error("Invalid extra '{key}': {value}")]
    InvalidExtra { key: String, value: String },
}

/// Errors from the pending request lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid request transition: {0} -> {1}")]
    InvalidTransition(RequestState, RequestState),
}
