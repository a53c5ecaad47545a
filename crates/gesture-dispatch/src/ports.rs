//! Platform ports consumed by the dispatcher.
//!
//! Everything with a side effect outside the process sits behind one of these
//! traits. Services that may be missing on a given device are wrapped in
//! `Capability` and probed once at construction.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::catalog::Action;
use crate::error::{ActionError, PortError};

/// A platform service that may be absent on this device.
#[derive(Debug, Clone)]
pub enum Capability<T> {
    Available(T),
    Unavailable,
}

impl<T> Capability<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Capability::Available(v),
            None => Capability::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Capability::Available(v) => Some(v),
            Capability::Unavailable => None,
        }
    }
}

/// Outcome reported by the executor for a single action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    /// Whether the action actually took effect. Gates haptic confirmation.
    pub executed: bool,
    pub message: String,
}

impl ActionResult {
    pub fn executed(message: impl Into<String>) -> Self {
        Self {
            executed: true,
            message: message.into(),
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            executed: false,
            message: message.into(),
        }
    }
}

/// Performs resolved actions on the host platform.
///
/// Owns all platform side effects: media session dispatch, activity launch,
/// broadcasts, torch control, keyguard dismissal and screen wake.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn perform(&self, action: &Action) -> Result<ActionResult, ActionError>;
}

/// Proximity sensor access.
pub trait ProximitySensorPort: Send + Sync {
    /// Reading that means "nothing in front of the sensor".
    fn maximum_range(&self) -> f32;

    /// Start receiving samples. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<f32>, PortError>;
}

/// Vibration motor.
pub trait VibrationPort: Send + Sync {
    fn pulse(&self, duration: Duration);
}

/// Partial wake-lock keeping the CPU awake while a sensor read is in flight.
pub trait WakeLockPort: Send + Sync {
    fn acquire(&self, tag: &'static str);
    fn release(&self, tag: &'static str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_from_option() {
        let present = Capability::from_option(Some(5));
        assert!(present.is_available());
        assert_eq!(present.available(), Some(&5));

        let absent: Capability<i32> = Capability::from_option(None);
        assert!(!absent.is_available());
        assert_eq!(absent.available(), None);
    }

    #[test]
    fn test_action_result_constructors() {
        let done = ActionResult::executed("launched");
        assert!(done.executed);
        assert_eq!(done.message, "launched");

        let skipped = ActionResult::skipped("no activity");
        assert!(!skipped.executed);
    }
}
