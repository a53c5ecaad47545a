use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::GestureError;

// =============================================================================
// Scancode
// =============================================================================

/// Raw hardware identifier reported by the gesture sensor driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scancode(pub u32);

impl fmt::Display for Scancode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Scancode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

// =============================================================================
// KeyTransition
// =============================================================================

/// Physical key transition carried by an input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyTransition {
    Down,
    Up,
}

impl fmt::Display for KeyTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyTransition::Down => write!(f, "down"),
            KeyTransition::Up => write!(f, "up"),
        }
    }
}

impl FromStr for KeyTransition {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "down" => Ok(KeyTransition::Down),
            "up" => Ok(KeyTransition::Up),
            _ => Err(GestureError::InvalidInput(format!(
                "Unknown key transition: {}",
                s
            ))),
        }
    }
}

// =============================================================================
// GestureEvent
// =============================================================================

/// A single key transition from the gesture surface.
///
/// Created at the input boundary and consumed once by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub scancode: Scancode,
    pub transition: KeyTransition,
    #[serde(default = "now_millis")]
    pub timestamp_millis: i64,
}

impl GestureEvent {
    pub fn new(scancode: impl Into<Scancode>, transition: KeyTransition) -> Self {
        Self {
            scancode: scancode.into(),
            transition,
            timestamp_millis: now_millis(),
        }
    }

    pub fn key_down(scancode: impl Into<Scancode>) -> Self {
        Self::new(scancode, KeyTransition::Down)
    }

    pub fn key_up(scancode: impl Into<Scancode>) -> Self {
        Self::new(scancode, KeyTransition::Up)
    }

    pub fn is_release(&self) -> bool {
        self.transition == KeyTransition::Up
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
