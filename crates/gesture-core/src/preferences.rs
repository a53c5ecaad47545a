//! User preference storage.
//!
//! The dispatcher reads a handful of settings at event time: whether the
//! proximity check is enabled, whether haptic confirmation is enabled, and the
//! per-gesture launch targets. `PreferenceStore` is the port; the in-memory
//! implementation is seeded from the `[preferences]` config table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Runtime toggle for the proximity check on gesture wake.
pub const PROXIMITY_ON_WAKE: &str = "proximity_on_wake";
/// Runtime toggle for the confirmation buzz.
pub const TOUCHSCREEN_GESTURE_HAPTIC_FEEDBACK: &str = "touchscreen_gesture_haptic_feedback";
/// Package name of the default SMS application.
pub const SMS_DEFAULT_APPLICATION: &str = "sms_default_application";
pub const GESTURE_W_TARGET: &str = "touchscreen_gesture_w_intent";
pub const GESTURE_Z_TARGET: &str = "touchscreen_gesture_z_intent";
pub const GESTURE_V_TARGET: &str = "touchscreen_gesture_v_intent";
pub const GESTURE_S_TARGET: &str = "touchscreen_gesture_s_intent";

/// Read access to user settings.
pub trait PreferenceStore: Send + Sync {
    /// Returns the boolean value of `key`, or `default` when unset.
    fn get_bool(&self, key: &str, default: bool) -> bool;

    /// Returns the string value of `key`, or `None` when unset.
    fn get_string(&self, key: &str) -> Option<String>;
}

/// A single stored setting.
///
/// Integers are accepted for boolean keys (non-zero is true), matching how
/// system settings tables store flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceValue::Bool(b) => write!(f, "{}", b),
            PreferenceValue::Int(i) => write!(f, "{}", i),
            PreferenceValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for PreferenceValue {
    fn from(value: bool) -> Self {
        PreferenceValue::Bool(value)
    }
}

impl From<i64> for PreferenceValue {
    fn from(value: i64) -> Self {
        PreferenceValue::Int(value)
    }
}

impl From<&str> for PreferenceValue {
    fn from(value: &str) -> Self {
        PreferenceValue::Str(value.to_string())
    }
}

impl From<String> for PreferenceValue {
    fn from(value: String) -> Self {
        PreferenceValue::Str(value)
    }
}

/// Thread-safe in-memory preference store.
#[derive(Debug, Default)]
pub struct InMemoryPreferences {
    values: RwLock<HashMap<String, PreferenceValue>>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a config table.
    pub fn from_map(map: &BTreeMap<String, PreferenceValue>) -> Self {
        let values = map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<HashMap<_, _>>();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Insert or replace a value.
    pub fn set(&self, key: &str, value: impl Into<PreferenceValue>) {
        let value = value.into();
        tracing::debug!(key, value = %value, "Preference updated");
        self.values
            .write()
            .expect("preferences lock poisoned")
            .insert(key.to_string(), value);
    }

    /// Remove a value, returning it if present.
    pub fn remove(&self, key: &str) -> Option<PreferenceValue> {
        self.values
            .write()
            .expect("preferences lock poisoned")
            .remove(key)
    }

    fn get(&self, key: &str) -> Option<PreferenceValue> {
        self.values
            .read()
            .expect("preferences lock poisoned")
            .get(key)
            .cloned()
    }
}

impl PreferenceStore for InMemoryPreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(PreferenceValue::Bool(b)) => b,
            Some(PreferenceValue::Int(i)) => i != 0,
            Some(PreferenceValue::Str(s)) => match s.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => default,
            },
            None => default,
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string())
    }
}
