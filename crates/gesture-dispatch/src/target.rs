//! Resolve catalog actions against user settings and device state.

use std::fmt;

use gesture_core::PreferenceStore;

use crate::catalog::{Action, ActionKind, AppRef};
use crate::error::IntentSpecError;
use crate::intent_spec::IntentSpec;
use crate::torch::TorchState;

/// Sentinel a user can store to mean "no target".
const DEFAULT_TARGET: &str = "default";

/// Why a gesture produced no action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The setting backing the target is missing, empty or `default`.
    NotConfigured(&'static str),
    /// The setting holds an `intent:` URI that does not parse.
    InvalidIntent(IntentSpecError),
    /// The device has no rear camera with a torch.
    NoTorchCamera,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotConfigured(key) => write!(f, "no target configured for {}", key),
            SkipReason::InvalidIntent(e) => write!(f, "invalid intent target: {}", e),
            SkipReason::NoTorchCamera => write!(f, "no rear camera torch"),
        }
    }
}

/// Result of resolving a catalog action.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Ready(Action),
    Skipped(SkipReason),
}

/// Turn a catalog action into something the executor can run.
pub fn resolve(action: &Action, prefs: &dyn PreferenceStore, torch: &TorchState) -> Resolution {
    match &action.kind {
        ActionKind::LaunchApp(AppRef::UserTarget(key)) => resolve_user_target(action, key, prefs),
        ActionKind::LaunchApp(AppRef::DefaultFor(key)) => {
            match prefs.get_string(key).filter(|v| !v.is_empty()) {
                Some(package) => {
                    Resolution::Ready(action.with_kind(ActionKind::LaunchApp(AppRef::Package(package))))
                }
                None => Resolution::Skipped(SkipReason::NotConfigured(key)),
            }
        }
        ActionKind::ToggleTorch if torch.camera_id().is_none() => {
            Resolution::Skipped(SkipReason::NoTorchCamera)
        }
        _ => Resolution::Ready(action.clone()),
    }
}

fn resolve_user_target(action: &Action, key: &'static str, prefs: &dyn PreferenceStore) -> Resolution {
    let value = match prefs.get_string(key) {
        Some(v) if !v.is_empty() && v != DEFAULT_TARGET => v,
        _ => return Resolution::Skipped(SkipReason::NotConfigured(key)),
    };

    if IntentSpec::is_intent_uri(&value) {
        return match IntentSpec::parse(&value) {
            Ok(spec) => Resolution::Ready(action.with_kind(ActionKind::LaunchByIntentSpec(spec))),
            Err(e) => Resolution::Skipped(SkipReason::InvalidIntent(e)),
        };
    }

    Resolution::Ready(action.with_kind(ActionKind::LaunchApp(AppRef::Package(value))))
}
