//! Gesture scancode to action table.
//!
//! The table is built once at construction and never changes. Entries whose
//! target depends on user settings (`AppRef::DefaultFor`, `AppRef::UserTarget`)
//! are resolved at dispatch time by [`crate::target`].

use std::collections::HashMap;
use std::fmt;

use gesture_core::preferences::{
    GESTURE_S_TARGET, GESTURE_V_TARGET, GESTURE_W_TARGET, GESTURE_Z_TARGET,
    SMS_DEFAULT_APPLICATION,
};
use gesture_core::Scancode;
use tracing::warn;

use crate::intent_spec::IntentSpec;

// Scancodes emitted by the touchscreen gesture driver.
pub const SLIDE_DOWN: Scancode = Scancode(249);
pub const SLIDE_LEFT: Scancode = Scancode(250);
pub const SLIDE_RIGHT: Scancode = Scancode(251);
pub const SLIDE_C: Scancode = Scancode(252);
pub const SLIDE_O: Scancode = Scancode(253);
pub const SLIDE_M: Scancode = Scancode(254);
pub const SLIDE_E: Scancode = Scancode(256);
pub const SLIDE_W: Scancode = Scancode(257);
pub const SLIDE_Z: Scancode = Scancode(258);
pub const SLIDE_V: Scancode = Scancode(259);
pub const SLIDE_S: Scancode = Scancode(260);

pub const CAMERA_GESTURE_ACTION: &str = "cyanogenmod.intent.action.SCREEN_CAMERA_GESTURE";
pub const STATUS_BAR_SERVICE_PERMISSION: &str = "android.permission.STATUS_BAR_SERVICE";

/// Media transport keys sent to the active media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKey {
    PlayPause,
    Previous,
    Next,
}

impl MediaKey {
    /// Platform key code for the media button event.
    pub fn keycode(&self) -> u32 {
        match self {
            MediaKey::PlayPause => 85,
            MediaKey::Next => 87,
            MediaKey::Previous => 88,
        }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKey::PlayPause => write!(f, "play_pause"),
            MediaKey::Previous => write!(f, "previous"),
            MediaKey::Next => write!(f, "next"),
        }
    }
}

/// Application roles resolved by the platform's intent matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppCategory {
    Email,
}

impl AppCategory {
    pub fn intent_category(&self) -> &'static str {
        match self {
            AppCategory::Email => "android.intent.category.APP_EMAIL",
        }
    }
}

/// Which application a launch action refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppRef {
    /// Whatever app handles the category.
    Category(AppCategory),
    /// A concrete package name.
    Package(String),
    /// The package named by a settings entry.
    DefaultFor(&'static str),
    /// A user-configured target: package name or `intent:` URI.
    UserTarget(&'static str),
}

impl fmt::Display for AppRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppRef::Category(c) => write!(f, "category:{}", c.intent_category()),
            AppRef::Package(p) => write!(f, "package:{}", p),
            AppRef::DefaultFor(key) => write!(f, "default_for:{}", key),
            AppRef::UserTarget(key) => write!(f, "user_target:{}", key),
        }
    }
}

/// What an action does.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    ToggleTorch,
    MediaKey(MediaKey),
    LaunchApp(AppRef),
    LaunchByIntentSpec(IntentSpec),
    BroadcastSystemEvent {
        name: String,
        permission: Option<String>,
    },
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::ToggleTorch => write!(f, "toggle_torch"),
            ActionKind::MediaKey(key) => write!(f, "media_key({})", key),
            ActionKind::LaunchApp(app) => write!(f, "launch_app({})", app),
            ActionKind::LaunchByIntentSpec(spec) => write!(f, "launch_intent({})", spec),
            ActionKind::BroadcastSystemEvent { name, .. } => write!(f, "broadcast({})", name),
        }
    }
}

/// A gesture's action descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Short gesture name, used in logs.
    pub gesture: &'static str,
    pub kind: ActionKind,
    /// The screen must be woken and the keyguard dismissed before acting.
    pub requires_unlock: bool,
    /// The action waits for the proximity gate when the gate is enabled.
    pub needs_confirmation: bool,
}

impl Action {
    pub fn new(gesture: &'static str, kind: ActionKind, requires_unlock: bool) -> Self {
        Self {
            gesture,
            kind,
            requires_unlock,
            needs_confirmation: true,
        }
    }

    /// Copy of this action with a different kind, keeping the descriptor flags.
    pub fn with_kind(&self, kind: ActionKind) -> Self {
        Self {
            gesture: self.gesture,
            kind,
            requires_unlock: self.requires_unlock,
            needs_confirmation: self.needs_confirmation,
        }
    }
}

/// Lookup table from scancode to action.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    actions: HashMap<Scancode, Action>,
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionCatalog {
    /// Build the catalog of the eleven supported gestures.
    pub fn new() -> Self {
        let entries = [
            (
                SLIDE_DOWN,
                Action::new("slide_down", ActionKind::MediaKey(MediaKey::PlayPause), false),
            ),
            (
                SLIDE_LEFT,
                Action::new("slide_left", ActionKind::MediaKey(MediaKey::Previous), false),
            ),
            (
                SLIDE_RIGHT,
                Action::new("slide_right", ActionKind::MediaKey(MediaKey::Next), false),
            ),
            (
                SLIDE_C,
                Action::new(
                    "slide_c",
                    ActionKind::BroadcastSystemEvent {
                        name: CAMERA_GESTURE_ACTION.to_string(),
                        permission: Some(STATUS_BAR_SERVICE_PERMISSION.to_string()),
                    },
                    false,
                ),
            ),
            (SLIDE_O, Action::new("slide_o", ActionKind::ToggleTorch, false)),
            (
                SLIDE_M,
                Action::new(
                    "slide_m",
                    ActionKind::LaunchApp(AppRef::DefaultFor(SMS_DEFAULT_APPLICATION)),
                    true,
                ),
            ),
            (
                SLIDE_E,
                Action::new(
                    "slide_e",
                    ActionKind::LaunchApp(AppRef::Category(AppCategory::Email)),
                    true,
                ),
            ),
            (
                SLIDE_W,
                Action::new(
                    "slide_w",
                    ActionKind::LaunchApp(AppRef::UserTarget(GESTURE_W_TARGET)),
                    true,
                ),
            ),
            (
                SLIDE_Z,
                Action::new(
                    "slide_z",
                    ActionKind::LaunchApp(AppRef::UserTarget(GESTURE_Z_TARGET)),
                    true,
                ),
            ),
            (
                SLIDE_V,
                Action::new(
                    "slide_v",
                    ActionKind::LaunchApp(AppRef::UserTarget(GESTURE_V_TARGET)),
                    true,
                ),
            ),
            (
                SLIDE_S,
                Action::new(
                    "slide_s",
                    ActionKind::LaunchApp(AppRef::UserTarget(GESTURE_S_TARGET)),
                    true,
                ),
            ),
        ];

        Self {
            actions: entries.into_iter().collect(),
        }
    }

    /// Exempt the named gestures from the proximity check.
    ///
    /// Unknown names are logged and ignored.
    pub fn without_confirmation<S: AsRef<str>>(mut self, gestures: &[S]) -> Self {
        for name in gestures.iter().map(AsRef::as_ref) {
            let mut found = false;
            for action in self.actions.values_mut().filter(|a| a.gesture == name) {
                action.needs_confirmation = false;
                found = true;
            }
            if !found {
                warn!(gesture = name, "Unknown gesture in ungated list");
            }
        }
        self
    }

    /// Returns the action bound to `scancode`, if any.
    pub fn lookup(&self, scancode: Scancode) -> Option<&Action> {
        self.actions.get(&scancode)
    }

    pub fn is_supported(&self, scancode: Scancode) -> bool {
        self.actions.contains_key(&scancode)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Supported scancodes in ascending order.
    pub fn scancodes(&self) -> Vec<Scancode> {
        let mut codes: Vec<Scancode> = self.actions.keys().copied().collect();
        codes.sort();
        codes
    }
}
