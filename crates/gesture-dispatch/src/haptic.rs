//! Haptic confirmation after a gesture action runs.

use std::sync::Arc;
use std::time::Duration;

use gesture_core::preferences::TOUCHSCREEN_GESTURE_HAPTIC_FEEDBACK;
use gesture_core::PreferenceStore;

use crate::ports::{Capability, VibrationPort};

pub const CONFIRM_PULSE: Duration = Duration::from_millis(50);

pub struct HapticFeedback {
    vibrator: Capability<Arc<dyn VibrationPort>>,
    prefs: Arc<dyn PreferenceStore>,
}

impl HapticFeedback {
    pub fn new(vibrator: Capability<Arc<dyn VibrationPort>>, prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { vibrator, prefs }
    }

    /// Buzz once if the device has a vibrator and the user wants feedback.
    pub fn confirm(&self) {
        let Some(vibrator) = self.vibrator.available() else {
            return;
        };
        if !self.prefs.get_bool(TOUCHSCREEN_GESTURE_HAPTIC_FEEDBACK, true) {
            tracing::trace!("Haptic feedback disabled by preference");
            return;
        }
        vibrator.pulse(CONFIRM_PULSE);
    }
}
