//! Flashlight state shared between the torch-status callback and the executor.

use std::sync::atomic::{AtomicBool, Ordering};

/// Last known torch mode of the rear camera.
///
/// The platform reports torch changes for every camera; only changes for the
/// rear camera are recorded. The dispatch engine reads this state but never
/// writes it.
#[derive(Debug)]
pub struct TorchState {
    camera_id: Option<String>,
    enabled: AtomicBool,
}

impl TorchState {
    /// `camera_id` is the back-facing camera, or `None` if the device has none.
    pub fn new(camera_id: Option<String>) -> Self {
        Self {
            camera_id,
            enabled: AtomicBool::new(false),
        }
    }

    pub fn camera_id(&self) -> Option<&str> {
        self.camera_id.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Torch-status callback: mode changed on `camera_id`.
    pub fn on_mode_changed(&self, camera_id: &str, enabled: bool) {
        if !self.is_rear(camera_id) {
            return;
        }
        tracing::debug!(camera_id, enabled, "Torch mode changed");
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Torch-status callback: torch became unavailable on `camera_id`.
    pub fn on_unavailable(&self, camera_id: &str) {
        if !self.is_rear(camera_id) {
            return;
        }
        tracing::debug!(camera_id, "Torch unavailable");
        self.enabled.store(false, Ordering::Release);
    }

    /// Record the mode the executor just set.
    pub fn record_toggle(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn is_rear(&self, camera_id: &str) -> bool {
        self.camera_id.as_deref() == Some(camera_id)
    }
}
