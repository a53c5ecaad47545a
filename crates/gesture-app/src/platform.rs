//! Simulated platform services for running the dispatcher off-device.
//!
//! Actions are logged rather than performed. The device description comes
//! from the `[device]` config section.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gesture_core::config::DeviceConfig;
use gesture_dispatch::{
    Action, ActionError, ActionExecutor, ActionKind, ActionResult, AppCategory, AppRef,
    IntentSpec, PortError, ProximitySensorPort, TorchState, VibrationPort, WakeLockPort,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// How long the gesture wake lock is held after an action starts.
const GESTURE_WAKE_LOCK: Duration = Duration::from_millis(3000);

pub const GESTURE_WAKE_LOCK_TAG: &str = "GestureWakeLock";

pub struct SimulatedExecutor {
    installed_packages: HashSet<String>,
    email_package: Option<String>,
    torch: Arc<TorchState>,
    wake_lock: Arc<dyn WakeLockPort>,
}

impl SimulatedExecutor {
    pub fn new(
        device: &DeviceConfig,
        torch: Arc<TorchState>,
        wake_lock: Arc<dyn WakeLockPort>,
    ) -> Self {
        Self {
            installed_packages: device.installed_packages.iter().cloned().collect(),
            email_package: device.email_package.clone(),
            torch,
            wake_lock,
        }
    }

    /// Hold the gesture wake lock for `GESTURE_WAKE_LOCK`, then release it.
    fn hold_wake_lock(&self, action: &Action) {
        self.wake_lock.acquire(GESTURE_WAKE_LOCK_TAG);
        debug!(
            gesture = action.gesture,
            hold_ms = GESTURE_WAKE_LOCK.as_millis() as u64,
            "Gesture wake lock held"
        );
        let wake_lock = Arc::clone(&self.wake_lock);
        tokio::spawn(async move {
            tokio::time::sleep(GESTURE_WAKE_LOCK).await;
            wake_lock.release(GESTURE_WAKE_LOCK_TAG);
        });
    }

    fn wake_for(&self, action: &Action) {
        self.hold_wake_lock(action);
        if action.requires_unlock {
            info!(gesture = action.gesture, "Waking screen and dismissing insecure keyguard");
        }
    }

    fn launch_package(&self, action: &Action, package: &str) -> Result<ActionResult, ActionError> {
        self.wake_for(action);
        if !self.installed_packages.contains(package) {
            return Err(ActionError::Unresolvable(package.to_string()));
        }
        info!(package, "Starting launcher activity");
        Ok(ActionResult::executed(format!("launched {}", package)))
    }

    fn launch_category(&self, action: &Action, category: AppCategory) -> Result<ActionResult, ActionError> {
        self.wake_for(action);
        match &self.email_package {
            Some(package) if category == AppCategory::Email => {
                info!(package = %package, category = category.intent_category(), "Starting activity for category");
                Ok(ActionResult::executed(format!("launched {}", package)))
            }
            _ => Ok(ActionResult::skipped(format!(
                "no activity handles {}",
                category.intent_category()
            ))),
        }
    }

    fn launch_intent(&self, action: &Action, spec: &IntentSpec) -> Result<ActionResult, ActionError> {
        self.wake_for(action);
        let package = spec
            .package
            .as_deref()
            .or_else(|| spec.component.as_deref().and_then(|c| c.split('/').next()));
        if let Some(package) = package {
            if !self.installed_packages.contains(package) {
                return Err(ActionError::Unresolvable(spec.to_string()));
            }
        }
        info!(
            intent = %spec,
            action = spec.action.as_deref().unwrap_or(""),
            flags = spec.launch_flags,
            extras = spec.extras.len(),
            "Starting activity from intent URI"
        );
        Ok(ActionResult::executed(format!("launched {}", spec)))
    }
}

#[async_trait]
impl ActionExecutor for SimulatedExecutor {
    async fn perform(&self, action: &Action) -> Result<ActionResult, ActionError> {
        match &action.kind {
            ActionKind::ToggleTorch => {
                let camera_id = self
                    .torch
                    .camera_id()
                    .ok_or(ActionError::PlatformUnavailable("rear camera"))?;
                self.hold_wake_lock(action);
                let enabled = !self.torch.is_enabled();
                self.torch.record_toggle(enabled);
                info!(camera_id, enabled, "Torch mode set");
                Ok(ActionResult::executed(format!(
                    "torch {}",
                    if enabled { "on" } else { "off" }
                )))
            }
            ActionKind::MediaKey(key) => {
                info!(key = %key, keycode = key.keycode(), "Media button down/up sent to session");
                Ok(ActionResult::executed(format!("media key {}", key)))
            }
            ActionKind::BroadcastSystemEvent { name, permission } => {
                self.hold_wake_lock(action);
                info!(
                    broadcast = %name,
                    permission = permission.as_deref().unwrap_or("none"),
                    "Broadcast sent"
                );
                Ok(ActionResult::executed(format!("broadcast {}", name)))
            }
            ActionKind::LaunchApp(AppRef::Package(package)) => self.launch_package(action, package),
            ActionKind::LaunchApp(AppRef::Category(category)) => {
                self.launch_category(action, *category)
            }
            ActionKind::LaunchApp(unresolved) => {
                Err(ActionError::Unresolvable(unresolved.to_string()))
            }
            ActionKind::LaunchByIntentSpec(spec) => self.launch_intent(action, spec),
        }
    }
}

/// Proximity sensor fed by `prox` input lines.
pub struct SimulatedProximitySensor {
    maximum_range: f32,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<f32>>>,
}

impl SimulatedProximitySensor {
    pub fn new(maximum_range: f32) -> Self {
        Self {
            maximum_range,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Deliver a sample to every live subscriber. Returns the number reached.
    pub fn emit(&self, value: f32) -> usize {
        let mut subscribers = self.subscribers.lock().expect("sensor lock poisoned");
        subscribers.retain(|tx| tx.send(value).is_ok());
        subscribers.len()
    }
}

impl ProximitySensorPort for SimulatedProximitySensor {
    fn maximum_range(&self) -> f32 {
        self.maximum_range
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<f32>, PortError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("sensor lock poisoned")
            .push(tx);
        debug!("Proximity listener registered");
        Ok(rx)
    }
}

pub struct LogVibrator;

impl VibrationPort for LogVibrator {
    fn pulse(&self, duration: Duration) {
        info!(duration_ms = duration.as_millis() as u64, "Vibrate");
    }
}

pub struct LogWakeLock;

impl WakeLockPort for LogWakeLock {
    fn acquire(&self, tag: &'static str) {
        debug!(tag, "Wake lock acquired");
    }

    fn release(&self, tag: &'static str) {
        debug!(tag, "Wake lock released");
    }
}
