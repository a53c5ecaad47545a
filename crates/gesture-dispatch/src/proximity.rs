//! Proximity "far" confirmation.
//!
//! When enabled, a gesture is only acted on once the proximity sensor reports
//! its maximum range, meaning nothing covers the screen. This filters out
//! gestures drawn by a pocket or a palm. The check holds a wake lock while it
//! waits and gives up after a timeout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use gesture_core::config::ProximityConfig;
use gesture_core::preferences::PROXIMITY_ON_WAKE;
use gesture_core::PreferenceStore;
use serde::{Deserialize, Serialize};
use tokio::time;
use tracing::{debug, info, warn};

use crate::ports::{Capability, ProximitySensorPort, WakeLockPort};

pub const PROXIMITY_WAKE_LOCK_TAG: &str = "ProximityWakeLock";

/// Outcome of a proximity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    /// A "far" sample arrived before the timeout.
    Approved,
    /// No "far" sample arrived in time.
    TimedOut,
    /// The sensor could not be read; the request proceeds as if ungated.
    Bypassed,
}

impl GateVerdict {
    /// Whether the request may run.
    pub fn allows_dispatch(&self) -> bool {
        matches!(self, GateVerdict::Approved | GateVerdict::Bypassed)
    }
}

impl fmt::Display for GateVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateVerdict::Approved => write!(f, "approved"),
            GateVerdict::TimedOut => write!(f, "timed_out"),
            GateVerdict::Bypassed => write!(f, "bypassed"),
        }
    }
}

/// Holds a wake lock for its lifetime.
struct WakeLockGuard {
    port: Arc<dyn WakeLockPort>,
    tag: &'static str,
}

impl WakeLockGuard {
    fn acquire(port: Arc<dyn WakeLockPort>, tag: &'static str) -> Self {
        port.acquire(tag);
        Self { port, tag }
    }
}

impl Drop for WakeLockGuard {
    fn drop(&mut self) {
        self.port.release(self.tag);
    }
}

/// Decides whether a gesture needs a proximity check and runs it.
#[derive(Clone)]
pub struct ProximityGate {
    sensor: Capability<Arc<dyn ProximitySensorPort>>,
    wake_lock: Arc<dyn WakeLockPort>,
    prefs: Arc<dyn PreferenceStore>,
    config: ProximityConfig,
}

impl ProximityGate {
    pub fn new(
        sensor: Capability<Arc<dyn ProximitySensorPort>>,
        wake_lock: Arc<dyn WakeLockPort>,
        prefs: Arc<dyn PreferenceStore>,
        config: ProximityConfig,
    ) -> Self {
        Self {
            sensor,
            wake_lock,
            prefs,
            config,
        }
    }

    /// True when the device has a sensor, the build supports the check and
    /// the user has turned it on.
    pub fn is_enabled(&self) -> bool {
        self.sensor.is_available()
            && self.config.supported
            && self
                .prefs
                .get_bool(PROXIMITY_ON_WAKE, self.config.enabled_by_default)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    /// Wait up to `timeout` for a "far" reading.
    ///
    /// Readings below the maximum range are ignored. The wake lock is released
    /// and the sensor subscription dropped before this returns, whatever the
    /// verdict.
    pub async fn check(&self, timeout: Duration) -> GateVerdict {
        let Some(sensor) = self.sensor.available() else {
            warn!("Proximity check requested without a sensor, bypassing");
            return GateVerdict::Bypassed;
        };

        let _wake_lock = WakeLockGuard::acquire(self.wake_lock.clone(), PROXIMITY_WAKE_LOCK_TAG);

        let mut samples = match sensor.subscribe() {
            Ok(rx) => rx,
            Err(e) => {
                warn!(error = %e, "Proximity subscription failed, bypassing gate");
                return GateVerdict::Bypassed;
            }
        };
        let far = sensor.maximum_range();

        let wait_for_far = async {
            loop {
                match samples.recv().await {
                    Some(value) if value == far => break,
                    Some(value) => debug!(value, far, "Proximity sample is near, still waiting"),
                    // Sensor went quiet; only the timeout can end the wait now.
                    None => std::future::pending::<()>().await,
                }
            }
        };

        let verdict = match time::timeout(timeout, wait_for_far).await {
            Ok(()) => GateVerdict::Approved,
            Err(_) => GateVerdict::TimedOut,
        };
        drop(samples);

        info!(verdict = %verdict, timeout_ms = timeout.as_millis() as u64, "Proximity check finished");
        verdict
    }
}

// =============================================================================
// Tests
// =============================================================================
