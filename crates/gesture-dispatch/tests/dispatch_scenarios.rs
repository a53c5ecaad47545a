//! End-to-end scenarios through the dispatch actor with recording fakes for
//! every platform port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gesture_core::config::ProximityConfig;
use gesture_core::preferences::{GESTURE_W_TARGET, PROXIMITY_ON_WAKE};
use gesture_core::{GestureEvent, InMemoryPreferences, Scancode};
use gesture_dispatch::catalog::{SLIDE_E, SLIDE_O, SLIDE_W};
use gesture_dispatch::{
    Action, ActionCatalog, ActionError, ActionExecutor, ActionKind, ActionResult, AppCategory,
    AppRef, Capability, DispatchEngine, DispatchHandle, DispatchService, HapticFeedback,
    PortError, ProximityGate, ProximitySensorPort, TorchState, VibrationPort, WakeLockPort,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const MAX_RANGE: f32 = 5.0;

// =============================================================================
// Fakes
// =============================================================================

struct RecordingExecutor {
    actions: Mutex<Vec<Action>>,
    torch: Arc<TorchState>,
    /// Time each action takes to run.
    latency: Duration,
}

impl RecordingExecutor {
    fn kinds(&self) -> Vec<ActionKind> {
        self.actions
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.kind.clone())
            .collect()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn perform(&self, action: &Action) -> Result<ActionResult, ActionError> {
        self.actions.lock().unwrap().push(action.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if action.kind == ActionKind::ToggleTorch {
            let enabled = !self.torch.is_enabled();
            self.torch.record_toggle(enabled);
            return Ok(ActionResult::executed(format!("torch {}", enabled)));
        }
        Ok(ActionResult::executed(action.kind.to_string()))
    }
}

/// Replays `script` into every new subscription and keeps the channel open.
struct ScriptedSensor {
    script: Vec<f32>,
    senders: Mutex<Vec<mpsc::UnboundedSender<f32>>>,
}

impl ScriptedSensor {
    fn subscriptions(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    fn all_unsubscribed(&self) -> bool {
        self.senders.lock().unwrap().iter().all(|tx| tx.is_closed())
    }

    /// Push a sample to live subscribers. Returns how many received it.
    fn emit(&self, value: f32) -> usize {
        self.senders
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| tx.send(value).is_ok())
            .count()
    }
}

impl ProximitySensorPort for ScriptedSensor {
    fn maximum_range(&self) -> f32 {
        MAX_RANGE
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<f32>, PortError> {
        let (tx, rx) = mpsc::unbounded_channel();
        for value in &self.script {
            let _ = tx.send(*value);
        }
        self.senders.lock().unwrap().push(tx);
        Ok(rx)
    }
}

#[derive(Default)]
struct CountingWakeLock {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl WakeLockPort for CountingWakeLock {
    fn acquire(&self, _tag: &'static str) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self, _tag: &'static str) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingVibrator {
    pulses: Mutex<Vec<Duration>>,
}

impl VibrationPort for RecordingVibrator {
    fn pulse(&self, duration: Duration) {
        self.pulses.lock().unwrap().push(duration);
    }
}

struct Harness {
    handle: DispatchHandle,
    task: JoinHandle<()>,
    executor: Arc<RecordingExecutor>,
    sensor: Arc<ScriptedSensor>,
    wake_lock: Arc<CountingWakeLock>,
    vibrator: Arc<RecordingVibrator>,
    prefs: Arc<InMemoryPreferences>,
    torch: Arc<TorchState>,
}

impl Harness {
    fn start(proximity_on: bool, script: Vec<f32>) -> Self {
        Self::start_with_latency(proximity_on, script, Duration::ZERO)
    }

    fn start_with_latency(proximity_on: bool, script: Vec<f32>, latency: Duration) -> Self {
        let prefs = Arc::new(InMemoryPreferences::new());
        prefs.set(PROXIMITY_ON_WAKE, proximity_on);

        let torch = Arc::new(TorchState::new(Some("0".to_string())));
        let executor = Arc::new(RecordingExecutor {
            actions: Mutex::new(Vec::new()),
            torch: torch.clone(),
            latency,
        });
        let sensor = Arc::new(ScriptedSensor {
            script,
            senders: Mutex::new(Vec::new()),
        });
        let wake_lock = Arc::new(CountingWakeLock::default());
        let vibrator = Arc::new(RecordingVibrator::default());

        let gate = ProximityGate::new(
            Capability::Available(sensor.clone() as Arc<dyn ProximitySensorPort>),
            wake_lock.clone(),
            prefs.clone(),
            ProximityConfig {
                supported: true,
                enabled_by_default: false,
                timeout_ms: 3000,
                ..ProximityConfig::default()
            },
        );
        let haptic = HapticFeedback::new(
            Capability::Available(vibrator.clone() as Arc<dyn VibrationPort>),
            prefs.clone(),
        );
        let engine = DispatchEngine::new(
            ActionCatalog::new(),
            gate,
            executor.clone(),
            haptic,
            prefs.clone(),
            torch.clone(),
        );
        let (service, handle) = DispatchService::new(engine);
        let task = tokio::spawn(service.run());

        Self {
            handle,
            task,
            executor,
            sensor,
            wake_lock,
            vibrator,
            prefs,
            torch,
        }
    }

    fn pulses(&self) -> usize {
        self.vibrator.pulses.lock().unwrap().len()
    }

    async fn stop(self) {
        self.handle.shutdown();
        self.task.await.unwrap();
    }
}

// =============================================================================
// Ungated dispatch
// =============================================================================

#[tokio::test]
async fn test_email_gesture_without_proximity_check() {
    let h = Harness::start(false, vec![]);

    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_E)));
    h.handle.settle().await.unwrap();

    assert_eq!(
        h.executor.kinds(),
        vec![ActionKind::LaunchApp(AppRef::Category(AppCategory::Email))]
    );
    assert_eq!(
        *h.vibrator.pulses.lock().unwrap(),
        vec![Duration::from_millis(50)]
    );
    assert_eq!(h.sensor.subscriptions(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_torch_toggle_drops_immediate_repeat() {
    let h = Harness::start(false, vec![]);
    assert!(!h.torch.is_enabled());

    // Both arrive before the actor gets to run.
    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_O)));
    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_O)));
    h.handle.settle().await.unwrap();

    assert_eq!(h.executor.kinds(), vec![ActionKind::ToggleTorch]);
    assert!(h.torch.is_enabled());
    assert_eq!(h.pulses(), 1);

    // Once idle, the next gesture toggles back.
    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_O)));
    h.handle.settle().await.unwrap();
    assert!(!h.torch.is_enabled());
    assert_eq!(h.executor.kinds().len(), 2);
    assert_eq!(h.pulses(), 2);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_repeat_while_action_runs_is_dropped() {
    let h = Harness::start_with_latency(false, vec![], Duration::from_millis(50));

    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_O)));
    tokio::time::sleep(Duration::from_millis(10)).await;
    // The first toggle is inside the executor now.
    assert_eq!(h.executor.kinds(), vec![ActionKind::ToggleTorch]);
    assert!(!h.torch.is_enabled());

    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_O)));
    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_E)));
    h.handle.settle().await.unwrap();

    assert_eq!(h.executor.kinds(), vec![ActionKind::ToggleTorch]);
    assert!(h.torch.is_enabled());
    assert_eq!(h.pulses(), 1);
    h.stop().await;
}

#[tokio::test]
async fn test_key_down_is_handled_without_action() {
    let h = Harness::start(false, vec![]);

    assert!(h.handle.submit(GestureEvent::key_down(SLIDE_E)));
    h.handle.settle().await.unwrap();

    assert!(h.executor.kinds().is_empty());
    assert_eq!(h.pulses(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_unknown_scancodes_are_not_handled() {
    let h = Harness::start(false, vec![]);

    for code in [0, 248, 255, 261] {
        assert!(!h.handle.submit(GestureEvent::key_up(Scancode(code))));
        assert!(!h.handle.submit(GestureEvent::key_down(Scancode(code))));
    }
    h.handle.settle().await.unwrap();

    assert!(h.executor.kinds().is_empty());
    h.stop().await;
}

#[tokio::test]
async fn test_unconfigured_user_target_is_skipped() {
    let h = Harness::start(false, vec![]);

    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_W)));
    h.handle.settle().await.unwrap();
    assert!(h.executor.kinds().is_empty());
    assert_eq!(h.pulses(), 0);

    h.prefs.set(GESTURE_W_TARGET, "org.mozilla.firefox");
    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_W)));
    h.handle.settle().await.unwrap();
    assert_eq!(
        h.executor.kinds(),
        vec![ActionKind::LaunchApp(AppRef::Package(
            "org.mozilla.firefox".to_string()
        ))]
    );
    assert_eq!(h.pulses(), 1);
    h.stop().await;
}

// =============================================================================
// Proximity gated dispatch
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_far_reading_approves_gesture() {
    let h = Harness::start(true, vec![MAX_RANGE]);
    let start = Instant::now();

    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_E)));
    h.handle.settle().await.unwrap();

    assert!(start.elapsed() < Duration::from_millis(3000));
    assert_eq!(h.executor.kinds().len(), 1);
    assert_eq!(h.pulses(), 1);
    assert_eq!(h.wake_lock.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(h.wake_lock.released.load(Ordering::SeqCst), 1);
    assert!(h.sensor.all_unsubscribed());
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_near_reading_then_silence_discards_after_timeout() {
    let h = Harness::start(true, vec![0.0]);
    let start = Instant::now();

    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_E)));
    h.handle.settle().await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(3000));
    assert!(h.executor.kinds().is_empty());
    assert_eq!(h.pulses(), 0);
    assert_eq!(h.sensor.subscriptions(), 1);
    assert_eq!(h.wake_lock.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(h.wake_lock.released.load(Ordering::SeqCst), 1);
    assert!(h.sensor.all_unsubscribed());

    // A reading after the timeout reaches nobody.
    assert_eq!(h.sensor.emit(MAX_RANGE), 0);
    h.handle.settle().await.unwrap();
    assert!(h.executor.kinds().is_empty());
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_gestures_during_proximity_wait_are_dropped() {
    let h = Harness::start(true, vec![]);

    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_O)));
    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_E)));
    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_O)));
    h.handle.settle().await.unwrap();

    assert!(h.executor.kinds().is_empty());
    assert_eq!(h.sensor.subscriptions(), 1);
    assert!(!h.torch.is_enabled());
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_check_releases_wake_lock() {
    let h = Harness::start(true, vec![]);

    assert!(h.handle.submit(GestureEvent::key_up(SLIDE_E)));
    // Let the actor start the check, then stop before the timeout.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.wake_lock.acquired.load(Ordering::SeqCst), 1);

    let wake_lock = h.wake_lock.clone();
    let sensor = h.sensor.clone();
    let executor = h.executor.clone();
    h.stop().await;

    assert_eq!(wake_lock.released.load(Ordering::SeqCst), 1);
    assert!(sensor.all_unsubscribed());
    assert!(executor.kinds().is_empty());
}
