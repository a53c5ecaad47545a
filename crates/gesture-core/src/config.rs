use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GestureError, Result};
use crate::preferences::PreferenceValue;

/// Top-level configuration for the gesture daemon.
///
/// Loaded from `~/.gestured/config.toml` by default. `[proximity]` and
/// `[torch]` describe the device build; `[device]` describes the simulated
/// platform services; `[preferences]` seeds the user settings store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub proximity: ProximityConfig,
    #[serde(default)]
    pub torch: TorchConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub preferences: BTreeMap<String, PreferenceValue>,
}

impl GestureConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GestureConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| GestureError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Proximity check settings fixed by the device build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Whether the device supports the proximity check on gesture wake.
    pub supported: bool,
    /// Default for the `proximity_on_wake` user preference.
    pub enabled_by_default: bool,
    /// How long to wait for a "far" reading before discarding the gesture.
    pub timeout_ms: u64,
    /// Gesture names (e.g. `"slide_down"`) that skip the check and run at once.
    pub ungated_gestures: Vec<String>,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            supported: true,
            enabled_by_default: false,
            timeout_ms: 3000,
            ungated_gestures: Vec::new(),
        }
    }
}

/// Flashlight settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TorchConfig {
    /// Identifier of the back-facing camera that owns the flash unit.
    /// `None` disables the torch gesture.
    pub rear_camera_id: Option<String>,
}

impl Default for TorchConfig {
    fn default() -> Self {
        Self {
            rear_camera_id: Some("0".to_string()),
        }
    }
}

/// Platform services available to the simulated host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Whether a proximity sensor is present.
    pub proximity_sensor: bool,
    /// Maximum range reported by the proximity sensor ("far").
    pub proximity_max_range: f32,
    /// Whether a vibrator is present.
    pub vibrator: bool,
    /// Packages that resolve to a launchable activity.
    pub installed_packages: Vec<String>,
    /// Package that handles the email app category.
    pub email_package: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            proximity_sensor: true,
            proximity_max_range: 5.0,
            vibrator: true,
            installed_packages: vec![
                "com.android.email".to_string(),
                "com.android.messaging".to_string(),
            ],
            email_package: Some("com.android.email".to_string()),
        }
    }
}
