pub mod config;
pub mod error;
pub mod preferences;
pub mod types;

pub use config::GestureConfig;
pub use error::{GestureError, Result};
pub use preferences::{InMemoryPreferences, PreferenceStore, PreferenceValue};
pub use types::*;
