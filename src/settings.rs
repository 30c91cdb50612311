//! Player preferences
//!
//! Persisted separately from scores under their own storage key.

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Silence all audio
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_volume: 0.3,
            muted: false,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "dash_runner_settings";

    /// Load settings, falling back to defaults when absent or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings.clamped();
                }
                Err(err) => log::warn!("Ignoring malformed settings: {err}"),
            },
            Ok(None) => {}
            Err(err) => log::warn!("Settings unavailable: {err}"),
        }
        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Settings not encoded: {err}");
                return;
            }
        };
        match store.set(Self::STORAGE_KEY, &json) {
            Ok(()) => log::info!("Settings saved"),
            Err(err) => log::warn!("Settings not saved: {err}"),
        }
    }

    /// Flip mute and persist the result
    pub fn toggle_muted(&mut self, store: &mut dyn KeyValueStore) {
        self.muted = !self.muted;
        log::info!("Audio {}", if self.muted { "muted" } else { "unmuted" });
        self.save(store);
    }

    fn clamped(mut self) -> Self {
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self
    }
}
