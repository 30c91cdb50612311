//! Background music
//!
//! Best-effort: browsers may refuse playback until the page has seen a user
//! gesture, so every failure is logged and otherwise ignored.

use thiserror::Error;

use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio element `{0}`")]
    MissingElement(String),
    #[error("playback refused: {0}")]
    Refused(String),
}

/// Something that can start the ambient music loop
pub trait AmbientAudio {
    fn play_ambient(&mut self) -> Result<(), AudioError>;

    /// Volume or mute changed while playing
    fn apply_settings(&mut self, _settings: &Settings) {}
}

/// Audio that never plays; used headless
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AmbientAudio for SilentAudio {
    fn play_ambient(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Audio manager for the game
pub struct AudioManager {
    #[cfg(target_arch = "wasm32")]
    music: Option<web_sys::HtmlAudioElement>,
    music_volume: f32,
    muted: bool,
}

impl AudioManager {
    /// Page element holding the music track
    pub const MUSIC_ELEMENT_ID: &'static str = "backgroundMusic";

    #[cfg(target_arch = "wasm32")]
    pub fn new(settings: &Settings) -> Self {
        use wasm_bindgen::JsCast;

        let music = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::MUSIC_ELEMENT_ID))
            .and_then(|el| el.dyn_into::<web_sys::HtmlAudioElement>().ok());
        if music.is_none() {
            log::warn!("No #{} audio element - music disabled", Self::MUSIC_ELEMENT_ID);
        }
        Self {
            music,
            music_volume: settings.music_volume,
            muted: settings.muted,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(settings: &Settings) -> Self {
        Self {
            music_volume: settings.music_volume,
            muted: settings.muted,
        }
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
        self.sync_element();
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sync_element();
    }

    #[cfg(target_arch = "wasm32")]
    fn sync_element(&self) {
        if let Some(music) = &self.music {
            music.set_volume(f64::from(self.effective_volume()));
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn sync_element(&self) {}

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.music_volume }
    }
}

impl AmbientAudio for AudioManager {
    #[cfg(target_arch = "wasm32")]
    fn play_ambient(&mut self) -> Result<(), AudioError> {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return Ok(());
        }
        let Some(music) = &self.music else {
            return Err(AudioError::MissingElement(Self::MUSIC_ELEMENT_ID.to_string()));
        };
        music.set_volume(vol as f64);
        let promise = music
            .play()
            .map_err(|err| AudioError::Refused(format!("{err:?}")))?;
        // Autoplay rejection arrives later; report it without waiting
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
                log::warn!("Error playing music: {err:?}");
            }
        });
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn play_ambient(&mut self) -> Result<(), AudioError> {
        log::debug!("Ambient music at volume {} (no audio backend)", self.effective_volume());
        Ok(())
    }

    fn apply_settings(&mut self, settings: &Settings) {
        self.set_music_volume(settings.music_volume);
        self.set_muted(settings.muted);
        log::info!("Music volume now {}", self.effective_volume());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_clamped_and_muted() {
        let mut audio = AudioManager::new(&Settings::default());
        audio.set_music_volume(3.0);
        assert_eq!(audio.effective_volume(), 1.0);
        audio.set_muted(true);
        assert_eq!(audio.effective_volume(), 0.0);
        assert!(audio.play_ambient().is_ok());
    }

    #[test]
    fn test_apply_settings_updates_volume() {
        let mut audio = AudioManager::new(&Settings::default());
        assert_eq!(audio.effective_volume(), 0.3);

        audio.apply_settings(&Settings {
            music_volume: 0.6,
            muted: true,
        });
        assert_eq!(audio.effective_volume(), 0.0);

        audio.apply_settings(&Settings {
            music_volume: 0.6,
            muted: false,
        });
        assert_eq!(audio.effective_volume(), 0.6);
    }
}
