//! Personal best score
//!
//! A single whole-number score per local player, kept in the key/value store.

use crate::persistence::{KeyValueStore, PlayerId, StoreError};

/// Storage key prefix; the player id is appended
pub const HIGH_SCORE_KEY: &str = "highScore";

/// The local player's best score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScore {
    key: String,
    best: u64,
}

impl HighScore {
    /// Storage key for a given player
    pub fn key_for(player: &PlayerId) -> String {
        format!("{HIGH_SCORE_KEY}:{player}")
    }

    /// Empty record under `key`
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            best: 0,
        }
    }

    /// Read the stored best; missing or unreadable values count as zero
    pub fn load(key: impl Into<String>, store: &dyn KeyValueStore) -> Self {
        let mut record = Self::new(key);
        match record.read(store) {
            Ok(Some(best)) => {
                log::info!("Loaded high score {best}");
                record.best = best;
            }
            Ok(None) => log::info!("No high score found, starting fresh"),
            Err(err) => log::warn!("High score unavailable: {err}"),
        }
        record
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Check if a score beats the current best
    pub fn qualifies(&self, score: f64) -> bool {
        whole(score) > self.best
    }

    /// Record `score` if it beats the best, including any best written to the
    /// store since it was loaded. The write is best-effort: a failed write is
    /// logged and the in-memory best still advances.
    ///
    /// Returns the new best when it changed.
    pub fn submit(&mut self, score: f64, store: &mut dyn KeyValueStore) -> Option<u64> {
        self.refresh(&*store);
        if !self.qualifies(score) {
            return None;
        }
        self.best = whole(score);
        match store.set(&self.key, &self.best.to_string()) {
            Ok(()) => log::info!("High score saved ({})", self.best),
            Err(err) => log::warn!("High score {} not saved: {err}", self.best),
        }
        Some(self.best)
    }

    /// Adopt a higher best stored by someone else, e.g. another tab
    fn refresh(&mut self, store: &dyn KeyValueStore) {
        match self.read(store) {
            Ok(Some(stored)) if stored > self.best => {
                log::info!("High score {stored} found in store, was {}", self.best);
                self.best = stored;
            }
            Ok(_) => {}
            Err(err) => log::warn!("High score not re-read: {err}"),
        }
    }

    fn read(&self, store: &dyn KeyValueStore) -> Result<Option<u64>, StoreError> {
        let Some(raw) = store.get(&self.key)? else {
            return Ok(None);
        };
        // Older saves may hold a fractional score
        let parsed = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0);
        match parsed {
            Some(v) => Ok(Some(whole(v))),
            None => Err(StoreError::Malformed {
                key: self.key.clone(),
                value: raw,
            }),
        }
    }
}

fn whole(score: f64) -> u64 {
    score.max(0.0).floor() as u64
}
