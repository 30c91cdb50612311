//! Local player identity

use std::fmt;

use rand::Rng;
use uuid::{Builder, Uuid};

use super::store::KeyValueStore;

/// Storage key for the player id
pub const PLAYER_ID_KEY: &str = "userId";

/// Random identifier that names this browser's player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self(Builder::from_random_bytes(rng.random()).into_uuid())
    }

    /// Stored id, or a fresh one written back to the store.
    ///
    /// Returns whether the id is new, so the caller can register it.
    pub fn load_or_create(store: &mut dyn KeyValueStore, rng: &mut impl Rng) -> (Self, bool) {
        match store.get(PLAYER_ID_KEY) {
            Ok(Some(raw)) => match Uuid::parse_str(&raw) {
                Ok(id) => return (Self(id), false),
                Err(err) => log::warn!("Stored player id {raw:?} is invalid ({err}), replacing it"),
            },
            Ok(None) => {}
            Err(err) => log::warn!("Could not read player id: {err}"),
        }

        let id = Self::random(rng);
        if let Err(err) = store.set(PLAYER_ID_KEY, &id.to_string()) {
            log::warn!("Could not remember player id: {err}");
        }
        log::info!("Registered new local player {id}");
        (id, true)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
