//! Client-local persistence
//!
//! Features:
//! - Key/value store abstraction (LocalStorage on web, in-memory natively)
//! - Local player identity, generated once and remembered

pub mod player;
pub mod store;

pub use player::PlayerId;
pub use store::{KeyValueStore, MemoryStore, StoreError};

#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;
