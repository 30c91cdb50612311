//! Static gameplay catalogs
//!
//! Items and the stage unlock map arrive as JSON documents shaped
//! `{ "name", "version", "data": [...] }`. Entries are validated one at a
//! time: a malformed entry is logged and skipped, the rest still load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::sim::VisualId;

/// Built-in item catalog, also served to the web build as `/assets/item.json`
pub const DEFAULT_ITEMS_JSON: &str = include_str!("../assets/item.json");
/// Built-in unlock map, also served as `/assets/item_unlock.json`
pub const DEFAULT_UNLOCKS_JSON: &str = include_str!("../assets/item_unlock.json");

/// Errors raised while reading a catalog document
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog `data` field is missing or not an array")]
    MissingData,
    #[error("catalog could not be fetched: {0}")]
    Unavailable(String),
}

/// Authored size and image of something that can be spawned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnTemplate {
    pub width: f32,
    pub height: f32,
    pub visual: VisualId,
}

impl SpawnTemplate {
    /// Same template at device scale
    pub fn scaled(&self, scale_ratio: f32) -> Self {
        Self {
            width: self.width * scale_ratio,
            height: self.height * scale_ratio,
            ..*self
        }
    }
}

/// A collectible item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: u32,
    /// Score credited on pickup
    pub score: f64,
    pub width: f32,
    pub height: f32,
    pub visual: VisualId,
}

impl ItemDef {
    pub fn template(&self) -> SpawnTemplate {
        SpawnTemplate {
            width: self.width,
            height: self.height,
            visual: self.visual,
        }
    }

    fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.score.is_finite()
    }
}

/// Item id -> definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemCatalog {
    items: BTreeMap<u32, ItemDef>,
}

impl ItemCatalog {
    pub fn new(items: impl IntoIterator<Item = ItemDef>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    /// Parse a catalog document, skipping entries that fail validation
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries = data_entries(json)?;
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<ItemDef>(entry.clone()) {
                Ok(item) if item.is_valid() => items.push(item),
                Ok(item) => {
                    log::warn!("Skipping item {} with invalid dimensions or score", item.id)
                }
                Err(err) => log::warn!("Skipping malformed item entry {entry}: {err}"),
            }
        }
        Ok(Self::new(items))
    }

    /// Catalog bundled with the crate
    pub fn builtin() -> Self {
        Self::from_json(DEFAULT_ITEMS_JSON).unwrap_or_else(|err| {
            log::error!("Built-in item catalog is unreadable: {err}");
            Self::default()
        })
    }

    pub fn get(&self, id: u32) -> Option<&ItemDef> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Spawn templates keyed by item id
    pub fn templates(&self) -> BTreeMap<u32, SpawnTemplate> {
        self.items.iter().map(|(&id, item)| (id, item.template())).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnlockEntry {
    stage: u32,
    item_ids: Vec<u32>,
}

/// Stage -> item ids eligible to spawn. Stages may be sparse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnlockMap {
    stages: BTreeMap<u32, Vec<u32>>,
}

impl UnlockMap {
    pub fn new(stages: impl IntoIterator<Item = (u32, Vec<u32>)>) -> Self {
        Self {
            stages: stages.into_iter().collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut stages = BTreeMap::new();
        for entry in data_entries(json)? {
            match serde_json::from_value::<UnlockEntry>(entry.clone()) {
                Ok(unlock) => {
                    if stages.insert(unlock.stage, unlock.item_ids).is_some() {
                        log::warn!(
                            "Stage {} listed twice in unlock map, keeping the last",
                            unlock.stage
                        );
                    }
                }
                Err(err) => log::warn!("Skipping malformed unlock entry {entry}: {err}"),
            }
        }
        Ok(Self { stages })
    }

    pub fn builtin() -> Self {
        Self::from_json(DEFAULT_UNLOCKS_JSON).unwrap_or_else(|err| {
            log::error!("Built-in unlock map is unreadable: {err}");
            Self::default()
        })
    }

    /// Ids unlocked at `stage`; empty when the stage is not configured
    pub fn ids_for(&self, stage: u32) -> &[u32] {
        self.stages.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Obstacle id -> template. Obstacles are never stage-gated.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleCatalog {
    templates: BTreeMap<u32, SpawnTemplate>,
    ids: Vec<u32>,
}

impl ObstacleCatalog {
    pub fn new(templates: impl IntoIterator<Item = (u32, SpawnTemplate)>) -> Self {
        let templates: BTreeMap<_, _> = templates.into_iter().collect();
        let ids = templates.keys().copied().collect();
        Self { templates, ids }
    }

    /// The three cactus shapes
    pub fn builtin() -> Self {
        Self::new([
            (
                0,
                SpawnTemplate {
                    width: 48.0 / 1.5,
                    height: 100.0 / 1.5,
                    visual: VisualId(10),
                },
            ),
            (
                1,
                SpawnTemplate {
                    width: 98.0 / 1.5,
                    height: 100.0 / 1.5,
                    visual: VisualId(11),
                },
            ),
            (
                2,
                SpawnTemplate {
                    width: 68.0 / 1.5,
                    height: 70.0 / 1.5,
                    visual: VisualId(12),
                },
            ),
        ])
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn templates(&self) -> BTreeMap<u32, SpawnTemplate> {
        self.templates.clone()
    }
}

impl Default for ObstacleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Everything a session spawns from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogs {
    pub items: ItemCatalog,
    pub unlocks: UnlockMap,
    pub obstacles: ObstacleCatalog,
}

impl Catalogs {
    /// Catalogs bundled with the crate
    pub fn builtin() -> Self {
        Self {
            items: ItemCatalog::builtin(),
            unlocks: UnlockMap::builtin(),
            obstacles: ObstacleCatalog::builtin(),
        }
    }

    /// Obstacles only; items and unlocks are still on their way
    pub fn pending() -> Self {
        Self::default()
    }
}

fn data_entries(json: &str) -> Result<Vec<Value>, CatalogError> {
    let mut doc: Value = serde_json::from_str(json)?;
    match doc.get_mut("data").map(Value::take) {
        Some(Value::Array(entries)) => Ok(entries),
        _ => Err(CatalogError::MissingData),
    }
}
