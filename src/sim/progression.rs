//! Score and stage progression
//!
//! Score grows with time survived and with item pickups. The stage is
//! `floor(score / stage increment)` and only ever moves forward within a
//! session; a long frame that crosses several thresholds produces a single
//! transition straight to the computed stage.

use super::spawner::UnlockSource;
use crate::Color;
use crate::catalog::{ItemCatalog, UnlockMap};
use crate::highscores::HighScore;
use crate::persistence::KeyValueStore;
use crate::telemetry::{TelemetryEvent, TelemetryQueue};
use crate::tuning::Tuning;

/// Background per stage; stages past the end use [`DEFAULT_BACKGROUND`]
pub const STAGE_COLORS: [Color; 7] = [
    Color::LIGHT_BLUE,
    Color::LIGHT_GREEN,
    Color::LIGHT_CORAL,
    Color::LIGHT_GOLDENROD_YELLOW,
    Color::LIGHT_PINK,
    Color::LIGHT_YELLOW,
    Color::LIGHT_GRAY,
];
pub const DEFAULT_BACKGROUND: Color = Color::WHITE;

/// A stage transition produced by [`ProgressionEngine::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageChange {
    pub from: u32,
    pub to: u32,
    /// First score of the new stage, as reported to the server
    pub target_score: f64,
}

pub struct ProgressionEngine {
    score: f64,
    current_stage: u32,
    score_rate: f64,
    stage_increment: f64,
    unlock_map: UnlockMap,
    item_catalog: ItemCatalog,
    /// Catalogued items unlocked at the current stage
    unlocked: Vec<u32>,
    high_score: HighScore,
    store: Box<dyn KeyValueStore>,
    telemetry: TelemetryQueue,
}

impl ProgressionEngine {
    pub fn new(
        tuning: &Tuning,
        item_catalog: ItemCatalog,
        unlock_map: UnlockMap,
        high_score: HighScore,
        store: Box<dyn KeyValueStore>,
        telemetry: TelemetryQueue,
    ) -> Self {
        Self {
            score: 0.0,
            current_stage: 0,
            score_rate: tuning.score_rate,
            stage_increment: tuning.stage_score_increment,
            unlock_map,
            item_catalog,
            unlocked: Vec::new(),
            high_score,
            store,
            telemetry,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn current_stage(&self) -> u32 {
        self.current_stage
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.best()
    }

    /// Items unlocked by the most recent stage transition
    pub fn unlocked_items(&self) -> &[u32] {
        &self.unlocked
    }

    pub fn item_catalog(&self) -> &ItemCatalog {
        &self.item_catalog
    }

    /// Ids configured for `stage`; empty for unconfigured stages
    pub fn get_unlocked_ids(&self, stage: u32) -> &[u32] {
        self.unlock_map.ids_for(stage)
    }

    /// Swap in catalogs that finished loading after the session began
    pub fn install_catalogs(&mut self, item_catalog: ItemCatalog, unlock_map: UnlockMap) {
        log::info!(
            "Catalogs installed: {} items, unlock map {}",
            item_catalog.len(),
            if unlock_map.is_empty() { "empty" } else { "loaded" }
        );
        self.item_catalog = item_catalog;
        self.unlock_map = unlock_map;
        self.refresh_unlocked();
    }

    /// Accrue score for `delta_time` ms and advance the stage if a threshold was crossed
    pub fn update(&mut self, delta_time: f64) -> Option<StageChange> {
        self.score += delta_time * self.score_rate;

        let candidate = (self.score / self.stage_increment).floor() as u32;
        if candidate <= self.current_stage {
            return None;
        }

        let from = self.current_stage;
        self.current_stage = candidate;
        self.refresh_unlocked();

        let target_score = f64::from(candidate) * self.stage_increment + 1.0;
        log::info!("Stage changed: {from} -> {candidate}");
        self.telemetry.emit(TelemetryEvent::StageChanged {
            current_stage: candidate,
            target_score,
        });
        Some(StageChange {
            from,
            to: candidate,
            target_score,
        })
    }

    /// Credit a picked-up item. Unknown ids change nothing.
    pub fn collect_item(&mut self, item_id: u32) -> Option<f64> {
        let Some(item) = self.item_catalog.get(item_id) else {
            log::warn!("Item {item_id} not found");
            return None;
        };
        let value = item.score;
        self.score += value;
        log::debug!("Item {item_id} acquired, score +{value}");
        self.telemetry.emit(TelemetryEvent::ItemCollected {
            item_id,
            stage_id: self.current_stage,
        });
        Some(value)
    }

    /// Save the whole score if it beats the local best
    pub fn persist_high_score(&mut self) -> Option<u64> {
        let best = self.high_score.submit(self.score, self.store.as_mut())?;
        self.telemetry
            .emit(TelemetryEvent::HighScoreUpdated { score: best });
        Some(best)
    }

    pub fn background_color_for_stage(&self) -> Color {
        STAGE_COLORS
            .get(self.current_stage as usize)
            .copied()
            .unwrap_or(DEFAULT_BACKGROUND)
    }

    pub fn reset(&mut self) {
        self.score = 0.0;
        self.current_stage = 0;
        self.unlocked.clear();
    }

    fn refresh_unlocked(&mut self) {
        let catalog = &self.item_catalog;
        self.unlocked = self
            .unlock_map
            .ids_for(self.current_stage)
            .iter()
            .copied()
            .filter(|id| catalog.get(*id).is_some())
            .collect();
        log::debug!("Unlocked items for stage {}: {:?}", self.current_stage, self.unlocked);
    }
}

impl UnlockSource for ProgressionEngine {
    fn unlocked_ids(&self, stage: u32) -> &[u32] {
        self.get_unlocked_ids(stage)
    }
}
