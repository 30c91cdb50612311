//! Data-driven game balance
//!
//! Every knob defaults to the constant in [`crate::consts`]; a JSON document
//! may override any subset of them.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::KeyValueStore;

/// Inclusive spawn interval range in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRange {
    pub min: u32,
    pub max: u32,
}

impl IntervalRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn contains(&self, ms: f32) -> bool {
        ms >= self.min as f32 && ms <= self.max as f32
    }
}

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    pub base_speed: f32,
    pub game_speed_start: f64,
    pub game_speed_increment: f64,

    pub score_rate: f64,
    pub stage_score_increment: f64,

    pub restart_debounce_ms: f64,

    pub obstacle_interval: IntervalRange,
    pub item_interval: IntervalRange,
    pub spawn_x_factor: f32,
    pub min_spawn_y: f32,

    pub ground_width: f32,
    pub ground_height: f32,

    pub player_width: f32,
    pub player_height: f32,
    pub min_jump_height: f32,
    pub max_jump_height: f32,
    pub jump_speed: f32,
    pub gravity: f32,
    pub walk_frame_ms: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_speed: BASE_SPEED,
            game_speed_start: GAME_SPEED_START,
            game_speed_increment: GAME_SPEED_INCREMENT,

            score_rate: SCORE_RATE,
            stage_score_increment: STAGE_SCORE_INCREMENT,

            restart_debounce_ms: RESTART_DEBOUNCE_MS,

            obstacle_interval: IntervalRange::new(OBSTACLE_INTERVAL_MIN, OBSTACLE_INTERVAL_MAX),
            item_interval: IntervalRange::new(ITEM_INTERVAL_MIN, ITEM_INTERVAL_MAX),
            spawn_x_factor: SPAWN_X_FACTOR,
            min_spawn_y: MIN_SPAWN_Y,

            ground_width: GROUND_WIDTH,
            ground_height: GROUND_HEIGHT,

            player_width: PLAYER_WIDTH,
            player_height: PLAYER_HEIGHT,
            min_jump_height: MIN_JUMP_HEIGHT,
            max_jump_height: MAX_JUMP_HEIGHT,
            jump_speed: JUMP_SPEED,
            gravity: GRAVITY,
            walk_frame_ms: WALK_FRAME_MS,
        }
    }
}

impl Tuning {
    /// Storage key for local balance overrides
    pub const STORAGE_KEY: &'static str = "dash_runner_tuning";

    /// Overrides saved in the store, or defaults when there are none
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => {
                log::info!("Loaded tuning overrides");
                Self::from_json(&json)
            }
            Ok(None) => Self::default(),
            Err(err) => {
                log::warn!("Tuning overrides unavailable: {err}");
                Self::default()
            }
        }
    }

    /// Parse overrides from JSON, falling back to defaults on malformed input
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Tuning>(json) {
            Ok(tuning) => tuning.sanitized(),
            Err(err) => {
                log::warn!("Ignoring malformed tuning ({err}), using defaults");
                Self::default()
            }
        }
    }

    /// Clamp values that would break the simulation
    fn sanitized(mut self) -> Self {
        if self.stage_score_increment <= 0.0 {
            log::warn!(
                "stageScoreIncrement must be positive, got {}",
                self.stage_score_increment
            );
            self.stage_score_increment = STAGE_SCORE_INCREMENT;
        }
        self.obstacle_interval =
            IntervalRange::new(self.obstacle_interval.min, self.obstacle_interval.max);
        self.item_interval = IntervalRange::new(self.item_interval.min, self.item_interval.max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_load_from_store() {
        let store =
            MemoryStore::with_entries([(Tuning::STORAGE_KEY, r#"{"gameSpeedStart": 2.0}"#)]);
        let tuning = Tuning::load(&store);
        assert_eq!(tuning.game_speed_start, 2.0);
        assert_eq!(tuning.base_speed, BASE_SPEED);

        assert_eq!(Tuning::load(&MemoryStore::new()), Tuning::default());
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let tuning = Tuning::from_json(r#"{"stageScoreIncrement": 100, "baseSpeed": 1.0}"#);
        assert_eq!(tuning.stage_score_increment, 100.0);
        assert_eq!(tuning.base_speed, 1.0);
        assert_eq!(tuning.score_rate, SCORE_RATE);
        assert_eq!(tuning.item_interval, IntervalRange::new(0, 12000));
    }

    #[test]
    fn test_malformed_falls_back_to_defaults() {
        assert_eq!(Tuning::from_json("{not json"), Tuning::default());
    }

    #[test]
    fn test_non_positive_stage_increment_rejected() {
        let tuning = Tuning::from_json(r#"{"stageScoreIncrement": 0}"#);
        assert_eq!(tuning.stage_score_increment, STAGE_SCORE_INCREMENT);
    }

    #[test]
    fn test_swapped_interval_bounds_are_ordered() {
        let tuning = Tuning::from_json(r#"{"itemInterval": {"min": 900, "max": 100}}"#);
        assert_eq!(tuning.item_interval, IntervalRange::new(100, 900));
        assert!(tuning.item_interval.contains(500.0));
    }
}
