//! One game instance: lifecycle, per-frame sequencing and drawing
//!
//! `tick` is called once per animation frame with a monotonically increasing
//! timestamp. The very first call only records the baseline. After that each
//! call derives `delta_time`, advances the world while running, resolves
//! collisions and redraws.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::entity::{Collidable, EntityKind};
use super::ground::{GROUND_VISUAL, Ground};
use super::player::Player;
use super::progression::{ProgressionEngine, StageChange};
use super::spawner::{SpawnController, SpawnerConfig};
use crate::Viewport;
use crate::audio::AmbientAudio;
use crate::catalog::{Catalogs, ItemCatalog, ObstacleCatalog, UnlockMap};
use crate::highscores::HighScore;
use crate::persistence::KeyValueStore;
use crate::platform::{Clock, InputAction};
use crate::renderer::RenderSurface;
use crate::renderer::hud::{self, HudState};
use crate::settings::Settings;
use crate::telemetry::{TelemetryEvent, TelemetryQueue};
use crate::tuning::Tuning;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Title screen; nothing moves until the first start input
    AwaitingStart,
    Running,
    /// Hit an obstacle; restart allowed after the debounce
    Over,
}

/// Static setup for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tuning: Tuning,
    pub viewport: Viewport,
    /// Spawn RNG seed
    pub seed: u64,
    /// Storage key of the local best score
    pub high_score_key: String,
}

/// External services a session talks to
pub struct Collaborators {
    pub store: Box<dyn KeyValueStore>,
    pub telemetry: TelemetryQueue,
    pub audio: Box<dyn AmbientAudio>,
    pub clock: Box<dyn Clock>,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// `None` on the baseline tick
    pub delta_time: Option<f64>,
    pub stage_change: Option<StageChange>,
    /// Obstacle id that ended the run
    pub game_over: Option<u32>,
    /// Item id picked up
    pub collected: Option<u32>,
}

pub struct Session {
    tuning: Tuning,
    viewport: Viewport,
    phase: SessionPhase,
    /// Kept in f64 so hours of tiny increments still add up
    game_speed: f64,
    previous_timestamp: Option<f64>,
    /// Wall-clock time after which a restart input is honoured
    restart_armed_at: Option<f64>,
    rng: Pcg32,
    ground: Ground,
    obstacle_catalog: ObstacleCatalog,
    obstacles: SpawnController,
    items: SpawnController,
    player: Player,
    progression: ProgressionEngine,
    telemetry: TelemetryQueue,
    audio: Box<dyn AmbientAudio>,
    clock: Box<dyn Clock>,
}

impl Session {
    pub fn new(config: SessionConfig, catalogs: Catalogs, collaborators: Collaborators) -> Self {
        let SessionConfig {
            tuning,
            viewport,
            seed,
            high_score_key,
        } = config;
        let Collaborators {
            store,
            telemetry,
            audio,
            clock,
        } = collaborators;

        let mut rng = Pcg32::seed_from_u64(seed);
        let (obstacles, items) =
            spawners(&tuning, viewport, &catalogs.obstacles, &catalogs.items, &mut rng);

        let high_score = HighScore::load(high_score_key, store.as_ref());
        let progression = ProgressionEngine::new(
            &tuning,
            catalogs.items,
            catalogs.unlocks,
            high_score,
            store,
            telemetry.clone(),
        );

        log::info!(
            "Session ready: {}x{} at scale {:.2}, seed {seed}",
            viewport.width,
            viewport.height,
            viewport.scale_ratio
        );

        Self {
            ground: Ground::new(&tuning, viewport),
            player: Player::new(&tuning, viewport),
            game_speed: tuning.game_speed_start,
            tuning,
            viewport,
            phase: SessionPhase::AwaitingStart,
            previous_timestamp: None,
            restart_armed_at: None,
            rng,
            obstacle_catalog: catalogs.obstacles,
            obstacles,
            items,
            progression,
            telemetry,
            audio,
            clock,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn game_speed(&self) -> f64 {
        self.game_speed
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn progression(&self) -> &ProgressionEngine {
        &self.progression
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    pub fn obstacles(&self) -> &SpawnController {
        &self.obstacles
    }

    pub fn items(&self) -> &SpawnController {
        &self.items
    }

    /// Item catalog and unlock map arrived; takes effect on the next spawn
    pub fn install_catalogs(&mut self, items: ItemCatalog, unlocks: UnlockMap) {
        self.items.set_templates(items.templates());
        self.progression.install_catalogs(items, unlocks);
    }

    /// Refit to a new viewport, e.g. after a window resize or rotation.
    ///
    /// On-screen entities are dropped and everything scaled is rebuilt;
    /// score, stage and phase carry over.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        log::info!(
            "Viewport {}x{} -> {}x{} at scale {:.2}",
            self.viewport.width,
            self.viewport.height,
            viewport.width,
            viewport.height,
            viewport.scale_ratio
        );

        let (obstacles, items) = spawners(
            &self.tuning,
            viewport,
            &self.obstacle_catalog,
            self.progression.item_catalog(),
            &mut self.rng,
        );
        self.obstacles = obstacles;
        self.items = items;
        self.ground = Ground::new(&self.tuning, viewport);
        self.player = Player::new(&self.tuning, viewport);
        self.viewport = viewport;
    }

    /// Changed audio preferences
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.audio.apply_settings(settings);
    }

    pub fn handle_input(&mut self, action: InputAction) {
        match action {
            InputAction::Start => {
                self.request_start();
            }
            InputAction::JumpPress => self.player.set_jump_pressed(true),
            InputAction::JumpRelease => self.player.set_jump_pressed(false),
        }
    }

    /// Start from the title screen, or restart once the debounce has passed.
    /// Returns whether a new run began.
    pub fn request_start(&mut self) -> bool {
        match self.phase {
            SessionPhase::AwaitingStart => {
                self.reset();
                true
            }
            SessionPhase::Over => match self.restart_armed_at {
                Some(armed_at) if self.clock.now_ms() >= armed_at => {
                    self.reset();
                    true
                }
                _ => false,
            },
            SessionPhase::Running => false,
        }
    }

    /// Begin a fresh run in place; loaded catalogs are kept
    pub fn reset(&mut self) {
        self.ground.reset();
        self.obstacles.reset(&mut self.rng);
        self.items.reset(&mut self.rng);
        self.progression.reset();
        self.player.reset();
        self.game_speed = self.tuning.game_speed_start;
        self.phase = SessionPhase::Running;
        self.restart_armed_at = None;

        log::info!("Session started");
        self.telemetry.emit(TelemetryEvent::SessionStart {
            timestamp: self.clock.now_ms(),
        });
        if let Err(err) = self.audio.play_ambient() {
            log::warn!("Ambient music unavailable: {err}");
        }
    }

    /// Advance and redraw for one frame
    pub fn tick(&mut self, timestamp: f64, surface: &mut dyn RenderSurface) -> TickReport {
        let report = self.advance(timestamp);
        self.render(surface);
        report
    }

    /// Simulation half of [`Session::tick`]
    pub fn advance(&mut self, timestamp: f64) -> TickReport {
        let mut report = TickReport::default();
        let Some(previous) = self.previous_timestamp.replace(timestamp) else {
            return report;
        };
        let delta_time = (timestamp - previous).max(0.0);
        report.delta_time = Some(delta_time);

        if self.phase == SessionPhase::Running {
            let dt = delta_time as f32;
            let speed = self.game_speed as f32;
            let stage = self.progression.current_stage();

            self.ground.update(speed, dt);
            self.obstacles
                .update(speed, dt, stage, &self.obstacle_catalog, &mut self.rng);
            self.items
                .update(speed, dt, stage, &self.progression, &mut self.rng);
            self.player.update(speed, dt);

            self.game_speed += delta_time * self.tuning.game_speed_increment;
            report.stage_change = self.progression.update(delta_time);
        }

        if self.phase != SessionPhase::Over
            && let Some(EntityKind::Obstacle { id }) = self.obstacles.collide_with(&self.player)
        {
            self.end_run(id);
            report.game_over = Some(id);
        }

        // Pickups are credited in any phase
        if let Some(EntityKind::Item { id }) = self.items.collide_with(&self.player) {
            self.progression.collect_item(id);
            report.collected = Some(id);
        }

        report
    }

    /// Draw the current frame
    pub fn render(&self, surface: &mut dyn RenderSurface) {
        surface.clear(self.progression.background_color_for_stage());

        for tile in self.ground.tiles() {
            surface.draw_image(GROUND_VISUAL, tile);
        }
        for entity in self.obstacles.entities().iter().chain(self.items.entities()) {
            surface.draw_image(entity.visual(), entity.bounding_box());
        }
        surface.draw_image(self.player.visual(), self.player.bounding_box());

        let scale = self.viewport.scale_ratio;
        let hud_state = HudState {
            score: self.progression.score(),
            high_score: self.progression.high_score(),
            stage: self.progression.current_stage(),
        };
        hud::draw_hud(surface, &hud_state, scale);

        match self.phase {
            SessionPhase::AwaitingStart => hud::draw_start_prompt(surface, scale),
            SessionPhase::Over => hud::draw_game_over(surface, scale),
            SessionPhase::Running => {}
        }
    }

    fn end_run(&mut self, obstacle_id: u32) {
        self.phase = SessionPhase::Over;
        log::info!(
            "Game over on obstacle {obstacle_id} at score {:.0}",
            self.progression.score()
        );
        self.progression.persist_high_score();
        self.restart_armed_at = Some(self.clock.now_ms() + self.tuning.restart_debounce_ms);
        self.player.set_jump_pressed(false);
    }

    #[cfg(test)]
    pub(crate) fn obstacles_mut(&mut self) -> &mut SpawnController {
        &mut self.obstacles
    }

    #[cfg(test)]
    pub(crate) fn items_mut(&mut self) -> &mut SpawnController {
        &mut self.items
    }
}

/// Obstacle and item spawners fitted to `viewport`
fn spawners(
    tuning: &Tuning,
    viewport: Viewport,
    obstacle_catalog: &ObstacleCatalog,
    item_catalog: &ItemCatalog,
    rng: &mut Pcg32,
) -> (SpawnController, SpawnController) {
    let mut obstacles = SpawnController::new(SpawnerConfig::obstacles(tuning), viewport, rng);
    obstacles.set_templates(obstacle_catalog.templates());
    let mut items = SpawnController::new(SpawnerConfig::items(tuning), viewport, rng);
    items.set_templates(item_catalog.templates());
    (obstacles, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, SilentAudio};
    use crate::persistence::MemoryStore;
    use crate::platform::ManualClock;
    use crate::renderer::CommandList;
    use crate::renderer::hud::{GAME_OVER_TEXT, START_TEXT};
    use crate::sim::entity::{MovableEntity, VisualId};
    use crate::telemetry::{self, RecordingSink, TelemetryWorker, codes};
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct BrokenAudio;

    impl AmbientAudio for BrokenAudio {
        fn play_ambient(&mut self) -> Result<(), AudioError> {
            Err(AudioError::Refused("autoplay blocked".into()))
        }
    }

    /// Remembers every settings change it is given
    struct RecordingAudio(Rc<RefCell<Vec<Settings>>>);

    impl AmbientAudio for RecordingAudio {
        fn play_ambient(&mut self) -> Result<(), AudioError> {
            Ok(())
        }

        fn apply_settings(&mut self, settings: &Settings) {
            self.0.borrow_mut().push(settings.clone());
        }
    }

    struct Harness {
        session: Session,
        worker: TelemetryWorker,
        sink: RecordingSink,
        clock: ManualClock,
        store: MemoryStore,
    }

    fn harness_with(catalogs: Catalogs, audio: Box<dyn AmbientAudio>) -> Harness {
        let sink = RecordingSink::default();
        let (queue, worker) = telemetry::channel("tester", sink.clone());
        let clock = ManualClock::new(1_000_000.0);
        let store = MemoryStore::new();
        let session = Session::new(
            SessionConfig {
                tuning: Tuning::default(),
                viewport: Viewport::default(),
                seed: 42,
                high_score_key: "hs".into(),
            },
            catalogs,
            Collaborators {
                store: Box::new(store.clone()),
                telemetry: queue,
                audio,
                clock: Box::new(clock.clone()),
            },
        );
        Harness {
            session,
            worker,
            sink,
            clock,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(Catalogs::builtin(), Box::new(SilentAudio))
    }

    /// Wide enough to still cover the player after a frame of scrolling
    const BLOCK: Vec2 = Vec2::new(100.0, 100.0);

    fn obstacle_on(player: &Player) -> MovableEntity {
        MovableEntity::new(EntityKind::Obstacle { id: 1 }, player.pos, BLOCK, VisualId(11))
    }

    fn item_on(player: &Player, id: u32) -> MovableEntity {
        MovableEntity::new(EntityKind::Item { id }, player.pos, BLOCK, VisualId(101))
    }

    #[test]
    fn test_first_tick_is_baseline_only() {
        let mut h = harness();
        h.session.request_start();
        let report = h.session.advance(500.0);
        assert_eq!(report.delta_time, None);
        assert_eq!(h.session.progression().score(), 0.0);

        let report = h.session.advance(516.0);
        assert_eq!(report.delta_time, Some(16.0));
        assert!((h.session.progression().score() - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_awaiting_start_does_not_simulate() {
        let mut h = harness();
        h.session.advance(0.0);
        h.session.advance(1_000.0);
        assert_eq!(h.session.phase(), SessionPhase::AwaitingStart);
        assert_eq!(h.session.progression().score(), 0.0);
        assert_eq!(h.session.ground().x, 0.0);
    }

    #[test]
    fn test_game_speed_grows_while_running() {
        let mut h = harness();
        h.session.request_start();
        h.session.advance(0.0);
        h.session.advance(1_000.0);
        let expected = 1.0 + 1_000.0 * 0.000_000_1;
        assert!((h.session.game_speed() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_game_speed_accurate_after_minutes_at_high_refresh() {
        // No obstacles, so the run cannot end early
        let catalogs = Catalogs {
            obstacles: ObstacleCatalog::new(std::iter::empty()),
            ..Catalogs::pending()
        };
        let mut h = harness_with(catalogs, Box::new(SilentAudio));
        h.session.request_start();
        h.session.advance(0.0);

        // Five minutes at 144 Hz: each increment is ~7e-7, below f32 resolution at 1.0
        let frames = 5 * 60 * 144;
        for frame in 1..=frames {
            h.session.advance(f64::from(frame) * 1000.0 / 144.0);
        }
        assert_eq!(h.session.phase(), SessionPhase::Running);
        let expected = 1.0 + 300_000.0 * 0.000_000_1;
        assert!(
            (h.session.game_speed() - expected).abs() < 1e-9,
            "game speed {} drifted from {expected}",
            h.session.game_speed()
        );
    }

    #[test]
    fn test_resize_refits_world_and_keeps_progress() {
        let mut h = harness();
        h.session.request_start();
        h.session.advance(0.0);
        h.session.advance(5_000.0);
        let pickup = item_on(h.session.player(), 3);
        h.session.items_mut().push_entity(pickup);
        let score = h.session.progression().score();

        let bigger = Viewport::with_scale(2.0);
        h.session.resize(bigger);
        assert_eq!(h.session.viewport(), bigger);
        assert_eq!(h.session.phase(), SessionPhase::Running);
        assert_eq!(h.session.progression().score(), score);
        assert!(h.session.items().entities().is_empty());
        assert!(h.session.obstacles().entities().is_empty());

        let default = Player::new(&Tuning::default(), Viewport::default());
        assert_eq!(h.session.player().size, default.size * 2.0);
        let ground = h.session.ground();
        assert!((ground.y + ground.height - bigger.height).abs() < 1e-3);
        assert_eq!(
            h.session.ground().width,
            Ground::new(&Tuning::default(), Viewport::default()).width * 2.0
        );

        // Still simulates after the refit
        h.session.advance(5_016.0);
        assert!(h.session.progression().score() > score);
    }

    #[test]
    fn test_apply_settings_reaches_audio() {
        let applied = Rc::new(RefCell::new(Vec::new()));
        let audio = RecordingAudio(applied.clone());
        let mut h = harness_with(Catalogs::builtin(), Box::new(audio));
        let settings = Settings {
            muted: true,
            ..Settings::default()
        };
        h.session.apply_settings(&settings);
        assert_eq!(*applied.borrow(), vec![settings]);
    }

    #[test]
    fn test_obstacle_hit_ends_run_and_persists() {
        let mut h = harness();
        h.session.request_start();
        h.session.advance(0.0);
        h.session.advance(20_000.0);
        let hit = obstacle_on(h.session.player());
        h.session.obstacles_mut().push_entity(hit);

        let report = h.session.advance(20_016.0);
        assert_eq!(report.game_over, Some(1));
        assert_eq!(h.session.phase(), SessionPhase::Over);
        assert_eq!(h.session.progression().high_score(), 200);
        assert_eq!(h.store.get("hs").unwrap().as_deref(), Some("200"));

        // Frozen once over
        let score = h.session.progression().score();
        h.session.advance(30_000.0);
        assert_eq!(h.session.progression().score(), score);

        h.worker.drain();
        assert_eq!(h.sink.count(codes::HIGH_SCORE_UPDATED), 1);
    }

    #[test]
    fn test_restart_waits_for_debounce() {
        let mut h = harness();
        h.session.request_start();
        h.session.advance(0.0);
        let hit = obstacle_on(h.session.player());
        h.session.obstacles_mut().push_entity(hit);
        h.session.advance(16.0);
        assert_eq!(h.session.phase(), SessionPhase::Over);

        h.clock.advance(999.0);
        h.session.handle_input(InputAction::Start);
        assert_eq!(h.session.phase(), SessionPhase::Over);

        h.clock.advance(1.0);
        h.session.handle_input(InputAction::Start);
        assert_eq!(h.session.phase(), SessionPhase::Running);
        assert_eq!(h.session.progression().score(), 0.0);
        assert!(h.session.obstacles().entities().is_empty());
        assert!(h.session.items().entities().is_empty());

        // Ignored while running
        assert!(!h.session.request_start());
    }

    #[test]
    fn test_item_pickup_credited_even_when_over() {
        let mut h = harness();
        h.session.request_start();
        h.session.advance(0.0);
        let hit = obstacle_on(h.session.player());
        let pickup = item_on(h.session.player(), 3);
        h.session.obstacles_mut().push_entity(hit);
        h.session.items_mut().push_entity(pickup);

        let report = h.session.advance(16.0);
        assert_eq!(report.game_over, Some(1));
        assert_eq!(report.collected, Some(3));
        // 0.16 from time plus item 3 worth 30
        assert!((h.session.progression().score() - 30.16).abs() < 1e-9);
        assert_eq!(h.session.progression().high_score(), 0);

        h.worker.drain();
        assert_eq!(h.sink.count(codes::ITEM_COLLECTED), 1);
    }

    #[test]
    fn test_reset_emits_session_start_and_tolerates_audio_failure() {
        let mut h = harness_with(Catalogs::builtin(), Box::new(BrokenAudio));
        assert!(h.session.request_start());
        assert_eq!(h.session.phase(), SessionPhase::Running);
        h.worker.drain();
        assert_eq!(h.sink.count(codes::SESSION_START), 1);
        assert_eq!(
            h.sink.delivered()[0].1,
            serde_json::json!({"timestamp": 1_000_000.0})
        );
    }

    #[test]
    fn test_pending_catalogs_spawn_no_items_until_installed() {
        // No obstacles, so the run cannot end early
        let catalogs = Catalogs {
            obstacles: ObstacleCatalog::new(std::iter::empty()),
            ..Catalogs::pending()
        };
        let mut h = harness_with(catalogs, Box::new(SilentAudio));
        h.session.request_start();
        h.session.advance(0.0);
        for step in 1..=100 {
            h.session.advance(step as f64 * 200.0);
        }
        assert!(h.session.items().entities().is_empty());

        h.session
            .install_catalogs(ItemCatalog::builtin(), UnlockMap::builtin());
        let mut spawned = false;
        for step in 101..=200 {
            h.session.advance(step as f64 * 200.0);
            spawned |= !h.session.items().entities().is_empty();
        }
        assert!(spawned);
    }

    #[test]
    fn test_render_overlays_follow_phase() {
        let mut h = harness();
        let mut surface = CommandList::new(800.0, 200.0);

        h.session.tick(0.0, &mut surface);
        assert!(surface.texts().any(|t| t == START_TEXT));

        h.session.request_start();
        surface.clear_commands();
        h.session.tick(16.0, &mut surface);
        assert!(!surface.texts().any(|t| t == START_TEXT || t == GAME_OVER_TEXT));
        assert!(surface.texts().any(|t| t == "Stage: 0"));

        let hit = obstacle_on(h.session.player());
        h.session.obstacles_mut().push_entity(hit);
        surface.clear_commands();
        h.session.tick(32.0, &mut surface);
        assert!(surface.texts().any(|t| t == GAME_OVER_TEXT));
    }
}
