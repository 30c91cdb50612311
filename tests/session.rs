//! Whole-session runs through the public API with in-memory collaborators

use dash_runner::audio::SilentAudio;
use dash_runner::catalog::{Catalogs, ItemCatalog, UnlockMap};
use dash_runner::persistence::{KeyValueStore, MemoryStore, PlayerId};
use dash_runner::platform::{InputAction, ManualClock, input};
use dash_runner::renderer::CommandList;
use dash_runner::renderer::hud::{GAME_OVER_TEXT, START_TEXT};
use dash_runner::sim::{Collaborators, GROUND_VISUAL, Session, SessionConfig, SessionPhase};
use dash_runner::telemetry::{self, RecordingSink, TelemetryWorker, codes};
use dash_runner::{HighScore, Tuning, Viewport};
use rand::SeedableRng;
use rand_pcg::Pcg32;

const FRAME_MS: f64 = 1000.0 / 60.0;

struct Run {
    session: Session,
    surface: CommandList,
    clock: ManualClock,
    store: MemoryStore,
    worker: TelemetryWorker,
    sink: RecordingSink,
    key: String,
    now: f64,
}

impl Run {
    fn new(seed: u64, catalogs: Catalogs) -> Self {
        let mut store = MemoryStore::new();
        let mut rng = Pcg32::seed_from_u64(seed);
        let (player, created) = PlayerId::load_or_create(&mut store, &mut rng);
        assert!(created);

        let sink = RecordingSink::default();
        let (queue, worker) = telemetry::channel(player.to_string(), sink.clone());
        let clock = ManualClock::new(0.0);
        let key = HighScore::key_for(&player);
        let viewport = Viewport::default();

        let session = Session::new(
            SessionConfig {
                tuning: Tuning::default(),
                viewport,
                seed,
                high_score_key: key.clone(),
            },
            catalogs,
            Collaborators {
                store: Box::new(store.clone()),
                telemetry: queue,
                audio: Box::new(SilentAudio),
                clock: Box::new(clock.clone()),
            },
        );

        Self {
            session,
            surface: CommandList::new(viewport.width, viewport.height),
            clock,
            store,
            worker,
            sink,
            key,
            now: 0.0,
        }
    }

    fn frame(&mut self) -> dash_runner::sim::TickReport {
        self.now += FRAME_MS;
        self.clock.set(self.now);
        self.surface.clear_commands();
        self.session.tick(self.now, &mut self.surface)
    }

    fn press_any_key(&mut self) {
        for action in input::key_up("KeyA") {
            self.session.handle_input(action);
        }
    }

    /// Frames until the run ends, capped at two simulated minutes
    fn run_until_over(&mut self) -> Option<u32> {
        for _ in 0..60 * 120 {
            if let Some(id) = self.frame().game_over {
                return Some(id);
            }
        }
        None
    }
}

#[test]
fn test_standing_still_ends_on_an_obstacle() {
    let mut run = Run::new(7, Catalogs::builtin());
    run.frame();
    assert_eq!(run.session.phase(), SessionPhase::AwaitingStart);
    assert!(run.surface.texts().any(|t| t == START_TEXT));

    run.press_any_key();
    assert_eq!(run.session.phase(), SessionPhase::Running);

    let mut last_score = 0.0;
    let mut last_stage = 0;
    let mut hit = None;
    for _ in 0..60 * 120 {
        let report = run.frame();
        let progression = run.session.progression();
        assert!(progression.score() >= last_score);
        assert!(progression.current_stage() >= last_stage);
        last_score = progression.score();
        last_stage = progression.current_stage();
        if report.game_over.is_some() {
            hit = report.game_over;
            break;
        }
    }

    assert!(hit.is_some(), "an idle player should be hit eventually");
    assert_eq!(run.session.phase(), SessionPhase::Over);
    assert!(run.surface.texts().any(|t| t == GAME_OVER_TEXT));
    assert!(run.surface.images().any(|(visual, _)| visual == GROUND_VISUAL));

    let best = run.session.progression().high_score();
    assert!(best > 0);
    assert!(best as f64 <= run.session.progression().score());
    assert_eq!(run.store.get(&run.key).unwrap(), Some(best.to_string()));

    run.worker.drain();
    assert_eq!(run.sink.count(codes::SESSION_START), 1);
    assert_eq!(run.sink.count(codes::HIGH_SCORE_UPDATED), 1);
}

#[test]
fn test_restart_is_debounced_and_resets_the_run() {
    let mut run = Run::new(11, Catalogs::builtin());
    run.press_any_key();
    assert!(run.run_until_over().is_some());
    let first_best = run.session.progression().high_score();

    // Same frame as the hit: too early
    run.press_any_key();
    assert_eq!(run.session.phase(), SessionPhase::Over);

    // A second later the restart goes through
    for _ in 0..61 {
        run.frame();
    }
    run.press_any_key();
    assert_eq!(run.session.phase(), SessionPhase::Running);
    assert_eq!(run.session.progression().score(), 0.0);
    assert_eq!(run.session.progression().current_stage(), 0);
    assert_eq!(run.session.progression().high_score(), first_best);
    assert!(run.session.obstacles().entities().is_empty());

    run.worker.drain();
    assert_eq!(run.sink.count(codes::SESSION_START), 2);
}

#[test]
fn test_same_seed_same_run() {
    let mut a = Run::new(99, Catalogs::builtin());
    let mut b = Run::new(99, Catalogs::builtin());
    a.press_any_key();
    b.press_any_key();
    assert_eq!(a.run_until_over(), b.run_until_over());
    assert_eq!(a.session.progression().score(), b.session.progression().score());
    assert_eq!(a.surface.commands(), b.surface.commands());
}

#[test]
fn test_jump_keys_map_to_player_input() {
    let mut run = Run::new(3, Catalogs::builtin());
    run.press_any_key();
    run.frame();

    if let Some(action) = input::key_down("Space", false) {
        run.session.handle_input(action);
    }
    for _ in 0..10 {
        run.frame();
    }
    assert!(run.session.player().is_airborne());

    for action in input::key_up("Space") {
        run.session.handle_input(action);
    }
    // Releasing the jump key never restarts a running game
    assert_eq!(run.session.phase(), SessionPhase::Running);
    assert_eq!(input::key_down("Space", true), None);
    assert_eq!(input::touch_start(), InputAction::JumpPress);
}

#[test]
fn test_late_catalogs_unlock_items() {
    let mut run = Run::new(5, Catalogs::pending());
    run.press_any_key();
    assert!(run.session.progression().item_catalog().is_empty());
    assert!(run.session.progression().get_unlocked_ids(0).is_empty());

    run.session
        .install_catalogs(ItemCatalog::builtin(), UnlockMap::builtin());
    assert_eq!(run.session.progression().get_unlocked_ids(0), &[1]);
    assert_eq!(run.session.progression().unlocked_items(), &[1]);
}
