//! Dash Runner entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{KeyboardEvent, Response, TouchEvent};

    use dash_runner::audio::AudioManager;
    use dash_runner::catalog::{CatalogError, Catalogs, ItemCatalog, UnlockMap};
    use dash_runner::persistence::{LocalStorageStore, PlayerId};
    use dash_runner::platform::{InputAction, SystemClock, input};
    use dash_runner::renderer::CanvasSurface;
    use dash_runner::sim::{Collaborators, Session, SessionConfig};
    use dash_runner::telemetry::{self, LogSink, TelemetryWorker};
    use dash_runner::{HighScore, Settings, Tuning, Viewport};

    const CANVAS_ID: &str = "game";
    const ITEMS_URL: &str = "assets/item.json";
    const UNLOCKS_URL: &str = "assets/item_unlock.json";

    /// Game instance holding all state
    struct Game {
        session: Session,
        surface: CanvasSurface,
        telemetry: TelemetryWorker,
        settings: Settings,
        store: LocalStorageStore,
    }

    impl Game {
        fn frame(&mut self, time: f64) {
            let report = self.session.tick(time, &mut self.surface);
            if let Some(change) = report.stage_change {
                log::debug!("Stage {} -> {}", change.from, change.to);
            }
            self.telemetry.drain();
        }

        fn input(&mut self, actions: impl IntoIterator<Item = InputAction>) {
            for action in actions {
                self.session.handle_input(action);
            }
        }

        fn toggle_mute(&mut self) {
            self.settings.toggle_muted(&mut self.store);
            self.session.apply_settings(&self.settings);
        }

        /// Match the canvas and world to the current window size
        fn refit(&mut self) {
            let Some(viewport) = window_viewport() else {
                return;
            };
            if viewport != self.session.viewport() {
                self.surface.resize(viewport.width, viewport.height);
                self.session.resize(viewport);
            }
        }
    }

    fn window_viewport() -> Option<Viewport> {
        let window = web_sys::window()?;
        let screen_w = window.inner_width().ok()?.as_f64()?;
        let screen_h = window.inner_height().ok()?.as_f64()?;
        Some(Viewport::fit(screen_w as f32, screen_h as f32))
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(err) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Logger init failed: {err}").into());
        }

        log::info!("Dash Runner starting...");

        let mut surface = match CanvasSurface::from_element_id(CANVAS_ID) {
            Ok(surface) => surface,
            Err(err) => {
                log::error!("Cannot start: {err}");
                return;
            }
        };

        let viewport = window_viewport().unwrap_or_default();
        surface.resize(viewport.width, viewport.height);
        surface.load_images();

        let seed = js_sys::Date::now() as u64;
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut store = LocalStorageStore;
        let (player_id, created) = PlayerId::load_or_create(&mut store, &mut rng);
        if created {
            log::info!("New player {player_id}");
        }

        let settings = Settings::load(&store);
        let (queue, worker) = telemetry::channel(player_id.to_string(), LogSink);

        let session = Session::new(
            SessionConfig {
                tuning: Tuning::load(&store),
                viewport,
                seed,
                high_score_key: HighScore::key_for(&player_id),
            },
            Catalogs::pending(),
            Collaborators {
                store: Box::new(store),
                telemetry: queue,
                audio: Box::new(AudioManager::new(&settings)),
                clock: Box::new(SystemClock),
            },
        );

        log::info!("Game initialized with seed: {seed}");

        let game = Rc::new(RefCell::new(Game {
            session,
            surface,
            telemetry: worker,
            settings,
            store,
        }));

        load_catalogs(game.clone());
        setup_input_handlers(game.clone());
        setup_resize_handlers(game.clone());
        request_animation_frame(game);

        log::info!("Dash Runner running!");
    }

    /// Fetch the item catalog and unlock map, falling back to the embedded copies
    fn load_catalogs(game: Rc<RefCell<Game>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let items = match fetch_text(ITEMS_URL).await {
                Ok(json) => ItemCatalog::from_json(&json).unwrap_or_else(|err| {
                    log::warn!("Bad {ITEMS_URL} ({err}), using built-in items");
                    ItemCatalog::builtin()
                }),
                Err(err) => {
                    log::warn!("{err}, using built-in items");
                    ItemCatalog::builtin()
                }
            };
            let unlocks = match fetch_text(UNLOCKS_URL).await {
                Ok(json) => UnlockMap::from_json(&json).unwrap_or_else(|err| {
                    log::warn!("Bad {UNLOCKS_URL} ({err}), using built-in unlocks");
                    UnlockMap::builtin()
                }),
                Err(err) => {
                    log::warn!("{err}, using built-in unlocks");
                    UnlockMap::builtin()
                }
            };
            game.borrow_mut().session.install_catalogs(items, unlocks);
        });
    }

    async fn fetch_text(url: &str) -> Result<String, CatalogError> {
        let unavailable = |err: JsValue| CatalogError::Unavailable(format!("{err:?}"));
        let window =
            web_sys::window().ok_or_else(|| CatalogError::Unavailable("no window".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .and_then(|value| value.dyn_into())
            .map_err(unavailable)?;
        if !response.ok() {
            return Err(CatalogError::Unavailable(format!("HTTP {}", response.status())));
        }
        let body = response.text().map_err(unavailable)?;
        JsFuture::from(body)
            .await
            .map_err(unavailable)?
            .as_string()
            .ok_or_else(|| CatalogError::Unavailable("response body is not text".into()))
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::warn!("No document; input disabled");
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(action) = input::key_down(&event.code(), event.repeat()) {
                    event.prevent_default();
                    game.borrow_mut().input([action]);
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                let mut game = game.borrow_mut();
                if input::is_mute_key(&code) {
                    game.toggle_mute();
                }
                game.input(input::key_up(&code));
            });
            let _ = document
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().input([input::touch_start()]);
            });
            let _ = document
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                game.borrow_mut().input(input::touch_end());
            });
            let _ = document
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Refit on window resize and on device rotation
    fn setup_resize_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        let on_resize = {
            let game = game.clone();
            Closure::<dyn FnMut()>::new(move || game.borrow_mut().refit())
        };
        let _ = window
            .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
        on_resize.forget();

        match window.screen().map(|screen| screen.orientation()) {
            Ok(orientation) => {
                let on_rotate = Closure::<dyn FnMut()>::new(move || game.borrow_mut().refit());
                let _ = orientation.add_event_listener_with_callback(
                    "change",
                    on_rotate.as_ref().unchecked_ref(),
                );
                on_rotate.forget();
            }
            Err(err) => log::warn!("No screen orientation events: {err:?}"),
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Dash Runner (native) starting...");
    log::info!("Native mode runs a headless session - use `trunk serve` for the web version");

    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted run against in-memory collaborators
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use dash_runner::audio::SilentAudio;
    use dash_runner::catalog::Catalogs;
    use dash_runner::persistence::{MemoryStore, PlayerId};
    use dash_runner::platform::{InputAction, ManualClock};
    use dash_runner::renderer::CommandList;
    use dash_runner::sim::{Collaborators, Session, SessionConfig, SessionPhase};
    use dash_runner::telemetry::{self, LogSink};
    use dash_runner::{HighScore, Tuning, Viewport};

    const SEED: u64 = 0xDA5;
    const FRAME_MS: f64 = 1000.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 120;
    /// Jump every this many frames
    const JUMP_EVERY: u32 = 45;

    /// Balance overrides from the JSON file named on the command line
    fn tuning_from_args() -> Tuning {
        let Some(path) = std::env::args().nth(1) else {
            return Tuning::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => {
                log::info!("Tuning overrides from {path}");
                Tuning::from_json(&json)
            }
            Err(err) => {
                log::warn!("Cannot read {path} ({err}), using default tuning");
                Tuning::default()
            }
        }
    }

    pub fn run() {
        let mut store = MemoryStore::new();
        let mut rng = Pcg32::seed_from_u64(SEED);
        let (player_id, _) = PlayerId::load_or_create(&mut store, &mut rng);

        let (queue, worker) = telemetry::channel(player_id.to_string(), LogSink);
        let worker = match worker.spawn() {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::warn!("Telemetry thread not started: {err}");
                None
            }
        };

        let clock = ManualClock::new(0.0);
        let viewport = Viewport::default();
        let mut session = Session::new(
            SessionConfig {
                tuning: tuning_from_args(),
                viewport,
                seed: SEED,
                high_score_key: HighScore::key_for(&player_id),
            },
            Catalogs::builtin(),
            Collaborators {
                store: Box::new(store.clone()),
                telemetry: queue.clone(),
                audio: Box::new(SilentAudio),
                clock: Box::new(clock.clone()),
            },
        );
        let mut surface = CommandList::new(viewport.width, viewport.height);

        session.handle_input(InputAction::Start);

        let mut collected = 0;
        let mut frames = 0;
        for frame in 0..MAX_FRAMES {
            let now = f64::from(frame) * FRAME_MS;
            clock.set(now);

            match frame % JUMP_EVERY {
                0 => session.handle_input(InputAction::JumpPress),
                12 => session.handle_input(InputAction::JumpRelease),
                _ => {}
            }

            surface.clear_commands();
            let report = session.tick(now, &mut surface);
            collected += usize::from(report.collected.is_some());
            frames = frame + 1;

            if let Some(obstacle) = report.game_over {
                log::info!("Hit obstacle {obstacle} after {:.1}s", now / 1000.0);
                break;
            }
        }

        let progression = session.progression();
        log::info!(
            "Headless run finished: {frames} frames, score {:.0}, stage {}, {collected} items, best {}",
            progression.score(),
            progression.current_stage(),
            progression.high_score(),
        );
        if session.phase() == SessionPhase::Over {
            log::info!("Draw calls on final frame: {}", surface.commands().len());
        }

        queue.shutdown();
        if let Some(handle) = worker
            && handle.join().is_err()
        {
            log::warn!("Telemetry thread panicked");
        }
    }
}
