//! Rocket Run entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Document, Element, KeyboardEvent, TouchEvent};

    use rocket_run::audio::{AudioManager, SoundEffect};
    use rocket_run::platform::Controls;
    use rocket_run::renderer::{Frame, Renderer};
    use rocket_run::sim::{
        Catalog, GameEvent, GameState, LevelReport, TemplateSet, next_level,
        restart_from_level_1, start_game, tick,
    };
    use rocket_run::ui::{self, Hud};
    use rocket_run::{HighScores, Settings, Tuning};

    const TEMPLATES_URL: &str = "assets/templates.json";
    const TUNING_URL: &str = "assets/tuning.json";

    // The scene graph lives on the JS side; it receives raw buffers each frame
    #[wasm_bindgen(inline_js = "
        export function render_frame(globals, instances) {
            if (window.rocketRenderer) {
                window.rocketRenderer.render(globals, instances);
            }
        }
    ")]
    extern "C" {
        fn render_frame(globals: &[u8], instances: &[u8]);
    }

    struct JsRenderer;

    impl Renderer for JsRenderer {
        fn render(&mut self, frame: &Frame) {
            render_frame(frame.globals_bytes(), frame.instance_bytes());
        }
    }

    /// HUD over the page's DOM
    struct DomHud {
        document: Document,
    }

    impl DomHud {
        fn el(&self, id: &str) -> Option<Element> {
            self.document.get_element_by_id(id)
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.el(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_hidden(&self, id: &str, hidden: bool) {
            if let Some(el) = self.el(id) {
                let classes = el.class_list();
                let _ = if hidden {
                    classes.add_1("hidden")
                } else {
                    classes.remove_1("hidden")
                };
            }
        }
    }

    impl Hud for DomHud {
        fn set_progress_bar_fraction(&mut self, fraction: f32) {
            if let Some(el) = self.el("courseProgress")
                && let Ok(el) = el.dyn_into::<web_sys::HtmlElement>()
            {
                let _ = el
                    .style()
                    .set_property("width", &format!("{}px", fraction * 200.0));
            }
        }

        fn set_crystal_count(&mut self, count: u32) {
            self.set_text("crystalCount", &count.to_string());
        }

        fn set_shield_count(&mut self, count: i32) {
            self.set_text("shieldCount", &count.to_string());
        }

        fn set_shield_danger(&mut self, danger: bool) {
            if let Some(el) = self.el("shieldCount") {
                let classes = el.class_list();
                let _ = if danger {
                    classes.add_1("danger")
                } else {
                    classes.remove_1("danger")
                };
            }
        }

        fn show_level_end_screen(&mut self, report: &LevelReport) {
            self.set_text("levelDescriptor", &ui::level_indicator(report.level));
            self.set_text("shipStatus", ui::ship_status(report));
            self.set_text("crystalCountLevelEnd", &report.crystals.to_string());
            let next = ui::offers_next_level(report);
            self.set_hidden("nextLevel", !next);
            self.set_hidden("startOver", next);
            self.set_hidden("endOfLevel", false);
        }

        fn show_start_panel(&mut self) {
            self.set_hidden("endOfLevel", true);
            self.set_hidden("levelStartPanel", false);
        }

        fn hide_start_panel(&mut self) {
            self.set_hidden("levelStartPanel", true);
            self.set_hidden("headsUpDisplay", false);
        }

        fn set_level_indicator(&mut self, text: &str) {
            self.set_text("levelIndicator", text);
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        controls: Controls,
        settings: Settings,
        highscores: HighScores,
        audio: AudioManager,
        hud: DomHud,
        renderer: JsRenderer,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        /// One frame: simulate, notify, draw
        fn frame(&mut self, time_ms: f64) {
            let input = self.controls.tick_input(&self.settings);
            tick(&mut self.state, &input, time_ms / 1000.0);

            for event in self.state.drain_events() {
                ui::apply_event(&event, &mut self.hud);
                if let Some(effect) = SoundEffect::for_event(&event) {
                    self.audio.play(effect);
                }
                if let GameEvent::LevelEndScreen(report) = event {
                    self.record_score(&report);
                }
            }

            let frame = Frame::capture(&self.state);
            self.renderer.render(&frame);

            self.track_fps(time_ms);
        }

        fn record_score(&mut self, report: &LevelReport) {
            if let Some(rank) = self.highscores.record(report, js_sys::Date::now()) {
                log::info!("Crystal haul {} ranked #{}", report.crystals, rank);
                self.highscores.save();
                if rank == 1 {
                    self.audio.play(SoundEffect::HighScore);
                }
            }
            if let Some(best) = self.highscores.best() {
                self.hud.set_text("bestHaul", &best.to_string());
            }
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            // Oldest to newest frame
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
            if self.settings.show_fps {
                self.hud.set_text("fps", &self.fps.to_string());
            }
        }
    }

    /// Fetch a text asset; `None` on any network or HTTP failure
    async fn fetch_text(url: &str) -> Option<String> {
        let window = web_sys::window()?;
        let response = JsFuture::from(window.fetch_with_str(url)).await.ok()?;
        let response: web_sys::Response = response.dyn_into().ok()?;
        if !response.ok() {
            return None;
        }
        let text = JsFuture::from(response.text().ok()?).await.ok()?;
        text.as_string()
    }

    /// The template manifest must resolve before the first tick
    async fn load_templates() -> TemplateSet {
        match fetch_text(TEMPLATES_URL).await {
            Some(json) => match TemplateSet::from_json(&json) {
                Ok(set) => {
                    log::info!("Loaded templates from {}", TEMPLATES_URL);
                    set
                }
                Err(err) => {
                    log::warn!("{}; using built-in templates", err);
                    TemplateSet::default()
                }
            },
            None => {
                log::warn!("No template manifest at {}; using built-in templates", TEMPLATES_URL);
                TemplateSet::default()
            }
        }
    }

    async fn load_tuning() -> Tuning {
        let Some(json) = fetch_text(TUNING_URL).await else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides from {}", TUNING_URL);
                tuning
            }
            Err(err) => {
                log::warn!("{}; using default tuning", err);
                Tuning::default()
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Rocket Run starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let catalog = Catalog::loaded(load_templates().await);
        let tuning = load_tuning().await;
        let settings = Settings::load();

        let seed = js_sys::Date::now() as u64;
        let state = match GameState::new(seed, catalog, tuning) {
            Ok(state) => state,
            Err(err) => {
                log::error!("Cannot start: {}", err);
                return;
            }
        };
        log::info!("Game initialized with seed: {}", seed);

        let mut hud = DomHud {
            document: document.clone(),
        };
        for id in ["loadingCover", "loadingTextContainer", "rocketPicture"] {
            if let Some(el) = hud.el(id) {
                el.remove();
            }
        }
        hud.set_hidden("fps", !settings.show_fps);

        let game = Rc::new(RefCell::new(Game {
            state,
            controls: Controls::new(),
            audio: AudioManager::new(&settings),
            settings,
            highscores: HighScores::load(),
            hud,
            renderer: JsRenderer,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }));

        {
            let mut g = game.borrow_mut();
            let Game { state, hud, .. } = &mut *g;
            for event in state.drain_events() {
                ui::apply_event(&event, hud);
            }
        }

        setup_keyboard(game.clone());
        setup_joystick(&document, game.clone());
        setup_buttons(&document, game.clone());
        setup_focus(game.clone());

        request_animation_frame(game);

        log::info!("Rocket Run running!");
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                if g.controls.key_down(&key) {
                    event.prevent_default();
                    return;
                }
                match key.as_str() {
                    "i" | "I" => {
                        g.controls.autopilot = !g.controls.autopilot;
                        log::info!("Autopilot: {}", g.controls.autopilot);
                    }
                    "m" | "M" => {
                        let Game {
                            audio, settings, ..
                        } = &mut *g;
                        log::info!("Muted: {}", settings.toggle_muted());
                        audio.apply_settings(settings);
                        settings.save();
                    }
                    "f" | "F" => {
                        let show = g.settings.toggle_show_fps();
                        g.hud.set_hidden("fps", !show);
                        g.settings.save();
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().controls.key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Touch joystick: horizontal offset from the zone's centre, -1..1
    fn setup_joystick(document: &Document, game: Rc<RefCell<Game>>) {
        let Some(zone) = document.get_element_by_id("joystick-zone") else {
            return;
        };

        for name in ["touchstart", "touchmove"] {
            let game = game.clone();
            let zone_clone = zone.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let rect = zone_clone.get_bounding_client_rect();
                    let half = (rect.width() / 2.0).max(1.0);
                    let x = (touch.client_x() as f64 - rect.left() - half) / half;
                    game.borrow_mut().controls.joystick_move(x as f32);
                }
            });
            let _ = zone.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for name in ["touchend", "touchcancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                game.borrow_mut().controls.joystick_end();
            });
            let _ = zone.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        let commands: [(&str, fn(&mut GameState) -> bool); 3] = [
            ("startGame", start_game),
            ("nextLevel", next_level),
            ("startOver", restart_from_level_1),
        ];

        for (id, command) in commands {
            let Some(btn) = document.get_element_by_id(id) else {
                log::warn!("Missing #{} button", id);
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                // Clicks count as the user gesture browsers want before audio
                g.audio.resume();
                command(&mut g.state);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_focus(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.controls.release_all();
                if g.settings.mute_on_blur {
                    g.audio.silence();
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                let Game {
                    audio, settings, ..
                } = &mut *g;
                audio.apply_settings(settings);
            });
            let _ = window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
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
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless HUD: logs what the page would show
#[cfg(not(target_arch = "wasm32"))]
struct LogHud;

#[cfg(not(target_arch = "wasm32"))]
impl rocket_run::ui::Hud for LogHud {
    fn set_progress_bar_fraction(&mut self, _fraction: f32) {}

    fn set_crystal_count(&mut self, count: u32) {
        log::debug!("Crystals: {}", count);
    }

    fn set_shield_count(&mut self, count: i32) {
        log::debug!("Shields: {}", count);
    }

    fn set_shield_danger(&mut self, danger: bool) {
        if danger {
            log::debug!("Shields critical");
        }
    }

    fn show_level_end_screen(&mut self, report: &rocket_run::sim::LevelReport) {
        log::info!(
            "{}: {} crystals. {}",
            rocket_run::ui::level_indicator(report.level),
            report.crystals,
            rocket_run::ui::ship_status(report)
        );
    }

    fn show_start_panel(&mut self) {}

    fn set_level_indicator(&mut self, text: &str) {
        log::info!("{}", text);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use rocket_run::consts::FRAME_DT;
    use rocket_run::sim::{
        Catalog, GamePhase, GameState, TemplateSet, TickInput, next_level, start_game, tick,
    };
    use rocket_run::{HighScores, Tuning, ui};

    env_logger::init();
    log::info!("Rocket Run (native) starting...");
    log::info!("Native mode runs a headless autopilot - use `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let levels: u32 = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);

    let mut state = match GameState::new(seed, Catalog::loaded(TemplateSet::default()), Tuning::default()) {
        Ok(state) => state,
        Err(err) => {
            log::error!("Cannot start: {}", err);
            std::process::exit(1);
        }
    };

    let mut hud = LogHud;
    let mut highscores = HighScores::new();
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut now = 0.0;

    start_game(&mut state);
    // Generous cap: the longest course at the slowest ramp plus the clips
    let max_ticks = 200_000;
    for _ in 0..max_ticks {
        now += FRAME_DT;
        tick(&mut state, &input, now);
        for event in state.drain_events() {
            ui::apply_event(&event, &mut hud);
            if let rocket_run::sim::GameEvent::LevelEndScreen(report) = event {
                highscores.record(&report, now * 1000.0);
            }
        }

        if let GamePhase::LevelEndScreen { .. } = state.phase {
            if state.config.level >= levels || !next_level(&mut state) {
                break;
            }
            start_game(&mut state);
        }
    }

    println!("\nSeed {} - best hauls:", seed);
    for (i, entry) in highscores.entries.iter().enumerate() {
        println!(
            "  #{} level {} - {} crystals{}",
            i + 1,
            entry.level,
            entry.crystals,
            if entry.completed { "" } else { " (ship lost)" }
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
