//! Browser bridge
//!
//! The page owns the canvas, the `requestAnimationFrame` loop and the DOM
//! listeners; it forwards events here and renders from `snapshot_json`.
//! `frame` answers whether another animation frame should be requested.

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::platform::{FrameFlag, push_capped};
use crate::settings::Settings;
use crate::sim::{Game, GameEvent, GameKind, Session};

/// Events kept for `events_json`; older ones are dropped first
const MAX_PENDING_EVENTS: usize = 256;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Neon Arcade core loaded");
}

/// One running game, driven by the page
#[wasm_bindgen]
pub struct ArcadeHandle {
    kind: GameKind,
    session: Session<Box<dyn Game>>,
    flag: FrameFlag,
    last_timestamp: Option<f64>,
    events: Vec<GameEvent>,
}

#[wasm_bindgen]
impl ArcadeHandle {
    /// Create a game by name (`pong`, `breakout`, `tetris`, `shooter`) with
    /// optional settings JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(game: &str, settings_json: Option<String>) -> Result<ArcadeHandle, JsError> {
        let kind = GameKind::from_name(game).ok_or_else(|| JsError::new(&format!("unknown game: {game}")))?;
        let settings = match settings_json {
            Some(json) => Settings::from_json(&json).map_err(|err| {
                log::warn!("Rejected settings: {err}");
                JsError::new(&err.to_string())
            })?,
            None => Settings::default(),
        };

        let mut flag = FrameFlag::default();
        let mut session = Session::new(kind.create(&settings));
        session.start(&mut flag);
        Ok(Self {
            kind,
            session,
            flag,
            last_timestamp: None,
            events: Vec::new(),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn game(&self) -> String {
        self.kind.as_str().to_string()
    }

    /// Run one frame at `timestamp_ms` (the rAF timestamp). Returns true if
    /// the page should request another frame.
    pub fn frame(&mut self, timestamp_ms: f64) -> bool {
        let dt = match self.last_timestamp.replace(timestamp_ms) {
            Some(prev) => ((timestamp_ms - prev) / 1000.0) as f32,
            None => 0.0,
        };
        let events = self.session.frame(dt, &mut self.flag);
        push_capped(&mut self.events, events, MAX_PENDING_EVENTS);

        let again = self.flag.take();
        if !again {
            // Next start measures from its own first frame
            self.last_timestamp = None;
        }
        again
    }

    /// True once if input (a resume) asked for the loop to restart
    pub fn wants_frame(&mut self) -> bool {
        self.flag.take()
    }

    /// Returns true if the key is bound (the page should preventDefault)
    pub fn key_down(&mut self, key: &str) -> bool {
        self.session.key_down(key, &mut self.flag)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.session.key_up(key)
    }

    /// Pointer/touch position in playfield coordinates
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.session.input_mut().pointer_down(Vec2::new(x, y));
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.session.input_mut().pointer_move(Vec2::new(x, y));
    }

    pub fn pointer_up(&mut self) {
        self.session.input_mut().pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.session.input_mut().pointer_leave();
    }

    /// Window lost focus: drop held keys and pause
    pub fn blur(&mut self) {
        self.session.input_mut().clear();
        self.session.pause();
    }

    pub fn pause(&mut self) {
        self.session.pause();
    }

    pub fn resume(&mut self) {
        self.session.resume(&mut self.flag);
    }

    #[wasm_bindgen(getter)]
    pub fn paused(&self) -> bool {
        self.session.is_paused()
    }

    pub fn hud_json(&self) -> String {
        serde_json::to_string(&self.session.hud()).unwrap_or_default()
    }

    pub fn snapshot_json(&self) -> String {
        self.session.game().snapshot().to_string()
    }

    /// Events since the last call, oldest first
    pub fn events_json(&mut self) -> String {
        let events = std::mem::take(&mut self.events);
        serde_json::to_string(&events).unwrap_or_default()
    }
}
