//! Shared frame loop
//!
//! `Game` is the contract every arcade game implements: one atomic step per
//! frame from an intent and a clamped delta-time. `Session` wraps a game with
//! its input adapter, pause state and the level director, and decides whether
//! the host should schedule another frame.

use serde::Serialize;

use super::director;
use super::state::{GameEvent, Hud};
use crate::consts::MAX_FRAME_DT;
use crate::input::{Action, InputAdapter, Intent};
use crate::platform::Scheduler;

/// A single arcade game simulation
pub trait Game {
    /// Largest delta-time a single step accepts
    fn max_dt(&self) -> f32 {
        MAX_FRAME_DT
    }

    /// Advance by `dt` seconds (already clamped), pushing discrete events
    fn step(&mut self, intent: &Intent, dt: f32, events: &mut Vec<GameEvent>);

    /// Terminal state reached; further steps are ignored
    fn is_over(&self) -> bool;

    fn hud(&self) -> Hud;

    /// Progression condition for the director (all bricks/enemies gone, ...)
    fn level_cleared(&self) -> bool {
        false
    }

    /// Escalate to the next level and reset transient entities
    fn start_next_level(&mut self) {}

    /// Full read-only state for the render pass
    fn snapshot(&self) -> serde_json::Value;

    /// Clamp `dt` and run one step
    fn advance(&mut self, intent: &Intent, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.is_over() {
            return events;
        }
        let dt = crate::clamp(dt, 0.0, self.max_dt());
        self.step(intent, dt, &mut events);
        events
    }
}

impl<G: Game + ?Sized> Game for Box<G> {
    fn max_dt(&self) -> f32 {
        (**self).max_dt()
    }

    fn step(&mut self, intent: &Intent, dt: f32, events: &mut Vec<GameEvent>) {
        (**self).step(intent, dt, events)
    }

    fn is_over(&self) -> bool {
        (**self).is_over()
    }

    fn hud(&self) -> Hud {
        (**self).hud()
    }

    fn level_cleared(&self) -> bool {
        (**self).level_cleared()
    }

    fn start_next_level(&mut self) {
        (**self).start_next_level()
    }

    fn snapshot(&self) -> serde_json::Value {
        (**self).snapshot()
    }
}

/// Serialize game state for the render pass; failures degrade to `Null`
pub fn snapshot_of<T: Serialize>(state: &T) -> serde_json::Value {
    serde_json::to_value(state).unwrap_or_else(|err| {
        log::warn!("Snapshot failed: {err}");
        serde_json::Value::Null
    })
}

/// One running game plus its input and pause state
#[derive(Debug)]
pub struct Session<G> {
    game: G,
    input: InputAdapter,
    paused: bool,
    frames: u64,
}

impl<G: Game> Session<G> {
    pub fn new(game: G) -> Self {
        Self {
            game,
            input: InputAdapter::new(),
            paused: false,
            frames: 0,
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn input_mut(&mut self) -> &mut InputAdapter {
        &mut self.input
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Frames simulated so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn hud(&self) -> Hud {
        self.game.hud()
    }

    /// Request the first frame
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) {
        if !self.paused && !self.game.is_over() {
            scheduler.request_next_step();
        }
    }

    /// Key press from the host. While paused the loop is not running, so the
    /// pause key resumes here instead of going through the next frame.
    pub fn key_down(&mut self, key: &str, scheduler: &mut dyn Scheduler) -> bool {
        if self.paused && Action::from_key(key) == Some(Action::Pause) {
            // Auto-repeat of the key that paused does not resume
            if !self.input.is_held(Action::Pause) {
                self.resume(scheduler);
            }
            // Stays held through the resume so its repeats are not presses
            self.input.hold_quietly(key);
            return true;
        }
        self.input.key_down(key)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.input.key_up(key)
    }

    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("Paused after {} frames", self.frames);
        }
        self.paused = true;
    }

    pub fn resume(&mut self, scheduler: &mut dyn Scheduler) {
        if !self.paused {
            return;
        }
        log::info!("Resumed");
        self.paused = false;
        self.input.clear();
        self.start(scheduler);
    }

    /// Run one frame: sample input, step, direct, and reschedule.
    ///
    /// Nothing is rescheduled once paused or over; the step itself is atomic.
    pub fn frame(&mut self, dt: f32, scheduler: &mut dyn Scheduler) -> Vec<GameEvent> {
        if self.paused || self.game.is_over() {
            return Vec::new();
        }

        let intent = self.input.sample();
        if intent.pause {
            self.pause();
            return Vec::new();
        }

        let mut events = self.game.advance(&intent, dt);
        director::direct(&mut self.game, &mut events);
        self.frames += 1;

        if self.game.is_over() {
            let hud = self.game.hud();
            log::info!("Game over: score {} at level {}", hud.score, hud.level);
        } else {
            scheduler.request_next_step();
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::FrameFlag;

    /// Minimal game: counts steps, clears a level every 3 steps, ends at 7
    #[derive(Debug, Default)]
    struct Counter {
        steps: u32,
        level: u32,
        last_dt: f32,
    }

    impl Game for Counter {
        fn step(&mut self, _intent: &Intent, dt: f32, events: &mut Vec<GameEvent>) {
            self.steps += 1;
            self.last_dt = dt;
            if self.steps == 7 {
                events.push(GameEvent::GameOver);
            }
        }

        fn is_over(&self) -> bool {
            self.steps >= 7
        }

        fn hud(&self) -> Hud {
            Hud { level: self.level, game_over: self.is_over(), ..Default::default() }
        }

        fn level_cleared(&self) -> bool {
            self.steps > 0 && self.steps % 3 == 0 && self.level < self.steps / 3
        }

        fn start_next_level(&mut self) {
            self.level += 1;
        }

        fn snapshot(&self) -> serde_json::Value {
            serde_json::json!({ "steps": self.steps })
        }
    }

    #[test]
    fn test_advance_clamps_dt() {
        let mut game = Counter::default();
        game.advance(&Intent::default(), 5.0);
        assert!((game.last_dt - MAX_FRAME_DT).abs() < 1e-6);
        game.advance(&Intent::default(), -1.0);
        assert_eq!(game.last_dt, 0.0);
    }

    #[test]
    fn test_session_reschedules_until_over() {
        let mut session = Session::new(Counter::default());
        let mut flag = FrameFlag::default();
        session.start(&mut flag);

        let mut frames = 0;
        while flag.take() {
            session.frame(1.0 / 60.0, &mut flag);
            frames += 1;
        }
        assert_eq!(frames, 7);
        assert!(session.game().is_over());
        // Director ran on steps 3 and 6
        assert_eq!(session.hud().level, 2);
    }

    #[test]
    fn test_pause_stops_scheduling_and_key_resumes() {
        let mut session = Session::new(Counter::default());
        let mut flag = FrameFlag::default();
        session.start(&mut flag);
        assert!(flag.take());

        session.key_down("p", &mut flag);
        session.key_up("p");
        session.frame(1.0 / 60.0, &mut flag);
        assert!(session.is_paused());
        assert!(!flag.take());
        assert_eq!(session.game().steps, 0);

        session.key_down("p", &mut flag);
        assert!(!session.is_paused());
        assert!(flag.take());
        session.frame(1.0 / 60.0, &mut flag);
        assert_eq!(session.game().steps, 1);
    }

    #[test]
    fn test_held_pause_key_does_not_flicker() {
        let mut session = Session::new(Counter::default());
        let mut flag = FrameFlag::default();
        session.start(&mut flag);

        session.key_down("p", &mut flag);
        session.frame(1.0 / 60.0, &mut flag);
        assert!(session.is_paused());

        // Auto-repeat while still held
        session.key_down("p", &mut flag);
        assert!(session.is_paused());
        session.key_down("p", &mut flag);
        session.frame(1.0 / 60.0, &mut flag);
        assert!(session.is_paused());

        session.key_up("p");
        session.key_down("p", &mut flag);
        assert!(!session.is_paused());
        // Repeats after resuming are not a new pause press
        session.key_down("p", &mut flag);
        session.frame(1.0 / 60.0, &mut flag);
        assert!(!session.is_paused());
        assert_eq!(session.game().steps, 1);
    }
}
