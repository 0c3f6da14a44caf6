//! Input adapter
//!
//! Collects raw keyboard and pointer/touch events between frames and resolves
//! them into one `Intent` per frame. Key names follow DOM `KeyboardEvent.key`.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Logical actions, independent of the physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    /// Shoot (shooter) / hard drop (Tetris)
    Fire,
    /// Hold piece (Tetris)
    Hold,
    Pause,
}

impl Action {
    /// Map a DOM key name to an action
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" | "A" => Some(Action::Left),
            "ArrowRight" | "d" | "D" => Some(Action::Right),
            "ArrowUp" | "w" | "W" => Some(Action::Up),
            "ArrowDown" | "s" | "S" => Some(Action::Down),
            " " | "Space" | "Spacebar" => Some(Action::Fire),
            "c" | "C" => Some(Action::Hold),
            "p" | "P" | "Escape" => Some(Action::Pause),
            _ => None,
        }
    }
}

/// Press edges seen since the previous frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pressed {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
    pub hold: bool,
}

/// Everything a simulation step needs to know about the player this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Held direction, each axis in {-1, 0, 1}; y is down-positive
    pub direction: Vec2,
    /// Fire held
    pub fire: bool,
    /// Keys that went down this frame
    pub pressed: Pressed,
    /// Pause toggle requested this frame
    pub pause: bool,
    /// Pointer position in playfield coordinates, if it moved this frame
    pub pointer: Option<Vec2>,
    /// Pointer button / touch is down
    pub pointer_down: bool,
}

/// Accumulates raw events between frames
#[derive(Debug, Clone, Default)]
pub struct InputAdapter {
    /// Bound key names currently down; several keys may share an action
    held: HashSet<String>,
    pressed: HashSet<Action>,
    pointer: Option<Vec2>,
    pointer_moved: bool,
    pointer_down: bool,
}

impl InputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press; returns true if the key is bound
    pub fn key_down(&mut self, key: &str) -> bool {
        let Some(action) = Action::from_key(key) else {
            return false;
        };
        // Auto-repeats and a second key for an already held action are not
        // fresh presses
        let was_held = self.is_held(action);
        if self.held.insert(key.to_string()) && !was_held {
            self.pressed.insert(action);
        }
        true
    }

    /// Record a key release; returns true if the key is bound
    pub fn key_up(&mut self, key: &str) -> bool {
        if Action::from_key(key).is_none() {
            return false;
        }
        self.held.remove(key);
        true
    }

    /// Mark a bound key as down without registering a press
    pub fn hold_quietly(&mut self, key: &str) {
        if Action::from_key(key).is_some() {
            self.held.insert(key.to_string());
        }
    }

    /// Any key bound to `action` is down
    pub fn is_held(&self, action: Action) -> bool {
        self.held.iter().any(|key| Action::from_key(key) == Some(action))
    }

    /// Pointer/touch pressed at a playfield position
    pub fn pointer_down(&mut self, pos: Vec2) {
        self.pointer_down = true;
        self.pointer_move(pos);
    }

    /// Pointer moved (pressed or hovering)
    pub fn pointer_move(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
        self.pointer_moved = true;
    }

    pub fn pointer_up(&mut self) {
        self.pointer_down = false;
    }

    /// Pointer left the canvas
    pub fn pointer_leave(&mut self) {
        self.pointer_down = false;
        self.pointer = None;
        self.pointer_moved = false;
    }

    /// Drop all held state (focus lost)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Resolve the current state into this frame's intent and consume edges
    pub fn sample(&mut self) -> Intent {
        let held: HashSet<Action> = self.held.iter().filter_map(|key| Action::from_key(key)).collect();
        let axis = |neg: Action, pos: Action| -> f32 {
            let mut v = 0.0;
            if held.contains(&neg) {
                v -= 1.0;
            }
            if held.contains(&pos) {
                v += 1.0;
            }
            v
        };
        let direction = Vec2::new(axis(Action::Left, Action::Right), axis(Action::Up, Action::Down));

        let was = |a: Action| self.pressed.contains(&a);
        let pressed = Pressed {
            left: was(Action::Left),
            right: was(Action::Right),
            up: was(Action::Up),
            down: was(Action::Down),
            fire: was(Action::Fire),
            hold: was(Action::Hold),
        };
        let pause = was(Action::Pause);

        let pointer = if self.pointer_moved { self.pointer } else { None };
        let intent = Intent {
            direction,
            fire: held.contains(&Action::Fire),
            pressed,
            pause,
            pointer,
            pointer_down: self.pointer_down,
        };

        self.pressed.clear();
        self.pointer_moved = false;
        intent
    }
}
