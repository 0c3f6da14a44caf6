//! Neon Arcade - simulation core for a suite of canvas arcade games
//!
//! Core modules:
//! - `sim`: Per-game simulation (physics, collisions, level/wave director)
//! - `input`: Keyboard/pointer/touch normalization into per-frame intents
//! - `platform`: Frame scheduling abstraction and a fixed-step driver
//! - `settings`: Difficulty and per-game tuning
//! - `web`: wasm32 bridge for the browser host

pub mod input;
pub mod platform;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{Action, InputAdapter, Intent};
pub use platform::{FixedStepDriver, Scheduler};
pub use settings::{Difficulty, Playfield, Settings, SettingsError};
pub use sim::{Game, GameEvent, GameKind, Hud, Session};

/// Engine-wide constants
pub mod consts {
    /// Largest delta-time accepted by a single step (stalled frame guard)
    pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;

    /// Serve speed for a freshly centred ball
    pub const SERVE_SPEED: f32 = 300.0;
    /// Serve angle spread either side of horizontal (30 degrees)
    pub const SERVE_MAX_ANGLE: f32 = std::f32::consts::FRAC_PI_6;

    /// Ball speed bounds
    pub const BALL_MIN_SPEED: f32 = 150.0;
    pub const BALL_MAX_SPEED: f32 = 900.0;
    /// Speed growth applied after a paddle hit (multiplicative)
    pub const BALL_SPEED_GROWTH: f32 = 1.03;

    /// Cosmetic particle cap per game
    pub const MAX_PARTICLES: usize = 512;
}

/// Clamp `v` into `[lo, hi]`.
///
/// Unlike `f32::clamp` this never panics: if `lo > hi` the lower bound wins,
/// which pins an oversized paddle to the playfield origin.
#[inline]
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    lo.max(hi.min(v))
}

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inside_and_outside() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-3.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(42.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_clamp_inverted_bounds_prefers_lower() {
        assert_eq!(clamp(5.0, 10.0, 0.0), 10.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(10.0, 20.0, 0.5), 15.0);
        assert_eq!(lerp(10.0, 20.0, 0.0), 10.0);
    }
}
