//! Game simulations
//!
//! Every game is a parameterization of the same loop: clamped delta-time,
//! explicit Euler integration, AABB collision and a level director. Games own
//! their state outright and draw all randomness from a seeded `Pcg32`, so a
//! fixed seed and input sequence always replays the same run.

pub mod breakout;
pub mod collision;
pub mod director;
pub mod engine;
pub mod physics;
pub mod pong;
pub mod rng;
pub mod shooter;
pub mod state;
pub mod tetris;

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

pub use breakout::{Breakout, BreakoutConfig};
pub use collision::{Aabb, Contact, Face, Walls};
pub use engine::{Game, Session};
pub use physics::{Side, SpeedLimits};
pub use pong::{Pong, PongConfig};
pub use shooter::{Shooter, ShooterConfig};
pub use state::{
    Ball, Brick, BrickKind, Bullet, Enemy, EnemyKind, EnemyMode, GameEvent, Hud, Paddle, PowerUp,
    PowerUpKind,
};
pub use tetris::{Tetris, TetrisConfig};

/// The games in the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Pong,
    Breakout,
    Tetris,
    Shooter,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [GameKind::Pong, GameKind::Breakout, GameKind::Tetris, GameKind::Shooter];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Pong => "pong",
            GameKind::Breakout => "breakout",
            GameKind::Tetris => "tetris",
            GameKind::Shooter => "shooter",
        }
    }

    /// Parse a route-style game name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "pong" => Some(GameKind::Pong),
            "breakout" => Some(GameKind::Breakout),
            "tetris" => Some(GameKind::Tetris),
            "shooter" | "galaga" => Some(GameKind::Shooter),
            _ => None,
        }
    }

    /// Build a fresh game from `settings`
    pub fn create(self, settings: &Settings) -> Box<dyn Game> {
        let (difficulty, seed) = (settings.difficulty, settings.seed);
        log::info!("Starting {} on {}", self.as_str(), difficulty.as_str());
        match self {
            GameKind::Pong => Box::new(Pong::new(settings.pong.clone(), difficulty, seed)),
            GameKind::Breakout => Box::new(Breakout::new(settings.breakout.clone(), difficulty, seed)),
            GameKind::Tetris => Box::new(Tetris::new(settings.tetris.clone(), difficulty, seed)),
            GameKind::Shooter => Box::new(Shooter::new(settings.shooter.clone(), difficulty, seed)),
        }
    }
}
