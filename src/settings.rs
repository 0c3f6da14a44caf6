//! Game settings and tuning
//!
//! One `Settings` value carries the difficulty, an optional RNG seed and the
//! per-game tuning tables. Hosts load it from JSON; every field has a default
//! so partial documents are fine.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::breakout::BreakoutConfig;
use crate::sim::physics::SpeedLimits;
use crate::sim::pong::PongConfig;
use crate::sim::shooter::ShooterConfig;
use crate::sim::tetris::TetrisConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{game}: playfield must be positive, got {width}x{height}")]
    InvalidPlayfield {
        game: &'static str,
        width: f32,
        height: f32,
    },
    #[error("{game}: {reason}")]
    InvalidTuning {
        game: &'static str,
        reason: &'static str,
    },
}

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "med" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Logical playfield size in pixels (DPR scaling is the host's job)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Playfield {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    fn validate(&self, game: &'static str) -> Result<(), SettingsError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if positive(self.width) && positive(self.height) {
            Ok(())
        } else {
            Err(SettingsError::InvalidPlayfield {
                game,
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Suite-wide settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    /// Fixed RNG seed (replays, tests); None draws from entropy
    pub seed: Option<u64>,
    pub pong: PongConfig,
    pub breakout: BreakoutConfig,
    pub tetris: TetrisConfig,
    pub shooter: ShooterConfig,
}

impl Settings {
    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the preconditions the simulations rely on
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.pong.playfield.validate("pong")?;
        self.breakout.playfield.validate("breakout")?;
        self.shooter.playfield.validate("shooter")?;
        validate_speed("pong", &self.pong.speed)?;
        validate_speed("breakout", &self.breakout.speed)?;

        if self.pong.paddle_size.y >= self.pong.playfield.height {
            return Err(SettingsError::InvalidTuning {
                game: "pong",
                reason: "paddle taller than playfield",
            });
        }
        if self.breakout.layout.columns == 0 || self.breakout.layout.max_rows == 0 {
            return Err(SettingsError::InvalidTuning {
                game: "breakout",
                reason: "brick layout needs at least one row and one column",
            });
        }
        if self.tetris.columns < 4 || self.tetris.rows < 4 {
            return Err(SettingsError::InvalidTuning {
                game: "tetris",
                reason: "grid must be at least 4x4",
            });
        }
        let gravity = &self.tetris.gravity;
        if gravity.min <= 0.0 || gravity.base < gravity.min || gravity.decay <= 0.0 {
            return Err(SettingsError::InvalidTuning {
                game: "tetris",
                reason: "gravity needs 0 < min <= base and a positive decay",
            });
        }
        let (lo, hi) = self.shooter.power_up_every;
        if lo <= 0.0 || hi < lo {
            return Err(SettingsError::InvalidTuning {
                game: "shooter",
                reason: "power-up interval needs 0 < min <= max",
            });
        }
        Ok(())
    }
}

fn validate_speed(game: &'static str, limits: &SpeedLimits) -> Result<(), SettingsError> {
    if limits.min <= 0.0 || limits.max < limits.min || limits.growth < 1.0 {
        return Err(SettingsError::InvalidTuning {
            game,
            reason: "speed limits need 0 < min <= max and growth >= 1",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "difficulty": "Hard", "seed": 7 }"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.pong.playfield, Playfield::new(900.0, 500.0));
    }

    #[test]
    fn test_zero_playfield_rejected() {
        let err = Settings::from_json(r#"{ "pong": { "playfield": { "width": 0.0, "height": 500.0 } } }"#)
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidPlayfield { game: "pong", .. }));
    }

    #[test]
    fn test_empty_brick_layout_rejected() {
        let err = Settings::from_json(r#"{ "breakout": { "max_rows": 0 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidTuning { game: "breakout", .. }));
        assert!(Settings::from_json(r#"{ "breakout": { "columns": 0 } }"#).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_json_round_trip_keeps_difficulty() {
        let mut settings = Settings::default();
        settings.difficulty = Difficulty::Easy;
        let parsed = Settings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(parsed.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_difficulty_names() {
        assert_eq!(Difficulty::from_name("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_name("medium"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_name("impossible"), None);
        assert_eq!(Difficulty::Easy.as_str(), "Easy");
    }
}
