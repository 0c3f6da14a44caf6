//! Level and wave director
//!
//! Runs after every step. When a game reports its level cleared the director
//! escalates it; the tables that decide what the next level looks like
//! (brick layouts, shooter waves, Tetris gravity) live here too.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::engine::Game;
use super::state::{Brick, BrickKind, Enemy, EnemyKind, GameEvent, PathKind};

/// Observe the game after a step and advance the level if it was cleared
pub fn direct<G: Game + ?Sized>(game: &mut G, events: &mut Vec<GameEvent>) {
    if game.is_over() || !game.level_cleared() {
        return;
    }
    game.start_next_level();
    let level = game.hud().level;
    events.push(GameEvent::LevelCleared { level });
    log::info!("Level {level} started");
}

/// Brick grid geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrickLayout {
    pub columns: u32,
    pub max_rows: u32,
    /// Gap between bricks and around the grid
    pub padding: f32,
    /// Extra space above the first row
    pub top_offset: f32,
}

impl Default for BrickLayout {
    fn default() -> Self {
        Self {
            columns: 10,
            max_rows: 8,
            padding: 8.0,
            top_offset: 20.0,
        }
    }
}

impl BrickLayout {
    pub fn rows(&self, level: u32) -> u32 {
        self.max_rows.min(3 + level)
    }

    pub fn brick_height(level: u32) -> f32 {
        18.0_f32.max(22.0 - (level / 2) as f32)
    }

    /// Roll a brick type; harder types get likelier with level
    pub fn roll_kind<R: Rng>(rng: &mut R, level: u32) -> BrickKind {
        let roll = rng.random::<f32>();
        let level = level as f32;
        if roll < 0.08 + 0.01 * level {
            BrickKind::Unbreakable
        } else if roll < 0.2 + 0.02 * level {
            BrickKind::Strong
        } else {
            BrickKind::Normal
        }
    }

    /// Fresh bricks for `level` across a field `width` pixels wide
    pub fn build<R: Rng>(&self, level: u32, width: f32, rng: &mut R) -> Vec<Brick> {
        let columns = self.columns.max(1);
        let pad = self.padding;
        let brick_w = (width - pad * (columns + 1) as f32) / columns as f32;
        let brick_h = Self::brick_height(level);
        let size = Vec2::new(brick_w, brick_h);

        let rows = self.rows(level);
        let mut bricks = Vec::with_capacity((rows * columns) as usize);
        for row in 0..rows {
            for col in 0..columns {
                let pos = Vec2::new(
                    pad + col as f32 * (brick_w + pad),
                    pad + row as f32 * (brick_h + pad) + self.top_offset,
                );
                bricks.push(Brick::new(pos, size, Self::roll_kind(rng, level)));
            }
        }
        log::debug!("Built {} bricks ({rows}x{columns}) for level {level}", bricks.len());
        bricks
    }
}

/// Parameters for one shooter wave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShooterWave {
    pub rows: u32,
    pub cols: u32,
    /// Formation sway speed
    pub drift_speed: f32,
    pub attack_kinds: Vec<PathKind>,
    /// Concurrent attackers allowed
    pub max_attackers: usize,
    /// Per-second chance an idle enemy starts an attack
    pub attack_rate: f32,
    /// Per-second chance an attacker fires
    pub bullet_rate: f32,
    pub bullet_speed: f32,
    pub max_enemy_bullets: usize,
    /// Starting lives when this pattern picks the difficulty
    pub lives: u32,
}

struct WavePattern {
    rows: u32,
    cols: u32,
    drift_speed: f32,
    attack_kinds: &'static [PathKind],
    max_attackers: usize,
    attack_rate: f32,
    bullet_rate: f32,
    bullet_speed: f32,
    lives: u32,
    max_enemy_bullets: usize,
}

const WAVE_PATTERNS: [WavePattern; 5] = [
    WavePattern {
        rows: 3,
        cols: 8,
        drift_speed: 20.0,
        attack_kinds: &[PathKind::Straight],
        max_attackers: 1,
        attack_rate: 0.2,
        bullet_rate: 0.1,
        bullet_speed: 120.0,
        lives: 5,
        max_enemy_bullets: 1,
    },
    WavePattern {
        rows: 3,
        cols: 8,
        drift_speed: 24.0,
        attack_kinds: &[PathKind::SCurve, PathKind::Straight],
        max_attackers: 1,
        attack_rate: 0.25,
        bullet_rate: 0.13,
        bullet_speed: 140.0,
        lives: 5,
        max_enemy_bullets: 1,
    },
    WavePattern {
        rows: 4,
        cols: 9,
        drift_speed: 28.0,
        attack_kinds: &[PathKind::Loop, PathKind::SCurve, PathKind::Straight],
        max_attackers: 2,
        attack_rate: 0.3,
        bullet_rate: 0.16,
        bullet_speed: 160.0,
        lives: 4,
        max_enemy_bullets: 2,
    },
    WavePattern {
        rows: 5,
        cols: 10,
        drift_speed: 32.0,
        attack_kinds: &[PathKind::Swoop, PathKind::Loop, PathKind::SCurve],
        max_attackers: 3,
        attack_rate: 0.35,
        bullet_rate: 0.19,
        bullet_speed: 180.0,
        lives: 3,
        max_enemy_bullets: 2,
    },
    WavePattern {
        rows: 5,
        cols: 10,
        drift_speed: 36.0,
        attack_kinds: &[PathKind::Swoop, PathKind::Loop, PathKind::SCurve, PathKind::Straight],
        max_attackers: 3,
        attack_rate: 0.4,
        bullet_rate: 0.22,
        bullet_speed: 200.0,
        lives: 2,
        max_enemy_bullets: 3,
    },
];

impl ShooterWave {
    pub const MAX_ATTACK_RATE: f32 = 0.8;
    pub const MAX_BULLET_SPEED: f32 = 320.0;
    pub const MAX_COLS: u32 = 12;

    /// Horizontal and vertical distance between formation slots
    pub const SLOT_SPACING: Vec2 = Vec2::new(32.0, 40.0);
    pub const FORMATION_TOP: f32 = 100.0;
    /// Peak horizontal sway of the formation
    pub const DRIFT_AMPLITUDE: f32 = 40.0;

    /// Wave for a 1-based level. The five authored patterns cover levels
    /// 1-5; later levels keep scaling the last one.
    pub fn for_level(level: u32) -> Self {
        let level = level.max(1);
        let index = (level - 1).min(WAVE_PATTERNS.len() as u32 - 1) as usize;
        let base = &WAVE_PATTERNS[index];
        let extra = level.saturating_sub(WAVE_PATTERNS.len() as u32);
        let extra_f = extra as f32;

        Self {
            rows: base.rows,
            cols: (base.cols + extra / 2).min(Self::MAX_COLS),
            drift_speed: base.drift_speed + 4.0 * extra_f,
            attack_kinds: base.attack_kinds.to_vec(),
            max_attackers: base.max_attackers,
            attack_rate: (base.attack_rate + 0.03 * extra_f).min(Self::MAX_ATTACK_RATE),
            bullet_rate: base.bullet_rate + 0.03 * extra_f,
            bullet_speed: (base.bullet_speed + 20.0 * extra_f).min(Self::MAX_BULLET_SPEED),
            max_enemy_bullets: base.max_enemy_bullets,
            lives: base.lives,
        }
    }

    /// Index used to speed up attack paths (0 for level 1)
    pub fn speed_index(level: u32) -> f32 {
        level.saturating_sub(1) as f32
    }

    /// Formation sway at simulation time `clock`
    pub fn drift_offset(&self, clock: f32) -> f32 {
        Self::DRIFT_AMPLITUDE * (clock * self.drift_speed / 24.0).sin()
    }

    /// Enemies for this wave, spawned above the field and headed for their slots
    pub fn formation(&self, width: f32) -> Vec<Enemy> {
        let spacing = Self::SLOT_SPACING;
        let start_x = width * 0.5 - self.cols as f32 * spacing.x * 0.5;
        let mut enemies = Vec::with_capacity((self.rows * self.cols) as usize);
        for row in 0..self.rows {
            let kind = EnemyKind::for_row(row);
            for col in 0..self.cols {
                let x = start_x + col as f32 * spacing.x;
                let slot = Vec2::new(x, Self::FORMATION_TOP + row as f32 * spacing.y);
                let spawn = Vec2::new(x, -spacing.y - row as f32 * spacing.y);
                enemies.push(Enemy::new(kind, spawn, slot));
            }
        }
        enemies
    }
}

/// Tetris gravity curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityCurve {
    /// Seconds per row at level 1
    pub base: f32,
    /// Per-level multiplier
    pub decay: f32,
    /// Fastest allowed interval
    pub min: f32,
}

impl GravityCurve {
    pub fn interval(&self, level: u32) -> f32 {
        let exponent = level.saturating_sub(1) as i32;
        (self.base * self.decay.powi(exponent)).max(self.min)
    }
}

/// Lines needed to leave a Tetris level
pub fn tetris_lines_for_level(level: u32) -> u32 {
    level * 10
}
