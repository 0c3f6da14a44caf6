//! Entity records and simulation events
//!
//! Records are plain data. Behaviour lives in the per-game step functions;
//! the helpers here only derive geometry or apply a single rule to one record.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, clamp_rect};
use super::physics::Side;
use crate::consts::MAX_PARTICLES;

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self { pos, vel, radius }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_circle(self.pos, self.radius)
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// A player or AI paddle (also the shooter's ship)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Keyboard movement speed (pixels/second)
    pub speed: f32,
}

impl Paddle {
    pub fn new(pos: Vec2, size: Vec2, speed: f32) -> Self {
        Self { pos, size, speed }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_rect(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Keep the paddle fully inside the playfield
    pub fn clamp_to(&mut self, field: Vec2) {
        self.pos = clamp_rect(self.pos, self.size, field);
    }

    /// Put the paddle centre at `x` (horizontal paddles), clamped
    pub fn center_x_on(&mut self, x: f32, field: Vec2) {
        self.pos.x = x - self.size.x * 0.5;
        self.clamp_to(field);
    }

    /// Put the paddle centre at `y` (vertical paddles), clamped
    pub fn center_y_on(&mut self, y: f32, field: Vec2) {
        self.pos.y = y - self.size.y * 0.5;
        self.clamp_to(field);
    }

    /// Resize horizontally around the current centre
    pub fn set_width(&mut self, width: f32, field: Vec2) {
        let cx = self.center().x;
        self.size.x = width;
        self.center_x_on(cx, field);
    }
}

/// Brick types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrickKind {
    #[default]
    Normal,
    Strong,
    Unbreakable,
}

impl BrickKind {
    /// Hit count for a fresh brick (-1 = indestructible)
    pub fn initial_hits(self) -> i32 {
        match self {
            BrickKind::Normal => 1,
            BrickKind::Strong => 2,
            BrickKind::Unbreakable => Brick::INDESTRUCTIBLE,
        }
    }

    /// Points for destroying a brick of this kind
    pub fn points(self) -> u32 {
        match self {
            BrickKind::Normal => 100,
            BrickKind::Strong => 200,
            BrickKind::Unbreakable => 0,
        }
    }
}

/// Outcome of a ball striking a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickHit {
    /// Indestructible; the ball only bounces
    Bounced,
    /// Lost a hit point but is still standing
    Damaged,
    Destroyed,
}

/// A breakout brick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub pos: Vec2,
    pub size: Vec2,
    /// Remaining hits, `INDESTRUCTIBLE` for unbreakable bricks
    pub hits: i32,
    pub alive: bool,
    pub kind: BrickKind,
}

impl Brick {
    pub const INDESTRUCTIBLE: i32 = -1;

    pub fn new(pos: Vec2, size: Vec2, kind: BrickKind) -> Self {
        Self {
            pos,
            size,
            hits: kind.initial_hits(),
            alive: true,
            kind,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_rect(self.pos, self.size)
    }

    /// Apply one ball hit
    pub fn hit(&mut self) -> BrickHit {
        if self.kind == BrickKind::Unbreakable || self.hits == Self::INDESTRUCTIBLE {
            return BrickHit::Bounced;
        }
        self.hits -= 1;
        if self.hits <= 0 {
            self.alive = false;
            BrickHit::Destroyed
        } else {
            BrickHit::Damaged
        }
    }

    /// Must this brick be destroyed to clear the level?
    pub fn blocks_clear(&self) -> bool {
        self.alive && self.kind != BrickKind::Unbreakable
    }
}

/// Shooter enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Light,
    Medium,
    Heavy,
}

impl EnemyKind {
    pub fn health(self) -> u32 {
        match self {
            EnemyKind::Light => 1,
            EnemyKind::Medium => 2,
            EnemyKind::Heavy => 3,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            EnemyKind::Light => 50,
            EnemyKind::Medium => 160,
            EnemyKind::Heavy => 400,
        }
    }

    pub fn size(self) -> f32 {
        match self {
            EnemyKind::Light => 24.0,
            EnemyKind::Medium => 28.0,
            EnemyKind::Heavy => 32.0,
        }
    }

    /// Formation row layout: heavies on top, then mediums, lights below
    pub fn for_row(row: u32) -> Self {
        match row {
            0 => EnemyKind::Heavy,
            1 => EnemyKind::Medium,
            _ => EnemyKind::Light,
        }
    }
}

/// Named attack trajectories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathKind {
    Straight,
    SCurve,
    Loop,
    Swoop,
}

/// Attack trajectory from a start point toward a target, over t in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackPath {
    pub kind: PathKind,
    pub start: Vec2,
    pub target: Vec2,
}

impl AttackPath {
    const S_CURVE_AMPLITUDE: f32 = 60.0;
    const LOOP_RADIUS: f32 = 80.0;
    const SWOOP_SWAY: f32 = 40.0;
    const SWOOP_DEPTH: f32 = 120.0;

    pub fn new(kind: PathKind, start: Vec2, target: Vec2) -> Self {
        Self { kind, start, target }
    }

    /// Position at normalized time `t` (clamped to [0, 1])
    pub fn at(&self, t: f32) -> Vec2 {
        use std::f32::consts::{PI, TAU};

        let t = t.clamp(0.0, 1.0);
        let (start, target) = (self.start, self.target);
        match self.kind {
            PathKind::Straight => start.lerp(target, t),
            PathKind::SCurve => {
                start.lerp(target, t) + Vec2::new(Self::S_CURVE_AMPLITUDE * (PI * t).sin(), 0.0)
            }
            PathKind::Loop => {
                if t < 0.5 {
                    let angle = TAU * t;
                    start + Vec2::new(angle.cos(), angle.sin()) * Self::LOOP_RADIUS
                } else {
                    let u = (t - 0.5) * 2.0;
                    let exit = start + Vec2::new(0.0, Self::LOOP_RADIUS);
                    Vec2::new(
                        crate::lerp(start.x, target.x, u),
                        crate::lerp(exit.y, target.y, u),
                    )
                }
            }
            PathKind::Swoop => Vec2::new(
                crate::lerp(start.x, target.x, t) + Self::SWOOP_SWAY * (TAU * t).sin(),
                start.y + Self::SWOOP_DEPTH * (PI * t).sin(),
            ),
        }
    }
}

/// What an enemy is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyMode {
    /// Flying in from above toward its formation slot
    Entering,
    /// Parked at its slot, drifting with the formation
    InFormation,
    /// Following an attack path; `t` is normalized progress
    Attacking { path: AttackPath, t: f32 },
}

/// A shooter enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub kind: EnemyKind,
    pub health: u32,
    /// Formation home position (before drift)
    pub slot: Vec2,
    pub mode: EnemyMode,
    pub active: bool,
}

impl Enemy {
    pub fn new(kind: EnemyKind, spawn: Vec2, slot: Vec2) -> Self {
        Self {
            pos: spawn,
            size: Vec2::splat(kind.size()),
            kind,
            health: kind.health(),
            slot,
            mode: EnemyMode::Entering,
            active: true,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_rect(self.pos, self.size)
    }

    pub fn is_attacking(&self) -> bool {
        matches!(self.mode, EnemyMode::Attacking { .. })
    }

    /// Apply one bullet hit; returns true if the enemy died
    pub fn damage(&mut self) -> bool {
        self.health = self.health.saturating_sub(1);
        if self.health == 0 {
            self.active = false;
        }
        !self.active
    }
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// A projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub owner: Owner,
    /// Spread angle (radians); adds sideways drift
    pub drift: f32,
    pub active: bool,
}

impl Bullet {
    pub const SIZE: Vec2 = Vec2::new(4.0, 12.0);
    /// Horizontal drift speed at a spread angle of 90 degrees
    pub const DRIFT_SPEED: f32 = 180.0;

    pub fn new(pos: Vec2, speed_y: f32, owner: Owner, drift: f32) -> Self {
        Self {
            pos,
            vel: Vec2::new(drift.sin() * Self::DRIFT_SPEED, speed_y),
            size: Self::SIZE,
            owner,
            drift,
            active: true,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_rect(self.pos, self.size)
    }
}

/// A cosmetic particle (never affects gameplay)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds remaining
    pub life: f32,
    pub max_life: f32,
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
}

/// Parameters for a particle burst
#[derive(Debug, Clone, Copy)]
pub struct Burst {
    pub count: usize,
    pub speed: f32,
    pub life: f32,
    pub gravity: f32,
}

/// Spawn a burst of particles at `at` with random headings
pub fn spawn_burst<R: Rng>(particles: &mut Vec<Particle>, rng: &mut R, at: Vec2, burst: Burst) {
    let room = MAX_PARTICLES.saturating_sub(particles.len());
    for _ in 0..burst.count.min(room) {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let speed = burst.speed * (0.25 + rng.random::<f32>() * 0.75);
        let life = burst.life * (0.6 + rng.random::<f32>() * 0.6);
        particles.push(Particle {
            pos: at,
            vel: Vec2::from_angle(angle) * speed,
            life,
            max_life: life,
            gravity: burst.gravity,
        });
    }
}

/// Advance particles and prune the dead ones
pub fn update_particles(particles: &mut Vec<Particle>, dt: f32) {
    for p in particles.iter_mut() {
        p.vel.y += p.gravity * dt;
        p.pos += p.vel * dt;
        p.life -= dt;
    }
    particles.retain(|p| p.life > 0.0);
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    ExpandPaddle,
    ExtraLife,
    SlowBall,
    MultiBall,
    DoubleShot,
    Shield,
    Rainbow,
}

impl PowerUpKind {
    /// Drops available in Breakout
    pub const BREAKOUT: [PowerUpKind; 4] = [
        PowerUpKind::ExpandPaddle,
        PowerUpKind::ExtraLife,
        PowerUpKind::SlowBall,
        PowerUpKind::MultiBall,
    ];

    /// Drops available in the shooter
    pub const SHOOTER: [PowerUpKind; 3] =
        [PowerUpKind::DoubleShot, PowerUpKind::Shield, PowerUpKind::Rainbow];
}

/// A falling power-up capsule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub kind: PowerUpKind,
    pub alive: bool,
}

impl PowerUp {
    pub fn new(pos: Vec2, fall_speed: f32, size: Vec2, kind: PowerUpKind) -> Self {
        Self {
            pos,
            vel: Vec2::new(0.0, fall_speed),
            size,
            kind,
            alive: true,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_rect(self.pos, self.size)
    }
}

/// Discrete things that happened during a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Score increased by `points` to `total`
    Scored { points: u32, total: u64 },
    /// Pong: a side won the rally
    PointWon { side: Side },
    LifeLost { remaining: u32 },
    GameOver,
    /// The director advanced to `level`
    LevelCleared { level: u32 },
    PowerUpSpawned { kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind },
    LinesCleared { rows: u32 },
    PieceLocked,
    PieceHeld,
}

/// Read-only summary for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    /// Pong only
    pub opponent_score: Option<u64>,
    /// None for games without lives
    pub lives: Option<u32>,
    pub level: u32,
    pub game_over: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strong_brick_takes_two_hits() {
        let mut brick = Brick::new(Vec2::ZERO, Vec2::new(50.0, 20.0), BrickKind::Strong);
        assert_eq!(brick.hit(), BrickHit::Damaged);
        assert!(brick.alive);
        assert_eq!(brick.hit(), BrickHit::Destroyed);
        assert!(!brick.alive);
    }

    #[test]
    fn test_unbreakable_does_not_block_clear() {
        let brick = Brick::new(Vec2::ZERO, Vec2::new(50.0, 20.0), BrickKind::Unbreakable);
        assert!(!brick.blocks_clear());
        assert_eq!(brick.hits, Brick::INDESTRUCTIBLE);
    }

    #[test]
    fn test_attack_paths_start_and_end() {
        let start = Vec2::new(100.0, 100.0);
        let target = Vec2::new(400.0, 660.0);
        for kind in [PathKind::Straight, PathKind::SCurve, PathKind::Loop] {
            let path = AttackPath::new(kind, start, target);
            assert!(path.at(0.0).distance(start) < 80.01, "{kind:?}");
            assert!(path.at(1.0).distance(target) < 0.01, "{kind:?}");
        }
        // Swoop returns to its starting height
        let swoop = AttackPath::new(PathKind::Swoop, start, target);
        assert!((swoop.at(1.0).y - start.y).abs() < 0.01);
        assert!(swoop.at(0.5).y > start.y + 100.0);
    }

    #[test]
    fn test_enemy_damage() {
        let mut enemy = Enemy::new(EnemyKind::Medium, Vec2::ZERO, Vec2::ZERO);
        assert!(!enemy.damage());
        assert!(enemy.damage());
        assert!(!enemy.active);
    }

    #[test]
    fn test_bullet_drift() {
        let straight = Bullet::new(Vec2::ZERO, -500.0, Owner::Player, 0.0);
        assert_eq!(straight.vel.x, 0.0);
        let spread = Bullet::new(Vec2::ZERO, -500.0, Owner::Player, 0.3);
        assert!(spread.vel.x > 0.0);
    }

    #[test]
    fn test_particles_pruned() {
        let mut particles = vec![
            Particle { pos: Vec2::ZERO, vel: Vec2::ZERO, life: 0.05, max_life: 1.0, gravity: 100.0 },
            Particle { pos: Vec2::ZERO, vel: Vec2::ZERO, life: 1.0, max_life: 1.0, gravity: 100.0 },
        ];
        update_particles(&mut particles, 0.1);
        assert_eq!(particles.len(), 1);
        assert!(particles[0].vel.y > 0.0);
    }

    proptest! {
        #[test]
        fn prop_unbreakable_never_dies(hits in 0usize..200) {
            let mut brick = Brick::new(Vec2::ZERO, Vec2::new(50.0, 20.0), BrickKind::Unbreakable);
            for _ in 0..hits {
                prop_assert_eq!(brick.hit(), BrickHit::Bounced);
            }
            prop_assert!(brick.alive);
            prop_assert_eq!(brick.hits, Brick::INDESTRUCTIBLE);
        }

        #[test]
        fn prop_paddle_stays_inside(x in -5000.0f32..5000.0, y in -5000.0f32..5000.0) {
            let field = Vec2::new(900.0, 500.0);
            let mut paddle = Paddle::new(Vec2::new(x, y), Vec2::new(12.0, 100.0), 420.0);
            paddle.clamp_to(field);
            prop_assert!(paddle.pos.x >= 0.0 && paddle.pos.x <= field.x - paddle.size.x);
            prop_assert!(paddle.pos.y >= 0.0 && paddle.pos.y <= field.y - paddle.size.y);
        }
    }
}
