//! Galaga-style shooter
//!
//! Enemies fly in from above to their formation slots, sway with the
//! formation, and break off on attack paths that aim at the player. Each wave
//! is described by a `ShooterWave`; clearing every enemy starts the next one.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::director::ShooterWave;
use super::engine::{Game, snapshot_of};
use super::physics::{approach, integrate};
use super::rng::{RngState, SimRng};
use super::state::{
    AttackPath, Bullet, Burst, Enemy, EnemyKind, EnemyMode, GameEvent, Hud, Owner, Paddle, Particle,
    PathKind, PowerUp, PowerUpKind, spawn_burst, update_particles,
};
use crate::input::Intent;
use crate::settings::{Difficulty, Playfield};

const EXPLOSION: Burst = Burst { count: 8, speed: 140.0, life: 1.0, gravity: 0.0 };
const SHIELD_FLASH: Burst = Burst { count: 24, speed: 180.0, life: 1.2, gravity: 0.0 };

/// Shooter tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    pub playfield: Playfield,
    pub player_size: Vec2,
    /// Distance from the player's top edge to the bottom of the field
    pub player_offset: f32,
    pub player_speed: f32,
    /// Upward speed of player bullets
    pub bullet_speed: f32,
    pub fire_cooldown: f32,
    /// Fraction of the distance to its slot an entering enemy covers per 1/60 s
    pub entry_rate: f32,
    /// Entering enemies snap to their slot inside this distance
    pub snap_distance: f32,
    /// Chance a killed enemy drops a power-up
    pub kill_drop_chance: f32,
    /// Seconds between timed power-up drops, drawn from this range
    pub power_up_every: (f32, f32),
    pub power_up_fall: f32,
    pub power_up_size: f32,
    pub double_secs: f32,
    pub shield_secs: f32,
    pub rainbow_secs: f32,
    pub max_dt: f32,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            playfield: Playfield::new(800.0, 600.0),
            player_size: Vec2::new(40.0, 40.0),
            player_offset: 60.0,
            player_speed: 300.0,
            bullet_speed: 500.0,
            fire_cooldown: 0.2,
            entry_rate: 0.08,
            snap_distance: 2.0,
            kill_drop_chance: 0.05,
            power_up_every: (8.0, 14.0),
            power_up_fall: 80.0,
            power_up_size: 24.0,
            double_secs: 10.0,
            shield_secs: 8.0,
            rainbow_secs: 5.0,
            max_dt: 0.033,
        }
    }
}

impl ShooterConfig {
    /// Starting lives, taken from the wave pattern matching the difficulty
    pub fn starting_lives(difficulty: Difficulty) -> u32 {
        let pattern = match difficulty {
            Difficulty::Easy => 1,
            Difficulty::Normal => 3,
            Difficulty::Hard => 5,
        };
        ShooterWave::for_level(pattern).lives
    }
}

/// Expiry times of the player's power-ups, on the simulation clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Powers {
    pub double_until: Option<f32>,
    pub shield_until: Option<f32>,
    pub rainbow_until: Option<f32>,
}

impl Powers {
    fn active(until: Option<f32>, now: f32) -> bool {
        until.is_some_and(|t| now <= t)
    }

    pub fn double(&self, now: f32) -> bool {
        Self::active(self.double_until, now)
    }

    pub fn shield(&self, now: f32) -> bool {
        Self::active(self.shield_until, now)
    }

    pub fn rainbow(&self, now: f32) -> bool {
        Self::active(self.rainbow_until, now)
    }

    fn expire(&mut self, now: f32) {
        for until in [&mut self.double_until, &mut self.shield_until, &mut self.rainbow_until] {
            if until.is_some_and(|t| now > t) {
                *until = None;
            }
        }
    }
}

/// Shooter state
#[derive(Debug, Clone, Serialize)]
pub struct Shooter {
    pub config: ShooterConfig,
    pub difficulty: Difficulty,
    pub player: Paddle,
    pub lives: u32,
    pub score: u64,
    pub level: u32,
    pub wave: ShooterWave,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub power_ups: Vec<PowerUp>,
    pub particles: Vec<Particle>,
    pub powers: Powers,
    /// Seconds simulated since the game started
    pub clock: f32,
    pub over: bool,
    fire_cooldown: f32,
    next_power_up: f32,
    pub rng_state: RngState,
    #[serde(skip)]
    rng: SimRng,
}

impl Shooter {
    pub fn new(config: ShooterConfig, difficulty: Difficulty, seed: Option<u64>) -> Self {
        let rng_state = RngState::from_seed_or_entropy(seed);
        let mut rng = rng_state.to_rng();
        let field = config.playfield.size();

        let player = Paddle::new(
            Vec2::new((field.x - config.player_size.x) * 0.5, field.y - config.player_offset),
            config.player_size,
            config.player_speed,
        );
        let wave = ShooterWave::for_level(1);
        let enemies = wave.formation(field.x);
        let next_power_up = rng.random_range(config.power_up_every.0..=config.power_up_every.1);

        Self {
            difficulty,
            player,
            lives: ShooterConfig::starting_lives(difficulty),
            score: 0,
            level: 1,
            wave,
            enemies,
            bullets: Vec::new(),
            power_ups: Vec::new(),
            particles: Vec::new(),
            powers: Powers::default(),
            clock: 0.0,
            over: false,
            fire_cooldown: 0.0,
            next_power_up,
            rng_state,
            rng,
            config,
        }
    }

    fn move_player(&mut self, intent: &Intent, dt: f32) {
        let field = self.config.playfield.size();
        match intent.pointer {
            Some(p) if intent.pointer_down => self.player.center_x_on(p.x, field),
            _ => {
                self.player.pos.x += intent.direction.x * self.player.speed * dt;
                self.player.clamp_to(field);
            }
        }
    }

    /// Fire while the fire or up key is held, while moving, or while touching
    fn handle_fire(&mut self, intent: &Intent, dt: f32) {
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        let wants = intent.fire
            || intent.direction.y < 0.0
            || intent.direction.x != 0.0
            || intent.pointer_down;
        if !wants || self.fire_cooldown > 0.0 {
            return;
        }
        self.fire_cooldown = self.config.fire_cooldown;

        let x = self.player.center().x - Bullet::SIZE.x * 0.5;
        let y = self.player.pos.y;
        let speed = -self.config.bullet_speed;
        if self.powers.rainbow(self.clock) {
            for i in -2..=2 {
                self.bullets.push(Bullet::new(Vec2::new(x, y), speed, Owner::Player, i as f32 * 0.15));
            }
        } else if self.powers.double(self.clock) {
            for dx in [-6.0, 6.0] {
                self.bullets.push(Bullet::new(Vec2::new(x + dx, y), speed, Owner::Player, 0.0));
            }
        } else {
            self.bullets.push(Bullet::new(Vec2::new(x, y), speed, Owner::Player, 0.0));
        }
    }

    fn update_bullets(&mut self, dt: f32) {
        let field = self.config.playfield.size();
        for bullet in self.bullets.iter_mut() {
            bullet.pos = integrate(bullet.pos, bullet.vel, dt);
            let gone = bullet.pos.y < -bullet.size.y
                || bullet.pos.y > field.y + bullet.size.y
                || bullet.pos.x < -bullet.size.x
                || bullet.pos.x > field.x;
            if gone {
                bullet.active = false;
            }
        }
    }

    /// Entering, formation sway, attack scheduling and attack runs
    fn update_enemies(&mut self, dt: f32) {
        let field = self.config.playfield.size();
        let sway = Vec2::new(self.wave.drift_offset(self.clock), 0.0);
        let target = Vec2::new(self.player.center().x, field.y + 60.0);
        let path_speed = 1.0 + 0.15 * ShooterWave::speed_index(self.level);

        let mut attackers = self.enemies.iter().filter(|e| e.active && e.is_attacking()).count();
        let mut enemy_bullets = self
            .bullets
            .iter()
            .filter(|b| b.active && b.owner == Owner::Enemy)
            .count();

        for enemy in self.enemies.iter_mut().filter(|e| e.active) {
            let home = enemy.slot + sway;
            match enemy.mode {
                EnemyMode::Entering => {
                    // Fly toward the unswayed slot, then join the sway
                    enemy.pos = approach(enemy.pos, enemy.slot, self.config.entry_rate, dt);
                    if enemy.pos.distance(enemy.slot) < self.config.snap_distance {
                        enemy.pos = home;
                        enemy.mode = EnemyMode::InFormation;
                    }
                }
                EnemyMode::InFormation => {
                    enemy.pos = home;
                    if attackers < self.wave.max_attackers
                        && self.rng.random::<f32>() < self.wave.attack_rate * dt
                    {
                        let kind = self
                            .wave
                            .attack_kinds
                            .choose(&mut self.rng)
                            .copied()
                            .unwrap_or(PathKind::Straight);
                        let path = AttackPath::new(kind, enemy.pos, target);
                        enemy.mode = EnemyMode::Attacking { path, t: 0.0 };
                        attackers += 1;
                        log::debug!("{:?} attacking on {kind:?}", enemy.kind);
                    }
                }
                EnemyMode::Attacking { path, t } => {
                    let t = t + dt * path_speed;
                    enemy.pos = path.at(t);
                    enemy.mode = EnemyMode::Attacking { path, t };

                    if enemy_bullets < self.wave.max_enemy_bullets
                        && self.rng.random::<f32>() < self.wave.bullet_rate * dt
                    {
                        let muzzle = Vec2::new(
                            enemy.pos.x + enemy.size.x * 0.5 - Bullet::SIZE.x * 0.5,
                            enemy.pos.y + enemy.size.y,
                        );
                        self.bullets.push(Bullet::new(muzzle, self.wave.bullet_speed, Owner::Enemy, 0.0));
                        enemy_bullets += 1;
                    }

                    if t >= 1.0 || enemy.pos.y > field.y + 40.0 {
                        enemy.pos = home;
                        enemy.mode = EnemyMode::InFormation;
                    }
                }
            }
        }
    }

    fn add_score(&mut self, points: u32, events: &mut Vec<GameEvent>) {
        self.score += u64::from(points);
        events.push(GameEvent::Scored { points, total: self.score });
    }

    /// The player was struck; the shield absorbs it
    fn hit_player(&mut self, events: &mut Vec<GameEvent>) {
        let at = self.player.center();
        if self.powers.shield(self.clock) {
            spawn_burst(&mut self.particles, &mut self.rng, at, SHIELD_FLASH);
            return;
        }
        spawn_burst(&mut self.particles, &mut self.rng, at, EXPLOSION);
        self.lives = self.lives.saturating_sub(1);
        events.push(GameEvent::LifeLost { remaining: self.lives });
        if self.lives == 0 {
            self.over = true;
            events.push(GameEvent::GameOver);
            log::info!("Shooter over: score {} at wave {}", self.score, self.level);
        }
    }

    fn resolve_collisions(&mut self, events: &mut Vec<GameEvent>) {
        let player_box = self.player.bounds();
        let mut kills: Vec<(EnemyKind, Vec2)> = Vec::new();
        let mut player_hits = 0;

        for bullet in self.bullets.iter_mut().filter(|b| b.active) {
            let bullet_box = bullet.bounds();
            match bullet.owner {
                Owner::Player => {
                    let struck = self
                        .enemies
                        .iter_mut()
                        .find(|e| e.active && bullet_box.overlaps(&e.bounds()));
                    if let Some(enemy) = struck {
                        bullet.active = false;
                        if enemy.damage() {
                            kills.push((enemy.kind, enemy.bounds().center()));
                        }
                    }
                }
                Owner::Enemy => {
                    if bullet_box.overlaps(&player_box) {
                        bullet.active = false;
                        player_hits += 1;
                    }
                }
            }
        }

        // Ramming costs a life and destroys the enemy
        for enemy in self.enemies.iter_mut().filter(|e| e.active) {
            if enemy.bounds().overlaps(&player_box) {
                enemy.active = false;
                player_hits += 1;
            }
        }

        for (kind, at) in kills {
            self.add_score(kind.points(), events);
            spawn_burst(&mut self.particles, &mut self.rng, at, EXPLOSION);
            if self.rng.random::<f32>() < self.config.kill_drop_chance {
                self.drop_power_up(at, events);
            }
        }
        for _ in 0..player_hits {
            if self.over {
                break;
            }
            self.hit_player(events);
        }
        self.bullets.retain(|b| b.active);
    }

    fn drop_power_up(&mut self, center: Vec2, events: &mut Vec<GameEvent>) {
        let Some(&kind) = PowerUpKind::SHOOTER.choose(&mut self.rng) else {
            return;
        };
        let size = Vec2::splat(self.config.power_up_size);
        self.power_ups
            .push(PowerUp::new(center - size * 0.5, self.config.power_up_fall, size, kind));
        events.push(GameEvent::PowerUpSpawned { kind });
    }

    fn update_power_ups(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        if self.clock >= self.next_power_up {
            let (lo, hi) = self.config.power_up_every;
            self.next_power_up = self.clock + self.rng.random_range(lo..=hi);
            let size = self.config.power_up_size;
            let x = self.rng.random::<f32>() * (self.config.playfield.width - size).max(0.0);
            self.drop_power_up(Vec2::new(x + size * 0.5, -20.0 + size * 0.5), events);
        }

        let player_box = self.player.bounds();
        let bottom = self.config.playfield.height;
        let mut caught = Vec::new();
        for power_up in self.power_ups.iter_mut() {
            power_up.pos = integrate(power_up.pos, power_up.vel, dt);
            if power_up.bounds().overlaps(&player_box) {
                power_up.alive = false;
                caught.push(power_up.kind);
            } else if power_up.pos.y > bottom {
                power_up.alive = false;
            }
        }
        self.power_ups.retain(|p| p.alive);

        for kind in caught {
            self.apply(kind);
            events.push(GameEvent::PowerUpCollected { kind });
        }
        self.powers.expire(self.clock);
    }

    /// Activate a collected power-up
    pub fn apply(&mut self, kind: PowerUpKind) {
        let now = self.clock;
        match kind {
            PowerUpKind::DoubleShot => self.powers.double_until = Some(now + self.config.double_secs),
            PowerUpKind::Shield => self.powers.shield_until = Some(now + self.config.shield_secs),
            PowerUpKind::Rainbow => self.powers.rainbow_until = Some(now + self.config.rainbow_secs),
            PowerUpKind::ExpandPaddle
            | PowerUpKind::ExtraLife
            | PowerUpKind::SlowBall
            | PowerUpKind::MultiBall => log::warn!("{kind:?} has no effect in the shooter"),
        }
        let at = self.player.center();
        spawn_burst(&mut self.particles, &mut self.rng, at, SHIELD_FLASH);
    }
}

impl Game for Shooter {
    fn max_dt(&self) -> f32 {
        self.config.max_dt
    }

    fn step(&mut self, intent: &Intent, dt: f32, events: &mut Vec<GameEvent>) {
        self.clock += dt;
        self.move_player(intent, dt);
        self.handle_fire(intent, dt);
        self.update_bullets(dt);
        self.update_enemies(dt);
        self.resolve_collisions(events);
        if self.over {
            return;
        }
        self.update_power_ups(dt, events);
        update_particles(&mut self.particles, dt);
    }

    fn is_over(&self) -> bool {
        self.over
    }

    fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            opponent_score: None,
            lives: Some(self.lives),
            level: self.level,
            game_over: self.over,
        }
    }

    fn level_cleared(&self) -> bool {
        self.enemies.iter().all(|e| !e.active)
    }

    fn start_next_level(&mut self) {
        self.level += 1;
        self.wave = ShooterWave::for_level(self.level);
        self.enemies = self.wave.formation(self.config.playfield.width);
        self.bullets.clear();
    }

    fn snapshot(&self) -> serde_json::Value {
        snapshot_of(self)
    }
}
