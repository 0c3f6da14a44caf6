//! Breakout: clear the brick wall with one or more balls
//!
//! The ball reflects off the side and top walls and is lost through the
//! bottom. Destroyed bricks may drop power-ups that fall toward the paddle;
//! timed effects expire against the simulation clock, so they freeze while the
//! session is paused.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::collision::{Walls, bounce_circle, confine_circle, exited_below};
use super::director::BrickLayout;
use super::engine::{Game, snapshot_of};
use super::physics::{SpeedLimits, bump_speed, cap_speed, integrate, serve_velocity};
use super::rng::{RngState, SimRng};
use super::state::{
    Ball, Brick, BrickHit, Burst, GameEvent, Hud, Paddle, Particle, PowerUp, PowerUpKind,
    spawn_burst, update_particles,
};
use crate::consts::SERVE_SPEED;
use crate::input::Intent;
use crate::settings::{Difficulty, Playfield};

const BRICK_BURST: Burst = Burst { count: 18, speed: 170.0, life: 1.0, gravity: 600.0 };
const CHIP_BURST: Burst = Burst { count: 8, speed: 170.0, life: 1.0, gravity: 600.0 };
const CATCH_BURST: Burst = Burst { count: 20, speed: 170.0, life: 1.0, gravity: 600.0 };
const LEVEL_BURST: Burst = Burst { count: 36, speed: 220.0, life: 1.2, gravity: 600.0 };

/// Breakout tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutConfig {
    pub playfield: Playfield,
    pub lives: u32,
    pub paddle_speed: f32,
    /// Horizontal speed added at the paddle edge
    pub spin: f32,
    pub serve_speed: f32,
    pub speed: SpeedLimits,
    #[serde(flatten)]
    pub layout: BrickLayout,
    /// Points for chipping a brick without destroying it
    pub damage_points: u32,
    /// Chance a destroyed brick drops a power-up
    pub drop_chance: f32,
    pub expand_factor: f32,
    pub expand_max_width: f32,
    pub expand_secs: f32,
    pub slow_factor: f32,
    pub slow_secs: f32,
    /// Extra balls split off by a MultiBall catch
    pub multiball_count: usize,
    /// Extra balls served with the first ball on Easy
    pub easy_extra_balls: usize,
    pub max_dt: f32,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            playfield: Playfield::new(960.0, 540.0),
            lives: 3,
            paddle_speed: 800.0,
            spin: 240.0,
            serve_speed: SERVE_SPEED,
            speed: SpeedLimits::default(),
            layout: BrickLayout::default(),
            damage_points: 40,
            drop_chance: 0.14,
            expand_factor: 1.5,
            expand_max_width: 500.0,
            expand_secs: 8.0,
            slow_factor: 0.7,
            slow_secs: 7.0,
            multiball_count: 2,
            easy_extra_balls: 2,
            max_dt: 0.05,
        }
    }
}

impl BreakoutConfig {
    /// Paddle width before any expansion
    pub fn base_paddle_width(&self) -> f32 {
        crate::clamp(self.playfield.width * 0.14, 72.0, 220.0)
    }

    pub fn paddle_height(&self) -> f32 {
        12.0_f32.max(self.playfield.height * 0.03)
    }

    pub fn ball_radius(&self) -> f32 {
        crate::clamp(self.playfield.width * 0.008, 6.0, 14.0)
    }
}

/// Expiry times of running effects, on the simulation clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    pub expand_until: Option<f32>,
    pub slow_until: Option<f32>,
}

/// Breakout state
#[derive(Debug, Clone, Serialize)]
pub struct Breakout {
    pub config: BreakoutConfig,
    pub difficulty: Difficulty,
    pub paddle: Paddle,
    pub balls: Vec<Ball>,
    pub bricks: Vec<Brick>,
    pub power_ups: Vec<PowerUp>,
    pub particles: Vec<Particle>,
    pub effects: Effects,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    /// Seconds simulated since the game started
    pub clock: f32,
    pub over: bool,
    pub rng_state: RngState,
    #[serde(skip)]
    rng: SimRng,
}

impl Breakout {
    pub fn new(config: BreakoutConfig, difficulty: Difficulty, seed: Option<u64>) -> Self {
        let rng_state = RngState::from_seed_or_entropy(seed);
        let mut rng = rng_state.to_rng();
        let field = config.playfield.size();

        let paddle_size = Vec2::new(config.base_paddle_width(), config.paddle_height());
        let paddle = Paddle::new(
            Vec2::new((field.x - paddle_size.x) * 0.5, field.y - paddle_size.y - 12.0),
            paddle_size,
            config.paddle_speed,
        );
        let bricks = config.layout.build(1, field.x, &mut rng);

        let mut breakout = Self {
            difficulty,
            paddle,
            balls: Vec::new(),
            bricks,
            power_ups: Vec::new(),
            particles: Vec::new(),
            effects: Effects::default(),
            score: 0,
            lives: config.lives,
            level: 1,
            clock: 0.0,
            over: false,
            rng_state,
            rng,
            config,
        };
        let first = breakout.served_ball();
        breakout.balls.push(first);
        if difficulty == Difficulty::Easy {
            breakout.spawn_multiballs(breakout.config.easy_extra_balls);
        }
        breakout
    }

    /// A new ball at the centre with a random serve
    fn served_ball(&mut self) -> Ball {
        let vel = serve_velocity(&mut self.rng, self.config.serve_speed, None);
        Ball::new(self.config.playfield.center(), vel, self.config.ball_radius())
    }

    /// Split `count` extra balls off the first ball (or off the paddle when
    /// none is in play), each heading upward.
    pub fn spawn_multiballs(&mut self, count: usize) {
        let source = self.balls.first().cloned().unwrap_or_else(|| {
            Ball::new(
                Vec2::new(self.paddle.center().x, self.paddle.pos.y - 10.0),
                Vec2::new(-200.0, -320.0),
                self.config.ball_radius(),
            )
        });
        let base_speed = if source.speed() > f32::EPSILON { source.speed() } else { 320.0 };

        for _ in 0..count {
            let angle = -std::f32::consts::PI * self.rng.random::<f32>();
            let speed = base_speed * (0.8 + self.rng.random::<f32>() * 0.6);
            let jitter = Vec2::new(self.rng.random::<f32>() - 0.5, self.rng.random::<f32>() - 0.5) * 12.0;
            let vel = cap_speed(Vec2::from_angle(angle) * speed, &self.config.speed);
            self.balls.push(Ball::new(source.pos + jitter, vel, source.radius));
        }
    }

    fn add_score(&mut self, points: u32, events: &mut Vec<GameEvent>) {
        if points == 0 {
            return;
        }
        self.score += u64::from(points);
        events.push(GameEvent::Scored { points, total: self.score });
    }

    fn move_paddle(&mut self, intent: &Intent, dt: f32) {
        let field = self.config.playfield.size();
        match intent.pointer {
            Some(p) => self.paddle.center_x_on(p.x, field),
            None => {
                self.paddle.pos.x += intent.direction.x * self.paddle.speed * dt;
                self.paddle.clamp_to(field);
            }
        }
    }

    /// Move every ball, resolve walls, paddle and bricks, and drop lost balls
    fn update_balls(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let field = self.config.playfield.size();
        let paddle_box = self.paddle.bounds();
        let paddle_center = self.paddle.center().x;
        let half_width = self.paddle.size.x * 0.5;

        let mut points = 0;
        let mut index = 0;
        while index < self.balls.len() {
            let ball = &mut self.balls[index];
            ball.pos = integrate(ball.pos, ball.vel, dt);
            if confine_circle(&mut ball.pos, &mut ball.vel, ball.radius, field, Walls::OPEN_BOTTOM) {
                ball.vel = cap_speed(ball.vel, &self.config.speed);
            }

            if ball.vel.y > 0.0 && ball.bounds().touches(&paddle_box) {
                ball.pos.y = paddle_box.min.y - ball.radius;
                ball.vel.y = -ball.vel.y;
                let offset = crate::clamp((ball.pos.x - paddle_center) / half_width, -1.0, 1.0);
                ball.vel.x += offset * self.config.spin;
                ball.vel = bump_speed(ball.vel, &self.config.speed);
                spawn_burst(&mut self.particles, &mut self.rng, ball.pos, CHIP_BURST);
            }

            // One brick per ball per step
            let hit = self.bricks.iter_mut().filter(|b| b.alive).find_map(|brick| {
                bounce_circle(&mut ball.pos, &mut ball.vel, ball.radius, &brick.bounds())
                    .map(|_| (brick.hit(), brick.kind, brick.bounds().center()))
            });
            let at = ball.pos;
            let lost = exited_below(ball.pos, ball.radius, field.y);

            match hit {
                Some((BrickHit::Destroyed, kind, center)) => {
                    points += kind.points();
                    spawn_burst(&mut self.particles, &mut self.rng, at, BRICK_BURST);
                    self.maybe_drop(center, events);
                }
                Some((BrickHit::Damaged, _, _)) => {
                    points += self.config.damage_points;
                    spawn_burst(&mut self.particles, &mut self.rng, at, CHIP_BURST);
                }
                Some((BrickHit::Bounced, _, _)) | None => {}
            }

            if lost {
                self.balls.swap_remove(index);
            } else {
                index += 1;
            }
        }
        self.add_score(points, events);
    }

    fn maybe_drop(&mut self, center: Vec2, events: &mut Vec<GameEvent>) {
        if self.rng.random::<f32>() >= self.config.drop_chance {
            return;
        }
        let Some(&kind) = PowerUpKind::BREAKOUT.choose(&mut self.rng) else {
            return;
        };
        let size = Vec2::new(24.0, 14.0);
        let fall = 80.0 + self.rng.random::<f32>() * 60.0;
        self.power_ups.push(PowerUp::new(center - Vec2::new(size.x * 0.5, 0.0), fall, size, kind));
        events.push(GameEvent::PowerUpSpawned { kind });
        log::debug!("Dropped {kind:?}");
    }

    /// All balls gone: take a life and re-serve, or end the game
    fn lose_life(&mut self, events: &mut Vec<GameEvent>) {
        self.lives = self.lives.saturating_sub(1);
        events.push(GameEvent::LifeLost { remaining: self.lives });
        if self.lives == 0 {
            self.over = true;
            events.push(GameEvent::GameOver);
            log::info!("Breakout over: score {} at level {}", self.score, self.level);
            return;
        }
        let ball = self.served_ball();
        self.balls.push(ball);
    }

    fn update_power_ups(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let paddle_box = self.paddle.bounds();
        let bottom = self.config.playfield.height + 40.0;
        let mut caught = Vec::new();
        for power_up in self.power_ups.iter_mut() {
            power_up.pos = integrate(power_up.pos, power_up.vel, dt);
            if power_up.bounds().touches(&paddle_box) {
                power_up.alive = false;
                caught.push((power_up.kind, power_up.bounds().center()));
            } else if power_up.pos.y > bottom {
                power_up.alive = false;
            }
        }
        self.power_ups.retain(|p| p.alive);

        for (kind, at) in caught {
            self.apply(kind);
            spawn_burst(&mut self.particles, &mut self.rng, at, CATCH_BURST);
            events.push(GameEvent::PowerUpCollected { kind });
        }
    }

    /// Activate a caught power-up
    pub fn apply(&mut self, kind: PowerUpKind) {
        let field = self.config.playfield.size();
        match kind {
            PowerUpKind::ExpandPaddle => {
                let width = (self.paddle.size.x * self.config.expand_factor).min(self.config.expand_max_width);
                self.paddle.set_width(width.min(field.x), field);
                self.effects.expand_until = Some(self.clock + self.config.expand_secs);
            }
            PowerUpKind::ExtraLife => self.lives += 1,
            PowerUpKind::SlowBall => {
                for ball in self.balls.iter_mut() {
                    ball.vel = cap_speed(ball.vel * self.config.slow_factor, &self.config.speed);
                }
                self.effects.slow_until = Some(self.clock + self.config.slow_secs);
            }
            PowerUpKind::MultiBall => {
                // Instant: the extra balls stay in play until lost
                self.spawn_multiballs(self.config.multiball_count);
            }
            PowerUpKind::DoubleShot | PowerUpKind::Shield | PowerUpKind::Rainbow => {
                log::warn!("{kind:?} has no effect in Breakout");
            }
        }
    }

    fn expire_effects(&mut self) {
        let now = self.clock;
        let field = self.config.playfield.size();
        if self.effects.expand_until.is_some_and(|until| until < now) {
            self.effects.expand_until = None;
            self.paddle.set_width(self.config.base_paddle_width(), field);
        }
        if self.effects.slow_until.is_some_and(|until| until < now) {
            self.effects.slow_until = None;
            for ball in self.balls.iter_mut() {
                ball.vel = bump_speed(ball.vel, &self.config.speed);
            }
        }
    }
}

impl Game for Breakout {
    fn max_dt(&self) -> f32 {
        self.config.max_dt
    }

    fn step(&mut self, intent: &Intent, dt: f32, events: &mut Vec<GameEvent>) {
        self.clock += dt;
        self.move_paddle(intent, dt);
        self.update_balls(dt, events);
        if self.balls.is_empty() {
            self.lose_life(events);
            if self.over {
                return;
            }
        }
        self.update_power_ups(dt, events);
        self.expire_effects();
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
        self.bricks.iter().all(|b| !b.blocks_clear())
    }

    fn start_next_level(&mut self) {
        self.level += 1;
        let field = self.config.playfield.size();
        self.bricks = self.config.layout.build(self.level, field.x, &mut self.rng);
        self.balls.clear();
        let ball = self.served_ball();
        self.balls.push(ball);
        self.power_ups.clear();
        self.effects = Effects::default();
        self.paddle.set_width(self.config.base_paddle_width(), field);
        spawn_burst(&mut self.particles, &mut self.rng, field * 0.5, LEVEL_BURST);
    }

    fn snapshot(&self) -> serde_json::Value {
        snapshot_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::director;
    use crate::sim::state::BrickKind;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn small_config() -> BreakoutConfig {
        BreakoutConfig { playfield: Playfield::new(900.0, 500.0), ..Default::default() }
    }

    fn breakout(seed: u64) -> Breakout {
        Breakout::new(small_config(), Difficulty::Normal, Some(seed))
    }

    #[test]
    fn test_initial_layout() {
        let game = breakout(1);
        assert_eq!(game.lives, 3);
        assert_eq!(game.balls.len(), 1);
        assert_eq!(game.bricks.len(), 40);
        assert_eq!(game.paddle.size, Vec2::new(126.0, 15.0));
        assert_eq!(game.paddle.pos.y, 500.0 - 15.0 - 12.0);
    }

    #[test]
    fn test_easy_starts_with_extra_balls() {
        let game = Breakout::new(small_config(), Difficulty::Easy, Some(2));
        assert_eq!(game.balls.len(), 3);
        assert!(game.balls[1..].iter().all(|b| b.vel.y <= 0.0));
    }

    #[test]
    fn test_missed_ball_costs_a_life() {
        let mut game = breakout(3);
        // Paddle parked on the far right, nothing between the ball and the floor
        game.paddle.pos.x = 900.0 - game.paddle.size.x;
        game.bricks.clear();
        game.balls = vec![Ball::new(Vec2::new(100.0, 490.0), Vec2::new(0.0, 300.0), 7.2)];

        let mut lost = None;
        for _ in 0..60 {
            let events = game.advance(&Intent::default(), DT);
            if let Some(event) = events.into_iter().find(|e| matches!(e, GameEvent::LifeLost { .. })) {
                lost = Some(event);
                break;
            }
        }
        assert_eq!(lost, Some(GameEvent::LifeLost { remaining: 2 }));
        assert_eq!(game.lives, 2);
        assert_eq!(game.balls.len(), 1);
        assert_eq!(game.balls[0].pos.y, 250.0);
    }

    #[test]
    fn test_last_life_ends_game() {
        let mut game = breakout(4);
        game.lives = 1;
        game.paddle.pos.x = 900.0 - game.paddle.size.x;
        game.balls = vec![Ball::new(Vec2::new(100.0, 505.0), Vec2::new(0.0, 300.0), 7.2)];
        let events = game.advance(&Intent::default(), DT);
        assert!(events.contains(&GameEvent::GameOver));
        assert!(game.is_over());
        assert_eq!(game.hud().lives, Some(0));
    }

    #[test]
    fn test_paddle_reflects_upward() {
        let mut game = breakout(5);
        let top = game.paddle.pos.y;
        let center = game.paddle.center().x;
        game.balls = vec![Ball::new(Vec2::new(center, top - 8.0), Vec2::new(0.0, 300.0), 7.2)];
        game.advance(&Intent::default(), DT);
        let ball = &game.balls[0];
        assert!(ball.vel.y < 0.0);
        assert!(ball.speed() > 300.0);
    }

    #[test]
    fn test_brick_scoring_by_tier() {
        let mut game = breakout(6);
        game.config.drop_chance = 0.0;
        let size = Vec2::new(60.0, 20.0);
        game.bricks = vec![
            Brick::new(Vec2::new(100.0, 100.0), size, BrickKind::Strong),
            Brick::new(Vec2::new(500.0, 300.0), size, BrickKind::Normal),
        ];
        // Straight up into the strong brick
        game.balls = vec![Ball::new(Vec2::new(130.0, 125.0), Vec2::new(0.0, -300.0), 7.2)];
        game.advance(&Intent::default(), DT);
        assert_eq!(game.score, 40);
        assert!(game.bricks[0].alive);
        assert!(game.balls[0].vel.y > 0.0);

        game.balls = vec![Ball::new(Vec2::new(130.0, 125.0), Vec2::new(0.0, -300.0), 7.2)];
        game.advance(&Intent::default(), DT);
        assert_eq!(game.score, 240);
        assert!(!game.bricks[0].alive);
        assert!(!game.level_cleared());
    }

    #[test]
    fn test_level_clear_with_only_unbreakables() {
        let mut game = breakout(7);
        game.bricks = vec![Brick::new(Vec2::new(100.0, 100.0), Vec2::new(60.0, 20.0), BrickKind::Unbreakable)];
        assert!(game.level_cleared());

        let mut events = Vec::new();
        director::direct(&mut game, &mut events);
        assert_eq!(game.level, 2);
        assert_eq!(events, vec![GameEvent::LevelCleared { level: 2 }]);
        assert_eq!(game.bricks.len(), 50);
        assert_eq!(game.balls[0].pos, Vec2::new(450.0, 250.0));
    }

    #[test]
    fn test_pointer_hover_moves_paddle() {
        let mut game = breakout(8);
        let intent = Intent { pointer: Some(Vec2::new(300.0, 10.0)), ..Default::default() };
        game.advance(&intent, DT);
        assert!((game.paddle.center().x - 300.0).abs() < 0.001);
    }

    #[test]
    fn test_expand_expires_on_sim_clock() {
        let mut game = breakout(9);
        let base = game.paddle.size.x;
        game.apply(PowerUpKind::ExpandPaddle);
        assert!((game.paddle.size.x - base * 1.5).abs() < 0.001);

        game.clock = 7.9;
        game.expire_effects();
        assert!(game.effects.expand_until.is_some());
        game.clock = 8.1;
        game.expire_effects();
        assert_eq!(game.effects.expand_until, None);
        assert_eq!(game.paddle.size.x, base);
    }

    #[test]
    fn test_power_up_caught_by_paddle() {
        let mut game = breakout(10);
        let above = game.paddle.pos + Vec2::new(10.0, -15.0);
        game.power_ups.push(PowerUp::new(above, 120.0, Vec2::new(24.0, 14.0), PowerUpKind::ExtraLife));
        let events = game.advance(&Intent::default(), DT);
        assert!(events.contains(&GameEvent::PowerUpCollected { kind: PowerUpKind::ExtraLife }));
        assert_eq!(game.lives, 4);
        assert!(game.power_ups.is_empty());
    }

    #[test]
    fn test_multiball_is_instant() {
        let mut game = breakout(12);
        game.apply(PowerUpKind::MultiBall);
        assert_eq!(game.balls.len(), 3);
        assert_eq!(game.effects, Effects::default());
        assert!(game.balls[1..].iter().all(|b| b.vel.y <= 0.0));
    }

    #[test]
    fn test_slow_ball_respects_min_speed() {
        let mut game = breakout(11);
        game.balls[0].vel = Vec2::new(0.0, -160.0);
        game.apply(PowerUpKind::SlowBall);
        assert!((game.balls[0].speed() - game.config.speed.min).abs() < 0.01);
    }

    proptest! {
        #[test]
        fn prop_balls_and_paddle_bounded(seed in any::<u64>(), steps in 1usize..400, dir in -1i32..=1) {
            let mut game = Breakout::new(small_config(), Difficulty::Easy, Some(seed));
            let intent = Intent { direction: Vec2::new(dir as f32, 0.0), ..Default::default() };
            let limits = game.config.speed;
            for _ in 0..steps {
                game.advance(&intent, DT);
                prop_assert!(game.paddle.pos.x >= 0.0 && game.paddle.pos.x <= 900.0 - game.paddle.size.x);
                for ball in &game.balls {
                    let speed = ball.speed();
                    prop_assert!(speed >= limits.min - 0.01 && speed <= limits.max + 0.01);
                }
            }
        }
    }
}
