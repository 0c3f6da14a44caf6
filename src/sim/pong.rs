//! Pong: player paddle on the left, AI paddle on the right
//!
//! The ball bounces off the top and bottom walls and leaves through the
//! sides. Whoever's side it leaves through concedes the point; the ball is
//! re-served from the centre toward the winner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Walls, confine_circle, exited_side};
use super::engine::{Game, snapshot_of};
use super::physics::{Side, SpeedLimits, bump_speed, cap_speed, integrate, serve_velocity};
use super::rng::{RngState, SimRng};
use super::state::{
    Ball, Burst, GameEvent, Hud, Paddle, Particle, spawn_burst, update_particles,
};
use crate::consts::SERVE_SPEED;
use crate::input::Intent;
use crate::settings::{Difficulty, Playfield};

/// Particles thrown when a point is scored
const SCORE_BURST: Burst = Burst {
    count: 18,
    speed: 220.0,
    life: 0.6,
    gravity: 180.0,
};

/// Pong tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PongConfig {
    pub playfield: Playfield,
    pub paddle_size: Vec2,
    /// Distance of each paddle from its wall
    pub paddle_margin: f32,
    pub paddle_speed: f32,
    pub ball_radius: f32,
    pub serve_speed: f32,
    /// Vertical speed added at the paddle edge
    pub spin: f32,
    pub speed: SpeedLimits,
    /// Match ends when either side reaches this; None plays forever
    pub win_score: Option<u32>,
    pub max_dt: f32,
}

impl Default for PongConfig {
    fn default() -> Self {
        Self {
            playfield: Playfield::new(900.0, 500.0),
            paddle_size: Vec2::new(12.0, 100.0),
            paddle_margin: 20.0,
            paddle_speed: 420.0,
            ball_radius: 8.0,
            serve_speed: SERVE_SPEED,
            spin: 200.0,
            speed: SpeedLimits::default(),
            win_score: None,
            max_dt: 0.03,
        }
    }
}

/// Opponent controller parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    /// Pixels/second cap on paddle movement
    pub max_speed: f32,
    /// Fraction of the remaining distance closed per step
    pub reaction: f32,
    /// Aim at the projected intercept instead of the ball's current y
    pub predictive: bool,
}

impl AiProfile {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                max_speed: 180.0,
                reaction: 0.03,
                predictive: false,
            },
            Difficulty::Normal => Self {
                max_speed: 360.0,
                reaction: 0.08,
                predictive: false,
            },
            Difficulty::Hard => Self {
                max_speed: 720.0,
                reaction: 0.9,
                predictive: true,
            },
        }
    }

    /// Paddle-centre y the AI wants to reach, kept reachable inside the field
    pub fn target_y(&self, paddle: &Paddle, ball: &Ball, field_height: f32) -> f32 {
        let mut target = ball.pos.y;
        if self.predictive && ball.vel.x.abs() > f32::EPSILON {
            let t = (paddle.pos.x - ball.pos.x) / ball.vel.x;
            if t > 0.0 {
                target = ball.pos.y + ball.vel.y * t;
            }
        }
        let half = paddle.size.y * 0.5;
        crate::clamp(target, half, field_height - half)
    }

    /// Move `paddle` one step toward its target
    pub fn drive(&self, paddle: &mut Paddle, ball: &Ball, field: Vec2, dt: f32) {
        let target = self.target_y(paddle, ball, field.y);
        let limit = self.max_speed * dt;
        let delta = crate::clamp((target - paddle.center().y) * self.reaction, -limit, limit);
        paddle.pos.y += delta;
        paddle.clamp_to(field);
    }
}

/// Pong state
#[derive(Debug, Clone, Serialize)]
pub struct Pong {
    pub config: PongConfig,
    pub ai: AiProfile,
    pub ball: Ball,
    /// Player
    pub left: Paddle,
    /// AI
    pub right: Paddle,
    pub score_left: u64,
    pub score_right: u64,
    pub particles: Vec<Particle>,
    pub over: bool,
    pub rng_state: RngState,
    #[serde(skip)]
    rng: SimRng,
}

impl Pong {
    pub fn new(config: PongConfig, difficulty: Difficulty, seed: Option<u64>) -> Self {
        let rng_state = RngState::from_seed_or_entropy(seed);
        let field = config.playfield.size();
        let paddle_y = (field.y - config.paddle_size.y) * 0.5;
        let left = Paddle::new(
            Vec2::new(config.paddle_margin, paddle_y),
            config.paddle_size,
            config.paddle_speed,
        );
        let right = Paddle::new(
            Vec2::new(field.x - config.paddle_margin - config.paddle_size.x, paddle_y),
            config.paddle_size,
            config.paddle_speed,
        );
        let mut pong = Self {
            ai: AiProfile::for_difficulty(difficulty),
            ball: Ball::new(config.playfield.center(), Vec2::ZERO, config.ball_radius),
            left,
            right,
            score_left: 0,
            score_right: 0,
            particles: Vec::new(),
            over: false,
            rng: rng_state.to_rng(),
            rng_state,
            config,
        };
        pong.serve(None);
        pong
    }

    /// Put the ball at the centre with a fresh serve
    pub fn serve(&mut self, toward: Option<Side>) {
        self.ball.pos = self.config.playfield.center();
        self.ball.vel = serve_velocity(&mut self.rng, self.config.serve_speed, toward);
    }

    /// Reflect off a paddle with English; returns true on a hit
    fn paddle_hit(&mut self, side: Side) -> bool {
        let paddle = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        let ball = &mut self.ball;

        let approaching = match side {
            Side::Left => ball.vel.x < 0.0,
            Side::Right => ball.vel.x > 0.0,
        };
        // The ball centre must not already be behind the paddle's back face
        let in_front = match side {
            Side::Left => ball.pos.x >= paddle.pos.x,
            Side::Right => ball.pos.x <= paddle.pos.x + paddle.size.x,
        };
        if !approaching || !in_front || !ball.bounds().touches(&paddle.bounds()) {
            return false;
        }

        ball.pos.x = match side {
            Side::Left => paddle.pos.x + paddle.size.x + ball.radius,
            Side::Right => paddle.pos.x - ball.radius,
        };
        ball.vel.x = -ball.vel.x;
        let offset = (ball.pos.y - paddle.center().y) / (paddle.size.y * 0.5);
        ball.vel.y += crate::clamp(offset, -1.0, 1.0) * self.config.spin;
        ball.vel = bump_speed(ball.vel, &self.config.speed);
        true
    }

    fn point_won(&mut self, winner: Side, events: &mut Vec<GameEvent>) {
        let total = match winner {
            Side::Left => {
                self.score_left += 1;
                events.push(GameEvent::Scored { points: 1, total: self.score_left });
                self.score_left
            }
            Side::Right => {
                self.score_right += 1;
                self.score_right
            }
        };
        events.push(GameEvent::PointWon { side: winner });
        spawn_burst(&mut self.particles, &mut self.rng, self.ball.pos, SCORE_BURST);
        log::debug!("Point to {winner:?} ({} - {})", self.score_left, self.score_right);

        if self.config.win_score.is_some_and(|win| total >= u64::from(win)) {
            self.over = true;
            events.push(GameEvent::GameOver);
            log::info!("Match over: {} - {}", self.score_left, self.score_right);
            return;
        }
        self.serve(Some(winner));
    }
}

impl Game for Pong {
    fn max_dt(&self) -> f32 {
        self.config.max_dt
    }

    fn step(&mut self, intent: &Intent, dt: f32, events: &mut Vec<GameEvent>) {
        let field = self.config.playfield.size();

        match intent.pointer {
            Some(p) if intent.pointer_down => self.left.center_y_on(p.y, field),
            _ => {
                self.left.pos.y += intent.direction.y * self.left.speed * dt;
                self.left.clamp_to(field);
            }
        }
        self.ai.drive(&mut self.right, &self.ball, field, dt);

        self.ball.pos = integrate(self.ball.pos, self.ball.vel, dt);
        let radius = self.ball.radius;
        if confine_circle(&mut self.ball.pos, &mut self.ball.vel, radius, field, Walls::TOP_BOTTOM) {
            self.ball.vel = cap_speed(self.ball.vel, &self.config.speed);
        }
        if !self.paddle_hit(Side::Left) {
            self.paddle_hit(Side::Right);
        }

        // Leaving through a side concedes the point to the other side
        match exited_side(self.ball.pos, field.x) {
            Some(Side::Left) => self.point_won(Side::Right, events),
            Some(Side::Right) => self.point_won(Side::Left, events),
            None => {}
        }

        update_particles(&mut self.particles, dt);
    }

    fn is_over(&self) -> bool {
        self.over
    }

    fn hud(&self) -> Hud {
        Hud {
            score: self.score_left,
            opponent_score: Some(self.score_right),
            lives: None,
            level: 1,
            game_over: self.over,
        }
    }

    fn snapshot(&self) -> serde_json::Value {
        snapshot_of(self)
    }
}
