//! Vector and speed helpers shared by every game
//!
//! Velocities are pixels/second, angles are radians measured with y growing
//! downward (canvas convention).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Horizontal side of the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Sign of the x velocity heading toward this side
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Speed bounds and growth for a ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimits {
    pub min: f32,
    pub max: f32,
    /// Multiplier applied on paddle hits
    pub growth: f32,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            min: BALL_MIN_SPEED,
            max: BALL_MAX_SPEED,
            growth: BALL_SPEED_GROWTH,
        }
    }
}

/// Heading of a velocity vector
#[inline]
pub fn heading(vel: Vec2) -> f32 {
    vel.y.atan2(vel.x)
}

/// Rescale `vel` so its magnitude lies in `[limits.min, limits.max]`.
///
/// A zero vector is returned unchanged since it has no direction to keep.
pub fn cap_speed(vel: Vec2, limits: &SpeedLimits) -> Vec2 {
    let speed = vel.length();
    if speed <= f32::EPSILON {
        return vel;
    }
    let capped = crate::clamp(speed, limits.min, limits.max);
    vel * (capped / speed)
}

/// Grow speed by `limits.growth` keeping the heading, never above `limits.max`
pub fn bump_speed(vel: Vec2, limits: &SpeedLimits) -> Vec2 {
    let speed = vel.length();
    if speed <= f32::EPSILON {
        return vel;
    }
    let grown = (speed * limits.growth).min(limits.max).max(limits.min);
    Vec2::from_angle(heading(vel)) * grown
}

/// Velocity for a centre serve: `speed` at a random angle within
/// +-`SERVE_MAX_ANGLE` of horizontal, toward `toward` or a random side.
pub fn serve_velocity<R: Rng>(rng: &mut R, speed: f32, toward: Option<Side>) -> Vec2 {
    let angle = (rng.random::<f32>() * 2.0 - 1.0) * SERVE_MAX_ANGLE;
    let side = toward.unwrap_or_else(|| {
        if rng.random_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        }
    });
    Vec2::new(side.sign() * speed * angle.cos(), speed * angle.sin())
}

/// Explicit Euler position update
#[inline]
pub fn integrate(pos: Vec2, vel: Vec2, dt: f32) -> Vec2 {
    pos + vel * dt
}

/// Frame-rate independent exponential approach.
///
/// `rate_per_frame` is the fraction of the remaining distance covered per
/// 1/60 s frame.
pub fn approach(current: Vec2, target: Vec2, rate_per_frame: f32, dt: f32) -> Vec2 {
    let keep = (1.0 - rate_per_frame).powf(dt * 60.0);
    target + (current - target) * keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_bump_speed_grows_and_keeps_heading() {
        let limits = SpeedLimits::default();
        let vel = Vec2::new(300.0, 0.0);
        let bumped = bump_speed(vel, &limits);
        assert!((bumped.length() - 309.0).abs() < 0.01);
        assert!(bumped.y.abs() < 0.001);
    }

    #[test]
    fn test_bump_speed_never_exceeds_max() {
        let limits = SpeedLimits::default();
        let vel = Vec2::new(0.0, -899.0);
        let bumped = bump_speed(vel, &limits);
        assert!((bumped.length() - limits.max).abs() < 0.01);
    }

    #[test]
    fn test_serve_forced_side() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..50 {
            let left = serve_velocity(&mut rng, 300.0, Some(Side::Left));
            assert!(left.x < 0.0);
            let right = serve_velocity(&mut rng, 300.0, Some(Side::Right));
            assert!(right.x > 0.0);
        }
    }

    #[test]
    fn test_approach_converges() {
        let mut pos = Vec2::new(0.0, -100.0);
        let target = Vec2::new(50.0, 100.0);
        for _ in 0..240 {
            pos = approach(pos, target, 0.08, 1.0 / 60.0);
        }
        assert!(pos.distance(target) < 0.1);
    }

    proptest! {
        #[test]
        fn prop_cap_speed_within_bounds(x in -2000.0f32..2000.0, y in -2000.0f32..2000.0) {
            prop_assume!(x.abs() + y.abs() > 0.01);
            let limits = SpeedLimits::default();
            let speed = cap_speed(Vec2::new(x, y), &limits).length();
            prop_assert!(speed >= limits.min - 0.01 && speed <= limits.max + 0.01);
        }

        #[test]
        fn prop_serve_speed_and_angle(seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let vel = serve_velocity(&mut rng, SERVE_SPEED, None);
            prop_assert!(vel.x.abs() > 0.0);
            prop_assert!(vel.y.abs() <= SERVE_SPEED * SERVE_MAX_ANGLE.sin() + 0.01);
            prop_assert!((vel.length() - SERVE_SPEED).abs() < 0.01);
        }
    }
}
