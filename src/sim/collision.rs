//! Collision detection and response for axis-aligned boxes
//!
//! Every shape is reduced to an AABB (circles use their bounding box). A hit
//! is resolved along the axis of least penetration: the velocity component on
//! that axis is negated and the mover is clamped onto the contact face.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::Side;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from top-left corner and size
    pub fn from_rect(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Bounding box of a circle
    pub fn from_circle(center: Vec2, radius: f32) -> Self {
        Self {
            min: center - Vec2::splat(radius),
            max: center + Vec2::splat(radius),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Inclusive overlap (touching edges count)
    pub fn touches(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Axis a contact is resolved on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Face of the target box that was struck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Face {
    Left,
    Right,
    Top,
    Bottom,
}

impl Face {
    pub fn axis(self) -> Axis {
        match self {
            Face::Left | Face::Right => Axis::Horizontal,
            Face::Top | Face::Bottom => Axis::Vertical,
        }
    }
}

/// Result of a box-vs-box check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Face of the target the mover is pushed out through
    pub face: Face,
    /// Penetration depth along the resolving axis
    pub depth: f32,
}

impl Contact {
    pub fn axis(&self) -> Axis {
        self.face.axis()
    }
}

/// Minimum-translation contact between a moving box and a target box.
///
/// The four directional overlaps are compared; the horizontal axis wins only
/// if its overlap is strictly smaller than the vertical one.
pub fn contact(mover: &Aabb, target: &Aabb) -> Option<Contact> {
    if !mover.touches(target) {
        return None;
    }

    let overlap_left = mover.max.x - target.min.x;
    let overlap_right = target.max.x - mover.min.x;
    let overlap_top = mover.max.y - target.min.y;
    let overlap_bottom = target.max.y - mover.min.y;

    let horizontal = overlap_left.min(overlap_right);
    let vertical = overlap_top.min(overlap_bottom);

    let contact = if horizontal < vertical {
        if overlap_left <= overlap_right {
            Contact { face: Face::Left, depth: overlap_left }
        } else {
            Contact { face: Face::Right, depth: overlap_right }
        }
    } else if overlap_top <= overlap_bottom {
        Contact { face: Face::Top, depth: overlap_top }
    } else {
        Contact { face: Face::Bottom, depth: overlap_bottom }
    };
    Some(contact)
}

/// Bounce a circle off a box.
///
/// Negates the velocity component on the contact axis and moves the circle
/// onto the struck face. Returns the contact if there was one.
pub fn bounce_circle(pos: &mut Vec2, vel: &mut Vec2, radius: f32, target: &Aabb) -> Option<Contact> {
    let hit = contact(&Aabb::from_circle(*pos, radius), target)?;
    match hit.face {
        Face::Left => {
            vel.x = -vel.x;
            pos.x = target.min.x - radius;
        }
        Face::Right => {
            vel.x = -vel.x;
            pos.x = target.max.x + radius;
        }
        Face::Top => {
            vel.y = -vel.y;
            pos.y = target.min.y - radius;
        }
        Face::Bottom => {
            vel.y = -vel.y;
            pos.y = target.max.y + radius;
        }
    }
    Some(hit)
}

/// Which playfield walls reflect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walls {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Walls {
    /// Pong: ball leaves through the sides
    pub const TOP_BOTTOM: Walls = Walls { left: false, right: false, top: true, bottom: true };
    /// Breakout: ball leaves through the bottom
    pub const OPEN_BOTTOM: Walls = Walls { left: true, right: true, top: true, bottom: false };
}

/// Reflect and clamp a circle against the selected walls of `size`.
///
/// Returns true if any wall was hit. The reflected component always points
/// back into the playfield.
pub fn confine_circle(pos: &mut Vec2, vel: &mut Vec2, radius: f32, size: Vec2, walls: Walls) -> bool {
    let mut hit = false;
    if walls.left && pos.x - radius < 0.0 {
        pos.x = radius;
        vel.x = vel.x.abs();
        hit = true;
    }
    if walls.right && pos.x + radius > size.x {
        pos.x = size.x - radius;
        vel.x = -vel.x.abs();
        hit = true;
    }
    if walls.top && pos.y - radius < 0.0 {
        pos.y = radius;
        vel.y = vel.y.abs();
        hit = true;
    }
    if walls.bottom && pos.y + radius > size.y {
        pos.y = size.y - radius;
        vel.y = -vel.y.abs();
        hit = true;
    }
    hit
}

/// Circle has left the playfield through the bottom edge
#[inline]
pub fn exited_below(pos: Vec2, radius: f32, height: f32) -> bool {
    pos.y - radius > height
}

/// Side a point has crossed out of `[0, width]`, if any
pub fn exited_side(pos: Vec2, width: f32) -> Option<Side> {
    if pos.x < 0.0 {
        Some(Side::Left)
    } else if pos.x > width {
        Some(Side::Right)
    } else {
        None
    }
}

/// Clamp a box's top-left corner so the box stays inside `[0, field]`
pub fn clamp_rect(pos: Vec2, size: Vec2, field: Vec2) -> Vec2 {
    Vec2::new(
        crate::clamp(pos.x, 0.0, field.x - size.x),
        crate::clamp(pos.y, 0.0, field.y - size.y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brick() -> Aabb {
        Aabb::from_rect(Vec2::new(100.0, 100.0), Vec2::new(60.0, 20.0))
    }

    #[test]
    fn test_overlap_strict_vs_touch() {
        let a = Aabb::from_rect(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Aabb::from_rect(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(!a.overlaps(&b));
        assert!(a.touches(&b));
    }

    #[test]
    fn test_contact_from_above_is_vertical() {
        // Ball sinking 2px into the top of the brick, well inside horizontally
        let ball = Aabb::from_circle(Vec2::new(130.0, 94.0), 8.0);
        let hit = contact(&ball, &brick()).expect("should hit");
        assert_eq!(hit.face, Face::Top);
        assert_eq!(hit.axis(), Axis::Vertical);
        assert!((hit.depth - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_contact_from_side_is_horizontal() {
        let ball = Aabb::from_circle(Vec2::new(94.0, 110.0), 8.0);
        let hit = contact(&ball, &brick()).expect("should hit");
        assert_eq!(hit.face, Face::Left);
    }

    #[test]
    fn test_contact_tie_resolves_vertically() {
        // Corner case: equal horizontal and vertical overlap
        let ball = Aabb::from_circle(Vec2::new(94.0, 94.0), 8.0);
        let hit = contact(&ball, &brick()).expect("should hit");
        assert_eq!(hit.axis(), Axis::Vertical);
    }

    #[test]
    fn test_no_contact_when_apart() {
        let ball = Aabb::from_circle(Vec2::new(10.0, 10.0), 8.0);
        assert!(contact(&ball, &brick()).is_none());
    }

    #[test]
    fn test_bounce_circle_flips_and_clamps() {
        let mut pos = Vec2::new(130.0, 94.0);
        let mut vel = Vec2::new(50.0, 200.0);
        let hit = bounce_circle(&mut pos, &mut vel, 8.0, &brick());
        assert!(hit.is_some());
        assert_eq!(vel, Vec2::new(50.0, -200.0));
        assert!((pos.y - 92.0).abs() < 0.001);
    }

    #[test]
    fn test_confine_circle_top_bottom_only() {
        let size = Vec2::new(900.0, 500.0);
        let mut pos = Vec2::new(-5.0, 498.0);
        let mut vel = Vec2::new(-100.0, 100.0);
        assert!(confine_circle(&mut pos, &mut vel, 8.0, size, Walls::TOP_BOTTOM));
        // Left wall is open
        assert_eq!(pos.x, -5.0);
        assert_eq!(pos.y, 492.0);
        assert!(vel.y < 0.0);
    }

    #[test]
    fn test_exited_below() {
        assert!(!exited_below(Vec2::new(0.0, 505.0), 8.0, 500.0));
        assert!(exited_below(Vec2::new(0.0, 509.0), 8.0, 500.0));
    }

    #[test]
    fn test_exited_side() {
        assert_eq!(exited_side(Vec2::new(-0.5, 10.0), 900.0), Some(Side::Left));
        assert_eq!(exited_side(Vec2::new(900.5, 10.0), 900.0), Some(Side::Right));
        assert_eq!(exited_side(Vec2::new(450.0, 10.0), 900.0), None);
    }

    #[test]
    fn test_clamp_rect() {
        let field = Vec2::new(900.0, 500.0);
        let size = Vec2::new(12.0, 100.0);
        assert_eq!(clamp_rect(Vec2::new(-4.0, 450.0), size, field), Vec2::new(0.0, 400.0));
    }
}
