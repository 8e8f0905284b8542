//! Per-body integration
//!
//! Every body advances with the same `dt` each tick; nothing here keeps its
//! own clock.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;

/// A moving body: centre position, velocity and a centred bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    /// Pixels per second (`change_x`, `change_y`)
    pub vel: Vec2,
    /// Degrees
    pub angle: f32,
    /// Degrees per second
    pub angular_vel: f32,
    pub size: Vec2,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            angle: 0.0,
            angular_vel: 0.0,
            size,
        }
    }

    /// Advance position and angle by `dt` seconds
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.angle += self.angular_vel * dt;
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x - self.size.x / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y - self.size.y / 2.0
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y + self.size.y / 2.0
    }

    pub fn set_bottom(&mut self, bottom: f32) {
        self.pos.y = bottom + self.size.y / 2.0;
    }

    pub fn set_right(&mut self, right: f32) {
        self.pos.x = right - self.size.x / 2.0;
    }

    pub fn set_top(&mut self, top: f32) {
        self.pos.y = top - self.size.y / 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrate_moves_by_velocity() {
        let mut body = Body::new(Vec2::new(10.0, 20.0), Vec2::splat(8.0));
        body.vel = Vec2::new(300.0, -60.0);
        body.angular_vel = 90.0;
        body.integrate(0.5);
        assert_eq!(body.pos, Vec2::new(160.0, -10.0));
        assert_eq!(body.angle, 45.0);
    }

    #[test]
    fn test_split_steps_match_single_step() {
        let mut a = Body::new(Vec2::ZERO, Vec2::ONE);
        let mut b = a;
        a.vel = Vec2::new(310.0, 12.5);
        b.vel = a.vel;

        a.integrate(0.05);
        for dt in [0.01, 0.015, 0.025] {
            b.integrate(dt);
        }
        assert!((a.pos - b.pos).length() < 1e-3);
    }

    #[test]
    fn test_edge_setters() {
        let mut body = Body::new(Vec2::ZERO, Vec2::new(48.0, 36.0));
        body.set_bottom(64.0);
        assert_eq!(body.bottom(), 64.0);
        assert_eq!(body.top(), 100.0);
        body.set_right(100.0);
        assert_eq!(body.left(), 52.0);
    }
}
