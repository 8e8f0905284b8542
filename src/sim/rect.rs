//! Axis-aligned rectangles for tiles, hazards and bounding boxes
//!
//! World space is y-up: `bottom` is the lower edge, `top = bottom + height`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, bottom: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            bottom,
            width,
            height,
        }
    }

    /// Rectangle of `size` centred on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(
            center.x - size.x / 2.0,
            center.y - size.y / 2.0,
            size.x,
            size.y,
        )
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.bottom + self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width / 2.0, self.bottom + self.height / 2.0)
    }

    /// Whether `x` lies within the horizontal span (edges inclusive)
    #[inline]
    pub fn spans_x(&self, x: f32) -> bool {
        self.left <= x && x <= self.right()
    }

    /// Strict overlap: rectangles that only share an edge do not overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.bottom < other.top()
            && other.bottom < self.top()
    }

    /// Same rectangle moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(
            self.left + offset.x,
            self.bottom + offset.y,
            self.width,
            self.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.top(), 60.0);
        assert_eq!(r.center(), Vec2::new(25.0, 40.0));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let floor = Rect::new(0.0, 0.0, 64.0, 64.0);
        let standing = Rect::new(8.0, 64.0, 48.0, 36.0);
        assert!(!floor.overlaps(&standing));

        let sunk = standing.translated(Vec2::new(0.0, -1.0));
        assert!(floor.overlaps(&sunk));
    }

    #[test]
    fn test_spans_x_inclusive() {
        let r = Rect::new(0.0, 0.0, 64.0, 64.0);
        assert!(r.spans_x(0.0));
        assert!(r.spans_x(64.0));
        assert!(!r.spans_x(64.5));
    }
}
