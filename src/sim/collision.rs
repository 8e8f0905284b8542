//! Ground detection and collision response against tile geometry
//!
//! Walls are solid and provide support. Hazards are never resolved against:
//! touching one is enough to fail the run.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::kinematics::Body;
use super::rect::Rect;
use crate::consts::GROUND_TOLERANCE;

/// Slack for float noise after snapping an edge onto a wall
const CONTACT_EPSILON: f32 = 0.01;

/// A solid tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub rect: Rect,
    /// The map marked this tile as a candidate checkpoint spot
    #[serde(default)]
    pub checkable: bool,
}

impl Wall {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            checkable: false,
        }
    }

    pub fn checkable(rect: Rect) -> Self {
        Self {
            rect,
            checkable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    /// Ice stalactite, falls once the player comes close
    Dripstone,
    /// Never moves
    Static,
}

/// A lethal tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub rect: Rect,
    pub kind: HazardKind,
    /// Vertical velocity, non-zero once released
    pub vel_y: f32,
}

impl Hazard {
    pub fn new(rect: Rect, kind: HazardKind) -> Self {
        Self {
            rect,
            kind,
            vel_y: 0.0,
        }
    }

    #[inline]
    pub fn released(&self) -> bool {
        self.vel_y != 0.0
    }

    pub fn integrate(&mut self, dt: f32) {
        self.rect.bottom += self.vel_y * dt;
    }
}

/// What the resolver did to a body this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contact {
    /// Resting on a wall (centre over it, bottom on its top)
    pub grounded: bool,
    /// Pushed back out of a wall face
    pub blocked: bool,
    /// Head hit the underside of a wall
    pub bumped: bool,
}

/// The wall a body is resting on, if any.
///
/// A wall supports the body when its span contains the body's centre x and
/// the bottom sits within the tolerance band above its top. The test is swept
/// from `prev_bottom` so a fast fall cannot pass through a tile in one tick.
/// If several walls qualify, the highest top wins.
pub fn support_under(walls: &[Wall], center_x: f32, prev_bottom: f32, bottom: f32) -> Option<&Wall> {
    walls
        .iter()
        .filter(|wall| {
            let top = wall.rect.top();
            wall.rect.spans_x(center_x)
                && bottom <= top + GROUND_TOLERANCE
                && prev_bottom >= top - CONTACT_EPSILON
        })
        .max_by(|a, b| a.rect.top().total_cmp(&b.rect.top()))
}

/// Snap `body` onto supporting walls and push it out of any wall it entered.
///
/// `prev_pos` is the body's centre before this tick's integration.
pub fn resolve_walls(body: &mut Body, prev_pos: Vec2, walls: &[Wall]) -> Contact {
    let mut contact = Contact::default();
    let prev_bottom = prev_pos.y - body.size.y / 2.0;

    if body.vel.y <= 0.0 {
        if let Some(wall) = support_under(walls, body.pos.x, prev_bottom, body.bottom()) {
            body.set_bottom(wall.rect.top());
            body.vel.y = 0.0;
            contact.grounded = true;
        }
    }

    let prev_rect = Rect::from_center(prev_pos, body.size);
    for wall in walls {
        let rect = body.rect();
        if !penetrates(&rect, &wall.rect) {
            continue;
        }

        if prev_rect.bottom >= wall.rect.top() - CONTACT_EPSILON {
            // Came down onto an edge the centre is not over
            body.set_bottom(wall.rect.top());
            body.vel.y = body.vel.y.max(0.0);
        } else if prev_rect.right() <= wall.rect.left + CONTACT_EPSILON {
            body.set_right(wall.rect.left);
            contact.blocked = true;
        } else if prev_rect.top() <= wall.rect.bottom + CONTACT_EPSILON {
            body.set_top(wall.rect.bottom);
            body.vel.y = body.vel.y.min(0.0);
            contact.bumped = true;
        } else {
            // Already embedded (spawn or teleport): lift it out
            body.set_bottom(wall.rect.top());
            body.vel.y = body.vel.y.max(0.0);
        }
    }

    contact
}

/// Index of the first hazard the rectangle overlaps
pub fn touching_hazard(rect: &Rect, hazards: &[Hazard]) -> Option<usize> {
    hazards.iter().position(|h| h.rect.overlaps(rect))
}

/// Release dripstones hanging high enough once the player is close.
///
/// Returns how many were released this call.
pub fn release_dripstones(
    hazards: &mut [Hazard],
    player_right: f32,
    fall_height: f32,
    trigger_distance: f32,
    fall_speed: f32,
) -> usize {
    let mut released = 0;
    for hazard in hazards.iter_mut() {
        if hazard.kind != HazardKind::Dripstone || hazard.released() {
            continue;
        }
        if hazard.rect.center().y > fall_height && player_right + trigger_distance > hazard.rect.left {
            hazard.vel_y = -fall_speed;
            released += 1;
        }
    }
    released
}

/// Drop released hazards that fell past `depth`
pub fn cull_fallen_hazards(hazards: &mut Vec<Hazard>, depth: f32) {
    hazards.retain(|h| !(h.released() && h.rect.top() < depth));
}

/// Overlap that is deeper than float noise on both axes
fn penetrates(a: &Rect, b: &Rect) -> bool {
    a.left < b.right() - CONTACT_EPSILON
        && b.left < a.right() - CONTACT_EPSILON
        && a.bottom < b.top() - CONTACT_EPSILON
        && b.bottom < a.top() - CONTACT_EPSILON
}
