//! Jump state machine
//!
//! Grounded → Ascending on a jump press while grounded. Gravity acts while
//! airborne. Letting go early cuts the upward velocity (variable jump
//! height) and moves to Released. Landing needs resolver support and an
//! elapsed ascent lock, so the launch platform cannot cancel a fresh jump.

use serde::{Deserialize, Serialize};

use super::collision::Contact;
use super::kinematics::Body;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpPhase {
    Grounded,
    /// Jump input still held
    Ascending,
    /// Airborne without a held jump (released early, or walked off a ledge)
    Released,
}

/// Jump capability component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpController {
    pub phase: JumpPhase,
    /// Seconds before landing is accepted again
    pub lock_remaining: f32,
}

impl Default for JumpController {
    fn default() -> Self {
        Self {
            phase: JumpPhase::Grounded,
            lock_remaining: 0.0,
        }
    }
}

impl JumpController {
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.phase == JumpPhase::Grounded
    }

    #[inline]
    pub fn is_airborne(&self) -> bool {
        !self.is_grounded()
    }

    /// Start a jump. Does nothing unless grounded.
    pub fn launch(&mut self, body: &mut Body, jump_velocity: f32, lock: f32) -> bool {
        if self.phase != JumpPhase::Grounded {
            return false;
        }
        body.vel.y = jump_velocity;
        self.phase = JumpPhase::Ascending;
        self.lock_remaining = lock;
        true
    }

    /// Jump input let go. Clips the ascent when still rising fast enough.
    ///
    /// Returns true if the velocity was clipped.
    pub fn release(&mut self, body: &mut Body, jump_velocity: f32) -> bool {
        if self.phase != JumpPhase::Ascending {
            return false;
        }
        self.phase = JumpPhase::Released;
        let stop = stop_jump_value(body.vel.y, jump_velocity);
        if body.vel.y > stop {
            body.vel.y = stop;
            true
        } else {
            false
        }
    }

    /// Advance timers, land, or apply gravity. Returns true on landing.
    pub fn step(&mut self, body: &mut Body, contact: Contact, gravity: f32, dt: f32) -> bool {
        self.lock_remaining = (self.lock_remaining - dt).max(0.0);
        match self.phase {
            JumpPhase::Grounded => {
                if !contact.grounded {
                    // walked off a ledge
                    self.phase = JumpPhase::Released;
                    body.vel.y -= gravity * dt;
                }
                false
            }
            JumpPhase::Ascending | JumpPhase::Released => {
                if contact.grounded && self.lock_remaining <= 0.0 {
                    self.phase = JumpPhase::Grounded;
                    body.vel.y = 0.0;
                    true
                } else {
                    body.vel.y -= gravity * dt;
                    false
                }
            }
        }
    }

    /// Put back on the ground with no vertical motion (respawn)
    pub fn reset(&mut self, body: &mut Body) {
        *self = Self::default();
        body.vel.y = 0.0;
    }
}

/// Velocity an early release cuts the ascent down to
#[inline]
pub fn stop_jump_value(change_y: f32, jump_velocity: f32) -> f32 {
    -0.8 * change_y + jump_velocity
}

/// `(time, change_y)` samples of a jump from launch up to its apex.
///
/// Only rising samples are kept; the first non-positive velocity is the apex.
pub fn ascent_profile(gravity: f32, initial_velocity: f32, dt: f32) -> Vec<(f32, f32)> {
    let mut samples = Vec::new();
    let mut k = 0u32;
    loop {
        let vy = initial_velocity - k as f32 * gravity * dt;
        if vy <= 0.0 {
            break;
        }
        samples.push((k as f32 * dt, vy));
        k += 1;
    }
    samples
}

/// Apex time and height reached when integrating at `dt`
pub fn jump_apex(gravity: f32, initial_velocity: f32, dt: f32) -> (f32, f32) {
    let profile = ascent_profile(gravity, initial_velocity, dt);
    let height = profile.iter().map(|(_, vy)| vy * dt).sum();
    (profile.len() as f32 * dt, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::{Wall, resolve_walls};
    use crate::sim::rect::Rect;
    use glam::Vec2;
    use proptest::prelude::*;

    const G: f32 = 3600.0;
    const J: f32 = 1380.0;

    fn grounded_slime() -> (Body, JumpController) {
        let mut body = Body::new(Vec2::new(32.0, 0.0), Vec2::new(48.0, 36.0));
        body.set_bottom(64.0);
        (body, JumpController::default())
    }

    /// kinematics → resolver → controller, as the tick orders them
    fn run_tick(body: &mut Body, jump: &mut JumpController, walls: &[Wall], dt: f32) -> Contact {
        let prev = body.pos;
        body.integrate(dt);
        let contact = resolve_walls(body, prev, walls);
        jump.step(body, contact, G, dt);
        contact
    }

    #[test]
    fn test_launch_only_when_grounded() {
        let (mut body, mut jump) = grounded_slime();
        assert!(jump.launch(&mut body, J, 0.4));
        assert_eq!(body.vel.y, J);
        assert_eq!(jump.phase, JumpPhase::Ascending);
        assert!(!jump.launch(&mut body, J, 0.4));
    }

    #[test]
    fn test_release_clips_early_ascent() {
        let (mut body, mut jump) = grounded_slime();
        jump.launch(&mut body, J, 0.4);
        body.vel.y = 1020.0;
        assert!(jump.release(&mut body, J));
        assert_eq!(body.vel.y, -0.8 * 1020.0 + J);
        assert_eq!(jump.phase, JumpPhase::Released);
    }

    #[test]
    fn test_release_near_apex_keeps_velocity() {
        let (mut body, mut jump) = grounded_slime();
        jump.launch(&mut body, J, 0.4);
        body.vel.y = 300.0; // stop value would be 1140
        assert!(!jump.release(&mut body, J));
        assert_eq!(body.vel.y, 300.0);
    }

    #[test]
    fn test_lock_suppresses_landing_on_launch_platform() {
        let walls = vec![Wall::new(Rect::new(0.0, 0.0, 64.0, 64.0))];
        let (mut body, mut jump) = grounded_slime();
        // a weak hop that comes straight back down inside the lock window
        jump.launch(&mut body, 120.0, 0.4);
        let dt = 1.0 / 60.0;
        let mut elapsed = 0.0;
        while elapsed < 0.35 {
            run_tick(&mut body, &mut jump, &walls, dt);
            elapsed += dt;
            assert!(jump.is_airborne());
        }
        for _ in 0..10 {
            run_tick(&mut body, &mut jump, &walls, dt);
        }
        assert!(jump.is_grounded());
        assert_eq!(body.bottom(), 64.0);
    }

    #[test]
    fn test_walking_off_ledge_falls() {
        let walls = vec![Wall::new(Rect::new(0.0, 0.0, 64.0, 64.0))];
        let (mut body, mut jump) = grounded_slime();
        body.vel.x = 600.0;
        for _ in 0..10 {
            run_tick(&mut body, &mut jump, &walls, 1.0 / 60.0);
        }
        assert_eq!(jump.phase, JumpPhase::Released);
        assert!(body.vel.y < 0.0);
    }

    #[test]
    fn test_full_jump_lands_back() {
        let walls: Vec<Wall> = (0..40)
            .map(|i| Wall::new(Rect::new(i as f32 * 64.0, 0.0, 64.0, 64.0)))
            .collect();
        let (mut body, mut jump) = grounded_slime();
        body.vel.x = 300.0;
        jump.launch(&mut body, J, 0.4);
        let dt = 1.0 / 60.0;
        let mut peak: f32 = 0.0;
        for _ in 0..120 {
            run_tick(&mut body, &mut jump, &walls, dt);
            peak = peak.max(body.bottom() - 64.0);
        }
        assert!(jump.is_grounded());
        let ideal = J * J / (2.0 * G);
        assert!((peak - ideal).abs() <= J * dt, "peak {peak} vs {ideal}");
    }

    #[test]
    fn test_ascent_profile_is_rising() {
        let profile = ascent_profile(G, J, 1.0 / 1000.0);
        assert_eq!(profile[0], (0.0, J));
        assert!(profile.windows(2).all(|w| w[1].1 < w[0].1));
        assert!(profile.last().unwrap().1 > 0.0);
    }

    proptest! {
        #[test]
        fn prop_apex_matches_closed_form(
            dt in prop::sample::select(vec![1.0f32 / 30.0, 1.0 / 60.0, 1.0 / 120.0, 1.0 / 240.0]),
            v0 in 200.0f32..2000.0,
            g in 1000.0f32..5000.0,
        ) {
            let (time, height) = jump_apex(g, v0, dt);
            let ideal_height = v0 * v0 / (2.0 * g);
            prop_assert!((height - ideal_height).abs() <= v0 * dt + 0.5);
            prop_assert!((time - v0 / g).abs() <= dt * 1.01 + 1e-4);
        }
    }
}
