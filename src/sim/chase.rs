//! Speed coupling between the player and the spectre
//!
//! The player slowly speeds up on the ground and is nudged back while rising
//! in later biomes. The spectre speeds up on its own and is dragged along so
//! it never falls more than a fixed gap behind the player's speed.

use super::kinematics::Body;
use crate::tuning::Tuning;

/// New player horizontal speed after one tick
pub fn player_speed(
    current: f32,
    moving: bool,
    ascending: bool,
    past_first_segment: bool,
    tuning: &Tuning,
    dt: f32,
) -> f32 {
    let speed = if moving && !ascending {
        current + tuning.speed_gain_per_second * dt
    } else if past_first_segment {
        current - tuning.speed_penalty_ascending * dt
    } else {
        current
    };
    // no backward movement
    speed.max(0.0)
}

/// New spectre horizontal speed after one tick.
///
/// Both lower bounds apply, so the lag is at most the smaller gap.
pub fn spectre_speed(current: f32, player_speed: f32, tuning: &Tuning, dt: f32) -> f32 {
    let speed = current + tuning.speed_gain_per_second_spectre * dt;
    let speed = speed.max(player_speed - tuning.spectre_soft_gap);
    speed.max(player_speed - tuning.spectre_speed_cap)
}

/// The spectre's front edge reached `margin` past the player's back edge
#[inline]
pub fn is_captured(spectre: &Body, player: &Body, margin: f32) -> bool {
    spectre.right() - margin > player.left()
}

#[inline]
pub fn victory_reached(player_x: f32, final_boundary: f32, margin: f32) -> bool {
    player_x - margin >= final_boundary
}

/// Past this point the spectre stops following the player's height
#[inline]
pub fn tracking_frozen(spectre_x: f32, final_boundary: f32, freeze_margin: f32) -> bool {
    spectre_x + freeze_margin > final_boundary
}
