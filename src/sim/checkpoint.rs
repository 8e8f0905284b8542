//! Checkpoints and the respawn decision
//!
//! A checkpoint activates once, when the player passes over and above it,
//! and never deactivates. On failure the right-most active checkpoint is
//! the respawn anchor; the timed recovery itself runs through the
//! scheduler (see `tick`).

use serde::{Deserialize, Serialize};

use super::kinematics::Body;
use super::rect::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub rect: Rect,
    active: bool,
}

impl Checkpoint {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            active: false,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activate if the player is above it with its centre over it.
    ///
    /// Returns true only on the tick it flips.
    pub fn try_activate(&mut self, player: &Body) -> bool {
        if self.active {
            return false;
        }
        if self.rect.bottom < player.top() && self.rect.spans_x(player.pos.x) {
            self.active = true;
            return true;
        }
        false
    }

    /// Force activation (setup and tests)
    pub fn activate(&mut self) {
        self.active = true;
    }
}

/// Activate every checkpoint the player is passing; returns the new ones
pub fn activate_passed(checkpoints: &mut [Checkpoint], player: &Body) -> Vec<usize> {
    checkpoints
        .iter_mut()
        .enumerate()
        .filter_map(|(i, cp)| cp.try_activate(player).then_some(i))
        .collect()
}

/// Index of the active checkpoint furthest along the course
pub fn respawn_anchor(checkpoints: &[Checkpoint]) -> Option<usize> {
    checkpoints
        .iter()
        .enumerate()
        .filter(|(_, cp)| cp.is_active())
        .max_by(|(_, a), (_, b)| a.rect.center().x.total_cmp(&b.rect.center().x))
        .map(|(i, _)| i)
}

/// What a failure leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Nothing to respawn at; no life is spent
    NoCheckpoint,
    /// The last life was spent
    OutOfLives,
    /// Respawn at this checkpoint with the remaining lives
    Recover { checkpoint: usize, lives_left: u8 },
}

/// Decide a failure and spend a life when a respawn is possible
pub fn resolve_failure(checkpoints: &[Checkpoint], lives: &mut u8) -> FailureOutcome {
    let Some(checkpoint) = respawn_anchor(checkpoints) else {
        return FailureOutcome::NoCheckpoint;
    };
    debug_assert!(*lives > 0, "a running game always has a life left");
    *lives = lives.saturating_sub(1);
    if *lives == 0 {
        FailureOutcome::OutOfLives
    } else {
        FailureOutcome::Recover {
            checkpoint,
            lives_left: *lives,
        }
    }
}
