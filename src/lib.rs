//! Haunted by the Light - chase simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, chase, checkpoints, course layout)
//! - `tuning`: Data-driven game balance
//! - `error`: Setup/configuration errors
//!
//! Rendering, audio, input dispatch and asset loading live outside this crate.
//! They drive [`sim::tick`] once per frame and read [`sim::GameState`] back.

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use tuning::Tuning;

/// Simulation constants that are not part of the tunable balance
pub mod consts {
    /// Nominal simulation timestep (one tick per 60 Hz frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest frame delta accepted by a tick (longer hitches are clamped)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Ground tolerance band above a wall top (pixels)
    pub const GROUND_TOLERANCE: f32 = 5.0;

    /// Player bounding box (slime texture 16x12 at scale 3)
    pub const PLAYER_WIDTH: f32 = 48.0;
    pub const PLAYER_HEIGHT: f32 = 36.0;
    /// Spectre bounding box (32x32 texture at scale 4)
    pub const SPECTRE_WIDTH: f32 = 128.0;
    pub const SPECTRE_HEIGHT: f32 = 128.0;

    /// Player spawn sits this far below the map's spawn marker
    pub const PLAYER_SPAWN_DROP: f32 = 16.0;
}

/// Clamp a frame delta into the range a tick accepts
#[inline]
pub fn clamp_frame_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, consts::MAX_FRAME_DT)
    } else {
        0.0
    }
}
