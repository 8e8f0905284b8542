//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Every component advances with the tick's `dt`, nothing reads a wall clock
//! - Seeded RNG only
//! - Timed behavior goes through the run's scheduler
//! - No rendering or platform dependencies

pub mod ambient;
pub mod animation;
pub mod chase;
pub mod checkpoint;
pub mod collision;
pub mod course;
pub mod fade;
pub mod jump;
pub mod kinematics;
pub mod rect;
pub mod schedule;
pub mod state;
pub mod tick;

pub use ambient::{Ambient, DecorKind, Decoration, Rgb};
pub use animation::{Animator, ClipDef, ClipId, ClipLibrary, Facing, Pose, SpriteFrame};
pub use checkpoint::Checkpoint;
pub use collision::{Contact, Hazard, HazardKind, Wall};
pub use course::{Biome, Course, FlatMapSource, Layout, MapSource, Segment, SegmentGeometry};
pub use fade::Fade;
pub use jump::{JumpController, JumpPhase, ascent_profile, jump_apex};
pub use kinematics::Body;
pub use rect::Rect;
pub use schedule::{Scheduler, TimerId};
pub use state::{
    Action, Entity, ExitTo, FailureCause, GameState, PlayerPose, RunState, SimEvent, SpectrePose,
};
pub use tick::{TickInput, tick};
