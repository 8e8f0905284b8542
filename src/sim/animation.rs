//! Sprite animation driven by simulation time
//!
//! Each entity kind has a closed pose enum; every pose maps to a clip id at
//! compile time. The clip library only supplies frame counts and timings and
//! is checked against the pose enums when a run is built.

use std::collections::HashMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipId {
    SlimeIdle,
    SlimeMoving,
    SlimeDead,
    SlimeVictory,
    SpectreIdle,
    SpectreAwake,
    SpectreMoving,
    Butterfly,
    StarBlink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Right = 0,
    Left = 1,
    Front = 2,
    Back = 3,
}

impl Facing {
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Facing {
    type Error = SimError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Facing::Right),
            1 => Ok(Facing::Left),
            2 => Ok(Facing::Front),
            3 => Ok(Facing::Back),
            other => Err(SimError::InvalidFacing(other)),
        }
    }
}

/// A closed set of animation states for one entity kind
pub trait Pose: Copy + Eq + Debug + 'static {
    const ALL: &'static [Self];

    fn clip(self) -> ClipId;
}

/// Frame layout of one clip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipDef {
    pub frames: u32,
    /// Facing variants available per frame
    pub facings: u8,
    /// Seconds per frame
    pub frame_duration: f32,
}

impl ClipDef {
    pub fn new(frames: u32, facings: u8, frame_duration: f32) -> Self {
        Self {
            frames,
            facings,
            frame_duration,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: HashMap<ClipId, ClipDef>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame counts of the shipped sprite sheets, one second per frame
    pub fn standard() -> Self {
        let table = [
            (ClipId::SlimeIdle, 4),
            (ClipId::SlimeMoving, 4),
            (ClipId::SlimeDead, 1),
            (ClipId::SlimeVictory, 1),
            (ClipId::SpectreIdle, 2),
            (ClipId::SpectreAwake, 1),
            (ClipId::SpectreMoving, 2),
            (ClipId::Butterfly, 3),
            (ClipId::StarBlink, 2),
        ];
        let clips = table
            .into_iter()
            .map(|(id, frames)| (id, ClipDef::new(frames, 1, 1.0)))
            .collect();
        Self { clips }
    }

    pub fn insert(&mut self, id: ClipId, def: ClipDef) -> Result<(), SimError> {
        if def.frames == 0 || def.facings == 0 || !(def.frame_duration > 0.0) {
            return Err(SimError::EmptyClip(id));
        }
        self.clips.insert(id, def);
        Ok(())
    }

    pub fn get(&self, id: ClipId) -> Option<&ClipDef> {
        self.clips.get(&id)
    }

    /// Every pose of `P` must have a clip
    pub fn require<P: Pose>(&self) -> Result<(), SimError> {
        for pose in P::ALL {
            let id = pose.clip();
            match self.clips.get(&id) {
                None => return Err(SimError::MissingClip(id)),
                Some(def) if def.frames == 0 || def.facings == 0 => {
                    return Err(SimError::EmptyClip(id));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Animation capability component
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Animator {
    pub frame: u32,
    /// Seconds into the current frame
    pub timer: f32,
    /// Facing variant actually drawn (after fallback)
    pub facing_index: u8,
    #[serde(skip)]
    fallback_logged: bool,
}

impl Animator {
    /// Back to the first frame (pose changes switch immediately)
    pub fn restart(&mut self) {
        self.frame = 0;
        self.timer = 0.0;
    }

    pub fn advance(&mut self, clip: ClipId, def: &ClipDef, facing: Facing, dt: f32) {
        let wanted = facing.index();
        let resolved = if wanted < def.facings { wanted } else { 0 };
        if resolved != wanted {
            if !self.fallback_logged {
                log::warn!("{clip:?} has no facing {facing:?}, falling back to index 0");
                self.fallback_logged = true;
            }
        } else {
            self.fallback_logged = false;
        }
        self.facing_index = resolved;

        if def.frames <= 1 {
            self.frame = 0;
            return;
        }
        self.timer += dt.max(0.0);
        while self.timer >= def.frame_duration {
            self.timer -= def.frame_duration;
            self.frame = (self.frame + 1) % def.frames;
        }
    }
}

/// What the renderer should draw for an animated thing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteFrame {
    pub clip: ClipId,
    pub frame: u32,
    pub facing: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestPose {
        Idle,
        Run,
    }

    impl Pose for TestPose {
        const ALL: &'static [Self] = &[TestPose::Idle, TestPose::Run];

        fn clip(self) -> ClipId {
            match self {
                TestPose::Idle => ClipId::SlimeIdle,
                TestPose::Run => ClipId::SlimeMoving,
            }
        }
    }

    #[test]
    fn test_require_reports_missing_clip() {
        let mut lib = ClipLibrary::new();
        lib.insert(ClipId::SlimeIdle, ClipDef::new(4, 1, 0.2)).unwrap();
        assert!(matches!(
            lib.require::<TestPose>(),
            Err(SimError::MissingClip(ClipId::SlimeMoving))
        ));
        lib.insert(ClipId::SlimeMoving, ClipDef::new(4, 1, 0.2)).unwrap();
        assert!(lib.require::<TestPose>().is_ok());
    }

    #[test]
    fn test_empty_clip_rejected() {
        let mut lib = ClipLibrary::new();
        assert!(matches!(
            lib.insert(ClipId::Butterfly, ClipDef::new(0, 1, 0.1)),
            Err(SimError::EmptyClip(ClipId::Butterfly))
        ));
    }

    #[test]
    fn test_invalid_facing_index() {
        assert_eq!(Facing::try_from(1).unwrap(), Facing::Left);
        assert!(matches!(Facing::try_from(7), Err(SimError::InvalidFacing(7))));
    }

    #[test]
    fn test_missing_facing_falls_back_to_zero() {
        let def = ClipDef::new(2, 1, 0.5);
        let mut anim = Animator::default();
        anim.advance(ClipId::StarBlink, &def, Facing::Back, 0.1);
        assert_eq!(anim.facing_index, 0);

        let paired = ClipDef::new(2, 2, 0.5);
        anim.advance(ClipId::StarBlink, &paired, Facing::Left, 0.1);
        assert_eq!(anim.facing_index, 1);
    }

    #[test]
    fn test_frames_wrap() {
        let def = ClipDef::new(3, 1, 0.25);
        let mut anim = Animator::default();
        anim.advance(ClipId::Butterfly, &def, Facing::Right, 0.8);
        assert_eq!(anim.frame, 0); // 3 frames advanced, wrapped
        anim.advance(ClipId::Butterfly, &def, Facing::Right, 0.25);
        assert_eq!(anim.frame, 1);
    }

    #[test]
    fn test_non_uniform_dt_matches_uniform() {
        let def = ClipDef::new(4, 1, 0.1);
        let mut uniform = Animator::default();
        let mut jittery = Animator::default();
        for _ in 0..57 {
            uniform.advance(ClipId::SlimeMoving, &def, Facing::Right, 1.0 / 60.0);
        }
        // same 0.95 s of simulated time, uneven frame pacing
        let pattern = [0.005, 0.03, 1.0 / 60.0, 0.0125, 0.0025, 0.0325];
        let mut total = 0.0;
        'outer: loop {
            for dt in pattern {
                if total + dt > 0.95 {
                    break 'outer;
                }
                jittery.advance(ClipId::SlimeMoving, &def, Facing::Right, dt);
                total += dt;
            }
        }
        jittery.advance(ClipId::SlimeMoving, &def, Facing::Right, 0.95 - total);
        assert_eq!(uniform.frame, 1);
        assert_eq!(uniform.frame, jittery.frame);
    }
}
