//! Game state and core simulation types
//!
//! Everything a run mutates lives in [`GameState`]; the course itself is
//! fixed once the run is built.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ambient::Ambient;
use super::animation::{Animator, ClipId, ClipLibrary, Facing, Pose, SpriteFrame};
use super::checkpoint::Checkpoint;
use super::collision::Hazard;
use super::course::{Biome, Course, FlatMapSource, MapSource};
use super::fade::Fade;
use super::jump::JumpController;
use super::kinematics::Body;
use super::schedule::{Scheduler, TimerId};
use crate::consts::*;
use crate::error::SimError;
use crate::tuning::Tuning;

/// Stream for ambient randomness, kept apart from course generation
const AMBIENT_STREAM: u64 = 0xa3b1_95e2_17f4_0c6d;

/// Phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Waiting for the first jump press
    NotStarted,
    Running,
    Paused,
    /// Timed respawn in progress; bodies are frozen
    Recovering,
    EndedDead,
    EndedVictory,
}

impl RunState {
    #[inline]
    pub fn is_ended(self) -> bool {
        matches!(self, RunState::EndedDead | RunState::EndedVictory)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerPose {
    Idling,
    Moving,
    Dead,
    Victory,
}

impl Pose for PlayerPose {
    const ALL: &'static [Self] = &[
        PlayerPose::Idling,
        PlayerPose::Moving,
        PlayerPose::Dead,
        PlayerPose::Victory,
    ];

    fn clip(self) -> ClipId {
        match self {
            PlayerPose::Idling => ClipId::SlimeIdle,
            PlayerPose::Moving => ClipId::SlimeMoving,
            PlayerPose::Dead => ClipId::SlimeDead,
            PlayerPose::Victory => ClipId::SlimeVictory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpectrePose {
    Idling,
    Awake,
    Moving,
}

impl Pose for SpectrePose {
    const ALL: &'static [Self] = &[SpectrePose::Idling, SpectrePose::Awake, SpectrePose::Moving];

    fn clip(self) -> ClipId {
        match self {
            SpectrePose::Idling => ClipId::SpectreIdle,
            SpectrePose::Awake => ClipId::SpectreAwake,
            SpectrePose::Moving => ClipId::SpectreMoving,
        }
    }
}

/// A live body with its pose and optional capabilities
#[derive(Debug, Clone)]
pub struct Entity<P: Pose> {
    pub body: Body,
    pub pose: P,
    pub facing: Facing,
    pub animator: Option<Animator>,
    pub jump: Option<JumpController>,
}

impl<P: Pose> Entity<P> {
    pub fn new(body: Body, pose: P) -> Self {
        Self {
            body,
            pose,
            facing: Facing::Right,
            animator: Some(Animator::default()),
            jump: None,
        }
    }

    pub fn with_jump(mut self) -> Self {
        self.jump = Some(JumpController::default());
        self
    }

    /// Switch pose; the new clip starts from its first frame
    pub fn set_pose(&mut self, pose: P) {
        if self.pose != pose {
            self.pose = pose;
            if let Some(animator) = self.animator.as_mut() {
                animator.restart();
            }
        }
    }

    pub fn animate(&mut self, dt: f32, clips: &ClipLibrary) {
        let clip = self.pose.clip();
        if let (Some(animator), Some(def)) = (self.animator.as_mut(), clips.get(clip)) {
            animator.advance(clip, def, self.facing, dt);
        }
    }

    /// Frame the renderer should draw
    pub fn sprite(&self) -> Option<SpriteFrame> {
        self.animator.map(|a| SpriteFrame {
            clip: self.pose.clip(),
            frame: a.frame,
            facing: a.facing_index,
        })
    }

    pub fn is_grounded(&self) -> bool {
        self.jump.is_some_and(|j| j.is_grounded())
    }
}

/// Where the view layer goes once a run is over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitTo {
    /// Fresh run
    Restart,
    Outro,
}

/// Why a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCause {
    Fell,
    Captured,
    Hazard,
    Abandoned,
}

/// Notifications for audio and rendering, drained by the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    RunStarted,
    Jumped,
    Landed,
    Paused,
    Resumed,
    DripstonesReleased { count: usize },
    CheckpointActivated { index: usize },
    BiomeEntered(Biome),
    Failed(FailureCause),
    LifeLost { lives_left: u8 },
    RecoveryFadeIn,
    Respawned { checkpoint: usize },
    RecoveryFinished,
    RunEnded { victory: bool },
    Exit(ExitTo),
}

/// Deferred work owned by the run's scheduler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    StartHop,
    SpectreStarts,
    PlayerStarts,
    SpawnCloud,
    SpawnButterfly,
    GradientStep,
    FadeBackIn,
    Teleport { checkpoint: usize },
    SettleFade,
    FinishRecovery,
    Exit(ExitTo),
}

/// Handles of repeating or cancellable timers
#[derive(Debug, Clone, Default)]
pub struct Timers {
    pub start: Vec<TimerId>,
    pub cloud: Option<TimerId>,
    pub butterfly: Option<TimerId>,
    pub gradient: Option<TimerId>,
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub course: Course,
    /// Lethal tiles (released dripstones move)
    pub hazards: Vec<Hazard>,
    pub checkpoints: Vec<Checkpoint>,
    pub player: Entity<PlayerPose>,
    pub spectre: Entity<SpectrePose>,
    pub lives: u8,
    pub run_state: RunState,
    pub scheduler: Scheduler<Action>,
    pub clips: ClipLibrary,
    pub ambient: Ambient,
    pub fade: Fade,
    /// Set once the end-of-run delay has passed
    pub exit: Option<ExitTo>,
    /// Events since the caller last drained them
    pub events: Vec<SimEvent>,
    /// Simulated (non-paused) tick counter
    pub time_ticks: u64,
    pub timers: Timers,
    /// Background transitions already started
    pub entered_ice: bool,
    pub entered_obsidian: bool,
}

impl GameState {
    /// Build a run from a map source. Fails on bad configuration only.
    pub fn new(
        tuning: Tuning,
        source: &dyn MapSource,
        clips: ClipLibrary,
        seed: u64,
    ) -> Result<Self, SimError> {
        tuning.validate()?;
        clips.require::<PlayerPose>()?;
        clips.require::<SpectrePose>()?;

        let layout = Course::generate(&tuning, source, seed)?;
        let course = layout.course;

        let player = Entity::new(
            Body::new(course.player_spawn, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT)),
            PlayerPose::Idling,
        )
        .with_jump();
        let spectre = Entity::new(
            Body::new(course.spectre_spawn, Vec2::new(SPECTRE_WIDTH, SPECTRE_HEIGHT)),
            SpectrePose::Idling,
        );

        let ambient = Ambient::new(&tuning, Pcg32::new(seed, AMBIENT_STREAM));
        let mut fade = Fade::new(tuning.fade_rate);
        fade.start_fade_in();

        log::info!(
            "run ready: seed {seed}, {} lives, {} checkpoints, victory past x={}",
            tuning.lives,
            layout.checkpoints.len(),
            course.final_boundary() + tuning.victory_margin
        );

        Ok(Self {
            seed,
            lives: tuning.lives,
            tuning,
            course,
            hazards: layout.hazards,
            checkpoints: layout.checkpoints,
            player,
            spectre,
            run_state: RunState::NotStarted,
            scheduler: Scheduler::new(),
            clips,
            ambient,
            fade,
            exit: None,
            events: Vec::new(),
            time_ticks: 0,
            timers: Timers::default(),
            entered_ice: false,
            entered_obsidian: false,
        })
    }

    /// Default balance on a flat course with the standard clips
    pub fn with_defaults(seed: u64) -> Result<Self, SimError> {
        let tuning = Tuning::default();
        let source = FlatMapSource::new(&tuning);
        Self::new(tuning, &source, ClipLibrary::standard(), seed)
    }

    /// Take the events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Seconds of simulated (non-paused) time
    pub fn elapsed(&self) -> f64 {
        self.scheduler.now()
    }

    pub(crate) fn emit(&mut self, event: SimEvent) {
        log::debug!("{event:?}");
        self.events.push(event);
    }
}
