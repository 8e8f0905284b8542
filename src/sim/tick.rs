//! Per-frame simulation tick
//!
//! Advances the run by one frame of `dt` seconds. Order while running:
//! kinematics, wall resolution, jump controller, chase, world reactions,
//! then the terminal checks.

use super::ambient::{FRESH_AIR, ICE_NIGHT, OBSIDIAN_NIGHT};
use super::chase;
use super::checkpoint::{self, FailureOutcome};
use super::collision::{cull_fallen_hazards, release_dripstones, resolve_walls, touching_hazard};
use super::course::Biome;
use super::state::{
    Action, ExitTo, FailureCause, GameState, PlayerPose, RunState, SimEvent, SpectrePose,
};
use super::schedule::TimerId;
use crate::clamp_frame_dt;

/// Stars moved onto the screen per tick inside a starry biome
const STARS_PER_TICK: usize = 2;

/// Input edges for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Jump key went down (also starts the run)
    pub jump_pressed: bool,
    /// Jump key went up
    pub jump_released: bool,
    /// Pause toggle
    pub pause: bool,
    /// Quit from the pause menu
    pub abandon: bool,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = clamp_frame_dt(dt);

    if input.pause {
        match state.run_state {
            RunState::Running => {
                state.run_state = RunState::Paused;
                state.emit(SimEvent::Paused);
                return;
            }
            RunState::Paused => {
                state.run_state = RunState::Running;
                state.emit(SimEvent::Resumed);
            }
            _ => {}
        }
    }

    if state.run_state == RunState::Paused {
        if input.abandon {
            log::info!("run abandoned from the pause menu");
            state.emit(SimEvent::Failed(FailureCause::Abandoned));
            end_run(state, false);
        }
        return;
    }

    state.time_ticks += 1;
    state.scheduler.advance(dt);
    while let Some((id, action)) = state.scheduler.pop_due() {
        apply(state, id, action);
    }

    match state.run_state {
        RunState::NotStarted if input.jump_pressed => start_run(state),
        RunState::Running => step_running(state, input, dt),
        _ => {}
    }

    state.player.animate(dt, &state.clips);
    state.spectre.animate(dt, &state.clips);
    state.ambient.update(dt, &state.clips);
    state.fade.update(dt);
}

/// First jump press: wake the spectre and schedule the start sequence
fn start_run(state: &mut GameState) {
    state.run_state = RunState::Running;
    state.spectre.set_pose(SpectrePose::Awake);

    let t = &state.tuning;
    let (hop, spectre, player) = (t.start_hop_at, t.spectre_wake_at, t.player_move_at);
    let (cloud, butterfly) = (t.cloud_interval, t.butterfly_interval);
    state.timers.start = vec![
        state.scheduler.schedule_once(Action::StartHop, hop),
        state.scheduler.schedule_once(Action::SpectreStarts, spectre),
        state.scheduler.schedule_once(Action::PlayerStarts, player),
    ];
    state.timers.cloud = Some(state.scheduler.schedule_every(Action::SpawnCloud, cloud));
    state.timers.butterfly = Some(state.scheduler.schedule_every(Action::SpawnButterfly, butterfly));
    if state.player.body.pos.x < state.course.decoration_limit() {
        state.ambient.spawn_cloud();
    }

    log::info!("run started (seed {})", state.seed);
    state.emit(SimEvent::RunStarted);
}

fn step_running(state: &mut GameState, input: &TickInput, dt: f32) {
    let t = &state.tuning;
    let (gravity, jump_velocity, jump_lock) = (t.gravity, t.jump_velocity, t.jump_lock);

    // Kinematics and resolution
    let prev = state.player.body.pos;
    state.player.body.integrate(dt);
    let contact = resolve_walls(&mut state.player.body, prev, &state.course.walls);
    state.spectre.body.integrate(dt);

    // Jump controller: physics first, then this tick's input edges
    let mut jumped = false;
    let mut landed = false;
    if let Some(jump) = state.player.jump.as_mut() {
        landed = jump.step(&mut state.player.body, contact, gravity, dt);
        if input.jump_pressed {
            jumped = jump.launch(&mut state.player.body, jump_velocity, jump_lock);
        }
        if input.jump_released {
            jump.release(&mut state.player.body, jump_velocity);
        }
    }
    if landed {
        state.emit(SimEvent::Landed);
    }
    if jumped {
        state.emit(SimEvent::Jumped);
    }

    // Chase
    let t = &state.tuning;
    let final_boundary = state.course.final_boundary();
    let player = &mut state.player;
    player.body.vel.x = chase::player_speed(
        player.body.vel.x,
        player.pose == PlayerPose::Moving,
        player.body.vel.y > 0.0,
        player.body.pos.x > state.course.first_boundary(),
        t,
        dt,
    );
    let spectre = &mut state.spectre;
    if spectre.pose == SpectrePose::Moving {
        spectre.body.vel.x = chase::spectre_speed(spectre.body.vel.x, player.body.vel.x, t, dt);
        if chase::tracking_frozen(spectre.body.pos.x, final_boundary, t.spectre_freeze_margin) {
            spectre.body.vel.y = 0.0;
        } else {
            spectre.body.pos.y = player.body.pos.y;
        }
    }

    react_to_world(state, dt);

    // Terminal checks
    let t = &state.tuning;
    if chase::victory_reached(state.player.body.pos.x, final_boundary, t.victory_margin) {
        end_run(state, true);
        return;
    }
    let cause = if state.player.body.pos.y <= t.fall_threshold {
        Some(FailureCause::Fell)
    } else if chase::is_captured(&state.spectre.body, &state.player.body, t.capture_margin) {
        Some(FailureCause::Captured)
    } else if touching_hazard(&state.player.body.rect(), &state.hazards).is_some() {
        Some(FailureCause::Hazard)
    } else {
        None
    };
    if let Some(cause) = cause {
        fail(state, cause);
    }
}

/// Dripstones, checkpoints, biome transitions and stars
fn react_to_world(state: &mut GameState, dt: f32) {
    let t = &state.tuning;
    let released = release_dripstones(
        &mut state.hazards,
        state.player.body.right(),
        t.dripstone_fall_height,
        t.dripstone_trigger_distance,
        t.dripstone_fall_speed,
    );
    for hazard in state.hazards.iter_mut().filter(|h| h.released()) {
        hazard.integrate(dt);
    }
    cull_fallen_hazards(&mut state.hazards, t.hazard_cull_depth);
    if released > 0 {
        state.emit(SimEvent::DripstonesReleased { count: released });
    }

    for index in checkpoint::activate_passed(&mut state.checkpoints, &state.player.body) {
        log::info!("checkpoint {index} activated");
        state.emit(SimEvent::CheckpointActivated { index });
    }

    let x = state.player.body.pos.x;
    let ice_start = state.course.biome_start(Biome::Ice);
    let obsidian_start = state.course.biome_start(Biome::Obsidian);
    if !state.entered_ice {
        if x >= ice_start {
            state.entered_ice = true;
            enter_biome(state, Biome::Ice);
        }
    } else if !state.entered_obsidian && x >= obsidian_start {
        state.entered_obsidian = true;
        enter_biome(state, Biome::Obsidian);
    }

    if (ice_start..=obsidian_start).contains(&x) {
        state.ambient.add_stars(Biome::Ice, STARS_PER_TICK);
    } else if x >= obsidian_start {
        state.ambient.add_stars(Biome::Obsidian, STARS_PER_TICK);
    }
}

fn enter_biome(state: &mut GameState, biome: Biome) {
    let (from, to) = match biome {
        Biome::Ice => (FRESH_AIR, ICE_NIGHT),
        _ => (ICE_NIGHT, OBSIDIAN_NIGHT),
    };
    let steps = state.tuning.gradient_steps;
    state.ambient.start_gradient(from, to, steps as usize);
    if let Some(previous) = state.timers.gradient.take() {
        state.scheduler.unschedule(previous);
    }
    state.timers.gradient = Some(
        state
            .scheduler
            .schedule_every(Action::GradientStep, 1.0 / steps as f32),
    );
    log::info!("entered {biome:?} at x={:.0}", state.player.body.pos.x);
    state.emit(SimEvent::BiomeEntered(biome));
}

/// Respawn at the furthest active checkpoint or end the run
fn fail(state: &mut GameState, cause: FailureCause) {
    state.emit(SimEvent::Failed(cause));
    match checkpoint::resolve_failure(&state.checkpoints, &mut state.lives) {
        FailureOutcome::NoCheckpoint => {
            log::info!("{cause:?} with no active checkpoint");
            end_run(state, false);
        }
        FailureOutcome::OutOfLives => {
            log::info!("{cause:?}, no lives left");
            state.emit(SimEvent::LifeLost { lives_left: 0 });
            end_run(state, false);
        }
        FailureOutcome::Recover {
            checkpoint,
            lives_left,
        } => {
            log::info!("{cause:?}, respawning at checkpoint {checkpoint} ({lives_left} lives left)");
            state.emit(SimEvent::LifeLost { lives_left });
            state.run_state = RunState::Recovering;
            state.fade.rate = state.tuning.fade_rate;
            state.fade.start_fade_out();

            let t = &state.tuning;
            let (fade_in, settle, resume) =
                (t.recovery_fade_in_at, t.recovery_settle_at, t.recovery_resume_at);
            let scheduler = &mut state.scheduler;
            scheduler.schedule_once(Action::FadeBackIn, fade_in);
            scheduler.schedule_once(Action::Teleport { checkpoint }, fade_in);
            scheduler.schedule_once(Action::SettleFade, settle);
            scheduler.schedule_once(Action::FinishRecovery, resume);
        }
    }
}

fn end_run(state: &mut GameState, victory: bool) {
    let (run_state, pose, exit, delay) = if victory {
        (RunState::EndedVictory, PlayerPose::Victory, ExitTo::Outro, state.tuning.victory_exit_delay)
    } else {
        (RunState::EndedDead, PlayerPose::Dead, ExitTo::Restart, state.tuning.dead_exit_delay)
    };
    state.run_state = run_state;
    state.player.set_pose(pose);
    for id in state.timers.start.drain(..) {
        state.scheduler.unschedule(id);
    }
    state.scheduler.schedule_once(Action::Exit(exit), delay);

    log::info!(
        "run ended ({}) at x={:.0} after {:.1}s",
        if victory { "victory" } else { "dead" },
        state.player.body.pos.x,
        state.elapsed()
    );
    state.emit(SimEvent::RunEnded { victory });
}

fn apply(state: &mut GameState, id: TimerId, action: Action) {
    match action {
        Action::StartHop => {
            let jump_velocity = state.tuning.jump_velocity;
            let lock = state.tuning.jump_lock;
            let player = &mut state.player;
            let jumped = player
                .jump
                .as_mut()
                .is_some_and(|jump| jump.launch(&mut player.body, jump_velocity, lock));
            if jumped {
                state.emit(SimEvent::Jumped);
            }
        }
        Action::SpectreStarts => {
            state.spectre.set_pose(SpectrePose::Moving);
            state.spectre.body.vel.x = state.tuning.initial_speed_spectre;
        }
        Action::PlayerStarts => {
            state.player.set_pose(PlayerPose::Moving);
            state.player.body.vel.x = state.tuning.initial_speed;
        }
        Action::SpawnCloud | Action::SpawnButterfly => {
            if state.player.body.pos.x < state.course.decoration_limit() {
                if action == Action::SpawnCloud {
                    state.ambient.spawn_cloud();
                } else {
                    state.ambient.spawn_butterfly();
                }
            } else {
                state.scheduler.unschedule(id);
            }
        }
        Action::GradientStep => {
            if !state.ambient.gradient_step() {
                state.scheduler.unschedule(id);
                state.timers.gradient = None;
            }
        }
        Action::FadeBackIn => {
            state.fade.rate = state.tuning.fade_in_rate;
            state.fade.stop_fade_out();
            state.fade.start_fade_in();
            state.emit(SimEvent::RecoveryFadeIn);
        }
        Action::Teleport { checkpoint } => {
            let Some(anchor) = state.checkpoints.get(checkpoint).map(|cp| cp.rect) else {
                return;
            };
            let t = &state.tuning;
            let (gap, boost) = (t.respawn_spectre_gap, t.respawn_spectre_boost);

            let player = &mut state.player;
            player.set_pose(PlayerPose::Idling);
            player.body.pos.x = anchor.center().x;
            player.body.set_bottom(anchor.bottom);
            if let Some(jump) = player.jump.as_mut() {
                jump.reset(&mut player.body);
            }

            let spectre = &mut state.spectre;
            spectre.body.pos.x = player.body.pos.x - gap;
            spectre.body.pos.y = player.body.pos.y;
            spectre.body.vel.x = player.body.vel.x + boost;

            log::debug!("respawned at x={:.0}", player.body.pos.x);
            state.emit(SimEvent::Respawned { checkpoint });
        }
        Action::SettleFade => {
            state.fade.rate = state.tuning.fade_rate;
        }
        Action::FinishRecovery => {
            state.run_state = RunState::Running;
            state.player.set_pose(PlayerPose::Moving);
            log::info!("recovery finished, running again");
            state.emit(SimEvent::RecoveryFinished);
        }
        Action::Exit(exit) => {
            state.fade.start_fade_out();
            state.exit = Some(exit);
            state.emit(SimEvent::Exit(exit));
        }
    }
}
