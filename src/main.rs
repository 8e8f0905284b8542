//! Haunted by the Light headless runner
//!
//! Builds a run on the flat map source and drives it with a simple
//! autopilot at the fixed simulation rate, logging what happens.
//!
//! Usage: `haunted-light [SEED] [TUNING.json]` (`RUST_LOG=debug` for events)

use std::process::ExitCode;

use haunted_light::consts::SIM_DT;
use haunted_light::sim::{ClipLibrary, FlatMapSource, GameState, RunState, SimEvent, TickInput, tick};
use haunted_light::{SimError, Tuning};

/// Give up after this much simulated time
const TIME_LIMIT: f64 = 600.0;
/// Autopilot jump cadence and hold time (seconds)
const JUMP_EVERY: f64 = 2.5;
const JUMP_HOLD: f64 = 0.15;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Haunted by the Light (headless) starting...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), SimError> {
    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5EED);
    let tuning = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|source| SimError::TuningFile { path, source })?;
            Tuning::from_json(&json)?
        }
        None => Tuning::default(),
    };

    let source = FlatMapSource::new(&tuning);
    let mut state = GameState::new(tuning, &source, ClipLibrary::standard(), seed)?;
    let mut autopilot = Autopilot::default();
    let mut frames = 0u64;

    while state.exit.is_none() && state.elapsed() < TIME_LIMIT {
        let input = autopilot.input(&state);
        tick(&mut state, &input, SIM_DT);
        frames += 1;

        for event in state.drain_events() {
            match event {
                SimEvent::CheckpointActivated { .. }
                | SimEvent::BiomeEntered(_)
                | SimEvent::LifeLost { .. }
                | SimEvent::RunEnded { .. } => log::info!("{event:?}"),
                _ => log::debug!("{event:?}"),
            }
        }
    }

    log::info!(
        "finished after {frames} frames ({:.1}s): {:?}, x={:.0}, lives {}, exit {:?}",
        state.elapsed(),
        state.run_state,
        state.player.body.pos.x,
        state.lives,
        state.exit
    );
    Ok(())
}

/// Presses jump to start, then hops at a fixed cadence
#[derive(Debug, Default)]
struct Autopilot {
    pressed_at: Option<f64>,
    next_jump: f64,
}

impl Autopilot {
    fn input(&mut self, state: &GameState) -> TickInput {
        let now = state.elapsed();
        let mut input = TickInput::default();
        match state.run_state {
            RunState::NotStarted => {
                input.jump_pressed = true;
                self.next_jump = now + JUMP_EVERY;
            }
            RunState::Running => {
                if let Some(at) = self.pressed_at {
                    if now - at >= JUMP_HOLD {
                        input.jump_released = true;
                        self.pressed_at = None;
                    }
                } else if now >= self.next_jump && state.player.is_grounded() {
                    input.jump_pressed = true;
                    self.pressed_at = Some(now);
                    self.next_jump = now + JUMP_EVERY;
                }
            }
            _ => {}
        }
        input
    }
}
