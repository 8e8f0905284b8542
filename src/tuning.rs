//! Data-driven game balance
//!
//! Every value can be overridden from JSON; missing fields keep their
//! defaults. Velocities are pixels/second, accelerations pixels/second².

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Smallest viewport edge the ambient layer can lay decorations out in
const MIN_VIEWPORT: f32 = 600.0;

/// Balance and timing values for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Course layout ===
    /// Tile edge in source pixels
    pub tile_size: f32,
    /// Tiles per map segment
    pub map_width: u32,
    /// Scale applied to tile geometry
    pub tile_scaling: f32,
    /// Segments generated for each of grass, ice and obsidian
    pub maps_per_biome: u32,
    /// Number of map variants available per biome
    pub grass_variants: u32,
    pub ice_variants: u32,
    pub obsidian_variants: u32,
    /// Chance for an eligible wall to carry a checkpoint
    pub checkpoint_probability: f64,

    // === Movement ===
    pub initial_speed: f32,
    pub initial_speed_spectre: f32,
    pub speed_gain_per_second: f32,
    pub speed_gain_per_second_spectre: f32,
    /// Deceleration while ascending past the first segment
    pub speed_penalty_ascending: f32,
    /// Spectre never lags the player by more than this (loose bound)
    pub spectre_soft_gap: f32,
    /// Spectre never lags the player by more than this (tight bound)
    pub spectre_speed_cap: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    /// Landing is ignored for this long after a jump starts (seconds)
    pub jump_lock: f32,

    // === Failure and victory ===
    pub lives: u8,
    /// Falling to or below this y fails the run
    pub fall_threshold: f32,
    /// Capture fires when `spectre.right - capture_margin > player.left`
    pub capture_margin: f32,
    /// Distance past the final boundary that wins the run
    pub victory_margin: f32,
    /// Spectre stops tracking the player's height this far before the final boundary
    pub spectre_freeze_margin: f32,

    // === Falling dripstones ===
    pub dripstone_fall_height: f32,
    pub dripstone_trigger_distance: f32,
    pub dripstone_fall_speed: f32,
    /// Released hazards whose top drops below this are removed
    pub hazard_cull_depth: f32,

    // === Start sequence (seconds after the start press) ===
    pub start_hop_at: f32,
    pub spectre_wake_at: f32,
    pub player_move_at: f32,

    // === Recovery sequence (seconds after the failure) ===
    pub recovery_fade_in_at: f32,
    pub recovery_settle_at: f32,
    pub recovery_resume_at: f32,
    /// Spectre is placed this far behind the player after a respawn
    pub respawn_spectre_gap: f32,
    /// Spectre speed over the player's after a respawn
    pub respawn_spectre_boost: f32,
    pub fade_rate: f32,
    pub fade_in_rate: f32,

    // === End of run ===
    pub dead_exit_delay: f32,
    pub victory_exit_delay: f32,

    // === Ambient ===
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub cloud_interval: f32,
    pub butterfly_interval: f32,
    pub gradient_steps: u32,
    pub ice_star_count: u32,
    pub obsidian_star_count: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tile_size: 16.0,
            map_width: 30,
            tile_scaling: 4.0,
            maps_per_biome: 10,
            grass_variants: 6,
            ice_variants: 3,
            obsidian_variants: 3,
            checkpoint_probability: 0.02,

            initial_speed: 300.0,
            initial_speed_spectre: 310.0,
            speed_gain_per_second: 4.0,
            speed_gain_per_second_spectre: 2.0,
            speed_penalty_ascending: 3.0,
            spectre_soft_gap: 10.0,
            spectre_speed_cap: 5.0,
            gravity: 3600.0,
            jump_velocity: 1380.0,
            jump_lock: 0.4,

            lives: 3,
            fall_threshold: -200.0,
            capture_margin: 30.0,
            victory_margin: 800.0,
            spectre_freeze_margin: 500.0,

            dripstone_fall_height: 1050.0,
            dripstone_trigger_distance: 140.0,
            dripstone_fall_speed: 1000.0,
            hazard_cull_depth: -500.0,

            start_hop_at: 0.8,
            spectre_wake_at: 1.4,
            player_move_at: 2.0,

            recovery_fade_in_at: 1.0,
            recovery_settle_at: 1.5,
            recovery_resume_at: 5.0,
            respawn_spectre_gap: 320.0,
            respawn_spectre_boost: 2.0,
            fade_rate: 200.0,
            fade_in_rate: 100.0,

            dead_exit_delay: 1.0,
            victory_exit_delay: 3.0,

            viewport_width: 1920.0,
            viewport_height: 1080.0,
            cloud_interval: 20.0,
            butterfly_interval: 10.0,
            gradient_steps: 30,
            ice_star_count: 100,
            obsidian_star_count: 20,
        }
    }
}

impl Tuning {
    /// Parse a tuning file and validate it
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Width of one segment in world pixels
    #[inline]
    pub fn segment_width(&self) -> f32 {
        self.map_width as f32 * self.tile_size * self.tile_scaling
    }

    /// Edge of a world tile in pixels
    #[inline]
    pub fn world_tile(&self) -> f32 {
        self.tile_size * self.tile_scaling
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        positive("tile_size", self.tile_size)?;
        positive("tile_scaling", self.tile_scaling)?;
        positive("gravity", self.gravity)?;
        positive("jump_velocity", self.jump_velocity)?;
        positive("fade_rate", self.fade_rate)?;
        positive("fade_in_rate", self.fade_in_rate)?;
        positive("cloud_interval", self.cloud_interval)?;
        positive("butterfly_interval", self.butterfly_interval)?;
        non_negative("jump_lock", self.jump_lock)?;
        non_negative("spectre_soft_gap", self.spectre_soft_gap)?;
        non_negative("spectre_speed_cap", self.spectre_speed_cap)?;
        non_negative("initial_speed", self.initial_speed)?;

        if self.map_width == 0 {
            return Err(SimError::tuning("map_width", "must be at least 1"));
        }
        if self.maps_per_biome == 0 {
            return Err(SimError::tuning("maps_per_biome", "must be at least 1"));
        }
        if self.grass_variants == 0 || self.ice_variants == 0 || self.obsidian_variants == 0 {
            return Err(SimError::tuning("*_variants", "every biome needs a variant"));
        }
        if self.lives == 0 {
            return Err(SimError::tuning("lives", "must be at least 1"));
        }
        if !(self.viewport_width >= MIN_VIEWPORT && self.viewport_height >= MIN_VIEWPORT) {
            return Err(SimError::tuning(
                "viewport",
                format!("must be at least {MIN_VIEWPORT} pixels each way"),
            ));
        }
        if self.gradient_steps < 2 {
            return Err(SimError::tuning("gradient_steps", "must be at least 2"));
        }
        if !(0.0..=1.0).contains(&self.checkpoint_probability) {
            return Err(SimError::tuning(
                "checkpoint_probability",
                format!("{} is outside 0..=1", self.checkpoint_probability),
            ));
        }
        if !(self.start_hop_at >= 0.0
            && self.spectre_wake_at >= 0.0
            && self.player_move_at >= 0.0)
        {
            return Err(SimError::tuning("start sequence", "delays must not be negative"));
        }
        if !(0.0 <= self.recovery_fade_in_at
            && self.recovery_fade_in_at <= self.recovery_settle_at
            && self.recovery_settle_at <= self.recovery_resume_at)
        {
            return Err(SimError::tuning(
                "recovery sequence",
                "steps must be ordered fade_in <= settle <= resume",
            ));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::tuning(field, format!("{value} must be positive")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::tuning(field, format!("{value} must not be negative")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
        assert_eq!(Tuning::default().segment_width(), 1920.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "lives": 5, "maps_per_biome": 2 }"#).unwrap();
        assert_eq!(tuning.lives, 5);
        assert_eq!(tuning.maps_per_biome, 2);
        assert_eq!(tuning.jump_velocity, Tuning::default().jump_velocity);
    }

    #[test]
    fn test_rejects_zero_lives() {
        let err = Tuning::from_json(r#"{ "lives": 0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidTuning { field: "lives", .. }));
    }

    #[test]
    fn test_rejects_unordered_recovery() {
        let tuning = Tuning {
            recovery_settle_at: 6.0,
            recovery_resume_at: 5.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Tuning::from_json("{ lives: "),
            Err(SimError::TuningParse(_))
        ));
    }
}
