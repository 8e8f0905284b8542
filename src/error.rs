//! Setup errors
//!
//! Everything here is raised while building a run. The per-frame tick never
//! fails: exhausted pools and missing checkpoints are ordinary game outcomes.

use thiserror::Error;

use crate::sim::{Biome, ClipId};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid tuning: {field} {reason}")]
    InvalidTuning { field: &'static str, reason: String },

    #[error("failed to parse tuning: {0}")]
    TuningParse(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    TuningFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no map available for {biome:?} variant {variant}")]
    MissingMap { biome: Biome, variant: u32 },

    #[error("initial segment has no {0} spawn point")]
    MissingSpawn(&'static str),

    #[error("no animation clip registered for {0:?}")]
    MissingClip(ClipId),

    #[error("animation clip {0:?} has no frames or facings")]
    EmptyClip(ClipId),

    #[error("invalid facing index {0}")]
    InvalidFacing(u8),
}

impl SimError {
    pub(crate) fn tuning(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidTuning {
            field,
            reason: reason.into(),
        }
    }
}
