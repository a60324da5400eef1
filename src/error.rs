//! Error types shared by the simulation engine and its I/O layers.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Everything that can stop a simulation, cost calculation, or export.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid battery bounds, efficiencies, or sweep candidates.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The input series has no intervals.
    #[error("timeline is empty, nothing to simulate")]
    EmptyTimeline,

    /// Per-interval import and export series differ in length.
    #[error("import series has {imports} intervals but export series has {exports}")]
    LengthMismatch { imports: usize, exports: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SimError {
    /// Shorthand for a configuration error on a single field.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration(ConfigError {
            field: field.into(),
            message: message.into(),
        })
    }
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
