//! Physics and opponent tuning
//!
//! Every match owns its own immutable `Tuning`, so several matches (or tests)
//! can run side by side with different values. Defaults scale with the board
//! the same way the game scales them with the window.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a match or loading tuning
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("stones per side must be between 1 and {max}, got {actual}")]
    StoneCount { actual: u8, max: usize },
    #[error("board must have a positive size, got {width}x{height}")]
    EmptyBoard { width: f32, height: f32 },
    #[error("stones of diameter {diameter} don't fit formation slots {spacing} apart")]
    StoneTooLarge { diameter: f32, spacing: f32 },
    #[error("time limit must be positive, got {0}")]
    TimeLimit(f32),
    #[error("invalid tuning: {0}")]
    InvalidTuning(&'static str),
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Physics and AI constants for one match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    // === Stones ===
    /// Radius shared by every stone
    pub stone_radius: f32,

    // === Motion ===
    /// Multiplicative velocity damping applied every tick (< 1)
    pub velocity_damping: f32,
    /// Speeds below this snap to zero
    pub stop_threshold: f32,

    // === Launch ===
    /// Longest drag that still adds launch speed
    pub max_pull_length: f32,
    /// Launch speed at full pull; also caps impact damage
    pub max_push_velocity: f32,

    // === Collisions ===
    /// Cap on the position-only passes that clear overlaps after the pairwise pass
    pub max_separation_passes: u32,

    // === Opponent ===
    /// Actor life at or below which launching it is considered risky
    pub low_life_threshold: f32,
    /// Target life at or below which a hit is likely to finish it
    pub finishing_threshold: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::for_board(1280.0, 720.0)
    }
}

impl Tuning {
    /// Derive tuning from the board size
    pub fn for_board(width: f32, height: f32) -> Self {
        Self {
            stone_radius: height * 0.06,

            velocity_damping: 0.987,
            stop_threshold: width / 6_000.0,

            max_pull_length: 0.1 * width,
            max_push_velocity: 0.008 * width,

            max_separation_passes: 1024,

            low_life_threshold: 5.0,
            finishing_threshold: 10.0,
        }
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.stone_radius > 0.0) {
            return Err(ConfigError::InvalidTuning("stone_radius must be positive"));
        }
        if !(self.velocity_damping > 0.0 && self.velocity_damping < 1.0) {
            return Err(ConfigError::InvalidTuning(
                "velocity_damping must be in (0, 1)",
            ));
        }
        if !(self.stop_threshold >= 0.0) {
            return Err(ConfigError::InvalidTuning(
                "stop_threshold must not be negative",
            ));
        }
        if !(self.max_pull_length > 0.0) {
            return Err(ConfigError::InvalidTuning("max_pull_length must be positive"));
        }
        if !(self.max_push_velocity > 0.0) {
            return Err(ConfigError::InvalidTuning(
                "max_push_velocity must be positive",
            ));
        }
        if self.max_separation_passes == 0 {
            return Err(ConfigError::InvalidTuning(
                "max_separation_passes must be positive",
            ));
        }
        Ok(())
    }

    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning: {:?}", tuning);
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
