//! Stone Sling - a turn-based stone flicking duel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, turns, CPU opponent)
//! - `settings`: Immutable physics/AI tuning derived from the board size
//! - `levels`: Match presets and level progression

pub mod levels;
pub mod settings;
pub mod sim;

pub use levels::LevelKind;
pub use settings::{ConfigError, Tuning};
pub use sim::{
    Decision, MatchConfig, MatchEvent, MatchState, MatchStatus, Side, StatusReport, ai_decide,
    create_match, tick,
};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Life every stone starts with
    pub const STONE_MAX_LIFE: f32 = 100.0;
    /// Every stone weighs the same
    pub const STONE_MASS: f32 = 1.0;

    /// Formation grid: 3 columns x 4 rows per half of the board
    pub const FORMATION_COLUMNS: usize = 3;
    pub const FORMATION_ROWS: usize = 4;
    pub const FORMATION_SLOTS: usize = FORMATION_COLUMNS * FORMATION_ROWS;
    /// Horizontal slot spacing as a fraction of board width
    pub const FORMATION_COLUMN_STEP: f32 = 0.125;
    /// Vertical slot spacing as a fraction of board height
    pub const FORMATION_ROW_STEP: f32 = 0.2;

    /// Wall hits hurt less than stone hits
    pub const WALL_DAMAGE_FACTOR: f32 = 0.3;
    /// Share of the damage the faster stone takes itself
    pub const RECOIL_DAMAGE_FACTOR: f32 = 0.2;
    /// Damage scale applied to the clamped impact speed
    pub const IMPACT_DAMAGE_SCALE: f32 = 2.0;
    /// Effect magnitude reported for an elimination
    pub const DEATH_EFFECT_MAGNITUDE: f32 = 2.0;

    /// Extra gap left between stones after penetration resolution
    pub const CONTACT_SLOP: f32 = 1e-3;
}

/// Rotate a vector by `angle` radians (counter-clockwise)
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Clamp a vector's length to `max`, keeping its direction
#[inline]
pub fn clamp_length(v: Vec2, max: f32) -> Vec2 {
    v.clamp_length_max(max)
}
