//! Match presets
//!
//! The three level variants and the order they are played in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sim::{MatchConfig, Rect, SideSettings};

/// Level variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelKind {
    /// No walls: stones knocked off the board are eliminated
    #[default]
    Open,
    /// Walls bounce stones back and chip their life
    Bordered,
    /// Open board with a clock and a tie-break
    TimeLimit,
}

impl LevelKind {
    pub const ALL: [LevelKind; 3] = [LevelKind::Open, LevelKind::Bordered, LevelKind::TimeLimit];

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelKind::Open => "open",
            LevelKind::Bordered => "bordered",
            LevelKind::TimeLimit => "time-limit",
        }
    }

    pub fn stones_per_side(&self) -> u8 {
        match self {
            LevelKind::Open => 6,
            LevelKind::Bordered => 4,
            LevelKind::TimeLimit => 5,
        }
    }

    /// Seconds on the clock (timed variant only)
    pub fn time_limit(&self) -> Option<f32> {
        match self {
            LevelKind::TimeLimit => Some(45.0),
            _ => None,
        }
    }

    /// Level played after winning this one
    pub fn next(&self) -> LevelKind {
        match self {
            LevelKind::Open => LevelKind::Bordered,
            LevelKind::Bordered => LevelKind::TimeLimit,
            LevelKind::TimeLimit => LevelKind::Open,
        }
    }

    /// Match setup on `board`: a human on Side One against the CPU
    pub fn config(&self, board: Rect) -> MatchConfig {
        let mut config = MatchConfig::new(board, self.stones_per_side())
            .with_sides(SideSettings::manual("you"), SideSettings::automated("cpu"));
        if *self == LevelKind::Bordered {
            config = config.with_walls(board);
        }
        if let Some(seconds) = self.time_limit() {
            config = config.with_time_limit(seconds);
        }
        config
    }
}

impl fmt::Display for LevelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" | "basic" => Ok(LevelKind::Open),
            "bordered" | "walls" => Ok(LevelKind::Bordered),
            "time-limit" | "timed" | "time" => Ok(LevelKind::TimeLimit),
            other => Err(format!("unknown level '{other}'")),
        }
    }
}
