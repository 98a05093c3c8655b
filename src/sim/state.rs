//! Match state and core simulation types
//!
//! `MatchState` exclusively owns the stone registry and every piece of
//! per-match mutable state. Physics and the opponent only borrow it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Rect, point_in_circle};
use crate::consts::*;
use crate::settings::{ConfigError, Tuning};

/// One of the two competing parties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }

    /// Index into per-side arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }
}

/// Lifecycle of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Created but no stones placed yet
    Uninitialized,
    /// Active play
    Ready,
    /// Ticking suspended
    Paused,
    /// One side has no stones left (terminal)
    Finished,
}

/// Progress of the current turn's interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionPhase {
    #[default]
    Idle,
    /// A stone is selected and the pull point is being moved
    Aiming,
    /// Released; the next tick launches the selected stone
    Committed,
}

/// Stable handle to a stone (its index in the registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoneId(pub u32);

impl StoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A stone entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stone {
    pub id: StoneId,
    pub side: Side,
    pub mass: f32,
    pub radius: f32,
    /// 0-100, never increases
    pub life: f32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub alive: bool,
}

impl Stone {
    pub fn new(id: StoneId, side: Side, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            side,
            mass: STONE_MASS,
            radius,
            life: STONE_MAX_LIFE,
            pos,
            vel: Vec2::ZERO,
            alive: true,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.vel != Vec2::ZERO
    }

    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        point_in_circle(p, self.pos, self.radius)
    }

    /// Subtract life, never going below zero
    pub fn take_damage(&mut self, amount: f32) {
        self.life = (self.life - amount.max(0.0)).max(0.0);
    }
}

/// The stone registry
///
/// Stones are never removed, only flagged dead, so `StoneId`s stay valid for
/// the whole match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stones {
    stones: Vec<Stone>,
}

impl Stones {
    pub fn new() -> Self {
        Self { stones: Vec::new() }
    }

    /// Add stones for `side` at the given positions, returning their ids
    pub fn spawn(&mut self, side: Side, positions: &[Vec2], radius: f32) -> Vec<StoneId> {
        positions
            .iter()
            .map(|&pos| {
                let id = StoneId(self.stones.len() as u32);
                self.stones.push(Stone::new(id, side, pos, radius));
                id
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    pub fn get(&self, id: StoneId) -> Option<&Stone> {
        self.stones.get(id.index())
    }

    pub fn get_mut(&mut self, id: StoneId) -> Option<&mut Stone> {
        self.stones.get_mut(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stone> {
        self.stones.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Stone> {
        self.stones.iter_mut()
    }

    pub fn alive(&self) -> impl Iterator<Item = &Stone> {
        self.stones.iter().filter(|s| s.alive)
    }

    pub fn alive_mut(&mut self) -> impl Iterator<Item = &mut Stone> {
        self.stones.iter_mut().filter(|s| s.alive)
    }

    pub fn alive_of(&self, side: Side) -> impl Iterator<Item = &Stone> {
        self.alive().filter(move |s| s.side == side)
    }

    /// First alive stone of `side` whose circle contains `point`
    pub fn stone_at(&self, side: Side, point: Vec2) -> Option<&Stone> {
        self.alive_of(side).find(|s| s.contains_point(point))
    }

    /// True when no alive stone is moving
    pub fn at_rest(&self) -> bool {
        self.alive().all(|s| !s.is_moving())
    }

    pub(crate) fn as_slice(&self) -> &[Stone] {
        &self.stones
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Stone] {
        &mut self.stones
    }
}

/// Per-side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSettings {
    /// Display label ("you", "cpu")
    pub label: String,
    /// Moves are chosen by the opponent search
    pub automated: bool,
}

impl SideSettings {
    pub fn manual(label: &str) -> Self {
        Self {
            label: label.to_string(),
            automated: false,
        }
    }

    pub fn automated(label: &str) -> Self {
        Self {
            label: label.to_string(),
            automated: true,
        }
    }
}

/// Everything needed to set up a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub sides: [SideSettings; 2],
    pub stones_per_side: u8,
    /// Playable area; a stone whose center leaves it is eliminated
    pub board: Rect,
    /// Bouncing walls (bordered variants only)
    pub walls: Option<Rect>,
    /// Seconds until the tie-break is applied
    pub time_limit: Option<f32>,
}

impl MatchConfig {
    /// Human vs CPU on an open board
    pub fn new(board: Rect, stones_per_side: u8) -> Self {
        Self {
            sides: [SideSettings::manual("you"), SideSettings::automated("cpu")],
            stones_per_side,
            board,
            walls: None,
            time_limit: None,
        }
    }

    pub fn with_walls(mut self, walls: Rect) -> Self {
        self.walls = Some(walls);
        self
    }

    pub fn with_time_limit(mut self, seconds: f32) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_sides(mut self, one: SideSettings, two: SideSettings) -> Self {
        self.sides = [one, two];
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stones_per_side == 0 || self.stones_per_side as usize > FORMATION_SLOTS {
            return Err(ConfigError::StoneCount {
                actual: self.stones_per_side,
                max: FORMATION_SLOTS,
            });
        }
        if !(self.board.width > 0.0 && self.board.height > 0.0) {
            return Err(ConfigError::EmptyBoard {
                width: self.board.width,
                height: self.board.height,
            });
        }
        if let Some(walls) = self.walls {
            if !(walls.width > 0.0 && walls.height > 0.0) {
                return Err(ConfigError::EmptyBoard {
                    width: walls.width,
                    height: walls.height,
                });
            }
        }
        if let Some(limit) = self.time_limit {
            if !(limit > 0.0) {
                return Err(ConfigError::TimeLimit(limit));
            }
        }
        Ok(())
    }
}

/// Who contributed to a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contributors {
    Wall(StoneId),
    Pair(StoneId, StoneId),
}

/// Events reported by a tick (consumed by effects, audio, HUD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchEvent {
    Collision {
        point: Vec2,
        magnitude: f32,
        contributors: Contributors,
    },
    Death {
        stone: StoneId,
        side: Side,
        point: Vec2,
        magnitude: f32,
    },
    Launch {
        stone: StoneId,
        velocity: Vec2,
    },
    Finished {
        winner: Side,
    },
}

/// Snapshot of the match for the HUD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: MatchStatus,
    pub scores: [u8; 2],
    pub turn: Side,
    pub phase: ActionPhase,
    pub time_remaining: Option<f32>,
    pub winner: Option<Side>,
}

/// Complete match state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    /// Seed for the formation shuffle and starting side
    pub seed: u64,
    pub config: MatchConfig,
    pub tuning: Tuning,
    pub status: MatchStatus,
    /// Side allowed to act
    pub turn: Side,
    pub phase: ActionPhase,
    /// Alive stones per side
    pub scores: [u8; 2],
    /// Seconds of play so far
    pub elapsed: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub stones: Stones,
    /// Stone being aimed (only while phase is Aiming or Committed)
    pub selected: Option<StoneId>,
    /// Current pull point
    pub aim: Vec2,
    pub winner: Option<Side>,
}

impl MatchState {
    /// Create an uninitialized match; call `init` to place the stones
    pub fn new(config: MatchConfig, tuning: Tuning, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        tuning.validate()?;
        let stones_per_side = config.stones_per_side;

        Ok(Self {
            seed,
            config,
            tuning,
            status: MatchStatus::Uninitialized,
            turn: Side::One,
            phase: ActionPhase::Idle,
            scores: [stones_per_side; 2],
            elapsed: 0.0,
            time_ticks: 0,
            stones: Stones::new(),
            selected: None,
            aim: Vec2::ZERO,
            winner: None,
        })
    }

    #[inline]
    pub fn board(&self) -> Rect {
        self.config.board
    }

    #[inline]
    pub fn walls(&self) -> Option<Rect> {
        self.config.walls
    }

    pub fn side_settings(&self, side: Side) -> &SideSettings {
        &self.config.sides[side.index()]
    }

    pub fn score(&self, side: Side) -> u8 {
        self.scores[side.index()]
    }

    /// True when no alive stone is moving
    pub fn at_rest(&self) -> bool {
        self.stones.at_rest()
    }

    pub fn selected_stone(&self) -> Option<&Stone> {
        self.selected.and_then(|id| self.stones.get(id))
    }

    /// Seconds left on the clock (timed matches only)
    pub fn time_remaining(&self) -> Option<f32> {
        self.config
            .time_limit
            .map(|limit| (limit - self.elapsed).max(0.0))
    }

    /// Select the stone under `point` for aiming (Idle/Aiming -> Aiming)
    pub fn select(&mut self, point: Vec2) -> bool {
        let found = self.stones.stone_at(self.turn, point).map(|s| s.id);
        match found {
            Some(id) => self.select_stone(id),
            None => {
                log::debug!("Select rejected: no {:?} stone at {}", self.turn, point);
                false
            }
        }
    }

    /// Select a stone by id, subject to the same guards as `select`
    pub fn select_stone(&mut self, id: StoneId) -> bool {
        if self.status != MatchStatus::Ready {
            log::debug!("Select rejected: match is {:?}", self.status);
            return false;
        }
        if !matches!(self.phase, ActionPhase::Idle | ActionPhase::Aiming) {
            log::debug!("Select rejected: phase is {:?}", self.phase);
            return false;
        }
        if !self.at_rest() {
            log::debug!("Select rejected: stones still moving");
            return false;
        }
        let Some(stone) = self.stones.get(id) else {
            return false;
        };
        if !stone.alive || stone.side != self.turn {
            log::debug!("Select rejected: {:?} is not a live {:?} stone", id, self.turn);
            return false;
        }

        self.aim = stone.pos;
        self.selected = Some(id);
        self.phase = ActionPhase::Aiming;
        true
    }

    /// Move the pull point (Aiming only)
    pub fn set_aim(&mut self, point: Vec2) -> bool {
        if self.phase != ActionPhase::Aiming {
            return false;
        }
        self.aim = point;
        true
    }

    /// Point the launch will head toward: the pull point mirrored through the stone
    pub fn aim_extension(&self) -> Option<Vec2> {
        self.selected_stone()
            .map(|stone| stone.pos - (self.aim - stone.pos))
    }

    /// Release the pull (Aiming -> Committed)
    pub fn commit(&mut self) -> bool {
        if self.status != MatchStatus::Ready || self.phase != ActionPhase::Aiming {
            log::debug!("Commit rejected: {:?}/{:?}", self.status, self.phase);
            return false;
        }
        self.phase = ActionPhase::Committed;
        true
    }

    /// Drop the current selection without launching
    pub fn cancel_aim(&mut self) -> bool {
        if self.phase != ActionPhase::Aiming {
            return false;
        }
        self.selected = None;
        self.phase = ActionPhase::Idle;
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.status != MatchStatus::Ready {
            return false;
        }
        self.status = MatchStatus::Paused;
        log::info!("Match paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.status != MatchStatus::Paused {
            return false;
        }
        self.status = MatchStatus::Ready;
        log::info!("Match resumed");
        true
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            status: self.status,
            scores: self.scores,
            turn: self.turn,
            phase: self.phase,
            time_remaining: self.time_remaining(),
            winner: self.winner,
        }
    }
}
