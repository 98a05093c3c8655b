//! Fixed timestep simulation tick
//!
//! Core loop that advances a match deterministically: walls, stone pairs,
//! integration, eliminations, the pending launch, then scoring.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::{
    detect_pairs, integrate, resolve_pairs, resolve_wall_collision, separate_overlaps,
};
use super::formation::{min_slot_spacing, spawn_formations};
use super::state::{ActionPhase, MatchConfig, MatchEvent, MatchState, MatchStatus, Side};
use crate::clamp_length;
use crate::consts::*;
use crate::settings::{ConfigError, Tuning};

/// Build a match and place its stones
///
/// Fails if the configuration is invalid or if stones of the tuned radius
/// would overlap in neighboring formation slots.
pub fn create_match(
    config: MatchConfig,
    tuning: Tuning,
    seed: u64,
) -> Result<MatchState, ConfigError> {
    let mut state = MatchState::new(config, tuning, seed)?;

    let spacing = min_slot_spacing(state.config.board);
    let diameter = 2.0 * state.tuning.stone_radius;
    if diameter >= spacing {
        return Err(ConfigError::StoneTooLarge { diameter, spacing });
    }

    init(&mut state);
    Ok(state)
}

/// Place the stones and pick who moves first (Uninitialized -> Ready)
pub fn init(state: &mut MatchState) {
    if state.status != MatchStatus::Uninitialized {
        return;
    }

    let mut rng = Pcg32::seed_from_u64(state.seed);
    spawn_formations(
        &mut state.stones,
        state.config.board,
        state.config.stones_per_side,
        state.tuning.stone_radius,
        &mut rng,
    );

    state.turn = if rng.random_bool(0.5) {
        Side::Two
    } else {
        Side::One
    };
    state.status = MatchStatus::Ready;
    recount_scores(state);

    log::info!(
        "Match ready: {} stones per side, seed {}, {:?} moves first",
        state.config.stones_per_side,
        state.seed,
        state.turn
    );
}

/// Advance the match by one tick
///
/// `dt` only drives the match clock; motion is applied per tick.
pub fn tick(state: &mut MatchState, dt: f32) -> Vec<MatchEvent> {
    let mut events = Vec::new();

    // Don't tick if paused or not set up
    match state.status {
        MatchStatus::Uninitialized | MatchStatus::Paused => return events,
        _ => {}
    }

    state.time_ticks += 1;
    let tuning = state.tuning;
    let max_speed = tuning.max_push_velocity;

    // Walls
    if let Some(walls) = state.config.walls {
        for stone in state.stones.alive_mut() {
            if let Some(event) = resolve_wall_collision(stone, walls, max_speed) {
                events.push(event);
            }
        }
    }

    // Stone pairs, all detected before any is resolved
    let pairs = detect_pairs(state.stones.as_slice(), max_speed);
    if !pairs.is_empty() {
        resolve_pairs(state.stones.as_mut_slice(), &pairs, &tuning, &mut events);
        let max_passes = tuning.max_separation_passes;
        if separate_overlaps(state.stones.as_mut_slice(), max_passes).is_none() {
            log::warn!("Stones still overlap after {} separation passes", max_passes);
        }
    }

    // Motion and eliminations
    let board = state.config.board;
    for stone in state.stones.alive_mut() {
        integrate(stone, &tuning);

        if !board.contains(stone.pos) || stone.life <= 0.0 {
            stone.alive = false;
            stone.vel = glam::Vec2::ZERO;
            log::debug!(
                "Stone {:?} ({:?}) eliminated at {} with {:.1} life",
                stone.id,
                stone.side,
                stone.pos,
                stone.life
            );
            events.push(MatchEvent::Death {
                stone: stone.id,
                side: stone.side,
                point: stone.pos,
                magnitude: DEATH_EFFECT_MAGNITUDE,
            });
        }
    }

    if state.phase == ActionPhase::Committed {
        if let Some(event) = launch_selected(state) {
            events.push(event);
        }
    }

    if state.status == MatchStatus::Ready {
        if let Some(winner) = update_scores(state) {
            events.push(MatchEvent::Finished { winner });
        }
        state.elapsed += dt;
    }

    events
}

/// Launch the selected stone away from the pull point and pass the turn
fn launch_selected(state: &mut MatchState) -> Option<MatchEvent> {
    let max_pull = state.tuning.max_pull_length;
    let max_push = state.tuning.max_push_velocity;
    let aim = state.aim;

    let selected = state.selected.take();
    state.phase = ActionPhase::Idle;
    state.turn = state.turn.opponent();

    let stone = state.stones.get_mut(selected?)?;
    if !stone.alive {
        return None;
    }

    let diff = clamp_length(stone.pos - aim, max_pull);
    let speed = max_push * (diff.length() / max_pull);
    stone.vel = diff.normalize_or_zero() * speed;

    log::debug!(
        "{:?} launches stone {:?} at {:.2} px/tick",
        stone.side,
        stone.id,
        speed
    );
    Some(MatchEvent::Launch {
        stone: stone.id,
        velocity: stone.vel,
    })
}

fn recount_scores(state: &mut MatchState) {
    for side in Side::BOTH {
        state.scores[side.index()] = state.stones.alive_of(side).count() as u8;
    }
}

fn total_life(state: &MatchState, side: Side) -> f32 {
    state.stones.alive_of(side).map(|s| s.life).sum()
}

/// Recount scores, apply the time-limit tie-break, detect the end of the match
///
/// Returns the winner when the match finishes on this tick.
fn update_scores(state: &mut MatchState) -> Option<Side> {
    recount_scores(state);

    let expired = state
        .config
        .time_limit
        .is_some_and(|limit| state.elapsed >= limit);
    if expired {
        let [one, two] = state.scores;
        let loser = if one != two {
            if one > two { Side::Two } else { Side::One }
        } else {
            let life_one = total_life(state, Side::One);
            let life_two = total_life(state, Side::Two);
            if life_one > life_two {
                Side::Two
            } else if life_one < life_two {
                Side::One
            } else {
                state.turn
            }
        };
        log::info!("Time is up: {:?} loses the tie-break", loser);
        state.scores[loser.index()] = 0;
    }

    let [one, two] = state.scores;
    if one != 0 && two != 0 {
        return None;
    }

    let winner = match (one, two) {
        (0, 0) => state.turn.opponent(),
        (0, _) => Side::Two,
        _ => Side::One,
    };
    state.status = MatchStatus::Finished;
    state.winner = Some(winner);
    state.turn = Side::One;
    state.selected = None;
    state.phase = ActionPhase::Idle;

    log::info!(
        "Match finished after {} ticks: {:?} ({}) wins",
        state.time_ticks,
        winner,
        state.side_settings(winner).label
    );
    Some(winner)
}
