//! CPU opponent
//!
//! Scores every (own stone, enemy stone) pair by distance, obstruction and
//! the life of both stones, then aims the best actor straight at its target.
//! The search is read-only and uses no randomness, so identical boards give
//! identical decisions.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{circle_intersects_segment, segment_intersection};
use super::state::{ActionPhase, MatchState, MatchStatus, Side, Stone, StoneId};
use crate::{clamp_length, rotate};

/// Penalty when the shot would hit one of our own stones
const HITS_OWN_PENALTY: f32 = 1.0;
/// Penalty when anything is in the way
const RICOCHET_PENALTY: f32 = 0.5;
/// Penalty for risking an almost dead actor
const LOW_LIFE_PENALTY: f32 = 0.5;
/// Bonus for a target that one more hit should finish
const FINISHING_BONUS: f32 = 1.0;

/// A scored (actor, target) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub actor: StoneId,
    pub target: StoneId,
    pub ricochets: bool,
    pub hits_own: bool,
    pub score: f32,
}

/// The move the opponent settled on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub actor: StoneId,
    pub target: StoneId,
    /// Pull point to feed into `set_aim`
    pub aim: Vec2,
    pub score: f32,
}

/// The three lines a shot sweeps: both radius-offset rails and the center line
pub fn shot_lines(actor: &Stone, target: &Stone) -> [(Vec2, Vec2); 3] {
    let axis = (target.pos - actor.pos).normalize_or_zero();
    let side = rotate(axis, FRAC_PI_2);
    [
        (
            actor.pos + side * actor.radius,
            target.pos + side * target.radius,
        ),
        (
            actor.pos - side * actor.radius,
            target.pos - side * target.radius,
        ),
        (actor.pos, target.pos),
    ]
}

/// Check a pair for obstructions and score it
pub fn evaluate(
    state: &MatchState,
    actor: &Stone,
    target: &Stone,
    board_diagonal: f32,
) -> Candidate {
    let lines = shot_lines(actor, target);
    let mut ricochets = false;
    let mut hits_own = false;

    for stone in state.stones.alive() {
        if stone.id == actor.id || stone.id == target.id {
            continue;
        }
        let blocks = lines
            .iter()
            .any(|&(a, b)| circle_intersects_segment(stone.pos, stone.radius, a, b));
        if blocks {
            ricochets = true;
            hits_own |= stone.side == actor.side;
        }
        if ricochets && hits_own {
            break;
        }
    }

    let tuning = &state.tuning;
    let mut score = -actor.pos.distance(target.pos) / board_diagonal;
    if hits_own {
        score -= HITS_OWN_PENALTY;
    }
    if ricochets {
        score -= RICOCHET_PENALTY;
    }
    if actor.life <= tuning.low_life_threshold {
        score -= LOW_LIFE_PENALTY;
    }
    if target.life <= tuning.finishing_threshold {
        score += FINISHING_BONUS;
    }

    Candidate {
        actor: actor.id,
        target: target.id,
        ricochets,
        hits_own,
        score,
    }
}

/// Every pair for `side`, best first
///
/// Ties keep enumeration order (actors, then targets, by id).
pub fn rank_candidates(state: &MatchState, side: Side, board_diagonal: f32) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = state
        .stones
        .alive_of(side)
        .flat_map(|actor| {
            state
                .stones
                .alive_of(side.opponent())
                .map(move |target| evaluate(state, actor, target, board_diagonal))
        })
        .collect();
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

/// Pull point that launches `actor` toward `target`
///
/// The pull is the actor-to-target vector, clamped and reversed. A point off
/// the board is pulled back to where the pull line crosses the board edge.
pub fn aim_point(state: &MatchState, actor: &Stone, target: &Stone) -> Vec2 {
    let pull = clamp_length(target.pos - actor.pos, state.tuning.max_pull_length);
    let aim = actor.pos - pull;

    let board = state.board();
    if board.contains(aim) {
        return aim;
    }
    board
        .edges()
        .iter()
        .find_map(|&(a, b)| segment_intersection(a, b, aim, actor.pos))
        .unwrap_or(aim)
}

/// Best move for `side`, ignoring whose turn it is
pub fn best_move(state: &MatchState, side: Side, board_diagonal: f32) -> Option<Decision> {
    let best = rank_candidates(state, side, board_diagonal)
        .into_iter()
        .next()?;
    let actor = state.stones.get(best.actor)?;
    let target = state.stones.get(best.target)?;

    log::debug!(
        "{:?} picks {:?} -> {:?} (score {:.3}, ricochets {}, hits own {})",
        side,
        best.actor,
        best.target,
        best.score,
        best.ricochets,
        best.hits_own
    );

    Some(Decision {
        actor: best.actor,
        target: best.target,
        aim: aim_point(state, actor, target),
        score: best.score,
    })
}

/// Decide the automated side's move
///
/// Only answers when the side to move is automated, the match is running,
/// nothing is being aimed and every stone is at rest.
pub fn ai_decide(state: &MatchState, board_diagonal: f32) -> Option<Decision> {
    if state.status != MatchStatus::Ready
        || state.phase != ActionPhase::Idle
        || !state.side_settings(state.turn).automated
        || !state.at_rest()
    {
        return None;
    }
    best_move(state, state.turn, board_diagonal)
}

impl MatchState {
    /// Play a decision as select, aim and release
    pub fn apply_decision(&mut self, decision: &Decision) -> bool {
        self.select_stone(decision.actor) && self.set_aim(decision.aim) && self.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::geometry::Rect;
    use crate::sim::state::{MatchConfig, SideSettings};

    fn board() -> Rect {
        Rect::from_size(1000.0, 500.0)
    }

    fn cpu_state(one: &[Vec2], two: &[Vec2]) -> MatchState {
        let config = MatchConfig::new(board(), 1)
            .with_sides(SideSettings::manual("you"), SideSettings::automated("cpu"));
        let mut state = MatchState::new(config, Tuning::for_board(1000.0, 500.0), 9).unwrap();
        let radius = state.tuning.stone_radius;
        state.stones.spawn(Side::One, one, radius);
        state.stones.spawn(Side::Two, two, radius);
        state.status = MatchStatus::Ready;
        state.turn = Side::Two;
        state
    }

    #[test]
    fn test_shot_lines_are_offset_by_radius() {
        let state = cpu_state(&[Vec2::new(100.0, 250.0)], &[Vec2::new(500.0, 250.0)]);
        let actor = state.stones.get(StoneId(1)).unwrap();
        let target = state.stones.get(StoneId(0)).unwrap();
        let [top, bottom, center] = shot_lines(actor, target);
        let r = actor.radius;
        assert!((top.0 - Vec2::new(500.0, 250.0 - r)).length() < 1e-3);
        assert!((bottom.0 - Vec2::new(500.0, 250.0 + r)).length() < 1e-3);
        assert_eq!(center, (actor.pos, target.pos));
    }

    #[test]
    fn test_clear_shot_has_no_flags() {
        let state = cpu_state(&[Vec2::new(200.0, 250.0)], &[Vec2::new(700.0, 250.0)]);
        let candidates = rank_candidates(&state, Side::Two, board().diagonal());
        assert_eq!(candidates.len(), 1);
        let c = candidates[0];
        assert!(!c.ricochets);
        assert!(!c.hits_own);
        assert!((c.score + 500.0 / board().diagonal()).abs() < 1e-5);
    }

    #[test]
    fn test_own_stone_in_the_way() {
        // CPU actor at 800, own blocker at 500, target at 200
        let state = cpu_state(
            &[Vec2::new(200.0, 250.0)],
            &[Vec2::new(800.0, 250.0), Vec2::new(500.0, 260.0)],
        );
        let actor = state.stones.get(StoneId(1)).unwrap();
        let target = state.stones.get(StoneId(0)).unwrap();
        let c = evaluate(&state, actor, target, board().diagonal());
        assert!(c.ricochets);
        assert!(c.hits_own);
    }

    #[test]
    fn test_prefers_unobstructed_target() {
        // Two targets 300 away on either side of the actor; a third enemy
        // stone clips the lower rail of the shot at the left one.
        let state = cpu_state(
            &[
                Vec2::new(200.0, 250.0),
                Vec2::new(800.0, 250.0),
                Vec2::new(260.0, 300.0),
            ],
            &[Vec2::new(500.0, 250.0)],
        );
        let candidates = rank_candidates(&state, Side::Two, board().diagonal());
        let position = |target| {
            candidates
                .iter()
                .position(|c| c.target == StoneId(target))
                .unwrap()
        };

        let blocked = candidates[position(0)];
        assert!(blocked.ricochets);
        assert!(!blocked.hits_own);

        let clear = candidates[position(1)];
        assert!(!clear.ricochets);
        assert!(!clear.hits_own);

        assert!(position(1) < position(0));
        assert!((clear.score - blocked.score - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_risk_and_finishing_adjustments() {
        let mut state = cpu_state(&[Vec2::new(200.0, 250.0)], &[Vec2::new(700.0, 250.0)]);
        let base = rank_candidates(&state, Side::Two, 1000.0)[0].score;

        state.stones.get_mut(StoneId(0)).unwrap().life = 10.0;
        let finishing = rank_candidates(&state, Side::Two, 1000.0)[0].score;
        assert!((finishing - base - 1.0).abs() < 1e-5);

        state.stones.get_mut(StoneId(1)).unwrap().life = 5.0;
        let risky = rank_candidates(&state, Side::Two, 1000.0)[0].score;
        assert!((risky - finishing + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_aim_point_is_clamped_and_reversed() {
        let state = cpu_state(&[Vec2::new(200.0, 250.0)], &[Vec2::new(700.0, 250.0)]);
        let decision = best_move(&state, Side::Two, board().diagonal()).unwrap();
        let max_pull = state.tuning.max_pull_length;
        assert!((decision.aim - Vec2::new(700.0 + max_pull, 250.0)).length() < 1e-3);
    }

    #[test]
    fn test_aim_point_stays_on_board() {
        // Actor hugging the right edge, pull would land off the board
        let state = cpu_state(&[Vec2::new(200.0, 250.0)], &[Vec2::new(960.0, 250.0)]);
        let decision = best_move(&state, Side::Two, board().diagonal()).unwrap();
        assert!((decision.aim - Vec2::new(1000.0, 250.0)).length() < 1e-3);
    }

    #[test]
    fn test_no_targets_means_no_move() {
        let state = cpu_state(&[], &[Vec2::new(700.0, 250.0)]);
        assert!(best_move(&state, Side::Two, board().diagonal()).is_none());
    }

    #[test]
    fn test_ai_decide_guards() {
        let mut state = cpu_state(&[Vec2::new(200.0, 250.0)], &[Vec2::new(700.0, 250.0)]);
        assert!(ai_decide(&state, board().diagonal()).is_some());

        // Manual side to move
        state.turn = Side::One;
        assert!(ai_decide(&state, board().diagonal()).is_none());
        state.turn = Side::Two;

        // Something still moving
        state.stones.get_mut(StoneId(0)).unwrap().vel = Vec2::new(1.0, 0.0);
        assert!(ai_decide(&state, board().diagonal()).is_none());
        state.stones.get_mut(StoneId(0)).unwrap().vel = Vec2::ZERO;

        state.status = MatchStatus::Finished;
        assert!(ai_decide(&state, board().diagonal()).is_none());
    }

    #[test]
    fn test_ai_decide_is_repeatable() {
        let state = cpu_state(
            &[
                Vec2::new(200.0, 250.0),
                Vec2::new(800.0, 250.0),
                Vec2::new(260.0, 300.0),
            ],
            &[Vec2::new(500.0, 250.0), Vec2::new(600.0, 100.0)],
        );
        let first = ai_decide(&state, board().diagonal());
        assert!(first.is_some());
        assert_eq!(ai_decide(&state, board().diagonal()), first);
        assert_eq!(ai_decide(&state.clone(), board().diagonal()), first);
    }

    #[test]
    fn test_apply_decision_commits() {
        let mut state = cpu_state(&[Vec2::new(200.0, 250.0)], &[Vec2::new(700.0, 250.0)]);
        let decision = ai_decide(&state, board().diagonal()).unwrap();
        assert!(state.apply_decision(&decision));
        assert_eq!(state.phase, ActionPhase::Committed);
        assert_eq!(state.selected, Some(decision.actor));
        assert_eq!(state.aim, decision.aim);
    }
}
