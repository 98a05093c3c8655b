//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per call, driven by an external clock
//! - Seeded RNG only (formation and starting side)
//! - Stable iteration order (by stone id)
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod formation;
pub mod geometry;
pub mod state;
pub mod tick;

pub use ai::{Candidate, Decision, ai_decide, best_move, rank_candidates};
pub use collision::{CollisionPair, detect_pairs, elastic_response, resolve_pairs};
pub use formation::{generate_formation, spawn_formations};
pub use geometry::{
    Rect, circle_intersects_segment, circles_overlap, point_in_circle, segment_intersection,
};
pub use state::{
    ActionPhase, Contributors, MatchConfig, MatchEvent, MatchState, MatchStatus, Side,
    SideSettings, StatusReport, Stone, StoneId, Stones,
};
pub use tick::{create_match, init, tick};
