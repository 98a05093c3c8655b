//! Collision detection and response
//!
//! Two kinds of contact: a stone crossing a wall of a bordered board, and two
//! stones overlapping. Pairs are detected from one snapshot of positions and
//! resolved together so the result does not depend on pair order.

use glam::Vec2;

use super::geometry::{Rect, circles_overlap, reflect};
use super::state::{Contributors, MatchEvent, Stone, StoneId};
use crate::consts::*;
use crate::settings::Tuning;

/// Two overlapping stones found during detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPair {
    pub a: StoneId,
    pub b: StoneId,
    /// Midpoint of the two centers
    pub point: Vec2,
    /// Effect strength from the combined pre-collision velocity
    pub magnitude: f32,
}

/// New velocities of two stones after an elastic collision
///
/// Velocities are split along the unit normal (b -> a) and unit tangent. The
/// tangential parts are kept; the normal parts follow the 1D elastic formula
/// for unequal masses.
///
/// # Panics
///
/// Panics if the two centers coincide. Placement and penetration resolution
/// keep stones apart, so that is a logic error.
pub fn elastic_response(a: &Stone, b: &Stone) -> (Vec2, Vec2) {
    let normal = unit_normal(a.pos, b.pos);
    let tangent = normal.perp();

    let van = normal.dot(a.vel);
    let vbn = normal.dot(b.vel);
    let vat = tangent.dot(a.vel);
    let vbt = tangent.dot(b.vel);

    let masses = a.mass + b.mass;
    let vanp = (van * (a.mass - b.mass) + 2.0 * b.mass * vbn) / masses;
    let vbnp = (vbn * (b.mass - a.mass) + 2.0 * a.mass * van) / masses;

    (normal * vanp + tangent * vat, normal * vbnp + tangent * vbt)
}

/// Displacement of `a` that removes half of the overlap with `b`
///
/// `b` moves by the negated vector. Returns zero when the stones don't overlap.
pub fn penetration_push(a: &Stone, b: &Stone) -> Vec2 {
    let depth = a.radius + b.radius - a.pos.distance(b.pos);
    if depth <= 0.0 {
        return Vec2::ZERO;
    }
    unit_normal(a.pos, b.pos) * ((depth + CONTACT_SLOP) / 2.0)
}

/// Damage dealt by an impact: (taken by `a`, taken by `b`)
///
/// The faster stone deals the full amount and takes a fifth of it. On equal
/// speeds `a` counts as the slower one.
pub fn impact_damage(a: &Stone, b: &Stone, max_speed: f32) -> (f32, f32) {
    let speed_diff = (a.vel - b.vel).length();
    let amount = speed_diff.clamp(0.0, max_speed) * IMPACT_DAMAGE_SCALE;
    if a.speed() > b.speed() {
        (amount * RECOIL_DAMAGE_FACTOR, amount)
    } else {
        (amount, amount * RECOIL_DAMAGE_FACTOR)
    }
}

fn unit_normal(a: Vec2, b: Vec2) -> Vec2 {
    let diff = a - b;
    let len = diff.length();
    assert!(
        len > f32::EPSILON,
        "stones at {a} and {b} coincide; collision normal is undefined"
    );
    diff / len
}

/// Find every overlapping pair of alive stones
pub fn detect_pairs(stones: &[Stone], max_speed: f32) -> Vec<CollisionPair> {
    let mut pairs = Vec::new();
    for (i, a) in stones.iter().enumerate() {
        if !a.alive {
            continue;
        }
        for b in stones[i + 1..].iter().filter(|b| b.alive) {
            if circles_overlap(a.pos, a.radius, b.pos, b.radius) {
                pairs.push(CollisionPair {
                    a: a.id,
                    b: b.id,
                    point: (a.pos + b.pos) * 0.5,
                    magnitude: 2.0 * (a.vel + b.vel).length() / max_speed,
                });
            }
        }
    }
    pairs
}

/// Resolve a batch of pairs detected in the same tick
///
/// Velocity changes, damage and pushes are all computed from the stones as
/// they were before the pass and accumulated, then applied at once.
pub fn resolve_pairs(
    stones: &mut [Stone],
    pairs: &[CollisionPair],
    tuning: &Tuning,
    events: &mut Vec<MatchEvent>,
) {
    if pairs.is_empty() {
        return;
    }

    let mut delta_vel = vec![Vec2::ZERO; stones.len()];
    let mut delta_pos = vec![Vec2::ZERO; stones.len()];
    let mut damage = vec![0.0f32; stones.len()];

    for pair in pairs {
        let (a, b) = (&stones[pair.a.index()], &stones[pair.b.index()]);

        let push = penetration_push(a, b);
        delta_pos[pair.a.index()] += push;
        delta_pos[pair.b.index()] -= push;

        let (va, vb) = elastic_response(a, b);
        delta_vel[pair.a.index()] += va - a.vel;
        delta_vel[pair.b.index()] += vb - b.vel;

        let (damage_a, damage_b) = impact_damage(a, b, tuning.max_push_velocity);
        damage[pair.a.index()] += damage_a;
        damage[pair.b.index()] += damage_b;

        log::trace!(
            "Stones {:?}/{:?} collide at {} (damage {:.1}/{:.1})",
            pair.a,
            pair.b,
            pair.point,
            damage_a,
            damage_b
        );
        events.push(MatchEvent::Collision {
            point: pair.point,
            magnitude: pair.magnitude,
            contributors: Contributors::Pair(pair.a, pair.b),
        });
    }

    for (i, stone) in stones.iter_mut().enumerate() {
        if !stone.alive {
            continue;
        }
        stone.pos += delta_pos[i];
        stone.vel += delta_vel[i];
        stone.take_damage(damage[i]);
    }
}

/// Half-overlap pushes for every overlapping pair, or `None` when nothing overlaps
fn overlap_pushes(stones: &[Stone]) -> Option<Vec<Vec2>> {
    let mut delta_pos = vec![Vec2::ZERO; stones.len()];
    let mut moved = false;
    for (i, a) in stones.iter().enumerate() {
        if !a.alive {
            continue;
        }
        for b in stones[i + 1..].iter().filter(|b| b.alive) {
            if circles_overlap(a.pos, a.radius, b.pos, b.radius) {
                let push = penetration_push(a, b);
                delta_pos[a.id.index()] += push;
                delta_pos[b.id.index()] -= push;
                moved = true;
            }
        }
    }
    moved.then_some(delta_pos)
}

/// Position-only passes that clear overlaps left by stacked pushes
///
/// Runs until no two alive stones overlap. Returns the number of passes that
/// moved something, or `None` if stones still overlap after `max_passes`.
pub fn separate_overlaps(stones: &mut [Stone], max_passes: u32) -> Option<u32> {
    let mut passes = 0;
    while let Some(delta_pos) = overlap_pushes(stones) {
        if passes == max_passes {
            return None;
        }
        for (stone, delta) in stones.iter_mut().zip(delta_pos) {
            stone.pos += delta;
        }
        passes += 1;
    }
    Some(passes)
}

/// Bounce a stone off the walls
///
/// Each violated axis is pushed back by the penetration depth and the velocity
/// reflected off that wall. Returns the collision event if any wall was hit.
pub fn resolve_wall_collision(stone: &mut Stone, walls: Rect, max_speed: f32) -> Option<MatchEvent> {
    let min = walls.min();
    let max = walls.max();
    let mut contact = None;

    if stone.pos.x - stone.radius < min.x {
        stone.pos.x += min.x - (stone.pos.x - stone.radius);
        stone.vel = reflect(stone.vel, Vec2::X);
        contact = Some(Vec2::new(min.x, stone.pos.y));
    } else if stone.pos.x + stone.radius > max.x {
        stone.pos.x -= stone.pos.x + stone.radius - max.x;
        stone.vel = reflect(stone.vel, Vec2::NEG_X);
        contact = Some(Vec2::new(max.x, stone.pos.y));
    }

    if stone.pos.y - stone.radius < min.y {
        stone.pos.y += min.y - (stone.pos.y - stone.radius);
        stone.vel = reflect(stone.vel, Vec2::Y);
        contact = Some(Vec2::new(stone.pos.x, min.y));
    } else if stone.pos.y + stone.radius > max.y {
        stone.pos.y -= stone.pos.y + stone.radius - max.y;
        stone.vel = reflect(stone.vel, Vec2::NEG_Y);
        contact = Some(Vec2::new(stone.pos.x, max.y));
    }

    let point = contact?;
    let speed = stone.speed();
    let amount = speed.clamp(0.0, max_speed) * IMPACT_DAMAGE_SCALE;
    stone.take_damage(amount * WALL_DAMAGE_FACTOR);

    Some(MatchEvent::Collision {
        point,
        magnitude: 2.0 * speed / max_speed,
        contributors: Contributors::Wall(stone.id),
    })
}

/// Advance position by one tick, then damp the velocity
pub fn integrate(stone: &mut Stone, tuning: &Tuning) {
    stone.pos += stone.vel;
    stone.vel *= tuning.velocity_damping;
    if stone.vel.length() < tuning.stop_threshold {
        stone.vel = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Side;

    fn stone(id: u32, pos: Vec2, vel: Vec2, radius: f32) -> Stone {
        let mut s = Stone::new(StoneId(id), Side::One, pos, radius);
        s.vel = vel;
        s
    }

    fn tuning() -> Tuning {
        Tuning {
            max_push_velocity: 15.0,
            ..Tuning::for_board(1280.0, 720.0)
        }
    }

    #[test]
    fn test_head_on_equal_mass_swaps_normal_velocity() {
        let a = stone(0, Vec2::new(0.0, 0.0), Vec2::new(5.0, 3.0), 12.0);
        let b = stone(1, Vec2::new(20.0, 0.0), Vec2::new(-5.0, -2.0), 12.0);
        let (va, vb) = elastic_response(&a, &b);

        // Normal (x) components swap, tangential (y) components stay
        assert!((va.x + 5.0).abs() < 1e-5);
        assert!((vb.x - 5.0).abs() < 1e-5);
        assert!((va.y - 3.0).abs() < 1e-5);
        assert!((vb.y + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_moving_hits_stationary() {
        let a = stone(0, Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 12.0);
        let b = stone(1, Vec2::new(20.0, 0.0), Vec2::ZERO, 12.0);
        let (va, vb) = elastic_response(&a, &b);
        assert!(va.x.abs() < 1e-5);
        assert!((vb.x - 10.0).abs() < 1e-5);
        assert!(va.y.abs() < 1e-5 && vb.y.abs() < 1e-5);
    }

    #[test]
    fn test_unequal_masses() {
        let mut a = stone(0, Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 12.0);
        a.mass = 3.0;
        let b = stone(1, Vec2::new(20.0, 0.0), Vec2::ZERO, 12.0);
        let (va, vb) = elastic_response(&a, &b);
        // (10 * (3 - 1)) / 4 and (2 * 3 * 10) / 4
        assert!((va.x - 5.0).abs() < 1e-4);
        assert!((vb.x - 15.0).abs() < 1e-4);
    }

    #[test]
    #[should_panic(expected = "coincide")]
    fn test_coincident_stones_panic() {
        let a = stone(0, Vec2::new(5.0, 5.0), Vec2::ZERO, 10.0);
        let b = stone(1, Vec2::new(5.0, 5.0), Vec2::ZERO, 10.0);
        let _ = elastic_response(&a, &b);
    }

    #[test]
    fn test_penetration_push_separates() {
        let a = stone(0, Vec2::new(0.0, 0.0), Vec2::ZERO, 12.0);
        let b = stone(1, Vec2::new(20.0, 0.0), Vec2::ZERO, 12.0);
        let push = penetration_push(&a, &b);
        // 4 units of overlap, half each way (toward -x for a)
        assert!((push.x + 2.0).abs() < 1e-2);
        let new_a = a.pos + push;
        let new_b = b.pos - push;
        assert!(!circles_overlap(new_a, 12.0, new_b, 12.0));
    }

    #[test]
    fn test_impact_damage_faster_deals_full() {
        let tuning = tuning();
        let a = stone(0, Vec2::ZERO, Vec2::new(10.0, 0.0), 12.0);
        let b = stone(1, Vec2::new(20.0, 0.0), Vec2::ZERO, 12.0);
        let (da, db) = impact_damage(&a, &b, tuning.max_push_velocity);
        assert!((db - 20.0).abs() < 1e-4);
        assert!((da - 4.0).abs() < 1e-4);

        // Speed difference is clamped by the max push velocity
        let fast = stone(0, Vec2::ZERO, Vec2::new(40.0, 0.0), 12.0);
        let (_, db) = impact_damage(&fast, &b, tuning.max_push_velocity);
        assert!((db - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_resolve_pairs_scenario() {
        let tuning = tuning();
        let mut stones = vec![
            stone(0, Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 12.0),
            stone(1, Vec2::new(20.0, 0.0), Vec2::ZERO, 12.0),
        ];
        let pairs = detect_pairs(&stones, tuning.max_push_velocity);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].point, Vec2::new(10.0, 0.0));

        let mut events = Vec::new();
        resolve_pairs(&mut stones, &pairs, &tuning, &mut events);

        assert!(stones[0].vel.x.abs() < 1e-4);
        assert!((stones[1].vel.x - 10.0).abs() < 1e-4);
        assert!(!circles_overlap(stones[0].pos, 12.0, stones[1].pos, 12.0));
        assert!((stones[1].life - 80.0).abs() < 1e-4);
        assert!((stones[0].life - 96.0).abs() < 1e-4);
        assert!(matches!(
            events.as_slice(),
            [MatchEvent::Collision {
                contributors: Contributors::Pair(StoneId(0), StoneId(1)),
                ..
            }]
        ));
    }

    #[test]
    fn test_resolve_pairs_is_order_independent() {
        let tuning = tuning();
        let base = vec![
            stone(0, Vec2::new(0.0, 0.0), Vec2::new(6.0, 1.0), 12.0),
            stone(1, Vec2::new(20.0, 2.0), Vec2::new(-1.0, 0.0), 12.0),
            stone(2, Vec2::new(38.0, -3.0), Vec2::new(-4.0, 0.5), 12.0),
        ];
        let pairs = detect_pairs(&base, tuning.max_push_velocity);
        assert_eq!(pairs.len(), 2);

        let mut forward = base.clone();
        resolve_pairs(&mut forward, &pairs, &tuning, &mut Vec::new());

        let reversed_pairs: Vec<_> = pairs.iter().rev().copied().collect();
        let mut backward = base.clone();
        resolve_pairs(&mut backward, &reversed_pairs, &tuning, &mut Vec::new());

        for (f, b) in forward.iter().zip(&backward) {
            assert!((f.pos - b.pos).length() < 1e-4);
            assert!((f.vel - b.vel).length() < 1e-4);
            assert!((f.life - b.life).abs() < 1e-4);
        }
    }

    #[test]
    fn test_separate_overlaps_clears_chain() {
        let mut stones = vec![
            stone(0, Vec2::new(0.0, 0.0), Vec2::ZERO, 12.0),
            stone(1, Vec2::new(18.0, 0.0), Vec2::ZERO, 12.0),
            stone(2, Vec2::new(36.0, 0.0), Vec2::ZERO, 12.0),
        ];
        assert!(separate_overlaps(&mut stones, 32).is_some_and(|passes| passes > 0));
        for i in 0..stones.len() {
            for j in i + 1..stones.len() {
                assert!(!circles_overlap(
                    stones[i].pos,
                    stones[i].radius,
                    stones[j].pos,
                    stones[j].radius
                ));
            }
        }
    }

    #[test]
    fn test_separate_overlaps_clears_dense_cluster() {
        // 5x5 grid at 1.1 radii spacing: every neighbor overlaps heavily
        let radius = 12.0;
        let mut stones: Vec<Stone> = (0..25u32)
            .map(|i| {
                let pos = Vec2::new((i % 5) as f32, (i / 5) as f32) * radius * 1.1;
                stone(i, pos + Vec2::splat(500.0), Vec2::ZERO, radius)
            })
            .collect();

        assert!(separate_overlaps(&mut stones, 1024).is_some());
        assert!(overlap_pushes(&stones).is_none());
    }

    #[test]
    fn test_separate_overlaps_reports_cap() {
        let mut stones: Vec<Stone> = (0..9u32)
            .map(|i| {
                let pos = Vec2::new((i % 3) as f32, (i / 3) as f32) * 10.0;
                stone(i, pos, Vec2::ZERO, 12.0)
            })
            .collect();
        assert_eq!(separate_overlaps(&mut stones, 1), None);
        assert_eq!(separate_overlaps(&mut stones.clone(), 0), None);

        let mut apart = vec![
            stone(0, Vec2::ZERO, Vec2::ZERO, 12.0),
            stone(1, Vec2::new(30.0, 0.0), Vec2::ZERO, 12.0),
        ];
        assert_eq!(separate_overlaps(&mut apart, 0), Some(0));
    }

    #[test]
    fn test_wall_collision_reflects_and_damages() {
        let walls = Rect::from_size(500.0, 500.0);
        let mut s = stone(0, Vec2::new(495.0, 250.0), Vec2::new(10.0, 0.0), 12.0);
        let event = resolve_wall_collision(&mut s, walls, 15.0).unwrap();

        assert_eq!(s.vel, Vec2::new(-10.0, 0.0));
        assert!((s.pos.x - 488.0).abs() < 1e-4);
        assert!((s.life - 94.0).abs() < 1e-4);
        match event {
            MatchEvent::Collision {
                point,
                magnitude,
                contributors,
            } => {
                assert_eq!(point, Vec2::new(500.0, 250.0));
                assert!((magnitude - 20.0 / 15.0).abs() < 1e-5);
                assert_eq!(contributors, Contributors::Wall(StoneId(0)));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_wall_damage_is_clamped() {
        let walls = Rect::from_size(500.0, 500.0);
        let mut s = stone(0, Vec2::new(5.0, 250.0), Vec2::new(-10.0, 0.0), 12.0);
        resolve_wall_collision(&mut s, walls, 8.0).unwrap();
        assert!((s.pos.x - 12.0).abs() < 1e-4);
        assert!((s.life - (100.0 - 8.0 * 2.0 * 0.3)).abs() < 1e-4);
    }

    #[test]
    fn test_no_wall_contact() {
        let walls = Rect::from_size(500.0, 500.0);
        let mut s = stone(0, Vec2::new(250.0, 250.0), Vec2::new(10.0, 0.0), 12.0);
        assert!(resolve_wall_collision(&mut s, walls, 15.0).is_none());
        assert_eq!(s.life, 100.0);
    }

    #[test]
    fn test_integrate_damps_and_stops() {
        let tuning = Tuning {
            velocity_damping: 0.5,
            stop_threshold: 1.0,
            ..Tuning::default()
        };
        let mut s = stone(0, Vec2::ZERO, Vec2::new(4.0, 0.0), 12.0);
        integrate(&mut s, &tuning);
        assert_eq!(s.pos, Vec2::new(4.0, 0.0));
        assert_eq!(s.vel, Vec2::new(2.0, 0.0));
        integrate(&mut s, &tuning);
        integrate(&mut s, &tuning);
        assert_eq!(s.vel, Vec2::ZERO);
        assert_eq!(s.pos, Vec2::new(7.0, 0.0));
    }
}
