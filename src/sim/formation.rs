//! Randomized starting formations
//!
//! Each side gets a random subset of a 3x4 slot grid on its half of the
//! board. Side Two's grid is Side One's mirrored across the centerline.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::geometry::Rect;
use super::state::{Side, StoneId, Stones};
use crate::consts::*;

/// Shuffle exactly `stones_per_side` occupied slots among the 12
pub fn generate_formation<R: Rng + ?Sized>(
    stones_per_side: u8,
    rng: &mut R,
) -> [bool; FORMATION_SLOTS] {
    let mut slots = [false; FORMATION_SLOTS];
    let count = (stones_per_side as usize).min(FORMATION_SLOTS);
    for slot in slots.iter_mut().take(count) {
        *slot = true;
    }
    slots.shuffle(rng);
    slots
}

/// Center of a slot for `side` (column and row are 1-based)
pub fn slot_position(board: Rect, side: Side, column: usize, row: usize) -> Vec2 {
    let offset = board.width * column as f32 * FORMATION_COLUMN_STEP;
    let x = match side {
        Side::One => board.x + offset,
        Side::Two => board.x + board.width - offset,
    };
    let y = board.y + board.height * row as f32 * FORMATION_ROW_STEP;
    Vec2::new(x, y)
}

/// Closest distance between two slot centers on `board`
///
/// Neighboring columns, neighboring rows, or Side One's inner column facing
/// Side Two's across the centerline.
pub fn min_slot_spacing(board: Rect) -> f32 {
    let column = board.width * FORMATION_COLUMN_STEP;
    let row = board.height * FORMATION_ROW_STEP;
    let facing =
        board.width * (1.0 - 2.0 * FORMATION_COLUMNS as f32 * FORMATION_COLUMN_STEP);
    column.min(row).min(facing)
}

/// Index of a slot in a formation array
#[inline]
pub fn slot_index(column: usize, row: usize) -> usize {
    FORMATION_COLUMNS * (row - 1) + (column - 1)
}

/// Place both sides' stones into the registry
///
/// Ids are handed out column by column, then row by row, Side One first.
pub fn spawn_formations<R: Rng + ?Sized>(
    stones: &mut Stones,
    board: Rect,
    stones_per_side: u8,
    radius: f32,
    rng: &mut R,
) -> Vec<StoneId> {
    let formations = [
        generate_formation(stones_per_side, rng),
        generate_formation(stones_per_side, rng),
    ];

    let mut ids = Vec::with_capacity(stones_per_side as usize * 2);
    for column in 1..=FORMATION_COLUMNS {
        for row in 1..=FORMATION_ROWS {
            let slot = slot_index(column, row);
            for side in Side::BOTH {
                if formations[side.index()][slot] {
                    let pos = slot_position(board, side, column, row);
                    ids.extend(stones.spawn(side, &[pos], radius));
                }
            }
        }
    }
    ids
}
