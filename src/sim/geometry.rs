//! Geometry primitives shared by the physics engine and the opponent
//!
//! Everything here is pure. Vector arithmetic comes straight from `glam`;
//! this module adds the circle, segment and rectangle tests on top.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (origin at the top-left corner, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    /// Length of the diagonal, used to normalize distances
    pub fn diagonal(&self) -> f32 {
        (self.width * self.width + self.height * self.height).sqrt()
    }

    /// Point-in-rectangle test (edges count as inside)
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.x && p.x <= max.x && p.y >= self.y && p.y <= max.y
    }

    /// The four edges in the order top, left, bottom, right
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let top_left = self.min();
        let bottom_right = self.max();
        let top_right = Vec2::new(bottom_right.x, top_left.y);
        let bottom_left = Vec2::new(top_left.x, bottom_right.y);
        [
            (top_left, top_right),
            (top_left, bottom_left),
            (bottom_left, bottom_right),
            (top_right, bottom_right),
        ]
    }
}

/// Two circles overlap when their centers are closer than the sum of radii
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

#[inline]
pub fn point_in_circle(p: Vec2, center: Vec2, radius: f32) -> bool {
    p.distance_squared(center) <= radius * radius
}

/// Closest point to `p` on the segment `a`-`b`
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Does the circle touch the segment `a`-`b`?
pub fn circle_intersects_segment(center: Vec2, radius: f32, a: Vec2, b: Vec2) -> bool {
    point_in_circle(closest_point_on_segment(center, a, b), center, radius)
}

/// Intersection of segments `a0`-`a1` and `b0`-`b1`
///
/// Returns the point when both parametric factors lie in [0, 1]. Parallel
/// (and collinear) segments report no intersection.
pub fn segment_intersection(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<Vec2> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denom = db.y * da.x - db.x * da.y;
    if denom == 0.0 {
        return None;
    }

    let offset = a0 - b0;
    let ua = (db.x * offset.y - db.y * offset.x) / denom;
    let ub = (da.x * offset.y - da.y * offset.x) / denom;

    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(a0 + da * ua)
    } else {
        None
    }
}

/// Reflect velocity off a surface with the given unit normal
///
/// v' = v - 2(v·n)n
#[inline]
pub fn reflect(vel: Vec2, normal: Vec2) -> Vec2 {
    vel - 2.0 * vel.dot(normal) * normal
}
