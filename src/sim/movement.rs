//! Movement and collision against the tile grid
//!
//! Both actors move through `try_move`. A body is a tile-sized square whose
//! top-left corner is its continuous position; its logical tile is derived
//! from that position after every call.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::{Grid, TileCoord};
use crate::consts::{OVERLAP_EPSILON, TILE_SIZE};
use crate::{tile_of, tile_origin};

/// What happens when the full move is obstructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Retry each axis on its own, then nudge toward the tile grid if both fail
    Slide,
    /// Give up for this tick
    Stop,
}

/// Position state of a mobile actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner in pixels (authoritative)
    pub pos: Vec2,
    /// Derived from `pos`
    pub tile: TileCoord,
}

impl Body {
    /// Body aligned exactly on a tile
    pub fn at_tile(tile: TileCoord) -> Self {
        Self {
            pos: tile_origin(tile),
            tile,
        }
    }

    #[inline]
    pub fn sync_tile(&mut self) {
        self.tile = tile_of(self.pos);
    }

    /// Whether the body's box overlaps the given tile
    pub fn overlaps_tile(&self, tile: TileCoord) -> bool {
        let other = tile_origin(tile);
        let dx = TILE_SIZE - (self.pos.x - other.x).abs();
        let dy = TILE_SIZE - (self.pos.y - other.y).abs();
        dx > OVERLAP_EPSILON && dy > OVERLAP_EPSILON
    }
}

/// Result of a movement attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Actual displacement applied this call
    pub displacement: Vec2,
    /// The combined move was rejected
    pub obstructed: bool,
    /// A centering correction was applied instead of the requested move
    pub nudged: bool,
}

impl MoveOutcome {
    fn idle() -> Self {
        Self {
            displacement: Vec2::ZERO,
            obstructed: false,
            nudged: false,
        }
    }

    /// Nothing moved even though movement was requested
    pub fn stalled(&self) -> bool {
        self.obstructed && self.displacement == Vec2::ZERO
    }
}

/// Tiles overlapped by a body box at `pos` (up to 2x2)
fn covered_tiles(pos: Vec2) -> impl Iterator<Item = TileCoord> {
    let min = tile_of(pos + Vec2::splat(OVERLAP_EPSILON));
    let max = tile_of(pos + Vec2::splat(TILE_SIZE - OVERLAP_EPSILON));
    (min.row..=max.row)
        .flat_map(move |row| (min.col..=max.col).map(move |col| TileCoord::new(col, row)))
}

/// Whether a body box at `pos` would overlap any blocking tile
pub fn box_blocked(grid: &Grid, pos: Vec2) -> bool {
    covered_tiles(pos).any(|tile| grid.is_blocking(tile))
}

/// Move a body by `velocity * dt`, resolving collisions against the grid.
///
/// With `Slide`, an obstructed move is retried one axis at a time (X first),
/// so a body pushed diagonally into a wall keeps sliding along it. If neither
/// axis moves, the body is nudged toward its tile's aligned position on the
/// axis perpendicular to the attempted motion, at most one tick of speed.
pub fn try_move(
    grid: &Grid,
    body: &mut Body,
    velocity: Vec2,
    dt: f32,
    policy: CollisionPolicy,
) -> MoveOutcome {
    if velocity == Vec2::ZERO {
        return MoveOutcome::idle();
    }

    let start = body.pos;
    let step = velocity * dt;
    let candidate = start + step;

    if !box_blocked(grid, candidate) {
        body.pos = candidate;
        body.sync_tile();
        return MoveOutcome {
            displacement: step,
            obstructed: false,
            nudged: false,
        };
    }

    if policy == CollisionPolicy::Stop {
        return MoveOutcome {
            displacement: Vec2::ZERO,
            obstructed: true,
            nudged: false,
        };
    }

    // Axis decomposition
    let mut pos = start;
    if step.x != 0.0 && !box_blocked(grid, Vec2::new(pos.x + step.x, pos.y)) {
        pos.x += step.x;
    }
    if step.y != 0.0 && !box_blocked(grid, Vec2::new(pos.x, pos.y + step.y)) {
        pos.y += step.y;
    }

    let mut nudged = false;
    if pos == start {
        let limit = velocity.length() * dt;
        let aligned = tile_origin(tile_of(pos));
        let nudge = if step.x != 0.0 {
            Vec2::new(0.0, (aligned.y - pos.y).clamp(-limit, limit))
        } else {
            Vec2::new((aligned.x - pos.x).clamp(-limit, limit), 0.0)
        };
        if nudge.abs().max_element() > OVERLAP_EPSILON && !box_blocked(grid, pos + nudge) {
            pos += nudge;
            nudged = true;
        }
    }

    body.pos = pos;
    body.sync_tile();
    MoveOutcome {
        displacement: pos - start,
        obstructed: true,
        nudged,
    }
}
