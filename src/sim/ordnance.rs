//! Bombs and blasts
//!
//! Bombs sit on a tile until their fuse runs out, then turn into a plus-shaped
//! blast. Blasts destroy breakable obstacles when they are created, linger for
//! `blast_secs`, and damage any actor whose box overlaps one of their tiles.
//! A blast that reaches another bomb does not set it off.

use serde::{Deserialize, Serialize};

use super::grid::{Grid, Tile, TileCoord};
use super::movement::Body;
use crate::error::SimError;

/// Who placed a bomb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Guard,
}

/// Actor that can be hurt by a blast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Player,
    Guard,
}

impl Target {
    fn bit(self) -> u8 {
        match self {
            Target::Player => 0b01,
            Target::Guard => 0b10,
        }
    }
}

/// A live bomb
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bomb {
    pub tile: TileCoord,
    /// Session clock at placement (seconds)
    pub placed_at: f64,
    pub owner: Owner,
}

/// The footprint of one detonation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blast {
    pub tiles: Vec<TileCoord>,
    /// Session clock at detonation (seconds)
    pub spawned_at: f64,
    pub owner: Owner,
    /// Targets this blast has already hurt
    spent: u8,
}

impl Blast {
    fn covers(&self, body: &Body) -> bool {
        self.tiles.iter().any(|&tile| body.overlaps_tile(tile))
    }

    fn has_hit(&self, target: Target) -> bool {
        self.spent & target.bit() != 0
    }
}

/// Ordnance timing and reach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrdnanceConfig {
    pub fuse_secs: f64,
    pub blast_secs: f64,
    pub range: u32,
}

/// Compute the tiles reached by a detonation at `center`.
///
/// Each cardinal arm runs up to `range` tiles. Walls and the grid edge stop an
/// arm before the tile; a breakable obstacle is included, turned into floor,
/// and stops the arm.
pub fn blast_footprint(grid: &mut Grid, center: TileCoord, range: u32) -> Vec<TileCoord> {
    let mut tiles = vec![center];

    for (dcol, drow) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        for step in 1..=i32::try_from(range).unwrap_or(i32::MAX) {
            let tile = center.offset(dcol * step, drow * step);
            match grid.get(tile) {
                None | Some(Tile::Wall) => break,
                Some(Tile::Breakable) => {
                    tiles.push(tile);
                    if grid.set_tile(tile, Tile::Floor).is_ok() {
                        log::debug!("Blast destroyed obstacle at {:?}", tile);
                    }
                    break;
                }
                Some(_) => tiles.push(tile),
            }
        }
    }

    tiles
}

/// All live bombs and blasts of a round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ordnance {
    fuse_secs: f64,
    blast_secs: f64,
    range: u32,
    bombs: Vec<Bomb>,
    blasts: Vec<Blast>,
}

impl Ordnance {
    pub fn new(config: OrdnanceConfig) -> Self {
        Self {
            fuse_secs: config.fuse_secs,
            blast_secs: config.blast_secs,
            range: config.range,
            bombs: Vec::new(),
            blasts: Vec::new(),
        }
    }

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    pub fn blasts(&self) -> &[Blast] {
        &self.blasts
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    /// Drop a bomb on `tile`. Only floor and breakable tiles accept bombs.
    pub fn place_bomb(
        &mut self,
        grid: &Grid,
        tile: TileCoord,
        owner: Owner,
        now: f64,
    ) -> Result<(), SimError> {
        let kind = grid.tile_at(tile)?;
        if !kind.accepts_bomb() {
            return Err(SimError::InvalidTile {
                col: tile.col,
                row: tile.row,
                tile: kind,
            });
        }
        log::debug!("{:?} placed a bomb at {:?} (t={:.2})", owner, tile, now);
        self.bombs.push(Bomb {
            tile,
            placed_at: now,
            owner,
        });
        Ok(())
    }

    /// Detonate bombs whose fuse has run out and retire expired blasts.
    /// Returns the number of detonations.
    pub fn advance(&mut self, grid: &mut Grid, now: f64) -> usize {
        let fuse = self.fuse_secs;
        let (due, pending): (Vec<Bomb>, Vec<Bomb>) = self
            .bombs
            .drain(..)
            .partition(|bomb| now - bomb.placed_at >= fuse);
        self.bombs = pending;

        for bomb in &due {
            let tiles = blast_footprint(grid, bomb.tile, self.range);
            log::debug!(
                "Bomb at {:?} detonated, {} tiles (t={:.2})",
                bomb.tile,
                tiles.len(),
                now
            );
            self.blasts.push(Blast {
                tiles,
                spawned_at: now,
                owner: bomb.owner,
                spent: 0,
            });
        }

        let lifetime = self.blast_secs;
        self.blasts.retain(|blast| now - blast.spawned_at < lifetime);

        due.len()
    }

    /// Apply at most one point of damage to `target` for this tick.
    ///
    /// Every blast overlapping the body is marked as spent for the target, so
    /// overlapping or simultaneous blasts still only count once.
    pub fn strike(&mut self, target: Target, body: &Body) -> bool {
        let mut hit = false;
        for blast in self.blasts.iter_mut() {
            if blast.covers(body) {
                if !blast.has_hit(target) {
                    hit = true;
                }
                blast.spent |= target.bit();
            }
        }
        hit
    }

    /// Every live blast tile with its age in seconds
    pub fn blast_tiles(&self, now: f64) -> impl Iterator<Item = (TileCoord, f64)> + '_ {
        self.blasts.iter().flat_map(move |blast| {
            let age = now - blast.spawned_at;
            blast.tiles.iter().map(move |&tile| (tile, age))
        })
    }

    /// Every live bomb with its age in seconds
    pub fn bomb_ages(&self, now: f64) -> impl Iterator<Item = (TileCoord, f64)> + '_ {
        self.bombs.iter().map(move |bomb| (bomb.tile, now - bomb.placed_at))
    }
}
