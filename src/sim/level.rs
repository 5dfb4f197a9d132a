//! Level generation
//!
//! Best-effort random layout: a walled border, random interior walls, then
//! random breakable obstacles. Solvability is not checked. Every placement
//! shortfall falls back to something looser and is reported as a
//! `DegradedPlacement` instead of failing.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use super::adversary::PatrolRoute;
use super::grid::{Grid, Tile, TileCoord};
use crate::settings::Settings;

/// A placement that could not be made the preferred way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegradedPlacement {
    /// No candidate tile for the player, spawned at (1, 1)
    PlayerFallback,
    /// No candidate with an open neighbour, guard may be sealed in
    AdversarySealed,
    /// No candidate at all for the guard, spawned in the far corner
    AdversaryFallback,
    ItemShortfall { placed: u32, requested: u32 },
    /// Candidate pool exhausted, exit forced onto the first free floor tile
    ExitFallback,
    NoExit,
}

/// A generated round layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub grid: Grid,
    pub player_spawn: TileCoord,
    pub guard_spawn: TileCoord,
    pub patrol: PatrolRoute,
    pub items: Vec<TileCoord>,
    pub exit: Option<TileCoord>,
    pub degraded: Vec<DegradedPlacement>,
}

impl Level {
    /// Items that must be collected before the exit opens
    pub fn item_total(&self) -> u32 {
        self.items.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelGenerator {
    pub cols: u32,
    pub rows: u32,
    pub wall_ratio: f32,
    pub breakable_ratio: f32,
    pub item_count: u32,
}

impl LevelGenerator {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            cols: settings.cols.max(3),
            rows: settings.rows.max(3),
            wall_ratio: settings.wall_ratio,
            breakable_ratio: settings.breakable_ratio,
            item_count: settings.item_count,
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Level {
        let grid = self.generate_grid(rng);
        let level = self.place(grid, rng);
        log::info!(
            "Generated {}x{} level: {} walls, {} obstacles, {} items, exit {:?}",
            self.cols,
            self.rows,
            level.grid.count(Tile::Wall),
            level.grid.count(Tile::Breakable),
            level.item_total(),
            level.exit
        );
        level
    }

    /// Border walls, then interior walls, then breakable obstacles.
    /// Each roll only converts a cell that is still floor.
    pub fn generate_grid<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        let mut grid = Grid::walled(self.cols, self.rows);
        let area = self.cols as f32 * self.rows as f32;
        let walls = (area * self.wall_ratio) as u32;
        let obstacles = (area * self.breakable_ratio) as u32;

        self.scatter(&mut grid, walls, Tile::Wall, rng);
        self.scatter(&mut grid, obstacles, Tile::Breakable, rng);
        grid
    }

    fn scatter<R: Rng + ?Sized>(&self, grid: &mut Grid, rolls: u32, tile: Tile, rng: &mut R) {
        for _ in 0..rolls {
            let coord = TileCoord::new(
                rng.random_range(1..self.cols - 1) as i32,
                rng.random_range(1..self.rows - 1) as i32,
            );
            if grid.get(coord) == Some(Tile::Floor) {
                force(grid, coord, tile);
            }
        }
    }

    /// Place player, guard, patrol route, items and exit on `grid`
    pub fn place<R: Rng + ?Sized>(&self, mut grid: Grid, rng: &mut R) -> Level {
        let mut degraded = Vec::new();

        let mut candidates: Vec<TileCoord> = grid
            .iter()
            .filter(|&(coord, tile)| {
                !grid.is_border(coord) && matches!(tile, Tile::Floor | Tile::Breakable)
            })
            .map(|(coord, _)| coord)
            .collect();
        candidates.shuffle(rng);

        // Player
        let player_spawn = if candidates.is_empty() {
            degraded.push(DegradedPlacement::PlayerFallback);
            TileCoord::new(1, 1)
        } else {
            candidates.remove(0)
        };
        force(&mut grid, player_spawn, Tile::Floor);

        // Guard: prefer a cell that is not sealed in, searching from the back
        let open = candidates
            .iter()
            .rposition(|&coord| has_open_neighbor(&grid, coord));
        let guard_spawn = match open {
            Some(i) => candidates.remove(i),
            None if !candidates.is_empty() => {
                degraded.push(DegradedPlacement::AdversarySealed);
                candidates.remove(0)
            }
            None => {
                degraded.push(DegradedPlacement::AdversaryFallback);
                TileCoord::new(self.cols as i32 - 2, self.rows as i32 - 2)
            }
        };
        force(&mut grid, guard_spawn, Tile::Floor);

        // Two-point patrol, or stand still if nothing is left
        let patrol = PatrolRoute::new(guard_spawn, candidates.choose(rng).copied());

        // Items
        let mut items = Vec::new();
        for _ in 0..self.item_count {
            if candidates.is_empty() {
                break;
            }
            let coord = candidates.remove(0);
            force(&mut grid, coord, Tile::Item);
            items.push(coord);
        }
        if (items.len() as u32) < self.item_count {
            degraded.push(DegradedPlacement::ItemShortfall {
                placed: items.len() as u32,
                requested: self.item_count,
            });
        }

        // Exit
        let exit = if candidates.is_empty() {
            let fallback = grid
                .iter()
                .find(|&(coord, tile)| tile == Tile::Floor && coord != player_spawn)
                .map(|(coord, _)| coord);
            degraded.push(if fallback.is_some() {
                DegradedPlacement::ExitFallback
            } else {
                DegradedPlacement::NoExit
            });
            fallback
        } else {
            Some(candidates.remove(0))
        };
        if let Some(coord) = exit {
            force(&mut grid, coord, Tile::Exit);
        }

        for issue in &degraded {
            log::warn!("Degraded placement: {:?}", issue);
        }

        Level {
            grid,
            player_spawn,
            guard_spawn,
            patrol,
            items,
            exit,
            degraded,
        }
    }
}

/// Whether any 4-neighbour of `coord` is floor or breakable
fn has_open_neighbor(grid: &Grid, coord: TileCoord) -> bool {
    coord
        .neighbors()
        .iter()
        .any(|&n| matches!(grid.get(n), Some(Tile::Floor | Tile::Breakable)))
}

fn force(grid: &mut Grid, coord: TileCoord, tile: Tile) {
    let result = grid.set_tile(coord, tile);
    debug_assert!(result.is_ok(), "placement outside grid: {:?}", coord);
}
