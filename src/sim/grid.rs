//! Tile grid
//!
//! The grid is the only place tile state lives. Everything else reads and
//! writes tiles through `tile_at` / `set_tile`.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Kind of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Floor,
    /// Impassable and blast-proof
    Wall,
    /// Collectible, becomes `Floor` when picked up
    Item,
    /// Escape point, only counts once every item is collected
    Exit,
    /// Blocks movement until a blast turns it into `Floor`
    Breakable,
}

impl Tile {
    /// Whether bodies collide with this tile
    #[inline]
    pub fn is_blocking(self) -> bool {
        matches!(self, Tile::Wall | Tile::Breakable)
    }

    /// Whether a bomb may be placed on this tile
    #[inline]
    pub fn accepts_bomb(self) -> bool {
        matches!(self, Tile::Floor | Tile::Breakable)
    }

    /// Decode a legacy numeric tile code. Unknown codes collapse to `Floor`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Tile::Wall,
            2 => Tile::Item,
            3 => Tile::Exit,
            4 => Tile::Breakable,
            _ => Tile::Floor,
        }
    }
}

/// Integer tile coordinate (column, row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub col: i32,
    pub row: i32,
}

impl TileCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    #[inline]
    pub fn offset(self, dcol: i32, drow: i32) -> Self {
        Self::new(self.col + dcol, self.row + drow)
    }

    #[inline]
    pub fn manhattan(self, other: TileCoord) -> u32 {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row)
    }

    /// The four cardinal neighbours (left, right, up, down)
    pub fn neighbors(self) -> [TileCoord; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }
}

/// Fixed-size rectangular tile matrix, stored row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cols: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// All-floor grid
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            tiles: vec![Tile::Floor; cols as usize * rows as usize],
        }
    }

    /// All-floor grid with the outer ring forced to `Wall`
    pub fn walled(cols: u32, rows: u32) -> Self {
        let mut grid = Self::new(cols, rows);
        for row in 0..rows as i32 {
            for col in 0..cols as i32 {
                let coord = TileCoord::new(col, row);
                if grid.is_border(coord) {
                    grid.put(coord, Tile::Wall);
                }
            }
        }
        grid
    }

    /// Build a grid from rows of legacy numeric tile codes
    pub fn from_codes(rows: &[&[u8]]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut grid = Self::new(width, height);
        for (row, codes) in rows.iter().enumerate() {
            for (col, &code) in codes.iter().enumerate() {
                grid.put(TileCoord::new(col as i32, row as i32), Tile::from_code(code));
            }
        }
        grid
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.col >= 0
            && coord.row >= 0
            && (coord.col as u32) < self.cols
            && (coord.row as u32) < self.rows
    }

    /// Whether the coordinate lies on the outer ring
    pub fn is_border(&self, coord: TileCoord) -> bool {
        coord.col == 0
            || coord.row == 0
            || coord.col == self.cols as i32 - 1
            || coord.row == self.rows as i32 - 1
    }

    fn index(&self, coord: TileCoord) -> Result<usize, SimError> {
        if self.in_bounds(coord) {
            Ok(coord.row as usize * self.cols as usize + coord.col as usize)
        } else {
            Err(SimError::OutOfBounds {
                col: coord.col,
                row: coord.row,
            })
        }
    }

    pub fn tile_at(&self, coord: TileCoord) -> Result<Tile, SimError> {
        self.index(coord).map(|i| self.tiles[i])
    }

    /// Tile lookup for scans that may step off the grid
    #[inline]
    pub fn get(&self, coord: TileCoord) -> Option<Tile> {
        self.tile_at(coord).ok()
    }

    pub fn set_tile(&mut self, coord: TileCoord, tile: Tile) -> Result<(), SimError> {
        let i = self.index(coord)?;
        self.tiles[i] = tile;
        Ok(())
    }

    /// Blocking test used by collision. Off-grid counts as solid.
    #[inline]
    pub fn is_blocking(&self, coord: TileCoord) -> bool {
        self.get(coord).is_none_or(Tile::is_blocking)
    }

    /// In-bounds write for coordinates produced by our own loops
    fn put(&mut self, coord: TileCoord, tile: Tile) {
        let result = self.set_tile(coord, tile);
        debug_assert!(result.is_ok(), "grid write out of bounds: {:?}", coord);
    }

    /// Iterate every cell in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, Tile)> + '_ {
        self.tiles.iter().enumerate().map(|(i, &tile)| {
            let col = (i % self.cols as usize) as i32;
            let row = (i / self.cols as usize) as i32;
            (TileCoord::new(col, row), tile)
        })
    }

    /// Number of cells of the given kind
    pub fn count(&self, kind: Tile) -> usize {
        self.tiles.iter().filter(|&&t| t == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_tiles() {
        assert!(Tile::Wall.is_blocking());
        assert!(Tile::Breakable.is_blocking());
        assert!(!Tile::Floor.is_blocking());
        assert!(!Tile::Item.is_blocking());
        assert!(!Tile::Exit.is_blocking());
    }

    #[test]
    fn test_bomb_tiles() {
        assert!(Tile::Floor.accepts_bomb());
        assert!(Tile::Breakable.accepts_bomb());
        assert!(!Tile::Wall.accepts_bomb());
        assert!(!Tile::Item.accepts_bomb());
        assert!(!Tile::Exit.accepts_bomb());
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut grid = Grid::new(4, 3);
        assert_eq!(
            grid.tile_at(TileCoord::new(4, 0)),
            Err(SimError::OutOfBounds { col: 4, row: 0 })
        );
        assert!(grid.tile_at(TileCoord::new(0, -1)).is_err());
        assert!(grid.set_tile(TileCoord::new(0, 3), Tile::Wall).is_err());
        assert_eq!(grid.count(Tile::Floor), 12);
        // Off-grid is solid for collision purposes
        assert!(grid.is_blocking(TileCoord::new(-1, 1)));
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::new(4, 3);
        grid.set_tile(TileCoord::new(3, 2), Tile::Item).unwrap();
        assert_eq!(grid.tile_at(TileCoord::new(3, 2)), Ok(Tile::Item));
        assert_eq!(grid.count(Tile::Item), 1);
    }

    #[test]
    fn test_walled_border() {
        let grid = Grid::walled(5, 4);
        for (coord, tile) in grid.iter() {
            if grid.is_border(coord) {
                assert_eq!(tile, Tile::Wall, "{:?}", coord);
            } else {
                assert_eq!(tile, Tile::Floor, "{:?}", coord);
            }
        }
    }

    #[test]
    fn test_legacy_codes_collapse_to_floor() {
        let grid = Grid::from_codes(&[&[1, 9, 4], &[2, 3, 0]]);
        assert_eq!(grid.tile_at(TileCoord::new(1, 0)), Ok(Tile::Floor));
        assert_eq!(grid.tile_at(TileCoord::new(2, 0)), Ok(Tile::Breakable));
        assert_eq!(grid.tile_at(TileCoord::new(0, 1)), Ok(Tile::Item));
        assert_eq!(grid.tile_at(TileCoord::new(1, 1)), Ok(Tile::Exit));
    }

    #[test]
    fn test_manhattan_and_neighbors() {
        let a = TileCoord::new(3, 2);
        assert_eq!(a.manhattan(TileCoord::new(1, 5)), 5);
        assert!(a.neighbors().contains(&TileCoord::new(3, 3)));
        assert!(!a.neighbors().contains(&TileCoord::new(4, 3)));
    }
}
