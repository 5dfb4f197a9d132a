//! Error types
//!
//! Only grid access and settings loading can fail. Placement shortfalls in the
//! level generator are diagnostics (see `sim::level::DegradedPlacement`).

use thiserror::Error;

use crate::sim::Tile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// Tile coordinate outside the grid. Callers are expected to stay in range.
    #[error("tile ({col}, {row}) is outside the grid")]
    OutOfBounds { col: i32, row: i32 },
    /// Bomb placement on a tile that cannot hold a bomb
    #[error("cannot place a bomb on {tile:?} at ({col}, {row})")]
    InvalidTile { col: i32, row: i32, tile: Tile },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}
