//! Blastmaze - a tile-based stealth/bomb maze
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, movement, ordnance, adversary, session)
//! - `settings`: Data-driven tuning
//! - `records`: Round history kept by the outer driver
//! - `autopilot`: Scripted input source for headless runs

pub mod autopilot;
pub mod error;
pub mod records;
pub mod settings;
pub mod sim;

pub use error::{SettingsError, SimError};
pub use records::RunRecord;
pub use settings::Settings;

use glam::Vec2;

use sim::TileCoord;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one input snapshot per tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Edge length of one tile in pixels. Entities are tile-sized squares.
    pub const TILE_SIZE: f32 = 32.0;
    pub const COLS: u32 = 20;
    pub const ROWS: u32 = 10;

    /// Pixels per second (3 px per tick at 60 Hz)
    pub const PLAYER_SPEED: f32 = 180.0;
    /// Pixels per second (1 px per tick at 60 Hz)
    pub const GUARD_SPEED: f32 = 60.0;

    pub const PLAYER_MAX_HP: u32 = 3;
    pub const GUARD_MAX_HP: u32 = 2;

    /// Seconds between placement and detonation
    pub const FUSE_SECS: f64 = 2.0;
    /// Seconds a detonated tile stays live
    pub const BLAST_SECS: f64 = 1.0;
    /// Tiles reached in each cardinal direction
    pub const EXPLOSION_RANGE: u32 = 2;

    pub const GUARD_BOMB_COOLDOWN_SECS: f64 = 5.0;
    /// Chance that a blocked guard drops a bomb when the player is not close
    pub const GUARD_BOMB_CHANCE: f64 = 0.5;
    /// Player counts as "close" within EXPLOSION_RANGE + this margin
    pub const GUARD_THREAT_MARGIN: u32 = 2;
    /// Tiles the guard can see straight down its column
    pub const SIGHT_RANGE: u32 = 3;

    pub const WALL_RATIO: f32 = 0.15;
    pub const BREAKABLE_RATIO: f32 = 0.10;
    pub const ITEM_COUNT: u32 = 3;

    /// Overlaps smaller than this (px) are float drift, not contact
    pub const OVERLAP_EPSILON: f32 = 1e-3;
}

/// Tile containing the given continuous position (top-left of a body)
#[inline]
pub fn tile_of(pos: Vec2) -> TileCoord {
    TileCoord::new(
        (pos.x / consts::TILE_SIZE).floor() as i32,
        (pos.y / consts::TILE_SIZE).floor() as i32,
    )
}

/// Pixel position of a tile's top-left corner
#[inline]
pub fn tile_origin(tile: TileCoord) -> Vec2 {
    Vec2::new(
        tile.col as f32 * consts::TILE_SIZE,
        tile.row as f32 * consts::TILE_SIZE,
    )
}

/// Pixel position of a tile's center
#[inline]
pub fn tile_center(tile: TileCoord) -> Vec2 {
    tile_origin(tile) + Vec2::splat(consts::TILE_SIZE / 2.0)
}
