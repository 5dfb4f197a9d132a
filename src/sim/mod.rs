//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, owned by the session
//! - Stable iteration order (row-major grids, bombs and blasts by spawn order)
//! - No rendering or platform dependencies

pub mod adversary;
pub mod grid;
pub mod level;
pub mod movement;
pub mod ordnance;
pub mod state;
pub mod tick;

pub use adversary::{Guard, GuardConfig, GuardMode, PatrolRoute, can_see, sight_tiles};
pub use grid::{Grid, Tile, TileCoord};
pub use level::{DegradedPlacement, Level, LevelGenerator};
pub use movement::{Body, CollisionPolicy, MoveOutcome, box_blocked, try_move};
pub use ordnance::{Blast, Bomb, Ordnance, OrdnanceConfig, Owner, Target, blast_footprint};
pub use state::{
    ActorView, EndReason, Health, Player, RoundOutcome, Session, SessionPhase, Snapshot,
};
pub use tick::{TickInput, run_round, tick};
