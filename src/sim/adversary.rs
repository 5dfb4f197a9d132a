//! Guard controller
//!
//! The guard walks a cyclic patrol route through the movement engine with the
//! `Stop` collision policy. When it cannot move it may drop a bomb, either
//! because the player is close or on a coin flip. Its sight is a fixed cone
//! straight down its own column.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{Grid, TileCoord};
use super::movement::{Body, CollisionPolicy, try_move};
use super::ordnance::{Ordnance, Owner};
use super::state::Health;
use crate::consts::TILE_SIZE;
use crate::settings::Settings;
use crate::tile_center;

/// Cyclic waypoint list, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatrolRoute {
    waypoints: Vec<TileCoord>,
    index: usize,
}

impl PatrolRoute {
    pub fn new(start: TileCoord, rest: impl IntoIterator<Item = TileCoord>) -> Self {
        let mut waypoints = vec![start];
        waypoints.extend(rest);
        Self { waypoints, index: 0 }
    }

    #[inline]
    pub fn current(&self) -> TileCoord {
        self.waypoints[self.index]
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.waypoints.len();
    }

    pub fn waypoints(&self) -> &[TileCoord] {
        &self.waypoints
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GuardMode {
    #[default]
    Patrolling,
    /// Last move attempt was fully obstructed
    Blocked,
}

/// Guard tuning, derived from `Settings`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardConfig {
    /// Pixels per second
    pub speed: f32,
    pub bomb_cooldown_secs: f64,
    /// Chance of a bomb when blocked and the player is not close
    pub bomb_chance: f64,
    /// Manhattan distance at which the player counts as close
    pub threat_distance: u32,
    pub sight_range: u32,
}

impl GuardConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            speed: settings.guard_speed,
            bomb_cooldown_secs: settings.guard_bomb_cooldown_secs,
            bomb_chance: settings.guard_bomb_chance,
            threat_distance: settings
                .explosion_range
                .saturating_add(settings.guard_threat_margin),
            sight_range: settings.sight_range,
        }
    }
}

/// The adversary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guard {
    pub body: Body,
    pub health: Health,
    pub patrol: PatrolRoute,
    pub mode: GuardMode,
    /// Session clock of the last bomb this guard placed
    pub last_bomb_at: Option<f64>,
}

impl Guard {
    pub fn new(spawn: TileCoord, patrol: PatrolRoute, max_hp: u32) -> Self {
        Self {
            body: Body::at_tile(spawn),
            health: Health::new(max_hp),
            patrol,
            mode: GuardMode::Patrolling,
            last_bomb_at: None,
        }
    }

    /// Advance one tick of patrol. Returns true if a bomb was placed.
    #[allow(clippy::too_many_arguments)]
    pub fn update<R: Rng>(
        &mut self,
        grid: &Grid,
        ordnance: &mut Ordnance,
        player_tile: TileCoord,
        now: f64,
        dt: f32,
        config: &GuardConfig,
        rng: &mut R,
    ) -> bool {
        let target = self.patrol.current();
        let center = self.body.pos + Vec2::splat(TILE_SIZE / 2.0);
        let to_target = tile_center(target) - center;
        let distance = to_target.length();

        if distance <= config.speed * dt {
            // Close enough: snap onto the waypoint and aim for the next one
            self.body = Body::at_tile(target);
            self.patrol.advance();
            self.mode = GuardMode::Patrolling;
            log::trace!("Guard reached waypoint {:?}", target);
            return false;
        }

        let velocity = to_target / distance * config.speed;
        let outcome = try_move(grid, &mut self.body, velocity, dt, CollisionPolicy::Stop);
        if !outcome.stalled() {
            self.mode = GuardMode::Patrolling;
            return false;
        }

        self.mode = GuardMode::Blocked;
        self.consider_bomb(grid, ordnance, player_tile, now, config, rng)
    }

    fn consider_bomb<R: Rng>(
        &mut self,
        grid: &Grid,
        ordnance: &mut Ordnance,
        player_tile: TileCoord,
        now: f64,
        config: &GuardConfig,
        rng: &mut R,
    ) -> bool {
        let ready = self
            .last_bomb_at
            .is_none_or(|last| now - last >= config.bomb_cooldown_secs);
        if !ready {
            return false;
        }
        let tile = self.body.tile;
        if !grid.get(tile).is_some_and(|t| t.accepts_bomb()) {
            return false;
        }

        let close = tile.manhattan(player_tile) <= config.threat_distance;
        if !(close || rng.random::<f64>() < config.bomb_chance) {
            return false;
        }

        match ordnance.place_bomb(grid, tile, Owner::Guard, now) {
            Ok(()) => {
                self.last_bomb_at = Some(now);
                log::debug!("Blocked guard dropped a bomb at {:?} (player close: {})", tile, close);
                true
            }
            Err(err) => {
                log::trace!("Guard bomb rejected: {}", err);
                false
            }
        }
    }
}

/// Whether a guard at `guard` sees a player at `player`.
///
/// The cone is the `range` tiles directly below the guard. Walls and breakable
/// obstacles strictly between the two block the view.
pub fn can_see(grid: &Grid, guard: TileCoord, player: TileCoord, range: u32) -> bool {
    if player.col != guard.col || player.row <= guard.row {
        return false;
    }
    if (player.row - guard.row) as u32 > range {
        return false;
    }
    (guard.row + 1..player.row).all(|row| !grid.is_blocking(TileCoord::new(guard.col, row)))
}

/// Tiles currently covered by the sight cone (for rendering)
pub fn sight_tiles(grid: &Grid, guard: TileCoord, range: u32) -> Vec<TileCoord> {
    (1..=i32::try_from(range).unwrap_or(i32::MAX))
        .map(|i| guard.offset(0, i))
        .take_while(|&tile| !grid.is_blocking(tile))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BLAST_SECS, EXPLOSION_RANGE, FUSE_SECS, SIM_DT};
    use crate::sim::grid::Tile;
    use crate::sim::ordnance::OrdnanceConfig;
    use crate::tile_origin;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn config(bomb_chance: f64) -> GuardConfig {
        GuardConfig {
            bomb_chance,
            ..GuardConfig::from_settings(&Settings::default())
        }
    }

    fn ordnance() -> Ordnance {
        Ordnance::new(OrdnanceConfig {
            fuse_secs: FUSE_SECS,
            blast_secs: BLAST_SECS,
            range: EXPLOSION_RANGE,
        })
    }

    #[test]
    fn test_threat_distance_saturates() {
        let settings = Settings {
            explosion_range: u32::MAX,
            guard_threat_margin: 2,
            ..Settings::default()
        };
        assert_eq!(GuardConfig::from_settings(&settings).threat_distance, u32::MAX);
        assert_eq!(GuardConfig::from_settings(&Settings::default()).threat_distance, 4);
    }

    #[test]
    fn test_sight_straight_down() {
        let mut grid = Grid::walled(8, 8);
        let guard = TileCoord::new(3, 2);
        assert!(can_see(&grid, guard, TileCoord::new(3, 5), 3));
        assert!(can_see(&grid, guard, TileCoord::new(3, 3), 3));
        // Different column, too far, or above
        assert!(!can_see(&grid, guard, TileCoord::new(4, 5), 3));
        assert!(!can_see(&grid, guard, TileCoord::new(3, 6), 3));
        assert!(!can_see(&grid, guard, TileCoord::new(3, 1), 3));
        assert!(!can_see(&grid, guard, guard, 3));

        grid.set_tile(TileCoord::new(3, 4), Tile::Wall).unwrap();
        assert!(!can_see(&grid, guard, TileCoord::new(3, 5), 3));

        grid.set_tile(TileCoord::new(3, 4), Tile::Breakable).unwrap();
        assert!(!can_see(&grid, guard, TileCoord::new(3, 5), 3));
        // Still visible in front of the obstacle
        assert!(can_see(&grid, guard, TileCoord::new(3, 3), 3));
    }

    #[test]
    fn test_sight_tiles_stop_at_walls() {
        let mut grid = Grid::walled(8, 8);
        assert_eq!(sight_tiles(&grid, TileCoord::new(3, 2), 3).len(), 3);
        grid.set_tile(TileCoord::new(3, 4), Tile::Wall).unwrap();
        assert_eq!(
            sight_tiles(&grid, TileCoord::new(3, 2), 3),
            vec![TileCoord::new(3, 3)]
        );
        // Border row stops the cone
        assert_eq!(sight_tiles(&grid, TileCoord::new(3, 6), 3).len(), 0);
    }

    #[test]
    fn test_patrol_cycles_between_waypoints() {
        let grid = Grid::walled(8, 6);
        let mut ordnance = ordnance();
        let mut rng = Pcg32::seed_from_u64(1);
        let route = PatrolRoute::new(TileCoord::new(2, 2), [TileCoord::new(5, 2)]);
        let mut guard = Guard::new(TileCoord::new(2, 2), route, 2);
        let cfg = config(0.0);

        // Standing on the first waypoint: snap and retarget
        guard.update(&grid, &mut ordnance, TileCoord::new(6, 4), 0.0, SIM_DT, &cfg, &mut rng);
        assert_eq!(guard.patrol.index(), 1);

        let mut ticks = 0;
        while guard.patrol.index() == 1 && ticks < 200 {
            guard.update(&grid, &mut ordnance, TileCoord::new(6, 4), 0.0, SIM_DT, &cfg, &mut rng);
            ticks += 1;
        }
        assert_eq!(guard.patrol.index(), 0);
        assert_eq!(guard.body.tile, TileCoord::new(5, 2));
        assert_eq!(guard.body.pos, tile_origin(TileCoord::new(5, 2)));
        assert!(ordnance.bombs().is_empty());
    }

    #[test]
    fn test_single_point_route_stays_put() {
        let grid = Grid::walled(8, 6);
        let mut ordnance = ordnance();
        let mut rng = Pcg32::seed_from_u64(1);
        let spawn = TileCoord::new(3, 3);
        let mut guard = Guard::new(spawn, PatrolRoute::new(spawn, []), 2);
        for _ in 0..30 {
            let far = TileCoord::new(1, 1);
            guard.update(&grid, &mut ordnance, far, 0.0, SIM_DT, &config(1.0), &mut rng);
        }
        assert_eq!(guard.body, Body::at_tile(spawn));
        assert_eq!(guard.mode, GuardMode::Patrolling);
    }

    fn blocked_guard() -> (Grid, Guard) {
        let mut grid = Grid::walled(10, 6);
        grid.set_tile(TileCoord::new(3, 2), Tile::Breakable).unwrap();
        let route = PatrolRoute::new(TileCoord::new(2, 2), [TileCoord::new(6, 2)]);
        let mut guard = Guard::new(TileCoord::new(2, 2), route, 2);
        guard.patrol.advance();
        (grid, guard)
    }

    #[test]
    fn test_blocked_guard_bombs_when_player_close() {
        let (grid, mut guard) = blocked_guard();
        let mut ordnance = ordnance();
        let mut rng = Pcg32::seed_from_u64(3);
        let cfg = config(0.0);

        let close = TileCoord::new(5, 3);
        let placed = guard.update(&grid, &mut ordnance, close, 0.0, SIM_DT, &cfg, &mut rng);
        assert!(placed);
        assert_eq!(guard.mode, GuardMode::Blocked);
        assert_eq!(ordnance.bombs()[0].owner, Owner::Guard);
        assert_eq!(ordnance.bombs()[0].tile, TileCoord::new(2, 2));

        // Cooldown holds for five seconds
        assert!(!guard.update(&grid, &mut ordnance, close, 4.9, SIM_DT, &cfg, &mut rng));
        assert!(guard.update(&grid, &mut ordnance, close, 5.0, SIM_DT, &cfg, &mut rng));
        assert_eq!(ordnance.bombs().len(), 2);
    }

    #[test]
    fn test_blocked_guard_never_bombs_items_or_exit() {
        for tile in [Tile::Item, Tile::Exit] {
            let (mut grid, mut guard) = blocked_guard();
            grid.set_tile(TileCoord::new(2, 2), tile).unwrap();
            let mut ordnance = ordnance();
            let mut rng = Pcg32::seed_from_u64(3);

            let close = TileCoord::new(3, 3);
            let cfg = config(1.0);
            let placed = guard.update(&grid, &mut ordnance, close, 0.0, SIM_DT, &cfg, &mut rng);
            assert!(!placed);
            assert_eq!(guard.mode, GuardMode::Blocked);
            assert!(ordnance.bombs().is_empty());
            assert_eq!(guard.last_bomb_at, None);
        }
    }

    #[test]
    fn test_blocked_guard_far_from_player_uses_chance() {
        let (grid, mut guard) = blocked_guard();
        let mut ordnance = ordnance();
        let mut rng = Pcg32::seed_from_u64(3);
        let far = TileCoord::new(8, 4);

        assert!(!guard.update(&grid, &mut ordnance, far, 0.0, SIM_DT, &config(0.0), &mut rng));
        assert_eq!(guard.mode, GuardMode::Blocked);
        assert!(ordnance.bombs().is_empty());

        assert!(guard.update(&grid, &mut ordnance, far, 0.0, SIM_DT, &config(1.0), &mut rng));
        assert_eq!(ordnance.bombs().len(), 1);
    }
}
