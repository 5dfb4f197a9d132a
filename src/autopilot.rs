//! Scripted input source for headless runs
//!
//! Plays the round from the snapshot alone: breadth-first search over passable
//! tiles toward the nearest item, then the exit. Tiles the guard can see and
//! tiles covered by live blasts are never entered; tiles a live bomb will hit
//! are avoided, and left if the player is standing in one.

use std::collections::{HashSet, VecDeque};

use crate::settings::Settings;
use crate::sim::{Grid, Snapshot, Tile, TickInput, TileCoord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Autopilot {
    /// Bomb reach used to predict blast tiles
    range: u32,
}

/// Tiles the autopilot treats specially for one tick
#[derive(Debug, Default)]
struct Hazards {
    /// Entering loses the round or costs HP right now
    forbidden: HashSet<TileCoord>,
    /// Will be hit when a live bomb goes off
    threatened: HashSet<TileCoord>,
}

impl Autopilot {
    pub fn new(settings: &Settings) -> Self {
        Self {
            range: settings.explosion_range,
        }
    }

    /// Input for the next tick. Never quits; idles when nothing is reachable.
    pub fn steer(&self, snap: &Snapshot<'_>) -> TickInput {
        let start = snap.player.body.tile;
        let hazards = self.hazards(snap);

        let path = if hazards.threatened.contains(&start) {
            // Get out of the way first, crossing other threatened tiles if needed
            bfs(snap.grid, start, &hazards.forbidden, |tile| {
                !hazards.threatened.contains(&tile)
            })
        } else {
            let blocked: HashSet<TileCoord> =
                hazards.forbidden.union(&hazards.threatened).copied().collect();
            let goal = goal_tile(snap);
            bfs(snap.grid, start, &blocked, |tile| snap.grid.get(tile) == Some(goal))
        };

        match path.as_deref() {
            Some([_, next, ..]) => toward(start, *next),
            _ => TickInput::default(),
        }
    }

    fn hazards(&self, snap: &Snapshot<'_>) -> Hazards {
        let mut hazards = Hazards::default();
        hazards.forbidden.extend(snap.sight.iter().copied());
        hazards.forbidden.extend(snap.blasts.iter().map(|&(tile, _)| tile));
        for &(bomb, _) in &snap.bombs {
            hazards.threatened.extend(reach(snap.grid, bomb, self.range));
        }
        hazards
    }
}

/// Items first, the exit once every item is in hand
fn goal_tile(snap: &Snapshot<'_>) -> Tile {
    if snap.items_collected < snap.items_total {
        Tile::Item
    } else {
        Tile::Exit
    }
}

/// Tiles a bomb at `center` would cover, without touching the grid
fn reach(grid: &Grid, center: TileCoord, range: u32) -> Vec<TileCoord> {
    let mut tiles = vec![center];
    for (dc, dr) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        for step in 1..=i32::try_from(range).unwrap_or(i32::MAX) {
            let tile = center.offset(dc * step, dr * step);
            match grid.get(tile) {
                None | Some(Tile::Wall) => break,
                Some(Tile::Breakable) => {
                    tiles.push(tile);
                    break;
                }
                Some(_) => tiles.push(tile),
            }
        }
    }
    tiles
}

/// Shortest path from `start` to the first tile matching `goal`.
///
/// The returned path includes `start`. `avoid` tiles are never expanded
/// except `start` itself.
fn bfs<F>(
    grid: &Grid,
    start: TileCoord,
    avoid: &HashSet<TileCoord>,
    goal: F,
) -> Option<Vec<TileCoord>>
where
    F: Fn(TileCoord) -> bool,
{
    let cols = grid.cols() as usize;
    let index = |tile: TileCoord| tile.row as usize * cols + tile.col as usize;
    let mut parent: Vec<Option<TileCoord>> = vec![None; cols * grid.rows() as usize];
    let mut seen = vec![false; parent.len()];
    let mut queue = VecDeque::new();

    if !grid.in_bounds(start) {
        return None;
    }
    seen[index(start)] = true;
    queue.push_back(start);

    while let Some(tile) = queue.pop_front() {
        if goal(tile) {
            let mut path = vec![tile];
            let mut cursor = tile;
            while let Some(prev) = parent[index(cursor)] {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }
        for next in tile.neighbors() {
            if grid.is_blocking(next) || avoid.contains(&next) || seen[index(next)] {
                continue;
            }
            seen[index(next)] = true;
            parent[index(next)] = Some(tile);
            queue.push_back(next);
        }
    }
    None
}

fn toward(from: TileCoord, to: TileCoord) -> TickInput {
    TickInput {
        left: to.col < from.col,
        right: to.col > from.col,
        up: to.row < from.row,
        down: to.row > from.row,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::{EndReason, Level, Owner, PatrolRoute, RoundOutcome, Session, run_round};

    fn session(
        player: TileCoord,
        guard: TileCoord,
        items: &[TileCoord],
        exit: TileCoord,
        walls: &[TileCoord],
    ) -> Session {
        let mut grid = Grid::walled(10, 8);
        for &wall in walls {
            grid.set_tile(wall, Tile::Wall).unwrap();
        }
        for &item in items {
            grid.set_tile(item, Tile::Item).unwrap();
        }
        grid.set_tile(exit, Tile::Exit).unwrap();
        let level = Level {
            grid,
            player_spawn: player,
            guard_spawn: guard,
            patrol: PatrolRoute::new(guard, []),
            items: items.to_vec(),
            exit: Some(exit),
            degraded: Vec::new(),
        };
        Session::from_level(Settings::default(), level, 3)
    }

    fn pilot() -> Autopilot {
        Autopilot::new(&Settings::default())
    }

    #[test]
    fn test_heads_for_nearest_item() {
        let s = session(
            TileCoord::new(2, 2),
            TileCoord::new(8, 6),
            &[TileCoord::new(5, 2), TileCoord::new(2, 6)],
            TileCoord::new(7, 5),
            &[],
        );
        let input = pilot().steer(&s.snapshot());
        assert_eq!(
            input,
            TickInput {
                right: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_heads_for_exit_when_done() {
        let mut s = session(
            TileCoord::new(2, 2),
            TileCoord::new(8, 6),
            &[TileCoord::new(5, 2)],
            TileCoord::new(2, 5),
            &[],
        );
        s.items_collected = 1;
        let input = pilot().steer(&s.snapshot());
        assert_eq!(
            input,
            TickInput {
                down: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_idles_when_unreachable() {
        let walls = [
            TileCoord::new(2, 1),
            TileCoord::new(1, 2),
            TileCoord::new(3, 2),
            TileCoord::new(2, 3),
        ];
        let s = session(
            TileCoord::new(2, 2),
            TileCoord::new(8, 6),
            &[TileCoord::new(6, 4)],
            TileCoord::new(7, 5),
            &walls,
        );
        assert_eq!(pilot().steer(&s.snapshot()), TickInput::default());
    }

    #[test]
    fn test_routes_around_sight_cone() {
        // Guard at (4,1) watches (4,2)..(4,4); the item sits behind the cone
        let s = session(
            TileCoord::new(2, 2),
            TileCoord::new(4, 1),
            &[TileCoord::new(6, 2)],
            TileCoord::new(7, 6),
            &[],
        );
        let snap = s.snapshot();
        let hazards = pilot().hazards(&snap);
        let path = bfs(snap.grid, snap.player.body.tile, &hazards.forbidden, |t| {
            snap.grid.get(t) == Some(Tile::Item)
        })
        .unwrap();
        assert!(path.iter().all(|t| !snap.sight.contains(t)));
        assert!(path.contains(&TileCoord::new(4, 5)));
    }

    #[test]
    fn test_leaves_bomb_reach() {
        let mut s = session(
            TileCoord::new(2, 2),
            TileCoord::new(8, 6),
            &[TileCoord::new(5, 2)],
            TileCoord::new(7, 5),
            &[],
        );
        let tile = s.player.body.tile;
        s.ordnance.place_bomb(&s.grid, tile, Owner::Player, 0.0).unwrap();

        let input = pilot().steer(&s.snapshot());
        assert_ne!(input, TickInput::default());
        assert!(!input.quit);
    }

    #[test]
    fn test_reach_stops_at_walls() {
        let mut grid = Grid::walled(8, 8);
        grid.set_tile(TileCoord::new(4, 3), Tile::Breakable).unwrap();
        let tiles = reach(&grid, TileCoord::new(3, 3), 2);
        assert!(tiles.contains(&TileCoord::new(4, 3)));
        assert!(!tiles.contains(&TileCoord::new(5, 3)));
        assert!(tiles.contains(&TileCoord::new(1, 3)));
        assert!(!tiles.contains(&TileCoord::new(0, 3)));
    }

    #[test]
    fn test_autopilot_clears_open_level() {
        let walls = [TileCoord::new(4, 1), TileCoord::new(4, 2), TileCoord::new(4, 3)];
        let mut s = session(
            TileCoord::new(2, 2),
            TileCoord::new(8, 1),
            &[TileCoord::new(6, 2), TileCoord::new(2, 6)],
            TileCoord::new(7, 6),
            &walls,
        );
        let pilot = pilot();
        let mut ticks = 0u32;
        let outcome = run_round(
            &mut s,
            SIM_DT,
            |snap| {
                ticks += 1;
                let mut input = pilot.steer(snap);
                input.quit = ticks > 3000;
                input
            },
            |_| {},
        );
        assert_eq!(outcome, RoundOutcome::Won);
        assert_eq!(s.end_reason, Some(EndReason::Escaped));
        assert_eq!(s.items_collected, 2);
    }
}
