//! Session state and core simulation types
//!
//! Everything a round owns lives in `Session`: the grid, both actors, the
//! ordnance, counters and the seeded RNG. Nothing is global.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::adversary::{Guard, GuardConfig, GuardMode, sight_tiles};
use super::grid::{Grid, TileCoord};
use super::level::{Level, LevelGenerator};
use super::movement::Body;
use super::ordnance::{Ordnance, OrdnanceConfig};
use crate::settings::Settings;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Building the level (never observed between ticks)
    Generating,
    /// Active gameplay
    Running,
    Won,
    Lost,
    Quit,
}

impl SessionPhase {
    pub fn outcome(self) -> Option<RoundOutcome> {
        match self {
            SessionPhase::Won => Some(RoundOutcome::Won),
            SessionPhase::Lost => Some(RoundOutcome::Lost),
            SessionPhase::Quit => Some(RoundOutcome::Quit),
            SessionPhase::Generating | SessionPhase::Running => None,
        }
    }
}

/// Terminal result of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Won,
    Lost,
    Quit,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Reached the exit with every item
    Escaped,
    /// Guard's HP hit zero
    GuardStunned,
    /// Player walked into the sight cone
    Detected,
    /// Player's HP hit zero
    KilledByBlast,
    Quit,
}

impl EndReason {
    pub fn outcome(self) -> RoundOutcome {
        match self {
            EndReason::Escaped | EndReason::GuardStunned => RoundOutcome::Won,
            EndReason::Detected | EndReason::KilledByBlast => RoundOutcome::Lost,
            EndReason::Quit => RoundOutcome::Quit,
        }
    }

    fn phase(self) -> SessionPhase {
        match self.outcome() {
            RoundOutcome::Won => SessionPhase::Won,
            RoundOutcome::Lost => SessionPhase::Lost,
            RoundOutcome::Quit => SessionPhase::Quit,
        }
    }
}

/// Hit points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }
}

/// The player's actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub health: Health,
    /// Pixels per second
    pub speed: f32,
}

impl Player {
    pub fn new(spawn: TileCoord, max_hp: u32, speed: f32) -> Self {
        Self {
            body: Body::at_tile(spawn),
            health: Health::new(max_hp),
            speed,
        }
    }
}

/// One round of play
#[derive(Debug, Clone)]
pub struct Session {
    /// Round seed for reproducibility
    pub seed: u64,
    pub settings: Settings,
    pub grid: Grid,
    pub player: Player,
    pub guard: Guard,
    pub guard_config: GuardConfig,
    pub ordnance: Ordnance,
    pub exit: Option<TileCoord>,
    pub items_collected: u32,
    pub items_total: u32,
    /// Seconds since round start, advanced once per tick
    pub clock: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: SessionPhase,
    pub end_reason: Option<EndReason>,
    pub(crate) rng: Pcg32,
}

impl Session {
    /// Generate a fresh level and start the round
    pub fn new(settings: Settings, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let level = LevelGenerator::from_settings(&settings).generate(&mut rng);
        Self::start(settings, level, seed, rng)
    }

    /// Start a round on a prepared level
    pub fn from_level(settings: Settings, level: Level, seed: u64) -> Self {
        Self::start(settings, level, seed, Pcg32::seed_from_u64(seed))
    }

    fn start(settings: Settings, level: Level, seed: u64, rng: Pcg32) -> Self {
        let items_total = level.item_total();
        let mut session = Self {
            seed,
            player: Player::new(level.player_spawn, settings.player_max_hp, settings.player_speed),
            guard: Guard::new(level.guard_spawn, level.patrol, settings.guard_max_hp),
            guard_config: GuardConfig::from_settings(&settings),
            ordnance: Ordnance::new(OrdnanceConfig {
                fuse_secs: settings.fuse_secs,
                blast_secs: settings.blast_secs,
                range: settings.explosion_range,
            }),
            grid: level.grid,
            exit: level.exit,
            items_collected: 0,
            items_total,
            clock: 0.0,
            time_ticks: 0,
            phase: SessionPhase::Generating,
            end_reason: None,
            rng,
            settings,
        };
        session.phase = SessionPhase::Running;
        log::info!(
            "Round {} started: player {:?}, guard {:?}, {} items",
            seed,
            session.player.body.tile,
            session.guard.body.tile,
            items_total
        );
        session
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.phase.outcome()
    }

    /// Record the terminal result. Only the first call has any effect.
    pub(crate) fn finish(&mut self, reason: EndReason) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.phase = reason.phase();
        self.end_reason = Some(reason);
        log::info!(
            "Round {} ended after {} ticks: {:?} ({:?}), items {}/{}",
            self.seed,
            self.time_ticks,
            reason.outcome(),
            reason,
            self.items_collected,
            self.items_total
        );
    }

    /// Read-only view for the render step
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            grid: &self.grid,
            player: ActorView {
                body: self.player.body,
                health: self.player.health,
            },
            guard: ActorView {
                body: self.guard.body,
                health: self.guard.health,
            },
            guard_mode: self.guard.mode,
            sight: sight_tiles(&self.grid, self.guard.body.tile, self.guard_config.sight_range),
            bombs: self.ordnance.bomb_ages(self.clock).collect(),
            blasts: self.ordnance.blast_tiles(self.clock).collect(),
            items_collected: self.items_collected,
            items_total: self.items_total,
            exit: self.exit,
            clock: self.clock,
            time_ticks: self.time_ticks,
            phase: self.phase,
        }
    }
}

/// Position and health of one actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorView {
    pub body: Body,
    pub health: Health,
}

/// Everything the render step needs after a tick
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub grid: &'a Grid,
    pub player: ActorView,
    pub guard: ActorView,
    pub guard_mode: GuardMode,
    /// Tiles covered by the guard's sight cone
    pub sight: Vec<TileCoord>,
    /// Live bombs with age in seconds
    pub bombs: Vec<(TileCoord, f64)>,
    /// Live blast tiles with age in seconds
    pub blasts: Vec<(TileCoord, f64)>,
    pub items_collected: u32,
    pub items_total: u32,
    pub exit: Option<TileCoord>,
    pub clock: f64,
    pub time_ticks: u64,
    pub phase: SessionPhase,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Tile;

    #[test]
    fn test_new_session_is_running() {
        let session = Session::new(Settings::default(), 12345);
        assert_eq!(session.phase, SessionPhase::Running);
        assert_eq!(session.outcome(), None);
        assert_eq!(session.player.health.current, Settings::default().player_max_hp);
        assert_eq!(session.guard.health.current, Settings::default().guard_max_hp);
        assert_eq!(session.items_total, 3);
        assert_eq!(session.grid.tile_at(session.player.body.tile), Ok(Tile::Floor));
    }

    #[test]
    fn test_finish_only_once() {
        let mut session = Session::new(Settings::default(), 1);
        session.finish(EndReason::Detected);
        session.finish(EndReason::Escaped);
        assert_eq!(session.outcome(), Some(RoundOutcome::Lost));
        assert_eq!(session.end_reason, Some(EndReason::Detected));
    }

    #[test]
    fn test_health_saturates() {
        let mut health = Health::new(2);
        health.damage(1);
        assert!(!health.is_depleted());
        health.damage(5);
        assert_eq!(health.current, 0);
        assert!(health.is_depleted());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let session = Session::new(Settings::default(), 77);
        let snap = session.snapshot();
        assert_eq!(snap.player.body, session.player.body);
        assert_eq!(snap.items_total, 3);
        assert!(snap.bombs.is_empty());
        assert!(snap.blasts.is_empty());
        assert!(snap.sight.len() <= 3);
        assert_eq!(snap.phase, SessionPhase::Running);
    }
}
