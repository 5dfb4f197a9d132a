//! Fixed timestep simulation tick
//!
//! Advances one round by one step. The order inside a running tick is fixed:
//! ordnance, terminal checks, player input, pickups and exit, then the guard.

use glam::Vec2;

use super::adversary::can_see;
use super::grid::Tile;
use super::movement::{CollisionPolicy, try_move};
use super::ordnance::{Owner, Target};
use super::state::{EndReason, RoundOutcome, Session, SessionPhase, Snapshot};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Edge-triggered: drop a bomb on the player's tile this tick
    pub place_bomb: bool,
    /// Leave the round
    pub quit: bool,
}

impl TickInput {
    /// Resolve held directions into a movement direction.
    ///
    /// Down beats up and right beats left. Without diagonal movement a held
    /// vertical direction cancels the horizontal one.
    pub fn direction(&self, diagonal: bool) -> Vec2 {
        let y = if self.down {
            1.0
        } else if self.up {
            -1.0
        } else {
            0.0
        };
        let mut x = if self.right {
            1.0
        } else if self.left {
            -1.0
        } else {
            0.0
        };
        if x != 0.0 && y != 0.0 && !diagonal {
            x = 0.0;
        }
        Vec2::new(x, y).normalize_or_zero()
    }
}

/// Advance the session by one fixed timestep.
///
/// Returns the round outcome once the round has ended. Ticking a finished
/// session changes nothing and returns the same outcome.
pub fn tick(session: &mut Session, input: &TickInput, dt: f32) -> Option<RoundOutcome> {
    if session.phase != SessionPhase::Running {
        return session.outcome();
    }

    if input.quit {
        session.finish(EndReason::Quit);
        return session.outcome();
    }

    session.time_ticks += 1;
    session.clock += dt as f64;
    let now = session.clock;

    // 1. Fuses, blasts and damage
    session.ordnance.advance(&mut session.grid, now);
    if session.ordnance.strike(Target::Player, &session.player.body) {
        session.player.health.damage(1);
        log::debug!("Player caught in blast, hp {}", session.player.health.current);
    }
    if session.ordnance.strike(Target::Guard, &session.guard.body) {
        session.guard.health.damage(1);
        log::debug!("Guard caught in blast, hp {}", session.guard.health.current);
    }

    // 2. Terminal checks
    if session.player.health.is_depleted() {
        session.finish(EndReason::KilledByBlast);
        return session.outcome();
    }
    if session.guard.health.is_depleted() {
        session.finish(EndReason::GuardStunned);
        return session.outcome();
    }
    if can_see(
        &session.grid,
        session.guard.body.tile,
        session.player.body.tile,
        session.guard_config.sight_range,
    ) {
        session.finish(EndReason::Detected);
        return session.outcome();
    }

    // 3. Player input
    if input.place_bomb {
        let tile = session.player.body.tile;
        if let Err(err) = session
            .ordnance
            .place_bomb(&session.grid, tile, Owner::Player, now)
        {
            log::trace!("Player bomb ignored: {}", err);
        }
    }
    let velocity = input.direction(session.settings.diagonal_movement) * session.player.speed;
    try_move(
        &session.grid,
        &mut session.player.body,
        velocity,
        dt,
        CollisionPolicy::Slide,
    );

    // 4. Pickups and exit
    let tile = session.player.body.tile;
    if session.grid.get(tile) == Some(Tile::Item)
        && session.grid.set_tile(tile, Tile::Floor).is_ok()
    {
        session.items_collected += 1;
        log::debug!(
            "Picked up item at {:?} ({}/{})",
            tile,
            session.items_collected,
            session.items_total
        );
    }
    if session.grid.get(tile) == Some(Tile::Exit)
        && session.items_collected == session.items_total
    {
        session.finish(EndReason::Escaped);
        return session.outcome();
    }

    // 5. Guard
    session.guard.update(
        &session.grid,
        &mut session.ordnance,
        tile,
        now,
        dt,
        &session.guard_config,
        &mut session.rng,
    );

    None
}

/// Run a round to completion.
///
/// `input` is asked for one snapshot per tick and `render` sees the state
/// after every tick, including the final one.
pub fn run_round<I, R>(session: &mut Session, dt: f32, mut input: I, mut render: R) -> RoundOutcome
where
    I: FnMut(&Snapshot<'_>) -> TickInput,
    R: FnMut(&Snapshot<'_>),
{
    loop {
        let next = input(&session.snapshot());
        let outcome = tick(session, &next, dt);
        render(&session.snapshot());
        if let Some(outcome) = outcome {
            return outcome;
        }
    }
}
