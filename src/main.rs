//! Blastmaze headless driver
//!
//! Plays consecutive rounds with the autopilot and prints the run record as
//! JSON. Rounds either run as fast as possible or paced in real time through
//! a fixed-step accumulator.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;

use blastmaze::autopilot::Autopilot;
use blastmaze::consts::{MAX_SUBSTEPS, SIM_DT};
use blastmaze::records::RoundRecord;
use blastmaze::sim::{RoundOutcome, Session, Snapshot, Tile, TickInput, TileCoord, run_round, tick};
use blastmaze::{RunRecord, Settings};

#[derive(Parser, Debug)]
#[command(name = "blastmaze", about = "Tile-based stealth and bomb maze, played by an autopilot")]
struct Args {
    /// Seed of the first round; each following round uses the next one
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of rounds to play
    #[arg(long, default_value_t = 5)]
    rounds: u32,

    /// Settings file (JSON), missing keys keep their defaults
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Quit a round after this many ticks
    #[arg(long, default_value_t = 7200)]
    max_ticks: u64,

    /// Pace ticks in real time instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Log an ASCII frame every N ticks (debug level)
    #[arg(long, default_value_t = 60)]
    render_every: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load(path).unwrap_or_else(|err| {
            log::warn!("Could not load settings from {}: {}, using defaults", path.display(), err);
            Settings::default()
        }),
        None => Settings::default(),
    };
    log::info!("Blastmaze starting: {} rounds from seed {}", args.rounds, args.seed);

    let pilot = Autopilot::new(&settings);
    let mut run = RunRecord::new();
    let mut seed = args.seed;

    for _ in 0..args.rounds {
        let mut session = Session::new(settings.clone(), seed);
        let outcome = if args.realtime {
            play_realtime(&mut session, &pilot, &args)
        } else {
            play(&mut session, &pilot, &args)
        };

        let streak = run.record(RoundRecord {
            seed,
            outcome,
            reason: session.end_reason,
            ticks: session.time_ticks,
            items_collected: session.items_collected,
            items_total: session.items_total,
        });

        match outcome {
            RoundOutcome::Won => log::info!("Level cleared, streak {}", streak),
            RoundOutcome::Lost => log::info!("Round lost, retrying on a new layout"),
            RoundOutcome::Quit => break,
        }
        seed = seed.wrapping_add(1);
    }

    match serde_json::to_string_pretty(&run) {
        Ok(json) => println!("{}", json),
        Err(err) => log::error!("Failed to serialize run record: {}", err),
    }
}

/// Input for the next tick, quitting once the tick limit is reached
fn next_input(pilot: &Autopilot, snap: &Snapshot<'_>, max_ticks: u64) -> TickInput {
    let mut input = pilot.steer(snap);
    input.quit = snap.time_ticks >= max_ticks;
    input
}

fn render(snap: &Snapshot<'_>, every: u64) {
    let due = snap.phase.outcome().is_some() || (every > 0 && snap.time_ticks % every == 0);
    if due && log::log_enabled!(log::Level::Debug) {
        log::debug!("tick {}\n{}", snap.time_ticks, draw(snap));
    }
}

fn play(session: &mut Session, pilot: &Autopilot, args: &Args) -> RoundOutcome {
    run_round(
        session,
        SIM_DT,
        |snap| next_input(pilot, snap, args.max_ticks),
        |snap| render(snap, args.render_every),
    )
}

fn play_realtime(session: &mut Session, pilot: &Autopilot, args: &Args) -> RoundOutcome {
    let frame = Duration::from_secs_f32(SIM_DT);
    let mut last = Instant::now();
    let mut accumulator = 0.0f32;

    loop {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(0.1);
        last = now;
        accumulator += dt;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = next_input(pilot, &session.snapshot(), args.max_ticks);
            let outcome = tick(session, &input, SIM_DT);
            render(&session.snapshot(), args.render_every);
            if let Some(outcome) = outcome {
                return outcome;
            }
            accumulator -= SIM_DT;
            substeps += 1;
        }

        std::thread::sleep(frame.saturating_sub(now.elapsed()));
    }
}

/// ASCII frame of the current state
fn draw(snap: &Snapshot<'_>) -> String {
    let grid = snap.grid;
    let mut out = String::with_capacity(((grid.cols() + 1) * grid.rows()) as usize + 64);

    for row in 0..grid.rows() as i32 {
        for col in 0..grid.cols() as i32 {
            let tile = TileCoord::new(col, row);
            let glyph = if snap.player.body.tile == tile {
                'P'
            } else if snap.guard.body.tile == tile {
                'G'
            } else if snap.blasts.iter().any(|&(t, _)| t == tile) {
                'x'
            } else if snap.bombs.iter().any(|&(t, _)| t == tile) {
                'o'
            } else if snap.sight.contains(&tile) {
                ':'
            } else {
                match grid.get(tile) {
                    Some(Tile::Wall) | None => '#',
                    Some(Tile::Breakable) => '+',
                    Some(Tile::Item) => '*',
                    Some(Tile::Exit) => 'E',
                    Some(Tile::Floor) => '.',
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "hp {}/{}  guard {}/{} {:?}  items {}/{}  t {:.2}s",
        snap.player.health.current,
        snap.player.health.max,
        snap.guard.health.current,
        snap.guard.health.max,
        snap.guard_mode,
        snap.items_collected,
        snap.items_total,
        snap.clock
    ));
    out
}
