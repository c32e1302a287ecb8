#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the transit simulation without a window.

mod headless;
mod logging;
mod script;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use transit_core::Event;
use transit_rendering::{
    Color, FrameControl, FrameInput, Presentation, RenderingBackend, Scene, SceneStyle,
};
use transit_simulation::{tick, GestureInput, Simulation, SimulationConfig};

use crate::{headless::HeadlessBackend, script::LineArg};

/// Headless transit network simulation.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed for station placement, passenger spawns and line colors.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Maximum number of frames to simulate.
    #[arg(long, default_value_t = 36_000)]
    frames: u64,
    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Line to draw through the listed station ids, e.g. `--line 0,1,2`. Repeatable.
    #[arg(long = "line", value_name = "STATIONS")]
    lines: Vec<LineArg>,
    /// Print the final snapshot as JSON instead of a summary.
    #[arg(long)]
    json: bool,
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct RunStats {
    frames: u64,
    delivered: u64,
    boarded: u64,
    passengers_spawned: u64,
    stations_spawned: u64,
}

impl RunStats {
    fn record(&mut self, events: &[Event]) {
        self.frames += 1;
        for event in events {
            match event {
                Event::PassengersDelivered { count, .. } => self.delivered += u64::from(*count),
                Event::PassengersBoarded { count, .. } => self.boarded += u64::from(*count),
                Event::PassengerSpawned { .. } => self.passengers_spawned += 1,
                Event::StationSpawned {
                    station, shape, ..
                } => {
                    self.stations_spawned += 1;
                    info!("station {} ({shape:?}) opened", station.get());
                }
                Event::LineOpened { line, station, .. } => {
                    info!("line {} opened at station {}", line.get(), station.get());
                }
                Event::LineExtended { line, station } => {
                    debug!("line {} extended to station {}", line.get(), station.get());
                }
                Event::DayStarted { day, score } => debug!("day {day} started, score {score}"),
                Event::GameOver { score, day } => {
                    info!("game over on day {day} with score {score}");
                }
                _ => {}
            }
        }
    }
}

fn gesture(input: FrameInput) -> GestureInput {
    let mut gesture = GestureInput {
        reset_requested: input.reset_requested,
        ..GestureInput::default()
    };
    if let Some(point) = input.cursor_world_space {
        if input.activate {
            gesture.activated = Some(point);
        } else if input.dragging {
            gesture.dragged_over = Some(point);
        }
    }
    gesture
}

/// Entry point for the transit command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut simulation = Simulation::new(SimulationConfig::seeded(args.seed))
        .context("invalid simulation configuration")?;
    let initial = simulation.snapshot();
    let script = script::gestures(&args.lines, &initial)?;
    info!(
        "seed {}: {} stations, {} scripted gestures",
        args.seed,
        initial.stations.len(),
        script.len()
    );

    let backend = HeadlessBackend::new(Duration::from_millis(args.frame_ms), args.frames, script);
    let presentation = Presentation::new(
        "Transit",
        Color::from_rgb_u8(0x1a, 0x1a, 0x2e),
        Scene::from_snapshot(SceneStyle::default(), &initial),
    );

    let mut stats = RunStats::default();
    let mut events = Vec::new();
    backend.run(presentation, |dt, input, scene| {
        events.clear();
        tick(&mut simulation, gesture(input), dt, &mut events);
        stats.record(&events);
        scene.update(&simulation.snapshot());
        if scene.hud.game_over {
            FrameControl::Exit
        } else {
            FrameControl::Continue
        }
    })?;

    let snapshot = simulation.snapshot();
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("failed to encode snapshot")?
        );
        return Ok(());
    }

    let hud = Scene::from_snapshot(SceneStyle::default(), &snapshot).hud;
    println!("frames:     {}", stats.frames);
    println!("day:        {}", hud.day);
    println!("score:      {}", hud.score);
    println!(
        "stations:   {} ({} spawned)",
        snapshot.stations.len(),
        stats.stations_spawned
    );
    println!("lines:      {}", snapshot.lines.len());
    println!(
        "passengers: {} spawned, {} boarded, {} delivered",
        stats.passengers_spawned, stats.boarded, stats.delivered
    );
    match hud.final_score() {
        Some(score) => println!("game over:  final score {score}"),
        None => println!("overflow:   {} stations", hud.overflow_count),
    }
    Ok(())
}
