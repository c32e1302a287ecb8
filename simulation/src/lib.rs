#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver that serializes every mutation of the transit simulation.
//!
//! A [`Simulation`] owns the authoritative world together with the systems
//! that feed it commands. [`tick`] is the only mutator: it turns the frame's
//! gestures into builder commands, advances the world clock, and pumps world
//! events through the spawning system until no further commands are emitted.
//! Renderers read a [`SimulationSnapshot`] taken between frames.

use std::time::Duration;

use log::trace;
use transit_core::{Command, ConfigError, Event, SimulationSnapshot};
use transit_system_builder::NetworkBuilder;
use transit_system_spawning::Spawning;
use transit_world::{self as world, query, World, WorldConfig};

pub use transit_system_builder::GestureInput;

const DEFAULT_SEED: u64 = 0x7a11_5eed;
const BUILDER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Configuration of the world and of every system driving it.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Authoritative world parameters.
    pub world: WorldConfig,
    /// Station and passenger spawning parameters.
    pub spawning: transit_system_spawning::Config,
    /// Gesture handling parameters.
    pub builder: transit_system_builder::Config,
}

impl SimulationConfig {
    /// Default configuration with every random source derived from `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        let world = WorldConfig::default();
        let spawning = transit_system_spawning::Config {
            map_center: world.map_center,
            rng_seed: seed,
            ..transit_system_spawning::Config::default()
        };
        let builder = transit_system_builder::Config {
            rng_seed: seed.rotate_left(32) ^ BUILDER_SEED_SALT,
            ..transit_system_builder::Config::default()
        };
        Self {
            world,
            spawning,
            builder,
        }
    }

    /// Validates the world and system configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world.validate()?;
        self.spawning.validate()?;
        self.builder.validate()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::seeded(DEFAULT_SEED)
    }
}

/// World plus the systems that drive it, advanced one frame at a time by [`tick`].
#[derive(Clone, Debug)]
pub struct Simulation {
    world: World,
    spawning: Spawning,
    builder: NetworkBuilder,
    frame: u64,
}

impl Simulation {
    /// Creates a simulation after validating the provided configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            world: World::with_config(config.world)?,
            spawning: Spawning::try_new(config.spawning)?,
            builder: NetworkBuilder::new(config.builder),
            frame: 0,
        })
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Number of frames applied so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Captures an immutable snapshot of the whole simulation.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        query::snapshot(&self.world)
    }
}

/// Advances the simulation by one frame.
///
/// Gestures are applied first, then `dt` of simulated time, then every spawn
/// the elapsed time triggers. All events produced during the frame are
/// appended to `out_events` in the order they occurred.
pub fn tick(
    simulation: &mut Simulation,
    input: GestureInput,
    dt: Duration,
    out_events: &mut Vec<Event>,
) {
    simulation.frame = simulation.frame.saturating_add(1);
    let Simulation {
        world,
        spawning,
        builder,
        frame,
    } = simulation;

    let mut commands = Vec::new();
    let stations = query::stations(world);
    let active_line = query::active_line(world);
    builder.handle(
        query::phase(world),
        input,
        &stations,
        active_line.as_ref(),
        &mut commands,
    );
    if !commands.is_empty() {
        trace!("frame {frame}: gestures produced {commands:?}");
    }

    let mut events = Vec::new();
    for command in commands.drain(..) {
        world::apply(world, command, &mut events);
    }
    world::apply(world, Command::Tick { dt }, &mut events);

    while !events.is_empty() {
        spawning.handle(
            &events,
            query::phase(world),
            &query::station_ids(world),
            &mut commands,
        );
        out_events.append(&mut events);
        for command in commands.drain(..) {
            world::apply(world, command, &mut events);
        }
    }
}
