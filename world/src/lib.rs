#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the transit simulation.
//!
//! The world owns every station, line and train together with the day clock,
//! the score and the game phase. It is mutated exclusively through [`apply`],
//! one [`Command`] at a time, and exposes read-only views through [`query`].
//! Invalid commands leave the world untouched; nothing here can fail at
//! runtime.

mod clock;
mod motion;
mod network;

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use log::{debug, info};
use transit_core::{
    ensure_positive, Command, ConfigError, Event, GamePhase, StationId, StationShape,
};

use crate::{
    clock::DayClock,
    motion::MotionParams,
    network::{lookup_index, next_id, Network},
};

/// Number of passengers below the overflow threshold at which a station counts as crowded.
pub const CROWDING_MARGIN: u32 = 2;

/// Most `DayStarted` events a single tick emits; earlier days of a longer step are skipped.
pub const MAX_DAYS_ANNOUNCED_PER_TICK: u32 = 1_000;

/// Tunable parameters of the authoritative world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// Center of the map around which stations are laid out.
    pub map_center: Vec2,
    /// Radius of the ring of stations created at setup.
    pub ring_radius: f32,
    /// Number of stations in the initial ring.
    pub initial_station_count: usize,
    /// Progress along a whole line travelled per second of simulated time.
    pub train_speed: f32,
    /// Passengers a train can carry at once.
    pub train_capacity: u32,
    /// Waiting passengers at which a station overflows.
    pub overflow_threshold: u32,
    /// Overflowing stations that end the game.
    pub overflow_station_limit: u32,
    /// Simulated length of one day.
    pub day_duration: Duration,
    /// How long a train's delivery highlight stays visible.
    pub delivery_effect: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map_center: Vec2::new(400.0, 300.0),
            ring_radius: 150.0,
            initial_station_count: 5,
            train_speed: 0.3,
            train_capacity: 4,
            overflow_threshold: 8,
            overflow_station_limit: 3,
            day_duration: Duration::from_millis(1_000),
            delivery_effect: Duration::from_millis(500),
        }
    }
}

impl WorldConfig {
    /// Rejects settings that would stall or break the simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("train_speed", self.train_speed)?;
        if !self.ring_radius.is_finite() || self.ring_radius < 0.0 {
            return Err(ConfigError::NonPositive {
                name: "ring_radius",
                value: self.ring_radius,
            });
        }
        if self.initial_station_count == 0 {
            return Err(ConfigError::ZeroCount {
                name: "initial_station_count",
            });
        }
        if self.train_capacity == 0 {
            return Err(ConfigError::ZeroCount {
                name: "train_capacity",
            });
        }
        if self.overflow_threshold == 0 {
            return Err(ConfigError::ZeroCount {
                name: "overflow_threshold",
            });
        }
        if self.overflow_station_limit == 0 {
            return Err(ConfigError::ZeroCount {
                name: "overflow_station_limit",
            });
        }
        if self.day_duration.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "day_duration",
            });
        }
        Ok(())
    }
}

/// Fixed map location that accumulates waiting passengers.
#[derive(Clone, Debug)]
pub(crate) struct Station {
    pub(crate) id: StationId,
    pub(crate) position: Vec2,
    pub(crate) shape: StationShape,
    pub(crate) passengers: u32,
}

/// Represents the authoritative transit world state.
#[derive(Clone, Debug)]
pub struct World {
    config: WorldConfig,
    stations: Vec<Station>,
    network: Network,
    clock: DayClock,
    score: u64,
    overflow_count: u32,
    phase: GamePhase,
    elapsed: Duration,
}

impl World {
    /// Creates a world with the default configuration and the initial station ring.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(WorldConfig::default())
    }

    /// Creates a world with the provided configuration.
    pub fn with_config(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: WorldConfig) -> Self {
        let mut world = Self {
            clock: DayClock::new(config.day_duration),
            config,
            stations: Vec::new(),
            network: Network::default(),
            score: 0,
            overflow_count: 0,
            phase: GamePhase::Playing,
            elapsed: Duration::ZERO,
        };
        world.lay_out_initial_ring();
        world
    }

    fn lay_out_initial_ring(&mut self) {
        let count = self.config.initial_station_count;
        for index in 0..count {
            let angle = index as f32 / count as f32 * TAU;
            let position =
                self.config.map_center + Vec2::from_angle(angle) * self.config.ring_radius;
            let _ = self.push_station(position, StationShape::cycled(index));
        }
    }

    fn push_station(&mut self, position: Vec2, shape: StationShape) -> StationId {
        let id = StationId::new(next_id(self.stations.len()));
        self.stations.push(Station {
            id,
            position,
            shape,
            passengers: 0,
        });
        id
    }

    fn station(&self, id: StationId) -> Option<&Station> {
        lookup_index(id.get()).and_then(|index| self.stations.get(index))
    }

    fn station_mut(&mut self, id: StationId) -> Option<&mut Station> {
        lookup_index(id.get()).and_then(|index| self.stations.get_mut(index))
    }

    fn reset(&mut self) {
        self.stations.clear();
        self.network.clear();
        self.clock = DayClock::new(self.config.day_duration);
        self.score = 0;
        self.overflow_count = 0;
        self.phase = GamePhase::Playing;
        self.elapsed = Duration::ZERO;
        self.lay_out_initial_ring();
    }

    /// Rolls the day clock and settles the score once if any day started.
    ///
    /// Only the last [`MAX_DAYS_ANNOUNCED_PER_TICK`] days of a long step are
    /// announced. Deliveries are settled at the first rollover, so the skipped
    /// days would all carry the same score.
    fn advance_clock(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let started = self.clock.advance(dt);
        let (first, last) = (*started.start(), *started.end());
        if started.is_empty() {
            return;
        }

        self.score = self
            .score
            .saturating_add(self.network.settle_deliveries());
        let announced = last
            .saturating_sub(MAX_DAYS_ANNOUNCED_PER_TICK - 1)
            .max(first);
        if announced > first {
            debug!("days {first} to {} started unannounced", announced - 1);
        }
        for day in announced..=last {
            debug!("day {day} started with score {}", self.score);
            out_events.push(Event::DayStarted {
                day,
                score: self.score,
            });
        }
    }

    /// Recounts overflowing stations and ends the game once too many overflow.
    fn refresh_overflow(&mut self, out_events: &mut Vec<Event>) {
        let threshold = self.config.overflow_threshold;
        let overflowing = self
            .stations
            .iter()
            .filter(|station| station.passengers >= threshold)
            .count();
        self.overflow_count = u32::try_from(overflowing).unwrap_or(u32::MAX);

        if self.phase == GamePhase::Playing
            && self.overflow_count >= self.config.overflow_station_limit
        {
            self.phase = GamePhase::GameOver;
            let day = self.clock.day();
            info!(
                "game over on day {day}: {} stations overflowing, final score {}",
                self.overflow_count, self.score
            );
            out_events.push(Event::GameOver {
                score: self.score,
                day,
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.phase == GamePhase::GameOver {
        if command == Command::Reset {
            world.reset();
            info!("world reset to {} stations", world.stations.len());
            out_events.push(Event::SimulationReset);
        }
        return;
    }

    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.elapsed = world.elapsed.saturating_add(dt);
            motion::expire_effects(&mut world.network, world.elapsed, out_events);
            world.advance_clock(dt, out_events);

            let params = MotionParams {
                speed: world.config.train_speed,
                now: world.elapsed,
                effect_duration: world.config.delivery_effect,
            };
            motion::advance_trains(
                &mut world.network,
                &mut world.stations,
                dt,
                params,
                out_events,
            );
            world.refresh_overflow(out_events);
        }
        Command::SpawnStation { position, shape } => {
            let station = world.push_station(position, shape);
            debug!("spawned {shape:?} station {} at {position}", station.get());
            out_events.push(Event::StationSpawned {
                station,
                shape,
                position,
            });
        }
        Command::SpawnPassenger { station } => {
            let threshold = world.config.overflow_threshold;
            let Some(target) = world.station_mut(station) else {
                return;
            };
            if target.passengers >= threshold {
                return;
            }
            target.passengers += 1;
            let waiting = target.passengers;
            out_events.push(Event::PassengerSpawned { station, waiting });
            world.refresh_overflow(out_events);
        }
        Command::OpenLine { station, color } => {
            let capacity = world.config.train_capacity;
            let Some(first) = lookup_index(station.get()).and_then(|i| world.stations.get(i))
            else {
                return;
            };
            let (line, train) = world.network.open_line(first, color, capacity);
            debug!(
                "opened line {} with train {} at station {}",
                line.get(),
                train.get(),
                station.get()
            );
            out_events.push(Event::LineOpened {
                line,
                train,
                station,
            });
        }
        Command::ExtendLine { line, station } => {
            let Some(next) = world.station(station).cloned() else {
                return;
            };
            if world.network.extend_line(line, &next) {
                debug!("extended line {} to station {}", line.get(), station.get());
                out_events.push(Event::LineExtended { line, station });
            }
        }
        Command::Reset => {}
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use transit_core::{
        GamePhase, GameSnapshot, LineId, LineSnapshot, SimulationSnapshot, StationId,
        StationSnapshot, TrainSnapshot,
    };

    use super::{World, WorldConfig, CROWDING_MARGIN};

    /// Provides read-only access to the configuration the world runs with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Reports the current lifecycle phase.
    #[must_use]
    pub fn phase(world: &World) -> GamePhase {
        world.phase
    }

    /// Total simulated time applied since the world was created or reset.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Identifiers of every station in creation order.
    #[must_use]
    pub fn station_ids(world: &World) -> Vec<StationId> {
        world.stations.iter().map(|station| station.id).collect()
    }

    /// Captures a read-only view of a single station.
    #[must_use]
    pub fn station(world: &World, id: StationId) -> Option<StationSnapshot> {
        world.station(id).map(|station| station_snapshot(world, station))
    }

    /// Captures a read-only view of every station in creation order.
    #[must_use]
    pub fn stations(world: &World) -> Vec<StationSnapshot> {
        world
            .stations
            .iter()
            .map(|station| station_snapshot(world, station))
            .collect()
    }

    /// Captures a read-only view of a single line.
    #[must_use]
    pub fn line(world: &World, id: LineId) -> Option<LineSnapshot> {
        world.network.line(id).map(|line| line.snapshot())
    }

    /// Captures the line that gestures currently extend: the most recently opened one.
    #[must_use]
    pub fn active_line(world: &World) -> Option<LineSnapshot> {
        world.network.active_line().map(|line| line.snapshot())
    }

    /// Captures a read-only view of every line in creation order.
    #[must_use]
    pub fn lines(world: &World) -> Vec<LineSnapshot> {
        world.network.lines.iter().map(|line| line.snapshot()).collect()
    }

    /// Captures a read-only view of every train in creation order.
    #[must_use]
    pub fn trains(world: &World) -> Vec<TrainSnapshot> {
        world
            .network
            .trains
            .iter()
            .map(|train| train.snapshot(world.network.line(train.line)))
            .collect()
    }

    /// Captures the scoring and lifecycle state.
    #[must_use]
    pub fn game(world: &World) -> GameSnapshot {
        GameSnapshot {
            score: world.score,
            day: world.clock.day(),
            time_until_next_day: world.clock.time_until_next_day(),
            overflow_count: world.overflow_count,
            phase: world.phase,
        }
    }

    /// Captures the complete world for renderers and adapters.
    #[must_use]
    pub fn snapshot(world: &World) -> SimulationSnapshot {
        SimulationSnapshot {
            stations: stations(world),
            lines: lines(world),
            trains: trains(world),
            game: game(world),
        }
    }

    fn station_snapshot(world: &World, station: &super::Station) -> StationSnapshot {
        let threshold = world.config.overflow_threshold;
        StationSnapshot {
            id: station.id,
            position: station.position,
            shape: station.shape,
            passengers: station.passengers,
            crowded: station.passengers >= threshold.saturating_sub(CROWDING_MARGIN),
            overflowing: station.passengers >= threshold,
        }
    }
}
