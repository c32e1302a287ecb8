#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded spawning system that grows the map and its waiting crowds.
//!
//! The system reacts to world events with spawn commands: a new station on
//! every `station_every_days`-th day and one passenger at a random station per
//! elapsed `passenger_interval` of simulated time.

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use transit_core::{
    ensure_positive, whole_periods, Command, ConfigError, Event, GamePhase, StationId,
    StationShape,
};

/// Most passenger spawns emitted for a single batch of events.
///
/// Stations stop accepting passengers at the overflow threshold, so a longer
/// step gains nothing from further attempts.
pub const MAX_PASSENGER_SPAWNS_PER_BATCH: usize = 1_024;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Simulated time between two passenger spawns.
    pub passenger_interval: Duration,
    /// A station spawns whenever the new day is a multiple of this value.
    pub station_every_days: u32,
    /// Center of the map that spawned stations surround.
    pub map_center: Vec2,
    /// Inclusive lower bound of the spawn distance from the center.
    pub min_spawn_radius: f32,
    /// Exclusive upper bound of the spawn distance from the center.
    pub max_spawn_radius: f32,
    /// Seed of the random source.
    pub rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided passenger cadence and seed.
    #[must_use]
    pub fn new(passenger_interval: Duration, rng_seed: u64) -> Self {
        Self {
            passenger_interval,
            rng_seed,
            ..Self::default()
        }
    }

    /// Rejects settings that would stall spawning or produce an empty radius range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passenger_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "passenger_interval",
            });
        }
        if self.station_every_days == 0 {
            return Err(ConfigError::ZeroCount {
                name: "station_every_days",
            });
        }
        ensure_positive("max_spawn_radius", self.max_spawn_radius)?;
        if !(self.min_spawn_radius >= 0.0 && self.min_spawn_radius < self.max_spawn_radius) {
            return Err(ConfigError::EmptyRange {
                name: "spawn_radius",
                start: self.min_spawn_radius,
                end: self.max_spawn_radius,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            passenger_interval: Duration::from_secs(2),
            station_every_days: 5,
            map_center: Vec2::new(400.0, 300.0),
            min_spawn_radius: 200.0,
            max_spawn_radius: 300.0,
            rng_seed: 0x5eed_7a11_c0ff_ee00,
        }
    }
}

/// Pure system that emits spawn commands while the game is playing.
#[derive(Clone, Debug)]
pub struct Spawning {
    config: Config,
    accumulator: Duration,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a spawning system after validating the configuration.
    pub fn try_new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Creates a new spawning system using the supplied configuration.
    ///
    /// The configuration is not validated. An empty spawn radius range places
    /// stations at `min_spawn_radius`, and a zero passenger interval disables
    /// passenger spawns. Use [`Spawning::try_new`] to reject such settings.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    /// Simulated time accumulated toward the next passenger spawn.
    #[must_use]
    pub fn pending(&self) -> Duration {
        self.accumulator
    }

    /// Consumes events and the current station list to emit spawn commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        phase: GamePhase,
        stations: &[StationId],
        out: &mut Vec<Command>,
    ) {
        if phase != GamePhase::Playing {
            self.accumulator = Duration::ZERO;
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => accumulated = accumulated.saturating_add(*dt),
                Event::DayStarted { day, .. } => {
                    if self.is_station_day(*day) {
                        out.push(self.next_station());
                    }
                }
                Event::SimulationReset => {
                    self.accumulator = Duration::ZERO;
                    accumulated = Duration::ZERO;
                }
                _ => {}
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let spawn_attempts = self.resolve_spawn_attempts();
        if stations.is_empty() {
            return;
        }

        for _ in 0..spawn_attempts {
            let station = stations[self.rng.gen_range(0..stations.len())];
            out.push(Command::SpawnPassenger { station });
        }
    }

    fn is_station_day(&self, day: u32) -> bool {
        self.config.station_every_days != 0 && day % self.config.station_every_days == 0
    }

    fn next_station(&mut self) -> Command {
        let angle = self.rng.gen_range(0.0..TAU);
        let (min, max) = (self.config.min_spawn_radius, self.config.max_spawn_radius);
        let radius = if min < max {
            self.rng.gen_range(min..max)
        } else {
            min
        };
        let shape = StationShape::ALL[self.rng.gen_range(0..StationShape::ALL.len())];
        Command::SpawnStation {
            position: self.config.map_center + Vec2::from_angle(angle) * radius,
            shape,
        }
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        let (intervals, left) = whole_periods(self.accumulator, self.config.passenger_interval);
        self.accumulator = left;
        usize::try_from(intervals)
            .unwrap_or(usize::MAX)
            .min(MAX_PASSENGER_SPAWNS_PER_BATCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_spawn_attempts_without_interval() {
        let mut spawning = Spawning::new(Config::new(Duration::ZERO, 1));
        spawning.accumulator = Duration::from_secs(10);
        assert_eq!(spawning.resolve_spawn_attempts(), 0);
    }

    #[test]
    fn huge_accumulation_is_capped_and_keeps_the_remainder() {
        let mut spawning = Spawning::new(Config::new(Duration::from_secs(2), 1));
        spawning.accumulator = Duration::from_secs(10_000_000_001);
        assert_eq!(
            spawning.resolve_spawn_attempts(),
            MAX_PASSENGER_SPAWNS_PER_BATCH
        );
        assert_eq!(spawning.pending(), Duration::from_secs(1));
    }

    #[test]
    fn inverted_radius_range_places_station_at_minimum() {
        let config = Config {
            min_spawn_radius: 300.0,
            max_spawn_radius: 200.0,
            ..Config::default()
        };
        assert!(Spawning::try_new(config).is_err());

        let mut spawning = Spawning::new(config);
        let Command::SpawnStation { position, .. } = spawning.next_station() else {
            panic!("expected a station spawn");
        };
        assert!((position.distance(config.map_center) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn station_days_are_multiples_of_the_cadence() {
        let spawning = Spawning::new(Config::default());
        assert!(!spawning.is_station_day(4));
        assert!(spawning.is_station_day(5));
        assert!(!spawning.is_station_day(6));
        assert!(spawning.is_station_day(10));
    }

    #[test]
    fn validation_rejects_empty_radius_range() {
        let config = Config {
            min_spawn_radius: 300.0,
            max_spawn_radius: 200.0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyRange { name: "spawn_radius", .. })
        ));
        assert!(Config::default().validate().is_ok());
    }
}
