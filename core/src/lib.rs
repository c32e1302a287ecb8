#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the transit simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters translate player gestures
//! into [`Command`] values, the world executes those commands via its `apply`
//! entry point, and then broadcasts [`Event`] values for systems to react to
//! deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

pub mod geometry;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{
    elbow_waypoint, line_waypoints, resolve_along_line, resolve_on_segment, segment_at,
    stop_progress, PathPose, SegmentPosition,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new, empty station be placed on the map.
    SpawnStation {
        /// Map position of the new station.
        position: Vec2,
        /// Shape assigned to the new station.
        shape: StationShape,
    },
    /// Requests that one passenger start waiting at the given station.
    SpawnPassenger {
        /// Station receiving the passenger.
        station: StationId,
    },
    /// Opens a new line starting at the given station together with its train.
    OpenLine {
        /// First station of the line.
        station: StationId,
        /// Display color assigned to the line.
        color: LineColor,
    },
    /// Appends a station to the end of an existing line.
    ExtendLine {
        /// Line being extended.
        line: LineId,
        /// Station appended to the line.
        station: StationId,
    },
    /// Restores the initial network after a game over.
    Reset,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new day began and the score was settled.
    DayStarted {
        /// Day that just started.
        day: u32,
        /// Cumulative score after settling the previous day.
        score: u64,
    },
    /// Confirms that a station was added to the map.
    StationSpawned {
        /// Identifier assigned to the station.
        station: StationId,
        /// Shape of the station.
        shape: StationShape,
        /// Map position of the station.
        position: Vec2,
    },
    /// Confirms that a passenger started waiting at a station.
    PassengerSpawned {
        /// Station that received the passenger.
        station: StationId,
        /// Number of passengers now waiting at the station.
        waiting: u32,
    },
    /// Confirms that a line and its paired train were created.
    LineOpened {
        /// Identifier assigned to the line.
        line: LineId,
        /// Identifier assigned to the train shuttling along the line.
        train: TrainId,
        /// First station of the line.
        station: StationId,
    },
    /// Confirms that a station was appended to a line.
    LineExtended {
        /// Line that grew.
        line: LineId,
        /// Station appended to the line.
        station: StationId,
    },
    /// Reports that a train reached a stop on its line.
    TrainArrived {
        /// Train that arrived.
        train: TrainId,
        /// Station the train stopped at.
        station: StationId,
    },
    /// Reports passengers leaving a train at a station of matching shape.
    PassengersDelivered {
        /// Train that delivered the passengers.
        train: TrainId,
        /// Station the passengers were delivered to.
        station: StationId,
        /// Number of passengers delivered.
        count: u32,
    },
    /// Reports passengers boarding a train.
    PassengersBoarded {
        /// Train the passengers boarded.
        train: TrainId,
        /// Station the passengers left.
        station: StationId,
        /// Number of passengers that boarded.
        count: u32,
    },
    /// Reports that a train's delivery highlight expired.
    DeliveryEffectCleared {
        /// Train whose highlight expired.
        train: TrainId,
    },
    /// Announces that too many stations overflowed and the game ended.
    GameOver {
        /// Final score.
        score: u64,
        /// Day on which the game ended.
        day: u32,
    },
    /// Announces that the world returned to its initial network.
    SimulationReset,
}

/// Lifecycle phase of the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Trains move, clocks run and gestures build the network.
    #[default]
    Playing,
    /// Terminal state reached through overflow; only a reset leaves it.
    GameOver,
}

/// Closed set of station shapes. Passengers carry the shape they must reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StationShape {
    /// Round station.
    Circle,
    /// Square station.
    Square,
    /// Triangular station.
    Triangle,
}

impl StationShape {
    /// Every shape in declaration order.
    pub const ALL: [StationShape; 3] = [Self::Circle, Self::Square, Self::Triangle];

    /// Shape used for the station at `index` in a cyclic layout.
    #[must_use]
    pub const fn cycled(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

/// Direction a train travels along its line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TravelDirection {
    /// Toward the last station of the line (progress increasing).
    #[default]
    Forward,
    /// Toward the first station of the line (progress decreasing).
    Backward,
}

impl TravelDirection {
    /// Signed unit factor applied to train speed: `+1` forward, `-1` backward.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }

    /// Opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Opaque display color of a line expressed as a hue in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineColor {
    hue: f32,
}

impl LineColor {
    /// Creates a line color from a hue in degrees; values wrap into `0.0..360.0`.
    #[must_use]
    pub fn from_hue(hue: f32) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
        }
    }

    /// Hue in degrees within `0.0..360.0`.
    #[must_use]
    pub const fn hue(&self) -> f32 {
        self.hue
    }
}

/// Unique identifier assigned to a station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationId(u32);

impl StationId {
    /// Creates a new station identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(u32);

impl LineId {
    /// Creates a new line identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a train.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrainId(u32);

impl TrainId {
    /// Creates a new train identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of a single station used for queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationSnapshot {
    /// Identifier assigned to the station.
    pub id: StationId,
    /// Map position of the station.
    pub position: Vec2,
    /// Shape of the station.
    pub shape: StationShape,
    /// Number of passengers waiting at the station.
    pub passengers: u32,
    /// Indicates that the station is close to overflowing.
    pub crowded: bool,
    /// Indicates that the station reached the overflow threshold.
    pub overflowing: bool,
}

/// Immutable representation of a single line used for queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// Identifier assigned to the line.
    pub id: LineId,
    /// Stations served by the line in path order.
    pub stations: Vec<StationId>,
    /// Display color of the line.
    pub color: LineColor,
    /// Map positions of the stations in path order.
    pub stops: Vec<Vec2>,
    /// Elbow waypoint between each consecutive pair of stops.
    pub waypoints: Vec<Vec2>,
}

impl LineSnapshot {
    /// Reports whether the line contains the provided station.
    #[must_use]
    pub fn contains(&self, station: StationId) -> bool {
        self.stations.contains(&station)
    }
}

/// Immutable representation of a single train used for queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainSnapshot {
    /// Identifier assigned to the train.
    pub id: TrainId,
    /// Line the train shuttles along.
    pub line: LineId,
    /// Normalized progress along the line within `0.0..=1.0`.
    pub progress: f32,
    /// Current travel direction.
    pub direction: TravelDirection,
    /// Shapes of the passengers on board.
    pub passengers: Vec<StationShape>,
    /// Maximum number of passengers on board.
    pub capacity: u32,
    /// Passengers delivered since the current day started.
    pub delivered_today: u32,
    /// Indicates that a delivery highlight is active.
    pub delivery_effect: bool,
    /// Map pose resolved from the line path, when the line has a segment.
    pub pose: Option<PathPose>,
}

/// Immutable representation of the scoring and lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Cumulative score settled at each day rollover.
    pub score: u64,
    /// Current day, starting at 1.
    pub day: u32,
    /// Simulated time remaining before the next day starts.
    pub time_until_next_day: Duration,
    /// Number of stations that reached the overflow threshold.
    pub overflow_count: u32,
    /// Current lifecycle phase.
    pub phase: GamePhase,
}

impl GameSnapshot {
    /// Reports whether the game has ended.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver)
    }
}

/// Read-only capture of the complete simulation taken at a tick boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Every station in creation order.
    pub stations: Vec<StationSnapshot>,
    /// Every line in creation order.
    pub lines: Vec<LineSnapshot>,
    /// Every train in creation order.
    pub trains: Vec<TrainSnapshot>,
    /// Scoring and lifecycle state.
    pub game: GameSnapshot,
}

/// Reasons a configuration is rejected before a simulation is constructed.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A duration that drives a periodic timer was zero.
    #[error("{name} must be a positive duration")]
    ZeroDuration {
        /// Name of the offending setting.
        name: &'static str,
    },
    /// A count that must be positive was zero.
    #[error("{name} must be positive (received 0)")]
    ZeroCount {
        /// Name of the offending setting.
        name: &'static str,
    },
    /// A real-valued setting was not a positive finite number.
    #[error("{name} must be positive and finite (received {value})")]
    NonPositive {
        /// Name of the offending setting.
        name: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// A range setting was empty or reversed.
    #[error("{name} must span a non-empty range (received {start}..{end})")]
    EmptyRange {
        /// Name of the offending setting.
        name: &'static str,
        /// Inclusive lower bound provided.
        start: f32,
        /// Exclusive upper bound provided.
        end: f32,
    },
}

/// Validates that a real-valued setting is positive and finite.
pub fn ensure_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Splits `elapsed` into whole `period`s and the time left over.
///
/// Runs in constant time however many periods fit. A zero period yields no
/// periods and leaves `elapsed` untouched.
#[must_use]
pub fn whole_periods(elapsed: Duration, period: Duration) -> (u128, Duration) {
    let period_nanos = period.as_nanos();
    if period_nanos == 0 {
        return (0, elapsed);
    }

    let elapsed_nanos = elapsed.as_nanos();
    let remainder = elapsed_nanos % period_nanos;
    // The remainder is below `period`, so its whole seconds fit in a `u64`.
    let seconds = u64::try_from(remainder / NANOS_PER_SEC).unwrap_or(u64::MAX);
    let nanos = u32::try_from(remainder % NANOS_PER_SEC).unwrap_or(0);
    (elapsed_nanos / period_nanos, Duration::new(seconds, nanos))
}
