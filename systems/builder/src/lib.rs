#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure network-building system that turns station gestures into line commands.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use transit_core::{
    ensure_positive, Command, ConfigError, GamePhase, LineColor, LineSnapshot, StationId,
    StationSnapshot,
};

/// Configuration parameters required to construct the builder system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Distance from a station center within which a gesture hits the station.
    pub pick_radius: f32,
    /// Seed of the random source used to pick line colors.
    pub rng_seed: u64,
}

impl Config {
    /// Rejects a pick radius that could never hit a station.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("pick_radius", self.pick_radius)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pick_radius: 20.0,
            rng_seed: 0x11ae_c010_u64,
        }
    }
}

/// Input snapshot distilled from adapter-provided pointer gestures.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureInput {
    /// Map point the player activated (clicked) on this frame.
    pub activated: Option<Vec2>,
    /// Map point the player dragged over on this frame.
    pub dragged_over: Option<Vec2>,
    /// Indicates that the player asked to start over.
    pub reset_requested: bool,
}

impl GestureInput {
    /// Input activating the provided map point.
    #[must_use]
    pub const fn activate(point: Vec2) -> Self {
        Self {
            activated: Some(point),
            dragged_over: None,
            reset_requested: false,
        }
    }

    /// Input dragging over the provided map point.
    #[must_use]
    pub const fn drag_over(point: Vec2) -> Self {
        Self {
            activated: None,
            dragged_over: Some(point),
            reset_requested: false,
        }
    }

    /// Input requesting a reset.
    #[must_use]
    pub const fn reset() -> Self {
        Self {
            activated: None,
            dragged_over: None,
            reset_requested: true,
        }
    }
}

/// Builder system that translates gestures into line and reset commands.
#[derive(Clone, Debug)]
pub struct NetworkBuilder {
    pick_radius: f32,
    rng: ChaCha8Rng,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl NetworkBuilder {
    /// Creates a new builder system instance.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            pick_radius: config.pick_radius,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes gestures and read-only world views to emit builder commands.
    ///
    /// While playing, an activated station opens a new line and a station
    /// dragged over extends `active_line` unless the line already serves it.
    /// After a game over, any activation or explicit request emits a reset and
    /// drags are ignored.
    pub fn handle(
        &mut self,
        phase: GamePhase,
        input: GestureInput,
        stations: &[StationSnapshot],
        active_line: Option<&LineSnapshot>,
        out: &mut Vec<Command>,
    ) {
        if phase == GamePhase::GameOver {
            if input.reset_requested || input.activated.is_some() {
                out.push(Command::Reset);
            }
            return;
        }

        if let Some(point) = input.activated {
            if let Some(station) = pick_station(stations, point, self.pick_radius, |_| false) {
                let color = LineColor::from_hue(self.rng.gen_range(0.0..360.0));
                out.push(Command::OpenLine { station, color });
            }
            return;
        }

        if let (Some(point), Some(line)) = (input.dragged_over, active_line) {
            if let Some(station) =
                pick_station(stations, point, self.pick_radius, |id| line.contains(id))
            {
                out.push(Command::ExtendLine {
                    line: line.id,
                    station,
                });
            }
        }
    }
}

/// Finds the first station whose center lies strictly within `radius` of `point`.
///
/// Stations for which `exclude` returns `true` are skipped.
#[must_use]
pub fn pick_station<F>(
    stations: &[StationSnapshot],
    point: Vec2,
    radius: f32,
    exclude: F,
) -> Option<StationId>
where
    F: Fn(StationId) -> bool,
{
    stations
        .iter()
        .find(|station| station.position.distance(point) < radius && !exclude(station.id))
        .map(|station| station.id)
}
