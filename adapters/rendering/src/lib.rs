#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for transit network adapters.
//!
//! Everything here is derived from a [`SimulationSnapshot`] taken at a tick
//! boundary. Adapters never see the mutable world.

use std::{error::Error, fmt, time::Duration};

use anyhow::Result as AnyResult;
use glam::Vec2;
use transit_core::{
    LineColor, LineId, SimulationSnapshot, StationId, StationShape, TrainId, TrainSnapshot,
};

/// Saturation applied to every line hue.
pub const LINE_SATURATION: f32 = 0.8;
/// Lightness applied to every line hue.
pub const LINE_LIGHTNESS: f32 = 0.6;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from hue (degrees), saturation and lightness.
    #[must_use]
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hue = hue.rem_euclid(360.0) / 360.0;
        let saturation = saturation.clamp(0.0, 1.0);
        let lightness = lightness.clamp(0.0, 1.0);
        if saturation == 0.0 {
            return Self::new(lightness, lightness, lightness, 1.0);
        }

        let q = if lightness < 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let p = 2.0 * lightness - q;
        Self::new(
            hue_channel(p, q, hue + 1.0 / 3.0),
            hue_channel(p, q, hue),
            hue_channel(p, q, hue - 1.0 / 3.0),
            1.0,
        )
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Palette color of a station shape. Carried passengers use the same color.
#[must_use]
pub const fn shape_color(shape: StationShape) -> Color {
    match shape {
        StationShape::Circle => Color::from_rgb_u8(0xFF, 0x6B, 0x6B),
        StationShape::Square => Color::from_rgb_u8(0x4E, 0xCD, 0xC4),
        StationShape::Triangle => Color::from_rgb_u8(0x45, 0xB7, 0xD1),
    }
}

/// Display color of a line hue.
#[must_use]
pub fn line_color(color: LineColor) -> Color {
    Color::from_hsl(color.hue(), LINE_SATURATION, LINE_LIGHTNESS)
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Cursor position expressed in map units, when known.
    pub cursor_world_space: Option<Vec2>,
    /// Whether the pointer was pressed on this frame.
    pub activate: bool,
    /// Whether the pointer was held down while moving on this frame.
    pub dragging: bool,
    /// Whether the adapter detected an explicit restart request on this frame.
    pub reset_requested: bool,
}

/// Whether a backend should keep presenting frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameControl {
    /// Present the next frame.
    Continue,
    /// Stop presenting and return from [`RenderingBackend::run`].
    Exit,
}

/// Sizes used to draw stations, lines and trains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneStyle {
    station_radius: f32,
    line_width: f32,
    train_length: f32,
    train_width: f32,
}

impl SceneStyle {
    /// Creates a style after checking that every size is positive.
    pub fn new(
        station_radius: f32,
        line_width: f32,
        train_length: f32,
        train_width: f32,
    ) -> Result<Self, RenderingError> {
        for (name, value) in [
            ("station_radius", station_radius),
            ("line_width", line_width),
            ("train_length", train_length),
            ("train_width", train_width),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RenderingError::InvalidDimension { name, value });
            }
        }
        Ok(Self {
            station_radius,
            line_width,
            train_length,
            train_width,
        })
    }

    /// Radius of a station marker.
    #[must_use]
    pub const fn station_radius(&self) -> f32 {
        self.station_radius
    }

    /// Stroke width of a line path.
    #[must_use]
    pub const fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Length of a train body along its heading.
    #[must_use]
    pub const fn train_length(&self) -> f32 {
        self.train_length
    }

    /// Width of a train body across its heading.
    #[must_use]
    pub const fn train_width(&self) -> f32 {
        self.train_width
    }
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            station_radius: 15.0,
            line_width: 6.0,
            train_length: 30.0,
            train_width: 20.0,
        }
    }
}

/// Station marker drawn in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct StationPresentation {
    /// Identifier allocated to the station by the world.
    pub id: StationId,
    /// Map position of the station center.
    pub position: Vec2,
    /// Shape of the marker.
    pub shape: StationShape,
    /// Fill color taken from the shape palette.
    pub color: Color,
    /// Waiting passenger count printed next to the marker.
    pub passengers: u32,
    /// Whether the station is close to overflowing.
    pub crowded: bool,
    /// Whether the station reached the overflow threshold.
    pub overflowing: bool,
}

/// Line path drawn as a polyline through stops and elbow waypoints.
#[derive(Clone, Debug, PartialEq)]
pub struct LinePresentation {
    /// Identifier allocated to the line by the world.
    pub id: LineId,
    /// Stroke color of the line.
    pub color: Color,
    /// Stops interleaved with the elbow of every segment.
    pub polyline: Vec<Vec2>,
}

/// Train body drawn on top of its line.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainPresentation {
    /// Identifier allocated to the train by the world.
    pub id: TrainId,
    /// Line the train belongs to.
    pub line: LineId,
    /// Map position of the train center.
    pub position: Vec2,
    /// Heading angle in radians measured from the positive x axis.
    pub angle: f32,
    /// Body color, brightened while a delivery highlight is active.
    pub color: Color,
    /// Palette colors of the carried passengers in boarding order.
    pub passengers: Vec<Color>,
    /// Whether a delivery highlight is active.
    pub highlighted: bool,
}

/// Heads-up display values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudPresentation {
    /// Current day, starting at 1.
    pub day: u32,
    /// Cumulative score.
    pub score: u64,
    /// Number of overflowing stations.
    pub overflow_count: u32,
    /// Simulated time remaining before the next day.
    pub time_until_next_day: Duration,
    /// Whether the game-over banner is shown.
    pub game_over: bool,
}

impl HudPresentation {
    /// Score shown on the game-over banner.
    #[must_use]
    pub const fn final_score(&self) -> Option<u64> {
        if self.game_over {
            Some(self.score)
        } else {
            None
        }
    }
}

/// Complete frame description assembled from a simulation snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Sizes applied by backends when drawing.
    pub style: SceneStyle,
    /// Lines in creation order, drawn first.
    pub lines: Vec<LinePresentation>,
    /// Stations in creation order.
    pub stations: Vec<StationPresentation>,
    /// Trains in creation order, drawn last.
    pub trains: Vec<TrainPresentation>,
    /// Heads-up display values.
    pub hud: HudPresentation,
}

impl Scene {
    /// Builds the scene describing the provided snapshot.
    #[must_use]
    pub fn from_snapshot(style: SceneStyle, snapshot: &SimulationSnapshot) -> Self {
        let lines = snapshot
            .lines
            .iter()
            .map(|line| LinePresentation {
                id: line.id,
                color: line_color(line.color),
                polyline: interleave(&line.stops, &line.waypoints),
            })
            .collect();

        let stations = snapshot
            .stations
            .iter()
            .map(|station| StationPresentation {
                id: station.id,
                position: station.position,
                shape: station.shape,
                color: shape_color(station.shape),
                passengers: station.passengers,
                crowded: station.crowded,
                overflowing: station.overflowing,
            })
            .collect();

        let trains = snapshot
            .trains
            .iter()
            .filter_map(|train| present_train(snapshot, train))
            .collect();

        let game = &snapshot.game;
        Self {
            style,
            lines,
            stations,
            trains,
            hud: HudPresentation {
                day: game.day,
                score: game.score,
                overflow_count: game.overflow_count,
                time_until_next_day: game.time_until_next_day,
                game_over: game.is_game_over(),
            },
        }
    }

    /// Replaces the scene content with the provided snapshot, keeping the style.
    pub fn update(&mut self, snapshot: &SimulationSnapshot) {
        *self = Self::from_snapshot(self.style, snapshot);
    }
}

fn interleave(stops: &[Vec2], waypoints: &[Vec2]) -> Vec<Vec2> {
    let mut polyline = Vec::with_capacity(stops.len() + waypoints.len());
    for (index, stop) in stops.iter().enumerate() {
        polyline.push(*stop);
        if let Some(elbow) = waypoints.get(index) {
            polyline.push(*elbow);
        }
    }
    polyline
}

fn present_train(
    snapshot: &SimulationSnapshot,
    train: &TrainSnapshot,
) -> Option<TrainPresentation> {
    let line = snapshot.lines.iter().find(|line| line.id == train.line)?;
    // Single-stop lines have no segment to resolve; the train idles on its stop.
    let (position, angle) = match train.pose {
        Some(pose) => (pose.position, pose.angle()),
        None => (*line.stops.first()?, 0.0),
    };
    let base = line_color(line.color);
    let color = if train.delivery_effect {
        base.lighten(0.5)
    } else {
        base
    };

    Some(TrainPresentation {
        id: train.id,
        line: train.line,
        position,
        angle,
        color,
        passengers: train.passengers.iter().copied().map(shape_color).collect(),
        highlighted: train.delivery_effect,
    })
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting transit scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, advances the simulation, and refreshes
    /// the scene before it is presented. Returning [`FrameControl::Exit`]
    /// stops the backend.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// A drawing size was zero, negative or not finite.
    InvalidDimension {
        /// Name of the rejected size.
        name: &'static str,
        /// Provided value that failed validation.
        value: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimension { name, value } => {
                write!(f, "{name} must be positive and finite (received {value})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_core::{
        GamePhase, GameSnapshot, LineSnapshot, PathPose, StationSnapshot, TravelDirection,
    };

    fn assert_close(left: Color, right: Color) {
        for (a, b) in [
            (left.red, right.red),
            (left.green, right.green),
            (left.blue, right.blue),
            (left.alpha, right.alpha),
        ] {
            assert!((a - b).abs() < 1e-4, "{left:?} != {right:?}");
        }
    }

    fn snapshot() -> SimulationSnapshot {
        let stops = vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 50.0)];
        SimulationSnapshot {
            stations: vec![
                StationSnapshot {
                    id: StationId::new(0),
                    position: stops[0],
                    shape: StationShape::Circle,
                    passengers: 6,
                    crowded: true,
                    overflowing: false,
                },
                StationSnapshot {
                    id: StationId::new(1),
                    position: stops[1],
                    shape: StationShape::Square,
                    passengers: 0,
                    crowded: false,
                    overflowing: false,
                },
            ],
            lines: vec![LineSnapshot {
                id: LineId::new(0),
                stations: vec![StationId::new(0), StationId::new(1)],
                color: LineColor::from_hue(120.0),
                stops,
                waypoints: vec![Vec2::new(80.0, 0.0)],
            }],
            trains: vec![TrainSnapshot {
                id: TrainId::new(0),
                line: LineId::new(0),
                progress: 0.25,
                direction: TravelDirection::Forward,
                passengers: vec![StationShape::Triangle, StationShape::Circle],
                capacity: 4,
                delivered_today: 1,
                delivery_effect: true,
                pose: Some(PathPose {
                    position: Vec2::new(40.0, 0.0),
                    heading: Vec2::X,
                }),
            }],
            game: GameSnapshot {
                score: 12,
                day: 3,
                time_until_next_day: Duration::from_millis(250),
                overflow_count: 0,
                phase: GamePhase::Playing,
            },
        }
    }

    #[test]
    fn hsl_conversion_matches_known_colors() {
        assert_close(
            Color::from_hsl(0.0, 1.0, 0.5),
            Color::new(1.0, 0.0, 0.0, 1.0),
        );
        assert_close(
            Color::from_hsl(120.0, 1.0, 0.5),
            Color::new(0.0, 1.0, 0.0, 1.0),
        );
        assert_close(
            Color::from_hsl(600.0, 1.0, 0.5),
            Color::new(0.0, 0.0, 1.0, 1.0),
        );
        assert_close(
            Color::from_hsl(42.0, 0.0, 0.3),
            Color::new(0.3, 0.3, 0.3, 1.0),
        );
    }

    #[test]
    fn line_color_uses_fixed_saturation_and_lightness() {
        assert_close(
            line_color(LineColor::from_hue(0.0)),
            Color::new(0.92, 0.28, 0.28, 1.0),
        );
    }

    #[test]
    fn palette_matches_station_shapes() {
        assert_eq!(
            shape_color(StationShape::Circle),
            Color::from_rgb_u8(255, 107, 107)
        );
        assert_eq!(
            shape_color(StationShape::Square),
            Color::from_rgb_u8(78, 205, 196)
        );
        assert_eq!(
            shape_color(StationShape::Triangle),
            Color::from_rgb_u8(69, 183, 209)
        );
    }

    #[test]
    fn scene_interleaves_stops_and_elbows() {
        let scene = Scene::from_snapshot(SceneStyle::default(), &snapshot());

        assert_eq!(
            scene.lines[0].polyline,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(80.0, 0.0),
                Vec2::new(100.0, 50.0)
            ]
        );
        assert_eq!(scene.stations.len(), 2);
        assert!(scene.stations[0].crowded);
    }

    #[test]
    fn highlighted_train_is_lightened_and_carries_passenger_colors() {
        let scene = Scene::from_snapshot(SceneStyle::default(), &snapshot());
        let train = &scene.trains[0];

        assert_eq!(train.position, Vec2::new(40.0, 0.0));
        assert_eq!(train.angle, 0.0);
        assert!(train.highlighted);
        assert_eq!(
            train.color,
            line_color(LineColor::from_hue(120.0)).lighten(0.5)
        );
        assert_eq!(
            train.passengers,
            vec![
                shape_color(StationShape::Triangle),
                shape_color(StationShape::Circle)
            ]
        );
    }

    #[test]
    fn train_without_pose_idles_on_first_stop() {
        let mut snapshot = snapshot();
        snapshot.trains[0].pose = None;

        let scene = Scene::from_snapshot(SceneStyle::default(), &snapshot);

        assert_eq!(scene.trains[0].position, Vec2::ZERO);
    }

    #[test]
    fn train_on_unknown_line_is_not_presented() {
        let mut snapshot = snapshot();
        snapshot.trains[0].line = LineId::new(7);

        let scene = Scene::from_snapshot(SceneStyle::default(), &snapshot);

        assert!(scene.trains.is_empty());
    }

    #[test]
    fn hud_reports_final_score_only_after_game_over() {
        let mut snapshot = snapshot();
        let mut scene = Scene::from_snapshot(SceneStyle::default(), &snapshot);
        assert_eq!(scene.hud.final_score(), None);

        snapshot.game.phase = GamePhase::GameOver;
        scene.update(&snapshot);

        assert!(scene.hud.game_over);
        assert_eq!(scene.hud.final_score(), Some(12));
        assert_eq!(scene.hud.day, 3);
    }

    #[test]
    fn style_rejects_non_positive_sizes() {
        let error = SceneStyle::new(15.0, 0.0, 30.0, 20.0)
            .expect_err("zero line width must be rejected");

        assert_eq!(
            error,
            RenderingError::InvalidDimension {
                name: "line_width",
                value: 0.0
            }
        );
        assert!(SceneStyle::new(15.0, 6.0, 30.0, 20.0).is_ok());
    }
}
