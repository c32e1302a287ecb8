//! Path geometry shared by the world, systems and renderers.
//!
//! A line between two consecutive stops is drawn as an "L": it travels 80% of
//! the dominant axis first, then turns toward the destination. Progress along
//! a whole line is a scalar in `0.0..=1.0` split into equal-length segments,
//! one per consecutive stop pair. Every function here is pure.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Fraction of the dominant axis covered before the path turns.
pub const ELBOW_FRACTION: f32 = 0.8;

/// Map position and heading resolved from a progress value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathPose {
    /// Position on the map.
    pub position: Vec2,
    /// Unit direction of the active half-segment, or zero when degenerate.
    pub heading: Vec2,
}

impl PathPose {
    /// Heading expressed as an angle in radians measured from the positive x axis.
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.heading.y.atan2(self.heading.x)
    }
}

/// Location of a progress value within a line's segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentPosition {
    /// Zero-based index of the segment, always below `stop_count - 1`.
    pub index: usize,
    /// Normalized offset within the segment in `0.0..=1.0`.
    pub local_t: f32,
}

/// Returns the single turn point of the "L" path from `start` to `end`.
#[must_use]
pub fn elbow_waypoint(start: Vec2, end: Vec2) -> Vec2 {
    let delta = end - start;
    if delta.x.abs() > delta.y.abs() {
        Vec2::new(start.x + delta.x * ELBOW_FRACTION, start.y)
    } else {
        Vec2::new(start.x, start.y + delta.y * ELBOW_FRACTION)
    }
}

/// Computes the elbow waypoint of every consecutive stop pair.
///
/// A line with `N` stops yields `N - 1` waypoints; fewer than two stops yield none.
#[must_use]
pub fn line_waypoints(stops: &[Vec2]) -> Vec<Vec2> {
    stops
        .windows(2)
        .map(|pair| elbow_waypoint(pair[0], pair[1]))
        .collect()
}

/// Resolves a position on one segment from its offset `local_t`.
///
/// The first half of the offset range walks from `start` to `elbow`, the second
/// half from `elbow` to `end`. Offsets outside `0.0..=1.0` are clamped.
#[must_use]
pub fn resolve_on_segment(start: Vec2, elbow: Vec2, end: Vec2, local_t: f32) -> PathPose {
    let local_t = local_t.clamp(0.0, 1.0);
    if local_t < 0.5 {
        let t = local_t * 2.0;
        PathPose {
            position: start.lerp(elbow, t),
            heading: (elbow - start).normalize_or_zero(),
        }
    } else {
        let t = (local_t - 0.5) * 2.0;
        PathPose {
            position: elbow.lerp(end, t),
            heading: (end - elbow).normalize_or_zero(),
        }
    }
}

/// Locates `progress` within a line of `stop_count` stops.
///
/// Returns `None` when the line has fewer than two stops. Progress equal to 1
/// resolves to the end of the final segment rather than a non-existent segment.
#[must_use]
pub fn segment_at(progress: f32, stop_count: usize) -> Option<SegmentPosition> {
    if stop_count < 2 {
        return None;
    }

    let segment_count = stop_count - 1;
    let scaled = progress.clamp(0.0, 1.0) * segment_count as f32;
    let index = (scaled.floor() as usize).min(segment_count - 1);
    let local_t = (scaled - index as f32).clamp(0.0, 1.0);
    Some(SegmentPosition { index, local_t })
}

/// Resolves a pose on a whole line from its normalized progress.
///
/// Returns `None` when the line has fewer than two stops or the waypoint cache
/// does not cover the resolved segment.
#[must_use]
pub fn resolve_along_line(stops: &[Vec2], waypoints: &[Vec2], progress: f32) -> Option<PathPose> {
    let segment = segment_at(progress, stops.len())?;
    let start = *stops.get(segment.index)?;
    let end = *stops.get(segment.index + 1)?;
    let elbow = *waypoints.get(segment.index)?;
    Some(resolve_on_segment(start, elbow, end, segment.local_t))
}

/// Progress value at which the stop with `index` sits on a line of `stop_count` stops.
#[must_use]
pub fn stop_progress(index: usize, stop_count: usize) -> f32 {
    if stop_count < 2 {
        return 0.0;
    }
    if index + 1 >= stop_count {
        return 1.0;
    }
    index as f32 / (stop_count - 1) as f32
}
