//! Lines and the trains paired with them.

use std::time::Duration;

use glam::Vec2;
use transit_core::{
    geometry, LineColor, LineId, LineSnapshot, StationId, StationShape, TrainId, TrainSnapshot,
    TravelDirection,
};

use crate::Station;

/// Ordered, duplicate-free path of stations shuttled by exactly one train.
#[derive(Clone, Debug)]
pub(crate) struct Line {
    pub(crate) id: LineId,
    pub(crate) stations: Vec<StationId>,
    pub(crate) color: LineColor,
    pub(crate) stops: Vec<Vec2>,
    pub(crate) waypoints: Vec<Vec2>,
}

impl Line {
    fn contains(&self, station: StationId) -> bool {
        self.stations.contains(&station)
    }

    pub(crate) fn snapshot(&self) -> LineSnapshot {
        LineSnapshot {
            id: self.id,
            stations: self.stations.clone(),
            color: self.color,
            stops: self.stops.clone(),
            waypoints: self.waypoints.clone(),
        }
    }
}

/// Capacity-bounded carrier moving back and forth along one line.
#[derive(Clone, Debug)]
pub(crate) struct Train {
    pub(crate) id: TrainId,
    pub(crate) line: LineId,
    pub(crate) progress: f32,
    pub(crate) direction: TravelDirection,
    pub(crate) passengers: Vec<StationShape>,
    pub(crate) capacity: u32,
    pub(crate) delivered_today: u32,
    pub(crate) effect_expires_at: Option<Duration>,
    pub(crate) docked: bool,
}

impl Train {
    fn new(id: TrainId, line: LineId, capacity: u32) -> Self {
        Self {
            id,
            line,
            progress: 0.0,
            direction: TravelDirection::Forward,
            passengers: Vec::with_capacity(capacity as usize),
            capacity,
            delivered_today: 0,
            effect_expires_at: None,
            docked: true,
        }
    }

    pub(crate) fn spare_capacity(&self) -> u32 {
        let carried = u32::try_from(self.passengers.len()).unwrap_or(u32::MAX);
        self.capacity.saturating_sub(carried)
    }

    pub(crate) fn snapshot(&self, line: Option<&Line>) -> TrainSnapshot {
        TrainSnapshot {
            id: self.id,
            line: self.line,
            progress: self.progress,
            direction: self.direction,
            passengers: self.passengers.clone(),
            capacity: self.capacity,
            delivered_today: self.delivered_today,
            delivery_effect: self.effect_expires_at.is_some(),
            pose: line.and_then(|line| {
                geometry::resolve_along_line(&line.stops, &line.waypoints, self.progress)
            }),
        }
    }
}

/// Append-only registry of lines and their trains.
///
/// Lines and trains are created in lockstep and never removed outside of a
/// full reset, so identifiers double as vector indices.
#[derive(Clone, Debug, Default)]
pub(crate) struct Network {
    pub(crate) lines: Vec<Line>,
    pub(crate) trains: Vec<Train>,
}

impl Network {
    pub(crate) fn clear(&mut self) {
        self.lines.clear();
        self.trains.clear();
    }

    pub(crate) fn line(&self, id: LineId) -> Option<&Line> {
        lookup_index(id.get()).and_then(|index| self.lines.get(index))
    }

    pub(crate) fn active_line(&self) -> Option<&Line> {
        self.lines.last()
    }

    pub(crate) fn open_line(
        &mut self,
        station: &Station,
        color: LineColor,
        capacity: u32,
    ) -> (LineId, TrainId) {
        let line_id = LineId::new(next_id(self.lines.len()));
        let train_id = TrainId::new(next_id(self.trains.len()));
        self.lines.push(Line {
            id: line_id,
            stations: vec![station.id],
            color,
            stops: vec![station.position],
            waypoints: Vec::new(),
        });
        self.trains.push(Train::new(train_id, line_id, capacity));
        (line_id, train_id)
    }

    /// Appends `station` to the line, recomputing every waypoint.
    ///
    /// Returns `false` when the line is unknown or already serves the station.
    pub(crate) fn extend_line(&mut self, id: LineId, station: &Station) -> bool {
        let Some(line) = lookup_index(id.get()).and_then(|index| self.lines.get_mut(index)) else {
            return false;
        };
        if line.contains(station.id) {
            return false;
        }

        line.stations.push(station.id);
        line.stops.push(station.position);
        line.waypoints = geometry::line_waypoints(&line.stops);
        true
    }

    pub(crate) fn settle_deliveries(&mut self) -> u64 {
        self.trains
            .iter_mut()
            .map(|train| u64::from(std::mem::take(&mut train.delivered_today)))
            .sum()
    }
}

pub(crate) fn lookup_index(id: u32) -> Option<usize> {
    usize::try_from(id).ok()
}

pub(crate) fn next_id(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
