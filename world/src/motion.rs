//! Train motion along lines and passenger exchange at stops.
//!
//! Each train's progress is a scalar in `0.0..=1.0` across its whole line. The
//! stops of a line with `N` stations sit at `k / (N - 1)`. A stop is visited
//! when the interval of progress travelled during a tick covers it, which makes
//! visits independent of the tick length: every pass over a stop triggers
//! exactly one exchange.

use std::time::Duration;

use transit_core::{geometry, Event, StationId, TravelDirection};

use crate::{
    network::{lookup_index, Line, Network, Train},
    Station,
};

const DOCKED_TOLERANCE: f32 = 1e-6;

/// Tunables applied to every train during a tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MotionParams {
    /// Progress travelled per second of simulated time.
    pub(crate) speed: f32,
    /// Simulated time at the end of the tick.
    pub(crate) now: Duration,
    /// How long a delivery highlight stays visible.
    pub(crate) effect_duration: Duration,
}

/// Clears delivery highlights whose expiry time has passed.
pub(crate) fn expire_effects(network: &mut Network, now: Duration, out: &mut Vec<Event>) {
    for train in &mut network.trains {
        if let Some(expires_at) = train.effect_expires_at {
            if expires_at <= now {
                train.effect_expires_at = None;
                out.push(Event::DeliveryEffectCleared { train: train.id });
            }
        }
    }
}

/// Moves every train along its line and exchanges passengers at visited stops.
///
/// Trains whose line is unknown or has fewer than two stations are skipped.
pub(crate) fn advance_trains(
    network: &mut Network,
    stations: &mut [Station],
    dt: Duration,
    params: MotionParams,
    out: &mut Vec<Event>,
) {
    let Network { lines, trains } = network;

    for train in trains.iter_mut() {
        let Some(line) = lookup_index(train.line.get()).and_then(|index| lines.get(index)) else {
            continue;
        };
        let stop_count = line.stations.len();
        if stop_count < 2 {
            continue;
        }

        if train.docked {
            train.docked = false;
            if let Some(stop) = stop_at(train.progress, stop_count) {
                visit(train, line, stop, stations, params, out);
            }
        }

        let from = train.progress;
        let travelled = params.speed * dt.as_secs_f32() * train.direction.sign();
        let to = from + travelled;
        if to >= 1.0 {
            train.progress = 1.0;
            train.direction = TravelDirection::Backward;
        } else if to <= 0.0 {
            train.progress = 0.0;
            train.direction = TravelDirection::Forward;
        } else {
            train.progress = to;
        }

        for stop in crossed_stops(from, train.progress, stop_count) {
            visit(train, line, stop, stations, params, out);
        }
    }
}

/// Stops covered when progress moves from `from` to `to`, in travel order.
///
/// Forward travel covers `from < stop <= to`, backward travel `to <= stop < from`,
/// so a stop reached exactly at the end of one tick is not visited again at the
/// start of the next.
pub(crate) fn crossed_stops(from: f32, to: f32, stop_count: usize) -> Vec<usize> {
    let progress = |stop: usize| geometry::stop_progress(stop, stop_count);
    if to > from {
        (0..stop_count)
            .filter(|&stop| from < progress(stop) && progress(stop) <= to)
            .collect()
    } else if to < from {
        (0..stop_count)
            .rev()
            .filter(|&stop| to <= progress(stop) && progress(stop) < from)
            .collect()
    } else {
        Vec::new()
    }
}

fn stop_at(progress: f32, stop_count: usize) -> Option<usize> {
    (0..stop_count).find(|&stop| {
        (geometry::stop_progress(stop, stop_count) - progress).abs() < DOCKED_TOLERANCE
    })
}

fn visit(
    train: &mut Train,
    line: &Line,
    stop: usize,
    stations: &mut [Station],
    params: MotionParams,
    out: &mut Vec<Event>,
) {
    let Some(station_id) = line.stations.get(stop).copied() else {
        return;
    };
    let Some(station) = station_mut(stations, station_id) else {
        return;
    };

    out.push(Event::TrainArrived {
        train: train.id,
        station: station_id,
    });
    exchange(train, station, params, out);
}

/// Delivers passengers matching the station shape, then boards waiting ones.
///
/// A boarding passenger is tagged with the shape of the station it boards at
/// and is delivered at the next station of that shape the train visits.
pub(crate) fn exchange(
    train: &mut Train,
    station: &mut Station,
    params: MotionParams,
    out: &mut Vec<Event>,
) {
    let before = train.passengers.len();
    train.passengers.retain(|shape| *shape != station.shape);
    let delivered = u32::try_from(before - train.passengers.len()).unwrap_or(u32::MAX);
    if delivered > 0 {
        train.delivered_today = train.delivered_today.saturating_add(delivered);
        train.effect_expires_at = Some(params.now.saturating_add(params.effect_duration));
        out.push(Event::PassengersDelivered {
            train: train.id,
            station: station.id,
            count: delivered,
        });
    }

    let boarding = station.passengers.min(train.spare_capacity());
    if boarding > 0 {
        station.passengers -= boarding;
        train
            .passengers
            .extend(std::iter::repeat(station.shape).take(boarding as usize));
        out.push(Event::PassengersBoarded {
            train: train.id,
            station: station.id,
            count: boarding,
        });
    }
}

fn station_mut(stations: &mut [Station], id: StationId) -> Option<&mut Station> {
    lookup_index(id.get()).and_then(|index| stations.get_mut(index))
}
