use std::time::Duration;

use glam::Vec2;
use transit_core::{Event, GamePhase, SimulationSnapshot};
use transit_simulation::{tick, GestureInput, Simulation, SimulationConfig};

const FRAME: Duration = Duration::from_millis(16);

fn simulation(seed: u64) -> Simulation {
    Simulation::new(SimulationConfig::seeded(seed)).expect("valid config")
}

fn frame(simulation: &mut Simulation, input: GestureInput, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    tick(simulation, input, dt, &mut events);
    events
}

fn station_point(simulation: &Simulation, index: usize) -> Vec2 {
    simulation.snapshot().stations[index].position
}

fn build_ring_line(simulation: &mut Simulation) {
    let origin = station_point(simulation, 0);
    let _ = frame(simulation, GestureInput::activate(origin), FRAME);
    for index in 1..5 {
        let point = station_point(simulation, index);
        let _ = frame(simulation, GestureInput::drag_over(point), FRAME);
    }
}

fn assert_invariants(snapshot: &SimulationSnapshot) {
    for train in &snapshot.trains {
        assert!(
            (0.0..=1.0).contains(&train.progress),
            "train {} left the line: {}",
            train.id.get(),
            train.progress
        );
        assert!(train.passengers.len() <= train.capacity as usize);
    }
    let overflowing = snapshot
        .stations
        .iter()
        .filter(|station| station.passengers >= 8)
        .count();
    assert_eq!(snapshot.game.overflow_count as usize, overflowing);
    assert!(snapshot
        .stations
        .iter()
        .all(|station| station.passengers <= 8));
}

#[test]
fn gestures_build_a_line_through_the_ring() {
    let mut simulation = simulation(3);
    build_ring_line(&mut simulation);

    let snapshot = simulation.snapshot();
    assert_eq!(snapshot.lines.len(), 1);
    assert_eq!(snapshot.lines[0].stations.len(), 5);
    assert_eq!(snapshot.lines[0].waypoints.len(), 4);
    assert_eq!(snapshot.trains.len(), 1);
    assert_eq!(snapshot.trains[0].line, snapshot.lines[0].id);
}

#[test]
fn invariants_hold_for_every_frame() {
    let mut simulation = simulation(0xabcdef);
    build_ring_line(&mut simulation);
    let second_line_start = station_point(&simulation, 2);
    let second_line_end = station_point(&simulation, 4);
    let _ = frame(
        &mut simulation,
        GestureInput::activate(second_line_start),
        FRAME,
    );
    let _ = frame(
        &mut simulation,
        GestureInput::drag_over(second_line_end),
        FRAME,
    );

    for index in 0..4_000u64 {
        let dt = Duration::from_millis(8 + (index % 5) * 9);
        let _ = frame(&mut simulation, GestureInput::default(), dt);
        assert_invariants(&simulation.snapshot());
    }
}

#[test]
fn new_station_appears_when_day_five_starts() {
    let mut simulation = simulation(11);
    let step = Duration::from_millis(100);

    for _ in 0..39 {
        let _ = frame(&mut simulation, GestureInput::default(), step);
    }
    let before = simulation.snapshot();
    assert_eq!(before.game.day, 4);
    assert_eq!(before.stations.len(), 5);

    let events = frame(&mut simulation, GestureInput::default(), step);
    let after = simulation.snapshot();
    assert_eq!(after.game.day, 5);
    assert_eq!(after.stations.len(), 6);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::StationSpawned { .. })));
}

fn run_until_game_over(simulation: &mut Simulation) -> Vec<Event> {
    let step = Duration::from_millis(100);
    for _ in 0..100_000 {
        let events = frame(simulation, GestureInput::default(), step);
        assert_invariants(&simulation.snapshot());
        if simulation.snapshot().game.phase == GamePhase::GameOver {
            return events;
        }
    }
    panic!("game never ended");
}

fn sparse_station_simulation(seed: u64) -> Simulation {
    let mut config = SimulationConfig::seeded(seed);
    config.spawning.station_every_days = 100_000;
    Simulation::new(config).expect("valid config")
}

#[test]
fn unserved_stations_overflow_into_game_over() {
    let mut simulation = sparse_station_simulation(5);
    let events = run_until_game_over(&mut simulation);

    let snapshot = simulation.snapshot();
    assert!(snapshot.game.is_game_over());
    assert_eq!(snapshot.game.overflow_count, 3);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::GameOver { .. })));
}

#[test]
fn game_over_freezes_everything_until_reset() {
    let mut simulation = sparse_station_simulation(8);
    let _ = run_until_game_over(&mut simulation);
    let frozen = simulation.snapshot();
    let dragged = station_point(&simulation, 1);

    for _ in 0..50 {
        let events = frame(
            &mut simulation,
            GestureInput::drag_over(dragged),
            Duration::from_millis(500),
        );
        assert!(events.is_empty(), "no mutation while game over: {events:?}");
    }
    assert_eq!(simulation.snapshot(), frozen);

    let events = frame(
        &mut simulation,
        GestureInput::activate(Vec2::new(-1_000.0, -1_000.0)),
        FRAME,
    );
    assert_eq!(events.first(), Some(&Event::SimulationReset));

    let snapshot = simulation.snapshot();
    assert_eq!(snapshot.game.score, 0);
    assert_eq!(snapshot.game.day, 1);
    assert_eq!(snapshot.game.phase, GamePhase::Playing);
    assert_eq!(snapshot.game.overflow_count, 0);
    assert_eq!(snapshot.stations.len(), 5);
    assert!(snapshot.lines.is_empty());
    assert!(snapshot.trains.is_empty());
}

#[test]
fn identical_seeds_replay_identically() {
    let replay = |seed: u64| {
        let mut simulation = simulation(seed);
        build_ring_line(&mut simulation);
        let mut log = Vec::new();
        for _ in 0..1_500 {
            tick(&mut simulation, GestureInput::default(), FRAME, &mut log);
        }
        (log, simulation.snapshot())
    };

    let first = replay(0x1357_9bdf);
    let second = replay(0x1357_9bdf);
    assert_eq!(first, second, "replay diverged between runs");
    assert!(first
        .0
        .iter()
        .any(|event| matches!(event, Event::PassengerSpawned { .. })));
}

#[test]
fn served_line_scores_deliveries() {
    let mut simulation = simulation(21);
    build_ring_line(&mut simulation);

    let mut delivered = 0;
    for _ in 0..6_000 {
        for event in frame(&mut simulation, GestureInput::default(), FRAME) {
            if let Event::PassengersDelivered { count, .. } = event {
                delivered += u64::from(count);
            }
        }
        if simulation.snapshot().game.is_game_over() {
            break;
        }
    }

    let snapshot = simulation.snapshot();
    let pending: u64 = snapshot
        .trains
        .iter()
        .map(|train| u64::from(train.delivered_today))
        .sum();
    assert_eq!(snapshot.game.score + pending, delivered);
}

#[test]
fn invalid_configuration_is_rejected() {
    let mut config = SimulationConfig::default();
    config.builder.pick_radius = 0.0;
    assert!(Simulation::new(config).is_err());

    let mut config = SimulationConfig::default();
    config.spawning.passenger_interval = Duration::ZERO;
    assert!(Simulation::new(config).is_err());
}

#[test]
fn enormous_frame_finishes_with_bounded_output() {
    let mut simulation = simulation(34);
    build_ring_line(&mut simulation);

    let events = frame(
        &mut simulation,
        GestureInput::default(),
        Duration::from_secs(100_000_000),
    );

    let snapshot = simulation.snapshot();
    assert_invariants(&snapshot);
    let announced = events
        .iter()
        .filter(|event| matches!(event, Event::DayStarted { .. }))
        .count();
    assert!(announced <= 1_000, "announced {announced} days");
    let spawned = events
        .iter()
        .filter(|event| matches!(event, Event::PassengerSpawned { .. }))
        .count();
    assert!(spawned <= 1_024 * 8, "spawned {spawned} passengers");
}
